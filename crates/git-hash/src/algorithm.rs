use crate::ObjectId;

/// The hash algorithm used to identify objects.
///
/// This core only ever deals with SHA-1 repositories; the type still carries
/// the algorithm concept the wire formats encode (index magic, format ids)
/// so those constants have a name, but the `Sha256` experimental object
/// format found in newer git repositories is out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    /// SHA-1 (160 bits / 20 bytes).
    #[default]
    Sha1,
}

impl HashAlgorithm {
    /// Length of the hash digest in bytes.
    pub const fn digest_len(&self) -> usize {
        match self {
            Self::Sha1 => 20,
        }
    }

    /// Length of the hex representation.
    pub const fn hex_len(&self) -> usize {
        self.digest_len() * 2
    }

    /// The null (all-zeros) OID for this algorithm.
    pub const fn null_oid(&self) -> ObjectId {
        match self {
            Self::Sha1 => ObjectId::NULL,
        }
    }

    /// The 4-byte format identifier used in pack index files (matching C git).
    pub const fn format_id(&self) -> u32 {
        match self {
            // "sha1" in ASCII
            Self::Sha1 => 0x7368_6131,
        }
    }

    /// Look up a hash algorithm by name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sha1" | "sha-1" => Some(Self::Sha1),
            _ => None,
        }
    }

    /// Look up a hash algorithm by format id.
    pub fn from_format_id(id: u32) -> Option<Self> {
        match id {
            0x7368_6131 => Some(Self::Sha1),
            _ => None,
        }
    }

    /// Look up a hash algorithm by raw digest length.
    pub fn from_digest_len(len: usize) -> Option<Self> {
        match len {
            20 => Some(Self::Sha1),
            _ => None,
        }
    }

    /// Look up a hash algorithm by hex length.
    pub fn from_hex_len(len: usize) -> Option<Self> {
        match len {
            40 => Some(Self::Sha1),
            _ => None,
        }
    }

    /// The name of this algorithm as used in git configuration.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
