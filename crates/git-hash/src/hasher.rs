use sha1::{Digest, Sha1};

use crate::{HashAlgorithm, HashError, ObjectId};

/// Streaming hash computation.
///
/// Wraps the `sha1` crate's incremental digest behind the interface the rest
/// of the core uses. Data can be fed incrementally with
/// [`update`](Hasher::update) or through the [`std::io::Write`]
/// implementation, then finalised into an [`ObjectId`].
pub struct Hasher {
    inner: Sha1,
}

impl Hasher {
    /// Create a new hasher for the given algorithm.
    pub fn new(_algo: HashAlgorithm) -> Self {
        Self { inner: Sha1::new() }
    }

    /// Feed data into the hasher.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finalize and return the ObjectId.
    pub fn finalize(self) -> Result<ObjectId, HashError> {
        let result = self.inner.finalize();
        ObjectId::from_bytes(&result, HashAlgorithm::Sha1)
    }

    /// Convenience: hash data in one call.
    pub fn digest(algo: HashAlgorithm, data: &[u8]) -> Result<ObjectId, HashError> {
        let mut h = Self::new(algo);
        h.update(data);
        h.finalize()
    }

    /// Hash a git object: `"{type} {len}\0{content}"`.
    pub fn hash_object(
        algo: HashAlgorithm,
        obj_type: &str,
        data: &[u8],
    ) -> Result<ObjectId, HashError> {
        let header = format!("{} {}\0", obj_type, data.len());
        let mut h = Self::new(algo);
        h.update(header.as_bytes());
        h.update(data);
        h.finalize()
    }
}

impl std::io::Write for Hasher {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
