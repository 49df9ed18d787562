//! Pack index (v1 and v2) reading and lookup.
//!
//! The pack index provides fast OID → offset mapping using a fan-out table
//! and binary search.
//!
//! Version 2 format:
//! ```text
//! Header:  \xff tOc (4 bytes) | version (4 bytes = 2)
//! Fanout:  256 × 4-byte big-endian cumulative counts
//! OIDs:    N × 20-byte sorted OIDs
//! CRC32:   N × 4-byte CRC32 values
//! Offsets: N × 4-byte offsets (high bit = 1 → use 64-bit table)
//! 64-bit:  M × 8-byte offsets (for packs > 2GB)
//! Trailer: 20-byte pack checksum | 20-byte index checksum
//! ```
//!
//! Version 1 format (no header, no CRC32, no 64-bit offset table):
//! ```text
//! Fanout:  256 × 4-byte big-endian cumulative counts
//! Records: N × (4-byte big-endian offset | 20-byte OID), sorted by OID
//! Trailer: 20-byte pack checksum | 20-byte index checksum
//! ```

use std::path::{Path, PathBuf};

use git_hash::fanout::FanoutTable;
use git_hash::{HashAlgorithm, ObjectId};
use memmap2::Mmap;

use crate::{IDX_SIGNATURE, IDX_VERSION, PackError};

/// Pack index (v1 or v2) providing OID → offset mapping.
pub struct PackIndex {
    data: Mmap,
    version: u32,
    /// Fan-out table read from the index. `FanoutTable::from_bytes`
    /// enforces the monotonic-nondecreasing invariant on load.
    fanout: FanoutTable,
    num_objects: u32,
    /// Byte offset where sorted OIDs start (v2) or where the first
    /// 24-byte [offset|oid] record starts (v1).
    oid_offset: usize,
    /// Byte offset where CRC32 values start. Unused (0) for v1, which has
    /// no CRC32 table.
    crc_offset: usize,
    /// Byte offset where 32-bit offsets start. Unused for v1, where the
    /// offset is embedded at the front of each 24-byte record.
    offset32_offset: usize,
    /// Byte offset where 64-bit offsets start (v2 only; v1 has no large
    /// pack support).
    offset64_offset: usize,
    /// Path to the .idx file.
    idx_path: PathBuf,
    /// Hash algorithm (SHA-1 for now).
    hash_algo: HashAlgorithm,
}

impl PackIndex {
    /// Open a pack index file, auto-detecting version 1 or version 2.
    pub fn open(idx_path: impl AsRef<Path>) -> Result<Self, PackError> {
        let idx_path = idx_path.as_ref().to_path_buf();
        let file = std::fs::File::open(&idx_path)?;
        let data = unsafe { Mmap::map(&file)? };

        // For now we only support SHA-1
        let hash_algo = HashAlgorithm::Sha1;
        let hash_len = hash_algo.digest_len(); // 20

        if data.len() < 1024 + 2 * hash_len {
            return Err(PackError::InvalidIndex("file too small".into()));
        }

        if data[0..4] == IDX_SIGNATURE {
            Self::open_v2(data, idx_path, hash_algo, hash_len)
        } else {
            Self::open_v1(data, idx_path, hash_algo, hash_len)
        }
    }

    fn open_v2(
        data: Mmap,
        idx_path: PathBuf,
        hash_algo: HashAlgorithm,
        hash_len: usize,
    ) -> Result<Self, PackError> {
        let version = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        if version != IDX_VERSION {
            return Err(PackError::InvalidIndex(format!(
                "unsupported version {version}, expected {IDX_VERSION}"
            )));
        }

        let fanout_offset = 8;
        let fanout = FanoutTable::from_bytes(&data[fanout_offset..])
            .map_err(|_| PackError::InvalidIndex("corrupt index file".into()))?;
        let num_objects = fanout.total();

        let n = num_objects as usize;
        let oid_offset = fanout_offset + 1024;
        let crc_offset = oid_offset + n * hash_len;
        let offset32_offset = crc_offset + n * 4;
        let offset64_offset = offset32_offset + n * 4;

        let min_size = offset64_offset + 2 * hash_len;
        if data.len() < min_size {
            return Err(PackError::InvalidIndex(format!(
                "file too small: {} < {min_size}",
                data.len()
            )));
        }

        Ok(Self {
            data,
            version,
            fanout,
            num_objects,
            oid_offset,
            crc_offset,
            offset32_offset,
            offset64_offset,
            idx_path,
            hash_algo,
        })
    }

    /// Version 1 has no header: the fanout table begins at byte 0, followed
    /// directly by N 24-byte records of [4-byte big-endian offset][20-byte OID].
    fn open_v1(
        data: Mmap,
        idx_path: PathBuf,
        hash_algo: HashAlgorithm,
        hash_len: usize,
    ) -> Result<Self, PackError> {
        let fanout = FanoutTable::from_bytes(&data[0..])
            .map_err(|_| PackError::InvalidIndex("corrupt index file".into()))?;
        let num_objects = fanout.total();

        let n = num_objects as usize;
        let record_offset = 1024;
        let record_stride = 4 + hash_len;

        let min_size = record_offset + n * record_stride + 2 * hash_len;
        if data.len() < min_size {
            return Err(PackError::InvalidIndex(format!(
                "file too small: {} < {min_size}",
                data.len()
            )));
        }

        Ok(Self {
            data,
            version: 1,
            fanout,
            num_objects,
            oid_offset: record_offset,
            crc_offset: 0,
            offset32_offset: 0,
            offset64_offset: 0,
            idx_path,
            hash_algo,
        })
    }

    /// Look up an OID, returning the offset in the pack file.
    pub fn lookup(&self, oid: &ObjectId) -> Option<u64> {
        let range = self.fanout.range(oid.first_byte());
        let (lo, hi) = (range.start, range.end);
        if lo >= hi {
            return None;
        }
        // Binary search within the range
        let target = oid.as_bytes();

        let mut low = lo;
        let mut high = hi;
        while low < high {
            let mid = low + (high - low) / 2;
            let mid_oid = self.oid_bytes_at(mid);
            match mid_oid.cmp(target) {
                std::cmp::Ordering::Less => low = mid + 1,
                std::cmp::Ordering::Greater => high = mid,
                std::cmp::Ordering::Equal => {
                    return Some(self.offset_at_index(mid as u32));
                }
            }
        }
        None
    }

    /// Look up by OID prefix, returning all matches as (OID, offset) pairs.
    pub fn lookup_prefix(&self, prefix: &[u8]) -> Vec<(ObjectId, u64)> {
        if prefix.is_empty() {
            return Vec::new();
        }

        let first_byte = prefix[0];
        let range = self.fanout.range(first_byte);
        let (lo, hi) = (range.start, range.end);

        let mut results = Vec::new();
        for i in lo..hi {
            let oid_bytes = self.oid_bytes_at(i);
            if oid_bytes.len() >= prefix.len() && oid_bytes[..prefix.len()] == *prefix {
                if let Ok(oid) = ObjectId::from_bytes(oid_bytes, self.hash_algo) {
                    results.push((oid, self.offset_at_index(i as u32)));
                }
            }
        }
        results
    }

    /// Get the OID at the given sorted index position.
    pub fn oid_at_index(&self, index: u32) -> ObjectId {
        let hash_len = self.hash_algo.digest_len();
        let start = if self.version == 1 {
            self.oid_offset + index as usize * (4 + hash_len) + 4
        } else {
            self.oid_offset + index as usize * hash_len
        };
        ObjectId::from_bytes(&self.data[start..start + hash_len], self.hash_algo)
            .expect("valid OID in index")
    }

    /// Get the pack file offset at the given sorted index position.
    pub fn offset_at_index(&self, index: u32) -> u64 {
        if self.version == 1 {
            let hash_len = self.hash_algo.digest_len();
            let pos = self.oid_offset + index as usize * (4 + hash_len);
            return u32::from_be_bytes([
                self.data[pos],
                self.data[pos + 1],
                self.data[pos + 2],
                self.data[pos + 3],
            ]) as u64;
        }

        let pos = self.offset32_offset + index as usize * 4;
        let val = u32::from_be_bytes([
            self.data[pos],
            self.data[pos + 1],
            self.data[pos + 2],
            self.data[pos + 3],
        ]);

        if val & 0x8000_0000 != 0 {
            // 64-bit offset: high bit is set, lower 31 bits index into 64-bit table
            let idx64 = (val & 0x7FFF_FFFF) as usize;
            let pos64 = self.offset64_offset + idx64 * 8;
            u64::from_be_bytes([
                self.data[pos64],
                self.data[pos64 + 1],
                self.data[pos64 + 2],
                self.data[pos64 + 3],
                self.data[pos64 + 4],
                self.data[pos64 + 5],
                self.data[pos64 + 6],
                self.data[pos64 + 7],
            ])
        } else {
            val as u64
        }
    }

    /// Get the CRC32 at the given sorted index position. Version 1 indexes
    /// carry no CRC32 table and always return 0.
    pub fn crc32_at_index(&self, index: u32) -> u32 {
        if self.version == 1 {
            return 0;
        }
        let pos = self.crc_offset + index as usize * 4;
        u32::from_be_bytes([
            self.data[pos],
            self.data[pos + 1],
            self.data[pos + 2],
            self.data[pos + 3],
        ])
    }

    /// Total number of objects in this index.
    pub fn num_objects(&self) -> u32 {
        self.num_objects
    }

    /// Index version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Path to the .idx file.
    pub fn path(&self) -> &Path {
        &self.idx_path
    }

    /// Pack checksum stored in the index trailer.
    pub fn pack_checksum(&self) -> ObjectId {
        let hash_len = self.hash_algo.digest_len();
        let start = self.data.len() - 2 * hash_len;
        ObjectId::from_bytes(&self.data[start..start + hash_len], self.hash_algo)
            .expect("valid checksum in index trailer")
    }

    /// Index checksum (the trailing hash of the index file itself).
    pub fn index_checksum(&self) -> ObjectId {
        let hash_len = self.hash_algo.digest_len();
        let start = self.data.len() - hash_len;
        ObjectId::from_bytes(&self.data[start..start + hash_len], self.hash_algo)
            .expect("valid checksum in index trailer")
    }

    /// Iterate over all (OID, offset) pairs in sorted order.
    pub fn iter(&self) -> PackIndexIter<'_> {
        PackIndexIter {
            index: self,
            pos: 0,
        }
    }

    /// Raw OID bytes at the given sorted index position.
    fn oid_bytes_at(&self, index: usize) -> &[u8] {
        let hash_len = self.hash_algo.digest_len();
        let start = if self.version == 1 {
            self.oid_offset + index * (4 + hash_len) + 4
        } else {
            self.oid_offset + index * hash_len
        };
        &self.data[start..start + hash_len]
    }
}

/// Iterator over (OID, offset) pairs in a pack index.
pub struct PackIndexIter<'a> {
    index: &'a PackIndex,
    pos: u32,
}

impl<'a> Iterator for PackIndexIter<'a> {
    type Item = (ObjectId, u64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.index.num_objects {
            return None;
        }
        let oid = self.index.oid_at_index(self.pos);
        let offset = self.index.offset_at_index(self.pos);
        self.pos += 1;
        Some((oid, offset))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.index.num_objects - self.pos) as usize;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for PackIndexIter<'a> {}
