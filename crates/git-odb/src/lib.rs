//! Unified object database for git.
//!
//! Provides a single interface to read objects across loose storage and
//! packfiles: the object facade that every higher-level read operation goes
//! through to turn a hash into bytes.

mod search;

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use git_hash::{HashAlgorithm, ObjectId};
use git_loose::LooseObjectStore;
use git_object::cache::ObjectCache;
use git_object::{Object, ObjectType};
use git_pack::pack::PackFile;

pub use error::OdbError;

mod error {
    use git_hash::ObjectId;

    #[derive(Debug, thiserror::Error)]
    pub enum OdbError {
        #[error("object not found: {0}")]
        NotFound(ObjectId),

        #[error("corrupt object {oid}: {reason}")]
        Corrupt { oid: ObjectId, reason: String },

        #[error(transparent)]
        Loose(#[from] git_loose::LooseError),

        #[error(transparent)]
        Pack(#[from] git_pack::PackError),

        #[error(transparent)]
        Io(#[from] std::io::Error),
    }
}

/// Lightweight object info (header only, no content).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub obj_type: ObjectType,
    pub size: usize,
}

/// Default capacity of the in-process object cache.
const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Unified object database: loose store plus every discovered packfile.
///
/// Single-threaded and synchronous. Caches use `RefCell`-based interior
/// mutability rather than `Mutex`/`RwLock`: a repository handle is not meant
/// to be shared across threads, so there is no concurrent access to
/// synchronize against.
pub struct ObjectDatabase {
    loose: LooseObjectStore,
    packs: Vec<PackFile>,
    cache: RefCell<ObjectCache>,
    objects_dir: PathBuf,
    hash_algo: HashAlgorithm,
}

impl ObjectDatabase {
    /// Open the object database at the given objects directory.
    pub fn open(objects_dir: impl AsRef<Path>) -> Result<Self, OdbError> {
        Self::open_with_algo(objects_dir, HashAlgorithm::Sha1)
    }

    /// Open the object database with a specific hash algorithm.
    pub fn open_with_algo(
        objects_dir: impl AsRef<Path>,
        hash_algo: HashAlgorithm,
    ) -> Result<Self, OdbError> {
        let objects_dir = objects_dir.as_ref().to_path_buf();
        let loose = LooseObjectStore::open(&objects_dir, hash_algo);
        let packs = Self::discover_packs(&objects_dir)?;

        Ok(Self {
            loose,
            packs,
            cache: RefCell::new(ObjectCache::new(DEFAULT_CACHE_CAPACITY)),
            objects_dir,
            hash_algo,
        })
    }

    /// Read an object by OID: cache, then loose, then each pack in turn.
    pub fn read(&self, oid: &ObjectId) -> Result<Option<Object>, OdbError> {
        if let Some(obj) = self.cache.borrow_mut().get(oid) {
            return Ok(Some(obj.clone()));
        }

        let obj = search::find_object(self, oid)?;
        if let Some(ref obj) = obj {
            self.cache.borrow_mut().insert(*oid, obj.clone());
        }
        Ok(obj)
    }

    /// Read just the header (type + size) without full content.
    pub fn read_header(&self, oid: &ObjectId) -> Result<Option<ObjectInfo>, OdbError> {
        if let Some(obj) = self.cache.borrow().peek(oid) {
            return Ok(Some(ObjectInfo {
                obj_type: obj.object_type(),
                size: obj.serialize_content().len(),
            }));
        }
        search::find_header(self, oid)
    }

    /// Check if an object exists (fast, no decompression for packed objects).
    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.cache.borrow().contains(oid) || search::object_exists(self, oid)
    }

    /// Get the path to the objects directory.
    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    /// Get the hash algorithm in use.
    pub fn hash_algo(&self) -> HashAlgorithm {
        self.hash_algo
    }

    fn loose(&self) -> &LooseObjectStore {
        &self.loose
    }

    fn packs(&self) -> &[PackFile] {
        &self.packs
    }

    /// Discover pack files in the objects/pack directory, newest first
    /// (matching C git's preference for recently written packs).
    fn discover_packs(objects_dir: &Path) -> Result<Vec<PackFile>, OdbError> {
        let pack_dir = objects_dir.join("pack");
        if !pack_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries: Vec<_> = std::fs::read_dir(&pack_dir)?
            .filter_map(|e| e.ok())
            .collect();

        entries.sort_by(|a, b| {
            let a_time = a.metadata().and_then(|m| m.modified()).ok();
            let b_time = b.metadata().and_then(|m| m.modified()).ok();
            b_time.cmp(&a_time)
        });

        let mut packs = Vec::new();
        for entry in entries {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "pack") {
                match PackFile::open(&path) {
                    Ok(pack) => packs.push(pack),
                    Err(_) => continue,
                }
            }
        }

        Ok(packs)
    }
}
