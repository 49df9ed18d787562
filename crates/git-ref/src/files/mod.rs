pub(crate) mod loose;
pub mod packed;

use std::path::{Path, PathBuf};

use git_hash::ObjectId;

use crate::error::RefError;
use crate::name::RefName;
use crate::store::RefStore;
use crate::Reference;

use self::packed::PackedRefs;

/// Maximum depth for following symbolic ref chains.
const MAX_SYMREF_DEPTH: usize = 10;

/// Files-backend ref store (loose refs + packed-refs).
///
/// Matches C git's files backend layout:
/// - Loose refs stored as individual files under `.git/refs/` (and special
///   top-level files like `HEAD`).
/// - Packed refs in `.git/packed-refs` for efficiency.
/// - Loose refs take precedence over packed refs.
pub struct FilesRefStore {
    git_dir: PathBuf,
}

impl FilesRefStore {
    /// Open a files-based ref store rooted at the given git directory.
    pub fn new(git_dir: impl AsRef<Path>) -> Self {
        Self {
            git_dir: git_dir.as_ref().to_path_buf(),
        }
    }

    /// Get the git directory path.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Resolve a ref name, following symbolic ref chains up to MAX_SYMREF_DEPTH.
    fn resolve_inner(&self, name: &RefName, depth: usize) -> Result<Option<ObjectId>, RefError> {
        if depth > MAX_SYMREF_DEPTH {
            return Err(RefError::SymrefLoop(name.to_string()));
        }

        match loose::read_loose_ref(&self.git_dir, name)? {
            Some(Reference::Direct { target, .. }) => Ok(Some(target)),
            Some(Reference::Symbolic { target, .. }) => self.resolve_inner(&target, depth + 1),
            None => {
                let packed = PackedRefs::load(&self.git_dir)?;
                Ok(packed.find(name).map(|pr| pr.oid))
            }
        }
    }

    /// Load the packed-refs file.
    pub fn packed_refs(&self) -> Result<PackedRefs, RefError> {
        PackedRefs::load(&self.git_dir)
    }
}

impl RefStore for FilesRefStore {
    fn resolve(&self, name: &RefName) -> Result<Option<Reference>, RefError> {
        match loose::read_loose_ref(&self.git_dir, name)? {
            Some(r) => Ok(Some(r)),
            None => {
                let packed = PackedRefs::load(&self.git_dir)?;
                Ok(packed.find(name).map(|pr| Reference::Direct {
                    name: pr.name.clone(),
                    target: pr.oid,
                }))
            }
        }
    }

    fn resolve_to_oid(&self, name: &RefName) -> Result<Option<ObjectId>, RefError> {
        self.resolve_inner(name, 0)
    }

    fn iter(
        &self,
        prefix: Option<&str>,
    ) -> Result<Box<dyn Iterator<Item = Result<Reference, RefError>> + '_>, RefError> {
        let loose_refs = loose::enumerate_loose_refs(&self.git_dir, prefix)?;
        let mut loose_names: std::collections::HashSet<String> = std::collections::HashSet::new();

        let mut refs: Vec<Reference> = Vec::new();
        let mut errs: Vec<RefError> = Vec::new();

        for (name, _path) in &loose_refs {
            loose_names.insert(name.as_str().to_string());
            match loose::read_loose_ref(&self.git_dir, name) {
                Ok(Some(r)) => refs.push(r),
                Ok(None) => {} // file may have been removed between enumerate and read
                Err(e) => errs.push(e),
            }
        }

        let packed = PackedRefs::load(&self.git_dir)?;
        for pr in packed.refs() {
            if loose_names.contains(pr.name.as_str()) {
                continue; // loose ref takes precedence
            }
            if let Some(p) = prefix {
                if !pr.name.as_str().starts_with(p) {
                    continue;
                }
            }
            refs.push(Reference::Direct {
                name: pr.name.clone(),
                target: pr.oid,
            });
        }

        refs.sort_by(|a, b| a.name().cmp(b.name()));

        let all_refs = refs
            .into_iter()
            .map(Ok)
            .chain(errs.into_iter().map(Err))
            .collect::<Vec<_>>();

        Ok(Box::new(all_refs.into_iter()))
    }
}
