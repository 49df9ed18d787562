//! Repository discovery and the central read-only access point for ref and
//! object lookups.
//!
//! `Repository::open`/`discover` locate a git directory, eagerly read its
//! branch table, and hand back a handle through which callers list branches,
//! walk commit history, expand tree entries, and fetch raw object content —
//! the five operations this crate surfaces. There is no write path: nothing
//! here ever creates, updates, or removes an object or a ref.

mod discover;
mod error;

pub use error::RepoError;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use git_hash::ObjectId;
use git_object::{Commit, Object, ObjectType, Tree, TreeEntry};
use git_odb::ObjectDatabase;
use git_ref::{FilesRefStore, RefName, RefStore, Reference};

/// Type of repository, derived from its on-disk layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryKind {
    /// Normal repo reached via a working tree's `.git` directory.
    Normal,
    /// Bare repo (no working tree; the path given to `open` *is* the git dir).
    Bare,
}

/// Result of repository discovery before full opening.
#[derive(Debug)]
pub struct DiscoveredRepo {
    pub git_dir: PathBuf,
    pub work_tree: Option<PathBuf>,
    pub kind: RepositoryKind,
}

/// A single parsed commit in a history walk, alongside its own hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub oid: ObjectId,
    pub commit: Commit,
}

/// A single entry produced by expanding a tree object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeListing {
    pub oid: ObjectId,
    pub name: String,
    pub is_directory: bool,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("git_dir", &self.git_dir)
            .field("work_tree", &self.work_tree)
            .field("kind", &self.kind)
            .field("branches", &self.branches.len())
            .finish_non_exhaustive()
    }
}

/// The central repository handle: ref discovery and the object facade tied
/// together behind `open(directory)`.
pub struct Repository {
    git_dir: PathBuf,
    work_tree: Option<PathBuf>,
    kind: RepositoryKind,
    odb: ObjectDatabase,
    refs: FilesRefStore,
    /// Branch name (short, under `refs/heads/`) → tip commit hash, discovered
    /// eagerly at open time. Invariant: nonempty for any successfully opened
    /// repository.
    branches: BTreeMap<String, ObjectId>,
}

impl Repository {
    /// Open an existing repository at the given path.
    ///
    /// `path` may point to either the `.git` directory (or a bare repo root)
    /// or the working tree root above it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let path = path.as_ref();
        let discovered = if discover::is_git_dir(path) {
            discover::open_git_dir(path)?
        } else if path.join(".git").exists() {
            discover::open_git_dir_from_work_tree(path)?
        } else {
            return Err(RepoError::NotFound(path.to_path_buf()));
        };
        Self::from_discovered(discovered)
    }

    /// Discover a repository starting from the given directory, walking up.
    pub fn discover(start: impl AsRef<Path>) -> Result<Self, RepoError> {
        let discovered = discover::discover_git_dir(start.as_ref())?;
        Self::from_discovered(discovered)
    }

    fn from_discovered(discovered: DiscoveredRepo) -> Result<Self, RepoError> {
        let DiscoveredRepo {
            git_dir,
            work_tree,
            kind,
        } = discovered;

        let odb = ObjectDatabase::open(git_dir.join("objects"))?;
        let refs = FilesRefStore::new(&git_dir);

        let branches = discover_branches(&refs)?;
        if branches.is_empty() {
            return Err(RepoError::NoBranches);
        }

        Ok(Repository {
            git_dir,
            work_tree,
            kind,
            odb,
            refs,
            branches,
        })
    }

    // --- Path / kind accessors ---

    /// Path to the git directory.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Path to the working tree (None for bare repos).
    pub fn work_tree(&self) -> Option<&Path> {
        self.work_tree.as_deref()
    }

    /// Repository kind.
    pub fn kind(&self) -> RepositoryKind {
        self.kind
    }

    /// Is this a bare repository?
    pub fn is_bare(&self) -> bool {
        self.kind == RepositoryKind::Bare
    }

    // --- Subsystem accessors ---

    /// Access the object database.
    pub fn odb(&self) -> &ObjectDatabase {
        &self.odb
    }

    /// Access the reference store.
    pub fn refs(&self) -> &FilesRefStore {
        &self.refs
    }

    /// Hash algorithm in use. Hardcoded to SHA-1 — there is no configuration
    /// surface in this core to select SHA-256 via `extensions.objectformat`.
    pub fn hash_algo(&self) -> git_hash::HashAlgorithm {
        git_hash::HashAlgorithm::Sha1
    }

    // --- Public operations ---

    /// List discovered branch names in sorted order.
    pub fn list_branches(&self) -> Vec<&str> {
        self.branches.keys().map(String::as_str).collect()
    }

    /// Look up a branch's tip commit hash by short name.
    pub fn branch_oid(&self, name: &str) -> Option<ObjectId> {
        self.branches.get(name).copied()
    }

    /// Walk the first-parent ancestor chain of a branch tip, child before
    /// parent. The full parent list remains on each `Commit` for callers
    /// that want merge topology.
    pub fn history(&self, branch: &str) -> Result<Vec<HistoryEntry>, RepoError> {
        let tip = self
            .branch_oid(branch)
            .ok_or_else(|| RepoError::BranchNotFound(branch.to_string()))?;
        self.history_from(tip)
    }

    /// Walk the first-parent ancestor chain starting at an arbitrary commit.
    pub fn history_from(&self, start: ObjectId) -> Result<Vec<HistoryEntry>, RepoError> {
        let mut entries = Vec::new();
        let mut current = Some(start);

        while let Some(oid) = current {
            let object = self
                .odb
                .read(&oid)?
                .ok_or(RepoError::ObjectNotFound(oid))?;
            let commit = match object {
                Object::Commit(c) => c,
                other => {
                    return Err(RepoError::Object(git_object::ObjectError::InvalidHeader(
                        format!("expected commit, got {}", other.object_type()),
                    )))
                }
            };
            current = commit.first_parent().copied();
            entries.push(HistoryEntry { oid, commit });
        }

        Ok(entries)
    }

    /// Expand a tree object into its direct child entries.
    pub fn commit_tree_entries(&self, tree_oid: &ObjectId) -> Result<Vec<TreeListing>, RepoError> {
        let object = self
            .odb
            .read(tree_oid)?
            .ok_or(RepoError::ObjectNotFound(*tree_oid))?;
        let tree: Tree = match object {
            Object::Tree(t) => t,
            other => {
                return Err(RepoError::Object(git_object::ObjectError::InvalidHeader(
                    format!("expected tree, got {}", other.object_type()),
                )))
            }
        };

        Ok(tree
            .entries
            .iter()
            .map(|entry: &TreeEntry| TreeListing {
                oid: entry.oid,
                name: entry.name.to_string(),
                is_directory: entry.mode.is_tree(),
            })
            .collect())
    }

    /// Fetch the raw content bytes of any object by hash (header stripped).
    pub fn object(&self, oid: &ObjectId) -> Result<Vec<u8>, RepoError> {
        let object = self.odb.read(oid)?.ok_or(RepoError::ObjectNotFound(*oid))?;
        Ok(object.serialize_content())
    }

    /// Fetch an object's type without materializing its full content.
    pub fn object_type(&self, oid: &ObjectId) -> Result<ObjectType, RepoError> {
        let info = self
            .odb
            .read_header(oid)?
            .ok_or(RepoError::ObjectNotFound(*oid))?;
        Ok(info.obj_type)
    }

    // --- Convenience accessors (HEAD) ---

    /// Resolve HEAD to an OID.
    pub fn head_oid(&self) -> Result<Option<ObjectId>, RepoError> {
        let head_ref = RefName::new("HEAD").map_err(RepoError::from)?;
        Ok(self.refs.resolve_to_oid(&head_ref)?)
    }

    /// Get the current branch name (None if detached HEAD).
    pub fn current_branch(&self) -> Result<Option<String>, RepoError> {
        let head_ref = RefName::new("HEAD").map_err(RepoError::from)?;
        match self.refs.resolve(&head_ref)? {
            Some(Reference::Symbolic { target, .. }) => {
                let name = target.as_str();
                let branch = name.strip_prefix("refs/heads/").unwrap_or(name);
                Ok(Some(branch.to_string()))
            }
            Some(Reference::Direct { .. }) => Ok(None), // detached HEAD
            None => Ok(None),
        }
    }

    /// Is HEAD an unborn branch (symbolic, but the target ref does not exist)?
    pub fn is_unborn(&self) -> Result<bool, RepoError> {
        let head_ref = RefName::new("HEAD").map_err(RepoError::from)?;
        match self.refs.resolve(&head_ref)? {
            Some(Reference::Symbolic { target, .. }) => {
                Ok(self.refs.resolve_to_oid(&target)?.is_none())
            }
            Some(Reference::Direct { .. }) => Ok(false),
            None => Ok(true),
        }
    }
}

/// Discover the branch table: every ref under `refs/heads/`, whether it
/// lives as a loose file or only inside `packed-refs`.
fn discover_branches(refs: &FilesRefStore) -> Result<BTreeMap<String, ObjectId>, RepoError> {
    let mut branches = BTreeMap::new();

    for reference in refs.iter(Some("refs/heads/"))? {
        let reference = reference?;
        let short = reference
            .name()
            .as_str()
            .strip_prefix("refs/heads/")
            .unwrap_or(reference.name().as_str())
            .to_string();
        let oid = reference.peel_to_oid(refs)?;
        branches.insert(short, oid);
    }

    Ok(branches)
}
