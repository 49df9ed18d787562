use std::path::PathBuf;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not a git repository (or any of the parent directories): {0}")]
    NotFound(PathBuf),

    #[error("invalid git directory: {path}: {reason}")]
    InvalidGitDir { path: PathBuf, reason: String },

    #[error("no branches discoverable under refs/heads or packed-refs")]
    NoBranches,

    #[error("branch not found: {0}")]
    BranchNotFound(String),

    #[error(transparent)]
    Odb(#[from] git_odb::OdbError),

    #[error(transparent)]
    Ref(#[from] git_ref::RefError),

    #[error(transparent)]
    Object(#[from] git_object::ObjectError),

    #[error("object not found: {0}")]
    ObjectNotFound(git_hash::ObjectId),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
