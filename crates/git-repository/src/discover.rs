use std::path::Path;

use crate::{DiscoveredRepo, RepoError, RepositoryKind};

/// Discover a git repository by walking up from `start`.
///
/// At each level, checks for a `.git` directory (working tree root) or for
/// the directory itself being a valid bare git directory, then proceeds to
/// the parent until the filesystem root is reached.
pub fn discover_git_dir(start: &Path) -> Result<DiscoveredRepo, RepoError> {
    let start = std::fs::canonicalize(start).map_err(|_| RepoError::NotFound(start.to_path_buf()))?;

    let mut current = start.clone();
    loop {
        let dot_git = current.join(".git");

        if dot_git.is_dir() && is_git_dir(&dot_git) {
            return Ok(DiscoveredRepo {
                git_dir: dot_git,
                work_tree: Some(current),
                kind: RepositoryKind::Normal,
            });
        }

        if is_git_dir(&current) {
            return Ok(DiscoveredRepo {
                git_dir: current,
                work_tree: None,
                kind: RepositoryKind::Bare,
            });
        }

        match current.parent() {
            Some(parent) if parent != current => current = parent.to_path_buf(),
            _ => return Err(RepoError::NotFound(start)),
        }
    }
}

/// Open a known git directory path directly.
pub fn open_git_dir(git_dir: &Path) -> Result<DiscoveredRepo, RepoError> {
    let git_dir =
        std::fs::canonicalize(git_dir).map_err(|_| RepoError::NotFound(git_dir.to_path_buf()))?;

    if !is_git_dir(&git_dir) {
        return Err(RepoError::InvalidGitDir {
            path: git_dir,
            reason: "missing HEAD, objects/, or refs/".to_string(),
        });
    }

    // A non-bare repository is reached as `<parent>/.git`.
    if let Some(parent) = git_dir.parent() {
        if parent.join(".git") == git_dir {
            return Ok(DiscoveredRepo {
                git_dir,
                work_tree: Some(parent.to_path_buf()),
                kind: RepositoryKind::Normal,
            });
        }
    }

    Ok(DiscoveredRepo {
        git_dir,
        work_tree: None,
        kind: RepositoryKind::Bare,
    })
}

/// Open a git dir when we know the working tree root (e.g., `path/.git` exists).
pub fn open_git_dir_from_work_tree(work_tree: &Path) -> Result<DiscoveredRepo, RepoError> {
    let dot_git = work_tree.join(".git");

    if dot_git.is_dir() {
        let dot_git = std::fs::canonicalize(&dot_git).map_err(|_| RepoError::NotFound(dot_git.clone()))?;
        let work_tree =
            std::fs::canonicalize(work_tree).map_err(|_| RepoError::NotFound(work_tree.to_path_buf()))?;
        return Ok(DiscoveredRepo {
            git_dir: dot_git,
            work_tree: Some(work_tree),
            kind: RepositoryKind::Normal,
        });
    }

    Err(RepoError::NotFound(work_tree.to_path_buf()))
}

/// Check if a directory looks like a git dir (has a readable `HEAD`, `objects/`, `refs/`).
pub fn is_git_dir(path: &Path) -> bool {
    path.join("HEAD").is_file() && path.join("objects").is_dir() && path.join("refs").is_dir()
}
