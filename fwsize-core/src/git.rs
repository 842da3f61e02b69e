//! Git history extraction
//!
//! Enumerates the commits between a fixed start commit and a branch tip.
//!
//! Global invariants enforced:
//! - Commit hash is the sole identity
//! - History order is exactly what `git rev-list` reports (newest first)
//! - Only the ancestry path is walked; independent histories that were
//!   merged in never appear
//!
//! Uses git CLI directly (no libgit2) for portability.

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Errors raised while talking to git
#[derive(Debug, Error)]
pub enum GitError {
    /// The configured path is not a usable (non-bare, non-empty) repository
    #[error("repository not found at '{}': {reason}", path.display())]
    RepositoryNotFound { path: PathBuf, reason: String },

    #[error("failed to invoke git")]
    Spawn(#[source] std::io::Error),

    #[error("git {args:?} failed: {stderr}")]
    Command { args: Vec<String>, stderr: String },
}

/// Execute a git command in a specific directory and return the trimmed stdout
fn git_at(repo_path: &Path, args: &[&str]) -> Result<String, GitError> {
    debug!(repo = %repo_path.display(), ?args, "running git");

    let output = Command::new("git")
        .current_dir(repo_path)
        .args(args)
        .output()
        .map_err(GitError::Spawn)?;

    if !output.status.success() {
        return Err(GitError::Command {
            args: args.iter().map(|a| a.to_string()).collect(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Ordered commit ids between the start commit (exclusive) and the branch tip
/// (inclusive)
///
/// Stored newest first, the order git produces them in. Consumers that need
/// chronological order use [`CommitHistory::oldest_first`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitHistory {
    newest_first: Vec<String>,
}

impl CommitHistory {
    pub fn from_newest_first(ids: Vec<String>) -> Self {
        CommitHistory { newest_first: ids }
    }

    pub fn from_oldest_first(mut ids: Vec<String>) -> Self {
        ids.reverse();
        CommitHistory { newest_first: ids }
    }

    pub fn len(&self) -> usize {
        self.newest_first.len()
    }

    pub fn is_empty(&self) -> bool {
        self.newest_first.is_empty()
    }

    pub fn newest_first(&self) -> &[String] {
        &self.newest_first
    }

    /// Iterate commit ids in chronological order
    pub fn oldest_first(&self) -> impl Iterator<Item = &str> + '_ {
        self.newest_first.iter().rev().map(String::as_str)
    }
}

/// Read-only handle to a local repository
#[derive(Debug, Clone)]
pub struct Repository {
    path: PathBuf,
}

impl Repository {
    /// Open the repository at `path`
    ///
    /// # Errors
    ///
    /// Returns [`GitError::RepositoryNotFound`] if:
    /// - The path is not a directory
    /// - The path is not inside a git work tree or git dir
    /// - The repository is bare
    /// - The repository has no commits
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let not_found = |reason: String| GitError::RepositoryNotFound {
            path: path.to_path_buf(),
            reason,
        };

        if !path.is_dir() {
            return Err(not_found("no such directory".to_string()));
        }

        let is_bare = git_at(path, &["rev-parse", "--is-bare-repository"])
            .map_err(|e| not_found(e.to_string()))?;
        if is_bare == "true" {
            return Err(not_found("repository is bare".to_string()));
        }

        let any_commit = git_at(path, &["rev-list", "-n", "1", "--all"])
            .map_err(|e| not_found(e.to_string()))?;
        if any_commit.is_empty() {
            return Err(not_found("repository has no commits".to_string()));
        }

        Ok(Repository {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve a revision (branch, tag, abbreviated hash) to a full commit hash
    pub fn resolve(&self, rev: &str) -> Result<String, GitError> {
        let spec = format!("{}^{{commit}}", rev);
        git_at(&self.path, &["rev-parse", "--verify", "--quiet", &spec])
    }

    /// Commits reachable from `branch` that descend from `start`
    ///
    /// Equivalent to `git rev-list --ancestry-path <start>..<branch>`: the
    /// start commit itself is excluded, the branch tip is included, and
    /// side histories that do not descend from `start` are skipped.
    pub fn mainline_history(&self, start: &str, branch: &str) -> Result<CommitHistory, GitError> {
        let range = format!("{}..{}", start, branch);
        let output = git_at(&self.path, &["rev-list", "--ancestry-path", &range, "--"])?;

        let ids = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();

        debug!(range = %range, commits = ids.len(), "loaded mainline history");

        Ok(CommitHistory::from_newest_first(ids))
    }
}
