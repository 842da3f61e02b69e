//! Firmware build metadata
//!
//! Loads `commits.json`: one record per commit, carrying the firmware size of
//! every hardware target that was built for that commit.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Number of hash digits shown for a commit
pub const HASH_SIZE: usize = 8;

/// File name of the metadata log inside the build directory
pub const COMMITS_FILE: &str = "commits.json";

/// Build metadata for a single commit
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    pub oid: String,
    pub message_headline: String,
    pub committed_date: String,
    /// Size in bytes per target; `None` when that target did not build
    pub firmware_size: BTreeMap<String, Option<i64>>,
}

impl CommitRecord {
    pub fn short_id(&self) -> &str {
        short_id(&self.oid)
    }

    /// Size entry for `target`
    ///
    /// Outer `None`: the record has no entry for the target at all.
    /// Inner `None`: the target is listed but has no size.
    pub fn size_for(&self, target: &str) -> Option<Option<i64>> {
        self.firmware_size.get(target).copied()
    }
}

/// First [`HASH_SIZE`] characters of a commit id
pub fn short_id(oid: &str) -> &str {
    match oid.char_indices().nth(HASH_SIZE) {
        Some((end, _)) => &oid[..end],
        None => oid,
    }
}

/// Build records keyed by full commit id
#[derive(Debug, Clone, Default)]
pub struct CommitMap {
    records: HashMap<String, CommitRecord>,
}

impl CommitMap {
    pub fn get(&self, oid: &str) -> Option<&CommitRecord> {
        self.records.get(oid)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Later records replace earlier ones with the same id
impl FromIterator<CommitRecord> for CommitMap {
    fn from_iter<I: IntoIterator<Item = CommitRecord>>(iter: I) -> Self {
        CommitMap {
            records: iter
                .into_iter()
                .map(|record| (record.oid.clone(), record))
                .collect(),
        }
    }
}

/// Path of the metadata log for a build directory
pub fn commits_path(build_dir: &Path) -> PathBuf {
    build_dir.join(COMMITS_FILE)
}

/// Parse a JSON array of commit records
pub fn parse_commit_map(json: &str) -> Result<CommitMap> {
    let records: Vec<CommitRecord> =
        serde_json::from_str(json).context("failed to parse commit records")?;
    Ok(records.into_iter().collect())
}

/// Load the commit map from a `commits.json` file
pub fn load_commit_map(path: &Path) -> Result<CommitMap> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read commit log: {}", path.display()))?;

    let map = parse_commit_map(&content)
        .with_context(|| format!("invalid commit log: {}", path.display()))?;

    debug!(path = %path.display(), records = map.len(), "loaded commit log");
    Ok(map)
}
