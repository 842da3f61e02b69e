//! Per-target size series
//!
//! Aligns the commit history with the build metadata and derives the size
//! change between consecutive builds of one hardware target.
//!
//! Global invariants enforced:
//! - One point per history commit, in chronological order
//! - The first point always has delta 0
//! - A missing size plots as 0 and never becomes the delta baseline

use crate::commits::{short_id, CommitMap};
use crate::git::CommitHistory;
use crate::html::hover_escape;
use thiserror::Error;
use tracing::warn;

/// Hover text for commits that have no build data at all
pub const NO_DATA_MESSAGE: &str = "(no build data)";

/// One plotted commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesPoint {
    /// Position in chronological order, starting at 0
    pub index: usize,
    pub short_id: String,
    /// Hover text (HTML): the headline, prefixed with the signed delta and
    /// followed by the commit date once a baseline size exists
    pub message: String,
    /// Size in bytes, 0 when the target did not build
    pub size: i64,
    pub delta: i64,
}

/// Lookup failures while aligning history with metadata
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectError {
    #[error("no build record for commit {oid}")]
    MissingRecord { oid: String },

    #[error("build record for commit {oid} has no size entry for target '{target}'")]
    MissingTarget { oid: String, target: String },
}

/// What to do with history commits that lack build data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingRecordPolicy {
    /// Abort selection with a [`SelectError`]
    #[default]
    Fail,
    /// Plot the commit as size 0
    Zero,
}

impl MissingRecordPolicy {
    fn tolerate(self, err: SelectError) -> Result<(), SelectError> {
        match self {
            MissingRecordPolicy::Fail => Err(err),
            MissingRecordPolicy::Zero => {
                warn!(%err, "plotting commit as size 0");
                Ok(())
            }
        }
    }
}

/// Build the size series for `target`
///
/// Walks `history` oldest first. A commit with a size becomes the baseline
/// for the next delta; a commit without one is plotted at 0 and leaves the
/// baseline untouched, so a gap never produces a spurious delta.
pub fn select(
    commit_map: &CommitMap,
    history: &CommitHistory,
    target: &str,
    policy: MissingRecordPolicy,
) -> Result<Vec<SeriesPoint>, SelectError> {
    let mut points = Vec::with_capacity(history.len());
    let mut prev_size = 0;

    for (index, oid) in history.oldest_first().enumerate() {
        let Some(record) = commit_map.get(oid) else {
            policy.tolerate(SelectError::MissingRecord {
                oid: oid.to_string(),
            })?;
            points.push(SeriesPoint {
                index,
                short_id: short_id(oid).to_string(),
                message: NO_DATA_MESSAGE.to_string(),
                size: 0,
                delta: 0,
            });
            continue;
        };

        let headline = hover_escape(&record.message_headline);

        let Some(size) = record.size_for(target) else {
            policy.tolerate(SelectError::MissingTarget {
                oid: oid.to_string(),
                target: target.to_string(),
            })?;
            points.push(SeriesPoint {
                index,
                short_id: record.short_id().to_string(),
                message: headline,
                size: 0,
                delta: 0,
            });
            continue;
        };

        let mut message = headline;
        let mut delta = 0;
        let size = match size {
            None => 0,
            Some(size) => {
                if prev_size != 0 {
                    delta = size - prev_size;
                    message = format!(
                        "{:+}<br />{}<br />{}",
                        delta,
                        message,
                        hover_escape(&record.committed_date)
                    );
                }
                prev_size = size;
                size
            }
        };

        points.push(SeriesPoint {
            index,
            short_id: record.short_id().to_string(),
            message,
            size,
            delta,
        });
    }

    Ok(points)
}
