//! fwsize core library - firmware size history charts

#![deny(warnings)]

// Global invariants enforced in this crate:
// - Targets are processed sequentially in configured order
// - No global mutable state
// - No randomness, clocks, threads, or async
// - History order is taken verbatim from git, then reversed once
// - Identical input yields byte-for-byte identical output

pub mod chart;
pub mod commits;
pub mod config;
pub mod git;
pub mod html;
pub mod series;
pub mod window;

pub use commits::{CommitMap, CommitRecord};
pub use config::ResolvedConfig;
pub use git::{CommitHistory, GitError, Repository};
pub use series::{MissingRecordPolicy, SelectError, SeriesPoint};

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};

/// One chart page written by [`run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartOutput {
    pub target: String,
    pub path: PathBuf,
    pub points: usize,
}

/// Result of a full run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub commits: usize,
    pub charts: Vec<ChartOutput>,
}

/// Render the chart page for one target and return its HTML
pub fn render_target(
    config: &ResolvedConfig,
    commit_map: &CommitMap,
    history: &CommitHistory,
    target: &str,
) -> Result<(String, usize)> {
    let points = series::select(commit_map, history, target, config.missing_records)
        .with_context(|| format!("failed to build size series for {}", target))?;

    let view = window::view_window(&points, config.window, config.padding);
    let figure = chart::build_figure(&config.title_prefix, target, &points, &view);
    let options = html::PageOptions {
        target,
        title_prefix: &config.title_prefix,
        repo_url: &config.repo_url,
    };
    let page = html::render_chart_page(&figure, &options)
        .with_context(|| format!("failed to render chart for {}", target))?;

    Ok((page, points.len()))
}

/// Render and write the chart page of every configured target
///
/// Stops at the first target that fails; pages already written stay.
pub fn render_all(
    config: &ResolvedConfig,
    commit_map: &CommitMap,
    history: &CommitHistory,
) -> Result<Vec<ChartOutput>> {
    let mut charts = Vec::with_capacity(config.targets.len());

    for target in &config.targets {
        info!("creating plot for {}", target);

        let (page, points) = render_target(config, commit_map, history, target)?;
        let path = html::write_chart_page(&config.build_dir, target, &page)?;

        debug!(path = %path.display(), points, "wrote chart");
        charts.push(ChartOutput {
            target: target.clone(),
            path,
            points,
        });
    }

    Ok(charts)
}

/// Run the whole pipeline: history, metadata, one chart per target
///
/// # Errors
///
/// Repository problems surface as [`GitError`] in the error chain so callers
/// can tell them apart from data errors.
pub fn run(config: &ResolvedConfig) -> Result<RunSummary> {
    let repo = Repository::open(&config.repo_path)?;

    let tip = repo
        .resolve(&config.branch)
        .with_context(|| format!("failed to resolve branch {}", config.branch))?;

    let history = repo
        .mainline_history(&config.initial_commit, &config.branch)
        .with_context(|| {
            format!(
                "failed to list commits {}..{}",
                config.initial_commit, config.branch
            )
        })?;
    info!(
        "found {} commits between {} and {} ({})",
        history.len(),
        commits::short_id(&config.initial_commit),
        config.branch,
        commits::short_id(&tip)
    );

    let commit_map = commits::load_commit_map(&commits::commits_path(&config.build_dir))?;

    let charts = render_all(config, &commit_map, &history)?;

    Ok(RunSummary {
        commits: history.len(),
        charts,
    })
}
