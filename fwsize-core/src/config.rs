//! Configuration file support for fwsize
//!
//! Loads chart settings from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `fwsize.config.json` in the build directory
//! 3. `.fwsizerc.json` in the repository root
//!
//! All fields are optional. Built-in defaults describe the
//! pybricks-micropython firmware; CLI flags take precedence over config
//! file values.

use crate::series::MissingRecordPolicy;
use crate::window::{DEFAULT_PADDING, DEFAULT_WINDOW};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Hardware targets charted when no config overrides them
pub const DEFAULT_TARGETS: &[&str] = &[
    "cityhub",
    "technichub",
    "movehub",
    "primehub",
    "essentialhub",
    "nxt",
    "ev3",
];

/// First commit of the tracked history; it and its ancestors are excluded
pub const INITIAL_COMMIT: &str = "281d6ffa6a182f502e81ae0c4ff9b71f6e674f71";

/// Branch whose history is charted
pub const DEFAULT_BRANCH: &str = "origin/master";

/// Web URL commit links point into
pub const DEFAULT_REPO_URL: &str = "https://github.com/pybricks/pybricks-micropython";

pub const DEFAULT_TITLE_PREFIX: &str = "Pybricks";

pub const DEFAULT_BUILD_DIR: &str = "build";

pub const DEFAULT_REPO_PATH: &str = ".";

/// Largest accepted `window`; far beyond any real commit history
pub const MAX_WINDOW: usize = 1_000_000;

/// Largest accepted `padding` in bytes (1 GiB)
pub const MAX_PADDING: i64 = 1 << 30;

/// Config file looked up in the build directory
pub const BUILD_DIR_CONFIG: &str = "fwsize.config.json";

/// Config file looked up in the repository root
pub const REPO_CONFIG: &str = ".fwsizerc.json";

/// fwsize configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FwsizeConfig {
    /// Hardware targets to chart, in output order
    #[serde(default)]
    pub targets: Option<Vec<String>>,

    /// Start of the tracked history (exclusive)
    #[serde(default)]
    pub initial_commit: Option<String>,

    /// Branch or ref whose history is charted
    #[serde(default)]
    pub branch: Option<String>,

    /// Repository web URL used for commit links
    #[serde(default)]
    pub repo_url: Option<String>,

    /// First word of every chart title
    #[serde(default)]
    pub title_prefix: Option<String>,

    /// Number of commits visible when a chart opens
    #[serde(default)]
    pub window: Option<usize>,

    /// Axis headroom in bytes around the visible values
    #[serde(default)]
    pub padding: Option<i64>,

    /// Plot commits without build data as size 0 instead of failing
    #[serde(default)]
    pub allow_missing: Option<bool>,
}

/// Resolved configuration with every value filled in
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Directory holding `commits.json` and receiving the chart pages
    pub build_dir: PathBuf,
    /// Local clone whose history is walked
    pub repo_path: PathBuf,
    pub targets: Vec<String>,
    pub initial_commit: String,
    pub branch: String,
    pub repo_url: String,
    pub title_prefix: String,
    pub window: usize,
    pub padding: i64,
    pub missing_records: MissingRecordPolicy,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

fn is_safe_target_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl FwsizeConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(ref targets) = self.targets {
            if targets.is_empty() {
                anyhow::bail!("targets must not be empty");
            }
            let mut seen = HashSet::new();
            for target in targets {
                // Target names become file names and element ids
                if !is_safe_target_name(target) {
                    anyhow::bail!(
                        "targets: '{}' may only contain letters, digits, '-' and '_'",
                        target
                    );
                }
                if !seen.insert(target.as_str()) {
                    anyhow::bail!("targets: '{}' is listed more than once", target);
                }
            }
        }

        if let Some(ref commit) = self.initial_commit {
            let len_ok = (4..=40).contains(&commit.len());
            if !len_ok || !commit.chars().all(|c| c.is_ascii_hexdigit()) {
                anyhow::bail!(
                    "initial_commit must be 4 to 40 hex digits (got '{}')",
                    commit
                );
            }
        }

        if let Some(ref branch) = self.branch {
            if branch.trim().is_empty() {
                anyhow::bail!("branch must not be empty");
            }
        }

        if let Some(ref url) = self.repo_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                anyhow::bail!("repo_url must start with http:// or https:// (got '{}')", url);
            }
        }

        if let Some(ref prefix) = self.title_prefix {
            if prefix.trim().is_empty() {
                anyhow::bail!("title_prefix must not be empty");
            }
        }

        if let Some(window) = self.window {
            if !(1..=MAX_WINDOW).contains(&window) {
                anyhow::bail!("window must be between 1 and {} (got {})", MAX_WINDOW, window);
            }
        }

        if let Some(padding) = self.padding {
            if !(0..=MAX_PADDING).contains(&padding) {
                anyhow::bail!("padding must be between 0 and {} (got {})", MAX_PADDING, padding);
            }
        }

        Ok(())
    }

    /// Resolve config into concrete values for the given locations
    pub fn resolve(&self, build_dir: &Path, repo_path: &Path) -> Result<ResolvedConfig> {
        self.validate()?;

        let targets = match &self.targets {
            Some(targets) => targets.clone(),
            None => DEFAULT_TARGETS.iter().map(|t| t.to_string()).collect(),
        };

        let missing_records = if self.allow_missing.unwrap_or(false) {
            MissingRecordPolicy::Zero
        } else {
            MissingRecordPolicy::Fail
        };

        Ok(ResolvedConfig {
            build_dir: build_dir.to_path_buf(),
            repo_path: repo_path.to_path_buf(),
            targets,
            initial_commit: self
                .initial_commit
                .clone()
                .unwrap_or_else(|| INITIAL_COMMIT.to_string()),
            branch: self
                .branch
                .clone()
                .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            repo_url: self
                .repo_url
                .clone()
                .unwrap_or_else(|| DEFAULT_REPO_URL.to_string()),
            title_prefix: self
                .title_prefix
                .clone()
                .unwrap_or_else(|| DEFAULT_TITLE_PREFIX.to_string()),
            window: self.window.unwrap_or(DEFAULT_WINDOW),
            padding: self.padding.unwrap_or(DEFAULT_PADDING),
            missing_records,
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults(build_dir: &Path, repo_path: &Path) -> Result<Self> {
        FwsizeConfig::default().resolve(build_dir, repo_path)
    }
}

/// Pick the config file to use, if any
///
/// An explicit path is returned as is, even when it does not exist, so that
/// reading it reports the mistake. Otherwise the build directory is checked
/// before the repository root.
pub fn locate_config(
    build_dir: &Path,
    repo_path: &Path,
    explicit: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    [build_dir.join(BUILD_DIR_CONFIG), repo_path.join(REPO_CONFIG)]
        .into_iter()
        .find(|candidate| candidate.is_file())
}

/// Parse and validate one config file
pub fn read_config(path: &Path) -> Result<FwsizeConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read fwsize config {}", path.display()))?;
    let config: FwsizeConfig = serde_json::from_str(&text)
        .with_context(|| format!("malformed fwsize config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("rejected fwsize config {}", path.display()))?;
    Ok(config)
}

/// Resolve the settings for one run
///
/// Falls back to the built-in pybricks defaults when no config file exists.
pub fn load_and_resolve(
    build_dir: &Path,
    repo_path: &Path,
    explicit: Option<&Path>,
) -> Result<ResolvedConfig> {
    let Some(path) = locate_config(build_dir, repo_path, explicit) else {
        return ResolvedConfig::defaults(build_dir, repo_path);
    };

    let mut resolved = read_config(&path)?.resolve(build_dir, repo_path)?;
    resolved.config_path = Some(path);
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn resolve_json(json: &str) -> Result<ResolvedConfig> {
        let config: FwsizeConfig = serde_json::from_str(json)?;
        config.resolve(Path::new("build"), Path::new("."))
    }

    #[test]
    fn test_default_config_is_valid() {
        let resolved = ResolvedConfig::defaults(Path::new("build"), Path::new(".")).unwrap();
        assert_eq!(resolved.targets.len(), 7);
        assert_eq!(resolved.targets[0], "cityhub");
        assert_eq!(resolved.targets[6], "ev3");
        assert_eq!(resolved.initial_commit, INITIAL_COMMIT);
        assert_eq!(resolved.branch, "origin/master");
        assert_eq!(resolved.repo_url, DEFAULT_REPO_URL);
        assert_eq!(resolved.window, 100);
        assert_eq!(resolved.padding, 64);
        assert_eq!(resolved.missing_records, MissingRecordPolicy::Fail);
        assert!(resolved.config_path.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let resolved = resolve_json(
            r#"{
            "targets": ["primehub", "ev3"],
            "initial_commit": "abcdef12",
            "branch": "main",
            "repo_url": "https://example.com/fw",
            "title_prefix": "Acme",
            "window": 25,
            "padding": 0,
            "allow_missing": true
        }"#,
        )
        .unwrap();

        assert_eq!(resolved.targets, vec!["primehub", "ev3"]);
        assert_eq!(resolved.initial_commit, "abcdef12");
        assert_eq!(resolved.branch, "main");
        assert_eq!(resolved.repo_url, "https://example.com/fw");
        assert_eq!(resolved.title_prefix, "Acme");
        assert_eq!(resolved.window, 25);
        assert_eq!(resolved.padding, 0);
        assert_eq!(resolved.missing_records, MissingRecordPolicy::Zero);
    }

    #[test]
    fn test_reject_unknown_fields() {
        let result: Result<FwsizeConfig, _> = serde_json::from_str(r#"{"hubs": []}"#);
        assert!(result.is_err(), "unknown fields should be rejected");
    }

    #[test]
    fn test_reject_bad_targets() {
        assert!(resolve_json(r#"{"targets": []}"#).is_err());
        assert!(resolve_json(r#"{"targets": ["ev3", "ev3"]}"#).is_err());
        assert!(resolve_json(r#"{"targets": ["../etc"]}"#).is_err());
        assert!(resolve_json(r#"{"targets": ["prime hub"]}"#).is_err());
    }

    #[test]
    fn test_reject_bad_values() {
        assert!(resolve_json(r#"{"initial_commit": "xyz"}"#).is_err());
        assert!(resolve_json(r#"{"initial_commit": "abc"}"#).is_err());
        assert!(resolve_json(r#"{"branch": "  "}"#).is_err());
        assert!(resolve_json(r#"{"repo_url": "github.com/x"}"#).is_err());
        assert!(resolve_json(r#"{"title_prefix": ""}"#).is_err());
        assert!(resolve_json(r#"{"window": 0}"#).is_err());
        assert!(resolve_json(r#"{"padding": -1}"#).is_err());
    }

    #[test]
    fn test_reject_oversized_window_and_padding() {
        let huge_window = format!(r#"{{"window": {}}}"#, usize::MAX);
        let huge_padding = format!(r#"{{"padding": {}}}"#, i64::MAX);
        assert!(resolve_json(&huge_window).is_err());
        assert!(resolve_json(&huge_padding).is_err());
        assert!(resolve_json(&format!(r#"{{"window": {}}}"#, MAX_WINDOW + 1)).is_err());
        assert!(resolve_json(&format!(r#"{{"padding": {}}}"#, MAX_PADDING + 1)).is_err());

        let edge = resolve_json(&format!(
            r#"{{"window": {}, "padding": {}}}"#,
            MAX_WINDOW, MAX_PADDING
        ))
        .unwrap();
        assert_eq!(edge.window, MAX_WINDOW);
        assert_eq!(edge.padding, MAX_PADDING);
    }

    #[test]
    fn test_build_dir_config_found_first() {
        let build = tempfile::tempdir().unwrap();
        let repo = tempfile::tempdir().unwrap();
        fs::write(build.path().join(BUILD_DIR_CONFIG), r#"{"window": 10}"#).unwrap();
        fs::write(repo.path().join(REPO_CONFIG), r#"{"window": 20}"#).unwrap();

        let path = locate_config(build.path(), repo.path(), None).unwrap();
        assert_eq!(path, build.path().join(BUILD_DIR_CONFIG));
        assert_eq!(read_config(&path).unwrap().window, Some(10));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let build = tempfile::tempdir().unwrap();
        let explicit = build.path().join("absent.json");

        assert_eq!(
            locate_config(build.path(), build.path(), Some(&explicit)),
            Some(explicit.clone())
        );
        let err = load_and_resolve(build.path(), build.path(), Some(&explicit)).unwrap_err();
        assert!(format!("{:#}", err).contains("absent.json"));
    }

    #[test]
    fn test_config_directory_is_skipped() {
        let build = tempfile::tempdir().unwrap();
        fs::create_dir(build.path().join(BUILD_DIR_CONFIG)).unwrap();
        assert!(locate_config(build.path(), build.path(), None).is_none());
    }

    #[test]
    fn test_discover_repo_config() {
        let build = tempfile::tempdir().unwrap();
        let repo = tempfile::tempdir().unwrap();
        fs::write(repo.path().join(REPO_CONFIG), r#"{"window": 20}"#).unwrap();

        let resolved = load_and_resolve(build.path(), repo.path(), None).unwrap();
        assert_eq!(resolved.window, 20);
        assert_eq!(resolved.config_path, Some(repo.path().join(REPO_CONFIG)));
    }

    #[test]
    fn test_explicit_path_wins() {
        let build = tempfile::tempdir().unwrap();
        fs::write(build.path().join(BUILD_DIR_CONFIG), r#"{"window": 10}"#).unwrap();
        let explicit = build.path().join("custom.json");
        fs::write(&explicit, r#"{"window": 30}"#).unwrap();

        let resolved = load_and_resolve(build.path(), build.path(), Some(&explicit)).unwrap();
        assert_eq!(resolved.window, 30);
        assert_eq!(resolved.config_path, Some(explicit));
    }

    #[test]
    fn test_no_config_uses_defaults() {
        let build = tempfile::tempdir().unwrap();
        let resolved = load_and_resolve(build.path(), build.path(), None).unwrap();
        assert!(resolved.config_path.is_none());
        assert_eq!(resolved.build_dir, build.path());
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let build = tempfile::tempdir().unwrap();
        let path = build.path().join(BUILD_DIR_CONFIG);
        fs::write(&path, r#"{"window": 0}"#).unwrap();

        let err = load_and_resolve(build.path(), build.path(), None).unwrap_err();
        assert!(format!("{:#}", err).contains(BUILD_DIR_CONFIG));
    }
}
