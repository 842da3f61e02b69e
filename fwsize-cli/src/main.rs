//! fwsize CLI - firmware size history charts

#![deny(warnings)]

// Global invariants enforced:
// - Deterministic output ordering
// - Identical input yields byte-for-byte identical output

mod logging;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use fwsize_core::config::{self, ResolvedConfig, DEFAULT_BUILD_DIR, DEFAULT_REPO_PATH};
use fwsize_core::series::MissingRecordPolicy;
use fwsize_core::GitError;
use std::path::PathBuf;
use std::process::exit;
use tracing::info;

#[derive(Parser)]
#[command(name = "fwsize")]
#[command(about = "Render interactive firmware size history charts for each hardware target")]
#[command(version = env!("FWSIZE_VERSION"))]
struct Cli {
    #[command(flatten)]
    locations: Locations,

    /// Log debug output (overridden by FWSIZE_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Defaults to rendering every chart
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct Locations {
    /// Directory holding commits.json; chart pages are written here
    #[arg(long, env = "BUILD_DIR", default_value = DEFAULT_BUILD_DIR, global = true)]
    build_dir: PathBuf,

    /// Local clone of the firmware repository
    #[arg(long = "repo", env = "PYBRICKS_PATH", default_value = DEFAULT_REPO_PATH, global = true)]
    repo_path: PathBuf,

    /// Path to config file (default: auto-discover)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one chart page per hardware target
    Render {
        /// Plot commits without build data as size 0 instead of failing
        #[arg(long)]
        allow_missing: bool,
    },
    /// Inspect the configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate the config file without rendering anything
    Validate,
    /// Show the resolved configuration (merged defaults + config file)
    Show,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::setup_logger(cli.verbose);

    let locations = &cli.locations;
    let resolved = || {
        config::load_and_resolve(
            &locations.build_dir,
            &locations.repo_path,
            locations.config.as_deref(),
        )
    };

    match cli.command.unwrap_or(Commands::Render {
        allow_missing: false,
    }) {
        Commands::Render { allow_missing } => {
            let mut config = resolved().context("failed to load configuration")?;
            if let Some(path) = &config.config_path {
                info!("using config: {}", path.display());
            }
            if allow_missing {
                config.missing_records = MissingRecordPolicy::Zero;
            }
            render(&config)
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate => match resolved() {
                Ok(config) => {
                    if let Some(ref p) = config.config_path {
                        println!("Config valid: {}", p.display());
                    } else {
                        println!("No config file found. Using defaults.");
                    }
                    Ok(())
                }
                Err(e) => {
                    eprintln!("Config validation failed: {:#}", e);
                    exit(1);
                }
            },
            ConfigAction::Show => {
                let config = resolved().context("failed to load configuration")?;
                print_config(&config);
                Ok(())
            }
        },
    }
}

fn render(config: &ResolvedConfig) -> anyhow::Result<()> {
    match fwsize_core::run(config) {
        Ok(summary) => {
            info!(
                "wrote {} charts from {} commits to {}",
                summary.charts.len(),
                summary.commits,
                config.build_dir.display()
            );
            Ok(())
        }
        Err(err) => {
            if let Some(GitError::RepositoryNotFound { .. }) = err.downcast_ref::<GitError>() {
                eprintln!("{}", err);
                eprintln!("try setting the PYBRICKS_PATH environment variable");
                exit(1);
            }
            Err(err)
        }
    }
}

fn print_config(config: &ResolvedConfig) {
    println!("Configuration:");
    if let Some(ref p) = config.config_path {
        println!("  Source: {}", p.display());
    } else {
        println!("  Source: defaults (no config file found)");
    }
    println!();
    println!("Locations:");
    println!("  build dir: {}", config.build_dir.display());
    println!("  repository: {}", config.repo_path.display());
    println!();
    println!("History:");
    println!("  initial commit: {}", config.initial_commit);
    println!("  branch: {}", config.branch);
    println!("  commit links: {}/commit/<hash>", config.repo_url);
    println!();
    println!("Charts:");
    println!("  targets: {}", config.targets.join(", "));
    println!("  title: {} <target> firmware size", config.title_prefix);
    println!("  window: {} commits", config.window);
    println!("  padding: {} bytes", config.padding);
    println!(
        "  missing build data: {}",
        match config.missing_records {
            MissingRecordPolicy::Fail => "fail",
            MissingRecordPolicy::Zero => "plot as 0",
        }
    );
}
