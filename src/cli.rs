// Command-line interface.
// Parses arguments, sets up logging, and runs the collection pipeline.

use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::ads::AdsClient;
use crate::cache;
use crate::config::Parameters;
use crate::error::{Result, StatsError};
use crate::github::GitHubClient;
use crate::observer::TracingObserver;
use crate::report::{self, RepoReport};
use crate::runner;

/// Collect GitHub repository history and report contributor statistics
#[derive(Debug, Parser)]
#[command(name = "repo-stats")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// GitHub personal access token
    #[arg(short = 'g', long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub git_token: Option<String>,

    /// NASA ADS API token, needed when a repository lists bibcodes
    #[arg(short = 'a', long, env = "ADS_TOKEN", hide_env_values = true)]
    pub ads_token: Option<String>,

    /// JSON parameter file naming the repositories to analyze
    #[arg(short = 'p', long, default_value = "parameters.json")]
    pub parameter_file: PathBuf,

    /// Directory for record caches and reports (default: platform cache directory)
    #[arg(short = 'c', long)]
    pub cache_dir: Option<PathBuf>,

    /// Open an interactive dashboard after the run
    #[arg(long)]
    pub dashboard: bool,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn cache_root(&self) -> Result<PathBuf> {
        self.cache_dir
            .clone()
            .or_else(cache::cache_dir)
            .ok_or_else(|| StatsError::Other("could not determine a cache directory".to_string()))
    }
}

/// Install the stderr log subscriber. `RUST_LOG` directives are kept.
pub fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

/// Run the pipeline described by the command line.
///
/// Returns the per-repository reports and the summary template, for the dashboard.
pub async fn execute(cli: &Cli) -> Result<(Vec<RepoReport>, String)> {
    let token = cli
        .git_token
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or(StatsError::MissingToken)?;
    let params = Parameters::load(&cli.parameter_file)?;
    let cache_root = cli.cache_root()?;
    let template = report::load_template(params.template.as_deref())?;

    info!(
        "Analyzing {} repositories of {} into {}",
        params.repos.len(),
        params.repo_owner,
        cache_root.display()
    );

    let ads_token = cli.ads_token.as_deref().filter(|t| !t.trim().is_empty());
    let mut client = GitHubClient::new(token)?;
    let mut citations = AdsClient::new(ads_token)?;
    let reports = runner::run(
        &params,
        &mut client,
        &mut citations,
        &template,
        &cache_root,
        &TracingObserver,
        Utc::now(),
    )
    .await?;

    Ok((reports, template))
}
