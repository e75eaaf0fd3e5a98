// Run parameters.
// Loads the JSON parameter file naming the repositories and analysis settings.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, StatsError};
use crate::github::DEFAULT_BRANCH;
use crate::stats::AuthorRules;

/// Commit authors that are automation rather than people.
pub fn default_bots() -> Vec<String> {
    [
        "dependabot[bot]",
        "github-actions",
        "github-actions[bot]",
        "meeseeksmachine",
        "odidev",
        "pre-commit-ci[bot]",
        "codetriage-readme-bot",
        "unknown",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_age_recent() -> i64 {
    90
}

fn default_window_avg() -> usize {
    7
}

fn default_min_author_commits() -> usize {
    5
}

/// One repository to analyze.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoParams {
    pub repo_name: String,
    /// Labels whose currently open issues and PRs are counted.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Branch whose commit history is read.
    #[serde(default)]
    pub branch: Option<String>,
    /// Local checkout; when set, commits come from `git log` instead of the API.
    #[serde(default)]
    pub repo_dir: Option<PathBuf>,
    /// ADS bibcodes whose refereed citations are counted.
    #[serde(default)]
    pub bibs: Vec<String>,
    /// Display names for `bibs`, in the same order.
    #[serde(default)]
    pub bib_names: Vec<String>,
}

impl RepoParams {
    pub fn branch(&self) -> &str {
        self.branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }

    /// (name, bibcode) pairs; a bibcode without a name is its own name.
    pub fn named_bibs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bibs.iter().enumerate().map(|(i, bib)| {
            let name = self.bib_names.get(i).map_or(bib.as_str(), String::as_str);
            (name, bib.as_str())
        })
    }
}

/// Contents of the JSON parameter file.
#[derive(Debug, Clone, Deserialize)]
pub struct Parameters {
    pub repo_owner: String,
    pub repos: Vec<RepoParams>,
    #[serde(default = "default_age_recent")]
    pub age_recent_commit: i64,
    #[serde(default = "default_age_recent")]
    pub age_recent_issue_pr: i64,
    #[serde(default = "default_window_avg")]
    pub window_avg: usize,
    #[serde(default = "default_bots")]
    pub bots: Vec<String>,
    /// Alternative author spelling -> canonical name.
    #[serde(default)]
    pub author_aliases: BTreeMap<String, String>,
    /// Minimum commits for an author to appear in the per-author chart.
    #[serde(default = "default_min_author_commits")]
    pub min_author_commits: usize,
    /// Custom summary template.
    #[serde(default)]
    pub template: Option<PathBuf>,
}

impl Parameters {
    /// Load and validate a parameter file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| StatsError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&contents, path)
    }

    /// Parse and validate parameter JSON; `path` is only used in errors.
    pub fn from_json(contents: &str, path: &Path) -> Result<Self> {
        let invalid = |message: String| StatsError::Config {
            path: path.to_path_buf(),
            message,
        };

        let params: Parameters =
            serde_json::from_str(contents).map_err(|e| invalid(e.to_string()))?;

        if params.repo_owner.trim().is_empty() {
            return Err(invalid("repo_owner is empty".to_string()));
        }
        if params.repos.is_empty() {
            return Err(invalid("no repos listed".to_string()));
        }
        if params.window_avg == 0 {
            return Err(invalid("window_avg must be at least 1".to_string()));
        }
        for repo in &params.repos {
            if !repo.bib_names.is_empty() && repo.bib_names.len() != repo.bibs.len() {
                return Err(invalid(format!(
                    "{}: {} bib_names for {} bibs",
                    repo.repo_name,
                    repo.bib_names.len(),
                    repo.bibs.len()
                )));
            }
        }

        Ok(params)
    }

    pub fn author_rules(&self) -> AuthorRules {
        AuthorRules::new(
            self.bots.iter().cloned(),
            self.author_aliases
                .iter()
                .map(|(alias, name)| (alias.clone(), name.clone())),
        )
    }
}
