// Plain-text repository summary.
// Fills a `{placeholder}` template with the headline numbers of a run.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::cache;
use crate::error::{Result, StatsError};
use crate::stats::{CitationSeries, CommitStats, IssuePrStats};

/// Template used when the parameter file names none.
pub const DEFAULT_TEMPLATE: &str = "\
{owner}/{repo}
Generated {generated}

Commits
  Total commits: {total_commits}
  Authors: {n_authors}
  Authors active in the last {age_recent_commit} days: {n_recent_authors}
  New authors in the last {age_recent_commit} days: {new_authors}

Issues
  Total: {issues_total}
  Currently open: {issues_open}
  Opened in the last {age_recent_issue_pr} days: {issues_recent_open}
  Closed in the last {age_recent_issue_pr} days: {issues_recent_close}

Pull requests
  Total: {prs_total}
  Currently open: {prs_open}
  Opened in the last {age_recent_issue_pr} days: {prs_recent_open}
  Closed in the last {age_recent_issue_pr} days: {prs_recent_close}

Refereed citations (via ADS)
  {citations}
";

/// Load a custom template, or fall back to [`DEFAULT_TEMPLATE`].
pub fn load_template(path: Option<&Path>) -> Result<String> {
    let Some(path) = path else {
        return Ok(DEFAULT_TEMPLATE.to_string());
    };
    cache::read_text(path)?.ok_or_else(|| StatsError::Config {
        path: path.to_path_buf(),
        message: "summary template not found".to_string(),
    })
}

/// Values available to a summary template.
pub fn summary_fields(
    owner: &str,
    repo: &str,
    commits: &CommitStats,
    items: &IssuePrStats,
    citations: &[CitationSeries],
    now: DateTime<Utc>,
) -> BTreeMap<&'static str, String> {
    let new_authors = if commits.new_authors.is_empty() {
        "none".to_string()
    } else {
        commits.new_authors.join(", ")
    };

    BTreeMap::from([
        ("owner", owner.to_string()),
        ("repo", repo.to_string()),
        ("generated", now.format("%Y-%m-%d %H:%M UTC").to_string()),
        ("total_commits", commits.total_commits.to_string()),
        ("n_authors", commits.authors.len().to_string()),
        ("n_recent_authors", commits.n_recent_authors.to_string()),
        ("new_authors", new_authors),
        ("age_recent_commit", commits.age_recent.to_string()),
        ("age_recent_issue_pr", items.issues.age_recent.to_string()),
        ("issues_total", items.issues.total.to_string()),
        ("issues_open", items.issues.currently_open.to_string()),
        ("issues_recent_open", items.issues.recent_open.to_string()),
        ("issues_recent_close", items.issues.recent_close.to_string()),
        ("prs_total", items.pull_requests.total.to_string()),
        ("prs_open", items.pull_requests.currently_open.to_string()),
        ("prs_recent_open", items.pull_requests.recent_open.to_string()),
        ("prs_recent_close", items.pull_requests.recent_close.to_string()),
        ("citations", citation_totals(citations)),
    ])
}

/// `name: total (year: count to date)` per series, or `none`.
fn citation_totals(citations: &[CitationSeries]) -> String {
    if citations.is_empty() {
        return "none".to_string();
    }
    citations
        .iter()
        .map(|cites| match cites.year_to_date() {
            Some((year, count)) => {
                format!("{}: {} ({}: {} to date)", cites.name, cites.total, year, count)
            }
            None => format!("{}: {}", cites.name, cites.total),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn is_placeholder(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Substitute `{name}` placeholders. Unknown names are left untouched.
pub fn render_template(template: &str, fields: &BTreeMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) if is_placeholder(&after[..end]) => {
                let name = &after[..end];
                match fields.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        warn!("Unknown summary placeholder {{{}}}", name);
                        out.push_str(&rest[start..start + end + 2]);
                    }
                }
                rest = &after[end + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
