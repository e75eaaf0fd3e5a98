// Commit history from a local checkout.
// Reads `git log` instead of the GraphQL API when a repository directory is configured.

use std::path::Path;
use std::process::Command;

use chrono::NaiveDate;
use crate::error::{Result, StatsError};
use crate::observer::{Observer, Progress};
use crate::stats::CommitEntry;

const LOG_FORMAT: &str = r#"--format="%H","%as","%aN""#;

/// One parsed `git log` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub hash: String,
    pub date: NaiveDate,
    pub author: String,
}

/// Parse a `"hash","YYYY-MM-DD","author"` line.
pub fn parse_log_line(line: &str) -> Option<LogLine> {
    let mut fields = line.trim_end().splitn(3, ',').map(|f| f.trim_matches('"'));
    let hash = fields.next().filter(|h| !h.is_empty())?;
    let date = NaiveDate::parse_from_str(fields.next()?, "%Y-%m-%d").ok()?;
    let author = fields.next()?;
    Some(LogLine {
        hash: hash.to_string(),
        date,
        author: author.to_string(),
    })
}

/// Read the commit history of a local repository (mailmap applied).
pub fn commits_from_git_log(
    repo_dir: &Path,
    observer: &dyn Observer,
) -> Result<Vec<CommitEntry>> {
    observer.notify(&Progress::Stage(&format!(
        "Collecting git commit history from {}",
        repo_dir.display()
    )));

    let output = Command::new("git")
        .arg("-C")
        .arg(repo_dir)
        .args(["log", "--use-mailmap", "--date=iso-local", LOG_FORMAT])
        .output()?;

    if !output.status.success() {
        return Err(StatsError::Other(format!(
            "git log failed in {}: {}",
            repo_dir.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let entries = stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            parse_log_line(line)
                .map(|parsed| CommitEntry::new(parsed.date, parsed.author, None))
                .ok_or_else(|| StatsError::Other(format!("unparseable git log line: {}", line)))
        })
        .collect::<Result<Vec<_>>>()?;

    if entries.is_empty() {
        return Err(StatsError::NoCommits(repo_dir.display().to_string()));
    }

    Ok(entries)
}
