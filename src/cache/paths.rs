// Cache path utilities.
// Constructs filesystem paths for per-repository caches and report files.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::github::ItemKind;

/// Get the base cache directory (~/.cache/repo-stats on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "repo-stats").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Path to a repository's directory under the cache root.
pub fn repo_dir(root: &Path, repo: &str) -> PathBuf {
    root.join(sanitize_name(repo))
}

/// Path to the append-only record cache for one item kind.
pub fn records_path(root: &Path, repo: &str, kind: ItemKind) -> PathBuf {
    repo_dir(root, repo).join(format!("{}_{}.txt", sanitize_name(repo), kind.as_str()))
}

/// Path to a report file (chart or summary) in a given directory.
pub fn report_path(dir: &Path, repo: &str, report: &str) -> PathBuf {
    dir.join(format!("{}_{}.txt", sanitize_name(repo), report))
}

/// Sanitize a name for use in filesystem paths.
/// Replaces problematic characters with underscores.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' => '_',
            _ => c,
        })
        .collect()
}
