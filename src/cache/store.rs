// Cache store for fetched history records.
// Record caches are append-only JSON lines; report files are written atomically.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{Result, StatsError};
use crate::github::Record;

/// Read every record from a cache file.
///
/// A missing file is created empty and yields no records. Blank lines are
/// ignored; any other unparseable line is an error naming its line number.
pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::File::create(path)?;
        return Ok(Vec::new());
    }

    let contents = fs::read_to_string(path)?;
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|source| StatsError::MalformedCache {
                path: path.to_path_buf(),
                line: i + 1,
                source,
            })
        })
        .collect()
}

/// Cursor to resume fetching from, taken from the last cached record.
pub fn resume_cursor(path: &Path, records: &[Record]) -> Result<Option<String>> {
    match records.last() {
        None => Ok(None),
        Some(Record {
            end_cursor: Some(cursor),
            ..
        }) => Ok(Some(cursor.clone())),
        Some(_) => Err(StatsError::MissingCursor {
            path: path.to_path_buf(),
        }),
    }
}

/// Append `new` to the cache file and return `old` followed by `new`.
///
/// Existing lines are never touched. Nothing is written if any cursor in `new`
/// is already present in `old`, since that means a page was fetched twice.
pub fn merge(path: &Path, mut old: Vec<Record>, new: Vec<Record>) -> Result<Vec<Record>> {
    let cached: HashSet<&str> = old
        .iter()
        .filter_map(|record| record.end_cursor.as_deref())
        .collect();
    if let Some(duplicate) = new
        .iter()
        .filter_map(|record| record.end_cursor.as_deref())
        .find(|cursor| cached.contains(cursor))
    {
        return Err(StatsError::DuplicateCursor(duplicate.to_string()));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)?;
    let unterminated = !new.is_empty() && ends_without_newline(&mut file)?;
    let mut writer = BufWriter::new(file);
    // An interrupted earlier append can leave the last line without its newline.
    if unterminated {
        writer.write_all(b"\n")?;
    }
    for record in &new {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;

    old.extend(new);
    Ok(old)
}

fn ends_without_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Write text to a report file atomically via a temp file.
pub fn write_text(path: &Path, text: &str) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(text.as_bytes())?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Read a text file, returning None if it does not exist.
pub fn read_text(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)?;
    Ok(Some(contents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn records(range: std::ops::Range<u32>, cursor: Option<&str>) -> Vec<Record> {
        let mut records: Vec<Record> = range.map(|n| Record::new(json!({"number": n}))).collect();
        if let Some(last) = records.last_mut() {
            last.end_cursor = cursor.map(str::to_string);
        }
        records
    }

    fn line_count(path: &Path) -> usize {
        fs::read_to_string(path).unwrap().lines().count()
    }

    #[test]
    fn test_read_missing_file_creates_it() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("repo").join("repo_issues.txt");

        let records = read_records(&path).unwrap();

        assert!(records.is_empty());
        assert!(path.exists());
        assert_eq!(resume_cursor(&path, &records).unwrap(), None);
    }

    #[test]
    fn test_merge_empty_on_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.txt");

        let all = merge(&path, Vec::new(), Vec::new()).unwrap();

        assert!(all.is_empty());
        assert!(path.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_merge_is_append_only() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("issues.txt");

        let first = records(0..3, Some("a"));
        let all = merge(&path, Vec::new(), first.clone()).unwrap();
        assert_eq!(all, first);
        let before = fs::read_to_string(&path).unwrap();
        assert_eq!(line_count(&path), 3);

        let old = read_records(&path).unwrap();
        assert_eq!(old, first);
        let second = records(3..5, Some("b"));
        let all = merge(&path, old, second.clone()).unwrap();

        assert_eq!(line_count(&path), 5);
        let after = fs::read_to_string(&path).unwrap();
        assert!(after.starts_with(&before));
        assert_eq!(&all[..3], &first[..]);
        assert_eq!(&all[3..], &second[..]);
        assert_eq!(read_records(&path).unwrap(), all);
    }

    #[test]
    fn test_merge_after_unterminated_last_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("issues.txt");
        fs::write(&path, r#"{"node":{"number":0},"endCursor":"a"}"#).unwrap();

        let old = read_records(&path).unwrap();
        let all = merge(&path, old, records(1..2, Some("b"))).unwrap();

        assert_eq!(line_count(&path), 2);
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("{\"node\":{\"number\":0},\"endCursor\":\"a\"}\n"));
        assert_eq!(read_records(&path).unwrap(), all);
        assert_eq!(resume_cursor(&path, &all).unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn test_resume_cursor_from_last_record() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("commits.txt");
        merge(&path, Vec::new(), records(0..4, Some("Y3Vyc29yOjQ="))).unwrap();

        let old = read_records(&path).unwrap();
        assert_eq!(
            resume_cursor(&path, &old).unwrap().as_deref(),
            Some("Y3Vyc29yOjQ=")
        );
    }

    #[test]
    fn test_resume_without_cursor_is_an_error() {
        let path = Path::new("commits.txt");
        let err = resume_cursor(path, &records(0..2, None)).unwrap_err();
        assert!(matches!(err, StatsError::MissingCursor { .. }));
    }

    #[test]
    fn test_duplicate_cursor_is_rejected_without_writing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("prs.txt");
        let old = merge(&path, Vec::new(), records(0..2, Some("a"))).unwrap();

        let err = merge(&path, old, records(0..2, Some("a"))).unwrap_err();

        assert!(matches!(err, StatsError::DuplicateCursor(ref c) if c == "a"));
        assert_eq!(line_count(&path), 2);
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.txt");
        fs::write(&path, "{\"node\":{}}\n{'node': {}}\n").unwrap();

        let err = read_records(&path).unwrap_err();

        match err {
            StatsError::MalformedCache { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_write_and_read_text() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("summary.txt");

        write_text(&path, "Line 1\nLine 2").unwrap();

        assert_eq!(read_text(&path).unwrap().as_deref(), Some("Line 1\nLine 2"));
        assert!(read_text(&temp_dir.path().join("missing.txt")).unwrap().is_none());
    }
}
