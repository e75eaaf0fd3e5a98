// On-disk caches.
// Keeps append-only record caches per repository and item kind, plus report files.

pub mod paths;
pub mod store;

pub use paths::*;
pub use store::{merge, read_records, read_text, resume_cursor, write_text};
