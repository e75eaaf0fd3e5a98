// repo-stats library.
// Collects GitHub repository history into append-only caches and reports contributor statistics.

pub mod ads;
pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod gitlog;
pub mod observer;
pub mod report;
pub mod runner;
pub mod stats;
pub mod ui;

pub use error::{Result, StatsError};
