//! Utility functions for text measurement, timestamps, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Character-safe truncation for logs and summaries
//! - Word counts and reading-time estimates for generated articles
//! - Timestamp formats shared by storage and output filenames
//! - File system validation for output directories

use chrono::{Local, NaiveDateTime};
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Words read per minute used for reading-time estimates.
pub const WORDS_PER_MINUTE: usize = 200;

/// Timestamp format stored in the database. SQLite date functions read it
/// without any timezone shift.
pub const DB_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and byte count
/// indicator appended. Cuts always land on a character boundary.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Keep the first `max` characters, appending `...` if anything was cut.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}...", &s[..cut]),
    }
}

/// Count whitespace-separated tokens that contain at least one letter or
/// digit, so Markdown markers such as `##` are not counted.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count()
}

/// Reading time in whole minutes (at least one), formatted for display.
pub fn reading_time(words: usize) -> String {
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    format!("{minutes} دقیقه")
}

/// Format `at` with [`DB_TIMESTAMP_FORMAT`].
pub fn db_timestamp(at: NaiveDateTime) -> String {
    at.format(DB_TIMESTAMP_FORMAT).to_string()
}

/// Compact stamp used in output filenames, e.g. `20250506_143000`.
pub fn file_stamp(at: NaiveDateTime) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// Local wall-clock time without an offset.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a scratch file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let scratch_path = path.join("..__write_check__");
    match stdfs::File::create(&scratch_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&scratch_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
