//! JSON batch files.
//!
//! Each `generate` run that produces at least one article writes a single
//! pretty-printed file:
//!
//! ```text
//! output_dir/
//! └── medical_articles_20250506_143000.json
//! ```
//!
//! The file carries a `meta` block (totals, average quality, topics) and the
//! full article list.

use crate::models::ArticleBatch;
use crate::utils::file_stamp;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Serialize `value` with two-space indentation and write it to `path`,
/// creating parent directories as needed.
pub async fn write_pretty<T: Serialize>(value: &T, path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }
    fs::write(path, json).await?;
    Ok(())
}

/// Write an [`ArticleBatch`] to `{output_dir}/medical_articles_{stamp}.json`.
///
/// # Returns
///
/// The path of the written file.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_batch(
    batch: &ArticleBatch,
    output_dir: &Path,
    at: NaiveDateTime,
) -> Result<PathBuf, Box<dyn Error>> {
    let path = output_dir.join(format!("medical_articles_{}.json", file_stamp(at)));
    write_pretty(batch, &path).await?;
    info!(
        path = %path.display(),
        articles = batch.meta.total_articles,
        words = batch.meta.total_words,
        "Wrote article batch"
    );
    Ok(path)
}
