//! Bulk load of snapshot files into the data table.
//!
//! A single sequential pass: enumerate the snapshot files, read the
//! designated column from each, and append its values inside one
//! transaction per file. A failure aborts the load immediately; files
//! committed before the failure stay in the store.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::SNAPSHOT_EXTENSION;
use crate::db::store;
use crate::formats::parquet;

/// Result of a completed bulk load
#[derive(Debug)]
pub struct LoadSummary {
    pub files_processed: usize,
    pub rows_loaded: u64,
    pub duration: Duration,
}

/// Load every selected snapshot file into the data table.
///
/// Files are selected in lexicographic file-name order, truncated to
/// `file_cap` when one is given. Directory enumeration order is
/// platform-dependent, so the sort makes selection (and therefore row
/// order and the file-cap cutoff) deterministic.
pub async fn load_snapshots(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    snapshot_dir: &Path,
    file_cap: Option<usize>,
    verbose: bool,
) -> Result<LoadSummary> {
    let start = Instant::now();

    let mut files = list_snapshot_files(snapshot_dir).await?;
    if let Some(cap) = file_cap {
        files.truncate(cap);
    }

    info!(
        "Loading {} snapshot files from {}",
        files.len(),
        snapshot_dir.display()
    );

    let progress = setup_progress_bar(files.len() as u64, verbose);

    let mut rows_loaded = 0u64;
    for path in &files {
        let names = parquet::read_string_column(path, column)
            .await
            .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
        let inserted = store::insert_names(pool, table, column, &names).await?;
        rows_loaded += inserted;

        debug!("Loaded {} rows from {}", inserted, path.display());
        if let Some(ref bar) = progress {
            bar.inc(1);
        }
    }

    if let Some(bar) = progress {
        bar.finish();
    }

    let duration = start.elapsed();
    info!(
        "Load complete: {} files, {} rows in {:.2}s",
        files.len(),
        rows_loaded,
        duration.as_secs_f64()
    );

    Ok(LoadSummary {
        files_processed: files.len(),
        rows_loaded,
        duration,
    })
}

/// List the snapshot files of a directory in lexicographic file-name order
async fn list_snapshot_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read snapshot directory {}", dir.display()))?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_file = entry.file_type().await?.is_file();
        if is_file && path.extension().and_then(|e| e.to_str()) == Some(SNAPSHOT_EXTENSION) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Progress bar over files processed, shown only in verbose mode
fn setup_progress_bar(total_files: u64, verbose: bool) -> Option<ProgressBar> {
    if !verbose {
        return None;
    }

    let bar = ProgressBar::new(total_files);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] Snapshots: [{bar:30.cyan/blue}] {pos}/{len} ({percent}%)")
            .unwrap()
            .progress_chars("=>-"),
    );
    Some(bar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_listing_is_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("part-02.parquet"), b"").unwrap();
        std::fs::write(dir.path().join("part-01.parquet"), b"").unwrap();
        std::fs::write(dir.path().join("part-10.parquet"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("nested.parquet")).unwrap();

        let files = list_snapshot_files(dir.path()).await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["part-01.parquet", "part-02.parquet", "part-10.parquet"]
        );
    }

    #[tokio::test]
    async fn test_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nowhere");
        assert!(list_snapshot_files(&missing).await.is_err());
    }
}
