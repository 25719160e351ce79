//! Public dataset API.
//!
//! This module is the one parametrized entry point over the internal
//! modules: it ensures a usable store exists (building it from snapshot
//! files when asked to, or when none exists yet), caches the row count,
//! and serves indexed reads.
//!
//! # Example
//!
//! ```no_run
//! use item_names_dataset::dataset::{self, DatasetArgsBuilder};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let args = DatasetArgsBuilder::default()
//!     .db_path("items.db")
//!     .rebuild(true)
//!     .snapshot_dir("/data/snapshots")
//!     .file_cap(5usize)
//!     .build()?;
//!
//! let dataset = dataset::open_or_create(args).await?;
//! println!("{} rows, first: {}", dataset.len(), dataset.get(0).await?);
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use derive_builder::Builder;
use sqlx::SqlitePool;
use std::path::PathBuf;
use tracing::info;

use crate::config::{DEFAULT_COLUMN_NAME, DEFAULT_TABLE_NAME};
use crate::db::store;
use crate::error::DatasetError;
use crate::loader;

/// Arguments for opening (and, when needed, building) a dataset
///
/// Rebuilding is destructive: an existing store file at `db_path` is
/// deleted before the new one is written.
#[derive(Debug, Clone, Builder)]
pub struct DatasetArgs {
    /// Path of the SQLite store file
    #[builder(setter(into))]
    pub db_path: PathBuf,

    /// Name of the data table
    #[builder(setter(into), default = "DEFAULT_TABLE_NAME.to_string()")]
    pub table_name: String,

    /// Name of the snapshot column to load; also the data table's text column
    #[builder(setter(into), default = "DEFAULT_COLUMN_NAME.to_string()")]
    pub column_name: String,

    /// Delete any existing store and rebuild it from the snapshot directory
    #[builder(default)]
    pub rebuild: bool,

    /// Directory of snapshot files; required whenever the store is built
    #[builder(setter(into, strip_option), default)]
    pub snapshot_dir: Option<PathBuf>,

    /// Load at most this many snapshot files
    #[builder(setter(strip_option), default)]
    pub file_cap: Option<usize>,

    /// Show a progress bar while loading
    #[builder(default)]
    pub verbose: bool,
}

/// An open store serving indexed reads over item names
#[derive(Debug)]
pub struct ItemNamesDataset {
    pool: SqlitePool,
    table_name: String,
    column_name: String,
    num_rows: u64,
}

/// Ensure a usable store exists at `args.db_path` and open it.
///
/// The store is built from the snapshot directory when `rebuild` is set or
/// when no file exists at the path; otherwise the existing store is opened
/// as-is, trusting its schema. Either way the row count is then loaded from
/// the metadata table, computed and persisted on the first open.
pub async fn open_or_create(args: DatasetArgs) -> Result<ItemNamesDataset> {
    store::validate_identifier(&args.table_name)?;
    store::validate_identifier(&args.column_name)?;

    let build = args.rebuild || !args.db_path.exists();
    let pool = if build {
        let snapshot_dir = args
            .snapshot_dir
            .as_deref()
            .ok_or(DatasetError::MissingSnapshotDir)?;

        if args.db_path.exists() {
            tokio::fs::remove_file(&args.db_path).await.with_context(|| {
                format!(
                    "Failed to remove existing store at {}",
                    args.db_path.display()
                )
            })?;
        }

        let pool = store::open(&args.db_path, true).await?;
        store::create_data_table(&pool, &args.table_name, &args.column_name).await?;
        let summary = loader::load_snapshots(
            &pool,
            &args.table_name,
            &args.column_name,
            snapshot_dir,
            args.file_cap,
            args.verbose,
        )
        .await?;
        info!(
            "Built store with {} rows from {} snapshot files in {:.2}s",
            summary.rows_loaded,
            summary.files_processed,
            summary.duration.as_secs_f64()
        );
        pool
    } else {
        store::open(&args.db_path, false).await?
    };

    store::ensure_metadata_table(&pool).await?;
    let num_rows = match store::cached_row_count(&pool).await? {
        Some(count) => count,
        None => {
            info!("Counting rows in table {}", args.table_name);
            let count = store::count_rows(&pool, &args.table_name).await?;
            store::store_row_count(&pool, count).await?;
            count
        }
    };
    info!("Opened store with {} rows in table {}", num_rows, args.table_name);

    Ok(ItemNamesDataset {
        pool,
        table_name: args.table_name,
        column_name: args.column_name,
        num_rows,
    })
}

impl ItemNamesDataset {
    /// Number of rows, per the cached metadata count
    pub fn len(&self) -> u64 {
        self.num_rows
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    /// Return the item name at a zero-based index, HTML-unescaped.
    ///
    /// An index at or beyond `len()` fails with
    /// [`DatasetError::IndexOutOfRange`], as does a key the cached count
    /// claims exists but the table no longer holds.
    pub async fn get(&self, index: usize) -> Result<String> {
        if index as u64 >= self.num_rows {
            return Err(DatasetError::IndexOutOfRange { index }.into());
        }

        // External indices are zero-based; store keys start at 1
        let key = index as i64 + 1;
        let row = store::fetch_value(&self.pool, &self.table_name, &self.column_name, key).await?;

        match row.flatten() {
            Some(raw) => Ok(html_escape::decode_html_entities(&raw).into_owned()),
            None => Err(DatasetError::IndexOutOfRange { index }.into()),
        }
    }

    /// Close the store's connections; further reads would fail.
    pub async fn close(self) {
        self.pool.close().await;
    }
}
