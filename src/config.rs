//! Configuration constants for the dataset
//!
//! This module centralizes all tunable parameters and constants used throughout
//! the crate.

// ============================================================================
// Store Configuration
// ============================================================================

/// Default name of the data table holding item-name rows
pub const DEFAULT_TABLE_NAME: &str = "items";

/// Default name of the snapshot column (and data-table column) to load
pub const DEFAULT_COLUMN_NAME: &str = "name";

/// Metadata key under which the cached row count is stored
pub const ROW_COUNT_KEY: &str = "num_rows";

/// Maximum number of pooled connections to the store
///
/// SQLite serializes writers, so a handful of connections is enough: one for
/// the load path and a few for concurrent indexed reads.
pub const POOL_MAX_CONNECTIONS: u32 = 4;

// ============================================================================
// Loader Configuration
// ============================================================================

/// File extension that marks a columnar snapshot file
pub const SNAPSHOT_EXTENSION: &str = "parquet";

/// Number of rows bound into a single multi-row INSERT statement
///
/// Older SQLite builds cap bound parameters per statement at 999, so each
/// chunk must stay below that with one parameter per row.
pub const INSERT_CHUNK_SIZE: usize = 800;
