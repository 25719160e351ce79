//! Distinct error conditions of the dataset contract.
//!
//! Most failures propagate as `anyhow::Error` with context attached at each
//! seam. The conditions callers are expected to recognize and handle are
//! typed here and can be recovered with `Error::downcast_ref`.

use thiserror::Error;

/// Error conditions callers can match on
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatasetError {
    #[error("index {index} is out of range")]
    IndexOutOfRange { index: usize },

    #[error("store must be built but no snapshot directory was supplied")]
    MissingSnapshotDir,

    #[error("invalid table or column name: {0:?}")]
    InvalidIdentifier(String),
}
