//! Single-column reads over Parquet snapshot files.
//!
//! Snapshots carry many columns but only one is ever consumed, so the read
//! projects exactly the designated column and streams record batches through
//! Arrow, collecting the non-null values in row order.

use anyhow::{Context, Result, anyhow, bail};
use arrow::array::{Array, as_largestring_array, as_string_array};
use arrow::datatypes::DataType;
use futures::StreamExt;
use parquet::arrow::ProjectionMask;
use parquet::arrow::async_reader::ParquetRecordBatchStreamBuilder;
use std::path::Path;
use tokio::fs::File;

/// Read the designated column from a snapshot file.
///
/// Null entries contribute no values. Fails if the file is malformed, the
/// column is absent, or the column is not a string type.
pub async fn read_string_column(path: &Path, column: &str) -> Result<Vec<String>> {
    let file = File::open(path)
        .await
        .with_context(|| format!("Failed to open snapshot {}", path.display()))?;

    let builder = ParquetRecordBatchStreamBuilder::new(file)
        .await
        .with_context(|| format!("Failed to read Parquet metadata from {}", path.display()))?;

    let column_index = builder.schema().index_of(column).map_err(|_| {
        anyhow!(
            "Column '{}' not found in snapshot {}",
            column,
            path.display()
        )
    })?;

    let mask = ProjectionMask::roots(builder.parquet_schema(), [column_index]);
    let stream = builder
        .with_projection(mask)
        .build()
        .with_context(|| format!("Failed to build Parquet stream for {}", path.display()))?;

    let mut values = Vec::new();
    let mut stream = Box::pin(stream);
    while let Some(batch_result) = stream.next().await {
        let batch = batch_result
            .with_context(|| format!("Failed to read record batch from {}", path.display()))?;
        if let Some(array) = batch.columns().first() {
            append_string_values(array.as_ref(), &mut values)?;
        }
    }

    Ok(values)
}

/// Collect the non-null values of a string array
fn append_string_values(array: &dyn Array, values: &mut Vec<String>) -> Result<()> {
    match array.data_type() {
        DataType::Utf8 => {
            let arr = as_string_array(array);
            for i in 0..arr.len() {
                if !arr.is_null(i) {
                    values.push(arr.value(i).to_string());
                }
            }
        }
        DataType::LargeUtf8 => {
            let arr = as_largestring_array(array);
            for i in 0..arr.len() {
                if !arr.is_null(i) {
                    values.push(arr.value(i).to_string());
                }
            }
        }
        other => bail!("Unsupported data type {other:?} for item-name column"),
    }
    Ok(())
}
