//! File format readers for columnar snapshot files

pub mod parquet;
