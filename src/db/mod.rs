//! Database layer - store open/create, schema DDL, inserts, and metadata

pub mod store;
