// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # SQL Navigator - Catalog Layer
//!
//! Lazily loaded, merge-on-refresh caches over a database's data dictionary,
//! used by the navigator to browse schemas, tables, columns, indexes,
//! constraints, routines, synonyms and triggers.
//!
//! - **Load once**: each collection is read by one statement the first time
//!   it is needed; concurrent callers share that single load
//! - **Stable identity**: a refresh keeps the existing `Arc` of every object
//!   that came back unchanged
//! - **Cooperative cancellation**: the [`Monitor`] is polled per row and a
//!   cancelled load keeps what it read so far
//!
//! ## Architecture
//!
//! - [`row`]: the [`RowSource`] boundary implemented by the connection layer
//! - [`cache`]: generic object, composite and structure caches
//! - [`tree`]: rebuilds nested argument trees from flat `DATA_LEVEL` rows
//! - [`dictionary`]: the concrete caches wired into [`DataSource`] and
//!   [`Schema`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sqlnav_catalog::{CatalogConfig, DataSource, NullMonitor};
//!
//! let data_source = DataSource::new(row_source, CatalogConfig::default())?;
//! let hr = data_source.schema("HR", &NullMonitor)?.expect("schema");
//! for column in hr.table_columns("EMPLOYEES", &NullMonitor)? {
//!     println!("{} {:?}", column.name, column.data_type);
//! }
//! ```

pub mod cache;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod key;
pub mod monitor;
pub mod row;
pub mod tree;

// Re-exports
pub use cache::{
    ChildFetcher, CompositeCache, CompositeFetcher, CompositeObject, ObjectCache, ObjectFetcher,
    ScanStats, StructCache, merge_objects, parse_packed_columns, scan_rows,
};
pub use config::{CacheOptions, CatalogConfig, ConfigError, ReadPolicy};
pub use dictionary::{DataSource, Procedure, Schema};
pub use error::{CatalogError, CatalogResult};
pub use key::{CacheKey, CatalogObject, KeyCase};
pub use monitor::{CancelToken, Monitor, NullMonitor};
pub use row::{Row, RowSource, RowStream, Statement, Value};
pub use tree::{ArgumentNode, FlatRow, build_tree};
