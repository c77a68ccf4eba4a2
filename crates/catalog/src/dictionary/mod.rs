// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Dictionary call sites
//!
//! Concrete caches over the vendor's `ALL_*` dictionary views, wired into a
//! navigator tree:
//!
//! ```text
//! DataSource
//! └── Schema            (ALL_USERS)
//!     ├── tables        StructCache: ALL_TABLES/ALL_VIEWS + ALL_TAB_COLUMNS
//!     ├── indexes       CompositeCache: ALL_INDEXES x ALL_IND_COLUMNS
//!     ├── constraints   CompositeCache: ALL_CONSTRAINTS, packed column list
//!     ├── foreign keys  CompositeCache: ALL_CONSTRAINTS x ALL_CONS_COLUMNS
//!     ├── procedures    lookup cache: ALL_OBJECTS
//!     │   └── arguments ALL_ARGUMENTS, rebuilt into a tree
//!     ├── synonyms      lookup cache: ALL_SYNONYMS
//!     └── triggers      lookup cache: ALL_TRIGGERS
//! ```
//!
//! Every cache receives its owner by reference on each call, so a cache
//! never holds a pointer back to the object that owns it.

mod constraints;
mod indexes;
mod procedures;
mod schema;
mod synonyms;
mod tables;
mod triggers;

use std::sync::Arc;

use sqlnav_model::{ConstraintMetadata, ForeignKeyMetadata, SchemaMetadata};
use tracing::{debug, info};

use crate::cache::{ObjectCache, ObjectFetcher};
use crate::config::{CatalogConfig, ConfigError};
use crate::error::CatalogResult;
use crate::key::CatalogObject;
use crate::monitor::Monitor;
use crate::row::{Row, RowSource, Statement};

pub use constraints::{ConstraintCache, ForeignKeyCache};
pub use indexes::IndexCache;
pub use procedures::{Procedure, strip_synthetic_arguments};
pub use schema::Schema;
pub use tables::TableCache;

/// Root of the navigator tree for one connection
pub struct DataSource {
    config: Arc<CatalogConfig>,
    source: Arc<dyn RowSource>,
    schemas: ObjectCache<DataSource, Schema>,
}

impl DataSource {
    pub fn new(source: Arc<dyn RowSource>, config: CatalogConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let options = config.cache_options();
        info!(
            "Creating data source (case sensitive: {}, fetch size: {})",
            config.case_sensitive_identifiers, config.fetch_size
        );
        Ok(Self {
            schemas: ObjectCache::new("schemas", source.clone(), SchemaFetcher, options)
                .with_order(|a: &Schema, b: &Schema| a.name().cmp(b.name())),
            config: Arc::new(config),
            source,
        })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Visible schemas
    pub fn schemas(&self, monitor: &dyn Monitor) -> CatalogResult<Vec<Arc<Schema>>> {
        self.schemas.get_all(self, monitor)
    }

    pub fn schema(&self, name: &str, monitor: &dyn Monitor) -> CatalogResult<Option<Arc<Schema>>> {
        self.schemas.get(self, name, monitor)
    }

    /// Reload the schema list. Schemas that are still present keep their
    /// instance and everything cached under it.
    pub fn refresh(&self, monitor: &dyn Monitor) -> CatalogResult<Vec<Arc<Schema>>> {
        self.schemas.refresh(self, monitor)
    }

    /// Drop everything cached for one schema
    pub fn refresh_schema(&self, name: &str, monitor: &dyn Monitor) -> CatalogResult<Option<Arc<Schema>>> {
        let schema = self.schemas.get(self, name, monitor)?;
        if let Some(schema) = &schema {
            schema.refresh(monitor)?;
        }
        Ok(schema)
    }

    /// Drop every cached schema
    pub fn clear(&self) {
        self.schemas.clear();
    }

    /// The unique or primary key a foreign key references
    pub fn resolve_foreign_key(
        &self,
        foreign_key: &ForeignKeyMetadata,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Option<Arc<ConstraintMetadata>>> {
        let referenced = &foreign_key.referenced;
        let Some(schema) = self.schema(&referenced.owner, monitor)? else {
            debug!(
                "Foreign key {} references missing schema {}",
                foreign_key.name, referenced.owner
            );
            return Ok(None);
        };
        schema.find_constraint(&referenced.name, monitor)
    }

    pub(crate) fn source(&self) -> &Arc<dyn RowSource> {
        &self.source
    }

    pub(crate) fn shared_config(&self) -> &Arc<CatalogConfig> {
        &self.config
    }
}

const SCHEMAS_SQL: &str = "\
SELECT USERNAME, ORACLE_MAINTAINED FROM ALL_USERS ORDER BY USERNAME";

const SCHEMA_LOOKUP_SQL: &str = "\
SELECT USERNAME, ORACLE_MAINTAINED FROM ALL_USERS WHERE USERNAME = :1";

struct SchemaFetcher;

impl ObjectFetcher<DataSource, Schema> for SchemaFetcher {
    fn prepare_objects(&self, owner: &DataSource) -> Statement {
        Statement::new("schemas.list", SCHEMAS_SQL).with_fetch_size(owner.config.fetch_size)
    }

    fn prepare_lookup(&self, _owner: &DataSource, name: &str) -> Option<Statement> {
        Some(Statement::new("schemas.lookup", SCHEMA_LOOKUP_SQL).bind(name))
    }

    fn fetch_object(&self, owner: &DataSource, row: &Row) -> CatalogResult<Option<Schema>> {
        let name = row.get_str("USERNAME")?;
        let is_system = row.get_flag("ORACLE_MAINTAINED")?;
        if owner.config.is_schema_hidden(name, is_system) {
            return Ok(None);
        }
        let metadata = SchemaMetadata::new(name).with_system(is_system);
        Ok(Some(Schema::new(
            metadata,
            owner.source().clone(),
            owner.shared_config().clone(),
        )))
    }
}

impl CatalogObject for Schema {
    fn name(&self) -> &str {
        &self.metadata().name
    }
}
