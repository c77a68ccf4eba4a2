// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use std::sync::Arc;

use sqlnav_model::{
    ColumnMetadata, ConstraintColumn, ConstraintMetadata, ForeignKeyMetadata, IndexColumn,
    IndexMetadata, SchemaMetadata, SynonymMetadata, TableMetadata, TriggerMetadata,
};
use tracing::debug;

use super::constraints::{ConstraintCache, ConstraintFetcher, ForeignKeyCache, ForeignKeyFetcher};
use super::indexes::{IndexCache, IndexFetcher};
use super::procedures::{Procedure, ProcedureFetcher};
use super::synonyms::SynonymFetcher;
use super::tables::{ColumnFetcher, TableCache, TableFetcher};
use super::triggers::TriggerFetcher;
use crate::cache::{CompositeCache, ObjectCache, StructCache};
use crate::config::{CacheOptions, CatalogConfig};
use crate::error::{CatalogError, CatalogResult};
use crate::monitor::Monitor;
use crate::row::RowSource;

/// One schema and every per-schema cache
pub struct Schema {
    metadata: SchemaMetadata,
    source: Arc<dyn RowSource>,
    config: Arc<CatalogConfig>,
    tables: TableCache,
    indexes: IndexCache,
    constraints: ConstraintCache,
    foreign_keys: ForeignKeyCache,
    procedures: ObjectCache<Schema, Procedure>,
    synonyms: ObjectCache<Schema, SynonymMetadata>,
    triggers: ObjectCache<Schema, TriggerMetadata>,
}

impl Schema {
    pub fn new(metadata: SchemaMetadata, source: Arc<dyn RowSource>, config: Arc<CatalogConfig>) -> Self {
        let options = config.cache_options();
        let tables = ObjectCache::new("tables", source.clone(), TableFetcher, options)
            .with_order(|a: &TableMetadata, b: &TableMetadata| a.name.cmp(&b.name));

        Self {
            tables: StructCache::new(tables, ColumnFetcher),
            indexes: CompositeCache::new("indexes", source.clone(), IndexFetcher, options),
            constraints: CompositeCache::new(
                "constraints",
                source.clone(),
                ConstraintFetcher,
                options.with_empty_details(config.allow_empty_constraints),
            ),
            foreign_keys: CompositeCache::new("foreign keys", source.clone(), ForeignKeyFetcher, options),
            procedures: ObjectCache::new("procedures", source.clone(), ProcedureFetcher, options),
            synonyms: ObjectCache::new(
                "synonyms",
                source.clone(),
                SynonymFetcher {
                    read_all: config.read_all_synonyms,
                },
                options,
            ),
            triggers: ObjectCache::new(
                "triggers",
                source.clone(),
                TriggerFetcher,
                options.with_read_policy(config.restricted_read_policy()),
            ),
            metadata,
            source,
            config,
        }
    }

    pub fn metadata(&self) -> &SchemaMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn is_system(&self) -> bool {
        self.metadata.is_system
    }

    pub fn tables(&self, monitor: &dyn Monitor) -> CatalogResult<Vec<Arc<TableMetadata>>> {
        self.tables.get_all(self, monitor)
    }

    pub fn table(&self, name: &str, monitor: &dyn Monitor) -> CatalogResult<Option<Arc<TableMetadata>>> {
        self.tables.get(self, name, monitor)
    }

    /// Columns of a table in column order
    pub fn table_columns(
        &self,
        table_name: &str,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Vec<Arc<ColumnMetadata>>> {
        let table = self.require_table(table_name, monitor)?;
        self.tables.get_children(self, &table, monitor)
    }

    /// Read the columns of every table in one statement
    pub fn load_all_columns(&self, monitor: &dyn Monitor) -> CatalogResult<()> {
        self.tables.load_children(self, None, monitor)
    }

    /// Indexes of one table, or of the whole schema
    pub fn indexes(
        &self,
        table: Option<&TableMetadata>,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Vec<Arc<IndexMetadata>>> {
        self.indexes.get_all(self, table, monitor)
    }

    pub fn index_columns(
        &self,
        table_name: &str,
        index_name: &str,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Vec<IndexColumn>> {
        let table = self.require_table(table_name, monitor)?;
        self.indexes.get_children(self, &table, index_name, monitor)
    }

    /// Primary key, unique and check constraints of one table, or of the
    /// whole schema
    pub fn constraints(
        &self,
        table: Option<&TableMetadata>,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Vec<Arc<ConstraintMetadata>>> {
        self.constraints.get_all(self, table, monitor)
    }

    pub fn constraint_columns(
        &self,
        table_name: &str,
        constraint_name: &str,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Vec<ConstraintColumn>> {
        let table = self.require_table(table_name, monitor)?;
        self.constraints.get_children(self, &table, constraint_name, monitor)
    }

    /// A constraint by name without knowing its table
    pub fn find_constraint(
        &self,
        name: &str,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Option<Arc<ConstraintMetadata>>> {
        self.constraints.find(self, name, monitor)
    }

    pub fn foreign_keys(
        &self,
        table: Option<&TableMetadata>,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Vec<Arc<ForeignKeyMetadata>>> {
        self.foreign_keys.get_all(self, table, monitor)
    }

    pub fn procedures(&self, monitor: &dyn Monitor) -> CatalogResult<Vec<Arc<Procedure>>> {
        self.procedures.get_all(self, monitor)
    }

    pub fn procedure(&self, name: &str, monitor: &dyn Monitor) -> CatalogResult<Option<Arc<Procedure>>> {
        self.procedures.get(self, name, monitor)
    }

    pub fn synonyms(&self, monitor: &dyn Monitor) -> CatalogResult<Vec<Arc<SynonymMetadata>>> {
        self.synonyms.get_all(self, monitor)
    }

    pub fn synonym(&self, name: &str, monitor: &dyn Monitor) -> CatalogResult<Option<Arc<SynonymMetadata>>> {
        self.synonyms.get(self, name, monitor)
    }

    pub fn triggers(&self, monitor: &dyn Monitor) -> CatalogResult<Vec<Arc<TriggerMetadata>>> {
        self.triggers.get_all(self, monitor)
    }

    pub fn trigger(&self, name: &str, monitor: &dyn Monitor) -> CatalogResult<Option<Arc<TriggerMetadata>>> {
        self.triggers.get(self, name, monitor)
    }

    /// Triggers defined on one table
    pub fn table_triggers(
        &self,
        table_name: &str,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Vec<Arc<TriggerMetadata>>> {
        let case = self.config.key_case();
        Ok(self
            .triggers(monitor)?
            .into_iter()
            .filter(|t| t.table_name.as_deref().is_some_and(|n| case.names_eq(n, table_name)))
            .collect())
    }

    pub fn table_cache(&self) -> &TableCache {
        &self.tables
    }

    pub fn index_cache(&self) -> &IndexCache {
        &self.indexes
    }

    pub fn constraint_cache(&self) -> &ConstraintCache {
        &self.constraints
    }

    pub fn foreign_key_cache(&self) -> &ForeignKeyCache {
        &self.foreign_keys
    }

    pub fn procedure_cache(&self) -> &ObjectCache<Schema, Procedure> {
        &self.procedures
    }

    pub fn synonym_cache(&self) -> &ObjectCache<Schema, SynonymMetadata> {
        &self.synonyms
    }

    pub fn trigger_cache(&self) -> &ObjectCache<Schema, TriggerMetadata> {
        &self.triggers
    }

    /// Reload the table list and drop everything derived from it.
    ///
    /// Tables that are unchanged keep their instance; indexes, constraints
    /// and routines reload on next access.
    pub fn refresh(&self, monitor: &dyn Monitor) -> CatalogResult<()> {
        self.tables.refresh(self, monitor)?;
        self.indexes.clear(None);
        self.constraints.clear(None);
        self.foreign_keys.clear(None);
        self.procedures.clear();
        self.synonyms.clear();
        self.triggers.clear();
        debug!("Refreshed schema {}", self.name());
        Ok(())
    }

    /// Drop every cache of this schema
    pub fn clear(&self) {
        self.tables.clear();
        self.indexes.clear(None);
        self.constraints.clear(None);
        self.foreign_keys.clear(None);
        self.procedures.clear();
        self.synonyms.clear();
        self.triggers.clear();
    }

    pub(crate) fn source(&self) -> &Arc<dyn RowSource> {
        &self.source
    }

    pub(crate) fn cache_options(&self) -> CacheOptions {
        self.config.cache_options()
    }

    pub(crate) fn fetch_size(&self) -> u32 {
        self.config.fetch_size
    }

    fn require_table(&self, name: &str, monitor: &dyn Monitor) -> CatalogResult<Arc<TableMetadata>> {
        self.table(name, monitor)?.ok_or_else(|| CatalogError::ObjectNotFound {
            kind: "table",
            name: name.to_string(),
        })
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.metadata == other.metadata
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}
