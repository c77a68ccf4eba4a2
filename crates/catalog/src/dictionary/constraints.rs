// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Key and check constraints, and foreign keys.
//!
//! Constraints arrive as one row each with their columns packed into a
//! `COLUMNS` field (`"ID:1,VERSION:2"`). Foreign keys arrive as one row per
//! column. Both end up as an object with an ordered column list.

use std::sync::Arc;

use sqlnav_model::{
    ConstraintColumn, ConstraintKind, ConstraintMetadata, DeleteRule, ForeignKeyMetadata,
    ObjectRef, TableMetadata,
};
use tracing::warn;

use super::Schema;
use crate::cache::{CompositeCache, CompositeFetcher, CompositeObject, parse_packed_columns};
use crate::error::CatalogResult;
use crate::key::{CacheKey, CatalogObject};
use crate::monitor::Monitor;
use crate::row::{Row, Statement};

pub type ConstraintCache = CompositeCache<Schema, TableMetadata, ConstraintMetadata>;
pub type ForeignKeyCache = CompositeCache<Schema, TableMetadata, ForeignKeyMetadata>;

const CONSTRAINTS_SQL: &str = "\
SELECT c.TABLE_NAME, c.CONSTRAINT_NAME, c.CONSTRAINT_TYPE, c.STATUS, c.SEARCH_CONDITION,
       (SELECT LISTAGG(cc.COLUMN_NAME || ':' || cc.POSITION, ',')
               WITHIN GROUP (ORDER BY cc.POSITION)
        FROM ALL_CONS_COLUMNS cc
        WHERE cc.OWNER = c.OWNER AND cc.CONSTRAINT_NAME = c.CONSTRAINT_NAME) AS COLUMNS
FROM ALL_CONSTRAINTS c
WHERE c.OWNER = :1 AND c.CONSTRAINT_TYPE IN ('P', 'U', 'C')
ORDER BY c.TABLE_NAME, c.CONSTRAINT_NAME";

const TABLE_CONSTRAINTS_SQL: &str = "\
SELECT c.TABLE_NAME, c.CONSTRAINT_NAME, c.CONSTRAINT_TYPE, c.STATUS, c.SEARCH_CONDITION,
       (SELECT LISTAGG(cc.COLUMN_NAME || ':' || cc.POSITION, ',')
               WITHIN GROUP (ORDER BY cc.POSITION)
        FROM ALL_CONS_COLUMNS cc
        WHERE cc.OWNER = c.OWNER AND cc.CONSTRAINT_NAME = c.CONSTRAINT_NAME) AS COLUMNS
FROM ALL_CONSTRAINTS c
WHERE c.OWNER = :1 AND c.TABLE_NAME = :2 AND c.CONSTRAINT_TYPE IN ('P', 'U', 'C')
ORDER BY c.CONSTRAINT_NAME";

const FOREIGN_KEYS_SQL: &str = "\
SELECT c.TABLE_NAME, c.CONSTRAINT_NAME, c.R_OWNER, c.R_CONSTRAINT_NAME, c.DELETE_RULE,
       c.STATUS, cc.COLUMN_NAME, cc.POSITION
FROM ALL_CONSTRAINTS c
JOIN ALL_CONS_COLUMNS cc ON cc.OWNER = c.OWNER AND cc.CONSTRAINT_NAME = c.CONSTRAINT_NAME
WHERE c.OWNER = :1 AND c.CONSTRAINT_TYPE = 'R'
ORDER BY c.TABLE_NAME, c.CONSTRAINT_NAME, cc.POSITION";

const TABLE_FOREIGN_KEYS_SQL: &str = "\
SELECT c.TABLE_NAME, c.CONSTRAINT_NAME, c.R_OWNER, c.R_CONSTRAINT_NAME, c.DELETE_RULE,
       c.STATUS, cc.COLUMN_NAME, cc.POSITION
FROM ALL_CONSTRAINTS c
JOIN ALL_CONS_COLUMNS cc ON cc.OWNER = c.OWNER AND cc.CONSTRAINT_NAME = c.CONSTRAINT_NAME
WHERE c.OWNER = :1 AND c.TABLE_NAME = :2 AND c.CONSTRAINT_TYPE = 'R'
ORDER BY c.CONSTRAINT_NAME, cc.POSITION";

impl CatalogObject for ConstraintMetadata {
    fn name(&self) -> &str {
        &self.name
    }
}

impl CompositeObject for ConstraintMetadata {
    type Detail = ConstraintColumn;

    fn details(&self) -> &[ConstraintColumn] {
        &self.columns
    }
}

impl CatalogObject for ForeignKeyMetadata {
    fn name(&self) -> &str {
        &self.name
    }

    fn key(&self) -> CacheKey {
        CacheKey::qualified(self.table_name.as_str(), self.name.as_str())
    }
}

impl CompositeObject for ForeignKeyMetadata {
    type Detail = ConstraintColumn;

    fn details(&self) -> &[ConstraintColumn] {
        &self.columns
    }
}

fn table_statement(
    owner: &Schema,
    table: Option<&TableMetadata>,
    list: (&'static str, &'static str),
    single: (&'static str, &'static str),
) -> Statement {
    let statement = match table {
        Some(table) => Statement::new(single.0, single.1)
            .bind(owner.name())
            .bind(table.name.as_str()),
        None => Statement::new(list.0, list.1).bind(owner.name()),
    };
    statement.with_fetch_size(owner.fetch_size())
}

/// Resolve a constraint column against the table's cached columns,
/// keeping the table's spelling
fn resolve_column(
    owner: &Schema,
    table: &TableMetadata,
    constraint: &str,
    column_name: &str,
    position: u32,
    monitor: &dyn Monitor,
) -> CatalogResult<Option<ConstraintColumn>> {
    match owner.table_cache().get_child(owner, table, column_name, monitor)? {
        Some(column) => Ok(Some(ConstraintColumn {
            column_name: column.name.clone(),
            position,
        })),
        None => {
            warn!(
                "Column {} of constraint {} not found in table {}",
                column_name, constraint, table.name
            );
            Ok(None)
        }
    }
}

pub(super) struct ConstraintFetcher;

impl CompositeFetcher<Schema, TableMetadata, ConstraintMetadata> for ConstraintFetcher {
    fn prepare_objects(&self, owner: &Schema, table: Option<&TableMetadata>) -> Statement {
        table_statement(
            owner,
            table,
            ("constraints.list", CONSTRAINTS_SQL),
            ("constraints.table", TABLE_CONSTRAINTS_SQL),
        )
    }

    fn parent_name(&self, row: &Row) -> CatalogResult<String> {
        Ok(row.get_str("TABLE_NAME")?.to_string())
    }

    fn fetch_parent(
        &self,
        owner: &Schema,
        name: &str,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Option<Arc<TableMetadata>>> {
        owner.table(name, monitor)
    }

    fn object_name(&self, row: &Row) -> CatalogResult<String> {
        Ok(row.get_str("CONSTRAINT_NAME")?.to_string())
    }

    fn fetch_object(
        &self,
        _owner: &Schema,
        table: &TableMetadata,
        row: &Row,
    ) -> CatalogResult<Option<ConstraintMetadata>> {
        let Some(kind) = ConstraintKind::from_code(row.get_str("CONSTRAINT_TYPE")?) else {
            return Ok(None);
        };
        let mut constraint =
            ConstraintMetadata::new(table.name.as_str(), row.get_str("CONSTRAINT_NAME")?, kind)
                .with_enabled(row.get_flag("STATUS")?);
        if let Some(condition) = row.get_opt_str("SEARCH_CONDITION")? {
            constraint = constraint.with_condition(condition);
        }
        Ok(Some(constraint))
    }

    fn fetch_object_row(
        &self,
        owner: &Schema,
        table: &TableMetadata,
        constraint: &ConstraintMetadata,
        row: &Row,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Vec<ConstraintColumn>> {
        let Some(packed) = row.get_opt_str("COLUMNS")? else {
            return Ok(Vec::new());
        };
        let mut columns = Vec::new();
        for packed in parse_packed_columns(packed)? {
            if let Some(column) =
                resolve_column(owner, table, &constraint.name, &packed.name, packed.position, monitor)?
            {
                columns.push(column);
            }
        }
        Ok(columns)
    }

    fn cache_children(&self, constraint: &mut ConstraintMetadata, columns: Vec<ConstraintColumn>) {
        constraint.columns = columns;
    }
}

pub(super) struct ForeignKeyFetcher;

impl CompositeFetcher<Schema, TableMetadata, ForeignKeyMetadata> for ForeignKeyFetcher {
    fn prepare_objects(&self, owner: &Schema, table: Option<&TableMetadata>) -> Statement {
        table_statement(
            owner,
            table,
            ("foreign_keys.list", FOREIGN_KEYS_SQL),
            ("foreign_keys.table", TABLE_FOREIGN_KEYS_SQL),
        )
    }

    fn parent_name(&self, row: &Row) -> CatalogResult<String> {
        Ok(row.get_str("TABLE_NAME")?.to_string())
    }

    fn fetch_parent(
        &self,
        owner: &Schema,
        name: &str,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Option<Arc<TableMetadata>>> {
        owner.table(name, monitor)
    }

    fn object_name(&self, row: &Row) -> CatalogResult<String> {
        Ok(row.get_str("CONSTRAINT_NAME")?.to_string())
    }

    fn fetch_object(
        &self,
        _owner: &Schema,
        table: &TableMetadata,
        row: &Row,
    ) -> CatalogResult<Option<ForeignKeyMetadata>> {
        let referenced = ObjectRef::new(row.get_str("R_OWNER")?, row.get_str("R_CONSTRAINT_NAME")?);
        let mut foreign_key =
            ForeignKeyMetadata::new(table.name.as_str(), row.get_str("CONSTRAINT_NAME")?, referenced);
        if let Some(rule) = row.get_opt_str("DELETE_RULE")? {
            foreign_key = foreign_key.with_delete_rule(DeleteRule::from_rule(rule));
        }
        foreign_key.enabled = row.get_flag("STATUS")?;
        Ok(Some(foreign_key))
    }

    fn fetch_object_row(
        &self,
        owner: &Schema,
        table: &TableMetadata,
        foreign_key: &ForeignKeyMetadata,
        row: &Row,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Vec<ConstraintColumn>> {
        let column = resolve_column(
            owner,
            table,
            &foreign_key.name,
            row.get_str("COLUMN_NAME")?,
            row.get_u32("POSITION")?,
            monitor,
        )?;
        Ok(column.into_iter().collect())
    }

    fn cache_children(&self, foreign_key: &mut ForeignKeyMetadata, columns: Vec<ConstraintColumn>) {
        foreign_key.columns = columns;
    }
}
