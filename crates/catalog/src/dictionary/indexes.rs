// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Indexes, one row per indexed column.

use std::sync::Arc;

use sqlnav_model::{IndexColumn, IndexMetadata, TableMetadata};
use tracing::warn;

use super::Schema;
use crate::cache::{CompositeCache, CompositeFetcher, CompositeObject};
use crate::error::CatalogResult;
use crate::key::CatalogObject;
use crate::monitor::Monitor;
use crate::row::{Row, Statement};

pub type IndexCache = CompositeCache<Schema, TableMetadata, IndexMetadata>;

const INDEXES_SQL: &str = "\
SELECT i.TABLE_NAME, i.INDEX_NAME, i.INDEX_TYPE, i.UNIQUENESS,
       c.COLUMN_NAME, c.COLUMN_POSITION, c.DESCEND
FROM ALL_INDEXES i
JOIN ALL_IND_COLUMNS c ON c.INDEX_OWNER = i.OWNER AND c.INDEX_NAME = i.INDEX_NAME
WHERE i.TABLE_OWNER = :1
ORDER BY i.TABLE_NAME, i.INDEX_NAME, c.COLUMN_POSITION";

const TABLE_INDEXES_SQL: &str = "\
SELECT i.TABLE_NAME, i.INDEX_NAME, i.INDEX_TYPE, i.UNIQUENESS,
       c.COLUMN_NAME, c.COLUMN_POSITION, c.DESCEND
FROM ALL_INDEXES i
JOIN ALL_IND_COLUMNS c ON c.INDEX_OWNER = i.OWNER AND c.INDEX_NAME = i.INDEX_NAME
WHERE i.TABLE_OWNER = :1 AND i.TABLE_NAME = :2
ORDER BY i.INDEX_NAME, c.COLUMN_POSITION";

impl CatalogObject for IndexMetadata {
    fn name(&self) -> &str {
        &self.name
    }
}

impl CompositeObject for IndexMetadata {
    type Detail = IndexColumn;

    fn details(&self) -> &[IndexColumn] {
        &self.columns
    }
}

pub(super) struct IndexFetcher;

impl CompositeFetcher<Schema, TableMetadata, IndexMetadata> for IndexFetcher {
    fn prepare_objects(&self, owner: &Schema, table: Option<&TableMetadata>) -> Statement {
        let statement = match table {
            Some(table) => Statement::new("indexes.table", TABLE_INDEXES_SQL)
                .bind(owner.name())
                .bind(table.name.as_str()),
            None => Statement::new("indexes.list", INDEXES_SQL).bind(owner.name()),
        };
        statement.with_fetch_size(owner.fetch_size())
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
        Ok(row.get_str("INDEX_NAME")?.to_string())
    }

    fn fetch_object(
        &self,
        _owner: &Schema,
        table: &TableMetadata,
        row: &Row,
    ) -> CatalogResult<Option<IndexMetadata>> {
        let mut index = IndexMetadata::new(table.name.as_str(), row.get_str("INDEX_NAME")?)
            .with_unique(row.get_flag("UNIQUENESS")?);
        if let Some(index_type) = row.get_opt_str("INDEX_TYPE")? {
            index = index.with_index_type(index_type);
        }
        Ok(Some(index))
    }

    fn fetch_object_row(
        &self,
        owner: &Schema,
        table: &TableMetadata,
        index: &IndexMetadata,
        row: &Row,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Vec<IndexColumn>> {
        let column_name = row.get_str("COLUMN_NAME")?;
        let Some(column) = owner
            .table_cache()
            .get_child(owner, table, column_name, monitor)?
        else {
            // Function-based indexes list hidden virtual columns
            warn!(
                "Column {} of index {} not found in table {}",
                column_name, index.name, table.name
            );
            return Ok(Vec::new());
        };
        Ok(vec![IndexColumn {
            column_name: column.name.clone(),
            position: row.get_u32("COLUMN_POSITION")?,
            descending: row
                .get_opt_str("DESCEND")?
                .is_some_and(|d| d.eq_ignore_ascii_case("DESC")),
        }])
    }

    fn cache_children(&self, index: &mut IndexMetadata, columns: Vec<IndexColumn>) {
        index.columns = columns;
    }
}
