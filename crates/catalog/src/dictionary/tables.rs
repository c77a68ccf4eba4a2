// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Tables, views and their columns.

use sqlnav_model::{ColumnMetadata, DataType, TableMetadata, TableType};

use super::Schema;
use crate::cache::{ChildFetcher, ObjectFetcher, StructCache};
use crate::error::CatalogResult;
use crate::key::CatalogObject;
use crate::row::{Row, Statement};

/// Tables and views of a schema, with columns loaded on demand
pub type TableCache = StructCache<Schema, TableMetadata, ColumnMetadata>;

const TABLES_SQL: &str = "\
SELECT t.TABLE_NAME, 'TABLE' AS OBJECT_TYPE, t.TEMPORARY, t.NUM_ROWS, c.COMMENTS
FROM ALL_TABLES t
LEFT JOIN ALL_TAB_COMMENTS c ON c.OWNER = t.OWNER AND c.TABLE_NAME = t.TABLE_NAME
WHERE t.OWNER = :1
UNION ALL
SELECT v.VIEW_NAME, 'VIEW', 'N', NULL, c.COMMENTS
FROM ALL_VIEWS v
LEFT JOIN ALL_TAB_COMMENTS c ON c.OWNER = v.OWNER AND c.TABLE_NAME = v.VIEW_NAME
WHERE v.OWNER = :1";

const TABLE_LOOKUP_SQL: &str = "\
SELECT * FROM (
SELECT t.TABLE_NAME, 'TABLE' AS OBJECT_TYPE, t.TEMPORARY, t.NUM_ROWS, c.COMMENTS
FROM ALL_TABLES t
LEFT JOIN ALL_TAB_COMMENTS c ON c.OWNER = t.OWNER AND c.TABLE_NAME = t.TABLE_NAME
WHERE t.OWNER = :1
UNION ALL
SELECT v.VIEW_NAME, 'VIEW', 'N', NULL, c.COMMENTS
FROM ALL_VIEWS v
LEFT JOIN ALL_TAB_COMMENTS c ON c.OWNER = v.OWNER AND c.TABLE_NAME = v.VIEW_NAME
WHERE v.OWNER = :1
) WHERE TABLE_NAME = :2";

const COLUMNS_SQL: &str = "\
SELECT c.TABLE_NAME, c.COLUMN_NAME, c.COLUMN_ID, c.DATA_TYPE, c.CHAR_LENGTH,
       c.DATA_PRECISION, c.DATA_SCALE, c.NULLABLE, c.DATA_DEFAULT, m.COMMENTS
FROM ALL_TAB_COLUMNS c
LEFT JOIN ALL_COL_COMMENTS m
  ON m.OWNER = c.OWNER AND m.TABLE_NAME = c.TABLE_NAME AND m.COLUMN_NAME = c.COLUMN_NAME
WHERE c.OWNER = :1
ORDER BY c.TABLE_NAME, c.COLUMN_ID";

const TABLE_COLUMNS_SQL: &str = "\
SELECT c.TABLE_NAME, c.COLUMN_NAME, c.COLUMN_ID, c.DATA_TYPE, c.CHAR_LENGTH,
       c.DATA_PRECISION, c.DATA_SCALE, c.NULLABLE, c.DATA_DEFAULT, m.COMMENTS
FROM ALL_TAB_COLUMNS c
LEFT JOIN ALL_COL_COMMENTS m
  ON m.OWNER = c.OWNER AND m.TABLE_NAME = c.TABLE_NAME AND m.COLUMN_NAME = c.COLUMN_NAME
WHERE c.OWNER = :1 AND c.TABLE_NAME = :2
ORDER BY c.COLUMN_ID";

impl CatalogObject for TableMetadata {
    fn name(&self) -> &str {
        &self.name
    }
}

impl CatalogObject for ColumnMetadata {
    fn name(&self) -> &str {
        &self.name
    }
}

pub(super) struct TableFetcher;

impl ObjectFetcher<Schema, TableMetadata> for TableFetcher {
    fn prepare_objects(&self, owner: &Schema) -> Statement {
        Statement::new("tables.list", TABLES_SQL)
            .bind(owner.name())
            .with_fetch_size(owner.fetch_size())
    }

    fn prepare_lookup(&self, owner: &Schema, name: &str) -> Option<Statement> {
        Some(
            Statement::new("tables.lookup", TABLE_LOOKUP_SQL)
                .bind(owner.name())
                .bind(name),
        )
    }

    fn fetch_object(&self, owner: &Schema, row: &Row) -> CatalogResult<Option<TableMetadata>> {
        let table_type = if row.get_flag("TEMPORARY")? {
            TableType::Temporary
        } else {
            TableType::from_object_type(row.get_str("OBJECT_TYPE")?)
        };
        let mut table = TableMetadata::new(row.get_str("TABLE_NAME")?, owner.name()).with_type(table_type);
        if let Some(rows) = row.get_opt_i64("NUM_ROWS")? {
            table = table.with_row_count(rows.max(0) as u64);
        }
        if let Some(comment) = row.get_opt_str("COMMENTS")? {
            table = table.with_comment(comment);
        }
        Ok(Some(table))
    }
}

pub(super) struct ColumnFetcher;

impl ChildFetcher<Schema, TableMetadata, ColumnMetadata> for ColumnFetcher {
    fn prepare_children(&self, owner: &Schema, table: Option<&TableMetadata>) -> Statement {
        let statement = match table {
            Some(table) => Statement::new("columns.table", TABLE_COLUMNS_SQL)
                .bind(owner.name())
                .bind(table.name.as_str()),
            None => Statement::new("columns.list", COLUMNS_SQL).bind(owner.name()),
        };
        statement.with_fetch_size(owner.fetch_size())
    }

    fn object_name(&self, row: &Row) -> CatalogResult<String> {
        Ok(row.get_str("TABLE_NAME")?.to_string())
    }

    fn fetch_child(
        &self,
        _owner: &Schema,
        table: &TableMetadata,
        row: &Row,
    ) -> CatalogResult<Option<ColumnMetadata>> {
        let mut column = ColumnMetadata::new(
            table.name.as_str(),
            row.get_str("COLUMN_NAME")?,
            row.get_u32("COLUMN_ID")?,
            DataType::from_type_name(&column_type_name(row)?),
        )
        .with_nullable(row.get_flag("NULLABLE")?);
        if let Some(default) = row.get_opt_str("DATA_DEFAULT")? {
            column = column.with_default(default.trim());
        }
        if let Some(comment) = row.get_opt_str("COMMENTS")? {
            column = column.with_comment(comment);
        }
        Ok(Some(column))
    }

    fn ordinal(&self, column: &ColumnMetadata) -> u32 {
        column.position
    }
}

/// Rebuild the declared type (`VARCHAR2(30)`, `NUMBER(10,0)`) from the
/// separate length/precision/scale columns
fn column_type_name(row: &Row) -> CatalogResult<String> {
    let base = row.get_str("DATA_TYPE")?;
    let precision = row.get_opt_i64("DATA_PRECISION")?;
    let scale = row.get_opt_i64("DATA_SCALE")?;
    let length = row.get_opt_i64("CHAR_LENGTH")?.filter(|l| *l > 0);

    Ok(match (precision, scale, length) {
        (Some(p), Some(s), _) => format!("{}({},{})", base, p, s),
        (Some(p), None, _) => format!("{}({})", base, p),
        (None, Some(0), _) if base.eq_ignore_ascii_case("NUMBER") => format!("{}(38,0)", base),
        (None, _, Some(l)) => format!("{}({})", base, l),
        _ => base.to_string(),
    })
}
