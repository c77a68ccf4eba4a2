// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Synonyms.
//!
//! With `readAllSynonyms` off only synonyms whose target is a table or view
//! are listed, which keeps the query cheap on schemas with thousands of
//! public synonyms.

use sqlnav_model::{ObjectRef, SynonymMetadata};

use super::Schema;
use crate::cache::ObjectFetcher;
use crate::error::CatalogResult;
use crate::key::CatalogObject;
use crate::row::{Row, Statement};

const SYNONYMS_SQL: &str = "\
SELECT SYNONYM_NAME, TABLE_OWNER, TABLE_NAME, DB_LINK
FROM ALL_SYNONYMS
WHERE OWNER = :1
ORDER BY SYNONYM_NAME";

const TABLE_SYNONYMS_SQL: &str = "\
SELECT s.SYNONYM_NAME, s.TABLE_OWNER, s.TABLE_NAME, s.DB_LINK
FROM ALL_SYNONYMS s
JOIN ALL_OBJECTS o ON o.OWNER = s.TABLE_OWNER AND o.OBJECT_NAME = s.TABLE_NAME
WHERE s.OWNER = :1 AND o.OBJECT_TYPE IN ('TABLE', 'VIEW')
ORDER BY s.SYNONYM_NAME";

const SYNONYM_LOOKUP_SQL: &str = "\
SELECT SYNONYM_NAME, TABLE_OWNER, TABLE_NAME, DB_LINK
FROM ALL_SYNONYMS
WHERE OWNER = :1 AND SYNONYM_NAME = :2";

const TABLE_SYNONYM_LOOKUP_SQL: &str = "\
SELECT s.SYNONYM_NAME, s.TABLE_OWNER, s.TABLE_NAME, s.DB_LINK
FROM ALL_SYNONYMS s
JOIN ALL_OBJECTS o ON o.OWNER = s.TABLE_OWNER AND o.OBJECT_NAME = s.TABLE_NAME
WHERE s.OWNER = :1 AND s.SYNONYM_NAME = :2 AND o.OBJECT_TYPE IN ('TABLE', 'VIEW')";

impl CatalogObject for SynonymMetadata {
    fn name(&self) -> &str {
        &self.name
    }
}

pub(super) struct SynonymFetcher {
    pub(super) read_all: bool,
}

impl ObjectFetcher<Schema, SynonymMetadata> for SynonymFetcher {
    fn prepare_objects(&self, owner: &Schema) -> Statement {
        let statement = if self.read_all {
            Statement::new("synonyms.list", SYNONYMS_SQL)
        } else {
            Statement::new("synonyms.tables", TABLE_SYNONYMS_SQL)
        };
        statement.bind(owner.name()).with_fetch_size(owner.fetch_size())
    }

    fn prepare_lookup(&self, owner: &Schema, name: &str) -> Option<Statement> {
        let statement = if self.read_all {
            Statement::new("synonyms.lookup", SYNONYM_LOOKUP_SQL)
        } else {
            Statement::new("synonyms.tables.lookup", TABLE_SYNONYM_LOOKUP_SQL)
        };
        Some(statement.bind(owner.name()).bind(name))
    }

    fn fetch_object(&self, owner: &Schema, row: &Row) -> CatalogResult<Option<SynonymMetadata>> {
        let target = ObjectRef::new(row.get_str("TABLE_OWNER")?, row.get_str("TABLE_NAME")?);
        let mut synonym = SynonymMetadata::new(owner.name(), row.get_str("SYNONYM_NAME")?, target);
        if let Some(link) = row.get_opt_str("DB_LINK")? {
            synonym = synonym.with_db_link(link);
        }
        Ok(Some(synonym))
    }
}
