// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Mock row source for testing
//!
//! Serves scripted rows per statement id and records every statement it
//! executes, so tests can assert how many queries a cache issued.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Deserialize;
use sqlnav_catalog::{CatalogError, CatalogResult, Row, RowSource, RowStream, Statement, Value};

use crate::fixtures::CatalogFixtures;

/// Scripted answer for one statement id
#[derive(Debug, Clone, Default)]
struct Response {
    rows: Vec<Row>,
    /// `(param index, row field)`: keep rows whose field equals the bound
    /// parameter, ignoring ASCII case
    filters: Vec<(usize, String)>,
    error: Option<CatalogError>,
}

impl Response {
    fn matching_rows(&self, statement: &Statement) -> Vec<Row> {
        self.rows
            .iter()
            .filter(|row| {
                self.filters.iter().all(|(index, field)| {
                    match (statement.params.get(*index), row.get(field)) {
                        (Some(Value::Text(param)), Some(Value::Text(value))) => {
                            param.eq_ignore_ascii_case(value)
                        }
                        (Some(param), Some(value)) => param == value,
                        (None, _) => true,
                        (Some(_), None) => false,
                    }
                })
            })
            .cloned()
            .collect()
    }
}

/// In-memory row source for testing
#[derive(Debug, Default)]
pub struct MockRowSource {
    responses: Mutex<HashMap<String, Response>>,
    delay: Option<Duration>,
    executed: Mutex<Vec<Statement>>,
}

impl MockRowSource {
    /// Create a new source with no scripted statements
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a source from a YAML script.
    ///
    /// ```yaml
    /// statements:
    ///   tables.list:
    ///     rows:
    ///       - { TABLE_NAME: EMPLOYEES, OBJECT_TYPE: TABLE }
    ///   columns.table:
    ///     filters: [[1, TABLE_NAME]]
    ///     rows: [...]
    ///   triggers.list:
    ///     error: permission_denied
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self, FixtureError> {
        let script: Script = serde_yaml::from_str(yaml)?;
        let mut builder = MockRowSourceBuilder::new();
        for (id, entry) in script.statements {
            let mut rows = Vec::with_capacity(entry.rows.len());
            for mapping in entry.rows {
                rows.push(row_from_yaml(&id, mapping)?);
            }
            builder.source.responses.get_mut().insert(
                id,
                Response {
                    rows,
                    filters: entry.filters,
                    error: entry.error.as_deref().map(error_from_kind),
                },
            );
        }
        Ok(builder.build())
    }

    /// Number of executions of statement `id`
    pub fn query_count(&self, id: &str) -> usize {
        self.executed.lock().iter().filter(|s| s.id == id).count()
    }

    /// Number of executed statements
    pub fn total_queries(&self) -> usize {
        self.executed.lock().len()
    }

    /// Every executed statement, in order
    pub fn executed(&self) -> Vec<Statement> {
        self.executed.lock().clone()
    }

    /// Ids of executed statements, in order
    pub fn executed_ids(&self) -> Vec<&'static str> {
        self.executed.lock().iter().map(|s| s.id).collect()
    }

    /// Replace the rows served for `id`, keeping its filters
    pub fn set_rows(&self, id: &str, rows: Vec<Row>) {
        self.responses.lock().entry(id.to_string()).or_default().rows = rows;
    }
}

impl RowSource for MockRowSource {
    fn query(&self, statement: &Statement) -> CatalogResult<RowStream<'_>> {
        self.executed.lock().push(statement.clone());
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let rows = match self.responses.lock().get(statement.id) {
            None => Vec::new(),
            Some(Response {
                error: Some(error), ..
            }) => return Err(error.clone()),
            Some(response) => response.matching_rows(statement),
        };
        Ok(Box::new(rows.into_iter().map(Ok)))
    }
}

/// Builder for creating mock row sources with a fluent API
pub struct MockRowSourceBuilder {
    source: MockRowSource,
}

impl Default for MockRowSourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRowSourceBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            source: MockRowSource::new(),
        }
    }

    /// Serve `rows` for statement `id`
    pub fn rows(mut self, id: &str, rows: Vec<Row>) -> Self {
        self.source.responses.get_mut().entry(id.to_string()).or_default().rows = rows;
        self
    }

    /// Serve `rows` for statement `id`, keeping only rows whose `field`
    /// equals the parameter bound at `param`
    pub fn filtered_rows(mut self, id: &str, rows: Vec<Row>, filters: &[(usize, &str)]) -> Self {
        let response = self.source.responses.get_mut().entry(id.to_string()).or_default();
        response.rows = rows;
        response.filters = filters
            .iter()
            .map(|(index, field)| (*index, field.to_string()))
            .collect();
        self
    }

    /// Fail every execution of statement `id`
    pub fn fail(mut self, id: &str, error: CatalogError) -> Self {
        self.source.responses.get_mut().entry(id.to_string()).or_default().error = Some(error);
        self
    }

    /// Sleep before answering each statement
    pub fn delay(mut self, delay: Duration) -> Self {
        self.source.delay = Some(delay);
        self
    }

    /// Add the HR sample schema (see [`CatalogFixtures`])
    pub fn with_hr_schema(self) -> Self {
        self.rows("schemas.list", CatalogFixtures::schema_rows())
            .filtered_rows("schemas.lookup", CatalogFixtures::schema_rows(), &[(0, "USERNAME")])
            .rows("tables.list", CatalogFixtures::table_rows())
            .filtered_rows("tables.lookup", CatalogFixtures::table_rows(), &[(1, "TABLE_NAME")])
            .rows("columns.list", CatalogFixtures::column_rows())
            .filtered_rows("columns.table", CatalogFixtures::column_rows(), &[(1, "TABLE_NAME")])
            .rows("indexes.list", CatalogFixtures::index_rows())
            .filtered_rows("indexes.table", CatalogFixtures::index_rows(), &[(1, "TABLE_NAME")])
            .rows("constraints.list", CatalogFixtures::constraint_rows())
            .filtered_rows(
                "constraints.table",
                CatalogFixtures::constraint_rows(),
                &[(1, "TABLE_NAME")],
            )
            .rows("foreign_keys.list", CatalogFixtures::foreign_key_rows())
            .filtered_rows(
                "foreign_keys.table",
                CatalogFixtures::foreign_key_rows(),
                &[(1, "TABLE_NAME")],
            )
            .rows("procedures.list", CatalogFixtures::procedure_rows())
            .filtered_rows(
                "procedures.lookup",
                CatalogFixtures::procedure_rows(),
                &[(1, "OBJECT_NAME")],
            )
            .filtered_rows(
                "arguments.list",
                CatalogFixtures::argument_rows(),
                &[(0, "OBJECT_ID")],
            )
            .rows("synonyms.list", CatalogFixtures::synonym_rows())
            .filtered_rows(
                "synonyms.lookup",
                CatalogFixtures::synonym_rows(),
                &[(1, "SYNONYM_NAME")],
            )
            .rows("synonyms.tables", CatalogFixtures::table_synonym_rows())
            .filtered_rows(
                "synonyms.tables.lookup",
                CatalogFixtures::table_synonym_rows(),
                &[(1, "SYNONYM_NAME")],
            )
            .rows("triggers.list", CatalogFixtures::trigger_rows())
            .filtered_rows(
                "triggers.lookup",
                CatalogFixtures::trigger_rows(),
                &[(1, "TRIGGER_NAME")],
            )
    }

    /// Build the source
    pub fn build(self) -> MockRowSource {
        self.source
    }
}

/// Errors reading a YAML script
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("Invalid YAML script: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Statement '{statement}': {reason}")]
    InvalidRow { statement: String, reason: String },
}

#[derive(Deserialize)]
struct Script {
    statements: HashMap<String, ScriptEntry>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ScriptEntry {
    rows: Vec<serde_yaml::Mapping>,
    filters: Vec<(usize, String)>,
    error: Option<String>,
}

fn row_from_yaml(statement: &str, mapping: serde_yaml::Mapping) -> Result<Row, FixtureError> {
    let invalid = |reason: String| FixtureError::InvalidRow {
        statement: statement.to_string(),
        reason,
    };
    let mut row = Row::new();
    for (key, value) in mapping {
        let field = key
            .as_str()
            .ok_or_else(|| invalid(format!("field name {:?} is not a string", key)))?
            .to_string();
        let value: Value = serde_yaml::from_value(value)
            .map_err(|e| invalid(format!("field {}: {}", field, e)))?;
        row.push(field, value);
    }
    Ok(row)
}

fn error_from_kind(kind: &str) -> CatalogError {
    match kind {
        "permission_denied" => CatalogError::PermissionDenied("scripted".to_string()),
        "not_supported" => CatalogError::NotSupported("scripted".to_string()),
        "timeout" => CatalogError::QueryTimeout(30),
        other => CatalogError::ConnectionFailed(other.to_string()),
    }
}
