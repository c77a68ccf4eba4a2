// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Row source boundary
//!
//! The caches never talk to a driver directly. They hand a [`Statement`] to a
//! [`RowSource`] supplied by the connection layer and consume the ordered
//! [`Row`]s it streams back.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sqlnav_catalog::{Row, RowSource, Statement};
//!
//! let statement = Statement::new("tables.list", "SELECT ...").bind("HR");
//! for row in source.query(&statement)? {
//!     let row = row?;
//!     println!("{}", row.get_str("TABLE_NAME")?);
//! }
//! ```

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// A single field value as delivered by the row source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view; numeric text is accepted since drivers often report
    /// `NUMBER` columns as strings
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// One result row: ordered named fields
///
/// Field lookup ignores ASCII case, matching how dictionary views report
/// column labels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: append a field
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(field, value);
        self
    }

    pub fn push(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.push((field.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Raw field access; `None` when the row has no such field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(field))
            .map(|(_, value)| value)
    }

    /// Required text field
    pub fn get_str(&self, field: &str) -> CatalogResult<&str> {
        self.get_opt_str(field)?.ok_or_else(|| missing(field))
    }

    /// Optional text field; absent and `NULL` both read as `None`
    pub fn get_opt_str(&self, field: &str) -> CatalogResult<Option<&str>> {
        match self.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Text(s)) => Ok(Some(s)),
            Some(other) => Err(invalid(field, format!("expected text, got {:?}", other))),
        }
    }

    /// Required integer field
    pub fn get_i64(&self, field: &str) -> CatalogResult<i64> {
        self.get_opt_i64(field)?.ok_or_else(|| missing(field))
    }

    /// Optional integer field; absent and `NULL` both read as `None`
    pub fn get_opt_i64(&self, field: &str) -> CatalogResult<Option<i64>> {
        match self.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| invalid(field, format!("expected integer, got {:?}", value))),
        }
    }

    /// Required non-negative integer field
    pub fn get_u32(&self, field: &str) -> CatalogResult<u32> {
        self.get_opt_u32(field)?.ok_or_else(|| missing(field))
    }

    pub fn get_opt_u32(&self, field: &str) -> CatalogResult<Option<u32>> {
        match self.get_opt_i64(field)? {
            None => Ok(None),
            Some(v) => u32::try_from(v)
                .map(Some)
                .map_err(|_| invalid(field, format!("{} is out of range", v))),
        }
    }

    /// Dictionary flag columns (`'Y'`/`'N'`, `'YES'`/`'NO'`, `'ENABLED'`/`'DISABLED'`)
    pub fn get_flag(&self, field: &str) -> CatalogResult<bool> {
        match self.get(field) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::Int(v)) => Ok(*v != 0),
            Some(Value::Text(s)) => Ok(matches!(
                s.trim().to_ascii_uppercase().as_str(),
                "Y" | "YES" | "TRUE" | "ENABLED" | "UNIQUE" | "VALID"
            )),
        }
    }
}

fn missing(field: &str) -> CatalogError {
    CatalogError::MissingField {
        field: field.to_string(),
    }
}

fn invalid(field: &str, reason: String) -> CatalogError {
    CatalogError::InvalidValue {
        field: field.to_string(),
        reason,
    }
}

/// A catalog query: stable id, SQL text and positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Stable identifier (`"tables.list"`), used in logs and by test sources
    pub id: &'static str,
    pub sql: Cow<'static, str>,
    pub params: Vec<Value>,
    /// Row prefetch hint for the driver
    pub fetch_size: u32,
}

impl Statement {
    /// Default row prefetch hint
    pub const DEFAULT_FETCH_SIZE: u32 = 200;

    pub fn new(id: &'static str, sql: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id,
            sql: sql.into(),
            params: Vec::new(),
            fetch_size: Self::DEFAULT_FETCH_SIZE,
        }
    }

    /// Builder method: bind the next positional parameter
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Builder method: set the prefetch hint
    pub fn with_fetch_size(mut self, fetch_size: u32) -> Self {
        self.fetch_size = fetch_size;
        self
    }
}

/// Stream of rows produced by one statement execution
pub type RowStream<'a> = Box<dyn Iterator<Item = CatalogResult<Row>> + 'a>;

/// Executes catalog statements
///
/// Implemented by the connection/session layer. Timeouts and connection
/// recovery are the implementation's business; the caches only see rows or
/// errors.
pub trait RowSource: Send + Sync {
    /// Execute `statement` and stream its rows in result order
    fn query(&self, statement: &Statement) -> CatalogResult<RowStream<'_>>;
}
