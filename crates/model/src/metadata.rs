// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Metadata types for database schema information
//!
//! This module defines the types used to represent database schema metadata,
//! including schemas, tables, columns, indexes, constraints, synonyms and
//! triggers.

use serde::{Deserialize, Serialize};

use crate::data_type::DataType;

/// Key of an object living in another schema: `(owner, name)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub owner: String,
    pub name: String,
}

impl ObjectRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.owner, self.name)
    }
}

/// Metadata for a schema (database user owning objects)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaMetadata {
    /// Schema name
    pub name: String,
    /// Whether the schema is maintained by the vendor
    pub is_system: bool,
}

impl SchemaMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_system: false,
        }
    }

    /// Builder method: mark as system schema
    pub fn with_system(mut self, is_system: bool) -> Self {
        self.is_system = is_system;
        self
    }
}

/// Table type classification
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableType {
    Table,
    View,
    MaterializedView,
    Temporary,
    Other(String),
}

impl TableType {
    /// Map the dictionary `OBJECT_TYPE` spelling to a table type
    pub fn from_object_type(object_type: &str) -> Self {
        match object_type.trim().to_uppercase().as_str() {
            "TABLE" => TableType::Table,
            "VIEW" => TableType::View,
            "MATERIALIZED VIEW" => TableType::MaterializedView,
            "TEMPORARY TABLE" => TableType::Temporary,
            other => TableType::Other(other.to_string()),
        }
    }
}

/// Metadata for a database table
///
/// Columns are not embedded: the table list and the column list come from
/// separate dictionary queries and are cached independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Table name
    pub name: String,
    /// Owning schema name
    pub schema: String,
    /// Estimated row count (from optimizer statistics)
    pub row_count_estimate: Option<u64>,
    /// Table comment/description
    pub comment: Option<String>,
    /// Table type (TABLE, VIEW, MATERIALIZED VIEW, etc.)
    pub table_type: TableType,
}

impl TableMetadata {
    /// Create new table metadata with builder pattern
    pub fn new(name: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            row_count_estimate: None,
            comment: None,
            table_type: TableType::Table,
        }
    }

    /// Builder method: set row count estimate
    pub fn with_row_count(mut self, count: u64) -> Self {
        self.row_count_estimate = Some(count);
        self
    }

    /// Builder method: set comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Builder method: set table type
    pub fn with_type(mut self, table_type: TableType) -> Self {
        self.table_type = table_type;
        self
    }

    pub fn is_view(&self) -> bool {
        matches!(self.table_type, TableType::View | TableType::MaterializedView)
    }
}

/// Metadata for a database column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Column name
    pub name: String,
    /// Name of the owning table
    pub table_name: String,
    /// 1-based ordinal position within the table
    pub position: u32,
    /// Data type
    pub data_type: DataType,
    /// Whether the column is nullable
    pub nullable: bool,
    /// Default value (as SQL expression string)
    pub default_value: Option<String>,
    /// Column comment/description
    pub comment: Option<String>,
}

impl ColumnMetadata {
    /// Create a new column metadata with builder pattern
    pub fn new(
        table_name: impl Into<String>,
        name: impl Into<String>,
        position: u32,
        data_type: DataType,
    ) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            position,
            data_type,
            nullable: true,
            default_value: None,
            comment: None,
        }
    }

    /// Builder method: set nullable
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Builder method: set default value
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default_value = Some(default.into());
        self
    }

    /// Builder method: set comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// One column of an index, in index order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColumn {
    pub column_name: String,
    /// 1-based position within the index
    pub position: u32,
    pub descending: bool,
}

/// Metadata for an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub name: String,
    /// Indexed table (back-reference by name)
    pub table_name: String,
    pub unique: bool,
    /// Vendor index type (`NORMAL`, `BITMAP`, `FUNCTION-BASED NORMAL`, ...)
    pub index_type: String,
    /// Index columns in index position order
    pub columns: Vec<IndexColumn>,
}

impl IndexMetadata {
    pub fn new(table_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            unique: false,
            index_type: "NORMAL".to_string(),
            columns: Vec::new(),
        }
    }

    /// Builder method: set uniqueness
    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Builder method: set vendor index type
    pub fn with_index_type(mut self, index_type: impl Into<String>) -> Self {
        self.index_type = index_type.into();
        self
    }

    /// Names of the indexed columns in index order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.column_name.as_str()).collect()
    }
}

/// Constraint classification (dictionary `CONSTRAINT_TYPE`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    Check,
    ForeignKey,
    ViewCheck,
    ReadOnly,
}

impl ConstraintKind {
    /// Parse the one-letter dictionary code (`P`, `U`, `C`, `R`, `V`, `O`)
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "P" => Some(ConstraintKind::PrimaryKey),
            "U" => Some(ConstraintKind::Unique),
            "C" => Some(ConstraintKind::Check),
            "R" => Some(ConstraintKind::ForeignKey),
            "V" => Some(ConstraintKind::ViewCheck),
            "O" => Some(ConstraintKind::ReadOnly),
            _ => None,
        }
    }
}

/// One column taking part in a constraint, in constraint order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintColumn {
    pub column_name: String,
    /// 1-based position within the constraint key
    pub position: u32,
}

/// Metadata for a primary key, unique or check constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintMetadata {
    pub name: String,
    pub table_name: String,
    pub kind: ConstraintKind,
    pub enabled: bool,
    /// Check condition text, for check constraints
    pub search_condition: Option<String>,
    /// Key columns in position order
    pub columns: Vec<ConstraintColumn>,
}

impl ConstraintMetadata {
    pub fn new(table_name: impl Into<String>, name: impl Into<String>, kind: ConstraintKind) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            kind,
            enabled: true,
            search_condition: None,
            columns: Vec::new(),
        }
    }

    /// Builder method: set enabled state
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Builder method: set check condition
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.search_condition = Some(condition.into());
        self
    }
}

/// Referential action on delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeleteRule {
    NoAction,
    Cascade,
    SetNull,
}

impl DeleteRule {
    pub fn from_rule(rule: &str) -> Self {
        match rule.trim().to_uppercase().as_str() {
            "CASCADE" => DeleteRule::Cascade,
            "SET NULL" => DeleteRule::SetNull,
            _ => DeleteRule::NoAction,
        }
    }
}

/// Metadata for a foreign key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyMetadata {
    pub name: String,
    pub table_name: String,
    /// Referenced primary/unique key, possibly in another schema
    pub referenced: ObjectRef,
    pub delete_rule: DeleteRule,
    pub enabled: bool,
    /// Referencing columns in position order
    pub columns: Vec<ConstraintColumn>,
}

impl ForeignKeyMetadata {
    pub fn new(table_name: impl Into<String>, name: impl Into<String>, referenced: ObjectRef) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            referenced,
            delete_rule: DeleteRule::NoAction,
            enabled: true,
            columns: Vec::new(),
        }
    }

    /// Builder method: set delete rule
    pub fn with_delete_rule(mut self, rule: DeleteRule) -> Self {
        self.delete_rule = rule;
        self
    }
}

/// Metadata for a synonym
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynonymMetadata {
    pub name: String,
    pub schema: String,
    /// Object the synonym points at
    pub target: ObjectRef,
    /// Remote database link, if the target is remote
    pub db_link: Option<String>,
}

impl SynonymMetadata {
    pub fn new(schema: impl Into<String>, name: impl Into<String>, target: ObjectRef) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            target,
            db_link: None,
        }
    }

    /// Builder method: set database link
    pub fn with_db_link(mut self, link: impl Into<String>) -> Self {
        self.db_link = Some(link.into());
        self
    }
}

/// When a trigger fires relative to its event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerTiming {
    Before,
    After,
    InsteadOf,
    Compound,
    Other(String),
}

impl TriggerTiming {
    /// Parse the dictionary `TRIGGER_TYPE` spelling (`BEFORE EACH ROW`, `AFTER STATEMENT`, ...)
    pub fn from_trigger_type(trigger_type: &str) -> Self {
        let upper = trigger_type.trim().to_uppercase();
        if upper.starts_with("BEFORE") {
            TriggerTiming::Before
        } else if upper.starts_with("AFTER") {
            TriggerTiming::After
        } else if upper.starts_with("INSTEAD OF") {
            TriggerTiming::InsteadOf
        } else if upper.starts_with("COMPOUND") {
            TriggerTiming::Compound
        } else {
            TriggerTiming::Other(upper)
        }
    }
}

/// Metadata for a trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerMetadata {
    pub name: String,
    pub schema: String,
    /// Table the trigger is defined on; `None` for schema/database triggers
    pub table_name: Option<String>,
    pub timing: TriggerTiming,
    /// Triggering event (`INSERT OR UPDATE`, `LOGON`, ...)
    pub event: String,
    pub for_each_row: bool,
    pub enabled: bool,
}

impl TriggerMetadata {
    pub fn new(schema: impl Into<String>, name: impl Into<String>, timing: TriggerTiming) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            table_name: None,
            timing,
            event: String::new(),
            for_each_row: false,
            enabled: true,
        }
    }

    /// Builder method: set the table the trigger belongs to
    pub fn on_table(mut self, table: impl Into<String>) -> Self {
        self.table_name = Some(table.into());
        self
    }

    /// Builder method: set the triggering event
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = event.into();
        self
    }
}
