// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Stored routine metadata
//!
//! Procedures, functions and packages, plus the per-argument payload carried
//! by each node of a routine's argument tree.

use serde::{Deserialize, Serialize};

use crate::data_type::DataType;

/// Stored routine classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoutineKind {
    Procedure,
    Function,
    Package,
}

impl RoutineKind {
    pub fn from_object_type(object_type: &str) -> Option<Self> {
        match object_type.trim().to_uppercase().as_str() {
            "PROCEDURE" => Some(RoutineKind::Procedure),
            "FUNCTION" => Some(RoutineKind::Function),
            "PACKAGE" => Some(RoutineKind::Package),
            _ => None,
        }
    }

    /// Whether routines of this kind report a return value among their arguments
    pub fn has_return_value(&self) -> bool {
        matches!(self, RoutineKind::Function)
    }
}

/// Metadata for a stored routine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureMetadata {
    pub name: String,
    pub schema: String,
    pub kind: RoutineKind,
    /// Dictionary object id, used as the argument query key
    pub object_id: i64,
    /// Overload number for packaged routines sharing one name
    pub overload: Option<u32>,
    /// Whether the routine compiled without errors
    pub valid: bool,
}

impl ProcedureMetadata {
    pub fn new(schema: impl Into<String>, name: impl Into<String>, kind: RoutineKind) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            kind,
            object_id: 0,
            overload: None,
            valid: true,
        }
    }

    /// Builder method: set dictionary object id
    pub fn with_object_id(mut self, object_id: i64) -> Self {
        self.object_id = object_id;
        self
    }
}

/// Parameter passing mode (dictionary `IN_OUT`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgumentMode {
    In,
    Out,
    InOut,
}

impl ArgumentMode {
    pub fn from_in_out(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "OUT" => ArgumentMode::Out,
            "IN/OUT" | "IN OUT" => ArgumentMode::InOut,
            _ => ArgumentMode::In,
        }
    }
}

/// Payload of one argument row
///
/// Nesting (record fields, collection element types) is carried by the tree
/// node wrapping this payload, not by the payload itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentInfo {
    /// 1-based position among the routine's argument rows
    pub sequence: u32,
    /// Declared position within the enclosing level
    pub position: u32,
    /// Raw dictionary type name; `None` for the "no arguments" placeholder row
    pub type_name: Option<String>,
    pub data_type: Option<DataType>,
    pub mode: ArgumentMode,
    /// Owner and name of a user-defined type, for composite arguments
    pub type_owner: Option<String>,
    pub type_subname: Option<String>,
    pub has_default: bool,
}

impl ArgumentInfo {
    pub fn new(sequence: u32, position: u32, type_name: Option<&str>) -> Self {
        Self {
            sequence,
            position,
            type_name: type_name.map(str::to_string),
            data_type: type_name.map(DataType::from_type_name),
            mode: ArgumentMode::In,
            type_owner: None,
            type_subname: None,
            has_default: false,
        }
    }

    /// Builder method: set parameter mode
    pub fn with_mode(mut self, mode: ArgumentMode) -> Self {
        self.mode = mode;
        self
    }

    /// Whether the argument is of a user-defined composite type
    pub fn is_composite(&self) -> bool {
        self.type_subname.is_some() || matches!(self.data_type, Some(DataType::Other(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_mode() {
        assert_eq!(ArgumentMode::from_in_out("IN"), ArgumentMode::In);
        assert_eq!(ArgumentMode::from_in_out("OUT"), ArgumentMode::Out);
        assert_eq!(ArgumentMode::from_in_out("IN/OUT"), ArgumentMode::InOut);
    }

    #[test]
    fn test_argument_info_parses_type() {
        let arg = ArgumentInfo::new(1, 1, Some("NUMBER(10)"));
        assert_eq!(arg.data_type, Some(DataType::Integer));
        assert!(!arg.is_composite());

        let record = ArgumentInfo::new(2, 2, Some("PL/SQL RECORD"));
        assert!(record.is_composite());

        let placeholder = ArgumentInfo::new(1, 1, None);
        assert_eq!(placeholder.data_type, None);
    }

    #[test]
    fn test_routine_kind() {
        assert_eq!(
            RoutineKind::from_object_type("function"),
            Some(RoutineKind::Function)
        );
        assert!(RoutineKind::Function.has_return_value());
        assert!(!RoutineKind::Procedure.has_return_value());
        assert_eq!(RoutineKind::from_object_type("TYPE"), None);
    }
}
