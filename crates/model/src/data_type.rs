// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Unified data types
//!
//! Dictionary views report column and argument types as free-form strings
//! (`VARCHAR2(30)`, `NUMBER(10,2)`, `TIMESTAMP(6) WITH TIME ZONE`). This module
//! folds them into one [`DataType`] enum so callers never parse type names.

use serde::{Deserialize, Serialize};

/// SQL data types (unified across vendors)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DataType {
    // Numeric types
    Integer,
    SmallInt,
    Decimal,
    Float,
    Double,

    // String types
    Varchar(Option<usize>),
    Char(Option<usize>),
    Text,

    // Binary types
    Binary,
    VarBinary(Option<usize>),
    Blob,

    // Date/Time types
    DateTime,
    Timestamp,
    Interval,

    // Boolean
    Boolean,

    // JSON
    Json,

    // Row identifiers
    RowId,

    // Unknown/Other (user-defined object types keep their original name)
    Other(String),
}

impl DataType {
    /// Parse a dictionary type string into a unified [`DataType`].
    ///
    /// Length qualifiers are kept for character and raw types. Anything the
    /// table does not know (object types, collections, `XMLTYPE`) becomes
    /// [`DataType::Other`] with the original spelling.
    pub fn from_type_name(type_name: &str) -> DataType {
        let upper = type_name.trim().to_uppercase();

        if upper.starts_with("TIMESTAMP") {
            if upper.contains("TIME ZONE") {
                return DataType::Other(type_name.trim().to_string());
            }
            return DataType::Timestamp;
        }
        if upper.starts_with("INTERVAL") {
            return DataType::Interval;
        }

        // Extract the base name (everything before '(' or end of string)
        let base: String = upper
            .chars()
            .take_while(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '/'))
            .collect::<String>()
            .trim()
            .to_string();

        match base.as_str() {
            "VARCHAR2" | "VARCHAR" | "NVARCHAR2" => DataType::Varchar(Self::extract_length(&upper)),
            "CHAR" | "NCHAR" => DataType::Char(Self::extract_length(&upper)),
            "CLOB" | "NCLOB" | "LONG" => DataType::Text,

            "NUMBER" => match Self::extract_scale(&upper) {
                Some(0) => DataType::Integer,
                _ => DataType::Decimal,
            },
            "INTEGER" | "INT" => DataType::Integer,
            "SMALLINT" => DataType::SmallInt,
            "FLOAT" | "BINARY_FLOAT" | "REAL" => DataType::Float,
            "BINARY_DOUBLE" | "DOUBLE PRECISION" => DataType::Double,

            "RAW" => DataType::VarBinary(Self::extract_length(&upper)),
            "LONG RAW" => DataType::Binary,
            "BLOB" | "BFILE" => DataType::Blob,

            "DATE" => DataType::DateTime,
            "BOOLEAN" | "PL/SQL BOOLEAN" => DataType::Boolean,
            "JSON" => DataType::Json,
            "ROWID" | "UROWID" => DataType::RowId,

            _ => DataType::Other(type_name.trim().to_string()),
        }
    }

    /// Extract length from type string (e.g., "VARCHAR2(30)" -> Some(30))
    fn extract_length(type_str: &str) -> Option<usize> {
        let open = type_str.find('(')?;
        let rest = &type_str[open + 1..];
        let end = rest.find([',', ')', ' '])?;
        match rest[..end].trim().parse::<usize>() {
            Ok(0) | Err(_) => None,
            Ok(len) => Some(len),
        }
    }

    /// Extract the scale of a `NUMBER(p,s)` declaration; `NUMBER(p)` has scale 0
    fn extract_scale(type_str: &str) -> Option<u32> {
        let open = type_str.find('(')?;
        let close = type_str.find(')')?;
        let inner = type_str.get(open + 1..close)?;
        match inner.split_once(',') {
            Some((_, scale)) => scale.trim().parse().ok(),
            None => Some(0),
        }
    }

    /// Whether values of this type are character data
    pub fn is_character(&self) -> bool {
        matches!(self, DataType::Varchar(_) | DataType::Char(_) | DataType::Text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_character_types() {
        assert_eq!(DataType::from_type_name("VARCHAR2(30)"), DataType::Varchar(Some(30)));
        assert_eq!(DataType::from_type_name("varchar2(4000 byte)"), DataType::Varchar(Some(4000)));
        assert_eq!(DataType::from_type_name("CHAR(1)"), DataType::Char(Some(1)));
        assert_eq!(DataType::from_type_name("NVARCHAR2"), DataType::Varchar(None));
        assert_eq!(DataType::from_type_name("CLOB"), DataType::Text);
    }

    #[test]
    fn test_parse_number_types() {
        assert_eq!(DataType::from_type_name("NUMBER"), DataType::Decimal);
        assert_eq!(DataType::from_type_name("NUMBER(10)"), DataType::Integer);
        assert_eq!(DataType::from_type_name("NUMBER(10,0)"), DataType::Integer);
        assert_eq!(DataType::from_type_name("NUMBER(12,2)"), DataType::Decimal);
        assert_eq!(DataType::from_type_name("BINARY_DOUBLE"), DataType::Double);
    }

    #[test]
    fn test_parse_temporal_types() {
        assert_eq!(DataType::from_type_name("DATE"), DataType::DateTime);
        assert_eq!(DataType::from_type_name("TIMESTAMP(6)"), DataType::Timestamp);
        assert_eq!(
            DataType::from_type_name("TIMESTAMP(6) WITH TIME ZONE"),
            DataType::Other("TIMESTAMP(6) WITH TIME ZONE".to_string())
        );
        assert_eq!(
            DataType::from_type_name("INTERVAL DAY(2) TO SECOND(6)"),
            DataType::Interval
        );
    }

    #[test]
    fn test_parse_binary_and_other_types() {
        assert_eq!(DataType::from_type_name("RAW(16)"), DataType::VarBinary(Some(16)));
        assert_eq!(DataType::from_type_name("LONG RAW"), DataType::Binary);
        assert_eq!(DataType::from_type_name("BLOB"), DataType::Blob);
        assert_eq!(
            DataType::from_type_name("ADDRESS_T"),
            DataType::Other("ADDRESS_T".to_string())
        );
    }

    #[test]
    fn test_is_character() {
        assert!(DataType::Varchar(None).is_character());
        assert!(!DataType::Integer.is_character());
    }
}
