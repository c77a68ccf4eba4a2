// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Packed `name:position` column lists.
//!
//! Some dictionary queries aggregate a key's columns into one string
//! (`"LAST_NAME:2,FIRST_NAME:1"`) so that a constraint arrives as a single
//! row. Parsing yields the same ordered column list that one-row-per-column
//! queries produce.

use crate::error::{CatalogError, CatalogResult};

/// One entry of a packed column list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedColumn {
    pub name: String,
    pub position: u32,
}

/// Parse a packed list into columns ordered by position.
///
/// An entry without a position (`"STATUS:"` or `"STATUS"`) takes its 1-based
/// place in the list, which is how check constraints report their columns.
/// Empty input yields an empty list.
pub fn parse_packed_columns(packed: &str) -> CatalogResult<Vec<PackedColumn>> {
    let mut columns = Vec::new();
    for (index, entry) in packed.split(',').enumerate() {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        // Column names may contain ':' when quoted, so split on the last one
        let (name, position) = match entry.rsplit_once(':') {
            Some((name, position)) => (name.trim(), position.trim()),
            None => (entry, ""),
        };
        if name.is_empty() {
            return Err(CatalogError::InvalidPackedValue(format!(
                "entry {} has no column name in '{}'",
                index + 1,
                packed
            )));
        }
        let position = if position.is_empty() {
            index as u32 + 1
        } else {
            position.parse().map_err(|_| {
                CatalogError::InvalidPackedValue(format!(
                    "bad position '{}' for column {}",
                    position, name
                ))
            })?
        };
        columns.push(PackedColumn {
            name: name.to_string(),
            position,
        });
    }
    columns.sort_by_key(|c| c.position);
    Ok(columns)
}
