// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Catalog-specific test helpers and custom assertions

use std::sync::Arc;

use sqlnav_catalog::CatalogObject;
use sqlnav_model::{ColumnMetadata, DataType};

/// Custom assertion helpers for catalog testing
pub struct CatalogAssertions;

impl CatalogAssertions {
    /// Assert that `objects` are named exactly `expected`, in order
    pub fn assert_names<C: CatalogObject>(objects: &[Arc<C>], expected: &[&str]) {
        let names: Vec<&str> = objects.iter().map(|o| o.name()).collect();
        assert_eq!(names, expected, "Object names mismatch");
    }

    /// Assert that two listings hold the very same instances
    pub fn assert_same_instances<C>(before: &[Arc<C>], after: &[Arc<C>]) {
        assert_eq!(before.len(), after.len(), "Listing length changed");
        for (index, (a, b)) in before.iter().zip(after).enumerate() {
            assert!(Arc::ptr_eq(a, b), "Object {} was replaced", index);
        }
    }

    /// Assert that a column has the given properties
    pub fn assert_column(
        column: &ColumnMetadata,
        name: &str,
        position: u32,
        data_type: DataType,
        nullable: bool,
    ) {
        assert_eq!(column.name, name, "Column name mismatch");
        assert_eq!(column.position, position, "Column position mismatch");
        assert_eq!(column.data_type, data_type, "Column data type mismatch");
        assert_eq!(column.nullable, nullable, "Column nullable mismatch");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlnav_model::TableMetadata;

    fn tables(names: &[&str]) -> Vec<Arc<TableMetadata>> {
        names
            .iter()
            .map(|n| Arc::new(TableMetadata::new(*n, "HR")))
            .collect()
    }

    #[test]
    fn test_assert_names() {
        CatalogAssertions::assert_names(&tables(&["A", "B"]), &["A", "B"]);
    }

    #[test]
    #[should_panic(expected = "Object names mismatch")]
    fn test_assert_names_fails() {
        CatalogAssertions::assert_names(&tables(&["A"]), &["B"]);
    }

    #[test]
    #[should_panic(expected = "was replaced")]
    fn test_assert_same_instances_fails() {
        CatalogAssertions::assert_same_instances(&tables(&["A"]), &tables(&["A"]));
    }

    #[test]
    fn test_assert_column() {
        let column = ColumnMetadata::new("EMP", "ID", 1, DataType::Integer).with_nullable(false);
        CatalogAssertions::assert_column(&column, "ID", 1, DataType::Integer, false);
    }
}
