// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Metadata caches
//!
//! Three cache shapes cover every dictionary listing:
//!
//! - [`ObjectCache`]: all objects of one owner, loaded once, with an optional
//!   narrow by-name query for single lookups
//! - [`CompositeCache`]: objects that own an ordered detail list built from a
//!   flat, pre-grouped row stream (an index and its columns)
//! - [`StructCache`]: an [`ObjectCache`] plus a separately loaded attribute
//!   list per object (a table and its columns)
//!
//! Behaviour that differs per call site (which statement to run, how a row
//! maps to an object) is supplied as a fetcher strategy at construction.
//!
//! Every load goes through [`scan_rows`], which polls the monitor once per
//! row, and ends in [`merge_objects`], which keeps the previous `Arc` for any
//! object that came back unchanged.

mod cell;
pub mod composite;
pub mod object;
pub mod packed;
pub mod structure;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ReadPolicy;
use crate::error::CatalogResult;
use crate::key::{CatalogObject, KeyCase};
use crate::monitor::Monitor;
use crate::row::{Row, RowSource, Statement};

pub use composite::{CompositeCache, CompositeFetcher, CompositeObject};
pub use object::{ObjectCache, ObjectFetcher};
pub use packed::{PackedColumn, parse_packed_columns};
pub use structure::{ChildFetcher, StructCache};

pub(crate) use cell::LoadCell;

/// Ordering applied to a collection after every load or merge
pub type Comparator<C> = Box<dyn Fn(&C, &C) -> Ordering + Send + Sync>;

/// Outcome of one statement scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Rows handed to the callback
    pub rows: u64,
    /// Whether the monitor stopped the scan early
    pub cancelled: bool,
}

/// Execute `statement` and feed each row to `each`, polling `monitor` before
/// every row. Cancellation ends the scan without error.
pub fn scan_rows(
    source: &dyn RowSource,
    statement: &Statement,
    monitor: &dyn Monitor,
    mut each: impl FnMut(&Row) -> CatalogResult<()>,
) -> CatalogResult<ScanStats> {
    let mut stats = ScanStats::default();
    let rows = source.query(statement)?;
    for row in rows {
        if monitor.is_cancelled() {
            debug!(
                "Scan of '{}' cancelled after {} rows",
                statement.id, stats.rows
            );
            stats.cancelled = true;
            break;
        }
        let row = row?;
        each(&row)?;
        stats.rows += 1;
        monitor.worked(1);
    }
    Ok(stats)
}

/// Turn a row-scoped mapping failure into `None` with a warning.
/// Query and connection errors still propagate.
pub(crate) fn skip_bad_row<T>(cache: &str, result: CatalogResult<T>) -> CatalogResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_row_scoped() => {
            warn!("{}: skipping row: {}", cache, e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Apply a cache's read policy to a failed or successful load
pub(crate) fn apply_read_policy<T: Default>(
    cache: &str,
    policy: ReadPolicy,
    result: CatalogResult<T>,
) -> CatalogResult<T> {
    match result {
        Err(e) if policy == ReadPolicy::Lenient && e.is_recoverable() => {
            warn!("{} unavailable, treating as empty: {}", cache, e);
            Ok(T::default())
        }
        other => other,
    }
}

/// Merge a freshly fetched list over the previous contents.
///
/// The result holds exactly the fresh objects, in fresh order. An object whose
/// key matches a previous object and whose value is unchanged keeps the
/// previous `Arc`, so references held by callers stay current.
pub fn merge_objects<C>(previous: &[Arc<C>], fresh: Vec<C>, case: KeyCase) -> Vec<Arc<C>>
where
    C: CatalogObject + PartialEq,
{
    if previous.is_empty() {
        return fresh.into_iter().map(Arc::new).collect();
    }

    let by_key: HashMap<_, &Arc<C>> = previous
        .iter()
        .map(|object| (object.key().folded(case), object))
        .collect();

    fresh
        .into_iter()
        .map(|object| match by_key.get(&object.key().folded(case)) {
            Some(existing) if ***existing == object => Arc::clone(existing),
            _ => Arc::new(object),
        })
        .collect()
}

/// Find an object by name under `case`
pub(crate) fn find_by_name<C: CatalogObject>(
    objects: &[Arc<C>],
    name: &str,
    case: KeyCase,
) -> Option<Arc<C>> {
    objects
        .iter()
        .find(|object| case.names_eq(object.name(), name))
        .cloned()
}

/// Replace the object with the same key, or append
pub(crate) fn upsert<C: CatalogObject>(
    objects: &mut Vec<Arc<C>>,
    object: C,
    case: KeyCase,
) -> Arc<C> {
    let key = object.key();
    let object = Arc::new(object);
    match objects.iter().position(|o| o.key().matches(&key, case)) {
        Some(index) => objects[index] = Arc::clone(&object),
        None => objects.push(Arc::clone(&object)),
    }
    object
}

pub(crate) fn sort_objects<C>(objects: &mut [Arc<C>], order: Option<&Comparator<C>>) {
    if let Some(order) = order {
        objects.sort_by(|a, b| order(a, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        name: String,
        size: u32,
    }

    impl CatalogObject for Item {
        fn name(&self) -> &str {
            &self.name
        }
    }

    fn item(name: &str, size: u32) -> Item {
        Item {
            name: name.to_string(),
            size,
        }
    }

    #[test]
    fn test_merge_drops_missing_and_adds_new() {
        let previous: Vec<Arc<Item>> = vec![item("A", 1), item("B", 1), item("C", 1)]
            .into_iter()
            .map(Arc::new)
            .collect();

        let merged = merge_objects(
            &previous,
            vec![item("B", 1), item("C", 1), item("D", 1)],
            KeyCase::Insensitive,
        );

        let names: Vec<_> = merged.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["B", "C", "D"]);
        assert!(Arc::ptr_eq(&merged[0], &previous[1]));
        assert!(Arc::ptr_eq(&merged[1], &previous[2]));
    }

    #[test]
    fn test_merge_replaces_changed_objects() {
        let previous = vec![Arc::new(item("A", 1))];
        let merged = merge_objects(&previous, vec![item("a", 2)], KeyCase::Insensitive);
        assert!(!Arc::ptr_eq(&merged[0], &previous[0]));
        assert_eq!(merged[0].size, 2);
    }

    #[test]
    fn test_upsert_and_find() {
        let mut objects = vec![Arc::new(item("A", 1))];
        upsert(&mut objects, item("A", 5), KeyCase::Sensitive);
        upsert(&mut objects, item("B", 1), KeyCase::Sensitive);
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].size, 5);

        assert!(find_by_name(&objects, "b", KeyCase::Insensitive).is_some());
        assert!(find_by_name(&objects, "b", KeyCase::Sensitive).is_none());
    }

    #[test]
    fn test_read_policy() {
        use crate::error::CatalogError;

        let denied = || Err::<Vec<u32>, _>(CatalogError::PermissionDenied("x".into()));
        assert_eq!(
            apply_read_policy("triggers", ReadPolicy::Lenient, denied()).unwrap(),
            Vec::<u32>::new()
        );
        assert!(apply_read_policy("triggers", ReadPolicy::Strict, denied()).is_err());

        let broken = Err::<Vec<u32>, _>(CatalogError::ConnectionFailed("x".into()));
        assert!(apply_read_policy("triggers", ReadPolicy::Lenient, broken).is_err());
    }
}
