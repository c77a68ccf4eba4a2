// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Composite cache
//!
//! Builds objects that own an ordered list of details (an index and its
//! columns, a constraint and its key columns) from one flat row stream.
//!
//! The statement must return rows grouped by `(parent, object)`: consecutive
//! rows with the same key belong to the same object, and the order in which
//! their details arrive is the order they keep. The cache does not re-sort.
//!
//! Objects are cached per parent. Loading without a parent fetches the whole
//! owner in one statement and distributes the objects to every parent;
//! loading with a parent runs the parent-scoped statement.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{LoadCell, apply_read_policy, find_by_name, merge_objects, scan_rows, skip_bad_row};
use crate::config::CacheOptions;
use crate::error::{CatalogError, CatalogResult};
use crate::key::CatalogObject;
use crate::monitor::Monitor;
use crate::row::{Row, RowSource, Statement};

/// An object carrying an ordered detail list
pub trait CompositeObject: CatalogObject {
    type Detail: Clone + Send + Sync + 'static;

    fn details(&self) -> &[Self::Detail];
}

/// Per-call-site strategy of a [`CompositeCache`]
pub trait CompositeFetcher<O, P, C: CompositeObject>: Send + Sync {
    /// Statement for every parent of `owner`, or for one parent.
    /// Rows must be ordered by parent, then object.
    fn prepare_objects(&self, owner: &O, parent: Option<&P>) -> Statement;

    /// Name of the parent a row belongs to
    fn parent_name(&self, row: &Row) -> CatalogResult<String>;

    /// Resolve a parent by name; `None` skips its rows
    fn fetch_parent(&self, owner: &O, name: &str, monitor: &dyn Monitor)
    -> CatalogResult<Option<Arc<P>>>;

    /// Name of the object a row belongs to
    fn object_name(&self, row: &Row) -> CatalogResult<String>;

    /// Build the object from the first row of its group; `None` skips the group
    fn fetch_object(&self, owner: &O, parent: &P, row: &Row) -> CatalogResult<Option<C>>;

    /// Details contributed by one row: none, one, or several
    fn fetch_object_row(
        &self,
        owner: &O,
        parent: &P,
        object: &C,
        row: &Row,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Vec<C::Detail>>;

    /// Attach the finished detail list to its object
    fn cache_children(&self, object: &mut C, details: Vec<C::Detail>);
}

type ObjectCell<C> = LoadCell<Vec<Arc<C>>>;

/// Object being assembled while its rows stream in
struct Pending<C: CompositeObject> {
    parent: String,
    object: C,
    details: Vec<C::Detail>,
}

/// Two-level cache: parent, then objects with ordered details
pub struct CompositeCache<O, P, C: CompositeObject> {
    name: &'static str,
    source: Arc<dyn RowSource>,
    fetcher: Box<dyn CompositeFetcher<O, P, C>>,
    options: CacheOptions,
    /// Whether the owner-wide statement has been distributed to every parent
    all: LoadCell<()>,
    /// Per-parent collections keyed by folded parent name
    parents: Mutex<BTreeMap<String, Arc<ObjectCell<C>>>>,
}

impl<O, P, C> CompositeCache<O, P, C>
where
    P: CatalogObject,
    C: CompositeObject + PartialEq,
{
    pub fn new(
        name: &'static str,
        source: Arc<dyn RowSource>,
        fetcher: impl CompositeFetcher<O, P, C> + 'static,
        options: CacheOptions,
    ) -> Self {
        Self {
            name,
            source,
            fetcher: Box::new(fetcher),
            options,
            all: LoadCell::new(()),
            parents: Mutex::new(BTreeMap::new()),
        }
    }

    /// Objects of one parent, or of every parent when `parent` is `None`
    pub fn get_all(
        &self,
        owner: &O,
        parent: Option<&P>,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Vec<Arc<C>>> {
        let Some(parent) = parent else {
            self.all
                .get_or_load(|| self.load_all(owner, monitor), |_, ()| {}, |_| ())?;
            return Ok(self
                .cells()
                .into_iter()
                .flat_map(|cell| cell.read(|items, _| items.clone()))
                .collect());
        };

        let key = self.options.key_case.fold(parent.name());
        let cell = self.cell(&key);
        // An owner-wide load in flight fills this parent too
        if self.all.wait_settled() {
            return Ok(cell.read(|items, _| items.clone()));
        }
        cell.get_or_load(
            || {
                let mut groups = self.load_groups(owner, Some(parent), monitor)?;
                Ok(groups.remove(&key).unwrap_or_default())
            },
            |items, fresh| *items = merge_objects(items, fresh, self.options.key_case),
            |items| items.clone(),
        )
    }

    /// One object of `parent` by name
    pub fn get(
        &self,
        owner: &O,
        parent: &P,
        name: &str,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Option<Arc<C>>> {
        let objects = self.get_all(owner, Some(parent), monitor)?;
        Ok(find_by_name(&objects, name, self.options.key_case))
    }

    /// Search every parent for an object by name
    pub fn find(&self, owner: &O, name: &str, monitor: &dyn Monitor) -> CatalogResult<Option<Arc<C>>> {
        let objects = self.get_all(owner, None, monitor)?;
        Ok(find_by_name(&objects, name, self.options.key_case))
    }

    /// Ordered details of one object
    pub fn get_children(
        &self,
        owner: &O,
        parent: &P,
        name: &str,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Vec<C::Detail>> {
        match self.get(owner, parent, name, monitor)? {
            Some(object) => Ok(object.details().to_vec()),
            None => Err(CatalogError::ObjectNotFound {
                kind: self.name,
                name: name.to_string(),
            }),
        }
    }

    /// Reload one parent, or everything, merging over the current contents
    pub fn refresh(
        &self,
        owner: &O,
        parent: Option<&P>,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Vec<Arc<C>>> {
        self.all.exclusive(|_, loaded| *loaded = false);
        match parent {
            Some(p) => {
                let key = self.options.key_case.fold(p.name());
                self.cell(&key).exclusive(|_, loaded| *loaded = false);
            }
            None => {
                for cell in self.cells() {
                    cell.exclusive(|_, loaded| *loaded = false);
                }
            }
        }
        self.get_all(owner, parent, monitor)
    }

    /// Drop one parent's objects, or everything
    pub fn clear(&self, parent: Option<&P>) {
        self.all.exclusive(|_, loaded| *loaded = false);
        let cells = match parent {
            Some(p) => {
                let key = self.options.key_case.fold(p.name());
                self.parents.lock().remove(&key).into_iter().collect()
            }
            None => std::mem::take(&mut *self.parents.lock())
                .into_values()
                .collect::<Vec<_>>(),
        };
        for cell in cells {
            cell.exclusive(|items, loaded| {
                items.clear();
                *loaded = false;
            });
        }
        debug!("Cleared {} cache", self.name);
    }

    pub fn is_loaded(&self, parent: Option<&P>) -> bool {
        if self.all.is_loaded() {
            return true;
        }
        match parent {
            Some(p) => {
                let key = self.options.key_case.fold(p.name());
                self.parents
                    .lock()
                    .get(&key)
                    .is_some_and(|cell| cell.is_loaded())
            }
            None => false,
        }
    }

    fn cell(&self, key: &str) -> Arc<ObjectCell<C>> {
        self.parents
            .lock()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(LoadCell::new(Vec::new())))
            .clone()
    }

    fn cells(&self) -> Vec<Arc<ObjectCell<C>>> {
        self.parents.lock().values().cloned().collect()
    }

    /// Owner-wide load: every known parent ends up loaded, empty if the
    /// statement returned nothing for it
    fn load_all(&self, owner: &O, monitor: &dyn Monitor) -> CatalogResult<()> {
        let mut groups = self.load_groups(owner, None, monitor)?;
        for key in groups.keys() {
            self.cell(key);
        }
        let cells: Vec<(String, Arc<ObjectCell<C>>)> = self
            .parents
            .lock()
            .iter()
            .map(|(key, cell)| (key.clone(), cell.clone()))
            .collect();
        for (key, cell) in cells {
            let fresh = groups.remove(&key).unwrap_or_default();
            cell.exclusive(|items, loaded| {
                *items = merge_objects(items, fresh, self.options.key_case);
                *loaded = true;
            });
        }
        Ok(())
    }

    fn load_groups(
        &self,
        owner: &O,
        parent: Option<&P>,
        monitor: &dyn Monitor,
    ) -> CatalogResult<BTreeMap<String, Vec<C>>> {
        let statement = self.fetcher.prepare_objects(owner, parent);
        monitor.begin_task(self.name);
        let grouped = self.group_rows(owner, parent, &statement, monitor);
        apply_read_policy(self.name, self.options.read_policy, grouped)
    }

    /// Walk the row stream, starting a new object whenever the
    /// `(parent, object)` key changes and appending each row's details to the
    /// current one.
    fn group_rows(
        &self,
        owner: &O,
        parent: Option<&P>,
        statement: &Statement,
        monitor: &dyn Monitor,
    ) -> CatalogResult<BTreeMap<String, Vec<C>>> {
        let case = self.options.key_case;
        let mut groups: BTreeMap<String, Vec<C>> = BTreeMap::new();
        let mut resolved: Option<(String, Option<Arc<P>>)> = None;
        let mut current: Option<(String, String)> = None;
        let mut pending: Option<Pending<C>> = None;

        let stats = scan_rows(self.source.as_ref(), statement, monitor, |row| {
            let parent_obj: &P = match parent {
                Some(p) => p,
                None => {
                    let Some(name) = skip_bad_row(self.name, self.fetcher.parent_name(row))? else {
                        return Ok(());
                    };
                    let stale = resolved
                        .as_ref()
                        .is_none_or(|(last, _)| !case.names_eq(last, &name));
                    if stale {
                        let found = self.fetcher.fetch_parent(owner, &name, monitor)?;
                        if found.is_none() {
                            warn!("{}: parent '{}' not found, skipping its rows", self.name, name);
                        }
                        resolved = Some((name, found));
                    }
                    match resolved.as_ref().and_then(|(_, p)| p.as_deref()) {
                        Some(p) => p,
                        None => return Ok(()),
                    }
                }
            };

            let parent_key = case.fold(parent_obj.name());
            let Some(object_name) = skip_bad_row(self.name, self.fetcher.object_name(row))? else {
                return Ok(());
            };
            let same_object = current.as_ref().is_some_and(|(p, o)| {
                *p == parent_key && case.names_eq(o, &object_name)
            });
            if !same_object {
                if let Some(done) = pending.take() {
                    self.finish_object(done, &mut groups);
                }
                // A group whose first row fails to map is skipped as a whole
                pending = skip_bad_row(self.name, self.fetcher.fetch_object(owner, parent_obj, row))?
                    .flatten()
                    .map(|object| Pending {
                        parent: parent_key.clone(),
                        object,
                        details: Vec::new(),
                    });
                current = Some((parent_key, object_name));
            }

            if let Some(building) = pending.as_mut() {
                let details = self.fetcher.fetch_object_row(
                    owner,
                    parent_obj,
                    &building.object,
                    row,
                    monitor,
                );
                if let Some(details) = skip_bad_row(self.name, details)? {
                    building.details.extend(details);
                }
            }
            Ok(())
        })?;

        if let Some(done) = pending.take() {
            self.finish_object(done, &mut groups);
        }
        if stats.cancelled {
            info!(
                "{} load cancelled after {} rows; keeping partial result",
                self.name, stats.rows
            );
        }
        Ok(groups)
    }

    fn finish_object(&self, done: Pending<C>, groups: &mut BTreeMap<String, Vec<C>>) {
        let Pending {
            parent,
            mut object,
            details,
        } = done;
        if details.is_empty() && !self.options.allow_empty_details {
            debug!(
                "{}: dropping '{}' of '{}' with no details",
                self.name,
                object.name(),
                parent
            );
            return;
        }
        self.fetcher.cache_children(&mut object, details);
        groups.entry(parent).or_default().push(object);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::packed::parse_packed_columns;
    use crate::key::KeyCase;
    use crate::monitor::NullMonitor;
    use crate::row::RowStream;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct Table {
        name: String,
    }

    impl CatalogObject for Table {
        fn name(&self) -> &str {
            &self.name
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Key {
        name: String,
        columns: Vec<(String, u32)>,
    }

    impl CatalogObject for Key {
        fn name(&self) -> &str {
            &self.name
        }
    }

    impl CompositeObject for Key {
        type Detail = (String, u32);

        fn details(&self) -> &[(String, u32)] {
            &self.columns
        }
    }

    struct RowsSource {
        rows: Vec<Row>,
        queries: AtomicUsize,
    }

    impl RowSource for RowsSource {
        fn query(&self, statement: &Statement) -> CatalogResult<RowStream<'_>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            let filter = statement.params.first().and_then(|v| v.as_str()).map(str::to_string);
            let rows: Vec<CatalogResult<Row>> = self
                .rows
                .iter()
                .filter(|r| {
                    filter
                        .as_deref()
                        .is_none_or(|f| r.get_str("TABLE_NAME").ok() == Some(f))
                })
                .cloned()
                .map(Ok)
                .collect();
            Ok(Box::new(rows.into_iter()))
        }
    }

    /// One detail per row, or a packed COLUMNS field when present
    struct KeyFetcher;

    impl CompositeFetcher<(), Table, Key> for KeyFetcher {
        fn prepare_objects(&self, _owner: &(), parent: Option<&Table>) -> Statement {
            let statement = Statement::new("keys", "SELECT ...");
            match parent {
                Some(t) => statement.bind(t.name.as_str()),
                None => statement,
            }
        }

        fn parent_name(&self, row: &Row) -> CatalogResult<String> {
            Ok(row.get_str("TABLE_NAME")?.to_string())
        }

        fn fetch_parent(
            &self,
            _owner: &(),
            name: &str,
            _monitor: &dyn Monitor,
        ) -> CatalogResult<Option<Arc<Table>>> {
            Ok((name != "GHOST").then(|| Arc::new(Table { name: name.to_string() })))
        }

        fn object_name(&self, row: &Row) -> CatalogResult<String> {
            Ok(row.get_str("KEY_NAME")?.to_string())
        }

        fn fetch_object(&self, _owner: &(), _parent: &Table, row: &Row) -> CatalogResult<Option<Key>> {
            Ok(Some(Key {
                name: row.get_str("KEY_NAME")?.to_string(),
                columns: Vec::new(),
            }))
        }

        fn fetch_object_row(
            &self,
            _owner: &(),
            _parent: &Table,
            _object: &Key,
            row: &Row,
            _monitor: &dyn Monitor,
        ) -> CatalogResult<Vec<(String, u32)>> {
            if let Some(packed) = row.get_opt_str("COLUMNS")? {
                return Ok(parse_packed_columns(packed)?
                    .into_iter()
                    .map(|c| (c.name, c.position))
                    .collect());
            }
            match row.get_opt_str("COLUMN_NAME")? {
                Some(column) => Ok(vec![(column.to_string(), row.get_u32("POSITION")?)]),
                None => Ok(Vec::new()),
            }
        }

        fn cache_children(&self, object: &mut Key, details: Vec<(String, u32)>) {
            object.columns = details;
        }
    }

    fn detail_row(table: &str, key: &str, column: &str, position: u32) -> Row {
        Row::new()
            .with("TABLE_NAME", table)
            .with("KEY_NAME", key)
            .with("COLUMN_NAME", column)
            .with("POSITION", position)
    }

    fn cache(rows: Vec<Row>, allow_empty: bool) -> (Arc<RowsSource>, CompositeCache<(), Table, Key>) {
        let source = Arc::new(RowsSource {
            rows,
            queries: AtomicUsize::new(0),
        });
        let cache = CompositeCache::new(
            "keys",
            source.clone(),
            KeyFetcher,
            CacheOptions::new(KeyCase::Insensitive).with_empty_details(allow_empty),
        );
        (source, cache)
    }

    fn table(name: &str) -> Table {
        Table {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_groups_consecutive_rows() {
        let (_, cache) = cache(
            vec![
                detail_row("T", "X", "A", 1),
                detail_row("T", "X", "B", 2),
                detail_row("T", "Y", "C", 1),
            ],
            false,
        );
        let x = cache.get_children(&(), &table("T"), "X", &NullMonitor).unwrap();
        assert_eq!(x, vec![("A".to_string(), 1), ("B".to_string(), 2)]);
        let y = cache.get_children(&(), &table("T"), "Y", &NullMonitor).unwrap();
        assert_eq!(y, vec![("C".to_string(), 1)]);
    }

    #[test]
    fn test_packed_rows_reduce_to_same_shape() {
        let packed = Row::new()
            .with("TABLE_NAME", "T")
            .with("KEY_NAME", "X")
            .with("COLUMNS", "B:2,A:1");
        let (_, cache) = cache(vec![packed], false);
        let x = cache.get_children(&(), &table("T"), "X", &NullMonitor).unwrap();
        assert_eq!(x, vec![("A".to_string(), 1), ("B".to_string(), 2)]);
    }

    #[test]
    fn test_owner_wide_load_distributes_to_parents() {
        let (source, cache) = cache(
            vec![
                detail_row("T1", "PK1", "ID", 1),
                detail_row("T2", "PK2", "ID", 1),
                detail_row("GHOST", "PK3", "ID", 1),
            ],
            false,
        );
        let all = cache.get_all(&(), None, &NullMonitor).unwrap();
        assert_eq!(all.len(), 2);
        assert!(cache.is_loaded(Some(&table("T1"))));

        let t2 = cache.get_all(&(), Some(&table("t2")), &NullMonitor).unwrap();
        assert_eq!(t2[0].name, "PK2");
        let t3 = cache.get_all(&(), Some(&table("T3")), &NullMonitor).unwrap();
        assert!(t3.is_empty());
        assert_eq!(source.queries.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_parent_scoped_load_and_clear() {
        let (source, cache) = cache(
            vec![detail_row("T1", "PK1", "ID", 1), detail_row("T2", "PK2", "ID", 1)],
            false,
        );
        let t1 = cache.get_all(&(), Some(&table("T1")), &NullMonitor).unwrap();
        assert_eq!(t1.len(), 1);
        assert!(!cache.is_loaded(None));

        cache.clear(Some(&table("T1")));
        assert!(!cache.is_loaded(Some(&table("T1"))));
        cache.get_all(&(), Some(&table("T1")), &NullMonitor).unwrap();
        assert_eq!(source.queries.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_detail_policy() {
        let no_columns = Row::new().with("TABLE_NAME", "T").with("KEY_NAME", "CHK");
        let (_, strict) = cache(vec![no_columns.clone()], false);
        assert!(strict.get_all(&(), None, &NullMonitor).unwrap().is_empty());

        let (_, lenient) = cache(vec![no_columns], true);
        let keys = lenient.get_all(&(), None, &NullMonitor).unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].columns.is_empty());
    }

    #[test]
    fn test_missing_object_is_error() {
        let (_, cache) = cache(vec![detail_row("T", "X", "A", 1)], false);
        assert!(matches!(
            cache.get_children(&(), &table("T"), "NOPE", &NullMonitor),
            Err(CatalogError::ObjectNotFound { .. })
        ));
    }

    #[test]
    fn test_bad_packed_row_skips_only_its_detail() {
        let good = Row::new()
            .with("TABLE_NAME", "T")
            .with("KEY_NAME", "X")
            .with("COLUMNS", "A:1");
        let bad = Row::new()
            .with("TABLE_NAME", "T")
            .with("KEY_NAME", "Y")
            .with("COLUMNS", "B:oops");
        let (_, cache) = cache(vec![good, bad], false);
        let keys = cache.get_all(&(), None, &NullMonitor).unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].name, "X");
        assert_eq!(keys[0].columns, vec![("A".to_string(), 1)]);
    }

    #[test]
    fn test_bad_detail_row_keeps_rest_of_object() {
        let bad = Row::new()
            .with("TABLE_NAME", "T")
            .with("KEY_NAME", "X")
            .with("COLUMN_NAME", "B")
            .with("POSITION", "second");
        let (_, cache) = cache(
            vec![detail_row("T", "X", "A", 1), bad, detail_row("T", "X", "C", 3)],
            false,
        );
        let x = cache.get_children(&(), &table("T"), "X", &NullMonitor).unwrap();
        assert_eq!(x, vec![("A".to_string(), 1), ("C".to_string(), 3)]);
    }

    #[test]
    fn test_row_without_key_is_skipped() {
        let keyless = Row::new().with("TABLE_NAME", "T").with("COLUMN_NAME", "Z");
        let (_, cache) = cache(vec![keyless, detail_row("T", "X", "A", 1)], false);
        let keys = cache.get_all(&(), None, &NullMonitor).unwrap();
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn test_query_failure_still_propagates() {
        struct Down;
        impl RowSource for Down {
            fn query(&self, statement: &Statement) -> CatalogResult<RowStream<'_>> {
                Err(CatalogError::query_failed(statement.id, "ORA-03113"))
            }
        }
        let cache: CompositeCache<(), Table, Key> = CompositeCache::new(
            "keys",
            Arc::new(Down),
            KeyFetcher,
            CacheOptions::new(KeyCase::Insensitive),
        );
        assert!(matches!(
            cache.get_all(&(), None, &NullMonitor),
            Err(CatalogError::QueryFailed { .. })
        ));
        assert!(!cache.is_loaded(None));
    }

    #[test]
    fn test_parent_caller_waits_for_owner_wide_load() {
        let (source, cache) = cache(
            vec![detail_row("T1", "PK1", "ID", 1), detail_row("T2", "PK2", "ID", 1)],
            false,
        );
        let cache = &cache;
        std::thread::scope(|s| {
            let all = s.spawn(move || cache.get_all(&(), None, &NullMonitor).unwrap().len());
            let one = s.spawn(move || {
                cache
                    .get_all(&(), Some(&table("T2")), &NullMonitor)
                    .unwrap()
                    .len()
            });
            assert_eq!(all.join().unwrap(), 2);
            assert_eq!(one.join().unwrap(), 1);
        });
        assert!(source.queries.load(Ordering::SeqCst) <= 2);
        assert!(cache.is_loaded(Some(&table("T2"))));
    }

    #[test]
    fn test_refresh_preserves_unchanged_objects() {
        let (_, cache) = cache(vec![detail_row("T", "X", "A", 1)], false);
        let before = cache.get_all(&(), None, &NullMonitor).unwrap();
        let after = cache.refresh(&(), None, &NullMonitor).unwrap();
        assert!(Arc::ptr_eq(&before[0], &after[0]));
    }
}
