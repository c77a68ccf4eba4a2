// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Object cache
//!
//! All objects of one owner, loaded on first use. A fetcher that supplies a
//! narrow lookup statement turns the cache into a lookup cache: a by-name
//! request on an unloaded cache runs the narrow statement instead of the full
//! listing and keeps the result without marking the collection loaded.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let cache = ObjectCache::new("synonyms", source, SynonymFetcher, options);
//! let all = cache.get_all(&schema, &NullMonitor)?;
//! let one = cache.get(&schema, "EMP", &NullMonitor)?;
//! ```

use std::sync::Arc;

use tracing::{debug, info};

use super::{
    Comparator, LoadCell, ScanStats, apply_read_policy, find_by_name, merge_objects, scan_rows,
    sort_objects, upsert,
};
use crate::config::CacheOptions;
use crate::error::CatalogResult;
use crate::key::CatalogObject;
use crate::monitor::Monitor;
use crate::row::{Row, RowSource, Statement};

/// Per-call-site strategy of an [`ObjectCache`]
pub trait ObjectFetcher<O, C>: Send + Sync {
    /// Statement listing every object of `owner`
    fn prepare_objects(&self, owner: &O) -> Statement;

    /// Narrow statement returning only objects named `name`.
    ///
    /// `None` (the default) makes by-name lookups fall back to a full load.
    fn prepare_lookup(&self, _owner: &O, _name: &str) -> Option<Statement> {
        None
    }

    /// Map one row; `Ok(None)` skips the row
    fn fetch_object(&self, owner: &O, row: &Row) -> CatalogResult<Option<C>>;

    /// Post-process the complete fetched list before it is merged
    fn finish_load(&self, _owner: &O, objects: Vec<C>) -> Vec<C> {
        objects
    }
}

/// Load-once cache of all objects belonging to one owner
pub struct ObjectCache<O, C> {
    name: &'static str,
    source: Arc<dyn RowSource>,
    fetcher: Box<dyn ObjectFetcher<O, C>>,
    options: CacheOptions,
    order: Option<Comparator<C>>,
    cell: LoadCell<Vec<Arc<C>>>,
}

impl<O, C> ObjectCache<O, C>
where
    C: CatalogObject + PartialEq,
{
    pub fn new(
        name: &'static str,
        source: Arc<dyn RowSource>,
        fetcher: impl ObjectFetcher<O, C> + 'static,
        options: CacheOptions,
    ) -> Self {
        Self {
            name,
            source,
            fetcher: Box::new(fetcher),
            options,
            order: None,
            cell: LoadCell::new(Vec::new()),
        }
    }

    /// Builder method: keep the collection sorted by `order`
    pub fn with_order(
        mut self,
        order: impl Fn(&C, &C) -> std::cmp::Ordering + Send + Sync + 'static,
    ) -> Self {
        self.order = Some(Box::new(order));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    pub(crate) fn source(&self) -> &Arc<dyn RowSource> {
        &self.source
    }

    /// Every object of `owner`, loading the collection on first use
    pub fn get_all(&self, owner: &O, monitor: &dyn Monitor) -> CatalogResult<Vec<Arc<C>>> {
        self.cell.get_or_load(
            || self.load_objects(owner, monitor),
            |items, fresh| {
                let mut merged = merge_objects(items, fresh, self.options.key_case);
                sort_objects(&mut merged, self.order.as_ref());
                *items = merged;
            },
            |items| items.clone(),
        )
    }

    /// One object by name.
    ///
    /// A loaded collection is scanned directly. Otherwise objects already
    /// cached by an earlier lookup are checked, then the narrow statement runs
    /// if the fetcher has one, else the full collection is loaded.
    pub fn get(&self, owner: &O, name: &str, monitor: &dyn Monitor) -> CatalogResult<Option<Arc<C>>> {
        let case = self.options.key_case;
        let (cached, loaded) = self
            .cell
            .read(|items, loaded| (find_by_name(items, name, case), loaded));
        if loaded || cached.is_some() {
            return Ok(cached);
        }

        match self.fetcher.prepare_lookup(owner, name) {
            Some(statement) => self.lookup(owner, name, &statement, monitor),
            None => Ok(find_by_name(&self.get_all(owner, monitor)?, name, case)),
        }
    }

    /// Reload, merging over the current contents
    pub fn refresh(&self, owner: &O, monitor: &dyn Monitor) -> CatalogResult<Vec<Arc<C>>> {
        self.cell.exclusive(|_, loaded| *loaded = false);
        self.get_all(owner, monitor)
    }

    /// Drop every cached object and mark the collection unloaded
    pub fn clear(&self) {
        self.cell.exclusive(|items, loaded| {
            items.clear();
            *loaded = false;
        });
        debug!("Cleared {} cache", self.name);
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.is_loaded()
    }

    /// Current contents without triggering a load
    pub fn cached(&self) -> Vec<Arc<C>> {
        self.cell.read(|items, _| items.clone())
    }

    /// Replace the contents with `objects` and mark the collection loaded
    pub fn set_cache(&self, objects: Vec<C>) {
        self.cell.exclusive(|items, loaded| {
            let mut merged = merge_objects(items, objects, self.options.key_case);
            sort_objects(&mut merged, self.order.as_ref());
            *items = merged;
            *loaded = true;
        });
    }

    /// Add or replace one object, e.g. after the host created it
    pub fn cache_object(&self, object: C) -> Arc<C> {
        let case = self.options.key_case;
        self.cell.exclusive(|items, _| {
            let cached = upsert(items, object, case);
            sort_objects(items, self.order.as_ref());
            cached
        })
    }

    /// Remove one object by name, e.g. after the host dropped it
    pub fn remove_object(&self, name: &str) -> Option<Arc<C>> {
        let case = self.options.key_case;
        self.cell.exclusive(|items, _| {
            let index = items.iter().position(|o| case.names_eq(o.name(), name))?;
            Some(items.remove(index))
        })
    }

    fn load_objects(&self, owner: &O, monitor: &dyn Monitor) -> CatalogResult<Vec<C>> {
        let statement = self.fetcher.prepare_objects(owner);
        monitor.begin_task(self.name);
        let fetched = self.fetch(owner, &statement, monitor);
        let objects = apply_read_policy(self.name, self.options.read_policy, fetched)?;
        info!("Loaded {} {} objects", objects.len(), self.name);
        Ok(objects)
    }

    fn lookup(
        &self,
        owner: &O,
        name: &str,
        statement: &Statement,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Option<Arc<C>>> {
        debug!("Looking up {} '{}' with '{}'", self.name, name, statement.id);
        let fetched = self.fetch(owner, statement, monitor);
        let objects = apply_read_policy(self.name, self.options.read_policy, fetched)?;

        let case = self.options.key_case;
        let mut found = None;
        for object in objects {
            let matches = case.names_eq(object.name(), name);
            let cached = self.cache_object(object);
            if matches && found.is_none() {
                found = Some(cached);
            }
        }
        Ok(found)
    }

    fn fetch(&self, owner: &O, statement: &Statement, monitor: &dyn Monitor) -> CatalogResult<Vec<C>> {
        let mut objects = Vec::new();
        let ScanStats { rows, cancelled } =
            scan_rows(self.source.as_ref(), statement, monitor, |row| {
                if let Some(object) = self.fetcher.fetch_object(owner, row)? {
                    objects.push(object);
                }
                Ok(())
            })?;
        if cancelled {
            info!(
                "{} load cancelled; keeping {} objects from {} rows",
                self.name,
                objects.len(),
                rows
            );
        }
        Ok(self.fetcher.finish_load(owner, objects))
    }
}
