// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Structure cache
//!
//! An [`ObjectCache`] of container objects (tables, views, types) plus an
//! attribute list per container (columns), loaded separately. Attributes can
//! be read for every container in one statement or for a single container.
//! Each list is ordered by the attribute's ordinal.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use super::{
    LoadCell, ObjectCache, apply_read_policy, find_by_name, merge_objects, scan_rows, skip_bad_row,
};
use crate::error::CatalogResult;
use crate::key::CatalogObject;
use crate::monitor::Monitor;
use crate::row::{Row, Statement};

/// Per-call-site strategy for the attribute side of a [`StructCache`]
pub trait ChildFetcher<O, C, A>: Send + Sync {
    /// Statement for the attributes of every container, or of one
    fn prepare_children(&self, owner: &O, object: Option<&C>) -> Statement;

    /// Name of the container a row belongs to
    fn object_name(&self, row: &Row) -> CatalogResult<String>;

    /// Map one row; `Ok(None)` skips the row
    fn fetch_child(&self, owner: &O, object: &C, row: &Row) -> CatalogResult<Option<A>>;

    /// Sort key within the container
    fn ordinal(&self, child: &A) -> u32;
}

type ChildCell<A> = LoadCell<Vec<Arc<A>>>;

/// Containers plus per-container attribute lists
pub struct StructCache<O, C, A> {
    objects: ObjectCache<O, C>,
    fetcher: Box<dyn ChildFetcher<O, C, A>>,
    /// Whether the all-containers statement has been distributed
    all_children: LoadCell<()>,
    /// Per-container attribute lists keyed by folded container name
    children: Mutex<HashMap<String, Arc<ChildCell<A>>>>,
}

impl<O, C, A> StructCache<O, C, A>
where
    C: CatalogObject + PartialEq,
    A: CatalogObject + PartialEq,
{
    pub fn new(objects: ObjectCache<O, C>, fetcher: impl ChildFetcher<O, C, A> + 'static) -> Self {
        Self {
            objects,
            fetcher: Box::new(fetcher),
            all_children: LoadCell::new(()),
            children: Mutex::new(HashMap::new()),
        }
    }

    /// The container cache
    pub fn objects(&self) -> &ObjectCache<O, C> {
        &self.objects
    }

    pub fn get_all(&self, owner: &O, monitor: &dyn Monitor) -> CatalogResult<Vec<Arc<C>>> {
        self.objects.get_all(owner, monitor)
    }

    pub fn get(&self, owner: &O, name: &str, monitor: &dyn Monitor) -> CatalogResult<Option<Arc<C>>> {
        self.objects.get(owner, name, monitor)
    }

    /// Load attributes for one container, or for every container.
    ///
    /// The all-containers form loads the containers first and leaves every
    /// container without attribute rows with an empty, loaded list.
    pub fn load_children(
        &self,
        owner: &O,
        object: Option<&C>,
        monitor: &dyn Monitor,
    ) -> CatalogResult<()> {
        match object {
            Some(object) => self.object_children(owner, object, monitor).map(|_| ()),
            None => self.all_children.get_or_load(
                || self.load_all_children(owner, monitor),
                |_, ()| {},
                |_| (),
            ),
        }
    }

    /// Ordered attributes of one container
    pub fn get_children(
        &self,
        owner: &O,
        object: &C,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Vec<Arc<A>>> {
        self.object_children(owner, object, monitor)
    }

    /// One attribute by name
    pub fn get_child(
        &self,
        owner: &O,
        object: &C,
        name: &str,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Option<Arc<A>>> {
        let children = self.object_children(owner, object, monitor)?;
        Ok(find_by_name(&children, name, self.objects.options().key_case))
    }

    /// Reload the containers; attribute lists reload lazily on next access
    pub fn refresh(&self, owner: &O, monitor: &dyn Monitor) -> CatalogResult<Vec<Arc<C>>> {
        self.all_children.exclusive(|_, loaded| *loaded = false);
        for cell in self.cells() {
            cell.exclusive(|_, loaded| *loaded = false);
        }
        self.objects.refresh(owner, monitor)
    }

    /// Drop containers and attributes
    pub fn clear(&self) {
        self.clear_children(None);
        self.objects.clear();
    }

    /// Drop the attributes of one container, or of all containers
    pub fn clear_children(&self, object: Option<&C>) {
        self.all_children.exclusive(|_, loaded| *loaded = false);
        let cells: Vec<_> = match object {
            Some(object) => {
                let key = self.key(object.name());
                self.children.lock().remove(&key).into_iter().collect()
            }
            None => std::mem::take(&mut *self.children.lock())
                .into_values()
                .collect(),
        };
        for cell in cells {
            cell.exclusive(|items, loaded| {
                items.clear();
                *loaded = false;
            });
        }
    }

    pub fn children_loaded(&self, object: &C) -> bool {
        self.all_children.is_loaded()
            || self
                .children
                .lock()
                .get(&self.key(object.name()))
                .is_some_and(|cell| cell.is_loaded())
    }

    fn key(&self, name: &str) -> String {
        self.objects.options().key_case.fold(name)
    }

    fn cell(&self, key: &str) -> Arc<ChildCell<A>> {
        self.children
            .lock()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(LoadCell::new(Vec::new())))
            .clone()
    }

    fn cells(&self) -> Vec<Arc<ChildCell<A>>> {
        self.children.lock().values().cloned().collect()
    }

    fn object_children(
        &self,
        owner: &O,
        object: &C,
        monitor: &dyn Monitor,
    ) -> CatalogResult<Vec<Arc<A>>> {
        let key = self.key(object.name());
        let cell = self.cell(&key);
        if self.all_children.is_loaded() {
            return Ok(cell.read(|items, _| items.clone()));
        }
        cell.get_or_load(
            || {
                let mut groups = self.read_children(owner, Some(object), &[], monitor)?;
                Ok(groups.remove(&key).unwrap_or_default())
            },
            |items, fresh| *items = merge_objects(items, fresh, self.objects.options().key_case),
            |items| items.clone(),
        )
    }

    fn load_all_children(&self, owner: &O, monitor: &dyn Monitor) -> CatalogResult<()> {
        let objects = self.objects.get_all(owner, monitor)?;
        let mut groups = self.read_children(owner, None, &objects, monitor)?;
        let case = self.objects.options().key_case;
        for object in &objects {
            let key = self.key(object.name());
            let fresh = groups.remove(&key).unwrap_or_default();
            self.cell(&key).exclusive(|items, loaded| {
                *items = merge_objects(items, fresh, case);
                *loaded = true;
            });
        }
        Ok(())
    }

    /// Read attribute rows grouped by folded container name, each group
    /// sorted by ordinal
    fn read_children(
        &self,
        owner: &O,
        target: Option<&C>,
        objects: &[Arc<C>],
        monitor: &dyn Monitor,
    ) -> CatalogResult<HashMap<String, Vec<A>>> {
        let name = self.objects.name();
        let statement = self.fetcher.prepare_children(owner, target);
        monitor.begin_task(name);
        let read = self.scan_children(owner, target, objects, &statement, monitor);
        apply_read_policy(name, self.objects.options().read_policy, read)
    }

    fn scan_children(
        &self,
        owner: &O,
        target: Option<&C>,
        objects: &[Arc<C>],
        statement: &Statement,
        monitor: &dyn Monitor,
    ) -> CatalogResult<HashMap<String, Vec<A>>> {
        let by_name: HashMap<String, &C> = objects
            .iter()
            .map(|object| (self.key(object.name()), object.as_ref()))
            .collect();
        let mut groups: HashMap<String, Vec<A>> = HashMap::new();

        let stats = scan_rows(self.objects.source().as_ref(), statement, monitor, |row| {
            let Some(name) = skip_bad_row(self.objects.name(), self.fetcher.object_name(row))? else {
                return Ok(());
            };
            let key = self.key(&name);
            let container = match target {
                Some(object) if self.key(object.name()) == key => object,
                Some(_) => return Ok(()),
                None => match by_name.get(&key) {
                    Some(object) => *object,
                    None => {
                        debug!("{}: no container for attribute row of '{}'", statement.id, key);
                        return Ok(());
                    }
                },
            };
            let child = skip_bad_row(self.objects.name(), self.fetcher.fetch_child(owner, container, row))?;
            if let Some(child) = child.flatten() {
                groups.entry(self.key(container.name())).or_default().push(child);
            }
            Ok(())
        })?;

        if stats.cancelled {
            info!(
                "{} attribute load cancelled after {} rows; keeping partial result",
                self.objects.name(),
                stats.rows
            );
        }
        for children in groups.values_mut() {
            children.sort_by_key(|child| self.fetcher.ordinal(child));
        }
        Ok(groups)
    }
}
