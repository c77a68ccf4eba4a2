// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Stored procedures and functions with their argument trees.

use std::sync::Arc;

use sqlnav_model::{ArgumentInfo, ArgumentMode, ProcedureMetadata, RoutineKind};
use tracing::debug;

use super::Schema;
use crate::cache::{ObjectCache, ObjectFetcher};
use crate::config::CacheOptions;
use crate::error::CatalogResult;
use crate::key::{CacheKey, CatalogObject};
use crate::monitor::Monitor;
use crate::row::{Row, RowSource, Statement};
use crate::tree::{ArgumentNode, FlatRow, build_tree};

const PROCEDURES_SQL: &str = "\
SELECT OBJECT_NAME, OBJECT_TYPE, OBJECT_ID, STATUS
FROM ALL_OBJECTS
WHERE OWNER = :1 AND OBJECT_TYPE IN ('PROCEDURE', 'FUNCTION')
ORDER BY OBJECT_NAME";

const PROCEDURE_LOOKUP_SQL: &str = "\
SELECT OBJECT_NAME, OBJECT_TYPE, OBJECT_ID, STATUS
FROM ALL_OBJECTS
WHERE OWNER = :1 AND OBJECT_NAME = :2 AND OBJECT_TYPE IN ('PROCEDURE', 'FUNCTION')";

const ARGUMENTS_SQL: &str = "\
SELECT ARGUMENT_NAME, POSITION, SEQUENCE, DATA_LEVEL, DATA_TYPE, IN_OUT,
       TYPE_OWNER, TYPE_NAME, TYPE_SUBNAME, DEFAULTED
FROM ALL_ARGUMENTS
WHERE OBJECT_ID = :1 AND PACKAGE_NAME IS NULL
ORDER BY SEQUENCE";

type Argument = ArgumentNode<ArgumentInfo>;

/// A stored routine and its lazily loaded arguments
pub struct Procedure {
    metadata: ProcedureMetadata,
    fetch_size: u32,
    arguments: ObjectCache<Procedure, Argument>,
}

impl Procedure {
    pub(super) fn new(
        metadata: ProcedureMetadata,
        source: Arc<dyn RowSource>,
        options: CacheOptions,
        fetch_size: u32,
    ) -> Self {
        Self {
            metadata,
            fetch_size,
            arguments: ObjectCache::new("arguments", source, ArgumentFetcher, options),
        }
    }

    pub fn metadata(&self) -> &ProcedureMetadata {
        &self.metadata
    }

    pub fn kind(&self) -> RoutineKind {
        self.metadata.kind
    }

    /// Top-level parameters in declaration order, composite ones carrying
    /// their nested fields
    pub fn arguments(&self, monitor: &dyn Monitor) -> CatalogResult<Vec<Arc<Argument>>> {
        self.arguments.get_all(self, monitor)
    }

    pub fn argument(&self, name: &str, monitor: &dyn Monitor) -> CatalogResult<Option<Arc<Argument>>> {
        self.arguments.get(self, name, monitor)
    }

    pub fn refresh(&self, monitor: &dyn Monitor) -> CatalogResult<Vec<Arc<Argument>>> {
        self.arguments.refresh(self, monitor)
    }
}

impl PartialEq for Procedure {
    fn eq(&self, other: &Self) -> bool {
        self.metadata == other.metadata
    }
}

impl std::fmt::Debug for Procedure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Procedure")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl CatalogObject for Procedure {
    fn name(&self) -> &str {
        &self.metadata.name
    }
}

impl CatalogObject for ArgumentNode<ArgumentInfo> {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    fn key(&self) -> CacheKey {
        match &self.name {
            Some(name) => CacheKey::name(name.as_str()),
            None => CacheKey::name(format!("#{}", self.payload.sequence)),
        }
    }
}

pub(super) struct ProcedureFetcher;

impl ObjectFetcher<Schema, Procedure> for ProcedureFetcher {
    fn prepare_objects(&self, owner: &Schema) -> Statement {
        Statement::new("procedures.list", PROCEDURES_SQL)
            .bind(owner.name())
            .with_fetch_size(owner.fetch_size())
    }

    fn prepare_lookup(&self, owner: &Schema, name: &str) -> Option<Statement> {
        Some(
            Statement::new("procedures.lookup", PROCEDURE_LOOKUP_SQL)
                .bind(owner.name())
                .bind(name),
        )
    }

    fn fetch_object(&self, owner: &Schema, row: &Row) -> CatalogResult<Option<Procedure>> {
        let Some(kind) = RoutineKind::from_object_type(row.get_str("OBJECT_TYPE")?) else {
            return Ok(None);
        };
        let mut metadata = ProcedureMetadata::new(owner.name(), row.get_str("OBJECT_NAME")?, kind)
            .with_object_id(row.get_i64("OBJECT_ID")?);
        metadata.valid = row.get_flag("STATUS")?;
        Ok(Some(Procedure::new(
            metadata,
            owner.source().clone(),
            owner.cache_options(),
            owner.fetch_size(),
        )))
    }
}

/// Maps each argument row to a childless node; the tree is rebuilt once the
/// whole list is in
struct ArgumentFetcher;

impl ObjectFetcher<Procedure, Argument> for ArgumentFetcher {
    fn prepare_objects(&self, owner: &Procedure) -> Statement {
        Statement::new("arguments.list", ARGUMENTS_SQL)
            .bind(owner.metadata.object_id)
            .with_fetch_size(owner.fetch_size)
    }

    fn fetch_object(&self, _owner: &Procedure, row: &Row) -> CatalogResult<Option<Argument>> {
        let mut info = ArgumentInfo::new(
            row.get_u32("SEQUENCE")?,
            row.get_u32("POSITION")?,
            row.get_opt_str("DATA_TYPE")?,
        );
        if let Some(mode) = row.get_opt_str("IN_OUT")? {
            info = info.with_mode(ArgumentMode::from_in_out(mode));
        }
        info.type_owner = row.get_opt_str("TYPE_OWNER")?.map(str::to_string);
        info.type_subname = row
            .get_opt_str("TYPE_SUBNAME")?
            .or(row.get_opt_str("TYPE_NAME")?)
            .map(str::to_string);
        info.has_default = row.get_flag("DEFAULTED")?;

        Ok(Some(ArgumentNode {
            name: row.get_opt_str("ARGUMENT_NAME")?.map(str::to_string),
            data_level: row.get_opt_u32("DATA_LEVEL")?.unwrap_or(0),
            payload: info,
            children: Vec::new(),
        }))
    }

    fn finish_load(&self, owner: &Procedure, flat: Vec<Argument>) -> Vec<Argument> {
        let rows: Vec<FlatRow<ArgumentInfo>> = flat
            .into_iter()
            .map(|node| FlatRow {
                data_level: node.data_level,
                name: node.name,
                payload: node.payload,
            })
            .collect();
        let rows = strip_synthetic_arguments(owner.kind(), rows);
        build_tree(&rows)
    }
}

/// Remove the rows the dictionary adds that are not real parameters.
///
/// A routine without parameters reports a single unnamed, untyped level-0
/// row at position 1; it yields an empty list. A function reports its return
/// value as an unnamed level-0 row at position 1; that row and anything
/// nested under it are removed and the remaining top-level positions shift
/// down by one.
pub fn strip_synthetic_arguments(
    kind: RoutineKind,
    rows: Vec<FlatRow<ArgumentInfo>>,
) -> Vec<FlatRow<ArgumentInfo>> {
    let Some(first) = rows.first() else {
        return rows;
    };
    let synthetic = first.data_level == 0 && first.name.is_none() && first.payload.position == 1;
    if !synthetic {
        return rows;
    }

    if first.payload.type_name.is_none() && rows.len() == 1 {
        debug!("Routine has no arguments");
        return Vec::new();
    }
    if !kind.has_return_value() {
        return rows;
    }

    debug!("Skipping return slot of type {:?}", first.payload.type_name);
    rows.into_iter()
        .skip(1)
        .skip_while(|row| row.data_level > 0)
        .map(|mut row| {
            if row.data_level == 0 && row.payload.position > 1 {
                row.payload.position -= 1;
            }
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg(level: u32, name: Option<&str>, sequence: u32, position: u32, type_name: Option<&str>) -> FlatRow<ArgumentInfo> {
        FlatRow::new(level, name, ArgumentInfo::new(sequence, position, type_name))
    }

    #[test]
    fn test_no_argument_row() {
        let rows = vec![arg(0, None, 1, 1, None)];
        assert!(strip_synthetic_arguments(RoutineKind::Procedure, rows).is_empty());
    }

    #[test]
    fn test_function_return_slot() {
        let rows = vec![
            arg(0, None, 1, 1, Some("NUMBER")),
            arg(0, Some("P_ID"), 2, 2, Some("NUMBER")),
            arg(0, Some("P_NAME"), 3, 3, Some("VARCHAR2")),
        ];
        let kept = strip_synthetic_arguments(RoutineKind::Function, rows);
        let positions: Vec<_> = kept.iter().map(|r| r.payload.position).collect();
        assert_eq!(positions, vec![1, 2]);
        assert_eq!(kept[0].name.as_deref(), Some("P_ID"));
    }

    #[test]
    fn test_record_return_slot_drops_fields() {
        let rows = vec![
            arg(0, None, 1, 1, Some("PL/SQL RECORD")),
            arg(1, Some("ID"), 2, 1, Some("NUMBER")),
            arg(1, Some("NAME"), 3, 2, Some("VARCHAR2")),
            arg(0, Some("P_KEY"), 4, 2, Some("NUMBER")),
        ];
        let kept = strip_synthetic_arguments(RoutineKind::Function, rows);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].payload.position, 1);
    }

    #[test]
    fn test_named_first_argument_is_kept() {
        let rows = vec![arg(0, Some("P_ID"), 1, 1, Some("NUMBER"))];
        assert_eq!(strip_synthetic_arguments(RoutineKind::Function, rows).len(), 1);

        // Procedures have no return slot, so an unnamed typed row stays
        let rows = vec![arg(0, None, 1, 1, Some("NUMBER")), arg(0, Some("P"), 2, 2, Some("DATE"))];
        assert_eq!(strip_synthetic_arguments(RoutineKind::Procedure, rows).len(), 2);
    }
}
