// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # SQL Navigator - Catalog Object Model
//!
//! Plain metadata types that the catalog caches build from dictionary rows.
//! The types carry no behaviour beyond builders and lookups; loading, merging
//! and invalidation live in `sqlnav-catalog`.
//!
//! Cross-object links (an index to its table, a foreign key to the constraint
//! it references) are stored as names or [`ObjectRef`] keys, never as owning
//! pointers, so the owning cache stays the only place an object lives.

pub mod data_type;
pub mod metadata;
pub mod routine;

pub use data_type::DataType;
pub use metadata::{
    ColumnMetadata, ConstraintColumn, ConstraintKind, ConstraintMetadata, DeleteRule,
    ForeignKeyMetadata, IndexColumn, IndexMetadata, ObjectRef, SchemaMetadata,
    SynonymMetadata, TableMetadata, TableType, TriggerMetadata, TriggerTiming,
};
pub use routine::{ArgumentInfo, ArgumentMode, ProcedureMetadata, RoutineKind};
