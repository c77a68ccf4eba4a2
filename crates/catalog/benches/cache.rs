// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Cache performance benchmarks
//!
//! Measures tree reconstruction, refresh merging and composite grouping.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use sqlnav_catalog::{CatalogConfig, DataSource, FlatRow, KeyCase, NullMonitor, Row, build_tree, merge_objects};
use sqlnav_model::TableMetadata;
use sqlnav_test_utils::MockRowSourceBuilder;

/// 200 records of two levels each
fn argument_rows() -> Vec<FlatRow<u32>> {
    let mut rows = Vec::new();
    for i in 0..200u32 {
        rows.push(FlatRow::new(0, Some("P_REC"), i));
        rows.push(FlatRow::new(1, Some("ID"), i));
        rows.push(FlatRow::new(1, Some("ADDRESS"), i));
        rows.push(FlatRow::new(2, Some("CITY"), i));
        rows.push(FlatRow::new(2, Some("ZIP"), i));
    }
    rows
}

fn tables(count: usize) -> Vec<TableMetadata> {
    (0..count)
        .map(|i| TableMetadata::new(format!("TABLE_{:04}", i), "HR").with_row_count(i as u64))
        .collect()
}

/// Table, column and index rows for `tables` tables
fn index_schema(tables: usize, indexes: usize, columns: usize) -> (Vec<Row>, Vec<Row>, Vec<Row>) {
    let mut table_rows = Vec::new();
    let mut column_rows = Vec::new();
    let mut index_rows = Vec::new();
    for t in 0..tables {
        let table = format!("T{:03}", t);
        table_rows.push(
            Row::new()
                .with("TABLE_NAME", table.as_str())
                .with("OBJECT_TYPE", "TABLE"),
        );
        for c in 0..columns {
            column_rows.push(
                Row::new()
                    .with("TABLE_NAME", table.as_str())
                    .with("COLUMN_NAME", format!("C{}", c))
                    .with("COLUMN_ID", c as i64 + 1)
                    .with("DATA_TYPE", "NUMBER")
                    .with("NULLABLE", "Y"),
            );
        }
        for i in 0..indexes {
            for c in 0..columns {
                index_rows.push(
                    Row::new()
                        .with("TABLE_NAME", table.as_str())
                        .with("INDEX_NAME", format!("{}_IX{}", table, i))
                        .with("INDEX_TYPE", "NORMAL")
                        .with("UNIQUENESS", "NONUNIQUE")
                        .with("COLUMN_NAME", format!("C{}", c))
                        .with("COLUMN_POSITION", c as i64 + 1)
                        .with("DESCEND", "ASC"),
                );
            }
        }
    }
    (table_rows, column_rows, index_rows)
}

fn bench_build_tree(c: &mut Criterion) {
    let rows = argument_rows();

    c.bench_function("cache/build_tree", |b| {
        b.iter(|| black_box(build_tree(black_box(&rows))));
    });
}

fn bench_merge(c: &mut Criterion) {
    let previous: Vec<Arc<TableMetadata>> = tables(1000).into_iter().map(Arc::new).collect();

    c.bench_function("cache/merge_unchanged", |b| {
        b.iter(|| black_box(merge_objects(&previous, tables(1000), KeyCase::Insensitive)));
    });
}

fn bench_index_grouping(c: &mut Criterion) {
    let (table_rows, column_rows, indexes) = index_schema(50, 4, 3);
    let source = Arc::new(
        MockRowSourceBuilder::new()
            .rows("schemas.lookup", vec![Row::new().with("USERNAME", "HR")])
            .rows("tables.list", table_rows)
            .filtered_rows("columns.table", column_rows, &[(1, "TABLE_NAME")])
            .rows("indexes.list", indexes)
            .build(),
    );
    let ds = DataSource::new(source, CatalogConfig::default()).expect("data source");
    let hr = ds.schema("HR", &NullMonitor).unwrap().expect("schema");
    hr.tables(&NullMonitor).unwrap();

    c.bench_function("cache/index_grouping", |b| {
        b.iter(|| {
            let indexes = hr.index_cache().refresh(&hr, None, &NullMonitor).unwrap();
            black_box(indexes.len());
        });
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = bench_build_tree, bench_merge, bench_index_grouping
);

criterion_main!(benches);
