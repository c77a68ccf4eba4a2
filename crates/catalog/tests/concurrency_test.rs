// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Concurrent access to shared caches

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use sqlnav_catalog::{CancelToken, CatalogConfig, DataSource, Monitor, NullMonitor};
use sqlnav_test_utils::{CatalogAssertions, MockRowSource, MockRowSourceBuilder};

const THREADS: usize = 8;

fn slow_source() -> Arc<MockRowSource> {
    Arc::new(
        MockRowSourceBuilder::new()
            .with_hr_schema()
            .delay(Duration::from_millis(30))
            .build(),
    )
}

#[test]
fn test_concurrent_listing_runs_one_query() {
    let source = slow_source();
    let ds = DataSource::new(source.clone(), CatalogConfig::default()).unwrap();
    let barrier = Barrier::new(THREADS);
    let (barrier, ds) = (&barrier, &ds);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(move || {
                    barrier.wait();
                    ds.schemas(&NullMonitor).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(source.query_count("schemas.list"), 1);
    for listing in &results[1..] {
        CatalogAssertions::assert_same_instances(&results[0], listing);
    }
}

#[test]
fn test_concurrent_children_share_one_load() {
    let source = slow_source();
    let ds = DataSource::new(source.clone(), CatalogConfig::default()).unwrap();
    let hr = ds.schema("HR", &NullMonitor).unwrap().unwrap();
    hr.table("EMPLOYEES", &NullMonitor).unwrap().unwrap();
    let barrier = Barrier::new(THREADS);

    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                barrier.wait();
                let columns = hr.table_columns("EMPLOYEES", &NullMonitor).unwrap();
                assert_eq!(columns.len(), 6);
            });
        }
    });

    assert_eq!(source.query_count("columns.table"), 1);
}

/// Spin until `id` has been issued at least `count` times
fn wait_for_query(source: &MockRowSource, id: &str, count: usize) {
    while source.query_count(id) < count {
        thread::yield_now();
    }
}

#[test]
fn test_clear_waits_for_in_flight_load() {
    let source = slow_source();
    let ds = DataSource::new(source.clone(), CatalogConfig::default()).unwrap();
    let hr = ds.schema("HR", &NullMonitor).unwrap().unwrap();
    let (hr, source_ref) = (&hr, &*source);

    thread::scope(|s| {
        let loader = s.spawn(move || hr.tables(&NullMonitor).unwrap().len());
        // The statement is recorded before the source sleeps
        wait_for_query(source_ref, "tables.list", 1);
        hr.table_cache().clear();
        assert_eq!(loader.join().unwrap(), 4);
    });

    // Had clear not waited, the load would have installed its rows afterwards
    assert!(!hr.table_cache().objects().is_loaded());
    assert!(hr.table_cache().objects().cached().is_empty());
    assert_eq!(source.query_count("tables.list"), 1);
}

#[test]
fn test_refresh_waits_for_in_flight_load() {
    let source = slow_source();
    let ds = DataSource::new(source.clone(), CatalogConfig::default()).unwrap();
    let hr = ds.schema("HR", &NullMonitor).unwrap().unwrap();
    let (hr, source_ref) = (&hr, &*source);

    let (first, refreshed) = thread::scope(|s| {
        let loader = s.spawn(move || hr.tables(&NullMonitor).unwrap());
        wait_for_query(source_ref, "tables.list", 1);
        let refreshed = hr.table_cache().refresh(hr, &NullMonitor).unwrap();
        (loader.join().unwrap(), refreshed)
    });

    assert_eq!(source.query_count("tables.list"), 2);
    CatalogAssertions::assert_same_instances(&first, &refreshed);
    assert!(hr.table_cache().objects().is_loaded());
}

#[test]
fn test_cancel_token_from_another_thread() {
    let source = Arc::new(MockRowSourceBuilder::new().with_hr_schema().build());
    let ds = DataSource::new(source.clone(), CatalogConfig::default()).unwrap();
    let hr = ds.schema("HR", &NullMonitor).unwrap().unwrap();

    let token = CancelToken::new();
    let remote = token.clone();
    thread::spawn(move || remote.cancel()).join().unwrap();
    assert!(token.is_cancelled());

    // Cancelled before the first row: an empty but loaded listing
    assert!(hr.procedures(&token).unwrap().is_empty());
    assert!(hr.procedure_cache().is_loaded());
    assert_eq!(hr.procedure_cache().refresh(&hr, &NullMonitor).unwrap().len(), 3);
}
