// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Testing utilities for the SQL Navigator catalog
//!
//! This crate provides common testing components including:
//! - A scripted row source, built in code or from YAML
//! - A monitor that counts rows and cancels on demand
//! - Dictionary rows for a sample HR schema
//! - Catalog-specific assertions

pub mod assertions;
pub mod fixtures;
pub mod mock_source;
pub mod monitor;

// Re-exports for convenience
pub use assertions::CatalogAssertions;
pub use fixtures::CatalogFixtures;
pub use mock_source::{FixtureError, MockRowSource, MockRowSourceBuilder};
pub use monitor::CountingMonitor;

/// Route `tracing` output to the test harness, honouring `RUST_LOG`.
/// Safe to call from every test.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
