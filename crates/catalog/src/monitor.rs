// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Progress monitors
//!
//! A [`Monitor`] is threaded through every loading call. The caches poll it
//! once per row; a cancelled monitor stops the scan and the rows read so far
//! are kept as a usable partial result.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation and progress token
pub trait Monitor: Send + Sync {
    /// Whether the caller asked to stop
    fn is_cancelled(&self) -> bool;

    /// A named unit of work is starting
    fn begin_task(&self, _name: &str) {}

    /// `units` rows have been processed
    fn worked(&self, _units: u64) {}
}

/// Monitor that never cancels and ignores progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMonitor;

impl Monitor for NullMonitor {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Shareable cancellation flag
///
/// Clones observe the same flag, so a UI thread can keep one half and hand
/// the other to a background load.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl Monitor for CancelToken {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
