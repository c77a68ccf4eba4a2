// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Recording monitor for cancellation tests

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use sqlnav_catalog::Monitor;

/// Monitor that counts processed rows and can cancel after a fixed number
#[derive(Debug, Default)]
pub struct CountingMonitor {
    worked: AtomicU64,
    cancel_after: Option<u64>,
    tasks: Mutex<Vec<String>>,
}

impl CountingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report cancelled once `rows` rows have been processed
    pub fn cancel_after(rows: u64) -> Self {
        Self {
            cancel_after: Some(rows),
            ..Self::default()
        }
    }

    /// Rows processed so far
    pub fn rows_worked(&self) -> u64 {
        self.worked.load(Ordering::SeqCst)
    }

    /// Names passed to `begin_task`, in order
    pub fn tasks(&self) -> Vec<String> {
        self.tasks.lock().clone()
    }
}

impl Monitor for CountingMonitor {
    fn is_cancelled(&self) -> bool {
        self.cancel_after.is_some_and(|limit| self.rows_worked() >= limit)
    }

    fn begin_task(&self, name: &str) {
        self.tasks.lock().push(name.to_string());
    }

    fn worked(&self, units: u64) {
        self.worked.fetch_add(units, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancels_after_limit() {
        let monitor = CountingMonitor::cancel_after(2);
        assert!(!monitor.is_cancelled());
        Monitor::worked(&monitor, 1);
        assert!(!monitor.is_cancelled());
        Monitor::worked(&monitor, 1);
        assert!(monitor.is_cancelled());
        assert!(!CountingMonitor::new().is_cancelled());
    }
}
