// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Single-flight load cell.
//!
//! A [`LoadCell`] holds one cached value plus its `loaded` flag. The first
//! caller that finds it unloaded becomes the loader; everyone else arriving
//! while that load runs waits on the condition variable and then either sees
//! the loaded value or, if the load failed, competes to become the next
//! loader. The fetch itself runs without the lock held, so it may freely call
//! into other caches.

use parking_lot::{Condvar, Mutex};

use crate::error::CatalogResult;

struct CellState<T> {
    value: T,
    loaded: bool,
    loading: bool,
}

pub(crate) struct LoadCell<T> {
    state: Mutex<CellState<T>>,
    settled: Condvar,
}

/// Resets the `loading` flag if the fetch unwinds
struct LoadingGuard<'a, T> {
    cell: &'a LoadCell<T>,
    armed: bool,
}

impl<T> Drop for LoadingGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            self.cell.state.lock().loading = false;
            self.cell.settled.notify_all();
        }
    }
}

impl<T> LoadCell<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            state: Mutex::new(CellState {
                value,
                loaded: false,
                loading: false,
            }),
            settled: Condvar::new(),
        }
    }

    pub(crate) fn is_loaded(&self) -> bool {
        self.state.lock().loaded
    }

    /// Wait out a load in flight, then report whether the cell is loaded
    pub(crate) fn wait_settled(&self) -> bool {
        let mut state = self.state.lock();
        while state.loading {
            self.settled.wait(&mut state);
        }
        state.loaded
    }

    /// Read the current value whether or not it is loaded
    pub(crate) fn read<R>(&self, f: impl FnOnce(&T, bool) -> R) -> R {
        let state = self.state.lock();
        f(&state.value, state.loaded)
    }

    /// Return `view` of the loaded value, running `fetch` + `install` first if
    /// the cell is not loaded. Only one `fetch` runs at a time per cell.
    pub(crate) fn get_or_load<X, R>(
        &self,
        fetch: impl FnOnce() -> CatalogResult<X>,
        install: impl FnOnce(&mut T, X),
        view: impl Fn(&T) -> R,
    ) -> CatalogResult<R> {
        {
            let mut state = self.state.lock();
            loop {
                if state.loaded {
                    return Ok(view(&state.value));
                }
                if !state.loading {
                    state.loading = true;
                    break;
                }
                self.settled.wait(&mut state);
            }
        }

        let mut guard = LoadingGuard {
            cell: self,
            armed: true,
        };
        let fetched = fetch();
        guard.armed = false;

        let mut state = self.state.lock();
        state.loading = false;
        let result = match fetched {
            Ok(x) => {
                install(&mut state.value, x);
                state.loaded = true;
                Ok(view(&state.value))
            }
            Err(e) => Err(e),
        };
        drop(state);
        self.settled.notify_all();
        result
    }

    /// Mutate the value once no load is in flight.
    ///
    /// The closure also receives the `loaded` flag so callers can clear,
    /// invalidate or install without a fetch.
    pub(crate) fn exclusive<R>(&self, f: impl FnOnce(&mut T, &mut bool) -> R) -> R {
        let mut state = self.state.lock();
        while state.loading {
            self.settled.wait(&mut state);
        }
        let CellState { value, loaded, .. } = &mut *state;
        f(value, loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_loads_once() {
        let cell = LoadCell::new(Vec::<u32>::new());
        let fetches = AtomicUsize::new(0);
        for _ in 0..3 {
            let got = cell
                .get_or_load(
                    || {
                        fetches.fetch_add(1, Ordering::SeqCst);
                        Ok(vec![1, 2])
                    },
                    |value, fresh| *value = fresh,
                    |value| value.clone(),
                )
                .unwrap();
            assert_eq!(got, vec![1, 2]);
        }
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert!(cell.is_loaded());
    }

    #[test]
    fn test_failed_load_leaves_cell_unloaded() {
        let cell = LoadCell::new(0u32);
        let err = cell
            .get_or_load(
                || Err::<u32, _>(CatalogError::ConnectionFailed("down".into())),
                |value, fresh| *value = fresh,
                |value| *value,
            )
            .unwrap_err();
        assert!(matches!(err, CatalogError::ConnectionFailed(_)));
        assert!(!cell.is_loaded());

        let got = cell
            .get_or_load(|| Ok(7), |value, fresh| *value = fresh, |value| *value)
            .unwrap();
        assert_eq!(got, 7);
    }

    #[test]
    fn test_concurrent_callers_share_one_fetch() {
        let cell = LoadCell::new(0u32);
        let fetches = AtomicUsize::new(0);
        let start = Barrier::new(4);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    start.wait();
                    let got = cell
                        .get_or_load(
                            || {
                                fetches.fetch_add(1, Ordering::SeqCst);
                                std::thread::sleep(Duration::from_millis(30));
                                Ok(42)
                            },
                            |value, fresh| *value = fresh,
                            |value| *value,
                        )
                        .unwrap();
                    assert_eq!(got, 42);
                });
            }
        });

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_wait_settled_blocks_until_load_finishes() {
        let cell = LoadCell::new(0u32);
        let start = Barrier::new(2);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                cell.get_or_load(
                    || {
                        start.wait();
                        std::thread::sleep(Duration::from_millis(30));
                        Ok(5)
                    },
                    |value, fresh| *value = fresh,
                    |value| *value,
                )
                .unwrap();
            });
            start.wait();
            assert!(cell.wait_settled());
            assert_eq!(cell.read(|value, _| *value), 5);
        });
    }

    #[test]
    fn test_exclusive_resets() {
        let cell = LoadCell::new(vec![1u32]);
        cell.get_or_load(|| Ok(()), |_, _| {}, |_| ()).unwrap();
        assert!(cell.is_loaded());

        cell.exclusive(|value, loaded| {
            value.clear();
            *loaded = false;
        });
        assert!(!cell.is_loaded());
        assert!(cell.read(|value, _| value.is_empty()));
    }
}
