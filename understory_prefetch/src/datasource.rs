// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Native prefetch data-source protocols for table- and grid-like hosts.
//!
//! ## Overview
//!
//! Many list toolkits report, ahead of rendering, which rows or items are about
//! to appear and which earlier requests can be dropped. Table-like hosts speak
//! in rows and grid-like hosts in items; the two protocols are
//! [`TablePrefetching`] and [`GridPrefetching`].
//!
//! A host advertises which one it speaks through
//! [`ScrollHost::prefetch_host_kind`](crate::host::ScrollHost::prefetch_host_kind)
//! and receives a [`PrefetchDataSource`] when a trigger enables the integration.
//! [`PrefetchDataSourceSlot`] stores that registration weakly and delivers the
//! host's notifications to it.
//!
//! This channel is independent of the scroll threshold: it never changes the
//! trigger's [`State`](crate::types::State) and never starts a fetch.

use alloc::sync::Weak;

use parking_lot::Mutex;

use crate::types::IndexPath;

/// Which native prefetch protocol a host speaks.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PrefetchHostKind {
    /// Row-based list views.
    Table,
    /// Item-based grid/collection views.
    Grid,
}

/// Native prefetch protocol of table-like hosts.
pub trait TablePrefetching: Send + Sync {
    /// Rows at `rows` are about to become visible.
    fn prefetch_rows(&self, rows: &[IndexPath]);
    /// Prefetching for `rows` is no longer needed.
    fn cancel_prefetching_rows(&self, rows: &[IndexPath]);
}

/// Native prefetch protocol of grid-like hosts.
pub trait GridPrefetching: Send + Sync {
    /// Items at `items` are about to become visible.
    fn prefetch_items(&self, items: &[IndexPath]);
    /// Prefetching for `items` is no longer needed.
    fn cancel_prefetching_items(&self, items: &[IndexPath]);
}

/// A weakly held native prefetch data source, tagged by host kind.
#[derive(Clone)]
pub enum PrefetchDataSource {
    /// Data source for a table-like host.
    Table(Weak<dyn TablePrefetching>),
    /// Data source for a grid-like host.
    Grid(Weak<dyn GridPrefetching>),
}

impl PrefetchDataSource {
    /// The protocol this data source implements.
    pub fn kind(&self) -> PrefetchHostKind {
        match self {
            Self::Table(_) => PrefetchHostKind::Table,
            Self::Grid(_) => PrefetchHostKind::Grid,
        }
    }

    /// True if the underlying data source has been dropped.
    pub fn is_dangling(&self) -> bool {
        match self {
            Self::Table(w) => w.strong_count() == 0,
            Self::Grid(w) => w.strong_count() == 0,
        }
    }

    /// Forward a prefetch notification. Returns `false` if the data source is gone.
    pub fn prefetch(&self, indices: &[IndexPath]) -> bool {
        match self {
            Self::Table(w) => w.upgrade().map(|s| s.prefetch_rows(indices)).is_some(),
            Self::Grid(w) => w.upgrade().map(|s| s.prefetch_items(indices)).is_some(),
        }
    }

    /// Forward a cancellation. Returns `false` if the data source is gone.
    pub fn cancel_prefetching(&self, indices: &[IndexPath]) -> bool {
        match self {
            Self::Table(w) => w
                .upgrade()
                .map(|s| s.cancel_prefetching_rows(indices))
                .is_some(),
            Self::Grid(w) => w
                .upgrade()
                .map(|s| s.cancel_prefetching_items(indices))
                .is_some(),
        }
    }
}

impl core::fmt::Debug for PrefetchDataSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PrefetchDataSource")
            .field("kind", &self.kind())
            .field("dangling", &self.is_dangling())
            .finish()
    }
}

/// Storage for a host's native prefetch data source.
///
/// Hosts embed one of these and forward
/// [`ScrollHost::set_prefetch_data_source`](crate::host::ScrollHost::set_prefetch_data_source)
/// to [`set`](Self::set). Delivery happens outside the internal lock.
#[derive(Debug, Default)]
pub struct PrefetchDataSourceSlot {
    source: Mutex<Option<PrefetchDataSource>>,
}

impl PrefetchDataSourceSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the registered data source.
    pub fn set(&self, source: Option<PrefetchDataSource>) {
        *self.source.lock() = source;
    }

    /// Currently registered data source, if any.
    pub fn get(&self) -> Option<PrefetchDataSource> {
        self.source.lock().clone()
    }

    /// True if a live data source is registered.
    pub fn is_registered(&self) -> bool {
        self.source
            .lock()
            .as_ref()
            .is_some_and(|s| !s.is_dangling())
    }

    /// Report that `indices` are about to become visible.
    ///
    /// Returns `false` if nothing received it.
    pub fn prefetch(&self, indices: &[IndexPath]) -> bool {
        self.get().is_some_and(|s| s.prefetch(indices))
    }

    /// Report that `indices` no longer need prefetching.
    ///
    /// Returns `false` if nothing received it.
    pub fn cancel_prefetching(&self, indices: &[IndexPath]) -> bool {
        self.get().is_some_and(|s| s.cancel_prefetching(indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::sync::Arc;
    use alloc::vec::Vec;

    #[derive(Default)]
    struct Recorder {
        log: Mutex<Vec<(&'static str, Vec<IndexPath>)>>,
    }

    impl TablePrefetching for Recorder {
        fn prefetch_rows(&self, rows: &[IndexPath]) {
            self.log.lock().push(("rows", rows.to_vec()));
        }
        fn cancel_prefetching_rows(&self, rows: &[IndexPath]) {
            self.log.lock().push(("cancel rows", rows.to_vec()));
        }
    }

    impl GridPrefetching for Recorder {
        fn prefetch_items(&self, items: &[IndexPath]) {
            self.log.lock().push(("items", items.to_vec()));
        }
        fn cancel_prefetching_items(&self, items: &[IndexPath]) {
            self.log.lock().push(("cancel items", items.to_vec()));
        }
    }

    fn paths(items: &[usize]) -> Vec<IndexPath> {
        items.iter().copied().map(IndexPath::from).collect()
    }

    #[test]
    fn empty_slot_delivers_nothing() {
        let slot = PrefetchDataSourceSlot::new();
        assert!(!slot.is_registered());
        assert!(!slot.prefetch(&paths(&[1])));
        assert!(!slot.cancel_prefetching(&paths(&[1])));
    }

    #[test]
    fn table_source_receives_row_calls() {
        let rec = Arc::new(Recorder::default());
        let table: Arc<dyn TablePrefetching> = rec.clone();
        let slot = PrefetchDataSourceSlot::new();
        slot.set(Some(PrefetchDataSource::Table(Arc::downgrade(&table))));
        assert!(slot.is_registered());
        assert_eq!(slot.get().map(|s| s.kind()), Some(PrefetchHostKind::Table));

        assert!(slot.prefetch(&paths(&[3, 1, 2])));
        assert!(slot.cancel_prefetching(&paths(&[1])));
        let log = rec.log.lock();
        assert_eq!(log[0], ("rows", paths(&[3, 1, 2])));
        assert_eq!(log[1], ("cancel rows", paths(&[1])));
    }

    #[test]
    fn grid_source_receives_item_calls() {
        let rec = Arc::new(Recorder::default());
        let grid: Arc<dyn GridPrefetching> = rec.clone();
        let slot = PrefetchDataSourceSlot::new();
        slot.set(Some(PrefetchDataSource::Grid(Arc::downgrade(&grid))));

        assert!(slot.prefetch(&paths(&[8])));
        assert!(slot.cancel_prefetching(&paths(&[8, 9])));
        let log = rec.log.lock();
        assert_eq!(log[0], ("items", paths(&[8])));
        assert_eq!(log[1], ("cancel items", paths(&[8, 9])));
    }

    #[test]
    fn dropped_source_is_dangling() {
        let rec = Arc::new(Recorder::default());
        let table: Arc<dyn TablePrefetching> = rec.clone();
        let slot = PrefetchDataSourceSlot::new();
        slot.set(Some(PrefetchDataSource::Table(Arc::downgrade(&table))));
        drop(table);
        drop(rec);
        assert!(!slot.is_registered());
        assert!(!slot.prefetch(&paths(&[0])));
    }
}
