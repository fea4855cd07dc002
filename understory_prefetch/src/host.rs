// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host contract: geometry reads and the content-offset change stream.
//!
//! ## Overview
//!
//! A host is whatever scrollable view the toolkit provides. It implements
//! [`ScrollHost`] and owns an [`OffsetNotifier`]; after every change to its
//! content offset it calls [`OffsetNotifier::notify`].
//! Observers are held weakly, so subscribing never extends an observer's
//! lifetime and dropped observers disappear on the next notification.
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use understory_prefetch::host::{ContentOffsetObserver, OffsetNotifier};
//!
//! #[derive(Debug, Default)]
//! struct Counter(AtomicUsize);
//!
//! impl ContentOffsetObserver for Counter {
//!     fn content_offset_did_change(&self) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//!
//! let notifier = OffsetNotifier::new();
//! let counter = Arc::new(Counter::default());
//! let observer: Arc<dyn ContentOffsetObserver> = counter.clone();
//! let _id = notifier.subscribe(Arc::downgrade(&observer));
//! drop(observer);
//!
//! notifier.notify();
//! assert_eq!(counter.0.load(Ordering::Relaxed), 1);
//!
//! drop(counter);
//! notifier.notify();
//! assert_eq!(notifier.len(), 0);
//! ```

use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;

use parking_lot::Mutex;

use crate::datasource::{PrefetchDataSource, PrefetchHostKind};
use crate::geometry::ScrollGeometry;

/// A scrollable view observed by a [`PrefetchTrigger`](crate::trigger::PrefetchTrigger).
///
/// Geometry is read once per notification; the trigger never mutates the host.
pub trait ScrollHost: Send + Sync + 'static {
    /// Current viewport size, content size and content offset.
    fn geometry(&self) -> ScrollGeometry;

    /// The host's content-offset change stream.
    fn offset_notifier(&self) -> &OffsetNotifier;

    /// The native row/item prefetch protocol this host supports, if any.
    ///
    /// Plain scroll views return `None`, which is the default.
    fn prefetch_host_kind(&self) -> Option<PrefetchHostKind> {
        None
    }

    /// Install or clear the native prefetch data source.
    ///
    /// Only called when [`prefetch_host_kind`](Self::prefetch_host_kind) is `Some`.
    /// Hosts usually store it in a [`PrefetchDataSourceSlot`](crate::datasource::PrefetchDataSourceSlot).
    fn set_prefetch_data_source(&self, source: Option<PrefetchDataSource>) {
        let _ = source;
    }
}

/// Receiver of content-offset change notifications.
pub trait ContentOffsetObserver: Send + Sync {
    /// The host's content offset changed; re-read its geometry now.
    fn content_offset_did_change(&self);
}

/// Handle for an [`OffsetNotifier`] subscription.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    entries: Vec<(SubscriptionId, Weak<dyn ContentOffsetObserver>)>,
}

/// Content-offset change stream owned by a host.
///
/// Observers are stored weakly and invoked outside the internal lock, so an
/// observer may subscribe, unsubscribe, or trigger another notification from
/// inside its callback.
#[derive(Default)]
pub struct OffsetNotifier {
    subscribers: Mutex<Subscribers>,
}

impl core::fmt::Debug for OffsetNotifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let subs = self.subscribers.lock();
        f.debug_struct("OffsetNotifier")
            .field("subscribers", &subs.entries.len())
            .field("next_id", &subs.next_id)
            .finish()
    }
}

impl OffsetNotifier {
    /// Create a notifier with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `observer`; it receives every later [`notify`](Self::notify) while it is alive.
    pub fn subscribe(&self, observer: Weak<dyn ContentOffsetObserver>) -> SubscriptionId {
        let mut subs = self.subscribers.lock();
        let id = SubscriptionId(subs.next_id);
        subs.next_id += 1;
        subs.entries.push((id, observer));
        id
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers.lock();
        let before = subs.entries.len();
        subs.entries.retain(|(sid, _)| *sid != id);
        subs.entries.len() != before
    }

    /// Number of registered subscriptions, including dead ones not yet pruned.
    pub fn len(&self) -> usize {
        self.subscribers.lock().entries.len()
    }

    /// True if there are no registered subscriptions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver a change notification to every live observer, in subscription order.
    ///
    /// Dead observers are pruned.
    pub fn notify(&self) {
        let live: Vec<Arc<dyn ContentOffsetObserver>> = {
            let mut subs = self.subscribers.lock();
            let mut live = Vec::with_capacity(subs.entries.len());
            subs.entries.retain(|(_, weak)| match weak.upgrade() {
                Some(observer) => {
                    live.push(observer);
                    true
                }
                None => false,
            });
            live
        };
        for observer in live {
            observer.content_offset_did_change();
        }
    }
}
