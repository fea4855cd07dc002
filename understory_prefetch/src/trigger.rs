// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The prefetch trigger: threshold detection, fetch lifecycle, and action dispatch.
//!
//! ## Lifecycle
//!
//! 1) Create a trigger for a host with [`PrefetchTrigger::new`] (or
//!    [`ScrollHostExt::prefetch`]). It subscribes to the host's
//!    [`OffsetNotifier`](crate::host::OffsetNotifier) and fires nothing yet.
//! 2) On every content-offset change the trigger re-reads the host geometry and
//!    runs [`evaluate_threshold`]. When it passes, the state becomes
//!    [`State::Fetching`] and the fetch callback runs.
//! 3) The caller does its work and calls [`PrefetchTrigger::complete_fetching`]
//!    (from any thread). The state becomes [`State::Completed`] and the next
//!    notification may fire again.
//!
//! While `Fetching`, every notification is suppressed. There is no timeout: a
//! fetch that is never completed blocks the trigger for good.
//!
//! ## Native prefetch integration
//!
//! [`PrefetchTrigger::enable_prefetching_data_source`] registers the trigger as
//! the host's native prefetch data source and forwards its notifications as
//! [`Action`]s. That channel never touches the fetch state.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use kurbo::{Size, Vec2};
//! use parking_lot::Mutex;
//! use understory_prefetch::geometry::ScrollGeometry;
//! use understory_prefetch::host::{OffsetNotifier, ScrollHost};
//! use understory_prefetch::trigger::ScrollHostExt;
//! use understory_prefetch::types::State;
//!
//! #[derive(Debug, Default)]
//! struct List {
//!     geometry: Mutex<ScrollGeometry>,
//!     offsets: OffsetNotifier,
//! }
//!
//! impl ScrollHost for List {
//!     fn geometry(&self) -> ScrollGeometry {
//!         *self.geometry.lock()
//!     }
//!     fn offset_notifier(&self) -> &OffsetNotifier {
//!         &self.offsets
//!     }
//! }
//!
//! let list = Arc::new(List::default());
//! *list.geometry.lock() = ScrollGeometry {
//!     bounds: Size::new(400.0, 800.0),
//!     content_size: Size::new(400.0, 3000.0),
//!     content_offset: Vec2::ZERO,
//! };
//!
//! let fetches = Arc::new(AtomicUsize::new(0));
//! let counter = fetches.clone();
//! let trigger = list.prefetch(move |_list, _trigger| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! // Scroll into the last screen of content.
//! list.geometry.lock().content_offset = Vec2::new(0.0, 1500.0);
//! list.offsets.notify();
//! assert_eq!(trigger.state(), State::Fetching);
//!
//! // Further scrolling is ignored until the fetch completes.
//! list.offsets.notify();
//! assert_eq!(fetches.load(Ordering::SeqCst), 1);
//!
//! trigger.complete_fetching();
//! assert_eq!(trigger.state(), State::Completed);
//! ```

use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::datasource::{GridPrefetching, PrefetchDataSource, PrefetchHostKind, TablePrefetching};
use crate::geometry::{Suppression, evaluate_threshold};
use crate::host::{ContentOffsetObserver, ScrollHost, SubscriptionId};
use crate::types::{Action, AxisPolicy, IndexPath, State};

type FetchHandler<H> = dyn Fn(&H, &PrefetchTrigger<H>) + Send + Sync;
type ActionHandler = Arc<dyn Fn(Action) + Send + Sync>;
type LogHandler = Arc<dyn Fn(&str) + Send + Sync>;
type StateHandler = Arc<dyn Fn(State) + Send + Sync>;

/// Tunables for a [`PrefetchTrigger`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PrefetchConfig {
    /// Viewport lengths ahead of the end of content at which a fetch starts.
    ///
    /// Zero, negative, or NaN disables triggering.
    pub leading_screens: f64,
    /// How the scroll axis is chosen.
    pub axis: AxisPolicy,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            leading_screens: 1.0,
            axis: AxisPolicy::Inferred,
        }
    }
}

impl PrefetchConfig {
    /// Return a copy with `leading_screens` replaced.
    pub fn with_leading_screens(self, leading_screens: f64) -> Self {
        Self {
            leading_screens,
            ..self
        }
    }

    /// Return a copy with `axis` replaced.
    pub fn with_axis(self, axis: AxisPolicy) -> Self {
        Self { axis, ..self }
    }
}

/// State shared between the notification path and completion callers.
#[derive(Debug)]
struct Guarded {
    state: State,
    config: PrefetchConfig,
}

struct Handlers {
    action: ActionHandler,
    log: LogHandler,
    state_changed: StateHandler,
}

impl Default for Handlers {
    fn default() -> Self {
        Self {
            action: Arc::new(|_: Action| {}),
            log: Arc::new(|_: &str| {}),
            state_changed: Arc::new(|_: State| {}),
        }
    }
}

/// Watches a [`ScrollHost`] and asks for more content before the user reaches its end.
///
/// Always handed out as an `Arc`; dropping the last reference ends the
/// subscription to the host. The host is held weakly and once it is gone the
/// trigger does nothing.
pub struct PrefetchTrigger<H: ScrollHost> {
    host: Weak<H>,
    this: Weak<Self>,
    subscription: SubscriptionId,
    guarded: Mutex<Guarded>,
    handlers: Mutex<Handlers>,
    fetch: Box<FetchHandler<H>>,
}

impl<H: ScrollHost> core::fmt::Debug for PrefetchTrigger<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let guarded = self.guarded.lock();
        f.debug_struct("PrefetchTrigger")
            .field("state", &guarded.state)
            .field("config", &guarded.config)
            .field("subscription", &self.subscription)
            .field("host_alive", &(self.host.strong_count() > 0))
            .finish_non_exhaustive()
    }
}

impl<H: ScrollHost> PrefetchTrigger<H> {
    /// Observe `host` with the default configuration.
    ///
    /// `on_fetch` runs each time a notification passes the threshold; the
    /// caller must eventually call [`complete_fetching`](Self::complete_fetching).
    pub fn new<F>(host: &Arc<H>, on_fetch: F) -> Arc<Self>
    where
        F: Fn(&H, &Self) + Send + Sync + 'static,
    {
        Self::with_config(host, PrefetchConfig::default(), on_fetch)
    }

    /// Observe `host` with `config`.
    pub fn with_config<F>(host: &Arc<H>, config: PrefetchConfig, on_fetch: F) -> Arc<Self>
    where
        F: Fn(&H, &Self) + Send + Sync + 'static,
    {
        Arc::new_cyclic(|this: &Weak<Self>| {
            let observer: Weak<dyn ContentOffsetObserver> = this.clone();
            let subscription = host.offset_notifier().subscribe(observer);
            Self {
                host: Arc::downgrade(host),
                this: this.clone(),
                subscription,
                guarded: Mutex::new(Guarded {
                    state: State::Idle,
                    config,
                }),
                handlers: Mutex::new(Handlers::default()),
                fetch: Box::new(on_fetch),
            }
        })
    }

    /// Current fetch state.
    pub fn state(&self) -> State {
        self.guarded.lock().state
    }

    /// Current leading-screens multiplier.
    pub fn leading_screens(&self) -> f64 {
        self.guarded.lock().config.leading_screens
    }

    /// Change the leading-screens multiplier; read on the next notification.
    pub fn set_leading_screens(&self, leading_screens: f64) {
        self.guarded.lock().config.leading_screens = leading_screens;
    }

    /// Current axis policy.
    pub fn axis_policy(&self) -> AxisPolicy {
        self.guarded.lock().config.axis
    }

    /// Change how the scroll axis is chosen.
    pub fn set_axis_policy(&self, axis: AxisPolicy) {
        self.guarded.lock().config.axis = axis;
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> PrefetchConfig {
        self.guarded.lock().config
    }

    /// The observed host, if it is still alive.
    pub fn host(&self) -> Option<Arc<H>> {
        self.host.upgrade()
    }

    /// Report that the fetch handed to `on_fetch` has finished.
    ///
    /// Moves `Fetching` to `Completed`. Safe to call from any thread, and from
    /// inside `on_fetch` itself. Repeated calls are no-ops; a call while `Idle`
    /// is ignored and logged as a warning.
    pub fn complete_fetching(&self) {
        let previous = {
            let mut guarded = self.guarded.lock();
            let previous = guarded.state;
            if previous == State::Fetching {
                guarded.state = State::Completed;
            }
            previous
        };
        match previous {
            State::Fetching => {
                log::debug!("prefetch completed");
                self.emit_state_change(State::Completed);
            }
            State::Idle => log::warn!("complete_fetching called with no fetch in flight"),
            State::Completed => {}
        }
    }

    /// Register as the host's native prefetch data source and forward its
    /// notifications to `on_action`.
    ///
    /// Hosts without a native protocol get no registration, but `on_action`
    /// is still stored.
    pub fn enable_prefetching_data_source<F>(&self, on_action: F)
    where
        F: Fn(Action) + Send + Sync + 'static,
    {
        self.handlers.lock().action = Arc::new(on_action);
        self.register_data_source(true);
    }

    /// Clear the native registration and drop the action callback.
    pub fn disable_prefetching_data_source(&self) {
        self.register_data_source(false);
        self.handlers.lock().action = Arc::new(|_: Action| {});
    }

    /// Replace the diagnostic sink that receives suppression messages.
    pub fn log_pipeline<F>(&self, handler: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.handlers.lock().log = Arc::new(handler);
    }

    /// Replace the observer called after every state transition.
    pub fn on_state_change<F>(&self, handler: F)
    where
        F: Fn(State) + Send + Sync + 'static,
    {
        self.handlers.lock().state_changed = Arc::new(handler);
    }

    fn register_data_source(&self, enable: bool) {
        let Some(host) = self.host.upgrade() else {
            return;
        };
        let Some(kind) = host.prefetch_host_kind() else {
            return;
        };
        let source = enable.then(|| match kind {
            PrefetchHostKind::Table => {
                let table: Weak<dyn TablePrefetching> = self.this.clone();
                PrefetchDataSource::Table(table)
            }
            PrefetchHostKind::Grid => {
                let grid: Weak<dyn GridPrefetching> = self.this.clone();
                PrefetchDataSource::Grid(grid)
            }
        });
        host.set_prefetch_data_source(source);
    }

    /// Run the threshold test against the host's current geometry.
    fn evaluate(&self, host: &H) {
        let geometry = host.geometry();
        // The fetching check and the transition share one critical section so
        // concurrent notifications cannot both start a fetch.
        let outcome = {
            let mut guarded = self.guarded.lock();
            if guarded.state.is_fetching() {
                Err(Suppression::AlreadyFetching)
            } else {
                evaluate_threshold(&geometry, guarded.config.leading_screens, guarded.config.axis)
                    .map(|metrics| {
                        guarded.state = State::Fetching;
                        metrics
                    })
            }
        };

        match outcome {
            Ok(metrics) => {
                log::debug!(
                    "prefetch triggered: remaining {} along {:?}",
                    metrics.remaining_distance(),
                    metrics.axis
                );
                self.emit_state_change(State::Fetching);
                (self.fetch)(host, self);
            }
            Err(suppression) => {
                log::trace!("{suppression}");
                let sink = self.handlers.lock().log.clone();
                sink(&suppression.to_string());
            }
        }
    }

    fn emit_state_change(&self, state: State) {
        let handler = self.handlers.lock().state_changed.clone();
        handler(state);
    }

    fn dispatch_action(&self, action: Action) {
        let handler = self.handlers.lock().action.clone();
        handler(action);
    }
}

impl<H: ScrollHost> ContentOffsetObserver for PrefetchTrigger<H> {
    fn content_offset_did_change(&self) {
        let Some(host) = self.host.upgrade() else {
            return;
        };
        self.evaluate(&host);
    }
}

impl<H: ScrollHost> TablePrefetching for PrefetchTrigger<H> {
    fn prefetch_rows(&self, rows: &[IndexPath]) {
        self.dispatch_action(Action::Prefetch(rows.to_vec()));
    }

    fn cancel_prefetching_rows(&self, rows: &[IndexPath]) {
        self.dispatch_action(Action::CancelPrefetching(rows.to_vec()));
    }
}

impl<H: ScrollHost> GridPrefetching for PrefetchTrigger<H> {
    fn prefetch_items(&self, items: &[IndexPath]) {
        self.dispatch_action(Action::Prefetch(items.to_vec()));
    }

    fn cancel_prefetching_items(&self, items: &[IndexPath]) {
        self.dispatch_action(Action::CancelPrefetching(items.to_vec()));
    }
}

impl<H: ScrollHost> Drop for PrefetchTrigger<H> {
    fn drop(&mut self) {
        if let Some(host) = self.host.upgrade() {
            host.offset_notifier().unsubscribe(self.subscription);
        }
    }
}

/// Shorthand for creating a [`PrefetchTrigger`] from a host.
pub trait ScrollHostExt: ScrollHost + Sized {
    /// Observe this host with the default configuration; see [`PrefetchTrigger::new`].
    fn prefetch<F>(self: &Arc<Self>, on_fetch: F) -> Arc<PrefetchTrigger<Self>>
    where
        F: Fn(&Self, &PrefetchTrigger<Self>) + Send + Sync + 'static,
    {
        PrefetchTrigger::new(self, on_fetch)
    }
}

impl<H: ScrollHost> ScrollHostExt for H {}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;
    use crate::types::Axis;

    #[test]
    fn config_keeps_its_settings() {
        let config = PrefetchConfig::default()
            .with_leading_screens(2.5)
            .with_axis(AxisPolicy::Fixed(Axis::Horizontal));
        let json = serde_json::to_string(&config).unwrap();
        let back: PrefetchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn missing_config_fields_take_defaults() {
        let config: PrefetchConfig = serde_json::from_str(r#"{"leading_screens":3.0}"#).unwrap();
        assert_eq!(config, PrefetchConfig::default().with_leading_screens(3.0));
        let config: PrefetchConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PrefetchConfig::default());
    }
}
