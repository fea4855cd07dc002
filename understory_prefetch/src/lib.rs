// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_prefetch --heading-base-level=0

//! Understory Prefetch: a scroll-threshold trigger for loading more list content.
//!
//! ## Overview
//!
//! As the user scrolls toward the end of loaded content, a [`PrefetchTrigger`](crate::trigger::PrefetchTrigger)
//! calls your fetch callback before the edge is reached, and refuses to call it again until you report completion.
//! It does not load, store, or merge data; it only decides *when* to ask for more and whether a request is in flight.
//!
//! The trigger is toolkit-agnostic. Your scrollable view implements [`ScrollHost`](crate::host::ScrollHost):
//! it exposes a [`ScrollGeometry`](crate::geometry::ScrollGeometry) snapshot and an
//! [`OffsetNotifier`](crate::host::OffsetNotifier) it pokes whenever the content offset changes.
//!
//! ## Threshold
//!
//! On each notification the geometry is projected onto one axis and
//!
//! - `trigger_distance = view_length * leading_screens`
//! - `remaining_distance = content_length - view_length - offset`
//!
//! A fetch starts iff `0 < remaining_distance <= trigger_distance`.
//! The axis is vertical when the viewport and content widths are equal, horizontal otherwise,
//! unless an explicit [`AxisPolicy`](crate::types::AxisPolicy) is configured.
//! See [`geometry`] for details.
//!
//! ## Lifecycle
//!
//! [`State`](crate::types::State) moves `Idle → Fetching` on a threshold pass and `Fetching → Completed` on
//! [`complete_fetching`](crate::trigger::PrefetchTrigger::complete_fetching).
//! Only `Fetching` blocks new triggers; `Completed` re-evaluates on the next notification.
//! Suppressed notifications are not errors; they are reported as text through
//! [`log_pipeline`](crate::trigger::PrefetchTrigger::log_pipeline).
//!
//! ## Native prefetch protocols
//!
//! Table- and grid-like hosts often report upcoming and cancelled rows ahead of rendering.
//! [`enable_prefetching_data_source`](crate::trigger::PrefetchTrigger::enable_prefetching_data_source)
//! registers the trigger for those notifications and forwards them as [`Action`](crate::types::Action)s.
//! See [`datasource`].
//!
//! ## Threading
//!
//! Notifications usually arrive on the UI thread while completion may come from a worker.
//! State and configuration sit behind a short `parking_lot` critical section; callbacks always run unlocked,
//! so a fetch callback may complete synchronously.
//!
//! ## Logging
//!
//! Besides the diagnostic sink, the crate reports through the [`log`] facade:
//! fetch start and completion at `debug`, suppressions at `trace`, and contract violations at `warn`.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use kurbo::{Size, Vec2};
//! use parking_lot::Mutex;
//! use understory_prefetch::geometry::ScrollGeometry;
//! use understory_prefetch::host::{OffsetNotifier, ScrollHost};
//! use understory_prefetch::trigger::PrefetchTrigger;
//! use understory_prefetch::types::State;
//!
//! #[derive(Debug, Default)]
//! struct Feed {
//!     geometry: Mutex<ScrollGeometry>,
//!     offsets: OffsetNotifier,
//! }
//!
//! impl ScrollHost for Feed {
//!     fn geometry(&self) -> ScrollGeometry {
//!         *self.geometry.lock()
//!     }
//!     fn offset_notifier(&self) -> &OffsetNotifier {
//!         &self.offsets
//!     }
//! }
//!
//! let feed = Arc::new(Feed::default());
//! *feed.geometry.lock() = ScrollGeometry {
//!     bounds: Size::new(320.0, 800.0),
//!     content_size: Size::new(320.0, 3000.0),
//!     content_offset: Vec2::ZERO,
//! };
//!
//! let trigger = PrefetchTrigger::new(&feed, |_feed, trigger| {
//!     // Kick off a request here; complete once rows are appended.
//!     trigger.complete_fetching();
//! });
//! trigger.set_leading_screens(2.0);
//!
//! feed.geometry.lock().content_offset = Vec2::new(0.0, 700.0);
//! feed.offsets.notify();
//! assert_eq!(trigger.state(), State::Completed);
//! ```

extern crate alloc;

pub mod datasource;
pub mod geometry;
pub mod host;
pub mod trigger;
pub mod types;
