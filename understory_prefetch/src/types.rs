// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for the prefetch trigger: lifecycle state, scroll axis, index paths, and actions.
//!
//! ## Overview
//!
//! These types describe the trigger's observable state and the payloads it hands to callers.
//! They are referenced by the [`trigger`](crate::trigger) and [`datasource`](crate::datasource) modules.

use alloc::vec::Vec;

/// Fetch lifecycle of a [`PrefetchTrigger`](crate::trigger::PrefetchTrigger).
///
/// Allowed transitions:
/// - `Idle` or `Completed` → `Fetching` when a scroll notification passes the threshold.
/// - `Fetching` → `Completed` when the caller reports completion.
///
/// Only `Fetching` suppresses new triggers. `Completed` is not re-armed into
/// `Idle`; the next notification simply re-evaluates the threshold.
///
/// Reporting completion while no fetch is in flight does not move the state:
/// from `Idle` it stays `Idle` (and a warning is logged), from `Completed` it
/// stays `Completed`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum State {
    /// No fetch has been started yet.
    #[default]
    Idle,
    /// A fetch was handed to the caller and has not been completed.
    Fetching,
    /// The last fetch was completed by the caller.
    Completed,
}

impl State {
    /// True if a fetch is in flight.
    #[inline]
    pub const fn is_fetching(self) -> bool {
        matches!(self, Self::Fetching)
    }
}

impl core::fmt::Display for State {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Completed => "completed",
        })
    }
}

/// Scroll axis along which remaining content is measured.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    /// Measure heights and `y` offsets.
    Vertical,
    /// Measure widths and `x` offsets.
    Horizontal,
}

/// How the trigger chooses the [`Axis`] for each evaluation.
///
/// `Inferred` compares the viewport width with the content width: equal widths
/// are taken to mean a vertical list, anything else a horizontal one. A view
/// whose content happens to match its width while scrolling horizontally is
/// misclassified; use `Fixed` for such hosts.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AxisPolicy {
    /// Infer the axis from the viewport and content widths.
    #[default]
    Inferred,
    /// Always measure along the given axis.
    Fixed(Axis),
}

/// Position of a row or item in a sectioned list or grid.
///
/// Treated as opaque by the trigger; it is only carried from the host to the
/// action callback in delivery order.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexPath {
    /// Section index.
    pub section: usize,
    /// Row (table) or item (grid) index within the section.
    pub item: usize,
}

impl IndexPath {
    /// Create an index path.
    #[inline]
    pub const fn new(section: usize, item: usize) -> Self {
        Self { section, item }
    }
}

impl From<usize> for IndexPath {
    /// Index path for `item` in section `0`.
    fn from(item: usize) -> Self {
        Self::new(0, item)
    }
}

/// Native prefetch notification forwarded to the action callback.
///
/// See [`PrefetchTrigger::enable_prefetching_data_source`](crate::trigger::PrefetchTrigger::enable_prefetching_data_source).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    /// These rows/items are about to become visible.
    Prefetch(Vec<IndexPath>),
    /// Prefetching for these rows/items is no longer needed.
    CancelPrefetching(Vec<IndexPath>),
}

impl Action {
    /// Index paths carried by this action, in delivery order.
    pub fn index_paths(&self) -> &[IndexPath] {
        match self {
            Self::Prefetch(paths) | Self::CancelPrefetching(paths) => paths,
        }
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn action_keeps_variant_and_paths() {
        let action = Action::CancelPrefetching(vec![IndexPath::new(1, 2), IndexPath::from(7)]);
        let json = serde_json::to_string(&action).unwrap();
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
        assert_eq!(back.index_paths(), &[IndexPath::new(1, 2), IndexPath::new(0, 7)]);
    }

    #[test]
    fn state_and_axis_policy_deserialize_from_names() {
        let state: State = serde_json::from_str("\"Fetching\"").unwrap();
        assert_eq!(state, State::Fetching);
        let policy: AxisPolicy = serde_json::from_str(r#"{"Fixed":"Horizontal"}"#).unwrap();
        assert_eq!(policy, AxisPolicy::Fixed(Axis::Horizontal));
    }
}
