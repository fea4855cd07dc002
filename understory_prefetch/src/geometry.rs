// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll geometry snapshots and the threshold test.
//!
//! ## Overview
//!
//! A [`ScrollGeometry`] is read from the host on every content-offset change.
//! [`evaluate_threshold`] projects it onto one [`Axis`] and decides whether the
//! remaining content has entered the trigger window:
//!
//! - `trigger_distance = view_length * leading_screens`
//! - `remaining_distance = content_length - view_length - offset`
//! - fire iff `0 < remaining_distance <= trigger_distance`
//!
//! A non-positive remaining distance means the viewport already reaches (or
//! passes) the end of content, including content shorter than the viewport.
//! It never fires.
//!
//! ## Example
//!
//! ```
//! use kurbo::{Size, Vec2};
//! use understory_prefetch::geometry::{ScrollGeometry, Suppression, evaluate_threshold};
//! use understory_prefetch::types::AxisPolicy;
//!
//! let at = |y: f64| ScrollGeometry {
//!     bounds: Size::new(400.0, 800.0),
//!     content_size: Size::new(400.0, 3000.0),
//!     content_offset: Vec2::new(0.0, y),
//! };
//!
//! assert!(evaluate_threshold(&at(1500.0), 1.0, AxisPolicy::Inferred).is_ok());
//! assert!(matches!(
//!     evaluate_threshold(&at(1300.0), 1.0, AxisPolicy::Inferred),
//!     Err(Suppression::OutsideWindow { .. })
//! ));
//! ```

use kurbo::{Size, Vec2};

use crate::types::{Axis, AxisPolicy, State};

/// Host geometry at notification time.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ScrollGeometry {
    /// Viewport size.
    pub bounds: Size,
    /// Total scrollable content size.
    pub content_size: Size,
    /// Scroll position of the viewport's origin within the content.
    pub content_offset: Vec2,
}

impl ScrollGeometry {
    /// True if the viewport has neither width nor height.
    #[inline]
    pub fn is_zero_bounds(&self) -> bool {
        self.bounds.width == 0.0 && self.bounds.height == 0.0
    }

    /// Axis inferred from the widths: equal viewport and content widths mean vertical.
    #[inline]
    pub fn inferred_axis(&self) -> Axis {
        if self.bounds.width == self.content_size.width {
            Axis::Vertical
        } else {
            Axis::Horizontal
        }
    }

    /// Resolve `policy` against this geometry.
    #[inline]
    pub fn axis(&self, policy: AxisPolicy) -> Axis {
        match policy {
            AxisPolicy::Inferred => self.inferred_axis(),
            AxisPolicy::Fixed(axis) => axis,
        }
    }

    /// Project the geometry onto `axis`.
    pub fn along(&self, axis: Axis) -> AxisMetrics {
        match axis {
            Axis::Vertical => AxisMetrics {
                axis,
                view_length: self.bounds.height,
                offset: self.content_offset.y,
                content_length: self.content_size.height,
            },
            Axis::Horizontal => AxisMetrics {
                axis,
                view_length: self.bounds.width,
                offset: self.content_offset.x,
                content_length: self.content_size.width,
            },
        }
    }
}

/// Geometry measured along a single axis.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AxisMetrics {
    /// Axis these lengths were measured on.
    pub axis: Axis,
    /// Viewport length.
    pub view_length: f64,
    /// Scroll offset of the viewport's leading edge.
    pub offset: f64,
    /// Total content length.
    pub content_length: f64,
}

impl AxisMetrics {
    /// Distance from the viewport's trailing edge to the end of content.
    #[inline]
    pub fn remaining_distance(&self) -> f64 {
        self.content_length - self.view_length - self.offset
    }

    /// Viewport length scaled by `leading_screens`.
    #[inline]
    pub fn trigger_distance(&self, leading_screens: f64) -> f64 {
        self.view_length * leading_screens
    }
}

/// Why a content-offset change did not start a fetch.
///
/// Suppressions are not errors; they are reported through the trigger's
/// diagnostic sink using the [`Display`](core::fmt::Display) text.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Suppression {
    /// A fetch is already in flight.
    AlreadyFetching,
    /// The leading-screens multiplier is zero, negative, or NaN.
    NonPositiveLeadingScreens(f64),
    /// The viewport has zero width and height.
    ZeroBounds,
    /// The remaining distance is not in `(0, trigger_distance]`.
    OutsideWindow {
        /// Remaining content distance along the axis.
        remaining_distance: f64,
        /// Trigger distance along the axis.
        trigger_distance: f64,
    },
}

impl core::fmt::Display for Suppression {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AlreadyFetching => {
                write!(f, "suppressed: already {}", State::Fetching)
            }
            Self::NonPositiveLeadingScreens(leading) => write!(
                f,
                "suppressed: non-positive leading screens ({leading})"
            ),
            Self::ZeroBounds => f.write_str("suppressed: zero bounds"),
            Self::OutsideWindow {
                remaining_distance,
                trigger_distance,
            } => write!(
                f,
                "suppressed: remaining distance ({remaining_distance}) outside trigger window (0, {trigger_distance}]"
            ),
        }
    }
}

/// Decide whether `geometry` falls inside the trigger window.
///
/// Checks, in order: non-positive `leading_screens`, zero bounds, then the
/// remaining-distance window. Returns the metrics used on success.
///
/// The fetch-in-flight check is the caller's, since it depends on trigger state.
pub fn evaluate_threshold(
    geometry: &ScrollGeometry,
    leading_screens: f64,
    policy: AxisPolicy,
) -> Result<AxisMetrics, Suppression> {
    if leading_screens.is_nan() || leading_screens <= 0.0 {
        return Err(Suppression::NonPositiveLeadingScreens(leading_screens));
    }
    if geometry.is_zero_bounds() {
        return Err(Suppression::ZeroBounds);
    }

    let metrics = geometry.along(geometry.axis(policy));
    let trigger_distance = metrics.trigger_distance(leading_screens);
    let remaining_distance = metrics.remaining_distance();
    // Written as a positive range test so NaN on either side lands outside.
    let in_window = remaining_distance > 0.0 && remaining_distance <= trigger_distance;
    if !in_window {
        return Err(Suppression::OutsideWindow {
            remaining_distance,
            trigger_distance,
        });
    }
    Ok(metrics)
}
