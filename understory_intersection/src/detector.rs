// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The intersection-detection capability consumed by the cache.
//!
//! A platform detector (for example a browser `IntersectionObserver`) is
//! wrapped behind [`IntersectionDetector`], and its construction behind
//! [`IntersectionBackend`]. Detectors never call back into the cache
//! directly: whenever the platform reports changes, the host forwards them to
//! [`ObserverCache::dispatch`](crate::ObserverCache::dispatch). Delivery may
//! therefore lag arbitrarily behind the layout change that caused it.

use alloc::vec::Vec;

use kurbo::Rect;

use crate::config::ObserverConfig;

/// One visibility change reported for an observed target.
#[derive(Clone, Debug, PartialEq)]
pub struct IntersectionEntry<E> {
    /// The observed element.
    pub target: E,
    /// Whether the target now counts as intersecting the root.
    pub is_intersecting: bool,
    /// Visible fraction of the target, in `0.0..=1.0`.
    pub intersection_ratio: f64,
}

impl<E> IntersectionEntry<E> {
    /// An entry for a target that became visible with the given ratio.
    #[must_use]
    pub fn entering(target: E, intersection_ratio: f64) -> Self {
        Self {
            target,
            is_intersecting: true,
            intersection_ratio,
        }
    }

    /// An entry for a target that stopped being visible.
    #[must_use]
    pub fn exiting(target: E) -> Self {
        Self {
            target,
            is_intersecting: false,
            intersection_ratio: 0.0,
        }
    }
}

/// Per-element registration on one underlying detector.
pub trait IntersectionDetector<E> {
    /// Starts reporting visibility changes for `target`.
    fn observe(&mut self, target: &E);

    /// Stops reporting visibility changes for `target`.
    fn unobserve(&mut self, target: &E);

    /// Stops reporting for every target; the detector is not reused after this.
    fn disconnect(&mut self);
}

/// Constructs detectors for observer configurations.
pub trait IntersectionBackend<E> {
    /// The detector type produced by this backend.
    type Detector: IntersectionDetector<E>;

    /// Creates a detector measuring against `config`.
    fn create(&mut self, config: &ObserverConfig<E>) -> Self::Detector;
}

/// A detector that computes its entries from a host-supplied layout.
///
/// Implemented by [`GeometricDetector`](crate::GeometricDetector); see
/// [`ObserverCache::update_layout`](crate::ObserverCache::update_layout).
pub trait LayoutDetector<E>: IntersectionDetector<E> {
    /// Measures every observed target against `root_bounds` and returns the
    /// entries whose state changed since the previous call.
    ///
    /// `layout` returns the bounds of an element in the same coordinate space
    /// as `root_bounds`, or `None` if it is not laid out.
    fn compute(
        &mut self,
        root_bounds: Rect,
        layout: &dyn Fn(&E) -> Option<Rect>,
    ) -> Vec<IntersectionEntry<E>>;
}
