// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A reference detector computing intersections from rectangles.

use alloc::vec::Vec;

use kurbo::Rect;

use crate::config::{ObserverConfig, RootMargin, normalize_threshold};
use crate::detector::{IntersectionBackend, IntersectionDetector, IntersectionEntry, LayoutDetector};

/// Backend producing [`GeometricDetector`]s.
///
/// Useful for headless hosts that already own a layout (a box tree, a
/// virtual list) and for testing consumers of the cache.
#[derive(Clone, Copy, Debug, Default)]
pub struct GeometricBackend;

impl<E: Clone + PartialEq> IntersectionBackend<E> for GeometricBackend {
    type Detector = GeometricDetector<E>;

    fn create(&mut self, config: &ObserverConfig<E>) -> Self::Detector {
        GeometricDetector::new(config.root_margin, config.threshold)
    }
}

/// Computes visibility of observed targets against a root rectangle.
///
/// The visible fraction of a target is its intersection area with the
/// margin-adjusted root divided by its own area. A zero-area target counts as
/// fully visible when it lies inside the root. With a threshold of `0.0` any
/// visible area counts as intersecting; otherwise the fraction must reach the
/// threshold.
///
/// Each target reports once after it starts being observed, then only when
/// its intersecting state flips.
///
/// ```rust
/// use kurbo::Rect;
/// use understory_intersection::{GeometricDetector, IntersectionDetector, LayoutDetector, RootMargin};
///
/// let mut detector = GeometricDetector::new(RootMargin::ZERO, 1.0);
/// detector.observe(&1_u32);
/// detector.observe(&2_u32);
///
/// let layout = |e: &u32| Some(Rect::new(0.0, f64::from(*e - 1) * 100.0, 100.0, f64::from(*e) * 100.0));
/// let entries = detector.compute(Rect::new(0.0, 0.0, 100.0, 100.0), &layout);
///
/// assert!(entries[0].is_intersecting);
/// assert!(!entries[1].is_intersecting);
/// // Nothing changed, nothing to report.
/// assert!(detector.compute(Rect::new(0.0, 0.0, 100.0, 100.0), &layout).is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct GeometricDetector<E> {
    root_margin: RootMargin,
    threshold: f64,
    observed: Vec<(E, Option<bool>)>,
    connected: bool,
}

impl<E: Clone + PartialEq> GeometricDetector<E> {
    /// Creates a detector with the given margin and threshold.
    #[must_use]
    pub fn new(root_margin: RootMargin, threshold: f64) -> Self {
        Self {
            root_margin,
            threshold: normalize_threshold(threshold),
            observed: Vec::new(),
            connected: true,
        }
    }

    /// Returns the observed targets in observation order.
    pub fn observed(&self) -> impl Iterator<Item = &E> + '_ {
        self.observed.iter().map(|(e, _)| e)
    }

    /// Returns `false` once [`IntersectionDetector::disconnect`] was called.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Visible fraction of `target` inside `root`.
    fn ratio(root: Rect, target: Rect) -> f64 {
        let area = target.area();
        if area <= 0.0 {
            let inside = target.x0 >= root.x0
                && target.x1 <= root.x1
                && target.y0 >= root.y0
                && target.y1 <= root.y1;
            return if inside { 1.0 } else { 0.0 };
        }
        let visible = root.intersect(target);
        if visible.width() <= 0.0 || visible.height() <= 0.0 {
            return 0.0;
        }
        (visible.area() / area).clamp(0.0, 1.0)
    }

    fn intersects(&self, ratio: f64) -> bool {
        if self.threshold <= 0.0 {
            ratio > 0.0
        } else {
            // Rounding in the area division must not push a fully visible
            // target below a threshold of 1.
            ratio + 1e-9 >= self.threshold
        }
    }
}

impl<E: Clone + PartialEq> IntersectionDetector<E> for GeometricDetector<E> {
    fn observe(&mut self, target: &E) {
        if !self.connected || self.observed.iter().any(|(e, _)| e == target) {
            return;
        }
        self.observed.push((target.clone(), None));
    }

    fn unobserve(&mut self, target: &E) {
        self.observed.retain(|(e, _)| e != target);
    }

    fn disconnect(&mut self) {
        self.observed.clear();
        self.connected = false;
    }
}

impl<E: Clone + PartialEq> LayoutDetector<E> for GeometricDetector<E> {
    fn compute(
        &mut self,
        root_bounds: Rect,
        layout: &dyn Fn(&E) -> Option<Rect>,
    ) -> Vec<IntersectionEntry<E>> {
        let root = self.root_margin.apply(root_bounds);
        let mut entries = Vec::new();
        for index in 0..self.observed.len() {
            let target = &self.observed[index].0;
            let Some(bounds) = layout(target) else {
                continue;
            };
            let ratio = Self::ratio(root, bounds);
            let is_intersecting = self.intersects(ratio);
            let (target, last) = &mut self.observed[index];
            if *last == Some(is_intersecting) {
                continue;
            }
            *last = Some(is_intersecting);
            entries.push(IntersectionEntry {
                target: target.clone(),
                is_intersecting,
                intersection_ratio: ratio,
            });
        }
        entries
    }
}
