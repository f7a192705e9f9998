// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer position tracking in a target's local coordinate space.
//!
//! ## Usage
//!
//! 1) Attach the target (and, with [`PositionOptions::has_root`], the root
//!    that receives pointer moves) with [`PointerPositionTracker::attach_target`]
//!    and [`PointerPositionTracker::attach_root`].
//! 2) Forward every pointer move to [`PointerPositionTracker::on_pointer_move`].
//!    When it returns [`FrameRequest::Requested`], schedule one animation frame.
//! 3) From that frame, call [`PointerPositionTracker::on_frame`] with the
//!    target's [`PointerSurface`]. This is the only place layout is read.
//!
//! Moves that arrive while a frame is pending are dropped, so a burst of
//! events within one frame costs a single layout read.
//!
//! ## Minimal example
//!
//! ```
//! use kurbo::{Point, Rect, Vec2};
//! use understory_pointer::position::{
//!     FrameRequest, PointerPositionTracker, PointerSurface, PositionOptions,
//! };
//!
//! struct Chart;
//!
//! impl PointerSurface for Chart {
//!     // 200x100 on screen, drawn with a 0 0 100 50 view box.
//!     fn bounding_rect(&self) -> Rect { Rect::new(20.0, 10.0, 220.0, 110.0) }
//!     fn view_box(&self) -> Rect { Rect::new(0.0, 0.0, 100.0, 50.0) }
//!     fn scroll_offset(&self) -> Vec2 { Vec2::ZERO }
//! }
//!
//! let mut tracker = PointerPositionTracker::new(PositionOptions::default());
//! tracker.attach_target();
//!
//! assert_eq!(tracker.on_pointer_move(Point::new(120.0, 60.0)), FrameRequest::Requested);
//! assert_eq!(tracker.on_pointer_move(Point::new(121.0, 61.0)), FrameRequest::Coalesced);
//!
//! assert_eq!(tracker.on_frame(&Chart), Some(Point::new(50.0, 25.0)));
//! assert_eq!(tracker.position(), Point::new(50.0, 25.0));
//! ```

use kurbo::{Point, Rect, Vec2};
use understory_timing::FrameSlot;

/// Layout reads performed once per frame.
pub trait PointerSurface {
    /// The target's bounding box in client coordinates.
    fn bounding_rect(&self) -> Rect;

    /// The target's declared local coordinate extent (an SVG `viewBox`).
    ///
    /// Hosts without one return the bounding box size at the origin.
    fn view_box(&self) -> Rect;

    /// The page scroll offset, used for fixed-position targets.
    fn scroll_offset(&self) -> Vec2;
}

/// Options for [`PointerPositionTracker`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionOptions {
    /// Listen for moves on a separately attached root instead of the target.
    pub has_root: bool,
    /// Position reported before the first frame.
    pub initial: Point,
    /// The target is fixed-position: its origin is shifted by the page scroll offset.
    pub is_fixed: bool,
    /// Number of decimal digits kept in reported positions.
    pub precision: u8,
    /// Scale of the effective target box about its center.
    ///
    /// `1.0` is the bounding box itself; larger values track the pointer
    /// beyond the target's edges.
    pub threshold: f64,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            has_root: false,
            initial: Point::ZERO,
            is_fixed: false,
            precision: 2,
            threshold: 1.0,
        }
    }
}

/// Outcome of [`PointerPositionTracker::on_pointer_move`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameRequest {
    /// A read is now pending; the host schedules a frame.
    Requested,
    /// A read was already pending; this move is dropped.
    Coalesced,
    /// Not listening; the move is dropped.
    Ignored,
}

/// Tracks the pointer in a target's local coordinates with batched layout reads.
#[derive(Clone, Debug)]
pub struct PointerPositionTracker {
    options: PositionOptions,
    position: Point,
    target_attached: bool,
    root_attached: bool,
    frame: FrameSlot<Point>,
}

impl PointerPositionTracker {
    /// Creates a detached tracker reporting `options.initial`.
    #[must_use]
    pub fn new(options: PositionOptions) -> Self {
        Self {
            options,
            position: options.initial,
            target_attached: false,
            root_attached: false,
            frame: FrameSlot::default(),
        }
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &PositionOptions {
        &self.options
    }

    /// Replaces the options, keeping the last reported position.
    ///
    /// Returns `true` if a pending frame was cancelled because the tracker
    /// stopped listening.
    pub fn set_options(&mut self, options: PositionOptions) -> bool {
        self.options = options;
        self.cancel_if_idle()
    }

    /// Returns the last reported position.
    #[must_use]
    pub fn position(&self) -> Point {
        self.position
    }

    /// Returns `true` when pointer moves are being tracked.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.target_attached && (!self.options.has_root || self.root_attached)
    }

    /// Returns `true` while a frame read is pending.
    #[must_use]
    pub fn is_frame_pending(&self) -> bool {
        self.frame.is_pending()
    }

    /// Marks the target as attached.
    pub fn attach_target(&mut self) {
        self.target_attached = true;
    }

    /// Marks the target as detached.
    ///
    /// Returns `true` if the host must cancel the frame it scheduled.
    pub fn detach_target(&mut self) -> bool {
        self.target_attached = false;
        self.cancel_if_idle()
    }

    /// Marks the root as attached.
    pub fn attach_root(&mut self) {
        self.root_attached = true;
    }

    /// Marks the root as detached.
    ///
    /// Returns `true` if the host must cancel the frame it scheduled.
    pub fn detach_root(&mut self) -> bool {
        self.root_attached = false;
        self.cancel_if_idle()
    }

    /// Records a pointer move at `client` coordinates.
    pub fn on_pointer_move(&mut self, client: Point) -> FrameRequest {
        if !self.is_listening() {
            return FrameRequest::Ignored;
        }
        if self.frame.request(client) {
            FrameRequest::Requested
        } else {
            FrameRequest::Coalesced
        }
    }

    /// Performs the pending layout read.
    ///
    /// Returns the new position if the pointer lies inside the
    /// threshold-scaled target box, and `None` otherwise (including when no
    /// read was pending). The position is rounded to
    /// [`PositionOptions::precision`] digits.
    pub fn on_frame<S: PointerSurface + ?Sized>(&mut self, surface: &S) -> Option<Point> {
        let client = self.frame.take()?;
        let rect = surface.bounding_rect();
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return None;
        }
        let zone = Rect::from_center_size(rect.center(), rect.size() * self.options.threshold);
        if !zone.contains(client) {
            return None;
        }
        let origin = if self.options.is_fixed {
            rect.origin() - surface.scroll_offset()
        } else {
            rect.origin()
        };
        let view_box = surface.view_box();
        let offset = client - origin;
        let local = Point::new(
            offset.x / rect.width() * view_box.width() + view_box.x0,
            offset.y / rect.height() * view_box.height() + view_box.y0,
        );
        self.position = round_to(local, self.options.precision);
        Some(self.position)
    }

    fn cancel_if_idle(&mut self) -> bool {
        !self.is_listening() && self.frame.cancel()
    }
}

fn round_to(point: Point, precision: u8) -> Point {
    let scale = (0..precision).fold(1.0, |scale, _| scale * 10.0);
    let rounded = Point::new(point.x * scale, point.y * scale).round();
    Point::new(rounded.x / scale, rounded.y / scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Surface {
        rect: Rect,
        view_box: Rect,
        scroll: Vec2,
    }

    impl PointerSurface for Surface {
        fn bounding_rect(&self) -> Rect {
            self.rect
        }

        fn view_box(&self) -> Rect {
            self.view_box
        }

        fn scroll_offset(&self) -> Vec2 {
            self.scroll
        }
    }

    fn surface() -> Surface {
        Surface {
            rect: Rect::new(0.0, 0.0, 300.0, 300.0),
            view_box: Rect::new(0.0, 0.0, 100.0, 100.0),
            scroll: Vec2::ZERO,
        }
    }

    fn attached(options: PositionOptions) -> PointerPositionTracker {
        let mut tracker = PointerPositionTracker::new(options);
        tracker.attach_target();
        tracker
    }

    #[test]
    fn reports_initial_position_until_first_frame() {
        let tracker = PointerPositionTracker::new(PositionOptions {
            initial: Point::new(5.0, 6.0),
            ..PositionOptions::default()
        });
        assert_eq!(tracker.position(), Point::new(5.0, 6.0));
        assert!(!tracker.is_listening());
    }

    #[test]
    fn moves_are_ignored_while_detached() {
        let mut tracker = PointerPositionTracker::new(PositionOptions::default());
        assert_eq!(tracker.on_pointer_move(Point::new(1.0, 1.0)), FrameRequest::Ignored);
        assert_eq!(tracker.on_frame(&surface()), None);
    }

    #[test]
    fn one_read_per_frame_uses_first_move() {
        let mut tracker = attached(PositionOptions::default());
        assert_eq!(tracker.on_pointer_move(Point::new(150.0, 30.0)), FrameRequest::Requested);
        assert_eq!(tracker.on_pointer_move(Point::new(10.0, 10.0)), FrameRequest::Coalesced);

        assert_eq!(tracker.on_frame(&surface()), Some(Point::new(50.0, 10.0)));
        assert_eq!(tracker.on_frame(&surface()), None, "no read pending");
        assert_eq!(tracker.on_pointer_move(Point::new(10.0, 10.0)), FrameRequest::Requested);
    }

    #[test]
    fn rounds_to_precision() {
        let mut tracker = attached(PositionOptions::default());
        tracker.on_pointer_move(Point::new(100.0, 200.0));
        // 100/3 and 200/3 view box units.
        assert_eq!(tracker.on_frame(&surface()), Some(Point::new(33.33, 66.67)));

        let mut coarse = attached(PositionOptions {
            precision: 0,
            ..PositionOptions::default()
        });
        coarse.on_pointer_move(Point::new(100.0, 200.0));
        assert_eq!(coarse.on_frame(&surface()), Some(Point::new(33.0, 67.0)));
    }

    #[test]
    fn view_box_origin_offsets_local_coordinates() {
        let mut tracker = attached(PositionOptions::default());
        let s = Surface {
            view_box: Rect::new(-50.0, 10.0, 50.0, 110.0),
            ..surface()
        };
        tracker.on_pointer_move(Point::new(150.0, 0.0));
        assert_eq!(tracker.on_frame(&s), Some(Point::new(0.0, 10.0)));
    }

    #[test]
    fn fixed_targets_shift_by_scroll_offset() {
        let mut tracker = attached(PositionOptions {
            is_fixed: true,
            ..PositionOptions::default()
        });
        let s = Surface {
            scroll: Vec2::new(0.0, 30.0),
            ..surface()
        };
        tracker.on_pointer_move(Point::new(0.0, 0.0));
        assert_eq!(tracker.on_frame(&s), Some(Point::new(0.0, 10.0)));
    }

    #[test]
    fn threshold_scales_tracking_zone() {
        let outside = Point::new(320.0, 150.0);

        let mut exact = attached(PositionOptions::default());
        exact.on_pointer_move(outside);
        assert_eq!(exact.on_frame(&surface()), None);
        assert_eq!(exact.position(), Point::ZERO, "position kept outside the zone");

        let mut wide = attached(PositionOptions {
            threshold: 1.5,
            ..PositionOptions::default()
        });
        wide.on_pointer_move(outside);
        assert_eq!(wide.on_frame(&surface()), Some(Point::new(106.67, 50.0)));

        let mut narrow = attached(PositionOptions {
            threshold: 0.5,
            ..PositionOptions::default()
        });
        narrow.on_pointer_move(Point::new(50.0, 150.0));
        assert_eq!(narrow.on_frame(&surface()), None);
    }

    #[test]
    fn root_is_required_when_configured() {
        let mut tracker = attached(PositionOptions {
            has_root: true,
            ..PositionOptions::default()
        });
        assert!(!tracker.is_listening());
        tracker.attach_root();
        assert!(tracker.is_listening());
    }

    #[test]
    fn detach_cancels_pending_frame() {
        let mut tracker = attached(PositionOptions::default());
        tracker.on_pointer_move(Point::new(1.0, 1.0));
        assert!(tracker.detach_target());
        assert!(!tracker.is_frame_pending());
        assert!(!tracker.detach_target(), "double detach is a no-op");
        assert_eq!(tracker.on_frame(&surface()), None);
    }

    #[test]
    fn detaching_unused_root_keeps_frame() {
        let mut tracker = attached(PositionOptions::default());
        tracker.on_pointer_move(Point::new(1.0, 1.0));
        assert!(!tracker.detach_root());
        assert!(tracker.is_frame_pending());
    }

    #[test]
    fn degenerate_target_reports_nothing() {
        let mut tracker = attached(PositionOptions::default());
        tracker.on_pointer_move(Point::new(0.0, 0.0));
        let s = Surface {
            rect: Rect::new(0.0, 0.0, 0.0, 100.0),
            ..surface()
        };
        assert_eq!(tracker.on_frame(&s), None);
    }
}
