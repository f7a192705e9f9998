// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Swipe state helper: measure touch travel from the point where a touch began.
//!
//! ## Usage
//!
//! 1) Start tracking with [`SwipeState::start`] on touch start.
//! 2) On each touch move, call [`SwipeState::travel`] to get how far the
//!    content was pushed, and [`SwipeState::exceeds`] to tell an intentional
//!    swipe from a tap.
//! 3) Optionally call [`SwipeState::update`] to get the delta since the last move.
//! 4) End tracking with [`SwipeState::end`] to reset state.
//!
//! ## Minimal example
//!
//! ```
//! use kurbo::Point;
//! use understory_pointer::swipe::SwipeState;
//!
//! let mut swipe = SwipeState::default();
//!
//! // Finger goes down at (100, 400)
//! swipe.start(Point::new(100.0, 400.0));
//! assert!(swipe.is_tracking());
//!
//! // Finger moves up by 200: content travels down by 200
//! let travel = swipe.travel(Point::new(100.0, 200.0)).unwrap();
//! assert_eq!(travel.y, 200.0);
//!
//! // Long enough to count as a swipe
//! assert!(swipe.exceeds(Point::new(100.0, 200.0), 150.0));
//! // A small wobble is a tap
//! assert!(!swipe.exceeds(Point::new(104.0, 395.0), 150.0));
//! ```

use kurbo::{Point, Vec2};

/// Travel (Manhattan distance) a touch must cover before it counts as a swipe.
pub const SWIPE_THRESHOLD: f64 = 150.0;

/// Tracks a touch from its starting point.
#[derive(Debug, Clone, Default, Copy)]
pub struct SwipeState {
    /// Position where the touch began
    pub start_pos: Option<Point>,
    /// Last recorded touch position
    pub last_pos: Option<Point>,
}

impl SwipeState {
    /// Start tracking a touch from the given position.
    pub fn start(&mut self, pos: Point) {
        self.start_pos = Some(pos);
        self.last_pos = Some(pos);
    }

    /// Record a new touch position, returning the movement delta since the last one.
    pub fn update(&mut self, pos: Point) -> Option<Vec2> {
        self.start_pos?;
        let delta = self.last_pos.map(|last| pos - last);
        self.last_pos = Some(pos);
        delta
    }

    /// Content travel from the start position: `start - current`.
    ///
    /// A finger moving up pushes content down, so the result points the way
    /// a scroll would go.
    pub fn travel(&self, current_pos: Point) -> Option<Vec2> {
        self.start_pos.map(|start_pos| start_pos - current_pos)
    }

    /// Manhattan length of [`SwipeState::travel`].
    pub fn distance(&self, current_pos: Point) -> Option<f64> {
        self.travel(current_pos).map(|v| v.x.abs() + v.y.abs())
    }

    /// Returns `true` if the touch traveled at least `threshold` from its start.
    ///
    /// Always `false` while not tracking.
    pub fn exceeds(&self, current_pos: Point, threshold: f64) -> bool {
        self.distance(current_pos).is_some_and(|d| d >= threshold)
    }

    /// End tracking and reset state.
    pub fn end(&mut self) {
        self.start_pos = None;
        self.last_pos = None;
    }

    /// Returns `true` while a touch is tracked
    pub fn is_tracking(&self) -> bool {
        self.start_pos.is_some()
    }
}
