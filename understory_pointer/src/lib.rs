// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_pointer --heading-base-level=0

//! Understory Pointer: pointer state managers for UI interactions.
//!
//! This crate provides small state machines for pointer input that must be
//! tracked across several events:
//!
//! - [`position`]: Track the pointer in a target's local coordinate space
//!   (for example an SVG `viewBox`), reading layout at most once per frame.
//! - [`swipe`]: Measure touch travel from the touch start to tell swipes
//!   from taps.
//!
//! Neither manager owns an event loop or reads layout on its own. The host
//! forwards raw pointer coordinates, schedules frames when asked to, and
//! supplies layout through [`position::PointerSurface`].
//!
//! ## Position Tracking
//!
//! ```rust
//! use kurbo::{Point, Rect, Vec2};
//! use understory_pointer::position::{
//!     FrameRequest, PointerPositionTracker, PointerSurface, PositionOptions,
//! };
//!
//! struct Icon;
//!
//! impl PointerSurface for Icon {
//!     fn bounding_rect(&self) -> Rect { Rect::new(0.0, 0.0, 48.0, 48.0) }
//!     fn view_box(&self) -> Rect { Rect::new(0.0, 0.0, 24.0, 24.0) }
//!     fn scroll_offset(&self) -> Vec2 { Vec2::ZERO }
//! }
//!
//! let mut tracker = PointerPositionTracker::new(PositionOptions::default());
//! tracker.attach_target();
//!
//! if tracker.on_pointer_move(Point::new(12.0, 36.0)) == FrameRequest::Requested {
//!     // ...later, from the host's animation frame:
//!     assert_eq!(tracker.on_frame(&Icon), Some(Point::new(6.0, 18.0)));
//! }
//! ```
//!
//! ## Swipes
//!
//! ```rust
//! use kurbo::Point;
//! use understory_pointer::swipe::{SWIPE_THRESHOLD, SwipeState};
//!
//! let mut swipe = SwipeState::default();
//! swipe.start(Point::new(200.0, 600.0));
//!
//! let current = Point::new(210.0, 380.0);
//! assert!(swipe.exceeds(current, SWIPE_THRESHOLD));
//! // Content moves opposite to the finger.
//! assert_eq!(swipe.travel(current).unwrap().y, 220.0);
//! ```
//!
//! ## Features
//!
//! - `std` (default): forwards to `kurbo/std`.
//! - `libm`: forwards to `kurbo/libm` for `no_std` float math.
//!
//! This crate is `no_std` compatible.

#![no_std]

pub mod position;
pub mod swipe;
