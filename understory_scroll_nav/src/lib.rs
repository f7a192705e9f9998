// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_scroll_nav --heading-base-level=0

//! Understory Scroll Nav: gesture-driven, throttled scroll navigation.
//!
//! A [`ScrollController`] turns wheel and touch gestures on a scroll
//! container into "scroll target N into view" commands, one target per
//! gesture. It is the state behind full-page section scrolling, carousels,
//! and slide decks:
//!
//! - Visibility entries from a shared
//!   [`ObserverCache`](understory_intersection::ObserverCache) track which
//!   target is active.
//! - Gestures are classified into [`Direction`]s. Touch moves only count once
//!   they travel [`TOUCH_SWIPE_THRESHOLD`].
//! - An accepted gesture schedules the scroll after a delay and ignores
//!   further gestures for a throttle window.
//! - A [`BeforeScroll`] hook can redirect navigation.
//!
//! The controller never reads a clock or touches the platform. Gestures
//! carry host timestamps, [`ScrollController::poll`] fires due timers, and
//! scrolling goes through the host's [`ScrollHost`].
//!
//! ## Minimal example
//!
//! ```rust
//! use kurbo::Vec2;
//! use understory_intersection::{GeometricBackend, ObserverCache, RootSelection, VisibilityCallbacks};
//! use understory_scroll_nav::{
//!     Direction, Gesture, Navigation, ScrollBehavior, ScrollController, ScrollHost, ScrollOptions,
//! };
//!
//! #[derive(Default)]
//! struct Host {
//!     scrolled: Vec<u32>,
//! }
//!
//! impl ScrollHost<u32> for Host {
//!     fn scroll_into_view(&mut self, element: &u32, _: ScrollBehavior) {
//!         self.scrolled.push(*element);
//!     }
//!     fn is_at_edge(&self, _: &RootSelection<u32>, _: Direction) -> bool {
//!         false
//!     }
//! }
//!
//! let cache = ObserverCache::new(GeometricBackend);
//! let mut nav = ScrollController::new(cache, ScrollOptions::default(), VisibilityCallbacks::new());
//! nav.set_root(Some(RootSelection::Explicit(0_u32)));
//! nav.set_target("intro", Some(1));
//! nav.set_target("details", Some(2));
//!
//! let mut host = Host::default();
//! let response = nav.handle_gesture(0, Gesture::Wheel { delta: Vec2::new(0.0, 3.0) }, &host);
//! assert_eq!(response.navigation, Navigation::Scheduled { index: 0, direction: Direction::Down });
//! assert!(response.prevent_default);
//!
//! // The host wakes up at the next deadline.
//! assert_eq!(nav.next_deadline(), Some(200));
//! nav.poll(200, &mut host);
//! assert_eq!(host.scrolled, [1]);
//! ```
//!
//! ## Features
//!
//! - `std` (default): forwards to `kurbo/std` and the Understory dependencies.
//! - `libm`: forwards to `kurbo/libm` for `no_std` float math.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod controller;
mod gesture;
mod host;

pub use controller::{BeforeScroll, GestureResponse, Navigation, ScrollController, ScrollOptions};
pub use gesture::{Axes, Axis, Direction, Gesture, PointerButton, TOUCH_SWIPE_THRESHOLD};
pub use host::{ScrollBehavior, ScrollHost};
