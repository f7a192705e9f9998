// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_intersection --heading-base-level=0

//! Understory Intersection: shared visibility observers for UI.
//!
//! Many components on one screen want to know when some element scrolls into
//! or out of view. Creating one intersection detector per component is
//! wasteful; this crate keeps at most one detector per distinct
//! configuration and routes each report to exactly the callbacks registered
//! for the reported element.
//!
//! ## Pieces
//!
//! - [`ObserverConfig`]: the identity of a shared observer, made of a
//!   [`RootSelection`], a [`RootMargin`], and a threshold.
//! - [`IntersectionDetector`] / [`IntersectionBackend`]: the platform
//!   capability the cache drives. A browser host wraps `IntersectionObserver`
//!   here; headless hosts use [`GeometricBackend`], which computes entries
//!   from rectangles.
//! - [`ObserverCache`]: the shared registry. A cheap cloneable handle that is
//!   injected wherever observers should be shared.
//! - [`VisibilityBinding`]: the per-component layer. It tracks one root and a
//!   set of keyed targets, attaches to the right shared observer, and keeps
//!   registrations consistent as root, targets, and options change.
//!
//! ## Minimal example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use kurbo::Rect;
//! use understory_intersection::{
//!     GeometricBackend, ObserverCache, RootSelection, VisibilityBinding, VisibilityCallbacks,
//!     VisibilityOptions,
//! };
//!
//! let cache = ObserverCache::new(GeometricBackend);
//! let events = Rc::new(RefCell::new(Vec::new()));
//!
//! let (enter, exit) = (events.clone(), events.clone());
//! let callbacks = VisibilityCallbacks::new()
//!     .on_enter(move |e| enter.borrow_mut().push((e.target, true)))
//!     .on_exit(move |e| exit.borrow_mut().push((e.target, false)));
//!
//! let mut binding = VisibilityBinding::new(
//!     cache.clone(),
//!     VisibilityOptions { threshold: 1.0, ..VisibilityOptions::default() },
//!     callbacks,
//! );
//! binding.set_root(Some(RootSelection::Explicit(0_u32)));
//! binding.set_target(0, Some(1));
//! binding.set_target(1, Some(2));
//!
//! // Element 0 is a 100x100 scroll container; its children stack vertically.
//! let mut scroll_y = 0.0;
//! let layout = |scroll_y: f64| {
//!     move |e: &u32| match e {
//!         0 => Some(Rect::new(0.0, 0.0, 100.0, 100.0)),
//!         n => {
//!             let y = f64::from(n - 1) * 100.0 - scroll_y;
//!             Some(Rect::new(0.0, y, 100.0, y + 100.0))
//!         }
//!     }
//! };
//! let viewport = Rect::new(0.0, 0.0, 800.0, 600.0);
//!
//! cache.update_layout(viewport, layout(scroll_y));
//! assert_eq!(*events.borrow(), [(1, true), (2, false)]);
//!
//! scroll_y = 100.0;
//! events.borrow_mut().clear();
//! cache.update_layout(viewport, layout(scroll_y));
//! assert_eq!(*events.borrow(), [(1, false), (2, true)]);
//! ```
//!
//! ## Ownership of shared observers
//!
//! Observers rooted at [`RootSelection::DefaultViewport`] are shared ambient
//! state and are never disconnected implicitly: releasing one only unobserves
//! the releasing consumer's elements. Observers with an explicit root are
//! disconnected once their last consumer releases them.
//!
//! ## Features
//!
//! - `std` (default): forwards to `kurbo/std`.
//! - `libm`: forwards to `kurbo/libm` for `no_std` float math.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod binding;
mod cache;
mod config;
mod detector;
mod geometry;

pub use binding::{VisibilityBinding, VisibilityCallbacks, VisibilityOptions};
pub use cache::{EntryCallback, Listener, ListenerId, ObserverCache, ObserverId, Release};
pub use config::{Length, ObserverConfig, RootMargin, RootMarginError, RootSelection};
pub use detector::{IntersectionBackend, IntersectionDetector, IntersectionEntry, LayoutDetector};
pub use geometry::{GeometricBackend, GeometricDetector};
