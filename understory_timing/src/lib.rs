// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_timing --heading-base-level=0

//! Understory Timing: host-agnostic timer queue primitives for UI runtimes.
//!
//! UI controllers frequently need "do this in 200ms" or "ignore input until
//! the next second" without owning a clock or an event loop. This crate keeps
//! the bookkeeping for those deferred actions while the host keeps the clock:
//!
//! - [`TimerQueue`]: cancellable one-shot timers keyed by a [`TimerId`], fired
//!   in deadline order when the host calls [`TimerQueue::pop_due`].
//! - [`FrameSlot`]: a single pending "next frame" request that coalesces
//!   repeated requests made before the frame runs.
//!
//! Timestamps are plain `u64` milliseconds from any monotonic origin the host
//! chooses. Nothing here reads a clock.
//!
//! ## Minimal example
//!
//! ```rust
//! use understory_timing::TimerQueue;
//!
//! let mut timers = TimerQueue::new();
//! let scroll = timers.schedule_after(1_000, 200, "scroll");
//! timers.schedule_after(1_000, 1_000, "release");
//!
//! // The host arms one real timer for the earliest deadline.
//! assert_eq!(timers.next_deadline(), Some(1_200));
//!
//! // Nothing is due yet.
//! assert!(timers.pop_due(1_100).is_none());
//!
//! let fired = timers.pop_due(1_250).unwrap();
//! assert_eq!(fired.id, scroll);
//! assert_eq!(fired.payload, "scroll");
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod frame;
mod queue;

pub use frame::FrameSlot;
pub use queue::{Expired, TimerId, TimerQueue};
