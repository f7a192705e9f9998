// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scrolling capability a controller drives.

use understory_intersection::RootSelection;

use crate::gesture::Direction;

/// How a scroll into view animates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScrollBehavior {
    /// Animate to the target.
    #[default]
    Smooth,
    /// Jump to the target.
    Instant,
}

/// Platform scrolling, implemented by the host.
pub trait ScrollHost<E> {
    /// Scrolls `element` into view within its scroll container.
    fn scroll_into_view(&mut self, element: &E, behavior: ScrollBehavior);

    /// Returns `true` if `root` cannot scroll any further in `direction`.
    ///
    /// For [`Direction::Up`] this is a scroll offset of zero; for
    /// [`Direction::Down`] an offset at the end of the scrollable range.
    fn is_at_edge(&self, root: &RootSelection<E>, direction: Direction) -> bool;
}
