// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gesture input and its classification into scroll directions.

use kurbo::{Point, Vec2};
use understory_pointer::swipe::SwipeState;

/// Travel (Manhattan distance) a touch must cover before it counts as a swipe.
pub use understory_pointer::swipe::SWIPE_THRESHOLD as TOUCH_SWIPE_THRESHOLD;

/// A gesture axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal.
    X,
    /// Vertical.
    Y,
}

bitflags::bitflags! {
    /// Gesture axes a controller honors.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Axes: u8 {
        /// Horizontal gestures.
        const X = 0b0000_0001;
        /// Vertical gestures.
        const Y = 0b0000_0010;
        /// Both axes.
        const BOTH = Self::X.bits() | Self::Y.bits();
    }
}

impl Default for Axes {
    fn default() -> Self {
        Self::Y
    }
}

impl From<Axis> for Axes {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::X => Self::X,
            Axis::Y => Self::Y,
        }
    }
}

/// Direction of a classified gesture, named after where the content goes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards the previous target on the vertical axis.
    Up,
    /// Towards the next target on the vertical axis.
    Down,
    /// Towards the previous target on the horizontal axis.
    Left,
    /// Towards the next target on the horizontal axis.
    Right,
}

impl Direction {
    /// Classifies a travel vector by its dominant axis.
    ///
    /// Ties go to the vertical axis. Returns `None` for a zero vector.
    #[must_use]
    pub fn from_travel(travel: Vec2) -> Option<Self> {
        if travel.x == 0.0 && travel.y == 0.0 {
            return None;
        }
        Some(if travel.x.abs() > travel.y.abs() {
            if travel.x > 0.0 { Self::Right } else { Self::Left }
        } else if travel.y > 0.0 {
            Self::Down
        } else {
            Self::Up
        })
    }

    /// Returns the axis this direction moves along.
    #[must_use]
    pub fn axis(self) -> Axis {
        match self {
            Self::Up | Self::Down => Axis::Y,
            Self::Left | Self::Right => Axis::X,
        }
    }

    /// Returns `true` for [`Direction::Down`] and [`Direction::Right`].
    #[must_use]
    pub fn is_forward(self) -> bool {
        matches!(self, Self::Down | Self::Right)
    }

    /// Index step: `1` forward, `-1` backward.
    #[must_use]
    pub fn step(self) -> isize {
        if self.is_forward() { 1 } else { -1 }
    }
}

/// A pointer button.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Usually the left button.
    Primary,
    /// Usually the wheel button.
    Middle,
    /// Usually the right button.
    Secondary,
    /// Any other button, by platform index.
    Other(u16),
}

/// Raw input forwarded to a [`ScrollController`](crate::ScrollController).
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Gesture {
    /// A wheel event, with its scroll delta.
    Wheel {
        /// Scroll delta; positive `y` scrolls down.
        delta: Vec2,
    },
    /// A touch began.
    TouchStart {
        /// Touch position in client coordinates.
        point: Point,
    },
    /// A touch moved.
    TouchMove {
        /// Touch position in client coordinates.
        point: Point,
    },
    /// A touch ended or was cancelled.
    TouchEnd,
    /// A pointer button was pressed.
    PointerDown {
        /// The pressed button.
        button: PointerButton,
    },
    /// A pointer button was released.
    PointerUp,
}

/// A navigation gesture after classification.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Classified {
    /// Movement too small to mean anything.
    Static,
    /// Movement in a direction.
    Moved(Direction),
}

/// Classifies a wheel delta.
pub(crate) fn classify_wheel(delta: Vec2) -> Classified {
    Direction::from_travel(delta).map_or(Classified::Static, Classified::Moved)
}

/// Classifies a touch move against the tracked touch start.
pub(crate) fn classify_touch(swipe: &SwipeState, point: Point) -> Classified {
    if !swipe.exceeds(point, TOUCH_SWIPE_THRESHOLD) {
        return Classified::Static;
    }
    swipe
        .travel(point)
        .and_then(Direction::from_travel)
        .map_or(Classified::Static, Classified::Moved)
}
