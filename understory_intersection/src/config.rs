// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observer configuration: root selection, root margin, and threshold.

use core::fmt;
use core::str::FromStr;

use kurbo::{Insets, Rect};

/// The viewport an observer measures intersections against.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RootSelection<E> {
    /// An explicit scroll container.
    Explicit(E),
    /// The host's top-level viewport (the document in a browser).
    ///
    /// Observers rooted here are shared ambient state: no single consumer
    /// owns them, so they are never torn down implicitly.
    DefaultViewport,
}

impl<E> Default for RootSelection<E> {
    fn default() -> Self {
        Self::DefaultViewport
    }
}

impl<E> RootSelection<E> {
    /// Returns `true` for [`RootSelection::DefaultViewport`].
    #[must_use]
    pub fn is_default_viewport(&self) -> bool {
        matches!(self, Self::DefaultViewport)
    }

    /// Returns the explicit root element, if any.
    #[must_use]
    pub fn element(&self) -> Option<&E> {
        match self {
            Self::Explicit(e) => Some(e),
            Self::DefaultViewport => None,
        }
    }
}

impl<E> From<Option<E>> for RootSelection<E> {
    fn from(root: Option<E>) -> Self {
        root.map_or(Self::DefaultViewport, Self::Explicit)
    }
}

/// A single margin length.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Length {
    /// Absolute length in the root's coordinate units.
    Px(f64),
    /// Percentage of the root's extent along the margin's axis.
    Percent(f64),
}

impl Length {
    /// Resolves the length against the root's extent along its axis.
    #[must_use]
    pub fn resolve(self, extent: f64) -> f64 {
        match self {
            Self::Px(v) => v,
            Self::Percent(p) => extent * p / 100.0,
        }
    }
}

impl Default for Length {
    fn default() -> Self {
        Self::Px(0.0)
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(v) => write!(f, "{v}px"),
            Self::Percent(p) => write!(f, "{p}%"),
        }
    }
}

impl FromStr for Length {
    type Err = RootMarginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (number, make): (&str, fn(f64) -> Self) = if let Some(n) = s.strip_suffix("px") {
            (n, Self::Px)
        } else if let Some(n) = s.strip_suffix('%') {
            (n, Self::Percent)
        } else {
            (s, Self::Px)
        };
        let value: f64 = number
            .parse()
            .map_err(|_| RootMarginError::InvalidLength)?;
        // Unitless lengths are only valid for zero, as in CSS.
        if number.len() == s.len() && value != 0.0 {
            return Err(RootMarginError::MissingUnit);
        }
        if !value.is_finite() {
            return Err(RootMarginError::InvalidLength);
        }
        Ok(make(value))
    }
}

/// Error returned when parsing a [`RootMargin`] from text.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RootMarginError {
    /// The input contained no lengths.
    Empty,
    /// More than four lengths were given.
    TooManyValues(usize),
    /// A length was not a finite number followed by `px` or `%`.
    InvalidLength,
    /// A non-zero length had no unit.
    MissingUnit,
}

impl fmt::Display for RootMarginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("root margin is empty"),
            Self::TooManyValues(n) => {
                write!(f, "root margin takes at most 4 lengths, found {n}")
            }
            Self::InvalidLength => f.write_str("root margin length must be a number in px or %"),
            Self::MissingUnit => f.write_str("non-zero root margin length requires a unit"),
        }
    }
}

impl core::error::Error for RootMarginError {}

/// Growth (or, with negative lengths, shrinkage) applied to the root bounds
/// before intersections are computed.
///
/// Parses the CSS margin shorthand with one to four lengths:
///
/// ```rust
/// use understory_intersection::{Length, RootMargin};
///
/// let margin: RootMargin = "10px 5%".parse().unwrap();
/// assert_eq!(margin.top, Length::Px(10.0));
/// assert_eq!(margin.right, Length::Percent(5.0));
/// assert_eq!(margin.bottom, Length::Px(10.0));
/// assert_eq!(margin.left, Length::Percent(5.0));
///
/// assert!("10".parse::<RootMargin>().is_err());
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct RootMargin {
    /// Margin above the root.
    pub top: Length,
    /// Margin right of the root.
    pub right: Length,
    /// Margin below the root.
    pub bottom: Length,
    /// Margin left of the root.
    pub left: Length,
}

impl RootMargin {
    /// A zero margin.
    pub const ZERO: Self = Self::uniform(Length::Px(0.0));

    /// The same length on all four sides.
    #[must_use]
    pub const fn uniform(length: Length) -> Self {
        Self {
            top: length,
            right: length,
            bottom: length,
            left: length,
        }
    }

    /// Returns `root` grown by this margin.
    ///
    /// Percentages resolve against the root's width (left/right) or height
    /// (top/bottom).
    #[must_use]
    pub fn apply(&self, root: Rect) -> Rect {
        let (w, h) = (root.width(), root.height());
        root + Insets::new(
            self.left.resolve(w),
            self.top.resolve(h),
            self.right.resolve(w),
            self.bottom.resolve(h),
        )
    }
}

impl FromStr for RootMargin {
    type Err = RootMarginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lengths = [Length::default(); 4];
        let mut count = 0;
        for token in s.split_ascii_whitespace() {
            if count < 4 {
                lengths[count] = token.parse()?;
            }
            count += 1;
        }
        let [a, b, c, d] = lengths;
        let (top, right, bottom, left) = match count {
            0 => return Err(RootMarginError::Empty),
            1 => (a, a, a, a),
            2 => (a, b, a, b),
            3 => (a, b, c, b),
            4 => (a, b, c, d),
            n => return Err(RootMarginError::TooManyValues(n)),
        };
        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

/// Maps a threshold into `0.0..=1.0`, treating NaN as `0.0`.
pub(crate) fn normalize_threshold(threshold: f64) -> f64 {
    if threshold.is_nan() {
        0.0
    } else {
        threshold.clamp(0.0, 1.0)
    }
}

/// The identity of a shared observer.
///
/// Two configurations are equivalent iff their roots and margins are equal
/// and their thresholds are equal once normalized into `0.0..=1.0`; the
/// [`ObserverCache`](crate::ObserverCache) keeps at most one live observer
/// per equivalent configuration.
#[derive(Clone, Debug)]
pub struct ObserverConfig<E> {
    /// The viewport intersections are measured against.
    pub root: RootSelection<E>,
    /// Margin applied to the root bounds.
    pub root_margin: RootMargin,
    /// Visible fraction of a target at which it counts as intersecting.
    pub threshold: f64,
}

impl<E: PartialEq> PartialEq for ObserverConfig<E> {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
            && self.root_margin == other.root_margin
            && normalize_threshold(self.threshold) == normalize_threshold(other.threshold)
    }
}

impl<E> ObserverConfig<E> {
    /// Creates a configuration with a zero margin and zero threshold.
    #[must_use]
    pub fn new(root: RootSelection<E>) -> Self {
        Self {
            root,
            root_margin: RootMargin::ZERO,
            threshold: 0.0,
        }
    }

    /// Sets the root margin.
    #[must_use]
    pub fn with_root_margin(mut self, root_margin: RootMargin) -> Self {
        self.root_margin = root_margin;
        self
    }

    /// Sets the threshold, clamped to `0.0..=1.0`. NaN becomes `0.0`.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = normalize_threshold(threshold);
        self
    }
}
