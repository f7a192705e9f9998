// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gesture-driven, throttled navigation between scroll targets.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use core::hash::Hash;

use understory_intersection::{
    IntersectionBackend, IntersectionEntry, ObserverCache, RootMargin, RootSelection,
    VisibilityBinding, VisibilityCallbacks, VisibilityOptions,
};
use understory_pointer::swipe::SwipeState;
use understory_timing::TimerQueue;

use crate::gesture::{
    Axes, Classified, Direction, Gesture, PointerButton, classify_touch, classify_wheel,
};
use crate::host::{ScrollBehavior, ScrollHost};

/// Options for a [`ScrollController`].
#[derive(Clone, Debug, PartialEq)]
pub struct ScrollOptions {
    /// Milliseconds from an accepted gesture to the scroll into view.
    pub delay: u64,
    /// Milliseconds after an accepted gesture during which gestures are ignored.
    ///
    /// Counted from acceptance, independently of `delay`.
    pub wait: u64,
    /// Gesture axes that navigate.
    pub directions: Axes,
    /// Animation passed to [`ScrollHost::scroll_into_view`].
    pub behavior: ScrollBehavior,
    /// Visible fraction at which a target counts as entered.
    pub threshold: f64,
    /// Margin applied to the root when measuring visibility.
    pub root_margin: RootMargin,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self {
            delay: 200,
            wait: 1000,
            directions: Axes::Y,
            behavior: ScrollBehavior::Smooth,
            threshold: 1.0,
            root_margin: RootMargin::ZERO,
        }
    }
}

impl ScrollOptions {
    fn visibility(&self) -> VisibilityOptions {
        VisibilityOptions {
            root_margin: self.root_margin,
            threshold: self.threshold,
        }
    }
}

/// Policy hook run before navigating: `(next, current, direction)`.
///
/// `next` is the natural neighbor of `current`, clamped to `-1..=len`. An
/// in-range return value replaces it; `None` or an out-of-range value keeps
/// the natural neighbor.
pub type BeforeScroll = Box<dyn Fn(isize, isize, Direction) -> Option<isize>>;

/// What a gesture did to navigation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
    /// Not a navigation gesture, or not one the controller listens to.
    None,
    /// Ignored because a previous gesture is still being throttled.
    Throttled,
    /// A navigation gesture that moved too little to pick a direction.
    Static,
    /// A scroll to `index` was scheduled.
    Scheduled {
        /// Index of the target that will be scrolled into view.
        index: usize,
        /// Gesture direction.
        direction: Direction,
    },
    /// No target in that direction; the active index moved to a sentinel
    /// (`-1` or the target count) and native scrolling takes over.
    Released {
        /// The new active index.
        active: isize,
        /// Gesture direction.
        direction: Direction,
    },
    /// No target in that direction and the root cannot scroll further.
    AtEdge {
        /// Gesture direction.
        direction: Direction,
    },
}

/// The result of [`ScrollController::handle_gesture`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GestureResponse {
    /// What happened.
    pub navigation: Navigation,
    /// Whether the host must suppress the platform's default handling.
    pub prevent_default: bool,
}

impl GestureResponse {
    const fn pass(navigation: Navigation) -> Self {
        Self {
            navigation,
            prevent_default: false,
        }
    }

    const fn prevent(navigation: Navigation) -> Self {
        Self {
            navigation,
            prevent_default: true,
        }
    }
}

#[derive(Debug)]
enum ScrollTimer<E> {
    ScrollIntoView { element: E, index: usize },
    Release,
}

/// Navigation state shared with the visibility callbacks.
#[derive(Debug)]
struct NavState<E> {
    targets: Vec<E>,
    active: isize,
    prev: isize,
    next: Option<isize>,
    is_scrolling: bool,
}

impl<E: PartialEq> NavState<E> {
    fn new() -> Self {
        Self {
            targets: Vec::new(),
            active: -1,
            prev: -1,
            next: None,
            is_scrolling: false,
        }
    }

    fn len(&self) -> isize {
        isize::try_from(self.targets.len()).unwrap_or(isize::MAX)
    }

    fn index_of(&self, element: &E) -> Option<isize> {
        self.targets
            .iter()
            .position(|e| e == element)
            .and_then(|i| isize::try_from(i).ok())
    }

    /// Entries for targets strictly between `prev` and `next` are scroll
    /// animation noise while a scroll is in flight.
    fn suppresses(&self, index: isize) -> bool {
        let Some(next) = self.next.filter(|_| self.is_scrolling) else {
            return false;
        };
        let (lo, hi) = if self.prev < next {
            (self.prev, next)
        } else {
            (next, self.prev)
        };
        lo < index && index < hi
    }

    /// Applies an entry and returns whether it reaches the consumer.
    fn admit(nav: &Weak<RefCell<Self>>, target: &E, entering: bool) -> bool {
        let Some(nav) = nav.upgrade() else {
            return true;
        };
        let mut state = nav.borrow_mut();
        let Some(index) = state.index_of(target) else {
            return true;
        };
        if state.suppresses(index) {
            tracing::trace!(index, entering, "suppressed intermediate visibility entry");
            return false;
        }
        if entering {
            state.active = index;
        }
        true
    }
}

fn wrap_callbacks<E: PartialEq + 'static>(
    nav: &Rc<RefCell<NavState<E>>>,
    callbacks: &VisibilityCallbacks<E>,
) -> VisibilityCallbacks<E> {
    let enter_nav = Rc::downgrade(nav);
    let on_enter = callbacks.enter_callback().cloned();
    let mut wrapped = VisibilityCallbacks::new().on_enter(move |entry: &IntersectionEntry<E>| {
        if !NavState::admit(&enter_nav, &entry.target, true) {
            return;
        }
        if let Some(on_enter) = &on_enter {
            on_enter(entry);
        }
    });
    if let Some(on_exit) = callbacks.exit_callback().cloned() {
        let exit_nav = Rc::downgrade(nav);
        wrapped = wrapped.on_exit(move |entry: &IntersectionEntry<E>| {
            if NavState::admit(&exit_nav, &entry.target, false) {
                on_exit(entry);
            }
        });
    }
    wrapped
}

/// Turns wheel and touch gestures into "scroll target N into view" commands.
///
/// The controller owns a [`VisibilityBinding`] over an ordered list of
/// targets. Visibility entries keep track of the *active* target (the last
/// one that entered); gestures move to its neighbor:
///
/// 1. A gesture is accepted when a root and at least one target are
///    attached, no scroll is in flight, and its axis is in
///    [`ScrollOptions::directions`].
/// 2. The natural neighbor `active ± 1` is offered to the
///    [`BeforeScroll`] hook, which may pick another target.
/// 3. If a target resolves, it is scrolled into view after
///    [`ScrollOptions::delay`] and gestures are ignored until
///    [`ScrollOptions::wait`] elapses. Otherwise the active index moves to a
///    sentinel past the list, unless the root is already at its edge.
///
/// Time is supplied by the host: gestures carry a timestamp and
/// [`ScrollController::poll`] fires what is due.
///
/// While a scroll is in flight, visibility entries for targets strictly
/// between the previous and the pending target are not forwarded to the
/// consumer callbacks.
pub struct ScrollController<E, K, B>
where
    E: Clone + Eq + Hash + fmt::Debug,
    B: IntersectionBackend<E>,
{
    options: ScrollOptions,
    before_scroll: Option<BeforeScroll>,
    visibility: VisibilityBinding<E, K, B>,
    nav: Rc<RefCell<NavState<E>>>,
    timers: TimerQueue<ScrollTimer<E>>,
    swipe: SwipeState,
    pointer_down: bool,
}

impl<E, K, B> fmt::Debug for ScrollController<E, K, B>
where
    E: Clone + Eq + Hash + fmt::Debug,
    K: fmt::Debug,
    B: IntersectionBackend<E>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollController")
            .field("options", &self.options)
            .field("before_scroll", &self.before_scroll.is_some())
            .field("visibility", &self.visibility)
            .field("nav", &self.nav)
            .field("timers", &self.timers.len())
            .field("swipe", &self.swipe)
            .field("pointer_down", &self.pointer_down)
            .finish()
    }
}

impl<E, K, B> ScrollController<E, K, B>
where
    E: Clone + Eq + Hash + fmt::Debug + 'static,
    K: Clone + PartialEq,
    B: IntersectionBackend<E>,
{
    /// Creates a controller registering on `cache`.
    ///
    /// `callbacks` receive the visibility entries the controller does not
    /// suppress.
    pub fn new(
        cache: ObserverCache<E, B>,
        options: ScrollOptions,
        callbacks: VisibilityCallbacks<E>,
    ) -> Self {
        let nav = Rc::new(RefCell::new(NavState::new()));
        let wrapped = wrap_callbacks(&nav, &callbacks);
        let visibility = VisibilityBinding::new(cache, options.visibility(), wrapped);
        Self {
            options,
            before_scroll: None,
            visibility,
            nav,
            timers: TimerQueue::new(),
            swipe: SwipeState::default(),
            pointer_down: false,
        }
    }

    /// Sets the [`BeforeScroll`] hook.
    #[must_use]
    pub fn with_before_scroll(
        mut self,
        f: impl Fn(isize, isize, Direction) -> Option<isize> + 'static,
    ) -> Self {
        self.set_before_scroll(Some(Box::new(f)));
        self
    }

    /// Replaces (or with `None`, removes) the [`BeforeScroll`] hook.
    pub fn set_before_scroll(&mut self, f: Option<BeforeScroll>) {
        self.before_scroll = f;
    }

    /// Attaches (`Some`) or detaches (`None`) the scroll root.
    ///
    /// Any change of root cancels a scroll in flight without scrolling.
    /// Registered targets are kept across detachment.
    pub fn set_root(&mut self, root: Option<RootSelection<E>>) -> bool {
        let changed = self.visibility.set_root(root);
        if changed {
            self.cancel_pending();
            if !self.visibility.is_attached() {
                self.swipe.end();
                self.pointer_down = false;
            }
        }
        changed
    }

    /// Registers (`Some`) or unregisters (`None`) the target element for `id`.
    ///
    /// Targets are ordered by registration.
    pub fn set_target(&mut self, id: K, element: Option<E>) -> bool {
        let changed = self.visibility.set_target(id, element);
        if changed {
            let targets = self.visibility.targets().map(|(e, _)| e.clone()).collect();
            self.nav.borrow_mut().targets = targets;
        }
        changed
    }

    /// Replaces the options.
    ///
    /// A change cancels a scroll in flight. Visibility options that changed
    /// move the controller's targets to the matching shared observer.
    pub fn set_options(&mut self, options: ScrollOptions) -> bool {
        if self.options == options {
            return false;
        }
        let visibility = options.visibility();
        if visibility != self.options.visibility() {
            self.visibility.set_options(visibility);
        }
        self.options = options;
        self.cancel_pending();
        true
    }

    /// Handles one gesture at time `now` (milliseconds).
    ///
    /// `host` is consulted only when no target lies in the gesture's
    /// direction.
    pub fn handle_gesture<H>(&mut self, now: u64, gesture: Gesture, host: &H) -> GestureResponse
    where
        H: ScrollHost<E> + ?Sized,
    {
        match gesture {
            Gesture::PointerDown { button } => {
                self.pointer_down = true;
                // The middle button would start native autoscroll.
                GestureResponse {
                    navigation: Navigation::None,
                    prevent_default: button == PointerButton::Middle,
                }
            }
            Gesture::PointerUp => {
                self.pointer_down = false;
                GestureResponse::pass(Navigation::None)
            }
            Gesture::TouchStart { point } => {
                self.swipe.start(point);
                GestureResponse::pass(Navigation::None)
            }
            Gesture::TouchEnd => {
                self.swipe.end();
                GestureResponse::pass(Navigation::None)
            }
            Gesture::Wheel { delta } => self.navigate(now, classify_wheel(delta), false, host),
            Gesture::TouchMove { point } => {
                let classified = classify_touch(&self.swipe, point);
                self.navigate(now, classified, true, host)
            }
        }
    }

    /// Fires every timer due at `now`, returning how many fired.
    pub fn poll<H>(&mut self, now: u64, host: &mut H) -> usize
    where
        H: ScrollHost<E> + ?Sized,
    {
        let mut fired = 0;
        while let Some(expired) = self.timers.pop_due(now) {
            fired += 1;
            match expired.payload {
                ScrollTimer::ScrollIntoView { element, index } => {
                    tracing::debug!(index, deadline = expired.deadline, "scrolling target into view");
                    host.scroll_into_view(&element, self.options.behavior);
                }
                ScrollTimer::Release => {
                    tracing::debug!(deadline = expired.deadline, "scroll throttle released");
                    let mut nav = self.nav.borrow_mut();
                    nav.is_scrolling = false;
                    nav.next = None;
                }
            }
        }
        fired
    }

    /// Returns the earliest pending deadline, for arming a host timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// Returns the index of the active target, `-1` before the first, or the
    /// target count past the last.
    #[must_use]
    pub fn active(&self) -> isize {
        self.nav.borrow().active
    }

    /// Returns the index being scrolled to, while a scroll is in flight.
    #[must_use]
    pub fn pending(&self) -> Option<usize> {
        let nav = self.nav.borrow();
        nav.next
            .filter(|_| nav.is_scrolling)
            .and_then(|n| usize::try_from(n).ok())
    }

    /// Returns `true` while gestures are throttled.
    #[must_use]
    pub fn is_scrolling(&self) -> bool {
        self.nav.borrow().is_scrolling
    }

    /// Returns `true` when gestures can navigate: a root and at least one
    /// target are attached.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.visibility.is_attached() && self.visibility.target_len() > 0
    }

    /// Returns the number of registered targets.
    #[must_use]
    pub fn target_len(&self) -> usize {
        self.visibility.target_len()
    }

    /// Returns the underlying visibility binding.
    #[must_use]
    pub fn visibility(&self) -> &VisibilityBinding<E, K, B> {
        &self.visibility
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &ScrollOptions {
        &self.options
    }

    fn navigate<H>(
        &mut self,
        now: u64,
        classified: Classified,
        touch: bool,
        host: &H,
    ) -> GestureResponse
    where
        H: ScrollHost<E> + ?Sized,
    {
        if !self.is_listening() {
            return GestureResponse::pass(Navigation::None);
        }
        if self.is_scrolling() {
            return GestureResponse::prevent(Navigation::Throttled);
        }
        let direction = match classified {
            Classified::Static => {
                return GestureResponse {
                    navigation: Navigation::Static,
                    prevent_default: touch,
                };
            }
            Classified::Moved(direction) => direction,
        };
        if !self.options.directions.contains(direction.axis().into()) {
            return GestureResponse::pass(Navigation::None);
        }

        let (active, len) = {
            let nav = self.nav.borrow();
            (nav.active, nav.len())
        };
        let natural = active.saturating_add(direction.step()).clamp(-1, len);
        let requested = self
            .before_scroll
            .as_ref()
            .and_then(|f| f(natural, active, direction));
        tracing::debug!(
            current = active,
            next = natural,
            ?requested,
            ?direction,
            "scroll gesture"
        );
        let in_range = |i: &isize| (0..len).contains(i);
        let target = requested
            .filter(in_range)
            .or(Some(natural).filter(in_range))
            .and_then(|i| usize::try_from(i).ok());

        let Some(index) = target else {
            let Some(root) = self.visibility.root() else {
                return GestureResponse::pass(Navigation::None);
            };
            if host.is_at_edge(root, direction) {
                return GestureResponse::pass(Navigation::AtEdge { direction });
            }
            let sentinel = if direction.is_forward() { len } else { -1 };
            self.nav.borrow_mut().active = sentinel;
            return GestureResponse::pass(Navigation::Released {
                active: sentinel,
                direction,
            });
        };
        let Some(element) = self.nav.borrow().targets.get(index).cloned() else {
            return GestureResponse::pass(Navigation::None);
        };

        self.schedule(now, index, element);
        GestureResponse {
            navigation: Navigation::Scheduled { index, direction },
            // A held pointer is panning: let it through unless it is a touch.
            prevent_default: touch || !self.pointer_down,
        }
    }

    fn schedule(&mut self, now: u64, index: usize, element: E) {
        {
            let mut nav = self.nav.borrow_mut();
            nav.prev = nav.active;
            nav.next = isize::try_from(index).ok();
            nav.is_scrolling = true;
        }
        // The previous release has fired; an earlier scroll may still be due.
        self.timers.schedule_after(
            now,
            self.options.delay,
            ScrollTimer::ScrollIntoView { element, index },
        );
        self.timers
            .schedule_after(now, self.options.wait, ScrollTimer::Release);
    }

    fn cancel_pending(&mut self) {
        if !self.timers.is_empty() {
            tracing::debug!(timers = self.timers.len(), "cancelled pending scroll");
        }
        self.timers.clear();
        let mut nav = self.nav.borrow_mut();
        nav.is_scrolling = false;
        nav.next = None;
    }
}
