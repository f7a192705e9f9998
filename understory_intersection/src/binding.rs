// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-component visibility binding over a shared [`ObserverCache`].

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;
use core::hash::Hash;

use crate::cache::{EntryCallback, Listener, ObserverCache, ObserverId};
use crate::config::{ObserverConfig, RootMargin, RootSelection};
use crate::detector::{IntersectionBackend, IntersectionEntry};

/// Options that select the shared observer a binding attaches to.
#[derive(Clone, Debug, PartialEq)]
pub struct VisibilityOptions {
    /// Margin applied to the root bounds.
    pub root_margin: RootMargin,
    /// Visible fraction at which a target counts as entered.
    pub threshold: f64,
}

impl Default for VisibilityOptions {
    fn default() -> Self {
        Self {
            root_margin: RootMargin::ZERO,
            threshold: 0.0,
        }
    }
}

/// The consumer callbacks a binding forwards enter/exit notifications to.
pub struct VisibilityCallbacks<E> {
    on_enter: Option<EntryCallback<E>>,
    on_exit: Option<EntryCallback<E>>,
}

impl<E> Default for VisibilityCallbacks<E> {
    fn default() -> Self {
        Self {
            on_enter: None,
            on_exit: None,
        }
    }
}

impl<E> Clone for VisibilityCallbacks<E> {
    fn clone(&self) -> Self {
        Self {
            on_enter: self.on_enter.clone(),
            on_exit: self.on_exit.clone(),
        }
    }
}

impl<E> fmt::Debug for VisibilityCallbacks<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibilityCallbacks")
            .field("on_enter", &self.on_enter.is_some())
            .field("on_exit", &self.on_exit.is_some())
            .finish()
    }
}

impl<E> VisibilityCallbacks<E> {
    /// No callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls `f` when a target starts intersecting.
    #[must_use]
    pub fn on_enter(mut self, f: impl Fn(&IntersectionEntry<E>) + 'static) -> Self {
        self.on_enter = Some(Rc::new(f));
        self
    }

    /// Calls `f` when a target stops intersecting.
    #[must_use]
    pub fn on_exit(mut self, f: impl Fn(&IntersectionEntry<E>) + 'static) -> Self {
        self.on_exit = Some(Rc::new(f));
        self
    }

    /// Returns the enter callback, if set.
    #[must_use]
    pub fn enter_callback(&self) -> Option<&EntryCallback<E>> {
        self.on_enter.as_ref()
    }

    /// Returns the exit callback, if set.
    #[must_use]
    pub fn exit_callback(&self) -> Option<&EntryCallback<E>> {
        self.on_exit.as_ref()
    }
}

#[derive(Clone, Debug, PartialEq)]
enum RootState<E> {
    Unset,
    Attached {
        root: RootSelection<E>,
        observer: ObserverId,
    },
}

/// Binds one component's root and targets to a shared observer.
///
/// The binding mirrors the attach/detach callbacks UI components receive for
/// their elements:
///
/// - [`VisibilityBinding::set_root`] with `Some(root)` resolves (or creates)
///   the shared observer for `(root, root_margin, threshold)` and observes
///   every target registered so far. With `None` it releases the observer.
/// - [`VisibilityBinding::set_target`] with `Some(element)` registers a
///   target under an id, observing it right away if a root is attached and
///   buffering it otherwise. With `None` it unregisters every element under
///   that id.
///
/// Re-attaching the same root is a no-op; attaching a different root, or
/// changing options while attached, detaches the old configuration first.
/// Dropping the binding detaches its root.
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use kurbo::Rect;
/// use understory_intersection::{
///     GeometricBackend, ObserverCache, RootSelection, VisibilityBinding, VisibilityCallbacks,
///     VisibilityOptions,
/// };
///
/// let cache = ObserverCache::new(GeometricBackend);
/// let visible = Rc::new(RefCell::new(Vec::new()));
/// let log = visible.clone();
/// let callbacks = VisibilityCallbacks::new().on_enter(move |entry| log.borrow_mut().push(entry.target));
///
/// let mut binding = VisibilityBinding::new(cache.clone(), VisibilityOptions::default(), callbacks);
/// // Targets may be registered before the root.
/// binding.set_target("hero", Some(1_u32));
/// binding.set_target("footer", Some(2_u32));
/// binding.set_root(Some(RootSelection::DefaultViewport));
///
/// cache.update_layout(Rect::new(0.0, 0.0, 100.0, 100.0), |e| {
///     let y = f64::from(*e - 1) * 100.0;
///     Some(Rect::new(0.0, y, 100.0, y + 100.0))
/// });
/// assert_eq!(*visible.borrow(), vec![1]);
/// ```
pub struct VisibilityBinding<E, K, B>
where
    E: Clone + Eq + Hash + fmt::Debug,
    B: IntersectionBackend<E>,
{
    cache: ObserverCache<E, B>,
    options: VisibilityOptions,
    listener: Listener<E>,
    root: RootState<E>,
    targets: Vec<(E, K)>,
}

impl<E, K, B> fmt::Debug for VisibilityBinding<E, K, B>
where
    E: Clone + Eq + Hash + fmt::Debug,
    K: fmt::Debug,
    B: IntersectionBackend<E>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibilityBinding")
            .field("options", &self.options)
            .field("listener", &self.listener)
            .field("root", &self.root)
            .field("targets", &self.targets)
            .finish_non_exhaustive()
    }
}

impl<E, K, B> VisibilityBinding<E, K, B>
where
    E: Clone + Eq + Hash + fmt::Debug,
    K: Clone + PartialEq,
    B: IntersectionBackend<E>,
{
    /// Creates an unattached binding on `cache`.
    pub fn new(
        cache: ObserverCache<E, B>,
        options: VisibilityOptions,
        callbacks: VisibilityCallbacks<E>,
    ) -> Self {
        let listener = cache.listener(callbacks.on_enter, callbacks.on_exit);
        Self {
            cache,
            options,
            listener,
            root: RootState::Unset,
            targets: Vec::new(),
        }
    }

    /// Attaches (`Some`) or detaches (`None`) the root.
    ///
    /// Returns `true` if the binding changed state.
    pub fn set_root(&mut self, root: Option<RootSelection<E>>) -> bool {
        match root {
            Some(root) => self.attach_root(root),
            None => self.detach_root(),
        }
    }

    /// Attaches to the shared observer for `root` and flushes buffered targets.
    ///
    /// Attaching the currently attached root is a no-op and returns `false`.
    pub fn attach_root(&mut self, root: RootSelection<E>) -> bool {
        if let RootState::Attached { root: current, .. } = &self.root {
            if *current == root {
                return false;
            }
            self.detach_root();
        }
        let observer = self.cache.get_or_insert(&self.config(&root));
        for (element, _) in &self.targets {
            self.cache.observe(observer, element.clone(), &self.listener);
        }
        self.root = RootState::Attached { root, observer };
        true
    }

    /// Releases the shared observer.
    ///
    /// Observers on the default viewport are kept alive for other consumers;
    /// only this binding's targets are unobserved. Other observers are
    /// disconnected unless another binding still uses them. Detaching an
    /// unattached binding is a no-op and returns `false`.
    pub fn detach_root(&mut self) -> bool {
        let RootState::Attached { observer, .. } =
            core::mem::replace(&mut self.root, RootState::Unset)
        else {
            return false;
        };
        self.cache.release(observer, self.listener.id());
        true
    }

    /// Registers (`Some`) or unregisters (`None`) the target element for `id`.
    ///
    /// Returns `true` if the target list changed.
    pub fn set_target(&mut self, id: K, element: Option<E>) -> bool {
        match element {
            Some(element) => self.attach_target(id, element),
            None => self.detach_target(&id),
        }
    }

    /// Registers `element` under `id`, observing it if a root is attached.
    pub fn attach_target(&mut self, id: K, element: E) -> bool {
        if self.targets.iter().any(|(e, k)| *e == element && *k == id) {
            return false;
        }
        if let Some(observer) = self.live_observer() {
            self.cache.observe(observer, element.clone(), &self.listener);
        }
        self.targets.push((element, id));
        true
    }

    /// Unregisters every element under `id`, unobserving them if a root is
    /// attached. Unknown ids are ignored.
    pub fn detach_target(&mut self, id: &K) -> bool {
        let observer = match self.root {
            RootState::Attached { observer, .. } => Some(observer),
            RootState::Unset => None,
        };
        let before = self.targets.len();
        let cache = &self.cache;
        let listener = self.listener.id();
        self.targets.retain(|(element, k)| {
            if k != id {
                return true;
            }
            if let Some(observer) = observer {
                cache.unobserve(observer, element, listener);
            }
            false
        });
        self.targets.len() != before
    }

    /// Replaces the options.
    ///
    /// While attached, this moves the binding from the old configuration's
    /// observer to the new one, re-observing every target.
    pub fn set_options(&mut self, options: VisibilityOptions) -> bool {
        if self.options == options {
            return false;
        }
        self.options = options;
        if let RootState::Attached { root, .. } = self.root.clone() {
            self.detach_root();
            self.attach_root(root);
        }
        true
    }

    /// Returns the current options.
    #[must_use]
    pub fn options(&self) -> &VisibilityOptions {
        &self.options
    }

    /// Returns the attached root, if any.
    #[must_use]
    pub fn root(&self) -> Option<&RootSelection<E>> {
        match &self.root {
            RootState::Attached { root, .. } => Some(root),
            RootState::Unset => None,
        }
    }

    /// Returns the shared observer this binding is attached to, if any.
    #[must_use]
    pub fn observer(&self) -> Option<ObserverId> {
        match self.root {
            RootState::Attached { observer, .. } => Some(observer),
            RootState::Unset => None,
        }
    }

    /// Returns `true` while a root is attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        matches!(self.root, RootState::Attached { .. })
    }

    /// Returns the registered targets, in registration order.
    pub fn targets(&self) -> impl Iterator<Item = (&E, &K)> + '_ {
        self.targets.iter().map(|(e, k)| (e, k))
    }

    /// Returns the number of registered targets.
    #[must_use]
    pub fn target_len(&self) -> usize {
        self.targets.len()
    }

    /// Returns the cache this binding registers on.
    #[must_use]
    pub fn cache(&self) -> &ObserverCache<E, B> {
        &self.cache
    }

    /// Returns this binding's listener.
    #[must_use]
    pub fn listener(&self) -> &Listener<E> {
        &self.listener
    }

    fn config(&self, root: &RootSelection<E>) -> ObserverConfig<E> {
        ObserverConfig::new(root.clone())
            .with_root_margin(self.options.root_margin)
            .with_threshold(self.options.threshold)
    }

    /// Returns the attached observer, re-resolving it if the cache dropped it.
    ///
    /// A binding with no targets holds no registrations, so another binding
    /// on the same configuration may release the shared record from under it.
    fn live_observer(&mut self) -> Option<ObserverId> {
        let RootState::Attached { root, observer } = &self.root else {
            return None;
        };
        if self.cache.contains(*observer) {
            return Some(*observer);
        }
        let root = root.clone();
        let observer = self.cache.get_or_insert(&self.config(&root));
        tracing::debug!(?observer, "re-resolved released intersection observer");
        for (element, _) in &self.targets {
            self.cache.observe(observer, element.clone(), &self.listener);
        }
        self.root = RootState::Attached { root, observer };
        Some(observer)
    }
}

impl<E, K, B> Drop for VisibilityBinding<E, K, B>
where
    E: Clone + Eq + Hash + fmt::Debug,
    B: IntersectionBackend<E>,
{
    fn drop(&mut self) {
        if let RootState::Attached { observer, .. } = self.root {
            self.cache.release(observer, self.listener.id());
        }
    }
}
