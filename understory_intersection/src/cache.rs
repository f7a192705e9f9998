// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shared registry of observers, one per distinct configuration.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use core::hash::Hash;

use hashbrown::HashMap;
use kurbo::Rect;
use smallvec::SmallVec;

use crate::config::{ObserverConfig, RootSelection};
use crate::detector::{IntersectionBackend, IntersectionDetector, IntersectionEntry, LayoutDetector};

/// A consumer callback invoked with an intersection entry.
pub type EntryCallback<E> = Rc<dyn Fn(&IntersectionEntry<E>)>;

/// Identifier of one shared observer record in an [`ObserverCache`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

/// Identifier of one consumer registered through [`ObserverCache::listener`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// A consumer's enter/exit callbacks, registered per observed element.
#[derive(Clone)]
pub struct Listener<E> {
    id: ListenerId,
    on_enter: Option<EntryCallback<E>>,
    on_exit: Option<EntryCallback<E>>,
}

impl<E> Listener<E> {
    /// Returns this listener's identity.
    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    fn callback(&self, is_intersecting: bool) -> Option<&EntryCallback<E>> {
        if is_intersecting {
            self.on_enter.as_ref()
        } else {
            self.on_exit.as_ref()
        }
    }
}

impl<E> fmt::Debug for Listener<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("on_enter", &self.on_enter.is_some())
            .field("on_exit", &self.on_exit.is_some())
            .finish()
    }
}

/// What [`ObserverCache::release`] did to a record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Release {
    /// The record does not exist (already removed, or never created).
    Missing,
    /// The record was kept; `unobserved` elements lost their last listener
    /// and were unobserved from the detector.
    Kept {
        /// Number of elements unobserved from the detector.
        unobserved: usize,
    },
    /// The releasing consumer was the only one; the record was disconnected
    /// and removed.
    Removed,
}

struct ObserverRecord<E, D> {
    id: ObserverId,
    config: ObserverConfig<E>,
    detector: D,
    targets: HashMap<E, SmallVec<[Listener<E>; 2]>>,
}

impl<E, D> ObserverRecord<E, D>
where
    E: Clone + Eq + Hash,
{
    fn has_other_listeners(&self, listener: ListenerId) -> bool {
        self.targets
            .values()
            .flatten()
            .any(|l| l.id != listener)
    }
}

struct Registry<E, B: IntersectionBackend<E>> {
    backend: B,
    records: Vec<ObserverRecord<E, B::Detector>>,
    next_observer: u64,
    next_listener: u64,
}

impl<E, B: IntersectionBackend<E>> Registry<E, B> {
    fn record(&self, id: ObserverId) -> Option<&ObserverRecord<E, B::Detector>> {
        self.records.iter().find(|r| r.id == id)
    }

    fn record_mut(&mut self, id: ObserverId) -> Option<&mut ObserverRecord<E, B::Detector>> {
        self.records.iter_mut().find(|r| r.id == id)
    }
}

/// Deduplicates intersection detectors by configuration and routes their
/// entries to the callbacks registered for each element.
///
/// The cache is a cheap handle: clones share one registry. Construct one per
/// independent UI (or per test) and inject it into every
/// [`VisibilityBinding`](crate::VisibilityBinding) that should share
/// detectors.
///
/// ## Lifecycle
///
/// - [`ObserverCache::get_or_insert`] resolves the single record for a
///   configuration, creating its detector through the backend if needed.
/// - [`ObserverCache::observe`] / [`ObserverCache::unobserve`] add and remove
///   a listener for one element. The detector observes an element while at
///   least one listener is registered for it.
/// - [`ObserverCache::release`] drops everything one listener registered on a
///   record, removing the record when nothing else uses it. Records rooted at
///   [`RootSelection::DefaultViewport`] are only ever removed explicitly.
///
/// ## Dispatch
///
/// The host forwards detector reports to [`ObserverCache::dispatch`]. Each
/// entry invokes the `on_enter` (intersecting) or `on_exit` (not
/// intersecting) callbacks registered for exactly that element. Callbacks are
/// snapshotted before they run, so they may freely register or release
/// listeners on the same cache.
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use kurbo::Rect;
/// use understory_intersection::{
///     GeometricBackend, IntersectionEntry, ObserverCache, ObserverConfig, RootSelection,
/// };
///
/// let cache = ObserverCache::new(GeometricBackend);
/// let config = ObserverConfig::new(RootSelection::<u32>::DefaultViewport);
/// let id = cache.get_or_insert(&config);
/// assert_eq!(cache.get_or_insert(&config), id);
///
/// let entered = Rc::new(Cell::new(0));
/// let seen = entered.clone();
/// let on_enter = move |_: &IntersectionEntry<u32>| seen.set(seen.get() + 1);
/// let listener = cache.listener(Some(Rc::new(on_enter)), None);
/// cache.observe(id, 7, &listener);
///
/// cache.update_layout(Rect::new(0.0, 0.0, 100.0, 100.0), |_| Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
/// assert_eq!(entered.get(), 1);
/// ```
pub struct ObserverCache<E, B: IntersectionBackend<E>> {
    inner: Rc<RefCell<Registry<E, B>>>,
}

impl<E, B: IntersectionBackend<E>> Clone for ObserverCache<E, B> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E, B: IntersectionBackend<E>> fmt::Debug for ObserverCache<E, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ObserverCache")
            .field("records", &inner.records.len())
            .field("next_observer", &inner.next_observer)
            .field("next_listener", &inner.next_listener)
            .finish_non_exhaustive()
    }
}

impl<E, B> ObserverCache<E, B>
where
    E: Clone + Eq + Hash + fmt::Debug,
    B: IntersectionBackend<E>,
{
    /// Creates an empty cache producing detectors with `backend`.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Registry {
                backend,
                records: Vec::new(),
                next_observer: 0,
                next_listener: 0,
            })),
        }
    }

    /// Returns the live record whose configuration equals `config`.
    #[must_use]
    pub fn get(&self, config: &ObserverConfig<E>) -> Option<ObserverId> {
        self.inner
            .borrow()
            .records
            .iter()
            .find(|r| r.config == *config)
            .map(|r| r.id)
    }

    /// Creates a new record for `config`, unconditionally.
    ///
    /// Prefer [`ObserverCache::get_or_insert`], which keeps the
    /// one-record-per-configuration invariant.
    pub fn insert(&self, config: &ObserverConfig<E>) -> ObserverId {
        let mut inner = self.inner.borrow_mut();
        let id = ObserverId(inner.next_observer);
        inner.next_observer += 1;
        let detector = inner.backend.create(config);
        tracing::debug!(
            observer = ?id,
            root = ?config.root,
            root_margin = %config.root_margin,
            threshold = config.threshold,
            "created shared intersection observer"
        );
        inner.records.push(ObserverRecord {
            id,
            config: config.clone().with_threshold(config.threshold),
            detector,
            targets: HashMap::new(),
        });
        id
    }

    /// Returns the record for `config`, creating it if none exists.
    pub fn get_or_insert(&self, config: &ObserverConfig<E>) -> ObserverId {
        match self.get(config) {
            Some(id) => id,
            None => self.insert(config),
        }
    }

    /// Disconnects the record's detector and removes the record.
    ///
    /// Returns `false` if the record does not exist.
    pub fn remove(&self, id: ObserverId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(index) = inner.records.iter().position(|r| r.id == id) else {
            return false;
        };
        let mut record = inner.records.remove(index);
        record.detector.disconnect();
        tracing::debug!(observer = ?id, "removed shared intersection observer");
        true
    }

    /// Drops every record without disconnecting it.
    ///
    /// Intended for resetting shared state between independent test runs.
    pub fn clear(&self) {
        self.inner.borrow_mut().records.clear();
    }

    /// Returns the number of live records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().records.len()
    }

    /// Returns `true` if there are no live records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().records.is_empty()
    }

    /// Returns `true` if the record is live.
    #[must_use]
    pub fn contains(&self, id: ObserverId) -> bool {
        self.inner.borrow().record(id).is_some()
    }

    /// Returns the configuration of a live record.
    #[must_use]
    pub fn config(&self, id: ObserverId) -> Option<ObserverConfig<E>> {
        self.inner.borrow().record(id).map(|r| r.config.clone())
    }

    /// Returns the number of elements physically observed by a record.
    #[must_use]
    pub fn observed_len(&self, id: ObserverId) -> usize {
        self.inner
            .borrow()
            .record(id)
            .map_or(0, |r| r.targets.len())
    }

    /// Runs `f` with the record's detector.
    ///
    /// Must not be called from inside `f` or from a dispatch callback that is
    /// itself running inside `with_detector`.
    pub fn with_detector<R>(
        &self,
        id: ObserverId,
        f: impl FnOnce(&mut B::Detector) -> R,
    ) -> Option<R> {
        let mut inner = self.inner.borrow_mut();
        inner.record_mut(id).map(|r| f(&mut r.detector))
    }

    /// Runs `f` with the backend.
    pub fn with_backend<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        f(&mut self.inner.borrow_mut().backend)
    }

    /// Allocates a listener carrying the given callbacks.
    pub fn listener(
        &self,
        on_enter: Option<EntryCallback<E>>,
        on_exit: Option<EntryCallback<E>>,
    ) -> Listener<E> {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_listener);
        inner.next_listener += 1;
        Listener {
            id,
            on_enter,
            on_exit,
        }
    }

    /// Registers `listener` for `target` on a record.
    ///
    /// The detector starts observing `target` if it had no listener yet.
    /// Registering the same listener twice is a no-op. Returns `true` if the
    /// listener was added.
    pub fn observe(&self, id: ObserverId, target: E, listener: &Listener<E>) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(record) = inner.record_mut(id) else {
            return false;
        };
        if !record.targets.contains_key(&target) {
            record.detector.observe(&target);
        }
        let listeners = record.targets.entry(target).or_default();
        if listeners.iter().any(|l| l.id == listener.id) {
            return false;
        }
        listeners.push(listener.clone());
        true
    }

    /// Removes `listener` from `target` on a record.
    ///
    /// The detector stops observing `target` once no listener remains.
    /// Unknown records, targets, or listeners are ignored. Returns `true` if a
    /// registration was removed.
    pub fn unobserve(&self, id: ObserverId, target: &E, listener: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(record) = inner.record_mut(id) else {
            return false;
        };
        let Some(listeners) = record.targets.get_mut(target) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|l| l.id != listener);
        if listeners.len() == before {
            return false;
        }
        if listeners.is_empty() {
            record.targets.remove(target);
            record.detector.unobserve(target);
        }
        true
    }

    /// Drops every registration of `listener` on a record.
    ///
    /// - Records rooted at [`RootSelection::DefaultViewport`] are shared
    ///   ambient state and are never removed here: only elements left
    ///   without listeners are unobserved.
    /// - Records with an explicit root are disconnected and removed when
    ///   `listener` was their only consumer. Otherwise they are treated like
    ///   the default viewport case.
    pub fn release(&self, id: ObserverId, listener: ListenerId) -> Release {
        let sole_owner = {
            let inner = self.inner.borrow();
            let Some(record) = inner.record(id) else {
                return Release::Missing;
            };
            !record.config.root.is_default_viewport() && !record.has_other_listeners(listener)
        };
        if sole_owner {
            self.remove(id);
            return Release::Removed;
        }

        let mut inner = self.inner.borrow_mut();
        let Some(record) = inner.record_mut(id) else {
            return Release::Missing;
        };
        let mut emptied: SmallVec<[E; 8]> = SmallVec::new();
        for (target, listeners) in &mut record.targets {
            listeners.retain(|l| l.id != listener);
            if listeners.is_empty() {
                emptied.push(target.clone());
            }
        }
        for target in &emptied {
            record.targets.remove(target);
            record.detector.unobserve(target);
        }
        Release::Kept {
            unobserved: emptied.len(),
        }
    }

    /// Delivers detector entries to the callbacks registered for each target.
    ///
    /// Entries for unknown records or unregistered targets are ignored.
    /// Returns the number of callbacks invoked.
    pub fn dispatch(
        &self,
        id: ObserverId,
        entries: impl IntoIterator<Item = IntersectionEntry<E>>,
    ) -> usize {
        let mut invoked = 0;
        for entry in entries {
            tracing::trace!(
                observer = ?id,
                target = ?entry.target,
                is_intersecting = entry.is_intersecting,
                ratio = entry.intersection_ratio,
                "intersection entry"
            );
            let snapshot: SmallVec<[EntryCallback<E>; 4]> = {
                let inner = self.inner.borrow();
                let Some(record) = inner.record(id) else {
                    return invoked;
                };
                record
                    .targets
                    .get(&entry.target)
                    .into_iter()
                    .flatten()
                    .filter_map(|l| l.callback(entry.is_intersecting).cloned())
                    .collect()
            };
            for callback in &snapshot {
                callback(&entry);
                invoked += 1;
            }
        }
        invoked
    }
}

impl<E, B> ObserverCache<E, B>
where
    E: Clone + Eq + Hash + fmt::Debug,
    B: IntersectionBackend<E>,
    B::Detector: LayoutDetector<E>,
{
    /// Recomputes every record against a layout and dispatches the changes.
    ///
    /// Records rooted at [`RootSelection::DefaultViewport`] measure against
    /// `viewport`; explicit roots measure against their own layout bounds
    /// and are skipped while their root is not laid out. `layout` runs
    /// before each record is borrowed, so it may query the cache. Returns
    /// the number of callbacks invoked.
    pub fn update_layout(&self, viewport: Rect, layout: impl Fn(&E) -> Option<Rect>) -> usize {
        let ids: Vec<ObserverId> = self.inner.borrow().records.iter().map(|r| r.id).collect();
        let mut invoked = 0;
        for id in ids {
            let Some((root, targets)) = self.inner.borrow().record(id).map(|r| {
                let targets: Vec<E> = r.targets.keys().cloned().collect();
                (r.config.root.clone(), targets)
            }) else {
                continue;
            };
            let root_bounds = match &root {
                RootSelection::DefaultViewport => Some(viewport),
                RootSelection::Explicit(root) => layout(root),
            };
            let Some(root_bounds) = root_bounds else {
                continue;
            };
            let rects: HashMap<E, Rect> = targets
                .into_iter()
                .filter_map(|target| layout(&target).map(|rect| (target, rect)))
                .collect();
            let entries = {
                let mut inner = self.inner.borrow_mut();
                let Some(record) = inner.record_mut(id) else {
                    continue;
                };
                record
                    .detector
                    .compute(root_bounds, &|target: &E| rects.get(target).copied())
            };
            invoked += self.dispatch(id, entries);
        }
        invoked
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::geometry::GeometricBackend;
    use alloc::vec;
    use std::cell::Cell;

    type Cache = ObserverCache<u32, GeometricBackend>;

    fn counter() -> (Rc<Cell<usize>>, EntryCallback<u32>) {
        let count = Rc::new(Cell::new(0));
        let seen = count.clone();
        (
            count,
            Rc::new(move |_: &IntersectionEntry<u32>| seen.set(seen.get() + 1)),
        )
    }

    #[test]
    fn one_record_per_configuration() {
        let cache = Cache::new(GeometricBackend);
        let a = ObserverConfig::new(RootSelection::Explicit(1)).with_threshold(1.0);
        let b = ObserverConfig::new(RootSelection::Explicit(1)).with_threshold(0.0);

        let id = cache.get_or_insert(&a);
        assert_eq!(cache.get_or_insert(&a.clone()), id);
        assert_ne!(cache.get_or_insert(&b), id);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&a), Some(id));
    }

    #[test]
    fn remove_disconnects_and_forgets() {
        let cache = Cache::new(GeometricBackend);
        let config = ObserverConfig::new(RootSelection::Explicit(1));
        let id = cache.get_or_insert(&config);

        assert!(cache.remove(id));
        assert!(!cache.remove(id));
        assert_eq!(cache.get(&config), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn observe_registers_element_once_per_record() {
        let cache = Cache::new(GeometricBackend);
        let id = cache.get_or_insert(&ObserverConfig::new(RootSelection::DefaultViewport));
        let a = cache.listener(None, None);
        let b = cache.listener(None, None);

        assert!(cache.observe(id, 5, &a));
        assert!(!cache.observe(id, 5, &a), "same listener twice is a no-op");
        assert!(cache.observe(id, 5, &b));
        assert_eq!(cache.observed_len(id), 1);
        assert_eq!(
            cache.with_detector(id, |d| d.observed().count()),
            Some(1)
        );

        assert!(cache.unobserve(id, &5, a.id()));
        assert_eq!(cache.observed_len(id), 1, "b still listens");
        assert!(cache.unobserve(id, &5, b.id()));
        assert_eq!(cache.observed_len(id), 0);
        assert_eq!(cache.with_detector(id, |d| d.observed().count()), Some(0));
        assert!(!cache.unobserve(id, &5, b.id()));
    }

    #[test]
    fn dispatch_reaches_only_the_entry_target() {
        let cache = Cache::new(GeometricBackend);
        let id = cache.get_or_insert(&ObserverConfig::new(RootSelection::DefaultViewport));
        let (enter_a, on_enter_a) = counter();
        let (enter_b, on_enter_b) = counter();
        let (exit_b, on_exit_b) = counter();
        let a = cache.listener(Some(on_enter_a), None);
        let b = cache.listener(Some(on_enter_b), Some(on_exit_b));
        cache.observe(id, 1, &a);
        cache.observe(id, 2, &b);

        let invoked = cache.dispatch(id, vec![IntersectionEntry::entering(1, 1.0)]);
        assert_eq!(invoked, 1);
        assert_eq!(enter_a.get(), 1);
        assert_eq!(enter_b.get(), 0);

        cache.dispatch(id, vec![IntersectionEntry::exiting(2)]);
        assert_eq!(exit_b.get(), 1);
        assert_eq!(enter_a.get(), 1);
    }

    #[test]
    fn dispatch_tolerates_reentrant_registration() {
        let cache = Cache::new(GeometricBackend);
        let id = cache.get_or_insert(&ObserverConfig::new(RootSelection::DefaultViewport));
        let (late, on_late) = counter();
        let late_listener = cache.listener(Some(on_late), None);

        // The first callback registers another listener and releases itself.
        let reentrant = cache.clone();
        let self_id = Rc::new(Cell::new(None));
        let self_id_in = self_id.clone();
        let first = cache.listener(
            Some(Rc::new(move |entry: &IntersectionEntry<u32>| {
                reentrant.observe(id, entry.target, &late_listener);
                if let Some(me) = self_id_in.get() {
                    reentrant.unobserve(id, &entry.target, me);
                }
            })),
            None,
        );
        self_id.set(Some(first.id()));
        cache.observe(id, 3, &first);

        assert_eq!(cache.dispatch(id, vec![IntersectionEntry::entering(3, 1.0)]), 1);
        assert_eq!(late.get(), 0, "snapshot excludes listeners added mid-dispatch");

        assert_eq!(cache.dispatch(id, vec![IntersectionEntry::entering(3, 1.0)]), 1);
        assert_eq!(late.get(), 1);
    }

    #[test]
    fn release_on_default_viewport_keeps_record() {
        let cache = Cache::new(GeometricBackend);
        let id = cache.get_or_insert(&ObserverConfig::new(RootSelection::DefaultViewport));
        let a = cache.listener(None, None);
        cache.observe(id, 1, &a);
        cache.observe(id, 2, &a);

        assert_eq!(cache.release(id, a.id()), Release::Kept { unobserved: 2 });
        assert!(cache.contains(id));
        assert_eq!(
            cache.with_detector(id, |d| d.is_connected()),
            Some(true)
        );
    }

    #[test]
    fn release_on_explicit_root_removes_sole_owner_only() {
        let cache = Cache::new(GeometricBackend);
        let id = cache.get_or_insert(&ObserverConfig::new(RootSelection::Explicit(100)));
        let a = cache.listener(None, None);
        let b = cache.listener(None, None);
        cache.observe(id, 1, &a);
        cache.observe(id, 1, &b);
        cache.observe(id, 2, &b);

        assert_eq!(cache.release(id, b.id()), Release::Kept { unobserved: 1 });
        assert_eq!(cache.observed_len(id), 1);

        assert_eq!(cache.release(id, a.id()), Release::Removed);
        assert!(!cache.contains(id));
        assert_eq!(cache.release(id, a.id()), Release::Missing);
    }

    #[test]
    fn update_layout_measures_explicit_roots_against_their_bounds() {
        let cache = Cache::new(GeometricBackend);
        let id = cache.get_or_insert(&ObserverConfig::new(RootSelection::Explicit(100)));
        let (entered, on_enter) = counter();
        let (exited, on_exit) = counter();
        let l = cache.listener(Some(on_enter), Some(on_exit));
        cache.observe(id, 1, &l);
        cache.observe(id, 2, &l);

        let layout = |e: &u32| match e {
            100 => Some(Rect::new(0.0, 0.0, 50.0, 50.0)),
            1 => Some(Rect::new(0.0, 0.0, 10.0, 10.0)),
            2 => Some(Rect::new(60.0, 0.0, 70.0, 10.0)),
            _ => None,
        };
        // The viewport would contain both targets; the explicit root only one.
        cache.update_layout(Rect::new(0.0, 0.0, 1000.0, 1000.0), layout);
        assert_eq!(entered.get(), 1);
        assert_eq!(exited.get(), 1);
    }

    #[test]
    fn clear_resets_registry() {
        let cache = Cache::new(GeometricBackend);
        cache.get_or_insert(&ObserverConfig::new(RootSelection::Explicit(1)));
        cache.get_or_insert(&ObserverConfig::new(RootSelection::DefaultViewport));
        cache.clear();
        assert!(cache.is_empty());
    }
}
