#![forbid(unsafe_code)]

//! Weakly-held callback set with RAII unsubscription.
//!
//! # Invariants
//!
//! 1. Callbacks are returned by [`ListenerSet::live`] in registration order.
//! 2. A callback whose [`Subscription`] was dropped is never returned again.
//! 3. The set never calls callbacks itself: the owner collects them with
//!    [`ListenerSet::live`], releases its own borrows, then invokes them.
//!    This lets a callback read back into the owner without a re-entrant
//!    `RefCell` borrow.

use std::any::Any;
use std::rc::{Rc, Weak};

type CallbackRc<T> = Rc<dyn Fn(&T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T)>;

/// Registered listeners for values of type `T`.
pub struct ListenerSet<T> {
    entries: Vec<CallbackWeak<T>>,
}

impl<T> Default for ListenerSet<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> ListenerSet<T> {
    /// Number of callbacks whose guard is still alive.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.entries.iter().filter(|w| w.strong_count() > 0).count()
    }

    #[must_use]
    pub fn has_live(&self) -> bool {
        self.entries.iter().any(|w| w.strong_count() > 0)
    }
}

impl<T> std::fmt::Debug for ListenerSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("registered", &self.entries.len())
            .field("live", &self.live_count())
            .finish()
    }
}

impl<T: 'static> ListenerSet<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. The returned guard keeps it alive.
    pub fn register(&mut self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        self.entries.push(Rc::downgrade(&strong));
        Subscription::new(Box::new(strong))
    }

    /// Prune dead entries and return strong handles to the live ones.
    pub fn live(&mut self) -> Vec<CallbackRc<T>> {
        self.entries.retain(|w| w.strong_count() > 0);
        self.entries.iter().filter_map(Weak::upgrade).collect()
    }
}

/// RAII guard for a registered callback.
///
/// Dropping it releases the callback, then runs the optional release hook
/// (the coordinator uses the hook to start its garbage-collection timer once
/// the last observer leaves).
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    guard: Option<Box<dyn Any>>,
    on_release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(guard: Box<dyn Any>) -> Self {
        Self {
            guard: Some(guard),
            on_release: None,
        }
    }

    /// Run `hook` after the callback has been released.
    pub fn on_release(mut self, hook: impl FnOnce() + 'static) -> Self {
        self.on_release = Some(Box::new(hook));
        self
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        drop(self.guard.take());
        if let Some(hook) = self.on_release.take() {
            hook();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    fn fire<T: 'static>(set: &mut ListenerSet<T>, value: &T) {
        for cb in set.live() {
            cb(value);
        }
    }

    #[test]
    fn live_callbacks_fire_in_registration_order() {
        let mut set = ListenerSet::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l1 = Rc::clone(&log);
        let _a = set.register(move |v: &u32| l1.borrow_mut().push(('A', *v)));
        let l2 = Rc::clone(&log);
        let _b = set.register(move |v: &u32| l2.borrow_mut().push(('B', *v)));

        fire(&mut set, &7);
        assert_eq!(*log.borrow(), vec![('A', 7), ('B', 7)]);
    }

    #[test]
    fn dropped_subscription_stops_delivery() {
        let mut set = ListenerSet::new();
        let hits = Rc::new(Cell::new(0u32));
        let h = Rc::clone(&hits);
        let sub = set.register(move |_: &()| h.set(h.get() + 1));

        fire(&mut set, &());
        drop(sub);
        fire(&mut set, &());

        assert_eq!(hits.get(), 1);
        assert_eq!(set.live_count(), 0);
        assert!(!set.has_live());
    }

    #[test]
    fn release_hook_runs_after_callback_is_gone() {
        let set = Rc::new(RefCell::new(ListenerSet::<()>::new()));
        let observed = Rc::new(Cell::new(usize::MAX));

        let sub = set.borrow_mut().register(|_| {});
        let watched = Rc::clone(&set);
        let seen = Rc::clone(&observed);
        let sub = sub.on_release(move || seen.set(watched.borrow().live_count()));

        assert_eq!(set.borrow().live_count(), 1);
        drop(sub);
        assert_eq!(observed.get(), 0);
    }

    #[test]
    fn live_prunes_dead_entries() {
        let mut set = ListenerSet::<()>::new();
        let keep = set.register(|_| {});
        drop(set.register(|_| {}));
        assert_eq!(set.live().len(), 1);
        assert_eq!(format!("{set:?}"), "ListenerSet { registered: 1, live: 1 }");
        drop(keep);
    }

    #[test]
    fn debug_reports_counts_for_any_payload() {
        fn describe<T>(set: &ListenerSet<T>) -> String {
            format!("{set:?}")
        }
        let mut set = ListenerSet::<u8>::new();
        let _sub = set.register(|_| {});
        assert_eq!(describe(&set), "ListenerSet { registered: 1, live: 1 }");
    }
}
