use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::foundation::arena::{Arena, SlotId};
use crate::foundation::error::ChoreoResult;

/// Shared, fallible listener callback.
///
/// Returning `Err` from a handler stops the dispatch it was called from; the error
/// surfaces at whatever call triggered the emission.
pub type Handler<T> = Rc<dyn Fn(&T) -> ChoreoResult<()>>;

type SubscribeFn<T> = Rc<dyn Fn(Handler<T>) -> ChoreoResult<Subscription>>;

/// Precondition every subscribe must pass, carried through derived emitters.
type Gate = Rc<dyn Fn() -> ChoreoResult<()>>;

/// Handle for an attached listener.
///
/// Dropping a `Subscription` leaves the listener attached; call
/// [`Subscription::unsubscribe`] to detach it. Consuming `self` makes a double
/// unsubscribe unrepresentable.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Build a subscription that runs `detach` when unsubscribed.
    pub fn new(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Detach the listener.
    pub fn unsubscribe(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

/// Ordered listener storage behind every emission source.
pub(crate) struct ListenerSet<T> {
    handlers: RefCell<Arena<Handler<T>>>,
}

impl<T> ListenerSet<T> {
    pub(crate) fn new() -> Self {
        Self {
            handlers: RefCell::new(Arena::new()),
        }
    }

    pub(crate) fn add(&self, handler: Handler<T>) -> SlotId {
        self.handlers.borrow_mut().insert(handler)
    }

    pub(crate) fn remove(&self, id: SlotId) -> bool {
        self.handlers.borrow_mut().remove(id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }

    /// Call every listener in subscription order, stopping at the first error.
    ///
    /// Listeners may unsubscribe (themselves or others) while this runs; a listener removed
    /// mid-dispatch is not called.
    pub(crate) fn emit(&self, value: &T) -> ChoreoResult<()> {
        let snapshot: SmallVec<[(SlotId, Handler<T>); 4]> = self
            .handlers
            .borrow()
            .iter_ordered()
            .map(|(id, h)| (id, Rc::clone(h)))
            .collect();

        for (id, handler) in snapshot {
            let live = self.handlers.borrow().contains(id);
            if live {
                handler(value)?;
            }
        }
        Ok(())
    }
}

/// Push-based observable built over a subscribe function.
///
/// Operators never mutate the emitter they are called on; each returns a new emitter that
/// holds only the parent's subscribe function. Nothing upstream is touched until someone
/// subscribes downstream.
pub struct Emitter<T> {
    subscribe_fn: SubscribeFn<T>,
    gate: Option<Gate>,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            subscribe_fn: Rc::clone(&self.subscribe_fn),
            gate: self.gate.clone(),
        }
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter").finish_non_exhaustive()
    }
}

impl<T: 'static> Emitter<T> {
    /// Build an emitter from a raw subscribe function.
    pub fn new(subscribe: impl Fn(Handler<T>) -> ChoreoResult<Subscription> + 'static) -> Self {
        Self {
            subscribe_fn: Rc::new(subscribe),
            gate: None,
        }
    }

    /// Run `gate` before every subscribe to this emitter and to everything derived from it.
    ///
    /// Shared nodes (`tap`, `dedupe`) only reach upstream for their first subscriber, so the
    /// gate travels with the emitter instead of living in the source's subscribe function.
    pub(crate) fn gated(mut self, gate: impl Fn() -> ChoreoResult<()> + 'static) -> Self {
        self.gate = Some(Rc::new(gate));
        self
    }

    fn derive<U: 'static>(
        &self,
        subscribe: impl Fn(Handler<U>) -> ChoreoResult<Subscription> + 'static,
    ) -> Emitter<U> {
        Emitter {
            subscribe_fn: Rc::new(subscribe),
            gate: self.gate.clone(),
        }
    }

    /// Attach an infallible listener.
    pub fn subscribe(&self, handler: impl Fn(&T) + 'static) -> ChoreoResult<Subscription> {
        self.try_subscribe(move |value| {
            handler(value);
            Ok(())
        })
    }

    /// Attach a listener that may fail.
    pub fn try_subscribe(
        &self,
        handler: impl Fn(&T) -> ChoreoResult<()> + 'static,
    ) -> ChoreoResult<Subscription> {
        self.subscribe_handler(Rc::new(handler))
    }

    pub(crate) fn subscribe_handler(&self, handler: Handler<T>) -> ChoreoResult<Subscription> {
        if let Some(gate) = &self.gate {
            gate()?;
        }
        (self.subscribe_fn)(handler)
    }

    /// Forward `f(value)` for each emission.
    pub fn map<U: 'static>(&self, f: impl Fn(&T) -> U + 'static) -> Emitter<U> {
        let parent = Rc::clone(&self.subscribe_fn);
        let f = Rc::new(f);
        self.derive(move |handler: Handler<U>| {
            let f = Rc::clone(&f);
            parent(Rc::new(move |value: &T| handler(&f(value))))
        })
    }

    /// Forward only the values `pred` accepts.
    pub fn filter(&self, pred: impl Fn(&T) -> bool + 'static) -> Self {
        let parent = Rc::clone(&self.subscribe_fn);
        let pred = Rc::new(pred);
        self.derive(move |handler: Handler<T>| {
            let pred = Rc::clone(&pred);
            parent(Rc::new(move |value: &T| {
                if pred(value) { handler(value) } else { Ok(()) }
            }))
        })
    }

    /// Drop values equal to the previously forwarded one.
    pub fn dedupe(&self) -> Self
    where
        T: PartialEq + Clone,
    {
        self.dedupe_by(|a, b| a == b)
    }

    /// Drop values that `same(previous, value)` reports as duplicates.
    ///
    /// The "previous" cursor belongs to the returned emitter: all of its subscribers share
    /// one upstream subscription and see the same deduplicated stream.
    pub fn dedupe_by(&self, same: impl Fn(&T, &T) -> bool + 'static) -> Self
    where
        T: Clone,
    {
        let last: RefCell<Option<T>> = RefCell::new(None);
        shared_node(self, move |value, listeners| {
            let duplicate = last
                .borrow()
                .as_ref()
                .is_some_and(|previous| same(previous, value));
            if duplicate {
                return Ok(());
            }
            *last.borrow_mut() = Some(value.clone());
            listeners.emit(value)
        })
    }

    /// Run `cb` once per upstream emission, then fan out.
    ///
    /// The upstream subscription is opened by the first subscriber and closed when the last
    /// one leaves, so `cb` only runs while something is listening.
    pub fn tap(&self, cb: impl Fn(&T) + 'static) -> Self {
        shared_node(self, move |value, listeners| {
            cb(value);
            listeners.emit(value)
        })
    }

    /// Hand `self` to `branch` for side-wiring and return it unchanged.
    pub fn fork(&self, branch: impl FnOnce(&Self)) -> Self {
        branch(self);
        self.clone()
    }
}

struct SharedNode<T> {
    listeners: ListenerSet<T>,
    upstream: RefCell<Option<Subscription>>,
}

/// Emitter whose subscribers share a single upstream subscription.
fn shared_node<T: 'static>(
    source: &Emitter<T>,
    relay: impl Fn(&T, &ListenerSet<T>) -> ChoreoResult<()> + 'static,
) -> Emitter<T> {
    let parent = Rc::clone(&source.subscribe_fn);
    let node = Rc::new(SharedNode {
        listeners: ListenerSet::new(),
        upstream: RefCell::new(None),
    });
    let relay = Rc::new(relay);

    source.derive(move |handler: Handler<T>| {
        let id = node.listeners.add(handler);
        if node.listeners.len() == 1 {
            let weak = Rc::downgrade(&node);
            let relay = Rc::clone(&relay);
            let upstream = parent(Rc::new(move |value: &T| match weak.upgrade() {
                Some(node) => relay(value, &node.listeners),
                None => Ok(()),
            }));
            match upstream {
                Ok(sub) => *node.upstream.borrow_mut() = Some(sub),
                Err(e) => {
                    node.listeners.remove(id);
                    return Err(e);
                }
            }
        }

        let node = Rc::clone(&node);
        Ok(Subscription::new(move || {
            if node.listeners.remove(id) && node.listeners.is_empty() {
                let upstream = node.upstream.borrow_mut().take();
                if let Some(sub) = upstream {
                    sub.unsubscribe();
                }
            }
        }))
    })
}

/// Manually driven emission source.
///
/// Useful for feeding external signals into an emitter pipeline.
pub struct EventSource<T> {
    listeners: Rc<ListenerSet<T>>,
}

impl<T: 'static> Default for EventSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> EventSource<T> {
    /// Create a source with no listeners.
    pub fn new() -> Self {
        Self {
            listeners: Rc::new(ListenerSet::new()),
        }
    }

    /// Emitter that observes this source.
    pub fn emitter(&self) -> Emitter<T> {
        let listeners = Rc::clone(&self.listeners);
        Emitter::new(move |handler| {
            let id = listeners.add(handler);
            let listeners = Rc::clone(&listeners);
            Ok(Subscription::new(move || {
                listeners.remove(id);
            }))
        })
    }

    /// Push `value` to every current listener.
    pub fn emit(&self, value: &T) -> ChoreoResult<()> {
        self.listeners.emit(value)
    }

    /// Number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/emitter/core.rs"]
mod tests;
