use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

struct CompletionState<T> {
    value: Option<T>,
    callbacks: Vec<Box<dyn FnOnce(&T)>>,
    wakers: Vec<Waker>,
}

/// One-shot value that resolves at most once.
///
/// Observe it with [`Completion::then`], poll it with [`Completion::value`], or `.await` it
/// from a single-threaded executor.
pub struct Completion<T> {
    state: Rc<RefCell<CompletionState<T>>>,
}

impl<T> Clone for Completion<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("value", &self.state.borrow().value)
            .finish()
    }
}

impl<T: Clone + 'static> Completion<T> {
    pub(crate) fn pending() -> Self {
        Self {
            state: Rc::new(RefCell::new(CompletionState {
                value: None,
                callbacks: Vec::new(),
                wakers: Vec::new(),
            })),
        }
    }

    /// An already-resolved completion.
    pub fn ready(value: T) -> Self {
        let c = Self::pending();
        c.resolve(value);
        c
    }

    /// Resolve with `value`. Returns `false` if it was already resolved.
    pub(crate) fn resolve(&self, value: T) -> bool {
        let (callbacks, wakers) = {
            let mut state = self.state.borrow_mut();
            if state.value.is_some() {
                return false;
            }
            state.value = Some(value.clone());
            (
                std::mem::take(&mut state.callbacks),
                std::mem::take(&mut state.wakers),
            )
        };
        for cb in callbacks {
            cb(&value);
        }
        for waker in wakers {
            waker.wake();
        }
        true
    }

    /// Whether the value has arrived.
    pub fn is_complete(&self) -> bool {
        self.state.borrow().value.is_some()
    }

    /// The resolved value, if any.
    pub fn value(&self) -> Option<T> {
        self.state.borrow().value.clone()
    }

    /// Run `f` on resolution, or right away if already resolved.
    pub fn then(&self, f: impl FnOnce(&T) + 'static) {
        let ready = self.value();
        match ready {
            Some(value) => f(&value),
            None => self.state.borrow_mut().callbacks.push(Box::new(f)),
        }
    }
}

impl<T: Clone> Future for Completion<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let mut state = self.state.borrow_mut();
        if let Some(value) = state.value.clone() {
            return Poll::Ready(value);
        }
        state.wakers.push(cx.waker().clone());
        Poll::Pending
    }
}

#[cfg(test)]
#[path = "../../tests/unit/emitter/completion.rs"]
mod tests;
