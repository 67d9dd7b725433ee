//! Single-assignment deferred values with observers (§4.2).
//!
//! A `Placeholder<T>` may be resolved at most once. Listeners may be
//! registered before or after resolution: a listener registered after
//! resolution is invoked immediately, synchronously, with the already-known
//! value.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{EmitError, PlaceholderAlreadyResolvedCtx};

enum State<T> {
    Pending(Vec<Box<dyn FnMut(&T)>>),
    Resolved(T),
}

/// A value that may not be known yet, typically because it depends on a
/// forward/circular reference still being emitted.
pub struct Placeholder<T> {
    inner: Rc<RefCell<State<T>>>,
}

impl<T> Clone for Placeholder<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Placeholder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.inner.borrow() {
            State::Pending(cbs) => f
                .debug_tuple("Placeholder::Pending")
                .field(&cbs.len())
                .finish(),
            State::Resolved(v) => f.debug_tuple("Placeholder::Resolved").field(v).finish(),
        }
    }
}

impl<T> Default for Placeholder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Placeholder<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(State::Pending(Vec::new()))),
        }
    }

    /// Registers `listener` to run once this placeholder resolves. If it is
    /// already resolved, `listener` runs immediately.
    pub fn on_resolve<F>(&self, mut listener: F)
    where
        T: Clone,
        F: FnMut(&T) + 'static,
    {
        let already = {
            let mut inner = self.inner.borrow_mut();
            match &mut *inner {
                State::Resolved(value) => Some(value.clone()),
                State::Pending(listeners) => {
                    listeners.push(Box::new(listener));
                    None
                }
            }
        };
        if let Some(value) = already {
            listener(&value);
        }
    }

    /// Assigns the value, notifying every registered listener in
    /// registration order. Returns an error if already resolved.
    pub fn resolve(&self, value: T) -> Result<(), EmitError>
    where
        T: Clone,
    {
        let previous = std::mem::replace(
            &mut *self.inner.borrow_mut(),
            State::Resolved(value.clone()),
        );
        match previous {
            State::Resolved(_) => {
                // restore: this placeholder stays resolved to its original value
                *self.inner.borrow_mut() = State::Resolved(value);
                PlaceholderAlreadyResolvedCtx.fail()
            }
            State::Pending(mut listeners) => {
                for listener in &mut listeners {
                    listener(&value);
                }
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(&*self.inner.borrow(), State::Resolved(_))
    }

    #[must_use]
    pub fn get(&self) -> Option<T>
    where
        T: Clone,
    {
        match &*self.inner.borrow() {
            State::Resolved(value) => Some(value.clone()),
            State::Pending(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc as StdRc;

    #[test]
    fn late_listener_receives_value_immediately() {
        let ph = Placeholder::new();
        ph.resolve(42).unwrap();
        let seen = StdRc::new(Cell::new(0));
        let seen2 = seen.clone();
        ph.on_resolve(move |v| seen2.set(*v));
        assert_eq!(seen.get(), 42);
    }

    #[test]
    fn early_listener_fires_on_resolve() {
        let ph = Placeholder::new();
        let seen = StdRc::new(Cell::new(0));
        let seen2 = seen.clone();
        ph.on_resolve(move |v| seen2.set(*v));
        assert_eq!(seen.get(), 0);
        ph.resolve(7).unwrap();
        assert_eq!(seen.get(), 7);
    }

    #[test]
    fn double_resolve_is_an_error() {
        let ph = Placeholder::new();
        ph.resolve(1).unwrap();
        assert!(ph.resolve(2).is_err());
        assert_eq!(ph.get(), Some(1));
    }

    #[test]
    fn multiple_listeners_all_fire() {
        let ph = Placeholder::new();
        let count = StdRc::new(Cell::new(0));
        for _ in 0..3 {
            let count = count.clone();
            ph.on_resolve(move |_: &i32| count.set(count.get() + 1));
        }
        ph.resolve(1).unwrap();
        assert_eq!(count.get(), 3);
    }
}
