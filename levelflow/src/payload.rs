//! A convenience payload handle with built-in exclusive access.

use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::Arc;

/// A cloneable, mutex-protected payload.
///
/// The engine never locks the payload. Tasks that share a level in a parallel
/// run may touch it at the same time, so the caller is responsible for
/// synchronization. `SharedPayload` is the ready-made answer: every clone
/// points at the same value and each access takes the lock.
pub struct SharedPayload<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> SharedPayload<T> {
    /// Wraps a value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
        }
    }

    /// Locks the payload for exclusive access.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }

    /// Tries to lock the payload without blocking.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
        self.inner.try_lock()
    }

    /// Runs a closure with exclusive access and returns its result.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Returns the inner value if this is the last handle.
    ///
    /// # Errors
    ///
    /// Returns `self` back when other clones are still alive.
    pub fn try_into_inner(self) -> Result<T, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl<T: Clone> SharedPayload<T> {
    /// Returns a copy of the current value.
    pub fn snapshot(&self) -> T {
        self.inner.lock().clone()
    }
}

impl<T> Clone for SharedPayload<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default> Default for SharedPayload<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for SharedPayload<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedPayload<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Some(value) => f.debug_tuple("SharedPayload").field(&*value).finish(),
            None => f.debug_tuple("SharedPayload").field(&"<locked>").finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_clones_share_value() {
        let payload: SharedPayload<HashMap<String, f64>> = SharedPayload::default();
        let clone = payload.clone();

        clone.lock().insert("milk".to_string(), 1.0);

        assert_eq!(payload.lock().get("milk"), Some(&1.0));
    }

    #[test]
    fn test_with_returns_value() {
        let payload = SharedPayload::new(vec![1, 2]);
        let len = payload.with(|v| {
            v.push(3);
            v.len()
        });
        assert_eq!(len, 3);
        assert_eq!(payload.snapshot(), vec![1, 2, 3]);
    }

    #[test]
    fn test_try_into_inner() {
        let payload = SharedPayload::new(5);
        let clone = payload.clone();

        let payload = payload.try_into_inner().unwrap_err();
        drop(clone);

        assert_eq!(payload.try_into_inner().unwrap(), 5);
    }

    #[test]
    fn test_debug_while_locked() {
        let payload = SharedPayload::new(1);
        let _guard = payload.lock();
        assert_eq!(format!("{payload:?}"), "SharedPayload(\"<locked>\")");
    }
}
