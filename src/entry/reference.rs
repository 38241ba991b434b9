//! Reference-counted entry handles
//!
//! A [`ReferenceCounted`] is one retained reference to a shared value. Every
//! handle counts once; dropping it releases that count. Retaining goes
//! through a checked increment that refuses to resurrect a value whose count
//! already reached zero, so a retain racing the final release degrades to
//! `None` instead of handing out a dead reference.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Counted<T> {
    value: T,
    refs: AtomicUsize,
}

/// One retained reference to a shared value
pub struct ReferenceCounted<T> {
    inner: Arc<Counted<T>>,
}

impl<T> ReferenceCounted<T> {
    /// Wrap a value; the returned handle holds the only reference
    pub fn wrap(value: T) -> Self {
        Self {
            inner: Arc::new(Counted {
                value,
                refs: AtomicUsize::new(1),
            }),
        }
    }

    /// Take a new retained reference.
    ///
    /// Returns `None` if the value has already been released.
    pub fn retain(&self) -> Option<Self> {
        self.inner
            .refs
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                if n == 0 {
                    None
                } else {
                    Some(n + 1)
                }
            })
            .ok()?;
        Some(Self {
            inner: Arc::clone(&self.inner),
        })
    }

    /// Release this reference explicitly (same as dropping it)
    pub fn release(self) {
        drop(self);
    }

    pub fn get(&self) -> &T {
        &self.inner.value
    }

    /// Number of outstanding retained references
    pub fn ref_count(&self) -> usize {
        self.inner.refs.load(Ordering::Acquire)
    }

    /// Whether two handles reference the same shared value
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl<T> Deref for ReferenceCounted<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner.value
    }
}

impl<T> Drop for ReferenceCounted<T> {
    fn drop(&mut self) {
        self.inner.refs.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<T: fmt::Debug> fmt::Debug for ReferenceCounted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceCounted")
            .field("refs", &self.ref_count())
            .field("value", &self.inner.value)
            .finish()
    }
}
