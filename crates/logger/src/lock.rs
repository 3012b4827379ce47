use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, MutexGuard};

static NEXT_THREAD_TOKEN: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_TOKEN: u64 = NEXT_THREAD_TOKEN.fetch_add(1, Ordering::Relaxed);
}

fn current_thread_token() -> u64 {
    THREAD_TOKEN.with(|token| *token)
}

/// Mutex that records its owning thread and panics immediately if that same
/// thread tries to acquire it again, instead of deadlocking.
///
/// Every shared structure in the pipeline (backends, the mediator's consumer
/// set, the configurator state) is guarded by one of these. A reentrant
/// acquisition is always a defect in the pipeline itself, and the fail-fast
/// behavior is what the thread-safety tests rely on.
pub struct NonReentrantMutex<T> {
    owner: AtomicU64,
    inner: Mutex<T>,
}

impl<T> NonReentrantMutex<T> {
    pub fn new(value: T) -> Self {
        NonReentrantMutex {
            owner: AtomicU64::new(0),
            inner: Mutex::new(value),
        }
    }

    /// Acquire the lock, blocking until it is free.
    ///
    /// Panics if the calling thread already holds this lock.
    pub fn lock(&self) -> NonReentrantMutexGuard<'_, T> {
        let token = current_thread_token();
        if self.owner.load(Ordering::Acquire) == token {
            panic!("NonReentrantMutex: reentrant acquisition by the owning thread");
        }
        let guard = self.inner.lock();
        self.owner.store(token, Ordering::Release);
        NonReentrantMutexGuard { lock: self, guard }
    }
}

pub struct NonReentrantMutexGuard<'a, T> {
    lock: &'a NonReentrantMutex<T>,
    guard: MutexGuard<'a, T>,
}

impl<T> Deref for NonReentrantMutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for NonReentrantMutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for NonReentrantMutexGuard<'_, T> {
    fn drop(&mut self) {
        // The inner guard is released right after this, when the field drops.
        self.lock.owner.store(0, Ordering::Release);
    }
}
