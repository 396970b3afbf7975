use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Blocking counting semaphore bounding how many chunks run at once.
///
/// The guarded value is a plain counter, so a poisoned lock is recovered rather than propagated.
pub struct Semaphore {
    permits: Mutex<usize>,
    cv: Condvar,
}

impl Semaphore {
    pub fn new(permits: usize) -> Self {
        assert!(permits > 0, "permits must be > 0");
        Self {
            permits: Mutex::new(permits),
            cv: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.permits.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take one permit, blocking until one is free.
    ///
    /// Returns how long the caller was blocked (zero if a permit was free).
    pub fn acquire(&self) -> Duration {
        let start = Instant::now();
        let mut guard = self.lock();
        if *guard > 0 {
            *guard -= 1;
            return Duration::ZERO;
        }
        guard = self
            .cv
            .wait_while(guard, |permits| *permits == 0)
            .unwrap_or_else(PoisonError::into_inner);
        *guard -= 1;
        start.elapsed()
    }

    /// Return one permit.
    pub fn release(&self) {
        *self.lock() += 1;
        self.cv.notify_one();
    }
}
