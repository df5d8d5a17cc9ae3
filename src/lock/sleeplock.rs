//! Long-held mutual exclusion that additionally remembers which process
//! currently holds it, for locks guarding state a process may legitimately
//! keep across a blocking operation (a process's own table entry while
//! `waitpid` sleeps on it).

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard};

use crate::param::Pid;

/// A lock over `T` that records the pid of its current holder, mirroring
/// the teacher's `RawSleeplock` (which stores the holding process's pid in
/// place of a `-1` sentinel) but built on `std::sync::Mutex` rather than a
/// hand-rolled wait queue.
pub struct SleepLock<T> {
    name: &'static str,
    holder: Mutex<Option<Pid>>,
    inner: Mutex<T>,
}

pub struct SleepLockGuard<'a, T> {
    lock: &'a SleepLock<T>,
    data: MutexGuard<'a, T>,
}

impl<T> SleepLock<T> {
    pub const fn new(name: &'static str, data: T) -> Self {
        Self {
            name,
            holder: Mutex::new(None),
            inner: Mutex::new(data),
        }
    }

    /// Acquires the lock on behalf of `pid`, recording it as the holder
    /// until the returned guard is dropped.
    pub fn lock(&self, pid: Pid) -> SleepLockGuard<'_, T> {
        let data = self
            .inner
            .lock()
            .unwrap_or_else(|e| panic!("{}: poisoned: {e}", self.name));
        *self.holder.lock().unwrap() = Some(pid);
        SleepLockGuard { lock: self, data }
    }

    /// The pid currently holding the lock, if any. Best-effort: by the
    /// time the caller observes the result another thread may have
    /// acquired or released it.
    pub fn holding(&self) -> Option<Pid> {
        *self.holder.lock().unwrap()
    }
}

impl<T> Deref for SleepLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T> DerefMut for SleepLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.data
    }
}

impl<T> Drop for SleepLockGuard<'_, T> {
    fn drop(&mut self) {
        *self.lock.holder.lock().unwrap() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_holder_while_locked_and_clears_after() {
        let lock = SleepLock::new("test", 0);
        assert_eq!(lock.holding(), None);
        {
            let mut guard = lock.lock(7);
            *guard += 1;
            assert_eq!(lock.holding(), Some(7));
        }
        assert_eq!(lock.holding(), None);
    }
}
