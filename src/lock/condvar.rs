//! Rendezvous points used by `waitpid`/`_exit` and by `wait_while`-style
//! spins elsewhere in the process table.
//!
//! Generalizes the teacher's `WaitChannel`, which parks a process on a
//! per-channel sleep queue and requires the caller to pass in the lock
//! being slept on so it can be released for the duration of the sleep.
//! `std::sync::Condvar` already encodes that exact protocol through
//! `Condvar::wait(MutexGuard)`, so this wrapper only adds a name for
//! debugging and a `notify_all` convenience.

use std::sync::{Condvar, MutexGuard};

pub struct WaitChannel {
    name: &'static str,
    inner: Condvar,
}

impl WaitChannel {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Condvar::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Atomically releases `guard`'s lock and blocks the calling thread
    /// until woken by [`WaitChannel::wake_all`], then re-acquires it.
    pub fn sleep<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        self.inner.wait(guard).unwrap_or_else(|e| {
            panic!("{}: poisoned: {e}", self.name);
        })
    }

    /// Wakes every thread sleeping on this channel. `waitpid`/`_exit` use
    /// this rather than a targeted wakeup because several children can be
    /// exiting, or several parents waiting, on the same process table's
    /// single channel at once.
    pub fn wake_all(&self) {
        self.inner.notify_all();
    }
}
