//! `Scheduler`: stands in for `thread_fork`/`thread_exit`.
//!
//! No user-mode execution is modeled by this crate, so this trait carries
//! no scheduling policy of its own; it exists purely so `fork()` and
//! `_exit()` have somewhere to report "a thread was born" / "a thread is
//! gone" without reaching into a concrete scheduler implementation.

use crate::param::Pid;

pub trait Scheduler: Send + Sync {
    /// `thread_fork`: a new thread has been created to run `pid`'s entry
    /// trapframe.
    fn thread_fork(&self, pid: Pid);

    /// `thread_exit`: `pid`'s last thread has finished; the scheduler
    /// should never dispatch it again.
    fn thread_exit(&self, pid: Pid);
}
