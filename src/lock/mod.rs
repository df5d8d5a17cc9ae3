//! Synchronisation primitives.
//!
//! Three tiers, matching the teacher's own `RawSpinlock`/`Sleeplock`/
//! `Sleepablelock` split, generalized from bare-metal busy-waiting and a
//! hand-rolled wait queue to `std::sync`: [`SpinLock`] for short critical
//! sections, [`SleepLock`] for state a process may hold across a blocking
//! call, and [`WaitChannel`] for the rendezvous `waitpid`/`_exit` need.

mod condvar;
mod sleeplock;
mod spinlock;

pub use condvar::WaitChannel;
pub use sleeplock::{SleepLock, SleepLockGuard};
pub use spinlock::SpinLock;
