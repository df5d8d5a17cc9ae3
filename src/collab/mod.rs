//! Traits standing in for the subsystems this crate consumes but does not
//! own: the filesystem, the user/kernel memory copy primitives, the
//! per-process address space, the scheduler, and the ELF loader.
//!
//! Each trait is the Rust shape of a contract §6 of the specification
//! states informally (`vfs_open`, `copyin`, `as_copy`, `thread_fork`, the
//! ELF loader's `load`). Every trait ships an in-memory or bookkeeping-only
//! implementation under [`harness`] so the process/fd core can be built,
//! driven and tested without a real filesystem, MMU, or scheduler behind
//! it.

pub mod addrspace;
pub mod elf;
pub mod harness;
pub mod sched;
pub mod uio;
pub mod vfs;

pub use addrspace::{AddressSpace, AddressSpaceFactory};
pub use elf::ElfLoader;
pub use sched::Scheduler;
pub use uio::UserIo;
pub use vfs::{Vfs, Vnode};
