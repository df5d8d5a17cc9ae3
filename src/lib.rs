//! Process table, per-process file descriptors and the fork/exec/wait
//! system-call core of a small teaching kernel.
//!
//! This crate owns exactly the three subsystems that make up a Unix-style
//! process layer on top of a filesystem this crate does not itself
//! implement: the process table and process lifecycle (`proc`), the
//! per-process file descriptor table layered over a system-wide open-file
//! table (`file`), and the syscall dispatchers that drive them
//! (`syscall::file`, `syscall::proc`). Everything the real kernel would
//! supply around this core — a filesystem, a page-table-backed address
//! space, a preemptive scheduler, an ELF loader, user/kernel memory copies
//! — is expressed as a trait in `collab` so the core can be built, driven
//! and tested without the rest of the kernel.

pub mod collab;
pub mod error;
pub mod exec;
pub mod fcntl;
pub mod file;
pub mod kernel;
pub mod lock;
pub mod param;
pub mod proc;
pub mod stat;
pub mod syscall;
pub mod trapframe;

pub use error::{Error, Result};
pub use kernel::Kernel;
