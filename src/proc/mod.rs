//! The process table and per-process file descriptor table (§3/§4 of the
//! process/fd core: `P`, `FDT`, the process lifecycle state machine, and
//! `fork`'s fd-sharing rules).

mod fdtable;
mod procs;

pub use fdtable::FdTable;
pub use procs::{Proc, ProcTable, Procstate};
