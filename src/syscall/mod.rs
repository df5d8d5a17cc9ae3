//! The syscall surface (§5/§7): named `sys_*` methods on [`crate::Kernel`],
//! split into file-descriptor operations and process-lifecycle operations.
//! There is no numeric dispatch table here — callers invoke `kernel.sys_open(...)`
//! directly, the way an in-process test harness (or a future trap handler
//! translating a syscall number into a direct call) would.

mod file;
mod proc;
