//! The kernel object: the single value that owns every system-wide table
//! and every collaborator this crate needs but does not implement itself
//! (§6's VFS, user I/O, address space, scheduler, and ELF loader seams).
//!
//! Grounded on the teacher's `Kernel`/`KernelBuilder` split — here
//! simplified to a single `Arc`-shared struct, since none of this crate's
//! state needs the teacher's pinned, zero-initialized-then-`init`
//! two-phase construction (nothing here is placed in a fixed physical
//! memory layout before Rust's allocator exists).

use std::sync::Arc;

use log::info;

use crate::collab::{AddressSpaceFactory, ElfLoader, Scheduler, UserIo, Vfs};
use crate::error::Result;
use crate::file::FileTable;
use crate::param::{Config, Pid};
use crate::proc::{FdTable, Proc, ProcTable};

/// Everything a booted kernel needs behind the process/fd core: the
/// system-wide open-file table, the process table, and the five
/// collaborator seams this crate consumes but does not own.
pub struct Kernel {
    pub(crate) config: Config,
    pub(crate) procs: ProcTable,
    pub(crate) files: Arc<FileTable>,
    pub(crate) vfs: Arc<dyn Vfs>,
    pub(crate) io: Arc<dyn UserIo>,
    pub(crate) as_factory: Arc<dyn AddressSpaceFactory>,
    pub(crate) elf_loader: Arc<dyn ElfLoader>,
    pub(crate) scheduler: Arc<dyn Scheduler>,
}

impl Kernel {
    pub fn new(
        config: Config,
        vfs: Arc<dyn Vfs>,
        io: Arc<dyn UserIo>,
        as_factory: Arc<dyn AddressSpaceFactory>,
        elf_loader: Arc<dyn ElfLoader>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let files = FileTable::new(config.system_open_max);
        Self {
            procs: ProcTable::new(&config),
            files,
            vfs,
            io,
            as_factory,
            elf_loader,
            scheduler,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn procs(&self) -> &ProcTable {
        &self.procs
    }

    pub fn files(&self) -> &Arc<FileTable> {
        &self.files
    }

    pub fn io(&self) -> &Arc<dyn UserIo> {
        &self.io
    }

    /// Creates the first user process (conventionally pid 1): a fresh
    /// address space, the root vnode as its working directory, and fds
    /// 0/1/2 wired to the console. Mirrors what a booted kernel's
    /// `user_proc_init` does once, at startup.
    pub fn spawn_init(&self, name: &str) -> Result<Arc<Proc>> {
        let fd_table = FdTable::with_console(&self.vfs, &self.files, self.config.open_max)?;
        let memory = self.as_factory.create();
        let cwd = self.vfs.console();
        let proc = self.procs.create(name.to_string(), memory, cwd, fd_table)?;
        self.scheduler.thread_fork(proc.pid());
        info!("spawned init process, pid {}", proc.pid());
        Ok(proc)
    }

    pub(crate) fn get_proc(&self, pid: Pid) -> Result<Arc<Proc>> {
        self.procs.get(pid).ok_or(crate::error::Error::Esrch)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::collab::harness::{
        BufferUserIo, InlineScheduler, MemVfs, StubElfLoader, TestAddressSpaceFactory,
    };

    pub(crate) fn test_kernel() -> Kernel {
        Kernel::new(
            Config::default(),
            MemVfs::new(),
            BufferUserIo::new(1 << 20),
            TestAddressSpaceFactory::new(1 << 19),
            StubElfLoader::new(0x1000),
            InlineScheduler::new(),
        )
    }

    #[test]
    fn spawn_init_occupies_pid_one() {
        let kernel = test_kernel();
        let proc = kernel.spawn_init("init").unwrap();
        assert_eq!(proc.pid(), 1);
    }

    #[test]
    fn spawn_init_has_console_on_fds_0_1_2() {
        let kernel = test_kernel();
        let proc = kernel.spawn_init("init").unwrap();
        let table = proc.fd_table();
        assert!(table.get(0).is_ok());
        assert!(table.get(1).is_ok());
        assert!(table.get(2).is_ok());
    }
}
