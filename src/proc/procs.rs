//! The process object and the bounded, pid-indexed process table.
//!
//! Grounded on the teacher's `Procs`/`Proc` split (`Procs::alloc`,
//! `allocpid`, `reparent`) but replacing the branded-lifetime, pinned,
//! intrusive-pointer discipline that a bare-metal kernel needs to satisfy
//! the borrow checker around raw pointers with ordinary `Arc`/`Mutex`
//! ownership — ordinary shared ownership is all a hosted reimplementation
//! needs, since nothing here is relocated in physical memory.

use std::sync::{Arc, MutexGuard};

use log::{debug, trace, warn};

use crate::collab::{AddressSpace, AddressSpaceFactory, Vfs, Vnode};
use crate::error::{Error, Result};
use crate::lock::{SpinLock, WaitChannel};
use crate::param::{Config, Pid};
use crate::stat::Stat;

use super::fdtable::FdTable;
use crate::trapframe::TrapFrame;

/// Stands in for the kernel process's (nonexistent) address space: slot 0
/// never execs, never forks, and never runs user code, so it needs
/// *something* behind the `AddressSpace` trait object rather than a real
/// one — and, per SPEC_FULL §4.4, "no table initialisation beyond name".
/// Deliberately not one of `collab::harness`'s test doubles: this is core
/// process-table code, not a test, and must not depend on which concrete
/// collaborators the surrounding `Kernel` was actually built with.
struct NoAddressSpace;

impl AddressSpace for NoAddressSpace {
    fn activate(&self) {}

    fn define_stack(&mut self) -> Result<usize> {
        unreachable!("the kernel process never execs")
    }
}

/// Stands in for the kernel process's (nonexistent) working directory, for
/// the same reason as [`NoAddressSpace`]: the kernel process never calls
/// `chdir`/`getcwd` or forks, so no real `Vnode` is ever needed behind it.
struct NoVnode;

impl Vnode for NoVnode {
    fn read(&self, _offset: i64, _buf: &mut [u8]) -> Result<usize> {
        unreachable!("the kernel process has no cwd")
    }

    fn write(&self, _offset: i64, _buf: &[u8]) -> Result<usize> {
        unreachable!("the kernel process has no cwd")
    }

    fn stat(&self) -> Result<Stat> {
        unreachable!("the kernel process has no cwd")
    }

    fn size(&self) -> Result<u64> {
        unreachable!("the kernel process has no cwd")
    }
}

/// A user process's coarse lifecycle state (§4.6's state machine:
/// created → runnable → running → zombie → reaped). `Running` and
/// `Runnable` are collapsed into one variant here since this crate models
/// no preemptive scheduler of its own — `thread_count` already tells
/// `waitpid` everything it needs (zero means zombie-or-reaped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Procstate {
    Runnable,
    Zombie,
}

/// The mutable fields guarded by a process's own lock: everything
/// `waitpid`/`_exit`/`fork` touch on a live proc other than its file
/// table, address space, and cwd (which get their own locks since they
/// are never read or written as part of the wait/exit rendezvous).
struct ProcInner {
    state: Procstate,
    parent_pid: Option<Pid>,
    children: Vec<Pid>,
    thread_count: usize,
    exit_status: Option<i32>,
    trap_frame: TrapFrame,
}

/// One process: a stable name, a pid, and every piece of kernel-resident
/// state it owns (§3's `P`). `inner` and `wait` together are the "wait
/// lock and condition variable pair used solely for wait/exit rendezvous"
/// — `SpinLock::lock` hands back a plain `std::sync::MutexGuard`, which is
/// exactly what [`WaitChannel::sleep`] needs to release-and-reacquire
/// around the sleep.
pub struct Proc {
    name: String,
    pid: Pid,
    inner: SpinLock<ProcInner>,
    wait: WaitChannel,
    fd_table: SpinLock<FdTable>,
    memory: SpinLock<Box<dyn AddressSpace>>,
    cwd: SpinLock<Arc<dyn Vnode>>,
}

impl Proc {
    fn new(
        pid: Pid,
        name: String,
        memory: Box<dyn AddressSpace>,
        cwd: Arc<dyn Vnode>,
        fd_table: FdTable,
    ) -> Self {
        Self {
            name,
            pid,
            inner: SpinLock::new(
                "proc",
                ProcInner {
                    state: Procstate::Runnable,
                    parent_pid: None,
                    children: Vec::new(),
                    thread_count: 1,
                    exit_status: None,
                    trap_frame: TrapFrame::new(),
                },
            ),
            wait: WaitChannel::new("proc_wait"),
            fd_table: SpinLock::new("fd_table", fd_table),
            memory: SpinLock::new("memory", memory),
            cwd: SpinLock::new("cwd", cwd),
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_pid(&self) -> Option<Pid> {
        self.inner.lock().parent_pid
    }

    pub fn is_child(&self, pid: Pid) -> bool {
        self.inner.lock().children.iter().any(|&c| c == pid)
    }

    pub fn thread_count(&self) -> usize {
        self.inner.lock().thread_count
    }

    pub fn state(&self) -> Procstate {
        self.inner.lock().state
    }

    pub fn exit_status(&self) -> Option<i32> {
        self.inner.lock().exit_status
    }

    pub fn fd_table(&self) -> MutexGuard<'_, FdTable> {
        self.fd_table.lock()
    }

    pub fn memory(&self) -> MutexGuard<'_, Box<dyn AddressSpace>> {
        self.memory.lock()
    }

    pub fn cwd(&self) -> Arc<dyn Vnode> {
        self.cwd.lock().clone()
    }

    pub fn set_cwd(&self, vnode: Arc<dyn Vnode>) {
        *self.cwd.lock() = vnode;
    }

    /// Replaces this process's address space wholesale (`execv`'s "install
    /// the new address space, destroy the old"): the old `Box` is dropped
    /// right here, running whatever teardown its concrete type's `Drop`
    /// impl does, before the new one is activated.
    pub fn replace_memory(&self, new_memory: Box<dyn AddressSpace>) {
        let mut memory = self.memory.lock();
        *memory = new_memory;
        memory.activate();
    }

    pub fn trap_frame(&self) -> TrapFrame {
        self.inner.lock().trap_frame
    }

    pub fn set_trap_frame(&self, trap_frame: TrapFrame) {
        self.inner.lock().trap_frame = trap_frame;
    }

    /// `fork`'s family-tracking step: appends `child_pid` to this
    /// process's child list and points the child back at `self`.
    fn link_child(&self, child: &Proc) {
        self.inner.lock().children.push(child.pid);
        child.inner.lock().parent_pid = Some(self.pid);
    }

    /// `_exit(code)`: encodes the low 8 bits of `code`, marks this process
    /// a zombie, and wakes every thread sleeping in `waitpid` on it.
    pub fn signal_exit(&self, code: i32) {
        let mut inner = self.inner.lock();
        inner.exit_status = Some(code & 0xff);
        inner.thread_count = 0;
        inner.state = Procstate::Zombie;
        debug!("proc {}: exited with status {}", self.pid, code & 0xff);
        drop(inner);
        self.wait.wake_all();
    }

    /// Blocks the caller until this process becomes a zombie (thread count
    /// reaches zero), returning its exit status. Used by `waitpid` without
    /// `WNOHANG`.
    fn wait_for_zombie(&self) -> i32 {
        let mut inner = self.inner.lock();
        while inner.thread_count != 0 {
            inner = self.wait.sleep(inner);
        }
        inner.exit_status.unwrap_or(0)
    }

    /// Non-blocking zombie check for `WNOHANG`: `Some(status)` if this
    /// process has already exited, `None` if it is still running.
    fn zombie_status(&self) -> Option<i32> {
        let inner = self.inner.lock();
        if inner.thread_count == 0 {
            Some(inner.exit_status.unwrap_or(0))
        } else {
            None
        }
    }
}

struct ProcTableInner {
    slots: Vec<Option<Arc<Proc>>>,
    last_pid: Pid,
}

/// Bounded, pid-indexed table of live processes (§3's "Process table").
/// Slot 0 is reserved for the kernel process and is never recycled; user
/// pids run `1..=proc_max`.
pub struct ProcTable {
    proc_max: usize,
    inner: SpinLock<ProcTableInner>,
}

impl ProcTable {
    pub fn new(config: &Config) -> Self {
        let mut slots = Vec::with_capacity(config.proc_max + 1);
        slots.push(Some(Arc::new(Proc::new(
            0,
            "kernel".to_string(),
            Box::new(NoAddressSpace),
            Arc::new(NoVnode),
            FdTable::empty(config.open_max),
        ))));
        for _ in 1..=config.proc_max {
            slots.push(None);
        }
        Self {
            proc_max: config.proc_max,
            inner: SpinLock::new(
                "proc_table",
                ProcTableInner {
                    slots,
                    last_pid: 0,
                },
            ),
        }
    }

    pub fn get(&self, pid: Pid) -> Option<Arc<Proc>> {
        if pid < 0 {
            return None;
        }
        self.inner.lock().slots.get(pid as usize)?.clone()
    }

    /// `proc_create`: allocates a pid by a circular next-fit scan from
    /// `last_pid + 1` (skipping slot 0) and registers the process in that
    /// slot, all under the table's single lock. Returns `ENPROC` if every
    /// slot is occupied.
    ///
    /// Registration happens last and atomically with pid allocation so
    /// that a caller which has already done the expensive, fallible work
    /// (`as_copy`, trapframe snapshot) only discovers `ENPROC` at the very
    /// end, with nothing left to roll back.
    pub fn create(
        &self,
        name: String,
        memory: Box<dyn AddressSpace>,
        cwd: Arc<dyn Vnode>,
        fd_table: FdTable,
    ) -> Result<Arc<Proc>> {
        let mut inner = self.inner.lock();
        let pid = Self::alloc_pid_locked(&mut inner, self.proc_max)?;
        let proc = Arc::new(Proc::new(pid, name, memory, cwd, fd_table));
        inner.slots[pid as usize] = Some(proc.clone());
        inner.last_pid = pid;
        trace!("proc_table: allocated pid {pid}");
        Ok(proc)
    }

    fn alloc_pid_locked(inner: &mut ProcTableInner, proc_max: usize) -> Result<Pid> {
        let mut candidate = inner.last_pid;
        for _ in 0..proc_max {
            candidate = if (candidate as usize) >= proc_max {
                1
            } else {
                candidate + 1
            };
            if inner.slots[candidate as usize].is_none() {
                return Ok(candidate);
            }
        }
        warn!("proc_table: out of process slots");
        Err(Error::Enproc)
    }

    /// `fork`'s family-linking step, exposed so `sys_fork` can call it once
    /// both parent and child exist.
    pub fn link_child(&self, parent: &Proc, child: &Proc) {
        parent.link_child(child);
    }

    /// Blocks until `pid` becomes a zombie (or returns immediately under
    /// `WNOHANG`), then reaps it. Returns `(pid, status)`. `None` under
    /// `WNOHANG` when the child has not exited yet.
    pub fn wait_and_reap(&self, pid: Pid, nohang: bool) -> Result<Option<(Pid, i32)>> {
        let proc = self.get(pid).ok_or(Error::Esrch)?;
        let status = if nohang {
            match proc.zombie_status() {
                Some(s) => s,
                None => return Ok(None),
            }
        } else {
            proc.wait_for_zombie()
        };
        self.destroy(pid)?;
        Ok(Some((pid, status)))
    }

    /// `proc_destroy`: preconditions are `thread_count == 0` and `pid !=
    /// 0` (the kernel process is never destroyed) — both are fatal
    /// assertions, matching the spec's "assertions are fatal bugs".
    /// Removes the slot, then reparents any remaining children (set their
    /// `parent_pid` to `None`) and unlinks this pid from its own parent's
    /// child list.
    pub fn destroy(&self, pid: Pid) -> Result<()> {
        assert_ne!(pid, 0, "proc_destroy: cannot destroy the kernel process");
        let mut inner = self.inner.lock();
        let proc = inner.slots[pid as usize].take().ok_or(Error::Esrch)?;
        assert_eq!(
            proc.thread_count(),
            0,
            "proc_destroy: pid {pid} still has live threads"
        );

        let (parent_pid, children) = {
            let proc_inner = proc.inner.lock();
            (proc_inner.parent_pid, proc_inner.children.clone())
        };

        for child_pid in children {
            if let Some(child) = &inner.slots[child_pid as usize] {
                child.inner.lock().parent_pid = None;
            }
        }

        if let Some(ppid) = parent_pid {
            if let Some(parent) = &inner.slots[ppid as usize] {
                parent.inner.lock().children.retain(|&c| c != pid);
            }
        }

        debug!("proc_table: reaped pid {pid}");
        Ok(())
    }
}
