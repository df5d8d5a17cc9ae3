//! Process-lifecycle system calls (§5.2): `getpid`, `fork`, `execv`,
//! `waitpid`, `_exit`.

use log::trace;

use crate::error::{Error, Result};
use crate::kernel::Kernel;
use crate::param::{Pid, WNOHANG};

impl Kernel {
    pub fn sys_getpid(&self, pid: Pid) -> Result<Pid> {
        self.get_proc(pid).map(|p| p.pid())
    }

    /// `fork()`: copies the calling process's address space, shares its fd
    /// table (every open slot's refcount goes up by one, not its data),
    /// inherits its working directory, and snapshots its trapframe with
    /// `a0` zeroed so the child's pending syscall appears to return 0.
    ///
    /// Registers the new process in the table last, after the (fallible,
    /// comparatively expensive) address-space copy has already succeeded,
    /// so `ENPROC` is the only failure this call needs to report with
    /// nothing left to roll back.
    pub fn sys_fork(&self, pid: Pid) -> Result<Pid> {
        trace!("sys_fork: parent pid {pid}");
        let parent = self.get_proc(pid)?;
        let memory = self.as_factory.copy(&**parent.memory())?;
        let fd_table = parent.fd_table().share();
        let cwd = parent.cwd();
        let child = self
            .procs
            .create(parent.name().to_string(), memory, cwd, fd_table)?;

        let mut trap_frame = parent.trap_frame();
        trap_frame.a0 = 0;
        child.set_trap_frame(trap_frame);

        self.procs.link_child(&parent, &child);
        self.scheduler.thread_fork(child.pid());
        Ok(child.pid())
    }

    /// `_exit(code)`: closes every open descriptor, marks the process a
    /// zombie with `code`'s low byte recorded as its exit status, and wakes
    /// any thread blocked in `waitpid` on it. Does not reap the process —
    /// that is `waitpid`'s job, once a parent collects it.
    pub fn sys_exit(&self, pid: Pid, code: i32) -> Result<()> {
        trace!("sys_exit: pid {pid}, code {code}");
        let proc = self.get_proc(pid)?;
        {
            let mut fds = proc.fd_table();
            for fd in fds.occupied_fds() {
                let _ = fds.close(fd);
            }
        }
        proc.signal_exit(code);
        self.scheduler.thread_exit(pid);
        Ok(())
    }

    /// `waitpid(child_pid, options)`: blocks (unless `WNOHANG` is set)
    /// until `child_pid` — which must be a direct child of the caller —
    /// becomes a zombie, then reaps it and returns `(pid, status)`.
    /// `EINVAL` if `options` carries any bit other than `WNOHANG`;
    /// `ECHILD` if `child_pid` does not name a child of the caller (a
    /// process is never its own child, so this also rejects `child_pid
    /// == pid`).
    pub fn waitpid(&self, pid: Pid, child_pid: Pid, options: i32) -> Result<Option<(Pid, i32)>> {
        trace!("waitpid: pid {pid} waiting on {child_pid}, options {options}");
        if options & !WNOHANG != 0 {
            return Err(Error::Einval);
        }
        let parent = self.get_proc(pid)?;
        if !parent.is_child(child_pid) {
            return Err(Error::Echild);
        }
        self.procs.wait_and_reap(child_pid, options & WNOHANG != 0)
    }

    /// `execv(path, argv)`: see [`crate::exec::execv`].
    pub fn sys_execv(&self, pid: Pid, path_ptr: usize, argv: Vec<String>) -> Result<usize> {
        crate::exec::execv(self, pid, path_ptr, argv)
    }
}
