//! The open-file object ([`OpenFile`]) and the system-wide table bounding
//! how many of them may exist at once ([`FileTable`]).
//!
//! A per-process descriptor (§[`crate::proc`]'s `FdTable`) never owns an
//! `OpenFile` directly; it holds an `Arc<OpenFile>`, so `dup2` and `fork`
//! share one offset and one open-file object exactly the way two
//! descriptors sharing one system-table entry do in a real kernel. Only
//! [`OpenFile::open`] consumes a slot in [`FileTable`] — cloning the `Arc`
//! for a dup or a fork does not, matching `NFILE`'s role as a bound on
//! *opens*, not on descriptor references to them.

use std::convert::TryFrom;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::collab::{UserIo, Vfs, Vnode};
use crate::error::{Error, Result};
use crate::fcntl::{AccessMode, OpenFlags};
use crate::lock::SleepLock;
use crate::param::Pid;
use crate::stat::Stat;

/// Where `lseek` measures its offset from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Set,
    Cur,
    End,
}

/// Bounds the number of [`OpenFile`]s that may exist system-wide at once,
/// per `SYSTEM_OPEN_MAX`. Shared by every `OpenFile` so its `Drop` impl can
/// release the slot it claimed.
pub struct FileTable {
    capacity: usize,
    open_count: AtomicUsize,
}

impl FileTable {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            capacity,
            open_count: AtomicUsize::new(0),
        })
    }

    /// Claims one slot, serializing the check-and-increment so two
    /// concurrent `open()`s cannot both observe room for the last slot.
    /// The lock is dropped before `open()`'s VFS call, so no descriptor
    /// holds the table lock across a (potentially blocking) filesystem
    /// operation.
    fn claim(&self) -> Result<()> {
        loop {
            let current = self.open_count.load(Ordering::Acquire);
            if current >= self.capacity {
                return Err(Error::Enfile);
            }
            if self
                .open_count
                .compare_exchange(current, current + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Ok(());
            }
        }
    }

    fn release(&self) {
        self.open_count.fetch_sub(1, Ordering::AcqRel);
    }

    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::Acquire)
    }
}

/// One entry in the system-wide open-file table: a vnode, the access mode
/// it was opened with, and the shared read/write offset every descriptor
/// referencing this object sees.
///
/// The offset lives behind a [`SleepLock`] rather than a bare mutex: every
/// read/write/lseek on this object is held across a (potentially blocking)
/// `VOP_READ`/`VOP_WRITE` call, exactly the kind of "held across a sleep"
/// critical section the sleep-lock is for, and the holder's pid is useful
/// for diagnosing a wedged descriptor.
pub struct OpenFile {
    vnode: Arc<dyn Vnode>,
    vfs: Arc<dyn Vfs>,
    table: Arc<FileTable>,
    offset: SleepLock<i64>,
    mode: AccessMode,
}

impl OpenFile {
    /// `sys_open`'s core: claims a system-table slot, resolves `path`
    /// through `vfs`, and seeds the offset (0, or the vnode's current size
    /// under `O_APPEND`).
    pub fn open(
        vfs: &Arc<dyn Vfs>,
        table: &Arc<FileTable>,
        path: &str,
        flags: OpenFlags,
    ) -> Result<Arc<Self>> {
        let mode = AccessMode::from_flags(flags).ok_or(Error::Einval)?;
        table.claim()?;
        let vnode = match vfs.open(path, flags) {
            Ok(vnode) => vnode,
            Err(e) => {
                table.release();
                return Err(e);
            }
        };
        let offset = if flags.contains(OpenFlags::O_APPEND) {
            vnode.size()? as i64
        } else {
            0
        };
        Ok(Arc::new(Self {
            vnode,
            vfs: vfs.clone(),
            table: table.clone(),
            offset: SleepLock::new("openfile", offset),
            mode,
        }))
    }

    /// Pre-populates fds 0/1/2 on process creation with the console, each
    /// with its own open-file object and its own offset/mode (stdin
    /// read-only, stdout/stderr write-only). Claims a table slot like any
    /// other open, so a kernel with `SYSTEM_OPEN_MAX` exhausted by other
    /// processes cannot start a new one either.
    pub fn console(vfs: &Arc<dyn Vfs>, table: &Arc<FileTable>, mode: AccessMode) -> Result<Arc<Self>> {
        table.claim()?;
        Ok(Arc::new(Self {
            vnode: vfs.console(),
            vfs: vfs.clone(),
            table: table.clone(),
            offset: SleepLock::new("console", 0),
            mode,
        }))
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// `VOP_READ` through the current offset, copying the result out to
    /// `user_buf` via `io`. Advances the shared offset by the number of
    /// bytes actually read. `pid` names the calling process, recorded as
    /// the sleep-lock's holder for the duration of the call.
    pub fn read(&self, pid: Pid, io: &dyn UserIo, user_buf: usize, n: usize) -> Result<usize> {
        if !self.mode.readable() {
            return Err(Error::Ebadf);
        }
        let mut offset = self.offset.lock(pid);
        let mut tmp = vec![0u8; n];
        let read = self.vnode.read(*offset, &mut tmp)?;
        io.copy_out(user_buf, &tmp[..read])?;
        *offset += i64::try_from(read).map_err(|_| Error::Einval)?;
        Ok(read)
    }

    /// `VOP_WRITE` through the current offset, copying the source bytes in
    /// from `user_buf` via `io`. Advances the shared offset by the number
    /// of bytes actually written.
    pub fn write(&self, pid: Pid, io: &dyn UserIo, user_buf: usize, n: usize) -> Result<usize> {
        if !self.mode.writable() {
            return Err(Error::Ebadf);
        }
        let mut tmp = vec![0u8; n];
        io.copy_in(user_buf, &mut tmp)?;
        let mut offset = self.offset.lock(pid);
        let written = self.vnode.write(*offset, &tmp)?;
        *offset += i64::try_from(written).map_err(|_| Error::Einval)?;
        Ok(written)
    }

    /// `lseek`: repositions the shared offset and returns its new value.
    /// Rejects a result that would go negative with `Error::Einval`.
    pub fn seek(&self, pid: Pid, whence: Whence, delta: i64) -> Result<i64> {
        let mut offset = self.offset.lock(pid);
        let base = match whence {
            Whence::Set => 0,
            Whence::Cur => *offset,
            Whence::End => self.vnode.size()? as i64,
        };
        let new_offset = base.checked_add(delta).ok_or(Error::Einval)?;
        if new_offset < 0 {
            return Err(Error::Einval);
        }
        *offset = new_offset;
        Ok(new_offset)
    }

    pub fn current_offset(&self, pid: Pid) -> i64 {
        *self.offset.lock(pid)
    }

    /// `VOP_STAT`.
    pub fn stat(&self) -> Result<Stat> {
        self.vnode.stat()
    }
}

impl Drop for OpenFile {
    /// Releases this object's system-table slot only once every descriptor
    /// referencing it (the last `Arc<OpenFile>` clone) is gone, which is
    /// exactly what `Arc`'s own drop-when-last-reference semantics give us
    /// for free — no manual "close if refcount hits zero" bookkeeping is
    /// needed here, unlike the arena a from-scratch allocator needs.
    fn drop(&mut self) {
        self.vfs.close(&self.vnode);
        self.table.release();
    }
}
