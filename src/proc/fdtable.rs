//! The per-process file descriptor table (§[`crate::file`]'s `T`): a
//! fixed-size array of slots, each either empty or holding a reference to
//! a shared [`OpenFile`].

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::fcntl::AccessMode;
use crate::file::{FileTable, OpenFile};
use crate::param::Pid;

/// Descriptors below this are reserved for the console on every process;
/// `open()` never hands one back out.
const FIRST_USER_FD: usize = 3;

/// Fixed `OPEN_MAX`-slot vector of `Option<Arc<OpenFile>>`.
///
/// Cloning an `Option<Arc<OpenFile>>` just bumps the `Arc`'s reference
/// count, so [`FdTable::share`] (used by `fork`) gets "increment every
/// non-empty slot's refcount" for free from `Vec::clone` — no manual
/// incref loop needed.
#[derive(Clone)]
pub struct FdTable {
    slots: Vec<Option<Arc<OpenFile>>>,
}

impl FdTable {
    /// An empty table of `open_max` slots, no console attached. Used by
    /// the kernel process, which never calls user-facing syscalls.
    pub fn empty(open_max: usize) -> Self {
        Self {
            slots: vec![None; open_max],
        }
    }

    /// A fresh table with fds 0/1/2 pre-populated with the console: 0
    /// read-only (stdin), 1 and 2 write-only (stdout/stderr), each its own
    /// `OpenFile` with its own offset and lock.
    pub fn with_console(
        vfs: &Arc<dyn crate::collab::Vfs>,
        files: &Arc<FileTable>,
        open_max: usize,
    ) -> Result<Self> {
        let mut table = Self::empty(open_max);
        table.slots[0] = Some(OpenFile::console(vfs, files, AccessMode::ReadOnly)?);
        table.slots[1] = Some(OpenFile::console(vfs, files, AccessMode::WriteOnly)?);
        table.slots[2] = Some(OpenFile::console(vfs, files, AccessMode::WriteOnly)?);
        Ok(table)
    }

    /// `fork`'s view of this table: every non-empty slot's `OpenFile` is
    /// shared (not copied) with the child, so a `lseek` in one process is
    /// visible in the other.
    pub fn share(&self) -> Self {
        self.clone()
    }

    fn check_range(&self, fd: usize) -> Result<()> {
        if fd >= self.slots.len() {
            Err(Error::Ebadf)
        } else {
            Ok(())
        }
    }

    /// Validates `0 <= fd < OPEN_MAX` and that the slot is occupied,
    /// exactly the common prologue every descriptor-based syscall runs
    /// first.
    pub fn get(&self, fd: usize) -> Result<Arc<OpenFile>> {
        self.check_range(fd)?;
        self.slots[fd].clone().ok_or(Error::Ebadf)
    }

    /// Claims the first free slot at index `>= FIRST_USER_FD`, per
    /// `open()`'s "first free fd >= 3" rule. `EMFILE` if none remain.
    pub fn alloc(&mut self, file: Arc<OpenFile>) -> Result<usize> {
        for (fd, slot) in self.slots.iter_mut().enumerate().skip(FIRST_USER_FD) {
            if slot.is_none() {
                *slot = Some(file);
                return Ok(fd);
            }
        }
        Err(Error::Emfile)
    }

    /// `close(fd)`: clears the slot. Dropping the last `Arc<OpenFile>`
    /// reference runs `OpenFile`'s `Drop`, which releases the vnode and
    /// frees the system-table slot — this function does not need to know
    /// whether this was the last reference.
    pub fn close(&mut self, fd: usize) -> Result<()> {
        self.check_range(fd)?;
        if self.slots[fd].take().is_none() {
            return Err(Error::Ebadf);
        }
        Ok(())
    }

    /// `dup2(old, new)`: validates both descriptors are in range, fails
    /// `EBADF` if `old`'s slot is empty, is a no-op returning `new` if
    /// `old == new`, otherwise closes whatever occupied `new` (if
    /// anything) and installs a clone of `old`'s `Arc<OpenFile>` there.
    pub fn dup2(&mut self, old: usize, new: usize) -> Result<usize> {
        self.check_range(old)?;
        self.check_range(new)?;
        let file = self.slots[old].clone().ok_or(Error::Ebadf)?;
        if old == new {
            return Ok(new);
        }
        self.slots[new] = Some(file);
        Ok(new)
    }

    /// Every non-empty slot's `pid`-independent fd: used by process exit
    /// to close the whole table through the ordinary close path.
    pub fn occupied_fds(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(fd, slot)| slot.as_ref().map(|_| fd))
            .collect()
    }
}
