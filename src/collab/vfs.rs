//! `Vfs`/`Vnode`: stands in for `vfs_open`, `vfs_close`, `VOP_READ`,
//! `VOP_WRITE`, `VOP_STAT`, `vfs_setcurdir`, `vfs_getcwd`.

use std::sync::Arc;

use crate::error::Result;
use crate::fcntl::OpenFlags;
use crate::stat::Stat;

/// One open vnode's operations: `VOP_READ`, `VOP_WRITE`, `VOP_STAT`.
///
/// A vnode is named, not owned, by an [`crate::file::OpenFile`] — several
/// open files (after `dup2`/`fork`) and, independently, several *distinct*
/// open-file objects from separate `open()` calls on the same path may all
/// reference the same vnode. Reference counting at the vnode level is the
/// filesystem's concern, not this crate's; this crate only counts
/// references to the [`crate::file::OpenFile`] wrapping a vnode.
pub trait Vnode: Send + Sync {
    /// `VOP_READ`: read up to `buf.len()` bytes starting at `offset`.
    /// Returns the number of bytes actually read.
    fn read(&self, offset: i64, buf: &mut [u8]) -> Result<usize>;

    /// `VOP_WRITE`: write `buf` starting at `offset`. Returns the number of
    /// bytes actually written.
    fn write(&self, offset: i64, buf: &[u8]) -> Result<usize>;

    /// `VOP_STAT`.
    fn stat(&self) -> Result<Stat>;

    /// Current size in bytes, needed to seed the offset of an `O_APPEND`
    /// open.
    fn size(&self) -> Result<u64>;
}

/// Stands in for the handful of path-level VFS entry points the core
/// calls: `vfs_open`, `vfs_close`, `remove`, `vfs_setcurdir`/`vfs_getcwd`,
/// plus a way to name the console device that fds 0/1/2 are wired to.
pub trait Vfs: Send + Sync {
    /// `vfs_open(path, flags, mode)`.
    fn open(&self, path: &str, flags: OpenFlags) -> Result<Arc<dyn Vnode>>;

    /// `vfs_close(vnode)`. Called once an [`crate::file::OpenFile`]'s
    /// reference count reaches zero.
    fn close(&self, vnode: &Arc<dyn Vnode>);

    /// Removes a name from the namespace. Does not affect already-open
    /// descriptors referencing the same vnode (ordinary Unix unlink
    /// semantics).
    fn remove(&self, path: &str) -> Result<()>;

    /// `vfs_setcurdir`.
    fn setcurdir(&self, vnode: &Arc<dyn Vnode>) -> Result<()>;

    /// `vfs_getcwd`: renders `cwd`'s path into `buf`, returning the number
    /// of bytes written.
    fn getcwd(&self, cwd: &Arc<dyn Vnode>, buf: &mut [u8]) -> Result<usize>;

    /// A vnode naming the console device (`con:`), used to pre-populate
    /// fds 0, 1, 2 on process creation.
    fn console(&self) -> Arc<dyn Vnode>;
}
