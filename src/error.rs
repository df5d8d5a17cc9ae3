//! The errno-shaped error taxonomy returned by every dispatcher in
//! [`crate::syscall`].
//!
//! Every fallible operation in this crate returns [`Result<T>`], letting the
//! core use ordinary `?`-propagation instead of the bare `Result<_, ()>` a
//! from-scratch kernel reaches for first. [`Error::errno`] is the one place
//! that collapses the taxonomy back down to the plain non-negative integer
//! a syscall ABI actually reports to user space.

use std::fmt;

/// Kernel error taxonomy, one variant per condition named in the syscall
/// error taxonomy of §7: bad descriptors, faulting user pointers,
/// exhausted tables, bad arguments, and VFS pass-through failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Bad file descriptor: out of range, or the slot is empty.
    Ebadf,
    /// Bad user pointer, or a string/buffer copy from user space failed.
    Efault,
    /// Kernel allocation failure.
    Enomem,
    /// The system-wide open-file table is full.
    Enfile,
    /// The process's file descriptor table is full.
    Emfile,
    /// The process table is full.
    Enproc,
    /// Bad flags, options, or `whence`.
    Einval,
    /// Too many exec() arguments.
    E2big,
    /// No such process.
    Esrch,
    /// Not a child of the caller, or the caller waited on itself.
    Echild,
    /// VFS pass-through: no such file or directory.
    Enoent,
    /// VFS pass-through: no such device or address.
    Enxio,
    /// VFS pass-through: no such device.
    Enodev,
    /// VFS pass-through: file already exists.
    Eexist,
    /// VFS pass-through: is a directory.
    Eisdir,
    /// VFS pass-through: no space left on device.
    Enospc,
    /// VFS pass-through: low-level I/O error.
    Eio,
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// The errno this variant reports to user space.
    ///
    /// Per the syscall ABI this crate implements (§7), errors are reported
    /// to the caller as small non-negative integers, never negated the way
    /// a raw Linux syscall return value is. `Enproc` and `Enxio` are kept
    /// numerically distinct even though some libc errno tables alias them.
    pub const fn errno(self) -> i32 {
        match self {
            Error::Ebadf => 9,
            Error::Efault => 14,
            Error::Enomem => 12,
            Error::Enfile => 23,
            Error::Emfile => 24,
            Error::Enproc => 25,
            Error::Einval => 22,
            Error::E2big => 7,
            Error::Esrch => 3,
            Error::Echild => 10,
            Error::Enoent => 2,
            Error::Enxio => 6,
            Error::Enodev => 19,
            Error::Eexist => 17,
            Error::Eisdir => 21,
            Error::Enospc => 28,
            Error::Eio => 5,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::Ebadf => "bad file descriptor",
            Error::Efault => "bad address",
            Error::Enomem => "cannot allocate memory",
            Error::Enfile => "system open-file table is full",
            Error::Emfile => "too many open files",
            Error::Enproc => "too many processes",
            Error::Einval => "invalid argument",
            Error::E2big => "argument list too long",
            Error::Esrch => "no such process",
            Error::Echild => "no child processes",
            Error::Enoent => "no such file or directory",
            Error::Enxio => "no such device or address",
            Error::Enodev => "no such device",
            Error::Eexist => "file exists",
            Error::Eisdir => "is a directory",
            Error::Enospc => "no space left on device",
            Error::Eio => "input/output error",
        };
        write!(f, "{msg}")
    }
}

impl std::error::Error for Error {}
