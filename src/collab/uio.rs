//! `UserIo`: stands in for `copyin`/`copyout`/`copyinstr`.
//!
//! Kept separate from [`crate::collab::addrspace::AddressSpace`] because the
//! specification itself treats "copy bytes across the user/kernel boundary"
//! and "manage the address space's regions" as distinct concerns — a read()
//! syscall needs the former but never touches the latter.

use crate::error::Result;

/// Copies bytes between a user-space pointer and kernel-space buffers.
///
/// The "pointer" is represented as a plain `usize` throughout this crate's
/// public syscall surface, matching how the specification describes
/// arguments (`fd`, `buf`, `count` as opaque register values); the
/// translation from that integer to an actual validated user address is
/// entirely this trait's business.
pub trait UserIo: Send + Sync {
    /// `copyin`: copies `dst.len()` bytes from user address `src` into
    /// `dst`. Fails with `Error::Efault` if any part of the range is not
    /// mapped and readable.
    fn copy_in(&self, src: usize, dst: &mut [u8]) -> Result<()>;

    /// `copyout`: copies `src.len()` bytes into user address `dst`. Fails
    /// with `Error::Efault` if any part of the range is not mapped and
    /// writable.
    fn copy_out(&self, dst: usize, src: &[u8]) -> Result<()>;

    /// `copyinstr`: copies a NUL-terminated string of at most `max_len`
    /// bytes (NUL excluded) from user address `src`. Fails with
    /// `Error::Efault` on an unmapped byte and `Error::Einval` if no NUL is
    /// found within `max_len` bytes.
    fn copy_in_str(&self, src: usize, max_len: usize) -> Result<String>;
}
