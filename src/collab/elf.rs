//! `ElfLoader`: stands in for `load_elf`, the part of `execv` that maps an
//! executable's segments into a freshly created address space.

use std::sync::Arc;

use crate::collab::addrspace::AddressSpace;
use crate::collab::vfs::Vnode;
use crate::error::Result;

pub trait ElfLoader: Send + Sync {
    /// Loads the executable named by `vnode` into `addrspace`, returning
    /// the entry point `execv` should place in the new trapframe's `epc`.
    /// Fails with `Error::Einval` if `vnode` is not a loadable image (this
    /// crate's taxonomy has no distinct ENOEXEC variant).
    fn load(&self, vnode: &Arc<dyn Vnode>, addrspace: &mut dyn AddressSpace) -> Result<usize>;
}
