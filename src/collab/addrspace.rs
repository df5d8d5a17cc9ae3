//! `AddressSpace`/`AddressSpaceFactory`: stands in for `as_create`,
//! `as_copy`, `as_activate`, `as_define_stack`, `as_destroy`.

use crate::error::Result;

/// One process's address space.
///
/// Destruction (`as_destroy`) is modeled as `Drop`, not a trait method:
/// once a [`crate::proc::Proc`] drops its last reference to its address
/// space, the implementation's own `Drop` impl runs. This keeps the trait
/// object-safe, since `as_destroy(self)` would require `Self: Sized`.
pub trait AddressSpace: Send + Sync {
    /// `as_activate`: makes this the address space the MMU currently
    /// translates against. A no-op for implementations that do not model
    /// an MMU.
    fn activate(&self);

    /// `as_define_stack`: carves out the user stack region and returns the
    /// initial stack pointer `exec` should place in the new trapframe,
    /// before the argument vector is pushed onto it.
    fn define_stack(&mut self) -> Result<usize>;
}

/// Creates and duplicates address spaces; kept separate from
/// [`AddressSpace`] because `create`/`copy` return `Self`-sized values and
/// so cannot live on an object-safe trait alongside per-instance methods.
pub trait AddressSpaceFactory: Send + Sync {
    /// `as_create`, called once by `fork()` for the child and once, deep
    /// inside `execv`, to replace the caller's own address space with a
    /// fresh one built from the new executable.
    fn create(&self) -> Box<dyn AddressSpace>;

    /// `as_copy`: deep-copies `parent` for use by a freshly forked child.
    fn copy(&self, parent: &dyn AddressSpace) -> Result<Box<dyn AddressSpace>>;
}
