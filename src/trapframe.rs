//! The trapframe: an opaque, architecture-specific register-file snapshot
//! captured at the user→kernel transition.
//!
//! `fork()` must copy this by value and hand the copy to the child; the
//! real field layout (which registers, in what order) is entirely
//! machine-dependent and irrelevant to the process/fd core, so only the
//! handful of fields `fork`/`exec` actually touch are named here.

/// A snapshot of the user registers at the moment a process trapped into
/// the kernel.
///
/// `Copy` because `fork()` does a byte-for-byte `memcpy` of the parent's
/// trapframe to seed the child's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrapFrame {
    /// Saved user program counter; `exec` overwrites this with the new
    /// image's entry point.
    pub epc: usize,
    /// Saved user stack pointer; `exec` overwrites this with the address
    /// of the freshly built argument stack.
    pub sp: usize,
    /// Return-value register (`a0` on RISC-V). `fork` sets the child's
    /// copy to 0 so the child's syscall appears to return 0; the parent's
    /// own trapframe is left untouched and later carries the real child
    /// pid, set by the syscall wrapper.
    pub a0: usize,
    /// `argc`, as `exec` leaves it for the new image's entry point.
    pub a1_argc: usize,
    /// User pointer to the `argv` array, as `exec` leaves it.
    pub a2_argv: usize,
    /// General-purpose scratch registers not otherwise interpreted by this
    /// crate, preserved verbatim across fork.
    pub regs: [usize; 8],
}

impl TrapFrame {
    pub const fn new() -> Self {
        Self {
            epc: 0,
            sp: 0,
            a0: 0,
            a1_argc: 0,
            a2_argv: 0,
            regs: [0; 8],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fork_copy_is_independent() {
        let mut parent = TrapFrame::new();
        parent.a0 = 42;
        let mut child = parent;
        child.a0 = 0;
        assert_eq!(parent.a0, 42);
        assert_eq!(child.a0, 0);
    }
}
