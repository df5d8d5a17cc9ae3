//! `open()` flag bits.

use bitflags::bitflags;

bitflags! {
    /// Flags accepted by `open()`. The low two bits are the access mode
    /// (`O_RDONLY`/`O_WRONLY`/`O_RDWR`); the rest modify how the name is
    /// resolved or how the offset is initialized.
    pub struct OpenFlags: i32 {
        const O_RDONLY = 0x0;
        const O_WRONLY = 0x1;
        const O_RDWR   = 0x2;
        const O_ACCMODE = 0x3;
        const O_CREAT  = 0x0200;
        const O_EXCL   = 0x0800;
        const O_TRUNC  = 0x0400;
        const O_APPEND = 0x0008;
    }
}

/// The access mode an open file was opened with, derived from
/// `flags & O_ACCMODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessMode {
    /// Decodes the access-mode bits of `flags`, rejecting anything other
    /// than `O_RDONLY`, `O_WRONLY`, or `O_RDWR` with `None` (the caller
    /// turns that into `EINVAL`).
    pub fn from_flags(flags: OpenFlags) -> Option<Self> {
        match (flags & OpenFlags::O_ACCMODE).bits() {
            0x0 => Some(AccessMode::ReadOnly),
            0x1 => Some(AccessMode::WriteOnly),
            0x2 => Some(AccessMode::ReadWrite),
            _ => None,
        }
    }

    pub fn readable(self) -> bool {
        matches!(self, AccessMode::ReadOnly | AccessMode::ReadWrite)
    }

    pub fn writable(self) -> bool {
        matches!(self, AccessMode::WriteOnly | AccessMode::ReadWrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_modes() {
        assert_eq!(
            AccessMode::from_flags(OpenFlags::O_RDONLY),
            Some(AccessMode::ReadOnly)
        );
        assert_eq!(
            AccessMode::from_flags(OpenFlags::O_WRONLY),
            Some(AccessMode::WriteOnly)
        );
        assert_eq!(
            AccessMode::from_flags(OpenFlags::O_RDWR),
            Some(AccessMode::ReadWrite)
        );
    }

    #[test]
    fn ignores_non_accmode_bits() {
        let flags = OpenFlags::O_WRONLY | OpenFlags::O_APPEND | OpenFlags::O_CREAT;
        assert_eq!(AccessMode::from_flags(flags), Some(AccessMode::WriteOnly));
    }

    #[test]
    fn readable_writable() {
        assert!(AccessMode::ReadOnly.readable());
        assert!(!AccessMode::ReadOnly.writable());
        assert!(AccessMode::WriteOnly.writable());
        assert!(!AccessMode::WriteOnly.readable());
        assert!(AccessMode::ReadWrite.readable());
        assert!(AccessMode::ReadWrite.writable());
    }
}
