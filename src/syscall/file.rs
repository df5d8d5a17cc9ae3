//! File-descriptor system calls (§5.1): `open`, `close`, `read`, `write`,
//! `dup2`, `lseek`, `chdir`, `getcwd`, `remove`, and the supplemented
//! `fstat` (decided in `DESIGN.md`'s Open Questions).
//!
//! Every call here does the same three things: look up the calling
//! process by pid, validate/resolve its arguments (a path through `io`,
//! a descriptor through the process's [`crate::proc::FdTable`]), and
//! delegate to [`crate::file::OpenFile`] or the table itself.

use log::trace;

use crate::error::{Error, Result};
use crate::fcntl::OpenFlags;
use crate::file::{OpenFile, Whence};
use crate::kernel::Kernel;
use crate::param::Pid;
use crate::stat::{FileKind, Stat};

fn whence_from_i32(whence: i32) -> Result<Whence> {
    match whence {
        0 => Ok(Whence::Set),
        1 => Ok(Whence::Cur),
        2 => Ok(Whence::End),
        _ => Err(Error::Einval),
    }
}

/// Packs a [`Stat`] into the fixed byte layout `fstat`'s caller expects:
/// `dev`, `ino`, `typ`, `nlink`, `size`, each little-endian, back to back.
fn encode_stat(stat: &Stat) -> [u8; 25] {
    let mut buf = [0u8; 25];
    buf[0..4].copy_from_slice(&stat.dev.to_le_bytes());
    buf[4..12].copy_from_slice(&stat.ino.to_le_bytes());
    buf[12] = match stat.typ {
        FileKind::File => 0,
        FileKind::Dir => 1,
        FileKind::Device => 2,
    };
    buf[13..17].copy_from_slice(&stat.nlink.to_le_bytes());
    buf[17..25].copy_from_slice(&stat.size.to_le_bytes());
    buf
}

impl Kernel {
    /// `open(path, flags)`: resolves `path` through the VFS and installs
    /// the resulting [`OpenFile`] in the first free descriptor `>= 3`.
    pub fn sys_open(&self, pid: Pid, path_ptr: usize, flags: OpenFlags) -> Result<usize> {
        trace!("sys_open: pid {pid}");
        let proc = self.get_proc(pid)?;
        let path = self.io.copy_in_str(path_ptr, self.config.path_max)?;
        let file = OpenFile::open(&self.vfs, &self.files, &path, flags)?;
        proc.fd_table().alloc(file)
    }

    /// `close(fd)`.
    pub fn sys_close(&self, pid: Pid, fd: usize) -> Result<()> {
        trace!("sys_close: pid {pid}, fd {fd}");
        let proc = self.get_proc(pid)?;
        proc.fd_table().close(fd)
    }

    /// `read(fd, buf, n)`.
    pub fn sys_read(&self, pid: Pid, fd: usize, buf_ptr: usize, n: usize) -> Result<usize> {
        let proc = self.get_proc(pid)?;
        let file = proc.fd_table().get(fd)?;
        file.read(pid, &*self.io, buf_ptr, n)
    }

    /// `write(fd, buf, n)`.
    pub fn sys_write(&self, pid: Pid, fd: usize, buf_ptr: usize, n: usize) -> Result<usize> {
        let proc = self.get_proc(pid)?;
        let file = proc.fd_table().get(fd)?;
        file.write(pid, &*self.io, buf_ptr, n)
    }

    /// `dup2(old, new)`.
    pub fn sys_dup2(&self, pid: Pid, old: usize, new: usize) -> Result<usize> {
        let proc = self.get_proc(pid)?;
        proc.fd_table().dup2(old, new)
    }

    /// `lseek(fd, delta, whence)`.
    pub fn sys_lseek(&self, pid: Pid, fd: usize, delta: i64, whence: i32) -> Result<i64> {
        let proc = self.get_proc(pid)?;
        let file = proc.fd_table().get(fd)?;
        file.seek(pid, whence_from_i32(whence)?, delta)
    }

    /// `chdir(path)`: resolves `path` to a vnode and installs it as the
    /// process's current directory. Does not check filesystem permissions
    /// (an explicit non-goal).
    pub fn sys_chdir(&self, pid: Pid, path_ptr: usize) -> Result<()> {
        let proc = self.get_proc(pid)?;
        let path = self.io.copy_in_str(path_ptr, self.config.path_max)?;
        let vnode = self.vfs.open(&path, OpenFlags::O_RDONLY)?;
        self.vfs.setcurdir(&vnode)?;
        proc.set_cwd(vnode);
        Ok(())
    }

    /// `getcwd(buf, size)`: writes the current directory's path into the
    /// caller's buffer, returning the number of bytes written.
    pub fn sys_getcwd(&self, pid: Pid, buf_ptr: usize, size: usize) -> Result<usize> {
        let proc = self.get_proc(pid)?;
        let cwd = proc.cwd();
        let mut tmp = vec![0u8; size];
        let n = self.vfs.getcwd(&cwd, &mut tmp)?;
        self.io.copy_out(buf_ptr, &tmp[..n])?;
        Ok(n)
    }

    /// `remove(path)`.
    pub fn sys_remove(&self, pid: Pid, path_ptr: usize) -> Result<()> {
        let _proc = self.get_proc(pid)?;
        let path = self.io.copy_in_str(path_ptr, self.config.path_max)?;
        self.vfs.remove(&path)
    }

    /// `fstat(fd, statbuf)`: supplemented operation (not in the
    /// distilled syscall list, but present on every other descriptor-based
    /// syscall surface this crate is modeled on).
    pub fn sys_fstat(&self, pid: Pid, fd: usize, stat_ptr: usize) -> Result<()> {
        let proc = self.get_proc(pid)?;
        let file = proc.fd_table().get(fd)?;
        let stat = file.stat()?;
        self.io.copy_out(stat_ptr, &encode_stat(&stat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::tests::test_kernel;

    fn write_path(kernel: &Kernel, addr: usize, path: &str) {
        let mut bytes = path.as_bytes().to_vec();
        bytes.push(0);
        kernel.io.copy_out(addr, &bytes).unwrap();
    }

    #[test]
    fn open_write_close_close_again_fails() {
        let kernel = test_kernel();
        let proc = kernel.spawn_init("init").unwrap();
        write_path(&kernel, 0x1000, "/f");

        let fd = kernel
            .sys_open(proc.pid(), 0x1000, OpenFlags::O_CREAT | OpenFlags::O_RDWR)
            .unwrap();
        assert_eq!(fd, 3);

        kernel.io.copy_out(0x2000, b"hi").unwrap();
        let written = kernel.sys_write(proc.pid(), fd, 0x2000, 2).unwrap();
        assert_eq!(written, 2);

        kernel.sys_close(proc.pid(), fd).unwrap();
        assert_eq!(
            kernel.sys_close(proc.pid(), fd).unwrap_err(),
            Error::Ebadf
        );
    }

    #[test]
    fn dup2_keeps_file_alive_after_original_closes() {
        let kernel = test_kernel();
        let proc = kernel.spawn_init("init").unwrap();
        write_path(&kernel, 0x1000, "/f");
        let fd = kernel
            .sys_open(proc.pid(), 0x1000, OpenFlags::O_CREAT | OpenFlags::O_RDWR)
            .unwrap();
        let dup = kernel.sys_dup2(proc.pid(), fd, 10).unwrap();
        kernel.sys_close(proc.pid(), fd).unwrap();

        kernel.io.copy_out(0x2000, b"ok").unwrap();
        let written = kernel.sys_write(proc.pid(), dup, 0x2000, 2).unwrap();
        assert_eq!(written, 2);
    }

    #[test]
    fn read_past_eof_returns_zero() {
        let kernel = test_kernel();
        let proc = kernel.spawn_init("init").unwrap();
        write_path(&kernel, 0x1000, "/empty");
        let fd = kernel
            .sys_open(proc.pid(), 0x1000, OpenFlags::O_CREAT | OpenFlags::O_RDONLY)
            .unwrap();
        let n = kernel.sys_read(proc.pid(), fd, 0x2000, 16).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn open_missing_file_without_creat_is_enoent() {
        let kernel = test_kernel();
        let proc = kernel.spawn_init("init").unwrap();
        write_path(&kernel, 0x1000, "/missing");
        let err = kernel
            .sys_open(proc.pid(), 0x1000, OpenFlags::O_RDONLY)
            .unwrap_err();
        assert_eq!(err, Error::Enoent);
    }

    #[test]
    fn fstat_reports_size_after_write() {
        let kernel = test_kernel();
        let proc = kernel.spawn_init("init").unwrap();
        write_path(&kernel, 0x1000, "/f");
        let fd = kernel
            .sys_open(proc.pid(), 0x1000, OpenFlags::O_CREAT | OpenFlags::O_RDWR)
            .unwrap();
        kernel.io.copy_out(0x2000, b"abcd").unwrap();
        kernel.sys_write(proc.pid(), fd, 0x2000, 4).unwrap();
        kernel.sys_fstat(proc.pid(), fd, 0x3000).unwrap();
        let mut buf = [0u8; 25];
        kernel.io.copy_in(0x3000, &mut buf).unwrap();
        let size = u64::from_le_bytes(buf[17..25].try_into().unwrap());
        assert_eq!(size, 4);
    }
}
