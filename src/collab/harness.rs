//! In-memory, bookkeeping-only implementations of the collaborator traits,
//! used by this crate's own tests and available to any embedder that wants
//! to exercise the process/fd core before wiring up a real filesystem, MMU,
//! or scheduler.
//!
//! None of these types are `cfg(test)`-gated: a real kernel still needs
//! *something* behind these traits on day one (e.g. an in-memory root
//! filesystem while the real one is still being written), so this module
//! ships as ordinary library code, the way the teacher ships its own
//! `hal.rs` software fallbacks alongside the hardware-backed ones.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::trace;

use crate::collab::addrspace::{AddressSpace, AddressSpaceFactory};
use crate::collab::elf::ElfLoader;
use crate::collab::sched::Scheduler;
use crate::collab::uio::UserIo;
use crate::collab::vfs::{Vfs, Vnode};
use crate::error::{Error, Result};
use crate::fcntl::OpenFlags;
use crate::param::Pid;
use crate::stat::{FileKind, Stat};

/// A vnode backed by a `Vec<u8>` held in memory, or the console (which
/// discards writes and yields EOF on read).
struct MemVnode {
    ino: u64,
    kind: FileKind,
    data: Mutex<Vec<u8>>,
}

static NEXT_INO: AtomicU64 = AtomicU64::new(1);

impl MemVnode {
    fn new(kind: FileKind, initial: Vec<u8>) -> Arc<Self> {
        Arc::new(MemVnode {
            ino: NEXT_INO.fetch_add(1, Ordering::Relaxed),
            kind,
            data: Mutex::new(initial),
        })
    }

    fn truncate(&self) {
        self.data.lock().unwrap().clear();
    }
}

impl Vnode for MemVnode {
    fn read(&self, offset: i64, buf: &mut [u8]) -> Result<usize> {
        if self.kind == FileKind::Device {
            return Ok(0);
        }
        let data = self.data.lock().unwrap();
        let offset = offset.max(0) as usize;
        if offset >= data.len() {
            return Ok(0);
        }
        let n = buf.len().min(data.len() - offset);
        buf[..n].copy_from_slice(&data[offset..offset + n]);
        Ok(n)
    }

    fn write(&self, offset: i64, buf: &[u8]) -> Result<usize> {
        if self.kind == FileKind::Device {
            trace!("console write: {} bytes", buf.len());
            return Ok(buf.len());
        }
        let mut data = self.data.lock().unwrap();
        let offset = offset.max(0) as usize;
        if offset + buf.len() > data.len() {
            data.resize(offset + buf.len(), 0);
        }
        data[offset..offset + buf.len()].copy_from_slice(buf);
        Ok(buf.len())
    }

    fn stat(&self) -> Result<Stat> {
        Ok(Stat {
            dev: 0,
            ino: self.ino,
            typ: self.kind,
            nlink: 1,
            size: self.size()?,
        })
    }

    fn size(&self) -> Result<u64> {
        if self.kind == FileKind::Device {
            return Ok(0);
        }
        Ok(self.data.lock().unwrap().len() as u64)
    }
}

/// An in-memory flat namespace: paths map directly to vnodes, with no
/// directory hierarchy. Good enough to drive `open`/`close`/`remove` and a
/// working directory concept without a real filesystem behind it.
pub struct MemVfs {
    files: Mutex<HashMap<String, Arc<MemVnode>>>,
    console: Arc<MemVnode>,
}

impl MemVfs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            files: Mutex::new(HashMap::new()),
            console: MemVnode::new(FileKind::Device, Vec::new()),
        })
    }

    /// Test/bootstrap helper: seeds `path` with `contents` so it exists
    /// before any `open()` call.
    pub fn seed(&self, path: &str, contents: &[u8]) {
        self.files.lock().unwrap().insert(
            path.to_string(),
            MemVnode::new(FileKind::File, contents.to_vec()),
        );
    }
}

impl Vfs for MemVfs {
    fn open(&self, path: &str, flags: OpenFlags) -> Result<Arc<dyn Vnode>> {
        let mut files = self.files.lock().unwrap();
        let exists = files.contains_key(path);
        if exists && flags.contains(OpenFlags::O_CREAT) && flags.contains(OpenFlags::O_EXCL) {
            return Err(Error::Eexist);
        }
        if !exists {
            if !flags.contains(OpenFlags::O_CREAT) {
                return Err(Error::Enoent);
            }
            files.insert(path.to_string(), MemVnode::new(FileKind::File, Vec::new()));
        }
        let vnode = files.get(path).unwrap().clone();
        if flags.contains(OpenFlags::O_TRUNC) {
            vnode.truncate();
        }
        Ok(vnode as Arc<dyn Vnode>)
    }

    fn close(&self, _vnode: &Arc<dyn Vnode>) {}

    fn remove(&self, path: &str) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or(Error::Enoent)
    }

    fn setcurdir(&self, _vnode: &Arc<dyn Vnode>) -> Result<()> {
        Ok(())
    }

    fn getcwd(&self, _cwd: &Arc<dyn Vnode>, buf: &mut [u8]) -> Result<usize> {
        let path = b"/";
        let n = path.len().min(buf.len());
        buf[..n].copy_from_slice(&path[..n]);
        Ok(n)
    }

    fn console(&self) -> Arc<dyn Vnode> {
        self.console.clone() as Arc<dyn Vnode>
    }
}

/// Copies between user addresses and kernel buffers using a flat `Vec<u8>`
/// as the simulated user address space, with address 0 reserved as an
/// always-faulting null pointer.
pub struct BufferUserIo {
    memory: Mutex<Vec<u8>>,
}

impl BufferUserIo {
    pub fn new(size: usize) -> Arc<Self> {
        Arc::new(Self {
            memory: Mutex::new(vec![0u8; size]),
        })
    }
}

impl UserIo for BufferUserIo {
    fn copy_in(&self, src: usize, dst: &mut [u8]) -> Result<()> {
        if src == 0 {
            return Err(Error::Efault);
        }
        let mem = self.memory.lock().unwrap();
        let end = src.checked_add(dst.len()).ok_or(Error::Efault)?;
        if end > mem.len() {
            return Err(Error::Efault);
        }
        dst.copy_from_slice(&mem[src..end]);
        Ok(())
    }

    fn copy_out(&self, dst: usize, src: &[u8]) -> Result<()> {
        if dst == 0 {
            return Err(Error::Efault);
        }
        let mut mem = self.memory.lock().unwrap();
        let end = dst.checked_add(src.len()).ok_or(Error::Efault)?;
        if end > mem.len() {
            return Err(Error::Efault);
        }
        mem[dst..end].copy_from_slice(src);
        Ok(())
    }

    /// Scans for a NUL starting at `src`, never reading past `max_len`
    /// bytes or past the end of the simulated address space, whichever
    /// comes first. Only a byte that is actually unmapped (beyond the end
    /// of `memory`) faults; a NUL found anywhere within `max_len`, however
    /// close to the end of the mapped region, is a valid, in-range
    /// terminator.
    fn copy_in_str(&self, src: usize, max_len: usize) -> Result<String> {
        if src == 0 {
            return Err(Error::Efault);
        }
        let mem = self.memory.lock().unwrap();
        if src >= mem.len() {
            return Err(Error::Efault);
        }
        let wanted_end = src.checked_add(max_len).ok_or(Error::Efault)?;
        let mapped_end = wanted_end.min(mem.len());
        let slice = &mem[src..mapped_end];
        if let Some(nul) = slice.iter().position(|&b| b == 0) {
            return String::from_utf8(slice[..nul].to_vec()).map_err(|_| Error::Einval);
        }
        if mapped_end < wanted_end {
            Err(Error::Efault)
        } else {
            Err(Error::Einval)
        }
    }
}

/// Bookkeeping-only address space: tracks nothing but where its stack was
/// defined, enough for `fork`/`execv` tests to assert on.
pub struct TestAddressSpace {
    pub stack_top: usize,
}

impl AddressSpace for TestAddressSpace {
    fn activate(&self) {}

    fn define_stack(&mut self) -> Result<usize> {
        Ok(self.stack_top)
    }
}

pub struct TestAddressSpaceFactory {
    stack_top: usize,
}

impl TestAddressSpaceFactory {
    pub fn new(stack_top: usize) -> Arc<Self> {
        Arc::new(Self { stack_top })
    }
}

impl AddressSpaceFactory for TestAddressSpaceFactory {
    fn create(&self) -> Box<dyn AddressSpace> {
        Box::new(TestAddressSpace {
            stack_top: self.stack_top,
        })
    }

    fn copy(&self, _parent: &dyn AddressSpace) -> Result<Box<dyn AddressSpace>> {
        Ok(Box::new(TestAddressSpace {
            stack_top: self.stack_top,
        }))
    }
}

/// Scheduler stand-in that only logs; no real dispatch happens.
pub struct InlineScheduler;

impl InlineScheduler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl Scheduler for InlineScheduler {
    fn thread_fork(&self, pid: Pid) {
        trace!("thread_fork: pid {pid}");
    }

    fn thread_exit(&self, pid: Pid) {
        trace!("thread_exit: pid {pid}");
    }
}

/// An ELF loader that treats every vnode as already loaded, handing back a
/// fixed entry point. Lets `execv` be exercised end to end without a real
/// ELF parser.
pub struct StubElfLoader {
    entry_point: usize,
}

impl StubElfLoader {
    pub fn new(entry_point: usize) -> Arc<Self> {
        Arc::new(Self { entry_point })
    }
}

impl ElfLoader for StubElfLoader {
    fn load(&self, _vnode: &Arc<dyn Vnode>, addrspace: &mut dyn AddressSpace) -> Result<usize> {
        addrspace.activate();
        Ok(self.entry_point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mem_vfs_create_then_read_back() {
        let vfs = MemVfs::new();
        let vnode = vfs.open("/hello", OpenFlags::O_CREAT | OpenFlags::O_RDWR).unwrap();
        vnode.write(0, b"hi").unwrap();
        let mut buf = [0u8; 2];
        let n = vnode.read(0, &mut buf).unwrap();
        assert_eq!(n, 2);
        assert_eq!(&buf, b"hi");
    }

    #[test]
    fn mem_vfs_missing_without_creat_is_enoent() {
        let vfs = MemVfs::new();
        assert_eq!(vfs.open("/nope", OpenFlags::O_RDONLY).unwrap_err(), Error::Enoent);
    }

    #[test]
    fn mem_vfs_excl_on_existing_is_eexist() {
        let vfs = MemVfs::new();
        vfs.seed("/x", b"");
        let flags = OpenFlags::O_CREAT | OpenFlags::O_EXCL | OpenFlags::O_RDWR;
        assert_eq!(vfs.open("/x", flags).unwrap_err(), Error::Eexist);
    }

    #[test]
    fn buffer_user_io_round_trips() {
        let io = BufferUserIo::new(4096);
        io.copy_out(100, b"hello").unwrap();
        let mut buf = [0u8; 5];
        io.copy_in(100, &mut buf).unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn buffer_user_io_null_pointer_faults() {
        let io = BufferUserIo::new(4096);
        let mut buf = [0u8; 1];
        assert_eq!(io.copy_in(0, &mut buf).unwrap_err(), Error::Efault);
    }

    #[test]
    fn buffer_user_io_copy_in_str_reads_until_nul() {
        let io = BufferUserIo::new(4096);
        io.copy_out(0x10, b"hi\0garbage").unwrap();
        let s = io.copy_in_str(0x10, 32).unwrap();
        assert_eq!(s, "hi");
    }

    /// A string that terminates well within `max_len` but whose
    /// `max_len`-wide scan window would run past the end of the mapped
    /// buffer must still succeed — only an actually-unmapped byte should
    /// fault, not merely a `max_len` window that overruns the buffer.
    #[test]
    fn buffer_user_io_copy_in_str_short_string_near_buffer_end_succeeds() {
        let io = BufferUserIo::new(16);
        io.copy_out(10, b"hi\0").unwrap();
        let s = io.copy_in_str(10, 64).unwrap();
        assert_eq!(s, "hi");
    }

    #[test]
    fn buffer_user_io_copy_in_str_unmapped_byte_before_nul_faults() {
        let io = BufferUserIo::new(16);
        io.copy_out(0, &[1u8; 16]).unwrap();
        assert_eq!(io.copy_in_str(5, 64).unwrap_err(), Error::Efault);
    }

    #[test]
    fn buffer_user_io_copy_in_str_no_nul_within_max_len_is_einval() {
        let io = BufferUserIo::new(4096);
        io.copy_out(0x10, b"xxxx").unwrap();
        assert_eq!(io.copy_in_str(0x10, 4).unwrap_err(), Error::Einval);
    }
}
