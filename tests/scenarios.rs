//! Crate-level integration tests exercising the literal scenarios from
//! the process/fd core's testable-properties list end to end through the
//! public `Kernel` syscall surface, against the in-memory harness
//! collaborators.

use os161_rs::collab::harness::{
    BufferUserIo, InlineScheduler, MemVfs, StubElfLoader, TestAddressSpaceFactory,
};
use os161_rs::collab::AddressSpaceFactory;
use os161_rs::fcntl::OpenFlags;
use os161_rs::param::{Config, WNOHANG};
use os161_rs::{Error, Kernel};

fn new_kernel() -> Kernel {
    Kernel::new(
        Config::default(),
        MemVfs::new(),
        BufferUserIo::new(1 << 20),
        TestAddressSpaceFactory::new(1 << 19),
        StubElfLoader::new(0x4000),
        InlineScheduler::new(),
    )
}

fn write_path(kernel: &Kernel, addr: usize, path: &str) {
    let mut bytes = path.as_bytes().to_vec();
    bytes.push(0);
    kernel.io().copy_out(addr, &bytes).unwrap();
}

/// Scenario 1: open a fresh file returns the first fd above the console
/// slots; write reports the bytes moved; a second close on the same fd
/// fails EBADF.
#[test]
fn open_write_close_close_again_fails() {
    let kernel = new_kernel();
    let proc = kernel.spawn_init("init").unwrap();
    write_path(&kernel, 0x1000, "/dev/console-like");

    let fd = kernel
        .sys_open(proc.pid(), 0x1000, OpenFlags::O_CREAT | OpenFlags::O_WRONLY)
        .unwrap();
    assert_eq!(fd, 3);

    kernel.io().copy_out(0x2000, b"hi").unwrap();
    assert_eq!(kernel.sys_write(proc.pid(), fd, 0x2000, 2).unwrap(), 2);

    kernel.sys_close(proc.pid(), fd).unwrap();
    assert_eq!(kernel.sys_close(proc.pid(), fd).unwrap_err(), Error::Ebadf);
}

/// Scenario 2: dup2 onto a fresh fd keeps the underlying open-file alive
/// (via its refcount) after the original descriptor is closed, and both
/// descriptors can write through the shared offset in the meantime.
#[test]
fn dup2_keeps_file_alive_and_shares_offset() {
    let kernel = new_kernel();
    let proc = kernel.spawn_init("init").unwrap();
    write_path(&kernel, 0x1000, "/log");
    let fd = kernel
        .sys_open(proc.pid(), 0x1000, OpenFlags::O_CREAT | OpenFlags::O_RDWR)
        .unwrap();

    let dup = kernel.sys_dup2(proc.pid(), fd, 5).unwrap();
    assert_eq!(dup, 5);

    kernel.io().copy_out(0x2000, b"x").unwrap();
    assert_eq!(kernel.sys_write(proc.pid(), dup, 0x2000, 1).unwrap(), 1);
    kernel.io().copy_out(0x2001, b"y").unwrap();
    assert_eq!(kernel.sys_write(proc.pid(), fd, 0x2001, 1).unwrap(), 1);

    kernel.sys_close(proc.pid(), fd).unwrap();
    kernel.io().copy_out(0x2002, b"z").unwrap();
    assert_eq!(kernel.sys_write(proc.pid(), dup, 0x2002, 1).unwrap(), 1);
}

/// Scenario 3: fork/wait rendezvous — the parent sees a distinct, larger
/// child pid, and `waitpid` returns it with the exit code in the status's
/// low byte once the child exits.
#[test]
fn fork_wait_rendezvous_reports_exit_code() {
    let kernel = new_kernel();
    let parent = kernel.spawn_init("init").unwrap();
    let child_pid = kernel.sys_fork(parent.pid()).unwrap();
    assert!(child_pid > parent.pid());

    kernel.sys_exit(child_pid, 7).unwrap();
    let (pid, status) = kernel.waitpid(parent.pid(), child_pid, 0).unwrap().unwrap();
    assert_eq!(pid, child_pid);
    assert_eq!(status & 0xff, 7);
}

/// Scenario 4: execv against a nonexistent path fails ENOENT and leaves
/// the caller's process (and its fds) untouched.
#[test]
fn execv_missing_binary_is_enoent_and_caller_survives() {
    let kernel = new_kernel();
    let proc = kernel.spawn_init("init").unwrap();
    write_path(&kernel, 0x1000, "/nofile");
    let err = kernel
        .sys_execv(proc.pid(), 0x1000, vec!["x".to_string()])
        .unwrap_err();
    assert_eq!(err, Error::Enoent);
    assert!(kernel.procs().get(proc.pid()).is_some());
    assert!(proc.fd_table().get(0).is_ok());
}

/// Scenario 5: forking past the process table's capacity fails ENPROC on
/// the overflow call, without disturbing the processes already forked.
#[test]
fn forking_past_proc_max_fails_enproc_on_overflow() {
    let mut config = Config::default();
    config.proc_max = 4;
    let kernel = Kernel::new(
        config,
        MemVfs::new(),
        BufferUserIo::new(1 << 16),
        TestAddressSpaceFactory::new(0x1000),
        StubElfLoader::new(0x1000),
        InlineScheduler::new(),
    );
    let init = kernel.spawn_init("init").unwrap();

    // proc_max = 4 means 5 slots total (0..=4): slot 0 is the kernel,
    // slot 1 is init, leaving 3 free slots for children before the table
    // is full.
    let first_child = kernel.sys_fork(init.pid()).unwrap();
    let _second_child = kernel.sys_fork(init.pid()).unwrap();
    let _third_child = kernel.sys_fork(init.pid()).unwrap();
    assert_eq!(kernel.sys_fork(init.pid()).unwrap_err(), Error::Enproc);

    // Reaping one child frees a slot for the next fork.
    kernel.sys_exit(first_child, 0).unwrap();
    kernel.waitpid(init.pid(), first_child, 0).unwrap();
    assert!(kernel.sys_fork(init.pid()).is_ok());
}

/// Scenario 6: waiting on a live, unrelated pid fails ECHILD rather than
/// blocking.
#[test]
fn waitpid_on_unrelated_live_pid_is_echild() {
    let kernel = new_kernel();
    let a = kernel.spawn_init("a").unwrap();
    let b = kernel
        .procs()
        .create(
            "b".to_string(),
            TestAddressSpaceFactory::new(0x1000).create(),
            a.cwd(),
            os161_rs::proc::FdTable::empty(8),
        )
        .unwrap();
    assert_eq!(kernel.waitpid(a.pid(), b.pid(), 0).unwrap_err(), Error::Echild);
}

/// Self-wait is always ECHILD, never a deadlock, since a process is never
/// its own child.
#[test]
fn self_wait_is_echild() {
    let kernel = new_kernel();
    let proc = kernel.spawn_init("init").unwrap();
    assert_eq!(
        kernel.waitpid(proc.pid(), proc.pid(), 0).unwrap_err(),
        Error::Echild
    );
}

/// `WNOHANG` against a still-running child returns `None` instead of
/// blocking the calling test thread forever.
#[test]
fn wnohang_on_running_child_returns_none_immediately() {
    let kernel = new_kernel();
    let parent = kernel.spawn_init("init").unwrap();
    let child_pid = kernel.sys_fork(parent.pid()).unwrap();
    assert!(kernel
        .waitpid(parent.pid(), child_pid, WNOHANG)
        .unwrap()
        .is_none());
}
