//! `execv`: load a new program image into the calling process's address
//! space, replacing it wholesale (§5.2's "Replace the calling process's
//! program image").
//!
//! Split out of [`crate::syscall::proc`] the way the teacher keeps exec's
//! ELF-load-and-argument-marshalling logic in its own file rather than
//! folded into the syscall dispatch module.

use std::mem::size_of;

use log::{error, warn};

use crate::error::{Error, Result};
use crate::fcntl::OpenFlags;
use crate::kernel::Kernel;
use crate::param::Pid;
use crate::trapframe::TrapFrame;

/// Lays out `argv` on the stack at and below `stack_top`: each string
/// copied high-to-low with a terminating NUL plus enough padding to keep
/// every string 4-byte aligned, followed by an 8-byte-aligned,
/// NUL-terminated pointer array. Returns `(new_sp, argv_user_ptr)`.
fn push_argv(kernel: &Kernel, stack_top: usize, argv: &[String]) -> Result<(usize, usize)> {
    let mut sp = stack_top;
    let mut pointers = Vec::with_capacity(argv.len());
    for arg in argv.iter().rev() {
        let mut bytes = arg.as_bytes().to_vec();
        bytes.push(0);
        sp -= bytes.len();
        sp &= !0x3usize;
        kernel.io.copy_out(sp, &bytes)?;
        pointers.push(sp);
    }
    pointers.reverse();

    sp &= !0x7usize;
    let array_len = (pointers.len() + 1) * size_of::<usize>();
    sp -= array_len;
    let argv_ptr = sp;

    let mut cursor = sp;
    for p in &pointers {
        kernel.io.copy_out(cursor, &p.to_le_bytes())?;
        cursor += size_of::<usize>();
    }
    kernel.io.copy_out(cursor, &0usize.to_le_bytes())?;

    Ok((sp, argv_ptr))
}

/// `execv(path, argv)`: loads `path` into a fresh address space and
/// replaces the calling process's image with it.
///
/// Everything up through opening the executable and loading its ELF image
/// can fail cleanly and return an ordinary error to the caller. Once the
/// new address space has been installed in the process (replacing and
/// dropping the old one), there is no old image left to return to: any
/// later failure (stack setup, argument copy) is treated as fatal to the
/// calling process, which is forced to exit with status 255 rather than
/// returning — there is no trap-return path here for a "return an error
/// to a no-longer-existent caller" outcome to take.
pub fn execv(kernel: &Kernel, pid: Pid, path_ptr: usize, argv: Vec<String>) -> Result<usize> {
    let proc = kernel.get_proc(pid)?;
    let path = kernel.io.copy_in_str(path_ptr, kernel.config.path_max)?;
    if argv.len() >= kernel.config.arg_max {
        return Err(Error::E2big);
    }

    let vnode = kernel.vfs.open(&path, OpenFlags::O_RDONLY)?;
    let mut new_memory = kernel.as_factory.create();
    let entry = match kernel.elf_loader.load(&vnode, &mut *new_memory) {
        Ok(entry) => entry,
        Err(e) => {
            kernel.vfs.close(&vnode);
            warn!("execv: failed to load {path}: {e}");
            return Err(e);
        }
    };
    kernel.vfs.close(&vnode);

    // Nothing has touched the calling process yet: every error above this
    // line is safe to propagate normally.
    proc.replace_memory(new_memory);

    let result = (|| {
        let stack_top = proc.memory().define_stack()?;
        let (sp, argv_user_ptr) = push_argv(kernel, stack_top, &argv)?;
        let mut trap_frame = TrapFrame::new();
        trap_frame.epc = entry;
        trap_frame.sp = sp;
        trap_frame.a1_argc = argv.len();
        trap_frame.a2_argv = argv_user_ptr;
        proc.set_trap_frame(trap_frame);
        Ok(argv.len())
    })();

    if let Err(e) = result {
        error!("execv: fatal failure after address space install on pid {pid}: {e}");
        kernel.sys_exit(pid, 255)?;
        return Err(e);
    }
    result
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
    fn missing_binary_is_enoent_and_leaves_process_alive() {
        let kernel = test_kernel();
        let proc = kernel.spawn_init("init").unwrap();
        write_path(&kernel, 0x1000, "/no-such-binary");
        let err = execv(&kernel, proc.pid(), 0x1000, vec![]).unwrap_err();
        assert_eq!(err, Error::Enoent);
        assert!(kernel.procs.get(proc.pid()).is_some());
    }

    #[test]
    fn replaces_image_and_sets_entry_point() {
        let kernel = test_kernel();
        let proc = kernel.spawn_init("init").unwrap();
        write_path(&kernel, 0x1000, "/bin/prog");
        kernel
            .sys_open(proc.pid(), 0x1000, OpenFlags::O_CREAT | OpenFlags::O_RDWR)
            .unwrap();

        write_path(&kernel, 0x2000, "/bin/prog");
        let argc = execv(
            &kernel,
            proc.pid(),
            0x2000,
            vec!["prog".to_string(), "a".to_string()],
        )
        .unwrap();
        assert_eq!(argc, 2);
        assert_eq!(proc.trap_frame().epc, 0x1000);
    }

    #[test]
    fn too_many_arguments_is_e2big() {
        let kernel = test_kernel();
        let proc = kernel.spawn_init("init").unwrap();
        write_path(&kernel, 0x1000, "/bin/prog");
        kernel
            .sys_open(proc.pid(), 0x1000, OpenFlags::O_CREAT | OpenFlags::O_RDWR)
            .unwrap();
        write_path(&kernel, 0x2000, "/bin/prog");
        let argv = vec!["x".to_string(); kernel.config.arg_max];
        let err = execv(&kernel, proc.pid(), 0x2000, argv).unwrap_err();
        assert_eq!(err, Error::E2big);
    }
}
