//! Kernel-wide size limits.
//!
//! These mirror the constants a real kernel would fix at compile time.
//! [`Config`] exists alongside the `const` defaults so tests can exercise
//! table-exhaustion behavior (`ENPROC`, `ENFILE`, `EMFILE`) without
//! allocating a full-size, 100-entry process table on every run.

/// Open files per process.
pub const OPEN_MAX: usize = 64;

/// Open files per system: ten process-tables' worth, per the spec.
pub const SYSTEM_OPEN_MAX: usize = 10 * OPEN_MAX;

/// Maximum number of live processes.
pub const PROC_MAX: usize = 100;

/// Maximum file path name, including the terminating NUL.
pub const PATH_MAX: usize = 128;

/// Max exec() arguments.
pub const ARG_MAX: usize = 32;

/// Maximum length of a process's printable name (debugging only).
pub const MAXPROCNAME: usize = 16;

/// A process id. Never zero; pid 1 is the first process a booted kernel
/// creates. Pid 0 names the kernel process, which occupies slot 0 of the
/// process table and is never recycled.
pub type Pid = i32;

/// `waitpid`'s only defined option: return immediately instead of blocking
/// when the named child has not yet exited.
pub const WNOHANG: i32 = 1;

/// Runtime-overridable table sizes.
///
/// The crate-wide defaults above are what a booted kernel uses;
/// constructing a [`Config`] with smaller bounds lets a test drive a
/// table-full condition (e.g. `ENPROC`) in a handful of iterations instead
/// of [`PROC_MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub open_max: usize,
    pub system_open_max: usize,
    pub proc_max: usize,
    pub path_max: usize,
    pub arg_max: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            open_max: OPEN_MAX,
            system_open_max: SYSTEM_OPEN_MAX,
            proc_max: PROC_MAX,
            path_max: PATH_MAX,
            arg_max: ARG_MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_crate_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.open_max, OPEN_MAX);
        assert_eq!(cfg.system_open_max, SYSTEM_OPEN_MAX);
        assert_eq!(cfg.proc_max, PROC_MAX);
    }

    #[test]
    fn system_open_max_is_ten_times_open_max() {
        assert_eq!(SYSTEM_OPEN_MAX, OPEN_MAX * 10);
    }
}
