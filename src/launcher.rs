//! Fork/exec sequencing for each execution shape.
//!
//! Everything a child needs (argument vectors, the output path) is converted
//! to C strings in the parent. Between `fork` and `exec` the child only runs
//! async-signal-safe calls, so launching from a multi-threaded process is fine.

use crate::error::LaunchError;
use crate::signals::{restore_default_broken_pipe, restore_default_interrupt};
use nix::errno::Errno;
use nix::fcntl::{FcntlArg, FdFlag, OFlag, fcntl, open};
use nix::sys::stat::Mode;
use nix::sys::wait::{WaitPidFlag, waitpid};
use nix::unistd::{ForkResult, Pid, close, dup2, fork, pipe2};
use std::ffi::{CStr, CString};
use std::os::fd::{AsRawFd, IntoRawFd, OwnedFd, RawFd};
use std::os::raw::c_char;
use std::ptr;
use tracing::{debug, warn};

/// Exit status of a child that failed before it could `exec`.
pub const CHILD_FAILURE_STATUS: i32 = 1;

/// Permission bits of a file created for output redirection, before umask.
const OUTPUT_FILE_MODE: u32 = 0o777;

/// Run a foreground program and wait for it.
pub fn run_standard<S: AsRef<str>>(argv: &[S]) -> Result<(), LaunchError> {
    let exec = ExecArgs::new(argv)?;
    let pid = spawn(&exec, || restore_default_interrupt().step("sigaction"))
        .map_err(LaunchError::Fork)?;
    wait_for(pid)
}

/// Start a program without waiting for it.
///
/// `argv` must already exclude the `&` marker. The child keeps the ignored
/// SIGINT it inherits, and the [`Reaper`](crate::signals::Reaper) collects it.
pub fn run_background<S: AsRef<str>>(argv: &[S]) -> Result<(), LaunchError> {
    let exec = ExecArgs::new(argv)?;
    let pid = spawn(&exec, || Ok(())).map_err(LaunchError::Fork)?;
    debug!(%pid, "left in background");
    Ok(())
}

/// Run `left | right` and wait for both sides.
///
/// Children that were created are always waited for, even when a later step
/// fails; the first failure is returned and the rest are logged.
pub fn run_pipe<S: AsRef<str>>(left: &[S], right: &[S]) -> Result<(), LaunchError> {
    let left = ExecArgs::new(left)?;
    let right = ExecArgs::new(right)?;

    let (reader, writer) = pipe2(OFlag::O_CLOEXEC).map_err(LaunchError::PipeCreation)?;
    let (read_fd, write_fd) = (reader.as_raw_fd(), writer.as_raw_fd());

    let first = spawn(&left, || {
        close(read_fd).step("close")?;
        redirect(write_fd, libc::STDOUT_FILENO)?;
        restore_default_interrupt().step("sigaction")
    });
    let first = match first {
        Ok(pid) => pid,
        Err(errno) => return abandon_pipe(LaunchError::Fork(errno), reader, writer),
    };

    let second = spawn(&right, || {
        close(write_fd).step("close")?;
        redirect(read_fd, libc::STDIN_FILENO)?;
        restore_default_interrupt().step("sigaction")
    });

    let mut outcome = Outcome::default();
    outcome.record(second.map(drop).map_err(LaunchError::Fork));
    outcome.record(close_endpoint(reader));
    outcome.record(close_endpoint(writer));

    outcome.record(wait_for(first));
    if let Ok(second) = second {
        outcome.record(wait_for(second));
    }
    outcome.finish()
}

/// Run a foreground program with stdout sent to `path`, truncating it first.
pub fn run_file_output<S: AsRef<str>>(argv: &[S], path: &S) -> Result<(), LaunchError> {
    let exec = ExecArgs::new(argv)?;
    let path = c_string(path.as_ref())?;

    let pid = spawn(&exec, || {
        restore_default_interrupt().step("sigaction")?;
        let flags = OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC | OFlag::O_CLOEXEC;
        let mode = Mode::from_bits_truncate(OUTPUT_FILE_MODE as _);
        let fd = match open(path.as_c_str(), flags, mode) {
            Ok(fd) => fd,
            Err(errno) => SetupFailure {
                subject: Some(path.as_c_str()),
                op: "open",
                errno,
            }
            .exit(),
        };
        redirect(fd, libc::STDOUT_FILENO)
    })
    .map_err(LaunchError::Fork)?;
    wait_for(pid)
}

/// Block until `pid` exits or stops.
///
/// An interrupted wait is retried. A child that is already gone was collected
/// by the reaper, which counts as success.
pub fn wait_for(pid: Pid) -> Result<(), LaunchError> {
    loop {
        match waitpid(pid, Some(WaitPidFlag::WUNTRACED)) {
            Ok(status) => {
                debug!(?status, "foreground child changed state");
                return Ok(());
            }
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => {
                debug!(%pid, "child already collected");
                return Ok(());
            }
            Err(source) => return Err(LaunchError::Wait { pid, source }),
        }
    }
}

/// Fork, run `setup` in the child and then replace it with `exec`.
///
/// Returns the child's pid in the parent. The child never returns: a failing
/// `setup` or `exec` terminates it with [`CHILD_FAILURE_STATUS`].
fn spawn<F>(exec: &ExecArgs, setup: F) -> Result<Pid, Errno>
where
    F: FnOnce() -> Result<(), SetupFailure<'static>>,
{
    // SAFETY: the child only calls async-signal-safe functions before exec/_exit;
    // every allocation it relies on was made before forking.
    match unsafe { fork() }? {
        ForkResult::Parent { child } => {
            debug!(pid = %child, program = ?exec.program(), "forked");
            Ok(child)
        }
        ForkResult::Child => {
            if let Err(failure) = restore_default_broken_pipe()
                .step("sigaction")
                .and_then(|()| setup())
            {
                failure.exit();
            }
            exec.exec()
        }
    }
}

/// Move `fd` onto `target`, duplicating before closing the original.
fn redirect(fd: RawFd, target: RawFd) -> Result<(), SetupFailure<'static>> {
    if fd == target {
        // already in place; only make sure it survives exec
        return fcntl(fd, FcntlArg::F_SETFD(FdFlag::empty()))
            .map(drop)
            .step("fcntl");
    }
    dup2(fd, target).step("dup2")?;
    close(fd).step("close")
}

/// Give up on a pipeline before any child exists: close both endpoints and
/// report `failure`.
fn abandon_pipe(
    failure: LaunchError,
    reader: OwnedFd,
    writer: OwnedFd,
) -> Result<(), LaunchError> {
    let mut outcome = Outcome::default();
    outcome.record(Err(failure));
    outcome.record(close_endpoint(reader));
    outcome.record(close_endpoint(writer));
    outcome.finish()
}

fn close_endpoint(fd: OwnedFd) -> Result<(), LaunchError> {
    close(fd.into_raw_fd()).map_err(|source| LaunchError::Descriptor { op: "close", source })
}

fn c_string(token: &str) -> Result<CString, LaunchError> {
    CString::new(token).map_err(|_| LaunchError::InvalidArgument {
        token: token.to_owned(),
    })
}

/// Arguments prepared for `execvp` ahead of forking.
struct ExecArgs {
    // owns the strings `pointers` refers to
    args: Vec<CString>,
    pointers: Vec<*const c_char>,
}

impl ExecArgs {
    fn new<S: AsRef<str>>(argv: &[S]) -> Result<Self, LaunchError> {
        if argv.is_empty() {
            return Err(LaunchError::EmptyCommand);
        }
        let args = argv
            .iter()
            .map(|arg| c_string(arg.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let pointers = args
            .iter()
            .map(|arg| arg.as_ptr())
            .chain(std::iter::once(ptr::null()))
            .collect();
        Ok(Self { args, pointers })
    }

    fn program(&self) -> &CStr {
        &self.args[0]
    }

    /// Replace the current process image, searching PATH for the program.
    fn exec(&self) -> ! {
        // SAFETY: `pointers` is a NULL-terminated array into `args`, alive for the call.
        unsafe { libc::execvp(self.pointers[0], self.pointers.as_ptr()) };
        SetupFailure {
            subject: Some(self.program()),
            op: "execvp",
            errno: Errno::last(),
        }
        .exit()
    }
}

/// A setup step that failed inside a child process.
struct SetupFailure<'a> {
    subject: Option<&'a CStr>,
    op: &'static str,
    errno: Errno,
}

impl SetupFailure<'_> {
    /// Report on stderr and terminate the child without running any atexit
    /// handlers or flushing stdio buffers inherited from the parent.
    fn exit(self) -> ! {
        if let Some(subject) = self.subject {
            write_stderr(subject.to_bytes());
            write_stderr(b": ");
        }
        write_stderr(self.op.as_bytes());
        write_stderr(b"() failed: ");
        write_stderr(self.errno.desc().as_bytes());
        write_stderr(b"\n");
        // SAFETY: _exit is async-signal-safe and ends the process immediately.
        unsafe { libc::_exit(CHILD_FAILURE_STATUS) }
    }
}

fn write_stderr(bytes: &[u8]) {
    // SAFETY: plain write(2) of a valid buffer; a short or failed write is ignored.
    unsafe { libc::write(libc::STDERR_FILENO, bytes.as_ptr().cast(), bytes.len()) };
}

/// Tags a failed child-side call with the operation name.
trait ChildStep<T> {
    fn step(self, op: &'static str) -> Result<T, SetupFailure<'static>>;
}

impl<T> ChildStep<T> for nix::Result<T> {
    fn step(self, op: &'static str) -> Result<T, SetupFailure<'static>> {
        self.map_err(|errno| SetupFailure {
            subject: None,
            op,
            errno,
        })
    }
}

/// First failure of a multi-step launch; later ones are only logged.
#[derive(Default)]
struct Outcome {
    failure: Option<LaunchError>,
}

impl Outcome {
    fn record(&mut self, result: Result<(), LaunchError>) {
        let Err(err) = result else { return };
        if self.failure.is_none() {
            self.failure = Some(err);
        } else {
            warn!(%err, "additional pipeline failure");
        }
    }

    fn finish(self) -> Result<(), LaunchError> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
