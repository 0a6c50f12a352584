use crate::command::ExecutionShape;
use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::unistd::Pid;
use thiserror::Error;

/// Failure of a single dispatch, observed in the launching process.
///
/// Failures that happen inside a child before `exec` (opening the output file,
/// `exec` itself, child-side `dup2`/`close`/`sigaction`) never show up here: the
/// child reports them on its own stderr and exits with a nonzero status.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The argument vector had no tokens at all.
    #[error("empty command")]
    EmptyCommand,

    /// A shape marker left no program to run on one of its sides,
    /// e.g. `&` alone, `> out.txt` or `ls |`.
    #[error("missing program for {shape} command")]
    MissingProgram { shape: ExecutionShape },

    /// A token cannot be handed to `exec` because it contains a NUL byte.
    #[error("invalid argument {token:?}: contains a NUL byte")]
    InvalidArgument { token: String },

    #[error("fork() failed: {0}")]
    Fork(#[source] Errno),

    #[error("pipe() failed: {0}")]
    PipeCreation(#[source] Errno),

    /// `close` or `dup2` failed in the launching process.
    #[error("{op}() failed: {source}")]
    Descriptor {
        op: &'static str,
        #[source]
        source: Errno,
    },

    /// `waitpid` failed for a reason other than an interrupted call or an
    /// already collected child.
    #[error("wait() failed for pid {pid}: {source}")]
    Wait {
        pid: Pid,
        #[source]
        source: Errno,
    },
}

/// Failure to install a process-wide signal disposition at startup.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("sigaction() failed for {signal}: {source}")]
    Install {
        signal: Signal,
        #[source]
        source: Errno,
    },
}
