//! Process-wide signal dispositions and the SIGCHLD reaper.
//!
//! The interpreter ignores SIGINT so an interactive interrupt only reaches the
//! foreground job, and collects background children from a SIGCHLD handler so
//! they never linger as zombies. Foreground children put SIGINT back to its
//! default disposition right after `fork`.

use crate::error::SignalError;
use nix::errno::Errno;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use std::os::raw::c_int;
use tracing::debug;

/// Install the interpreter's dispositions: SIGINT is ignored and SIGCHLD runs
/// the [`Reaper`].
///
/// Children inherit both until they change them. Calling this again just
/// reinstalls the same dispositions.
pub fn initialize() -> Result<(), SignalError> {
    install(Signal::SIGINT, SigHandler::SigIgn)?;
    install(Signal::SIGCHLD, Reaper::handler())?;
    debug!("signal dispositions installed");
    Ok(())
}

/// Put SIGINT back to its default disposition in the current process.
///
/// Meant for a freshly forked child that should be interruptible; the caller
/// decides what to do on failure since it cannot report through the parent.
pub fn restore_default_interrupt() -> nix::Result<()> {
    // SAFETY: SIG_DFL carries no handler code.
    unsafe { sigaction(Signal::SIGINT, &action(SigHandler::SigDfl)) }.map(drop)
}

/// Put SIGPIPE back to its default disposition in the current process.
///
/// The Rust runtime starts with SIGPIPE ignored and an ignored signal survives
/// `exec`; launched programs expect a write to a closed pipe to end them.
pub fn restore_default_broken_pipe() -> nix::Result<()> {
    // SAFETY: SIG_DFL carries no handler code.
    unsafe { sigaction(Signal::SIGPIPE, &action(SigHandler::SigDfl)) }.map(drop)
}

fn install(signal: Signal, handler: SigHandler) -> Result<(), SignalError> {
    // SAFETY: the only custom handler installed here is `Reaper::on_sigchld`,
    // which restricts itself to `waitpid` and errno access.
    unsafe { sigaction(signal, &action(handler)) }
        .map(drop)
        .map_err(|source| SignalError::Install { signal, source })
}

fn action(handler: SigHandler) -> SigAction {
    SigAction::new(handler, SaFlags::SA_RESTART, SigSet::empty())
}

/// Collector of terminated children.
///
/// Registered for SIGCHLD by [`initialize`]. Several children can change state
/// before the handler gets to run, so every invocation drains all of them.
pub struct Reaper;

impl Reaper {
    /// Collect every child that has already changed state, without blocking.
    ///
    /// Returns how many children were collected. The reason each child ended
    /// is discarded. Safe to call from a signal handler.
    pub fn drain() -> usize {
        let mut collected = 0;
        loop {
            match waitpid(None, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) | Err(_) => break,
                Ok(_) => collected += 1,
            }
        }
        collected
    }

    fn handler() -> SigHandler {
        SigHandler::Handler(Self::on_sigchld)
    }

    extern "C" fn on_sigchld(_signal: c_int) {
        // waitpid clobbers errno, which the interrupted code may be about to read
        let saved = Errno::last_raw();
        Self::drain();
        Errno::set_raw(saved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_without_children_returns_zero() {
        // the unit-test binary never forks, so there is nothing to collect
        assert_eq!(Reaper::drain(), 0);
    }

    #[test]
    fn actions_restart_interrupted_calls() {
        let action = action(SigHandler::SigIgn);
        assert!(action.flags().contains(SaFlags::SA_RESTART));
        assert_eq!(action.mask(), SigSet::empty());
    }
}
