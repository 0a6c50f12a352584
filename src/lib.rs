//! A minimal command interpreter core.
//!
//! Given an already split argument vector, the crate decides which of four
//! execution shapes applies and launches it with `fork`/`exec`:
//!
//! - `cmd args...` runs in the foreground and is waited for;
//! - `cmd args... &` runs in the background and is reaped asynchronously;
//! - `left... | right...` connects two programs through a pipe;
//! - `cmd args... > file` sends stdout to a truncated `file`.
//!
//! The interpreter ignores SIGINT itself while its foreground children restore
//! the default disposition, so Ctrl-C stops the running job but not the shell.
//! Background children are collected by a SIGCHLD handler, leaving no zombies.
//!
//! The main entry point is [`Interpreter`]; [`command`] exposes the classifier
//! and [`launcher`] the per-shape launch procedures.

pub mod command;
pub mod config;
pub mod error;
pub mod launcher;
pub mod lexer;
pub mod signals;
mod interpreter;

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::{Interpreter, report};
