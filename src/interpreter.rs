use crate::command::{self, CommandPlan};
use crate::config::Config;
use crate::error::{LaunchError, SignalError};
use crate::launcher;
use crate::lexer;
use crate::signals;
use anyhow::Context;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

/// A minimal command interpreter.
///
/// Creating one installs the process-wide signal dispositions (see
/// [`signals::initialize`]); afterwards [`Interpreter::execute`] launches
/// argument vectors and [`Interpreter::repl`] drives an interactive session.
///
/// Example
/// ```no_run
/// use arglist_shell::Interpreter;
/// let sh = Interpreter::new().unwrap();
/// sh.execute(&["ls", "-l"]).unwrap();
/// sh.execute(&["sleep", "5", "&"]).unwrap(); // returns right away
/// ```
pub struct Interpreter {
    config: Config,
}

impl Interpreter {
    /// Create an interpreter with the default configuration.
    pub fn new() -> Result<Self, SignalError> {
        Self::with_config(Config::default())
    }

    /// Create an interpreter; fails when signal dispositions cannot be installed.
    pub fn with_config(config: Config) -> Result<Self, SignalError> {
        signals::initialize()?;
        Ok(Self { config })
    }

    /// Classify `argv` and launch it.
    ///
    /// Returns once foreground commands have finished (or stopped); background
    /// commands return immediately. The exit status of the launched program does
    /// not matter, only whether it could be launched and waited for.
    pub fn execute<S: AsRef<str>>(&self, argv: &[S]) -> Result<(), LaunchError> {
        let plan = command::plan(argv)?;
        debug!(shape = %plan.shape(), "dispatching");
        match plan {
            CommandPlan::Standard { argv } => launcher::run_standard(argv),
            CommandPlan::Background { argv } => launcher::run_background(argv),
            CommandPlan::Pipe { left, right } => launcher::run_pipe(left, right),
            CommandPlan::FileOutput { argv, path } => launcher::run_file_output(argv, path),
        }
    }

    /// Split a raw line and execute it. A blank line does nothing.
    pub fn run_line(&self, line: &str) -> anyhow::Result<()> {
        let argv = lexer::split_line(line)?;
        if argv.is_empty() {
            return Ok(());
        }
        self.execute(&argv).with_context(|| argv[0].clone())
    }

    /// Read-eval-print loop until end of input.
    ///
    /// Failed commands are reported and the loop goes on; Ctrl-C at the prompt
    /// only discards the current line.
    pub fn repl(&self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;

        loop {
            match rl.readline(&self.config.prompt) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line.as_str())?;
                    if let Err(err) = self.run_line(&line) {
                        report(&err);
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }
}

/// Print a failed command's diagnostic for the user.
pub fn report(err: &anyhow::Error) {
    eprintln!("{err:#}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_line_is_a_no_op() {
        let sh = Interpreter {
            config: Config::default(),
        };
        assert!(sh.run_line("   ").is_ok());
    }

    #[test]
    fn lexing_errors_surface_before_launch() {
        let sh = Interpreter {
            config: Config::default(),
        };
        let err = sh.run_line("echo 'oops").unwrap_err();
        assert!(err.downcast_ref::<lexer::LexingError>().is_some());
    }

    #[test]
    fn planning_errors_surface_before_launch() {
        let sh = Interpreter {
            config: Config::default(),
        };
        let err = sh.execute(&["|", "wc"]).unwrap_err();
        assert!(matches!(err, LaunchError::MissingProgram { .. }));

        let err = sh.run_line("> out.txt").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LaunchError>(),
            Some(LaunchError::MissingProgram { .. })
        ));
    }
}
