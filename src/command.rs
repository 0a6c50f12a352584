use crate::error::LaunchError;
use std::fmt;

/// Token that, as the last argument, sends a command to the background.
pub const BACKGROUND_MARKER: &str = "&";
/// Token that, as the second-to-last argument, redirects stdout to the last one.
pub const REDIRECT_MARKER: &str = ">";
/// Token that splits a command into a two-stage pipeline.
pub const PIPE_MARKER: &str = "|";

/// The way a command line is launched.
///
/// Determined once per dispatch by [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionShape {
    /// A single foreground program.
    Standard,
    /// A single program the interpreter does not wait for.
    Background,
    /// Two programs connected stdout-to-stdin.
    Pipe,
    /// A single foreground program with stdout sent to a file.
    FileOutput,
}

impl fmt::Display for ExecutionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExecutionShape::Standard => "standard",
            ExecutionShape::Background => "background",
            ExecutionShape::Pipe => "pipe",
            ExecutionShape::FileOutput => "file output",
        })
    }
}

/// Classify an argument vector.
///
/// The first matching rule wins:
/// 1. last token is `&` -> [`ExecutionShape::Background`], whatever else the line holds;
/// 2. second-to-last token is `>` -> [`ExecutionShape::FileOutput`];
/// 3. any token is `|` -> [`ExecutionShape::Pipe`];
/// 4. otherwise [`ExecutionShape::Standard`].
///
/// Markers are recognized only as whole tokens, `a|b` is an ordinary argument.
pub fn classify<S: AsRef<str>>(argv: &[S]) -> Result<ExecutionShape, LaunchError> {
    let count = argv.len();
    let last = argv.last().ok_or(LaunchError::EmptyCommand)?;

    if last.as_ref() == BACKGROUND_MARKER {
        return Ok(ExecutionShape::Background);
    }
    if count > 1 && argv[count - 2].as_ref() == REDIRECT_MARKER {
        return Ok(ExecutionShape::FileOutput);
    }
    if find_pipe(argv).is_some() {
        return Ok(ExecutionShape::Pipe);
    }
    Ok(ExecutionShape::Standard)
}

/// Index of the leftmost `|` token.
pub fn find_pipe<S: AsRef<str>>(argv: &[S]) -> Option<usize> {
    argv.iter().position(|arg| arg.as_ref() == PIPE_MARKER)
}

/// A classified command with the argument slices each launch step needs.
///
/// Plans borrow from the caller's vector; markers are excluded by slicing
/// instead of being overwritten, so the vector can be reused afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandPlan<'a, S> {
    Standard { argv: &'a [S] },
    /// `argv` excludes the trailing `&`.
    Background { argv: &'a [S] },
    /// `left` and `right` exclude the leftmost `|`.
    Pipe { left: &'a [S], right: &'a [S] },
    /// `argv` excludes the `> path` pair.
    FileOutput { argv: &'a [S], path: &'a S },
}

impl<'a, S: AsRef<str>> CommandPlan<'a, S> {
    pub fn shape(&self) -> ExecutionShape {
        match self {
            CommandPlan::Standard { .. } => ExecutionShape::Standard,
            CommandPlan::Background { .. } => ExecutionShape::Background,
            CommandPlan::Pipe { .. } => ExecutionShape::Pipe,
            CommandPlan::FileOutput { .. } => ExecutionShape::FileOutput,
        }
    }
}

/// Classify `argv` and cut it into the slices its launch procedure runs.
///
/// Fails with [`LaunchError::MissingProgram`] when a side of the command has
/// no program to run, before anything is forked.
pub fn plan<S: AsRef<str>>(argv: &[S]) -> Result<CommandPlan<'_, S>, LaunchError> {
    let shape = classify(argv)?;
    let count = argv.len();
    let missing = || LaunchError::MissingProgram { shape };

    let plan = match shape {
        ExecutionShape::Standard => CommandPlan::Standard { argv },
        ExecutionShape::Background => CommandPlan::Background {
            argv: &argv[..count - 1],
        },
        ExecutionShape::FileOutput => CommandPlan::FileOutput {
            argv: &argv[..count - 2],
            path: &argv[count - 1],
        },
        ExecutionShape::Pipe => {
            let index = find_pipe(argv).ok_or_else(missing)?;
            CommandPlan::Pipe {
                left: &argv[..index],
                right: &argv[index + 1..],
            }
        }
    };

    let has_program = match &plan {
        CommandPlan::Standard { argv }
        | CommandPlan::Background { argv }
        | CommandPlan::FileOutput { argv, .. } => !argv.is_empty(),
        CommandPlan::Pipe { left, right } => !left.is_empty() && !right.is_empty(),
    };
    if has_program { Ok(plan) } else { Err(missing()) }
}
