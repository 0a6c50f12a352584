use argh::FromArgs;

/// Prompt shown by the interactive loop when none is configured.
pub const DEFAULT_PROMPT: &str = "$ ";

#[derive(FromArgs, Debug, Clone, PartialEq, Eq)]
/// A minimal command interpreter: plain, background (`cmd &`), two-stage
/// pipeline (`a | b`) and redirected-output (`cmd > file`) commands.
pub struct Config {
    #[argh(option, short = 'c')]
    /// run a single command line and exit with 0 on success, 1 on failure.
    pub command: Option<String>,

    #[argh(option, default = "DEFAULT_PROMPT.to_string()")]
    /// prompt printed before each line in interactive mode.
    pub prompt: String,

    #[argh(switch, short = 'v')]
    /// log launch details to stderr (overridden by RUST_LOG).
    pub verbose: bool,
}

impl Config {
    /// Default log filter when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose { "debug" } else { "warn" }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command: None,
            prompt: DEFAULT_PROMPT.to_string(),
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::from_args(&["arglist_shell"], args).expect("valid arguments")
    }

    #[test]
    fn defaults_to_interactive_mode() {
        let config = parse(&[]);
        assert_eq!(config, Config::default());
        assert_eq!(config.log_filter(), "warn");
    }

    #[test]
    fn single_command_and_prompt() {
        let config = parse(&["-c", "ls -l", "--prompt", "> ", "-v"]);
        assert_eq!(config.command.as_deref(), Some("ls -l"));
        assert_eq!(config.prompt, "> ");
        assert_eq!(config.log_filter(), "debug");
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(Config::from_args(&["arglist_shell"], &["--bogus"]).is_err());
    }
}
