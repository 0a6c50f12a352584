use anyhow::Context;
use arglist_shell::Interpreter;
use arglist_shell::config::Config;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let config: Config = argh::from_env();
    init_logging(&config);

    let command = config.command.clone();
    let interpreter =
        Interpreter::with_config(config).context("failed to install signal handlers")?;

    match command {
        Some(line) => {
            if let Err(err) = interpreter.run_line(&line) {
                arglist_shell::report(&err);
                std::process::exit(1);
            }
        }
        None => interpreter.repl().context("line editor failed")?,
    }
    Ok(())
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
