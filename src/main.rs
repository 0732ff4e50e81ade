use argh::FromArgs;
use minibasic::{Interpreter, ReplConfig};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// Line-numbered BASIC interpreter.
struct Options {
    #[argh(option, default = "String::new()")]
    /// text shown before each line in interactive mode
    prompt: String,

    #[argh(switch)]
    /// read plain lines from stdin without line editing
    plain: bool,

    #[argh(option)]
    /// file used to persist line-editing history
    history: Option<PathBuf>,

    #[argh(option)]
    /// log filter such as "debug" or "minibasic=trace"; defaults to RUST_LOG, then "warn"
    log_level: Option<String>,
}

fn init_logging(level: Option<&str>) -> anyhow::Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let options: Options = argh::from_env();
    init_logging(options.log_level.as_deref())?;

    let mut basic = Interpreter::with_standard_statements()?;
    let stdin = std::io::stdin();
    if options.plain || !stdin.is_terminal() {
        tracing::debug!("reading plain lines from stdin");
        basic.run_script(&mut stdin.lock(), &mut std::io::stdout().lock())?;
    } else {
        basic.repl(&ReplConfig {
            prompt: options.prompt,
            history: options.history,
        })?;
    }
    Ok(())
}
