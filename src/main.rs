use argh::FromArgs;
use ringshell::Interpreter;
use ringshell::config::{PLAIN_PROMPT, ShellConfig};
use ringshell::reaper::Reaper;
use tracing_subscriber::EnvFilter;

/// Log level used when RUST_LOG is unset or invalid.
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(FromArgs)]
/// Interactive shell with foreground/background jobs and a numbered command history.
struct Args {
    #[argh(option, default = "10")]
    /// number of command lines remembered by `history`
    history_size: usize,

    #[argh(option, default = "128")]
    /// size of the argument vector; at most this many minus one words are used
    max_args: usize,

    #[argh(option, default = "1024")]
    /// size of the line buffer; longer lines are clipped
    max_line: usize,

    #[argh(switch)]
    /// print a prompt without colors
    plain_prompt: bool,
}

impl Args {
    fn into_config(self) -> ShellConfig {
        let mut config = ShellConfig {
            history_capacity: self.history_size,
            max_args: self.max_args,
            max_line: self.max_line,
            ..ShellConfig::default()
        };
        if self.plain_prompt {
            config.prompt = PLAIN_PROMPT.to_string();
        }
        config
    }
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        // Fallback to the default level if RUST_LOG is not set _or_ is invalid
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_LEVEL))
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();
    init_logging();

    let config = args.into_config().validate()?;
    let _reaper = Reaper::install()?;
    Interpreter::with_config(config).repl()
}
