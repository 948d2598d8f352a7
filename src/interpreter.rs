use crate::builtin::{BuiltinCommand, Exit};
use crate::command::{CommandFactory, ExitCode};
use crate::config::{ShellConfig, clip_line};
use crate::env::Environment;
use crate::error::ShellError;
use crate::lexer::{self, CommandLine, ParseError};
use anyhow::Context;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;
use tracing::debug;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only support commands defined in this crate: the built-ins and ExternalCommand.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// What a single call to [`Interpreter::submit`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing was executed or recorded: the line was blank or a recall missed.
    Skipped,
    /// A command ran. Background jobs always report 0.
    Ran(ExitCode),
    /// The `exit` built-in was invoked.
    Exit,
    /// There is no more input.
    EndOfInput,
}

/// An interactive shell session that can execute built-in and external commands.
///
/// The interpreter owns the session [`Environment`] (including the command history)
/// and a list of [`CommandFactory`] objects that are queried, in order, to create
/// commands by name. See [`Default`] for the factories included out of the box.
///
/// Example
/// ```
/// use ringshell::{Interpreter, Outcome};
/// let mut sh = Interpreter::default();
/// let mut out = Vec::new();
/// assert_eq!(sh.submit(Some("true"), &mut out).unwrap(), Outcome::Ran(0));
/// assert_eq!(sh.env().history.find_by_id(0), Some("true"));
/// ```
pub struct Interpreter {
    env: Environment,
    config: ShellConfig,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(config: ShellConfig, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            env: Environment::new(config.history_capacity()),
            config,
            commands,
        }
    }

    /// Create an interpreter with the default commands and the given limits.
    pub fn with_config(config: ShellConfig) -> Self {
        Self::new(config, default_commands())
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Run one read-eval cycle for `line`.
    ///
    /// `None` means the input is exhausted. Lines are recorded in the history
    /// unless they are blank, invoke `exit` or reference a missing history id.
    /// A `!id` line is replaced by the recalled text, which is what gets recorded
    /// and executed. Recall is resolved once; a recalled line starting with `!`
    /// is run as a program name.
    ///
    /// User-facing failures (unknown program, missing history id) are written to
    /// `out`; only I/O and process-creation failures are returned as errors.
    pub fn submit(&mut self, line: Option<&str>, out: &mut dyn Write) -> anyhow::Result<Outcome> {
        let max_args = self.config.max_args;
        let line = line.map(|l| clip_line(l, self.config.max_line));
        let parsed = match lexer::tokenize(line, max_args) {
            Ok(parsed) => parsed,
            Err(ParseError::NullInput) => return Ok(Outcome::EndOfInput),
            Err(ParseError::EmptyInput) => return Ok(Outcome::Skipped),
        };

        if parsed.program() == Exit::name() {
            self.run(&parsed, out)?;
            return Ok(Outcome::Exit);
        }

        let recalled = match parsed.program().strip_prefix('!') {
            Some(digits) => match parse_history_id(digits)
                .and_then(|id| self.env.history.find_by_id(id))
            {
                Some(text) => Some(text.to_owned()),
                None => {
                    writeln!(out, "{}", ShellError::RecallMiss(parsed.program().to_owned()))?;
                    return Ok(Outcome::Skipped);
                }
            },
            None => None,
        };
        let parsed = match recalled.as_deref() {
            Some(text) => match lexer::tokenize(Some(text), max_args) {
                Ok(parsed) => parsed,
                Err(_) => return Ok(Outcome::Skipped),
            },
            None => parsed,
        };

        self.env.history.record(parsed.source());
        let code = self.run(&parsed, out)?;
        if self.env.should_exit {
            return Ok(Outcome::Exit);
        }
        Ok(Outcome::Ran(code))
    }

    /// Dispatch an already parsed command line without touching the history.
    ///
    /// Returns the command's exit code or an error if the command cannot be created
    /// or fails to execute.
    pub fn run(&mut self, line: &CommandLine<'_>, out: &mut dyn Write) -> anyhow::Result<ExitCode> {
        debug!(
            program = line.program(),
            background = line.is_background(),
            "dispatching"
        );
        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(&self.env, line) {
                return cmd.execute(out, &mut self.env);
            }
        }
        Err(anyhow::anyhow!("command not found: {}", line.program()))
    }

    /// Interactive Read-Eval-Print Loop on the controlling terminal.
    ///
    /// Returns once `exit` is entered or the input reaches end-of-file.
    pub fn repl(&mut self) -> anyhow::Result<()> {
        let mut rl = DefaultEditor::new().context("failed to initialize line editor")?;
        let mut stdout = std::io::stdout();

        loop {
            let line = match rl.readline(&self.config.prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    Some(line)
                }
                // Ctrl-C discards the current line, like an empty submission.
                Err(ReadlineError::Interrupted) => Some(String::new()),
                Err(ReadlineError::Eof) => None,
                Err(err) => return Err(err).context("failed to read line"),
            };

            let outcome = self.submit(line.as_deref(), &mut stdout)?;
            stdout.flush()?;
            match outcome {
                Outcome::Exit | Outcome::EndOfInput => break,
                Outcome::Skipped | Outcome::Ran(_) => {}
            }
        }

        Ok(())
    }
}

/// Parse the id part of a `!id` token. Only plain decimal digits are accepted.
fn parse_history_id(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn default_commands() -> Vec<Box<dyn CommandFactory>> {
    use crate::builtin::History;
    use crate::external::ExternalCommand;
    vec![
        Box::new(Factory::<Exit>::default()),
        Box::new(Factory::<History>::default()),
        Box::new(Factory::<ExternalCommand>::default()),
    ]
}

impl Default for Interpreter {
    /// Create an interpreter with the default limits and commands:
    /// - built-ins: `exit`, `history`
    /// - external command launcher
    fn default() -> Self {
        Self::with_config(ShellConfig::default())
    }
}
