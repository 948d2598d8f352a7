use crate::env::Environment;
use crate::lexer::CommandLine;
use anyhow::Result;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// Programs killed by a signal are reported as `128 + signal`, like POSIX shells do.
pub type ExitCode = i32;

/// Object-safe trait for any command that can be executed by the shell.
///
/// This is implemented by built-ins via a blanket impl and by external commands.
pub trait ExecutableCommand {
    /// Executes the command, writing any shell-produced text to `stdout`.
    ///
    /// Spawned programs inherit the process's standard streams; `stdout` only
    /// receives messages generated by the shell itself.
    fn execute(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment)
    -> Result<ExitCode>;
}

/// Factory that tries to create a command from a parsed command line.
///
/// Returns `None` when the factory doesn't recognize the program name.
/// Implementations can use the environment to resolve executables (e.g., using PATH).
pub trait CommandFactory {
    fn try_create(
        &self,
        env: &Environment,
        line: &CommandLine<'_>,
    ) -> Option<Box<dyn ExecutableCommand>>;
}
