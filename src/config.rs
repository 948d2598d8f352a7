//! Session limits and presentation settings.

use anyhow::{Result, bail};
use std::num::NonZeroUsize;

/// Prompt printed before every line: a bold red `$`.
pub const DEFAULT_PROMPT: &str = "\x1b[1m\x1b[31m$\x1b[0m ";

/// Prompt used when colors are disabled.
pub const PLAIN_PROMPT: &str = "$ ";

/// Tunable limits of a shell session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Number of command lines kept in the history ring.
    pub history_capacity: usize,
    /// Size of the argument vector including its terminator, so at most
    /// `max_args - 1` tokens are taken from a line.
    pub max_args: usize,
    /// Size of the line buffer; longer lines are clipped to `max_line - 1` bytes.
    pub max_line: usize,
    pub prompt: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            history_capacity: 10,
            max_args: 128,
            max_line: 1024,
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl ShellConfig {
    /// Check that the limits leave room for at least one command.
    pub fn validate(self) -> Result<Self> {
        if self.history_capacity == 0 {
            bail!("history size must be at least 1");
        }
        if self.max_args < 2 {
            bail!("max args must be at least 2, got {}", self.max_args);
        }
        if self.max_line < 2 {
            bail!("max line must be at least 2, got {}", self.max_line);
        }
        Ok(self)
    }

    pub(crate) fn history_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.history_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

/// Clip `line` to fit a `max_line`-byte buffer, keeping it valid UTF-8.
pub(crate) fn clip_line(line: &str, max_line: usize) -> &str {
    let limit = max_line.saturating_sub(1);
    if line.len() <= limit {
        return line;
    }
    let mut end = limit;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}
