//! User-facing command errors.
//!
//! These are reported by printing their `Display` form to the shell's output at the
//! point of detection; they never travel back through the dispatcher as `Err`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    /// `!id` referenced an id that is not in the history.
    #[error("{0}: not found")]
    RecallMiss(String),
    /// The program could not be located or executed.
    #[error("{0}:Command not found.")]
    ProgramNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ShellError::RecallMiss("!99".to_string()).to_string(),
            "!99: not found"
        );
        assert_eq!(
            ShellError::ProgramNotFound("nosuch".to_string()).to_string(),
            "nosuch:Command not found."
        );
    }
}
