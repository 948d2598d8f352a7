use crate::history::HistoryRing;
use std::collections::HashMap;
use std::env as stdenv;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Mutable state of one interactive session.
///
/// The environment contains:
/// - `vars`: environment variables handed to spawned programs, also used for `PATH` lookup.
/// - `current_dir`: the working directory spawned programs start in.
/// - `history`: the ring of previously submitted command lines.
/// - `should_exit`: set by the `exit` built-in so the prompt loop can stop.
#[derive(Debug, Clone)]
pub struct Environment {
    pub vars: HashMap<String, String>,
    pub current_dir: PathBuf,
    pub history: HistoryRing,
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current process state into a new session with an empty history.
    pub fn new(history_capacity: NonZeroUsize) -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            history: HistoryRing::new(history_capacity),
            should_exit: false,
        }
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }
}
