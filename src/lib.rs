//! A small interactive shell with a bounded, id-tagged command history.
//!
//! The crate is split into a handful of building blocks: a tokenizer that turns an
//! input line into arguments and a background flag, a fixed-capacity history ring,
//! a dispatcher that runs built-ins or launches external programs in the foreground
//! or background, and a reaper that collects finished background children.
//!
//! The main entry point is [`Interpreter`], which owns the session state and
//! exposes [`Interpreter::submit`] for a single read-eval cycle and
//! [`Interpreter::repl`] for the interactive loop.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
mod external;
pub mod history;
mod interpreter;
pub mod lexer;
pub mod reaper;

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::{Interpreter, Outcome};
