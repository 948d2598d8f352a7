//! A module implementing lexical analysis (tokenization) of a command line.
//!
//! Tokens are maximal runs of characters that are neither ASCII whitespace nor `&`.
//! The `&` character is only a delimiter, but its presence anywhere in the line
//! marks the whole command for background execution.

use thiserror::Error;

/// The result of tokenizing one command line.
///
/// Tokens are slices borrowed from the source line, so a `CommandLine` lives
/// no longer than the line it was produced from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine<'a> {
    source: &'a str,
    args: Vec<&'a str>,
    background: bool,
}

impl<'a> CommandLine<'a> {
    /// The raw line the tokens were taken from.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// All tokens, program name first.
    pub fn args(&self) -> &[&'a str] {
        &self.args
    }

    /// The program name. Always present since empty lines are rejected by [`tokenize`].
    pub fn program(&self) -> &'a str {
        self.args[0]
    }

    /// Whether the line contained `&`.
    pub fn is_background(&self) -> bool {
        self.background
    }
}

/// Errors that can occur during tokenization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No line was available at all (end of input).
    #[error("no input line")]
    NullInput,
    /// The line contained no tokens.
    #[error("empty input line")]
    EmptyInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord(usize), // byte offset where the word started
}

struct LexingFSM<'a> {
    input: &'a str,
    state: LexingState,
    limit: usize,
    args: Vec<&'a str>,
}

impl<'a> LexingFSM<'a> {
    fn new(input: &'a str, limit: usize) -> Self {
        LexingFSM {
            input,
            state: LexingState::Start,
            limit,
            args: Vec::new(),
        }
    }

    /// Walks the input once, collecting at most `limit` tokens.
    ///
    /// Once the limit is reached the rest of the line is left unparsed.
    fn make_tokens(mut self) -> Vec<&'a str> {
        for (pos, ch) in self.input.char_indices() {
            if self.args.len() == self.limit {
                return self.args;
            }
            match self.state {
                LexingState::Start => {
                    if !is_delimiter(ch) {
                        self.state = LexingState::ReadingWord(pos);
                    }
                }
                LexingState::ReadingWord(start) => {
                    if is_delimiter(ch) {
                        self.args.push(&self.input[start..pos]);
                        self.state = LexingState::Start;
                    }
                }
            }
        }

        if let LexingState::ReadingWord(start) = self.state {
            if self.args.len() < self.limit {
                self.args.push(&self.input[start..]);
            }
        }
        self.args
    }
}

/// Same set as C `isspace` in the "C" locale, plus the background marker.
fn is_delimiter(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\x0b' | '\x0c' | '\r' | '&')
}

/// Splits `line` into tokens and detects the background marker.
///
/// At most `max_args - 1` tokens are returned; anything past that is silently
/// dropped. A `None` line means end of input and yields [`ParseError::NullInput`],
/// while a line without tokens yields [`ParseError::EmptyInput`].
pub fn tokenize(line: Option<&str>, max_args: usize) -> Result<CommandLine<'_>, ParseError> {
    let source = line.ok_or(ParseError::NullInput)?;
    let args = LexingFSM::new(source, max_args.saturating_sub(1)).make_tokens();
    if args.is_empty() {
        return Err(ParseError::EmptyInput);
    }
    Ok(CommandLine {
        source,
        args,
        background: source.contains('&'),
    })
}
