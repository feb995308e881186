//! Error taxonomy for the execution engine.
//!
//! Every variant here is surfaced at its boundary as an `ExecutionResult`
//! (see `types::ExecutionResult::from_error`) — nothing propagates past a
//! command or chain boundary as a bare `Result`.

use thiserror::Error;

/// Errors produced while splitting or tokenizing a line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unterminated quote in command")]
    UnterminatedQuote,
    #[error("invalid redirect: `{0}` not followed by a filename")]
    InvalidRedirect(String),
}

/// Errors from bang-history expansion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("!{0}: event not found")]
    NotFoundIndex(usize),
    #[error("!{0}: event not found")]
    NotFoundPrefix(String),
}

/// Strict-mode security guard rejection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("policy violation: {0}")]
pub struct PolicyViolation(pub String);

/// External executor could not resolve a command.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("command not found: {0}")]
pub struct CommandNotFound(pub String);

/// Top-level error enum, used only where a single type is needed to bridge
/// the taxonomy (e.g. `Shell::execute_line`'s own bookkeeping). Built-ins and
/// the executor convert directly to `ExecutionResult` instead of
/// round-tripping through this type — nothing propagates past a command or
/// chain boundary as a bare `Result`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShellError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Policy(#[from] PolicyViolation),
    #[error(transparent)]
    NotFound(#[from] CommandNotFound),
    #[error("{command}: {message}")]
    Os { command: String, message: String },
}

impl ShellError {
    pub fn os(command: impl Into<String>, message: impl Into<String>) -> Self {
        ShellError::Os {
            command: command.into(),
            message: message.into(),
        }
    }

    /// The exit code a front end should report for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ShellError::Parse(_) => 1,
            ShellError::History(_) => 1,
            ShellError::Policy(_) => 1,
            ShellError::NotFound(_) => 127,
            ShellError::Os { .. } => 1,
        }
    }
}
