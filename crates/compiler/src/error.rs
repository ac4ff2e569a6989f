//! Front-end error types.
//!
//! Parse problems are *diagnostics* - user-facing text tied to the first
//! offending character, recoverable by feeding or editing text. Compile
//! problems are structured failures carrying the offending name; the
//! editing layer displays them and leaves state unchanged for retry.

use std::fmt;

/// How a parse diagnostic can be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// An open construct (string, comment) awaits more input; feeding the
    /// rest of it continues cleanly.
    Incomplete,
    /// The leftover starts with a character no rule accepts; it must be
    /// edited away before parsing can proceed.
    Unrecognized,
}

/// A user-facing parse diagnostic derived from unconsumed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    pub kind: ParseErrorKind,
    pub message: String,
}

impl ParseDiagnostic {
    pub fn is_incomplete(&self) -> bool {
        self.kind == ParseErrorKind::Incomplete
    }
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Structured failure from expression assembly or compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A closing paren arrived with no list open.
    TooManyClosings,
    /// A push or call referenced a name that was never registered.
    SymbolNotFound(String),
    /// The assign sigil appeared inside a nested quotation.
    AssignOutsideRoot(String),
    /// Commit attempted while text is still held awaiting more input.
    PendingInput(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::TooManyClosings => write!(f, "Too many closings"),
            CompileError::SymbolNotFound(name) => {
                write!(f, "symbol `{}` not found", name)
            }
            CompileError::AssignOutsideRoot(name) => {
                write!(f, "cannot assign `{}` inside a nested quotation", name)
            }
            CompileError::PendingInput(text) => {
                write!(f, "unfinished input still pending: `{}`", text)
            }
        }
    }
}

impl std::error::Error for CompileError {}
