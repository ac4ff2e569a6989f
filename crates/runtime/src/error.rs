//! Runtime error types.

use std::fmt;

use crate::ops::FnIndex;

/// Structured failure raised while a thread executes compiled code.
///
/// None of these are swallowed: the editing layer displays them and leaves
/// the VM state as the failing operation left it.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// A forward-declared symbol was invoked before being defined.
    NotImplemented(String),
    /// An operation needed more operands than the stack holds.
    StackUnderflow(&'static str),
    /// An operation received an operand of the wrong type.
    TypeMismatch { op: &'static str, found: String },
    /// A built-in word got a numeric suffix it does not accept.
    BadArgument { op: &'static str, arg: u32 },
    /// The thread's cancel token was triggered at a call boundary.
    Cancelled,
    /// Function calls nested past the interpreter's depth limit.
    CallDepthExceeded,
    /// A function index with no table slot (corrupt compile output).
    NoFunction(FnIndex),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::NotImplemented(name) => {
                write!(f, "symbol `{}` is not implemented yet", name)
            }
            RuntimeError::StackUnderflow(op) => {
                write!(f, "stack underflow in `{}`", op)
            }
            RuntimeError::TypeMismatch { op, found } => {
                write!(f, "`{}` cannot operate on {}", op, found)
            }
            RuntimeError::BadArgument { op, arg } => {
                write!(f, "`{}` does not take an argument ({})", op, arg)
            }
            RuntimeError::Cancelled => write!(f, "execution cancelled"),
            RuntimeError::CallDepthExceeded => {
                write!(f, "call depth limit exceeded")
            }
            RuntimeError::NoFunction(idx) => {
                write!(f, "no function at index {}", idx)
            }
        }
    }
}

impl std::error::Error for RuntimeError {}
