//! The executable form produced by the compiler.
//!
//! A compiled function is a sequence of operation groups: runs of simple
//! inline operations batched into one dispatch unit, with calls to other
//! functions routed individually so the interpreter can check cancellation
//! and recurse at each call boundary.

use crate::builtins::BuiltinOp;

/// Stable index into the VM's symbol table. Never reused or reordered.
pub type SymIndex = usize;

/// Stable index into the VM's function table. Never reused or reordered.
pub type FnIndex = usize;

/// A simple inline operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Push a numeric literal.
    PushNumber(f64),
    /// Push a string literal.
    PushString(String),
    /// Push the symbol's current value.
    PushSymbol(SymIndex),
    /// Pop the top of stack into the symbol.
    PopSymbol(SymIndex),
    /// Execute a built-in word, with its optional trailing-digit argument.
    Builtin { op: BuiltinOp, arg: Option<u32> },
    /// Push a reference to a compiled sub-expression as a first-class
    /// value. Never invoked by this op.
    PushQuotation(FnIndex),
}

/// One dispatch unit of a compiled function.
#[derive(Debug, Clone, PartialEq)]
pub enum OpGroup {
    /// A run of simple operations executed back to back.
    Inline(Vec<Op>),
    /// A call through a symbol: dispatched individually so the target's
    /// *current* binding decides between invocation and a value push.
    Call(SymIndex),
}
