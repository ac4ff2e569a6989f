//! Runtime values.

use std::fmt;

use crate::ops::FnIndex;

/// A value on a thread's operand stack or bound to a symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
    /// Reference to a function-table slot; first-class and never
    /// auto-invoked when pushed.
    Quotation(FnIndex),
    /// Sentinel marking a symbol as a built-in word, unbound to user code.
    Magic,
    /// Stub for a forward-declared symbol: invoking it fails with
    /// "not implemented" until the symbol is assigned.
    Unbound,
}

impl Value {
    /// Short type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Quotation(_) => "quotation",
            Value::Magic => "magic",
            Value::Unbound => "unbound",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Quotation(idx) => write!(f, "(#{})", idx),
            Value::Magic => write!(f, "<magic>"),
            Value::Unbound => write!(f, "<unbound>"),
        }
    }
}
