//! Built-in words.
//!
//! A built-in is an identifier whose symbol-table binding is the `Magic`
//! sentinel; the compiler inlines it as a single operation instead of a
//! call. A trailing digit run on the written name is a repetition/arity
//! argument: `dup2` duplicates the top two values as a block, `drop3` drops
//! three, `swap3` rotates the third element to the top. Built-ins that take
//! no argument reject a suffix with a structured runtime error.

use crate::error::RuntimeError;
use crate::value::Value;

/// The built-in word set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinOp {
    Dup,
    Swap,
    Drop,
    Print,
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Gt,
    And,
    Or,
    Not,
}

impl BuiltinOp {
    /// Every built-in, for seeding the VM's symbol table.
    pub const ALL: [BuiltinOp; 15] = [
        BuiltinOp::Dup,
        BuiltinOp::Swap,
        BuiltinOp::Drop,
        BuiltinOp::Print,
        BuiltinOp::Add,
        BuiltinOp::Sub,
        BuiltinOp::Mul,
        BuiltinOp::Div,
        BuiltinOp::Eq,
        BuiltinOp::Ne,
        BuiltinOp::Lt,
        BuiltinOp::Gt,
        BuiltinOp::And,
        BuiltinOp::Or,
        BuiltinOp::Not,
    ];

    /// The word as written in source.
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinOp::Dup => "dup",
            BuiltinOp::Swap => "swap",
            BuiltinOp::Drop => "drop",
            BuiltinOp::Print => "print",
            BuiltinOp::Add => "+",
            BuiltinOp::Sub => "-",
            BuiltinOp::Mul => "*",
            BuiltinOp::Div => "/",
            BuiltinOp::Eq => "=",
            BuiltinOp::Ne => "!=",
            BuiltinOp::Lt => "<",
            BuiltinOp::Gt => ">",
            BuiltinOp::And => "&",
            BuiltinOp::Or => "|",
            BuiltinOp::Not => "not",
        }
    }

    /// Resolve a base name (without any digit suffix) to a built-in.
    pub fn from_name(name: &str) -> Option<BuiltinOp> {
        BuiltinOp::ALL.iter().copied().find(|b| b.name() == name)
    }
}

/// Pop one operand or fail with the built-in's name.
fn pop(stack: &mut Vec<Value>, op: &'static str) -> Result<Value, RuntimeError> {
    stack.pop().ok_or(RuntimeError::StackUnderflow(op))
}

fn pop_number(stack: &mut Vec<Value>, op: &'static str) -> Result<f64, RuntimeError> {
    match pop(stack, op)? {
        Value::Number(n) => Ok(n),
        other => Err(RuntimeError::TypeMismatch {
            op,
            found: other.type_name().to_string(),
        }),
    }
}

fn pop_bool(stack: &mut Vec<Value>, op: &'static str) -> Result<bool, RuntimeError> {
    match pop(stack, op)? {
        Value::Bool(b) => Ok(b),
        other => Err(RuntimeError::TypeMismatch {
            op,
            found: other.type_name().to_string(),
        }),
    }
}

/// Reject a digit suffix on a built-in that takes none.
fn no_arg(op: &'static str, arg: Option<u32>) -> Result<(), RuntimeError> {
    match arg {
        None => Ok(()),
        Some(a) => Err(RuntimeError::BadArgument { op, arg: a }),
    }
}

impl BuiltinOp {
    /// Execute this built-in against an operand stack.
    ///
    /// `print` output goes to `out`; the caller (the thread) forwards it to
    /// the VM's output sink.
    pub(crate) fn execute(
        self,
        stack: &mut Vec<Value>,
        arg: Option<u32>,
        out: &mut Vec<String>,
    ) -> Result<(), RuntimeError> {
        match self {
            BuiltinOp::Dup => {
                let n = arg.unwrap_or(1) as usize;
                if stack.len() < n {
                    return Err(RuntimeError::StackUnderflow("dup"));
                }
                let at = stack.len() - n;
                let block: Vec<Value> = stack[at..].to_vec();
                stack.extend(block);
                Ok(())
            }
            BuiltinOp::Drop => {
                let n = arg.unwrap_or(1) as usize;
                if stack.len() < n {
                    return Err(RuntimeError::StackUnderflow("drop"));
                }
                stack.truncate(stack.len() - n);
                Ok(())
            }
            BuiltinOp::Swap => {
                // Rotate the n-th element (from the top) to the top.
                let n = arg.unwrap_or(2) as usize;
                if n < 2 {
                    return Err(RuntimeError::BadArgument {
                        op: "swap",
                        arg: n as u32,
                    });
                }
                if stack.len() < n {
                    return Err(RuntimeError::StackUnderflow("swap"));
                }
                let at = stack.len() - n;
                let v = stack.remove(at);
                stack.push(v);
                Ok(())
            }
            BuiltinOp::Print => {
                no_arg("print", arg)?;
                let v = pop(stack, "print")?;
                out.push(v.to_string());
                Ok(())
            }
            BuiltinOp::Add => {
                no_arg("+", arg)?;
                let b = pop(stack, "+")?;
                let a = pop(stack, "+")?;
                let r = match (a, b) {
                    (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
                    (Value::Str(a), Value::Str(b)) => Value::Str(a + &b),
                    (a, _) => {
                        return Err(RuntimeError::TypeMismatch {
                            op: "+",
                            found: a.type_name().to_string(),
                        });
                    }
                };
                stack.push(r);
                Ok(())
            }
            BuiltinOp::Sub | BuiltinOp::Mul | BuiltinOp::Div => {
                let op = self.name();
                no_arg(op, arg)?;
                let b = pop_number(stack, op)?;
                let a = pop_number(stack, op)?;
                let r = match self {
                    BuiltinOp::Sub => a - b,
                    BuiltinOp::Mul => a * b,
                    _ => a / b,
                };
                stack.push(Value::Number(r));
                Ok(())
            }
            BuiltinOp::Eq | BuiltinOp::Ne => {
                let op = self.name();
                no_arg(op, arg)?;
                let b = pop(stack, op)?;
                let a = pop(stack, op)?;
                let eq = a == b;
                stack.push(Value::Bool(if self == BuiltinOp::Eq { eq } else { !eq }));
                Ok(())
            }
            BuiltinOp::Lt | BuiltinOp::Gt => {
                let op = self.name();
                no_arg(op, arg)?;
                let b = pop(stack, op)?;
                let a = pop(stack, op)?;
                let r = match (&a, &b) {
                    (Value::Number(a), Value::Number(b)) => {
                        if self == BuiltinOp::Lt { a < b } else { a > b }
                    }
                    (Value::Str(a), Value::Str(b)) => {
                        if self == BuiltinOp::Lt { a < b } else { a > b }
                    }
                    _ => {
                        return Err(RuntimeError::TypeMismatch {
                            op,
                            found: a.type_name().to_string(),
                        });
                    }
                };
                stack.push(Value::Bool(r));
                Ok(())
            }
            BuiltinOp::And | BuiltinOp::Or => {
                let op = self.name();
                no_arg(op, arg)?;
                let b = pop_bool(stack, op)?;
                let a = pop_bool(stack, op)?;
                let r = if self == BuiltinOp::And { a && b } else { a || b };
                stack.push(Value::Bool(r));
                Ok(())
            }
            BuiltinOp::Not => {
                no_arg("not", arg)?;
                let a = pop_bool(stack, "not")?;
                stack.push(Value::Bool(!a));
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(op: BuiltinOp, arg: Option<u32>, stack: &mut Vec<Value>) -> Result<(), RuntimeError> {
        let mut out = Vec::new();
        op.execute(stack, arg, &mut out)
    }

    fn nums(vs: &[f64]) -> Vec<Value> {
        vs.iter().map(|&v| Value::Number(v)).collect()
    }

    #[test]
    fn test_add_numbers() {
        let mut s = nums(&[3.0, 4.0]);
        run(BuiltinOp::Add, None, &mut s).unwrap();
        assert_eq!(s, nums(&[7.0]));
    }

    #[test]
    fn test_add_strings_concatenates() {
        let mut s = vec![
            Value::Str("ab".to_string()),
            Value::Str("cd".to_string()),
        ];
        run(BuiltinOp::Add, None, &mut s).unwrap();
        assert_eq!(s, vec![Value::Str("abcd".to_string())]);
    }

    #[test]
    fn test_add_type_mismatch() {
        let mut s = vec![Value::Number(1.0), Value::Bool(true)];
        let err = run(BuiltinOp::Add, None, &mut s).unwrap_err();
        assert!(matches!(err, RuntimeError::TypeMismatch { op: "+", .. }));
    }

    #[test]
    fn test_sub_is_ordered() {
        let mut s = nums(&[10.0, 4.0]);
        run(BuiltinOp::Sub, None, &mut s).unwrap();
        assert_eq!(s, nums(&[6.0]));
    }

    #[test]
    fn test_dup_default_and_suffixed() {
        let mut s = nums(&[1.0, 2.0]);
        run(BuiltinOp::Dup, None, &mut s).unwrap();
        assert_eq!(s, nums(&[1.0, 2.0, 2.0]));

        let mut s = nums(&[1.0, 2.0]);
        run(BuiltinOp::Dup, Some(2), &mut s).unwrap();
        assert_eq!(s, nums(&[1.0, 2.0, 1.0, 2.0]));
    }

    #[test]
    fn test_drop_suffixed() {
        let mut s = nums(&[1.0, 2.0, 3.0]);
        run(BuiltinOp::Drop, Some(2), &mut s).unwrap();
        assert_eq!(s, nums(&[1.0]));
    }

    #[test]
    fn test_swap_and_rotate() {
        let mut s = nums(&[1.0, 2.0]);
        run(BuiltinOp::Swap, None, &mut s).unwrap();
        assert_eq!(s, nums(&[2.0, 1.0]));

        let mut s = nums(&[1.0, 2.0, 3.0]);
        run(BuiltinOp::Swap, Some(3), &mut s).unwrap();
        assert_eq!(s, nums(&[2.0, 3.0, 1.0]));
    }

    #[test]
    fn test_underflow() {
        let mut s = nums(&[1.0]);
        let err = run(BuiltinOp::Add, None, &mut s).unwrap_err();
        assert_eq!(err, RuntimeError::StackUnderflow("+"));
    }

    #[test]
    fn test_suffix_rejected_where_meaningless() {
        let mut s = nums(&[1.0, 2.0]);
        let err = run(BuiltinOp::Add, Some(3), &mut s).unwrap_err();
        assert_eq!(err, RuntimeError::BadArgument { op: "+", arg: 3 });
    }

    #[test]
    fn test_comparisons_and_logic() {
        let mut s = nums(&[1.0, 2.0]);
        run(BuiltinOp::Lt, None, &mut s).unwrap();
        assert_eq!(s, vec![Value::Bool(true)]);

        s.push(Value::Bool(false));
        run(BuiltinOp::And, None, &mut s).unwrap();
        assert_eq!(s, vec![Value::Bool(false)]);

        run(BuiltinOp::Not, None, &mut s).unwrap();
        assert_eq!(s, vec![Value::Bool(true)]);
    }

    #[test]
    fn test_eq_on_mixed_types_is_false() {
        let mut s = vec![Value::Number(1.0), Value::Str("1".to_string())];
        run(BuiltinOp::Eq, None, &mut s).unwrap();
        assert_eq!(s, vec![Value::Bool(false)]);
    }

    #[test]
    fn test_print_pops_to_output() {
        let mut s = nums(&[42.0]);
        let mut out = Vec::new();
        BuiltinOp::Print.execute(&mut s, None, &mut out).unwrap();
        assert!(s.is_empty());
        assert_eq!(out, vec!["42".to_string()]);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(BuiltinOp::from_name("dup"), Some(BuiltinOp::Dup));
        assert_eq!(BuiltinOp::from_name("+"), Some(BuiltinOp::Add));
        assert_eq!(BuiltinOp::from_name("nope"), None);
    }
}
