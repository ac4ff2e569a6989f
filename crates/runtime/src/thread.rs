//! Thread: one operand stack executing compiled op groups against a VM.
//!
//! Inline groups run back to back; every `Call` group is a boundary where
//! the interpreter checks the cancel token, enforces the depth limit, and
//! dispatches on the target symbol's *current* value - so rebinding a
//! symbol between runs changes what a call does, and a quotation value
//! that was never compiled is pushed instead of invoked.

use tracing::trace;

use crate::cancel::CancelToken;
use crate::error::RuntimeError;
use crate::ops::{FnIndex, Op, OpGroup, SymIndex};
use crate::value::Value;
use crate::vm::Vm;

/// Nested user-function calls past this depth abort the run.
const MAX_CALL_DEPTH: usize = 256;

/// A lightweight execution context bound to a VM.
///
/// Many threads may share one VM; the borrow ties each thread's lifetime
/// to it. Create one per "run" action and discard it afterwards.
pub struct Thread<'vm> {
    vm: &'vm Vm,
    stack: Vec<Value>,
    cancel: CancelToken,
    depth: usize,
}

impl<'vm> Thread<'vm> {
    pub fn new(vm: &'vm Vm) -> Self {
        Self::with_cancel(vm, CancelToken::new())
    }

    pub fn with_cancel(vm: &'vm Vm, cancel: CancelToken) -> Self {
        Thread {
            vm,
            stack: Vec::new(),
            cancel,
            depth: 0,
        }
    }

    /// The operand stack, bottom first.
    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    /// Consume the thread, keeping its final stack.
    pub fn into_stack(self) -> Vec<Value> {
        self.stack
    }

    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> Option<Value> {
        self.stack.pop()
    }

    /// Execute the compiled op groups of `function`.
    ///
    /// A slot with no installed code is the placeholder no-op the table
    /// allocates; running it does nothing.
    pub fn run(&mut self, function: FnIndex) -> Result<(), RuntimeError> {
        self.check_cancelled()?;
        let Some(code) = self.vm.function_code(function) else {
            return match self.vm.function_source(function) {
                Some(_) => Ok(()),
                None => Err(RuntimeError::NoFunction(function)),
            };
        };
        for group in code.iter() {
            match group {
                OpGroup::Inline(ops) => {
                    for op in ops {
                        self.exec_op(op)?;
                    }
                }
                OpGroup::Call(sym) => self.call_symbol(*sym)?,
            }
        }
        Ok(())
    }

    fn check_cancelled(&self) -> Result<(), RuntimeError> {
        if self.cancel.is_cancelled() {
            Err(RuntimeError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn exec_op(&mut self, op: &Op) -> Result<(), RuntimeError> {
        trace!(?op, "exec");
        match op {
            Op::PushNumber(n) => {
                self.stack.push(Value::Number(*n));
                Ok(())
            }
            Op::PushString(s) => {
                self.stack.push(Value::Str(s.clone()));
                Ok(())
            }
            Op::PushQuotation(f) => {
                self.stack.push(Value::Quotation(*f));
                Ok(())
            }
            Op::PushSymbol(idx) => {
                match self.vm.symbol_value(*idx) {
                    Some(Value::Unbound) | None => {
                        Err(RuntimeError::NotImplemented(self.symbol_name(*idx)))
                    }
                    Some(v) => {
                        self.stack.push(v);
                        Ok(())
                    }
                }
            }
            Op::PopSymbol(idx) => {
                let v = self
                    .stack
                    .pop()
                    .ok_or(RuntimeError::StackUnderflow("pop"))?;
                self.vm.set_symbol(*idx, v);
                Ok(())
            }
            Op::Builtin { op, arg } => {
                let mut out = Vec::new();
                let result = op.execute(&mut self.stack, *arg, &mut out);
                if !out.is_empty() {
                    self.vm.push_output(out);
                }
                result
            }
        }
    }

    /// Dispatch a call through a symbol's current binding.
    fn call_symbol(&mut self, sym: SymIndex) -> Result<(), RuntimeError> {
        self.check_cancelled()?;
        match self.vm.symbol_value(sym) {
            Some(Value::Unbound) | None => {
                Err(RuntimeError::NotImplemented(self.symbol_name(sym)))
            }
            Some(Value::Quotation(f)) if self.vm.function_code(f).is_some() => {
                if self.depth >= MAX_CALL_DEPTH {
                    return Err(RuntimeError::CallDepthExceeded);
                }
                self.depth += 1;
                let result = self.run(f);
                self.depth -= 1;
                result
            }
            // Data bindings (including uncompiled quotations) are pushed,
            // not invoked.
            Some(v) => {
                self.stack.push(v);
                Ok(())
            }
        }
    }

    fn symbol_name(&self, idx: SymIndex) -> String {
        self.vm
            .symbol_name(idx)
            .unwrap_or_else(|| format!("#{}", idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::BuiltinOp;
    use knot_core::Expr;
    use std::sync::Arc;

    fn inline(ops: Vec<Op>) -> Arc<Vec<OpGroup>> {
        Arc::new(vec![OpGroup::Inline(ops)])
    }

    #[test]
    fn test_inline_arithmetic() {
        let vm = Vm::new();
        let f = vm.alloc_function(vec![]);
        vm.install_code(
            f,
            inline(vec![
                Op::PushNumber(3.0),
                Op::PushNumber(4.0),
                Op::Builtin {
                    op: BuiltinOp::Add,
                    arg: None,
                },
            ]),
        );
        let mut t = Thread::new(&vm);
        t.run(f).unwrap();
        assert_eq!(t.stack(), &[Value::Number(7.0)]);
    }

    #[test]
    fn test_pop_then_push_symbol() {
        let vm = Vm::new();
        let (x, _) = vm.intern_symbol("x");
        let f = vm.alloc_function(vec![]);
        vm.install_code(
            f,
            inline(vec![
                Op::PushNumber(5.0),
                Op::PopSymbol(x),
                Op::PushSymbol(x),
            ]),
        );
        let mut t = Thread::new(&vm);
        t.run(f).unwrap();
        assert_eq!(t.stack(), &[Value::Number(5.0)]);
        assert_eq!(vm.symbol_value(x), Some(Value::Number(5.0)));
    }

    #[test]
    fn test_push_unbound_symbol_fails() {
        let vm = Vm::new();
        let (x, _) = vm.intern_symbol("later");
        let f = vm.alloc_function(vec![]);
        vm.install_code(f, inline(vec![Op::PushSymbol(x)]));
        let mut t = Thread::new(&vm);
        assert_eq!(
            t.run(f),
            Err(RuntimeError::NotImplemented("later".to_string()))
        );
    }

    #[test]
    fn test_call_unbound_symbol_fails() {
        let vm = Vm::new();
        let (x, _) = vm.intern_symbol("later");
        let f = vm.alloc_function(vec![]);
        vm.install_code(f, Arc::new(vec![OpGroup::Call(x)]));
        let mut t = Thread::new(&vm);
        assert_eq!(
            t.run(f),
            Err(RuntimeError::NotImplemented("later".to_string()))
        );
    }

    #[test]
    fn test_call_dispatches_compiled_quotation() {
        let vm = Vm::new();
        let inner = vm.alloc_function(vec![]);
        vm.install_code(inner, inline(vec![Op::PushNumber(9.0)]));
        let (x, _) = vm.intern_symbol("nine");
        vm.set_symbol(x, Value::Quotation(inner));

        let f = vm.alloc_function(vec![]);
        vm.install_code(f, Arc::new(vec![OpGroup::Call(x)]));
        let mut t = Thread::new(&vm);
        t.run(f).unwrap();
        assert_eq!(t.stack(), &[Value::Number(9.0)]);
    }

    #[test]
    fn test_call_pushes_plain_data_binding() {
        let vm = Vm::new();
        let (x, _) = vm.intern_symbol("x");
        vm.set_symbol(x, Value::Number(5.0));
        let f = vm.alloc_function(vec![]);
        vm.install_code(f, Arc::new(vec![OpGroup::Call(x)]));
        let mut t = Thread::new(&vm);
        t.run(f).unwrap();
        assert_eq!(t.stack(), &[Value::Number(5.0)]);
    }

    #[test]
    fn test_call_pushes_uncompiled_quotation() {
        let vm = Vm::new();
        // Slot allocated but lowering never installed code: data only.
        let q = vm.alloc_function(vec![Expr::Number(1.0)]);
        let (x, _) = vm.intern_symbol("q");
        vm.set_symbol(x, Value::Quotation(q));

        let f = vm.alloc_function(vec![]);
        vm.install_code(f, Arc::new(vec![OpGroup::Call(x)]));
        let mut t = Thread::new(&vm);
        t.run(f).unwrap();
        assert_eq!(t.stack(), &[Value::Quotation(q)]);
    }

    #[test]
    fn test_placeholder_slot_runs_as_noop() {
        let vm = Vm::new();
        let f = vm.alloc_function(vec![]);
        let mut t = Thread::new(&vm);
        t.run(f).unwrap();
        assert!(t.stack().is_empty());
    }

    #[test]
    fn test_missing_function_index() {
        let vm = Vm::new();
        let mut t = Thread::new(&vm);
        assert_eq!(t.run(99), Err(RuntimeError::NoFunction(99)));
    }

    #[test]
    fn test_cancelled_before_start() {
        let vm = Vm::new();
        let f = vm.alloc_function(vec![]);
        vm.install_code(f, inline(vec![Op::PushNumber(1.0)]));
        let token = CancelToken::new();
        token.cancel();
        let mut t = Thread::with_cancel(&vm, token);
        assert_eq!(t.run(f), Err(RuntimeError::Cancelled));
    }

    #[test]
    fn test_recursive_call_hits_depth_limit() {
        let vm = Vm::new();
        let (x, _) = vm.intern_symbol("loop");
        let f = vm.alloc_function(vec![]);
        vm.install_code(f, Arc::new(vec![OpGroup::Call(x)]));
        vm.set_symbol(x, Value::Quotation(f));
        let mut t = Thread::new(&vm);
        assert_eq!(t.run(f), Err(RuntimeError::CallDepthExceeded));
    }
}
