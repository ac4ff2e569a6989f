//! Lowering: expression lists to op groups.
//!
//! Compilation resolves names against the VM's symbol table and produces
//! the op-group form its threads interpret. Every list gets its own
//! function-table slot (its source is stored alongside), and nested lists
//! compile eagerly into `PushQuotation` of their slot - the quotation is a
//! value; nothing runs until a call dispatches through a symbol bound to
//! it.
//!
//! Assignment (`=_name`) is root-only and *deferred*: the pop is emitted
//! after the next literal push, before the next symbol read, call, or
//! builtin, or at the end of the sequence, so both `=_x  5` and `5  =_x`
//! store 5. A pre-scan registers every root-level assigned name before
//! resolution starts, which is what lets `=_x  5  _x` in a single commit
//! see its own binding.

use std::sync::Arc;

use tracing::debug;

use knot_core::{ASSIGN_SIGIL, Expr, PUSH_SIGIL};
use knot_runtime::{BuiltinOp, FnIndex, Op, OpGroup, SymIndex, Value, Vm};

use crate::error::CompileError;

/// What a successful compilation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutput {
    /// Function-table slot holding the compiled root sequence.
    pub function: FnIndex,
    /// Names the pre-scan newly registered, in source order. The editing
    /// layer announces these.
    pub new_symbols: Vec<String>,
}

/// Compile a committed expression sequence into a runnable function.
///
/// Holds the VM's compile guard for the duration, so concurrent commits
/// serialize and each sees the symbols the previous one registered.
pub fn compile(vm: &Vm, exprs: &[Expr]) -> Result<CompileOutput, CompileError> {
    let _guard = vm.compile_guard();
    let new_symbols = prescan(vm, exprs);
    let function = scan(vm, exprs, true)?;
    debug!(function, new = new_symbols.len(), "compiled");
    Ok(CompileOutput {
        function,
        new_symbols,
    })
}

/// Register every root-level assigned name, returning the ones that did
/// not exist before.
fn prescan(vm: &Vm, exprs: &[Expr]) -> Vec<String> {
    let mut created = Vec::new();
    for expr in exprs {
        if let Expr::Ident(name) = expr {
            if let Some(target) = assign_target(name) {
                let (_, new) = vm.intern_symbol(target);
                if new {
                    created.push(target.to_string());
                }
            }
        }
    }
    created
}

fn assign_target(name: &str) -> Option<&str> {
    name.strip_prefix(ASSIGN_SIGIL).filter(|t| !t.is_empty())
}

fn push_target(name: &str) -> Option<&str> {
    name.strip_prefix(PUSH_SIGIL).filter(|t| !t.is_empty())
}

fn scan(vm: &Vm, exprs: &[Expr], is_root: bool) -> Result<FnIndex, CompileError> {
    let function = vm.alloc_function(exprs.to_vec());
    let mut groups: Vec<OpGroup> = Vec::new();
    let mut inline: Vec<Op> = Vec::new();
    // Assignments whose pop is still waiting for a produced value,
    // most recent last.
    let mut pending: Vec<SymIndex> = Vec::new();

    for expr in exprs {
        match expr {
            Expr::Comment(_) => {}
            Expr::Number(n) => {
                inline.push(Op::PushNumber(*n));
                drain_one(&mut inline, &mut pending);
            }
            Expr::Str(s) => {
                inline.push(Op::PushString(s.clone()));
                drain_one(&mut inline, &mut pending);
            }
            Expr::List(body) => {
                let f = scan(vm, body, false)?;
                inline.push(Op::PushQuotation(f));
                drain_one(&mut inline, &mut pending);
            }
            Expr::Ident(name) => {
                if let Some(target) = assign_target(name) {
                    if !is_root {
                        return Err(CompileError::AssignOutsideRoot(
                            target.to_string(),
                        ));
                    }
                    let (idx, _) = vm.intern_symbol(target);
                    pending.push(idx);
                } else if let Some(target) = push_target(name) {
                    // Reads the symbol's value, so pending assignments
                    // settle first. The name must already be registered
                    // (the pre-scan covers forward references within this
                    // commit); a typo fails here instead of polluting the
                    // append-only table.
                    drain_all(&mut inline, &mut pending);
                    let (idx, _) = vm.lookup_symbol(target).ok_or_else(|| {
                        CompileError::SymbolNotFound(target.to_string())
                    })?;
                    inline.push(Op::PushSymbol(idx));
                } else {
                    // Calls and builtins consume the stack, so any pending
                    // assignment takes its value first.
                    drain_all(&mut inline, &mut pending);
                    match vm.lookup_symbol(name) {
                        Some((_, Value::Magic)) => {
                            let op = BuiltinOp::from_name(name).ok_or_else(
                                || CompileError::SymbolNotFound(name.clone()),
                            )?;
                            inline.push(Op::Builtin { op, arg: None });
                        }
                        Some((idx, _)) => {
                            if !inline.is_empty() {
                                groups.push(OpGroup::Inline(std::mem::take(
                                    &mut inline,
                                )));
                            }
                            groups.push(OpGroup::Call(idx));
                        }
                        None => {
                            let (op, arg) = builtin_ref(name).ok_or_else(
                                || CompileError::SymbolNotFound(name.clone()),
                            )?;
                            inline.push(Op::Builtin { op, arg });
                        }
                    }
                }
            }
        }
    }
    drain_all(&mut inline, &mut pending);
    if !inline.is_empty() {
        groups.push(OpGroup::Inline(inline));
    }
    vm.install_code(function, Arc::new(groups));
    Ok(function)
}

/// Emit the pop for the most recent still-pending assignment, if any.
fn drain_one(inline: &mut Vec<Op>, pending: &mut Vec<SymIndex>) {
    if let Some(idx) = pending.pop() {
        inline.push(Op::PopSymbol(idx));
    }
}

/// Emit pops for every pending assignment, most recent first.
fn drain_all(inline: &mut Vec<Op>, pending: &mut Vec<SymIndex>) {
    while let Some(idx) = pending.pop() {
        inline.push(Op::PopSymbol(idx));
    }
}

/// Resolve an unregistered name as a builtin reference: an optional
/// leading `:` is stripped, and a trailing digit run is the argument
/// (`dup2` is `dup` with arg 2, `:dup` is plain `dup`).
fn builtin_ref(name: &str) -> Option<(BuiltinOp, Option<u32>)> {
    let name = name.strip_prefix(':').unwrap_or(name);
    if let Some(op) = BuiltinOp::from_name(name) {
        return Some((op, None));
    }
    let base = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if base.len() == name.len() || base.is_empty() {
        return None;
    }
    let arg: u32 = name[base.len()..].parse().ok()?;
    BuiltinOp::from_name(base).map(|op| (op, Some(arg)))
}
