//! knot-runtime: the Knot stack VM
//!
//! A `Vm` owns the append-only symbol and function tables, a global
//! auxiliary store, and a trigger hook fired on symbol mutation. A `Thread`
//! is a lightweight execution context - one operand stack bound to a VM -
//! that interprets the op-group form produced by knot-compiler.
//!
//! ## Concurrency model
//!
//! Tables are append-only and never reordered, so running threads may read
//! them concurrently; symbol *values* change, but only as single-slot
//! updates behind the table lock. Compilation appends to both tables and is
//! serialized through `Vm::compile_guard`. Long runs are aborted
//! cooperatively: every function-call boundary checks a `CancelToken`.

mod builtins;
mod cancel;
mod error;
mod ops;
mod thread;
mod value;
mod vm;

pub use builtins::BuiltinOp;
pub use cancel::{CancelToken, spawn_run};
pub use error::RuntimeError;
pub use ops::{FnIndex, Op, OpGroup, SymIndex};
pub use thread::Thread;
pub use value::Value;
pub use vm::{FunctionSlot, SymbolEntry, Vm};
