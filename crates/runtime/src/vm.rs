//! The VM: symbol table, function table, global store, trigger hook.
//!
//! Both tables are append-only: indices are handed out once and never
//! reused or reordered, so compiled code can hold them forever. Symbol
//! lookups are case-insensitive (names are stored folded). Compilation
//! appends to the tables and must hold `compile_guard`; threads only read
//! table structure and update single symbol slots.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use knot_core::Expr;
use tracing::debug;

use crate::builtins::BuiltinOp;
use crate::ops::{FnIndex, OpGroup, SymIndex};
use crate::value::Value;

/// One symbol-table entry: a name and its current binding.
#[derive(Debug, Clone)]
pub struct SymbolEntry {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Default)]
struct SymbolTable {
    by_name: HashMap<String, SymIndex>,
    entries: Vec<SymbolEntry>,
}

/// One function-table slot: the source expression it was allocated for,
/// and the executable installed by the compiler's lowering step. A slot
/// without code is a plain data holder (an uncompiled quotation).
#[derive(Debug, Clone)]
pub struct FunctionSlot {
    pub source: Vec<Expr>,
    pub code: Option<Arc<Vec<OpGroup>>>,
}

type TriggerHook = Box<dyn Fn(&str, &Value) + Send + Sync>;

/// The shared virtual machine.
pub struct Vm {
    symbols: RwLock<SymbolTable>,
    functions: RwLock<Vec<FunctionSlot>>,
    /// Global auxiliary store for the embedding layer.
    globals: RwLock<HashMap<String, Value>>,
    /// `print` output, drained by the embedding layer.
    output: Mutex<Vec<String>>,
    /// Notification hook fired on every symbol mutation. Observed by the
    /// UI layer only; no VM logic consults it.
    trigger: RwLock<Option<TriggerHook>>,
    /// Serializes compilation: index allocation in the tables above is not
    /// designed to interleave.
    compile_lock: Mutex<()>,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    /// A fresh VM with every built-in word bound to the `Magic` sentinel.
    pub fn new() -> Self {
        let vm = Vm {
            symbols: RwLock::new(SymbolTable::default()),
            functions: RwLock::new(Vec::new()),
            globals: RwLock::new(HashMap::new()),
            output: Mutex::new(Vec::new()),
            trigger: RwLock::new(None),
            compile_lock: Mutex::new(()),
        };
        {
            let mut table = vm.symbols.write().expect("symbol table poisoned");
            for b in BuiltinOp::ALL {
                let idx = table.entries.len();
                table.by_name.insert(b.name().to_string(), idx);
                table.entries.push(SymbolEntry {
                    name: b.name().to_string(),
                    value: Value::Magic,
                });
            }
        }
        vm
    }

    /// Register `name` (case-folded), or return its existing index.
    ///
    /// A fresh symbol is bound to the `Unbound` stub, which fails with
    /// "not implemented" if invoked before being assigned. The bool is
    /// true when the symbol was newly created.
    pub fn intern_symbol(&self, name: &str) -> (SymIndex, bool) {
        let name = name.to_lowercase();
        let mut table = self.symbols.write().expect("symbol table poisoned");
        if let Some(&idx) = table.by_name.get(&name) {
            return (idx, false);
        }
        let idx = table.entries.len();
        debug!(symbol = %name, index = idx, "new symbol");
        table.by_name.insert(name.clone(), idx);
        table.entries.push(SymbolEntry {
            name,
            value: Value::Unbound,
        });
        (idx, true)
    }

    /// Look up a registered symbol (case-insensitive).
    pub fn lookup_symbol(&self, name: &str) -> Option<(SymIndex, Value)> {
        let name = name.to_lowercase();
        let table = self.symbols.read().expect("symbol table poisoned");
        let &idx = table.by_name.get(&name)?;
        Some((idx, table.entries[idx].value.clone()))
    }

    /// The current value of a symbol slot.
    pub fn symbol_value(&self, idx: SymIndex) -> Option<Value> {
        let table = self.symbols.read().expect("symbol table poisoned");
        table.entries.get(idx).map(|e| e.value.clone())
    }

    /// The name a symbol slot was registered under.
    pub fn symbol_name(&self, idx: SymIndex) -> Option<String> {
        let table = self.symbols.read().expect("symbol table poisoned");
        table.entries.get(idx).map(|e| e.name.clone())
    }

    /// Rebind a symbol slot and fire the trigger hook.
    pub fn set_symbol(&self, idx: SymIndex, value: Value) {
        let name = {
            let mut table = self.symbols.write().expect("symbol table poisoned");
            let Some(entry) = table.entries.get_mut(idx) else {
                return;
            };
            entry.value = value.clone();
            entry.name.clone()
        };
        if let Some(hook) = self.trigger.read().expect("trigger poisoned").as_ref() {
            hook(&name, &value);
        }
    }

    /// Install the notification hook fired on symbol mutation.
    pub fn set_trigger(&self, hook: TriggerHook) {
        *self.trigger.write().expect("trigger poisoned") = Some(hook);
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.read().expect("symbol table poisoned").entries.len()
    }

    /// Append a function slot holding `source`, with no executable yet.
    pub fn alloc_function(&self, source: Vec<Expr>) -> FnIndex {
        let mut table = self.functions.write().expect("function table poisoned");
        let idx = table.len();
        debug!(index = idx, "alloc function slot");
        table.push(FunctionSlot { source, code: None });
        idx
    }

    /// Install the compiled executable for a slot (the lowering step).
    pub fn install_code(&self, idx: FnIndex, code: Arc<Vec<OpGroup>>) {
        let mut table = self.functions.write().expect("function table poisoned");
        if let Some(slot) = table.get_mut(idx) {
            slot.code = Some(code);
        }
    }

    /// The executable installed for a slot, if any.
    pub fn function_code(&self, idx: FnIndex) -> Option<Arc<Vec<OpGroup>>> {
        let table = self.functions.read().expect("function table poisoned");
        table.get(idx).and_then(|s| s.code.clone())
    }

    /// The source expression a slot was allocated for.
    pub fn function_source(&self, idx: FnIndex) -> Option<Vec<Expr>> {
        let table = self.functions.read().expect("function table poisoned");
        table.get(idx).map(|s| s.source.clone())
    }

    pub fn function_count(&self) -> usize {
        self.functions.read().expect("function table poisoned").len()
    }

    /// Serialize compilation: hold this guard across an entire compile.
    pub fn compile_guard(&self) -> MutexGuard<'_, ()> {
        self.compile_lock.lock().expect("compile lock poisoned")
    }

    /// Read a value from the global auxiliary store.
    pub fn global_get(&self, key: &str) -> Option<Value> {
        self.globals.read().expect("globals poisoned").get(key).cloned()
    }

    /// Write a value into the global auxiliary store.
    pub fn global_set(&self, key: &str, value: Value) {
        self.globals
            .write()
            .expect("globals poisoned")
            .insert(key.to_string(), value);
    }

    /// Append lines to the `print` output sink.
    pub(crate) fn push_output(&self, lines: Vec<String>) {
        self.output.lock().expect("output poisoned").extend(lines);
    }

    /// Drain accumulated `print` output.
    pub fn take_output(&self) -> Vec<String> {
        std::mem::take(&mut *self.output.lock().expect("output poisoned"))
    }
}
