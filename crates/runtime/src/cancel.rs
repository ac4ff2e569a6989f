//! Cooperative cancellation.
//!
//! A running thread checks its token at every function-call boundary, so a
//! looping script can be aborted without preempting it mid-group.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::RuntimeError;
use crate::ops::FnIndex;
use crate::thread::Thread;
use crate::value::Value;
use crate::vm::Vm;

/// Shared cancellation flag. Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect at the next call boundary.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Run a function on a fresh thread against `vm`, off the calling thread.
///
/// The returned handle yields the final operand stack. Cancel via the token
/// passed in; the run fails with `RuntimeError::Cancelled` at its next call
/// boundary.
pub fn spawn_run(
    vm: Arc<Vm>,
    function: FnIndex,
    token: CancelToken,
) -> std::thread::JoinHandle<Result<Vec<Value>, RuntimeError>> {
    std::thread::spawn(move || {
        let mut thread = Thread::with_cancel(&vm, token);
        thread.run(function)?;
        Ok(thread.into_stack())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shared_between_clones() {
        let a = CancelToken::new();
        let b = a.clone();
        assert!(!b.is_cancelled());
        a.cancel();
        assert!(b.is_cancelled());
    }
}
