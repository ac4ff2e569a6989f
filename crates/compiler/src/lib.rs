//! knotc: the Knot language front end
//!
//! Input arrives character by character and is frequently incomplete, so
//! the pipeline is built around resumable state rather than one-shot
//! parsing:
//!
//! 1. [`Parser::feed`] tokenizes raw text into a [`knot_core::TokenZipper`],
//!    returning any unconsumed tail (an open string, an unfinished comment)
//!    for the caller to retry once more text arrives;
//! 2. [`ExprBuilder`] folds the committed token sequence into nested
//!    expression lists;
//! 3. [`compile`] resolves atoms against the VM's symbol table and lowers
//!    each list into the op-group form the VM interprets, allocating stable
//!    function-table indices as it goes.
//!
//! [`Session`] ties the first two stages together behind the interface the
//! editing layer consumes: `feed`, cursor/selection edits, `commit`.

mod builder;
mod compile;
mod error;
mod parser;
mod pretty;
mod session;

pub use builder::ExprBuilder;
pub use compile::{CompileOutput, compile};
pub use error::{CompileError, ParseDiagnostic, ParseErrorKind};
pub use parser::{FeedResult, ParseOptions, Parser};
pub use pretty::{exprs_to_string, exprs_to_string_wrapped};
pub use session::{FeedOutcome, Session};
