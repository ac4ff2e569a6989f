//! knot-core: editing-layer types for the Knot language
//!
//! This crate holds everything the editor and the language pipeline share:
//! tokens, the cursor-aware token zipper, expression trees, and the
//! depth-structured expression cuts used for cut/copy/paste.
//!
//! # Design Philosophy
//!
//! - **Host-agnostic**: no rendering, no event wiring - the UI layer
//!   consumes tokens and diagnostics, nothing more
//! - **Value-based**: plain enums and vecs, no interior mutability
//! - **Self-contained**: no third-party dependencies

mod expr;
mod token;
mod zipper;

pub use expr::{
    CurList, CutExprs, Expr, ExprCursor, cur_list_to_cursor, cursor_to_cur_list,
};
pub use token::{ASSIGN_SIGIL, PUSH_SIGIL, Token, escape_string, serialize_tokens};
pub use zipper::TokenZipper;
