//! An editing session: text in, committed expressions out.
//!
//! The session owns the token zipper and the not-yet-tokenized tail. Each
//! `feed` prepends the held tail to the new chunk, so an open construct
//! (an unclosed string, a comment with no newline) completes naturally
//! when its rest arrives. Cursor and selection edits go straight to the
//! zipper; `commit` assembles the current tokens into expressions and, on
//! success, clears the session for the next line of input.

use knot_core::{Expr, TokenZipper, serialize_tokens};

use crate::builder::ExprBuilder;
use crate::error::{CompileError, ParseDiagnostic};
use crate::parser::{ParseOptions, Parser};

/// What one `feed` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedOutcome {
    /// Bytes of the combined (held + new) input that became tokens.
    pub consumed: usize,
    /// Why the rest is held, when it is.
    pub diagnostic: Option<ParseDiagnostic>,
}

impl FeedOutcome {
    /// True when the held tail just needs more input.
    pub fn needs_more(&self) -> bool {
        self.diagnostic.as_ref().is_some_and(|d| d.is_incomplete())
    }
}

/// Resumable tokenizing state plus the token zipper under edit.
#[derive(Debug, Default)]
pub struct Session {
    parser: Parser,
    zipper: TokenZipper,
    pending: String,
}

impl Session {
    pub fn new(options: ParseOptions) -> Self {
        Session {
            parser: Parser::new(options),
            zipper: TokenZipper::new(),
            pending: String::new(),
        }
    }

    /// Tokenize a chunk of input at the cursor, combining it with any
    /// held tail from the previous feed.
    pub fn feed(&mut self, chunk: &str) -> FeedOutcome {
        let input = if self.pending.is_empty() {
            chunk.to_string()
        } else {
            let mut s = std::mem::take(&mut self.pending);
            s.push_str(chunk);
            s
        };
        let result = self.parser.feed(&mut self.zipper, &input);
        let diagnostic = Parser::describe(&result);
        self.pending = result.leftover;
        FeedOutcome {
            consumed: result.consumed,
            diagnostic,
        }
    }

    pub fn zipper(&self) -> &TokenZipper {
        &self.zipper
    }

    /// Direct access for cursor and selection edits.
    pub fn zipper_mut(&mut self) -> &mut TokenZipper {
        &mut self.zipper
    }

    /// True when input is held waiting for more text or an edit.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Throw away the held tail (the user chose to abandon it).
    pub fn discard_pending(&mut self) {
        self.pending.clear();
    }

    /// The current token sequence rendered back to editable text.
    pub fn source(&self) -> String {
        serialize_tokens(&self.zipper.tokens())
    }

    pub fn is_empty(&self) -> bool {
        self.zipper.is_empty() && self.pending.is_empty()
    }

    /// Assemble the current tokens into an expression sequence.
    ///
    /// Refuses while text is held awaiting more input - the held tail is
    /// the user's, never silently dropped; finish or discard it first. On
    /// success the session is cleared for the next input; on failure (an
    /// unmatched closing paren) everything stays as it was, so the user
    /// can edit and retry.
    pub fn commit(&mut self) -> Result<Vec<Expr>, CompileError> {
        if self.has_pending() {
            return Err(CompileError::PendingInput(self.pending.clone()));
        }
        let exprs = ExprBuilder::build(&self.zipper.tokens())?;
        self.zipper.reset();
        Ok(exprs)
    }
}
