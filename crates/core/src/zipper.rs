//! Cursor-aware token buffer.
//!
//! A `TokenZipper` is the editing representation of a token sequence: the
//! tokens left of the cursor in order, the tokens right of the cursor stored
//! reversed, and an optional mark anchoring the other end of a selection.
//! The invariant `left ++ reverse(right)` always equals the full sequence;
//! the cursor position is `left.len()`.
//!
//! Stepping the cursor by one is O(1); a jump costs the distance moved.

use crate::token::Token;

/// An ordered token sequence split at the cursor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenZipper {
    left: Vec<Token>,
    /// Tokens right of the cursor, in reverse order (next token is last).
    right: Vec<Token>,
    /// The other end of an active selection, as an index into the full
    /// sequence. `None` means no selection.
    mark: Option<usize>,
}

impl TokenZipper {
    /// An empty buffer with the cursor at position 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a zipper from a token sequence, cursor at `cursor` (clamped).
    pub fn split(tokens: Vec<Token>, cursor: usize) -> Self {
        let cursor = cursor.min(tokens.len());
        let mut left = tokens;
        let mut right: Vec<Token> = left.split_off(cursor);
        right.reverse();
        TokenZipper {
            left,
            right,
            mark: None,
        }
    }

    /// Flatten back into a plain token sequence, consuming the zipper.
    pub fn join(self) -> Vec<Token> {
        let mut out = self.left;
        out.extend(self.right.into_iter().rev());
        out
    }

    /// A flattened copy of the sequence, leaving the zipper intact.
    pub fn tokens(&self) -> Vec<Token> {
        let mut out = self.left.clone();
        out.extend(self.right.iter().rev().cloned());
        out
    }

    /// Current cursor position.
    pub fn cursor(&self) -> usize {
        self.left.len()
    }

    /// Total number of tokens.
    pub fn len(&self) -> usize {
        self.left.len() + self.right.len()
    }

    /// True when the buffer holds no tokens.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    /// The selection anchor, if any.
    pub fn mark(&self) -> Option<usize> {
        self.mark
    }

    /// Anchor a selection at the current cursor position.
    pub fn set_mark(&mut self) {
        self.mark = Some(self.cursor());
    }

    /// Drop the selection anchor.
    pub fn clear_mark(&mut self) {
        self.mark = None;
    }

    /// Move the cursor to `pos`, clamped into `0..=len()`.
    ///
    /// Cost is proportional to the distance moved; moving to the current
    /// position does nothing.
    pub fn move_cursor(&mut self, pos: usize) {
        let pos = pos.min(self.len());
        while self.left.len() < pos {
            // `right` is reversed, so its last element is the next token.
            let t = self.right.pop().expect("pos clamped to len");
            self.left.push(t);
        }
        while self.left.len() > pos {
            let t = self.left.pop().expect("pos >= 0");
            self.right.push(t);
        }
    }

    /// Insert a token at the cursor, advancing the cursor past it.
    ///
    /// A mark at or after the cursor shifts by one so it keeps denoting the
    /// same tokens.
    pub fn push(&mut self, token: Token) {
        if let Some(m) = self.mark {
            if m >= self.left.len() {
                self.mark = Some(m + 1);
            }
        }
        self.left.push(token);
    }

    /// Delete the active selection, or the token left of the cursor when no
    /// mark is set. Clears the mark. Returns false when nothing was removed.
    pub fn delete_selection(&mut self) -> bool {
        let deleted = match self.mark.take() {
            None => self.left.pop().is_some(),
            Some(m) => {
                let cursor = self.left.len();
                if m < cursor {
                    // Selection is left of the cursor.
                    self.left.truncate(m);
                    true
                } else if m > cursor {
                    // Selection is right of the cursor; `right` is reversed,
                    // so the selected tokens are at its tail.
                    let keep = self.right.len() - (m - cursor);
                    self.right.truncate(keep);
                    true
                } else {
                    false
                }
            }
        };
        deleted
    }

    /// The tokens between mark and cursor, in original left-to-right order.
    /// Empty when no mark is set.
    pub fn extract_selection(&self) -> Vec<Token> {
        let cursor = self.left.len();
        match self.mark {
            None => Vec::new(),
            Some(m) if m < cursor => self.left[m..].to_vec(),
            Some(m) if m > cursor => {
                let keep = self.right.len() - (m - cursor);
                let mut sel: Vec<Token> = self.right[keep..].to_vec();
                sel.reverse();
                sel
            }
            Some(_) => Vec::new(),
        }
    }

    /// Empty the buffer (after its content has been committed), resetting
    /// cursor and mark.
    pub fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
        self.mark = None;
    }
}
