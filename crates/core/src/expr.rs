//! Expression trees and cursor-structured cuts.
//!
//! An `Expr` is the committed form of a token sequence: atoms plus nested
//! lists. Positions inside a tree have two isomorphic encodings - the index
//! path (`ExprCursor`) and the nested-pair chain (`CurList`) - and a tree
//! can be split at a cursor into per-depth partial lists (`CutExprs`), the
//! representation cut/copy/paste operates on.

/// A node of the expression tree. A `List` is a balanced parenthesization
/// of its source region; element order is source order.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Comment(String),
    Ident(String),
    List(Vec<Expr>),
}

impl Expr {
    /// True for nodes the compiler skips entirely.
    pub fn is_comment(&self) -> bool {
        matches!(self, Expr::Comment(_))
    }
}

/// Index path into a nested expression: one index per nesting level.
pub type ExprCursor = Vec<usize>;

/// Nested-pair encoding of an `ExprCursor`.
///
/// `[a, b, c]` encodes as `Nest(Nest(Index(a), b), c)`: the outermost index
/// sits innermost, so appending a level is O(1).
#[derive(Debug, Clone, PartialEq)]
pub enum CurList {
    Index(usize),
    Nest(Box<CurList>, usize),
}

/// Convert an index path to its nested-pair encoding.
///
/// The empty path encodes as `Index(0)`, matching the editor's "cursor at
/// the start of the root list" convention.
pub fn cursor_to_cur_list(cursor: &[usize]) -> CurList {
    let mut iter = cursor.iter();
    let first = *iter.next().unwrap_or(&0);
    iter.fold(CurList::Index(first), |acc, &i| {
        CurList::Nest(Box::new(acc), i)
    })
}

/// Convert a nested-pair encoding back to an index path.
pub fn cur_list_to_cursor(cur_list: &CurList) -> ExprCursor {
    let mut cursor = Vec::new();
    let mut c = cur_list;
    loop {
        match c {
            CurList::Nest(rest, i) => {
                cursor.push(*i);
                c = rest;
            }
            CurList::Index(i) => {
                cursor.push(*i);
                break;
            }
        }
    }
    cursor.reverse();
    cursor
}

/// A depth-structured split of an expression list at a cursor path.
///
/// Level `i` of `left` holds the elements before the path at depth `i`;
/// level `i` of `right` holds the elements after it. Rejoining at matching
/// depths reconstructs the original tree exactly. During live editing the
/// left side may be deeper than the right (lists opened but not yet closed).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CutExprs {
    left: Vec<Vec<Expr>>,
    right: Vec<Vec<Expr>>,
}

impl CutExprs {
    /// An empty cut: one open root level, nothing on the right.
    pub fn new() -> Self {
        CutExprs {
            left: vec![Vec::new()],
            right: Vec::new(),
        }
    }

    /// Split `exprs` at `cursor`.
    ///
    /// Descends through `List` nodes along the path; a path segment that
    /// does not land on a list (or the final segment) splits the current
    /// level in place. An empty cursor is treated as `[0]`.
    pub fn split_at(exprs: &[Expr], cursor: &[usize]) -> Self {
        let mut left = Vec::new();
        let mut right = Vec::new();
        let mut level: &[Expr] = exprs;
        let cursor: &[usize] = if cursor.is_empty() { &[0] } else { cursor };
        for (i, &p) in cursor.iter().enumerate() {
            let p = p.min(level.len());
            let descend = if i < cursor.len() - 1 {
                match level.get(p) {
                    Some(Expr::List(inner)) => Some(inner),
                    _ => None,
                }
            } else {
                None
            };
            match descend {
                Some(inner) => {
                    left.push(level[..p].to_vec());
                    right.push(level[p + 1..].to_vec());
                    level = inner;
                }
                None => {
                    left.push(level[..p].to_vec());
                    right.push(level[p..].to_vec());
                    break;
                }
            }
        }
        CutExprs { left, right }
    }

    /// Rejoin both sides into the original expression list.
    pub fn join(&self) -> Vec<Expr> {
        let depth = self.left.len().max(self.right.len());
        let mut inner: Option<Vec<Expr>> = None;
        for i in (0..depth).rev() {
            let mut seg = self.left.get(i).cloned().unwrap_or_default();
            if let Some(nested) = inner.take() {
                seg.push(Expr::List(nested));
            }
            if let Some(r) = self.right.get(i) {
                seg.extend(r.iter().cloned());
            }
            inner = Some(seg);
        }
        inner.unwrap_or_default()
    }

    /// Current nesting depth of the edit point.
    pub fn depth(&self) -> usize {
        self.left.len()
    }

    /// Append an expression at the edit point (the deepest left level).
    pub fn push_expr(&mut self, expr: Expr) {
        if self.left.is_empty() {
            self.left.push(Vec::new());
        }
        self.left
            .last_mut()
            .expect("left is non-empty")
            .push(expr);
    }

    /// Open a new list at the edit point.
    pub fn open_list(&mut self) {
        if self.left.is_empty() {
            self.left.push(Vec::new());
        }
        self.left.push(Vec::new());
    }

    /// Close the innermost open list, folding it into its parent.
    ///
    /// Returns false when only the root level is open - an unmatched
    /// closer; the caller decides whether that is an error.
    pub fn close_list(&mut self) -> bool {
        if self.left.len() <= 1 {
            return false;
        }
        let closed = self.left.pop().expect("checked above");
        self.push_expr(Expr::List(closed));
        true
    }
}
