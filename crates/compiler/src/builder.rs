//! Token stream to expression tree.
//!
//! Parens become nested lists. An unmatched closing paren is rejected
//! outright; unmatched opens are tolerated while building and closed
//! implicitly by `finish`, since a live document frequently ends mid-list.

use knot_core::{Expr, Token};

use crate::error::CompileError;

/// Streaming assembler: feed tokens in order, then `finish`.
#[derive(Debug, Default)]
pub struct ExprBuilder {
    /// One entry per open nesting level; the last is the innermost.
    levels: Vec<Vec<Expr>>,
}

impl ExprBuilder {
    pub fn new() -> Self {
        ExprBuilder {
            levels: vec![Vec::new()],
        }
    }

    /// Assemble a whole token slice in one call.
    pub fn build(tokens: &[Token]) -> Result<Vec<Expr>, CompileError> {
        let mut builder = ExprBuilder::new();
        for token in tokens {
            builder.push_token(token)?;
        }
        Ok(builder.finish())
    }

    /// Open parens past the root level.
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn push_token(&mut self, token: &Token) -> Result<(), CompileError> {
        match token {
            Token::Number(n) => self.push_expr(Expr::Number(*n)),
            Token::Str(s) => self.push_expr(Expr::Str(s.clone())),
            Token::Comment(c) => self.push_expr(Expr::Comment(c.clone())),
            Token::Ident(name) => self.push_expr(Expr::Ident(name.clone())),
            Token::Open => self.levels.push(Vec::new()),
            Token::Close => {
                if self.levels.len() < 2 {
                    return Err(CompileError::TooManyClosings);
                }
                let inner = self.levels.pop().expect("len checked");
                self.push_expr(Expr::List(inner));
            }
        }
        Ok(())
    }

    fn push_expr(&mut self, expr: Expr) {
        self.levels
            .last_mut()
            .expect("at least the root level")
            .push(expr);
    }

    /// Close any still-open lists and return the root sequence.
    pub fn finish(mut self) -> Vec<Expr> {
        while self.levels.len() > 1 {
            let inner = self.levels.pop().expect("len checked");
            self.push_expr(Expr::List(inner));
        }
        self.levels.pop().expect("root level")
    }
}
