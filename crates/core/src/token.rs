//! Lexical tokens and their textual rendering.
//!
//! A token is the smallest unit the editor works with. The tokenizer in
//! knot-compiler produces them; `serialize_tokens` renders them back to
//! editable source text, and the two must round-trip (re-parsing serialized
//! output yields the same token sequence).

use std::fmt;

/// Prefix marking an identifier as "push this symbol's value".
pub const PUSH_SIGIL: &str = "_";

/// Prefix marking an identifier as "pop into this symbol" (assignment).
pub const ASSIGN_SIGIL: &str = "=_";

/// Separator written between adjacent atoms when serializing.
///
/// Two spaces, because in the default parse mode a *single* space glues
/// identifier fragments together instead of separating them.
const ATOM_SEP: &str = "  ";

/// A lexical token of the Knot language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Numeric literal.
    Number(f64),
    /// String literal, already unescaped.
    Str(String),
    /// Comment text (trimmed, without the leading `#`).
    ///
    /// An empty payload is a preserved line break: the tokenizer emits one
    /// for every whitespace run that contained a newline, so layout survives
    /// the round trip through tokens.
    Comment(String),
    /// Identifier, case-folded and separator-normalized.
    Ident(String),
    /// `(`
    Open,
    /// `)`
    Close,
}

impl Token {
    /// True for tokens that stand on their own line end (comments).
    fn ends_line(&self) -> bool {
        matches!(self, Token::Comment(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Str(s) => write!(f, "\"{}\"", escape_string(s)),
            Token::Comment(c) if c.is_empty() => writeln!(f),
            Token::Comment(c) => writeln!(f, "# {}", c),
            Token::Ident(s) => write!(f, "{}", s),
            Token::Open => write!(f, "("),
            Token::Close => write!(f, ")"),
        }
    }
}

/// Escape a string body for quoting with `"`.
///
/// Escapes the backslash, the double quote, and control characters; anything
/// else (including non-ASCII) passes through verbatim.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}

/// Render a token sequence back to editable source text.
///
/// Atoms are separated by a fixed two-space run; comments terminate their
/// line, so no separator is emitted before or after them.
pub fn serialize_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<&Token> = None;
    for tok in tokens {
        if let Some(p) = prev {
            if !p.ends_line() && !tok.ends_line() {
                out.push_str(ATOM_SEP);
            }
        }
        out.push_str(&tok.to_string());
        prev = Some(tok);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_atoms_two_space_separated() {
        let toks = vec![
            Token::Number(3.0),
            Token::Number(4.0),
            Token::Ident("+".to_string()),
        ];
        assert_eq!(serialize_tokens(&toks), "3  4  +");
    }

    #[test]
    fn test_serialize_parens_and_string() {
        let toks = vec![
            Token::Open,
            Token::Str("hi".to_string()),
            Token::Close,
        ];
        assert_eq!(serialize_tokens(&toks), "(  \"hi\"  )");
    }

    #[test]
    fn test_serialize_comment_ends_line() {
        let toks = vec![
            Token::Number(1.0),
            Token::Comment("note".to_string()),
            Token::Number(2.0),
        ];
        assert_eq!(serialize_tokens(&toks), "1# note\n2");
    }

    #[test]
    fn test_serialize_empty_comment_is_line_break() {
        let toks = vec![
            Token::Number(1.0),
            Token::Comment(String::new()),
            Token::Number(2.0),
        ];
        assert_eq!(serialize_tokens(&toks), "1\n2");
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("a\"b"), "a\\\"b");
        assert_eq!(escape_string("a\\b"), "a\\\\b");
        assert_eq!(escape_string("a\nb"), "a\\nb");
        assert_eq!(escape_string("a\u{01}b"), "a\\x01b");
        assert_eq!(escape_string("héllo"), "héllo");
    }

    #[test]
    fn test_number_display_is_shortest_roundtrip() {
        assert_eq!(Token::Number(3.0).to_string(), "3");
        assert_eq!(Token::Number(-0.5).to_string(), "-0.5");
    }
}
