//! Expression rendering.
//!
//! The flat form is the canonical editable text: it flattens the tree back
//! to tokens and reuses the token serializer, so text and tree stay in one
//! round-trip loop. The wrapped form is for display surfaces with a width:
//! greedy line filling, and a list that cannot fit on one line breaks open
//! with its elements indented one level.

use knot_core::{Expr, Token, serialize_tokens};

/// Separator between atoms on one line; matches the token serializer.
const SEP: &str = "  ";

/// Render expressions as one flat line of editable source.
pub fn exprs_to_string(exprs: &[Expr]) -> String {
    serialize_tokens(&exprs_to_tokens(exprs))
}

fn exprs_to_tokens(exprs: &[Expr]) -> Vec<Token> {
    let mut tokens = Vec::new();
    flatten(exprs, &mut tokens);
    tokens
}

fn flatten(exprs: &[Expr], out: &mut Vec<Token>) {
    for expr in exprs {
        match expr {
            Expr::Number(n) => out.push(Token::Number(*n)),
            Expr::Str(s) => out.push(Token::Str(s.clone())),
            Expr::Comment(c) => out.push(Token::Comment(c.clone())),
            Expr::Ident(name) => out.push(Token::Ident(name.clone())),
            Expr::List(inner) => {
                out.push(Token::Open);
                flatten(inner, out);
                out.push(Token::Close);
            }
        }
    }
}

/// Render expressions wrapped to `width` columns.
///
/// Lines are filled greedily. A sub-list whose flat rendering does not fit
/// on a fresh line is broken open: its parens get their own lines and its
/// elements wrap one indent level deeper.
pub fn exprs_to_string_wrapped(exprs: &[Expr], width: usize) -> String {
    let mut lines = Vec::new();
    write_level(&mut lines, exprs, width, 0);
    lines.join("\n")
}

fn write_level(lines: &mut Vec<String>, exprs: &[Expr], width: usize, indent: usize) {
    let pad = SEP.repeat(indent);
    let mut line = String::new();
    for expr in exprs {
        if let Expr::Comment(c) = expr {
            flush(lines, &mut line);
            if c.is_empty() {
                lines.push(String::new());
            } else {
                lines.push(format!("{}# {}", pad, c));
            }
            continue;
        }
        let piece = exprs_to_string(std::slice::from_ref(expr));
        let candidate = if line.is_empty() {
            format!("{}{}", pad, piece)
        } else {
            format!("{}{}{}", line, SEP, piece)
        };
        if fits(&candidate, width) {
            line = candidate;
            continue;
        }
        flush(lines, &mut line);
        let fresh = format!("{}{}", pad, piece);
        if fits(&fresh, width) {
            line = fresh;
            continue;
        }
        match expr {
            Expr::List(inner) => {
                lines.push(format!("{}(", pad));
                write_level(lines, inner, width, indent + 1);
                lines.push(format!("{})", pad));
            }
            // An oversized atom gets its own line; there is no way to
            // split it.
            _ => lines.push(fresh),
        }
    }
    flush(lines, &mut line);
}

fn flush(lines: &mut Vec<String>, line: &mut String) {
    if !line.is_empty() {
        lines.push(std::mem::take(line));
    }
}

fn fits(line: &str, width: usize) -> bool {
    line.chars().count() <= width
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ExprBuilder;
    use crate::parser::Parser;
    use knot_core::TokenZipper;

    fn parse(src: &str) -> Vec<Expr> {
        let parser = Parser::default();
        let mut z = TokenZipper::new();
        let result = parser.feed(&mut z, src);
        assert!(result.is_clean(), "leftover: {:?}", result.leftover);
        ExprBuilder::build(&z.join()).unwrap()
    }

    fn strip_comments(exprs: &[Expr]) -> Vec<Expr> {
        exprs
            .iter()
            .filter(|e| !e.is_comment())
            .map(|e| match e {
                Expr::List(inner) => Expr::List(strip_comments(inner)),
                other => other.clone(),
            })
            .collect()
    }

    #[test]
    fn test_flat_rendering() {
        let exprs = parse("1  (2  x)  \"s\"");
        assert_eq!(exprs_to_string(&exprs), "1  (  2  x  )  \"s\"");
    }

    #[test]
    fn test_flat_rendering_is_fixed_point() {
        for src in ["3  4  +", "(  1  (  2  )  )", "=_sq  (  _x  _x  *  )"] {
            let exprs = parse(src);
            let text = exprs_to_string(&exprs);
            assert_eq!(exprs_to_string(&parse(&text)), text);
        }
    }

    #[test]
    fn test_wrapped_fits_on_one_line() {
        let exprs = parse("1  2  3");
        assert_eq!(exprs_to_string_wrapped(&exprs, 40), "1  2  3");
    }

    #[test]
    fn test_wrapped_fills_lines_greedily() {
        let exprs = parse("11  22  33  44");
        // "11  22" is 6 columns; adding "  33" would need 10.
        assert_eq!(exprs_to_string_wrapped(&exprs, 8), "11  22\n33  44");
    }

    #[test]
    fn test_wrapped_breaks_wide_list_open() {
        let exprs = parse("(  1111  2222  3333  )");
        assert_eq!(
            exprs_to_string_wrapped(&exprs, 12),
            "(\n  1111  2222\n  3333\n)"
        );
    }

    #[test]
    fn test_wrapped_comment_gets_own_line() {
        let exprs = parse("1# note\n2");
        assert_eq!(exprs_to_string_wrapped(&exprs, 40), "1\n# note\n2");
    }

    #[test]
    fn test_wrapped_output_reparses_to_same_tree() {
        let src = "=_sq  (  _x  _x  *  )  5  sq  \"done\"  print";
        let exprs = parse(src);
        for width in [8, 12, 20, 80] {
            let text = exprs_to_string_wrapped(&exprs, width);
            assert_eq!(
                strip_comments(&parse(&text)),
                strip_comments(&exprs),
                "width {}",
                width
            );
        }
    }
}
