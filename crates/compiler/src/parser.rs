//! Incremental tokenizer.
//!
//! `feed` consumes as much of its input as it can, appending tokens at the
//! destination zipper's cursor, and returns the unconsumed tail. A tail
//! exists either because a construct is still open (an unclosed string, a
//! comment with no newline yet in partial mode) - the caller retries it
//! with the next chunk - or because the first leftover character is one no
//! rule accepts, which only editing can fix. `describe` turns a leftover
//! into the user-facing diagnostic for the distinction.
//!
//! One token is produced per step, and a step that makes no progress stops
//! the loop, so the tokenizer never spins on bad input.

use knot_core::{Token, TokenZipper};

use crate::error::{ParseDiagnostic, ParseErrorKind};

/// Tokenizer behavior switches.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Treat a single space as a token separator. When false (the
    /// default), one space glues identifier fragments into a single
    /// underscore-joined identifier; only a two-space run separates.
    pub space_as_sep: bool,
    /// Treat unterminated trailing constructs as "needs more input"
    /// instead of end-of-input-terminated. On for live editing; off when
    /// tokenizing a finished document.
    pub partial: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            space_as_sep: false,
            partial: true,
        }
    }
}

/// What `feed` did with its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedResult {
    /// Bytes consumed from the front of the input.
    pub consumed: usize,
    /// The unconsumed tail; empty on a clean parse.
    pub leftover: String,
}

impl FeedResult {
    pub fn is_clean(&self) -> bool {
        self.leftover.is_empty()
    }
}

/// The incremental tokenizer. Holds only options; resumable state lives in
/// the returned leftover, which the caller feeds back with the next chunk.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: ParseOptions,
}

impl Parser {
    pub fn new(options: ParseOptions) -> Self {
        Parser { options }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Tokenize `input` into `dst`, one token per step.
    pub fn feed(&self, dst: &mut TokenZipper, input: &str) -> FeedResult {
        let mut p = 0;
        while p < input.len() {
            // Whitespace; a run containing a newline leaves an empty
            // comment token so line layout survives the round trip.
            let mut saw_newline = false;
            while let Some(c) = char_at(input, p) {
                if !c.is_whitespace() {
                    break;
                }
                saw_newline |= c == '\n';
                p += c.len_utf8();
            }
            if saw_newline {
                dst.push(Token::Comment(String::new()));
            }
            let Some(c) = char_at(input, p) else {
                break;
            };
            match c {
                '#' => match input[p..].find('\n') {
                    Some(off) => {
                        let text = input[p + 1..p + off].trim().to_string();
                        dst.push(Token::Comment(text));
                        p += off + 1;
                    }
                    None if self.options.partial => return hold(input, p),
                    None => {
                        let text = input[p + 1..].trim().to_string();
                        dst.push(Token::Comment(text));
                        p = input.len();
                    }
                },
                '(' => {
                    dst.push(Token::Open);
                    p += 1;
                }
                ')' => {
                    dst.push(Token::Close);
                    p += 1;
                }
                '"' | '\'' => match scan_string(input, p, c) {
                    StringScan::Complete { text, end } => {
                        dst.push(Token::Str(text));
                        p = end;
                    }
                    StringScan::Unterminated if self.options.partial => {
                        return hold(input, p);
                    }
                    StringScan::Unterminated => {
                        // Finished-document mode: the fence closes at end
                        // of input.
                        let (text, end) = scan_string_to_end(input, p, c);
                        dst.push(Token::Str(text));
                        p = end;
                    }
                },
                _ => {
                    if let Some((n, end)) = scan_number(input, p) {
                        dst.push(Token::Number(n));
                        p = end;
                        continue;
                    }
                    let (raw, end) = scan_ident(input, p, self.options.space_as_sep);
                    if end == p {
                        // No rule accepts this character.
                        return hold(input, p);
                    }
                    let name = normalize_ident(&raw);
                    if !name.is_empty() {
                        dst.push(Token::Ident(name));
                    }
                    p = end;
                }
            }
        }
        FeedResult {
            consumed: p,
            leftover: String::new(),
        }
    }

    /// The user-facing diagnostic for a leftover, keyed off its first
    /// character. None when the parse was clean.
    pub fn describe(result: &FeedResult) -> Option<ParseDiagnostic> {
        let first = result.leftover.chars().next()?;
        Some(match first {
            '"' | '\'' => ParseDiagnostic {
                kind: ParseErrorKind::Incomplete,
                message: "Unclosed string".to_string(),
            },
            '#' => ParseDiagnostic {
                kind: ParseErrorKind::Incomplete,
                message: "Unterminated comment".to_string(),
            },
            c => ParseDiagnostic {
                kind: ParseErrorKind::Unrecognized,
                message: format!("Unknown error with `{}`", c),
            },
        })
    }
}

fn hold(input: &str, p: usize) -> FeedResult {
    FeedResult {
        consumed: p,
        leftover: input[p..].to_string(),
    }
}

fn char_at(s: &str, p: usize) -> Option<char> {
    s.get(p..)?.chars().next()
}

/// Identifier characters: everything except whitespace, parens, the
/// comment and string openers, and `@` (reserved).
fn is_ident_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | '"' | '#' | '@')
}

/// Strict numeric match: sign, digits, optional fraction, optional
/// exponent - rejected when the character after the match would continue
/// an identifier ("3abc" is an identifier, not 3 then "abc").
fn scan_number(s: &str, start: usize) -> Option<(f64, usize)> {
    let b = s.as_bytes();
    let mut p = start;
    if p < b.len() && (b[p] == b'+' || b[p] == b'-') {
        p += 1;
    }
    let digits_start = p;
    while p < b.len() && b[p].is_ascii_digit() {
        p += 1;
    }
    if p == digits_start {
        return None;
    }
    if p < b.len() && b[p] == b'.' {
        let frac_start = p + 1;
        let mut f = frac_start;
        while f < b.len() && b[f].is_ascii_digit() {
            f += 1;
        }
        if f > frac_start {
            p = f;
        }
    }
    if p < b.len() && (b[p] == b'e' || b[p] == b'E') {
        let mut e = p + 1;
        if e < b.len() && (b[e] == b'+' || b[e] == b'-') {
            e += 1;
        }
        let exp_start = e;
        while e < b.len() && b[e].is_ascii_digit() {
            e += 1;
        }
        if e > exp_start {
            p = e;
        }
    }
    if let Some(c) = char_at(s, p) {
        if is_ident_char(c) {
            return None;
        }
    }
    s[start..p].parse::<f64>().ok().map(|n| (n, p))
}

/// Greedy identifier run. With `space_as_sep` off, a single space followed
/// by another identifier character joins the runs (and is consumed even
/// when nothing follows; normalization strips the dangling separator).
fn scan_ident(s: &str, start: usize, space_as_sep: bool) -> (String, usize) {
    let mut raw = String::new();
    let mut p = start;
    loop {
        let run_start = p;
        while let Some(c) = char_at(s, p) {
            if !is_ident_char(c) {
                break;
            }
            raw.push(c);
            p += c.len_utf8();
        }
        if p == run_start {
            break;
        }
        if !space_as_sep && char_at(s, p) == Some(' ') {
            raw.push(' ');
            p += 1;
            continue;
        }
        break;
    }
    (raw, p)
}

/// Case-fold and normalize separators: runs of space/underscore collapse
/// to a single underscore, and a trailing run is stripped. Leading
/// underscores survive - they are the push sigil.
fn normalize_ident(raw: &str) -> String {
    let mut out = String::new();
    let mut pending_sep = false;
    for c in raw.to_lowercase().chars() {
        if c == '_' || c == ' ' {
            pending_sep = true;
            continue;
        }
        if pending_sep {
            out.push('_');
            pending_sep = false;
        }
        out.push(c);
    }
    out
}

enum StringScan {
    Complete { text: String, end: usize },
    Unterminated,
}

/// Fenced string scan: N identical quote characters open, N close.
/// Exactly two is the empty string.
fn scan_string(s: &str, start: usize, quote: char) -> StringScan {
    let mut p = start;
    let mut fence = 0;
    while char_at(s, p) == Some(quote) {
        p += 1;
        fence += 1;
    }
    if fence == 2 {
        return StringScan::Complete {
            text: String::new(),
            end: p,
        };
    }
    let mut buf = String::new();
    while p < s.len() {
        let c = char_at(s, p).expect("p < len");
        if c == quote {
            let mut run = 0;
            while run < fence && char_at(s, p) == Some(quote) {
                p += 1;
                run += 1;
            }
            if run >= fence {
                return StringScan::Complete { text: buf, end: p };
            }
            // Shorter quote run than the fence: literal content.
            for _ in 0..run {
                buf.push(quote);
            }
        } else if c == '\\' {
            match scan_escape(s, p) {
                Some((decoded, end)) => {
                    buf.push_str(&decoded);
                    p = end;
                }
                // Escape cut off at end of input: the whole string is
                // retried once more text arrives.
                None => return StringScan::Unterminated,
            }
        } else {
            buf.push(c);
            p += c.len_utf8();
        }
    }
    StringScan::Unterminated
}

/// Non-partial fallback: everything to end of input is string content.
fn scan_string_to_end(s: &str, start: usize, quote: char) -> (String, usize) {
    let mut p = start;
    while char_at(s, p) == Some(quote) {
        p += 1;
    }
    let mut buf = String::new();
    while p < s.len() {
        let c = char_at(s, p).expect("p < len");
        if c == '\\' {
            if let Some((decoded, end)) = scan_escape(s, p) {
                buf.push_str(&decoded);
                p = end;
                continue;
            }
            // Dangling backslash at end of input.
            buf.push('\\');
            p += 1;
        } else {
            buf.push(c);
            p += c.len_utf8();
        }
    }
    (buf, p)
}

/// Decode one backslash escape at `start`. Returns the decoded text and
/// the position after the escape, or None when the input ends mid-escape.
/// An escape that is complete but invalid is kept verbatim.
fn scan_escape(s: &str, start: usize) -> Option<(String, usize)> {
    let marker = char_at(s, start + 1)?;
    match marker {
        'x' => decode_hex(s, start, 2),
        'u' => decode_hex(s, start, 4),
        'n' => Some(("\n".to_string(), start + 2)),
        't' => Some(("\t".to_string(), start + 2)),
        'r' => Some(("\r".to_string(), start + 2)),
        'b' => Some(("\u{8}".to_string(), start + 2)),
        'f' => Some(("\u{c}".to_string(), start + 2)),
        '\\' | '"' | '\'' | '/' => Some((marker.to_string(), start + 2)),
        other => {
            // Unknown escape: keep the raw two-character slice.
            let end = start + 1 + other.len_utf8();
            Some((s[start..end].to_string(), end))
        }
    }
}

/// Decode `\xHH` / `\uHHHH`. `digits` hex characters follow the marker.
fn decode_hex(s: &str, start: usize, digits: usize) -> Option<(String, usize)> {
    // Marker is ASCII, so the digit region starts at a fixed offset.
    let from = start + 2;
    let mut end = from;
    for _ in 0..digits {
        let c = char_at(s, end)?;
        end += c.len_utf8();
    }
    let decoded = u32::from_str_radix(&s[from..end], 16)
        .ok()
        .and_then(char::from_u32);
    match decoded {
        Some(c) => Some((c.to_string(), end)),
        // Complete but invalid: keep the raw slice.
        None => Some((s[start..end].to_string(), end)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(input: &str) -> Vec<Token> {
        let parser = Parser::default();
        let mut z = TokenZipper::new();
        let result = parser.feed(&mut z, input);
        assert!(result.is_clean(), "leftover: {:?}", result.leftover);
        z.join()
    }

    fn ident(s: &str) -> Token {
        Token::Ident(s.to_string())
    }

    #[test]
    fn test_numbers_and_word() {
        assert_eq!(
            feed_all("3  4  +"),
            vec![Token::Number(3.0), Token::Number(4.0), ident("+")]
        );
    }

    #[test]
    fn test_single_space_separates_numbers() {
        // The strict numeric match runs before identifier gluing.
        assert_eq!(
            feed_all("3 4"),
            vec![Token::Number(3.0), Token::Number(4.0)]
        );
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(feed_all("-7"), vec![Token::Number(-7.0)]);
        assert_eq!(feed_all("+2.5"), vec![Token::Number(2.5)]);
        assert_eq!(feed_all("1e3"), vec![Token::Number(1000.0)]);
        assert_eq!(feed_all("2.5e-2"), vec![Token::Number(0.025)]);
    }

    #[test]
    fn test_number_strictness() {
        // A trailing identifier character turns the whole run into an
        // identifier.
        assert_eq!(feed_all("3abc"), vec![ident("3abc")]);
        assert_eq!(feed_all("3.5.2"), vec![ident("3.5.2")]);
        assert_eq!(feed_all("3e"), vec![ident("3e")]);
    }

    #[test]
    fn test_parens() {
        assert_eq!(
            feed_all("(1 2 +)"),
            vec![
                Token::Open,
                Token::Number(1.0),
                Token::Number(2.0),
                ident("+"),
                Token::Close,
            ]
        );
    }

    #[test]
    fn test_space_glue_default_mode() {
        assert_eq!(feed_all("foo bar"), vec![ident("foo_bar")]);
        assert_eq!(feed_all("foo  bar"), vec![ident("foo"), ident("bar")]);
    }

    #[test]
    fn test_space_as_sep_mode() {
        let parser = Parser::new(ParseOptions {
            space_as_sep: true,
            partial: true,
        });
        let mut z = TokenZipper::new();
        assert!(parser.feed(&mut z, "foo bar").is_clean());
        assert_eq!(z.join(), vec![ident("foo"), ident("bar")]);
    }

    #[test]
    fn test_ident_normalization() {
        assert_eq!(feed_all("FOO"), vec![ident("foo")]);
        assert_eq!(feed_all("x__y"), vec![ident("x_y")]);
        assert_eq!(feed_all("x_ y"), vec![ident("x_y")]);
        assert_eq!(feed_all("x__"), vec![ident("x")]);
        // Leading underscores are the push sigil and survive.
        assert_eq!(feed_all("_x"), vec![ident("_x")]);
        assert_eq!(feed_all("=_x"), vec![ident("=_x")]);
    }

    #[test]
    fn test_all_separator_ident_vanishes() {
        assert_eq!(feed_all("___"), Vec::<Token>::new());
    }

    #[test]
    fn test_module_separator_kept() {
        assert_eq!(feed_all("list:map"), vec![ident("list:map")]);
    }

    #[test]
    fn test_newline_preserved_as_empty_comment() {
        assert_eq!(
            feed_all("1\n2"),
            vec![
                Token::Number(1.0),
                Token::Comment(String::new()),
                Token::Number(2.0),
            ]
        );
    }

    #[test]
    fn test_comment_to_end_of_line() {
        assert_eq!(
            feed_all("# hello \n1"),
            vec![Token::Comment("hello".to_string()), Token::Number(1.0)]
        );
    }

    #[test]
    fn test_comment_without_newline_holds_in_partial_mode() {
        let parser = Parser::default();
        let mut z = TokenZipper::new();
        let result = parser.feed(&mut z, "1 # pending");
        assert_eq!(result.leftover, "# pending");
        let diag = Parser::describe(&result).unwrap();
        assert_eq!(diag.kind, ParseErrorKind::Incomplete);
        assert_eq!(diag.message, "Unterminated comment");
    }

    #[test]
    fn test_comment_without_newline_closes_in_document_mode() {
        let parser = Parser::new(ParseOptions {
            space_as_sep: false,
            partial: false,
        });
        let mut z = TokenZipper::new();
        assert!(parser.feed(&mut z, "# tail").is_clean());
        assert_eq!(z.join(), vec![Token::Comment("tail".to_string())]);
    }

    #[test]
    fn test_simple_string() {
        assert_eq!(
            feed_all("\"hello\""),
            vec![Token::Str("hello".to_string())]
        );
        assert_eq!(feed_all("'hi'"), vec![Token::Str("hi".to_string())]);
    }

    #[test]
    fn test_two_quotes_is_empty_string() {
        assert_eq!(feed_all("\"\""), vec![Token::Str(String::new())]);
        assert_eq!(feed_all("''"), vec![Token::Str(String::new())]);
    }

    #[test]
    fn test_wide_fence() {
        assert_eq!(
            feed_all("'''it's fine'''"),
            vec![Token::Str("it's fine".to_string())]
        );
        // A shorter quote run than the fence is content.
        assert_eq!(
            feed_all("'''a''b'''"),
            vec![Token::Str("a''b".to_string())]
        );
    }

    #[test]
    fn test_escapes() {
        assert_eq!(
            feed_all(r#""a\nb\tc""#),
            vec![Token::Str("a\nb\tc".to_string())]
        );
        assert_eq!(feed_all(r#""\x41""#), vec![Token::Str("A".to_string())]);
        assert_eq!(feed_all(r#""A""#), vec![Token::Str("A".to_string())]);
        assert_eq!(feed_all(r#""\"""#), vec![Token::Str("\"".to_string())]);
        // Unknown escapes are kept verbatim.
        assert_eq!(feed_all(r#""\q""#), vec![Token::Str("\\q".to_string())]);
    }

    #[test]
    fn test_unclosed_string_holds_then_resumes() {
        let parser = Parser::default();
        let mut z = TokenZipper::new();

        let result = parser.feed(&mut z, "\"hello");
        assert_eq!(result.consumed, 0);
        assert_eq!(result.leftover, "\"hello");
        let diag = Parser::describe(&result).unwrap();
        assert_eq!(diag.kind, ParseErrorKind::Incomplete);
        assert_eq!(diag.message, "Unclosed string");

        // Retry the leftover with the closing quote appended.
        let retry = format!("{}{}", result.leftover, "\"");
        let result = parser.feed(&mut z, &retry);
        assert!(result.is_clean());
        assert_eq!(z.join(), vec![Token::Str("hello".to_string())]);
    }

    #[test]
    fn test_unrecognized_character_stops() {
        let parser = Parser::default();
        let mut z = TokenZipper::new();
        let result = parser.feed(&mut z, "1 @oops");
        assert_eq!(z.tokens(), vec![Token::Number(1.0)]);
        assert_eq!(result.leftover, "@oops");
        let diag = Parser::describe(&result).unwrap();
        assert_eq!(diag.kind, ParseErrorKind::Unrecognized);
        assert_eq!(diag.message, "Unknown error with `@`");
    }

    #[test]
    fn test_clean_result_has_no_diagnostic() {
        let parser = Parser::default();
        let mut z = TokenZipper::new();
        let result = parser.feed(&mut z, "1 2");
        assert!(Parser::describe(&result).is_none());
    }

    #[test]
    fn test_serialize_feed_fixed_point() {
        use knot_core::serialize_tokens;
        for src in ["3  4  +", "(  1  2  )", "\"a b\"  x_y", "# note\n1"] {
            let first = feed_all(src);
            let text = serialize_tokens(&first);
            let second = feed_all(&text);
            assert_eq!(
                serialize_tokens(&second),
                text,
                "not a fixed point for {:?}",
                src
            );
        }
    }

    #[test]
    fn test_tokens_append_at_cursor() {
        let parser = Parser::default();
        let mut z = TokenZipper::new();
        parser.feed(&mut z, "1 3");
        z.move_cursor(1);
        parser.feed(&mut z, "2");
        assert_eq!(
            z.join(),
            vec![
                Token::Number(1.0),
                Token::Number(2.0),
                Token::Number(3.0)
            ]
        );
    }
}
