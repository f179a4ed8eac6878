//! Lexical recognizers built on the combinator engine: identifiers,
//! numbers, quoted strings with escape decoding, and C-style comment
//! skipping.

use crate::combinator::{alt, rep0, regex, Parser};
use crate::cursor::Cursor;
use crate::result::ParseResult;

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn identifier() -> Parser<String> {
    regex(r"[A-Za-z_][A-Za-z0-9_]*")
}

/// Parses an unsigned integer literal in base 2, 8, 10, or 16 (no sign:
/// the sign belongs to the unary-minus layer of the expression grammar,
/// not to the numeric literal itself — see `SPEC_FULL.md` §4).
pub fn integer() -> Parser<i64> {
    let hex = regex(r"0[xX][0-9a-fA-F]+").map(|s| i64::from_str_radix(&s[2..], 16).unwrap());
    let oct = regex(r"0[oO][0-7]+").map(|s| i64::from_str_radix(&s[2..], 8).unwrap());
    let bin = regex(r"0[bB][01]+").map(|s| i64::from_str_radix(&s[2..], 2).unwrap());
    let dec = regex(r"[0-9]+").map(|s| s.parse::<i64>().unwrap());
    alt(vec![hex, oct, bin, dec])
}

/// Parses a floating-point literal: digits, a required `.`, more digits,
/// and an optional exponent.
pub fn float_lit() -> Parser<f64> {
    regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?|[0-9]+[eE][+-]?[0-9]+")
        .map(|s| s.parse::<f64>().unwrap())
}

/// Union of float and integer: a numeric literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

pub fn number() -> Parser<Number> {
    alt(vec![
        float_lit().map(Number::Float),
        integer().map(Number::Int),
    ])
}

/// Decodes escape sequences shared by single/double/triple-quoted strings:
/// `\n \r \t`, `\uXXXX` (exactly four hex digits), and `\x` for any other
/// `x` yields the literal character `x`.
fn decode_escapes(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                let hex: String = (0..4).filter_map(|_| chars.next()).collect();
                if hex.len() == 4 {
                    if let Some(c) = u32::from_str_radix(&hex, 16)
                        .ok()
                        .and_then(char::from_u32)
                    {
                        out.push(c);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn quoted(quote: char) -> Parser<String> {
    let q = quote.to_string();
    let triple = q.repeat(3);
    // Non-greedy: stop at the first closing triple-quote, matching the
    // original's reference behavior for embedded newlines and single quotes.
    let triple_body = regex(&format!(r"(?s){t}.*?{t}", t = regex::escape(&triple)));
    let single_body = regex(&format!(
        r"{q}(?:[^{q}\\\n]|\\.)*{q}",
        q = regex::escape(&q)
    ));
    alt(vec![
        triple_body.map(move |s| decode_escapes(&s[3..s.len() - 3])),
        single_body.map(move |s| decode_escapes(&s[1..s.len() - 1])),
    ])
}

/// Single-, double-, and triple-quoted string literals, with escape
/// decoding applied to the body. Triple-quoted strings may contain
/// embedded newlines and unescaped quotes of the other kind.
pub fn string_literal() -> Parser<String> {
    alt(vec![quoted('"'), quoted('\'')])
}

/// C-style line (`//...EOL`) and block (`/* ... */`, non-nesting) comments.
pub fn c_style_comment() -> Parser<String> {
    regex(r"//[^\n]*|(?s)/\*.*?\*/")
}

/// Whitespace and C-style comments, skipped unconditionally (this parser
/// always succeeds, even with a zero-width match) — the default pattern a
/// [`Parser::token`] wrapper skips ahead of its wrapped parser.
pub fn ws_and_comments() -> Parser<()> {
    let atom = alt(vec![regex(r"\s+"), c_style_comment()]);
    rep0(atom).map(|_| ())
}

/// Convenience: a cursor advanced past leading whitespace/comments, useful
/// for callers that want to peek at the next significant character without
/// constructing a full token parser.
pub fn skip_ws(input: &Cursor) -> Cursor {
    match ws_and_comments().parse(input) {
        ParseResult::Success { next, .. } => next,
        ParseResult::Failure { next, .. } => next,
    }
}
