//! The combinator engine: primitive parsers (literal, regex) and the
//! composers (sequence, alternation, option, repetition, map, skip, token,
//! forward reference) used to build the configuration-language and Avro
//! grammars on top of character-level recognizers.

use std::cell::RefCell;
use std::rc::Rc;

use regex::Regex;

use crate::cursor::Cursor;
use crate::result::ParseResult;

/// A parser producing a value of type `T`.
///
/// Internally this is a reference-counted closure, so cloning a `Parser` is
/// cheap and grammars can share sub-parsers freely (e.g. the same `Expr`
/// parser is referenced from every precedence level and from inside list
/// and record literals).
pub struct Parser<T>(Rc<dyn Fn(&Cursor) -> ParseResult<T>>);

impl<T> Clone for Parser<T> {
    fn clone(&self) -> Self {
        Parser(Rc::clone(&self.0))
    }
}

impl<T: 'static> Parser<T> {
    pub fn new(f: impl Fn(&Cursor) -> ParseResult<T> + 'static) -> Self {
        Parser(Rc::new(f))
    }

    pub fn parse(&self, input: &Cursor) -> ParseResult<T> {
        (self.0)(input)
    }

    /// `Map`: runs this parser; on success, replaces the value by `f(value)`
    /// keeping the match and next cursor.
    pub fn map<U: 'static>(&self, f: impl Fn(T) -> U + 'static) -> Parser<U> {
        let this = self.clone();
        Parser::new(move |input| this.parse(input).map(&f))
    }

    /// Pairs this parser with `other`: the building block for `Sequence`.
    /// On any failure, the original cursor is restored — the returned
    /// failure's `next` is this `then`'s own starting cursor, not however
    /// far the failing sub-parser got, matching `spec.md` §4.1's "restores
    /// the original cursor" and `original_source/parser.py`'s `Seq.Parse`
    /// (`return Failure(next=input, message=result.message)`).
    pub fn then<U: 'static>(&self, other: Parser<U>) -> Parser<(T, U)> {
        let this = self.clone();
        Parser::new(move |input: &Cursor| match this.parse(input) {
            ParseResult::Success {
                matched: m1,
                next: n1,
                value: v1,
            } => match other.parse(&n1) {
                ParseResult::Success {
                    matched: m2,
                    next: n2,
                    value: v2,
                } => ParseResult::success(format!("{m1}{m2}"), n2, (v1, v2)),
                ParseResult::Failure { message, .. } => {
                    ParseResult::Failure { next: input.clone(), message }
                }
            },
            ParseResult::Failure { message, .. } => {
                ParseResult::Failure { next: input.clone(), message }
            }
        })
    }

    /// Succeeds iff the inner parser succeeds and `pred` accepts its value;
    /// otherwise fails at the original cursor. Used to carve reserved
    /// keywords out of the identifier recognizer.
    pub fn filter(&self, pred: impl Fn(&T) -> bool + 'static) -> Parser<T> {
        let this = self.clone();
        Parser::new(move |input: &Cursor| match this.parse(input) {
            ParseResult::Success {
                matched,
                next,
                value,
            } => {
                if pred(&value) {
                    ParseResult::success(matched, next, value)
                } else {
                    ParseResult::failure(input.clone(), "value rejected by filter".to_string())
                }
            }
            failure @ ParseResult::Failure { .. } => failure,
        })
    }

    /// `Skip`: runs this parser; on success, drops the value so a calling
    /// sequence can omit it from the produced value list.
    pub fn skip(&self) -> Parser<()> {
        self.map(|_| ())
    }

    /// `Token`: wraps this parser with a leading pattern `ws` (typically
    /// whitespace/comments) that is applied first and always succeeds, even
    /// with a zero-width match.
    pub fn token(&self, ws: &Parser<()>) -> Parser<T> {
        let ws = ws.clone();
        let this = self.clone();
        Parser::new(move |input: &Cursor| match ws.parse(input) {
            ParseResult::Success { next, .. } => this.parse(&next),
            ParseResult::Failure { next, message } => ParseResult::Failure { next, message },
        })
    }
}

/// Literal-string parser: succeeds iff the remaining text starts with
/// `literal`, consuming exactly its length.
pub fn literal(lit: impl Into<String>) -> Parser<String> {
    let lit = lit.into();
    Parser::new(move |input: &Cursor| {
        if input.remaining().starts_with(lit.as_str()) {
            let next = input.advance_by(&lit);
            ParseResult::success(lit.clone(), next, lit.clone())
        } else {
            ParseResult::failure(input.clone(), format!("expected {lit:?}"))
        }
    })
}

/// Regex parser: compiles `pattern` once, anchored at the start of the
/// remaining text. The produced value is the full matched substring.
pub fn regex(pattern: &str) -> Parser<String> {
    let anchored = format!("\\A(?:{pattern})");
    let re = Regex::new(&anchored).expect("invalid regex pattern passed to combinator::regex");
    Parser::new(move |input: &Cursor| match re.find(input.remaining()) {
        Some(m) => {
            let matched = m.as_str().to_string();
            let next = input.advance_by(&matched);
            ParseResult::success(matched.clone(), next, matched)
        }
        None => ParseResult::failure(input.clone(), format!("expected match of /{pattern}/")),
    })
}

/// `Sequence` over parsers producing the same value type: tries each
/// sub-parser in order, threading the cursor, and succeeds with the
/// ordered list of sub-values. On any sub-failure, the returned failure's
/// `next` is restored to this `seq`'s own starting cursor — not however far
/// the failing sub-parser itself got — per `spec.md` §4.1's "restores the
/// original cursor" and `original_source/parser.py`'s `Seq.Parse`
/// (`return Failure(next=input, message=result.message)`, where `input` is
/// `Seq`'s own starting argument). No partial value list is ever observable
/// by the caller.
pub fn seq<T: Clone + 'static>(parsers: Vec<Parser<T>>) -> Parser<Vec<T>> {
    Parser::new(move |input: &Cursor| {
        let mut cur = input.clone();
        let mut matched = String::new();
        let mut values = Vec::with_capacity(parsers.len());
        for p in &parsers {
            match p.parse(&cur) {
                ParseResult::Success {
                    matched: m,
                    next,
                    value,
                } => {
                    matched.push_str(&m);
                    cur = next;
                    values.push(value);
                }
                ParseResult::Failure { message, .. } => {
                    return ParseResult::Failure { next: input.clone(), message };
                }
            }
        }
        ParseResult::success(matched, cur, values)
    })
}

/// `Alternation`: tries each sub-parser in declared order at the same
/// starting cursor and returns the first success; otherwise returns
/// failure with the last sub-failure's message. No longest-match: ordering
/// is the disambiguation policy.
pub fn alt<T: 'static>(parsers: Vec<Parser<T>>) -> Parser<T> {
    Parser::new(move |input: &Cursor| {
        let mut last = ParseResult::Failure {
            next: input.clone(),
            message: Some("no alternative matched".to_string()),
        };
        for p in &parsers {
            match p.parse(input) {
                success @ ParseResult::Success { .. } => return success,
                failure @ ParseResult::Failure { .. } => last = failure,
            }
        }
        last
    })
}

/// `Option`: wraps a parser; always succeeds, with `Some(value)` on
/// success of the inner parser and `None` (zero-width match) otherwise.
pub fn opt<T: 'static>(p: Parser<T>) -> Parser<Option<T>> {
    Parser::new(move |input: &Cursor| match p.parse(input) {
        ParseResult::Success {
            matched,
            next,
            value,
        } => ParseResult::success(matched, next, Some(value)),
        ParseResult::Failure { .. } => ParseResult::success("", input.clone(), None),
    })
}

/// `Repetition`: repeatedly applies `p`, accumulating values, stopping at
/// the first failure of `p` or when `max` is reached. If the accumulated
/// count is below `min`, the whole repetition fails and the original
/// cursor is restored.
pub fn rep<T: 'static>(p: Parser<T>, min: usize, max: Option<usize>) -> Parser<Vec<T>> {
    Parser::new(move |input: &Cursor| {
        let mut cur = input.clone();
        let mut matched = String::new();
        let mut values = Vec::new();
        loop {
            if let Some(max) = max {
                if values.len() >= max {
                    break;
                }
            }
            match p.parse(&cur) {
                ParseResult::Success {
                    matched: m,
                    next,
                    value,
                } => {
                    matched.push_str(&m);
                    cur = next;
                    values.push(value);
                }
                ParseResult::Failure { .. } => break,
            }
        }
        if values.len() < min {
            return ParseResult::failure(
                input.clone(),
                format!("expected at least {min} repetitions, got {}", values.len()),
            );
        }
        ParseResult::success(matched, cur, values)
    })
}

/// `rep` with `min = 0`.
pub fn rep0<T: 'static>(p: Parser<T>) -> Parser<Vec<T>> {
    rep(p, 0, None)
}

/// `rep` with `min = 1`.
pub fn rep1<T: 'static>(p: Parser<T>) -> Parser<Vec<T>> {
    rep(p, 1, None)
}

/// The one real per-parse knob the grammars expose: which whitespace/comment
/// pattern [`Parser::token`] skips ahead of every token. Both front-end
/// grammars (`cl`, `avro`) default to [`crate::lexical::ws_and_comments`]
/// (C-style comments plus whitespace, `spec.md` §4.1) but accept a caller
/// override through `parse_cl_with_options`/`parse_avro_schema_with_options`
/// so a host embedding a different comment dialect doesn't need to fork the
/// grammar just to change what gets skipped between tokens.
#[derive(Clone)]
pub struct ParserOptions {
    pub ws: Parser<()>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            ws: crate::lexical::ws_and_comments(),
        }
    }
}

/// A mutable slot bound exactly once to an actual parser, enabling
/// recursive grammars. Parsing through an unbound reference, or binding
/// twice, is a programmer error and panics.
pub struct ForwardRef<T> {
    slot: Rc<RefCell<Option<Parser<T>>>>,
}

impl<T> Clone for ForwardRef<T> {
    fn clone(&self) -> Self {
        ForwardRef {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<T: 'static> ForwardRef<T> {
    pub fn new() -> Self {
        ForwardRef {
            slot: Rc::new(RefCell::new(None)),
        }
    }

    /// Binds this reference to `p`. Panics if already bound.
    pub fn bind(&self, p: Parser<T>) {
        let mut slot = self.slot.borrow_mut();
        if slot.is_some() {
            panic!("ForwardRef bound twice");
        }
        *slot = Some(p);
    }

    /// Returns a `Parser<T>` that delegates to the bound parser at call
    /// time. Embed this inside another parser's definition to reference
    /// itself (or a later-defined parser) recursively.
    pub fn parser(&self) -> Parser<T> {
        let slot = Rc::clone(&self.slot);
        Parser::new(move |input: &Cursor| {
            let guard = slot.borrow();
            let p = guard
                .as_ref()
                .expect("ForwardRef used before it was bound");
            p.parse(input)
        })
    }
}

impl<T: 'static> Default for ForwardRef<T> {
    fn default() -> Self {
        Self::new()
    }
}
