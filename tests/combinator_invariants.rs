//! Combinator-engine invariants (spec.md §8) exercised directly through
//! `recordlang::combinator`, independent of the CL/Avro grammars built on
//! top of it.

use pretty_assertions::assert_eq;
use recordlang::combinator::{alt, literal, opt, regex, rep, seq, Parser};
use recordlang::cursor::Cursor;
use recordlang::result::ParseResult;

fn regex_digits() -> Parser<String> {
    regex(r"[0-9]+")
}

#[test]
fn determinism_same_parser_same_input_same_result() {
    let p = regex_digits();
    let input = Cursor::new("42abc");
    let first = p.parse(&input);
    let second = p.parse(&input);
    assert_eq!(format!("{first:?}"), format!("{second:?}"));
}

#[test]
fn sequence_does_not_partially_consume_on_failure() {
    let p = seq(vec![literal("a"), literal("b"), literal("c")]);
    let input = Cursor::new("abx");
    match p.parse(&input) {
        // "b" matches, "c" fails two characters in — the outer failure must
        // still report the Sequence's own starting cursor, not the farthest
        // sub-parser's (spec.md §8: "the outer next-cursor equals the input
        // cursor").
        ParseResult::Failure { next, .. } => assert_eq!(next.pos(), input.pos()),
        ParseResult::Success { .. } => panic!("expected failure"),
    }
}

#[test]
fn alternation_tries_branches_in_order() {
    let p = alt(vec![literal("foo"), literal("foobar")]);
    let input = Cursor::new("foobar");
    match p.parse(&input) {
        ParseResult::Success { matched, .. } => assert_eq!(matched, "foo"),
        _ => panic!("expected success"),
    }
}

#[test]
fn option_always_succeeds() {
    let p = opt(literal("x"));
    let input = Cursor::new("y");
    assert!(p.parse(&input).is_success());
}

#[test]
fn repetition_fails_below_the_minimum_count() {
    let p = rep(literal("a"), 3, None);
    let input = Cursor::new("aa");
    assert!(!p.parse(&input).is_success());
}

#[test]
fn repetition_succeeds_at_exactly_the_minimum_count() {
    let p = rep(literal("a"), 3, None);
    let input = Cursor::new("aaa");
    assert!(p.parse(&input).is_success());
}
