//! Front-end parser for the configuration language: builds an [`Expr`]
//! graph (and, at the root, a [`Record`]) out of the combinator engine and
//! the lexical recognizers. Grammar per `SPEC_FULL.md` §6.

use std::rc::Rc;

use crate::combinator::{alt, opt, rep0, literal, regex, ForwardRef, Parser, ParserOptions};
use crate::cursor::Cursor;
use crate::error::ParseError;
use crate::expr::Expr;
use crate::lexical::{self, Number};
use crate::ops::{BinTag, UnaryTag};
use crate::record::Record;
use crate::result::ParseResult;
use crate::value::Value;

const KEYWORDS: &[&str] = &[
    "if", "then", "else", "not", "and", "or", "true", "false", "type",
];

/// A keyword token: matches `word` only when not followed by another
/// identifier character, so `iffy` does not parse as `if` followed by `fy`.
fn keyword(word: &'static str, ws: &Parser<()>) -> Parser<()> {
    regex(&format!(r"{}\b", word)).skip().token(ws)
}

/// A fixed punctuation/operator token.
fn sym(s: &'static str, ws: &Parser<()>) -> Parser<()> {
    literal(s).skip().token(ws)
}

fn ident_token(ws: &Parser<()>) -> Parser<String> {
    lexical::identifier()
        .filter(|s| !KEYWORDS.contains(&s.as_str()))
        .token(ws)
}

fn number_token(ws: &Parser<()>) -> Parser<Number> {
    lexical::number().token(ws)
}

fn string_token(ws: &Parser<()>) -> Parser<String> {
    lexical::string_literal().token(ws)
}

fn bool_token(ws: &Parser<()>) -> Parser<bool> {
    alt(vec![
        keyword("true", ws).map(|_| true),
        keyword("false", ws).map(|_| false),
    ])
}

fn immediate(ws: &Parser<()>) -> Parser<Expr> {
    alt(vec![
        bool_token(ws).map(|b| Expr::Immediate(Value::Bool(b))),
        number_token(ws).map(|n| match n {
            Number::Int(i) => Expr::Immediate(Value::Int(i)),
            Number::Float(f) => Expr::Immediate(Value::Float(f)),
        }),
        string_token(ws).map(|s| Expr::Immediate(Value::Str(s))),
    ])
}

/// Builds the full recursive-descent expression grammar, returning the
/// top-level expression parser (`and`/`or` precedence) and the record
/// parser (used both at the document root and for nested record literals).
/// `ws` is the token-separator pattern every token parser skips ahead of
/// (`ParserOptions::ws`, `SPEC_FULL.md` §3.6).
fn build_expr_parser(ws: &Parser<()>) -> Parser<Expr> {
    let expr_ref: ForwardRef<Expr> = ForwardRef::new();
    let expr = expr_ref.parser();

    let ref_expr = ident_token(ws).map(Expr::Ref);

    let if_expr = keyword("if", ws)
        .then(expr.clone())
        .then(keyword("then", ws))
        .then(expr.clone())
        .then(keyword("else", ws))
        .then(expr.clone())
        .map(|(((((_if, cond), _then), then_branch), _else), else_branch)| {
            Expr::If(Box::new(cond), Box::new(then_branch), Box::new(else_branch))
        });

    let field_sep = opt(alt(vec![sym(",", ws), sym(";", ws)]));
    let type_annotation = opt(sym(":", ws).then(keyword("type", ws)));
    // `Field := Ident (':' 'type')? ('=' Expr)? …` (`spec.md` §6.2) makes the
    // initializer genuinely optional at the syntax level, but the CLR's
    // `Field` has no value to memoize without one — `original_source/cl_parser.py`'s
    // `_make_record` stores a bare `None` for this case, which blows up with
    // an `AttributeError` the first time anything evaluates the field. Rather
    // than invent a value no node in `spec.md` §3.3 describes (a silent `{}`
    // default), a fieldless entry is accepted syntactically but contributes
    // no field to the record — the same way the discarded `type` keyword
    // contributes nothing — so a later reference to it surfaces the
    // already-specified `NameNotFound`/`FieldNotFound` (`spec.md` §7) instead
    // of a fabricated record.
    let field = ident_token(ws)
        .then(type_annotation)
        .then(opt(sym("=", ws).then(expr.clone()).map(|(_, e)| e)))
        .then(field_sep)
        .map(|(((name, _ty), value), _sep)| value.map(|v| (name, v, true)));
    let record_lit = sym("{", ws)
        .then(rep0(field))
        .then(sym("}", ws))
        .map(|((_open, fields), _close)| Expr::RecordLit(fields.into_iter().flatten().collect()));

    let list_elems = opt(
        expr.clone()
            .then(rep0(sym(",", ws).then(expr.clone()).map(|(_, e)| e)))
            .then(opt(sym(",", ws)))
            .map(|((first, rest), _trailing)| {
                let mut items = vec![first];
                items.extend(rest);
                items
            }),
    )
    .map(|items| items.unwrap_or_default());
    let list_lit = sym("[", ws)
        .then(list_elems)
        .then(sym("]", ws))
        .map(|((_open, items), _close)| Expr::List(items));

    let paren_expr = sym("(", ws).then(expr.clone()).then(sym(")", ws)).map(|((_o, e), _c)| e);

    // Primary: keyword-leading alternatives ordered before the identifier
    // fallback (`SPEC_FULL.md` §6.2's "earlier branches win" rule).
    let primary = alt(vec![
        immediate(ws),
        if_expr,
        record_lit,
        list_lit,
        paren_expr,
        ref_expr,
    ]);

    // Postfix chain: `.name`, `[expr]`, `(name=expr, ...)`.
    enum Tail {
        Field(String),
        Index(Expr),
        Call(Vec<(String, Expr)>),
    }
    let field_tail = sym(".", ws).then(ident_token(ws)).map(|(_, name)| Tail::Field(name));
    let index_tail = sym("[", ws).then(expr.clone()).then(sym("]", ws)).map(|((_, e), _)| Tail::Index(e));
    let param = ident_token(ws).then(sym("=", ws)).then(expr.clone()).map(|((name, _), e)| (name, e));
    let call_tail = sym("(", ws)
        .then(opt(param
            .clone()
            .then(rep0(sym(",", ws).then(param.clone()).map(|(_, p)| p)))
            .then(opt(sym(",", ws)))
            .map(|((first, rest), _)| {
                let mut params = vec![first];
                params.extend(rest);
                params
            })))
        .then(sym(")", ws))
        .map(|((_o, params), _c)| Tail::Call(params.unwrap_or_default()));
    let tail = alt(vec![field_tail, index_tail, call_tail]);
    let postfix = primary.then(rep0(tail)).map(|(base, tails)| {
        tails.into_iter().fold(base, |acc, tail| match tail {
            Tail::Field(name) => Expr::FieldAccess(Box::new(acc), name),
            Tail::Index(idx) => Expr::ListAccess(Box::new(acc), Box::new(idx)),
            Tail::Call(params) => Expr::Call(Box::new(acc), params),
        })
    });

    // Unary: binds looser than postfix/call/field-access, tighter than `**`.
    let unary_ref: ForwardRef<Expr> = ForwardRef::new();
    let unary = unary_ref.parser();
    let unary_def = alt(vec![
        keyword("not", ws).then(unary.clone()).map(|(_, e)| Expr::UnaryOp(UnaryTag::Not, Box::new(e))),
        sym("-", ws).then(unary.clone()).map(|(_, e)| Expr::UnaryOp(UnaryTag::Neg, Box::new(e))),
        postfix,
    ]);
    unary_ref.bind(unary_def);

    let pow = left_fold(unary, vec![(sym("**", ws), BinTag::Pow)]);
    let mul_div = left_fold(
        pow,
        vec![(sym("*", ws), BinTag::Mul), (sym("/", ws), BinTag::Div)],
    );
    let add_sub = left_fold(
        mul_div,
        vec![(sym("+", ws), BinTag::Add), (sym("-", ws), BinTag::Sub)],
    );
    let compare = left_fold(
        add_sub,
        vec![
            (sym("==", ws), BinTag::Eq),
            (sym("!=", ws), BinTag::Ne),
            (sym("<=", ws), BinTag::Le),
            (sym(">=", ws), BinTag::Ge),
            (sym("<", ws), BinTag::Lt),
            (sym(">", ws), BinTag::Gt),
        ],
    );
    let logical = left_fold(
        compare,
        vec![(keyword("and", ws), BinTag::And), (keyword("or", ws), BinTag::Or)],
    );

    expr_ref.bind(logical);
    expr
}

/// Builds `base (op base)*`, left-folding into `BinOp` nodes — the
/// mechanical pattern every precedence level shares (`SPEC_FULL.md` §6 /
/// `spec.md` §4.4). Operators sharing a level are tried in declaration
/// order at each step, so list multi-character lexemes (`==`, `<=`, …)
/// before their single-character prefixes.
fn left_fold(base: Parser<Expr>, ops: Vec<(Parser<()>, BinTag)>) -> Parser<Expr> {
    let op_choices: Vec<Parser<BinTag>> = ops
        .into_iter()
        .map(|(p, tag)| p.map(move |_| tag))
        .collect();
    let op = alt(op_choices);
    base.clone()
        .then(rep0(op.then(base)))
        .map(|(first, rest)| {
            rest.into_iter().fold(first, |left, (tag, right)| {
                Expr::BinOp(tag, Box::new(left), Box::new(right))
            })
        })
}

/// Parses a configuration document: a single record literal occupying the
/// whole input, modulo leading/trailing whitespace and comments. Uses the
/// default [`ParserOptions`] (C-style comments).
pub fn parse_cl(text: &str) -> Result<Rc<Record>, ParseError> {
    parse_cl_with_options(text, &ParserOptions::default())
}

/// As [`parse_cl`], but with an explicit [`ParserOptions`] controlling the
/// whitespace/comment pattern every token skips ahead of (`SPEC_FULL.md`
/// §3.6).
pub fn parse_cl_with_options(text: &str, opts: &ParserOptions) -> Result<Rc<Record>, ParseError> {
    let root_expr = build_expr_parser(&opts.ws);
    // The document itself is a record literal, reachable through `primary`,
    // but we parse via the full expression grammar so a bare record with
    // leading whitespace/comments (consumed by the first `token`) still
    // works; the grammar requires the top form to *be* a record at runtime.
    let input = Cursor::new(text);
    match root_expr.parse(&input) {
        ParseResult::Success { next, value, .. } => {
            let after_ws = match opts.ws.parse(&next) {
                ParseResult::Success { next, .. } => next,
                ParseResult::Failure { next, .. } => next,
            };
            if !after_ws.at_end() {
                return Err(ParseError::InvalidSource {
                    pos: after_ws.pos(),
                    line: after_ws.line(),
                    col: after_ws.col(),
                    message: "input remaining".to_string(),
                });
            }
            let throwaway_scope = Rc::new(Record::empty());
            match value.eval(&throwaway_scope) {
                Ok(crate::value::Value::Record(record)) => Ok(record),
                Ok(other) => Err(ParseError::InvalidSource {
                    pos: 0,
                    line: 1,
                    col: 0,
                    message: format!("document must be a record literal, found {}", other.type_name()),
                }),
                Err(eval_err) => Err(ParseError::InvalidSource {
                    pos: 0,
                    line: 1,
                    col: 0,
                    message: eval_err.to_string(),
                }),
            }
        }
        ParseResult::Failure { next, message } => Err(ParseError::InvalidSource {
            pos: next.pos(),
            line: next.line(),
            col: next.col(),
            message: message.unwrap_or_else(|| "parse failed".to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn export_of(src: &str) -> serde_json::Value {
        let record = parse_cl(src).expect("parse");
        crate::export::export_record(&record).expect("export")
    }

    #[test]
    fn empty_record() {
        assert_eq!(export_of("{}"), serde_json::json!({}));
    }

    #[test]
    fn operator_precedence() {
        assert_eq!(export_of("{x = 1 + 2 ** 3 * 3}"), serde_json::json!({"x": 25}));
    }

    #[test]
    fn parenthesized_expression() {
        assert_eq!(export_of("{x = (3 - 1) ** 3}"), serde_json::json!({"x": 8}));
    }

    #[test]
    fn if_expression_picks_branch() {
        assert_eq!(
            export_of("{x = true, y = if x then 5 else 10}"),
            serde_json::json!({"x": true, "y": 5})
        );
    }

    #[test]
    fn unary_not_and_negate() {
        assert_eq!(
            export_of("{x = true, y = not x, a = 1, b = -a}"),
            serde_json::json!({"x": true, "y": false, "a": 1, "b": -1})
        );
    }

    #[test]
    fn nested_record_field_access() {
        let src = r#"
        {
            x = { a = 1, b = 3*a, c = { d = 9 } }
            y = x.a
            z = x.c.d
        }
        "#;
        assert_eq!(
            export_of(src),
            serde_json::json!({"x": {"a": 1, "b": 3, "c": {"d": 9}}, "y": 1, "z": 9})
        );
    }

    #[test]
    fn list_literals_and_trailing_commas() {
        let src = r#"
        {
            empty = []
            singleton = [1]
            singleton2 = [1+1,]
            double = [1, 2]
            double2 = [1, 2,]
        }
        "#;
        assert_eq!(
            export_of(src),
            serde_json::json!({
                "empty": [],
                "singleton": [1],
                "singleton2": [2],
                "double": [1, 2],
                "double2": [1, 2],
            })
        );
    }

    #[test]
    fn matrix_access() {
        assert_eq!(export_of("{x = [[1,2,3],[10,20,30]][1][0]}"), serde_json::json!({"x": 10}));
    }

    #[test]
    fn call_rebinds_fields() {
        let record = parse_cl(
            r#"
            {
                x = { z = y + 1 }
                y = x(y=2)
            }
            "#,
        )
        .expect("parse");
        let y = record.get("y").expect("eval y");
        let y_record = y.as_record().expect("y is a record");
        assert_eq!(y_record.get("y"), Ok(Value::Int(2)));
        assert_eq!(y_record.get("z"), Ok(Value::Int(3)));
    }

    #[test]
    fn factorial_recurses_through_call() {
        let src = r#"
        {
            fact = { result = if n <= 1 then 1 else n * fact(n=n-1, fact=fact).result }
            f0 = fact(n=0, fact=fact).result
            f1 = fact(n=1, fact=fact).result
            f2 = fact(n=2, fact=fact).result
            f3 = fact(n=3, fact=fact).result
            f10 = fact(n=10, fact=fact).result
        }
        "#;
        let record = parse_cl(src).expect("parse");
        assert_eq!(record.get("f0"), Ok(Value::Int(1)));
        assert_eq!(record.get("f1"), Ok(Value::Int(1)));
        assert_eq!(record.get("f2"), Ok(Value::Int(2)));
        assert_eq!(record.get("f3"), Ok(Value::Int(6)));
        assert_eq!(record.get("f10"), Ok(Value::Int(3628800)));
    }

    #[test]
    fn fibonacci_recurses_through_call() {
        let src = r#"
        {
            fibo = {
                result = if (n <= 1) then 1 else fibo(n=n-1, fibo=fibo).result + fibo(n=n-2, fibo=fibo).result
            }
            f10 = fibo(n=10, fibo=fibo).result
        }
        "#;
        let record = parse_cl(src).expect("parse");
        assert_eq!(record.get("f10"), Ok(Value::Int(89)));
    }

    #[test]
    fn residual_input_is_an_error() {
        assert!(parse_cl("{} garbage").is_err());
    }

    #[test]
    fn fieldless_declaration_contributes_no_field() {
        // `{ x }` and `{ x: type }` are syntactically valid (spec.md §6.2's
        // initializer is optional) but produce no evaluable field — parsing
        // still succeeds, and the surrounding fields are unaffected.
        let record = parse_cl("{ x, x_typed: type, y = 1 }").expect("parse");
        assert_eq!(record.get("y"), Ok(Value::Int(1)));
        assert_eq!(
            record.get("x"),
            Err(crate::error::EvalError::FieldNotFound {
                name: "x".to_string()
            })
        );
        assert_eq!(export_of("{ x, y = 1 }"), serde_json::json!({"y": 1}));
    }

    #[test]
    fn unresolved_reference_is_name_not_found() {
        let record = parse_cl("{x = y}").expect("parse");
        assert_eq!(
            record.get("x"),
            Err(crate::error::EvalError::NameNotFound {
                name: "y".to_string()
            })
        );
    }

    #[test]
    fn string_concatenation_via_plus() {
        assert_eq!(
            export_of(r#"{x = "foo" + "bar"}"#),
            serde_json::json!({"x": "foobar"})
        );
    }

    #[test]
    fn custom_parser_options_change_the_skipped_whitespace_pattern() {
        // A host that only wants to skip plain whitespace, not comments,
        // swaps in its own `ws` pattern via `ParserOptions`.
        let opts = ParserOptions {
            ws: regex(r"\s*"),
        };
        let record = parse_cl_with_options("{ x = 1 }", &opts).expect("parse");
        assert_eq!(record.export().unwrap(), serde_json::json!({"x": 1}));

        // With comments excluded from `ws`, a `//` comment is no longer
        // skippable and the parse fails instead of silently eating it.
        assert!(parse_cl_with_options("{ x = 1 // comment\n}", &opts).is_err());
    }
}
