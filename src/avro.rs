//! The Avro front-end adapter: parses Avro IDL-style schema text into a
//! minimal schema value, resolving named types through a caller-supplied
//! registry. Grammar per `SPEC_FULL.md` §8 / `spec.md` §6.3, grounded on
//! `original_source/avro_parser.py`'s two-phase record construction.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::combinator::{alt, opt, rep0, rep1, ForwardRef, Parser, ParserOptions};
use crate::cursor::Cursor;
use crate::error::{AvroError, ParseError};
use crate::lexical::{self, Number};
use crate::result::ParseResult;
use crate::value::Value;

const PRIMITIVE_TYPES: &[&str] = &[
    "null", "boolean", "int", "long", "float", "double", "bytes", "string",
];

/// A record schema's fields live behind a `RefCell` so the registry can
/// hand out an `Rc` to the record before its fields are known, and have
/// every clone observe the fields once parsing finishes — the two-phase
/// construction `original_source/avro_parser.py`'s `_RecordParser` relies
/// on to let a record reference itself (`SPEC_FULL.md` §8).
#[derive(Debug)]
pub struct RecordBody {
    pub name: String,
    pub fields: RefCell<Vec<AvroField>>,
}

#[derive(Debug, Clone)]
pub struct AvroField {
    pub schema: AvroSchema,
    pub name: String,
    pub index: usize,
    pub default: Option<Value>,
}

/// The adapter's own minimal schema value — only the shape the grammar
/// needs to construct and the registry needs to store, not a full Avro
/// type-system implementation (the schema object model itself is owned by
/// an external library per `spec.md` §1).
#[derive(Debug, Clone)]
pub enum AvroSchema {
    Primitive(String),
    Array(Box<AvroSchema>),
    Map(Box<AvroSchema>),
    Union(Vec<AvroSchema>),
    Enum { name: String, symbols: Vec<String> },
    Fixed { name: String, size: i64 },
    Record(Rc<RecordBody>),
}

impl PartialEq for AvroSchema {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AvroSchema::Primitive(a), AvroSchema::Primitive(b)) => a == b,
            (AvroSchema::Array(a), AvroSchema::Array(b)) => a == b,
            (AvroSchema::Map(a), AvroSchema::Map(b)) => a == b,
            (AvroSchema::Union(a), AvroSchema::Union(b)) => a == b,
            (
                AvroSchema::Enum { name: n1, symbols: s1 },
                AvroSchema::Enum { name: n2, symbols: s2 },
            ) => n1 == n2 && s1 == s2,
            (
                AvroSchema::Fixed { name: n1, size: s1 },
                AvroSchema::Fixed { name: n2, size: s2 },
            ) => n1 == n2 && s1 == s2,
            (AvroSchema::Record(a), AvroSchema::Record(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Registers and resolves named Avro types. `register` fails on a
/// duplicate fullname; `lookup` returns `None` for an unknown one.
pub trait NameRegistry {
    fn register(&mut self, name: &str, schema: AvroSchema) -> Result<(), AvroError>;
    fn lookup(&self, fullname: &str) -> Option<AvroSchema>;
}

/// The default in-memory registry: a flat map from fullname to schema.
#[derive(Debug, Default)]
pub struct Names {
    map: HashMap<String, AvroSchema>,
}

impl Names {
    pub fn new() -> Self {
        Names::default()
    }
}

impl NameRegistry for Names {
    fn register(&mut self, name: &str, schema: AvroSchema) -> Result<(), AvroError> {
        if self.map.contains_key(name) {
            return Err(AvroError::DuplicateName {
                fullname: name.to_string(),
            });
        }
        self.map.insert(name.to_string(), schema);
        Ok(())
    }

    fn lookup(&self, fullname: &str) -> Option<AvroSchema> {
        self.map.get(fullname).cloned()
    }
}

fn keyword(word: &'static str, ws: &Parser<()>) -> Parser<()> {
    crate::combinator::regex(&format!(r"{}\b", word)).skip().token(ws)
}

fn sym(s: &'static str, ws: &Parser<()>) -> Parser<()> {
    crate::combinator::literal(s).skip().token(ws)
}

fn ident_token(ws: &Parser<()>) -> Parser<String> {
    lexical::identifier().token(ws)
}

/// `'.'? (Ident '.')* Ident`, producing the fullname with any leading `.`
/// stripped (an absolute reference resolves the same fullname as a bare
/// one once the registry is flat, as here).
fn avro_name(ws: &Parser<()>) -> Parser<String> {
    crate::combinator::regex(r"\.?[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*")
        .map(|s| s.strip_prefix('.').unwrap_or(&s).to_string())
        .token(ws)
}

fn integer_token(ws: &Parser<()>) -> Parser<i64> {
    lexical::integer().token(ws)
}

/// A literal default value: the grammar leaves `avro_value` unspecified
/// beyond "a value" (`spec.md` §6.3); field defaults in Avro IDL are
/// always literal immediates, never expressions, so this reuses the
/// lexical recognizers directly rather than the CL expression grammar.
fn avro_value(ws: &Parser<()>) -> Parser<Value> {
    let boolean = alt(vec![
        keyword("true", ws).map(|_| Value::Bool(true)),
        keyword("false", ws).map(|_| Value::Bool(false)),
    ]);
    let number = lexical::number().token(ws).map(|n| match n {
        Number::Int(i) => Value::Int(i),
        Number::Float(f) => Value::Float(f),
    });
    let string = lexical::string_literal().token(ws).map(Value::Str);
    alt(vec![boolean, number, string])
}

/// Builds the schema grammar over a freshly-created `ForwardRef`, bound to
/// itself so `array<...>`, `map<...>`, and named record fields can recurse.
///
/// `abort` catches a duplicate-name registration: in the original, that
/// condition is a hard exception that aborts the whole parse rather than a
/// backtrackable parser failure (`original_source/avro_parser.py`'s
/// `names.Register` raises, it doesn't return a Result `Branch` could fall
/// through). We can't unwind out of a `Fn` closure with a typed error, so
/// the record branch stashes it here and `parse_avro_schema` checks it
/// first, overriding whatever the alternation ultimately decided.
fn build_schema_parser(
    registry: Rc<RefCell<dyn NameRegistry>>,
    abort: Rc<RefCell<Option<AvroError>>>,
    ws: &Parser<()>,
) -> Parser<AvroSchema> {
    let schema_ref: ForwardRef<AvroSchema> = ForwardRef::new();
    let schema = schema_ref.parser();

    let primitives: Vec<Parser<AvroSchema>> = PRIMITIVE_TYPES
        .iter()
        .map(|&name| keyword(name, ws).map(move |_| AvroSchema::Primitive(name.to_string())))
        .collect();

    let array_parser = keyword("array", ws)
        .then(sym("<", ws))
        .then(schema.clone())
        .then(sym(">", ws))
        .map(|(((_a, _lt), inner), _gt)| AvroSchema::Array(Box::new(inner)));

    let map_parser = keyword("map", ws)
        .then(sym("<", ws))
        .then(schema.clone())
        .then(sym(">", ws))
        .map(|(((_m, _lt), inner), _gt)| AvroSchema::Map(Box::new(inner)));

    let union_parser = keyword("union", ws)
        .then(sym("{", ws))
        .then(rep1(
            schema.clone().then(opt(sym(",", ws))).map(|(s, _)| s),
        ))
        .then(sym("}", ws))
        .map(|(((_u, _open), members), _close)| AvroSchema::Union(members));

    let separator = opt(alt(vec![sym(",", ws), sym(";", ws)]));

    // `enum`/`fixed` have no nested schemas, so (unlike `record`) they need
    // no two-phase register-then-parse dance — but they are still named
    // types and must land in the registry so a later field can reference
    // them by name (`spec.md` §6.3/§9: "invokes the registry for every
    // named type").
    let enum_registry = Rc::clone(&registry);
    let enum_abort = Rc::clone(&abort);
    let enum_parser = keyword("enum", ws)
        .then(avro_name(ws))
        .then(sym("{", ws))
        .then(rep0(ident_token(ws).then(separator.clone()).map(|(id, _)| id)))
        .then(sym("}", ws))
        .map(move |((((_e, name), _open), symbols), _close)| {
            let schema = AvroSchema::Enum { name: name.clone(), symbols };
            if let Err(e) = enum_registry.borrow_mut().register(&name, schema.clone()) {
                enum_abort.borrow_mut().get_or_insert(e);
            }
            schema
        });

    let fixed_registry = Rc::clone(&registry);
    let fixed_abort = Rc::clone(&abort);
    let fixed_parser = keyword("fixed", ws)
        .then(avro_name(ws))
        .then(sym("(", ws))
        .then(integer_token(ws))
        .then(sym(")", ws))
        .map(move |((((_f, name), _open), size), _close)| {
            let schema = AvroSchema::Fixed { name: name.clone(), size };
            if let Err(e) = fixed_registry.borrow_mut().register(&name, schema.clone()) {
                fixed_abort.borrow_mut().get_or_insert(e);
            }
            schema
        });

    let record_registry = Rc::clone(&registry);
    let record_schema_ref = schema.clone();
    let record_abort = Rc::clone(&abort);
    let record_field_sep = separator.clone();
    let record_ws = ws.clone();
    let record_parser = Parser::new(move |input: &Cursor| {
        let prefix = keyword("record", &record_ws).then(avro_name(&record_ws)).then(sym("{", &record_ws));
        match prefix.parse(input) {
            ParseResult::Success {
                matched: m1,
                next: n1,
                value: ((_kw, name), _open),
            } => {
                let body = Rc::new(RecordBody {
                    name: name.clone(),
                    fields: RefCell::new(Vec::new()),
                });
                // Register before parsing fields so a field type that
                // names this record (directly, or via a union) resolves.
                if let Err(e) = record_registry
                    .borrow_mut()
                    .register(&name, AvroSchema::Record(Rc::clone(&body)))
                {
                    record_abort.borrow_mut().get_or_insert(e);
                    return ParseResult::failure(n1, format!("duplicate schema name: {name}"));
                }

                let field = record_schema_ref
                    .clone()
                    .then(ident_token(&record_ws))
                    .then(opt(sym("=", &record_ws).then(avro_value(&record_ws)).map(|(_, v)| v)))
                    .then(record_field_sep.clone());
                let mut index = 0usize;
                let mut cur = n1;
                let mut matched = m1;
                let mut fields = Vec::new();
                loop {
                    match field.parse(&cur) {
                        ParseResult::Success {
                            matched: fm,
                            next: fnext,
                            value: (((field_schema, field_name), default), _sep),
                        } => {
                            matched.push_str(&fm);
                            cur = fnext;
                            fields.push(AvroField {
                                schema: field_schema,
                                name: field_name,
                                index,
                                default,
                            });
                            index += 1;
                        }
                        ParseResult::Failure { .. } => break,
                    }
                }
                match sym("}", &record_ws).parse(&cur) {
                    ParseResult::Success { matched: cm, next, .. } => {
                        matched.push_str(&cm);
                        *body.fields.borrow_mut() = fields;
                        ParseResult::success(matched, next, AvroSchema::Record(body))
                    }
                    ParseResult::Failure { next, message } => ParseResult::Failure { next, message },
                }
            }
            ParseResult::Failure { next, message } => ParseResult::Failure { next, message },
        }
    });

    // A bare name that isn't in the registry is a hard error, not a
    // fabricated schema: `original_source/avro_parser.py`'s
    // `_LookupSchemaByName` raises on the same miss, and `NameRegistry`'s
    // own contract (`SPEC_FULL.md` §8) is `lookup(fullname) -> schema |
    // null` where `null` must surface as `AvroError::UnknownName`. Routed
    // through the same `abort` channel `record_parser` uses for
    // `DuplicateName`, since a `Parser<T>`'s `Fn` closure can't itself
    // return a typed error — only the top-level `parse_avro_schema_with_options`
    // call can.
    let lookup_registry = Rc::clone(&registry);
    let lookup_abort = Rc::clone(&abort);
    let name_parser = avro_name(ws);
    let schema_by_name = Parser::new(move |input: &Cursor| match name_parser.parse(input) {
        ParseResult::Success { matched, next, value: name } => {
            match lookup_registry.borrow().lookup(&name) {
                Some(schema) => ParseResult::success(matched, next, schema),
                None => {
                    lookup_abort
                        .borrow_mut()
                        .get_or_insert(AvroError::UnknownName { fullname: name.clone() });
                    ParseResult::failure(next, format!("unknown schema name: {name}"))
                }
            }
        }
        failure @ ParseResult::Failure { .. } => failure,
    });

    let mut branches = primitives;
    branches.extend([
        array_parser,
        map_parser,
        union_parser,
        enum_parser,
        fixed_parser,
        record_parser,
        schema_by_name,
    ]);
    let full = alt(branches);
    schema_ref.bind(full);
    schema
}

/// Parses a single Avro schema from `text`, registering any named types
/// it defines into `registry` along the way. Uses the default
/// [`ParserOptions`] (C-style comments, the same dialect the original skips
/// over its own grammar).
pub fn parse_avro_schema(
    text: &str,
    registry: Rc<RefCell<dyn NameRegistry>>,
) -> Result<AvroSchema, AvroError> {
    parse_avro_schema_with_options(text, registry, &ParserOptions::default())
}

/// As [`parse_avro_schema`], but with an explicit [`ParserOptions`]
/// (`SPEC_FULL.md` §3.6).
pub fn parse_avro_schema_with_options(
    text: &str,
    registry: Rc<RefCell<dyn NameRegistry>>,
    opts: &ParserOptions,
) -> Result<AvroSchema, AvroError> {
    let abort: Rc<RefCell<Option<AvroError>>> = Rc::new(RefCell::new(None));
    let parser = build_schema_parser(registry, Rc::clone(&abort), &opts.ws);
    let input = Cursor::new(text);
    let result = match parser.parse(&input) {
        ParseResult::Success { next, value, .. } => {
            let after_ws = match opts.ws.parse(&next) {
                ParseResult::Success { next, .. } => next,
                ParseResult::Failure { next, .. } => next,
            };
            if !after_ws.at_end() {
                Err(AvroError::Parse(ParseError::InvalidSource {
                    pos: after_ws.pos(),
                    line: after_ws.line(),
                    col: after_ws.col(),
                    message: "input remaining".to_string(),
                }))
            } else {
                Ok(value)
            }
        }
        ParseResult::Failure { next, message } => Err(AvroError::Parse(ParseError::InvalidSource {
            pos: next.pos(),
            line: next.line(),
            col: next.col(),
            message: message.unwrap_or_else(|| "parse failed".to_string()),
        })),
    };
    if let Some(e) = abort.borrow_mut().take() {
        return Err(e);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Rc<RefCell<dyn NameRegistry>> {
        Rc::new(RefCell::new(Names::new()))
    }

    #[test]
    fn primitive_schema() {
        let schema = parse_avro_schema("int", names()).unwrap();
        assert_eq!(schema, AvroSchema::Primitive("int".to_string()));
    }

    #[test]
    fn array_of_strings() {
        let schema = parse_avro_schema("array<string>", names()).unwrap();
        assert_eq!(
            schema,
            AvroSchema::Array(Box::new(AvroSchema::Primitive("string".to_string())))
        );
    }

    #[test]
    fn record_with_fields_and_default() {
        let schema = parse_avro_schema("record Pair { int a; int b = 2 }", names()).unwrap();
        match schema {
            AvroSchema::Record(body) => {
                let fields = body.fields.borrow();
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].name, "a");
                assert_eq!(fields[1].name, "b");
                assert_eq!(fields[1].default, Some(Value::Int(2)));
            }
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn self_referential_record_through_union() {
        let registry = names();
        let schema = parse_avro_schema(
            "record IntList { int value; union { null, IntList } next }",
            Rc::clone(&registry),
        )
        .unwrap();
        match schema {
            AvroSchema::Record(body) => {
                let fields = body.fields.borrow();
                assert_eq!(fields.len(), 2);
                match &fields[1].schema {
                    AvroSchema::Union(members) => {
                        assert_eq!(members.len(), 2);
                        match &members[1] {
                            AvroSchema::Record(inner) => assert_eq!(inner.name, "IntList"),
                            other => panic!("expected self-reference, got {other:?}"),
                        }
                    }
                    other => panic!("expected union, got {other:?}"),
                }
            }
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn enum_name_is_registered_for_later_reference() {
        let registry = names();
        parse_avro_schema("enum Suit { Clubs, Diamonds, Hearts, Spades }", Rc::clone(&registry))
            .unwrap();
        let schema = parse_avro_schema("record Card { Suit suit }", Rc::clone(&registry)).unwrap();
        match schema {
            AvroSchema::Record(body) => match &body.fields.borrow()[0].schema {
                AvroSchema::Enum { name, .. } => assert_eq!(name, "Suit"),
                other => panic!("expected enum reference, got {other:?}"),
            },
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn unresolved_name_is_an_error() {
        let result = parse_avro_schema("record Card { Ghost suit }", names());
        assert!(matches!(
            result,
            Err(AvroError::UnknownName { fullname }) if fullname == "Ghost"
        ));
    }

    #[test]
    fn duplicate_name_is_an_error() {
        let registry = names();
        let result = parse_avro_schema("record Dup { Dup self }", Rc::clone(&registry));
        assert!(result.is_ok(), "first definition should succeed: {result:?}");

        let result = parse_avro_schema("record Dup { int a }", registry);
        assert!(matches!(
            result,
            Err(AvroError::DuplicateName { fullname }) if fullname == "Dup"
        ));
    }

    #[test]
    fn custom_parser_options_are_honored() {
        let opts = ParserOptions {
            ws: crate::combinator::regex(r"\s*"),
        };
        let schema = parse_avro_schema_with_options("array<int>", names(), &opts).unwrap();
        assert_eq!(
            schema,
            AvroSchema::Array(Box::new(AvroSchema::Primitive("int".to_string())))
        );
    }
}
