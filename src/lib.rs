//! A parser-combinator engine and a lazily-evaluated configuration-language
//! runtime (CLR).
//!
//! The combinator engine (`combinator`, `cursor`, `result`, `lexical`) is a
//! general-purpose toolkit for building recursive-descent parsers; the CLR
//! (`expr`, `record`, `value`, `ops`) is a small lazy evaluator for a
//! record-oriented configuration language, fronted by two grammars:
//! `cl` (the configuration language itself) and `avro` (an Avro IDL schema
//! adapter sharing the same combinator engine).
//!
//! ```
//! let doc = recordlang::parse_cl("{ x = 1 + 2 }").unwrap();
//! assert_eq!(doc.export().unwrap(), serde_json::json!({"x": 3}));
//! ```

pub mod avro;
pub mod cl;
pub mod combinator;
pub mod cursor;
pub mod error;
pub mod export;
pub mod expr;
pub mod lexical;
pub mod ops;
pub mod record;
pub mod result;
pub mod value;

pub use avro::{parse_avro_schema, parse_avro_schema_with_options, AvroField, AvroSchema, NameRegistry, Names};
pub use cl::{parse_cl, parse_cl_with_options};
pub use combinator::ParserOptions;
pub use error::{AvroError, CrateError, EvalError, ParseError};
pub use export::{export_record, export_value};
pub use ops::{BinTag, UnaryTag};
pub use record::{Field, Record};
pub use value::Value;
