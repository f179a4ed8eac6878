//! The CLR expression graph: nodes built immutably by the front-end parsers,
//! each carrying a single capability, `eval(scope)`.

use std::rc::Rc;

use crate::error::EvalError;
use crate::ops::{BinTag, UnaryTag};
use crate::record::Record;
use crate::value::Value;

/// A node in the lazy expression graph. `Record`/`Field` live in
/// `crate::record` since they also carry the memoization and merge logic
/// (`spec.md` §3.4); every other node type lives here.
#[derive(Debug, Clone)]
pub enum Expr {
    Immediate(Value),
    Ref(String),
    List(Vec<Expr>),
    ListAccess(Box<Expr>, Box<Expr>),
    FieldAccess(Box<Expr>, String),
    UnaryOp(UnaryTag, Box<Expr>),
    BinOp(BinTag, Box<Expr>, Box<Expr>),
    If(Box<Expr>, Box<Expr>, Box<Expr>),
    /// A record literal: ordered `(name, expr, exported)` triples, built
    /// fresh (with unevaluated memo slots) on every `eval`.
    RecordLit(Vec<(String, Expr, bool)>),
    /// `callee(name = expr, ...)`.
    Call(Box<Expr>, Vec<(String, Expr)>),
}

impl Expr {
    pub fn eval(&self, scope: &Record) -> Result<Value, EvalError> {
        match self {
            Expr::Immediate(v) => Ok(v.clone()),
            Expr::Ref(name) => scope.resolve(name),
            Expr::List(items) => Ok(Value::List(Rc::new(List {
                items: items.clone(),
            }))),
            Expr::ListAccess(list_expr, index_expr) => {
                let list_val = list_expr.eval(scope)?;
                let list = list_val.as_list().ok_or_else(|| EvalError::TypeMismatch {
                    expected: "list",
                    found: list_val.type_name(),
                })?;
                let index_val = index_expr.eval(scope)?;
                let index = index_val.as_f64().ok_or_else(|| EvalError::TypeMismatch {
                    expected: "int",
                    found: index_val.type_name(),
                })? as i64;
                list.get(index, scope)
            }
            Expr::FieldAccess(record_expr, name) => {
                let record_val = record_expr.eval(scope)?;
                let record = record_val.as_record().ok_or_else(|| EvalError::TypeMismatch {
                    expected: "record",
                    found: record_val.type_name(),
                })?;
                record.get(name)
            }
            Expr::UnaryOp(tag, operand) => tag.apply(operand.eval(scope)?),
            Expr::BinOp(tag, left, right) => {
                let l = left.eval(scope)?;
                let r = right.eval(scope)?;
                tag.apply(l, r)
            }
            Expr::If(cond, then_branch, else_branch) => {
                let c = cond.eval(scope)?;
                let b = c.as_bool().ok_or_else(|| EvalError::TypeMismatch {
                    expected: "bool",
                    found: c.type_name(),
                })?;
                if b {
                    then_branch.eval(scope)
                } else {
                    else_branch.eval(scope)
                }
            }
            Expr::RecordLit(fields) => Ok(Value::Record(Rc::new(Record::from_literal(fields)))),
            Expr::Call(callee, params) => {
                let callee_val = callee.eval(scope)?;
                let callee_record = callee_val.as_record().ok_or_else(|| EvalError::TypeMismatch {
                    expected: "record",
                    found: callee_val.type_name(),
                })?;
                let mut param_fields = Vec::with_capacity(params.len());
                for (name, expr) in params {
                    let value = expr.eval(scope)?;
                    param_fields.push((name.clone(), Expr::Immediate(value), true));
                }
                let param_record = Record::from_literal(&param_fields);
                Ok(Value::Record(Rc::new(callee_record.merge(&param_record))))
            }
        }
    }
}

/// An ordered expression sequence. `List` itself is the lazy container
/// (`Expr::List::eval` returns a `Value::List` wrapping one of these
/// unevaluated); elements evaluate against whatever scope `ListAccess`
/// was itself evaluated in, not a scope of their own — unlike `Record`,
/// `List` owns no Fields and introduces no closure (`SPEC_FULL.md` §6).
#[derive(Debug, Clone)]
pub struct List {
    items: Vec<Expr>,
}

impl List {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Evaluates the element at `index` (Python-style negative indexing
    /// supported) against `scope`.
    pub fn get(&self, index: i64, scope: &Record) -> Result<Value, EvalError> {
        let len = self.items.len();
        let resolved = if index < 0 { index + len as i64 } else { index };
        if resolved < 0 || resolved as usize >= len {
            return Err(EvalError::IndexOutOfRange { index, len });
        }
        self.items[resolved as usize].eval(scope)
    }

    pub fn iter_with<'a>(
        &'a self,
        scope: &'a Record,
    ) -> impl Iterator<Item = Result<Value, EvalError>> + 'a {
        self.items.iter().map(move |e| e.eval(scope))
    }
}
