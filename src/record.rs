//! `Record` and `Field`: the lazy, self-scoping container at the heart of
//! the configuration language (`spec.md` §3.3/§3.4).

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::EvalError;
use crate::expr::Expr;
use crate::value::Value;

/// A single named entry in a `Record`. A `Field`'s expression always
/// evaluates against its *owning* Record, never against whatever scope an
/// outer `Eval` call was made with — that discipline is what gives the
/// configuration language lexical, record-local name resolution.
#[derive(Debug)]
pub struct Field {
    name: String,
    expr: Expr,
    exported: bool,
    memo: RefCell<Option<Value>>,
}

impl Field {
    pub fn new(name: impl Into<String>, expr: Expr, exported: bool) -> Self {
        Field {
            name: name.into(),
            expr,
            exported,
            memo: RefCell::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exported(&self) -> bool {
        self.exported
    }

    /// Evaluates against `scope` (the owning Record), memoizing on first
    /// success. A failed evaluation is not memoized, so a later retry (e.g.
    /// after the caller fixes up something upstream) can succeed.
    pub fn eval(&self, scope: &Record) -> Result<Value, EvalError> {
        if let Some(v) = self.memo.borrow().as_ref() {
            return Ok(v.clone());
        }
        let value = self.expr.eval(scope)?;
        *self.memo.borrow_mut() = Some(value.clone());
        Ok(value)
    }

    /// Clones this field with name, expression, and exported flag intact
    /// but a fresh, unevaluated memoization slot — required whenever a
    /// Field must be evaluated in a different scope than the one it was
    /// first bound to (`Call`, `Record + Record`; `spec.md` §3.4).
    pub fn fresh_clone(&self) -> Field {
        Field {
            name: self.name.clone(),
            expr: self.expr.clone(),
            exported: self.exported,
            memo: RefCell::new(None),
        }
    }
}

/// An ordered map from field name to `Field`. Lookups scan linearly:
/// configuration records are small (tens of fields, not thousands), so a
/// `Vec` beats a hash map on both insertion-order preservation (needed for
/// `export`, `spec.md` §4.7) and constant factors at this scale.
#[derive(Debug, Default)]
pub struct Record {
    fields: Vec<Rc<Field>>,
}

impl Record {
    pub fn empty() -> Record {
        Record { fields: Vec::new() }
    }

    pub fn from_fields(fields: Vec<Rc<Field>>) -> Record {
        Record { fields }
    }

    /// Builds a Record from the parser's literal field list, each field
    /// getting a fresh memoization slot.
    pub fn from_literal(fields: &[(String, Expr, bool)]) -> Record {
        let fields = fields
            .iter()
            .map(|(name, expr, exported)| Rc::new(Field::new(name.clone(), expr.clone(), *exported)))
            .collect();
        Record { fields }
    }

    pub fn field(&self, name: &str) -> Option<&Rc<Field>> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn fields(&self) -> &[Rc<Field>] {
        &self.fields
    }

    /// `record.get(name) ≡ fields[name].Eval(record)` (`spec.md` §3.4
    /// invariant) — the field evaluates against `self`, never against
    /// whatever scope the caller of `get` is itself working in.
    ///
    /// Used by `FieldAccess`, whose miss is a `FieldNotFound` (`spec.md`
    /// §7). `Ref`'s lookup through a scope uses [`Record::resolve`]
    /// instead, which reports the same miss as `NameNotFound` — the two
    /// error kinds share this one lookup but diverge in which node
    /// triggered it.
    pub fn get(&self, name: &str) -> Result<Value, EvalError> {
        let field = self.field(name).ok_or_else(|| EvalError::FieldNotFound {
            name: name.to_string(),
        })?;
        field.eval(self)
    }

    /// `Ref(name)`'s lookup (`spec.md` §3.3): identical to `get`, but a
    /// miss is a `NameNotFound`, not a `FieldNotFound` — the two node
    /// types report distinct error kinds for what is otherwise the same
    /// field-table lookup (`spec.md` §7).
    pub fn resolve(&self, name: &str) -> Result<Value, EvalError> {
        let field = self.field(name).ok_or_else(|| EvalError::NameNotFound {
            name: name.to_string(),
        })?;
        field.eval(self)
    }

    /// `Record.export()` (`spec.md` §6.1): materializes every exported
    /// field into a plain `serde_json::Value` tree.
    pub fn export(&self) -> Result<serde_json::Value, EvalError> {
        crate::export::export_record(self)
    }

    /// `self + other`: the right side's fields shadow the left's on name
    /// collision; every field in the result is fresh-cloned so the merged
    /// Record's memoization starts empty (`spec.md` §3.4). This is the
    /// mechanism `Call` uses to rebind parameters on every invocation.
    pub fn merge(&self, other: &Record) -> Record {
        let mut merged: Vec<Rc<Field>> = Vec::with_capacity(self.fields.len() + other.fields.len());
        for field in &self.fields {
            merged.push(Rc::new(field.fresh_clone()));
        }
        for field in &other.fields {
            if let Some(pos) = merged.iter().position(|f| f.name() == field.name()) {
                merged[pos] = Rc::new(field.fresh_clone());
            } else {
                merged.push(Rc::new(field.fresh_clone()));
            }
        }
        Record { fields: merged }
    }
}

/// `Record + Record → Record` (`spec.md` §6.1), in terms of [`Record::merge`].
impl std::ops::Add for &Record {
    type Output = Record;

    fn add(self, other: &Record) -> Record {
        self.merge(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn field_memoizes_on_first_eval() {
        let record = Rc::new(Record::from_literal(&[(
            "a".to_string(),
            Expr::Immediate(Value::Int(1)),
            true,
        )]));
        assert_eq!(record.get("a"), Ok(Value::Int(1)));
        assert_eq!(record.get("a"), Ok(Value::Int(1)));
    }

    #[test]
    fn merge_shadows_left_with_right() {
        let left = Record::from_literal(&[
            ("a".to_string(), Expr::Immediate(Value::Int(1)), true),
            ("b".to_string(), Expr::Immediate(Value::Int(2)), true),
        ]);
        let right = Record::from_literal(&[("b".to_string(), Expr::Immediate(Value::Int(20)), true)]);
        let merged = Rc::new(left.merge(&right));
        assert_eq!(merged.get("a"), Ok(Value::Int(1)));
        assert_eq!(merged.get("b"), Ok(Value::Int(20)));
    }

    #[test]
    fn field_not_found_reports_name() {
        let record = Rc::new(Record::empty());
        assert_eq!(
            record.get("missing"),
            Err(EvalError::FieldNotFound {
                name: "missing".to_string()
            })
        );
    }

    #[test]
    fn resolve_reports_name_not_found_distinctly_from_get() {
        let record = Record::empty();
        assert_eq!(
            record.resolve("missing"),
            Err(EvalError::NameNotFound {
                name: "missing".to_string()
            })
        );
    }
}
