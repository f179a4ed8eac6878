//! Binary/unary operator tags and their semantic functions.
//!
//! Each `BinOp`/`UnaryOp` node stores a tag rather than a boxed closure:
//! closures-as-fields would make `Field`/`Record` harder to clone cheaply,
//! and every `Call` and `+` clones fields (`spec.md` §3.4). An enum with a
//! dispatch method keeps nodes trivially `Clone`.

use crate::error::EvalError;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryTag {
    Neg,
    Not,
}

impl UnaryTag {
    pub fn display(self) -> &'static str {
        match self {
            UnaryTag::Neg => "-",
            UnaryTag::Not => "not",
        }
    }

    pub fn apply(self, operand: Value) -> Result<Value, EvalError> {
        match self {
            UnaryTag::Neg => match operand {
                Value::Int(i) => Ok(Value::Int(-i)),
                Value::Float(f) => Ok(Value::Float(-f)),
                other => Err(EvalError::TypeMismatch {
                    expected: "int or float",
                    found: other.type_name(),
                }),
            },
            UnaryTag::Not => match operand {
                Value::Bool(b) => Ok(Value::Bool(!b)),
                other => Err(EvalError::TypeMismatch {
                    expected: "bool",
                    found: other.type_name(),
                }),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinTag {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinTag {
    pub fn display(self) -> &'static str {
        match self {
            BinTag::Add => "+",
            BinTag::Sub => "-",
            BinTag::Mul => "*",
            BinTag::Div => "/",
            BinTag::Pow => "**",
            BinTag::Eq => "==",
            BinTag::Ne => "!=",
            BinTag::Lt => "<",
            BinTag::Le => "<=",
            BinTag::Gt => ">",
            BinTag::Ge => ">=",
            BinTag::And => "and",
            BinTag::Or => "or",
        }
    }

    pub fn apply(self, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
        match self {
            BinTag::Add => add(lhs, rhs),
            BinTag::Sub => arith(lhs, rhs, |a, b| a - b, |a, b| a - b),
            BinTag::Mul => arith(lhs, rhs, |a, b| a * b, |a, b| a * b),
            BinTag::Div => arith(lhs, rhs, |a, b| a / b, |a, b| a / b),
            BinTag::Pow => arith(lhs, rhs, |a, b| a.pow(b as u32), |a, b| a.powf(b)),
            BinTag::Eq => Ok(Value::Bool(numeric_or_value_eq(&lhs, &rhs)?)),
            BinTag::Ne => Ok(Value::Bool(!numeric_or_value_eq(&lhs, &rhs)?)),
            BinTag::Lt => compare(lhs, rhs, |o| o == std::cmp::Ordering::Less),
            BinTag::Le => compare(lhs, rhs, |o| o != std::cmp::Ordering::Greater),
            BinTag::Gt => compare(lhs, rhs, |o| o == std::cmp::Ordering::Greater),
            BinTag::Ge => compare(lhs, rhs, |o| o != std::cmp::Ordering::Less),
            BinTag::And => logical(lhs, rhs, |a, b| a && b),
            BinTag::Or => logical(lhs, rhs, |a, b| a || b),
        }
    }
}

fn add(lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    match (&lhs, &rhs) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        _ => arith(lhs, rhs, |a, b| a + b, |a, b| a + b),
    }
}

fn arith(
    lhs: Value,
    rhs: Value,
    int_op: impl Fn(i64, i64) -> i64,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    match (&lhs, &rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(*a, *b))),
        _ => {
            let a = lhs.as_f64().ok_or_else(|| EvalError::TypeMismatch {
                expected: "int or float",
                found: lhs.type_name(),
            })?;
            let b = rhs.as_f64().ok_or_else(|| EvalError::TypeMismatch {
                expected: "int or float",
                found: rhs.type_name(),
            })?;
            Ok(Value::Float(float_op(a, b)))
        }
    }
}

fn compare(lhs: Value, rhs: Value, pred: impl Fn(std::cmp::Ordering) -> bool) -> Result<Value, EvalError> {
    let a = lhs.as_f64().ok_or_else(|| EvalError::TypeMismatch {
        expected: "int or float",
        found: lhs.type_name(),
    })?;
    let b = rhs.as_f64().ok_or_else(|| EvalError::TypeMismatch {
        expected: "int or float",
        found: rhs.type_name(),
    })?;
    let ord = a.partial_cmp(&b).ok_or(EvalError::TypeMismatch {
        expected: "comparable number",
        found: "NaN",
    })?;
    Ok(Value::Bool(pred(ord)))
}

fn logical(lhs: Value, rhs: Value, f: impl Fn(bool, bool) -> bool) -> Result<Value, EvalError> {
    let a = lhs.as_bool().ok_or_else(|| EvalError::TypeMismatch {
        expected: "bool",
        found: lhs.type_name(),
    })?;
    let b = rhs.as_bool().ok_or_else(|| EvalError::TypeMismatch {
        expected: "bool",
        found: rhs.type_name(),
    })?;
    Ok(Value::Bool(f(a, b)))
}

fn numeric_or_value_eq(lhs: &Value, rhs: &Value) -> Result<bool, EvalError> {
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(a), Some(b)) => Ok(a == b),
        _ => Ok(lhs == rhs),
    }
}
