//! Materializes a CLR value into a plain `serde_json::Value` tree
//! (`spec.md` §4.7). This is the single point where laziness becomes
//! strictness: exporting drives evaluation of every exported field exactly
//! once, via each `Field`'s own memoization, without forcing fields that
//! aren't reachable from an exported path.

use serde_json::{Map, Value as Json};

use crate::error::EvalError;
use crate::record::Record;
use crate::value::Value;

/// Exports a Record's exported fields as a JSON object. Non-exported
/// fields are omitted from the result but remain evaluable internally.
pub fn export_record(record: &Record) -> Result<Json, EvalError> {
    let mut map = Map::new();
    for field in record.fields() {
        if !field.exported() {
            continue;
        }
        let value = field.eval(record)?;
        map.insert(field.name().to_string(), export_value(&value, record)?);
    }
    Ok(Json::Object(map))
}

/// Exports a single runtime value. `ctx` is the scope used to evaluate any
/// `List` elements found along the way — lists carry no scope of their
/// own (`SPEC_FULL.md` §5), so the scope in effect at the point a list
/// value was reached is what drives its elements.
pub fn export_value(value: &Value, ctx: &Record) -> Result<Json, EvalError> {
    match value {
        Value::Bool(b) => Ok(Json::Bool(*b)),
        Value::Int(i) => Ok(Json::from(*i)),
        Value::Float(f) => Ok(Json::from(*f)),
        Value::Str(s) => Ok(Json::from(s.clone())),
        Value::Record(record) => export_record(record),
        Value::List(list) => {
            let mut items = Vec::with_capacity(list.len());
            for element in list.iter_with(ctx) {
                items.push(export_value(&element?, ctx)?);
            }
            Ok(Json::Array(items))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cl::parse_cl;

    #[test]
    fn non_exported_fields_are_omitted() {
        // The CL grammar always marks parsed fields exported (spec.md §9);
        // this exercises the omission path directly against a hand-built
        // Record, since no CL surface syntax produces it yet.
        use crate::expr::Expr;
        let record = Record::from_literal(&[
            ("visible".to_string(), Expr::Immediate(Value::Int(1)), true),
            ("hidden".to_string(), Expr::Immediate(Value::Int(2)), false),
        ]);
        assert_eq!(export_record(&record).unwrap(), serde_json::json!({"visible": 1}));
    }

    #[test]
    fn list_of_records_exports_recursively() {
        let record = parse_cl("{xs = [{a=1}, {a=2}]}").unwrap();
        assert_eq!(
            export_record(&record).unwrap(),
            serde_json::json!({"xs": [{"a": 1}, {"a": 2}]})
        );
    }
}
