//! Evaluator value <-> native document conversion.
//!
//! Patch data built by an expression (`{"a": [1, 2]}`) arrives as evaluator
//! values and is flattened here before it is stored, so the document keeps a
//! single representation.

use super::MutationError;
use crate::{
    document::{Mapping, Native},
    value::{TypeTag, Value},
};

/// Flattens an evaluator value into native form.
///
/// Map keys must be strings. Mutators and type values are handles, not
/// data, and are refused.
pub fn to_native(value: &Value) -> Result<Native, MutationError> {
    match value {
        Value::Null => Ok(Native::Null),
        Value::Boolean(b) => Ok(Native::Bool(*b)),
        Value::Integer(n) => Ok(Native::from(*n)),
        Value::Float(n) => serde_json::Number::from_f64(*n)
            .map(Native::Number)
            .ok_or_else(|| MutationError::UnsupportedConversion {
                from: format!("{} {n}", TypeTag::Double),
                to: "native".to_string(),
            }),
        Value::String(s) => Ok(Native::String(s.clone())),
        Value::List(items) => items
            .iter()
            .map(to_native)
            .collect::<Result<Vec<_>, _>>()
            .map(Native::Array),
        Value::Map(entries) => map_to_native(entries).map(Native::Object),
        Value::Type(_) | Value::Object(_) | Value::Sequence(_) => {
            Err(MutationError::UnsupportedConversion {
                from: value.type_tag().to_string(),
                to: "native".to_string(),
            })
        }
    }
}

/// Flattens literal map entries. Later duplicates win.
pub fn map_to_native(entries: &[(Value, Value)]) -> Result<Mapping, MutationError> {
    let mut mapping = Mapping::new();
    for (key, value) in entries {
        let Value::String(name) = key else {
            return Err(MutationError::BadKey(key.to_string()));
        };
        mapping.insert(name.clone(), to_native(value)?);
    }
    Ok(mapping)
}

/// Converts a native node into an evaluator value.
///
/// Integers that fit `i64` stay integers; every other number becomes a float.
pub fn from_native(native: &Native) -> Value {
    match native {
        Native::Null => Value::Null,
        Native::Bool(b) => Value::Boolean(*b),
        Native::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Native::String(s) => Value::String(s.clone()),
        Native::Array(items) => Value::List(items.iter().map(from_native).collect()),
        Native::Object(mapping) => Value::Map(
            mapping
                .iter()
                .map(|(k, v)| (Value::String(k.clone()), from_native(v)))
                .collect(),
        ),
    }
}
