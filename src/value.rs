use std::fmt;

use crate::{
    document::Native,
    mutator::{Mutable, MutationError, Node, ObjectMutator, SequenceMutator, convert},
};

/// Type identity of a value, as seen by expressions (`type(x)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Null,
    Bool,
    Int,
    Double,
    String,
    List,
    Map,
    Type,
    ObjectMutator,
    SequenceMutator,
}

impl TypeTag {
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Null => "null_type",
            TypeTag::Bool => "bool",
            TypeTag::Int => "int",
            TypeTag::Double => "double",
            TypeTag::String => "string",
            TypeTag::List => "list",
            TypeTag::Map => "map",
            TypeTag::Type => "type",
            TypeTag::ObjectMutator => "ObjectMutator",
            TypeTag::SequenceMutator => "SequenceMutator",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value produced or consumed by expression evaluation.
///
/// Scalars and literal composites are plain data. `Object` and `Sequence` are
/// mutators: opaque handles onto a document location.
///
/// # Examples
///
/// ```
/// use docmut::Value;
///
/// let patch = Value::Map(vec![(Value::String("replicas".into()), Value::Integer(3))]);
/// assert_eq!(patch.type_tag().name(), "map");
/// assert!(patch.as_mutable().is_none());
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),

    /// List literal
    List(Vec<Value>),

    /// Map literal; keys are arbitrary values until stored in a document
    Map(Vec<(Value, Value)>),

    /// A type, as returned by `type(x)`
    Type(TypeTag),

    /// Mutator over a mapping
    Object(ObjectMutator),

    /// Mutator over a sequence
    Sequence(SequenceMutator),
}

impl Value {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::Null,
            Value::Boolean(_) => TypeTag::Bool,
            Value::Integer(_) => TypeTag::Int,
            Value::Float(_) => TypeTag::Double,
            Value::String(_) => TypeTag::String,
            Value::List(_) => TypeTag::List,
            Value::Map(_) => TypeTag::Map,
            Value::Type(_) => TypeTag::Type,
            Value::Object(_) => TypeTag::ObjectMutator,
            Value::Sequence(_) => TypeTag::SequenceMutator,
        }
    }

    /// Check if the value is truthy (for conditions)
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
            Value::Type(_) | Value::Object(_) | Value::Sequence(_) => true,
        }
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// The write capability, for mutators only.
    pub fn as_mutable(&self) -> Option<&dyn Mutable> {
        match self {
            Value::Object(m) => Some(m as &dyn Mutable),
            Value::Sequence(m) => Some(m as &dyn Mutable),
            _ => None,
        }
    }

    /// Flattens the value into native document form. Mutators refuse.
    pub fn convert_to_native(&self) -> Result<Native, MutationError> {
        convert::to_native(self)
    }

    /// Converts between declared types.
    ///
    /// Every value converts to its own type and to `type`. Mutators accept
    /// nothing else.
    pub fn convert_to_type(&self, target: TypeTag) -> Result<Value, MutationError> {
        let source = self.type_tag();
        if target == TypeTag::Type {
            return Ok(Value::Type(source));
        }
        if target == source {
            return Ok(self.clone());
        }
        let converted = match (self, target) {
            (Value::Integer(n), TypeTag::Double) => Some(Value::Float(*n as f64)),
            (Value::Integer(n), TypeTag::String) => Some(Value::String(n.to_string())),
            (Value::Float(n), TypeTag::Int) => float_to_int(*n).map(Value::Integer),
            (Value::Float(n), TypeTag::String) => Some(Value::String(n.to_string())),
            (Value::String(s), TypeTag::Int) => s.trim().parse().ok().map(Value::Integer),
            (Value::String(s), TypeTag::Double) => s.trim().parse().ok().map(Value::Float),
            (Value::Boolean(b), TypeTag::String) => Some(Value::String(b.to_string())),
            (Value::Type(t), TypeTag::String) => Some(Value::String(t.name().to_string())),
            _ => None,
        };
        converted.ok_or_else(|| MutationError::UnsupportedConversion {
            from: source.to_string(),
            to: target.to_string(),
        })
    }
}

fn float_to_int(n: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if n.is_finite() && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        Some(n.trunc() as i64)
    } else {
        None
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => {
                let includes = |a: &[(Value, Value)], b: &[(Value, Value)]| {
                    a.iter()
                        .all(|(k, v)| b.iter().any(|(k2, v2)| k == k2 && v == v2))
                };
                a.len() == b.len() && includes(a, b) && includes(b, a)
            }
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Type(tag) => write!(f, "{tag}"),
            Value::Object(m) => write!(f, "{}({})", TypeTag::ObjectMutator, m.state().path()),
            Value::Sequence(m) => {
                write!(f, "{}({})", TypeTag::SequenceMutator, m.state().path())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
