use std::{cmp::Ordering, collections::HashMap};

use regex::Regex;
use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};
use thiserror::Error;
use tracing::trace;

use crate::{
    ast::{BinOp, Expr},
    document::{Document, Native},
    env::Env,
    mutator::{Indexer, MutationError, ObjectMutator, SequenceMutator},
    value::{TypeTag, Value},
};

/// Receiver-style builtins and the argument count each takes.
pub const BUILTIN_METHODS: &[(&str, usize)] = &[
    ("size", 0),
    ("contains", 1),
    ("startsWith", 1),
    ("endsWith", 1),
    ("matches", 1),
];

/// Global builtins and the argument count each takes.
pub const GLOBAL_FUNCTIONS: &[(&str, usize)] = &[
    ("type", 1),
    ("int", 1),
    ("double", 1),
    ("string", 1),
    ("size", 1),
];

/// Variable bindings an expression runs against.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    variables: HashMap<String, Value>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: &str, value: Value) -> &mut Self {
        self.variables.insert(name.to_string(), value);
        self
    }

    /// Binds `name` to a mutator over the root of `document`.
    ///
    /// A mapping root becomes an `ObjectMutator`, a sequence root a
    /// `SequenceMutator`. Scalar roots cannot be mutated and are refused.
    pub fn bind_root(&mut self, name: &str, document: &Document) -> Result<&mut Self, MutationError> {
        let root = match &*document.cell().borrow() {
            Native::Array(_) => Value::Sequence(SequenceMutator::root(document)?),
            _ => Value::Object(ObjectMutator::root(document)?),
        };
        Ok(self.bind(name, root))
    }

    pub fn resolve(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }
}

/// Errors that can occur during evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error(transparent)]
    Mutation(#[from] MutationError),

    /// Type mismatch or invalid operation for the given type
    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("no such overload: {function} on {receiver}")]
    NoSuchOverload { function: String, receiver: String },

    #[error("invalid regex: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("repeated map key: {0}")]
    DuplicateKey(String),
}

fn no_such_overload(function: &str, receiver: &Value) -> EvalError {
    EvalError::NoSuchOverload {
        function: function.to_string(),
        receiver: receiver.type_tag().to_string(),
    }
}

/// Tree-walking evaluator over a checked expression.
pub struct Evaluator<'env> {
    env: &'env Env,
}

impl<'env> Evaluator<'env> {
    pub fn new(env: &'env Env) -> Self {
        Evaluator { env }
    }

    /// Evaluates `expr` against the bindings in `ctx`.
    ///
    /// # Examples
    ///
    /// ```
    /// use docmut::{Env, EvalContext, Evaluator, Value, parser};
    ///
    /// let env = Env::new();
    /// let expr = parser::parse("1 + 2.5").unwrap();
    /// let result = Evaluator::new(&env)
    ///     .eval_expression(&expr, &EvalContext::new())
    ///     .unwrap();
    /// assert_eq!(result, Value::Float(3.5));
    /// ```
    pub fn eval_expression(&self, expr: &Expr, ctx: &EvalContext) -> Result<Value, EvalError> {
        match expr {
            Expr::Float(n) => Ok(Value::Float(*n)),
            Expr::Integer(n) => Ok(Value::Integer(*n)),
            Expr::String(s) => Ok(Value::String(s.clone())),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Ident(name) => self.resolve(name, ctx),
            Expr::Member { object, field } => {
                let object = self.eval_expression(object, ctx)?;
                self.apply_access(&object, &Value::String(field.clone()))
            }
            Expr::Index { object, index } => {
                let object = self.eval_expression(object, ctx)?;
                let index = self.eval_expression(index, ctx)?;
                self.apply_access(&object, &index)
            }
            Expr::MethodCall {
                object,
                method,
                args,
            } => {
                let receiver = self.eval_expression(object, ctx)?;
                let args = self.eval_all(args, ctx)?;
                self.eval_method_call(&receiver, method, &args)
            }
            Expr::Call { function, args } => {
                let args = self.eval_all(args, ctx)?;
                self.eval_function_call(function, &args)
            }
            Expr::BinaryOp { op, left, right } => match op {
                BinOp::And => {
                    let left = self.eval_expression(left, ctx)?;
                    if !left.is_truthy() {
                        return Ok(Value::Boolean(false));
                    }
                    let right = self.eval_expression(right, ctx)?;
                    Ok(Value::Boolean(right.is_truthy()))
                }
                BinOp::Or => {
                    let left = self.eval_expression(left, ctx)?;
                    if left.is_truthy() {
                        return Ok(Value::Boolean(true));
                    }
                    let right = self.eval_expression(right, ctx)?;
                    Ok(Value::Boolean(right.is_truthy()))
                }
                _ => {
                    let left = self.eval_expression(left, ctx)?;
                    let right = self.eval_expression(right, ctx)?;
                    apply_binop(*op, &left, &right)
                }
            },
            Expr::Not(operand) => {
                let value = self.eval_expression(operand, ctx)?;
                Ok(Value::Boolean(!value.is_truthy()))
            }
            Expr::List(elements) => self.eval_all(elements, ctx).map(Value::List),
            Expr::Map(entries) => {
                let mut map = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = self.eval_expression(key, ctx)?;
                    for (existing, _) in &map {
                        if values_equal(existing, &key)? {
                            return Err(EvalError::DuplicateKey(key.to_string()));
                        }
                    }
                    let value = self.eval_expression(value, ctx)?;
                    map.push((key, value));
                }
                Ok(Value::Map(map))
            }
        }
    }

    fn eval_all(&self, exprs: &[Expr], ctx: &EvalContext) -> Result<Vec<Value>, EvalError> {
        exprs
            .iter()
            .map(|expr| self.eval_expression(expr, ctx))
            .collect()
    }

    /// Bound variables shadow declared type names.
    fn resolve(&self, name: &str, ctx: &EvalContext) -> Result<Value, EvalError> {
        if let Some(value) = ctx.resolve(name) {
            return Ok(value.clone());
        }
        self.env
            .resolve_type(name)
            .map(Value::Type)
            .ok_or_else(|| EvalError::UndefinedVariable(name.to_string()))
    }

    fn apply_access(&self, object: &Value, key: &Value) -> Result<Value, EvalError> {
        match (object, key) {
            (Value::Object(m), _) => Ok(m.get(key)?),
            (Value::Sequence(m), _) => Ok(m.get(key)?),
            (Value::Map(entries), _) => entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| MutationError::NotFound(key.to_string()).into()),
            (Value::List(items), Value::Integer(n)) => usize::try_from(*n)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or_else(|| {
                    MutationError::IndexOutOfBound {
                        index: *n,
                        len: items.len(),
                    }
                    .into()
                }),
            (Value::List(_), _) => Err(EvalError::TypeError(format!(
                "cannot index list with {}",
                key.type_tag()
            ))),
            _ => Err(EvalError::TypeError(format!(
                "cannot access {} with {} key",
                object.type_tag(),
                key.type_tag()
            ))),
        }
    }

    fn eval_method_call(
        &self,
        receiver: &Value,
        method: &str,
        args: &[Value],
    ) -> Result<Value, EvalError> {
        if let Some(overload) = self
            .env
            .find_overload(method, receiver.type_tag(), args.len())
        {
            trace!(overload = overload.id, "dispatching overload");
            return Ok(overload.invoke(receiver, args)?);
        }
        match (method, args) {
            ("size", []) => method_size(receiver),
            ("contains", [needle]) => method_contains(receiver, needle),
            ("startsWith", [Value::String(prefix)]) => match receiver {
                Value::String(s) => Ok(Value::Boolean(s.starts_with(prefix.as_str()))),
                _ => Err(no_such_overload(method, receiver)),
            },
            ("endsWith", [Value::String(suffix)]) => match receiver {
                Value::String(s) => Ok(Value::Boolean(s.ends_with(suffix.as_str()))),
                _ => Err(no_such_overload(method, receiver)),
            },
            ("matches", [Value::String(pattern)]) => match receiver {
                Value::String(s) => Ok(Value::Boolean(Regex::new(pattern)?.is_match(s))),
                _ => Err(no_such_overload(method, receiver)),
            },
            _ => Err(no_such_overload(method, receiver)),
        }
    }

    fn eval_function_call(&self, function: &str, args: &[Value]) -> Result<Value, EvalError> {
        let target = match (function, args) {
            ("type", [_]) => TypeTag::Type,
            ("int", [_]) => TypeTag::Int,
            ("double", [_]) => TypeTag::Double,
            ("string", [_]) => TypeTag::String,
            ("size", [value]) => return method_size(value),
            _ => {
                return Err(EvalError::TypeError(format!(
                    "{function}() takes 1 argument, got {}",
                    args.len()
                )));
            }
        };
        Ok(args[0].convert_to_type(target)?)
    }
}

fn method_size(receiver: &Value) -> Result<Value, EvalError> {
    let len = match receiver {
        Value::String(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Map(entries) => entries.len(),
        Value::Object(m) => m.len()?,
        Value::Sequence(m) => m.len()?,
        _ => return Err(no_such_overload("size", receiver)),
    };
    i64::try_from(len)
        .map(Value::Integer)
        .map_err(|_| EvalError::TypeError(format!("size {len} exceeds int range")))
}

fn method_contains(receiver: &Value, needle: &Value) -> Result<Value, EvalError> {
    match (receiver, needle) {
        (Value::String(s), Value::String(sub)) => Ok(Value::Boolean(s.contains(sub.as_str()))),
        (Value::List(items), _) => {
            for item in items {
                if values_equal(item, needle)? {
                    return Ok(Value::Boolean(true));
                }
            }
            Ok(Value::Boolean(false))
        }
        (Value::Map(entries), _) => {
            for (key, _) in entries {
                if values_equal(key, needle)? {
                    return Ok(Value::Boolean(true));
                }
            }
            Ok(Value::Boolean(false))
        }
        (Value::Object(m), Value::String(_)) => match m.get(needle) {
            Ok(_) => Ok(Value::Boolean(true)),
            Err(MutationError::NotFound(_)) => Ok(Value::Boolean(false)),
            Err(e) => Err(e.into()),
        },
        _ => Err(no_such_overload("contains", receiver)),
    }
}

/// Structural equality. Mutators have identity, not data, and refuse.
fn values_equal(left: &Value, right: &Value) -> Result<bool, EvalError> {
    match (left, right) {
        (Value::Object(_) | Value::Sequence(_), _) => Err(no_such_overload("_==_", left)),
        (_, Value::Object(_) | Value::Sequence(_)) => Err(no_such_overload("_==_", right)),
        (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
            Ok(*a as f64 == *b)
        }
        (Value::List(a), Value::List(b)) => {
            if a.len() != b.len() {
                return Ok(false);
            }
            for (x, y) in a.iter().zip(b) {
                if !values_equal(x, y)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Value::Map(a), Value::Map(b)) => {
            Ok(a.len() == b.len() && map_includes(a, b)? && map_includes(b, a)?)
        }
        _ => Ok(left == right),
    }
}

/// Whether every entry of `a` has an equal key with an equal value in `b`.
fn map_includes(a: &[(Value, Value)], b: &[(Value, Value)]) -> Result<bool, EvalError> {
    for (key, value) in a {
        let mut found = false;
        for (k, v) in b {
            if values_equal(key, k)? {
                found = values_equal(value, v)?;
                break;
            }
        }
        if !found {
            return Ok(false);
        }
    }
    Ok(true)
}

fn compare(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let ordering = match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => {
                return Err(EvalError::TypeError(format!(
                    "cannot compare {} {op} {}",
                    left.type_tag(),
                    right.type_tag()
                )));
            }
        },
    };
    // NaN compares false under every operator
    let Some(ordering) = ordering else {
        return Ok(Value::Boolean(false));
    };
    let result = match op {
        BinOp::LessThan => ordering == Ordering::Less,
        BinOp::GreaterThan => ordering == Ordering::Greater,
        BinOp::LessEqual => ordering != Ordering::Greater,
        _ => ordering != Ordering::Less,
    };
    Ok(Value::Boolean(result))
}

fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Integer(n) => Decimal::from_i64(*n),
        Value::Float(n) => Decimal::from_f64(*n),
        _ => None,
    }
}

/// Mixed int/float arithmetic, exact through `Decimal` when both operands
/// fit. Integral results come back as integers.
fn mixed_arith(op: BinOp, left: &Value, right: &Value, a: f64, b: f64) -> Value {
    if let Some(ad) = to_decimal(left)
        && let Some(bd) = to_decimal(right)
    {
        let rd = match op {
            BinOp::Add => ad.checked_add(bd),
            BinOp::Subtract => ad.checked_sub(bd),
            BinOp::Multiply => ad.checked_mul(bd),
            BinOp::Divide => ad.checked_div(bd),
            _ => ad.checked_rem(bd),
        };
        if let Some(rd) = rd {
            if rd.is_integer()
                && let Some(r) = rd.to_i64()
            {
                return Value::Integer(r);
            } else if let Some(r) = rd.to_f64() {
                return Value::Float(r);
            }
        }
    }
    Value::Float(float_arith(op, a, b))
}

fn float_arith(op: BinOp, a: f64, b: f64) -> f64 {
    match op {
        BinOp::Add => a + b,
        BinOp::Subtract => a - b,
        BinOp::Multiply => a * b,
        BinOp::Divide => a / b,
        _ => a % b,
    }
}

fn int_arith(op: BinOp, a: i64, b: i64) -> Result<Value, EvalError> {
    if matches!(op, BinOp::Divide | BinOp::Modulo) && b == 0 {
        return Err(EvalError::DivisionByZero);
    }
    let result = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Subtract => a.checked_sub(b),
        BinOp::Multiply => a.checked_mul(b),
        // Inexact division falls back to a float
        BinOp::Divide if a.checked_rem(b) != Some(0) => {
            return Ok(Value::Float(a as f64 / b as f64));
        }
        BinOp::Divide => a.checked_div(b),
        _ => a.checked_rem(b),
    };
    result
        .map(Value::Integer)
        .ok_or_else(|| EvalError::TypeError(format!("integer overflow in {a} {op} {b}")))
}

fn arith(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if matches!(op, BinOp::Divide | BinOp::Modulo) && right.as_float() == Some(0.0) {
        return Err(EvalError::DivisionByZero);
    }
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => int_arith(op, *a, *b),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float_arith(op, *a, *b))),
        (Value::Integer(a), Value::Float(b)) => Ok(mixed_arith(op, left, right, *a as f64, *b)),
        (Value::Float(a), Value::Integer(b)) => Ok(mixed_arith(op, left, right, *a, *b as f64)),
        (Value::String(a), Value::String(b)) if op == BinOp::Add => {
            Ok(Value::String(format!("{a}{b}")))
        }
        (Value::List(a), Value::List(b)) if op == BinOp::Add => {
            Ok(Value::List(a.iter().chain(b).cloned().collect()))
        }
        (a, b) => Err(EvalError::TypeError(format!(
            "cannot apply {} {op} {}",
            a.type_tag(),
            b.type_tag()
        ))),
    }
}

fn apply_binop(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinOp::Add | BinOp::Subtract | BinOp::Multiply | BinOp::Divide | BinOp::Modulo => {
            arith(op, left, right)
        }
        BinOp::Equal => values_equal(left, right).map(Value::Boolean),
        BinOp::NotEqual => values_equal(left, right).map(|eq| Value::Boolean(!eq)),
        BinOp::LessThan | BinOp::GreaterThan | BinOp::LessEqual | BinOp::GreaterEqual => {
            compare(op, left, right)
        }
        BinOp::And => Ok(Value::Boolean(left.is_truthy() && right.is_truthy())),
        BinOp::Or => Ok(Value::Boolean(left.is_truthy() || right.is_truthy())),
    }
}
