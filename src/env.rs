//! Evaluation environment: declared variables, declared types and function
//! overloads, plus the static checker that validates expressions against them.

use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use crate::{
    ast::Expr,
    evaluator::{BUILTIN_METHODS, EvalContext, EvalError, Evaluator, GLOBAL_FUNCTIONS},
    functions,
    mutator::MutationError,
    parser::{self, ParseError},
    value::{TypeTag, Value},
};

/// Name the root document is bound to unless configured otherwise.
pub const DEFAULT_ROOT: &str = "object";

/// Native implementation of one overload.
#[derive(Debug, Clone, Copy)]
pub enum Binding {
    /// Receiver only
    Unary(fn(&Value) -> Result<Value, MutationError>),
    /// Receiver and one argument
    Binary(fn(&Value, &Value) -> Result<Value, MutationError>),
}

/// A receiver-style function bound to one receiver type.
#[derive(Debug, Clone)]
pub struct Overload {
    pub id: &'static str,
    pub function: &'static str,
    pub receiver: TypeTag,
    pub binding: Binding,
}

impl Overload {
    /// Number of arguments besides the receiver.
    pub fn arity(&self) -> usize {
        match self.binding {
            Binding::Unary(_) => 0,
            Binding::Binary(_) => 1,
        }
    }

    pub fn invoke(&self, receiver: &Value, args: &[Value]) -> Result<Value, MutationError> {
        match (self.binding, args) {
            (Binding::Unary(f), []) => f(receiver),
            (Binding::Binary(f), [arg]) => f(receiver, arg),
            _ => Err(MutationError::UnsupportedOperation(format!(
                "{} takes {} argument(s), got {}",
                self.id,
                self.arity(),
                args.len()
            ))),
        }
    }
}

/// Static check failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckError {
    #[error("undeclared reference to '{0}'")]
    UndeclaredReference(String),

    #[error("undeclared function '{0}'")]
    UnknownFunction(String),

    #[error("function '{function}' takes {expected:?} argument(s), got {found}")]
    ArityMismatch {
        function: String,
        expected: Vec<usize>,
        found: usize,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Check error: {0}")]
    Check(#[from] CheckError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionErrorKind {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),
}

/// Failure of one expression in a batch.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("expression #{index} `{expression}`: {kind}")]
pub struct ExpressionError {
    pub index: usize,
    pub expression: String,
    #[source]
    pub kind: ExpressionErrorKind,
}

/// Declarations an expression is checked and evaluated against.
#[derive(Debug, Clone, Default)]
pub struct Env {
    variables: HashSet<String>,
    types: Vec<TypeTag>,
    overloads: Vec<Overload>,
}

impl Env {
    /// An empty environment: only builtins resolve.
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment for mutating expressions.
    ///
    /// Declares `root` as a variable, both mutator types, and the `merge` /
    /// `remove` overloads for each of them.
    ///
    /// # Examples
    ///
    /// ```
    /// use docmut::{Document, Env, EvalContext};
    /// use serde_json::json;
    ///
    /// let document = Document::new(json!({"spec": {"replicas": 1}}));
    /// let env = Env::with_mutators("object");
    /// let mut ctx = EvalContext::new();
    /// ctx.bind_root("object", &document).unwrap();
    ///
    /// let program = env.compile("object.spec.merge({\"replicas\": 3})").unwrap();
    /// program.eval(&ctx).unwrap();
    /// drop(ctx);
    ///
    /// assert_eq!(document.into_inner(), json!({"spec": {"replicas": 3}}));
    /// ```
    pub fn with_mutators(root: &str) -> Self {
        let mut env = Env::new();
        env.declare_variable(root);
        env.declare_type(TypeTag::ObjectMutator);
        env.declare_type(TypeTag::SequenceMutator);
        for overload in functions::mutator_overloads() {
            env.add_overload(overload);
        }
        env
    }

    pub fn declare_variable(&mut self, name: &str) -> &mut Self {
        self.variables.insert(name.to_string());
        self
    }

    pub fn declare_type(&mut self, tag: TypeTag) -> &mut Self {
        if !self.types.contains(&tag) {
            self.types.push(tag);
        }
        self
    }

    pub fn add_overload(&mut self, overload: Overload) -> &mut Self {
        self.overloads.push(overload);
        self
    }

    pub fn is_variable(&self, name: &str) -> bool {
        self.variables.contains(name)
    }

    /// A declared type usable as an identifier, e.g. `ObjectMutator`.
    pub fn resolve_type(&self, name: &str) -> Option<TypeTag> {
        self.types.iter().copied().find(|tag| tag.name() == name)
    }

    pub fn find_overload(&self, function: &str, receiver: TypeTag, arity: usize) -> Option<&Overload> {
        self.overloads
            .iter()
            .find(|o| o.function == function && o.receiver == receiver && o.arity() == arity)
    }

    /// Argument counts a method name accepts, declared or builtin.
    fn method_arities(&self, method: &str) -> Vec<usize> {
        let mut arities: Vec<usize> = self
            .overloads
            .iter()
            .filter(|o| o.function == method)
            .map(Overload::arity)
            .chain(
                BUILTIN_METHODS
                    .iter()
                    .filter(|(name, _)| *name == method)
                    .map(|(_, arity)| *arity),
            )
            .collect();
        arities.sort_unstable();
        arities.dedup();
        arities
    }

    /// Verifies that every reference and call in `expr` is declared.
    pub fn check(&self, expr: &Expr) -> Result<(), CheckError> {
        match expr {
            Expr::Float(_)
            | Expr::Integer(_)
            | Expr::String(_)
            | Expr::Boolean(_)
            | Expr::Null => Ok(()),
            Expr::Ident(name) => {
                if self.is_variable(name) || self.resolve_type(name).is_some() {
                    Ok(())
                } else {
                    Err(CheckError::UndeclaredReference(name.clone()))
                }
            }
            Expr::Member { object, .. } => self.check(object),
            Expr::Index { object, index } => {
                self.check(object)?;
                self.check(index)
            }
            Expr::MethodCall {
                object,
                method,
                args,
            } => {
                self.check(object)?;
                self.check_all(args)?;
                let arities = self.method_arities(method);
                check_arity(method, arities, args.len())
            }
            Expr::Call { function, args } => {
                self.check_all(args)?;
                let arities = GLOBAL_FUNCTIONS
                    .iter()
                    .filter(|(name, _)| name == function)
                    .map(|(_, arity)| *arity)
                    .collect();
                check_arity(function, arities, args.len())
            }
            Expr::BinaryOp { left, right, .. } => {
                self.check(left)?;
                self.check(right)
            }
            Expr::Not(operand) => self.check(operand),
            Expr::List(elements) => self.check_all(elements),
            Expr::Map(entries) => entries.iter().try_for_each(|(key, value)| {
                self.check(key)?;
                self.check(value)
            }),
        }
    }

    fn check_all(&self, exprs: &[Expr]) -> Result<(), CheckError> {
        exprs.iter().try_for_each(|expr| self.check(expr))
    }

    /// Parses and checks `source`.
    pub fn compile(&self, source: &str) -> Result<Program<'_>, CompileError> {
        let expr = parser::parse(source)?;
        self.check(&expr)?;
        Ok(Program { env: self, expr })
    }
}

fn check_arity(function: &str, expected: Vec<usize>, found: usize) -> Result<(), CheckError> {
    if expected.is_empty() {
        return Err(CheckError::UnknownFunction(function.to_string()));
    }
    if !expected.contains(&found) {
        return Err(CheckError::ArityMismatch {
            function: function.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

/// A checked expression ready to run.
#[derive(Debug, Clone)]
pub struct Program<'env> {
    env: &'env Env,
    expr: Expr,
}

impl Program<'_> {
    pub fn eval(&self, ctx: &EvalContext) -> Result<Value, EvalError> {
        Evaluator::new(self.env).eval_expression(&self.expr, ctx)
    }
}

/// Compiles and runs `expressions` in order against the bindings in `ctx`.
///
/// Stops at the first failure. Mutations made by earlier expressions (and by
/// the failing one, up to its failure) stay in the document.
pub fn apply_expressions<S: AsRef<str>>(
    env: &Env,
    ctx: &EvalContext,
    expressions: &[S],
) -> Result<Vec<Value>, ExpressionError> {
    let mut results = Vec::with_capacity(expressions.len());
    for (index, expression) in expressions.iter().enumerate() {
        let expression = expression.as_ref();
        let fail = |kind: ExpressionErrorKind| ExpressionError {
            index,
            expression: expression.to_string(),
            kind,
        };
        debug!(index, expression, "applying expression");
        let program = env.compile(expression).map_err(|e| fail(e.into()))?;
        let value = program.eval(ctx).map_err(|e| fail(e.into()))?;
        results.push(value);
    }
    Ok(results)
}
