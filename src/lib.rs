//! Mutation-capable document proxies for an embedded expression language.
//!
//! A [`Document`] holds a JSON tree. Binding it into an [`EvalContext`]
//! exposes its root as a mutator, and expressions compiled by an [`Env`]
//! can navigate it (`object.spec.containers[0]`), merge patches into it
//! (`object.spec.merge({"replicas": 3})`) and remove nodes from it
//! (`object.spec.containers[1].remove()`).

pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod document;
pub mod env;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod mutator;
pub mod parser;
pub mod value;

pub use ast::{BinOp, Expr, Token};
pub use document::{Document, Mapping, Native, Sequence};
pub use env::{
    Binding, CheckError, CompileError, DEFAULT_ROOT, Env, ExpressionError, ExpressionErrorKind,
    Overload, Program, apply_expressions,
};
pub use evaluator::{EvalContext, EvalError, Evaluator};
pub use lexer::{LexError, Lexer};
pub use mutator::{
    Container, Identifier, Indexer, Mutable, MutationError, Mutator, Node, ObjectMutator,
    SequenceMutator,
};
pub use parser::{ParseError, Parser};
pub use value::{TypeTag, Value};
