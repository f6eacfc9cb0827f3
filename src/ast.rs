//! # Abstract Syntax Tree
//!
//! Expressions are CEL-like: a root variable, member access, indexing and
//! method calls, plus literals and the usual operators.
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals, access, calls, operations)
//! - **[operators]** - Binary operators (comparison, arithmetic, logical)
//!
//! ## Quick Start
//!
//! ```text
//! object.spec.merge({"replicas": object.spec.replicas + 1})
//! ```
//!
//! Navigates to `spec` and merges a patch into it.
//!
//! ## Access
//!
//! - `a.b` and `a["b"]` are the same member access
//! - `a[0]` indexes a sequence or a list literal
//! - `a.f(x)` calls function `f` with receiver `a`
//! - `f(x)` calls a global function (`type`, `int`, `double`, `string`)
//!
//! ## Examples
//!
//! ```text
//! object.items.merge(["b", "c"])
//! object.spec.template.containers[1].remove()
//! type(object.spec) == ObjectMutator
//! ```
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::Expr;
pub use operators::BinOp;
pub use tokens::Token;
