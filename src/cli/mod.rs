//! CLI support for docmut
//!
//! Provides programmatic access to the `apply` and `check` commands for
//! embedding in other tools.

mod apply;
mod check;

pub use apply::{ApplyOptions, execute_apply};
pub use check::{CheckOptions, execute_check};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    /// An expression failed to compile or evaluate
    #[error(transparent)]
    Expression(#[from] crate::ExpressionError),

    /// The input document root cannot be bound
    #[error("Cannot bind document root: {0}")]
    Mutation(#[from] crate::MutationError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,

    #[error("No expressions given. Use -e EXPR at least once.")]
    NoExpressions,
}
