//! Validate expressions without running them

use super::CliError;
use crate::{DEFAULT_ROOT, Env, ExpressionError, ExpressionErrorKind};

/// Options for the check command
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Expressions to validate
    pub expressions: Vec<String>,
    /// Variable the document root would be bound to
    pub root: String,
}

impl Default for CheckOptions {
    fn default() -> Self {
        CheckOptions {
            expressions: Vec::new(),
            root: DEFAULT_ROOT.to_string(),
        }
    }
}

/// Parses and checks every expression against the mutation environment.
pub fn execute_check(options: &CheckOptions) -> Result<(), CliError> {
    if options.expressions.is_empty() {
        return Err(CliError::NoExpressions);
    }
    let env = Env::with_mutators(&options.root);
    for (index, expression) in options.expressions.iter().enumerate() {
        env.compile(expression).map_err(|e| ExpressionError {
            index,
            expression: expression.clone(),
            kind: ExpressionErrorKind::Compile(e),
        })?;
    }
    Ok(())
}
