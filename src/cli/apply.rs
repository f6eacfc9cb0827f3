//! Apply mutating expressions to a JSON document

use tracing::debug;

use super::CliError;
use crate::{DEFAULT_ROOT, Document, Env, EvalContext, Native, apply_expressions};

/// Options for the apply command
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// Expressions to run, in order
    pub expressions: Vec<String>,
    /// JSON input string
    pub input: Option<String>,
    /// Variable the document root is bound to
    pub root: String,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        ApplyOptions {
            expressions: Vec::new(),
            input: None,
            root: DEFAULT_ROOT.to_string(),
        }
    }
}

/// Runs every expression against the input and returns the mutated document.
///
/// The first failing expression aborts the run; no partial output is produced.
pub fn execute_apply(options: &ApplyOptions) -> Result<Native, CliError> {
    if options.expressions.is_empty() {
        return Err(CliError::NoExpressions);
    }
    let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
    let document = Document::new(serde_json::from_str(json_str)?);

    let env = Env::with_mutators(&options.root);
    let mut ctx = EvalContext::new();
    ctx.bind_root(&options.root, &document)?;

    let results = apply_expressions(&env, &ctx, &options.expressions)?;
    debug!(applied = results.len(), "expressions applied");

    // Release the mutators so the tree can be taken without a copy
    drop(ctx);
    Ok(document.into_inner())
}
