//! Error types and formatting for datatpl
//!
//! Evaluation itself is total; these errors only surface through the checked
//! entry points (`Evaluator::try_evaluate_as`) and configuration loading.

use colored::Colorize;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a checked evaluation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("evaluation depth {depth} exceeds maximum of {max_depth}")]
    DepthExceeded { depth: usize, max_depth: usize },

    #[error("property '{name}' is not present")]
    MissingProperty { name: String },
}

/// Failure to load evaluation options
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read options file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid options: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Format an evaluation error with a hint for the terminal
pub fn format_eval_error(error: &EvalError) -> String {
    let mut output = format!("{} {}\n", "Evaluation error:".red().bold(), error);

    let hint = match error {
        EvalError::DepthExceeded { .. } => {
            "Raise the limit with --max-depth, or flatten the expression tree"
        }
        EvalError::MissingProperty { .. } => {
            "Strict mode is on; wrap the reference in property_or to supply a default"
        }
    };
    output.push_str(&format!("  {} {}\n", "Hint:".yellow().bold(), hint));

    output
}
