//! Evaluation options
//!
//! Options can be built in code, read from a TOML file, or overridden from the
//! environment:
//!
//! ```bash
//! # Allow deeper trees (0 disables the depth guard)
//! export DATATPL_MAX_DEPTH=5000
//!
//! # Fail on missing property references instead of defaulting
//! export DATATPL_STRICT=1
//!
//! # Parse numeric text instead of coercing every string to 1
//! export DATATPL_STRING_NUMBERS=parse
//! ```

use crate::coerce::StringNumberPolicy;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default evaluation depth limit
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// What a reference to an absent property resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPropertyPolicy {
    /// The zero value of the requested type: `""`, `0.0` or `false`
    #[default]
    Default,
    /// A `MissingProperty` error from checked evaluation
    Error,
}

/// Options controlling a single `Evaluator`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalOptions {
    /// Maximum evaluation depth (for recursion protection). `None` disables it.
    ///
    /// Default: 1000
    pub max_depth: Option<usize>,

    pub missing_property: MissingPropertyPolicy,

    pub string_numbers: StringNumberPolicy,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            max_depth: Some(DEFAULT_MAX_DEPTH),
            missing_property: MissingPropertyPolicy::Default,
            string_numbers: StringNumberPolicy::ConstantOne,
        }
    }
}

impl EvalOptions {
    /// Default options with environment overrides applied
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `DATATPL_*` environment overrides; unparseable values are ignored
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(depth) = std::env::var("DATATPL_MAX_DEPTH")
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
        {
            self.max_depth = (depth > 0).then_some(depth);
        }

        if let Ok(strict) = std::env::var("DATATPL_STRICT") {
            match strict.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => self.missing_property = MissingPropertyPolicy::Error,
                "0" | "false" | "no" => self.missing_property = MissingPropertyPolicy::Default,
                _ => {}
            }
        }

        if let Ok(policy) = std::env::var("DATATPL_STRING_NUMBERS") {
            match policy.trim().to_ascii_lowercase().as_str() {
                "parse" => self.string_numbers = StringNumberPolicy::Parse,
                "constant_one" => self.string_numbers = StringNumberPolicy::ConstantOne,
                _ => {}
            }
        }

        self
    }

    /// Parse options from TOML; absent keys keep their defaults
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Read options from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn strict(mut self) -> Self {
        self.missing_property = MissingPropertyPolicy::Error;
        self
    }

    pub fn with_string_numbers(mut self, policy: StringNumberPolicy) -> Self {
        self.string_numbers = policy;
        self
    }
}
