//! datatpl - data templates for per-feature attributes
//!
//! Small declarative expressions evaluated against a key/value property bag,
//! with the result coerced to a requested type (string, number or bool).
//! Map renderers and templating systems use this to compute things like label
//! text or symbol size from generic attribute data.
//!
//! ```
//! use datatpl::{evaluate_as, Expression, PropertyMap, Value};
//!
//! let mut props = PropertyMap::new();
//! props.insert("name".to_string(), Value::from("Main St"));
//!
//! let label = Expression::concat([
//!     Expression::property_or("name", "unnamed"),
//!     Expression::literal(" ("),
//!     Expression::length(Expression::property("name")),
//!     Expression::literal(")"),
//! ]);
//! assert_eq!(evaluate_as::<String, _>(&label, &props), "Main St (7)");
//! ```
//!
//! Evaluation is total: absent properties and values of the wrong shape
//! resolve to zero-like defaults rather than errors. [`Evaluator`] adds a
//! depth guard and an optional strict mode reported through
//! [`Evaluator::try_evaluate_as`].

pub mod ast;
pub mod coerce;
pub mod error;
pub mod evaluator;
pub mod options;
pub mod properties;

// Re-export commonly used types
pub use ast::{ArithmeticOperator, Expression, TypeKind, Value};
pub use coerce::{coerce, Coerce, StringNumberPolicy};
pub use error::{ConfigError, EvalError};
pub use evaluator::{evaluate_as, Evaluator};
pub use options::{EvalOptions, MissingPropertyPolicy};
pub use properties::{Properties, PropertyMap};

/// datatpl version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
