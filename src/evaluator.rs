//! Evaluator for datatpl - walks an expression against a property bag
//!
//! Evaluation is a depth-first recursion parameterized by the requested
//! result type. Value-producing nodes (literals, property lookups, predicates,
//! concat, length, arithmetic) compute a primitive result and coerce it to the
//! requested type. Selecting nodes (`PropertyOr`, `Conditional`) instead
//! re-enter evaluation on the chosen child, so the requested type flows through
//! unchanged and the rejected branch is never touched.

use crate::ast::{Expression, Value};
use crate::coerce::Coerce;
use crate::error::EvalError;
use crate::options::{EvalOptions, MissingPropertyPolicy};
use crate::properties::Properties;
use tracing::{debug, trace, warn};

/// Evaluator context
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator {
    options: EvalOptions,
}

impl Evaluator {
    /// Create an evaluator with default options
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EvalOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    /// Evaluate `expr` as `T`. Never fails.
    ///
    /// With the default options nothing can go wrong short of exceeding the
    /// depth guard. Any checked failure is logged and resolved to `T`'s zero
    /// value, the same default an absent property gets.
    pub fn evaluate_as<T, P>(&self, expr: &Expression, properties: &P) -> T
    where
        T: Coerce,
        P: Properties + ?Sized,
    {
        self.try_evaluate_as(expr, properties).unwrap_or_else(|err| {
            warn!(error = %err, target_type = T::TYPE_NAME, "evaluation fell back to default");
            T::default()
        })
    }

    /// Evaluate `expr` as `T`, reporting depth-guard and strict-mode failures
    pub fn try_evaluate_as<T, P>(&self, expr: &Expression, properties: &P) -> Result<T, EvalError>
    where
        T: Coerce,
        P: Properties + ?Sized,
    {
        self.eval(expr, properties, 1)
    }

    fn eval<T, P>(&self, expr: &Expression, properties: &P, depth: usize) -> Result<T, EvalError>
    where
        T: Coerce,
        P: Properties + ?Sized,
    {
        self.check_depth(depth)?;
        ensure_sufficient_stack(|| self.eval_node(expr, properties, depth))
    }

    fn eval_node<T, P>(
        &self,
        expr: &Expression,
        properties: &P,
        depth: usize,
    ) -> Result<T, EvalError>
    where
        T: Coerce,
        P: Properties + ?Sized,
    {
        trace!(
            kind = expr.kind_name(),
            target_type = T::TYPE_NAME,
            depth,
            "evaluating"
        );

        match expr {
            Expression::Literal(value) => Ok(self.coerce(value)),

            Expression::Property(name) => match properties.get_property(name) {
                Some(value) => Ok(self.coerce(value)),
                None => match self.options.missing_property {
                    MissingPropertyPolicy::Default => Ok(T::default()),
                    MissingPropertyPolicy::Error => {
                        Err(EvalError::MissingProperty { name: name.clone() })
                    }
                },
            },

            Expression::HasProperty(name) => {
                Ok(self.coerce(&Value::Bool(properties.has_property(name))))
            }

            Expression::PropertyIs { name, kind } => {
                let matched = properties
                    .get_property(name)
                    .is_some_and(|value| kind.matches(value));
                Ok(self.coerce(&Value::Bool(matched)))
            }

            Expression::PropertyOr { name, fallback } => match properties.get_property(name) {
                Some(value) => {
                    debug!(property = %name, "property present, fallback skipped");
                    // The found value takes the place of a literal node
                    self.check_depth(depth + 1)?;
                    Ok(self.coerce(value))
                }
                None => {
                    debug!(property = %name, "property absent, evaluating fallback");
                    self.eval(fallback, properties, depth + 1)
                }
            },

            Expression::Concat(parts) => {
                let mut result = String::new();
                for part in parts {
                    result.push_str(&self.eval::<String, P>(part, properties, depth + 1)?);
                }
                Ok(self.coerce(&Value::Str(result)))
            }

            Expression::Length(of) => {
                let text: String = self.eval(of, properties, depth + 1)?;
                // Length in UTF-8 bytes
                Ok(self.coerce(&Value::UInt(text.len() as u64)))
            }

            Expression::Binary { op, left, right } => {
                let left: f64 = self.eval(left, properties, depth + 1)?;
                let right: f64 = self.eval(right, properties, depth + 1)?;
                Ok(self.coerce(&Value::Float(op.apply(left, right))))
            }

            Expression::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                let selected = self.eval::<bool, P>(condition, properties, depth + 1)?;
                debug!(selected, "conditional branch chosen");
                let branch = if selected { then_expr } else { else_expr };
                self.eval(branch, properties, depth + 1)
            }
        }
    }

    fn check_depth(&self, depth: usize) -> Result<(), EvalError> {
        match self.options.max_depth {
            Some(max_depth) if depth > max_depth => {
                Err(EvalError::DepthExceeded { depth, max_depth })
            }
            _ => Ok(()),
        }
    }

    fn coerce<T: Coerce>(&self, value: &Value) -> T {
        T::coerce(value, self.options.string_numbers)
    }
}

/// Minimum stack space to keep available before recursing (100KB red zone)
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB)
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f` with at least `RED_ZONE` bytes of stack, growing it if needed.
///
/// Debug-build frames are large enough that a tree at the default depth
/// limit would otherwise overflow a 2MB thread stack.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

/// Evaluate `expr` as `T` against `properties` with default options
pub fn evaluate_as<T, P>(expr: &Expression, properties: &P) -> T
where
    T: Coerce,
    P: Properties + ?Sized,
{
    Evaluator::new().evaluate_as(expr, properties)
}
