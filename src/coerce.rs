//! Value coercion to the three result types: string, number (f64) and bool
//!
//! Coercion is total. Every (value kind, target type) pair has a defined
//! result; "wrong shape" resolves to a zero-like value instead of failing.
//!
//! | value  | string                  | number                 | bool              |
//! |--------|-------------------------|------------------------|-------------------|
//! | null   | `""`                    | `0`                    | `false`           |
//! | bool   | `"true"` / `"false"`    | `1` / `0`              | itself            |
//! | uint   | decimal text            | itself                 | `!= 0`            |
//! | int    | decimal text            | itself                 | `!= 0`            |
//! | float  | shortest decimal text   | itself                 | `!= 0.0`          |
//! | string | itself                  | see [`StringNumberPolicy`] | non-empty     |
//! | list   | elements joined, no separator | string form, then string rule | string form non-empty |
//! | map    | `""`                    | entry count            | non-empty         |

use crate::ast::Value;
use serde::{Deserialize, Serialize};

/// How numeric coercion treats text (strings, and lists via their string form)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringNumberPolicy {
    /// Every string coerces to `1.0` regardless of content. This is the
    /// historical behavior of mapbox `datatpl`, where text was never parsed.
    #[default]
    ConstantOne,
    /// Parse the trimmed text as a float; unparseable text yields `0.0`.
    Parse,
}

impl StringNumberPolicy {
    pub fn apply(self, text: &str) -> f64 {
        match self {
            StringNumberPolicy::ConstantOne => 1.0,
            StringNumberPolicy::Parse => text.trim().parse().unwrap_or(0.0),
        }
    }
}

/// Coerce a value to its string form
///
/// Floats use Rust's shortest round-trip `Display` form, so `3.145` renders
/// as `"3.145"` (not C's `"3.145000"`), `4.0` as `"4"` and infinity as `"inf"`.
pub fn to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Str(s) => s.clone(),
        Value::List(items) => items.iter().map(to_string).collect(),
        // Maps have no string form
        Value::Map(_) => String::new(),
    }
}

/// Coerce a value to a float
pub fn to_number(value: &Value, policy: StringNumberPolicy) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::UInt(u) => *u as f64,
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        Value::Str(s) => policy.apply(s),
        Value::List(_) => policy.apply(&to_string(value)),
        Value::Map(m) => m.len() as f64,
    }
}

/// Coerce a value to a bool (truthiness)
pub fn to_bool(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::UInt(u) => *u != 0,
        Value::Int(i) => *i != 0,
        // NaN is truthy: it compares unequal to zero
        Value::Float(f) => *f != 0.0,
        Value::Str(s) => !s.is_empty(),
        Value::List(_) => !to_string(value).is_empty(),
        Value::Map(m) => !m.is_empty(),
    }
}

/// A result type an expression can be evaluated as
///
/// `Default::default()` is the zero-like value used when a property is absent.
pub trait Coerce: Sized + Default {
    /// Short name of the target type, for logs
    const TYPE_NAME: &'static str;

    fn coerce(value: &Value, policy: StringNumberPolicy) -> Self;
}

impl Coerce for String {
    const TYPE_NAME: &'static str = "string";

    fn coerce(value: &Value, _policy: StringNumberPolicy) -> Self {
        to_string(value)
    }
}

impl Coerce for f64 {
    const TYPE_NAME: &'static str = "number";

    fn coerce(value: &Value, policy: StringNumberPolicy) -> Self {
        to_number(value, policy)
    }
}

impl Coerce for bool {
    const TYPE_NAME: &'static str = "bool";

    fn coerce(value: &Value, _policy: StringNumberPolicy) -> Self {
        to_bool(value)
    }
}

/// Coerce a value to `T` with the default string-number policy
pub fn coerce<T: Coerce>(value: &Value) -> T {
    T::coerce(value, StringNumberPolicy::default())
}
