//! Expression tree and value definitions for datatpl
//!
//! This module defines the runtime data model (`Value`) that property bags and
//! literals are expressed in, and the closed set of expression nodes evaluated
//! against those property bags.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Value representation (attribute data)
///
/// Serializes as plain data: `null`, booleans, numbers, strings, arrays and
/// objects map onto the corresponding arms. Non-negative integers become
/// `UInt`, negative integers `Int`, everything else numeric `Float`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    UInt(u64),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if value is any of the numeric arms
    pub fn is_number(&self) -> bool {
        matches!(self, Value::UInt(_) | Value::Int(_) | Value::Float(_))
    }

    /// Short name of the value's arm, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::UInt(_) => "uint",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt(u64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(map: HashMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Kinds a property value can be tested against with `PropertyIs`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Null,
    /// Any of unsigned, signed or floating point
    Number,
    String,
    Boolean,
    Array,
    Map,
}

impl TypeKind {
    /// Whether `value` is of this kind
    pub fn matches(self, value: &Value) -> bool {
        match self {
            TypeKind::Null => value.is_null(),
            TypeKind::Number => value.is_number(),
            TypeKind::String => matches!(value, Value::Str(_)),
            TypeKind::Boolean => matches!(value, Value::Bool(_)),
            TypeKind::Array => matches!(value, Value::List(_)),
            TypeKind::Map => matches!(value, Value::Map(_)),
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Null => write!(f, "null"),
            TypeKind::Number => write!(f, "number"),
            TypeKind::String => write!(f, "string"),
            TypeKind::Boolean => write!(f, "boolean"),
            TypeKind::Array => write!(f, "array"),
            TypeKind::Map => write!(f, "map"),
        }
    }
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOperator {
    Add,      // +
    Subtract, // -
    Multiply, // *
    Divide,   // /
}

impl ArithmeticOperator {
    /// Apply the operator with IEEE-754 semantics (x / 0 is ±inf or NaN)
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            ArithmeticOperator::Add => left + right,
            ArithmeticOperator::Subtract => left - right,
            ArithmeticOperator::Multiply => left * right,
            ArithmeticOperator::Divide => left / right,
        }
    }
}

/// Expression (computes a value from a property bag)
///
/// Every composite node exclusively owns its children, so trees are finite
/// and acyclic by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    /// Literal value
    Literal(Value),

    /// Property reference: the named value, or the zero value when absent
    Property(String),

    /// Whether the named property is present
    HasProperty(String),

    /// Whether the named property is present and of the given kind
    PropertyIs { name: String, kind: TypeKind },

    /// The named property if present, otherwise `fallback` evaluated in its place
    PropertyOr {
        name: String,
        fallback: Box<Expression>,
    },

    /// String concatenation of every part
    Concat(Vec<Expression>),

    /// Length in UTF-8 bytes of the string form of the operand
    Length(Box<Expression>),

    /// Floating point arithmetic: `a + b`, `a / b`, etc.
    Binary {
        op: ArithmeticOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Conditional: only the selected branch is evaluated
    Conditional {
        condition: Box<Expression>,
        then_expr: Box<Expression>,
        else_expr: Box<Expression>,
    },
}

impl Expression {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn property(name: impl Into<String>) -> Self {
        Expression::Property(name.into())
    }

    pub fn has_property(name: impl Into<String>) -> Self {
        Expression::HasProperty(name.into())
    }

    pub fn property_is(name: impl Into<String>, kind: TypeKind) -> Self {
        Expression::PropertyIs {
            name: name.into(),
            kind,
        }
    }

    pub fn property_or(name: impl Into<String>, fallback: impl Into<Expression>) -> Self {
        Expression::PropertyOr {
            name: name.into(),
            fallback: Box::new(fallback.into()),
        }
    }

    pub fn concat<I, E>(parts: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expression>,
    {
        Expression::Concat(parts.into_iter().map(Into::into).collect())
    }

    pub fn length(of: impl Into<Expression>) -> Self {
        Expression::Length(Box::new(of.into()))
    }

    pub fn binary(
        op: ArithmeticOperator,
        left: impl Into<Expression>,
        right: impl Into<Expression>,
    ) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left.into()),
            right: Box::new(right.into()),
        }
    }

    pub fn add(left: impl Into<Expression>, right: impl Into<Expression>) -> Self {
        Self::binary(ArithmeticOperator::Add, left, right)
    }

    pub fn subtract(left: impl Into<Expression>, right: impl Into<Expression>) -> Self {
        Self::binary(ArithmeticOperator::Subtract, left, right)
    }

    pub fn multiply(left: impl Into<Expression>, right: impl Into<Expression>) -> Self {
        Self::binary(ArithmeticOperator::Multiply, left, right)
    }

    pub fn divide(left: impl Into<Expression>, right: impl Into<Expression>) -> Self {
        Self::binary(ArithmeticOperator::Divide, left, right)
    }

    pub fn conditional(
        condition: impl Into<Expression>,
        then_expr: impl Into<Expression>,
        else_expr: impl Into<Expression>,
    ) -> Self {
        Expression::Conditional {
            condition: Box::new(condition.into()),
            then_expr: Box::new(then_expr.into()),
            else_expr: Box::new(else_expr.into()),
        }
    }

    /// Name of the node kind, for logs and diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expression::Literal(_) => "literal",
            Expression::Property(_) => "property",
            Expression::HasProperty(_) => "has_property",
            Expression::PropertyIs { .. } => "property_is",
            Expression::PropertyOr { .. } => "property_or",
            Expression::Concat(_) => "concat",
            Expression::Length(_) => "length",
            Expression::Binary { op, .. } => match op {
                ArithmeticOperator::Add => "add",
                ArithmeticOperator::Subtract => "subtract",
                ArithmeticOperator::Multiply => "multiply",
                ArithmeticOperator::Divide => "divide",
            },
            Expression::Conditional { .. } => "conditional",
        }
    }

    /// Direct children of this node, in evaluation order
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::Literal(_)
            | Expression::Property(_)
            | Expression::HasProperty(_)
            | Expression::PropertyIs { .. } => Vec::new(),
            Expression::PropertyOr { fallback, .. } => vec![fallback.as_ref()],
            Expression::Concat(parts) => parts.iter().collect(),
            Expression::Length(of) => vec![of.as_ref()],
            Expression::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Expression::Conditional {
                condition,
                then_expr,
                else_expr,
            } => vec![condition.as_ref(), then_expr.as_ref(), else_expr.as_ref()],
        }
    }

    /// Longest root-to-leaf path; a leaf has depth 1
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(Expression::depth)
            .max()
            .unwrap_or(0)
    }

    /// Total number of nodes in the tree
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(Expression::node_count)
            .sum::<usize>()
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Expression::Literal(value)
    }
}

impl From<&str> for Expression {
    fn from(v: &str) -> Self {
        Expression::Literal(v.into())
    }
}

impl From<String> for Expression {
    fn from(v: String) -> Self {
        Expression::Literal(v.into())
    }
}

impl From<bool> for Expression {
    fn from(v: bool) -> Self {
        Expression::Literal(v.into())
    }
}

impl From<u64> for Expression {
    fn from(v: u64) -> Self {
        Expression::Literal(v.into())
    }
}

impl From<i64> for Expression {
    fn from(v: i64) -> Self {
        Expression::Literal(v.into())
    }
}

impl From<f64> for Expression {
    fn from(v: f64) -> Self {
        Expression::Literal(v.into())
    }
}
