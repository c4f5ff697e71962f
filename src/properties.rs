//! Property bags evaluated against
//!
//! The evaluator only ever reads from a property bag, through [`Properties`].
//! Maps keyed by `String` and map values implement it out of the box.

use crate::ast::Value;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// The usual property bag: attribute name to value
pub type PropertyMap = HashMap<String, Value>;

/// Read-only lookup of named attribute values
pub trait Properties {
    fn get_property(&self, name: &str) -> Option<&Value>;

    fn has_property(&self, name: &str) -> bool {
        self.get_property(name).is_some()
    }
}

impl<S: BuildHasher> Properties for HashMap<String, Value, S> {
    fn get_property(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl Properties for BTreeMap<String, Value> {
    fn get_property(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

/// A `Value::Map` is a property bag; any other value has no properties.
impl Properties for Value {
    fn get_property(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(name),
            _ => None,
        }
    }
}

impl<P: Properties + ?Sized> Properties for &P {
    fn get_property(&self, name: &str) -> Option<&Value> {
        (**self).get_property(name)
    }
}
