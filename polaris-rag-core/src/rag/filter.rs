//! Metadata filters for similarity search.
//!
//! A [`Filter`] is evaluated against a document's [`Metadata`]. Only
//! documents that match are considered as search candidates, so a filtered
//! search still returns up to `k` results when enough documents match.
//!
//! ```
//! # use polaris_rag_core::rag::Filter;
//! let filter = Filter::field("source").eq("handbook")
//!     .and(Filter::field("year").gte(2024));
//! ```

use super::types::Metadata;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A condition on document metadata.
///
/// Comparisons (`gt`, `gte`, `lt`, `lte`) are numeric: they never match a
/// missing field or a non-number on either side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    Eq(String, Value),
    /// Also matches documents that lack the field.
    Ne(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    In(String, Vec<Value>),
    /// String field containing a substring.
    Contains(String, String),
    Exists(String),
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    /// Starts a condition on the metadata field `name`.
    pub fn field(name: impl Into<String>) -> FieldFilter {
        FieldFilter { name: name.into() }
    }

    pub fn and(self, other: Filter) -> Self {
        Filter::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Filter) -> Self {
        Filter::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Filter::Not(Box::new(self))
    }

    pub fn matches(&self, metadata: &Metadata) -> bool {
        match self {
            Filter::Eq(field, value) => metadata.get(field) == Some(value),
            Filter::Ne(field, value) => metadata.get(field) != Some(value),
            Filter::Gt(field, value) => compare(metadata.get(field), value, |a, b| a > b),
            Filter::Gte(field, value) => compare(metadata.get(field), value, |a, b| a >= b),
            Filter::Lt(field, value) => compare(metadata.get(field), value, |a, b| a < b),
            Filter::Lte(field, value) => compare(metadata.get(field), value, |a, b| a <= b),
            Filter::In(field, values) => metadata
                .get(field)
                .is_some_and(|found| values.contains(found)),
            Filter::Contains(field, needle) => metadata
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|haystack| haystack.contains(needle.as_str())),
            Filter::Exists(field) => metadata.get(field).is_some_and(|found| !found.is_null()),
            Filter::And(left, right) => left.matches(metadata) && right.matches(metadata),
            Filter::Or(left, right) => left.matches(metadata) || right.matches(metadata),
            Filter::Not(inner) => !inner.matches(metadata),
        }
    }
}

/// Builder returned by [`Filter::field`].
#[derive(Debug)]
pub struct FieldFilter {
    name: String,
}

impl FieldFilter {
    pub fn eq(self, value: impl Into<Value>) -> Filter {
        Filter::Eq(self.name, value.into())
    }

    pub fn ne(self, value: impl Into<Value>) -> Filter {
        Filter::Ne(self.name, value.into())
    }

    pub fn gt(self, value: impl Into<Value>) -> Filter {
        Filter::Gt(self.name, value.into())
    }

    pub fn gte(self, value: impl Into<Value>) -> Filter {
        Filter::Gte(self.name, value.into())
    }

    pub fn lt(self, value: impl Into<Value>) -> Filter {
        Filter::Lt(self.name, value.into())
    }

    pub fn lte(self, value: impl Into<Value>) -> Filter {
        Filter::Lte(self.name, value.into())
    }

    pub fn one_of<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Filter {
        Filter::In(self.name, values.into_iter().map(Into::into).collect())
    }

    pub fn contains(self, needle: impl Into<String>) -> Filter {
        Filter::Contains(self.name, needle.into())
    }

    pub fn exists(self) -> Filter {
        Filter::Exists(self.name)
    }
}

fn compare(found: Option<&Value>, target: &Value, op: impl Fn(f64, f64) -> bool) -> bool {
    match (found.and_then(Value::as_f64), target.as_f64()) {
        (Some(a), Some(b)) => op(a, b),
        _ => false,
    }
}
