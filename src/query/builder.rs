//! Programmatic construction of query expressions.
//!
//! ```
//! use docstore_mcp::query::QueryBuilder;
//!
//! let query = QueryBuilder::and(vec![
//!     QueryBuilder::field("status").equals("pending"),
//!     QueryBuilder::field("priority").in_list(vec!["high".into(), "urgent".into()]),
//! ]);
//! assert!(query.contains_key("$and"));
//! ```

use super::{AND_KEY, NOT_KEY, OR_KEY};
use crate::value::{Document, Value};

/// Entry point for building query expressions.
pub struct QueryBuilder;

impl QueryBuilder {
    /// Start a condition on a field.
    pub fn field(name: impl Into<String>) -> FieldBuilder {
        FieldBuilder { field: name.into() }
    }

    /// Conjunction. Zero conditions give `{}`, one gives the condition itself.
    pub fn and(conditions: Vec<Document>) -> Document {
        combine(AND_KEY, conditions)
    }

    /// Disjunction. Zero conditions give `{}`, one gives the condition itself.
    pub fn or(conditions: Vec<Document>) -> Document {
        combine(OR_KEY, conditions)
    }

    /// Negation.
    pub fn not(condition: Document) -> Document {
        single(NOT_KEY, Value::Object(condition))
    }
}

fn combine(key: &str, mut conditions: Vec<Document>) -> Document {
    match conditions.len() {
        0 => Document::new(),
        1 => conditions.remove(0),
        _ => single(key, Value::Array(conditions.into_iter().map(Value::Object).collect())),
    }
}

fn single(key: &str, value: Value) -> Document {
    let mut doc = Document::new();
    doc.insert(key.to_string(), value);
    doc
}

/// Builds a single-operator condition on one field.
pub struct FieldBuilder {
    field: String,
}

impl FieldBuilder {
    fn op(self, op: &str, operand: Value) -> Document {
        single(&self.field, Value::Object(single(op, operand)))
    }

    /// `{field: {"eq": value}}`
    pub fn equals(self, value: impl Into<Value>) -> Document {
        self.op("eq", value.into())
    }

    /// `{field: {"ne": value}}`
    pub fn not_equals(self, value: impl Into<Value>) -> Document {
        self.op("ne", value.into())
    }

    /// `{field: {"gt": value}}`
    pub fn greater_than(self, value: impl Into<Value>) -> Document {
        self.op("gt", value.into())
    }

    /// `{field: {"gte": value}}`
    pub fn greater_than_or_equal(self, value: impl Into<Value>) -> Document {
        self.op("gte", value.into())
    }

    /// `{field: {"lt": value}}`
    pub fn less_than(self, value: impl Into<Value>) -> Document {
        self.op("lt", value.into())
    }

    /// `{field: {"lte": value}}`
    pub fn less_than_or_equal(self, value: impl Into<Value>) -> Document {
        self.op("lte", value.into())
    }

    /// `{field: {"contains": pattern}}`
    pub fn contains(self, pattern: &str) -> Document {
        self.op("contains", pattern.into())
    }

    /// `{field: {"startswith": prefix}}`
    pub fn starts_with(self, prefix: &str) -> Document {
        self.op("startswith", prefix.into())
    }

    /// `{field: {"endswith": suffix}}`
    pub fn ends_with(self, suffix: &str) -> Document {
        self.op("endswith", suffix.into())
    }

    /// `{field: {"in": values}}`
    pub fn in_list(self, values: Vec<Value>) -> Document {
        self.op("in", Value::Array(values))
    }

    /// `{field: {"not_in": values}}`
    pub fn not_in_list(self, values: Vec<Value>) -> Document {
        self.op("not_in", Value::Array(values))
    }

    /// `{field: {"exists": should_exist}}`
    pub fn exists(self, should_exist: bool) -> Document {
        self.op("exists", Value::Bool(should_exist))
    }

    /// `{field: {"between": [min, max]}}`
    pub fn between(self, min: impl Into<Value>, max: impl Into<Value>) -> Document {
        self.op("between", Value::Array(vec![min.into(), max.into()]))
    }
}
