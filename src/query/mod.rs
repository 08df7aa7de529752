//! Query engine.
//!
//! Translates a declarative filter expression into a [`Predicate`] evaluated
//! against one document at a time. Parsing is recursive descent over the
//! expression tree:
//!
//! - `{"$and": [e1, e2, ...]}` / `{"$or": [...]}` combine sub-expressions
//! - `{"$not": e}` negates one sub-expression
//! - `{"field": literal}` is an equality test
//! - `{"field": {"op": operand, ...}}` applies one or more operators to a field
//!
//! Conditions on several fields, and several operators on one field, are AND-ed.
//! Every structural problem (unknown operator, bad operand shape, empty logical
//! body) is reported by [`parse`] before any document is touched; the only
//! evaluation-time failure is ordering two values that have no common order.
//!
//! Reserved logical keys are checked first, in the order `$and`, `$or`, `$not`.
//! When one is present the expression is that combinator alone and any sibling
//! keys are ignored, so a field literally named `$and` cannot be queried.

mod builder;
mod legacy;
mod operator;

pub use builder::{FieldBuilder, QueryBuilder};
pub use legacy::parse_legacy;
pub use operator::{
    supported_operators, Operator, AND_KEY, LOGICAL_KEYS, NOT_KEY, OR_KEY, SUPPORTED_OPERATORS,
};

use std::cmp::Ordering;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::value::{Document, Value};

/// Query engine failures.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The expression is structurally invalid.
    #[error("{0}")]
    Syntax(String),

    /// A range operator met a field value it cannot be ordered against.
    #[error("cannot compare field '{field}' of type {actual} with operand of type {operand}")]
    Incomparable {
        /// Field under test
        field: String,
        /// Type of the stored value
        actual: &'static str,
        /// Type of the query operand
        operand: &'static str,
    },
}

fn syntax(msg: impl Into<String>) -> QueryError {
    QueryError::Syntax(msg.into())
}

/// A single operator applied to a field.
#[derive(Debug, Clone)]
pub enum Condition {
    /// Field equals operand
    Eq(Value),
    /// Field present and not equal to operand
    Ne(Value),
    /// Field ordered after operand
    Gt(Value),
    /// Field ordered after or equal to operand
    Gte(Value),
    /// Field ordered before operand
    Lt(Value),
    /// Field ordered before or equal to operand
    Lte(Value),
    /// String field matches pattern (contains / startswith / endswith)
    Pattern(Regex),
    /// Field equals one of the operands
    In(Vec<Value>),
    /// Field present and equal to none of the operands
    NotIn(Vec<Value>),
    /// Field presence (`true`) or absence (`false`)
    Exists(bool),
    /// Field within the closed range `[min, max]`
    Between(Value, Value),
}

/// Parsed, reusable form of a query expression.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Condition on one field
    Field {
        /// Field name
        field: String,
        /// Condition applied to its value
        condition: Condition,
    },
    /// All sub-predicates hold
    And(Vec<Predicate>),
    /// At least one sub-predicate holds
    Or(Vec<Predicate>),
    /// Sub-predicate does not hold
    Not(Box<Predicate>),
}

/// Parse a query expression.
///
/// An empty expression yields `None`, which callers treat as "match everything".
pub fn parse(expr: &Document) -> Result<Option<Predicate>, QueryError> {
    if expr.is_empty() {
        return Ok(None);
    }
    parse_expression(expr).map(Some)
}

/// Parse a query expression held in a [`Value`]. `Null` yields `None`.
pub fn parse_value(expr: &Value) -> Result<Option<Predicate>, QueryError> {
    match expr {
        Value::Null => Ok(None),
        Value::Object(obj) => parse(obj),
        other => Err(syntax(format!(
            "query must be an object, got {}",
            other.type_name()
        ))),
    }
}

/// Check an expression for syntax errors without keeping the predicate.
pub fn validate_query_syntax(expr: &Document) -> Result<(), QueryError> {
    parse(expr).map(|_| ())
}

fn parse_expression(expr: &Document) -> Result<Predicate, QueryError> {
    let Some(key) = LOGICAL_KEYS.iter().copied().find(|key| expr.contains_key(*key)) else {
        return parse_field_conditions(expr);
    };
    if expr.len() > 1 {
        let ignored: Vec<&str> = expr.keys().map(String::as_str).filter(|k| *k != key).collect();
        debug!(operator = key, ?ignored, "Ignoring keys beside logical operator");
    }

    let body = &expr[key];
    match key {
        AND_KEY => parse_sequence(key, body).map(|preds| fold(preds, Predicate::And)),
        OR_KEY => parse_sequence(key, body).map(|preds| fold(preds, Predicate::Or)),
        _ => parse_not(body),
    }
}

fn fold(mut preds: Vec<Predicate>, combine: fn(Vec<Predicate>) -> Predicate) -> Predicate {
    if preds.len() == 1 {
        preds.remove(0)
    } else {
        combine(preds)
    }
}

fn parse_sequence(key: &str, body: &Value) -> Result<Vec<Predicate>, QueryError> {
    let name = if key == AND_KEY { "AND" } else { "OR" };
    let items = body
        .as_array()
        .ok_or_else(|| syntax(format!("{} operation requires a list of conditions", name)))?;
    if items.is_empty() {
        return Err(syntax(format!(
            "{} operation requires at least one condition",
            name
        )));
    }
    items
        .iter()
        .map(|item| match item {
            Value::Object(sub) => parse_expression(sub),
            other => Err(syntax(format!(
                "{} conditions must be objects, got {}",
                name,
                other.type_name()
            ))),
        })
        .collect()
}

fn parse_not(body: &Value) -> Result<Predicate, QueryError> {
    match body {
        Value::Object(sub) if !sub.is_empty() => {
            Ok(Predicate::Not(Box::new(parse_expression(sub)?)))
        }
        _ => Err(syntax("NOT operation requires a condition")),
    }
}

fn parse_field_conditions(expr: &Document) -> Result<Predicate, QueryError> {
    if expr.is_empty() {
        return Err(syntax("Field conditions cannot be empty"));
    }

    let mut conditions = Vec::new();
    for (field, value) in expr {
        match value {
            Value::Object(ops) => {
                if ops.is_empty() {
                    return Err(syntax(format!(
                        "field '{}' has an empty operator map",
                        field
                    )));
                }
                for (name, operand) in ops {
                    let op = Operator::canonicalize(name)
                        .ok_or_else(|| syntax(format!("Unsupported operator: {}", name)))?;
                    conditions.push(Predicate::Field {
                        field: field.clone(),
                        condition: build_condition(op, operand)?,
                    });
                }
            }
            literal => conditions.push(Predicate::Field {
                field: field.clone(),
                condition: Condition::Eq(literal.clone()),
            }),
        }
    }
    Ok(fold(conditions, Predicate::And))
}

pub(crate) fn build_condition(op: Operator, operand: &Value) -> Result<Condition, QueryError> {
    let condition = match op {
        Operator::Eq => Condition::Eq(operand.clone()),
        Operator::Ne => Condition::Ne(operand.clone()),
        Operator::Gt => Condition::Gt(operand.clone()),
        Operator::Gte => Condition::Gte(operand.clone()),
        Operator::Lt => Condition::Lt(operand.clone()),
        Operator::Lte => Condition::Lte(operand.clone()),
        Operator::Contains => Condition::Pattern(compile_pattern(op, operand, "{}")?),
        Operator::StartsWith => Condition::Pattern(compile_pattern(op, operand, "^(?:{})")?),
        Operator::EndsWith => Condition::Pattern(compile_pattern(op, operand, "(?:{})$")?),
        Operator::In => Condition::In(list_operand(op, operand)?),
        Operator::NotIn => Condition::NotIn(list_operand(op, operand)?),
        Operator::Exists => Condition::Exists(operand.is_truthy()),
        Operator::Between => match operand.as_array().map(Vec::as_slice) {
            Some([min, max]) => Condition::Between(min.clone(), max.clone()),
            _ => {
                return Err(syntax(
                    "'between' operator requires a list with exactly 2 values",
                ))
            }
        },
    };
    Ok(condition)
}

fn compile_pattern(op: Operator, operand: &Value, template: &str) -> Result<Regex, QueryError> {
    let text = operand.to_text().ok_or_else(|| {
        syntax(format!(
            "'{}' operator requires a string operand, got {}",
            op,
            operand.type_name()
        ))
    })?;
    let pattern = template.replacen("{}", &text, 1);
    Regex::new(&pattern)
        .map_err(|e| syntax(format!("'{}' operator has an invalid pattern: {}", op, e)))
}

fn list_operand(op: Operator, operand: &Value) -> Result<Vec<Value>, QueryError> {
    match operand {
        Value::Array(items) if items.is_empty() => Err(syntax(format!(
            "'{}' operator requires a non-empty list",
            op
        ))),
        Value::Array(items) => Ok(items.clone()),
        other => Err(syntax(format!(
            "'{}' operator requires a list value, got {}",
            op,
            other.type_name()
        ))),
    }
}

impl Predicate {
    /// Evaluate against one document. Pure; AND/OR short-circuit.
    pub fn evaluate(&self, doc: &Document) -> Result<bool, QueryError> {
        match self {
            Predicate::Field { field, condition } => condition.test(field, doc.get(field)),
            Predicate::And(preds) => {
                for pred in preds {
                    if !pred.evaluate(doc)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Or(preds) => {
                for pred in preds {
                    if pred.evaluate(doc)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Not(pred) => Ok(!pred.evaluate(doc)?),
        }
    }
}

impl Condition {
    /// Test a field value. An absent field satisfies only `Exists(false)`.
    fn test(&self, field: &str, value: Option<&Value>) -> Result<bool, QueryError> {
        let Some(value) = value else {
            return Ok(matches!(self, Condition::Exists(false)));
        };

        let matched = match self {
            Condition::Eq(operand) => value.loose_eq(operand),
            Condition::Ne(operand) => !value.loose_eq(operand),
            Condition::Gt(operand) => order(field, value, operand)? == Ordering::Greater,
            Condition::Gte(operand) => order(field, value, operand)? != Ordering::Less,
            Condition::Lt(operand) => order(field, value, operand)? == Ordering::Less,
            Condition::Lte(operand) => order(field, value, operand)? != Ordering::Greater,
            Condition::Pattern(re) => value.as_str().is_some_and(|s| re.is_match(s)),
            Condition::In(operands) => operands.iter().any(|o| value.loose_eq(o)),
            Condition::NotIn(operands) => !operands.iter().any(|o| value.loose_eq(o)),
            Condition::Exists(expected) => *expected,
            Condition::Between(min, max) => {
                order(field, value, min)? != Ordering::Less
                    && order(field, value, max)? != Ordering::Greater
            }
        };
        Ok(matched)
    }
}

fn order(field: &str, value: &Value, operand: &Value) -> Result<Ordering, QueryError> {
    value
        .compare(operand)
        .ok_or_else(|| QueryError::Incomparable {
            field: field.to_string(),
            actual: value.type_name(),
            operand: operand.type_name(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::json_to_value;
    use serde_json::json;

    fn doc(json: serde_json::Value) -> Document {
        match json_to_value(json) {
            Value::Object(o) => o,
            other => panic!("expected object, got {:?}", other),
        }
    }

    fn predicate(json: serde_json::Value) -> Predicate {
        parse(&doc(json)).unwrap().expect("non-empty query")
    }

    fn matching(query: serde_json::Value, docs: &[Document]) -> Vec<usize> {
        let pred = predicate(query);
        docs.iter()
            .enumerate()
            .filter(|(_, d)| pred.evaluate(d).unwrap())
            .map(|(i, _)| i)
            .collect()
    }

    fn syntax_error(query: serde_json::Value) -> String {
        match parse(&doc(query)) {
            Err(QueryError::Syntax(msg)) => msg,
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    fn tasks() -> Vec<Document> {
        vec![
            doc(json!({"status": "pending", "priority": "high"})),
            doc(json!({"status": "pending", "priority": "low"})),
            doc(json!({"status": "done", "priority": "high"})),
        ]
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(parse(&Document::new()).unwrap().is_none());
        assert!(parse_value(&Value::Null).unwrap().is_none());
    }

    #[test]
    fn implicit_equality_and_across_fields() {
        let docs = tasks();
        assert_eq!(matching(json!({"status": "pending"}), &docs), vec![0, 1]);
        assert_eq!(
            matching(json!({"status": "pending", "priority": "high"}), &docs),
            vec![0]
        );
    }

    #[test]
    fn gt_keeps_insertion_order() {
        let docs = vec![
            doc(json!({"price": 10})),
            doc(json!({"price": 50})),
            doc(json!({"price": 100})),
        ];
        assert_eq!(matching(json!({"price": {"gt": 40}}), &docs), vec![1, 2]);
        assert_eq!(matching(json!({"price": {">=": 50, "lt": 100}}), &docs), vec![1]);
    }

    #[test]
    fn between_is_inclusive() {
        let docs = vec![
            doc(json!({"age": 17})),
            doc(json!({"age": 18})),
            doc(json!({"age": 40})),
            doc(json!({"age": 65})),
            doc(json!({"age": 66})),
        ];
        assert_eq!(
            matching(json!({"age": {"between": [18, 65]}}), &docs),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn in_and_not_in() {
        let docs = vec![
            doc(json!({"role": "Admin"})),
            doc(json!({"role": "Manager"})),
            doc(json!({"role": "User"})),
        ];
        assert_eq!(
            matching(json!({"role": {"in": ["Admin", "Manager"]}}), &docs),
            vec![0, 1]
        );
        assert_eq!(
            matching(json!({"role": {"not_in": ["Admin", "Manager"]}}), &docs),
            vec![2]
        );
    }

    #[test]
    fn nested_logic() {
        let query = json!({"$and": [
            {"status": "pending"},
            {"$or": [{"priority": "high"}, {"priority": "urgent"}]}
        ]});
        assert_eq!(matching(query, &tasks()), vec![0]);
    }

    #[test]
    fn logical_laws() {
        let docs = tasks();
        let x = json!({"priority": "high"});
        let base = matching(x.clone(), &docs);
        assert_eq!(matching(json!({"$not": {"$not": x.clone()}}), &docs), base);
        assert_eq!(matching(json!({"$and": [x.clone()]}), &docs), base);
        assert_eq!(matching(json!({"$or": [x]}), &docs), base);
        assert_eq!(matching(json!({"$not": {"priority": "high"}}), &docs), vec![1]);
    }

    #[test]
    fn empty_logical_bodies_are_syntax_errors() {
        assert!(syntax_error(json!({"$and": []})).contains("at least one condition"));
        assert!(syntax_error(json!({"$or": []})).contains("at least one condition"));
        assert!(syntax_error(json!({"$not": {}})).contains("requires a condition"));
        syntax_error(json!({"$and": {"a": 1}}));
        syntax_error(json!({"$or": [1, 2]}));
    }

    #[test]
    fn operand_shape_errors() {
        assert!(syntax_error(json!({"role": {"in": "Admin"}})).contains("requires a list"));
        assert!(syntax_error(json!({"role": {"not_in": []}})).contains("non-empty"));
        assert!(syntax_error(json!({"age": {"between": [1]}})).contains("exactly 2"));
        assert!(syntax_error(json!({"age": {"between": 1}})).contains("exactly 2"));
        assert!(syntax_error(json!({"age": {"regex": 1}})).contains("Unsupported operator"));
        syntax_error(json!({"name": {"contains": "("}}));
        syntax_error(json!({"name": {}}));
    }

    #[test]
    fn logical_key_takes_precedence_over_siblings() {
        let docs = vec![
            doc(json!({"a": 1, "b": 2})),
            doc(json!({"a": 1, "b": 3})),
            doc(json!({"a": 2, "b": 2})),
        ];
        // Field key beside $and is ignored.
        assert_eq!(matching(json!({"$and": [{"a": 1}], "b": 2}), &docs), vec![0, 1]);
        // $and wins over $or, $or wins over $not.
        assert_eq!(
            matching(json!({"$or": [{"a": 2}], "$and": [{"b": 3}]}), &docs),
            vec![1]
        );
        assert_eq!(
            matching(json!({"$not": {"a": 1}, "$or": [{"b": 3}]}), &docs),
            vec![1]
        );
    }

    #[test]
    fn operator_names_are_case_insensitive() {
        let docs = vec![doc(json!({"n": 5}))];
        assert_eq!(matching(json!({"n": {"GT": 1}}), &docs), vec![0]);
        assert_eq!(matching(json!({"n": {"Less_Than": 1}}), &docs), Vec::<usize>::new());
    }

    #[test]
    fn string_patterns() {
        let docs = vec![
            doc(json!({"name": "Alice Johnson"})),
            doc(json!({"name": "Bob Smith"})),
            doc(json!({"name": 42})),
        ];
        assert_eq!(matching(json!({"name": {"contains": "o"}}), &docs), vec![0, 1]);
        assert_eq!(matching(json!({"name": {"like": "Sm.th"}}), &docs), vec![1]);
        assert_eq!(matching(json!({"name": {"startswith": "Al"}}), &docs), vec![0]);
        assert_eq!(matching(json!({"name": {"ends_with": "son"}}), &docs), vec![0]);
        assert_eq!(matching(json!({"name": {"startswith": "son"}}), &docs), Vec::<usize>::new());
    }

    #[test]
    fn exists_and_missing_fields() {
        let docs = vec![
            doc(json!({"assigned_to": 1})),
            doc(json!({"assigned_to": null})),
            doc(json!({"title": "x"})),
        ];
        assert_eq!(matching(json!({"assigned_to": {"exists": true}}), &docs), vec![0, 1]);
        assert_eq!(matching(json!({"assigned_to": {"exists": false}}), &docs), vec![2]);
        assert_eq!(matching(json!({"assigned_to": null}), &docs), vec![1]);
        // A missing field never satisfies a comparison, not even `ne`.
        assert_eq!(matching(json!({"assigned_to": {"ne": 1}}), &docs), vec![1]);
    }

    #[test]
    fn incomparable_types_fail_at_evaluation() {
        let pred = predicate(json!({"price": {"gt": "cheap"}}));
        let err = pred.evaluate(&doc(json!({"price": 10}))).unwrap_err();
        assert!(matches!(err, QueryError::Incomparable { .. }));
        // Same predicate is fine where the field is absent.
        assert!(!pred.evaluate(&doc(json!({"name": "x"}))).unwrap());
    }

    #[test]
    fn validate_reports_syntax_only() {
        assert!(validate_query_syntax(&doc(json!({"price": {"gt": "cheap"}}))).is_ok());
        assert!(validate_query_syntax(&doc(json!({"$or": []}))).is_err());
    }
}
