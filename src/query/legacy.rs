//! Legacy filter syntax.
//!
//! Older clients send flat field filters with a smaller, exact-spelling operator
//! set and without logical combinators. The manager retries a filter through
//! this parser when the full parser rejects it.
//!
//! Differences from the full syntax:
//! - operator names are case-sensitive and limited to the legacy set
//! - `in` with a non-list operand degrades to equality
//! - `contains` takes its operand as a raw pattern string

use regex::Regex;

use super::{build_condition, syntax, Condition, Operator, Predicate, QueryError, LOGICAL_KEYS};
use crate::value::{Document, Value};

/// Parse a flat legacy filter into a predicate.
pub fn parse_legacy(expr: &Document) -> Result<Predicate, QueryError> {
    if expr.is_empty() {
        return Err(syntax("Field conditions cannot be empty"));
    }

    let mut conditions = Vec::new();
    for (field, value) in expr {
        if LOGICAL_KEYS.contains(&field.as_str()) {
            return Err(syntax(format!(
                "legacy filters do not support logical operator '{}'",
                field
            )));
        }

        let Value::Object(ops) = value else {
            conditions.push(Predicate::Field {
                field: field.clone(),
                condition: Condition::Eq(value.clone()),
            });
            continue;
        };

        if ops.is_empty() {
            return Err(syntax(format!("field '{}' has an empty operator map", field)));
        }
        for (name, operand) in ops {
            let op = Operator::legacy(name)
                .ok_or_else(|| syntax(format!("Unsupported filter operator: {}", name)))?;
            conditions.push(Predicate::Field {
                field: field.clone(),
                condition: legacy_condition(op, operand)?,
            });
        }
    }

    Ok(if conditions.len() == 1 {
        conditions.remove(0)
    } else {
        Predicate::And(conditions)
    })
}

fn legacy_condition(op: Operator, operand: &Value) -> Result<Condition, QueryError> {
    match (op, operand) {
        (Operator::In, Value::Array(items)) if items.is_empty() => {
            Err(syntax("'in' operator requires a non-empty list"))
        }
        (Operator::In, Value::Array(items)) => Ok(Condition::In(items.clone())),
        (Operator::In, scalar) => Ok(Condition::Eq(scalar.clone())),
        (Operator::Contains, Value::String(pattern)) => Regex::new(pattern)
            .map(Condition::Pattern)
            .map_err(|e| syntax(format!("'contains' operator has an invalid pattern: {}", e))),
        (Operator::Contains, other) => Err(syntax(format!(
            "'contains' operator requires a string operand, got {}",
            other.type_name()
        ))),
        _ => build_condition(op, operand),
    }
}
