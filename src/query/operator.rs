//! Operator names and their canonical forms.

use std::fmt;

/// Reserved key for logical conjunction.
pub const AND_KEY: &str = "$and";
/// Reserved key for logical disjunction.
pub const OR_KEY: &str = "$or";
/// Reserved key for logical negation.
pub const NOT_KEY: &str = "$not";

/// Reserved logical keys, in dispatch order.
pub const LOGICAL_KEYS: [&str; 3] = [AND_KEY, OR_KEY, NOT_KEY];

/// Canonical field operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `eq`, `equals`, `==`
    Eq,
    /// `ne`, `not_equals`, `!=`
    Ne,
    /// `gt`, `greater_than`, `>`
    Gt,
    /// `gte`, `greater_than_or_equal`, `>=`
    Gte,
    /// `lt`, `less_than`, `<`
    Lt,
    /// `lte`, `less_than_or_equal`, `<=`
    Lte,
    /// `contains`, `like`
    Contains,
    /// `startswith`, `starts_with`
    StartsWith,
    /// `endswith`, `ends_with`
    EndsWith,
    /// `in`
    In,
    /// `not_in`
    NotIn,
    /// `exists`
    Exists,
    /// `between`
    Between,
}

impl Operator {
    /// Resolve an operator name or alias, case-insensitively.
    pub fn canonicalize(name: &str) -> Option<Operator> {
        let op = match name.to_lowercase().as_str() {
            "eq" | "equals" | "==" => Operator::Eq,
            "ne" | "not_equals" | "!=" => Operator::Ne,
            "gt" | "greater_than" | ">" => Operator::Gt,
            "gte" | "greater_than_or_equal" | ">=" => Operator::Gte,
            "lt" | "less_than" | "<" => Operator::Lt,
            "lte" | "less_than_or_equal" | "<=" => Operator::Lte,
            "contains" | "like" => Operator::Contains,
            "startswith" | "starts_with" => Operator::StartsWith,
            "endswith" | "ends_with" => Operator::EndsWith,
            "in" => Operator::In,
            "not_in" => Operator::NotIn,
            "exists" => Operator::Exists,
            "between" => Operator::Between,
            _ => return None,
        };
        Some(op)
    }

    /// Resolve an operator accepted by the legacy filter syntax (exact spelling only).
    pub fn legacy(name: &str) -> Option<Operator> {
        let op = match name {
            "eq" | "equals" => Operator::Eq,
            "ne" | "not_equals" => Operator::Ne,
            "gt" | "greater_than" => Operator::Gt,
            "gte" | "greater_than_or_equal" => Operator::Gte,
            "lt" | "less_than" => Operator::Lt,
            "lte" | "less_than_or_equal" => Operator::Lte,
            "contains" => Operator::Contains,
            "in" => Operator::In,
            "exists" => Operator::Exists,
            _ => return None,
        };
        Some(op)
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Contains => "contains",
            Operator::StartsWith => "startswith",
            Operator::EndsWith => "endswith",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Exists => "exists",
            Operator::Between => "between",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Supported operator spellings grouped by category.
pub const SUPPORTED_OPERATORS: &[(&str, &[&str])] = &[
    ("equality", &["eq", "equals", "==", "ne", "not_equals", "!="]),
    (
        "comparison",
        &[
            "gt",
            "greater_than",
            ">",
            "gte",
            "greater_than_or_equal",
            ">=",
            "lt",
            "less_than",
            "<",
            "lte",
            "less_than_or_equal",
            "<=",
        ],
    ),
    (
        "string",
        &["contains", "like", "startswith", "starts_with", "endswith", "ends_with"],
    ),
    ("list", &["in", "not_in"]),
    ("existence", &["exists"]),
    ("range", &["between"]),
    ("logical", &LOGICAL_KEYS),
];

/// Operator catalogue by category, in display order.
pub fn supported_operators() -> &'static [(&'static str, &'static [&'static str])] {
    SUPPORTED_OPERATORS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_collapse_to_one_operator() {
        for alias in ["eq", "EQUALS", "=="] {
            assert_eq!(Operator::canonicalize(alias), Some(Operator::Eq));
        }
        for alias in ["gte", "Greater_Than_Or_Equal", ">="] {
            assert_eq!(Operator::canonicalize(alias), Some(Operator::Gte));
        }
        assert_eq!(Operator::canonicalize("like"), Some(Operator::Contains));
        assert_eq!(Operator::canonicalize("regex"), None);
    }

    #[test]
    fn every_catalogued_field_operator_resolves() {
        for (category, names) in SUPPORTED_OPERATORS {
            if *category == "logical" {
                continue;
            }
            for name in *names {
                assert!(Operator::canonicalize(name).is_some(), "{}", name);
            }
        }
    }

    #[test]
    fn legacy_set_is_narrower() {
        assert_eq!(Operator::legacy("in"), Some(Operator::In));
        assert_eq!(Operator::legacy("between"), None);
        assert_eq!(Operator::legacy("EQ"), None);
    }
}
