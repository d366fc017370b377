//! SQL operator types and conversions

use std::borrow::Cow;
use std::fmt::{self, Display};

/// SQL comparison operator used in `filter()` predicates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator(Cow<'static, str>);

impl Operator {
    pub const GT: Self = Operator(Cow::Borrowed(">"));
    pub const LT: Self = Operator(Cow::Borrowed("<"));
    pub const EQ: Self = Operator(Cow::Borrowed("="));
    pub const NEQ: Self = Operator(Cow::Borrowed("!="));
    pub const GTE: Self = Operator(Cow::Borrowed(">="));
    pub const LTE: Self = Operator(Cow::Borrowed("<="));
    pub const LIKE: Self = Operator(Cow::Borrowed("LIKE"));
    pub const ILIKE: Self = Operator(Cow::Borrowed("ILIKE"));
    pub const IN: Self = Operator(Cow::Borrowed("IN"));
    pub const NOT_IN: Self = Operator(Cow::Borrowed("NOT IN"));

    /// Create a custom operator for engine-specific comparisons
    ///
    /// # Examples
    /// ```
    /// use chainquery_core::Operator;
    ///
    /// let has_token = Operator::custom("@@");
    /// assert_eq!(has_token.as_str(), "@@");
    /// ```
    pub fn custom(op: impl Into<Cow<'static, str>>) -> Self {
        Operator(op.into())
    }

    /// Get the string representation of the operator
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Map a `field__suffix` lookup suffix (vector filters) to an operator
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "eq" => Some(Operator::EQ),
            "ne" => Some(Operator::NEQ),
            "gt" => Some(Operator::GT),
            "gte" => Some(Operator::GTE),
            "lt" => Some(Operator::LT),
            "lte" => Some(Operator::LTE),
            _ => None,
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trait for types that can be converted to SQL operators
pub trait IntoOperator {
    fn into_operator(self) -> Operator;
}

impl IntoOperator for Operator {
    fn into_operator(self) -> Operator {
        self
    }
}

/// Common operators map onto the constants; anything else is passed
/// through as a custom operator, the engine decides whether it is valid.
impl IntoOperator for &str {
    fn into_operator(self) -> Operator {
        match self.trim() {
            ">" => Operator::GT,
            "<" => Operator::LT,
            "=" | "==" => Operator::EQ,
            "!=" | "<>" => Operator::NEQ,
            ">=" => Operator::GTE,
            "<=" => Operator::LTE,
            "LIKE" | "like" => Operator::LIKE,
            "ILIKE" | "ilike" => Operator::ILIKE,
            "IN" | "in" => Operator::IN,
            "NOT IN" | "not in" => Operator::NOT_IN,
            other => Operator::custom(other.to_string()),
        }
    }
}

impl IntoOperator for String {
    fn into_operator(self) -> Operator {
        self.as_str().into_operator()
    }
}

/// Convenience module for operator constants
pub mod op {
    use super::Operator;

    pub const GT: Operator = Operator::GT;
    pub const LT: Operator = Operator::LT;
    pub const EQ: Operator = Operator::EQ;
    pub const NEQ: Operator = Operator::NEQ;
    pub const GTE: Operator = Operator::GTE;
    pub const LTE: Operator = Operator::LTE;
    pub const LIKE: Operator = Operator::LIKE;
    pub const ILIKE: Operator = Operator::ILIKE;
    pub const IN: Operator = Operator::IN;
    pub const NOT_IN: Operator = Operator::NOT_IN;
}
