//! Compiled match expressions.
//!
//! An expression is compiled once against the kind of the field it will be
//! applied to. Compilation rejects expression types that make no sense for
//! the field (a regex on a number) and sources that do not parse.

use std::collections::HashSet;
use std::str::FromStr;

use regex::Regex;
use serde_json::Value;

use super::error::FilterError;
use super::fields::{FieldKind, FieldValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionType {
    Exact,
    Regex,
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Range,
    In,
}

impl ExpressionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpressionType::Exact => "exact",
            ExpressionType::Regex => "regex",
            ExpressionType::Equal => "equal",
            ExpressionType::NotEqual => "not-equal",
            ExpressionType::LessThan => "less-than",
            ExpressionType::LessThanEqual => "less-than-equal",
            ExpressionType::GreaterThan => "greater-than",
            ExpressionType::GreaterThanEqual => "greater-than-equal",
            ExpressionType::Range => "range",
            ExpressionType::In => "in",
        }
    }

    fn comparison(&self) -> Option<Comparison> {
        match self {
            ExpressionType::Equal => Some(Comparison::Eq),
            ExpressionType::NotEqual => Some(Comparison::Ne),
            ExpressionType::LessThan => Some(Comparison::Lt),
            ExpressionType::LessThanEqual => Some(Comparison::Le),
            ExpressionType::GreaterThan => Some(Comparison::Gt),
            ExpressionType::GreaterThanEqual => Some(Comparison::Ge),
            _ => None,
        }
    }
}

impl FromStr for ExpressionType {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "exact" => Ok(ExpressionType::Exact),
            "regex" => Ok(ExpressionType::Regex),
            "equal" => Ok(ExpressionType::Equal),
            "not-equal" => Ok(ExpressionType::NotEqual),
            "less-than" => Ok(ExpressionType::LessThan),
            "less-than-equal" => Ok(ExpressionType::LessThanEqual),
            "greater-than" => Ok(ExpressionType::GreaterThan),
            "greater-than-equal" => Ok(ExpressionType::GreaterThanEqual),
            "range" => Ok(ExpressionType::Range),
            "in" => Ok(ExpressionType::In),
            other => Err(FilterError::UnsupportedExpression(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    fn apply(&self, lhs: u64, rhs: u64) -> bool {
        match self {
            Comparison::Eq => lhs == rhs,
            Comparison::Ne => lhs != rhs,
            Comparison::Lt => lhs < rhs,
            Comparison::Le => lhs <= rhs,
            Comparison::Gt => lhs > rhs,
            Comparison::Ge => lhs >= rhs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Text(String),
    Uint(u64),
    Bool(bool),
}

#[derive(Debug, Clone)]
pub enum Expression {
    Exact(Literal),
    Regex(Regex),
    Compare { op: Comparison, value: u64 },
    /// Inclusive on both ends.
    Range { low: u64, high: u64 },
    TextSet(HashSet<String>),
    UintSet(HashSet<u64>),
}

/// Value handed to an expression is not of the kind it was compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindMismatch {
    pub expected: FieldKind,
    pub found: &'static str,
}

impl Expression {
    /// Compile `source` as an expression of `expression_type` over a field of
    /// `kind`. `field` is only used in error messages.
    pub fn compile(
        expression_type: ExpressionType,
        source: &Value,
        kind: FieldKind,
        field: &str,
    ) -> Result<Self, FilterError> {
        let invalid = |reason: &str| FilterError::InvalidExpression {
            field: field.to_string(),
            expression: source.to_string(),
            reason: reason.to_string(),
        };
        let incompatible = || FilterError::IncompatibleExpression {
            expression_type: expression_type.as_str().to_string(),
            kind,
            field: field.to_string(),
        };

        match expression_type {
            ExpressionType::Exact => {
                let literal = parse_literal(source, kind).ok_or_else(|| invalid("not a literal"))?;
                Ok(Expression::Exact(literal))
            }
            ExpressionType::Regex => {
                if kind != FieldKind::Text {
                    return Err(incompatible());
                }
                let pattern = source.as_str().ok_or_else(|| invalid("regex must be a string"))?;
                let re = Regex::new(pattern).map_err(|e| FilterError::InvalidRegex {
                    field: field.to_string(),
                    source: e,
                })?;
                Ok(Expression::Regex(re))
            }
            ExpressionType::Range => {
                if kind != FieldKind::Uint {
                    return Err(incompatible());
                }
                let (low, high) = parse_range(source).ok_or_else(|| invalid("expected [low, high]"))?;
                if low > high {
                    return Err(invalid("low bound is above high bound"));
                }
                Ok(Expression::Range { low, high })
            }
            ExpressionType::In => {
                let items = list_items(source);
                if items.is_empty() {
                    return Err(invalid("set is empty"));
                }
                match kind {
                    FieldKind::Text => items
                        .iter()
                        .map(|v| parse_text(v))
                        .collect::<Option<HashSet<_>>>()
                        .map(Expression::TextSet)
                        .ok_or_else(|| invalid("set members must be strings")),
                    FieldKind::Uint => items
                        .iter()
                        .map(|v| parse_uint(v))
                        .collect::<Option<HashSet<_>>>()
                        .map(Expression::UintSet)
                        .ok_or_else(|| invalid("set members must be unsigned integers")),
                    FieldKind::Bool => Err(incompatible()),
                }
            }
            numeric => {
                if kind != FieldKind::Uint {
                    return Err(incompatible());
                }
                let value = parse_uint(source).ok_or_else(|| invalid("not an unsigned integer"))?;
                let op = numeric.comparison().ok_or_else(incompatible)?;
                Ok(Expression::Compare { op, value })
            }
        }
    }

    /// The kind of value this expression accepts.
    pub fn kind(&self) -> FieldKind {
        match self {
            Expression::Exact(Literal::Text(_)) | Expression::Regex(_) | Expression::TextSet(_) => {
                FieldKind::Text
            }
            Expression::Exact(Literal::Bool(_)) => FieldKind::Bool,
            Expression::Exact(Literal::Uint(_))
            | Expression::Compare { .. }
            | Expression::Range { .. }
            | Expression::UintSet(_) => FieldKind::Uint,
        }
    }

    /// Evaluate against one field value. An unset field never matches.
    pub fn matches(&self, value: &FieldValue<'_>) -> Result<bool, KindMismatch> {
        let mismatch = || KindMismatch {
            expected: self.kind(),
            found: value.type_name(),
        };

        match (self, value) {
            (_, FieldValue::Absent) => Ok(false),
            (Expression::Exact(Literal::Text(want)), FieldValue::Text(got)) => Ok(want == got),
            (Expression::Exact(Literal::Uint(want)), FieldValue::Uint(got)) => Ok(want == got),
            (Expression::Exact(Literal::Bool(want)), FieldValue::Bool(got)) => Ok(want == got),
            (Expression::Regex(re), FieldValue::Text(got)) => Ok(re.is_match(got)),
            (Expression::Compare { op, value: rhs }, FieldValue::Uint(got)) => Ok(op.apply(*got, *rhs)),
            (Expression::Range { low, high }, FieldValue::Uint(got)) => Ok(low <= got && got <= high),
            (Expression::TextSet(set), FieldValue::Text(got)) => Ok(set.contains(*got)),
            (Expression::UintSet(set), FieldValue::Uint(got)) => Ok(set.contains(got)),
            _ => Err(mismatch()),
        }
    }
}

fn parse_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_uint(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_literal(value: &Value, kind: FieldKind) -> Option<Literal> {
    match kind {
        FieldKind::Text => parse_text(value).map(Literal::Text),
        FieldKind::Uint => parse_uint(value).map(Literal::Uint),
        FieldKind::Bool => parse_bool(value).map(Literal::Bool),
    }
}

/// `[low, high]` or `"low..high"`.
fn parse_range(value: &Value) -> Option<(u64, u64)> {
    match value {
        Value::Array(bounds) if bounds.len() == 2 => {
            Some((parse_uint(&bounds[0])?, parse_uint(&bounds[1])?))
        }
        Value::String(s) => {
            let (low, high) = s.split_once("..")?;
            Some((low.trim().parse().ok()?, high.trim().parse().ok()?))
        }
        _ => None,
    }
}

/// Array members, or the comma separated parts of a string.
fn list_items(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| Value::String(p.to_string()))
            .collect(),
        Value::Number(_) => vec![value.clone()],
        _ => Vec::new(),
    }
}
