use thiserror::Error;

use super::fields::FieldKind;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Illegal filter group formation: expected exactly one operation key, found {0}")]
    InvalidGroupShape(usize),

    #[error("Filter operation '{0}' is not one of 'any', 'all'")]
    UnknownOperation(String),

    #[error("Filter group '{0}' has no searchers")]
    EmptyGroup(String),

    #[error("Unknown field identifier '{0}'")]
    UnknownField(String),

    #[error("Unsupported expression type '{0}'")]
    UnsupportedExpression(String),

    #[error("Expression type '{expression_type}' cannot be applied to {kind} field '{field}'")]
    IncompatibleExpression {
        expression_type: String,
        kind: FieldKind,
        field: String,
    },

    #[error("Invalid expression {expression} for '{field}': {reason}")]
    InvalidExpression {
        field: String,
        expression: String,
        reason: String,
    },

    #[error("Invalid regex for '{field}': {source}")]
    InvalidRegex {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("Type mismatch on '{field}': expression expects {expected}, value is {found}")]
    TypeMismatch {
        field: String,
        expected: FieldKind,
        found: &'static str,
    },
}

impl FilterError {
    /// Everything except a runtime type mismatch is detected while compiling.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, FilterError::TypeMismatch { .. })
    }
}
