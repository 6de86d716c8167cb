use std::str::FromStr;

use super::error::FilterError;
use super::expression::Expression;
use super::fields::TxnField;
use crate::types::data::SignedTxnWithAD;

/// How the searchers of one group combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Every searcher must match.
    All,
    /// At least one searcher must match.
    Any,
}

impl FromStr for Operation {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Operation::All),
            "any" => Ok(Operation::Any),
            _ => Err(FilterError::UnknownOperation(s.to_string())),
        }
    }
}

/// One compiled field + expression rule.
#[derive(Debug, Clone)]
pub struct Searcher {
    field: TxnField,
    identifier: String,
    expression: Expression,
    search_inner: bool,
}

impl Searcher {
    pub fn new(
        field: TxnField,
        identifier: impl Into<String>,
        expression: Expression,
        search_inner: bool,
    ) -> Self {
        Self {
            field,
            identifier: identifier.into(),
            expression,
            search_inner,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Whether `stxn` matches. With inner search enabled a match on any inner
    /// transaction, at any depth, counts as a match.
    pub fn search(&self, stxn: &SignedTxnWithAD) -> Result<bool, FilterError> {
        let value = self.field.read(stxn);
        let matched = self
            .expression
            .matches(&value)
            .map_err(|m| FilterError::TypeMismatch {
                field: self.identifier.clone(),
                expected: m.expected,
                found: m.found,
            })?;
        if matched {
            return Ok(true);
        }

        if self.search_inner {
            for inner in stxn.inner_txns() {
                if self.search(inner)? {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }
}

#[derive(Debug, Clone)]
pub struct FilterGroup {
    op: Operation,
    searchers: Vec<Searcher>,
}

impl FilterGroup {
    pub fn new(op: Operation, searchers: Vec<Searcher>) -> Result<Self, FilterError> {
        if searchers.is_empty() {
            let name = match op {
                Operation::All => "all",
                Operation::Any => "any",
            };
            return Err(FilterError::EmptyGroup(name.to_string()));
        }
        Ok(Self { op, searchers })
    }

    pub fn operation(&self) -> Operation {
        self.op
    }

    pub fn searchers(&self) -> &[Searcher] {
        &self.searchers
    }

    pub fn matches(&self, stxn: &SignedTxnWithAD) -> Result<bool, FilterError> {
        match self.op {
            Operation::All => {
                for searcher in &self.searchers {
                    if !searcher.search(stxn)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Operation::Any => {
                for searcher in &self.searchers {
                    if searcher.search(stxn)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}
