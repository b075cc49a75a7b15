//! Query builder types and enums.

use std::fmt;
use std::str::FromStr;

use crate::collection::CollectionValue;
use crate::{CqlValue, DataBridgeError, Result};

/// Predicate operators understood by CQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Equal (=)
    Eq,
    /// Less than (<)
    Lt,
    /// Greater than (>)
    Gt,
    /// Less than or equal (<=)
    Lte,
    /// Greater than or equal (>=)
    Gte,
    /// LIKE (SASI / SAI indexes)
    Like,
    /// Collection contains a value
    Contains,
    /// Map contains a key
    ContainsKey,
}

impl Operator {
    /// Returns the CQL operator string.
    pub fn to_cql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Lte => "<=",
            Operator::Gte => ">=",
            Operator::Like => "like",
            Operator::Contains => "contains",
            Operator::ContainsKey => "contains key",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_cql())
    }
}

impl FromStr for Operator {
    type Err = DataBridgeError;

    fn from_str(s: &str) -> Result<Self> {
        // Collapse inner whitespace so "contains  key" still parses
        let normalized = s
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_lowercase();
        match normalized.as_str() {
            "=" => Ok(Operator::Eq),
            "<" => Ok(Operator::Lt),
            ">" => Ok(Operator::Gt),
            "<=" => Ok(Operator::Lte),
            ">=" => Ok(Operator::Gte),
            "like" => Ok(Operator::Like),
            "contains" => Ok(Operator::Contains),
            "contains key" => Ok(Operator::ContainsKey),
            _ => Err(DataBridgeError::Query(format!(
                "Unsupported operator '{}'",
                s
            ))),
        }
    }
}

/// Operation applied to a collection column in an UPDATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionOperation {
    /// `col = col + ?`
    Append,
    /// `col = ? + col` (lists only)
    Prepend,
    /// `col = col - ?`
    Remove,
}

/// A single `column operator ?` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub operator: Operator,
    pub value: CqlValue,
}

/// A pending collection update, rendered into the SET clause.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionMutation {
    pub column: String,
    /// None means the column is replaced wholesale.
    pub operation: Option<CollectionOperation>,
    pub value: CollectionValue,
}
