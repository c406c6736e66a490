//! Typed node labels and the comparison contract.
//!
//! A label is a key plus a value drawn from a closed set of types. Selectors
//! carry their literal as text; comparing a label against a literal parses the
//! literal as the label's own type and answers with the full set of relations
//! that hold, so `{Gt, Neq}` satisfies both a `>` and a `!=` selector.

use crate::core::error::{RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Relation a selector requires between a label value and its literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    Eq,
    Neq,
    Gt,
    Lt,
}

impl Relation {
    /// Wire form of the relation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
        }
    }

    fn flag(self) -> RelationSet {
        match self {
            Self::Eq => RelationSet::EQ,
            Self::Neq => RelationSet::NEQ,
            Self::Gt => RelationSet::GT,
            Self::Lt => RelationSet::LT,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relation {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(Self::Eq),
            "!=" => Ok(Self::Neq),
            ">" => Ok(Self::Gt),
            "<" => Ok(Self::Lt),
            other => Err(RegistryError::invalid(format!(
                "unknown relation {:?}, expected one of =, !=, >, <",
                other
            ))),
        }
    }
}

bitflags::bitflags! {
    /// Set of relations that hold for one comparison.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RelationSet: u8 {
        const EQ = 0b0001;
        const NEQ = 0b0010;
        const GT = 0b0100;
        const LT = 0b1000;
    }
}

impl RelationSet {
    /// Check whether a selector relation is satisfied.
    pub fn satisfies(&self, relation: Relation) -> bool {
        self.contains(relation.flag())
    }
}

/// Typed label value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LabelValue {
    Bool(bool),
    Float64(f64),
    String(String),
}

impl LabelValue {
    /// Name of the value type, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Float64(_) => "float64",
            Self::String(_) => "string",
        }
    }
}

/// A typed, named node attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    key: String,
    value: LabelValue,
}

impl Label {
    pub fn new(key: impl Into<String>, value: LabelValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Self::new(key, LabelValue::Bool(value))
    }

    pub fn float64(key: impl Into<String>, value: f64) -> Self {
        Self::new(key, LabelValue::Float64(value))
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, LabelValue::String(value.into()))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &LabelValue {
        &self.value
    }

    /// Canonical text form of the value.
    pub fn string_value(&self) -> String {
        match &self.value {
            LabelValue::Bool(v) => v.to_string(),
            LabelValue::Float64(v) => format!("{:.2}", v),
            LabelValue::String(v) => v.clone(),
        }
    }

    /// Compare this label's value against a selector literal.
    ///
    /// Returns exactly `{Eq}` or a set containing `Neq`, never both. Fails with
    /// `Incomparable` when the literal does not parse as the label's type.
    pub fn compare(&self, literal: &str) -> RegistryResult<RelationSet> {
        match &self.value {
            LabelValue::Bool(stored) => {
                let reference =
                    parse_bool(literal).ok_or_else(|| incomparable(literal, "bool"))?;
                Ok(if *stored == reference {
                    RelationSet::EQ
                } else {
                    RelationSet::NEQ
                })
            }
            LabelValue::Float64(stored) => {
                let reference: f64 = literal
                    .parse()
                    .map_err(|_| incomparable(literal, "float64"))?;
                let (stored, reference) = (round2(*stored), round2(reference));
                Ok(if stored == reference {
                    RelationSet::EQ
                } else if stored > reference {
                    RelationSet::GT | RelationSet::NEQ
                } else {
                    RelationSet::LT | RelationSet::NEQ
                })
            }
            LabelValue::String(stored) => Ok(if stored.as_bytes() == literal.as_bytes() {
                RelationSet::EQ
            } else {
                RelationSet::NEQ
            }),
        }
    }
}

fn incomparable(literal: &str, expected: &'static str) -> RegistryError {
    RegistryError::Incomparable {
        literal: literal.to_string(),
        expected,
    }
}

// Two decimal places absorb floating-point noise on computed metrics.
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn parse_bool(literal: &str) -> Option<bool> {
    match literal {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
