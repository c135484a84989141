//! Core value types used throughout the codebase

use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// A single coordinate label value
///
/// Labels double as grouping keys, so they must be hashable and totally
/// ordered. Float labels go through `OrderedFloat` to get both.
///
/// Serialization is untagged: `Int(3)` renders as `3` and `Str("A")` as
/// `"A"`, which keeps chart payloads readable. `Int` is listed before
/// `Float` so whole numbers deserialize back as integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisLabel {
    Int(i64),
    Str(String),
    Float(OrderedFloat<f64>),
}

impl AxisLabel {
    pub fn float(value: f64) -> Self {
        Self::Float(OrderedFloat(value))
    }
}

impl fmt::Display for AxisLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisLabel::Int(v) => write!(f, "{}", v),
            AxisLabel::Str(v) => write!(f, "{}", v),
            AxisLabel::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for AxisLabel {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for AxisLabel {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for AxisLabel {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<f64> for AxisLabel {
    fn from(v: f64) -> Self {
        Self::float(v)
    }
}

/// Composite key identifying one group during aggregation
///
/// The labels are ordered to match the grouper list that produced the key.
/// [`GroupKey::split`] and [`GroupKey::into_labels`] are the only places a
/// composite key is unpacked back into per-column labels; everything
/// downstream goes through them rather than indexing positionally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey(Vec<AxisLabel>);

impl GroupKey {
    pub fn new(labels: Vec<AxisLabel>) -> Self {
        Self(labels)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn labels(&self) -> &[AxisLabel] {
        &self.0
    }

    /// Pair each label with its grouper name, in declaration order
    pub fn split<'a>(&'a self, groupers: &'a [&str]) -> impl Iterator<Item = (&'a str, &'a AxisLabel)> {
        groupers.iter().copied().zip(self.0.iter())
    }

    /// Consume the key, yielding its labels in grouper order
    pub fn into_labels(self) -> Vec<AxisLabel> {
        self.0
    }
}
