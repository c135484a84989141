//! Two-phase reducible aggregation functions
//!
//! Each function is expressed as chunk / combine / finalize so the engine can
//! evaluate chunk-local reductions in parallel across partitions and merge the
//! results afterwards. The combine step must be associative and
//! order-independent; summation satisfies that unconditionally, quantiles only
//! under the grouping discipline the summary layer enforces.

use crate::core::error::{Result, SummaryError};

/// Aggregation selected by variant, not by inheritance
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregationFunction {
    /// Commutative, associative summation; correct under arbitrary
    /// partitioning.
    Sum,
    /// Exact quantile of the rows one chunk sees. Only statistically valid
    /// when every group lies wholly inside a single partition; the summary
    /// layer pre-sums to arrange that before using it.
    Quantile(f64),
}

impl AggregationFunction {
    pub fn sum() -> Self {
        Self::Sum
    }

    /// Quantile aggregation; `q` must lie strictly inside (0, 1)
    pub fn quantile(q: f64) -> Result<Self> {
        if !(q > 0.0 && q < 1.0) {
            return Err(SummaryError::InvalidQuantile(q));
        }
        Ok(Self::Quantile(q))
    }

    pub fn median() -> Self {
        Self::Quantile(0.5)
    }

    /// Chunk-local reduction over one group's rows within one partition
    pub(crate) fn chunk(&self, values: &[f64]) -> f64 {
        match self {
            Self::Sum => values.iter().sum(),
            Self::Quantile(q) => quantile_linear(values, *q),
        }
    }

    /// Merge chunk results for the same group across partitions
    pub(crate) fn combine(&self, acc: f64, next: f64) -> f64 {
        match self {
            Self::Sum => acc + next,
            // groups never span partitions on the quantile path; if that
            // contract is broken the most recent chunk's estimate stands
            Self::Quantile(_) => next,
        }
    }

    /// Final transform after the combine fold
    pub(crate) fn finalize(&self, value: f64) -> f64 {
        value
    }
}

/// Exact quantile with linear interpolation between order statistics
///
/// rank = q * (n - 1), interpolating between the bracketing values; matches
/// the default definition used by mainstream statistics packages (R-7).
fn quantile_linear(values: &[f64], q: f64) -> f64 {
    debug_assert!(!values.is_empty());
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
