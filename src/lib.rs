//! Episummary - Summary Statistics for Epidemic Simulation Output
//!
//! Reduces labeled multi-dimensional simulation output (disease compartment x
//! age x risk x location x timestep x replicate) to summary statistics and
//! presentation-ready series. The pipeline: coordinates are classified into
//! semantic roles, the array is flattened into a partitioned table, and
//! two-phase grouped aggregations compute sums within simulations and
//! quantiles between them; the summary layer composes these into prediction
//! intervals and per-replicate spaghetti series for chart hosts.

pub mod aggregate;
pub mod core;
pub mod dataset;
pub mod present;
pub mod summary;
pub mod table;

pub use crate::aggregate::{aggregate, AggregationFunction, VALUE_COLUMN};
pub use crate::core::{AxisLabel, CoordinateRoles, GroupKey, Result, SummaryError};
pub use crate::dataset::{Coordinate, Dataset, Variable};
pub use crate::present::{IntervalSeries, JsonAdapter, PresentationAdapter, ReplicateSeries};
pub use crate::summary::SummaryCalculator;
pub use crate::table::{flatten, PartitionedTable};
