//! Partitioned tabular representation

pub mod partition;

pub use partition::{flatten, Column, MeasureColumn, PartitionedTable};
