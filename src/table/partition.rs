//! Flattened, partitioned tabular form of a dataset
//!
//! Aggregation does not run on the labeled array directly; the dataset is
//! flattened once into a columnar table whose rows follow the role ordering
//! `[within, state, time, between]`, last coordinate varying fastest. With
//! the between-simulation coordinate last, the rows belonging to one
//! replicate block sit next to each other, which is what makes
//! between-simulation scans cheap.

use std::ops::Range;

use crate::core::error::{Result, SummaryError};
use crate::core::roles::CoordinateRoles;
use crate::core::types::AxisLabel;
use crate::dataset::array::{advance_odometer, Dataset};

/// A coordinate-valued column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub labels: Vec<AxisLabel>,
}

impl Column {
    pub fn new(name: impl Into<String>, labels: Vec<AxisLabel>) -> Self {
        Self {
            name: name.into(),
            labels,
        }
    }
}

/// A measurement-valued column
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureColumn {
    pub name: String,
    pub values: Vec<f64>,
}

impl MeasureColumn {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Columnar table split into contiguous row partitions
///
/// Built once from a validated dataset and immutable afterwards. Aggregation
/// outputs are also expressed as (single-partition) tables so they can be
/// aggregated again.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionedTable {
    keys: Vec<Column>,
    measures: Vec<MeasureColumn>,
    chunk_rows: usize,
}

impl PartitionedTable {
    pub(crate) fn new(keys: Vec<Column>, measures: Vec<MeasureColumn>, chunk_rows: usize) -> Self {
        debug_assert!(chunk_rows > 0);
        Self {
            keys,
            measures,
            chunk_rows,
        }
    }

    /// Wrap aggregation output as a table with a single partition
    pub(crate) fn single_partition(keys: Vec<Column>, measures: Vec<MeasureColumn>) -> Self {
        let n_rows = keys
            .first()
            .map(|c| c.labels.len())
            .or_else(|| measures.first().map(|m| m.values.len()))
            .unwrap_or(0);
        Self::new(keys, measures, n_rows.max(1))
    }

    pub fn n_rows(&self) -> usize {
        self.keys
            .first()
            .map(|c| c.labels.len())
            .or_else(|| self.measures.first().map(|m| m.values.len()))
            .unwrap_or(0)
    }

    /// Row length of one partition
    pub fn chunk_rows(&self) -> usize {
        self.chunk_rows
    }

    pub fn n_partitions(&self) -> usize {
        self.n_rows().div_ceil(self.chunk_rows)
    }

    /// Consecutive row ranges, one per partition
    pub fn partitions(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        let n_rows = self.n_rows();
        (0..n_rows)
            .step_by(self.chunk_rows)
            .map(move |start| start..(start + self.chunk_rows).min(n_rows))
    }

    pub fn key_columns(&self) -> &[Column] {
        &self.keys
    }

    pub fn measure_columns(&self) -> &[MeasureColumn] {
        &self.measures
    }

    pub fn key_column(&self, name: &str) -> Option<&Column> {
        self.keys.iter().find(|c| c.name == name)
    }

    pub fn measure_column(&self, name: &str) -> Option<&MeasureColumn> {
        self.measures.iter().find(|m| m.name == name)
    }

    /// All column names, keys first; used for error context
    pub fn column_names(&self) -> Vec<String> {
        self.keys
            .iter()
            .map(|c| c.name.clone())
            .chain(self.measures.iter().map(|m| m.name.clone()))
            .collect()
    }
}

/// Flatten a role-classified dataset into a partitioned table
///
/// Rows are emitted in odometer order over `roles.ordered_coords()`. The
/// partition row length is the *sum* of the per-coordinate extents, not the
/// product. Downstream correctness depends only on partition contiguity, but
/// partition boundaries (and with them the numeric output of chunked
/// quantiles) depend on this exact arithmetic; do not change it to a
/// row-count formula without revisiting the quantile contract.
pub fn flatten(dataset: &Dataset, roles: &CoordinateRoles) -> Result<PartitionedTable> {
    let ordered = roles.ordered_coords();

    let mut axes = Vec::with_capacity(ordered.len());
    let mut extents = Vec::with_capacity(ordered.len());
    for name in &ordered {
        let axis = dataset.axis_index(name).ok_or_else(|| {
            SummaryError::Schema(format!("cannot flatten on unknown coordinate '{}'", name))
        })?;
        axes.push(axis);
        extents.push(dataset.coords()[axis].len());
    }

    let chunk_rows: usize = extents.iter().sum();
    if chunk_rows == 0 {
        return Err(SummaryError::EmptyInput);
    }

    let measured: Vec<_> = roles
        .measured()
        .iter()
        .map(|name| {
            dataset.variable(name).ok_or_else(|| {
                SummaryError::Schema(format!("cannot flatten unknown variable '{}'", name))
            })
        })
        .collect::<Result<_>>()?;

    let n_rows: usize = extents.iter().product();
    let strides = dataset.strides();

    let mut key_labels: Vec<Vec<AxisLabel>> = vec![Vec::with_capacity(n_rows); ordered.len()];
    let mut measure_values: Vec<Vec<f64>> = vec![Vec::with_capacity(n_rows); measured.len()];

    let mut idx = vec![0usize; axes.len()];
    for _ in 0..n_rows {
        // gather through the source strides: flattening is a transpose of the
        // declaration order, not a copy of it
        let offset: usize = idx
            .iter()
            .zip(axes.iter())
            .map(|(&i, &axis)| i * strides[axis])
            .sum();
        for (pos, &axis) in axes.iter().enumerate() {
            key_labels[pos].push(dataset.coords()[axis].labels[idx[pos]].clone());
        }
        for (slot, var) in measure_values.iter_mut().zip(measured.iter()) {
            slot.push(var.values[offset]);
        }
        advance_odometer(&mut idx, &extents);
    }

    let keys = ordered
        .iter()
        .zip(key_labels)
        .map(|(name, labels)| Column::new(*name, labels))
        .collect();
    let measures = measured
        .iter()
        .zip(measure_values)
        .map(|(var, values)| MeasureColumn::new(var.name.clone(), values))
        .collect();

    Ok(PartitionedTable::new(keys, measures, chunk_rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::array::{Coordinate, Variable};

    fn dataset_and_roles() -> (Dataset, CoordinateRoles) {
        // declaration order differs from the role order on purpose
        let coords = vec![
            Coordinate::int_range("index", 0..2),
            Coordinate::strs("compt", ["S", "I"]),
            Coordinate::int_range("age", 0..2),
            Coordinate::int_range("step", 0..2),
        ];
        let n: usize = coords.iter().map(Coordinate::len).product();
        let values: Vec<f64> = (0..n).map(|v| v as f64).collect();
        let ds = Dataset::new(coords, vec![Variable::new("state", values)]).unwrap();
        let roles = CoordinateRoles::new("compt", "age", "index", "step", "state");
        (ds, roles)
    }

    #[test]
    fn test_between_varies_fastest() {
        let (ds, roles) = dataset_and_roles();
        let table = flatten(&ds, &roles).unwrap();

        let index_col = table.key_column("index").unwrap();
        let age_col = table.key_column("age").unwrap();

        // role order is [age, compt, step, index]: index alternates every row,
        // age is constant across the first half
        assert_eq!(index_col.labels[0], AxisLabel::Int(0));
        assert_eq!(index_col.labels[1], AxisLabel::Int(1));
        assert_eq!(index_col.labels[2], AxisLabel::Int(0));
        assert_eq!(age_col.labels[0], AxisLabel::Int(0));
        assert_eq!(age_col.labels[7], AxisLabel::Int(0));
        assert_eq!(age_col.labels[8], AxisLabel::Int(1));
    }

    #[test]
    fn test_values_follow_the_transpose() {
        let (ds, roles) = dataset_and_roles();
        let table = flatten(&ds, &roles).unwrap();
        let state = table.measure_column("state").unwrap();

        // first row: age=0, compt=S, step=0, index=0 -> declaration-order
        // offset 0; second row flips index, whose declaration stride is 8
        assert_eq!(state.values[0], 0.0);
        assert_eq!(state.values[1], 8.0);
        assert_eq!(state.values.len(), 16);
    }

    #[test]
    fn test_chunk_rows_is_extent_sum() {
        let (ds, roles) = dataset_and_roles();
        let table = flatten(&ds, &roles).unwrap();
        // 2 + 2 + 2 + 2, not 16
        assert_eq!(table.chunk_rows(), 8);
        assert_eq!(table.n_partitions(), 2);
        let parts: Vec<_> = table.partitions().collect();
        assert_eq!(parts, vec![0..8, 8..16]);
    }

    #[test]
    fn test_zero_extent_dataset_is_rejected() {
        let coords = vec![
            Coordinate::new("age", vec![]),
            Coordinate::new("index", vec![]),
        ];
        let ds = Dataset::new(coords, vec![Variable::new("state", vec![])]).unwrap();
        let roles = CoordinateRoles::new(
            Vec::<String>::new(),
            "age",
            "index",
            Vec::<String>::new(),
            "state",
        );
        let err = flatten(&ds, &roles).unwrap_err();
        assert!(matches!(err, SummaryError::EmptyInput));
    }

    #[test]
    fn test_ragged_final_partition() {
        // 3 + 2 = 5 chunk rows over 6 total rows -> partitions of 5 and 1
        let coords = vec![
            Coordinate::int_range("age", 0..3),
            Coordinate::int_range("index", 0..2),
        ];
        let ds = Dataset::new(
            coords,
            vec![Variable::new("state", (0..6).map(|v| v as f64).collect())],
        )
        .unwrap();
        let roles = CoordinateRoles::new(
            Vec::<String>::new(),
            "age",
            "index",
            Vec::<String>::new(),
            "state",
        );
        let table = flatten(&ds, &roles).unwrap();
        let parts: Vec<_> = table.partitions().collect();
        assert_eq!(parts, vec![0..5, 5..6]);
    }
}
