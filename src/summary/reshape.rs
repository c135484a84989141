//! Reshaping grouped tables back into labeled-array form
//!
//! Grouped aggregation output is tabular; downstream consumers want the
//! labeled-array shape back, indexed by the groupers. Missing group
//! combinations (outer-join gaps) become NaN cells.

use std::collections::BTreeSet;

use ahash::AHashMap;

use crate::aggregate::engine::VALUE_COLUMN;
use crate::core::error::{Result, SummaryError};
use crate::core::types::{AxisLabel, GroupKey};
use crate::dataset::array::{Coordinate, Dataset, Variable};
use crate::table::partition::{Column, PartitionedTable};

/// Extract the (key, value) rows of a grouped table
pub(crate) fn grouped_rows(
    table: &PartitionedTable,
    groupers: &[&str],
) -> Result<Vec<(GroupKey, f64)>> {
    let key_columns: Vec<&Column> = groupers
        .iter()
        .map(|&name| {
            table.key_column(name).ok_or_else(|| SummaryError::ColumnMismatch {
                name: name.to_string(),
                available: table.column_names(),
            })
        })
        .collect::<Result<_>>()?;
    let values = table
        .measure_column(VALUE_COLUMN)
        .ok_or_else(|| SummaryError::ColumnMismatch {
            name: VALUE_COLUMN.to_string(),
            available: table.column_names(),
        })?;

    Ok((0..table.n_rows())
        .map(|row| {
            let key = GroupKey::new(key_columns.iter().map(|c| c.labels[row].clone()).collect());
            (key, values.values[row])
        })
        .collect())
}

/// Dense labeled array from keyed rows
///
/// Coordinates are the sorted unique labels observed per grouper; each row
/// carries one value per output variable. Cells no row covers stay NaN.
pub(crate) fn dense_reshape(
    groupers: &[&str],
    rows: &[(GroupKey, Vec<f64>)],
    variables: &[&str],
) -> Result<Dataset> {
    let mut label_sets: Vec<BTreeSet<AxisLabel>> = vec![BTreeSet::new(); groupers.len()];
    for (key, _) in rows {
        for (set, label) in label_sets.iter_mut().zip(key.labels()) {
            set.insert(label.clone());
        }
    }

    let coords: Vec<Coordinate> = groupers
        .iter()
        .zip(&label_sets)
        .map(|(name, set)| Coordinate::new(*name, set.iter().cloned().collect()))
        .collect();

    let positions: Vec<AHashMap<AxisLabel, usize>> = coords
        .iter()
        .map(|c| {
            c.labels
                .iter()
                .enumerate()
                .map(|(pos, label)| (label.clone(), pos))
                .collect()
        })
        .collect();

    let extents: Vec<usize> = coords.iter().map(Coordinate::len).collect();
    let mut strides = vec![1usize; extents.len()];
    for axis in (0..extents.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * extents[axis + 1];
    }
    let n_cells: usize = extents.iter().product();

    let mut data: Vec<Vec<f64>> = vec![vec![f64::NAN; n_cells]; variables.len()];
    for (key, values) in rows {
        let mut offset = 0usize;
        for (axis, label) in key.labels().iter().enumerate() {
            let pos = positions[axis].get(label).copied().ok_or_else(|| {
                SummaryError::Schema(format!(
                    "group label '{}' missing from the '{}' coordinate",
                    label, groupers[axis]
                ))
            })?;
            offset += pos * strides[axis];
        }
        for (slot, value) in data.iter_mut().zip(values) {
            slot[offset] = *value;
        }
    }

    let out_vars = variables
        .iter()
        .zip(data)
        .map(|(name, values)| Variable::new(*name, values))
        .collect();
    Dataset::new(coords, out_vars)
}

/// Labeled array from one grouped table, with the value column renamed
pub fn grouped_to_dataset(
    groupers: &[&str],
    table: &PartitionedTable,
    value_name: &str,
) -> Result<Dataset> {
    let rows: Vec<(GroupKey, Vec<f64>)> = grouped_rows(table, groupers)?
        .into_iter()
        .map(|(key, value)| (key, vec![value]))
        .collect();
    dense_reshape(groupers, &rows, &[value_name])
}

/// Outer-join three quantile tables on the group key and reshape
///
/// Produces a labeled array indexed by the groupers with `lower`, `median`,
/// `upper` variables; groups absent from one of the inputs keep NaN there.
pub fn interval_dataset(
    groupers: &[&str],
    lower: &PartitionedTable,
    median: &PartitionedTable,
    upper: &PartitionedTable,
) -> Result<Dataset> {
    let mut joined: AHashMap<GroupKey, [f64; 3]> = AHashMap::new();
    for (slot, table) in [(0usize, lower), (1, median), (2, upper)] {
        for (key, value) in grouped_rows(table, groupers)? {
            joined.entry(key).or_insert([f64::NAN; 3])[slot] = value;
        }
    }

    let mut rows: Vec<(GroupKey, Vec<f64>)> = joined
        .into_iter()
        .map(|(key, triple)| (key, triple.to_vec()))
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    dense_reshape(groupers, &rows, &["lower", "median", "upper"])
}
