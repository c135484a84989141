//! Grouped aggregation over partitioned tables
//!
//! The one generic primitive the summary layer is built on: drop every column
//! outside `groupers` and the aggregation target, group rows by the grouper
//! tuple, reduce each group with a two-phase function, and reconstitute a
//! table whose columns are the groupers plus a single `value` column.

use ahash::AHashMap;
use rayon::prelude::*;

use crate::aggregate::function::AggregationFunction;
use crate::core::error::{Result, SummaryError};
use crate::core::types::{AxisLabel, GroupKey};
use crate::table::partition::{Column, MeasureColumn, PartitionedTable};

/// Name of the aggregate column on every engine output
pub const VALUE_COLUMN: &str = "value";

/// Aggregate one measure column, grouped by coordinate columns
///
/// `aggcol` must name exactly one measure column; multi-column aggregation
/// is out of scope. Chunk-local reductions run in
/// parallel across partitions; the combine fold walks the partition results
/// in partition order so the merge is deterministic. The output is a
/// single-partition table sorted by group key, ready to be aggregated again.
pub fn aggregate(
    table: &PartitionedTable,
    groupers: &[&str],
    aggcol: &[&str],
    function: &AggregationFunction,
) -> Result<PartitionedTable> {
    if aggcol.len() != 1 {
        return Err(SummaryError::UnsupportedShape(format!(
            "aggregation targets exactly one column, got {:?}",
            aggcol
        )));
    }

    let key_columns: Vec<&Column> = groupers
        .iter()
        .map(|&name| {
            table.key_column(name).ok_or_else(|| SummaryError::ColumnMismatch {
                name: name.to_string(),
                available: table.column_names(),
            })
        })
        .collect::<Result<_>>()?;

    let target = table
        .measure_column(aggcol[0])
        .ok_or_else(|| SummaryError::ColumnMismatch {
            name: aggcol[0].to_string(),
            available: table.column_names(),
        })?;

    let dropped: Vec<String> = table
        .column_names()
        .into_iter()
        .filter(|name| name != aggcol[0] && !groupers.contains(&name.as_str()))
        .collect();
    tracing::debug!(
        "Dropping columns {:?}; aggregating '{}' by {:?}",
        dropped,
        target.name,
        groupers
    );

    // chunk phase: each partition reduces its own groups independently
    let ranges: Vec<_> = table.partitions().collect();
    let partials: Vec<AHashMap<GroupKey, f64>> = ranges
        .into_par_iter()
        .map(|range| {
            let mut groups: AHashMap<GroupKey, Vec<f64>> = AHashMap::new();
            for row in range {
                let key = GroupKey::new(
                    key_columns.iter().map(|c| c.labels[row].clone()).collect(),
                );
                groups.entry(key).or_default().push(target.values[row]);
            }
            groups
                .into_iter()
                .map(|(key, values)| (key, function.chunk(&values)))
                .collect()
        })
        .collect();

    // combine phase: sequential fold in partition order
    let mut merged: AHashMap<GroupKey, f64> = AHashMap::new();
    for partial in partials {
        for (key, value) in partial {
            merged
                .entry(key)
                .and_modify(|acc| *acc = function.combine(*acc, value))
                .or_insert(value);
        }
    }

    let mut rows: Vec<(GroupKey, f64)> = merged
        .into_iter()
        .map(|(key, value)| (key, function.finalize(value)))
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));

    // split the composite key back into one column per grouper
    let mut key_labels: Vec<Vec<AxisLabel>> = vec![Vec::with_capacity(rows.len()); groupers.len()];
    let mut values = Vec::with_capacity(rows.len());
    for (key, value) in rows {
        for (slot, label) in key_labels.iter_mut().zip(key.into_labels()) {
            slot.push(label);
        }
        values.push(value);
    }

    let keys = groupers
        .iter()
        .zip(key_labels)
        .map(|(name, labels)| Column::new(*name, labels))
        .collect();
    let measures = vec![MeasureColumn::new(VALUE_COLUMN, values)];

    Ok(PartitionedTable::single_partition(keys, measures))
}
