//! Labeled multi-dimensional array input
//!
//! A [`Dataset`] is the read-only input to the summary pipeline: named
//! coordinates spanning a dense hyper-rectangle, plus named variables holding
//! one numeric value per cell. Variables are stored row-major over the
//! coordinate declaration order, last coordinate varying fastest.

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SummaryError};
use crate::core::types::AxisLabel;

/// A named dimension and its labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub name: String,
    pub labels: Vec<AxisLabel>,
}

impl Coordinate {
    pub fn new(name: impl Into<String>, labels: Vec<AxisLabel>) -> Self {
        Self {
            name: name.into(),
            labels,
        }
    }

    /// Integer-labeled coordinate from explicit values
    pub fn ints(name: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Self::new(name, values.into_iter().map(AxisLabel::Int).collect())
    }

    /// Integer-labeled coordinate spanning a half-open range
    pub fn int_range(name: impl Into<String>, range: std::ops::Range<i64>) -> Self {
        Self::ints(name, range)
    }

    /// String-labeled coordinate
    pub fn strs<S: Into<String>>(name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            name,
            values.into_iter().map(|s| AxisLabel::Str(s.into())).collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// A named data variable with one value per coordinate combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub values: Vec<f64>,
}

impl Variable {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Labeled multi-dimensional simulation dataset
///
/// Never mutated after construction; every pipeline stage derives new data
/// from it instead of writing back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    coords: Vec<Coordinate>,
    variables: Vec<Variable>,
}

impl Dataset {
    /// Build a dataset, checking name uniqueness and variable lengths
    pub fn new(coords: Vec<Coordinate>, variables: Vec<Variable>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for name in coords
            .iter()
            .map(|c| c.name.as_str())
            .chain(variables.iter().map(|v| v.name.as_str()))
        {
            if !seen.insert(name) {
                return Err(SummaryError::Schema(format!(
                    "duplicate coordinate or variable name '{}'",
                    name
                )));
            }
        }

        let n_cells: usize = coords.iter().map(Coordinate::len).product();
        for var in &variables {
            if var.values.len() != n_cells {
                return Err(SummaryError::Schema(format!(
                    "variable '{}' holds {} values but the coordinates span {} cells",
                    var.name,
                    var.values.len(),
                    n_cells
                )));
            }
        }

        Ok(Self { coords, variables })
    }

    pub fn coords(&self) -> &[Coordinate] {
        &self.coords
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn coord(&self, name: &str) -> Option<&Coordinate> {
        self.coords.iter().find(|c| c.name == name)
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn coord_names(&self) -> impl Iterator<Item = &str> {
        self.coords.iter().map(|c| c.name.as_str())
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|v| v.name.as_str())
    }

    /// Position of a coordinate in declaration order
    pub fn axis_index(&self, name: &str) -> Option<usize> {
        self.coords.iter().position(|c| c.name == name)
    }

    /// Total number of cells spanned by the coordinates
    pub fn n_cells(&self) -> usize {
        self.coords.iter().map(Coordinate::len).product()
    }

    /// Row-major strides over the declaration order
    pub(crate) fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1usize; self.coords.len()];
        for axis in (0..self.coords.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * self.coords[axis + 1].len();
        }
        strides
    }

    /// Index one or more coordinates down to a single label, dropping those axes
    ///
    /// The analog of label-based selection on the source array; the
    /// presentation layer uses it to pin every coordinate except the one
    /// being plotted.
    pub fn select(&self, selection: &[(&str, AxisLabel)]) -> Result<Dataset> {
        let mut fixed: Vec<Option<usize>> = vec![None; self.coords.len()];
        for (name, label) in selection {
            let axis = self.axis_index(name).ok_or_else(|| {
                SummaryError::Schema(format!("cannot select on unknown coordinate '{}'", name))
            })?;
            let pos = self.coords[axis]
                .labels
                .iter()
                .position(|l| l == label)
                .ok_or_else(|| {
                    SummaryError::Schema(format!(
                        "coordinate '{}' has no label '{}'",
                        name, label
                    ))
                })?;
            fixed[axis] = Some(pos);
        }

        let kept: Vec<usize> = (0..self.coords.len()).filter(|&a| fixed[a].is_none()).collect();
        let kept_extents: Vec<usize> = kept.iter().map(|&a| self.coords[a].len()).collect();
        let n_out: usize = kept_extents.iter().product();
        let strides = self.strides();

        // offset contributed by the pinned axes
        let base: usize = fixed
            .iter()
            .enumerate()
            .filter_map(|(axis, pos)| pos.map(|p| p * strides[axis]))
            .sum();

        let mut out_vars: Vec<Variable> = self
            .variables
            .iter()
            .map(|v| Variable::new(v.name.clone(), Vec::with_capacity(n_out)))
            .collect();

        let mut idx = vec![0usize; kept.len()];
        for _ in 0..n_out {
            let offset: usize = base
                + idx
                    .iter()
                    .zip(kept.iter())
                    .map(|(&i, &axis)| i * strides[axis])
                    .sum::<usize>();
            for (out, var) in out_vars.iter_mut().zip(self.variables.iter()) {
                out.values.push(var.values[offset]);
            }
            advance_odometer(&mut idx, &kept_extents);
        }

        let out_coords: Vec<Coordinate> = kept.iter().map(|&a| self.coords[a].clone()).collect();
        Dataset::new(out_coords, out_vars)
    }
}

/// Advance a multi-dimensional index, last position varying fastest
pub(crate) fn advance_odometer(idx: &mut [usize], extents: &[usize]) {
    for pos in (0..idx.len()).rev() {
        idx[pos] += 1;
        if idx[pos] < extents[pos] {
            return;
        }
        idx[pos] = 0;
    }
}
