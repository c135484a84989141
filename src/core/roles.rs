//! Coordinate role classification for simulation datasets
//!
//! Every coordinate of a simulation dataset plays exactly one of four
//! semantic roles, and the role decides what may legally be done with it
//! during aggregation:
//!
//! - state coordinates (e.g. disease compartment) index *what* is measured
//!   and are never summed,
//! - within-simulation coordinates (age, risk, location) may be summed to
//!   collapse structure inside a single run,
//! - the time coordinate is never summed,
//! - between-simulation coordinates distinguish independent stochastic
//!   replicates and may only be collapsed by a between-replicate statistic.
//!
//! The roles are carried as an explicit immutable value passed into every
//! operation rather than as mutable state on a handler.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SummaryError};
use crate::dataset::array::Dataset;

/// One or more coordinate names destined for a single role
///
/// Exists so that role constructors accept either a single name or a list
/// and normalize both to a list.
pub struct RoleNames(Vec<String>);

impl RoleNames {
    fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for RoleNames {
    fn from(name: &str) -> Self {
        Self(vec![name.to_string()])
    }
}

impl From<String> for RoleNames {
    fn from(name: String) -> Self {
        Self(vec![name])
    }
}

impl From<Vec<String>> for RoleNames {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl From<Vec<&str>> for RoleNames {
    fn from(names: Vec<&str>) -> Self {
        Self(names.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for RoleNames {
    fn from(names: [&str; N]) -> Self {
        Self(names.into_iter().map(str::to_string).collect())
    }
}

/// Role assignment for every coordinate and measured variable of a dataset
///
/// Immutable after construction; validation happens once against a concrete
/// dataset via [`CoordinateRoles::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateRoles {
    state: Vec<String>,
    within: Vec<String>,
    between: Vec<String>,
    time: Vec<String>,
    measured: Vec<String>,
}

impl CoordinateRoles {
    /// Build a role assignment, normalizing singleton names to lists
    pub fn new(
        state: impl Into<RoleNames>,
        within: impl Into<RoleNames>,
        between: impl Into<RoleNames>,
        time: impl Into<RoleNames>,
        measured: impl Into<RoleNames>,
    ) -> Self {
        Self {
            state: state.into().into_vec(),
            within: within.into().into_vec(),
            between: between.into().into_vec(),
            time: time.into().into_vec(),
            measured: measured.into().into_vec(),
        }
    }

    pub fn state(&self) -> &[String] {
        &self.state
    }

    pub fn within(&self) -> &[String] {
        &self.within
    }

    pub fn between(&self) -> &[String] {
        &self.between
    }

    pub fn time(&self) -> &[String] {
        &self.time
    }

    pub fn measured(&self) -> &[String] {
        &self.measured
    }

    /// All coordinates in the order used for flattening:
    /// within, state, time, between.
    ///
    /// The order is significant: the last coordinate varies fastest in the
    /// flattened table, so placing the between-simulation coordinate last
    /// keeps replicate rows adjacent for between-simulation scans.
    pub fn ordered_coords(&self) -> Vec<&str> {
        self.within
            .iter()
            .chain(self.state.iter())
            .chain(self.time.iter())
            .chain(self.between.iter())
            .map(String::as_str)
            .collect()
    }

    /// Check role completeness and consistency against a dataset
    ///
    /// Fails when a declared coordinate is absent from the dataset, a
    /// coordinate carries more than one role, a dataset coordinate is left
    /// unassigned, or a measured name is not a dataset variable.
    pub fn validate(&self, dataset: &Dataset) -> Result<()> {
        let mut assigned: HashSet<&str> = HashSet::new();
        for name in self.ordered_coords() {
            if dataset.coord(name).is_none() {
                return Err(SummaryError::Schema(format!(
                    "declared coordinate '{}' is not a coordinate of the dataset (dataset has {:?})",
                    name,
                    dataset.coord_names().collect::<Vec<_>>(),
                )));
            }
            if !assigned.insert(name) {
                return Err(SummaryError::Schema(format!(
                    "coordinate '{}' is assigned to more than one role",
                    name
                )));
            }
        }

        for name in dataset.coord_names() {
            if !assigned.contains(name) {
                return Err(SummaryError::Schema(format!(
                    "dataset coordinate '{}' is not assigned to any role",
                    name
                )));
            }
        }

        for name in &self.measured {
            if dataset.variable(name).is_none() {
                return Err(SummaryError::Schema(format!(
                    "measured variable '{}' is not a variable of the dataset (dataset has {:?})",
                    name,
                    dataset.variable_names().collect::<Vec<_>>(),
                )));
            }
        }

        Ok(())
    }

    /// True when every between-simulation coordinate appears in `groupers`
    pub fn between_retained(&self, groupers: &[&str]) -> bool {
        self.between.iter().all(|b| groupers.contains(&b.as_str()))
    }

    /// True when `name` is a declared measured variable
    pub fn is_measured(&self, name: &str) -> bool {
        self.measured.iter().any(|m| m == name)
    }

    /// Within-simulation coordinates not retained by `groupers`
    ///
    /// These are the coordinates a grouped summation will collapse.
    pub fn within_not_in<'a>(&'a self, groupers: &[&str]) -> Vec<&'a str> {
        self.within
            .iter()
            .map(String::as_str)
            .filter(|w| !groupers.contains(w))
            .collect()
    }
}
