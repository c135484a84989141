//! Domain orchestration for simulation summary statistics
//!
//! Encodes the grouping discipline the engine itself does not know about:
//! measured values may be summed only within simulations, and collapsed
//! across simulations only by a between-replicate quantile. The composition
//! order (sum within replicates first, quantile across replicates second) is
//! what makes the engine's chunk-local quantile exact: after the pre-sum,
//! each replicate's collapsed value occupies a single row.

use crate::aggregate::engine::{self, VALUE_COLUMN};
use crate::aggregate::function::AggregationFunction;
use crate::core::error::{Result, SummaryError};
use crate::core::roles::CoordinateRoles;
use crate::dataset::array::Dataset;
use crate::present::series::ReplicateSeries;
use crate::summary::reshape;
use crate::table::partition::{flatten, PartitionedTable};

/// Summary statistics over one role-classified simulation dataset
///
/// Construction validates the role assignment and flattens the dataset once;
/// the instance is immutable afterwards and every operation derives fresh
/// tables from the stored one.
pub struct SummaryCalculator {
    dataset: Dataset,
    roles: CoordinateRoles,
    table: PartitionedTable,
}

impl SummaryCalculator {
    pub fn new(dataset: Dataset, roles: CoordinateRoles) -> Result<Self> {
        roles.validate(&dataset)?;
        let table = flatten(&dataset, &roles)?;
        Ok(Self {
            dataset,
            roles,
            table,
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn roles(&self) -> &CoordinateRoles {
        &self.roles
    }

    pub fn table(&self) -> &PartitionedTable {
        &self.table
    }

    /// Sum a measured column within simulations, keeping `groupers` as keys
    ///
    /// Every within-simulation coordinate not named in `groupers` is summed
    /// away. The between-simulation coordinate(s) must be present in
    /// `groupers`: replicate identity has to survive a summation, because
    /// adding values from independent replicates is meaningless.
    pub fn sum_over_groups(&self, groupers: &[&str], aggcol: &str) -> Result<PartitionedTable> {
        if !self.roles.between_retained(groupers) {
            return Err(SummaryError::InvariantViolation(format!(
                "the coordinate(s) separating simulations ({:?}) must be included in the grouping variables, got {:?}",
                self.roles.between(),
                groupers
            )));
        }
        self.require_measure(aggcol)?;

        tracing::info!(
            "Summing '{}' over {:?}; retaining groups {:?}",
            aggcol,
            self.roles.within_not_in(groupers),
            groupers
        );
        engine::aggregate(&self.table, groupers, &[aggcol], &AggregationFunction::Sum)
    }

    /// Quantile of a measured column across simulations
    ///
    /// The between-simulation coordinate(s) must be absent from `groupers`:
    /// the quantile is taken across replicates, so the replicate axis is the
    /// one being collapsed. Any within-simulation coordinate not retained is
    /// summed away first via [`Self::sum_over_groups`], which leaves one row
    /// per replicate per retained group and makes the chunked quantile exact.
    pub fn quantile_between_sims(
        &self,
        groupers: &[&str],
        aggcol: &str,
        quantile: f64,
    ) -> Result<PartitionedTable> {
        let function = AggregationFunction::quantile(quantile)?;
        if self.roles.between_retained(groupers) {
            return Err(SummaryError::InvariantViolation(format!(
                "quantiles are computed across simulations; the coordinate(s) separating simulations ({:?}) must not appear in the grouping variables, got {:?}",
                self.roles.between(),
                groupers
            )));
        }
        self.require_measure(aggcol)?;

        let collapsed = self.roles.within_not_in(groupers);
        if collapsed.is_empty() {
            tracing::info!(
                "Calculating quantile {} of '{}' grouped by {:?}",
                quantile,
                aggcol,
                groupers
            );
            engine::aggregate(&self.table, groupers, &[aggcol], &function)
        } else {
            let mut sum_groupers: Vec<&str> = groupers.to_vec();
            sum_groupers.extend(self.roles.between().iter().map(String::as_str));
            let summed = self.sum_over_groups(&sum_groupers, aggcol)?;

            tracing::info!(
                "Calculating quantile {} of '{}' after summing over {:?}",
                quantile,
                aggcol,
                collapsed
            );
            engine::aggregate(&summed, groupers, &[VALUE_COLUMN], &function)
        }
    }

    /// Lower/median/upper quantile band across simulations
    ///
    /// Runs [`Self::quantile_between_sims`] at 0.5, `upper` and `lower`,
    /// outer-joins the three tables on the groupers and returns the result in
    /// labeled-array form with `lower`, `median`, `upper` variables.
    pub fn prediction_interval(
        &self,
        groupers: &[&str],
        aggcol: &str,
        upper: f64,
        lower: f64,
    ) -> Result<Dataset> {
        if !(lower > 0.0 && lower < upper && upper < 1.0) {
            return Err(SummaryError::InvalidRange { lower, upper });
        }

        let median = self.quantile_between_sims(groupers, aggcol, 0.5)?;
        let upper_q = self.quantile_between_sims(groupers, aggcol, upper)?;
        let lower_q = self.quantile_between_sims(groupers, aggcol, lower)?;

        reshape::interval_dataset(groupers, &lower_q, &median, &upper_q)
    }

    /// One line series per replicate along the time coordinate
    ///
    /// Supported only for datasets with a single between-simulation
    /// coordinate, a single measured variable and a single time coordinate.
    /// With `grouping` given, data are summed to the requested groups and
    /// reshaped before the series are cut; without it the raw dataset is
    /// sliced directly.
    pub fn spaghetti_series(
        &self,
        grouping: Option<(&[&str], &str)>,
    ) -> Result<Vec<ReplicateSeries>> {
        if self.roles.between().len() != 1 {
            return Err(SummaryError::UnsupportedShape(format!(
                "spaghetti series need exactly one between-simulation coordinate, found {:?}",
                self.roles.between()
            )));
        }
        if self.roles.measured().len() != 1 {
            return Err(SummaryError::UnsupportedShape(format!(
                "spaghetti series need exactly one measured variable, found {:?}",
                self.roles.measured()
            )));
        }
        if self.roles.time().len() != 1 {
            return Err(SummaryError::UnsupportedShape(format!(
                "spaghetti series need exactly one time coordinate, found {:?}",
                self.roles.time()
            )));
        }

        let time_coord = self.roles.time()[0].as_str();
        let replicate_coord = self.roles.between()[0].as_str();

        match grouping {
            Some((groupers, aggcol)) => {
                let summed = self.sum_over_groups(groupers, aggcol)?;
                let grouped = reshape::grouped_to_dataset(groupers, &summed, aggcol)?;
                ReplicateSeries::from_dataset(&grouped, time_coord, replicate_coord, aggcol)
            }
            None => ReplicateSeries::from_dataset(
                &self.dataset,
                time_coord,
                replicate_coord,
                self.roles.measured()[0].as_str(),
            ),
        }
    }

    fn require_measure(&self, aggcol: &str) -> Result<()> {
        if !self.roles.is_measured(aggcol) {
            return Err(SummaryError::UnknownMeasure {
                name: aggcol.to_string(),
                measured: self.roles.measured().to_vec(),
            });
        }
        Ok(())
    }
}
