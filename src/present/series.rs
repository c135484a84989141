//! Renderable series extracted from summary output
//!
//! Chart hosts consume flat series, not labeled arrays. The extraction rule
//! for extra dimensions mirrors an interactive host's starting state: every
//! coordinate that is not on the x-axis (and is not the replicate axis) gets
//! pinned to its first label, and the host re-slices when the user picks a
//! different one.

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SummaryError};
use crate::core::types::AxisLabel;
use crate::dataset::array::Dataset;

/// Prediction-interval band along the time coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalSeries {
    /// Labels the non-time coordinates were pinned to
    pub selection: Vec<(String, AxisLabel)>,
    pub time: Vec<AxisLabel>,
    pub lower: Vec<f64>,
    pub median: Vec<f64>,
    pub upper: Vec<f64>,
}

impl IntervalSeries {
    /// Cut a plottable band out of a prediction-interval dataset
    pub fn from_dataset(dataset: &Dataset, time_coord: &str) -> Result<Self> {
        for required in ["lower", "median", "upper"] {
            if dataset.variable(required).is_none() {
                return Err(SummaryError::UnsupportedShape(format!(
                    "interval dataset is missing the '{}' variable",
                    required
                )));
            }
        }
        if dataset.coord(time_coord).is_none() {
            return Err(SummaryError::UnsupportedShape(format!(
                "interval dataset has no time coordinate '{}'",
                time_coord
            )));
        }

        let selection = default_selection(dataset, &[time_coord])?;
        let refs: Vec<(&str, AxisLabel)> = selection
            .iter()
            .map(|(name, label)| (name.as_str(), label.clone()))
            .collect();
        let sliced = dataset.select(&refs)?;

        let time = sliced
            .coord(time_coord)
            .map(|c| c.labels.clone())
            .unwrap_or_default();
        let pull = |name: &str| -> Vec<f64> {
            sliced
                .variable(name)
                .map(|v| v.values.clone())
                .unwrap_or_default()
        };

        Ok(Self {
            selection,
            time,
            lower: pull("lower"),
            median: pull("median"),
            upper: pull("upper"),
        })
    }
}

/// One simulation replicate's trajectory along the time coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicateSeries {
    pub replicate: AxisLabel,
    pub time: Vec<AxisLabel>,
    pub values: Vec<f64>,
}

impl ReplicateSeries {
    /// Cut one series per replicate out of a labeled dataset
    pub fn from_dataset(
        dataset: &Dataset,
        time_coord: &str,
        replicate_coord: &str,
        measure: &str,
    ) -> Result<Vec<Self>> {
        let time = dataset.coord(time_coord).ok_or_else(|| {
            SummaryError::UnsupportedShape(format!(
                "dataset has no time coordinate '{}'",
                time_coord
            ))
        })?;
        let replicates = dataset
            .coord(replicate_coord)
            .ok_or_else(|| {
                SummaryError::UnsupportedShape(format!(
                    "dataset has no replicate coordinate '{}'",
                    replicate_coord
                ))
            })?
            .labels
            .clone();
        if dataset.variable(measure).is_none() {
            return Err(SummaryError::UnsupportedShape(format!(
                "dataset has no '{}' variable to plot",
                measure
            )));
        }

        let time_labels = time.labels.clone();
        let defaults = default_selection(dataset, &[time_coord, replicate_coord])?;

        let mut series = Vec::with_capacity(replicates.len());
        for replicate in replicates {
            let mut refs: Vec<(&str, AxisLabel)> = defaults
                .iter()
                .map(|(name, label)| (name.as_str(), label.clone()))
                .collect();
            refs.push((replicate_coord, replicate.clone()));
            let sliced = dataset.select(&refs)?;
            let values = sliced
                .variable(measure)
                .map(|v| v.values.clone())
                .unwrap_or_default();
            series.push(Self {
                replicate,
                time: time_labels.clone(),
                values,
            });
        }
        Ok(series)
    }
}

/// First-label selection for every coordinate not in `keep`
fn default_selection(dataset: &Dataset, keep: &[&str]) -> Result<Vec<(String, AxisLabel)>> {
    dataset
        .coords()
        .iter()
        .filter(|c| !keep.contains(&c.name.as_str()))
        .map(|c| {
            c.labels
                .first()
                .map(|label| (c.name.clone(), label.clone()))
                .ok_or_else(|| {
                    SummaryError::UnsupportedShape(format!(
                        "coordinate '{}' has no labels to select",
                        c.name
                    ))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::array::{Coordinate, Variable};

    fn interval_ds() -> Dataset {
        let coords = vec![
            Coordinate::strs("vertex", ["A", "B"]),
            Coordinate::int_range("step", 0..3),
        ];
        let lower = Variable::new("lower", vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        let median = Variable::new("median", vec![5.0, 6.0, 7.0, 15.0, 16.0, 17.0]);
        let upper = Variable::new("upper", vec![9.0, 9.5, 9.9, 19.0, 19.5, 19.9]);
        Dataset::new(coords, vec![lower, median, upper]).unwrap()
    }

    #[test]
    fn test_interval_series_pins_non_time_coords() {
        let series = IntervalSeries::from_dataset(&interval_ds(), "step").unwrap();
        assert_eq!(
            series.selection,
            vec![("vertex".to_string(), AxisLabel::from("A"))]
        );
        assert_eq!(series.time, vec![AxisLabel::Int(0), AxisLabel::Int(1), AxisLabel::Int(2)]);
        assert_eq!(series.lower, vec![0.0, 1.0, 2.0]);
        assert_eq!(series.median, vec![5.0, 6.0, 7.0]);
        assert_eq!(series.upper, vec![9.0, 9.5, 9.9]);
    }

    #[test]
    fn test_interval_series_requires_all_three_variables() {
        let coords = vec![Coordinate::int_range("step", 0..2)];
        let ds = Dataset::new(coords, vec![Variable::new("median", vec![1.0, 2.0])]).unwrap();
        let err = IntervalSeries::from_dataset(&ds, "step").unwrap_err();
        assert!(matches!(err, SummaryError::UnsupportedShape(_)));
    }

    #[test]
    fn test_replicate_series_per_replicate() {
        let coords = vec![
            Coordinate::int_range("step", 0..2),
            Coordinate::int_range("index", 0..3),
        ];
        // index fastest: value = 10*step + index
        let state = Variable::new("state", vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        let ds = Dataset::new(coords, vec![state]).unwrap();

        let series = ReplicateSeries::from_dataset(&ds, "step", "index", "state").unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series[1].replicate, AxisLabel::Int(1));
        assert_eq!(series[1].values, vec![1.0, 11.0]);
        assert_eq!(series[2].values, vec![2.0, 12.0]);
    }

    #[test]
    fn test_replicate_series_missing_measure_fails() {
        let coords = vec![
            Coordinate::int_range("step", 0..2),
            Coordinate::int_range("index", 0..2),
        ];
        let ds = Dataset::new(coords, vec![Variable::new("state", vec![0.0; 4])]).unwrap();
        let err = ReplicateSeries::from_dataset(&ds, "step", "index", "cases").unwrap_err();
        assert!(matches!(err, SummaryError::UnsupportedShape(_)));
    }
}
