//! Integration tests for the full summary pipeline
//!
//! These tests verify the end-to-end flow on datasets with known values:
//! - grouped sums match totals computed by hand across collapsed coordinates
//! - between-simulation quantiles match an in-memory reference
//! - prediction intervals are ordered and come back in labeled-array form
//! - grouping invariants fail fast, before any aggregation runs
//! - spaghetti series slice one trajectory per replicate

use episummary::aggregate::VALUE_COLUMN;
use episummary::core::error::SummaryError;
use episummary::core::roles::CoordinateRoles;
use episummary::core::types::AxisLabel;
use episummary::dataset::array::{Coordinate, Dataset, Variable};
use episummary::present::adapter::{JsonAdapter, PresentationAdapter};
use episummary::present::series::IntervalSeries;
use episummary::summary::calculator::SummaryCalculator;
use episummary::table::partition::PartitionedTable;

/// age in {0,1}, risk in {0,1}, vertex in {A,B}, step in {0,1,2},
/// index in {0,1,2}; every cell encodes its own coordinates so aggregates
/// can be computed by hand
fn known_dataset() -> Dataset {
    let coords = vec![
        Coordinate::int_range("age", 0..2),
        Coordinate::int_range("risk", 0..2),
        Coordinate::strs("vertex", ["A", "B"]),
        Coordinate::int_range("step", 0..3),
        Coordinate::int_range("index", 0..3),
    ];
    let mut values = Vec::new();
    for age in 0..2 {
        for risk in 0..2 {
            for vertex in 0..2 {
                for step in 0..3 {
                    for index in 0..3 {
                        values.push(cell_value(age, risk, vertex, step, index));
                    }
                }
            }
        }
    }
    Dataset::new(coords, vec![Variable::new("state", values)]).unwrap()
}

fn cell_value(age: i64, risk: i64, vertex: i64, step: i64, index: i64) -> f64 {
    (1000 * vertex + 100 * step + 10 * index + 2 * age + risk) as f64
}

fn roles() -> CoordinateRoles {
    CoordinateRoles::new(
        Vec::<String>::new(),
        ["age", "risk", "vertex"],
        "index",
        "step",
        "state",
    )
}

fn calculator() -> SummaryCalculator {
    SummaryCalculator::new(known_dataset(), roles()).unwrap()
}

fn int_label(label: &AxisLabel) -> i64 {
    match label {
        AxisLabel::Int(v) => *v,
        other => panic!("expected an integer label, got {:?}", other),
    }
}

fn vertex_code(label: &AxisLabel) -> i64 {
    match label {
        AxisLabel::Str(s) if s == "A" => 0,
        AxisLabel::Str(s) if s == "B" => 1,
        other => panic!("unexpected vertex label {:?}", other),
    }
}

fn grouped_values(table: &PartitionedTable) -> &[f64] {
    &table.measure_column(VALUE_COLUMN).unwrap().values
}

#[test]
fn test_sum_over_groups_matches_manual_sums() {
    let calc = calculator();
    let out = calc
        .sum_over_groups(&["vertex", "step", "index"], "state")
        .unwrap();

    // 2x3x3 retained groups, age x risk collapsed
    assert_eq!(out.n_rows(), 18);

    let vertex = out.key_column("vertex").unwrap();
    let step = out.key_column("step").unwrap();
    let index = out.key_column("index").unwrap();
    let values = grouped_values(&out);

    for row in 0..out.n_rows() {
        let v = vertex_code(&vertex.labels[row]);
        let s = int_label(&step.labels[row]);
        let i = int_label(&index.labels[row]);
        // sum over age x risk: four cells sharing (v, s, i), plus
        // sum of (2*age + risk) over {0,1}^2 = 6
        let expected = 4.0 * (1000 * v + 100 * s + 10 * i) as f64 + 6.0;
        assert_eq!(
            values[row], expected,
            "wrong sum for vertex={} step={} index={}",
            v, s, i
        );
    }
}

#[test]
fn test_quantile_between_sims_matches_reference_median() {
    let calc = calculator();
    let out = calc
        .quantile_between_sims(&["vertex", "step"], "state", 0.5)
        .unwrap();

    assert_eq!(out.n_rows(), 6);

    let vertex = out.key_column("vertex").unwrap();
    let step = out.key_column("step").unwrap();
    let values = grouped_values(&out);

    for row in 0..out.n_rows() {
        let v = vertex_code(&vertex.labels[row]);
        let s = int_label(&step.labels[row]);
        // replicate sums are X, X+40, X+80 with X = 4*(1000v + 100s) + 6,
        // so the median is X + 40
        let expected = 4.0 * (1000 * v + 100 * s) as f64 + 6.0 + 40.0;
        assert!(
            (values[row] - expected).abs() < 1e-6,
            "median for vertex={} step={}: got {}, want {}",
            v,
            s,
            values[row],
            expected
        );
    }
}

#[test]
fn test_quantile_interpolates_across_replicates() {
    let calc = calculator();
    let out = calc
        .quantile_between_sims(&["vertex", "step"], "state", 0.25)
        .unwrap();

    let values = grouped_values(&out);
    // replicate sums per group are X, X+40, X+80; rank 0.25*(3-1) = 0.5
    // falls midway between the first two order statistics
    let x = 4.0 * 0.0 + 6.0;
    assert!(
        (values[0] - (x + 20.0)).abs() < 1e-6,
        "got {}",
        values[0]
    );
}

#[test]
fn test_prediction_interval_is_ordered_and_labeled() {
    let calc = calculator();
    let interval = calc
        .prediction_interval(&["vertex", "step"], "state", 0.9, 0.05)
        .unwrap();

    // labeled-array form, indexed by the groupers
    assert_eq!(interval.coord("vertex").unwrap().len(), 2);
    assert_eq!(interval.coord("step").unwrap().len(), 3);

    let lower = &interval.variable("lower").unwrap().values;
    let median = &interval.variable("median").unwrap().values;
    let upper = &interval.variable("upper").unwrap().values;
    assert_eq!(lower.len(), 6);

    for cell in 0..lower.len() {
        assert!(
            !lower[cell].is_nan() && !median[cell].is_nan() && !upper[cell].is_nan(),
            "cell {} should be covered by every quantile",
            cell
        );
        assert!(
            lower[cell] <= median[cell] && median[cell] <= upper[cell],
            "cell {}: interval not ordered ({} / {} / {})",
            cell,
            lower[cell],
            median[cell],
            upper[cell]
        );
    }

    // replicate sums are X, X+40, X+80: q(0.05) -> X+4, q(0.9) -> X+72
    let x = |v: i64, s: i64| 4.0 * (1000 * v + 100 * s) as f64 + 6.0;
    assert!((lower[0] - (x(0, 0) + 4.0)).abs() < 1e-6, "got {}", lower[0]);
    assert!((upper[0] - (x(0, 0) + 72.0)).abs() < 1e-6, "got {}", upper[0]);
}

#[test]
fn test_sum_without_replicate_grouper_fails_fast() {
    let calc = calculator();
    let err = calc.sum_over_groups(&["vertex", "step"], "state").unwrap_err();
    assert!(
        matches!(err, SummaryError::InvariantViolation(_)),
        "got {:?}",
        err
    );
}

#[test]
fn test_quantile_with_replicate_grouper_fails_fast() {
    let calc = calculator();
    let err = calc
        .quantile_between_sims(&["vertex", "step", "index"], "state", 0.5)
        .unwrap_err();
    assert!(
        matches!(err, SummaryError::InvariantViolation(_)),
        "got {:?}",
        err
    );
}

#[test]
fn test_inverted_interval_range_fails_before_aggregation() {
    let calc = calculator();
    let err = calc
        .prediction_interval(&["vertex", "step"], "state", 0.2, 0.3)
        .unwrap_err();
    assert!(matches!(err, SummaryError::InvalidRange { .. }), "got {:?}", err);
}

#[test]
fn test_unknown_measure_fails_fast() {
    let calc = calculator();
    let err = calc
        .sum_over_groups(&["vertex", "step", "index"], "cases")
        .unwrap_err();
    assert!(matches!(err, SummaryError::UnknownMeasure { .. }), "got {:?}", err);
}

#[test]
fn test_spaghetti_series_on_raw_dataset() {
    let calc = calculator();
    let series = calc.spaghetti_series(None).unwrap();

    assert_eq!(series.len(), 3, "one series per replicate");
    for (i, s) in series.iter().enumerate() {
        assert_eq!(s.replicate, AxisLabel::Int(i as i64));
        // defaults pin age=0, risk=0, vertex=A; the trajectory follows step
        let expected: Vec<f64> = (0..3)
            .map(|step| cell_value(0, 0, 0, step, i as i64))
            .collect();
        assert_eq!(s.values, expected, "replicate {} trajectory", i);
    }
}

#[test]
fn test_spaghetti_series_with_grouping() {
    let calc = calculator();
    let series = calc
        .spaghetti_series(Some((&["vertex", "step", "index"], "state")))
        .unwrap();

    assert_eq!(series.len(), 3);
    // vertex pinned to A; each point is the age x risk sum for (step, index)
    let s2 = &series[2];
    let expected: Vec<f64> = (0..3)
        .map(|step| 4.0 * (100 * step + 10 * 2) as f64 + 6.0)
        .collect();
    assert_eq!(s2.values, expected);
}

#[test]
fn test_spaghetti_rejects_multiple_replicate_coordinates() {
    let coords = vec![
        Coordinate::int_range("age", 0..2),
        Coordinate::int_range("step", 0..2),
        Coordinate::int_range("index", 0..2),
        Coordinate::int_range("chain", 0..2),
    ];
    let n: usize = coords.iter().map(Coordinate::len).product();
    let ds = Dataset::new(coords, vec![Variable::new("state", vec![1.0; n])]).unwrap();
    let roles = CoordinateRoles::new(
        Vec::<String>::new(),
        "age",
        ["index", "chain"],
        "step",
        "state",
    );
    let calc = SummaryCalculator::new(ds, roles).unwrap();

    let err = calc.spaghetti_series(None).unwrap_err();
    assert!(matches!(err, SummaryError::UnsupportedShape(_)), "got {:?}", err);
}

#[test]
fn test_interval_flows_through_to_render_payload() {
    let calc = calculator();
    let interval = calc
        .prediction_interval(&["vertex", "step"], "state", 0.9, 0.05)
        .unwrap();

    let band = IntervalSeries::from_dataset(&interval, "step").unwrap();
    assert_eq!(
        band.selection,
        vec![("vertex".to_string(), AxisLabel::from("A"))]
    );
    assert_eq!(band.time.len(), 3);

    let payload = JsonAdapter.render_interval(&band).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(parsed["traces"].as_array().unwrap().len(), 3);
}
