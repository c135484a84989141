//! Prediction interval demo on a synthetic outbreak
//!
//! Generates a small stochastic epidemic dataset (compartment x vertex x age
//! x risk x timestep x replicate), computes a 5%-90% prediction interval per
//! compartment, vertex and timestep, and prints chart-ready JSON payloads for
//! the interval band and the per-replicate spaghetti series.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use episummary::core::error::Result;
use episummary::core::roles::CoordinateRoles;
use episummary::dataset::array::{Coordinate, Dataset, Variable};
use episummary::present::adapter::{JsonAdapter, PresentationAdapter};
use episummary::present::series::IntervalSeries;
use episummary::summary::calculator::SummaryCalculator;

const STEPS: i64 = 30;
const REPLICATES: i64 = 20;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("episummary=debug")
        .init();

    tracing::info!("Generating synthetic outbreak data...");
    let dataset = synthetic_outbreak(12345)?;

    let roles = CoordinateRoles::new(
        "compt",
        ["age", "risk", "vertex"],
        "index",
        "step",
        "state",
    );
    let calc = SummaryCalculator::new(dataset, roles)?;

    let interval = calc.prediction_interval(&["compt", "vertex", "step"], "state", 0.9, 0.05)?;
    let band = IntervalSeries::from_dataset(&interval, "step")?;
    println!("{}", JsonAdapter.render_interval(&band)?);

    let spaghetti = calc.spaghetti_series(Some((&["compt", "vertex", "step", "index"], "state")))?;
    println!("{}", JsonAdapter.render_spaghetti(&spaghetti)?);

    Ok(())
}

/// Seeded infection-count surface with a logistic epidemic curve per
/// replicate plus multiplicative noise
fn synthetic_outbreak(seed: u64) -> Result<Dataset> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let coords = vec![
        Coordinate::strs("compt", ["S", "I", "R"]),
        Coordinate::strs("vertex", ["north", "south"]),
        Coordinate::int_range("age", 0..2),
        Coordinate::int_range("risk", 0..2),
        Coordinate::int_range("step", 0..STEPS),
        Coordinate::int_range("index", 0..REPLICATES),
    ];

    // replicate-level variation: each run gets its own growth rate
    let growth: Vec<f64> = (0..REPLICATES)
        .map(|_| rng.gen_range(0.25..0.45))
        .collect();

    let n: usize = coords.iter().map(Coordinate::len).product();
    let mut values = Vec::with_capacity(n);
    for compt in 0..3i64 {
        for _vertex in 0..2i64 {
            for _age in 0..2i64 {
                for _risk in 0..2i64 {
                    for step in 0..STEPS {
                        for index in 0..REPLICATES {
                            let r = growth[index as usize];
                            let t = step as f64;
                            let infected = 1000.0 / (1.0 + (-r * (t - 15.0)).exp());
                            let base = match compt {
                                0 => 1000.0 - infected,
                                1 => infected * (-0.05 * t).exp(),
                                _ => infected * (1.0 - (-0.05 * t).exp()),
                            };
                            let noise = rng.gen_range(0.9..1.1);
                            values.push((base * noise).max(0.0));
                        }
                    }
                }
            }
        }
    }

    Dataset::new(coords, vec![Variable::new("state", values)])
}
