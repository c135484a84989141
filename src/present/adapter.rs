//! Adapter contract for chart hosts
//!
//! The summary pipeline ends at serializable series; turning them into
//! interactive charts is an external collaborator's job. [`JsonAdapter`]
//! emits chart-ready trace payloads for hosts that speak JSON.

use serde_json::json;

use crate::core::error::Result;
use crate::present::series::{IntervalSeries, ReplicateSeries};

pub trait PresentationAdapter {
    fn render_interval(&self, series: &IntervalSeries) -> Result<String>;
    fn render_spaghetti(&self, series: &[ReplicateSeries]) -> Result<String>;
}

/// Renders series as JSON trace payloads
pub struct JsonAdapter;

impl PresentationAdapter for JsonAdapter {
    fn render_interval(&self, series: &IntervalSeries) -> Result<String> {
        // upper first, then lower filling down to it, then the median line
        let payload = json!({
            "selection": series.selection,
            "traces": [
                { "name": "upper", "mode": "lines", "x": series.time, "y": series.upper },
                { "name": "lower", "mode": "lines", "fill": "tonexty", "x": series.time, "y": series.lower },
                { "name": "median", "mode": "lines", "x": series.time, "y": series.median },
            ],
        });
        Ok(serde_json::to_string_pretty(&payload)?)
    }

    fn render_spaghetti(&self, series: &[ReplicateSeries]) -> Result<String> {
        let traces: Vec<serde_json::Value> = series
            .iter()
            .map(|s| {
                json!({
                    "name": s.replicate.to_string(),
                    "mode": "lines",
                    "x": s.time,
                    "y": s.values,
                })
            })
            .collect();
        Ok(serde_json::to_string_pretty(&json!({ "traces": traces }))?)
    }
}
