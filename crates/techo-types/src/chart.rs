//! Chart configuration.
//!
//! Chart cells store their configuration as JSON text (what the user edits)
//! and carry the parsed form alongside it. The shape follows the usual
//! chart-library convention of `{ type, data: { labels, datasets }, options }`;
//! only `type` is required, everything else is optional and unknown keys are
//! kept so renderers can reach for options this crate does not model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parsed chart configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Chart type (`bar`, `line`, `pie`, ...).
    #[serde(rename = "type")]
    pub chart_type: String,

    /// Labels and datasets.
    #[serde(default)]
    pub data: ChartData,

    /// Renderer options, passed through untouched.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub options: Value,
}

/// The `data` section of a chart configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    /// Category labels (strings or numbers).
    #[serde(default)]
    pub labels: Vec<Value>,

    /// One or more series.
    #[serde(default)]
    pub datasets: Vec<Dataset>,
}

/// A single data series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Points: plain numbers, or objects such as `{ "x": .., "y": .. }`.
    #[serde(default)]
    pub data: Vec<Value>,

    /// Styling and other per-series keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChartConfig {
    /// Parse configuration text.
    ///
    /// The error message is user-facing and ends up in the cell's `error`
    /// field: malformed JSON is prefixed `"Invalid JSON: "`, well-formed JSON
    /// of the wrong shape is prefixed `"Invalid chart config: "`.
    pub fn parse(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| {
            use serde_json::error::Category;
            match e.classify() {
                Category::Data => format!("Invalid chart config: {}", e),
                Category::Syntax | Category::Eof | Category::Io => {
                    format!("Invalid JSON: {}", e)
                }
            }
        })
    }

    /// Label text for category `index`, falling back to its position.
    pub fn label(&self, index: usize) -> String {
        match self.data.labels.get(index) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => format!("#{}", index + 1),
        }
    }
}

impl Dataset {
    /// Numeric values of this series.
    ///
    /// Plain numbers are used directly; `{ "y": n }` objects contribute `n`.
    /// Anything else maps to `None` so callers can keep positions aligned
    /// with labels.
    pub fn values(&self) -> Vec<Option<f64>> {
        self.data
            .iter()
            .map(|v| match v {
                Value::Number(n) => n.as_f64(),
                Value::Object(o) => o.get("y").and_then(Value::as_f64),
                _ => None,
            })
            .collect()
    }
}

/// Configuration given to freshly inserted chart cells.
///
/// Pretty-printed with two-space indentation so it reads well in the editor,
/// and valid on first run so the cell renders something immediately.
pub fn default_chart_template() -> String {
    let template = serde_json::json!({
        "type": "bar",
        "data": {
            "labels": ["Red", "Blue", "Yellow", "Green", "Purple", "Orange"],
            "datasets": [{
                "label": "# of Votes",
                "data": [12, 19, 3, 5, 2, 3],
                "backgroundColor": [
                    "rgba(255, 99, 132, 0.2)",
                    "rgba(54, 162, 235, 0.2)",
                    "rgba(255, 206, 86, 0.2)",
                    "rgba(75, 192, 192, 0.2)",
                    "rgba(153, 102, 255, 0.2)",
                    "rgba(255, 159, 64, 0.2)"
                ],
                "borderColor": [
                    "rgba(255, 99, 132, 1)",
                    "rgba(54, 162, 235, 1)",
                    "rgba(255, 206, 86, 1)",
                    "rgba(75, 192, 192, 1)",
                    "rgba(153, 102, 255, 1)",
                    "rgba(255, 159, 64, 1)"
                ],
                "borderWidth": 1
            }]
        },
        "options": {
            "scales": {
                "y": { "beginAtZero": true }
            },
            "responsive": true,
            "maintainAspectRatio": false
        }
    });
    serde_json::to_string_pretty(&template).unwrap_or_else(|_| template.to_string())
}
