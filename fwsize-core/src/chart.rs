//! Chart figure construction
//!
//! Builds the plotly.js figure for one hardware target: a step line of the
//! firmware size on top and a bar chart of the per-commit change below.
//! Both traces carry the short commit hash as `customdata` so the page's
//! click handler can link back to the commit.

use crate::series::SeriesPoint;
use crate::window::ViewWindow;
use anyhow::{Context, Result};
use serde_json::{json, Value};

/// Size axis ticks are labelled in whole kilobytes, 0 through 255 KB
const KB_TICK_COUNT: i64 = 256;

/// Layout domains of a two-row subplot grid with default spacing
const TOP_DOMAIN: [f64; 2] = [0.575, 1.0];
const BOTTOM_DOMAIN: [f64; 2] = [0.0, 0.425];

/// A plotly.js figure: trace list plus layout
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub data: Value,
    pub layout: Value,
}

impl Figure {
    pub fn data_json(&self) -> Result<String> {
        serde_json::to_string(&self.data).context("failed to serialize figure data")
    }

    pub fn layout_json(&self) -> Result<String> {
        serde_json::to_string(&self.layout).context("failed to serialize figure layout")
    }
}

/// Chart title for a target, e.g. "Pybricks primehub firmware size"
pub fn chart_title(title_prefix: &str, target: &str) -> String {
    format!("{} {} firmware size", title_prefix, target)
}

/// Build the two-panel figure for `target`
pub fn build_figure(
    title_prefix: &str,
    target: &str,
    points: &[SeriesPoint],
    view: &ViewWindow,
) -> Figure {
    let indexes: Vec<usize> = points.iter().map(|p| p.index).collect();
    let sizes: Vec<i64> = points.iter().map(|p| p.size).collect();
    let deltas: Vec<i64> = points.iter().map(|p| p.delta).collect();
    let messages: Vec<&str> = points.iter().map(|p| p.message.as_str()).collect();
    let shas: Vec<&str> = points.iter().map(|p| p.short_id.as_str()).collect();

    let size_trace = json!({
        "type": "scatter",
        "name": "Size",
        "x": indexes,
        "y": sizes,
        "line": { "shape": "hv" },
        "mode": "lines+markers",
        "hovertext": messages,
        "hoverinfo": "y+text",
        "customdata": shas,
        "xaxis": "x",
        "yaxis": "y",
    });

    let delta_trace = json!({
        "type": "bar",
        "name": "Delta",
        "x": indexes,
        "y": deltas,
        "hovertext": messages,
        "hoverinfo": "text",
        "customdata": shas,
        "xaxis": "x2",
        "yaxis": "y2",
    });

    let (tickvals, ticktext): (Vec<i64>, Vec<String>) = (0..KB_TICK_COUNT)
        .map(|kb| (kb * 1024, format!("{}KB", kb)))
        .unzip();

    let layout = json!({
        "title": {
            "text": chart_title(title_prefix, target),
            "font": { "size": 36 },
        },
        "showlegend": false,
        "dragmode": "zoom",
        "xaxis": {
            "anchor": "y",
            "domain": [0.0, 1.0],
            "showticklabels": false,
            "range": view.x,
        },
        "yaxis": {
            "anchor": "x",
            "domain": TOP_DOMAIN,
            "exponentformat": "none",
            "tickmode": "array",
            "tickvals": tickvals,
            "ticktext": ticktext,
            "range": view.size,
        },
        "xaxis2": {
            "anchor": "y2",
            "domain": [0.0, 1.0],
            "showticklabels": false,
            "range": view.x,
        },
        "yaxis2": {
            "anchor": "x2",
            "domain": BOTTOM_DOMAIN,
            "range": view.delta,
        },
    });

    Figure {
        data: json!([size_trace, delta_trace]),
        layout,
    }
}
