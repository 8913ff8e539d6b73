use serde_json::Value;

use crate::classifier::{parse_wire_date, price_map};

/// Dataset label rendered next to the plotted series.
pub const CHART_SERIES_NAME: &str = "Estimated price (€)";

/// Display format for chart axis labels (`DD/MM/YY`).
const LABEL_DATE_FORMAT: &str = "%d/%m/%y";

/// Plot-ready series derived from a date-to-price mapping.
///
/// Labels are chronologically sorted and `values` stays index-aligned with
/// `labels`, independent of the source mapping's key order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub name: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    /// Number of plotted points.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Builds a chart series from a tool-result payload.
///
/// Returns `None` when the payload does not match the plottable shape; this
/// re-checks what the classifier checks so callers cannot feed the builder
/// unvalidated content by accident.
pub fn build_series(content: &str) -> Option<ChartSeries> {
    let trimmed = content.trim();
    if !trimmed.starts_with('{') {
        return None;
    }

    let parsed = serde_json::from_str::<Value>(trimmed).ok()?;
    let entries = price_map(&parsed)?;

    let mut points = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let date = parse_wire_date(key)?;
        let price = value.as_f64()?;
        points.push((date, price));
    }

    // Lexical order on DD-MM-YYYY is wrong; sort on the parsed date.
    points.sort_by_key(|(date, _)| *date);

    let (labels, values) = points
        .into_iter()
        .map(|(date, price)| (date.format(LABEL_DATE_FORMAT).to_string(), price))
        .unzip();

    Some(ChartSeries {
        name: CHART_SERIES_NAME.to_string(),
        labels,
        values,
    })
}
