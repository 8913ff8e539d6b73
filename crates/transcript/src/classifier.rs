use chrono::NaiveDate;
use serde_json::{Map, Value};

/// Wire field holding the date-to-price mapping inside a tool result.
pub const GRAPH_DATA_FIELD: &str = "graph_data";

/// Day-first date format used by the price tool (`DD-MM-YYYY`).
pub(crate) const WIRE_DATE_FORMAT: &str = "%d-%m-%Y";

/// Decides whether a tool-result payload can be turned into a chart.
///
/// Classification is best-effort: malformed JSON or an unexpected shape is
/// never an error, it just means "not plottable". An empty `graph_data`
/// mapping passes vacuously (there are no entries to falsify).
pub fn is_plottable(content: &str) -> bool {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return false;
    }

    // Cheap rejection before paying for a full parse.
    if !trimmed.starts_with('{') {
        return false;
    }

    let Ok(parsed) = serde_json::from_str::<Value>(trimmed) else {
        tracing::trace!("tool payload is not valid JSON, excluding from charts");
        return false;
    };

    price_map(&parsed).is_some_and(|entries| {
        entries
            .iter()
            .all(|(key, value)| parse_wire_date(key).is_some() && value.is_number())
    })
}

/// Returns the `graph_data` mapping when the payload is an object carrying one.
pub(crate) fn price_map(payload: &Value) -> Option<&Map<String, Value>> {
    payload.get(GRAPH_DATA_FIELD)?.as_object()
}

/// Parses a `DD-MM-YYYY` key into a real calendar date.
///
/// chrono's parser is strict here, so impossible dates such as `31-02-2024`
/// are rejected rather than rolled over.
pub(crate) fn parse_wire_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, WIRE_DATE_FORMAT).ok()
}
