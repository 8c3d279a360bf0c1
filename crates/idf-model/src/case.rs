//! snake_case → camelCase for dynamic subtype columns

use serde_json::{Map, Value};

/// Convert a snake_case column name to camelCase
///
/// `start_timestamp` → `startTimestamp`, `location_id` → `locationId`.
/// Names without underscores pass through unchanged.
#[must_use]
pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;

    for c in name.chars() {
        if c == '_' {
            // leading underscores are dropped too
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Rename every top-level key of a row to camelCase
#[must_use]
pub fn camel_case_keys(row: Map<String, Value>) -> Map<String, Value> {
    row.into_iter()
        .map(|(k, v)| (to_camel_case(&k), v))
        .collect()
}
