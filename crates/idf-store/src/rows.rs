//! Decoding of rows whose columns are only known at runtime
//!
//! Subtype tables differ per location and measurement kind. Such rows are
//! selected as one JSON object; the typed base columns are taken out and the
//! rest is camelCased into an attribute map.

use crate::error::{Result, StoreError};
use idf_model::{
    camel_case_keys, Location, LocationDetail, LocationId, LocationType, MeasurementRecord,
    VisualisationKind,
};
use serde_json::{Map, Value};

/// Quote a table name for interpolation into SQL
///
/// Postgres rules: wrap in double quotes and double any embedded quote. Empty
/// names and names containing NUL cannot be expressed and are rejected.
pub fn quote_ident(name: &str) -> Result<String> {
    if name.is_empty() || name.contains('\0') {
        return Err(StoreError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

fn take_i64(row: &mut Map<String, Value>, column: &str) -> Result<i64> {
    row.remove(column)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| StoreError::MalformedRow(format!("missing integer column '{column}'")))
}

fn take_string(row: &mut Map<String, Value>, column: &str) -> Result<String> {
    match row.remove(column) {
        Some(Value::String(s)) => Ok(s),
        _ => Err(StoreError::MalformedRow(format!(
            "missing text column '{column}'"
        ))),
    }
}

fn take_opt_string(row: &mut Map<String, Value>, column: &str) -> Option<String> {
    match row.remove(column) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

pub(crate) fn into_object(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::MalformedRow(format!(
            "expected an object row, got {other}"
        ))),
    }
}

/// Build a location plus subtype attributes from a merged snake_case row
pub(crate) fn location_detail(mut row: Map<String, Value>) -> Result<LocationDetail> {
    let id = take_i64(&mut row, "location_id")?;
    let location_id = i32::try_from(id)
        .map(LocationId)
        .map_err(|_| StoreError::MalformedRow(format!("location id out of range: {id}")))?;
    let name = take_string(&mut row, "name")?;
    let description = take_opt_string(&mut row, "description");
    let location_type = take_string(&mut row, "location_type")?
        .parse::<LocationType>()
        .map_err(|e| StoreError::MalformedRow(e.to_string()))?;

    Ok(LocationDetail {
        location: Location {
            location_id,
            name,
            description,
            location_type,
        },
        attributes: camel_case_keys(row),
    })
}

pub(crate) fn measurement_record(mut row: Map<String, Value>) -> Result<MeasurementRecord> {
    let measurement_record_id = take_i64(&mut row, "measurement_record_id")?;
    Ok(MeasurementRecord {
        measurement_record_id,
        values: camel_case_keys(row),
    })
}

pub(crate) fn visualisation_kind(mut row: Map<String, Value>) -> Result<VisualisationKind> {
    let visualisation_name = take_string(&mut row, "visualisation_name")?;
    Ok(VisualisationKind {
        visualisation_name,
        attributes: camel_case_keys(row),
    })
}
