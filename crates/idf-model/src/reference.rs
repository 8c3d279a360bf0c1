//! Read-only reference data: measurements, locations and their records
//!
//! Locations and measurement records are stored as a base table plus one
//! subtype table per kind (`weather_station`, `rainfall_record`, ...). Base
//! columns are typed here; subtype columns vary per kind and travel as a
//! camelCase JSON map flattened into the record.

use crate::ids::{LocationId, MeasurementId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A measured quantity, e.g. rainfall or temperature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub measurement_id: MeasurementId,
    pub name: String,
    pub description: Option<String>,
    /// Selects the `<measurement_type>_record` subtype table
    pub measurement_type: String,
}

impl Measurement {
    /// Subtype table holding the values of this measurement's records
    #[must_use]
    pub fn record_table(&self) -> String {
        format!("{}_record", self.measurement_type)
    }
}

/// Kind of geographic location; each kind has its own subtype table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    LocalGovernmentArea,
    State,
    Country,
    WeatherStation,
}

/// Unknown location type in a query or row
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown location type: '{0}'")]
pub struct LocationTypeError(pub String);

impl LocationType {
    /// All kinds, in the order the query aliases are advertised
    pub const ALL: [LocationType; 4] = [
        LocationType::LocalGovernmentArea,
        LocationType::State,
        LocationType::Country,
        LocationType::WeatherStation,
    ];

    /// Subtype table name, also the value of `location.location_type`
    #[inline]
    #[must_use]
    pub fn table_name(self) -> &'static str {
        match self {
            LocationType::LocalGovernmentArea => "local_government_area",
            LocationType::State => "state",
            LocationType::Country => "country",
            LocationType::WeatherStation => "weather_station",
        }
    }

    /// Short name accepted in `?type=` query strings
    #[inline]
    #[must_use]
    pub fn query_alias(self) -> &'static str {
        match self {
            LocationType::LocalGovernmentArea => "lga",
            LocationType::State => "state",
            LocationType::Country => "country",
            LocationType::WeatherStation => "weather",
        }
    }

    /// Resolve a `?type=` alias
    #[must_use]
    pub fn from_query_alias(alias: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.query_alias() == alias)
    }

    /// Comma separated list of accepted aliases
    #[must_use]
    pub fn query_aliases() -> String {
        Self::ALL
            .iter()
            .map(|t| t.query_alias())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for LocationType {
    type Err = LocationTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.table_name() == s)
            .ok_or_else(|| LocationTypeError(s.to_string()))
    }
}

/// Base location row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub location_id: LocationId,
    pub name: String,
    pub description: Option<String>,
    pub location_type: LocationType,
}

/// Location joined with its subtype row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationDetail {
    #[serde(flatten)]
    pub location: Location,
    /// Subtype columns, camelCased
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Chart kind available for a measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualisationKind {
    pub visualisation_name: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// One measurement record joined with its subtype values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRecord {
    pub measurement_record_id: i64,
    /// Base and subtype columns other than the id, camelCased
    #[serde(flatten)]
    pub values: Map<String, Value>,
}
