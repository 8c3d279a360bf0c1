//! Existence checks for read-only reference data
//!
//! Measurements and locations have no owner; a well-formed id only needs to
//! exist.

use crate::chain::{ChainError, IdParam, Rejection};
use idf_model::{Location, LocationId, Measurement, MeasurementId};
use idf_store::Store;

fn parse<T: std::str::FromStr>(param: IdParam, raw: &str) -> Result<T, Rejection> {
    raw.parse().map_err(|_| Rejection::Format {
        param,
        value: raw.to_string(),
    })
}

/// Measurement named by a `measurementId` path segment
pub async fn resolve_measurement(store: &dyn Store, raw: &str) -> Result<Measurement, ChainError> {
    let id: MeasurementId = parse(IdParam::MeasurementId, raw)?;
    store
        .get_measurement(id)
        .await?
        .ok_or(ChainError::Rejected(Rejection::MeasurementNotFound))
}

/// Location named by a `locationId` path segment
pub async fn resolve_location(store: &dyn Store, raw: &str) -> Result<Location, ChainError> {
    let id: LocationId = parse(IdParam::LocationId, raw)?;
    store.get_location(id).await?.ok_or_else(|| {
        ChainError::Rejected(Rejection::LocationNotFound {
            location_id: raw.to_string(),
        })
    })
}
