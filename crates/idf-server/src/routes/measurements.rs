use super::locations::TypeQuery;
use crate::error::ApiResult;
use crate::extract::{Params, QueryParams};
use crate::identity::CurrentUser;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use idf_model::Measurement;
use idf_validation::{body, resolve_measurement};
use serde_json::{json, Value};

pub(super) async fn list(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let measurements = state.store().list_measurements().await?;
    Ok(Json(json!({ "measurements": measurements })))
}

pub(super) async fn get(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Params(measurement_id): Params<String>,
) -> ApiResult<Json<Measurement>> {
    Ok(Json(resolve_measurement(state.store(), &measurement_id).await?))
}

/// Chart kinds available for a measurement
pub(super) async fn visualisations(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Params(measurement_id): Params<String>,
) -> ApiResult<Json<Value>> {
    let measurement = resolve_measurement(state.store(), &measurement_id).await?;
    let visualisations = state
        .store()
        .list_measurement_visualisations(measurement.measurement_id)
        .await?;
    Ok(Json(json!({ "visualisations": visualisations })))
}

/// Locations of one type with records for a measurement
pub(super) async fn locations(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Params(measurement_id): Params<String>,
    QueryParams(query): QueryParams<TypeQuery>,
) -> ApiResult<Json<Value>> {
    let measurement = resolve_measurement(state.store(), &measurement_id).await?;
    let location_type = body::location_type(query.location_type.as_deref())?;
    let locations = state
        .store()
        .list_measurement_locations(measurement.measurement_id, location_type)
        .await?;
    Ok(Json(json!({ "locations": locations })))
}
