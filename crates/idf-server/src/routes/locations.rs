use crate::error::{ApiError, ApiResult};
use crate::extract::{Params, QueryParams};
use crate::identity::CurrentUser;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use idf_model::LocationDetail;
use idf_validation::{body, resolve_location, Rejection};
use serde::Deserialize;
use serde_json::{json, Value};

/// `?type=` filter on location listings
#[derive(Debug, Default, Deserialize)]
pub(super) struct TypeQuery {
    #[serde(rename = "type")]
    pub(super) location_type: Option<String>,
}

pub(super) async fn list(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    QueryParams(query): QueryParams<TypeQuery>,
) -> ApiResult<Json<Value>> {
    let location_type = body::location_type(query.location_type.as_deref())?;
    let locations = state.store().list_locations(location_type).await?;
    Ok(Json(json!({ "locations": locations })))
}

pub(super) async fn get(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Params(location_id): Params<String>,
) -> ApiResult<Json<LocationDetail>> {
    let location = resolve_location(state.store(), &location_id).await?;
    let detail = state
        .store()
        .get_location_detail(&location)
        .await?
        .ok_or(ApiError::Rejected(Rejection::LocationNotFound { location_id }))?;
    Ok(Json(detail))
}
