use super::json_object;
use crate::error::{ApiError, ApiResult};
use crate::extract::Params;
use crate::identity::CurrentUser;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use idf_model::UserVisualisation;
use idf_validation::{
    authorize_user_vis, authorize_user_vis_list, authorize_view, body, PathIds, Rejection,
};
use serde_json::{json, Value};
use tracing::{debug, info};

pub(super) async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Params(ids): Params<PathIds>,
) -> ApiResult<Json<Value>> {
    let visualisations = authorize_user_vis_list(state.store(), Some(&user), ids).await?;
    Ok(Json(json!({ "userVisualisations": visualisations })))
}

pub(super) async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Params(ids): Params<PathIds>,
    bytes: Bytes,
) -> ApiResult<(StatusCode, Json<UserVisualisation>)> {
    let view = authorize_view(state.store(), Some(&user), ids).await?;
    let new = body::new_user_vis(&json_object(&bytes)?)?;

    let vis = state.store().create_user_vis(view.view_id, new).await?;
    info!(view_id = %vis.view_id, user_vis_id = %vis.user_vis_id, "visualisation created");
    Ok((StatusCode::CREATED, Json(vis)))
}

pub(super) async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Params(ids): Params<PathIds>,
) -> ApiResult<Json<UserVisualisation>> {
    Ok(Json(authorize_user_vis(state.store(), Some(&user), ids).await?))
}

pub(super) async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Params(ids): Params<PathIds>,
    bytes: Bytes,
) -> ApiResult<Json<UserVisualisation>> {
    let vis = authorize_user_vis(state.store(), Some(&user), ids).await?;
    let patch = body::user_vis_patch(&json_object(&bytes)?)?;

    let updated = state.store().update_user_vis(vis.user_vis_id, patch).await?;
    Ok(Json(updated))
}

pub(super) async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Params(ids): Params<PathIds>,
) -> ApiResult<Json<UserVisualisation>> {
    let vis = authorize_user_vis(state.store(), Some(&user), ids).await?;
    let deleted = state
        .store()
        .delete_user_vis(vis.user_vis_id)
        .await?
        .ok_or(ApiError::Rejected(Rejection::UserVisMismatch))?;
    info!(user_vis_id = %deleted.user_vis_id, "visualisation deleted");
    Ok(Json(deleted))
}

/// Records behind a visualisation: its measurement at its location
pub(super) async fn fetch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Params(ids): Params<PathIds>,
) -> ApiResult<Json<Value>> {
    let vis = authorize_user_vis(state.store(), Some(&user), ids).await?;
    let measurement = state
        .store()
        .get_measurement(vis.measurement_id)
        .await?
        .ok_or(ApiError::Rejected(Rejection::MeasurementNotFound))?;

    let records = state
        .store()
        .fetch_records(&measurement, vis.location_id)
        .await?;
    debug!(
        user_vis_id = %vis.user_vis_id,
        records = records.len(),
        "records fetched"
    );
    Ok(Json(json!({ "records": records })))
}
