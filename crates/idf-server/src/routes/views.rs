use super::json_object;
use crate::error::{ApiError, ApiResult};
use crate::extract::Params;
use crate::identity::CurrentUser;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use idf_model::UserView;
use idf_store::StoreError;
use idf_validation::{
    authorize_view, authorize_view_list, authorize_workspace, body, FieldError, FieldErrors,
    PathIds, Rejection,
};
use serde_json::{json, Value};
use tracing::info;

fn duplicate_name(name: &str) -> ApiError {
    FieldErrors::one(FieldError::body(
        "viewName",
        name,
        format!("View with name '{name}' already exists!"),
    ))
    .into()
}

pub(super) async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Params(ids): Params<PathIds>,
) -> ApiResult<Json<Value>> {
    let views = authorize_view_list(state.store(), Some(&user), ids).await?;
    Ok(Json(json!({ "userViews": views })))
}

pub(super) async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Params(ids): Params<PathIds>,
    bytes: Bytes,
) -> ApiResult<(StatusCode, Json<UserView>)> {
    let workspace = authorize_workspace(state.store(), Some(&user), ids).await?;
    let new = body::new_view(&json_object(&bytes)?)?;
    let name = new.view_name.clone();

    let view = state
        .store()
        .create_view(workspace.workspace_id, new)
        .await?
        .ok_or_else(|| duplicate_name(&name))?;
    info!(workspace_id = %view.workspace_id, view_id = %view.view_id, "view created");
    Ok((StatusCode::CREATED, Json(view)))
}

pub(super) async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Params(ids): Params<PathIds>,
) -> ApiResult<Json<UserView>> {
    Ok(Json(authorize_view(state.store(), Some(&user), ids).await?))
}

pub(super) async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Params(ids): Params<PathIds>,
    bytes: Bytes,
) -> ApiResult<Json<UserView>> {
    let view = authorize_view(state.store(), Some(&user), ids).await?;
    let patch = body::view_patch(&json_object(&bytes)?)?;
    let name = patch.view_name.clone();

    let updated = state
        .store()
        .update_view(view.view_id, patch)
        .await
        .map_err(|e| match (e, name) {
            (StoreError::UniqueViolation { .. }, Some(name)) => duplicate_name(&name),
            (e, _) => e.into(),
        })?;
    Ok(Json(updated))
}

pub(super) async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Params(ids): Params<PathIds>,
) -> ApiResult<Json<UserView>> {
    let view = authorize_view(state.store(), Some(&user), ids).await?;
    let deleted = state
        .store()
        .delete_view(view.view_id)
        .await?
        .ok_or(ApiError::Rejected(Rejection::ViewMismatch))?;
    info!(view_id = %deleted.view_id, "view deleted");
    Ok(Json(deleted))
}
