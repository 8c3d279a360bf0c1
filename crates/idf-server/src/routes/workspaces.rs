use super::json_object;
use crate::error::{ApiError, ApiResult};
use crate::extract::Params;
use crate::identity::CurrentUser;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use idf_model::Workspace;
use idf_store::StoreError;
use idf_validation::{body, authorize_workspace, FieldError, FieldErrors, PathIds, Rejection};
use serde_json::{json, Value};
use tracing::info;

fn duplicate_name(name: &str) -> ApiError {
    FieldErrors::one(FieldError::body(
        "workspaceName",
        name,
        format!("Workspace with name '{name}' already exists!"),
    ))
    .into()
}

pub(super) async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let workspaces = state.store().list_workspaces(user.email()).await?;
    Ok(Json(json!({ "workspaces": workspaces })))
}

pub(super) async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    bytes: Bytes,
) -> ApiResult<(StatusCode, Json<Workspace>)> {
    let new = body::new_workspace(&json_object(&bytes)?)?;
    let name = new.workspace_name.clone();

    let workspace = state
        .store()
        .create_workspace(user.email(), new)
        .await?
        .ok_or_else(|| duplicate_name(&name))?;
    info!(workspace_id = %workspace.workspace_id, "workspace created");
    Ok((StatusCode::CREATED, Json(workspace)))
}

pub(super) async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Params(ids): Params<PathIds>,
) -> ApiResult<Json<Workspace>> {
    let workspace = authorize_workspace(state.store(), Some(&user), ids).await?;
    Ok(Json(workspace))
}

pub(super) async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Params(ids): Params<PathIds>,
    bytes: Bytes,
) -> ApiResult<Json<Workspace>> {
    let workspace = authorize_workspace(state.store(), Some(&user), ids).await?;
    let patch = body::workspace_patch(&json_object(&bytes)?)?;
    let name = patch.workspace_name.clone();

    let updated = state
        .store()
        .update_workspace(workspace.workspace_id, patch)
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
) -> ApiResult<Json<Workspace>> {
    let workspace = authorize_workspace(state.store(), Some(&user), ids).await?;
    let deleted = state
        .store()
        .delete_workspace(workspace.workspace_id)
        .await?
        .ok_or(ApiError::Rejected(Rejection::WorkspaceNotFound))?;
    info!(workspace_id = %deleted.workspace_id, "workspace deleted");
    Ok(Json(deleted))
}
