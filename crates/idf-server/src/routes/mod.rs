//! HTTP routes
//!
//! Every handler that takes path ids runs the ownership chain before looking
//! at the request body, and works from what the chain resolved.

mod locations;
mod measurements;
mod views;
mod visualisations;
mod workspaces;

use crate::error::ApiResult;
use crate::state::AppState;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::routing::get;
use axum::Router;
use idf_validation::body::Body;
use idf_validation::{FieldError, FieldErrors};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Message for a body that is not a JSON object
pub const NOT_AN_OBJECT: &str = "Request body must be a JSON object";

/// Routes mounted under `/api`
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/workspaces", get(workspaces::list).post(workspaces::create))
        .route(
            "/workspaces/:workspaceId",
            get(workspaces::get)
                .patch(workspaces::update)
                .delete(workspaces::delete),
        )
        .route(
            "/workspaces/:workspaceId/views",
            get(views::list).post(views::create),
        )
        .route(
            "/workspaces/:workspaceId/views/:viewId",
            get(views::get).patch(views::update).delete(views::delete),
        )
        .route(
            "/workspaces/:workspaceId/views/:viewId/vis",
            get(visualisations::list).post(visualisations::create),
        )
        .route(
            "/workspaces/:workspaceId/views/:viewId/vis/:userVisId",
            get(visualisations::get)
                .patch(visualisations::update)
                .delete(visualisations::delete),
        )
        .route(
            "/workspaces/:workspaceId/views/:viewId/vis/:userVisId/fetch",
            get(visualisations::fetch),
        )
        .route("/locations", get(locations::list))
        .route("/locations/:locationId", get(locations::get))
        .route("/measurements", get(measurements::list))
        .route("/measurements/:measurementId", get(measurements::get))
        .route(
            "/measurements/:measurementId/vis",
            get(measurements::visualisations),
        )
        .route(
            "/measurements/:measurementId/locations",
            get(measurements::locations),
        )
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60))
}

/// Full application: `/api` plus the frontend build, if any
///
/// Paths outside `/api` that match no file get `index.html` so client-side
/// routes load.
pub fn app(state: AppState, static_dir: Option<&Path>) -> Router {
    let mut router = Router::new().nest("/api", api_router());
    if let Some(dir) = static_dir {
        let index = ServeFile::new(dir.join("index.html"));
        router = router.fallback_service(ServeDir::new(dir).fallback(index));
    }
    router
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(state)
}

/// Decode a request body into a JSON object; blank means `{}`
pub(crate) fn json_object(bytes: &[u8]) -> ApiResult<Body> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Body::new());
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(FieldErrors::one(FieldError::whole_body(NOT_AN_OBJECT)).into()),
    }
}
