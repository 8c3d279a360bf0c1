//! HTTP error mapping
//!
//! | error | status | body |
//! |---|---|---|
//! | field errors, malformed path id | 400 | `{ errors: [{ value, msg, param, location }] }` |
//! | missing or invalid identity | 401 | `{ errors: [{ msg }] }` |
//! | chain exists but is not owned | 403 | `{ errors: [{ msg }] }` |
//! | chain or reference row missing | 404 | `{ errors: [{ msg }] }` |
//! | anything else | 500 | generic message |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use idf_auth::AuthError;
use idf_store::StoreError;
use idf_validation::{ChainError, FieldError, FieldErrors, Rejection, RejectionKind};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, warn};

/// Message returned for failures the caller cannot act on
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// Message returned when a token is present but not accepted
pub const INVALID_IDENTITY_MESSAGE: &str = "Invalid identity token";

/// Errors a handler can return
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Fields(#[from] FieldErrors),

    #[error(transparent)]
    Rejected(Rejection),

    #[error("identity rejected: {0}")]
    Identity(#[from] AuthError),

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Rejected(rejection) => ApiError::Rejected(rejection),
            ChainError::Store(e) => ApiError::Store(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct Message<'a> {
    msg: &'a str,
}

#[derive(Serialize)]
struct Messages<'a> {
    errors: [Message<'a>; 1],
}

fn message(status: StatusCode, msg: &str) -> Response {
    (status, Json(Messages { errors: [Message { msg }] })).into_response()
}

/// Field error for a write that broke a foreign key
fn reference_field(constraint: &str) -> FieldError {
    if constraint.contains("location_id") {
        FieldError::body("locationId", Value::Null, "Location does not exist")
    } else if constraint.contains("measurement_id") {
        FieldError::body("measurementId", Value::Null, "Measurement does not exist")
    } else {
        FieldError::whole_body("Referenced row does not exist")
    }
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Fields(_) => StatusCode::BAD_REQUEST,
            ApiError::Rejected(r) => match r.kind() {
                RejectionKind::Format => StatusCode::BAD_REQUEST,
                RejectionKind::NotFound => StatusCode::NOT_FOUND,
                RejectionKind::NotOwned => StatusCode::FORBIDDEN,
                RejectionKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            },
            ApiError::Identity(_) => StatusCode::UNAUTHORIZED,
            ApiError::Store(e) if e.is_constraint_violation() => StatusCode::BAD_REQUEST,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Fields(errors) => (status, Json(errors)).into_response(),
            ApiError::Rejected(Rejection::Format { param, value }) => {
                let msg = format!("{param} must be an integer");
                let errors = FieldErrors::one(FieldError::params(param.as_str(), value, msg));
                (status, Json(errors)).into_response()
            }
            ApiError::Rejected(rejection) => message(status, &rejection.to_string()),
            ApiError::Identity(AuthError::MissingToken) => {
                warn!("request without identity");
                message(status, &Rejection::MissingPrincipal.to_string())
            }
            ApiError::Identity(e) => {
                warn!(error = %e, "identity rejected");
                message(status, INVALID_IDENTITY_MESSAGE)
            }
            ApiError::Store(StoreError::ForeignKeyViolation { constraint }) => {
                (status, Json(FieldErrors::one(reference_field(&constraint)))).into_response()
            }
            ApiError::Store(StoreError::UniqueViolation { constraint }) => {
                warn!(%constraint, "unique violation on write");
                let field = FieldError::whole_body("Value already exists");
                (status, Json(FieldErrors::one(field))).into_response()
            }
            other => {
                error!(error = %other, "request failed");
                message(status, INTERNAL_MESSAGE)
            }
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use idf_validation::chain::IdParam;

    #[test]
    fn test_statuses() {
        assert_eq!(
            ApiError::Rejected(Rejection::NotOwned).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Rejected(Rejection::ViewMismatch).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Rejected(Rejection::Format {
                param: IdParam::ViewId,
                value: "x".to_string()
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Identity(AuthError::BadSignature).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Store(StoreError::ForeignKeyViolation {
                constraint: "user_visualisation_location_id_fkey".to_string()
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Store(StoreError::MalformedRow("x".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_chain_errors_convert() {
        let err: ApiError = ChainError::Rejected(Rejection::WorkspaceNotFound).into();
        assert!(matches!(err, ApiError::Rejected(Rejection::WorkspaceNotFound)));

        let err: ApiError = ChainError::Unresolved("workspace").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_reference_fields() {
        assert_eq!(
            reference_field("user_visualisation_measurement_id_fkey").param,
            "measurementId"
        );
        assert_eq!(reference_field("other").param, "_error");
    }
}
