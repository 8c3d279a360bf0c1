//! Path and query extractors that reject with field errors
//!
//! Same as axum's `Path` and `Query`, but a request they cannot decode gets
//! the `{ "errors": [...] }` body instead of plain text.

use crate::error::ApiError;
use axum::async_trait;
use axum::extract::path::ErrorKind;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{FromRequestParts, Path, Query};
use axum::http::request::Parts;
use idf_validation::{FieldError, FieldErrors};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Path parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct Params<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Params<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(path_error(&rejection).into()),
        }
    }
}

/// Query string parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(query_error(&rejection, parts).into()),
        }
    }
}

fn path_error(rejection: &PathRejection) -> FieldErrors {
    let (param, value) = match rejection {
        PathRejection::FailedToDeserializePathParams(err) => match err.kind() {
            ErrorKind::ParseErrorAtKey { key, value, .. } => {
                (key.as_str(), Value::String(value.clone()))
            }
            ErrorKind::InvalidUtf8InPathParam { key } => (key.as_str(), Value::Null),
            _ => ("", Value::Null),
        },
        _ => ("", Value::Null),
    };
    FieldErrors::one(FieldError::params(param, value, rejection.body_text()))
}

fn query_error(rejection: &QueryRejection, parts: &Parts) -> FieldErrors {
    let raw = parts.uri.query().map_or(Value::Null, |q| Value::String(q.to_string()));
    FieldErrors::one(FieldError::query("", raw, rejection.body_text()))
}
