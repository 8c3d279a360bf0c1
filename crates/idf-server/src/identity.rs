//! Caller identity extractor

use crate::error::ApiError;
use crate::state::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use idf_auth::bearer_token;
use idf_model::Principal;

/// Verified principal of the request
///
/// Rejects with 401 when the bearer token is missing or not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub Principal);

impl CurrentUser {
    #[inline]
    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let token = bearer_token(header)?;
        let principal = state.verifier.verify(token)?;
        Ok(Self(principal))
    }
}
