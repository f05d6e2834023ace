//! # Request Extractors
//!
//! Wrappers around axum's extractors that reject with [`ApiError`], so a
//! malformed body or query string gets the same JSON error shape as every
//! other failure.

use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Query};
use axum::http::request::Parts;
use axum::Json;
use serde::Serialize;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use taskdesk_shared::auth::middleware::AuthContext;

/// JSON body extractor and responder
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        Json(self.0).into_response()
    }
}

/// Query string extractor
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// The authenticated user
///
/// Inserted into request extensions by the JWT middleware; extracting it on
/// a route without that middleware is a 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}
