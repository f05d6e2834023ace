/// JWT authentication middleware
///
/// Reads `Authorization: Bearer <token>`, validates the access token and
/// loads the user, then stores the resulting
/// [`AuthContext`](taskdesk_shared::auth::middleware::AuthContext) in request
/// extensions for the [`CurrentUser`](crate::extract::CurrentUser) extractor.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use taskdesk_shared::auth::middleware::{authenticate_token, extract_bearer_token};

use crate::{app::AppState, error::ApiError};

pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = {
        let value = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        extract_bearer_token(value)?.to_string()
    };

    let auth_context =
        authenticate_token(state.users.as_ref(), &token, state.jwt_secret()).await?;

    req.extensions_mut().insert(auth_context);
    Ok(next.run(req).await)
}
