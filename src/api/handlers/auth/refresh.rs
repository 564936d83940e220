use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

use super::{
    AuthState,
    token::{TokenError, TokenType},
    types::TOKEN_TYPE_BEARER,
};
use crate::api::handlers::reject;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token issued", body = RefreshResponse),
        (status = 400, description = "Refresh token missing from the request"),
        (status = 401, description = "Invalid, expired, or wrong-type token"),
    ),
    tag = "auth"
)]
#[instrument(skip(auth_state, payload))]
pub async fn refresh(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RefreshRequest>>,
) -> impl IntoResponse {
    let token = payload
        .and_then(|Json(request)| request.refresh_token)
        .filter(|token| !token.is_empty());

    let Some(token) = token else {
        return reject(StatusCode::BAD_REQUEST, "Refresh token is required").into_response();
    };

    // The refresh token is not rotated: it stays valid until its own expiry.
    let claims = match auth_state.codec().verify_refresh(&token) {
        Ok(claims) => claims,
        Err(TokenError::WrongTokenType) => {
            return reject(
                StatusCode::UNAUTHORIZED,
                "Invalid token type. Only refresh tokens are allowed.",
            )
            .into_response();
        }
        Err(err) => {
            debug!("Refresh token rejected: {err}");
            return reject(StatusCode::UNAUTHORIZED, "Invalid or expired refresh token.")
                .into_response();
        }
    };

    let access_token = match auth_state.codec().issue(
        &claims.email,
        claims.id,
        &claims.role,
        auth_state.config().access_ttl(),
        TokenType::Access,
    ) {
        Ok(token) => token,
        Err(err) => {
            error!("Error issuing access token: {err}");
            return reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                .into_response();
        }
    };

    (
        StatusCode::OK,
        Json(RefreshResponse {
            access_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
        }),
    )
        .into_response()
}
