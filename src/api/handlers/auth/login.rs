use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, instrument, warn};
use utoipa::ToSchema;

use super::{
    AuthState, password, storage,
    token::TokenType,
    types::{TOKEN_TYPE_BEARER, UserProfile},
};
use crate::api::handlers::{ErrorDetail, normalize_email, reject};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    #[serde(rename = "UserInfo")]
    pub user_info: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

/// One rejection for both unknown email and wrong password, so responses do
/// not reveal which accounts exist.
fn invalid_credentials() -> (StatusCode, Json<ErrorDetail>) {
    reject(
        StatusCode::UNAUTHORIZED,
        "No account found with the given credentials",
    )
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authentication successful", body = LoginResponse),
        (status = 401, description = "Unknown email or wrong password"),
        (status = 500, description = "Storage or token failure"),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, auth_state, payload))]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return reject(StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    let email = normalize_email(&request.email);

    let user = match storage::lookup_user_by_email(&pool, &email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("Authentication failed for user: {email}");
            return invalid_credentials().into_response();
        }
        Err(err) => {
            error!("Error looking up user: {err:?}");
            return reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                .into_response();
        }
    };

    match password::verify(&request.password, &user.password_hash) {
        Ok(true) => (),
        Ok(false) => {
            warn!("Authentication failed for user: {email}");
            return invalid_credentials().into_response();
        }
        Err(err) => {
            error!("Error verifying password: {err:?}");
            return reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                .into_response();
        }
    }

    let codec = auth_state.codec();
    let config = auth_state.config();

    let access_token = codec.issue(
        &user.email,
        user.id,
        &user.role,
        config.access_ttl(),
        TokenType::Access,
    );
    let refresh_token = codec.issue(
        &user.email,
        user.id,
        &user.role,
        config.refresh_ttl(),
        TokenType::Refresh,
    );

    match (access_token, refresh_token) {
        (Ok(access_token), Ok(refresh_token)) => (
            StatusCode::OK,
            Json(LoginResponse {
                user_info: UserProfile::from(user),
                access_token,
                refresh_token,
                token_type: TOKEN_TYPE_BEARER.to_string(),
            }),
        )
            .into_response(),
        (Err(err), _) | (_, Err(err)) => {
            error!("Error issuing tokens: {err}");
            reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}
