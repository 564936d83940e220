//! Authenticated principal extraction.
//!
//! Every protected handler resolves the bearer token through here. The role
//! claim is trusted as decoded and is not re-checked against storage, so a
//! role change only takes effect once the holder re-authenticates.

use axum::{
    Json,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
};
use tracing::debug;

use super::state::AuthState;
use crate::api::handlers::{ErrorDetail, reject};

const AUTH_REQUIRED: &str = "Authentication required!";
const AUTH_FAILED: &str =
    "Authentication failed. Your token is invalid or has expired. Please re-authenticate.";

/// Authenticated user context derived from the bearer token.
#[derive(Clone, Debug)]
pub struct Principal {
    pub user_id: i64,
    pub email: String,
    pub role: String,
}

/// Resolve the bearer token into a principal, or return 401.
///
/// # Errors
/// Returns a ready-to-send 401 response when the header is missing or the
/// token fails verification for any reason.
pub fn require_auth(
    headers: &HeaderMap,
    auth_state: &AuthState,
) -> Result<Principal, (StatusCode, Json<ErrorDetail>)> {
    let Some(token) = extract_bearer_token(headers) else {
        return Err(reject(StatusCode::UNAUTHORIZED, AUTH_REQUIRED));
    };

    match auth_state.codec().verify(&token) {
        Ok(claims) => Ok(Principal {
            user_id: claims.id,
            email: claims.email,
            role: claims.role,
        }),
        Err(err) => {
            debug!("Bearer token rejected: {err}");
            Err(reject(StatusCode::UNAUTHORIZED, AUTH_FAILED))
        }
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
