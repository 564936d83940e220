//! Authenticated self-service endpoints.
//!
//! Flow Overview:
//! 1) Resolve the bearer token into a principal.
//! 2) Fetch the current user from the database.
//! 3) Apply the requested mutation, first failed check wins.

use anyhow::Result;
use axum::{Json, extract::Extension, http::{HeaderMap, StatusCode}, response::IntoResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;

use super::{
    AuthState, password, storage,
    types::{StatusMessage, UserProfile},
};
use crate::api::handlers::reject;

const USER_NOT_FOUND: &str = "User not found";

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UpdatePhoneRequest {
    pub phone: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UpdatePhoneResponse {
    pub message: String,
    pub status: String,
    pub phone: String,
}

/// Why a password change request was refused.
#[derive(Debug, PartialEq, Eq)]
enum PasswordChangeRejection {
    WrongCurrent,
    Mismatch,
    SameAsCurrent,
}

impl PasswordChangeRejection {
    const fn detail(&self) -> &'static str {
        match self {
            Self::WrongCurrent => "Current password is incorrect",
            Self::Mismatch => "New password and confirm password do not match",
            Self::SameAsCurrent => "New password cannot be the same as current password",
        }
    }
}

/// Run the password-change checks in order; the first failure wins.
fn validate_password_change(
    stored_hash: &str,
    request: &UpdatePasswordRequest,
) -> Result<Option<PasswordChangeRejection>> {
    if !password::verify(&request.current_password, stored_hash)? {
        return Ok(Some(PasswordChangeRejection::WrongCurrent));
    }
    if request.new_password != request.confirm_password {
        return Ok(Some(PasswordChangeRejection::Mismatch));
    }
    if password::verify(&request.new_password, stored_hash)? {
        return Ok(Some(PasswordChangeRejection::SameAsCurrent));
    }
    Ok(None)
}

#[utoipa::path(
    get,
    path = "/auth/profile",
    responses(
        (status = 200, description = "Profile of the authenticated user", body = UserProfile),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "User no longer exists"),
    ),
    tag = "auth"
)]
#[instrument(skip(headers, pool, auth_state))]
pub async fn profile(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let principal = match super::principal::require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    match storage::fetch_user(&pool, principal.user_id).await {
        Ok(Some(user)) => (StatusCode::OK, Json(UserProfile::from(user))).into_response(),
        Ok(None) => reject(StatusCode::NOT_FOUND, USER_NOT_FOUND).into_response(),
        Err(err) => {
            error!("Error fetching user profile: {err:?}");
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch user profile",
            )
            .into_response()
        }
    }
}

#[utoipa::path(
    put,
    path = "/auth/update-password",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = StatusMessage),
        (status = 400, description = "Wrong current password, mismatch, or unchanged password"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "User no longer exists"),
    ),
    tag = "auth"
)]
#[instrument(skip(headers, pool, auth_state, payload))]
pub async fn update_password(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<UpdatePasswordRequest>>,
) -> impl IntoResponse {
    let principal = match super::principal::require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    let Some(Json(request)) = payload else {
        return reject(StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    let user = match storage::fetch_user(&pool, principal.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return reject(StatusCode::NOT_FOUND, USER_NOT_FOUND).into_response(),
        Err(err) => {
            error!("Error fetching user: {err:?}");
            return reject(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update password")
                .into_response();
        }
    };

    match validate_password_change(&user.password_hash, &request) {
        Ok(None) => (),
        Ok(Some(rejection)) => {
            return reject(StatusCode::BAD_REQUEST, rejection.detail()).into_response();
        }
        Err(err) => {
            error!("Error validating password change: {err:?}");
            return reject(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update password")
                .into_response();
        }
    }

    let new_hash = match password::hash(&request.new_password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Error hashing password: {err:?}");
            return reject(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update password")
                .into_response();
        }
    };

    // Previously issued tokens are untouched: there is nothing to revoke.
    match storage::update_password_hash(&pool, principal.user_id, &new_hash).await {
        Ok(true) => (
            StatusCode::OK,
            Json(StatusMessage::success("Password updated successfully")),
        )
            .into_response(),
        Ok(false) => reject(StatusCode::NOT_FOUND, USER_NOT_FOUND).into_response(),
        Err(err) => {
            error!("Error updating password: {err:?}");
            reject(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update password").into_response()
        }
    }
}

#[utoipa::path(
    put,
    path = "/auth/update-phone",
    request_body = UpdatePhoneRequest,
    responses(
        (status = 200, description = "Phone number updated", body = UpdatePhoneResponse),
        (status = 400, description = "Empty phone number or phone already registered"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "User no longer exists"),
    ),
    tag = "auth"
)]
#[instrument(skip(headers, pool, auth_state, payload))]
pub async fn update_phone(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<UpdatePhoneRequest>>,
) -> impl IntoResponse {
    let principal = match super::principal::require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    let Some(Json(request)) = payload else {
        return reject(StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    if request.phone.trim().is_empty() {
        return reject(StatusCode::BAD_REQUEST, "Phone number cannot be empty").into_response();
    }

    match storage::phone_taken_by_other(&pool, &request.phone, principal.user_id).await {
        Ok(true) => {
            return reject(
                StatusCode::BAD_REQUEST,
                "Phone number is already registered with another account",
            )
            .into_response();
        }
        Ok(false) => (),
        Err(err) => {
            error!("Error checking phone uniqueness: {err:?}");
            return reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to update phone number",
            )
            .into_response();
        }
    }

    match storage::update_user_phone(&pool, principal.user_id, &request.phone).await {
        Ok(true) => (
            StatusCode::OK,
            Json(UpdatePhoneResponse {
                message: "Phone number updated successfully".to_string(),
                status: "success".to_string(),
                phone: request.phone,
            }),
        )
            .into_response(),
        Ok(false) => reject(StatusCode::NOT_FOUND, USER_NOT_FOUND).into_response(),
        Err(err) => {
            error!("Error updating phone: {err:?}");
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to update phone number",
            )
            .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low-cost digests keep the check-ordering tests fast.
    fn digest(plaintext: &str) -> String {
        bcrypt::hash(plaintext, 4).expect("hash should succeed")
    }

    fn request(current: &str, new: &str, confirm: &str) -> UpdatePasswordRequest {
        UpdatePasswordRequest {
            current_password: current.to_string(),
            new_password: new.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[test]
    fn wrong_current_password_wins_over_later_checks() -> Result<()> {
        let stored = digest("hunter2");
        // The mismatch between new/confirm is never reached.
        let rejection = validate_password_change(&stored, &request("wrong", "a", "b"))?;
        assert_eq!(rejection, Some(PasswordChangeRejection::WrongCurrent));
        Ok(())
    }

    #[test]
    fn mismatched_confirmation_is_rejected() -> Result<()> {
        let stored = digest("hunter2");
        let rejection = validate_password_change(&stored, &request("hunter2", "new-one", "new-two"))?;
        assert_eq!(rejection, Some(PasswordChangeRejection::Mismatch));
        Ok(())
    }

    #[test]
    fn unchanged_password_is_rejected() -> Result<()> {
        let stored = digest("hunter2");
        let rejection = validate_password_change(&stored, &request("hunter2", "hunter2", "hunter2"))?;
        assert_eq!(rejection, Some(PasswordChangeRejection::SameAsCurrent));
        Ok(())
    }

    #[test]
    fn valid_change_passes_every_check() -> Result<()> {
        let stored = digest("hunter2");
        let rejection = validate_password_change(&stored, &request("hunter2", "new-one", "new-one"))?;
        assert_eq!(rejection, None);
        Ok(())
    }

    #[test]
    fn new_digest_flips_which_password_verifies() -> Result<()> {
        let old_digest = digest("hunter2");
        let new_digest = digest("brand-new");

        assert!(password::verify("hunter2", &old_digest)?);
        assert!(!password::verify("hunter2", &new_digest)?);
        assert!(password::verify("brand-new", &new_digest)?);
        Ok(())
    }

    #[test]
    fn rejection_details_match_the_api_contract() {
        assert_eq!(
            PasswordChangeRejection::WrongCurrent.detail(),
            "Current password is incorrect"
        );
        assert_eq!(
            PasswordChangeRejection::Mismatch.detail(),
            "New password and confirm password do not match"
        );
        assert_eq!(
            PasswordChangeRejection::SameAsCurrent.detail(),
            "New password cannot be the same as current password"
        );
    }
}
