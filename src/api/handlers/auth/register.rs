use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{error, instrument};
use utoipa::ToSchema;

use super::{DEFAULT_ROLE, password, storage};
use crate::api::handlers::{normalize_email, reject, valid_email};

const EMAIL_TAKEN: &str = "Email is already taken";

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = RegisterResponse),
        (status = 400, description = "Invalid payload or email already taken"),
        (status = 500, description = "Storage failure"),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, payload))]
pub async fn register(
    pool: Extension<PgPool>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return reject(StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return reject(StatusCode::BAD_REQUEST, "Invalid email").into_response();
    }

    // Pre-write check so the caller gets a conflict message; the unique index
    // backstops writers that race past it.
    match storage::email_taken(&pool, &email).await {
        Ok(true) => return reject(StatusCode::BAD_REQUEST, EMAIL_TAKEN).into_response(),
        Ok(false) => (),
        Err(err) => {
            error!("Error checking if user exists: {err:?}");
            return reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                .into_response();
        }
    }

    let password_hash = match password::hash(&request.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Error hashing password: {err:?}");
            return reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                .into_response();
        }
    };

    match storage::insert_user(
        &pool,
        &request.first_name,
        &request.last_name,
        &email,
        DEFAULT_ROLE,
        &password_hash,
    )
    .await
    {
        Ok(storage::InsertOutcome::Created(user)) => (
            StatusCode::CREATED,
            Json(RegisterResponse {
                id: user.id,
                first_name: user.first_name,
                last_name: user.last_name,
                email: user.email,
                role: user.role,
            }),
        )
            .into_response(),
        Ok(storage::InsertOutcome::Conflict) => {
            reject(StatusCode::BAD_REQUEST, EMAIL_TAKEN).into_response()
        }
        Err(err) => {
            error!("Error inserting user: {err:?}");
            reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}
