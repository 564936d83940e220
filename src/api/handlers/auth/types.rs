//! Shared response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::storage::UserRecord;

/// Token scheme reported alongside issued tokens.
pub const TOKEN_TYPE_BEARER: &str = "bearer";

/// Read view of a user record, excluding the password hash.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserProfile {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
}

impl From<UserRecord> for UserProfile {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone: user.phone,
            role: user.role,
        }
    }
}

/// Outcome body for self-service mutations.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct StatusMessage {
    pub message: String,
    pub status: String,
}

impl StatusMessage {
    #[must_use]
    pub fn success(message: &str) -> Self {
        Self {
            message: message.to_string(),
            status: "success".to_string(),
        }
    }
}
