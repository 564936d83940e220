//! Authentication handlers and supporting machinery.
//!
//! The flow over a session's lifecycle:
//!
//! 1. **Register**: credentials in, bcrypt digest stored, profile view out.
//! 2. **Login**: credentials verified, an access/refresh token pair issued.
//! 3. **Refresh**: a refresh token mints a fresh access token; the refresh
//!    token itself is reusable until its own expiry.
//! 4. **Self-service**: password/phone updates and profile reads, gated by a
//!    bearer token resolved through [`principal::require_auth`].
//!
//! Tokens are never persisted; validity is a function of the signature and
//! the embedded expiry alone, so a password change does not invalidate
//! tokens that were already issued.

pub mod login;
pub mod password;
pub mod principal;
pub mod profile;
pub mod refresh;
pub mod register;
pub(crate) mod storage;
pub mod token;
pub mod types;

mod state;

pub use state::{AuthConfig, AuthState};

/// Role tag assigned to self-registered accounts.
pub const DEFAULT_ROLE: &str = "admin";
