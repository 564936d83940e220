//! # Soldi (Financial Management API)
//!
//! `soldi` is the authentication core of a financial-management backend. It
//! issues and verifies signed bearer tokens, manages user credentials, and
//! guards the HTTP surface against duplicate in-flight requests.
//!
//! ## Authentication
//!
//! Passwords are stored as salted bcrypt digests; plaintext never touches the
//! database or the logs. Login issues a pair of HS256 tokens: a 30-day access
//! token and a 60-day refresh token, both carrying `{email, id, role}`.
//!
//! Tokens are stateless. There is no server-side session store and no
//! revocation list: a token stays valid until its expiry regardless of later
//! password changes or account deletion. "Logout" is a client-side discard.
//!
//! ## Roles
//!
//! A user's role is an open string tag (`admin`, `team_lead`, `sales`,
//! `super_sales`, `desange`). The role claim inside a token is trusted as-is;
//! a role change only takes effect once the holder re-authenticates.
//!
//! ## Duplicate suppression
//!
//! A fingerprint-based guard can reject a second identical request (same
//! method, path, and body) while the first is still in flight. It ships
//! disabled and is only attached when the server is started with `--dedupe`.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
