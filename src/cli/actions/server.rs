use crate::api::{
    self,
    dedupe::DedupeConfig,
    handlers::auth::{AuthConfig, AuthState, token::TokenCodec},
};
use anyhow::Result;
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub token_secret: SecretString,
    pub access_ttl_days: i64,
    pub refresh_ttl_days: i64,
    pub dedupe: bool,
    pub dedupe_settle_ms: u64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database pool cannot be created or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let config = AuthConfig::new()
        .with_access_ttl_days(args.access_ttl_days)
        .with_refresh_ttl_days(args.refresh_ttl_days);

    let codec = TokenCodec::new(&args.token_secret);
    let auth_state = Arc::new(AuthState::new(config, codec));

    let dedupe = DedupeConfig {
        enabled: args.dedupe,
        settle: Duration::from_millis(args.dedupe_settle_ms),
    };

    api::new(args.port, args.dsn, auth_state, dedupe).await
}
