//! Auth configuration and shared state.

use super::token::TokenCodec;
use std::time::Duration;

const DEFAULT_ACCESS_TTL_DAYS: i64 = 30;
const DEFAULT_REFRESH_TTL_DAYS: i64 = 60;
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    access_ttl_days: i64,
    refresh_ttl_days: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            access_ttl_days: DEFAULT_ACCESS_TTL_DAYS,
            refresh_ttl_days: DEFAULT_REFRESH_TTL_DAYS,
        }
    }

    #[must_use]
    pub fn with_access_ttl_days(mut self, days: i64) -> Self {
        self.access_ttl_days = days;
        self
    }

    #[must_use]
    pub fn with_refresh_ttl_days(mut self, days: i64) -> Self {
        self.refresh_ttl_days = days;
        self
    }

    pub(crate) fn access_ttl(&self) -> Duration {
        days_to_duration(self.access_ttl_days)
    }

    pub(crate) fn refresh_ttl(&self) -> Duration {
        days_to_duration(self.refresh_ttl_days)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared auth state injected into handlers.
pub struct AuthState {
    config: AuthConfig,
    codec: TokenCodec,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, codec: TokenCodec) -> Self {
        Self { config, codec }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }
}

fn days_to_duration(days: i64) -> Duration {
    Duration::from_secs(u64::try_from(days).unwrap_or(0) * SECONDS_PER_DAY)
}
