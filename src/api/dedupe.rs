//! Duplicate in-flight request suppression.
//!
//! Each request is fingerprinted over its method, path and raw body. While a
//! fingerprint is marked in flight, an identical request is rejected with
//! `429` instead of reaching a handler. The marker is released a short settle
//! delay after the response is produced, so near-simultaneous duplicates are
//! absorbed instead of racing the release.
//!
//! The store is process-local and non-persistent: a restart clears it.

use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use std::{collections::HashSet, sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::handlers::reject;

pub const DUPLICATE_DETAIL: &str = "Duplicate request in progress";

/// How the guard is wired into the application.
#[derive(Clone, Copy, Debug)]
pub struct DedupeConfig {
    pub enabled: bool,
    pub settle: Duration,
}

/// In-flight fingerprints, shared across all requests.
pub struct DedupeState {
    in_flight: Mutex<HashSet<[u8; 32]>>,
    settle: Duration,
}

impl DedupeState {
    #[must_use]
    pub fn new(settle: Duration) -> Self {
        Self {
            in_flight: Mutex::new(HashSet::new()),
            settle,
        }
    }

    /// Claim a fingerprint. Check and insert happen under one lock so two
    /// racing duplicates cannot both claim it.
    async fn try_claim(&self, fingerprint: [u8; 32]) -> bool {
        self.in_flight.lock().await.insert(fingerprint)
    }

    /// Release the fingerprint after the settle delay has passed.
    fn release_later(self: Arc<Self>, fingerprint: [u8; 32]) {
        tokio::spawn(async move {
            tokio::time::sleep(self.settle).await;
            self.in_flight.lock().await.remove(&fingerprint);
        });
    }
}

fn fingerprint(method: &Method, path: &str, body: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(method.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(path.as_bytes());
    hasher.update(b":");
    hasher.update(body);
    hasher.finalize().into()
}

/// Middleware rejecting a second identical request while the first is in flight.
pub async fn dedupe(
    State(state): State<Arc<DedupeState>>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    // The body is consumed for fingerprinting and re-inserted for the handler.
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("Failed to buffer request body: {err}");
            return reject(StatusCode::BAD_REQUEST, "Invalid request body").into_response();
        }
    };

    let key = fingerprint(&parts.method, parts.uri.path(), &bytes);

    if !state.try_claim(key).await {
        debug!(
            method = %parts.method,
            path = parts.uri.path(),
            "duplicate request rejected"
        );
        return reject(StatusCode::TOO_MANY_REQUESTS, DUPLICATE_DETAIL).into_response();
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    let response = next.run(request).await;

    state.release_later(key);

    response
}
