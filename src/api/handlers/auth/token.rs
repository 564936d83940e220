//! Signed bearer token issuance and verification.
//!
//! Tokens are HS256 JWTs over a fixed claim set. Verification is stateless:
//! nothing is stored server-side, so an issued token stays valid until its
//! `exp` claim passes, no matter what happens to the account in the meantime.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Wire tag distinguishing the two tokens issued at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Fixed claim set embedded in every issued token.
///
/// Kept as an explicit struct so a missing or mistyped claim surfaces at
/// decode time instead of deep inside a handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub id: i64,
    pub role: String,
    pub exp: i64,
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

/// Claims as decoded from the wire, before required fields are enforced.
#[derive(Deserialize)]
struct RawClaims {
    email: Option<String>,
    id: Option<i64>,
    role: Option<String>,
    exp: i64,
    #[serde(rename = "type")]
    token_type: TokenType,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature does not match")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is missing a required claim")]
    MissingClaim,
    #[error("only refresh tokens are accepted here")]
    WrongTokenType,
    #[error("token could not be decoded")]
    Malformed,
}

/// Encodes and verifies tokens with a process-wide secret.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact: a token is invalid the second its exp passes.
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.expose_secret().as_bytes()),
            decoding: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }

    /// Issue a token for the given identity, expiring `ttl` from now.
    ///
    /// # Errors
    /// Returns an error if the claims cannot be serialized and signed.
    pub fn issue(
        &self,
        email: &str,
        id: i64,
        role: &str,
        ttl: Duration,
        token_type: TokenType,
    ) -> Result<String, TokenError> {
        self.issue_at(SystemTime::now(), email, id, role, ttl, token_type)
    }

    fn issue_at(
        &self,
        now: SystemTime,
        email: &str,
        id: i64,
        role: &str,
        ttl: Duration,
        token_type: TokenType,
    ) -> Result<String, TokenError> {
        let exp = unix_seconds(now).saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX));

        let claims = Claims {
            email: email.to_string(),
            id,
            role: role.to_string(),
            exp,
            token_type,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| TokenError::Malformed)
    }

    /// Verify a token's signature and expiry and return its claims.
    ///
    /// # Errors
    /// `InvalidSignature` when the signature does not match, `Expired` when
    /// `exp` has passed, `MissingClaim` when `email` or `id` is absent after
    /// decode, `Malformed` for anything else.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<RawClaims>(token, &self.decoding, &self.validation).map_err(map_error)?;
        let raw = data.claims;

        let email = raw
            .email
            .filter(|email| !email.is_empty())
            .ok_or(TokenError::MissingClaim)?;
        let id = raw.id.ok_or(TokenError::MissingClaim)?;

        Ok(Claims {
            email,
            id,
            role: raw.role.unwrap_or_default(),
            exp: raw.exp,
            token_type: raw.token_type,
        })
    }

    /// Verify a token and additionally require the `refresh` type tag.
    ///
    /// # Errors
    /// As [`Self::verify`], plus `WrongTokenType` when the decoded token is
    /// not a refresh token.
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.token_type != TokenType::Refresh {
            return Err(TokenError::WrongTokenType);
        }
        Ok(claims)
    }
}

fn map_error(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        // Claims decoded but did not fit the struct: a claim is missing or mistyped.
        jsonwebtoken::errors::ErrorKind::Json(_) => TokenError::MissingClaim,
        _ => TokenError::Malformed,
    }
}

/// Unix seconds for token expiry claims.
fn unix_seconds(now: SystemTime) -> i64 {
    now.duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(30 * 86_400);

    fn codec() -> TokenCodec {
        TokenCodec::new(&SecretString::from("test-secret"))
    }

    #[test]
    fn round_trip_preserves_identity_claims() {
        let codec = codec();
        let token = codec
            .issue("alice@example.com", 7, "team_lead", TTL, TokenType::Access)
            .expect("token should issue");

        let claims = codec.verify(&token).expect("token should verify");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.id, 7);
        assert_eq!(claims.role, "team_lead");
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(claims.exp > unix_seconds(SystemTime::now()));
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec();
        let issued_in_the_past = SystemTime::now() - Duration::from_secs(120);
        let token = codec
            .issue_at(
                issued_in_the_past,
                "alice@example.com",
                7,
                "admin",
                Duration::from_secs(60),
                TokenType::Access,
            )
            .expect("token should issue");

        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let token = codec()
            .issue("alice@example.com", 7, "admin", TTL, TokenType::Access)
            .expect("token should issue");

        let other = TokenCodec::new(&SecretString::from("different-secret"));
        assert_eq!(other.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn refresh_check_accepts_refresh_tokens() {
        let codec = codec();
        let token = codec
            .issue("alice@example.com", 7, "admin", TTL, TokenType::Refresh)
            .expect("token should issue");

        let claims = codec.verify_refresh(&token).expect("refresh should pass");
        assert_eq!(claims.token_type, TokenType::Refresh);
    }

    #[test]
    fn refresh_check_rejects_access_tokens() {
        let codec = codec();
        let token = codec
            .issue("alice@example.com", 7, "admin", TTL, TokenType::Access)
            .expect("token should issue");

        assert_eq!(
            codec.verify_refresh(&token),
            Err(TokenError::WrongTokenType)
        );
    }

    #[test]
    fn missing_id_claim_is_rejected() {
        let codec = codec();
        let exp = unix_seconds(SystemTime::now()) + 3_600;
        let payload = serde_json::json!({
            "email": "alice@example.com",
            "exp": exp,
            "type": "access",
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .expect("token should encode");

        assert_eq!(codec.verify(&token), Err(TokenError::MissingClaim));
    }

    #[test]
    fn empty_email_claim_is_rejected() {
        let codec = codec();
        let exp = unix_seconds(SystemTime::now()) + 3_600;
        let payload = serde_json::json!({
            "email": "",
            "id": 7,
            "exp": exp,
            "type": "access",
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .expect("token should encode");

        assert_eq!(codec.verify(&token), Err(TokenError::MissingClaim));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert_eq!(codec().verify("not-a-token"), Err(TokenError::Malformed));
    }

    #[test]
    fn later_access_token_never_expires_earlier() {
        let codec = codec();
        let first = codec
            .issue("alice@example.com", 7, "admin", TTL, TokenType::Access)
            .expect("token should issue");
        let second = codec
            .issue("alice@example.com", 7, "admin", TTL, TokenType::Access)
            .expect("token should issue");

        let first_exp = codec.verify(&first).expect("first verifies").exp;
        let second_exp = codec.verify(&second).expect("second verifies").exp;
        assert!(second_exp >= first_exp);
    }

    #[test]
    fn verification_consults_no_server_state() {
        // There is no revocation list: a token issued before a credential
        // change still verifies until its own expiry.
        let codec = codec();
        let token = codec
            .issue("alice@example.com", 7, "admin", TTL, TokenType::Access)
            .expect("token should issue");

        assert!(codec.verify(&token).is_ok());
        // Rotate the account's password hash (a storage-level concern)...
        let _new_hash = bcrypt::hash("entirely-new-password", 4).expect("hash should succeed");
        // ...and the token verifies exactly as before.
        assert!(codec.verify(&token).is_ok());
    }
}
