//! HS256 JWT issuance and verification for both token families:
//! auth (login) tokens carrying a user id, and email tokens carrying
//! one or two email addresses for activation, reset and student
//! invitation flows.
//!
//! Each family signs with a key derived from the process-wide secret
//! under a fixed purpose namespace, so a token issued for one purpose
//! never verifies under the other.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

const AUTH_NAMESPACE: &str = "auth";
const EMAIL_NAMESPACE: &str = "email-confirm";

/// Claims embedded in every auth token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Subject — user ID (UUID string).
    pub sub: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

/// Claims embedded in activation/reset/invitation tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailClaims {
    /// One address (activation, reset) or a `[student, inviter]` pair
    /// (student invitation).
    pub emails: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

fn derived_key(secret: &str, namespace: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b":");
    hasher.update(namespace.as_bytes());
    hasher.finalize().into()
}

fn encode<C: Serialize>(claims: &C, key: &[u8]) -> Result<String, AuthError> {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(key),
    )
    .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

fn decode<C: serde::de::DeserializeOwned>(token: &str, key: &[u8]) -> Result<C, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // No leeway: an expired token must classify as expired the instant
    // it expires, never as malformed.
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    jsonwebtoken::decode::<C>(token, &DecodingKey::from_secret(key), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })
}

/// Issue a signed auth token for `subject`, expiring after `ttl`.
pub fn issue_auth_token(
    subject: Uuid,
    ttl: Duration,
    config: &AuthConfig,
) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = AuthClaims {
        sub: subject.to_string(),
        iat: now,
        exp: now + ttl.num_seconds(),
    };
    encode(&claims, &derived_key(&config.secret_key, AUTH_NAMESPACE))
}

/// Verify an auth token and return its subject.
pub fn verify_auth_token(token: &str, config: &AuthConfig) -> Result<Uuid, AuthError> {
    let claims: AuthClaims = decode(token, &derived_key(&config.secret_key, AUTH_NAMESPACE))?;
    Uuid::parse_str(&claims.sub)
        .map_err(|e| AuthError::TokenInvalid(format!("subject is not a UUID: {e}")))
}

/// Issue an email token carrying `emails`, expiring after the
/// configured email-token TTL.
pub fn issue_email_token(emails: &[String], config: &AuthConfig) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = EmailClaims {
        emails: emails.to_vec(),
        iat: now,
        exp: now + config.email_token_ttl_secs,
    };
    encode(&claims, &derived_key(&config.secret_key, EMAIL_NAMESPACE))
}

/// Verify an email token and return the carried addresses.
pub fn verify_email_token(token: &str, config: &AuthConfig) -> Result<Vec<String>, AuthError> {
    let claims: EmailClaims = decode(token, &derived_key(&config.secret_key, EMAIL_NAMESPACE))?;
    Ok(claims.emails)
}
