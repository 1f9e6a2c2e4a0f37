//! Authentication error types.

use lyceum_core::error::LyceumError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for LyceumError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => LyceumError::ExpiredCredential,
            AuthError::TokenInvalid(msg) => LyceumError::MalformedCredential(msg),
            AuthError::Crypto(msg) => LyceumError::Crypto(msg),
        }
    }
}
