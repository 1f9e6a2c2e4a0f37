//! Error types for the Lyceum system.
//!
//! Every variant carries a stable machine-readable API code and an
//! HTTP-like severity class so that clients can branch on failures
//! without parsing messages.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LyceumError {
    // ------------------------------------------------------------------
    // Authentication (401)
    // ------------------------------------------------------------------
    #[error("credential is missing")]
    MissingCredential,

    #[error("credential has expired")]
    ExpiredCredential,

    #[error("credential is malformed: {0}")]
    MalformedCredential(String),

    #[error("credential subject does not refer to a user")]
    UnknownSubject,

    #[error("incorrect user or password")]
    FailedLogin,

    #[error("invalid password")]
    WrongPassword,

    // ------------------------------------------------------------------
    // Authorization (403)
    // ------------------------------------------------------------------
    #[error("profile {profile} cannot access resource limited to {allowed}")]
    ForbiddenRole { profile: String, allowed: String },

    #[error("cannot access records belonging to another institute")]
    CrossTenantAccess,

    #[error("cannot deactivate user")]
    DeactivationForbidden,

    // ------------------------------------------------------------------
    // Not found (404)
    // ------------------------------------------------------------------
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("no page generated")]
    EmptyPage,

    #[error("stored file not found: {key}")]
    BlobMissing { key: String },

    // ------------------------------------------------------------------
    // Conflict (409)
    // ------------------------------------------------------------------
    #[error("{entity} already exists")]
    AlreadyExists { entity: &'static str },

    #[error("user is already active")]
    AlreadyActive,

    // ------------------------------------------------------------------
    // Validation (400/406/415/422)
    // ------------------------------------------------------------------
    #[error("user's account is not active yet")]
    NotActivated,

    #[error("password confirmation does not match")]
    WrongConfirmPassword,

    #[error("new password cannot be the same as the current one")]
    SamePassword,

    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("unable to order by '{0}'")]
    InvalidOrderColumn(String),

    #[error("the CNPJ provided is not valid")]
    InvalidLegalId,

    #[error("unsupported file format")]
    UnsupportedFile,

    // ------------------------------------------------------------------
    // Compensated failures (document update)
    // ------------------------------------------------------------------
    #[error("document update failed: {0}")]
    DocumentUpdateFailed(String),

    #[error("document update failed and the original file could not be restored: {0}")]
    DocumentRestoreFailed(String),

    // ------------------------------------------------------------------
    // Internal (500)
    // ------------------------------------------------------------------
    #[error("invalid role set: {0}")]
    InvalidRoleSet(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl LyceumError {
    /// Stable machine-readable code for client-side branching.
    pub fn api_code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "TOKEN_IS_MISSING",
            Self::ExpiredCredential => "EXPIRED_TOKEN",
            Self::MalformedCredential(_) => "INVALID_TOKEN",
            Self::UnknownSubject => "DECODED_USER_NOT_FOUND",
            Self::FailedLogin => "FAILED_LOGIN",
            Self::WrongPassword => "WRONG_PASSWORD",
            Self::ForbiddenRole { .. } => "PROFILE_FORBIDDEN_ACCESS",
            Self::CrossTenantAccess => "CROSS_TENANT_FORBIDDEN",
            Self::DeactivationForbidden => "DEACTIVATE_FORBIDDEN",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::EmptyPage => "PAGES_NOT_FOUND",
            Self::BlobMissing { .. } => "FILE_NOT_FOUND",
            Self::AlreadyExists { .. } => "ALREADY_EXISTS",
            Self::AlreadyActive => "USER_IS_ACTIVE",
            Self::NotActivated => "USER_NOT_ACTIVATED",
            Self::WrongConfirmPassword => "WRONG_CONFIRM_PASSWORD",
            Self::SamePassword => "WRONG_NEW_PASSWORD",
            Self::Validation { .. } => "INVALID_DATA",
            Self::InvalidOrderColumn(_) => "INVALID_ORDERING_COLUMN",
            Self::InvalidLegalId => "INVALID_CNPJ",
            Self::UnsupportedFile => "UNSUPPORTED_FILE",
            Self::DocumentUpdateFailed(_) => "DOCUMENT_UPDATE_FAILED",
            Self::DocumentRestoreFailed(_) => "DOCUMENT_RESTORE_FAILED",
            Self::InvalidRoleSet(_) => "INVALID_ROLE_SET",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Crypto(_) => "CRYPTO_ERROR",
        }
    }

    /// HTTP-like severity class.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingCredential
            | Self::ExpiredCredential
            | Self::MalformedCredential(_)
            | Self::UnknownSubject
            | Self::FailedLogin
            | Self::WrongPassword => 401,

            Self::ForbiddenRole { .. }
            | Self::CrossTenantAccess
            | Self::DeactivationForbidden => 403,

            Self::NotFound { .. } | Self::EmptyPage | Self::BlobMissing { .. } => 404,

            Self::AlreadyExists { .. } | Self::AlreadyActive => 409,

            Self::NotActivated
            | Self::WrongConfirmPassword
            | Self::Validation { .. }
            | Self::InvalidOrderColumn(_)
            | Self::DocumentUpdateFailed(_) => 400,

            Self::InvalidLegalId => 406,
            Self::UnsupportedFile => 415,
            Self::SamePassword => 422,

            Self::DocumentRestoreFailed(_)
            | Self::InvalidRoleSet(_)
            | Self::Database(_)
            | Self::Crypto(_) => 500,
        }
    }
}

pub type LyceumResult<T> = Result<T, LyceumError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_failures_are_401_class() {
        for err in [
            LyceumError::MissingCredential,
            LyceumError::ExpiredCredential,
            LyceumError::MalformedCredential("bad".into()),
            LyceumError::UnknownSubject,
        ] {
            assert_eq!(err.status_code(), 401, "{err}");
        }
    }

    #[test]
    fn empty_page_is_a_404_class_code() {
        let err = LyceumError::EmptyPage;
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.api_code(), "PAGES_NOT_FOUND");
    }

    #[test]
    fn restore_failure_outranks_update_failure() {
        assert_eq!(
            LyceumError::DocumentUpdateFailed("x".into()).status_code(),
            400
        );
        assert_eq!(
            LyceumError::DocumentRestoreFailed("x".into()).status_code(),
            500
        );
    }
}
