//! Access-control guard and identity resolver.
//!
//! Guards are first-class values composed at wiring time: every
//! mutating or identity-scoped operation goes through
//! [`RoleGuard::authorize`], and credential-only endpoints through
//! [`require_credential`]. Resource code never re-implements these
//! checks.

use uuid::Uuid;

use lyceum_core::error::{LyceumError, LyceumResult};
use lyceum_core::models::user::{Profile, User};
use lyceum_core::repository::UserRepository;

use crate::config::AuthConfig;
use crate::token;

/// Require a valid credential without resolving the identity.
///
/// Fails with `MissingCredential` when no header value was supplied;
/// verification failures propagate as expired/malformed.
pub fn require_credential(credential: Option<&str>, config: &AuthConfig) -> LyceumResult<Uuid> {
    let credential = credential.ok_or(LyceumError::MissingCredential)?;
    Ok(token::verify_auth_token(credential, config)?)
}

/// Verify a credential and load the identity it refers to.
///
/// Fails with `UnknownSubject` when the subject no longer exists.
/// Pure read — no mutation.
pub async fn resolve<R: UserRepository>(
    credential: &str,
    users: &R,
    config: &AuthConfig,
) -> LyceumResult<User> {
    let subject = token::verify_auth_token(credential, config)?;
    match users.get_by_id(subject).await {
        Ok(user) => Ok(user),
        Err(LyceumError::NotFound { .. }) => Err(LyceumError::UnknownSubject),
        Err(e) => Err(e),
    }
}

/// Restricts an operation to a set of profiles.
///
/// The allow-list is validated at construction time; request-time
/// failures are missing/expired/malformed credential, unknown subject,
/// or `ForbiddenRole`. On success the resolved identity is returned for
/// the caller to use (or ignore).
#[derive(Debug)]
pub struct RoleGuard<R: UserRepository> {
    users: R,
    config: AuthConfig,
    allowed: Vec<Profile>,
}

impl<R: UserRepository> RoleGuard<R> {
    /// Fails with `InvalidRoleSet` when `allowed` is empty.
    pub fn new(users: R, config: AuthConfig, allowed: &[Profile]) -> LyceumResult<Self> {
        if allowed.is_empty() {
            return Err(LyceumError::InvalidRoleSet(
                "the allowed profile set must not be empty".into(),
            ));
        }
        Ok(Self {
            users,
            config,
            allowed: allowed.to_vec(),
        })
    }

    /// Build the allow-list from profile names; unrecognized names fail
    /// with `InvalidRoleSet`.
    pub fn from_names(users: R, config: AuthConfig, names: &[&str]) -> LyceumResult<Self> {
        let allowed = names
            .iter()
            .map(|name| name.parse())
            .collect::<LyceumResult<Vec<Profile>>>()?;
        Self::new(users, config, &allowed)
    }

    /// The single choke point for identity-scoped requests.
    pub async fn authorize(&self, credential: Option<&str>) -> LyceumResult<User> {
        let credential = credential.ok_or(LyceumError::MissingCredential)?;
        let user = resolve(credential, &self.users, &self.config).await?;
        if self.allowed.contains(&user.profile) {
            Ok(user)
        } else {
            Err(LyceumError::ForbiddenRole {
                profile: user.profile.to_string(),
                allowed: self
                    .allowed
                    .iter()
                    .map(Profile::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
        }
    }
}
