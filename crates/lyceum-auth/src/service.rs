//! Account lifecycle service — login, activation, password reset.

use chrono::Duration;
use serde_json::json;

use lyceum_core::error::{LyceumError, LyceumResult};
use lyceum_core::external::{Mailer, OutgoingMail};
use lyceum_core::models::user::{UpdateUser, User};
use lyceum_core::repository::UserRepository;
use lyceum_core::validate;

use crate::config::AuthConfig;
use crate::mail::{self, send_detached};
use crate::password;
use crate::token;

/// Successful login result.
#[derive(Debug, Clone)]
pub struct LoginOutput {
    /// Signed auth token.
    pub token: String,
    pub user: User,
}

/// Account lifecycle orchestration.
///
/// Generic over the user repository and mailer so that this layer has
/// no dependency on the database or delivery crates.
pub struct AuthService<U: UserRepository, M: Mailer + Clone> {
    users: U,
    mailer: M,
    config: AuthConfig,
}

impl<U: UserRepository, M: Mailer + Clone> AuthService<U, M> {
    pub fn new(users: U, mailer: M, config: AuthConfig) -> Self {
        Self {
            users,
            mailer,
            config,
        }
    }

    /// Authenticate with email + password and issue an auth token.
    ///
    /// The issued token is denormalized onto the user record for
    /// display; verification never reads it back.
    pub async fn login(&self, email: &str, password: &str) -> LyceumResult<LoginOutput> {
        let user = match self.users.get_by_email(email).await {
            Ok(user) => user,
            Err(LyceumError::NotFound { .. }) => return Err(LyceumError::FailedLogin),
            Err(e) => return Err(e),
        };

        if !user.activation_status {
            return Err(LyceumError::NotActivated);
        }

        let hash = user.password_hash.as_deref().ok_or(LyceumError::FailedLogin)?;
        let valid = password::verify_password(password, hash, self.config.pepper.as_deref())?;
        if !valid {
            return Err(LyceumError::FailedLogin);
        }

        let ttl = Duration::seconds(self.config.auth_token_ttl_secs);
        let auth_token = token::issue_auth_token(user.id, ttl, &self.config)?;

        let user = self
            .users
            .update(
                user.id,
                UpdateUser {
                    token: Some(Some(auth_token.clone())),
                    ..UpdateUser::default()
                },
            )
            .await?;

        Ok(LoginOutput {
            token: auth_token,
            user,
        })
    }

    /// Check that an activation/reset token is well-formed and refers
    /// to an existing account.
    pub async fn validate_email_token(&self, email_token: &str) -> LyceumResult<String> {
        let email = self.decode_single_email(email_token)?;
        self.users.get_by_email(&email).await?;
        Ok(email)
    }

    /// Set the initial password and activate the account.
    pub async fn activate_account(&self, email_token: &str, new_password: &str) -> LyceumResult<User> {
        let email = self.decode_single_email(email_token)?;
        let user = self.users.get_by_email(&email).await?;

        if user.activation_status {
            return Err(LyceumError::AlreadyActive);
        }

        validate::password(new_password)?;
        let digest = password::hash_password(new_password, self.config.pepper.as_deref())?;

        self.users
            .update(
                user.id,
                UpdateUser {
                    password_hash: Some(digest),
                    activation_status: Some(true),
                    ..UpdateUser::default()
                },
            )
            .await
    }

    /// Dispatch a password-reset email. The mail is fire-and-forget;
    /// a delivery failure never surfaces here.
    pub async fn forgot_password(&self, email: &str) -> LyceumResult<()> {
        let user = self.users.get_by_email(email).await?;
        let reset_token = token::issue_email_token(std::slice::from_ref(&user.email), &self.config)?;

        send_detached(
            &self.mailer,
            OutgoingMail::new(user.email, mail::RESET_PASSWORD, "Token Reset Password")
                .with_context(json!({ "token_reset_password": reset_token })),
        );
        Ok(())
    }

    /// Reset the password through an emailed token.
    pub async fn reset_password(
        &self,
        email_token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> LyceumResult<User> {
        if new_password != confirm_password {
            return Err(LyceumError::WrongConfirmPassword);
        }

        let email = self.decode_single_email(email_token)?;
        let user = self.users.get_by_email(&email).await?;

        validate::password(new_password)?;
        let digest = password::hash_password(new_password, self.config.pepper.as_deref())?;

        self.users
            .update(
                user.id,
                UpdateUser {
                    password_hash: Some(digest),
                    ..UpdateUser::default()
                },
            )
            .await
    }

    /// Change the password of the resolved identity itself.
    pub async fn change_password(
        &self,
        actor: &User,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> LyceumResult<()> {
        if new_password != confirm_password {
            return Err(LyceumError::WrongConfirmPassword);
        }

        let hash = actor
            .password_hash
            .as_deref()
            .ok_or(LyceumError::WrongPassword)?;
        let pepper = self.config.pepper.as_deref();

        if !password::verify_password(old_password, hash, pepper)? {
            return Err(LyceumError::WrongPassword);
        }
        if password::verify_password(new_password, hash, pepper)? {
            return Err(LyceumError::SamePassword);
        }

        validate::password(new_password)?;
        let digest = password::hash_password(new_password, pepper)?;

        self.users
            .update(
                actor.id,
                UpdateUser {
                    password_hash: Some(digest),
                    ..UpdateUser::default()
                },
            )
            .await?;
        Ok(())
    }

    fn decode_single_email(&self, email_token: &str) -> LyceumResult<String> {
        let mut emails = token::verify_email_token(email_token, &self.config)?;
        match emails.len() {
            1 => Ok(emails.remove(0)),
            n => Err(LyceumError::MalformedCredential(format!(
                "expected one address in the token, found {n}"
            ))),
        }
    }
}
