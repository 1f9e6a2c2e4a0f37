//! User domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LyceumError;

/// The access profile of a user account.
///
/// Distinct from the free-text role label on an [`Employee`]: the
/// profile drives authorization, the label is informational.
///
/// [`Employee`]: crate::models::employee::Employee
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Profile {
    Institute,
    Admin,
    Owner,
    Student,
    Employee,
}

impl Profile {
    pub const ALL: &[Profile] = &[
        Profile::Institute,
        Profile::Admin,
        Profile::Owner,
        Profile::Student,
        Profile::Employee,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Institute => "INSTITUTE",
            Profile::Admin => "ADMIN",
            Profile::Owner => "OWNER",
            Profile::Student => "STUDENT",
            Profile::Employee => "EMPLOYEE",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = LyceumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INSTITUTE" => Ok(Profile::Institute),
            "ADMIN" => Ok(Profile::Admin),
            "OWNER" => Ok(Profile::Owner),
            "STUDENT" => Ok(Profile::Student),
            "EMPLOYEE" => Ok(Profile::Employee),
            other => Err(LyceumError::InvalidRoleSet(format!(
                "'{other}' is not a valid profile"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Argon2id PHC-format digest. `None` until the account is activated.
    pub password_hash: Option<String>,
    pub name: String,
    pub phone_number: String,
    /// Last issued auth token, denormalized for display only.
    /// Verification never depends on this field.
    pub token: Option<String>,
    pub activation_status: bool,
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub phone_number: String,
    pub profile: Profile,
    /// Pre-hashed digest; accounts created by invitation carry `None`
    /// and receive a password at activation time.
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub password_hash: Option<String>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub token: Option<Option<String>>,
    pub activation_status: Option<bool>,
}
