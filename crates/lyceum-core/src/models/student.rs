//! Student domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LyceumError;
use crate::models::address::{Address, UpdateAddress};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    CisMale,
    CisFemale,
    TransMale,
    TransFemale,
    NonBinary,
    Unspoken,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::CisMale => "CIS_MALE",
            Gender::CisFemale => "CIS_FEMALE",
            Gender::TransMale => "TRANS_MALE",
            Gender::TransFemale => "TRANS_FEMALE",
            Gender::NonBinary => "NON_BINARY",
            Gender::Unspoken => "UNSPOKEN",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = LyceumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CIS_MALE" => Ok(Gender::CisMale),
            "CIS_FEMALE" => Ok(Gender::CisFemale),
            "TRANS_MALE" => Ok(Gender::TransMale),
            "TRANS_FEMALE" => Ok(Gender::TransFemale),
            "NON_BINARY" => Ok(Gender::NonBinary),
            "UNSPOKEN" => Ok(Gender::Unspoken),
            other => Err(LyceumError::Validation {
                field: "gender",
                message: format!("'{other}' is not a valid gender"),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub user_id: Uuid,
    pub institute_id: Uuid,
    pub birthday_date: NaiveDate,
    pub gender: Gender,
    pub disabled_person: bool,
    pub address: Address,
    pub created_at: DateTime<Utc>,
}

/// Student fields supplied at registration; the user account and the
/// owning institute are resolved from the invitation token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStudent {
    pub birthday_date: NaiveDate,
    pub gender: Gender,
    pub disabled_person: bool,
    pub address: Address,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStudent {
    pub birthday_date: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub disabled_person: Option<bool>,
    pub address: Option<UpdateAddress>,
}
