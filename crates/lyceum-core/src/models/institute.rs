//! Institute domain model.
//!
//! The institute is the tenant: the unit of data isolation. All
//! employees and students are scoped to exactly one institute, and an
//! institute is always created together with its admin account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::address::{Address, UpdateAddress};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Institute {
    pub id: Uuid,
    /// Brazilian legal registration number, unique, check-digit validated.
    pub cnpj: String,
    pub trading_name: String,
    pub corporate_name: String,
    pub address: Address,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInstitute {
    pub cnpj: String,
    pub trading_name: String,
    pub corporate_name: String,
    pub address: Address,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateInstitute {
    pub trading_name: Option<String>,
    pub corporate_name: Option<String>,
    pub address: Option<UpdateAddress>,
}
