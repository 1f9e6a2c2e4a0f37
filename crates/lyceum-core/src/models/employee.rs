//! Employee association entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Binds a user to an institute. The institute is fixed at creation;
/// there is exactly one employee record per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub user_id: Uuid,
    pub institute_id: Uuid,
    /// Free-text role label (e.g. "coordinator"), distinct from
    /// [`Profile`](crate::models::user::Profile).
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
}
