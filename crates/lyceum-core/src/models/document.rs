//! Document domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// At most one document per student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub student_id: Uuid,
    pub title: String,
    /// Key of the uploaded file in the blob store, if any.
    pub key: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocument {
    pub student_id: Uuid,
    pub title: String,
    pub key: Option<String>,
}
