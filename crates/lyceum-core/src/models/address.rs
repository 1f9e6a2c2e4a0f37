//! Address value object, embedded in institutes and students.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub state: String,
    pub city: String,
    pub neighborhood: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAddress {
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
}

impl Address {
    /// Apply a partial update in place.
    pub fn apply(&mut self, update: UpdateAddress) {
        if let Some(v) = update.postal_code {
            self.postal_code = Some(v);
        }
        if let Some(v) = update.country {
            self.country = Some(v);
        }
        if let Some(v) = update.state {
            self.state = v;
        }
        if let Some(v) = update.city {
            self.city = v;
        }
        if let Some(v) = update.neighborhood {
            self.neighborhood = Some(v);
        }
        if let Some(v) = update.street {
            self.street = Some(v);
        }
        if let Some(v) = update.number {
            self.number = Some(v);
        }
        if let Some(v) = update.complement {
            self.complement = Some(v);
        }
    }
}
