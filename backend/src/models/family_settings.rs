use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{parse_id, RowError};

/// Database model for per-family settings
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FamilySettingsRow {
    pub family_id: String,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FamilySettingsRow {
    pub fn to_shared(&self) -> Result<shared::FamilySettings, RowError> {
        Ok(shared::FamilySettings {
            family_id: parse_id("family_id", &self.family_id)?,
            timezone: self.timezone.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
