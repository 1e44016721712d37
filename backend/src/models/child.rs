use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{parse_id, RowError};

/// Database model for children
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChildRow {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub emoji: String,
    pub points: i64,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChildRow {
    pub fn to_shared(&self) -> Result<shared::Child, RowError> {
        Ok(shared::Child {
            id: parse_id("id", &self.id)?,
            family_id: parse_id("family_id", &self.family_id)?,
            name: self.name.clone(),
            emoji: self.emoji.clone(),
            points: self.points,
            display_order: self.display_order,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
