use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{parse_id, parse_optional_id, RowError};

/// Database model for rewards
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RewardRow {
    pub id: String,
    pub family_id: String,
    pub title: String,
    pub emoji: String,
    pub points_required: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RewardRow {
    pub fn to_shared(&self) -> Result<shared::Reward, RowError> {
        Ok(shared::Reward {
            id: parse_id("id", &self.id)?,
            family_id: parse_id("family_id", &self.family_id)?,
            title: self.title.clone(),
            emoji: self.emoji.clone(),
            points_required: self.points_required,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Database model for reward claims
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RewardClaimRow {
    pub id: String,
    pub reward_id: String,
    pub child_id: String,
    pub status: String,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RewardClaimRow {
    pub fn to_shared(&self) -> Result<shared::RewardClaim, RowError> {
        Ok(shared::RewardClaim {
            id: parse_id("id", &self.id)?,
            reward_id: parse_id("reward_id", &self.reward_id)?,
            child_id: parse_id("child_id", &self.child_id)?,
            status: self
                .status
                .parse()
                .map_err(|_| RowError::InvalidStatus(self.status.clone()))?,
            approved_by: parse_optional_id("approved_by", self.approved_by.as_ref())?,
            approved_at: self.approved_at,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ClaimStatus;
    use uuid::Uuid;

    #[test]
    fn test_reward_row_to_shared() {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let family_id = Uuid::new_v4();

        let row = RewardRow {
            id: id.to_string(),
            family_id: family_id.to_string(),
            title: "Movie Night".to_string(),
            emoji: "🎬".to_string(),
            points_required: 100,
            created_at: now,
            updated_at: now,
        };

        let shared = row.to_shared().unwrap();

        assert_eq!(shared.id, id);
        assert_eq!(shared.family_id, family_id);
        assert_eq!(shared.title, "Movie Night");
        assert_eq!(shared.points_required, 100);
    }

    #[test]
    fn test_reward_claim_row_to_shared() {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let reward_id = Uuid::new_v4();
        let child_id = Uuid::new_v4();

        let row = RewardClaimRow {
            id: id.to_string(),
            reward_id: reward_id.to_string(),
            child_id: child_id.to_string(),
            status: "pending".to_string(),
            approved_by: None,
            approved_at: None,
            created_at: now,
        };

        let shared = row.to_shared().unwrap();

        assert_eq!(shared.id, id);
        assert_eq!(shared.reward_id, reward_id);
        assert_eq!(shared.child_id, child_id);
        assert_eq!(shared.status, ClaimStatus::Pending);
        assert!(shared.approved_by.is_none());
    }
}
