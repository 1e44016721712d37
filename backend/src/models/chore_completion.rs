use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{parse_id, parse_optional_id, RowError};

/// Database model for chore completions
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChoreCompletionRow {
    pub id: String,
    pub chore_id: String,
    pub child_id: String,
    pub completed_date: NaiveDate,
    pub status: String,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ChoreCompletionRow {
    pub fn to_shared(&self) -> Result<shared::ChoreCompletion, RowError> {
        Ok(shared::ChoreCompletion {
            id: parse_id("id", &self.id)?,
            chore_id: parse_id("chore_id", &self.chore_id)?,
            child_id: parse_id("child_id", &self.child_id)?,
            completed_date: self.completed_date,
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
    use shared::CompletionStatus;
    use uuid::Uuid;

    #[test]
    fn test_completion_row_to_shared() {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let chore_id = Uuid::new_v4();
        let child_id = Uuid::new_v4();
        let parent_id = Uuid::new_v4();
        let completed_date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

        let row = ChoreCompletionRow {
            id: id.to_string(),
            chore_id: chore_id.to_string(),
            child_id: child_id.to_string(),
            completed_date,
            status: "approved".to_string(),
            approved_by: Some(parent_id.to_string()),
            approved_at: Some(now),
            created_at: now,
        };

        let shared = row.to_shared().unwrap();

        assert_eq!(shared.id, id);
        assert_eq!(shared.chore_id, chore_id);
        assert_eq!(shared.child_id, child_id);
        assert_eq!(shared.completed_date, completed_date);
        assert_eq!(shared.status, CompletionStatus::Approved);
        assert_eq!(shared.approved_by, Some(parent_id));
    }

    #[test]
    fn test_completion_row_with_unknown_status() {
        let now = Utc::now();
        let row = ChoreCompletionRow {
            id: Uuid::new_v4().to_string(),
            chore_id: Uuid::new_v4().to_string(),
            child_id: Uuid::new_v4().to_string(),
            completed_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            status: "done".to_string(),
            approved_by: None,
            approved_at: None,
            created_at: now,
        };

        assert!(matches!(row.to_shared(), Err(RowError::InvalidStatus(s)) if s == "done"));
    }
}
