use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{ChoreSchedule, WeekdayName};
use sqlx::FromRow;
use std::collections::BTreeSet;

use super::{parse_id, RowError};

/// Database model for chores
///
/// The schedule is split over two nullable columns; exactly one is set.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChoreRow {
    pub id: String,
    pub family_id: String,
    pub assignee_id: String,
    pub title: String,
    pub description: Option<String>,
    pub points: i64,
    pub emoji: String,
    pub recurring_days: Option<String>,
    pub scheduled_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Split a schedule into its `(recurring_days, scheduled_date)` column values.
pub fn schedule_columns(
    schedule: &ChoreSchedule,
) -> Result<(Option<String>, Option<NaiveDate>), RowError> {
    match schedule {
        ChoreSchedule::Recurring { days } => Ok((Some(serde_json::to_string(days)?), None)),
        ChoreSchedule::AdHoc { date } => Ok((None, Some(*date))),
    }
}

impl ChoreRow {
    pub fn schedule(&self) -> Result<ChoreSchedule, RowError> {
        let days = self
            .recurring_days
            .as_deref()
            .map(|days| serde_json::from_str::<BTreeSet<WeekdayName>>(days))
            .transpose()?;

        ChoreSchedule::from_parts(days, self.scheduled_date).map_err(|source| {
            RowError::InvalidSchedule {
                id: self.id.clone(),
                source,
            }
        })
    }

    pub fn to_shared(&self) -> Result<shared::Chore, RowError> {
        Ok(shared::Chore {
            id: parse_id("id", &self.id)?,
            family_id: parse_id("family_id", &self.family_id)?,
            assignee_id: parse_id("assignee_id", &self.assignee_id)?,
            title: self.title.clone(),
            description: self.description.clone(),
            points: self.points,
            emoji: self.emoji.clone(),
            schedule: self.schedule()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn row(recurring_days: Option<&str>, scheduled_date: Option<NaiveDate>) -> ChoreRow {
        let now = Utc::now();
        ChoreRow {
            id: Uuid::new_v4().to_string(),
            family_id: Uuid::new_v4().to_string(),
            assignee_id: Uuid::new_v4().to_string(),
            title: "Wash dishes".to_string(),
            description: None,
            points: 5,
            emoji: "🍽️".to_string(),
            recurring_days: recurring_days.map(str::to_string),
            scheduled_date,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_recurring_chore_row_to_shared() {
        let shared = row(Some(r#"["Wednesday","Monday"]"#), None).to_shared().unwrap();

        assert_eq!(shared.title, "Wash dishes");
        assert_eq!(shared.points, 5);
        assert_eq!(
            shared.schedule,
            ChoreSchedule::recurring(vec![WeekdayName::Monday, WeekdayName::Wednesday]).unwrap()
        );
    }

    #[test]
    fn test_ad_hoc_chore_row_to_shared() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let shared = row(None, Some(date)).to_shared().unwrap();

        assert_eq!(shared.schedule, ChoreSchedule::AdHoc { date });
    }

    #[test]
    fn test_chore_row_without_schedule_is_rejected() {
        assert!(matches!(
            row(None, None).to_shared(),
            Err(RowError::InvalidSchedule { .. })
        ));
        assert!(matches!(
            row(Some("[]"), None).to_shared(),
            Err(RowError::InvalidSchedule { .. })
        ));
        assert!(matches!(
            row(Some("not json"), None).to_shared(),
            Err(RowError::InvalidDays(_))
        ));
    }

    #[test]
    fn test_schedule_columns() {
        let schedule = ChoreSchedule::recurring(vec![WeekdayName::Friday, WeekdayName::Monday]).unwrap();
        let (days, date) = schedule_columns(&schedule).unwrap();
        assert_eq!(days.as_deref(), Some(r#"["Monday","Friday"]"#));
        assert!(date.is_none());

        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let (days, stored) = schedule_columns(&ChoreSchedule::ad_hoc(date)).unwrap();
        assert!(days.is_none());
        assert_eq!(stored, Some(date));
    }
}
