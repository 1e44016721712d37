use chrono::NaiveDate;
use shared::{Chore, ChoreSchedule};
use std::collections::HashSet;
use uuid::Uuid;

use crate::services::calendar;

/// Check if a chore is due on a specific date based on its schedule
pub fn is_chore_due_on_date(chore: &Chore, date: NaiveDate) -> bool {
    match &chore.schedule {
        ChoreSchedule::Recurring { days } => days.contains(&calendar::weekday_name(date)),
        ChoreSchedule::AdHoc { date: scheduled } => *scheduled == date,
    }
}

/// Chores from `catalog` assigned to `child_id` and due on `date`.
///
/// Keeps catalog order and drops repeated ids, so the result is a set.
pub fn due_chores(catalog: &[Chore], child_id: &Uuid, date: NaiveDate) -> Vec<Chore> {
    let mut seen = HashSet::new();

    catalog
        .iter()
        .filter(|chore| chore.assignee_id == *child_id)
        .filter(|chore| is_chore_due_on_date(chore, date))
        .filter(|chore| seen.insert(chore.id))
        .cloned()
        .collect()
}
