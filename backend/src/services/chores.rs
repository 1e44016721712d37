use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{schedule_columns, ChoreCompletionRow, ChoreRow, RowError};
use crate::services::{children, scheduler};
use shared::{Chore, ChoreWithStatus, CreateChoreRequest, ScheduleError, UpdateChoreRequest};

use super::{ErrorKind, ServiceError, MAX_POINTS};

#[derive(Debug, Error)]
pub enum ChoreError {
    #[error("Chore not found")]
    NotFound,
    #[error("Assigned child not found in this family")]
    AssigneeNotFound,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    InvalidSchedule(#[from] ScheduleError),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Corrupt chore row: {0}")]
    InvalidRow(#[from] RowError),
}

impl ServiceError for ChoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            ChoreError::NotFound => ErrorKind::NotFound,
            ChoreError::AssigneeNotFound
            | ChoreError::Validation(_)
            | ChoreError::InvalidSchedule(_) => ErrorKind::Validation,
            ChoreError::DatabaseError(_) | ChoreError::InvalidRow(_) => ErrorKind::Transport,
        }
    }
}

impl From<children::ChildError> for ChoreError {
    fn from(err: children::ChildError) -> Self {
        match err {
            children::ChildError::NotFound => ChoreError::AssigneeNotFound,
            children::ChildError::Validation(msg) => ChoreError::Validation(msg),
            children::ChildError::DatabaseError(e) => ChoreError::DatabaseError(e),
            children::ChildError::InvalidRow(e) => ChoreError::InvalidRow(e),
        }
    }
}

fn validate_title(title: &str) -> Result<String, ChoreError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ChoreError::Validation("Chore title is required".to_string()));
    }
    Ok(title.to_string())
}

fn validate_points(points: i64) -> Result<i64, ChoreError> {
    if points <= 0 {
        return Err(ChoreError::Validation("Chore points must be positive".to_string()));
    }
    if points > MAX_POINTS {
        return Err(ChoreError::Validation(format!(
            "Chore points cannot exceed {}",
            MAX_POINTS
        )));
    }
    Ok(points)
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

fn rows_to_shared(rows: Vec<ChoreRow>) -> Result<Vec<Chore>, ChoreError> {
    Ok(rows
        .iter()
        .map(|r| r.to_shared())
        .collect::<Result<Vec<_>, _>>()?)
}

pub async fn create_chore(
    pool: &SqlitePool,
    family_id: &Uuid,
    request: &CreateChoreRequest,
) -> Result<Chore, ChoreError> {
    let title = validate_title(&request.title)?;
    let points = validate_points(request.points)?;
    request.schedule.validate()?;
    children::get_family_child(pool, family_id, &request.assignee_id).await?;

    let id = Uuid::new_v4();
    let now = Utc::now();
    let description = normalize_description(request.description.as_deref());
    let emoji = request.emoji.clone().unwrap_or_default();
    let (recurring_days, scheduled_date) = schedule_columns(&request.schedule)?;

    sqlx::query(
        r#"
        INSERT INTO chores (id, family_id, assignee_id, title, description, points, emoji, recurring_days, scheduled_date, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(family_id.to_string())
    .bind(request.assignee_id.to_string())
    .bind(&title)
    .bind(&description)
    .bind(points)
    .bind(&emoji)
    .bind(&recurring_days)
    .bind(scheduled_date)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Chore {
        id,
        family_id: *family_id,
        assignee_id: request.assignee_id,
        title,
        description,
        points,
        emoji,
        schedule: request.schedule.clone(),
        created_at: now,
        updated_at: now,
    })
}

pub async fn get_chore(pool: &SqlitePool, chore_id: &Uuid) -> Result<Option<Chore>, ChoreError> {
    let chore: Option<ChoreRow> = sqlx::query_as("SELECT * FROM chores WHERE id = ?")
        .bind(chore_id.to_string())
        .fetch_optional(pool)
        .await?;

    Ok(chore.map(|c| c.to_shared()).transpose()?)
}

/// Like [`get_chore`], but a chore from another family counts as missing.
pub async fn get_family_chore(
    pool: &SqlitePool,
    family_id: &Uuid,
    chore_id: &Uuid,
) -> Result<Chore, ChoreError> {
    get_chore(pool, chore_id)
        .await?
        .filter(|c| c.family_id == *family_id)
        .ok_or(ChoreError::NotFound)
}

pub async fn list_chores(pool: &SqlitePool, family_id: &Uuid) -> Result<Vec<Chore>, ChoreError> {
    let chores: Vec<ChoreRow> = sqlx::query_as(
        "SELECT * FROM chores WHERE family_id = ? ORDER BY created_at ASC",
    )
    .bind(family_id.to_string())
    .fetch_all(pool)
    .await?;

    rows_to_shared(chores)
}

pub async fn list_child_chores(
    pool: &SqlitePool,
    family_id: &Uuid,
    child_id: &Uuid,
) -> Result<Vec<Chore>, ChoreError> {
    let chores: Vec<ChoreRow> = sqlx::query_as(
        "SELECT * FROM chores WHERE family_id = ? AND assignee_id = ? ORDER BY created_at ASC",
    )
    .bind(family_id.to_string())
    .bind(child_id.to_string())
    .fetch_all(pool)
    .await?;

    rows_to_shared(chores)
}

pub async fn update_chore(
    pool: &SqlitePool,
    chore_id: &Uuid,
    request: &UpdateChoreRequest,
) -> Result<Chore, ChoreError> {
    let mut chore: ChoreRow = sqlx::query_as("SELECT * FROM chores WHERE id = ?")
        .bind(chore_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(ChoreError::NotFound)?;

    if let Some(ref title) = request.title {
        chore.title = validate_title(title)?;
    }
    if let Some(ref description) = request.description {
        chore.description = normalize_description(Some(description));
    }
    if let Some(points) = request.points {
        chore.points = validate_points(points)?;
    }
    if let Some(ref emoji) = request.emoji {
        chore.emoji = emoji.clone();
    }
    if let Some(assignee_id) = request.assignee_id {
        let family_id = crate::models::parse_id("family_id", &chore.family_id)?;
        children::get_family_child(pool, &family_id, &assignee_id).await?;
        chore.assignee_id = assignee_id.to_string();
    }
    if let Some(ref schedule) = request.schedule {
        schedule.validate()?;
        let (recurring_days, scheduled_date) = schedule_columns(schedule)?;
        chore.recurring_days = recurring_days;
        chore.scheduled_date = scheduled_date;
    }

    let now = Utc::now();
    chore.updated_at = now;

    sqlx::query(
        r#"
        UPDATE chores SET assignee_id = ?, title = ?, description = ?, points = ?, emoji = ?, recurring_days = ?, scheduled_date = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&chore.assignee_id)
    .bind(&chore.title)
    .bind(&chore.description)
    .bind(chore.points)
    .bind(&chore.emoji)
    .bind(&chore.recurring_days)
    .bind(chore.scheduled_date)
    .bind(now)
    .bind(chore_id.to_string())
    .execute(pool)
    .await?;

    Ok(chore.to_shared()?)
}

pub async fn delete_chore(pool: &SqlitePool, chore_id: &Uuid) -> Result<(), ChoreError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM chore_completions WHERE chore_id = ?")
        .bind(chore_id.to_string())
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM chores WHERE id = ?")
        .bind(chore_id.to_string())
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ChoreError::NotFound);
    }

    tx.commit().await?;
    Ok(())
}

/// Chores due for `child_id` on `date`, each with that day's completion record.
pub async fn chores_for_day(
    pool: &SqlitePool,
    family_id: &Uuid,
    child_id: &Uuid,
    date: NaiveDate,
) -> Result<Vec<ChoreWithStatus>, ChoreError> {
    let catalog = list_child_chores(pool, family_id, child_id).await?;
    let due = scheduler::due_chores(&catalog, child_id, date);

    let completions: Vec<ChoreCompletionRow> = sqlx::query_as(
        r#"
        SELECT cc.* FROM chore_completions cc
        JOIN chores c ON c.id = cc.chore_id
        WHERE c.family_id = ? AND c.assignee_id = ? AND cc.completed_date = ?
        "#,
    )
    .bind(family_id.to_string())
    .bind(child_id.to_string())
    .bind(date)
    .fetch_all(pool)
    .await?;

    let mut by_chore = HashMap::new();
    for row in &completions {
        let completion = row.to_shared()?;
        by_chore.insert(completion.chore_id, completion);
    }

    Ok(due
        .into_iter()
        .map(|chore| {
            let completion = by_chore.remove(&chore.id);
            ChoreWithStatus { chore, completion }
        })
        .collect())
}
