use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ChildRow, RowError};
use shared::{Child, CreateChildRequest, UpdateChildRequest};

use super::{ErrorKind, ServiceError};

#[derive(Debug, Error)]
pub enum ChildError {
    #[error("Child not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Corrupt child row: {0}")]
    InvalidRow(#[from] RowError),
}

impl ServiceError for ChildError {
    fn kind(&self) -> ErrorKind {
        match self {
            ChildError::NotFound => ErrorKind::NotFound,
            ChildError::Validation(_) => ErrorKind::Validation,
            ChildError::DatabaseError(_) | ChildError::InvalidRow(_) => ErrorKind::Transport,
        }
    }
}

fn validate_name(name: &str) -> Result<String, ChildError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ChildError::Validation("Child name is required".to_string()));
    }
    Ok(name.to_string())
}

pub async fn create_child(
    pool: &SqlitePool,
    family_id: &Uuid,
    request: &CreateChildRequest,
) -> Result<Child, ChildError> {
    let name = validate_name(&request.name)?;
    let emoji = request.emoji.clone().unwrap_or_default();

    let display_order = match request.display_order {
        Some(order) => order,
        None => {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM children WHERE family_id = ?")
                .bind(family_id.to_string())
                .fetch_one(pool)
                .await? as i32
        }
    };

    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO children (id, family_id, name, emoji, points, display_order, created_at, updated_at)
        VALUES (?, ?, ?, ?, 0, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(family_id.to_string())
    .bind(&name)
    .bind(&emoji)
    .bind(display_order)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    log::info!("Added child {} to family {}", id, family_id);

    Ok(Child {
        id,
        family_id: *family_id,
        name,
        emoji,
        points: 0,
        display_order,
        created_at: now,
        updated_at: now,
    })
}

pub async fn get_child(pool: &SqlitePool, child_id: &Uuid) -> Result<Option<Child>, ChildError> {
    let child: Option<ChildRow> = sqlx::query_as("SELECT * FROM children WHERE id = ?")
        .bind(child_id.to_string())
        .fetch_optional(pool)
        .await?;

    Ok(child.map(|c| c.to_shared()).transpose()?)
}

/// Like [`get_child`], but a child from another family counts as missing.
pub async fn get_family_child(
    pool: &SqlitePool,
    family_id: &Uuid,
    child_id: &Uuid,
) -> Result<Child, ChildError> {
    get_child(pool, child_id)
        .await?
        .filter(|c| c.family_id == *family_id)
        .ok_or(ChildError::NotFound)
}

pub async fn list_children(pool: &SqlitePool, family_id: &Uuid) -> Result<Vec<Child>, ChildError> {
    let children: Vec<ChildRow> = sqlx::query_as(
        "SELECT * FROM children WHERE family_id = ? ORDER BY display_order ASC, created_at ASC",
    )
    .bind(family_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(children
        .iter()
        .map(|c| c.to_shared())
        .collect::<Result<Vec<_>, _>>()?)
}

pub async fn update_child(
    pool: &SqlitePool,
    child_id: &Uuid,
    request: &UpdateChildRequest,
) -> Result<Child, ChildError> {
    let mut child: ChildRow = sqlx::query_as("SELECT * FROM children WHERE id = ?")
        .bind(child_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(ChildError::NotFound)?;

    if let Some(ref name) = request.name {
        child.name = validate_name(name)?;
    }
    if let Some(ref emoji) = request.emoji {
        child.emoji = emoji.clone();
    }
    if let Some(display_order) = request.display_order {
        child.display_order = display_order;
    }

    let now = Utc::now();
    child.updated_at = now;

    // points is not in the SET list: only the ledger writes it
    sqlx::query("UPDATE children SET name = ?, emoji = ?, display_order = ?, updated_at = ? WHERE id = ?")
        .bind(&child.name)
        .bind(&child.emoji)
        .bind(child.display_order)
        .bind(now)
        .bind(child_id.to_string())
        .execute(pool)
        .await?;

    // Re-read so the returned balance is current, not the one loaded above
    let child: ChildRow = sqlx::query_as("SELECT * FROM children WHERE id = ?")
        .bind(child_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(ChildError::NotFound)?;

    Ok(child.to_shared()?)
}

/// Remove a child together with its chores, completions and claims.
pub async fn delete_child(pool: &SqlitePool, child_id: &Uuid) -> Result<(), ChildError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM reward_claims WHERE child_id = ?")
        .bind(child_id.to_string())
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "DELETE FROM chore_completions WHERE child_id = ? OR chore_id IN (SELECT id FROM chores WHERE assignee_id = ?)",
    )
    .bind(child_id.to_string())
    .bind(child_id.to_string())
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM chores WHERE assignee_id = ?")
        .bind(child_id.to_string())
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM children WHERE id = ?")
        .bind(child_id.to_string())
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ChildError::NotFound);
    }

    tx.commit().await?;
    log::info!("Removed child {}", child_id);

    Ok(())
}
