use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{RewardRow, RowError};
use shared::{CreateRewardRequest, Reward, UpdateRewardRequest};

use super::{ErrorKind, ServiceError, MAX_POINTS};

#[derive(Debug, Error)]
pub enum RewardError {
    #[error("Reward not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Corrupt reward row: {0}")]
    InvalidRow(#[from] RowError),
}

impl ServiceError for RewardError {
    fn kind(&self) -> ErrorKind {
        match self {
            RewardError::NotFound => ErrorKind::NotFound,
            RewardError::Validation(_) => ErrorKind::Validation,
            RewardError::DatabaseError(_) | RewardError::InvalidRow(_) => ErrorKind::Transport,
        }
    }
}

fn validate_title(title: &str) -> Result<String, RewardError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(RewardError::Validation("Reward title is required".to_string()));
    }
    Ok(title.to_string())
}

fn validate_cost(points_required: i64) -> Result<i64, RewardError> {
    if points_required <= 0 {
        return Err(RewardError::Validation(
            "Reward cost must be a positive number of points".to_string(),
        ));
    }
    if points_required > MAX_POINTS {
        return Err(RewardError::Validation(format!(
            "Reward cost cannot exceed {} points",
            MAX_POINTS
        )));
    }
    Ok(points_required)
}

pub async fn create_reward(
    pool: &SqlitePool,
    family_id: &Uuid,
    request: &CreateRewardRequest,
) -> Result<Reward, RewardError> {
    let title = validate_title(&request.title)?;
    let points_required = validate_cost(request.points_required)?;
    let emoji = request.emoji.clone().unwrap_or_default();

    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO rewards (id, family_id, title, emoji, points_required, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(family_id.to_string())
    .bind(&title)
    .bind(&emoji)
    .bind(points_required)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Reward {
        id,
        family_id: *family_id,
        title,
        emoji,
        points_required,
        created_at: now,
        updated_at: now,
    })
}

pub async fn get_reward(pool: &SqlitePool, reward_id: &Uuid) -> Result<Option<Reward>, RewardError> {
    let reward: Option<RewardRow> = sqlx::query_as("SELECT * FROM rewards WHERE id = ?")
        .bind(reward_id.to_string())
        .fetch_optional(pool)
        .await?;

    Ok(reward.map(|r| r.to_shared()).transpose()?)
}

pub async fn get_family_reward(
    pool: &SqlitePool,
    family_id: &Uuid,
    reward_id: &Uuid,
) -> Result<Reward, RewardError> {
    get_reward(pool, reward_id)
        .await?
        .filter(|r| r.family_id == *family_id)
        .ok_or(RewardError::NotFound)
}

/// Cheapest first.
pub async fn list_rewards(pool: &SqlitePool, family_id: &Uuid) -> Result<Vec<Reward>, RewardError> {
    let rewards: Vec<RewardRow> = sqlx::query_as(
        "SELECT * FROM rewards WHERE family_id = ? ORDER BY points_required ASC, title ASC",
    )
    .bind(family_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rewards
        .iter()
        .map(|r| r.to_shared())
        .collect::<Result<Vec<_>, _>>()?)
}

pub async fn update_reward(
    pool: &SqlitePool,
    reward_id: &Uuid,
    request: &UpdateRewardRequest,
) -> Result<Reward, RewardError> {
    let mut reward: RewardRow = sqlx::query_as("SELECT * FROM rewards WHERE id = ?")
        .bind(reward_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(RewardError::NotFound)?;

    if let Some(ref title) = request.title {
        reward.title = validate_title(title)?;
    }
    if let Some(ref emoji) = request.emoji {
        reward.emoji = emoji.clone();
    }
    if let Some(points_required) = request.points_required {
        reward.points_required = validate_cost(points_required)?;
    }

    let now = Utc::now();
    reward.updated_at = now;

    sqlx::query("UPDATE rewards SET title = ?, emoji = ?, points_required = ?, updated_at = ? WHERE id = ?")
        .bind(&reward.title)
        .bind(&reward.emoji)
        .bind(reward.points_required)
        .bind(now)
        .bind(reward_id.to_string())
        .execute(pool)
        .await?;

    Ok(reward.to_shared()?)
}

pub async fn delete_reward(pool: &SqlitePool, reward_id: &Uuid) -> Result<(), RewardError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM reward_claims WHERE reward_id = ?")
        .bind(reward_id.to_string())
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM rewards WHERE id = ?")
        .bind(reward_id.to_string())
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RewardError::NotFound);
    }

    tx.commit().await?;
    Ok(())
}
