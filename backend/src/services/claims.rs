//! Reward claims. Points are checked when the child asks and again when a
//! parent approves; only approval spends them.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::db;
use crate::models::{ChildRow, RewardClaimRow, RewardRow, RowError};
use crate::services::{children, is_unique_violation, ledger, rewards};
use shared::{ClaimAction, ClaimResult, ClaimStatus, PendingClaim, RewardClaim, TransitionError};

use super::{ErrorKind, ServiceError};

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Claim not found")]
    NotFound,
    #[error("Reward not found")]
    RewardNotFound,
    #[error("Child not found")]
    ChildNotFound,
    #[error("Not enough points: balance {balance}, reward costs {required}")]
    InsufficientPoints { balance: i64, required: i64 },
    #[error("This reward already has a pending claim")]
    AlreadyPending,
    #[error("{0}")]
    WrongState(#[from] TransitionError),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Corrupt claim row: {0}")]
    InvalidRow(#[from] RowError),
}

impl ServiceError for ClaimError {
    fn kind(&self) -> ErrorKind {
        match self {
            ClaimError::NotFound | ClaimError::RewardNotFound | ClaimError::ChildNotFound => {
                ErrorKind::NotFound
            }
            ClaimError::InsufficientPoints { .. }
            | ClaimError::AlreadyPending
            | ClaimError::WrongState(_) => ErrorKind::Conflict,
            ClaimError::DatabaseError(_) | ClaimError::InvalidRow(_) => ErrorKind::Transport,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ClaimError::InsufficientPoints { .. } => "insufficient_points",
            ClaimError::AlreadyPending => "claim_pending",
            ClaimError::WrongState(_) => "wrong_state",
            ClaimError::NotFound | ClaimError::RewardNotFound | ClaimError::ChildNotFound => {
                "not_found"
            }
            ClaimError::DatabaseError(_) | ClaimError::InvalidRow(_) => "internal_error",
        }
    }
}

impl From<ledger::LedgerError> for ClaimError {
    fn from(err: ledger::LedgerError) -> Self {
        match err {
            ledger::LedgerError::ChildNotFound => ClaimError::ChildNotFound,
            ledger::LedgerError::InsufficientPoints { balance, required } => {
                ClaimError::InsufficientPoints { balance, required }
            }
            ledger::LedgerError::DatabaseError(e) => ClaimError::DatabaseError(e),
        }
    }
}

impl From<rewards::RewardError> for ClaimError {
    fn from(err: rewards::RewardError) -> Self {
        match err {
            rewards::RewardError::NotFound | rewards::RewardError::Validation(_) => {
                ClaimError::RewardNotFound
            }
            rewards::RewardError::DatabaseError(e) => ClaimError::DatabaseError(e),
            rewards::RewardError::InvalidRow(e) => ClaimError::InvalidRow(e),
        }
    }
}

impl From<children::ChildError> for ClaimError {
    fn from(err: children::ChildError) -> Self {
        match err {
            children::ChildError::NotFound | children::ChildError::Validation(_) => {
                ClaimError::ChildNotFound
            }
            children::ChildError::DatabaseError(e) => ClaimError::DatabaseError(e),
            children::ChildError::InvalidRow(e) => ClaimError::InvalidRow(e),
        }
    }
}

/// Ask to redeem a reward. Nothing is deducted until a parent approves.
pub async fn request_claim(
    pool: &SqlitePool,
    family_id: &Uuid,
    reward_id: &Uuid,
    child_id: &Uuid,
) -> Result<RewardClaim, ClaimError> {
    let reward = rewards::get_family_reward(pool, family_id, reward_id).await?;
    let child = children::get_family_child(pool, family_id, child_id).await?;

    if child.points < reward.points_required {
        log::debug!(
            "Refused claim of reward {} by child {}: {} < {}",
            reward_id,
            child_id,
            child.points,
            reward.points_required
        );
        return Err(ClaimError::InsufficientPoints {
            balance: child.points,
            required: reward.points_required,
        });
    }

    let pending = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM reward_claims WHERE reward_id = ? AND child_id = ? AND status = 'pending'",
    )
    .bind(reward_id.to_string())
    .bind(child_id.to_string())
    .fetch_one(pool)
    .await?;

    if pending > 0 {
        return Err(ClaimError::AlreadyPending);
    }

    let id = Uuid::new_v4();
    let now = Utc::now();

    let inserted = sqlx::query(
        r#"
        INSERT INTO reward_claims (id, reward_id, child_id, status, created_at)
        VALUES (?, ?, ?, 'pending', ?)
        "#,
    )
    .bind(id.to_string())
    .bind(reward_id.to_string())
    .bind(child_id.to_string())
    .bind(now)
    .execute(pool)
    .await;

    match inserted {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => return Err(ClaimError::AlreadyPending),
        Err(e) => return Err(e.into()),
    }

    log::info!("Child {} claimed reward {}", child_id, reward_id);

    Ok(RewardClaim {
        id,
        reward_id: *reward_id,
        child_id: *child_id,
        status: ClaimStatus::Pending,
        approved_by: None,
        approved_at: None,
        created_at: now,
    })
}

pub async fn get_claim(
    pool: &SqlitePool,
    family_id: &Uuid,
    claim_id: &Uuid,
) -> Result<RewardClaim, ClaimError> {
    let row: RewardClaimRow = sqlx::query_as(
        r#"
        SELECT rc.* FROM reward_claims rc
        JOIN rewards r ON r.id = rc.reward_id
        WHERE rc.id = ? AND r.family_id = ?
        "#,
    )
    .bind(claim_id.to_string())
    .bind(family_id.to_string())
    .fetch_optional(pool)
    .await?
    .ok_or(ClaimError::NotFound)?;

    Ok(row.to_shared()?)
}

/// Current status, child and reward cost of a claim, read inside `tx`.
async fn load_for_review(
    tx: &mut Transaction<'_, Sqlite>,
    family_id: &Uuid,
    claim_id: &Uuid,
) -> Result<(ClaimStatus, Uuid, i64), ClaimError> {
    let row: Option<(String, String, i64)> = sqlx::query_as(
        r#"
        SELECT rc.status, rc.child_id, r.points_required FROM reward_claims rc
        JOIN rewards r ON r.id = rc.reward_id
        WHERE rc.id = ? AND r.family_id = ?
        "#,
    )
    .bind(claim_id.to_string())
    .bind(family_id.to_string())
    .fetch_optional(&mut **tx)
    .await?;

    let (status, child_id, cost) = row.ok_or(ClaimError::NotFound)?;
    let status: ClaimStatus = status
        .parse()
        .map_err(|_| RowError::InvalidStatus(status.clone()))?;
    let child_id = crate::models::parse_id("child_id", &child_id)?;

    Ok((status, child_id, cost))
}

async fn swap_status(
    tx: &mut Transaction<'_, Sqlite>,
    claim_id: &Uuid,
    current: ClaimStatus,
    action: ClaimAction,
    approver_id: &Uuid,
) -> Result<RewardClaim, ClaimError> {
    let next = current.apply(action).map_err(|e| {
        log::debug!("Refused to {} claim {}: {}", action.as_str(), claim_id, e);
        e
    })?;

    let updated: RewardClaimRow = sqlx::query_as(
        r#"
        UPDATE reward_claims SET status = ?, approved_by = ?, approved_at = ?
        WHERE id = ? AND status = ?
        RETURNING *
        "#,
    )
    .bind(next.as_str())
    .bind(approver_id.to_string())
    .bind(Utc::now())
    .bind(claim_id.to_string())
    .bind(current.as_str())
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(TransitionError {
        from: current.as_str(),
        action: action.as_str(),
    })?;

    Ok(updated.to_shared()?)
}

/// Pending -> approved. The balance is checked again and the cost deducted in
/// the same transaction.
pub async fn approve_claim(
    pool: &SqlitePool,
    family_id: &Uuid,
    claim_id: &Uuid,
    approver_id: &Uuid,
) -> Result<ClaimResult, ClaimError> {
    let mut tx = db::begin_immediate(pool).await?;

    let (status, child_id, cost) = load_for_review(&mut tx, family_id, claim_id).await?;
    status.apply(ClaimAction::Approve)?;

    let balance = ledger::spend(&mut *tx, &child_id, cost).await?;
    let claim = swap_status(&mut tx, claim_id, status, ClaimAction::Approve, approver_id).await?;

    tx.commit().await?;
    Ok(ClaimResult { claim, balance })
}

/// Pending -> rejected. No points move.
pub async fn reject_claim(
    pool: &SqlitePool,
    family_id: &Uuid,
    claim_id: &Uuid,
    approver_id: &Uuid,
) -> Result<ClaimResult, ClaimError> {
    let mut tx = db::begin_immediate(pool).await?;

    let (status, child_id, _) = load_for_review(&mut tx, family_id, claim_id).await?;
    let claim = swap_status(&mut tx, claim_id, status, ClaimAction::Reject, approver_id).await?;

    let balance = sqlx::query_scalar::<_, i64>("SELECT points FROM children WHERE id = ?")
        .bind(child_id.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ClaimError::ChildNotFound)?;

    tx.commit().await?;
    log::info!("Rejected claim {}", claim_id);

    Ok(ClaimResult { claim, balance })
}

pub async fn list_pending_claims(
    pool: &SqlitePool,
    family_id: &Uuid,
) -> Result<Vec<PendingClaim>, ClaimError> {
    let claims: Vec<RewardClaimRow> = sqlx::query_as(
        r#"
        SELECT rc.* FROM reward_claims rc
        JOIN rewards r ON r.id = rc.reward_id
        WHERE r.family_id = ? AND rc.status = 'pending'
        ORDER BY rc.created_at ASC
        "#,
    )
    .bind(family_id.to_string())
    .fetch_all(pool)
    .await?;

    if claims.is_empty() {
        return Ok(Vec::new());
    }

    let reward_rows: Vec<RewardRow> = sqlx::query_as("SELECT * FROM rewards WHERE family_id = ?")
        .bind(family_id.to_string())
        .fetch_all(pool)
        .await?;
    let child_rows: Vec<ChildRow> = sqlx::query_as("SELECT * FROM children WHERE family_id = ?")
        .bind(family_id.to_string())
        .fetch_all(pool)
        .await?;

    let mut rewards_by_id = HashMap::new();
    for row in &reward_rows {
        let reward = row.to_shared()?;
        rewards_by_id.insert(reward.id, reward);
    }
    let mut children_by_id = HashMap::new();
    for row in &child_rows {
        let child = row.to_shared()?;
        children_by_id.insert(child.id, child);
    }

    claims
        .iter()
        .map(|row| {
            let claim = row.to_shared()?;
            let reward = rewards_by_id
                .get(&claim.reward_id)
                .cloned()
                .ok_or(ClaimError::RewardNotFound)?;
            let child = children_by_id
                .get(&claim.child_id)
                .cloned()
                .ok_or(ClaimError::ChildNotFound)?;
            Ok(PendingClaim { claim, reward, child })
        })
        .collect()
}

/// Claim history of one child, newest first.
pub async fn list_child_claims(
    pool: &SqlitePool,
    child_id: &Uuid,
) -> Result<Vec<RewardClaim>, ClaimError> {
    let rows: Vec<RewardClaimRow> = sqlx::query_as(
        "SELECT * FROM reward_claims WHERE child_id = ? ORDER BY created_at DESC",
    )
    .bind(child_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|r| r.to_shared())
        .collect::<Result<Vec<_>, _>>()?)
}
