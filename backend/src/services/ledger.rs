//! The per-child points balance.
//!
//! Writes take a connection that is already inside the caller's transaction,
//! so a balance change commits or rolls back together with the status change
//! that caused it. Each write is a single statement; the balance is never
//! read, computed client-side and written back.

use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;
use uuid::Uuid;

use super::{ErrorKind, ServiceError};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Child not found")]
    ChildNotFound,
    #[error("Insufficient points: balance {balance}, required {required}")]
    InsufficientPoints { balance: i64, required: i64 },
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl ServiceError for LedgerError {
    fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::ChildNotFound => ErrorKind::NotFound,
            LedgerError::InsufficientPoints { .. } => ErrorKind::Conflict,
            LedgerError::DatabaseError(_) => ErrorKind::Transport,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            LedgerError::InsufficientPoints { .. } => "insufficient_points",
            LedgerError::ChildNotFound => "not_found",
            LedgerError::DatabaseError(_) => "internal_error",
        }
    }
}

pub async fn get_balance(pool: &SqlitePool, child_id: &Uuid) -> Result<i64, LedgerError> {
    sqlx::query_scalar::<_, i64>("SELECT points FROM children WHERE id = ?")
        .bind(child_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(LedgerError::ChildNotFound)
}

/// Add `amount` to the balance. Returns the new balance.
pub(crate) async fn credit(
    conn: &mut SqliteConnection,
    child_id: &Uuid,
    amount: i64,
) -> Result<i64, LedgerError> {
    let balance = sqlx::query_scalar::<_, i64>(
        "UPDATE children SET points = points + ?, updated_at = ? WHERE id = ? RETURNING points",
    )
    .bind(amount)
    .bind(chrono::Utc::now())
    .bind(child_id.to_string())
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(LedgerError::ChildNotFound)?;

    log::info!("Credited {} points to child {} (balance {})", amount, child_id, balance);
    Ok(balance)
}

/// Take back up to `amount`, stopping at zero. Returns the new balance.
///
/// If the child already spent part of the award, the balance lands on zero
/// and the shortfall is not recorded anywhere.
pub(crate) async fn refund_floored(
    conn: &mut SqliteConnection,
    child_id: &Uuid,
    amount: i64,
) -> Result<i64, LedgerError> {
    let balance = sqlx::query_scalar::<_, i64>(
        "UPDATE children SET points = MAX(0, points - ?), updated_at = ? WHERE id = ? RETURNING points",
    )
    .bind(amount)
    .bind(chrono::Utc::now())
    .bind(child_id.to_string())
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(LedgerError::ChildNotFound)?;

    log::info!("Reverted {} points from child {} (balance {})", amount, child_id, balance);
    Ok(balance)
}

/// Deduct `amount` only if the balance covers it. Returns the new balance.
pub(crate) async fn spend(
    conn: &mut SqliteConnection,
    child_id: &Uuid,
    amount: i64,
) -> Result<i64, LedgerError> {
    let balance = sqlx::query_scalar::<_, i64>(
        "UPDATE children SET points = points - ?, updated_at = ? WHERE id = ? AND points >= ? RETURNING points",
    )
    .bind(amount)
    .bind(chrono::Utc::now())
    .bind(child_id.to_string())
    .bind(amount)
    .fetch_optional(&mut *conn)
    .await?;

    match balance {
        Some(balance) => {
            log::info!("Spent {} points for child {} (balance {})", amount, child_id, balance);
            Ok(balance)
        }
        None => {
            let current = sqlx::query_scalar::<_, i64>("SELECT points FROM children WHERE id = ?")
                .bind(child_id.to_string())
                .fetch_optional(&mut *conn)
                .await?
                .ok_or(LedgerError::ChildNotFound)?;

            log::debug!(
                "Refused to spend {} points for child {} (balance {})",
                amount,
                child_id,
                current
            );
            Err(LedgerError::InsufficientPoints {
                balance: current,
                required: amount,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::services::children;
    use shared::CreateChildRequest;

    async fn child_with_points(pool: &SqlitePool, points: i64) -> Uuid {
        let child = children::create_child(
            pool,
            &Uuid::new_v4(),
            &CreateChildRequest {
                name: "Mia".to_string(),
                emoji: None,
                display_order: None,
            },
        )
        .await
        .unwrap();

        if points > 0 {
            let mut conn = pool.acquire().await.unwrap();
            credit(&mut conn, &child.id, points).await.unwrap();
        }
        child.id
    }

    #[test]
    fn test_ledger_error_display() {
        assert_eq!(LedgerError::ChildNotFound.to_string(), "Child not found");
        assert_eq!(
            LedgerError::InsufficientPoints { balance: 3, required: 5 }.to_string(),
            "Insufficient points: balance 3, required 5"
        );
        assert_eq!(
            LedgerError::InsufficientPoints { balance: 3, required: 5 }.code(),
            "insufficient_points"
        );
    }

    #[tokio::test]
    async fn test_credit_and_balance() {
        let pool = test_pool().await;
        let child_id = child_with_points(&pool, 10).await;

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(credit(&mut conn, &child_id, 5).await.unwrap(), 15);
        drop(conn);

        assert_eq!(get_balance(&pool, &child_id).await.unwrap(), 15);
    }

    #[tokio::test]
    async fn test_refund_is_floored_at_zero() {
        let pool = test_pool().await;
        let child_id = child_with_points(&pool, 3).await;

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(refund_floored(&mut conn, &child_id, 5).await.unwrap(), 0);
        drop(conn);

        assert_eq!(get_balance(&pool, &child_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_spend_requires_sufficient_balance() {
        let pool = test_pool().await;
        let child_id = child_with_points(&pool, 20).await;

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(spend(&mut conn, &child_id, 20).await.unwrap(), 0);
        assert!(matches!(
            spend(&mut conn, &child_id, 1).await,
            Err(LedgerError::InsufficientPoints { balance: 0, required: 1 })
        ));
        drop(conn);

        assert_eq!(get_balance(&pool, &child_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_child() {
        let pool = test_pool().await;
        let missing = Uuid::new_v4();

        assert!(matches!(get_balance(&pool, &missing).await, Err(LedgerError::ChildNotFound)));

        let mut conn = pool.acquire().await.unwrap();
        assert!(matches!(credit(&mut conn, &missing, 1).await, Err(LedgerError::ChildNotFound)));
        assert!(matches!(spend(&mut conn, &missing, 1).await, Err(LedgerError::ChildNotFound)));
    }
}
