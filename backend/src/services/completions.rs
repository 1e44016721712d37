//! Chore completion lifecycle: mark done, then parent review.
//!
//! ```text
//!   (none) --mark_done--> pending --approve--> approved
//!                            |  ^                  |
//!                            |  +----unapprove-----+
//!                            +--reject--> rejected
//! ```
//!
//! Review actions run in one transaction: the status row is updated with a
//! compare-and-swap on the expected status, and the ledger write happens on
//! the same connection before commit.

use chrono::{NaiveDate, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::db;
use crate::models::{parse_id, ChildRow, ChoreCompletionRow, ChoreRow, RowError};
use crate::services::{is_unique_violation, ledger, scheduler};
use shared::{
    ChoreCompletion, CompletionAction, CompletionResult, CompletionStatus, PendingCompletion,
    TransitionError,
};

use super::{ErrorKind, ServiceError};

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Completion not found")]
    NotFound,
    #[error("Chore not found")]
    ChoreNotFound,
    #[error("Child not found")]
    ChildNotFound,
    #[error("Chore is not assigned to this child")]
    NotAssigned,
    #[error("Only today's chores can be marked done")]
    NotToday,
    #[error("Chore is not due on {0}")]
    NotDue(NaiveDate),
    #[error("Chore already marked for today")]
    AlreadyMarked,
    #[error("{0}")]
    WrongState(#[from] TransitionError),
    #[error("{0}")]
    Ledger(#[from] ledger::LedgerError),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Corrupt completion row: {0}")]
    InvalidRow(#[from] RowError),
}

impl ServiceError for CompletionError {
    fn kind(&self) -> ErrorKind {
        match self {
            CompletionError::NotFound
            | CompletionError::ChoreNotFound
            | CompletionError::ChildNotFound => ErrorKind::NotFound,
            CompletionError::NotAssigned => ErrorKind::Validation,
            CompletionError::NotToday
            | CompletionError::NotDue(_)
            | CompletionError::AlreadyMarked
            | CompletionError::WrongState(_) => ErrorKind::Conflict,
            CompletionError::Ledger(e) => e.kind(),
            CompletionError::DatabaseError(_) | CompletionError::InvalidRow(_) => {
                ErrorKind::Transport
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            CompletionError::NotToday => "not_today",
            CompletionError::NotDue(_) => "not_due",
            CompletionError::AlreadyMarked => "already_marked",
            CompletionError::WrongState(_) => "wrong_state",
            CompletionError::Ledger(e) => e.code(),
            CompletionError::NotFound
            | CompletionError::ChoreNotFound
            | CompletionError::ChildNotFound => "not_found",
            CompletionError::NotAssigned => "validation_error",
            CompletionError::DatabaseError(_) | CompletionError::InvalidRow(_) => "internal_error",
        }
    }
}

/// Record that `child_id` did `chore_id` on `date`.
///
/// `today` is the family's current local date; any other `date` is refused
/// before the store is consulted.
pub async fn mark_done(
    pool: &SqlitePool,
    family_id: &Uuid,
    chore_id: &Uuid,
    child_id: &Uuid,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<ChoreCompletion, CompletionError> {
    if date != today {
        log::debug!("Refused mark-done of chore {} for {} (today is {})", chore_id, date, today);
        return Err(CompletionError::NotToday);
    }

    let chore: ChoreRow = sqlx::query_as("SELECT * FROM chores WHERE id = ? AND family_id = ?")
        .bind(chore_id.to_string())
        .bind(family_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(CompletionError::ChoreNotFound)?;
    let chore = chore.to_shared()?;

    if !scheduler::is_chore_due_on_date(&chore, date) {
        return Err(CompletionError::NotDue(date));
    }

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM chore_completions WHERE chore_id = ? AND completed_date = ?",
    )
    .bind(chore_id.to_string())
    .bind(date)
    .fetch_one(pool)
    .await?;

    if existing > 0 {
        return Err(CompletionError::AlreadyMarked);
    }

    let child_family = sqlx::query_scalar::<_, String>("SELECT family_id FROM children WHERE id = ?")
        .bind(child_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(CompletionError::ChildNotFound)?;

    if parse_id("family_id", &child_family)? != *family_id {
        return Err(CompletionError::ChildNotFound);
    }
    if chore.assignee_id != *child_id {
        return Err(CompletionError::NotAssigned);
    }

    let id = Uuid::new_v4();
    let now = Utc::now();

    // The unique index on (chore_id, completed_date) settles a race between two callers
    let inserted = sqlx::query(
        r#"
        INSERT INTO chore_completions (id, chore_id, child_id, completed_date, status, created_at)
        VALUES (?, ?, ?, ?, 'pending', ?)
        "#,
    )
    .bind(id.to_string())
    .bind(chore_id.to_string())
    .bind(child_id.to_string())
    .bind(date)
    .bind(now)
    .execute(pool)
    .await;

    match inserted {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => return Err(CompletionError::AlreadyMarked),
        Err(e) => return Err(e.into()),
    }

    log::info!("Child {} marked chore {} done for {}", child_id, chore_id, date);

    Ok(ChoreCompletion {
        id,
        chore_id: *chore_id,
        child_id: *child_id,
        completed_date: date,
        status: CompletionStatus::Pending,
        approved_by: None,
        approved_at: None,
        created_at: now,
    })
}

pub async fn get_completion(
    pool: &SqlitePool,
    family_id: &Uuid,
    completion_id: &Uuid,
) -> Result<ChoreCompletion, CompletionError> {
    let row: ChoreCompletionRow = sqlx::query_as(
        r#"
        SELECT cc.* FROM chore_completions cc
        JOIN chores c ON c.id = cc.chore_id
        WHERE cc.id = ? AND c.family_id = ?
        "#,
    )
    .bind(completion_id.to_string())
    .bind(family_id.to_string())
    .fetch_optional(pool)
    .await?
    .ok_or(CompletionError::NotFound)?;

    Ok(row.to_shared()?)
}

/// Load a completion inside `tx`, check `action` is allowed and swap the status.
///
/// Returns the updated record and the points value of its chore.
async fn transition(
    tx: &mut Transaction<'_, Sqlite>,
    family_id: &Uuid,
    completion_id: &Uuid,
    action: CompletionAction,
    approver_id: Option<&Uuid>,
) -> Result<(ChoreCompletion, i64), CompletionError> {
    let row: Option<(String, i64)> = sqlx::query_as(
        r#"
        SELECT cc.status, c.points FROM chore_completions cc
        JOIN chores c ON c.id = cc.chore_id
        WHERE cc.id = ? AND c.family_id = ?
        "#,
    )
    .bind(completion_id.to_string())
    .bind(family_id.to_string())
    .fetch_optional(&mut **tx)
    .await?;

    let (status, chore_points) = row.ok_or(CompletionError::NotFound)?;
    let current: CompletionStatus = status
        .parse()
        .map_err(|_| RowError::InvalidStatus(status.clone()))?;

    let next = current.apply(action).map_err(|e| {
        log::debug!("Refused to {} completion {}: {}", action.as_str(), completion_id, e);
        e
    })?;

    let (approved_by, approved_at) = match approver_id {
        Some(id) => (Some(id.to_string()), Some(Utc::now())),
        None => (None, None),
    };

    let updated: ChoreCompletionRow = sqlx::query_as(
        r#"
        UPDATE chore_completions SET status = ?, approved_by = ?, approved_at = ?
        WHERE id = ? AND status = ?
        RETURNING *
        "#,
    )
    .bind(next.as_str())
    .bind(approved_by)
    .bind(approved_at)
    .bind(completion_id.to_string())
    .bind(current.as_str())
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(TransitionError {
        from: current.as_str(),
        action: action.as_str(),
    })?;

    Ok((updated.to_shared()?, chore_points))
}

/// Pending -> approved, crediting the chore's points to the child.
pub async fn approve(
    pool: &SqlitePool,
    family_id: &Uuid,
    completion_id: &Uuid,
    approver_id: &Uuid,
) -> Result<CompletionResult, CompletionError> {
    let mut tx = db::begin_immediate(pool).await?;

    let (completion, points) = transition(
        &mut tx,
        family_id,
        completion_id,
        CompletionAction::Approve,
        Some(approver_id),
    )
    .await?;
    let balance = ledger::credit(&mut *tx, &completion.child_id, points).await?;

    tx.commit().await?;
    Ok(CompletionResult { completion, balance })
}

/// Pending -> rejected. The balance does not move.
pub async fn reject(
    pool: &SqlitePool,
    family_id: &Uuid,
    completion_id: &Uuid,
) -> Result<CompletionResult, CompletionError> {
    let mut tx = db::begin_immediate(pool).await?;

    let (completion, _) = transition(
        &mut tx,
        family_id,
        completion_id,
        CompletionAction::Reject,
        None,
    )
    .await?;

    let balance = sqlx::query_scalar::<_, i64>("SELECT points FROM children WHERE id = ?")
        .bind(completion.child_id.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CompletionError::ChildNotFound)?;

    tx.commit().await?;
    log::info!("Rejected completion {}", completion_id);

    Ok(CompletionResult { completion, balance })
}

/// Approved -> pending, taking the award back (the balance stops at zero).
pub async fn unapprove(
    pool: &SqlitePool,
    family_id: &Uuid,
    completion_id: &Uuid,
) -> Result<CompletionResult, CompletionError> {
    let mut tx = db::begin_immediate(pool).await?;

    let (completion, points) = transition(
        &mut tx,
        family_id,
        completion_id,
        CompletionAction::Unapprove,
        None,
    )
    .await?;
    let balance = ledger::refund_floored(&mut *tx, &completion.child_id, points).await?;

    tx.commit().await?;
    Ok(CompletionResult { completion, balance })
}

/// Parent review queue: every pending completion in the family, oldest first.
pub async fn list_pending_completions(
    pool: &SqlitePool,
    family_id: &Uuid,
) -> Result<Vec<PendingCompletion>, CompletionError> {
    let completions: Vec<ChoreCompletionRow> = sqlx::query_as(
        r#"
        SELECT cc.* FROM chore_completions cc
        JOIN chores c ON c.id = cc.chore_id
        WHERE c.family_id = ? AND cc.status = 'pending'
        ORDER BY cc.completed_date ASC, cc.created_at ASC
        "#,
    )
    .bind(family_id.to_string())
    .fetch_all(pool)
    .await?;

    if completions.is_empty() {
        return Ok(Vec::new());
    }

    let chores: Vec<ChoreRow> = sqlx::query_as("SELECT * FROM chores WHERE family_id = ?")
        .bind(family_id.to_string())
        .fetch_all(pool)
        .await?;
    let children: Vec<ChildRow> = sqlx::query_as("SELECT * FROM children WHERE family_id = ?")
        .bind(family_id.to_string())
        .fetch_all(pool)
        .await?;

    let mut chores_by_id = HashMap::new();
    for row in &chores {
        let chore = row.to_shared()?;
        chores_by_id.insert(chore.id, chore);
    }
    let mut children_by_id = HashMap::new();
    for row in &children {
        let child = row.to_shared()?;
        children_by_id.insert(child.id, child);
    }

    let mut pending = Vec::with_capacity(completions.len());
    for row in &completions {
        let completion = row.to_shared()?;
        let chore = chores_by_id
            .get(&completion.chore_id)
            .cloned()
            .ok_or(CompletionError::ChoreNotFound)?;
        let child = children_by_id
            .get(&completion.child_id)
            .cloned()
            .ok_or(CompletionError::ChildNotFound)?;
        pending.push(PendingCompletion {
            completion,
            chore,
            child,
        });
    }

    Ok(pending)
}

/// Completion history of one child between `from` and `to`, both inclusive.
pub async fn list_child_completions(
    pool: &SqlitePool,
    child_id: &Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<ChoreCompletion>, CompletionError> {
    let rows: Vec<ChoreCompletionRow> = sqlx::query_as(
        r#"
        SELECT * FROM chore_completions
        WHERE child_id = ? AND completed_date >= ? AND completed_date <= ?
        ORDER BY completed_date DESC, created_at DESC
        "#,
    )
    .bind(child_id.to_string())
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|r| r.to_shared())
        .collect::<Result<Vec<_>, _>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{file_test_pool, test_pool};
    use crate::services::{children, chores};
    use shared::{ChoreSchedule, CreateChildRequest, CreateChoreRequest, WeekdayName};

    struct Fixture {
        pool: SqlitePool,
        family_id: Uuid,
        child_id: Uuid,
        chore_id: Uuid,
        parent_id: Uuid,
    }

    // 2024-06-10 is a Monday
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    async fn fixture(starting_points: i64, chore_points: i64) -> Fixture {
        fixture_on(test_pool().await, starting_points, chore_points).await
    }

    async fn fixture_on(pool: SqlitePool, starting_points: i64, chore_points: i64) -> Fixture {
        let family_id = Uuid::new_v4();

        let child = children::create_child(
            &pool,
            &family_id,
            &CreateChildRequest {
                name: "Mia".to_string(),
                emoji: None,
                display_order: None,
            },
        )
        .await
        .unwrap();

        if starting_points > 0 {
            let mut conn = pool.acquire().await.unwrap();
            ledger::credit(&mut conn, &child.id, starting_points).await.unwrap();
        }

        let chore = chores::create_chore(
            &pool,
            &family_id,
            &CreateChoreRequest {
                assignee_id: child.id,
                title: "Wash dishes".to_string(),
                description: None,
                points: chore_points,
                emoji: None,
                schedule: ChoreSchedule::recurring(vec![WeekdayName::Monday, WeekdayName::Wednesday])
                    .unwrap(),
            },
        )
        .await
        .unwrap();

        Fixture {
            pool,
            family_id,
            child_id: child.id,
            chore_id: chore.id,
            parent_id: Uuid::new_v4(),
        }
    }

    async fn mark(f: &Fixture) -> ChoreCompletion {
        mark_done(&f.pool, &f.family_id, &f.chore_id, &f.child_id, monday(), monday())
            .await
            .unwrap()
    }

    async fn completion_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM chore_completions")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[test]
    fn test_completion_error_codes() {
        assert_eq!(CompletionError::AlreadyMarked.code(), "already_marked");
        assert_eq!(CompletionError::AlreadyMarked.kind(), ErrorKind::Conflict);
        assert_eq!(CompletionError::NotToday.code(), "not_today");
        assert_eq!(CompletionError::NotDue(monday()).to_string(), "Chore is not due on 2024-06-10");
        assert_eq!(CompletionError::ChoreNotFound.kind(), ErrorKind::NotFound);

        let wrong = CompletionStatus::Rejected
            .apply(CompletionAction::Approve)
            .unwrap_err();
        let err = CompletionError::from(wrong);
        assert_eq!(err.code(), "wrong_state");
        assert_eq!(err.to_string(), "cannot approve a rejected record");
    }

    #[tokio::test]
    async fn test_approve_then_unapprove_restores_balance() {
        let f = fixture(10, 5).await;
        let completion = mark(&f).await;
        assert_eq!(completion.status, CompletionStatus::Pending);

        let approved = approve(&f.pool, &f.family_id, &completion.id, &f.parent_id)
            .await
            .unwrap();
        assert_eq!(approved.balance, 15);
        assert_eq!(approved.completion.status, CompletionStatus::Approved);
        assert_eq!(approved.completion.approved_by, Some(f.parent_id));
        assert!(approved.completion.approved_at.is_some());

        let reverted = unapprove(&f.pool, &f.family_id, &completion.id).await.unwrap();
        assert_eq!(reverted.balance, 10);
        assert_eq!(reverted.completion.status, CompletionStatus::Pending);
        assert!(reverted.completion.approved_by.is_none());
        assert!(reverted.completion.approved_at.is_none());

        assert_eq!(ledger::get_balance(&f.pool, &f.child_id).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_unapprove_refund_stops_at_zero() {
        let f = fixture(0, 5).await;
        let completion = mark(&f).await;
        approve(&f.pool, &f.family_id, &completion.id, &f.parent_id)
            .await
            .unwrap();

        // Spend part of the award elsewhere
        let mut conn = f.pool.acquire().await.unwrap();
        ledger::spend(&mut conn, &f.child_id, 3).await.unwrap();
        drop(conn);

        let reverted = unapprove(&f.pool, &f.family_id, &completion.id).await.unwrap();
        assert_eq!(reverted.balance, 0);
    }

    #[tokio::test]
    async fn test_mark_done_twice_keeps_one_record() {
        let f = fixture(0, 5).await;
        mark(&f).await;

        let second =
            mark_done(&f.pool, &f.family_id, &f.chore_id, &f.child_id, monday(), monday()).await;
        assert!(matches!(second, Err(CompletionError::AlreadyMarked)));

        // A sibling trying the same chore and day is refused as well
        let sibling = children::create_child(
            &f.pool,
            &f.family_id,
            &CreateChildRequest {
                name: "Leo".to_string(),
                emoji: None,
                display_order: None,
            },
        )
        .await
        .unwrap();
        let third =
            mark_done(&f.pool, &f.family_id, &f.chore_id, &sibling.id, monday(), monday()).await;
        assert!(matches!(third, Err(CompletionError::AlreadyMarked)));

        assert_eq!(completion_count(&f.pool).await, 1);
    }

    #[tokio::test]
    async fn test_mark_done_only_today() {
        let f = fixture(0, 5).await;
        mark(&f).await;

        // Yesterday is refused whether or not a record exists for it
        let yesterday = monday().pred_opt().unwrap();
        let result =
            mark_done(&f.pool, &f.family_id, &f.chore_id, &f.child_id, yesterday, monday()).await;
        assert!(matches!(result, Err(CompletionError::NotToday)));

        let result =
            mark_done(&f.pool, &f.family_id, &f.chore_id, &f.child_id, monday(), yesterday).await;
        assert!(matches!(result, Err(CompletionError::NotToday)));

        assert_eq!(completion_count(&f.pool).await, 1);
    }

    #[tokio::test]
    async fn test_mark_done_requires_due_chore() {
        let f = fixture(0, 5).await;
        let tuesday = NaiveDate::from_ymd_opt(2024, 6, 11).unwrap();

        let result =
            mark_done(&f.pool, &f.family_id, &f.chore_id, &f.child_id, tuesday, tuesday).await;
        assert!(matches!(result, Err(CompletionError::NotDue(d)) if d == tuesday));
    }

    #[tokio::test]
    async fn test_mark_done_checks_assignee_and_family() {
        let f = fixture(0, 5).await;

        let other = children::create_child(
            &f.pool,
            &f.family_id,
            &CreateChildRequest {
                name: "Leo".to_string(),
                emoji: None,
                display_order: None,
            },
        )
        .await
        .unwrap();
        let result =
            mark_done(&f.pool, &f.family_id, &f.chore_id, &other.id, monday(), monday()).await;
        assert!(matches!(result, Err(CompletionError::NotAssigned)));

        let result =
            mark_done(&f.pool, &Uuid::new_v4(), &f.chore_id, &f.child_id, monday(), monday()).await;
        assert!(matches!(result, Err(CompletionError::ChoreNotFound)));

        assert_eq!(completion_count(&f.pool).await, 0);
    }

    #[tokio::test]
    async fn test_wrong_state_transitions() {
        let f = fixture(0, 5).await;
        let completion = mark(&f).await;

        assert!(matches!(
            unapprove(&f.pool, &f.family_id, &completion.id).await,
            Err(CompletionError::WrongState(_))
        ));

        approve(&f.pool, &f.family_id, &completion.id, &f.parent_id)
            .await
            .unwrap();
        assert!(matches!(
            approve(&f.pool, &f.family_id, &completion.id, &f.parent_id).await,
            Err(CompletionError::WrongState(_))
        ));
        assert!(matches!(
            reject(&f.pool, &f.family_id, &completion.id).await,
            Err(CompletionError::WrongState(_))
        ));

        // A failed second approve must not credit twice
        assert_eq!(ledger::get_balance(&f.pool, &f.child_id).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_reject_leaves_balance() {
        let f = fixture(7, 5).await;
        let completion = mark(&f).await;

        let rejected = reject(&f.pool, &f.family_id, &completion.id).await.unwrap();
        assert_eq!(rejected.completion.status, CompletionStatus::Rejected);
        assert_eq!(rejected.balance, 7);

        assert!(matches!(
            approve(&f.pool, &f.family_id, &completion.id, &f.parent_id).await,
            Err(CompletionError::WrongState(_))
        ));
        assert_eq!(ledger::get_balance(&f.pool, &f.child_id).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_review_is_scoped_to_family() {
        let f = fixture(0, 5).await;
        let completion = mark(&f).await;

        assert!(matches!(
            approve(&f.pool, &Uuid::new_v4(), &completion.id, &f.parent_id).await,
            Err(CompletionError::NotFound)
        ));
        assert!(matches!(
            get_completion(&f.pool, &Uuid::new_v4(), &completion.id).await,
            Err(CompletionError::NotFound)
        ));
        assert_eq!(
            get_completion(&f.pool, &f.family_id, &completion.id).await.unwrap().id,
            completion.id
        );
    }

    #[tokio::test]
    async fn test_pending_queue_and_history() {
        let f = fixture(0, 5).await;
        let completion = mark(&f).await;

        let pending = list_pending_completions(&f.pool, &f.family_id).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].completion.id, completion.id);
        assert_eq!(pending[0].chore.title, "Wash dishes");
        assert_eq!(pending[0].child.name, "Mia");

        approve(&f.pool, &f.family_id, &completion.id, &f.parent_id)
            .await
            .unwrap();
        assert!(list_pending_completions(&f.pool, &f.family_id)
            .await
            .unwrap()
            .is_empty());

        let history = list_child_completions(
            &f.pool,
            &f.child_id,
            monday().pred_opt().unwrap(),
            monday(),
        )
        .await
        .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, CompletionStatus::Approved);

        let before = monday().pred_opt().unwrap();
        assert!(list_child_completions(&f.pool, &f.child_id, before, before)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_approvals_for_one_child_both_credit() {
        let (pool, _dir) = file_test_pool().await;
        let f = fixture_on(pool, 0, 5).await;
        let feed_cat = chores::create_chore(
            &f.pool,
            &f.family_id,
            &CreateChoreRequest {
                assignee_id: f.child_id,
                title: "Feed the cat".to_string(),
                description: None,
                points: 5,
                emoji: None,
                schedule: ChoreSchedule::ad_hoc(monday()),
            },
        )
        .await
        .unwrap();

        let dishes = mark(&f).await;
        let cat = mark_done(&f.pool, &f.family_id, &feed_cat.id, &f.child_id, monday(), monday())
            .await
            .unwrap();

        let (a, b) = tokio::join!(
            approve(&f.pool, &f.family_id, &dishes.id, &f.parent_id),
            approve(&f.pool, &f.family_id, &cat.id, &f.parent_id),
        );
        let a = a.unwrap();
        let b = b.unwrap();

        assert_eq!(a.completion.status, CompletionStatus::Approved);
        assert_eq!(b.completion.status, CompletionStatus::Approved);
        let mut balances = vec![a.balance, b.balance];
        balances.sort();
        assert_eq!(balances, vec![5, 10]);
        assert_eq!(ledger::get_balance(&f.pool, &f.child_id).await.unwrap(), 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_approve_and_reject_of_one_completion() {
        let (pool, _dir) = file_test_pool().await;
        let f = fixture_on(pool, 0, 5).await;
        let completion = mark(&f).await;

        let (approved, rejected) = tokio::join!(
            approve(&f.pool, &f.family_id, &completion.id, &f.parent_id),
            reject(&f.pool, &f.family_id, &completion.id),
        );

        let winner = match (approved, rejected) {
            (Ok(ok), Err(CompletionError::WrongState(_))) => {
                assert_eq!(ok.balance, 5);
                ok
            }
            (Err(CompletionError::WrongState(_)), Ok(ok)) => {
                assert_eq!(ok.balance, 0);
                ok
            }
            other => panic!("expected one transition to win, got {:?}", other),
        };
        let stored = get_completion(&f.pool, &f.family_id, &completion.id).await.unwrap();
        assert_eq!(stored.status, winner.completion.status);
    }
}
