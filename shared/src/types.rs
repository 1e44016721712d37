use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Calendar Types
// ============================================================================

/// Day of the week, ordered Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WeekdayName {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl WeekdayName {
    pub const ALL: [WeekdayName; 7] = [
        WeekdayName::Monday,
        WeekdayName::Tuesday,
        WeekdayName::Wednesday,
        WeekdayName::Thursday,
        WeekdayName::Friday,
        WeekdayName::Saturday,
        WeekdayName::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WeekdayName::Monday => "Monday",
            WeekdayName::Tuesday => "Tuesday",
            WeekdayName::Wednesday => "Wednesday",
            WeekdayName::Thursday => "Thursday",
            WeekdayName::Friday => "Friday",
            WeekdayName::Saturday => "Saturday",
            WeekdayName::Sunday => "Sunday",
        }
    }

    /// Zero-based offset from Monday.
    pub fn days_from_monday(&self) -> u32 {
        match self {
            WeekdayName::Monday => 0,
            WeekdayName::Tuesday => 1,
            WeekdayName::Wednesday => 2,
            WeekdayName::Thursday => 3,
            WeekdayName::Friday => 4,
            WeekdayName::Saturday => 5,
            WeekdayName::Sunday => 6,
        }
    }
}

impl fmt::Display for WeekdayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeekdayName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monday" | "mon" => Ok(WeekdayName::Monday),
            "tuesday" | "tue" => Ok(WeekdayName::Tuesday),
            "wednesday" | "wed" => Ok(WeekdayName::Wednesday),
            "thursday" | "thu" => Ok(WeekdayName::Thursday),
            "friday" | "fri" => Ok(WeekdayName::Friday),
            "saturday" | "sat" => Ok(WeekdayName::Saturday),
            "sunday" | "sun" => Ok(WeekdayName::Sunday),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekDay {
    pub name: WeekdayName,
    pub date: NaiveDate,
    pub is_today: bool,
}

// ============================================================================
// Role Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Parent,
    Child,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Parent => "parent",
            Role::Child => "child",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "parent" => Ok(Role::Parent),
            "child" => Ok(Role::Child),
            _ => Err(()),
        }
    }
}

// ============================================================================
// Family Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilySettings {
    pub family_id: Uuid,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateFamilySettingsRequest {
    pub timezone: String,
}

// ============================================================================
// Child Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Child {
    pub id: Uuid,
    pub family_id: Uuid,
    pub name: String,
    pub emoji: String,
    pub points: i64,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChildRequest {
    pub name: String,
    pub emoji: Option<String>,
    pub display_order: Option<i32>,
}

/// Points are deliberately absent: the balance only moves through reviews and claims.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateChildRequest {
    pub name: Option<String>,
    pub emoji: Option<String>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub child_id: Uuid,
    pub points: i64,
}

// ============================================================================
// Chore Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("A recurring chore needs at least one weekday")]
    NoDays,
    #[error("A chore needs either recurring days or a scheduled date")]
    Missing,
    #[error("A chore cannot be both recurring and scheduled")]
    Ambiguous,
}

/// When a chore is due: every week on the listed days, or on one date only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChoreSchedule {
    Recurring { days: BTreeSet<WeekdayName> },
    AdHoc { date: NaiveDate },
}

impl ChoreSchedule {
    pub fn recurring<I>(days: I) -> Result<Self, ScheduleError>
    where
        I: IntoIterator<Item = WeekdayName>,
    {
        let days: BTreeSet<WeekdayName> = days.into_iter().collect();
        if days.is_empty() {
            return Err(ScheduleError::NoDays);
        }
        Ok(ChoreSchedule::Recurring { days })
    }

    pub fn ad_hoc(date: NaiveDate) -> Self {
        ChoreSchedule::AdHoc { date }
    }

    /// Rebuild a schedule from its two optional storage columns.
    pub fn from_parts(
        days: Option<BTreeSet<WeekdayName>>,
        date: Option<NaiveDate>,
    ) -> Result<Self, ScheduleError> {
        match (days, date) {
            (Some(days), None) => Self::recurring(days),
            (None, Some(date)) => Ok(Self::ad_hoc(date)),
            (Some(_), Some(_)) => Err(ScheduleError::Ambiguous),
            (None, None) => Err(ScheduleError::Missing),
        }
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        match self {
            ChoreSchedule::Recurring { days } if days.is_empty() => Err(ScheduleError::NoDays),
            _ => Ok(()),
        }
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self, ChoreSchedule::Recurring { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chore {
    pub id: Uuid,
    pub family_id: Uuid,
    pub assignee_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub points: i64,
    pub emoji: String,
    pub schedule: ChoreSchedule,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChoreRequest {
    pub assignee_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub points: i64,
    pub emoji: Option<String>,
    pub schedule: ChoreSchedule,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateChoreRequest {
    pub assignee_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub points: Option<i64>,
    pub emoji: Option<String>,
    pub schedule: Option<ChoreSchedule>,
}

// ============================================================================
// Completion Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionAction {
    Approve,
    Reject,
    Unapprove,
}

impl CompletionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionAction::Approve => "approve",
            CompletionAction::Reject => "reject",
            CompletionAction::Unapprove => "unapprove",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} a {from} record")]
pub struct TransitionError {
    pub from: &'static str,
    pub action: &'static str,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Pending => "pending",
            CompletionStatus::Approved => "approved",
            CompletionStatus::Rejected => "rejected",
        }
    }

    /// The full transition table for a completion record.
    pub fn apply(self, action: CompletionAction) -> Result<CompletionStatus, TransitionError> {
        match (self, action) {
            (CompletionStatus::Pending, CompletionAction::Approve) => Ok(CompletionStatus::Approved),
            (CompletionStatus::Pending, CompletionAction::Reject) => Ok(CompletionStatus::Rejected),
            (CompletionStatus::Approved, CompletionAction::Unapprove) => Ok(CompletionStatus::Pending),
            (from, action) => Err(TransitionError {
                from: from.as_str(),
                action: action.as_str(),
            }),
        }
    }
}

impl FromStr for CompletionStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(CompletionStatus::Pending),
            "approved" => Ok(CompletionStatus::Approved),
            "rejected" => Ok(CompletionStatus::Rejected),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoreCompletion {
    pub id: Uuid,
    pub chore_id: Uuid,
    pub child_id: Uuid,
    pub completed_date: NaiveDate,
    pub status: CompletionStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkDoneRequest {
    pub child_id: Uuid,
    /// Defaults to today in the family's timezone.
    pub date: Option<NaiveDate>,
}

/// A due chore together with the completion recorded for that day, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoreWithStatus {
    pub chore: Chore,
    pub completion: Option<ChoreCompletion>,
}

impl ChoreWithStatus {
    pub fn is_marked(&self) -> bool {
        self.completion.is_some()
    }

    pub fn is_approved(&self) -> bool {
        self.completion
            .as_ref()
            .map(|c| c.status == CompletionStatus::Approved)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingCompletion {
    pub completion: ChoreCompletion,
    pub chore: Chore,
    pub child: Child,
}

/// Outcome of a review action, with the child's balance after it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResult {
    pub completion: ChoreCompletion,
    pub balance: i64,
}

// ============================================================================
// Reward Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    pub id: Uuid,
    pub family_id: Uuid,
    pub title: String,
    pub emoji: String,
    pub points_required: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRewardRequest {
    pub title: String,
    pub emoji: Option<String>,
    pub points_required: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRewardRequest {
    pub title: Option<String>,
    pub emoji: Option<String>,
    pub points_required: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimAction {
    Approve,
    Reject,
}

impl ClaimAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimAction::Approve => "approve",
            ClaimAction::Reject => "reject",
        }
    }
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
        }
    }

    /// Claims resolve exactly once; both outcomes are terminal.
    pub fn apply(self, action: ClaimAction) -> Result<ClaimStatus, TransitionError> {
        match (self, action) {
            (ClaimStatus::Pending, ClaimAction::Approve) => Ok(ClaimStatus::Approved),
            (ClaimStatus::Pending, ClaimAction::Reject) => Ok(ClaimStatus::Rejected),
            (from, action) => Err(TransitionError {
                from: from.as_str(),
                action: action.as_str(),
            }),
        }
    }
}

impl FromStr for ClaimStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ClaimStatus::Pending),
            "approved" => Ok(ClaimStatus::Approved),
            "rejected" => Ok(ClaimStatus::Rejected),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardClaim {
    pub id: Uuid,
    pub reward_id: Uuid,
    pub child_id: Uuid,
    pub status: ClaimStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRewardRequest {
    pub child_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingClaim {
    pub claim: RewardClaim,
    pub reward: Reward,
    pub child: Child,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimResult {
    pub claim: RewardClaim,
    pub balance: i64,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSuccess<T> {
    pub data: T,
}

impl<T> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// Tests
// ============================================================================
