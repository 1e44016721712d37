pub mod auth;
pub mod calendar;
pub mod children;
pub mod chores;
pub mod claims;
pub mod completions;
pub mod family_settings;
pub mod ledger;
pub mod rewards;
pub mod scheduler;

/// Upper bound for a single chore award or reward cost.
pub const MAX_POINTS: i64 = 10_000;

/// Coarse classification of a service failure, so callers can pick between
/// "that's already done" framing and "something went wrong, try again".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Transport,
}

pub trait ServiceError: std::error::Error {
    fn kind(&self) -> ErrorKind;

    /// Stable machine-readable code for API clients.
    fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Validation => "validation_error",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Transport => "internal_error",
        }
    }
}

/// True when the error is SQLite refusing a duplicate key.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
