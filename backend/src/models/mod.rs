use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;

pub mod child;
pub mod chore;
pub mod chore_completion;
pub mod family_settings;
pub mod reward;

pub use child::*;
pub use chore::*;
pub use chore_completion::*;
pub use family_settings::*;
pub use reward::*;

/// Application state shared across all handlers
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
}

/// A stored row that does not decode into a valid domain value.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("Invalid id in column {column}: {value:?}")]
    InvalidId { column: &'static str, value: String },
    #[error("Invalid status {0:?}")]
    InvalidStatus(String),
    #[error("Invalid schedule on chore {id}: {source}")]
    InvalidSchedule {
        id: String,
        source: shared::ScheduleError,
    },
    #[error("Invalid recurring days: {0}")]
    InvalidDays(#[from] serde_json::Error),
}

pub(crate) fn parse_id(column: &'static str, value: &str) -> Result<Uuid, RowError> {
    Uuid::parse_str(value).map_err(|_| RowError::InvalidId {
        column,
        value: value.to_string(),
    })
}

pub(crate) fn parse_optional_id(
    column: &'static str,
    value: Option<&String>,
) -> Result<Option<Uuid>, RowError> {
    value.map(|v| parse_id(column, v)).transpose()
}
