use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{FamilySettingsRow, RowError};
use crate::services::calendar;
use shared::{FamilySettings, UpdateFamilySettingsRequest};

use super::{ErrorKind, ServiceError};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Corrupt settings row: {0}")]
    InvalidRow(#[from] RowError),
}

impl ServiceError for SettingsError {
    fn kind(&self) -> ErrorKind {
        match self {
            SettingsError::InvalidTimezone(_) => ErrorKind::Validation,
            SettingsError::DatabaseError(_) | SettingsError::InvalidRow(_) => ErrorKind::Transport,
        }
    }
}

fn parse_timezone(name: &str) -> Result<Tz, SettingsError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| SettingsError::InvalidTimezone(name.to_string()))
}

/// Get settings for a family, creating them with `default_tz` on first use
pub async fn get_or_create_settings(
    pool: &SqlitePool,
    family_id: &Uuid,
    default_tz: Tz,
) -> Result<FamilySettings, SettingsError> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT OR IGNORE INTO family_settings (family_id, timezone, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(family_id.to_string())
    .bind(default_tz.name())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let row: FamilySettingsRow = sqlx::query_as("SELECT * FROM family_settings WHERE family_id = ?")
        .bind(family_id.to_string())
        .fetch_one(pool)
        .await?;

    Ok(row.to_shared()?)
}

pub async fn update_settings(
    pool: &SqlitePool,
    family_id: &Uuid,
    default_tz: Tz,
    request: &UpdateFamilySettingsRequest,
) -> Result<FamilySettings, SettingsError> {
    let tz = parse_timezone(&request.timezone)?;

    let mut settings = get_or_create_settings(pool, family_id, default_tz).await?;
    let now = Utc::now();

    sqlx::query("UPDATE family_settings SET timezone = ?, updated_at = ? WHERE family_id = ?")
        .bind(tz.name())
        .bind(now)
        .bind(family_id.to_string())
        .execute(pool)
        .await?;

    log::info!("Family {} timezone set to {}", family_id, tz.name());

    settings.timezone = tz.name().to_string();
    settings.updated_at = now;
    Ok(settings)
}

pub async fn family_timezone(
    pool: &SqlitePool,
    family_id: &Uuid,
    default_tz: Tz,
) -> Result<Tz, SettingsError> {
    let settings = get_or_create_settings(pool, family_id, default_tz).await?;
    // A stored zone this build of chrono-tz does not know falls back to the default
    Ok(parse_timezone(&settings.timezone).unwrap_or(default_tz))
}

/// The family's current local date.
pub async fn family_today(
    pool: &SqlitePool,
    family_id: &Uuid,
    default_tz: Tz,
) -> Result<NaiveDate, SettingsError> {
    let tz = family_timezone(pool, family_id, default_tz).await?;
    Ok(calendar::today_in_tz(tz))
}
