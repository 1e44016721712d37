use actix_web::{web, HttpRequest, HttpResponse, Result};
use serde::{Deserialize, Serialize};
use shared::{ApiError, ApiSuccess, WeekdayName};

use super::{authorize, error_response};
use crate::models::AppState;
use crate::services::{calendar, family_settings};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/calendar")
            .route("/today", web::get().to(today))
            .route("/week", web::get().to(week)),
    );
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TodayResponse {
    pub date: String,
    pub weekday: WeekdayName,
    pub timezone: String,
}

#[derive(Debug, Deserialize)]
pub struct WeekQuery {
    pub date: Option<String>,
}

async fn today(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let (_, family_id) = match authorize(&req, &state, &path.into_inner()) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    let tz = match family_settings::family_timezone(&state.db, &family_id, state.config.default_timezone).await {
        Ok(tz) => tz,
        Err(e) => return Ok(error_response(&e, "resolve today")),
    };
    let today = calendar::today_in_tz(tz);

    Ok(HttpResponse::Ok().json(ApiSuccess::new(TodayResponse {
        date: calendar::format_local_date(today),
        weekday: calendar::weekday_name(today),
        timezone: tz.name().to_string(),
    })))
}

/// Monday..Sunday of the week containing `?date=YYYY-MM-DD` (default: this week).
async fn week(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<WeekQuery>,
) -> Result<HttpResponse> {
    let (_, family_id) = match authorize(&req, &state, &path.into_inner()) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    let today = match family_settings::family_today(&state.db, &family_id, state.config.default_timezone).await {
        Ok(today) => today,
        Err(e) => return Ok(error_response(&e, "resolve today")),
    };

    let reference = match query.date.as_deref() {
        None => today,
        Some(raw) => match calendar::parse_local_date(raw) {
            Some(date) => date,
            None => {
                return Ok(HttpResponse::BadRequest().json(ApiError {
                    error: "validation_error".to_string(),
                    message: format!("Invalid date {:?}, expected YYYY-MM-DD", raw),
                }));
            }
        },
    };

    Ok(HttpResponse::Ok().json(ApiSuccess::new(calendar::week_of(reference, today))))
}
