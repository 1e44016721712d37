use actix_web::{web, HttpRequest, HttpResponse, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::{ApiSuccess, BalanceResponse, CreateChildRequest, UpdateChildRequest};

use super::{authorize, error_response, parse_uuid, require_parent, require_self_or_parent};
use crate::models::AppState;
use crate::services::{
    calendar, children as child_service, chores as chore_service, claims as claim_service,
    completions as completion_service, family_settings, ledger,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/children")
            .route("", web::get().to(list_children))
            .route("", web::post().to(create_child))
            .route("/{child_id}", web::get().to(get_child))
            .route("/{child_id}", web::put().to(update_child))
            .route("/{child_id}", web::delete().to(delete_child))
            .route("/{child_id}/balance", web::get().to(get_balance))
            .route("/{child_id}/chores", web::get().to(chores_for_day))
            .route("/{child_id}/completions", web::get().to(list_completions))
            .route("/{child_id}/claims", web::get().to(list_claims)),
    );
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

async fn list_children(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let (_, family_id) = match authorize(&req, &state, &path.into_inner()) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    match child_service::list_children(&state.db, &family_id).await {
        Ok(children) => Ok(HttpResponse::Ok().json(ApiSuccess::new(children))),
        Err(e) => Ok(error_response(&e, "list children")),
    }
}

async fn create_child(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<CreateChildRequest>,
) -> Result<HttpResponse> {
    let (claims, family_id) = match authorize(&req, &state, &path.into_inner()) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    if let Err(resp) = require_parent(&claims, "add children") {
        return Ok(resp);
    }

    match child_service::create_child(&state.db, &family_id, &body.into_inner()).await {
        Ok(child) => Ok(HttpResponse::Created().json(ApiSuccess::new(child))),
        Err(e) => Ok(error_response(&e, "create child")),
    }
}

async fn get_child(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (family_id, child_id) = path.into_inner();
    let (_, family_id) = match authorize(&req, &state, &family_id) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    let child_id = match parse_uuid(&child_id, "child") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match child_service::get_family_child(&state.db, &family_id, &child_id).await {
        Ok(child) => Ok(HttpResponse::Ok().json(ApiSuccess::new(child))),
        Err(e) => Ok(error_response(&e, "fetch child")),
    }
}

async fn update_child(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    body: web::Json<UpdateChildRequest>,
) -> Result<HttpResponse> {
    let (family_id, child_id) = path.into_inner();
    let (claims, family_id) = match authorize(&req, &state, &family_id) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = require_parent(&claims, "edit children") {
        return Ok(resp);
    }
    let child_id = match parse_uuid(&child_id, "child") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    if let Err(e) = child_service::get_family_child(&state.db, &family_id, &child_id).await {
        return Ok(error_response(&e, "update child"));
    }

    match child_service::update_child(&state.db, &child_id, &body.into_inner()).await {
        Ok(child) => Ok(HttpResponse::Ok().json(ApiSuccess::new(child))),
        Err(e) => Ok(error_response(&e, "update child")),
    }
}

async fn delete_child(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (family_id, child_id) = path.into_inner();
    let (claims, family_id) = match authorize(&req, &state, &family_id) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = require_parent(&claims, "remove children") {
        return Ok(resp);
    }
    let child_id = match parse_uuid(&child_id, "child") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    if let Err(e) = child_service::get_family_child(&state.db, &family_id, &child_id).await {
        return Ok(error_response(&e, "delete child"));
    }

    match child_service::delete_child(&state.db, &child_id).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Ok(error_response(&e, "delete child")),
    }
}

async fn get_balance(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (family_id, child_id) = path.into_inner();
    let (_, family_id) = match authorize(&req, &state, &family_id) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    let child_id = match parse_uuid(&child_id, "child") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    if let Err(e) = child_service::get_family_child(&state.db, &family_id, &child_id).await {
        return Ok(error_response(&e, "fetch balance"));
    }

    match ledger::get_balance(&state.db, &child_id).await {
        Ok(points) => Ok(HttpResponse::Ok().json(ApiSuccess::new(BalanceResponse { child_id, points }))),
        Err(e) => Ok(error_response(&e, "fetch balance")),
    }
}

/// The child's due chores for `?date=` (default: today) with their completion state.
async fn chores_for_day(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    query: web::Query<DayQuery>,
) -> Result<HttpResponse> {
    let (family_id, child_id) = path.into_inner();
    let (claims, family_id) = match authorize(&req, &state, &family_id) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    let child_id = match parse_uuid(&child_id, "child") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = require_self_or_parent(&claims, &child_id) {
        return Ok(resp);
    }

    let date = match query.date {
        Some(date) => date,
        None => match family_settings::family_today(&state.db, &family_id, state.config.default_timezone).await {
            Ok(today) => today,
            Err(e) => return Ok(error_response(&e, "resolve today")),
        },
    };

    match chore_service::chores_for_day(&state.db, &family_id, &child_id, date).await {
        Ok(chores) => Ok(HttpResponse::Ok().json(ApiSuccess::new(chores))),
        Err(e) => Ok(error_response(&e, "list chores for day")),
    }
}

/// Completion history; defaults to the current week.
async fn list_completions(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    query: web::Query<RangeQuery>,
) -> Result<HttpResponse> {
    let (family_id, child_id) = path.into_inner();
    let (claims, family_id) = match authorize(&req, &state, &family_id) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    let child_id = match parse_uuid(&child_id, "child") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = require_self_or_parent(&claims, &child_id) {
        return Ok(resp);
    }
    if let Err(e) = child_service::get_family_child(&state.db, &family_id, &child_id).await {
        return Ok(error_response(&e, "list completions"));
    }

    let today = match family_settings::family_today(&state.db, &family_id, state.config.default_timezone).await {
        Ok(today) => today,
        Err(e) => return Ok(error_response(&e, "resolve today")),
    };
    let week_start = calendar::start_of_week(today);
    let from = query.from.unwrap_or(week_start);
    let to = query.to.unwrap_or(week_start + chrono::Duration::days(6));

    match completion_service::list_child_completions(&state.db, &child_id, from, to).await {
        Ok(completions) => Ok(HttpResponse::Ok().json(ApiSuccess::new(completions))),
        Err(e) => Ok(error_response(&e, "list completions")),
    }
}

async fn list_claims(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (family_id, child_id) = path.into_inner();
    let (claims, family_id) = match authorize(&req, &state, &family_id) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    let child_id = match parse_uuid(&child_id, "child") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = require_self_or_parent(&claims, &child_id) {
        return Ok(resp);
    }
    if let Err(e) = child_service::get_family_child(&state.db, &family_id, &child_id).await {
        return Ok(error_response(&e, "list claims"));
    }

    match claim_service::list_child_claims(&state.db, &child_id).await {
        Ok(claims) => Ok(HttpResponse::Ok().json(ApiSuccess::new(claims))),
        Err(e) => Ok(error_response(&e, "list claims")),
    }
}
