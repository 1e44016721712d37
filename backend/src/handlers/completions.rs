use actix_web::{web, HttpRequest, HttpResponse, Result};
use shared::ApiSuccess;

use super::{authorize, error_response, parse_uuid, require_parent};
use crate::models::AppState;
use crate::services::completions as completion_service;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/completions")
            // Static routes must come before dynamic /{completion_id} routes
            .route("/pending", web::get().to(list_pending))
            .route("/{completion_id}", web::get().to(get_completion))
            .route("/{completion_id}/approve", web::post().to(approve))
            .route("/{completion_id}/reject", web::post().to(reject))
            .route("/{completion_id}/unapprove", web::post().to(unapprove)),
    );
}

async fn list_pending(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let (claims, family_id) = match authorize(&req, &state, &path.into_inner()) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = require_parent(&claims, "review completions") {
        return Ok(resp);
    }

    match completion_service::list_pending_completions(&state.db, &family_id).await {
        Ok(pending) => Ok(HttpResponse::Ok().json(ApiSuccess::new(pending))),
        Err(e) => Ok(error_response(&e, "list pending completions")),
    }
}

async fn get_completion(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (family_id, completion_id) = path.into_inner();
    let (claims, family_id) = match authorize(&req, &state, &family_id) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    let completion_id = match parse_uuid(&completion_id, "completion") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match completion_service::get_completion(&state.db, &family_id, &completion_id).await {
        Ok(completion) if claims.can_act_for_child(&completion.child_id) => {
            Ok(HttpResponse::Ok().json(ApiSuccess::new(completion)))
        }
        Ok(_) => Ok(super::forbidden("You can only view your own completions")),
        Err(e) => Ok(error_response(&e, "fetch completion")),
    }
}

async fn approve(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (family_id, completion_id) = path.into_inner();
    let (claims, family_id) = match authorize(&req, &state, &family_id) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = require_parent(&claims, "approve completions") {
        return Ok(resp);
    }
    let completion_id = match parse_uuid(&completion_id, "completion") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match completion_service::approve(&state.db, &family_id, &completion_id, &claims.sub).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiSuccess::new(result))),
        Err(e) => Ok(error_response(&e, "approve completion")),
    }
}

async fn reject(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (family_id, completion_id) = path.into_inner();
    let (claims, family_id) = match authorize(&req, &state, &family_id) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = require_parent(&claims, "reject completions") {
        return Ok(resp);
    }
    let completion_id = match parse_uuid(&completion_id, "completion") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match completion_service::reject(&state.db, &family_id, &completion_id).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiSuccess::new(result))),
        Err(e) => Ok(error_response(&e, "reject completion")),
    }
}

async fn unapprove(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (family_id, completion_id) = path.into_inner();
    let (claims, family_id) = match authorize(&req, &state, &family_id) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = require_parent(&claims, "unapprove completions") {
        return Ok(resp);
    }
    let completion_id = match parse_uuid(&completion_id, "completion") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match completion_service::unapprove(&state.db, &family_id, &completion_id).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiSuccess::new(result))),
        Err(e) => Ok(error_response(&e, "unapprove completion")),
    }
}
