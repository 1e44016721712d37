use actix_web::{web, HttpRequest, HttpResponse, Result};
use shared::{ApiSuccess, UpdateFamilySettingsRequest};

use super::{authorize, error_response, require_parent};
use crate::models::AppState;
use crate::services::family_settings;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/settings")
            .route(web::get().to(get_settings))
            .route(web::put().to(update_settings)),
    );
}

async fn get_settings(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let (_, family_id) = match authorize(&req, &state, &path.into_inner()) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    match family_settings::get_or_create_settings(&state.db, &family_id, state.config.default_timezone).await {
        Ok(settings) => Ok(HttpResponse::Ok().json(ApiSuccess::new(settings))),
        Err(e) => Ok(error_response(&e, "fetch settings")),
    }
}

async fn update_settings(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateFamilySettingsRequest>,
) -> Result<HttpResponse> {
    let (claims, family_id) = match authorize(&req, &state, &path.into_inner()) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = require_parent(&claims, "change family settings") {
        return Ok(resp);
    }

    match family_settings::update_settings(
        &state.db,
        &family_id,
        state.config.default_timezone,
        &body.into_inner(),
    )
    .await
    {
        Ok(settings) => Ok(HttpResponse::Ok().json(ApiSuccess::new(settings))),
        Err(e) => Ok(error_response(&e, "update settings")),
    }
}
