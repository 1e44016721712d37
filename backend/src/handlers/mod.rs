use actix_web::{web, HttpRequest, HttpResponse};
use shared::ApiError;
use uuid::Uuid;

use crate::models::AppState;
use crate::services::auth::Claims;
use crate::services::{ErrorKind, ServiceError};

pub mod calendar;
pub mod children;
pub mod chores;
pub mod claims;
pub mod completions;
pub mod rewards;
pub mod settings;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/families/{family_id}")
            .configure(calendar::configure)
            .configure(children::configure)
            .configure(chores::configure)
            .configure(completions::configure)
            .configure(rewards::configure)
            .configure(claims::configure)
            .configure(settings::configure),
    );
}

pub(crate) fn parse_uuid(value: &str, what: &str) -> Result<Uuid, HttpResponse> {
    Uuid::parse_str(value).map_err(|_| {
        HttpResponse::BadRequest().json(ApiError {
            error: "invalid_id".to_string(),
            message: format!("Invalid {} ID format", what),
        })
    })
}

/// Verify the bearer token and check it belongs to the family in the path.
pub(crate) fn authorize(
    req: &HttpRequest,
    state: &AppState,
    family_id: &str,
) -> Result<(Claims, Uuid), HttpResponse> {
    let claims = crate::middleware::auth::extract_claims(req, &state.config.jwt_secret).map_err(|_| {
        HttpResponse::Unauthorized().json(ApiError {
            error: "unauthorized".to_string(),
            message: "Invalid or missing token".to_string(),
        })
    })?;

    let family_id = parse_uuid(family_id, "family")?;

    if claims.family_id != family_id {
        return Err(forbidden("You are not a member of this family"));
    }

    Ok((claims, family_id))
}

pub(crate) fn require_parent(claims: &Claims, action: &str) -> Result<(), HttpResponse> {
    if claims.is_parent() {
        Ok(())
    } else {
        Err(forbidden(&format!("Only a parent can {}", action)))
    }
}

pub(crate) fn require_self_or_parent(claims: &Claims, child_id: &Uuid) -> Result<(), HttpResponse> {
    if claims.can_act_for_child(child_id) {
        Ok(())
    } else {
        Err(forbidden("You can only act for yourself"))
    }
}

pub(crate) fn forbidden(message: &str) -> HttpResponse {
    HttpResponse::Forbidden().json(ApiError {
        error: "forbidden".to_string(),
        message: message.to_string(),
    })
}

/// Map a service failure to its status code. Only transport errors are logged.
pub(crate) fn error_response<E>(err: &E, context: &str) -> HttpResponse
where
    E: ServiceError + std::fmt::Debug,
{
    let body = ApiError {
        error: err.code().to_string(),
        message: err.to_string(),
    };

    match err.kind() {
        ErrorKind::Validation => HttpResponse::BadRequest().json(body),
        ErrorKind::Conflict => HttpResponse::Conflict().json(body),
        ErrorKind::NotFound => HttpResponse::NotFound().json(body),
        ErrorKind::Transport => {
            log::error!("Error {}: {:?}", context, err);
            HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: format!("Failed to {}", context),
            })
        }
    }
}
