use actix_web::{web, HttpRequest, HttpResponse, Result};
use shared::{ApiSuccess, CreateChoreRequest, MarkDoneRequest, UpdateChoreRequest};

use super::{authorize, error_response, parse_uuid, require_parent, require_self_or_parent};
use crate::models::AppState;
use crate::services::{chores as chore_service, completions as completion_service, family_settings};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/chores")
            .route("", web::get().to(list_chores))
            .route("", web::post().to(create_chore))
            .route("/{chore_id}", web::get().to(get_chore))
            .route("/{chore_id}", web::put().to(update_chore))
            .route("/{chore_id}", web::delete().to(delete_chore))
            .route("/{chore_id}/done", web::post().to(mark_done)),
    );
}

async fn list_chores(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let (_, family_id) = match authorize(&req, &state, &path.into_inner()) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    match chore_service::list_chores(&state.db, &family_id).await {
        Ok(chores) => Ok(HttpResponse::Ok().json(ApiSuccess::new(chores))),
        Err(e) => Ok(error_response(&e, "list chores")),
    }
}

async fn create_chore(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<CreateChoreRequest>,
) -> Result<HttpResponse> {
    let (claims, family_id) = match authorize(&req, &state, &path.into_inner()) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = require_parent(&claims, "create chores") {
        return Ok(resp);
    }

    match chore_service::create_chore(&state.db, &family_id, &body.into_inner()).await {
        Ok(chore) => {
            log::info!("Chore {} created in family {}", chore.id, family_id);
            Ok(HttpResponse::Created().json(ApiSuccess::new(chore)))
        }
        Err(e) => Ok(error_response(&e, "create chore")),
    }
}

async fn get_chore(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (family_id, chore_id) = path.into_inner();
    let (_, family_id) = match authorize(&req, &state, &family_id) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    let chore_id = match parse_uuid(&chore_id, "chore") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match chore_service::get_family_chore(&state.db, &family_id, &chore_id).await {
        Ok(chore) => Ok(HttpResponse::Ok().json(ApiSuccess::new(chore))),
        Err(e) => Ok(error_response(&e, "fetch chore")),
    }
}

async fn update_chore(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    body: web::Json<UpdateChoreRequest>,
) -> Result<HttpResponse> {
    let (family_id, chore_id) = path.into_inner();
    let (claims, family_id) = match authorize(&req, &state, &family_id) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = require_parent(&claims, "edit chores") {
        return Ok(resp);
    }
    let chore_id = match parse_uuid(&chore_id, "chore") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    if let Err(e) = chore_service::get_family_chore(&state.db, &family_id, &chore_id).await {
        return Ok(error_response(&e, "update chore"));
    }

    match chore_service::update_chore(&state.db, &chore_id, &body.into_inner()).await {
        Ok(chore) => Ok(HttpResponse::Ok().json(ApiSuccess::new(chore))),
        Err(e) => Ok(error_response(&e, "update chore")),
    }
}

async fn delete_chore(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (family_id, chore_id) = path.into_inner();
    let (claims, family_id) = match authorize(&req, &state, &family_id) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = require_parent(&claims, "delete chores") {
        return Ok(resp);
    }
    let chore_id = match parse_uuid(&chore_id, "chore") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    if let Err(e) = chore_service::get_family_chore(&state.db, &family_id, &chore_id).await {
        return Ok(error_response(&e, "delete chore"));
    }

    match chore_service::delete_chore(&state.db, &chore_id).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Ok(error_response(&e, "delete chore")),
    }
}

/// Mark a chore done for today. `date` in the body defaults to the family's today.
async fn mark_done(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    body: web::Json<MarkDoneRequest>,
) -> Result<HttpResponse> {
    let (family_id, chore_id) = path.into_inner();
    let (claims, family_id) = match authorize(&req, &state, &family_id) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    let chore_id = match parse_uuid(&chore_id, "chore") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    let request = body.into_inner();
    if let Err(resp) = require_self_or_parent(&claims, &request.child_id) {
        return Ok(resp);
    }

    let today = match family_settings::family_today(&state.db, &family_id, state.config.default_timezone).await {
        Ok(today) => today,
        Err(e) => return Ok(error_response(&e, "resolve today")),
    };
    let date = request.date.unwrap_or(today);

    match completion_service::mark_done(&state.db, &family_id, &chore_id, &request.child_id, date, today).await {
        Ok(completion) => Ok(HttpResponse::Created().json(ApiSuccess::new(completion))),
        Err(e) => Ok(error_response(&e, "mark chore done")),
    }
}

#[cfg(test)]
mod tests {
    use super::super::{configure_routes, test_support};
    use crate::services::{calendar, children};
    use actix_web::{test, App};
    use shared::{
        ApiError, ApiSuccess, Chore, ChoreCompletion, CompletionStatus, CreateChildRequest,
        Role, WeekdayName,
    };
    use uuid::Uuid;

    #[actix_web::test]
    async fn test_create_chore_and_mark_done() {
        let state = test_support::state().await;
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

        let family_id = Uuid::new_v4();
        let parent = test_support::bearer(&Uuid::new_v4(), &family_id, Role::Parent);
        let child = children::create_child(
            &state.db,
            &family_id,
            &CreateChildRequest {
                name: "Mia".to_string(),
                emoji: None,
                display_order: None,
            },
        )
        .await
        .unwrap();

        // Due every day so the test does not depend on the weekday it runs on
        let req = test::TestRequest::post()
            .uri(&format!("/api/families/{}/chores", family_id))
            .insert_header(parent.clone())
            .set_json(serde_json::json!({
                "assignee_id": child.id,
                "title": "Feed the cat",
                "description": null,
                "points": 3,
                "emoji": "🐱",
                "schedule": { "kind": "recurring", "days": WeekdayName::ALL },
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let chore: ApiSuccess<Chore> = test::read_body_json(resp).await;

        let done_uri = format!("/api/families/{}/chores/{}/done", family_id, chore.data.id);
        let as_child = test_support::bearer(&child.id, &family_id, Role::Child);

        let req = test::TestRequest::post()
            .uri(&done_uri)
            .insert_header(as_child.clone())
            .set_json(serde_json::json!({ "child_id": child.id }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let completion: ApiSuccess<ChoreCompletion> = test::read_body_json(resp).await;
        assert_eq!(completion.data.status, CompletionStatus::Pending);

        let req = test::TestRequest::post()
            .uri(&done_uri)
            .insert_header(as_child.clone())
            .set_json(serde_json::json!({ "child_id": child.id }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 409);
        let body: ApiError = test::read_body_json(resp).await;
        assert_eq!(body.error, "already_marked");

        let yesterday = calendar::today_in_tz(chrono_tz::UTC).pred_opt().unwrap();
        let req = test::TestRequest::post()
            .uri(&done_uri)
            .insert_header(as_child)
            .set_json(serde_json::json!({ "child_id": child.id, "date": yesterday }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 409);
        let body: ApiError = test::read_body_json(resp).await;
        assert_eq!(body.error, "not_today");
    }

    #[actix_web::test]
    async fn test_invalid_chore_is_rejected() {
        let state = test_support::state().await;
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

        let family_id = Uuid::new_v4();
        let req = test::TestRequest::post()
            .uri(&format!("/api/families/{}/chores", family_id))
            .insert_header(test_support::bearer(&Uuid::new_v4(), &family_id, Role::Parent))
            .set_json(serde_json::json!({
                "assignee_id": Uuid::new_v4(),
                "title": "Wash dishes",
                "description": null,
                "points": 5,
                "emoji": null,
                "schedule": { "kind": "recurring", "days": [] },
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: ApiError = test::read_body_json(resp).await;
        assert_eq!(body.error, "validation_error");
    }
}
