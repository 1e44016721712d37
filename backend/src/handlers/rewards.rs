use actix_web::{web, HttpRequest, HttpResponse, Result};
use shared::{ApiSuccess, ClaimRewardRequest, CreateRewardRequest, UpdateRewardRequest};

use super::{authorize, error_response, parse_uuid, require_parent, require_self_or_parent};
use crate::models::AppState;
use crate::services::{claims as claim_service, rewards as reward_service};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/rewards")
            .route("", web::get().to(list_rewards))
            .route("", web::post().to(create_reward))
            .route("/{reward_id}", web::get().to(get_reward))
            .route("/{reward_id}", web::put().to(update_reward))
            .route("/{reward_id}", web::delete().to(delete_reward))
            .route("/{reward_id}/claim", web::post().to(claim_reward)),
    );
}

async fn list_rewards(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let (_, family_id) = match authorize(&req, &state, &path.into_inner()) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    match reward_service::list_rewards(&state.db, &family_id).await {
        Ok(rewards) => Ok(HttpResponse::Ok().json(ApiSuccess::new(rewards))),
        Err(e) => Ok(error_response(&e, "list rewards")),
    }
}

async fn create_reward(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<CreateRewardRequest>,
) -> Result<HttpResponse> {
    let (claims, family_id) = match authorize(&req, &state, &path.into_inner()) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = require_parent(&claims, "create rewards") {
        return Ok(resp);
    }

    match reward_service::create_reward(&state.db, &family_id, &body.into_inner()).await {
        Ok(reward) => Ok(HttpResponse::Created().json(ApiSuccess::new(reward))),
        Err(e) => Ok(error_response(&e, "create reward")),
    }
}

async fn get_reward(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (family_id, reward_id) = path.into_inner();
    let (_, family_id) = match authorize(&req, &state, &family_id) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    let reward_id = match parse_uuid(&reward_id, "reward") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match reward_service::get_family_reward(&state.db, &family_id, &reward_id).await {
        Ok(reward) => Ok(HttpResponse::Ok().json(ApiSuccess::new(reward))),
        Err(e) => Ok(error_response(&e, "fetch reward")),
    }
}

async fn update_reward(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    body: web::Json<UpdateRewardRequest>,
) -> Result<HttpResponse> {
    let (family_id, reward_id) = path.into_inner();
    let (claims, family_id) = match authorize(&req, &state, &family_id) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = require_parent(&claims, "edit rewards") {
        return Ok(resp);
    }
    let reward_id = match parse_uuid(&reward_id, "reward") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    if let Err(e) = reward_service::get_family_reward(&state.db, &family_id, &reward_id).await {
        return Ok(error_response(&e, "update reward"));
    }

    match reward_service::update_reward(&state.db, &reward_id, &body.into_inner()).await {
        Ok(reward) => Ok(HttpResponse::Ok().json(ApiSuccess::new(reward))),
        Err(e) => Ok(error_response(&e, "update reward")),
    }
}

async fn delete_reward(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (family_id, reward_id) = path.into_inner();
    let (claims, family_id) = match authorize(&req, &state, &family_id) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = require_parent(&claims, "delete rewards") {
        return Ok(resp);
    }
    let reward_id = match parse_uuid(&reward_id, "reward") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    if let Err(e) = reward_service::get_family_reward(&state.db, &family_id, &reward_id).await {
        return Ok(error_response(&e, "delete reward"));
    }

    match reward_service::delete_reward(&state.db, &reward_id).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Ok(error_response(&e, "delete reward")),
    }
}

async fn claim_reward(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    body: web::Json<ClaimRewardRequest>,
) -> Result<HttpResponse> {
    let (family_id, reward_id) = path.into_inner();
    let (claims, family_id) = match authorize(&req, &state, &family_id) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    let reward_id = match parse_uuid(&reward_id, "reward") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    let request = body.into_inner();
    if let Err(resp) = require_self_or_parent(&claims, &request.child_id) {
        return Ok(resp);
    }

    match claim_service::request_claim(&state.db, &family_id, &reward_id, &request.child_id).await {
        Ok(claim) => Ok(HttpResponse::Created().json(ApiSuccess::new(claim))),
        Err(e) => Ok(error_response(&e, "claim reward")),
    }
}

#[cfg(test)]
mod tests {
    use super::super::{configure_routes, test_support};
    use crate::services::children;
    use actix_web::{test, App};
    use shared::{ApiError, ApiSuccess, CreateChildRequest, Reward, Role};
    use uuid::Uuid;

    #[actix_web::test]
    async fn test_claim_without_enough_points() {
        let state = test_support::state().await;
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

        let family_id = Uuid::new_v4();
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

        let req = test::TestRequest::post()
            .uri(&format!("/api/families/{}/rewards", family_id))
            .insert_header(test_support::bearer(&Uuid::new_v4(), &family_id, Role::Parent))
            .set_json(serde_json::json!({ "title": "Movie Night", "emoji": "🎬", "points_required": 15 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let reward: ApiSuccess<Reward> = test::read_body_json(resp).await;

        let claim_uri = format!("/api/families/{}/rewards/{}/claim", family_id, reward.data.id);

        // A child cannot claim on a sibling's behalf
        let req = test::TestRequest::post()
            .uri(&claim_uri)
            .insert_header(test_support::bearer(&Uuid::new_v4(), &family_id, Role::Child))
            .set_json(serde_json::json!({ "child_id": child.id }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 403);

        let req = test::TestRequest::post()
            .uri(&claim_uri)
            .insert_header(test_support::bearer(&child.id, &family_id, Role::Child))
            .set_json(serde_json::json!({ "child_id": child.id }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 409);
        let body: ApiError = test::read_body_json(resp).await;
        assert_eq!(body.error, "insufficient_points");
    }
}
