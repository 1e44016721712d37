use actix_web::{web, HttpRequest, HttpResponse, Result};
use shared::ApiSuccess;

use super::{authorize, error_response, parse_uuid, require_parent};
use crate::models::AppState;
use crate::services::claims as claim_service;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/claims")
            .route("/pending", web::get().to(list_pending))
            .route("/{claim_id}", web::get().to(get_claim))
            .route("/{claim_id}/approve", web::post().to(approve_claim))
            .route("/{claim_id}/reject", web::post().to(reject_claim)),
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
    if let Err(resp) = require_parent(&claims, "review claims") {
        return Ok(resp);
    }

    match claim_service::list_pending_claims(&state.db, &family_id).await {
        Ok(pending) => Ok(HttpResponse::Ok().json(ApiSuccess::new(pending))),
        Err(e) => Ok(error_response(&e, "list pending claims")),
    }
}

async fn get_claim(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (family_id, claim_id) = path.into_inner();
    let (claims, family_id) = match authorize(&req, &state, &family_id) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    let claim_id = match parse_uuid(&claim_id, "claim") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match claim_service::get_claim(&state.db, &family_id, &claim_id).await {
        Ok(claim) if claims.can_act_for_child(&claim.child_id) => {
            Ok(HttpResponse::Ok().json(ApiSuccess::new(claim)))
        }
        Ok(_) => Ok(super::forbidden("You can only view your own claims")),
        Err(e) => Ok(error_response(&e, "fetch claim")),
    }
}

async fn approve_claim(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (family_id, claim_id) = path.into_inner();
    let (claims, family_id) = match authorize(&req, &state, &family_id) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = require_parent(&claims, "approve claims") {
        return Ok(resp);
    }
    let claim_id = match parse_uuid(&claim_id, "claim") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match claim_service::approve_claim(&state.db, &family_id, &claim_id, &claims.sub).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiSuccess::new(result))),
        Err(e) => Ok(error_response(&e, "approve claim")),
    }
}

async fn reject_claim(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (family_id, claim_id) = path.into_inner();
    let (claims, family_id) = match authorize(&req, &state, &family_id) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = require_parent(&claims, "reject claims") {
        return Ok(resp);
    }
    let claim_id = match parse_uuid(&claim_id, "claim") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match claim_service::reject_claim(&state.db, &family_id, &claim_id, &claims.sub).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiSuccess::new(result))),
        Err(e) => Ok(error_response(&e, "reject claim")),
    }
}

#[cfg(test)]
mod tests {
    use super::super::{configure_routes, test_support};
    use crate::services::{children, claims, ledger, rewards};
    use actix_web::{test, App};
    use shared::{ApiSuccess, ClaimResult, ClaimStatus, CreateChildRequest, CreateRewardRequest, PendingClaim, Role};
    use uuid::Uuid;

    #[actix_web::test]
    async fn test_parent_approves_claim() {
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
        let mut conn = state.db.acquire().await.unwrap();
        ledger::credit(&mut conn, &child.id, 20).await.unwrap();
        drop(conn);

        let reward = rewards::create_reward(
            &state.db,
            &family_id,
            &CreateRewardRequest {
                title: "Movie Night".to_string(),
                emoji: None,
                points_required: 20,
            },
        )
        .await
        .unwrap();
        let claim = claims::request_claim(&state.db, &family_id, &reward.id, &child.id)
            .await
            .unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/api/families/{}/claims/pending", family_id))
            .insert_header(parent.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let pending: ApiSuccess<Vec<PendingClaim>> = test::read_body_json(resp).await;
        assert_eq!(pending.data.len(), 1);

        let req = test::TestRequest::post()
            .uri(&format!("/api/families/{}/claims/{}/approve", family_id, claim.id))
            .insert_header(parent)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let result: ApiSuccess<ClaimResult> = test::read_body_json(resp).await;
        assert_eq!(result.data.balance, 0);
        assert_eq!(result.data.claim.status, ClaimStatus::Approved);
    }
}
