use actix_web::{dev, get, post, web, FromRequest, HttpRequest, HttpResponse, Responder};
use futures_util::future::LocalBoxFuture;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};

use crate::{auth::Actor, entity::{advance, prelude::*}, error::PayrollError, service::advance::{self as service, AdvanceFilter}};

use model::*;

mod extractor;
mod model;

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(create_advance)
        .service(list_advances)
        .service(get_advance)
        .service(approve_advance)
        .service(reject_advance);
}

#[post("")]
async fn create_advance(db: web::Data<DatabaseConnection>, actor: Actor, payload: web::Json<CreateAdvance>) -> Result<HttpResponse, PayrollError> {
    let CreateAdvance { amount, notes } = payload.into_inner();

    let advance = service::request_advance(db.get_ref(), &actor, amount, notes).await?;

    Ok(
        HttpResponse::Created()
            .json(web::Json(advance))
    )
}

#[get("")]
async fn list_advances(db: web::Data<DatabaseConnection>, actor: Actor, filter: web::Query<AdvanceFilter>) -> Result<impl Responder, PayrollError> {
    let advances = service::list_advances(db.get_ref(), &actor, filter.into_inner()).await?;

    Ok(web::Json(advances))
}

#[get("/{advance_id}")]
async fn get_advance(actor: Actor, advance: advance::Model) -> Result<impl Responder, PayrollError> {
    actor.require_owner_or_admin(advance.worker_id)?;

    Ok(web::Json(advance))
}

#[post("/{advance_id}/approve")]
async fn approve_advance(db: web::Data<DatabaseConnection>, actor: Actor, advance: advance::Model, payload: web::Json<ApproveAdvance>) -> Result<impl Responder, PayrollError> {
    let advance = service::approve_advance(db.get_ref(), &actor, &advance, payload.installments).await?;

    Ok(web::Json(advance))
}

#[post("/{advance_id}/reject")]
async fn reject_advance(db: web::Data<DatabaseConnection>, actor: Actor, advance: advance::Model) -> Result<impl Responder, PayrollError> {
    let advance = service::reject_advance(db.get_ref(), &actor, &advance).await?;

    Ok(web::Json(advance))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::{Method, StatusCode}, test, App};
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use crate::{auth::{tests::{bearer, make_user}, Authority}, entity::sea_orm_active_enums::{AdvanceStatus, RoleType}, ledger, utils};

    use super::*;

    const SECRET: &[u8] = b"secret";

    #[actix_web::test]
    async fn test_create_advance() {
        let worker = make_user("agent", RoleType::User);
        let advance = ledger::request(worker.id, dec!(40000), Some("rent".to_owned()), utils::now()).unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![ advance.clone() ],
            ]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(SECRET)))
                .app_data(web::Data::new(db.into_connection()))
                .service(web::scope("/advance").configure(config))
        ).await;

        {
            let req = test::TestRequest::default()
                .uri("/advance")
                .method(Method::POST)
                .insert_header(bearer(SECRET, &worker))
                .set_json(serde_json::json!({ "amount": "40000", "notes": "rent" }))
                .to_request();

            let response = test::call_service(&app, req).await;
            assert_eq!(response.status(), StatusCode::CREATED);

            let returned: advance::Model = test::read_body_json(response).await;
            assert_eq!(returned, advance);
        }

        {
            let req = test::TestRequest::default()
                .uri("/advance")
                .method(Method::POST)
                .insert_header(bearer(SECRET, &worker))
                .set_json(serde_json::json!({ "amount": "-5" }))
                .to_request();

            let response = test::call_service(&app, req).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[actix_web::test]
    async fn test_get_advance_visibility() {
        let owner = make_user("agent", RoleType::User);
        let stranger = make_user("other", RoleType::User);
        let advance = ledger::request(owner.id, dec!(40000), None, utils::now()).unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![ advance.clone() ],
                vec![ advance.clone() ],
            ]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(SECRET)))
                .app_data(web::Data::new(db.into_connection()))
                .service(web::scope("/advance").configure(config))
        ).await;

        let req = test::TestRequest::default()
            .uri(&format!("/advance/{}", advance.id))
            .insert_header(bearer(SECRET, &owner))
            .to_request();

        let returned: advance::Model = test::call_and_read_body_json(&app, req).await;
        assert_eq!(returned, advance);

        let req = test::TestRequest::default()
            .uri(&format!("/advance/{}", advance.id))
            .insert_header(bearer(SECRET, &stranger))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_approve_advance() {
        let admin = make_user("admin", RoleType::Admin);
        let worker = make_user("agent", RoleType::User);
        let advance = ledger::request(worker.id, dec!(60000), None, utils::now()).unwrap();
        let approved = ledger::approve(&advance, 3, admin.id, utils::now()).unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                // Extractor, then the guarded update
                vec![ advance.clone() ],
                vec![ approved.clone() ],
                // Worker attempt only reaches the extractor
                vec![ advance.clone() ],
            ]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(SECRET)))
                .app_data(web::Data::new(db.into_connection()))
                .service(web::scope("/advance").configure(config))
        ).await;

        let req = test::TestRequest::default()
            .uri(&format!("/advance/{}/approve", advance.id))
            .method(Method::POST)
            .insert_header(bearer(SECRET, &admin))
            .set_json(serde_json::json!({ "installments": 3 }))
            .to_request();

        let returned: advance::Model = test::call_and_read_body_json(&app, req).await;
        assert_eq!(returned.status, AdvanceStatus::Approved);
        assert_eq!(returned.installments, 3);

        let req = test::TestRequest::default()
            .uri(&format!("/advance/{}/approve", advance.id))
            .method(Method::POST)
            .insert_header(bearer(SECRET, &worker))
            .set_json(serde_json::json!({ "installments": 3 }))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_reject_non_requested_advance() {
        let admin = make_user("admin", RoleType::Admin);
        let advance = ledger::request(Uuid::new_v4(), dec!(60000), None, utils::now()).unwrap();
        let rejected = ledger::reject(&advance, admin.id, utils::now()).unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![ rejected.clone() ],
            ]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(SECRET)))
                .app_data(web::Data::new(db.into_connection()))
                .service(web::scope("/advance").configure(config))
        ).await;

        let req = test::TestRequest::default()
            .uri(&format!("/advance/{}/reject", rejected.id))
            .method(Method::POST)
            .insert_header(bearer(SECRET, &admin))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
