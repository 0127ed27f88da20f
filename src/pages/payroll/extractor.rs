use crate::pages::{database, path_id};

use super::*;

impl FromRequest for payroll_record::Model {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let payroll_id = path_id(&req, "payroll_id")?;
            let db = database(&req)?;

            let Some(record) = PayrollRecord::find_by_id(payroll_id)
                .one(db.as_ref()).await
                .map_err(PayrollError::from)?
            else {
                return Err(PayrollError::NotFound("payroll record").into())
            };

            Ok(record)
        })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};
    use uuid::Uuid;

    use crate::{auth::tests::make_user, entity::sea_orm_active_enums::{PayrollStatus, RoleType}, service::payroll::tests::make_record};

    use super::*;

    #[actix_web::test]
    async fn test_payroll_record_extractor() {
        #[get("/{payroll_id}")]
        async fn test_handler(record: payroll_record::Model) -> impl Responder {
            web::Json(record)
        }

        let record = make_record(&make_user("agent", RoleType::User), PayrollStatus::Pending);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![ record.clone() ],
                vec![ ],
            ])
            .append_query_errors([
                DbErr::Custom("connection lost".to_owned()),
            ]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db.into_connection()))
                .service(test_handler)
        ).await;

        let req = test::TestRequest::default()
            .uri(&format!("/{}", record.id))
            .to_request();

        let returned_record: payroll_record::Model = test::call_and_read_body_json(&app, req).await;
        assert_eq!(returned_record, record);

        let req = test::TestRequest::default()
            .uri(&format!("/{}", Uuid::new_v4()))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::default()
            .uri(&format!("/{}", Uuid::new_v4()))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
