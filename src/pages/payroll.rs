use actix_web::{dev, get, http::header::ContentType, post, web, FromRequest, HttpRequest, HttpResponse, Responder};
use futures_util::future::LocalBoxFuture;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};

use crate::{auth::Actor, config::PayrollConfig, entity::{payroll_record, prelude::*}, error::PayrollError, notify::Notifier, service::payroll::{self as service, GenerateRequest, PayrollFilter}};

use model::*;

mod extractor;
mod model;

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(generate_payroll)
        .service(list_payroll)
        .service(get_payroll)
        .service(edit_days_worked)
        .service(approve_payroll)
        .service(mark_paid)
        .service(get_receipt);
}

#[post("/generate")]
async fn generate_payroll(
    db: web::Data<DatabaseConnection>,
    config: web::Data<PayrollConfig>,
    actor: Actor,
    payload: web::Json<GenerateRequest>,
) -> Result<impl Responder, PayrollError> {
    let summary = service::generate_payroll(db.get_ref(), &actor, config.get_ref(), payload.into_inner()).await?;

    Ok(web::Json(summary))
}

#[get("")]
async fn list_payroll(db: web::Data<DatabaseConnection>, actor: Actor, filter: web::Query<PayrollFilter>) -> Result<impl Responder, PayrollError> {
    let records = service::list_payroll(db.get_ref(), &actor, filter.into_inner()).await?;

    Ok(web::Json(records))
}

#[get("/{payroll_id}")]
async fn get_payroll(db: web::Data<DatabaseConnection>, actor: Actor, record: payroll_record::Model) -> Result<impl Responder, PayrollError> {
    let detail = service::payroll_detail(db.get_ref(), &actor, record).await?;

    Ok(web::Json(detail))
}

#[post("/{payroll_id}/days")]
async fn edit_days_worked(db: web::Data<DatabaseConnection>, actor: Actor, record: payroll_record::Model, payload: web::Json<EditDays>) -> Result<impl Responder, PayrollError> {
    let record = service::edit_days_worked(db.get_ref(), &actor, record.id, payload.days_worked).await?;

    Ok(web::Json(record))
}

#[post("/{payroll_id}/approve")]
async fn approve_payroll(
    db: web::Data<DatabaseConnection>,
    notifier: web::Data<dyn Notifier>,
    actor: Actor,
    record: payroll_record::Model,
) -> Result<impl Responder, PayrollError> {
    let record = service::approve_payroll(db.get_ref(), &actor, notifier.get_ref(), &record).await?;

    Ok(web::Json(record))
}

#[post("/{payroll_id}/pay")]
async fn mark_paid(db: web::Data<DatabaseConnection>, actor: Actor, record: payroll_record::Model) -> Result<impl Responder, PayrollError> {
    let record = service::mark_paid(db.get_ref(), &actor, &record).await?;

    Ok(web::Json(record))
}

#[get("/{payroll_id}/receipt")]
async fn get_receipt(db: web::Data<DatabaseConnection>, actor: Actor, record: payroll_record::Model) -> Result<HttpResponse, PayrollError> {
    let receipt = service::payroll_receipt(db.get_ref(), &actor, &record).await?;

    Ok(
        HttpResponse::Ok()
            .insert_header(ContentType::plaintext())
            .body(receipt.to_string())
    )
}
