use std::str::FromStr;

use actix_web::{web, HttpRequest};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

mod auth;
mod advance;
mod payroll;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(web::scope("/auth")
            .configure(auth::config))
        .service(web::scope("/advance")
            .configure(advance::config))
        .service(web::scope("/payroll")
            .configure(payroll::config));
}

/// Reads a uuid path segment for the entity extractors
fn path_id(req: &HttpRequest, name: &str) -> Result<Uuid, actix_web::Error> {
    let Some(id) = req.match_info().get(name) else {
        return Err(actix_web::error::ErrorInternalServerError(format!("route has no `{name}` segment")))
    };

    Uuid::from_str(id).map_err(|_| actix_web::error::ErrorBadRequest(format!("invalid `{name}`")))
}

fn database(req: &HttpRequest) -> Result<web::Data<DatabaseConnection>, actix_web::Error> {
    req.app_data::<web::Data<DatabaseConnection>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("database is not configured"))
}
