use actix_web::{get, post, web, Responder};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::{auth::{Actor, Authority}, entity::{prelude::*, user}, error::PayrollError};

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(login)
        .service(whoami);
}

#[derive(Debug, Serialize, Deserialize)]
struct Login {
    username: String,
    password: String,
}

/// Salted with the username, the same way accounts are seeded
fn hash_password(username: &str, password: &str) -> Vec<u8> {
    Sha256::digest(format!("{password}:{username}")).to_vec()
}

#[post("/login")]
async fn login(db: web::Data<DatabaseConnection>, authority: web::Data<Authority>, credentials: web::Json<Login>) -> actix_web::Result<impl Responder> {
    let hashed_password = hash_password(&credentials.username, &credentials.password);

    let Some(user) = User::find()
        .filter(user::Column::Username.eq(&credentials.username))
        .filter(user::Column::Password.eq(hashed_password))
        .one(db.get_ref()).await
        .map_err(PayrollError::from)?
    else {
        return Err(actix_web::error::ErrorForbidden("invalid credentials"));
    };

    info!(user_id = %user.id, role = ?user.role, "User logged in");

    Ok(
        authority.issue_for(&user)?
    )
}

#[get("")]
async fn whoami(db: web::Data<DatabaseConnection>, actor: Actor) -> actix_web::Result<impl Responder> {
    let user = User::find_by_id(actor.id)
        .one(db.get_ref()).await
        .map_err(PayrollError::from)?
        .ok_or(PayrollError::NotFound("user"))?;

    Ok(web::Json(user))
}
