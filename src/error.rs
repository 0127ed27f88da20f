use actix_web::{body, http::{header::ContentType, StatusCode}, HttpResponse};
use sea_orm::DbErr;
use thiserror::Error;

/// Everything a payroll or advance operation can fail with.
///
/// All variants except [`PayrollError::Database`] are raised before any write
/// takes place.
#[derive(Debug, Error)]
pub enum PayrollError {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// The entity is not in a status that allows the operation
    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// The acting user lacks the required role or ownership
    #[error("forbidden")]
    Forbidden,

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl PayrollError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Turns the "no row matched the guarded update" outcome into a state conflict
pub(crate) fn conflict_on_stale(message: &'static str) -> impl FnOnce(DbErr) -> PayrollError {
    move |err| match err {
        DbErr::RecordNotUpdated | DbErr::RecordNotFound(_) => PayrollError::Conflict(message),
        err => PayrollError::Database(err),
    }
}

impl actix_web::error::ResponseError for PayrollError {
    fn error_response(&self) -> HttpResponse<body::BoxBody> {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .body(self.to_string())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            PayrollError::Validation(_) => StatusCode::BAD_REQUEST,
            PayrollError::Conflict(_) => StatusCode::CONFLICT,
            PayrollError::NotFound(_) => StatusCode::NOT_FOUND,
            PayrollError::Forbidden => StatusCode::FORBIDDEN,
            PayrollError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
