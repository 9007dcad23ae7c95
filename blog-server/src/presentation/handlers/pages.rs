use actix_web::{HttpRequest, HttpResponse, Responder, get};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::error::DomainError;

/// Default service: anything no route claims.
pub async fn page_not_found(req: HttpRequest) -> Result<HttpResponse, DomainError> {
    Err(DomainError::PageNotFound(req.path().to_string()))
}

#[get("/trigger-error/")]
pub async fn trigger_error() -> Result<HttpResponse, DomainError> {
    Err(DomainError::Internal("deliberate error from /trigger-error/".into()))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}
