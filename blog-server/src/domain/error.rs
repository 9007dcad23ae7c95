use actix_web::http::header::LOCATION;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::presentation::templates::render_error_page;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("page not found: {0}")]
    PageNotFound(String),
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("user already exists: {0}")]
    UserAlreadyExists(String),
    #[error("post not found: {0}")]
    PostNotFound(Uuid),
    #[error("comment not found: {0}")]
    CommentNotFound(Uuid),
    #[error("category not found: {0}")]
    CategoryNotFound(String),
    #[error("location not found: {0}")]
    LocationNotFound(Uuid),
    #[error("forbidden")]
    Forbidden,
    #[error("unauthorized")]
    Unauthorized,
    #[error("login required")]
    LoginRequired { next: String },
    #[error("CSRF verification failed: {0}")]
    Csrf(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::PageNotFound(_)
                | DomainError::UserNotFound(_)
                | DomainError::PostNotFound(_)
                | DomainError::CommentNotFound(_)
                | DomainError::CategoryNotFound(_)
                | DomainError::LocationNotFound(_)
        )
    }
}

/// Login page address that sends the user back to `next` afterwards.
pub fn login_url(next: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    format!("/auth/login/?{query}")
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            e if e.is_not_found() => StatusCode::NOT_FOUND,
            DomainError::LoginRequired { .. } => StatusCode::FOUND,
            DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden | DomainError::Csrf(_) => StatusCode::FORBIDDEN,
            DomainError::UserAlreadyExists(_) => StatusCode::CONFLICT,
            DomainError::Validation(_) | DomainError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let DomainError::LoginRequired { next } = self {
            return HttpResponse::Found()
                .insert_header((LOCATION, login_url(next)))
                .finish();
        }
        if let DomainError::Internal(reason) = self {
            error!(reason = %reason, "request failed with internal error");
        }

        let status = self.status_code();
        HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(render_error_page(status, self))
    }
}
