use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::http::header::LOCATION;
use actix_web::{FromRequest, HttpMessage, HttpRequest, HttpResponse, HttpResponseBuilder};
use futures_util::future::{Ready, ready};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::infrastructure::security::{Claims, SESSION_COOKIE};
use crate::presentation::middleware::RequestId;

/// The logged-in user, as decoded from the session token.
///
/// Taking it as a handler argument makes the route login-protected; use
/// `Option<AuthenticatedUser>` on public pages.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: &Claims) -> Option<Self> {
        Some(Self {
            id: claims.user_id()?,
            username: claims.username.clone(),
        })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = DomainError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => {
                let next = req
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| req.path().to_string());
                ready(Err(DomainError::LoginRequired { next }))
            }
        }
    }
}

/// Cookie attributes shared by login, logout and profile edits.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub secure: bool,
    pub ttl_hours: i64,
}

pub fn session_cookie(token: String, settings: &SessionSettings) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.secure)
        .max_age(CookieDuration::hours(settings.ttl_hours))
        .finish()
}

pub fn clear_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();
    cookie.make_removal();
    cookie
}

pub fn found(location: &str) -> HttpResponseBuilder {
    let mut builder = HttpResponse::Found();
    builder.insert_header((LOCATION, location));
    builder
}

pub fn redirect(location: &str) -> HttpResponse {
    found(location).finish()
}

/// Non-authors are sent back to the page instead of seeing an error.
pub fn redirect_if_forbidden(
    err: DomainError,
    location: &str,
) -> Result<HttpResponse, DomainError> {
    match err {
        DomainError::Forbidden => Ok(redirect(location)),
        other => Err(other),
    }
}

pub fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_default()
}

pub fn post_url(id: Uuid) -> String {
    format!("/posts/{id}/")
}

pub fn profile_url(username: &str) -> String {
    let segment: String = url::form_urlencoded::byte_serialize(username.as_bytes()).collect();
    format!("/profile/{segment}/")
}
