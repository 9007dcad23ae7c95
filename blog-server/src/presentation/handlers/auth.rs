use actix_web::{HttpRequest, HttpResponse, Scope, get, post, web};
use tracing::{info, warn};

use crate::domain::error::DomainError;
use crate::presentation::forms::{FormErrors, LoginRequest, NextQuery, RegisterRequest, safe_next};
use crate::presentation::handlers::Auth;
use crate::presentation::templates::{LoginTemplate, RegistrationTemplate, render};
use crate::presentation::utils::{
    AuthenticatedUser, SessionSettings, clear_session_cookie, found, profile_url, redirect,
    request_id, session_cookie,
};

pub fn scope() -> Scope {
    web::scope("/auth")
        .service(login_form)
        .service(login)
        .service(logout)
        .service(registration_form)
        .service(registration)
}

#[get("/login/")]
pub async fn login_form(
    viewer: Option<AuthenticatedUser>,
    query: web::Query<NextQuery>,
) -> Result<HttpResponse, DomainError> {
    render(&LoginTemplate {
        current_user: viewer,
        username: String::new(),
        next: safe_next(query.next.as_deref()).unwrap_or_default(),
        error: None,
    })
}

#[post("/login/")]
pub async fn login(
    req: HttpRequest,
    auth: web::Data<Auth>,
    settings: web::Data<SessionSettings>,
    form: web::Form<LoginRequest>,
) -> Result<HttpResponse, DomainError> {
    let form = form.into_inner();
    let username = form.username.trim();
    let next = safe_next(form.next.as_deref());

    match auth.login(username, &form.password).await {
        Ok((user, token)) => {
            info!(request_id = %request_id(&req), user_id = %user.id, "user logged in");
            let target = next.unwrap_or_else(|| profile_url(&user.username));
            Ok(found(&target)
                .cookie(session_cookie(token, &settings))
                .finish())
        }
        Err(DomainError::Unauthorized) => {
            warn!(request_id = %request_id(&req), username = %username, "failed login attempt");
            render(&LoginTemplate {
                current_user: None,
                username: username.to_string(),
                next: next.unwrap_or_default(),
                error: Some(
                    "Please enter a correct username and password. Note that both fields may be case-sensitive."
                        .into(),
                ),
            })
        }
        Err(e) => Err(e),
    }
}

#[post("/logout/")]
pub async fn logout(req: HttpRequest, viewer: Option<AuthenticatedUser>) -> HttpResponse {
    if let Some(user) = viewer {
        info!(request_id = %request_id(&req), user_id = %user.id, "user logged out");
    }
    found("/").cookie(clear_session_cookie()).finish()
}

#[get("/registration/")]
pub async fn registration_form(
    viewer: Option<AuthenticatedUser>,
) -> Result<HttpResponse, DomainError> {
    render(&RegistrationTemplate {
        current_user: viewer,
        form: RegisterRequest::default(),
        errors: FormErrors::default(),
    })
}

#[post("/registration/")]
pub async fn registration(
    req: HttpRequest,
    auth: web::Data<Auth>,
    form: web::Form<RegisterRequest>,
) -> Result<HttpResponse, DomainError> {
    let form = form.into_inner();
    let registration = match form.validate() {
        Ok(registration) => registration,
        Err(errors) => {
            return render(&RegistrationTemplate {
                current_user: None,
                form: blank_passwords(form),
                errors,
            });
        }
    };

    match auth
        .register(registration.username, registration.email, registration.password)
        .await
    {
        Ok(user) => {
            info!(
                request_id = %request_id(&req),
                user_id = %user.id,
                username = %user.username,
                "user registered"
            );
            Ok(redirect("/auth/login/"))
        }
        Err(DomainError::UserAlreadyExists(_)) => {
            let mut errors = FormErrors::default();
            errors.add("username", "A user with that username already exists.");
            render(&RegistrationTemplate {
                current_user: None,
                form: blank_passwords(form),
                errors,
            })
        }
        Err(e) => Err(e),
    }
}

/// Passwords are never echoed back into a re-rendered form.
fn blank_passwords(form: RegisterRequest) -> RegisterRequest {
    RegisterRequest {
        password1: String::new(),
        password2: String::new(),
        ..form
    }
}
