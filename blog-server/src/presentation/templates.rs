use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use askama::Template;
use tracing::error;
use uuid::Uuid;

use crate::domain::category::Category;
use crate::domain::comment::{Comment, CommentView};
use crate::domain::error::DomainError;
use crate::domain::location::Location;
use crate::domain::pagination::Page;
use crate::domain::post::PostView;
use crate::domain::user::User;
use crate::presentation::forms::{FormErrors, PostForm, ProfileRequest, RegisterRequest};
use crate::presentation::utils::AuthenticatedUser;

// Every page extends base.html, which reads `current_user`.

#[derive(Template)]
#[template(path = "blog/index.html")]
pub struct IndexTemplate {
    pub current_user: Option<AuthenticatedUser>,
    pub page: Page<PostView>,
    pub media_url: String,
}

#[derive(Template)]
#[template(path = "blog/category.html")]
pub struct CategoryTemplate {
    pub current_user: Option<AuthenticatedUser>,
    pub category: Category,
    pub page: Page<PostView>,
    pub media_url: String,
}

#[derive(Template)]
#[template(path = "blog/profile.html")]
pub struct ProfileTemplate {
    pub current_user: Option<AuthenticatedUser>,
    pub profile: User,
    pub is_owner: bool,
    pub page: Page<PostView>,
    pub media_url: String,
}

/// A comment plus whether the viewer may change it.
pub struct CommentRow {
    pub comment: CommentView,
    pub can_edit: bool,
}

#[derive(Template)]
#[template(path = "blog/detail.html")]
pub struct DetailTemplate {
    pub current_user: Option<AuthenticatedUser>,
    pub post: PostView,
    pub is_author: bool,
    pub comments: Vec<CommentRow>,
    pub comment_text: String,
    pub media_url: String,
}

/// Create, edit and delete-confirmation pages for a post.
#[derive(Template)]
#[template(path = "blog/create.html")]
pub struct PostFormTemplate {
    pub current_user: Option<AuthenticatedUser>,
    pub heading: String,
    pub action: String,
    pub deleting: bool,
    pub form: PostForm,
    pub categories: Vec<Category>,
    pub locations: Vec<Location>,
    pub current_image: Option<String>,
}

#[derive(Template)]
#[template(path = "blog/comment.html")]
pub struct CommentFormTemplate {
    pub current_user: Option<AuthenticatedUser>,
    pub post_id: Uuid,
    pub comment: Comment,
    pub text: String,
    pub error: Option<String>,
    pub deleting: bool,
}

#[derive(Template)]
#[template(path = "blog/user.html")]
pub struct ProfileEditTemplate {
    pub current_user: Option<AuthenticatedUser>,
    pub form: ProfileRequest,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "registration/login.html")]
pub struct LoginTemplate {
    pub current_user: Option<AuthenticatedUser>,
    pub username: String,
    pub next: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "registration/registration_form.html")]
pub struct RegistrationTemplate {
    pub current_user: Option<AuthenticatedUser>,
    pub form: RegisterRequest,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "pages/404.html")]
pub struct NotFoundTemplate {
    pub current_user: Option<AuthenticatedUser>,
}

#[derive(Template)]
#[template(path = "pages/403csrf.html")]
pub struct CsrfFailureTemplate {
    pub current_user: Option<AuthenticatedUser>,
    pub reason: String,
}

#[derive(Template)]
#[template(path = "pages/500.html")]
pub struct ServerErrorTemplate {
    pub current_user: Option<AuthenticatedUser>,
}

#[derive(Template)]
#[template(path = "pages/error.html")]
pub struct ErrorTemplate {
    pub current_user: Option<AuthenticatedUser>,
    pub code: u16,
    pub title: String,
    pub message: String,
}

pub fn render<T: Template>(template: &T) -> Result<HttpResponse, DomainError> {
    let body = template.render().map_err(|e| {
        error!("template rendering failed: {}", e);
        DomainError::Internal(e.to_string())
    })?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}

/// HTML body for an error response. Falls back to plain text if the
/// template itself fails.
pub fn render_error_page(status: StatusCode, err: &DomainError) -> String {
    let rendered = match (status, err) {
        (StatusCode::NOT_FOUND, _) => NotFoundTemplate { current_user: None }.render(),
        (_, DomainError::Csrf(reason)) => CsrfFailureTemplate {
            current_user: None,
            reason: reason.clone(),
        }
        .render(),
        (StatusCode::INTERNAL_SERVER_ERROR, _) => {
            ServerErrorTemplate { current_user: None }.render()
        }
        _ => ErrorTemplate {
            current_user: None,
            code: status.as_u16(),
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            message: err.to_string(),
        }
        .render(),
    };

    rendered.unwrap_or_else(|e| {
        error!("error page rendering failed: {}", e);
        format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Error")
        )
    })
}
