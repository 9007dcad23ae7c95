use actix_web::{HttpRequest, HttpResponse, get, post, web};
use tracing::info;

use crate::domain::error::DomainError;
use crate::infrastructure::media::MediaStorage;
use crate::presentation::forms::{FormErrors, PageQuery, ProfileRequest};
use crate::presentation::handlers::{Auth, Posts};
use crate::presentation::templates::{ProfileEditTemplate, ProfileTemplate, render};
use crate::presentation::utils::{
    AuthenticatedUser, SessionSettings, found, profile_url, request_id, session_cookie,
};

#[get("/profile/{username}/")]
pub async fn profile(
    viewer: Option<AuthenticatedUser>,
    auth: web::Data<Auth>,
    posts: web::Data<Posts>,
    media: web::Data<MediaStorage>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let profile = auth.get_by_username(&path.into_inner()).await?;
    let viewer_id = viewer.as_ref().map(|u| u.id);
    let page = posts
        .author_posts(profile.id, viewer_id, query.page.as_deref())
        .await?;

    render(&ProfileTemplate {
        current_user: viewer,
        is_owner: viewer_id == Some(profile.id),
        profile,
        page,
        media_url: media.url_prefix().to_string(),
    })
}

#[get("/profile/edit/")]
pub async fn edit_profile_form(
    user: AuthenticatedUser,
    auth: web::Data<Auth>,
) -> Result<HttpResponse, DomainError> {
    let me = auth.get_user(user.id).await?;
    render(&ProfileEditTemplate {
        current_user: Some(user),
        form: ProfileRequest::from(&me),
        errors: FormErrors::default(),
    })
}

#[post("/profile/edit/")]
pub async fn edit_profile(
    req: HttpRequest,
    user: AuthenticatedUser,
    auth: web::Data<Auth>,
    settings: web::Data<SessionSettings>,
    form: web::Form<ProfileRequest>,
) -> Result<HttpResponse, DomainError> {
    let form = form.into_inner();
    let update = match form.validate() {
        Ok(update) => update,
        Err(errors) => {
            return render(&ProfileEditTemplate {
                current_user: Some(user),
                form,
                errors,
            });
        }
    };

    match auth.update_profile(user.id, update).await {
        Ok((me, token)) => {
            info!(
                request_id = %request_id(&req),
                user_id = %me.id,
                username = %me.username,
                "profile updated"
            );
            Ok(found(&profile_url(&me.username))
                .cookie(session_cookie(token, &settings))
                .finish())
        }
        Err(DomainError::UserAlreadyExists(_)) => {
            let mut errors = FormErrors::default();
            errors.add("username", "A user with that username already exists.");
            render(&ProfileEditTemplate {
                current_user: Some(user),
                form,
                errors,
            })
        }
        Err(e) => Err(e),
    }
}
