use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::post::ImageChange;
use crate::infrastructure::media::MediaStorage;
use crate::presentation::forms::{PageQuery, PostForm, collect_multipart};
use crate::presentation::handlers::{Comments, Posts};
use crate::presentation::templates::{
    CategoryTemplate, CommentRow, DetailTemplate, IndexTemplate, PostFormTemplate, render,
};
use crate::presentation::utils::{
    AuthenticatedUser, post_url, profile_url, redirect, redirect_if_forbidden, request_id,
};

#[get("/")]
pub async fn index(
    viewer: Option<AuthenticatedUser>,
    posts: web::Data<Posts>,
    media: web::Data<MediaStorage>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let page = posts.index(query.page.as_deref()).await?;
    render(&IndexTemplate {
        current_user: viewer,
        page,
        media_url: media.url_prefix().to_string(),
    })
}

#[get("/category/{slug}/")]
pub async fn category_posts(
    viewer: Option<AuthenticatedUser>,
    posts: web::Data<Posts>,
    media: web::Data<MediaStorage>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let (category, page) = posts
        .category_posts(&path.into_inner(), query.page.as_deref())
        .await?;
    render(&CategoryTemplate {
        current_user: viewer,
        category,
        page,
        media_url: media.url_prefix().to_string(),
    })
}

#[get("/posts/{id}/")]
pub async fn post_detail(
    viewer: Option<AuthenticatedUser>,
    posts: web::Data<Posts>,
    comments: web::Data<Comments>,
    media: web::Data<MediaStorage>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let id = path.into_inner();
    let viewer_id = viewer.as_ref().map(|u| u.id);
    let post = posts.post_detail(id, viewer_id).await?;
    let comments = comments
        .comments_for(id)
        .await?
        .into_iter()
        .map(|comment| CommentRow {
            can_edit: viewer_id == Some(comment.author_id),
            comment,
        })
        .collect();

    render(&DetailTemplate {
        current_user: viewer,
        is_author: viewer_id == Some(post.author_id),
        post,
        comments,
        comment_text: String::new(),
        media_url: media.url_prefix().to_string(),
    })
}

#[get("/posts/create/")]
pub async fn create_post_form(
    user: AuthenticatedUser,
    posts: web::Data<Posts>,
) -> Result<HttpResponse, DomainError> {
    let (categories, locations) = posts.form_choices().await?;
    render(&PostFormTemplate {
        current_user: Some(user),
        heading: "New post".into(),
        action: "/posts/create/".into(),
        deleting: false,
        form: PostForm::blank(),
        categories,
        locations,
        current_image: None,
    })
}

#[post("/posts/create/")]
pub async fn create_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<Posts>,
    media: web::Data<MediaStorage>,
    payload: Multipart,
) -> Result<HttpResponse, DomainError> {
    let data = collect_multipart(payload, media.max_bytes()).await?;
    let mut form = PostForm::from_parts(data);
    let (categories, locations) = posts.form_choices().await?;

    let Some(draft) = form.validate(&categories, &locations, &media) else {
        debug!(request_id = %request_id(&req), "post form rejected");
        return render(&PostFormTemplate {
            current_user: Some(user),
            heading: "New post".into(),
            action: "/posts/create/".into(),
            deleting: false,
            form,
            categories,
            locations,
            current_image: None,
        });
    };

    let image = match form.image.take() {
        Some(file) => Some(media.save_image(&file).await?),
        None => None,
    };
    let post = posts.create_post(user.id, draft, image).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = %post.id,
        "post created"
    );

    Ok(redirect(&profile_url(&user.username)))
}

#[get("/posts/{id}/edit/")]
pub async fn edit_post_form(
    user: AuthenticatedUser,
    posts: web::Data<Posts>,
    media: web::Data<MediaStorage>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let id = path.into_inner();
    let post = match posts.editable_post(id, user.id).await {
        Ok(post) => post,
        Err(e) => return redirect_if_forbidden(e, &post_url(id)),
    };
    let (categories, locations) = posts.form_choices().await?;

    render(&PostFormTemplate {
        current_user: Some(user),
        heading: "Edit post".into(),
        action: format!("/posts/{id}/edit/"),
        deleting: false,
        form: PostForm::from_post(&post),
        categories,
        locations,
        current_image: post.image.as_deref().map(|image| media.url(image)),
    })
}

#[post("/posts/{id}/edit/")]
pub async fn edit_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<Posts>,
    media: web::Data<MediaStorage>,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> Result<HttpResponse, DomainError> {
    let id = path.into_inner();
    let post = match posts.editable_post(id, user.id).await {
        Ok(post) => post,
        Err(e) => return redirect_if_forbidden(e, &post_url(id)),
    };

    let data = collect_multipart(payload, media.max_bytes()).await?;
    let mut form = PostForm::from_parts(data);
    let (categories, locations) = posts.form_choices().await?;

    let Some(draft) = form.validate(&categories, &locations, &media) else {
        return render(&PostFormTemplate {
            current_user: Some(user),
            heading: "Edit post".into(),
            action: format!("/posts/{id}/edit/"),
            deleting: false,
            form,
            categories,
            locations,
            current_image: post.image.as_deref().map(|image| media.url(image)),
        });
    };

    let image = match form.image.take() {
        Some(file) => ImageChange::Replace(media.save_image(&file).await?),
        None if form.clear_image => ImageChange::Clear,
        None => ImageChange::Keep,
    };
    posts.update_post(post, user.id, draft, image).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = %id,
        "post updated"
    );

    Ok(redirect(&post_url(id)))
}

#[get("/posts/{id}/delete/")]
pub async fn delete_post_form(
    user: AuthenticatedUser,
    posts: web::Data<Posts>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let id = path.into_inner();
    let post = match posts.editable_post(id, user.id).await {
        Ok(post) => post,
        Err(e) => return redirect_if_forbidden(e, &post_url(id)),
    };

    render(&PostFormTemplate {
        current_user: Some(user),
        heading: "Delete post".into(),
        action: format!("/posts/{id}/delete/"),
        deleting: true,
        form: PostForm::from_post(&post),
        categories: Vec::new(),
        locations: Vec::new(),
        current_image: None,
    })
}

#[post("/posts/{id}/delete/")]
pub async fn delete_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<Posts>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let id = path.into_inner();
    if let Err(e) = posts.delete_post(id, user.id).await {
        return redirect_if_forbidden(e, &post_url(id));
    }

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = %id,
        "post deleted"
    );

    Ok(redirect("/"))
}
