use actix_web::{HttpRequest, HttpResponse, get, post, web};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::presentation::forms::CommentRequest;
use crate::presentation::handlers::Comments;
use crate::presentation::templates::{CommentFormTemplate, render};
use crate::presentation::utils::{
    AuthenticatedUser, post_url, redirect, redirect_if_forbidden, request_id,
};

/// Always lands back on the post; empty comments are dropped silently.
#[post("/posts/{id}/comment/")]
pub async fn add_comment(
    req: HttpRequest,
    user: AuthenticatedUser,
    comments: web::Data<Comments>,
    path: web::Path<Uuid>,
    form: web::Form<CommentRequest>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    match comments.add_comment(post_id, user.id, &form.text).await {
        Ok(comment) => info!(
            request_id = %request_id(&req),
            username = %user.username,
            post_id = %post_id,
            comment_id = %comment.id,
            "comment added"
        ),
        Err(DomainError::Validation(reason)) => debug!(
            request_id = %request_id(&req),
            post_id = %post_id,
            reason = %reason,
            "comment ignored"
        ),
        Err(e) => return Err(e),
    }
    Ok(redirect(&post_url(post_id)))
}

#[get("/posts/{id}/edit_comment/{comment_id}/")]
pub async fn edit_comment_form(
    user: AuthenticatedUser,
    comments: web::Data<Comments>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, DomainError> {
    let (post_id, comment_id) = path.into_inner();
    let comment = match comments.editable_comment(post_id, comment_id, user.id).await {
        Ok(comment) => comment,
        Err(e) => return redirect_if_forbidden(e, &post_url(post_id)),
    };
    render(&CommentFormTemplate {
        current_user: Some(user),
        post_id,
        text: comment.text.clone(),
        comment,
        error: None,
        deleting: false,
    })
}

#[post("/posts/{id}/edit_comment/{comment_id}/")]
pub async fn edit_comment(
    req: HttpRequest,
    user: AuthenticatedUser,
    comments: web::Data<Comments>,
    path: web::Path<(Uuid, Uuid)>,
    form: web::Form<CommentRequest>,
) -> Result<HttpResponse, DomainError> {
    let (post_id, comment_id) = path.into_inner();
    match comments
        .update_comment(post_id, comment_id, user.id, &form.text)
        .await
    {
        Ok(_) => {
            info!(
                request_id = %request_id(&req),
                username = %user.username,
                comment_id = %comment_id,
                "comment updated"
            );
            Ok(redirect(&post_url(post_id)))
        }
        Err(DomainError::Validation(reason)) => {
            let comment = comments
                .editable_comment(post_id, comment_id, user.id)
                .await?;
            render(&CommentFormTemplate {
                current_user: Some(user),
                post_id,
                comment,
                text: form.into_inner().text,
                error: Some(reason),
                deleting: false,
            })
        }
        Err(e) => redirect_if_forbidden(e, &post_url(post_id)),
    }
}

#[get("/posts/{id}/delete_comment/{comment_id}/")]
pub async fn delete_comment_form(
    user: AuthenticatedUser,
    comments: web::Data<Comments>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, DomainError> {
    let (post_id, comment_id) = path.into_inner();
    let comment = match comments.editable_comment(post_id, comment_id, user.id).await {
        Ok(comment) => comment,
        Err(e) => return redirect_if_forbidden(e, &post_url(post_id)),
    };
    render(&CommentFormTemplate {
        current_user: Some(user),
        post_id,
        text: String::new(),
        comment,
        error: None,
        deleting: true,
    })
}

#[post("/posts/{id}/delete_comment/{comment_id}/")]
pub async fn delete_comment(
    req: HttpRequest,
    user: AuthenticatedUser,
    comments: web::Data<Comments>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, DomainError> {
    let (post_id, comment_id) = path.into_inner();
    if let Err(e) = comments.delete_comment(post_id, comment_id, user.id).await {
        return redirect_if_forbidden(e, &post_url(post_id));
    }

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        comment_id = %comment_id,
        "comment deleted"
    );

    Ok(redirect(&post_url(post_id)))
}
