use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::application::ensure_author;
use crate::data::comment_repository::CommentRepository;
use crate::data::post_repository::PostRepository;
use crate::domain::comment::{Comment, CommentView, clean_text};
use crate::domain::error::DomainError;

#[derive(Clone)]
pub struct CommentService<C, P>
where
    C: CommentRepository + 'static,
    P: PostRepository + 'static,
{
    comments: Arc<C>,
    posts: Arc<P>,
}

impl<C, P> CommentService<C, P>
where
    C: CommentRepository + 'static,
    P: PostRepository + 'static,
{
    pub fn new(comments: Arc<C>, posts: Arc<P>) -> Self {
        Self { comments, posts }
    }

    /// Comments of a post, oldest first.
    pub async fn comments_for(&self, post_id: Uuid) -> Result<Vec<CommentView>, DomainError> {
        self.comments.list_for_post(post_id).await
    }

    #[instrument(skip(self, text))]
    pub async fn add_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        text: &str,
    ) -> Result<Comment, DomainError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::PostNotFound(post_id))?;
        let text = clean_text(text)?;
        self.comments
            .create(Comment::new(post.id, author_id, text))
            .await
    }

    /// Loads a comment of `post_id` for modification by `editor`.
    pub async fn editable_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        editor: Uuid,
    ) -> Result<Comment, DomainError> {
        let comment = self
            .comments
            .find_by_id(comment_id)
            .await?
            .filter(|comment| comment.post_id == post_id)
            .ok_or(DomainError::CommentNotFound(comment_id))?;
        ensure_author(comment.author_id, editor)?;
        Ok(comment)
    }

    #[instrument(skip(self, text))]
    pub async fn update_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        editor: Uuid,
        text: &str,
    ) -> Result<Comment, DomainError> {
        let mut comment = self.editable_comment(post_id, comment_id, editor).await?;
        let text = clean_text(text)?;
        if !self
            .comments
            .update_text(comment.id, editor, text.clone())
            .await?
        {
            return Err(DomainError::CommentNotFound(comment_id));
        }
        comment.text = text;
        Ok(comment)
    }

    #[instrument(skip(self))]
    pub async fn delete_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        editor: Uuid,
    ) -> Result<(), DomainError> {
        let comment = self.editable_comment(post_id, comment_id, editor).await?;
        if !self.comments.delete(comment.id, editor).await? {
            return Err(DomainError::CommentNotFound(comment_id));
        }
        Ok(())
    }
}
