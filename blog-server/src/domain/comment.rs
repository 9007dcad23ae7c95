use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(post_id: Uuid, author_id: Uuid, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            post_id,
            author_id,
            created_at: Utc::now(),
        }
    }
}

/// A comment joined with its author's username, as shown under a post.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CommentView {
    pub id: Uuid,
    pub text: String,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
}

/// Trims comment text; blank text is a validation error.
pub fn clean_text(raw: &str) -> Result<String, DomainError> {
    let text = raw.trim();
    if text.is_empty() {
        Err(DomainError::Validation("comment text is required".to_string()))
    } else {
        Ok(text.to_string())
    }
}
