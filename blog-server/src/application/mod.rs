pub mod auth_service;
pub mod catalog_service;
pub mod comment_service;
pub mod post_service;

use uuid::Uuid;

use crate::domain::error::DomainError;

pub fn ensure_author(author_id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
    if author_id != user_id {
        Err(DomainError::Forbidden)
    } else {
        Ok(())
    }
}
