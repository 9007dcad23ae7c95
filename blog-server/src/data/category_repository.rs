use crate::domain::category::Category;
use crate::domain::error::DomainError;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};

use super::violates_constraint;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, category: Category) -> Result<Category, DomainError>;
    async fn list(&self) -> Result<Vec<Category>, DomainError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, DomainError>;
    async fn set_published(&self, slug: &str, is_published: bool) -> Result<bool, DomainError>;
    async fn delete(&self, slug: &str) -> Result<bool, DomainError>;
}

#[derive(Clone)]
pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn create(&self, category: Category) -> Result<Category, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, title, description, slug, is_published, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(category.id)
        .bind(&category.title)
        .bind(&category.description)
        .bind(&category.slug)
        .bind(category.is_published)
        .bind(category.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if violates_constraint(&e, "categories_slug_key") {
                DomainError::Validation(format!("slug '{}' is already taken", category.slug))
            } else {
                error!("failed to create category: {}", e);
                DomainError::Internal(format!("database error: {}", e))
            }
        })?;

        info!(category_id = %category.id, slug = %category.slug, "category created");
        Ok(category)
    }

    async fn list(&self) -> Result<Vec<Category>, DomainError> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, title, description, slug, is_published, created_at
            FROM categories
            ORDER BY title
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while listing categories: {}", e);
            DomainError::Internal(e.to_string())
        })
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, DomainError> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, title, description, slug, is_published, created_at
            FROM categories WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("db error find_by_slug {}: {}", slug, e);
            DomainError::Internal(e.to_string())
        })
    }

    async fn set_published(&self, slug: &str, is_published: bool) -> Result<bool, DomainError> {
        let updated = sqlx::query("UPDATE categories SET is_published = $1 WHERE slug = $2")
            .bind(is_published)
            .bind(slug)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        if updated.rows_affected() > 0 {
            info!(slug = %slug, is_published, "category visibility changed");
        }
        Ok(updated.rows_affected() > 0)
    }

    async fn delete(&self, slug: &str) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM categories WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        if deleted.rows_affected() > 0 {
            info!(slug = %slug, "category deleted");
        }
        Ok(deleted.rows_affected() > 0)
    }
}
