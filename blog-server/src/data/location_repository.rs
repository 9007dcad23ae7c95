use crate::domain::error::DomainError;
use crate::domain::location::Location;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn create(&self, location: Location) -> Result<Location, DomainError>;
    async fn list(&self) -> Result<Vec<Location>, DomainError>;
    async fn set_published(&self, id: Uuid, is_published: bool) -> Result<bool, DomainError>;
    async fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
}

#[derive(Clone)]
pub struct PostgresLocationRepository {
    pool: PgPool,
}

impl PostgresLocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocationRepository for PostgresLocationRepository {
    async fn create(&self, location: Location) -> Result<Location, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO locations (id, name, is_published, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(location.id)
        .bind(&location.name)
        .bind(location.is_published)
        .bind(location.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create location: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })?;

        info!(location_id = %location.id, name = %location.name, "location created");
        Ok(location)
    }

    async fn list(&self) -> Result<Vec<Location>, DomainError> {
        sqlx::query_as::<_, Location>(
            "SELECT id, name, is_published, created_at FROM locations ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while listing locations: {}", e);
            DomainError::Internal(e.to_string())
        })
    }

    async fn set_published(&self, id: Uuid, is_published: bool) -> Result<bool, DomainError> {
        let updated = sqlx::query("UPDATE locations SET is_published = $1 WHERE id = $2")
            .bind(is_published)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        Ok(updated.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        if deleted.rows_affected() > 0 {
            info!(location_id = %id, "location deleted");
        }
        Ok(deleted.rows_affected() > 0)
    }
}
