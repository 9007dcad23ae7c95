use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostFilter, PostView};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{error, info};
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: Post) -> Result<Post, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, DomainError>;
    async fn find_view(&self, id: Uuid) -> Result<Option<PostView>, DomainError>;
    async fn count(&self, filter: &PostFilter) -> Result<i64, DomainError>;
    async fn list(
        &self,
        filter: &PostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostView>, DomainError>;
    /// Writes back an edited post; only matches when `post.author_id` still owns it.
    async fn update(&self, post: &Post) -> Result<bool, DomainError>;
    async fn delete(&self, id: Uuid, author_id: Uuid) -> Result<bool, DomainError>;
}

const POST_VIEW_SELECT: &str = r#"
    SELECT
        p.id, p.title, p.text, p.pub_date, p.image, p.is_published, p.created_at,
        p.author_id, u.username AS author_username,
        p.category_id, c.title AS category_title, c.slug AS category_slug,
        c.is_published AS category_is_published,
        p.location_id, CASE WHEN l.is_published THEN l.name END AS location_name,
        (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN categories c ON c.id = p.category_id
    LEFT JOIN locations l ON l.id = p.location_id
"#;

const POST_COUNT_SELECT: &str = r#"
    SELECT COUNT(*)
    FROM posts p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

/// Appends the WHERE clause for `filter`. A post without a category never
/// passes the visibility condition since `c.is_published` is NULL for it.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    builder.push(" WHERE TRUE");
    if let Some(now) = filter.visible_at {
        builder
            .push(" AND p.is_published AND c.is_published AND p.pub_date <= ")
            .push_bind(now);
    }
    if let Some(category_id) = filter.category_id {
        builder.push(" AND p.category_id = ").push_bind(category_id);
    }
    if let Some(author_id) = filter.author_id {
        builder.push(" AND p.author_id = ").push_bind(author_id);
    }
}

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, post: Post) -> Result<Post, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO posts
                (id, title, text, pub_date, image, is_published, created_at,
                 author_id, location_id, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.text)
        .bind(post.pub_date)
        .bind(&post.image)
        .bind(post.is_published)
        .bind(post.created_at)
        .bind(post.author_id)
        .bind(post.location_id)
        .bind(post.category_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create post: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })?;

        info!(post_id = %post.id, author_id = %post.author_id, "post created");
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, DomainError> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, text, pub_date, image, is_published, created_at,
                   author_id, location_id, category_id
            FROM posts WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("db error find_by_id {}: {}", id, e);
            DomainError::Internal(e.to_string())
        })
    }

    async fn find_view(&self, id: Uuid) -> Result<Option<PostView>, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new(POST_VIEW_SELECT);
        builder.push(" WHERE p.id = ").push_bind(id);

        builder
            .build_query_as::<PostView>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("db error find_view {}: {}", id, e);
                DomainError::Internal(e.to_string())
            })
    }

    async fn count(&self, filter: &PostFilter) -> Result<i64, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new(POST_COUNT_SELECT);
        push_filter(&mut builder, filter);

        builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("db error while counting posts: {}", e);
                DomainError::Internal(e.to_string())
            })
    }

    async fn list(
        &self,
        filter: &PostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostView>, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new(POST_VIEW_SELECT);
        push_filter(&mut builder, filter);
        builder
            .push(" ORDER BY p.pub_date DESC, p.created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        builder
            .build_query_as::<PostView>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("db error while fetching posts: {}", e);
                DomainError::Internal(e.to_string())
            })
    }

    async fn update(&self, post: &Post) -> Result<bool, DomainError> {
        let updated = sqlx::query(
            r#"
            UPDATE posts
            SET title = $1, text = $2, pub_date = $3, image = $4, is_published = $5,
                location_id = $6, category_id = $7
            WHERE id = $8 AND author_id = $9
            "#,
        )
        .bind(&post.title)
        .bind(&post.text)
        .bind(post.pub_date)
        .bind(&post.image)
        .bind(post.is_published)
        .bind(post.location_id)
        .bind(post.category_id)
        .bind(post.id)
        .bind(post.author_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to update post {}: {}", post.id, e);
            DomainError::Internal(e.to_string())
        })?;

        if updated.rows_affected() > 0 {
            info!(post_id = %post.id, "post updated");
        }
        Ok(updated.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1 AND author_id = $2")
            .bind(id)
            .bind(author_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        if deleted.rows_affected() > 0 {
            info!(post_id = %id, "post deleted");
        }
        Ok(deleted.rows_affected() > 0)
    }
}
