pub mod category_repository;
pub mod comment_repository;
pub mod location_repository;
pub mod post_repository;
pub mod user_repository;

/// True when `err` is a unique-constraint violation on `constraint`.
pub(crate) fn violates_constraint(err: &sqlx::Error, constraint: &str) -> bool {
    err.as_database_error()
        .and_then(|db| db.constraint())
        .map(|name| name == constraint)
        == Some(true)
}
