use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::data::category_repository::CategoryRepository;
use crate::data::location_repository::LocationRepository;
use crate::domain::category::{Category, is_valid_slug};
use crate::domain::error::DomainError;
use crate::domain::location::Location;

const MAX_NAME_LEN: usize = 256;

/// Administration of categories and locations.
#[derive(Clone)]
pub struct CatalogService<C, L>
where
    C: CategoryRepository + 'static,
    L: LocationRepository + 'static,
{
    categories: Arc<C>,
    locations: Arc<L>,
}

impl<C, L> CatalogService<C, L>
where
    C: CategoryRepository + 'static,
    L: LocationRepository + 'static,
{
    pub fn new(categories: Arc<C>, locations: Arc<L>) -> Self {
        Self {
            categories,
            locations,
        }
    }

    #[instrument(skip(self, description))]
    pub async fn create_category(
        &self,
        title: &str,
        description: &str,
        slug: &str,
        is_published: bool,
    ) -> Result<Category, DomainError> {
        let title = required(title, "title")?;
        if !is_valid_slug(slug) {
            return Err(DomainError::Validation(format!(
                "invalid slug '{slug}': use latin letters, digits, hyphen and underscore"
            )));
        }
        let category = Category::new(
            title,
            description.trim().to_string(),
            slug.to_string(),
            is_published,
        );
        self.categories.create(category).await
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        self.categories.list().await
    }

    pub async fn set_category_published(
        &self,
        slug: &str,
        is_published: bool,
    ) -> Result<(), DomainError> {
        if self.categories.set_published(slug, is_published).await? {
            Ok(())
        } else {
            Err(DomainError::CategoryNotFound(slug.to_string()))
        }
    }

    /// Deletes a category; its posts stay and lose the reference.
    pub async fn delete_category(&self, slug: &str) -> Result<(), DomainError> {
        if self.categories.delete(slug).await? {
            Ok(())
        } else {
            Err(DomainError::CategoryNotFound(slug.to_string()))
        }
    }

    #[instrument(skip(self))]
    pub async fn create_location(
        &self,
        name: &str,
        is_published: bool,
    ) -> Result<Location, DomainError> {
        let name = required(name, "name")?;
        self.locations
            .create(Location::new(name, is_published))
            .await
    }

    pub async fn list_locations(&self) -> Result<Vec<Location>, DomainError> {
        self.locations.list().await
    }

    pub async fn set_location_published(
        &self,
        id: Uuid,
        is_published: bool,
    ) -> Result<(), DomainError> {
        if self.locations.set_published(id, is_published).await? {
            Ok(())
        } else {
            Err(DomainError::LocationNotFound(id))
        }
    }

    pub async fn delete_location(&self, id: Uuid) -> Result<(), DomainError> {
        if self.locations.delete(id).await? {
            Ok(())
        } else {
            Err(DomainError::LocationNotFound(id))
        }
    }
}

fn required(value: &str, field: &str) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::Validation(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(value.to_string())
}
