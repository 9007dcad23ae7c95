use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;

use crate::application::ensure_author;
use crate::data::category_repository::CategoryRepository;
use crate::data::location_repository::LocationRepository;
use crate::data::post_repository::PostRepository;
use crate::domain::category::Category;
use crate::domain::error::DomainError;
use crate::domain::location::Location;
use crate::domain::pagination::{POSTS_PER_PAGE, Page, Paginator};
use crate::domain::post::{ImageChange, Post, PostDraft, PostFilter, PostView};

#[derive(Clone)]
pub struct PostService<P, C, L>
where
    P: PostRepository + 'static,
    C: CategoryRepository + 'static,
    L: LocationRepository + 'static,
{
    posts: Arc<P>,
    categories: Arc<C>,
    locations: Arc<L>,
}

impl<P, C, L> PostService<P, C, L>
where
    P: PostRepository + 'static,
    C: CategoryRepository + 'static,
    L: LocationRepository + 'static,
{
    pub fn new(posts: Arc<P>, categories: Arc<C>, locations: Arc<L>) -> Self {
        Self {
            posts,
            categories,
            locations,
        }
    }

    async fn paginate(
        &self,
        filter: PostFilter,
        page: Option<&str>,
    ) -> Result<Page<PostView>, DomainError> {
        let total = self.posts.count(&filter).await?;
        let paginator = Paginator::new(total, POSTS_PER_PAGE);
        let number = paginator.resolve(page);
        let items = self
            .posts
            .list(&filter, paginator.limit(), paginator.offset(number))
            .await?;
        Ok(paginator.page(number, items))
    }

    /// Home page: every publicly visible post, newest first.
    pub async fn index(&self, page: Option<&str>) -> Result<Page<PostView>, DomainError> {
        self.paginate(PostFilter::public(Utc::now()), page).await
    }

    pub async fn category_posts(
        &self,
        slug: &str,
        page: Option<&str>,
    ) -> Result<(Category, Page<PostView>), DomainError> {
        let category = self
            .categories
            .find_by_slug(slug)
            .await?
            .filter(|category| category.is_published)
            .ok_or_else(|| DomainError::CategoryNotFound(slug.to_string()))?;

        let filter = PostFilter::public(Utc::now()).in_category(category.id);
        let page = self.paginate(filter, page).await?;
        Ok((category, page))
    }

    /// Posts of one author. The author sees everything, other viewers only
    /// what is publicly visible.
    pub async fn author_posts(
        &self,
        author_id: Uuid,
        viewer: Option<Uuid>,
        page: Option<&str>,
    ) -> Result<Page<PostView>, DomainError> {
        let filter = if viewer == Some(author_id) {
            PostFilter::default()
        } else {
            PostFilter::public(Utc::now())
        };
        self.paginate(filter.by_author(author_id), page).await
    }

    pub async fn post_detail(
        &self,
        id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<PostView, DomainError> {
        let post = self
            .posts
            .find_view(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))?;

        if viewer != Some(post.author_id) && !post.is_public_at(Utc::now()) {
            return Err(DomainError::PostNotFound(id));
        }
        Ok(post)
    }

    /// Categories and locations offered by the post form.
    pub async fn form_choices(&self) -> Result<(Vec<Category>, Vec<Location>), DomainError> {
        let categories = self.categories.list().await?;
        let locations = self.locations.list().await?;
        Ok((categories, locations))
    }

    #[instrument(skip(self, draft))]
    pub async fn create_post(
        &self,
        author_id: Uuid,
        draft: PostDraft,
        image: Option<String>,
    ) -> Result<Post, DomainError> {
        let post = Post::new(author_id, draft, image);
        self.posts.create(post).await
    }

    /// Loads a post for modification by `editor`; `Forbidden` if they are not its author.
    pub async fn editable_post(&self, id: Uuid, editor: Uuid) -> Result<Post, DomainError> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))?;
        ensure_author(post.author_id, editor)?;
        Ok(post)
    }

    #[instrument(skip(self, post, draft), fields(post_id = %post.id))]
    pub async fn update_post(
        &self,
        mut post: Post,
        editor: Uuid,
        draft: PostDraft,
        image: ImageChange,
    ) -> Result<Post, DomainError> {
        ensure_author(post.author_id, editor)?;
        post.apply(draft, image);
        if !self.posts.update(&post).await? {
            return Err(DomainError::PostNotFound(post.id));
        }
        Ok(post)
    }

    #[instrument(skip(self))]
    pub async fn delete_post(&self, id: Uuid, editor: Uuid) -> Result<(), DomainError> {
        let post = self.editable_post(id, editor).await?;
        if !self.posts.delete(post.id, editor).await? {
            return Err(DomainError::PostNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::category_repository::MockCategoryRepository;
    use crate::data::location_repository::MockLocationRepository;
    use crate::data::post_repository::MockPostRepository;
    use crate::domain::post::fixtures::{draft, public_view};
    use chrono::Duration;
    use mockall::predicate::eq;

    type Service = PostService<MockPostRepository, MockCategoryRepository, MockLocationRepository>;

    fn service(posts: MockPostRepository, categories: MockCategoryRepository) -> Service {
        PostService::new(
            Arc::new(posts),
            Arc::new(categories),
            Arc::new(MockLocationRepository::new()),
        )
    }

    fn views(n: usize) -> Vec<PostView> {
        (0..n).map(|_| public_view(Uuid::new_v4())).collect()
    }

    #[tokio::test]
    async fn index_pages_through_public_posts() {
        let mut posts = MockPostRepository::new();
        posts
            .expect_count()
            .withf(|filter| filter.visible_at.is_some() && filter.author_id.is_none())
            .returning(|_| Ok(25));
        posts
            .expect_list()
            .withf(|filter, limit, offset| {
                filter.visible_at.is_some() && *limit == 10 && *offset == 20
            })
            .returning(|_, _, _| Ok(views(5)));

        let page = service(posts, MockCategoryRepository::new())
            .index(Some("3"))
            .await
            .unwrap();
        assert_eq!(page.number, 3);
        assert_eq!(page.num_pages, 3);
        assert_eq!(page.items.len(), 5);
        assert!(!page.has_next());
    }

    #[tokio::test]
    async fn index_clamps_out_of_range_page() {
        let mut posts = MockPostRepository::new();
        posts.expect_count().returning(|_| Ok(12));
        posts
            .expect_list()
            .withf(|_, _, offset| *offset == 10)
            .returning(|_, _, _| Ok(views(2)));

        let page = service(posts, MockCategoryRepository::new())
            .index(Some("40"))
            .await
            .unwrap();
        assert_eq!(page.number, 2);
    }

    #[tokio::test]
    async fn unpublished_category_is_not_found() {
        let mut categories = MockCategoryRepository::new();
        categories.expect_find_by_slug().with(eq("hidden")).returning(|slug| {
            Ok(Some(Category::new(
                "Hidden".into(),
                String::new(),
                slug.to_string(),
                false,
            )))
        });
        let mut posts = MockPostRepository::new();
        posts.expect_count().times(0);

        let err = service(posts, categories)
            .category_posts("hidden", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::CategoryNotFound(_)));
    }

    #[tokio::test]
    async fn category_listing_is_scoped_and_filtered() {
        let category = Category::new("Travel".into(), String::new(), "travel".into(), true);
        let category_id = category.id;
        let mut categories = MockCategoryRepository::new();
        categories
            .expect_find_by_slug()
            .returning(move |_| Ok(Some(category.clone())));
        let mut posts = MockPostRepository::new();
        posts
            .expect_count()
            .withf(move |filter| {
                filter.visible_at.is_some() && filter.category_id == Some(category_id)
            })
            .returning(|_| Ok(1));
        posts.expect_list().returning(|_, _, _| Ok(views(1)));

        let (found, page) = service(posts, categories)
            .category_posts("travel", None)
            .await
            .unwrap();
        assert_eq!(found.id, category_id);
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn author_sees_own_hidden_posts_but_others_do_not() {
        let author = Uuid::new_v4();
        let mut posts = MockPostRepository::new();
        posts
            .expect_count()
            .withf(move |filter| filter.author_id == Some(author) && filter.visible_at.is_none())
            .times(1)
            .returning(|_| Ok(0));
        posts
            .expect_count()
            .withf(move |filter| filter.author_id == Some(author) && filter.visible_at.is_some())
            .times(1)
            .returning(|_| Ok(0));
        posts.expect_list().returning(|_, _, _| Ok(Vec::new()));

        let service = service(posts, MockCategoryRepository::new());
        service.author_posts(author, Some(author), None).await.unwrap();
        service
            .author_posts(author, Some(Uuid::new_v4()), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn detail_hides_unpublished_post_from_strangers_only() {
        let author = Uuid::new_v4();
        let mut hidden = public_view(author);
        hidden.is_published = false;
        let id = hidden.id;

        let mut posts = MockPostRepository::new();
        posts
            .expect_find_view()
            .with(eq(id))
            .returning(move |_| Ok(Some(hidden.clone())));
        let service = service(posts, MockCategoryRepository::new());

        assert!(service.post_detail(id, Some(author)).await.is_ok());
        assert!(matches!(
            service.post_detail(id, None).await,
            Err(DomainError::PostNotFound(_))
        ));
        assert!(matches!(
            service.post_detail(id, Some(Uuid::new_v4())).await,
            Err(DomainError::PostNotFound(_))
        ));
    }

    #[tokio::test]
    async fn detail_hides_future_post() {
        let mut future = public_view(Uuid::new_v4());
        future.pub_date = Utc::now() + Duration::days(3);
        let id = future.id;

        let mut posts = MockPostRepository::new();
        posts
            .expect_find_view()
            .returning(move |_| Ok(Some(future.clone())));

        let result = service(posts, MockCategoryRepository::new())
            .post_detail(id, None)
            .await;
        assert!(matches!(result, Err(DomainError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn missing_post_is_not_found() {
        let mut posts = MockPostRepository::new();
        posts.expect_find_view().returning(|_| Ok(None));

        let result = service(posts, MockCategoryRepository::new())
            .post_detail(Uuid::new_v4(), None)
            .await;
        assert!(matches!(result, Err(DomainError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn create_assigns_author() {
        let author = Uuid::new_v4();
        let mut posts = MockPostRepository::new();
        posts
            .expect_create()
            .withf(move |post| post.author_id == author && post.image.is_none())
            .times(1)
            .returning(Ok);

        let post = service(posts, MockCategoryRepository::new())
            .create_post(author, draft(), None)
            .await
            .unwrap();
        assert_eq!(post.author_id, author);
    }

    #[tokio::test]
    async fn stranger_cannot_edit_or_delete_post() {
        let post = Post::new(Uuid::new_v4(), draft(), None);
        let id = post.id;
        let mut posts = MockPostRepository::new();
        posts
            .expect_find_by_id()
            .returning(move |_| Ok(Some(post.clone())));
        posts.expect_update().times(0);
        posts.expect_delete().times(0);

        let service = service(posts, MockCategoryRepository::new());
        let stranger = Uuid::new_v4();
        assert!(matches!(
            service.editable_post(id, stranger).await,
            Err(DomainError::Forbidden)
        ));
        assert!(matches!(
            service.delete_post(id, stranger).await,
            Err(DomainError::Forbidden)
        ));

        let loaded = Post::new(Uuid::new_v4(), draft(), None);
        assert!(matches!(
            service
                .update_post(loaded, stranger, draft(), ImageChange::Keep)
                .await,
            Err(DomainError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn author_updates_and_deletes_post() {
        let author = Uuid::new_v4();
        let post = Post::new(author, draft(), Some("images/a.png".into()));
        let id = post.id;
        let stored = post.clone();

        let mut posts = MockPostRepository::new();
        posts
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        posts
            .expect_update()
            .withf(|post| post.title == "Edited" && post.image.is_none())
            .times(1)
            .returning(|_| Ok(true));
        posts
            .expect_delete()
            .with(eq(id), eq(author))
            .times(1)
            .returning(|_, _| Ok(true));

        let service = service(posts, MockCategoryRepository::new());
        let mut edited = draft();
        edited.title = "Edited".into();
        let updated = service
            .update_post(post, author, edited, ImageChange::Clear)
            .await
            .unwrap();
        assert_eq!(updated.title, "Edited");

        service.delete_post(id, author).await.unwrap();
    }
}
