use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub location_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

/// Validated post content coming from the create/edit form.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub location_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub is_published: bool,
}

/// What an edit does to the stored image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageChange {
    #[default]
    Keep,
    Clear,
    Replace(String),
}

impl Post {
    pub fn new(author_id: Uuid, draft: PostDraft, image: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            text: draft.text,
            pub_date: draft.pub_date,
            image,
            is_published: draft.is_published,
            created_at: Utc::now(),
            author_id,
            location_id: draft.location_id,
            category_id: draft.category_id,
        }
    }

    pub fn apply(&mut self, draft: PostDraft, image: ImageChange) {
        self.title = draft.title;
        self.text = draft.text;
        self.pub_date = draft.pub_date;
        self.location_id = draft.location_id;
        self.category_id = draft.category_id;
        self.is_published = draft.is_published;
        match image {
            ImageChange::Keep => {}
            ImageChange::Clear => self.image = None,
            ImageChange::Replace(path) => self.image = Some(path),
        }
    }
}

/// A post joined with everything a listing or detail page shows.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_username: String,
    pub category_id: Option<Uuid>,
    pub category_title: Option<String>,
    pub category_slug: Option<String>,
    pub category_is_published: Option<bool>,
    pub location_id: Option<Uuid>,
    /// Only set when the location itself is published.
    pub location_name: Option<String>,
    pub comment_count: i64,
}

impl PostView {
    /// The public visibility rule: the post is published, its publish date has
    /// passed and it sits in a published category.
    pub fn is_public_at(&self, now: DateTime<Utc>) -> bool {
        self.is_published && self.pub_date <= now && self.category_is_published == Some(true)
    }

    /// First `words` words of the text, with an ellipsis when truncated.
    pub fn excerpt(&self, words: usize) -> String {
        let mut iter = self.text.split_whitespace();
        let head: Vec<&str> = iter.by_ref().take(words).collect();
        if iter.next().is_some() {
            format!("{} …", head.join(" "))
        } else {
            head.join(" ")
        }
    }
}

/// Conditions composed into post listing queries.
///
/// `visible_at` switches on the public visibility rule evaluated at that
/// instant; the other fields narrow the listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter {
    pub visible_at: Option<DateTime<Utc>>,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
}

impl PostFilter {
    pub fn public(now: DateTime<Utc>) -> Self {
        Self {
            visible_at: Some(now),
            ..Self::default()
        }
    }

    pub fn in_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn by_author(mut self, author_id: Uuid) -> Self {
        self.author_id = Some(author_id);
        self
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::Duration;

    pub fn public_view(author_id: Uuid) -> PostView {
        PostView {
            id: Uuid::new_v4(),
            title: "Morning in the mountains".into(),
            text: "We left the camp before sunrise".into(),
            pub_date: Utc::now() - Duration::hours(1),
            image: None,
            is_published: true,
            created_at: Utc::now() - Duration::hours(2),
            author_id,
            author_username: "author".into(),
            category_id: Some(Uuid::new_v4()),
            category_title: Some("Travel".into()),
            category_slug: Some("travel".into()),
            category_is_published: Some(true),
            location_id: None,
            location_name: None,
            comment_count: 0,
        }
    }

    pub fn draft() -> PostDraft {
        PostDraft {
            title: "Morning in the mountains".into(),
            text: "We left the camp before sunrise".into(),
            pub_date: Utc::now() - Duration::hours(1),
            location_id: None,
            category_id: None,
            is_published: true,
        }
    }
}
