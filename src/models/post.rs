use super::{Category, Tag, UserSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const TITLE_MAX_LEN: usize = 70;
pub const EXCERPT_MAX_LEN: usize = 300;

/// A persisted post row. `tag_ids` is always present, empty when untagged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub created_time: DateTime<Utc>,
    pub modified_time: DateTime<Utc>,
    pub excerpt: String,
    pub category_id: i64,
    pub author_id: i64,
    pub tag_ids: Vec<i64>,
    pub views: u32,
    pub img: Option<String>,
}

/// Editable state of a post before it is saved.
///
/// `id` is `None` for a post that has never been persisted. The timestamp
/// fields are accepted so round-tripped posts deserialize, but saving always
/// overwrites them. The stored view count is left alone unless
/// `views_override` is set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostDraft {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub excerpt: String,
    pub category_id: i64,
    pub author_id: i64,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    #[serde(default)]
    pub views_override: Option<u32>,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_time: Option<DateTime<Utc>>,
}

impl PostDraft {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        category_id: i64,
        author_id: i64,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            category_id,
            author_id,
            ..Default::default()
        }
    }

    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = excerpt.into();
        self
    }

    pub fn with_tags(mut self, tag_ids: Vec<i64>) -> Self {
        self.tag_ids = tag_ids;
        self
    }

    pub fn with_img(mut self, img: impl Into<String>) -> Self {
        self.img = Some(img.into());
        self
    }
}

impl From<Post> for PostDraft {
    fn from(post: Post) -> Self {
        Self {
            id: Some(post.id),
            title: post.title,
            body: post.body,
            excerpt: post.excerpt,
            category_id: post.category_id,
            author_id: post.author_id,
            tag_ids: post.tag_ids,
            views_override: None,
            img: post.img,
            created_time: Some(post.created_time),
            modified_time: Some(post.modified_time),
        }
    }
}

/// A draft after timestamps are stamped and the excerpt is filled in; the
/// only thing left is handing it to a store.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPost {
    pub id: Option<i64>,
    pub title: String,
    pub body: String,
    pub created_time: DateTime<Utc>,
    pub modified_time: DateTime<Utc>,
    pub excerpt: String,
    pub category_id: i64,
    pub author_id: i64,
    pub tag_ids: Vec<i64>,
    /// Written to the row only when set; new posts start from zero otherwise.
    pub views_override: Option<u32>,
    pub img: Option<String>,
}

impl PreparedPost {
    /// `views` is the count the store holds after the commit.
    pub fn into_post(self, id: i64, views: u32) -> Post {
        Post {
            id,
            title: self.title,
            body: self.body,
            created_time: self.created_time,
            modified_time: self.modified_time,
            excerpt: self.excerpt,
            category_id: self.category_id,
            author_id: self.author_id,
            tag_ids: self.tag_ids,
            views,
            img: self.img,
        }
    }
}

/// A post with its category, author and tags resolved.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub category: Category,
    pub author: UserSummary,
    pub tags: Vec<Tag>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub excerpt: String,
    pub created_time: DateTime<Utc>,
    pub modified_time: DateTime<Utc>,
    pub views: u32,
    pub img: Option<String>,
    pub category: Category,
    pub author: UserSummary,
    pub url: String,
}
