use crate::db::{format_time, time_from_row};
use crate::error::{check_length, check_required, BlogError};
use crate::models::{
    Category, Post, PostDetail, PostDraft, PostSummary, PreparedPost, UserSummary,
    EXCERPT_MAX_LEN, TITLE_MAX_LEN,
};
use crate::services::excerpt::ExcerptGenerator;
use crate::services::{tags, urls};
use crate::Database;
use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, NaiveDate, SubsecRound, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension};
use std::str::FromStr;

const IMG_MAX_LEN: usize = 100;

const POST_COLUMNS: &str =
    "id, title, body, created_time, modified_time, excerpt, category_id, author_id, views, img";

/// Where prepared posts are persisted.
///
/// Saving is split in two: [`prepare`] applies the timestamp and excerpt
/// rules without touching storage, then `commit_post` writes the result.
pub trait PostStore {
    fn fetch_post(&self, id: i64) -> Result<Option<Post>>;

    /// Inserts the post when it has no id, otherwise overwrites the row and
    /// its tag links.
    fn commit_post(&self, post: PreparedPost) -> Result<Post>;

    /// Adds one to `views` and writes nothing else. Returns the new count.
    fn increment_views(&self, id: i64) -> Result<u32>;
}

/// Applies the save-time rules to `draft`.
///
/// `previous` is the stored version of the post, `None` for a first save.
/// `created_time` is taken from `previous` (or `now` for a new post) and any
/// value on the draft is ignored. `modified_time` is `now`, bumped just past
/// the stored value if the clock has not moved. An empty excerpt is derived
/// from the body.
pub fn prepare(
    draft: PostDraft,
    previous: Option<&Post>,
    now: DateTime<Utc>,
    excerpts: &ExcerptGenerator,
) -> Result<PreparedPost> {
    check_required("title", &draft.title, TITLE_MAX_LEN)?;
    if let Some(img) = &draft.img {
        check_length("img", img, IMG_MAX_LEN)?;
    }

    // Stored timestamps keep microseconds
    let now = now.trunc_subsecs(6);
    let (created_time, modified_time) = match previous {
        Some(prev) if now <= prev.modified_time => {
            (prev.created_time, prev.modified_time + Duration::microseconds(1))
        }
        Some(prev) => (prev.created_time, now),
        None => (now, now),
    };

    let excerpt = if draft.excerpt.is_empty() {
        excerpts.derive(&draft.body)?
    } else {
        check_length("excerpt", &draft.excerpt, EXCERPT_MAX_LEN)?;
        draft.excerpt
    };

    let mut tag_ids = draft.tag_ids;
    tag_ids.sort_unstable();
    tag_ids.dedup();

    Ok(PreparedPost {
        id: draft.id,
        title: draft.title,
        body: draft.body,
        created_time,
        modified_time,
        excerpt,
        category_id: draft.category_id,
        author_id: draft.author_id,
        tag_ids,
        views_override: draft.views_override,
        img: draft.img.filter(|img| !img.is_empty()),
    })
}

/// Prepares and commits `draft`, returning the stored post.
pub fn save_post<S: PostStore + ?Sized>(
    store: &S,
    excerpts: &ExcerptGenerator,
    draft: PostDraft,
) -> Result<Post> {
    let previous = match draft.id {
        Some(id) => Some(
            store
                .fetch_post(id)?
                .ok_or(BlogError::not_found("post", id))?,
        ),
        None => None,
    };

    let prepared = prepare(draft, previous.as_ref(), Utc::now(), excerpts)?;
    let post = store.commit_post(prepared)?;

    if previous.is_some() {
        tracing::info!(post_id = post.id, "Updated post");
    } else {
        tracing::info!(post_id = post.id, "Created post");
    }
    Ok(post)
}

/// Records one read of the post.
pub fn increase_views<S: PostStore + ?Sized>(store: &S, id: i64) -> Result<u32> {
    store.increment_views(id)
}

impl PostStore for Database {
    fn fetch_post(&self, id: i64) -> Result<Option<Post>> {
        let conn = self.get()?;
        fetch_post_with(&conn, id)
    }

    fn commit_post(&self, post: PreparedPost) -> Result<Post> {
        let mut conn = self.get()?;
        let tx = conn.transaction()?;

        ensure_exists(&tx, "categories", "category", post.category_id)?;
        ensure_exists(&tx, "users", "author", post.author_id)?;
        for tag_id in &post.tag_ids {
            ensure_exists(&tx, "tags", "tags", *tag_id)?;
        }

        let created = format_time(&post.created_time);
        let modified = format_time(&post.modified_time);

        let (id, views) = match post.id {
            None => {
                let views = post.views_override.unwrap_or(0);
                tx.execute(
                    r#"
                    INSERT INTO posts (title, body, created_time, modified_time, excerpt, category_id, author_id, views, img)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                    (
                        &post.title,
                        &post.body,
                        &created,
                        &modified,
                        &post.excerpt,
                        post.category_id,
                        post.author_id,
                        views,
                        &post.img,
                    ),
                )?;
                (tx.last_insert_rowid(), views)
            }
            Some(id) => {
                // Reads counted since the draft was loaded must survive the save
                let views: Option<u32> = tx
                    .query_row(
                        r#"
                        UPDATE posts SET title = ?, body = ?, created_time = ?, modified_time = ?, excerpt = ?,
                            category_id = ?, author_id = ?, views = COALESCE(?, views), img = ?
                        WHERE id = ?
                        RETURNING views
                        "#,
                        (
                            &post.title,
                            &post.body,
                            &created,
                            &modified,
                            &post.excerpt,
                            post.category_id,
                            post.author_id,
                            post.views_override,
                            &post.img,
                            id,
                        ),
                        |row| row.get(0),
                    )
                    .optional()?;
                let Some(views) = views else {
                    return Err(BlogError::not_found("post", id).into());
                };
                tx.execute("DELETE FROM post_tags WHERE post_id = ?", [id])?;
                (id, views)
            }
        };

        for tag_id in &post.tag_ids {
            tx.execute(
                "INSERT INTO post_tags (post_id, tag_id) VALUES (?, ?)",
                (id, tag_id),
            )?;
        }

        tx.commit()?;
        Ok(post.into_post(id, views))
    }

    fn increment_views(&self, id: i64) -> Result<u32> {
        let conn = self.get()?;
        let views: Option<u32> = conn
            .query_row(
                "UPDATE posts SET views = views + 1 WHERE id = ? RETURNING views",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        views.ok_or_else(|| BlogError::not_found("post", id).into())
    }
}

fn ensure_exists(conn: &Connection, table: &str, field: &'static str, id: i64) -> Result<()> {
    let found: Option<i64> = conn
        .query_row(&format!("SELECT id FROM {} WHERE id = ?", table), [id], |row| {
            row.get(0)
        })
        .optional()?;
    if found.is_none() {
        return Err(BlogError::validation(field, format!("no {} with id {}", field, id)).into());
    }
    Ok(())
}

fn fetch_post_with(conn: &Connection, id: i64) -> Result<Option<Post>> {
    let post = conn
        .query_row(
            &format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS),
            [id],
            row_to_post,
        )
        .optional()?;

    match post {
        Some(mut post) => {
            let mut stmt =
                conn.prepare("SELECT tag_id FROM post_tags WHERE post_id = ? ORDER BY tag_id")?;
            post.tag_ids = stmt
                .query_map([id], |row| row.get(0))?
                .collect::<Result<Vec<i64>, _>>()?;
            Ok(Some(post))
        }
        None => Ok(None),
    }
}

fn row_to_post(row: &rusqlite::Row) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        created_time: time_from_row(row, 3)?,
        modified_time: time_from_row(row, 4)?,
        excerpt: row.get(5)?,
        category_id: row.get(6)?,
        author_id: row.get(7)?,
        tag_ids: Vec::new(),
        views: row.get(8)?,
        img: row.get(9)?,
    })
}

pub fn get_post(db: &Database, id: i64) -> Result<Option<Post>> {
    db.fetch_post(id)
}

/// The post with its category, author and tags.
pub fn get_post_detail(db: &Database, id: i64) -> Result<Option<PostDetail>> {
    let conn = db.get()?;
    let Some(post) = fetch_post_with(&conn, id)? else {
        return Ok(None);
    };

    let (category, author) = conn.query_row(
        r#"
        SELECT c.id, c.name, u.id, u.username
        FROM categories c, users u
        WHERE c.id = ? AND u.id = ?
        "#,
        (post.category_id, post.author_id),
        |row| {
            Ok((
                Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                },
                UserSummary {
                    id: row.get(2)?,
                    username: row.get(3)?,
                },
            ))
        },
    )?;
    let tags = tags::tags_for_post(&conn, id)?;

    Ok(Some(PostDetail {
        url: urls::post_url(post.id),
        post,
        category,
        author,
        tags,
    }))
}

/// Removes the post and its tag links.
pub fn delete_post(db: &Database, id: i64) -> Result<bool> {
    let conn = db.get()?;
    let affected = conn.execute("DELETE FROM posts WHERE id = ?", [id])?;
    Ok(affected > 0)
}

/// Date ranges offered for filtering by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreatedFilter {
    #[default]
    Any,
    Today,
    PastSevenDays,
    ThisMonth,
    ThisYear,
}

impl FromStr for CreatedFilter {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "today" => Ok(Self::Today),
            "past_7_days" | "week" => Ok(Self::PastSevenDays),
            "this_month" | "month" => Ok(Self::ThisMonth),
            "this_year" | "year" => Ok(Self::ThisYear),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for CreatedFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Today => write!(f, "today"),
            Self::PastSevenDays => write!(f, "past_7_days"),
            Self::ThisMonth => write!(f, "this_month"),
            Self::ThisYear => write!(f, "this_year"),
        }
    }
}

impl CreatedFilter {
    /// Half-open `[start, end)` range in UTC, `None` for [`CreatedFilter::Any`].
    pub fn range(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let today = now.date_naive();
        let tomorrow = today.succ_opt()?;
        let (start, end) = match self {
            Self::Any => return None,
            Self::Today => (today, tomorrow),
            Self::PastSevenDays => (today - Duration::days(7), tomorrow),
            Self::ThisMonth => {
                let first = today.with_day(1)?;
                let next = if today.month() == 12 {
                    NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)?
                } else {
                    NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)?
                };
                (first, next)
            }
            Self::ThisYear => (
                NaiveDate::from_ymd_opt(today.year(), 1, 1)?,
                NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)?,
            ),
        };
        Some((
            start.and_hms_opt(0, 0, 0)?.and_utc(),
            end.and_hms_opt(0, 0, 0)?.and_utc(),
        ))
    }
}

/// Narrows a post listing. Every set field must match.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub category_id: Option<i64>,
    pub tag_id: Option<i64>,
    pub author_id: Option<i64>,
    /// Whitespace-separated terms; each must appear in the title or the body.
    pub search: Option<String>,
    pub created: CreatedFilter,
}

impl PostFilter {
    fn to_sql(&self, now: DateTime<Utc>) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(id) = self.category_id {
            sql.push_str(" AND p.category_id = ?");
            params.push(Value::Integer(id));
        }
        if let Some(id) = self.author_id {
            sql.push_str(" AND p.author_id = ?");
            params.push(Value::Integer(id));
        }
        if let Some(id) = self.tag_id {
            sql.push_str(" AND p.id IN (SELECT post_id FROM post_tags WHERE tag_id = ?)");
            params.push(Value::Integer(id));
        }
        if let Some(search) = &self.search {
            for term in search.split_whitespace() {
                let pattern = format!("%{}%", escape_like(term));
                sql.push_str(r" AND (p.title LIKE ? ESCAPE '\' OR p.body LIKE ? ESCAPE '\')");
                params.push(Value::Text(pattern.clone()));
                params.push(Value::Text(pattern));
            }
        }
        if let Some((start, end)) = self.created.range(now) {
            sql.push_str(" AND p.created_time >= ? AND p.created_time < ?");
            params.push(Value::Text(format_time(&start)));
            params.push(Value::Text(format_time(&end)));
        }

        (sql, params)
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', r"\\")
        .replace('%', r"\%")
        .replace('_', r"\_")
}

/// Matching posts, newest first, with category and author joined in.
pub fn list_posts(
    db: &Database,
    filter: &PostFilter,
    limit: usize,
    offset: usize,
) -> Result<Vec<PostSummary>> {
    let conn = db.get()?;
    let (where_sql, mut params) = filter.to_sql(Utc::now());
    let sql = format!(
        r#"
        SELECT p.id, p.title, p.excerpt, p.created_time, p.modified_time, p.views, p.img,
               c.id, c.name, u.id, u.username
        FROM posts p
        JOIN categories c ON c.id = p.category_id
        JOIN users u ON u.id = p.author_id
        WHERE 1=1{}
        ORDER BY p.created_time DESC, p.id DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );
    params.push(Value::Integer(limit as i64));
    params.push(Value::Integer(offset as i64));

    let mut stmt = conn.prepare(&sql)?;
    let posts = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            let id: i64 = row.get(0)?;
            Ok(PostSummary {
                id,
                title: row.get(1)?,
                excerpt: row.get(2)?,
                created_time: time_from_row(row, 3)?,
                modified_time: time_from_row(row, 4)?,
                views: row.get(5)?,
                img: row.get(6)?,
                category: Category {
                    id: row.get(7)?,
                    name: row.get(8)?,
                },
                author: UserSummary {
                    id: row.get(9)?,
                    username: row.get(10)?,
                },
                url: urls::post_url(id),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(posts)
}

pub fn count_posts(db: &Database, filter: &PostFilter) -> Result<i64> {
    let conn = db.get()?;
    let (where_sql, params) = filter.to_sql(Utc::now());
    let sql = format!("SELECT COUNT(*) FROM posts p WHERE 1=1{}", where_sql);
    let count: i64 = conn.query_row(&sql, rusqlite::params_from_iter(params.iter()), |row| {
        row.get(0)
    })?;
    Ok(count)
}
