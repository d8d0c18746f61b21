use crate::error::BlogError;
use crate::services::posts::{self, PostFilter};
use crate::web::error::AppResult;
use crate::web::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::Deserialize;
use std::sync::Arc;

const MAX_PAGE: usize = 10000;

#[derive(Deserialize)]
pub struct IndexParams {
    #[serde(default = "default_page")]
    page: usize,
    category: Option<i64>,
    tag: Option<i64>,
    author: Option<i64>,
}

fn default_page() -> usize {
    1
}

fn clamp_page(page: usize) -> usize {
    page.clamp(1, MAX_PAGE)
}

/// GET /
pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IndexParams>,
) -> AppResult<Json<serde_json::Value>> {
    let per_page = state.config.content.posts_per_page;
    let page = clamp_page(params.page);
    let offset = (page - 1) * per_page;

    let filter = PostFilter {
        category_id: params.category,
        tag_id: params.tag,
        author_id: params.author,
        ..PostFilter::default()
    };
    let posts = posts::list_posts(&state.db, &filter, per_page, offset)?;
    let total = posts::count_posts(&state.db, &filter)?;

    Ok(Json(serde_json::json!({
        "data": posts,
        "meta": {
            "total": total,
            "page": page,
            "per_page": per_page,
        }
    })))
}

/// GET /post/:id/
///
/// Counts the read before loading, so the returned `views` includes it.
pub async fn post_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    posts::increase_views(&state.db, id)?;

    let detail =
        posts::get_post_detail(&state.db, id)?.ok_or(BlogError::not_found("post", id))?;
    let body_html = state.markdown.render(&detail.post.body);

    let mut data = serde_json::to_value(&detail)?;
    data["body_html"] = serde_json::Value::String(body_html);

    Ok(Json(serde_json::json!({ "data": data })))
}

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}
