use once_cell::sync::Lazy;
use regex::Regex;

static POST_PATH_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/post/([1-9][0-9]*)/$").expect("Invalid post path regex pattern"));

/// Canonical path of a post: `/post/{id}/`.
pub fn post_url(id: i64) -> String {
    format!("/post/{}/", id)
}

/// The post URL prefixed with the site's base URL, when one is configured.
pub fn absolute_post_url(site_url: &str, id: i64) -> String {
    format!("{}{}", site_url.trim_end_matches('/'), post_url(id))
}

/// Inverse of [`post_url`]: the id a canonical path points at.
pub fn resolve_post_url(path: &str) -> Option<i64> {
    POST_PATH_REGEX
        .captures(path)
        .and_then(|caps| caps[1].parse().ok())
}
