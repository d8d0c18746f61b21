use inkpost::admin::{AdminModel, AdminSite, ChangeListQuery};
use inkpost::config::{AdminConfig, ExcerptConfig};
use inkpost::error::BlogError;
use inkpost::models::PostDraft;
use inkpost::services::excerpt::ExcerptGenerator;
use inkpost::services::posts::{self, CreatedFilter, PostFilter, PostStore};
use inkpost::services::{categories, tags, urls, users};
use inkpost::Database;

fn create_test_db() -> Database {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let id: u32 = rng.gen();
    let name = format!("test_db_{}", id);

    let db = Database::open_memory(&name).expect("Failed to create test database");
    db.migrate().expect("Failed to run migrations");
    db
}

fn excerpts() -> ExcerptGenerator {
    ExcerptGenerator::new(&ExcerptConfig::default())
}

/// A database with one category ("Rust") and one author ("alice").
fn seeded_db() -> (Database, i64, i64) {
    let db = create_test_db();
    let category_id = categories::create_category(&db, "Rust").expect("Failed to create category");
    let author_id = users::create_user(&db, "alice", "alice@example.com")
        .expect("Failed to create user");
    (db, category_id, author_id)
}

fn validation_field(err: &anyhow::Error) -> Option<&'static str> {
    match err.downcast_ref::<BlogError>() {
        Some(BlogError::Validation { field, .. }) => Some(*field),
        _ => None,
    }
}

mod save_integration_tests {
    use super::*;
    use inkpost::services::summarize::Summarizer;
    use std::sync::Arc;

    #[test]
    fn test_empty_excerpt_is_derived() {
        let (db, category_id, author_id) = seeded_db();

        let draft = PostDraft::new("Hello", "# Title\nSome content here.", category_id, author_id);
        let post = posts::save_post(&db, &excerpts(), draft).expect("Failed to save post");

        assert_eq!(post.excerpt, "摘要：Some content here。");
        let stored = posts::get_post(&db, post.id).unwrap().unwrap();
        assert_eq!(stored.excerpt, post.excerpt);
    }

    #[test]
    fn test_html_body_excerpt_is_derived() {
        let (db, category_id, author_id) = seeded_db();

        let draft = PostDraft::new(
            "Hello",
            "<p>Some content here for the blog.</p>\n<p>短</p>",
            category_id,
            author_id,
        );
        let post = posts::save_post(&db, &excerpts(), draft).unwrap();
        assert_eq!(post.excerpt, "摘要：Some content here for the blog。");
    }

    #[test]
    fn test_whitespace_excerpt_is_kept() {
        let (db, category_id, author_id) = seeded_db();

        let draft = PostDraft::new("Hello", "Some content here.", category_id, author_id)
            .with_excerpt("   ");
        let post = posts::save_post(&db, &excerpts(), draft).unwrap();
        assert_eq!(post.excerpt, "   ");
    }

    #[test]
    fn test_supplied_excerpt_is_kept() {
        let (db, category_id, author_id) = seeded_db();

        let draft = PostDraft::new("Hello", "Some content here.", category_id, author_id)
            .with_excerpt("Hand written");
        let post = posts::save_post(&db, &excerpts(), draft).unwrap();
        assert_eq!(post.excerpt, "Hand written");
    }

    #[test]
    fn test_first_save_stamps_equal_times() {
        let (db, category_id, author_id) = seeded_db();

        let post = posts::save_post(
            &db,
            &excerpts(),
            PostDraft::new("Hello", "Body text goes here", category_id, author_id),
        )
        .unwrap();

        assert_eq!(post.created_time, post.modified_time);
        assert_eq!(post.views, 0);
        assert!(post.tag_ids.is_empty());
    }

    #[test]
    fn test_resave_advances_modified_only() {
        let (db, category_id, author_id) = seeded_db();
        let generator = excerpts();

        let first = posts::save_post(
            &db,
            &generator,
            PostDraft::new("Hello", "Body text goes here", category_id, author_id),
        )
        .unwrap();

        let mut draft = PostDraft::from(first.clone());
        draft.title = "Hello again".to_string();
        let second = posts::save_post(&db, &generator, draft).unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.created_time, first.created_time);
        assert!(second.modified_time > first.modified_time);

        let stored = posts::get_post(&db, first.id).unwrap().unwrap();
        assert_eq!(stored.title, "Hello again");
        assert_eq!(stored.created_time, first.created_time);
        assert_eq!(stored.modified_time, second.modified_time);
    }

    #[test]
    fn test_tags_are_stored_and_replaced() {
        let (db, category_id, author_id) = seeded_db();
        let generator = excerpts();
        let web = tags::create_tag(&db, "web").unwrap();
        let cli = tags::create_tag(&db, "cli").unwrap();

        let post = posts::save_post(
            &db,
            &generator,
            PostDraft::new("Tagged", "Body text goes here", category_id, author_id)
                .with_tags(vec![cli, web]),
        )
        .unwrap();
        assert_eq!(db.fetch_post(post.id).unwrap().unwrap().tag_ids, vec![web, cli]);

        let mut draft = PostDraft::from(post);
        draft.tag_ids = vec![];
        let post = posts::save_post(&db, &generator, draft).unwrap();
        assert!(db.fetch_post(post.id).unwrap().unwrap().tag_ids.is_empty());
    }

    #[test]
    fn test_unknown_references_are_rejected() {
        let (db, category_id, author_id) = seeded_db();
        let generator = excerpts();

        let err = posts::save_post(
            &db,
            &generator,
            PostDraft::new("Hello", "Body", category_id + 100, author_id),
        )
        .unwrap_err();
        assert_eq!(validation_field(&err), Some("category"));

        let err = posts::save_post(
            &db,
            &generator,
            PostDraft::new("Hello", "Body", category_id, author_id + 100),
        )
        .unwrap_err();
        assert_eq!(validation_field(&err), Some("author"));

        let err = posts::save_post(
            &db,
            &generator,
            PostDraft::new("Hello", "Body", category_id, author_id).with_tags(vec![999]),
        )
        .unwrap_err();
        assert_eq!(validation_field(&err), Some("tags"));

        assert_eq!(posts::count_posts(&db, &PostFilter::default()).unwrap(), 0);
    }

    #[test]
    fn test_saving_unknown_id_is_not_found() {
        let (db, category_id, author_id) = seeded_db();

        let mut draft = PostDraft::new("Ghost", "Body", category_id, author_id);
        draft.id = Some(404);
        let err = posts::save_post(&db, &excerpts(), draft).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BlogError>(),
            Some(BlogError::NotFound { entity: "post", id: 404 })
        ));
    }

    struct Offline;

    impl Summarizer for Offline {
        fn key_sentences(&self, _text: &str, _count: usize) -> anyhow::Result<Vec<String>> {
            anyhow::bail!("summarizer offline")
        }
    }

    #[test]
    fn test_summarizer_failure_saves_nothing() {
        let (db, category_id, author_id) = seeded_db();
        let generator =
            ExcerptGenerator::with_summarizer(&ExcerptConfig::default(), Arc::new(Offline));

        let err = posts::save_post(
            &db,
            &generator,
            PostDraft::new("Hello", "Body text goes here", category_id, author_id),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "summarizer offline");
        assert_eq!(posts::count_posts(&db, &PostFilter::default()).unwrap(), 0);

        // A supplied excerpt never calls the summarizer
        let post = posts::save_post(
            &db,
            &generator,
            PostDraft::new("Hello", "Body", category_id, author_id).with_excerpt("Manual"),
        )
        .unwrap();
        assert_eq!(post.excerpt, "Manual");
    }
}

mod views_integration_tests {
    use super::*;

    #[test]
    fn test_increase_views_counts_each_read() {
        let (db, category_id, author_id) = seeded_db();
        let post = posts::save_post(
            &db,
            &excerpts(),
            PostDraft::new("Hello", "Body text goes here", category_id, author_id),
        )
        .unwrap();

        for expected in 1..=5 {
            assert_eq!(posts::increase_views(&db, post.id).unwrap(), expected);
        }

        let stored = posts::get_post(&db, post.id).unwrap().unwrap();
        assert_eq!(stored.views, 5);
        assert_eq!(stored.modified_time, post.modified_time);
        assert_eq!(stored.excerpt, post.excerpt);
    }

    #[test]
    fn test_concurrent_reads_are_not_lost() {
        use rand::Rng;
        let id: u32 = rand::thread_rng().gen();
        let path = std::env::temp_dir().join(format!("inkpost_views_{}.db", id));
        let path_str = path.to_string_lossy().to_string();

        let db = Database::open(&path_str, 4).expect("Failed to open file database");
        db.migrate().unwrap();
        let category_id = categories::create_category(&db, "Rust").unwrap();
        let author_id = users::create_user(&db, "alice", "").unwrap();
        let post = posts::save_post(
            &db,
            &excerpts(),
            PostDraft::new("Hello", "Body text goes here", category_id, author_id),
        )
        .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let db = db.clone();
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        posts::increase_views(&db, post.id).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(posts::get_post(&db, post.id).unwrap().unwrap().views, 40);

        drop(db);
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path_str, suffix));
        }
    }

    #[test]
    fn test_saving_stale_draft_keeps_counted_reads() {
        let (db, category_id, author_id) = seeded_db();
        let generator = excerpts();
        let post = posts::save_post(
            &db,
            &generator,
            PostDraft::new("Hello", "Body text goes here", category_id, author_id),
        )
        .unwrap();

        let mut draft = PostDraft::from(posts::get_post(&db, post.id).unwrap().unwrap());
        for _ in 0..3 {
            posts::increase_views(&db, post.id).unwrap();
        }
        draft.title = "Hello again".to_string();
        let saved = posts::save_post(&db, &generator, draft).unwrap();

        assert_eq!(saved.views, 3);
        assert_eq!(posts::get_post(&db, post.id).unwrap().unwrap().views, 3);
    }

    #[test]
    fn test_views_override_replaces_count() {
        let (db, category_id, author_id) = seeded_db();
        let generator = excerpts();
        let post = posts::save_post(
            &db,
            &generator,
            PostDraft::new("Hello", "Body text goes here", category_id, author_id),
        )
        .unwrap();
        posts::increase_views(&db, post.id).unwrap();

        let mut draft = PostDraft::from(post);
        draft.views_override = Some(42);
        let saved = posts::save_post(&db, &generator, draft).unwrap();
        assert_eq!(saved.views, 42);
        assert_eq!(posts::get_post(&db, saved.id).unwrap().unwrap().views, 42);

        let mut draft = PostDraft::new("Imported", "Body text goes here", category_id, author_id);
        draft.views_override = Some(7);
        assert_eq!(posts::save_post(&db, &generator, draft).unwrap().views, 7);
    }

    #[test]
    fn test_increase_views_on_missing_post() {
        let db = create_test_db();
        let err = posts::increase_views(&db, 12).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BlogError>(),
            Some(BlogError::NotFound { entity: "post", id: 12 })
        ));
    }
}

mod relation_integration_tests {
    use super::*;

    #[test]
    fn test_detail_resolves_relations_and_url() {
        let (db, category_id, author_id) = seeded_db();
        let tag_id = tags::create_tag(&db, "web").unwrap();
        let post = posts::save_post(
            &db,
            &excerpts(),
            PostDraft::new("Hello", "Body text goes here", category_id, author_id)
                .with_tags(vec![tag_id]),
        )
        .unwrap();

        let detail = posts::get_post_detail(&db, post.id).unwrap().unwrap();
        assert_eq!(detail.category.name, "Rust");
        assert_eq!(detail.author.username, "alice");
        assert_eq!(detail.tags.len(), 1);
        assert_eq!(detail.tags[0].name, "web");
        assert_eq!(urls::resolve_post_url(&detail.url), Some(post.id));
    }

    #[test]
    fn test_rename_category() {
        let (db, category_id, _) = seeded_db();

        categories::rename_category(&db, category_id, "Systems").unwrap();
        let category = categories::get_category(&db, category_id).unwrap().unwrap();
        assert_eq!(category.name, "Systems");
        assert!(categories::get_category(&db, category_id + 1).unwrap().is_none());

        let err = categories::rename_category(&db, category_id + 1, "Nope").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BlogError>(),
            Some(BlogError::NotFound { entity: "category", .. })
        ));
    }

    #[test]
    fn test_deleting_category_removes_its_posts() {
        let (db, category_id, author_id) = seeded_db();
        let post = posts::save_post(
            &db,
            &excerpts(),
            PostDraft::new("Hello", "Body text goes here", category_id, author_id),
        )
        .unwrap();

        assert!(categories::delete_category(&db, category_id).unwrap());
        assert!(posts::get_post(&db, post.id).unwrap().is_none());
    }

    #[test]
    fn test_deleting_user_removes_their_posts() {
        let (db, category_id, author_id) = seeded_db();
        let post = posts::save_post(
            &db,
            &excerpts(),
            PostDraft::new("Hello", "Body text goes here", category_id, author_id),
        )
        .unwrap();

        assert!(users::delete_user(&db, author_id).unwrap());
        assert!(posts::get_post(&db, post.id).unwrap().is_none());
    }

    #[test]
    fn test_deleting_tag_keeps_posts() {
        let (db, category_id, author_id) = seeded_db();
        let tag_id = tags::create_tag(&db, "web").unwrap();
        let post = posts::save_post(
            &db,
            &excerpts(),
            PostDraft::new("Hello", "Body text goes here", category_id, author_id)
                .with_tags(vec![tag_id]),
        )
        .unwrap();

        assert!(tags::delete_tag(&db, tag_id).unwrap());
        let stored = posts::get_post(&db, post.id).unwrap().unwrap();
        assert!(stored.tag_ids.is_empty());
    }

    #[test]
    fn test_deleting_post_keeps_tags() {
        let (db, category_id, author_id) = seeded_db();
        let tag_id = tags::create_tag(&db, "web").unwrap();
        let post = posts::save_post(
            &db,
            &excerpts(),
            PostDraft::new("Hello", "Body text goes here", category_id, author_id)
                .with_tags(vec![tag_id]),
        )
        .unwrap();

        assert!(posts::delete_post(&db, post.id).unwrap());
        assert!(tags::get_tag(&db, tag_id).unwrap().is_some());
        assert!(!posts::delete_post(&db, post.id).unwrap());
    }
}

mod admin_integration_tests {
    use super::*;

    fn seed_posts(db: &Database, category_id: i64, author_id: i64) {
        let generator = excerpts();
        for (title, body) in [
            ("Learning Rust", "Ownership and borrowing explained"),
            ("Cooking notes", "How to bake bread at home"),
            ("Async in practice", "Tokio runtimes and Rust futures"),
        ] {
            posts::save_post(db, &generator, PostDraft::new(title, body, category_id, author_id))
                .unwrap();
        }
    }

    #[test]
    fn test_post_changelist_rows() {
        let (db, category_id, author_id) = seeded_db();
        seed_posts(&db, category_id, author_id);
        let site = AdminSite::new(&AdminConfig::default());

        let list = site
            .changelist(&db, AdminModel::Post, &ChangeListQuery::default())
            .unwrap();

        assert_eq!(list.total, 3);
        assert_eq!(list.pages, 1);
        assert_eq!(list.headers[0], "标题");
        assert_eq!(list.headers[5], "查看站点");
        // Newest first
        assert_eq!(list.rows[0][0], "Async in practice");
        assert_eq!(list.rows[0][3], "Rust");
        assert_eq!(list.rows[0][4], "alice");
        assert!(list.rows[0][5].starts_with(r#"<a href="/post/"#));
    }

    #[test]
    fn test_changelist_search_matches_title_or_body() {
        let (db, category_id, author_id) = seeded_db();
        seed_posts(&db, category_id, author_id);
        let site = AdminSite::new(&AdminConfig::default());

        let query = ChangeListQuery {
            search: Some("rust".to_string()),
            ..ChangeListQuery::default()
        };
        let list = site.changelist(&db, AdminModel::Post, &query).unwrap();
        assert_eq!(list.total, 2);

        let query = ChangeListQuery {
            search: Some("bread home".to_string()),
            ..ChangeListQuery::default()
        };
        let list = site.changelist(&db, AdminModel::Post, &query).unwrap();
        assert_eq!(list.total, 1);
        assert_eq!(list.rows[0][0], "Cooking notes");
    }

    #[test]
    fn test_changelist_created_filter() {
        let (db, category_id, author_id) = seeded_db();
        seed_posts(&db, category_id, author_id);
        let site = AdminSite::new(&AdminConfig::default());

        let query = ChangeListQuery {
            created: CreatedFilter::PastSevenDays,
            ..ChangeListQuery::default()
        };
        let list = site.changelist(&db, AdminModel::Post, &query).unwrap();
        assert_eq!(list.total, 3);
    }

    #[test]
    fn test_changelist_paginates() {
        let (db, category_id, author_id) = seeded_db();
        seed_posts(&db, category_id, author_id);
        let config = AdminConfig {
            list_per_page: 2,
            ..AdminConfig::default()
        };
        let site = AdminSite::new(&config);

        let query = ChangeListQuery {
            page: 2,
            ..ChangeListQuery::default()
        };
        let list = site.changelist(&db, AdminModel::Post, &query).unwrap();
        assert_eq!(list.pages, 2);
        assert_eq!(list.rows.len(), 1);
        assert_eq!(list.rows[0][0], "Learning Rust");
    }

    #[test]
    fn test_tag_changelist_shows_names() {
        let db = create_test_db();
        tags::create_tag(&db, "web").unwrap();
        tags::create_tag(&db, "cli").unwrap();
        let site = AdminSite::new(&AdminConfig::default());

        let list = site
            .changelist(&db, AdminModel::Tag, &ChangeListQuery::default())
            .unwrap();
        assert_eq!(list.total, 2);
        assert_eq!(list.headers, vec!["名称".to_string()]);
    }
}

mod web_integration_tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use inkpost::web::{app, AppState};
    use inkpost::Config;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_app(db: Database) -> axum::Router {
        let config = Config::new("Test Blog");
        app(Arc::new(AppState::new(config, db)))
    }

    async fn get(router: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_post_detail_counts_views() {
        let (db, category_id, author_id) = seeded_db();
        let post = posts::save_post(
            &db,
            &excerpts(),
            PostDraft::new("Hello", "Some **content** here.", category_id, author_id),
        )
        .unwrap();
        let uri = urls::post_url(post.id);

        let (status, json) = get(test_app(db.clone()), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["views"], 1);
        assert_eq!(json["data"]["category"]["name"], "Rust");
        assert!(json["data"]["body_html"]
            .as_str()
            .unwrap()
            .contains("<strong>content</strong>"));

        let (_, json) = get(test_app(db.clone()), &uri).await;
        assert_eq!(json["data"]["views"], 2);
    }

    #[tokio::test]
    async fn test_missing_post_is_404() {
        let db = create_test_db();
        let (status, json) = get(test_app(db), "/post/99/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Not Found");
    }

    #[tokio::test]
    async fn test_index_lists_posts() {
        let (db, category_id, author_id) = seeded_db();
        posts::save_post(
            &db,
            &excerpts(),
            PostDraft::new("Hello", "Body text goes here", category_id, author_id),
        )
        .unwrap();

        let (status, json) = get(test_app(db), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["meta"]["total"], 1);
        assert_eq!(json["data"][0]["title"], "Hello");
        assert_eq!(json["data"][0]["author"]["username"], "alice");
    }

    #[tokio::test]
    async fn test_health() {
        let router = test_app(create_test_db());
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
