use crate::admin::{AdminModel, AdminSite, ChangeListQuery};
use crate::cli::PostCommand;
use crate::error::BlogError;
use crate::models::PostDraft;
use crate::services::excerpt::ExcerptGenerator;
use crate::services::posts::{self, CreatedFilter};
use crate::services::{urls, users};
use crate::Database;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub async fn run(config_path: &Path, command: PostCommand) -> Result<()> {
    let (config, db) = super::open(config_path)?;
    let excerpts = ExcerptGenerator::new(&config.excerpt);

    match command {
        PostCommand::Add {
            title,
            body,
            body_file,
            category,
            author,
            tags,
            excerpt,
            img,
        } => {
            let body = read_body(body, body_file)?.unwrap_or_default();
            let author_id = author_id(&db, &author)?;

            let mut draft = PostDraft::new(title, body, category, author_id).with_tags(tags);
            if let Some(excerpt) = excerpt {
                draft = draft.with_excerpt(excerpt);
            }
            if let Some(img) = img {
                draft = draft.with_img(img);
            }

            let post = posts::save_post(&db, &excerpts, draft)?;
            println!("Created post {} at {}", post.id, urls::post_url(post.id));
            println!("  {}", post.excerpt);
        }
        PostCommand::Edit {
            id,
            title,
            body,
            body_file,
            category,
            author,
            tags,
            clear_tags,
            excerpt,
            img,
            views,
        } => {
            let current = posts::get_post(&db, id)?.ok_or(BlogError::not_found("post", id))?;
            let mut draft = PostDraft::from(current);

            if let Some(title) = title {
                draft.title = title;
            }
            if let Some(body) = read_body(body, body_file)? {
                draft.body = body;
            }
            if let Some(category) = category {
                draft.category_id = category;
            }
            if let Some(author) = author {
                draft.author_id = author_id(&db, &author)?;
            }
            if clear_tags {
                draft.tag_ids.clear();
            } else if !tags.is_empty() {
                draft.tag_ids = tags;
            }
            if let Some(excerpt) = excerpt {
                draft.excerpt = excerpt;
            }
            if let Some(img) = img {
                draft.img = Some(img);
            }
            if let Some(views) = views {
                draft.views_override = Some(views);
            }

            let post = posts::save_post(&db, &excerpts, draft)?;
            println!("Updated post {} (modified {})", post.id, post.modified_time);
        }
        PostCommand::List {
            search,
            created,
            page,
        } => {
            let created: CreatedFilter = created
                .parse()
                .map_err(|_| anyhow::anyhow!("Unknown date filter '{}'", created))?;
            let site = AdminSite::new(&config.admin);
            let query = ChangeListQuery {
                search,
                created,
                page,
            };
            let list = site.changelist(&db, AdminModel::Post, &query)?;
            super::admin::print_changelist(&list);
        }
        PostCommand::Show { id } => {
            let detail =
                posts::get_post_detail(&db, id)?.ok_or(BlogError::not_found("post", id))?;
            let tag_names: Vec<&str> = detail.tags.iter().map(|t| t.name.as_str()).collect();

            println!("{}", detail.post.title);
            println!("{}", "=".repeat(40));
            println!("URL:       {}", urls::absolute_post_url(&config.site.url, id));
            println!("Category:  {}", detail.category);
            println!("Author:    {}", detail.author);
            println!("Tags:      {}", tag_names.join(", "));
            println!("Created:   {}", detail.post.created_time);
            println!("Modified:  {}", detail.post.modified_time);
            println!("Views:     {}", detail.post.views);
            if let Some(img) = &detail.post.img {
                println!("Image:     {}", img);
            }
            println!();
            println!("{}", detail.post.excerpt);
            println!();
            println!("{}", detail.post.body);
        }
        PostCommand::View { id } => {
            let views = posts::increase_views(&db, id)?;
            println!("Post {} now has {} views", id, views);
        }
        PostCommand::Delete { id } => {
            if posts::delete_post(&db, id)? {
                tracing::info!("Post {} deleted", id);
            } else {
                tracing::warn!("Post {} not found", id);
            }
        }
    }

    Ok(())
}

fn read_body(body: Option<String>, body_file: Option<PathBuf>) -> Result<Option<String>> {
    match (body, body_file) {
        (Some(_), Some(_)) => anyhow::bail!("Pass either --body or --body-file, not both"),
        (Some(body), None) => Ok(Some(body)),
        (None, Some(path)) => Ok(Some(std::fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Could not read '{}': {}", path.display(), e)
        })?)),
        (None, None) => Ok(None),
    }
}

fn author_id(db: &Database, username: &str) -> Result<i64> {
    users::get_user_by_username(db, username)?
        .map(|user| user.id)
        .ok_or_else(|| {
            BlogError::validation("author", format!("no user named '{}'", username)).into()
        })
}
