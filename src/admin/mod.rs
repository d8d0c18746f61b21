//! Admin registration: which columns, filters and search fields each model
//! exposes in the back office, and the change lists built from them.
//!
//! The HTML screens themselves are rendered elsewhere; this module only
//! supplies the declarations plus the queries behind them.

use crate::config::AdminConfig;
use crate::services::markdown::html_escape;
use crate::services::posts::{self, CreatedFilter, PostFilter};
use crate::services::{categories, tags, urls};
use crate::Database;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminModel {
    Post,
    Category,
    Tag,
}

impl FromStr for AdminModel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "post" | "posts" => Ok(Self::Post),
            "category" | "categories" => Ok(Self::Category),
            "tag" | "tags" => Ok(Self::Tag),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for AdminModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Post => write!(f, "post"),
            Self::Category => write!(f, "category"),
            Self::Tag => write!(f, "tag"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Title,
    Body,
    CreatedTime,
    ModifiedTime,
    Category,
    Author,
    /// Derived "view on site" link.
    ObjectLink,
    /// The row's display name; what an unconfigured admin shows.
    Name,
}

impl Column {
    pub fn header(&self, config: &AdminConfig) -> String {
        match self {
            Self::Title => "标题".to_string(),
            Self::Body => "内容".to_string(),
            Self::CreatedTime => "创建时间".to_string(),
            Self::ModifiedTime => "修改时间".to_string(),
            Self::Category => "分类".to_string(),
            Self::Author => "作者".to_string(),
            Self::ObjectLink => config.link_column_title.clone(),
            Self::Name => "名称".to_string(),
        }
    }
}

/// How one model is presented.
#[derive(Debug, Clone, Serialize)]
pub struct ModelAdmin {
    pub model: AdminModel,
    pub verbose_name: &'static str,
    pub list_display: Vec<Column>,
    pub list_filter: Vec<Column>,
    pub search_fields: Vec<Column>,
    pub list_select_related: bool,
    /// Scripts loaded on the edit form.
    pub media_js: Vec<String>,
}

impl ModelAdmin {
    /// Presentation used when a model is registered without options.
    pub fn default_for(model: AdminModel, verbose_name: &'static str) -> Self {
        Self {
            model,
            verbose_name,
            list_display: vec![Column::Name],
            list_filter: Vec::new(),
            search_fields: Vec::new(),
            list_select_related: false,
            media_js: Vec::new(),
        }
    }

    pub fn post(config: &AdminConfig) -> Self {
        Self {
            model: AdminModel::Post,
            verbose_name: "文章",
            list_display: vec![
                Column::Title,
                Column::CreatedTime,
                Column::ModifiedTime,
                Column::Category,
                Column::Author,
                Column::ObjectLink,
            ],
            list_filter: vec![Column::CreatedTime],
            search_fields: vec![Column::Title, Column::Body],
            list_select_related: true,
            media_js: config.editor_assets.clone(),
        }
    }
}

/// The `<a>` element for a post's "view on site" column.
pub fn object_link(post_id: i64, label: &str) -> String {
    format!(
        r#"<a href="{}">{}</a>"#,
        html_escape(&urls::post_url(post_id)),
        html_escape(label)
    )
}

#[derive(Debug, Clone, Default)]
pub struct ChangeListQuery {
    pub search: Option<String>,
    pub created: CreatedFilter,
    /// 1-based.
    pub page: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangeList {
    pub model: AdminModel,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total: i64,
    pub page: usize,
    pub pages: usize,
}

pub struct AdminSite {
    config: AdminConfig,
    registry: Vec<ModelAdmin>,
}

impl AdminSite {
    pub fn new(config: &AdminConfig) -> Self {
        let mut site = Self {
            config: config.clone(),
            registry: Vec::new(),
        };
        site.register(ModelAdmin::post(config));
        site.register(ModelAdmin::default_for(AdminModel::Category, "分类"));
        site.register(ModelAdmin::default_for(AdminModel::Tag, "标签"));
        site
    }

    /// Registers `admin`, replacing any earlier registration of the same model.
    pub fn register(&mut self, admin: ModelAdmin) {
        self.registry.retain(|existing| existing.model != admin.model);
        self.registry.push(admin);
    }

    pub fn get(&self, model: AdminModel) -> Option<&ModelAdmin> {
        self.registry.iter().find(|admin| admin.model == model)
    }

    pub fn registered(&self) -> &[ModelAdmin] {
        &self.registry
    }

    /// One page of the model's change list. Search and the created-time
    /// filter only apply where the model declares them.
    pub fn changelist(
        &self,
        db: &Database,
        model: AdminModel,
        query: &ChangeListQuery,
    ) -> Result<ChangeList> {
        let admin = self
            .get(model)
            .ok_or_else(|| anyhow::anyhow!("model '{}' is not registered", model))?;
        let per_page = self.config.list_per_page;
        let page = query.page.max(1);
        let offset = (page - 1) * per_page;

        let headers: Vec<String> = admin
            .list_display
            .iter()
            .map(|column| column.header(&self.config))
            .collect();

        let (rows, total) = match model {
            AdminModel::Post => {
                let filter = PostFilter {
                    search: query
                        .search
                        .clone()
                        .filter(|_| !admin.search_fields.is_empty()),
                    created: if admin.list_filter.contains(&Column::CreatedTime) {
                        query.created
                    } else {
                        CreatedFilter::Any
                    },
                    ..PostFilter::default()
                };
                let total = posts::count_posts(db, &filter)?;
                let rows: Vec<Vec<String>> = posts::list_posts(db, &filter, per_page, offset)?
                    .into_iter()
                    .map(|post| {
                        admin
                            .list_display
                            .iter()
                            .map(|column| match column {
                                Column::Title | Column::Name => post.title.clone(),
                                Column::Body => post.excerpt.clone(),
                                Column::CreatedTime => format_admin_time(&post.created_time),
                                Column::ModifiedTime => format_admin_time(&post.modified_time),
                                Column::Category => post.category.name.clone(),
                                Column::Author => post.author.username.clone(),
                                Column::ObjectLink => object_link(post.id, &self.config.link_label),
                            })
                            .collect::<Vec<String>>()
                    })
                    .collect();
                (rows, total)
            }
            AdminModel::Category => {
                let names: Vec<String> = categories::list_categories(db)?
                    .into_iter()
                    .map(|category| category.name)
                    .collect();
                paginate_names(names, offset, per_page)
            }
            AdminModel::Tag => {
                let names: Vec<String> = tags::list_tags(db)?
                    .into_iter()
                    .map(|tag| tag.name)
                    .collect();
                paginate_names(names, offset, per_page)
            }
        };

        let pages = ((total.max(0) as usize) + per_page - 1) / per_page;
        Ok(ChangeList {
            model,
            headers,
            rows,
            total,
            page,
            pages: pages.max(1),
        })
    }
}

fn paginate_names(names: Vec<String>, offset: usize, per_page: usize) -> (Vec<Vec<String>>, i64) {
    let total = names.len() as i64;
    let rows = names
        .into_iter()
        .skip(offset)
        .take(per_page)
        .map(|name| vec![name])
        .collect();
    (rows, total)
}

fn format_admin_time(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M").to_string()
}
