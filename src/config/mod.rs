use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub excerpt: ExcerptConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContentConfig {
    #[serde(default = "default_posts_per_page")]
    pub posts_per_page: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            posts_per_page: default_posts_per_page(),
        }
    }
}

/// What to store when the summarizer finds no sentence worth keeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExcerptFallback {
    /// The label followed by the start of the body text.
    #[default]
    Truncate,
    /// The label alone.
    LabelOnly,
    /// Refuse to save.
    Fail,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExcerptConfig {
    #[serde(default = "default_excerpt_label")]
    pub label: String,
    #[serde(default = "default_excerpt_terminator")]
    pub terminator: String,
    #[serde(default = "default_min_sentence_len")]
    pub min_sentence_len: usize,
    #[serde(default)]
    pub fallback: ExcerptFallback,
}

impl Default for ExcerptConfig {
    fn default() -> Self {
        Self {
            label: default_excerpt_label(),
            terminator: default_excerpt_terminator(),
            min_sentence_len: default_min_sentence_len(),
            fallback: ExcerptFallback::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminConfig {
    /// Text of the per-post "view on site" link.
    #[serde(default = "default_link_label")]
    pub link_label: String,
    #[serde(default = "default_link_column_title")]
    pub link_column_title: String,
    /// Scripts the post edit form loads for its rich-text editor.
    #[serde(default = "default_editor_assets")]
    pub editor_assets: Vec<String>,
    #[serde(default = "default_list_per_page")]
    pub list_per_page: usize,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            link_label: default_link_label(),
            link_column_title: default_link_column_title(),
            editor_assets: default_editor_assets(),
            list_per_page: default_list_per_page(),
        }
    }
}

fn default_language() -> String {
    "zh-hans".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_pool_size() -> u32 {
    10
}

fn default_posts_per_page() -> usize {
    10
}

fn default_excerpt_label() -> String {
    "摘要：".to_string()
}

fn default_excerpt_terminator() -> String {
    "。".to_string()
}

fn default_min_sentence_len() -> usize {
    6
}

fn default_link_label() -> String {
    "查看".to_string()
}

fn default_link_column_title() -> String {
    "查看站点".to_string()
}

fn default_editor_assets() -> Vec<String> {
    vec![
        "/static/js/editor/kindeditor-4.1.11/kindeditor-all.js".to_string(),
        "/static/js/editor/kindeditor-4.1.11/lang/zh_CN.js".to_string(),
        "/static/js/editor/kindeditor-4.1.11/config.js".to_string(),
    ]
}

fn default_list_per_page() -> usize {
    100
}

impl Config {
    /// A config for a fresh blog whose database lives next to the config file.
    pub fn new(title: &str) -> Self {
        Self {
            site: SiteConfig {
                title: title.to_string(),
                url: String::new(),
                language: default_language(),
            },
            server: ServerConfig::default(),
            database: DatabaseConfig {
                path: "data/inkpost.db".to_string(),
                pool_size: default_pool_size(),
            },
            content: ContentConfig::default(),
            excerpt: ExcerptConfig::default(),
            admin: AdminConfig::default(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!(
                "Could not read config file '{}': {}. Run `inkpost init` to create one.",
                path.display(),
                e
            )
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            anyhow::bail!("database.path must not be empty");
        }
        if self.database.pool_size == 0 {
            anyhow::bail!("database.pool_size must be greater than 0");
        }
        if self.content.posts_per_page == 0 {
            anyhow::bail!("content.posts_per_page must be greater than 0");
        }
        if self.content.posts_per_page > 100 {
            anyhow::bail!("content.posts_per_page must be 100 or less");
        }
        if self.excerpt.label.chars().count() >= crate::models::EXCERPT_MAX_LEN {
            anyhow::bail!(
                "excerpt.label must be shorter than {} characters",
                crate::models::EXCERPT_MAX_LEN
            );
        }
        if self.admin.list_per_page == 0 {
            anyhow::bail!("admin.list_per_page must be greater than 0");
        }
        Ok(())
    }
}
