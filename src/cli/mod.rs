pub mod admin;
pub mod category;
pub mod init;
pub mod migrate;
pub mod post;
pub mod serve;
pub mod tag;
pub mod user;

use crate::{Config, Database};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "inkpost")]
#[command(version)]
#[command(about = "A small blog: posts, categories, tags and view counts", long_about = None)]
pub struct Cli {
    #[arg(short, long, default_value = "inkpost.toml", env = "INKPOST_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config file
    Init {
        #[arg(default_value = ".")]
        path: PathBuf,
        #[arg(long)]
        name: Option<String>,
    },
    /// Serve the public JSON site
    Serve {
        #[arg(short = 'H', long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    Migrate {
        #[command(subcommand)]
        command: Option<MigrateCommand>,
    },
    Post {
        #[command(subcommand)]
        command: PostCommand,
    },
    Category {
        #[command(subcommand)]
        command: LabelCommand,
    },
    Tag {
        #[command(subcommand)]
        command: LabelCommand,
    },
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
    /// Show how each model is registered in the admin
    Admin,
}

#[derive(Subcommand)]
pub enum MigrateCommand {
    Status,
}

#[derive(Subcommand)]
pub enum PostCommand {
    Add {
        #[arg(long)]
        title: String,
        /// Markdown body; read from --body-file when omitted
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        body_file: Option<PathBuf>,
        #[arg(long)]
        category: i64,
        /// Author username
        #[arg(long)]
        author: String,
        #[arg(long = "tag")]
        tags: Vec<i64>,
        #[arg(long)]
        excerpt: Option<String>,
        #[arg(long)]
        img: Option<String>,
    },
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        body_file: Option<PathBuf>,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long)]
        author: Option<String>,
        /// Replace the tag set; pass --clear-tags to remove all
        #[arg(long = "tag")]
        tags: Vec<i64>,
        #[arg(long)]
        clear_tags: bool,
        /// Pass an empty string to have the excerpt derived again
        #[arg(long)]
        excerpt: Option<String>,
        #[arg(long)]
        img: Option<String>,
        /// Overwrite the view counter; edits leave it alone otherwise
        #[arg(long)]
        views: Option<u32>,
    },
    /// Print the admin change list
    List {
        #[arg(short, long)]
        search: Option<String>,
        /// any, today, past_7_days, this_month or this_year
        #[arg(long, default_value = "any")]
        created: String,
        #[arg(long, default_value = "1")]
        page: usize,
    },
    Show {
        id: i64,
    },
    /// Record one read of a post
    View {
        id: i64,
    },
    Delete {
        id: i64,
    },
}

/// Shared by categories and tags, which have the same shape.
#[derive(Subcommand)]
pub enum LabelCommand {
    Add { name: String },
    List,
    Rename { id: i64, name: String },
    Remove { id: i64 },
}

#[derive(Subcommand)]
pub enum UserCommand {
    Add {
        #[arg(long)]
        username: String,
        #[arg(long, default_value = "")]
        email: String,
    },
    List,
    Remove {
        username: String,
    },
}

/// Loads the config and opens its database with migrations applied.
pub(crate) fn open(config_path: &Path) -> Result<(Config, Database)> {
    let config = Config::load(config_path)?;
    let db = Database::open(&config.database.path, config.database.pool_size)?;
    db.migrate()?;
    Ok((config, db))
}
