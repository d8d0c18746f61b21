use crate::services::markdown::MarkdownRenderer;
use crate::{Config, Database};

pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub markdown: MarkdownRenderer,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Self {
        Self {
            config,
            db,
            markdown: MarkdownRenderer::new(),
        }
    }
}
