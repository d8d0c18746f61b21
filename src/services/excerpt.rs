use crate::config::{ExcerptConfig, ExcerptFallback};
use crate::error::BlogError;
use crate::models::EXCERPT_MAX_LEN;
use crate::services::markdown::MarkdownRenderer;
use crate::services::summarize::{Summarizer, TextRank};
use anyhow::Result;
use std::sync::Arc;

/// Builds `label + key sentence + terminator` excerpts from Markdown bodies.
pub struct ExcerptGenerator {
    renderer: MarkdownRenderer,
    summarizer: Arc<dyn Summarizer>,
    label: String,
    terminator: String,
    fallback: ExcerptFallback,
}

impl ExcerptGenerator {
    pub fn new(config: &ExcerptConfig) -> Self {
        Self::with_summarizer(config, Arc::new(TextRank::new(config.min_sentence_len)))
    }

    pub fn with_summarizer(config: &ExcerptConfig, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            renderer: MarkdownRenderer::new(),
            summarizer,
            label: config.label.clone(),
            terminator: config.terminator.clone(),
            fallback: config.fallback,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Derives an excerpt for `body`. Summarizer errors propagate unchanged.
    pub fn derive(&self, body: &str) -> Result<String> {
        let text = self.renderer.to_plain_text(body);
        let sentence = self.summarizer.key_sentences(&text, 1)?.into_iter().next();

        let excerpt = match (sentence, self.fallback) {
            (Some(sentence), _) => format!("{}{}{}", self.label, sentence, self.terminator),
            (None, ExcerptFallback::LabelOnly) => self.label.clone(),
            (None, ExcerptFallback::Truncate) => {
                let budget = EXCERPT_MAX_LEN.saturating_sub(self.label.chars().count());
                let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
                format!("{}{}", self.label, truncate_chars(&flat, budget))
            }
            (None, ExcerptFallback::Fail) => {
                return Err(
                    BlogError::validation("excerpt", "body has no sentence to summarize").into(),
                );
            }
        };

        tracing::debug!(excerpt = %excerpt, "derived excerpt");
        Ok(truncate_chars(&excerpt, EXCERPT_MAX_LEN))
    }
}

/// Cuts `s` to at most `max` characters, marking the cut with `…`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut cut: String = s.chars().take(max - 1).collect();
    cut.push('…');
    cut
}
