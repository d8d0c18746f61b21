use ammonia::Builder;
use once_cell::sync::Lazy;
use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::collections::HashSet;

static BLOCK_BREAK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</(p|div|li|h[1-6]|blockquote|pre|tr|table|ul|ol)\s*>|<br\s*/?>")
        .expect("Invalid block break regex pattern")
});

/// Renders post bodies to sanitized HTML and to plain text.
pub struct MarkdownRenderer {
    sanitizer: Builder<'static>,
    /// Allows no tags at all; used to reduce raw HTML to its text.
    stripper: Builder<'static>,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        let mut attrs = Builder::default().clone_tag_attributes();
        // Keep {#custom-id} heading anchors and footnote targets
        for tag in ["h1", "h2", "h3", "h4", "h5", "h6", "div"] {
            attrs.entry(tag).or_default().insert("id");
        }

        let mut sanitizer = Builder::default();
        sanitizer
            .tag_attributes(attrs)
            .add_allowed_classes("sup", &["footnote-reference", "footnote-definition-label"])
            .add_allowed_classes("div", &["footnote-definition"])
            .link_rel(Some("noopener noreferrer"));

        let mut stripper = Builder::empty();
        stripper.clean_content_tags(HashSet::from(["script", "style"]));

        Self {
            sanitizer,
            stripper,
        }
    }

    fn options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_HEADING_ATTRIBUTES
    }

    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, Self::options());
        let mut html_output = String::new();
        html::push_html(&mut html_output, parser);

        self.sanitizer.clean(&html_output).to_string()
    }

    /// Renders `markdown` and keeps only its text content: every tag and
    /// image is dropped, while text inside raw HTML survives. Block boundaries
    /// become newlines so a heading never runs into the paragraph after it.
    pub fn to_plain_text(&self, markdown: &str) -> String {
        let mut text = String::with_capacity(markdown.len());
        let mut image_depth = 0usize;
        let mut html_block: Option<String> = None;

        for event in Parser::new_ext(markdown, Self::options()) {
            match event {
                Event::Start(Tag::Image { .. }) => image_depth += 1,
                Event::End(TagEnd::Image) => image_depth = image_depth.saturating_sub(1),
                Event::Start(Tag::HtmlBlock) => html_block = Some(String::new()),
                Event::End(TagEnd::HtmlBlock) => {
                    if let Some(raw) = html_block.take() {
                        text.push_str(&self.strip_html(&raw));
                    }
                    if !text.ends_with('\n') {
                        text.push('\n');
                    }
                }
                // A tag may span lines, so block HTML is stripped as a whole
                Event::Html(raw) => match html_block.as_mut() {
                    Some(block) => block.push_str(&raw),
                    None => text.push_str(&self.strip_html(&raw)),
                },
                Event::InlineHtml(raw) if image_depth == 0 => {
                    text.push_str(&self.strip_html(&raw))
                }
                Event::Text(_) | Event::Code(_) if image_depth > 0 => {}
                Event::Text(t) | Event::Code(t) => text.push_str(&t),
                Event::SoftBreak | Event::HardBreak | Event::Rule => text.push('\n'),
                Event::End(TagEnd::TableCell) => text.push(' '),
                Event::End(end) if ends_block(&end) => {
                    if !text.ends_with('\n') {
                        text.push('\n');
                    }
                }
                _ => {}
            }
        }

        text.trim().to_string()
    }

    /// Text content of an HTML fragment, with entities decoded and a newline
    /// after each closing block tag.
    fn strip_html(&self, raw: &str) -> String {
        let broken = BLOCK_BREAK_REGEX.replace_all(raw, "$0\n");
        let cleaned = self.stripper.clean(&broken).to_string();
        decode_entities(&cleaned)
    }
}

/// Inverse of the escaping ammonia applies to text nodes.
fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

fn ends_block(end: &TagEnd) -> bool {
    matches!(
        end,
        TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::Item
            | TagEnd::CodeBlock
            | TagEnd::TableHead
            | TagEnd::TableRow
            | TagEnd::FootnoteDefinition
    )
}

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
