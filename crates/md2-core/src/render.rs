use std::collections::HashMap;

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use thiserror::Error;

/// Failure surfaced by a [`Renderer`]. Carries a message only; the caller
/// attaches the document path via [`crate::ComposeError::at`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RenderError {
    message: String,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Markdown-to-HTML capability: bytes in, HTML bytes out, or a structured
/// failure. Implementations must behave as pure functions of their input so
/// one instance can be shared across every document of an operation.
pub trait Renderer {
    fn render(&self, markdown: &[u8]) -> Result<Vec<u8>, RenderError>;
}

/// Renderer backed by pulldown-cmark with the GitHub-flavored extension set:
/// tables, strikethrough, task lists, footnotes, definition lists, alert
/// blockquotes, and `{#id}` heading attributes. Raw HTML in the source passes
/// through unsanitized. Headings without an explicit id receive one derived
/// from their text, deduplicated within the document.
#[derive(Debug, Default, Clone, Copy)]
pub struct CmarkRenderer;

impl CmarkRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for CmarkRenderer {
    fn render(&self, markdown: &[u8]) -> Result<Vec<u8>, RenderError> {
        let text = std::str::from_utf8(markdown)
            .map_err(|err| RenderError::new(format!("input is not valid UTF-8: {err}")))?;

        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_DEFINITION_LIST);
        options.insert(Options::ENABLE_GFM);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        let events = with_heading_ids(Parser::new_ext(text, options));
        let mut output = String::with_capacity(text.len() + text.len() / 2);
        html::push_html(&mut output, events.into_iter());
        Ok(output.into_bytes())
    }
}

/// Give every heading an anchor id so `href="#fragment"` links work.
/// Explicit `{#id}` attributes win; everything else gets a slug of the
/// heading text. Duplicate slugs gain `-1`, `-2`, ... suffixes in document
/// order.
fn with_heading_ids<'a, I>(events: I) -> Vec<Event<'a>>
where
    I: Iterator<Item = Event<'a>>,
{
    let mut out = Vec::new();
    let mut used: HashMap<String, usize> = HashMap::new();
    // Index of the open heading's Start event plus its accumulated text.
    let mut open: Option<(usize, String)> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                open = Some((out.len(), String::new()));
                out.push(event);
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((start, text)) = open.take() {
                    if let Event::Start(Tag::Heading { id, .. }) = &mut out[start] {
                        let slug = match id.take() {
                            Some(explicit) => explicit.into_string(),
                            None => slugify(&text),
                        };
                        *id = Some(CowStr::from(dedupe(slug, &mut used)));
                    }
                }
                out.push(event);
            }
            Event::Text(ref text) | Event::Code(ref text) => {
                if let Some((_, acc)) = open.as_mut() {
                    acc.push_str(text);
                }
                out.push(event);
            }
            _ => out.push(event),
        }
    }

    out
}

fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for ch in text.trim().chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if ch == ' ' {
            slug.push('-');
        } else if ch == '-' || ch == '_' {
            slug.push(ch);
        }
    }
    if slug.is_empty() {
        slug.push_str("heading");
    }
    slug
}

fn dedupe(slug: String, used: &mut HashMap<String, usize>) -> String {
    match used.get_mut(&slug) {
        None => {
            used.insert(slug.clone(), 0);
            slug
        }
        Some(count) => {
            *count += 1;
            format!("{slug}-{count}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(markdown: &str) -> String {
        let html = CmarkRenderer::new().render(markdown.as_bytes()).unwrap();
        String::from_utf8(html).unwrap()
    }

    #[test]
    fn assigns_an_anchor_id_to_headings() {
        assert_eq!(render("# Title\n"), "<h1 id=\"title\">Title</h1>\n");
    }

    #[test]
    fn slugs_join_words_with_hyphens() {
        assert_eq!(
            render("## Getting Started\n"),
            "<h2 id=\"getting-started\">Getting Started</h2>\n"
        );
    }

    #[test]
    fn slugs_include_code_span_text() {
        assert_eq!(
            render("# Using `md2`\n"),
            "<h1 id=\"using-md2\">Using <code>md2</code></h1>\n"
        );
    }

    #[test]
    fn explicit_heading_attribute_wins() {
        assert_eq!(
            render("# Title {#custom}\n"),
            "<h1 id=\"custom\">Title</h1>\n"
        );
    }

    #[test]
    fn duplicate_headings_get_numbered_suffixes() {
        assert_eq!(
            render("## Setup\n\n## Setup\n"),
            "<h2 id=\"setup\">Setup</h2>\n<h2 id=\"setup-1\">Setup</h2>\n"
        );
    }

    #[test]
    fn punctuation_only_headings_fall_back_to_a_stable_slug() {
        assert_eq!(render("# !!!\n"), "<h1 id=\"heading\">!!!</h1>\n");
    }

    #[test]
    fn renders_gfm_tables() {
        let html = render("| a | b |\n| - | - |\n| 1 | 2 |\n");
        assert!(html.contains("<table>"), "missing table in: {html}");
        assert!(html.contains("<th>a</th>"), "missing header cell in: {html}");
    }

    #[test]
    fn renders_strikethrough() {
        assert!(render("~~gone~~\n").contains("<del>gone</del>"));
    }

    #[test]
    fn renders_task_lists() {
        let html = render("- [x] done\n- [ ] open\n");
        assert!(html.contains("type=\"checkbox\""), "missing checkbox in: {html}");
    }

    #[test]
    fn renders_footnotes() {
        let html = render("body[^1]\n\n[^1]: note\n");
        assert!(html.contains("footnote"), "missing footnote markup in: {html}");
    }

    #[test]
    fn renders_definition_lists() {
        let html = render("term\n: definition\n");
        assert!(html.contains("<dt>"), "missing <dt> in: {html}");
        assert!(html.contains("<dd>"), "missing <dd> in: {html}");
    }

    #[test]
    fn passes_raw_html_through_unsanitized() {
        let html = render("<script>alert(1)</script>\n");
        assert!(html.contains("<script>alert(1)</script>"));
    }

    #[test]
    fn rejects_invalid_utf8_input() {
        let err = CmarkRenderer::new().render(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }
}
