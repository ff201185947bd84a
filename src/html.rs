//! DOM cleaning helpers built on `scraper`.

use ego_tree::NodeRef;
use scraper::{Html, Node, Selector};
use url::Url;

/// Elements whose whole subtree is dropped before text extraction.
pub const STRIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "sidebar", "aside",
];

/// Title reported for documents without a usable `<title>`.
pub const DEFAULT_TITLE: &str = "No Title";

/// Title and visible body text pulled from a rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    /// Trimmed `<title>` text, or [`DEFAULT_TITLE`].
    pub title: String,
    /// Visible text with every whitespace run collapsed to one space.
    pub text: String,
}

/// Pre-parsed selectors reused across pages.
#[derive(Clone)]
pub struct HtmlExtractor {
    title: Selector,
    anchor: Selector,
}

impl HtmlExtractor {
    /// Builds the extractor and its selectors.
    pub fn new() -> Self {
        Self {
            title: Selector::parse("title").expect("title selector"),
            anchor: Selector::parse("a[href]").expect("anchor selector"),
        }
    }

    /// Extracts the title and cleaned visible text from `document`.
    pub fn extract_text(&self, document: &Html) -> ExtractedText {
        let title = document
            .select(&self.title)
            .next()
            .map(|element| collapse_whitespace(&element.text().collect::<String>()))
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let text = collapse_whitespace(&visible_text(document));
        ExtractedText { title, text }
    }

    /// Resolves every anchor `href` against `base`.
    ///
    /// Empty or unresolvable targets are skipped without error.
    pub fn outbound_links(&self, document: &Html, base: &Url) -> Vec<String> {
        document
            .select(&self.anchor)
            .filter_map(|anchor| anchor.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .filter_map(|href| base.join(href).ok())
            .map(String::from)
            .collect()
    }
}

impl Default for HtmlExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Joins text nodes in document order, skipping stripped subtrees.
///
/// Nodes are space-separated so adjacent elements never fuse words.
fn visible_text(document: &Html) -> String {
    let mut raw = String::new();
    let mut stack: Vec<NodeRef<'_, Node>> = vec![document.tree.root()];
    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Text(text) => {
                raw.push_str(text);
                raw.push(' ');
                continue;
            }
            Node::Element(element) if STRIPPED_ELEMENTS.contains(&element.name()) => continue,
            Node::Comment(_) | Node::Doctype(_) | Node::ProcessingInstruction(_) => continue,
            _ => {}
        }
        stack.extend(node.children().rev());
    }
    raw
}

/// Collapses every whitespace run into a single space and trims the ends.
pub fn collapse_whitespace(input: &str) -> String {
    let mut buf = String::with_capacity(input.len());
    let mut last_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !last_space && !buf.is_empty() {
                buf.push(' ');
            }
            last_space = true;
        } else {
            buf.push(ch);
            last_space = false;
        }
    }
    buf.trim_end().to_string()
}

/// Truncates `input` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &input[..byte_idx],
        None => input,
    }
}
