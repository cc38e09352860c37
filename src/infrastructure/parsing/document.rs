//! Document traversal and text normalisation helpers
//!
//! "Following" always means document (pre-)order: the anchor's own
//! descendants come first, then everything after it.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Elements whose text never acts as an anchor
const NON_CONTENT_ELEMENTS: &[&str] = &["head", "title", "script", "style", "noscript"];

static LIST_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse("li").expect("static selector"));
static TABLE_ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("static selector"));
static TABLE_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("static selector"));

static STEP_NUMBERING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:step\s*)?\d+\s*[.):\-]\s*").expect("static pattern"));

const BULLETS: &[char] = &['•', '·', '-', '*'];

/// Reject content that cannot be treated as a page at all.
pub fn check_markup(content: &str) -> Result<(), String> {
    if content.trim().is_empty() {
        return Err("empty body".to_string());
    }
    if !content.contains('<') {
        return Err("no markup in body".to_string());
    }
    Ok(())
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// Text of the first element matched by any selector, in selector order
pub fn first_text(document: &Html, selectors: &[Selector]) -> Option<String> {
    selectors
        .iter()
        .flat_map(|selector| document.select(selector))
        .map(element_text)
        .find(|text| !text.is_empty())
}

/// Parent elements of every text node matching `pattern`, in document order
pub fn text_anchors<'a>(document: &'a Html, pattern: &'a Regex) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    document.root_element().descendants().filter_map(move |node| {
        let text = node.value().as_text()?;
        if !pattern.is_match(text) {
            return None;
        }
        let parent = node.parent().and_then(ElementRef::wrap)?;
        if NON_CONTENT_ELEMENTS.contains(&parent.value().name()) {
            return None;
        }
        Some(parent)
    })
}

/// Elements after `anchor` in document order, including its descendants
pub fn following_elements<'a>(document: &'a Html, anchor: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    let anchor_id = anchor.id();
    document
        .root_element()
        .descendants()
        .skip_while(move |node| node.id() != anchor_id)
        .skip(1)
        .filter_map(ElementRef::wrap)
}

pub fn following_element<'a>(document: &'a Html, anchor: ElementRef<'a>, names: &[&str]) -> Option<ElementRef<'a>> {
    following_elements(document, anchor).find(|element| names.contains(&element.value().name()))
}

pub fn is_named(element: ElementRef<'_>, names: &[&str]) -> bool {
    names.contains(&element.value().name())
}

pub fn list_item_texts(list: ElementRef<'_>) -> Vec<String> {
    list.select(&LIST_ITEM).map(element_text).collect()
}

/// First-cell text of every row
pub fn first_cell_texts(table: ElementRef<'_>) -> Vec<String> {
    table
        .select(&TABLE_ROW)
        .filter_map(|row| row.select(&TABLE_CELL).next())
        .map(element_text)
        .collect()
}

pub fn strip_bullets(text: &str) -> &str {
    text.trim().trim_start_matches(BULLETS).trim_start()
}

pub fn strip_step_numbering(text: &str) -> &str {
    match STEP_NUMBERING.find(text) {
        Some(numbering) => &text[numbering.end()..],
        None => text,
    }
}

/// Keep the first occurrence of each value, compared case-insensitively
pub fn dedup_case_insensitive(values: impl IntoIterator<Item = String>, cap: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.to_lowercase()))
        .take(cap)
        .collect()
}

/// Truncate to at most `max_chars` characters on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].trim_end().to_string(),
        None => text.to_string(),
    }
}
