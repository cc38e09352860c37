//! Field strategies for part detail pages
//!
//! Each function is one named step of a field cascade. They are pure
//! functions of the extraction context and return `None` when the page does
//! not carry the field in the shape they look for.

use regex::Regex;
use scraper::Selector;

use super::context::ExtractionContext;
use super::document::{
    dedup_case_insensitive, element_text, first_cell_texts, first_text, following_element,
    is_named, list_item_texts, normalize_whitespace, strip_bullets, strip_step_numbering, text_anchors,
    truncate_chars,
};
use crate::domain::{InstallStep, Price};

const LIST_CONTAINERS: &[&str] = &["ul", "ol"];
const MODEL_CONTAINERS: &[&str] = &["table", "ul", "ol", "div"];

// Display name

pub fn title_tag(ctx: &ExtractionContext<'_>) -> Option<String> {
    let title = first_text(ctx.document, &ctx.rules.title)?;
    let before_separator = title.split('|').next().unwrap_or_default();
    Some(trim_part_numbers(ctx, before_separator))
}

pub fn h1_heading(ctx: &ExtractionContext<'_>) -> Option<String> {
    let heading = first_text(ctx.document, &ctx.rules.heading)?;
    Some(trim_part_numbers(ctx, &heading))
}

/// Cut the name at the first occurrence of the part's own numbers
fn trim_part_numbers(ctx: &ExtractionContext<'_>, name: &str) -> String {
    let cut = [Some(ctx.identifier), ctx.manufacturer_id]
        .into_iter()
        .flatten()
        .filter(|number| !number.is_empty())
        .filter_map(|number| name.find(number))
        .min()
        .unwrap_or(name.len());

    name[..cut]
        .trim()
        .trim_end_matches(['-', ':', '–', ',', '('])
        .trim()
        .to_string()
}

// Price

/// First currency-like numeric token in `text`, if it is a positive amount
pub fn parse_price_token(text: &str, token: &Regex) -> Option<Price> {
    let amount = token.captures(text)?.get(1)?;
    Price::parse_amount(amount.as_str())
}

fn first_price(ctx: &ExtractionContext<'_>, selectors: &[Selector]) -> Option<Price> {
    selectors
        .iter()
        .flat_map(|selector| ctx.document.select(selector))
        .find_map(|element| {
            let raw = element
                .value()
                .attr("content")
                .map(str::to_string)
                .unwrap_or_else(|| element_text(element));
            parse_price_token(&raw, &ctx.rules.price_token)
        })
}

pub fn structured_price(ctx: &ExtractionContext<'_>) -> Option<Price> {
    first_price(ctx, &ctx.rules.structured_price)
}

pub fn price_element(ctx: &ExtractionContext<'_>) -> Option<Price> {
    first_price(ctx, &ctx.rules.price_element)
}

// Description

fn first_long_text(ctx: &ExtractionContext<'_>, selectors: &[Selector], content_attr: bool) -> Option<String> {
    let limits = ctx.limits;
    selectors
        .iter()
        .flat_map(|selector| ctx.document.select(selector))
        .map(|element| {
            let attr = if content_attr { element.value().attr("content") } else { None };
            match attr {
                Some(content) => normalize_whitespace(content),
                None => element_text(element),
            }
        })
        .find(|text| text.chars().count() >= limits.min_description_chars)
        .map(|text| truncate_chars(&text, limits.max_description_chars))
}

pub fn itemprop_description(ctx: &ExtractionContext<'_>) -> Option<String> {
    first_long_text(ctx, &ctx.rules.itemprop_description, true)
}

pub fn description_container(ctx: &ExtractionContext<'_>) -> Option<String> {
    first_long_text(ctx, &ctx.rules.description_container, false)
}

pub fn meta_description(ctx: &ExtractionContext<'_>) -> Option<String> {
    first_long_text(ctx, &ctx.rules.meta_description, true)
}

// Symptoms

/// Strip bullets, lowercase, drop short entries, dedup and cap
pub fn normalize_symptoms(items: Vec<String>, min_chars: usize, cap: usize) -> Vec<String> {
    let cleaned = items
        .iter()
        .map(|item| normalize_whitespace(strip_bullets(item)).to_lowercase())
        .filter(|item| item.chars().count() >= min_chars);
    dedup_case_insensitive(cleaned, cap)
}

fn symptoms_after(ctx: &ExtractionContext<'_>, anchor_pattern: &Regex, cap: usize) -> Option<Vec<String>> {
    text_anchors(ctx.document, anchor_pattern).find_map(|anchor| {
        let list = following_element(ctx.document, anchor, LIST_CONTAINERS)?;
        let symptoms = normalize_symptoms(list_item_texts(list), ctx.limits.min_symptom_chars, cap);
        (!symptoms.is_empty()).then_some(symptoms)
    })
}

pub fn symptoms_list_after_anchor(ctx: &ExtractionContext<'_>) -> Option<Vec<String>> {
    symptoms_after(ctx, &ctx.rules.symptoms_anchor, ctx.limits.max_symptoms)
}

pub fn symptoms_list_after_keyword(ctx: &ExtractionContext<'_>) -> Option<Vec<String>> {
    let cap = ctx.limits.max_symptoms_fallback.min(ctx.limits.max_symptoms);
    symptoms_after(ctx, &ctx.rules.symptoms_keyword_anchor, cap)
}

// Compatible models

pub fn normalize_models(items: Vec<String>, min_chars: usize, cap: usize) -> Vec<String> {
    let cleaned = items
        .iter()
        .map(|item| normalize_whitespace(item))
        .filter(|item| item.chars().count() >= min_chars);
    dedup_case_insensitive(cleaned, cap)
}

fn model_links_within(ctx: &ExtractionContext<'_>, container: scraper::ElementRef<'_>) -> Vec<String> {
    ctx.rules
        .model_link
        .iter()
        .flat_map(|selector| container.select(selector))
        .map(element_text)
        .collect()
}

pub fn model_links_after_anchor(ctx: &ExtractionContext<'_>) -> Option<Vec<String>> {
    let anchor = text_anchors(ctx.document, &ctx.rules.models_anchor).next()?;
    let container = following_element(ctx.document, anchor, MODEL_CONTAINERS)?;
    let links = model_links_within(ctx, container);
    if links.is_empty() {
        return None;
    }
    Some(normalize_models(links, ctx.limits.min_model_chars, ctx.limits.max_compatible_models))
}

pub fn list_items_after_anchor(ctx: &ExtractionContext<'_>) -> Option<Vec<String>> {
    let anchor = text_anchors(ctx.document, &ctx.rules.models_anchor).next()?;
    let container = following_element(ctx.document, anchor, &["ul", "ol", "table"])?;
    let items = if is_named(container, &["table"]) {
        first_cell_texts(container)
    } else {
        list_item_texts(container)
    };
    Some(normalize_models(items, ctx.limits.min_model_chars, ctx.limits.max_compatible_models))
}

pub fn spare_part_itemprop(ctx: &ExtractionContext<'_>) -> Option<Vec<String>> {
    let items = ctx
        .rules
        .spare_part_itemprop
        .iter()
        .flat_map(|selector| ctx.document.select(selector))
        .map(element_text)
        .collect();
    Some(normalize_models(items, ctx.limits.min_model_chars, ctx.limits.max_compatible_models))
}

// Install steps

/// Strip source numbering, skip empty items, renumber from 1
pub fn number_steps(items: Vec<String>, cap: usize) -> Vec<InstallStep> {
    items
        .iter()
        .map(|item| normalize_whitespace(strip_step_numbering(item)))
        .filter(|text| !text.is_empty())
        .take(cap)
        .zip(1u32..)
        .map(|(text, number)| InstallStep { number, text })
        .collect()
}

pub fn ordered_list_after_install_heading(ctx: &ExtractionContext<'_>) -> Option<Vec<InstallStep>> {
    ctx.rules
        .install_heading
        .iter()
        .flat_map(|selector| ctx.document.select(selector))
        .filter(|heading| ctx.rules.install_anchor.is_match(&element_text(*heading)))
        .find_map(|heading| {
            let list = following_element(ctx.document, heading, &["ol"])?;
            let steps = number_steps(list_item_texts(list), ctx.limits.max_install_steps);
            (!steps.is_empty()).then_some(steps)
        })
}

pub fn list_after_install_text(ctx: &ExtractionContext<'_>) -> Option<Vec<InstallStep>> {
    text_anchors(ctx.document, &ctx.rules.install_anchor).find_map(|anchor| {
        let list = following_element(ctx.document, anchor, LIST_CONTAINERS)?;
        let steps = number_steps(list_item_texts(list), ctx.limits.max_install_steps);
        (!steps.is_empty()).then_some(steps)
    })
}
