//! Display-side helpers over status records and links.
//!
//! Everything here works on borrowed data and returns new collections; cached
//! link lists are never filtered in place.

use crate::config::DisplayConfig;
use crate::models::{LinkResult, ModelCategory, ModelStatusRecord};
use regex::Regex;
use std::cmp::{Ordering, Reverse};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static WORD_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[_\-\s.]+").unwrap());

/// Drop links too small to be the model itself.
///
/// Google results carry no size and are always kept; everything else needs a
/// known size of at least [`DisplayConfig::MIN_DISPLAY_FILE_SIZE`].
pub fn filter_links_by_size(links: &[LinkResult]) -> Vec<LinkResult> {
    links
        .iter()
        .filter(|link| {
            link.source.is_google()
                || link
                    .file_size
                    .is_some_and(|size| size >= DisplayConfig::MIN_DISPLAY_FILE_SIZE)
        })
        .cloned()
        .collect()
}

/// Hide catalog links the backend flagged as non-exact matches.
pub fn filter_non_exact_matches(links: &[LinkResult]) -> Vec<LinkResult> {
    links
        .iter()
        .filter(|link| !(link.source.is_catalog() && link.is_non_exact_match))
        .cloned()
        .collect()
}

/// Links shown for a model: size-filtered, exact matches only, in source order.
pub fn display_links(links: &[LinkResult]) -> Vec<LinkResult> {
    let mut shown = filter_non_exact_matches(&filter_links_by_size(links));
    shown.sort_by_key(|link| link.source.display_rank());
    shown
}

/// Records grouped by detected family. A record with several families
/// appears in each group.
pub fn group_by_family<'a, I>(records: I) -> BTreeMap<String, Vec<&'a ModelStatusRecord>>
where
    I: IntoIterator<Item = &'a ModelStatusRecord>,
{
    let mut groups: BTreeMap<String, Vec<&ModelStatusRecord>> = BTreeMap::new();
    for record in records {
        for family in &record.families {
            groups.entry(family.clone()).or_default().push(record);
        }
    }
    groups
}

pub fn group_by_type<'a, I>(records: I) -> BTreeMap<ModelCategory, Vec<&'a ModelStatusRecord>>
where
    I: IntoIterator<Item = &'a ModelStatusRecord>,
{
    let mut groups: BTreeMap<ModelCategory, Vec<&ModelStatusRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.category).or_default().push(record);
    }
    groups
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Table order: used before unused, missing before installed, then by name.
pub fn display_order<'a, I>(records: I) -> Vec<&'a ModelStatusRecord>
where
    I: IntoIterator<Item = &'a ModelStatusRecord>,
{
    let mut rows: Vec<_> = records.into_iter().collect();
    rows.sort_by(|a, b| {
        b.used
            .cmp(&a.used)
            .then_with(|| a.installed.cmp(&b.installed))
            .then_with(|| compare_names(&a.name, &b.name))
    });
    rows
}

/// How well a model name matches a table search query.
///
/// Exact 1000, prefix 500, substring 100; otherwise 10 for every query word
/// contained in some word of the name. Zero means no match.
pub fn row_search_score(model_name: &str, query: &str) -> u32 {
    let name = model_name.trim().to_lowercase();
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return 0;
    }
    if name == query {
        return 1000;
    }
    if name.starts_with(&query) {
        return 500;
    }
    if name.contains(&query) {
        return 100;
    }

    let words: Vec<&str> = WORD_SEPARATORS.split(&name).collect();
    let matched = WORD_SEPARATORS
        .split(&query)
        .filter(|word| !word.is_empty())
        .filter(|query_word| words.iter().any(|word| word.contains(query_word)))
        .count();
    matched as u32 * 10
}

/// Rows reordered for a search query.
///
/// An empty query restores [`display_order`]. Otherwise used rows stay ahead
/// of unused ones; within each, matches come first by descending score, then
/// by name.
pub fn rank_rows<'a, I>(records: I, query: &str) -> Vec<(&'a ModelStatusRecord, u32)>
where
    I: IntoIterator<Item = &'a ModelStatusRecord>,
{
    let ordered = display_order(records);
    if query.trim().is_empty() {
        return ordered.into_iter().map(|record| (record, 0)).collect();
    }

    let mut rows: Vec<_> = ordered
        .into_iter()
        .map(|record| (record, row_search_score(&record.name, query)))
        .collect();
    rows.sort_by(|(a, a_score), (b, b_score)| {
        b.used
            .cmp(&a.used)
            .then_with(|| (*b_score > 0).cmp(&(*a_score > 0)))
            .then_with(|| Reverse(a_score).cmp(&Reverse(b_score)))
            .then_with(|| compare_names(&a.name, &b.name))
    });
    rows
}
