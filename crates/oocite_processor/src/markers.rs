/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Citation marker text.
//!
//! Builders return inline markup without page info or group decoration;
//! [`finish`] adds both.

use crate::model::Resolution;
use oocite_core::{latex, markup, AuthorList, Database, Style};

/// One citation as the marker builders see it.
#[derive(Debug, Clone, Copy)]
pub struct MarkerItem<'a> {
    pub key: &'a str,
    pub resolution: &'a Resolution,
    pub unique_letter: Option<&'a str>,
    pub is_first_appearance: bool,
}

/// A numbered or unresolved entry in a numeric marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumericItem {
    Number(usize),
    Unresolved(String),
}

pub fn unresolved_marker(key: &str) -> String {
    format!("Unresolved({})", markup::escape(key))
}

/// Letters `a` to `z`, then `aa`, `ab`, ...
pub fn unique_letter(index: usize) -> String {
    let mut n = index;
    let mut letters = Vec::new();
    loop {
        letters.push((b'a' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.iter().rev().collect()
}

fn first_field(style_fields: &[String], resolution: &Resolution, databases: &[Database]) -> String {
    style_fields
        .iter()
        .find_map(|f| resolution.field(f, databases))
        .unwrap_or_default()
}

/// Author names for a marker: all names up to `max_authors`, otherwise the
/// first name followed by the et al. string. A negative limit means no limit.
pub fn author_list(
    style: &Style,
    authors: &AuthorList,
    max_authors: i64,
    last_separator: &str,
) -> String {
    let names: Vec<String> = authors
        .iter()
        .map(|a| latex::to_markup(&a.last_with_von()))
        .collect();
    let n = names.len();
    if n == 0 {
        return String::new();
    }
    let within_limit = max_authors < 0 || (n as i64) <= max_authors;
    if !within_limit {
        return format!("{}{}", names[0], markup::escape(&style.et_al_string()));
    }
    if n == 1 {
        return names[0].clone();
    }
    let mut out = names[..n - 1].join(&markup::escape(&style.author_separator()));
    if n > 2 {
        out.push_str(&markup::escape(&style.oxford_comma()));
    }
    out.push_str(&markup::escape(last_separator));
    out.push_str(&names[n - 1]);
    out
}

struct AuthorYear {
    authors: String,
    year: String,
}

fn author_year_parts(
    style: &Style,
    databases: &[Database],
    item: &MarkerItem<'_>,
    in_parenthesis: bool,
    max_authors: i64,
) -> AuthorYear {
    let names = first_field(&style.author_fields(), item.resolution, databases);
    let last_separator = if in_parenthesis {
        style.author_last_separator()
    } else {
        style.author_last_separator_in_text()
    };
    AuthorYear {
        authors: author_list(style, &AuthorList::parse(&names), max_authors, &last_separator),
        year: latex::to_markup(&first_field(&style.year_fields(), item.resolution, databases)),
    }
}

fn effective_max_authors(style: &Style, item: &MarkerItem<'_>) -> i64 {
    let first = style.max_authors_first();
    if item.is_first_appearance && first > 0 {
        first
    } else {
        style.max_authors()
    }
}

/// Consecutive items with identical author and year parts collapse into one
/// piece listing their letters: `Smith, 2000a, b`.
fn author_year_pieces(
    style: &Style,
    databases: &[Database],
    items: &[MarkerItem<'_>],
    in_parenthesis: bool,
    uncut: bool,
) -> Vec<(Option<AuthorYear>, Vec<String>)> {
    let mut pieces: Vec<(Option<AuthorYear>, Vec<String>)> = Vec::new();
    for item in items {
        if !item.resolution.is_resolved() {
            pieces.push((None, vec![unresolved_marker(item.key)]));
            continue;
        }
        let max = if uncut { -1 } else { effective_max_authors(style, item) };
        let parts = author_year_parts(style, databases, item, in_parenthesis, max);
        let letter = item.unique_letter.map(markup::escape);
        if let (Some(letter), Some((Some(prev), letters))) = (&letter, pieces.last_mut()) {
            if prev.authors == parts.authors && prev.year == parts.year && !letters.is_empty() {
                letters.push(letter.clone());
                continue;
            }
        }
        pieces.push((Some(parts), letter.into_iter().collect()));
    }
    pieces
}

/// `(Smith, 2000a; Jones & Doe, 2001)` or, in text, `Smith (2000a); Jones & Doe (2001)`.
pub fn author_year_marker(
    style: &Style,
    databases: &[Database],
    items: &[MarkerItem<'_>],
    in_parenthesis: bool,
) -> String {
    let pieces = author_year_pieces(style, databases, items, in_parenthesis, false);
    let letters_separator = markup::escape(&style.uniquefier_separator());
    let before = markup::escape(&style.bracket_before());
    let after = markup::escape(&style.bracket_after());

    let rendered: Vec<String> = pieces
        .into_iter()
        .map(|(parts, letters)| {
            let Some(AuthorYear { authors, year }) = parts else {
                return letters.join("");
            };
            let year = format!("{year}{}", letters.join(&letters_separator));
            if in_parenthesis {
                join_non_empty(&authors, &markup::escape(&style.year_separator()), &year)
            } else if year.is_empty() {
                authors
            } else {
                format!(
                    "{authors}{}{before}{year}{after}",
                    markup::escape(&style.in_text_year_separator())
                )
            }
        })
        .collect();

    let joined = rendered.join(&markup::escape(&style.citation_separator()));
    if in_parenthesis {
        format!("{before}{joined}{after}")
    } else {
        joined
    }
}

fn join_non_empty(a: &str, separator: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (false, false) => format!("{a}{separator}{b}"),
        (false, true) => a.to_string(),
        _ => b.to_string(),
    }
}

/// Single-entry parenthesis marker without author cutoff or letter, used to
/// detect entries that need disambiguation.
pub fn normalized_marker(
    style: &Style,
    databases: &[Database],
    key: &str,
    resolution: &Resolution,
) -> String {
    let item = MarkerItem {
        key,
        resolution,
        unique_letter: None,
        is_first_appearance: false,
    };
    let pieces = author_year_pieces(style, databases, &[item], true, true);
    let rendered: Vec<String> = pieces
        .into_iter()
        .map(|(parts, letters)| match parts {
            Some(AuthorYear { authors, year }) => {
                join_non_empty(&authors, &markup::escape(&style.year_separator()), &year)
            }
            None => letters.join(""),
        })
        .collect();
    format!(
        "{}{}{}",
        markup::escape(&style.bracket_before()),
        rendered.join(""),
        markup::escape(&style.bracket_after())
    )
}

/// `[1-3; 5; 8]`: duplicates dropped (first occurrence kept), runs of at
/// least `MinimumGroupingCount` consecutive numbers collapsed.
pub fn numeric_marker(style: &Style, items: &[NumericItem], for_bibliography: bool) -> String {
    let mut unique: Vec<&NumericItem> = Vec::new();
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }

    let min_group = style.minimum_grouping_count();
    let range_separator = markup::escape(&style.grouped_numbers_separator());
    let mut parts: Vec<String> = Vec::new();
    let mut i = 0;
    while i < unique.len() {
        match unique[i] {
            NumericItem::Unresolved(key) => {
                parts.push(unresolved_marker(key));
                i += 1;
            }
            NumericItem::Number(start) => {
                let mut last = *start;
                let mut end = i;
                while let Some(NumericItem::Number(next)) = unique.get(end + 1) {
                    if *next != last + 1 {
                        break;
                    }
                    last = *next;
                    end += 1;
                }
                if min_group >= 2 && end - i + 1 >= min_group {
                    parts.push(format!("{start}{range_separator}{last}"));
                    i = end + 1;
                } else {
                    parts.push(start.to_string());
                    i += 1;
                }
            }
        }
    }

    let (before, after) = if for_bibliography {
        (style.bracket_before_in_list(), style.bracket_after_in_list())
    } else {
        (style.bracket_before(), style.bracket_after())
    };
    format!(
        "{}{}{}",
        markup::escape(&before),
        parts.join(&markup::escape(&style.citation_separator())),
        markup::escape(&after)
    )
}

/// Markers that show the citation keys themselves.
pub fn citation_key_marker(style: &Style, keys: &[&str]) -> String {
    let keys: Vec<String> = keys.iter().map(|k| markup::escape(k)).collect();
    format!(
        "{}{}{}",
        markup::escape(&style.bracket_before()),
        keys.join(&markup::escape(&style.citation_separator())),
        markup::escape(&style.bracket_after())
    )
}

/// Puts page info just before the marker's final closing bracket, or after
/// a separator when the marker does not end with one.
pub fn insert_page_info(style: &Style, marker: &str, page_info: Option<&str>) -> String {
    let Some(page_info) = page_info.map(str::trim).filter(|p| !p.is_empty()) else {
        return marker.to_string();
    };
    let separator = markup::escape(&style.page_info_separator());
    let page_info = markup::escape(page_info);
    let after = markup::escape(&style.bracket_after());
    match marker.strip_suffix(after.as_str()) {
        Some(head) if !after.is_empty() => format!("{head}{separator}{page_info}{after}"),
        _ => format!("{marker}{separator}{page_info}"),
    }
}

/// Adds page info, the style's direct formatting and group markup.
pub fn finish(style: &Style, marker: &str, page_info: Option<&str>) -> String {
    let mut out = insert_page_info(style, marker, page_info);
    if style.format_citations() {
        out = markup::wrap(&out, style.citation_format());
    }
    format!(
        "{}{}{}",
        style.citation_group_markup_before(),
        out,
        style.citation_group_markup_after()
    )
}
