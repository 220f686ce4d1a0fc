/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Citation groups stored as named reference marks.
//!
//! Each group is one reference mark whose name encodes the citation type and
//! keys (see [`oocite_core::codec`]). Page info is kept in a custom document
//! property with the same name as the mark.

use crate::document::edit::{create_anchor, LEFT_BRACKET, RIGHT_BRACKET};
use crate::document::TextDocument;
use crate::error::{OfficeError, Result};
use crate::range::TextRange;
use oocite_core::{codec, markup, CitationType};
use oocite_processor::model::normalize_page_info;
use oocite_processor::{Citation, CitationGroup, CitationGroupId, CitationGroups};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Characters of context shown on each side of a citation.
const CONTEXT_CHARS: usize = 30;

/// Creates a new group at `at` and returns it with the range of its mark.
pub fn create_group<D: TextDocument + ?Sized>(
    doc: &mut D,
    keys: &[String],
    page_info: Option<&str>,
    citation_type: CitationType,
    at: &TextRange,
    space_after: bool,
    without_brackets: bool,
) -> Result<(CitationGroup, TextRange)> {
    if keys.is_empty() {
        return Err(OfficeError::IllegalArgument(
            "a citation group needs at least one key".to_string(),
        ));
    }
    let used = doc.reference_mark_names()?;
    let name = codec::unique_mark_name(keys, citation_type, &used);
    let range = create_anchor(doc, &name, at, space_after, without_brackets)?;

    let id = CitationGroupId::new(name);
    let page_info = normalize_page_info(page_info.map(str::to_string));
    set_page_info(doc, &id, page_info.as_deref())?;
    debug!(mark = %id, at = %range, "created citation mark");

    let citations = keys.iter().map(|k| Citation::new(k.as_str())).collect();
    Ok((CitationGroup::new(id, citation_type, citations, page_info), range))
}

/// Stores page info for a group, or removes a stale value.
pub fn set_page_info<D: TextDocument + ?Sized>(
    doc: &mut D,
    id: &CitationGroupId,
    page_info: Option<&str>,
) -> Result<()> {
    match page_info.map(str::trim).filter(|p| !p.is_empty()) {
        Some(page_info) => doc.set_custom_property(id.as_str(), page_info),
        None => doc.remove_custom_property(id.as_str()),
    }
}

/// The group stored under mark `name`; `None` for foreign or malformed names.
pub fn read_group<D: TextDocument + ?Sized>(doc: &D, name: &str) -> Result<Option<CitationGroup>> {
    let Some(parsed) = codec::parse_mark_name(name) else {
        return Ok(None);
    };
    let page_info = doc.custom_property(name)?;
    let citations = parsed.keys.into_iter().map(Citation::new).collect();
    Ok(Some(CitationGroup::new(
        CitationGroupId::new(name),
        parsed.citation_type,
        citations,
        page_info,
    )))
}

/// All citation groups in the document, in mark storage order.
pub fn load_groups<D: TextDocument + ?Sized>(doc: &D) -> Result<CitationGroups> {
    let mut groups = Vec::new();
    for name in doc.reference_mark_names()? {
        if !codec::is_citation_mark_name(&name) {
            continue;
        }
        match read_group(doc, &name)? {
            Some(group) => groups.push(group),
            None => warn!(mark = %name, "skipping citation mark with a malformed name"),
        }
    }
    Ok(CitationGroups::new(groups))
}

pub fn mark_range<D: TextDocument + ?Sized>(doc: &D, id: &CitationGroupId) -> Result<TextRange> {
    doc.reference_mark_range(id.as_str())?
        .ok_or_else(|| OfficeError::Inconsistent(format!("citation mark {id} is missing")))
}

/// The range of every group's mark, in storage order.
pub fn group_ranges<D: TextDocument + ?Sized>(
    doc: &D,
    groups: &CitationGroups,
) -> Result<Vec<(CitationGroupId, TextRange)>> {
    groups
        .iter()
        .map(|g| Ok((g.id.clone(), mark_range(doc, &g.id)?)))
        .collect()
}

/// The text of a group's mark as it is, placeholders included.
pub fn raw_text<D: TextDocument + ?Sized>(doc: &D, id: &CitationGroupId) -> Result<String> {
    doc.text(&mark_range(doc, id)?)
}

/// The visible text of a group's mark.
pub fn visible_text<D: TextDocument + ?Sized>(doc: &D, id: &CitationGroupId) -> Result<String> {
    Ok(raw_text(doc, id)?
        .replace(LEFT_BRACKET, "")
        .replace(RIGHT_BRACKET, ""))
}

/// Removes a group's mark and page info. The text stays.
pub fn remove_group<D: TextDocument + ?Sized>(doc: &mut D, id: &CitationGroupId) -> Result<()> {
    doc.remove_reference_mark(id.as_str())?;
    doc.remove_custom_property(id.as_str())
}

/// Empties a group's mark down to its two placeholders and returns a
/// collapsed cursor between them.
///
/// Text written at the cursor takes its attributes from the left placeholder,
/// which is inside the mark. A mark with fewer than two characters cannot be
/// written into without collapsing, so it is recreated first.
pub fn fill_cursor<D: TextDocument + ?Sized>(
    doc: &mut D,
    id: &CitationGroupId,
) -> Result<TextRange> {
    let name = id.as_str();
    let bracketed = format!("{LEFT_BRACKET}{RIGHT_BRACKET}");
    for _ in 0..2 {
        let range = mark_range(doc, id)?;
        if range.len() < 2 {
            debug!(mark = %id, "recreating citation mark");
            doc.replace(&range, "")?;
            doc.remove_reference_mark(name)?;
            create_anchor(doc, name, &range.start_point(), false, false)?;
            continue;
        }

        let flow = range.flow;
        let s = range.start;
        // Keep the outer characters while the inside is replaced, so the
        // mark never becomes empty.
        doc.replace(
            &TextRange::new(flow, s + 1, range.end - 1),
            &format!("x{LEFT_BRACKET}y{RIGHT_BRACKET}z"),
        )?;
        doc.replace(&TextRange::new(flow, s, s + 2), "")?;
        doc.replace(&TextRange::new(flow, s + 3, s + 5), "")?;
        doc.replace(&TextRange::new(flow, s + 1, s + 2), "")?;

        let range = mark_range(doc, id)?;
        if doc.text(&range)? == bracketed {
            return Ok(TextRange::collapsed(flow, range.start + 1));
        }
        warn!(mark = %id, "unexpected content after preparing citation mark");
    }
    Err(OfficeError::Inconsistent(format!(
        "cannot prepare citation mark {name} for writing"
    )))
}

/// Removes the placeholders left by [`fill_cursor`] once the content is
/// written. A placeholder stays where the mark would otherwise drop below two
/// characters, unless `remove_if_empty` is set and there is no content.
pub fn clean_fill_cursor<D: TextDocument + ?Sized>(
    doc: &mut D,
    id: &CitationGroupId,
    remove_if_empty: bool,
) -> Result<()> {
    let range = mark_range(doc, id)?;
    let text: Vec<char> = doc.text(&range)?.chars().collect();
    let left = LEFT_BRACKET.chars().next();
    let right = RIGHT_BRACKET.chars().next();
    if text.len() < 2 || text.first().copied() != left || text.last().copied() != right {
        return Err(OfficeError::Inconsistent(format!(
            "citation mark {id} lost its placeholders"
        )));
    }
    let content_len = text.len() - 2;
    let empty_and_removable = content_len == 0 && remove_if_empty;
    if content_len >= 1 || empty_and_removable {
        doc.replace(&TextRange::new(range.flow, range.end - 1, range.end), "")?;
    }
    if content_len >= 2 || empty_and_removable {
        doc.replace(&TextRange::new(range.flow, range.start, range.start + 1), "")?;
    }
    Ok(())
}

/// One row of the "manage citations" view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationEntry {
    pub mark_name: String,
    /// Surrounding text as markup, the citation itself in bold.
    pub context: String,
    pub page_info: Option<String>,
}

pub fn citation_entries<D: TextDocument + ?Sized>(
    doc: &D,
    groups: &CitationGroups,
) -> Result<Vec<CitationEntry>> {
    groups
        .iter()
        .map(|group| {
            Ok(CitationEntry {
                mark_name: group.id.to_string(),
                context: citation_context(doc, &group.id)?,
                page_info: group.page_info().map(str::to_string),
            })
        })
        .collect()
}

fn citation_context<D: TextDocument + ?Sized>(doc: &D, id: &CitationGroupId) -> Result<String> {
    let range = mark_range(doc, id)?;
    let flow_len = doc.flow_length(range.flow)?;
    let before = TextRange::new(range.flow, range.start.saturating_sub(CONTEXT_CHARS), range.start);
    let after = TextRange::new(range.flow, range.end, (range.end + CONTEXT_CHARS).min(flow_len));
    let clean = |s: String| {
        s.replace(LEFT_BRACKET, "")
            .replace(RIGHT_BRACKET, "")
            .replace('\n', " ")
    };
    Ok(format!(
        "{}<b>{}</b>{}",
        markup::escape(&clean(doc.text(&before)?)),
        markup::escape(&clean(doc.text(&range)?)),
        markup::escape(&clean(doc.text(&after)?))
    ))
}

/// Stores the page info of edited entries. Empty page info removes it.
pub fn apply_citation_entries<D: TextDocument + ?Sized>(
    doc: &mut D,
    entries: &[CitationEntry],
) -> Result<()> {
    for entry in entries {
        let id = CitationGroupId::new(entry.mark_name.as_str());
        set_page_info(doc, &id, entry.page_info.as_deref())?;
    }
    Ok(())
}

/// Custom properties named like citation marks whose mark is gone.
pub fn orphaned_page_info_properties<D: TextDocument + ?Sized>(doc: &D) -> Result<Vec<String>> {
    let marks = doc.reference_mark_names()?;
    Ok(doc
        .custom_property_names()?
        .into_iter()
        .filter(|name| codec::is_citation_mark_name(name) && !marks.contains(name))
        .collect())
}
