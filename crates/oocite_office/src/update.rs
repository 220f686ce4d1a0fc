/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Bringing every citation marker and the bibliography up to date.

use crate::backend;
use crate::bibliography;
use crate::config::Preferences;
use crate::document::edit::{check_character_style, italicize_occurrences, write_markup};
use crate::document::{with_controller_lock, TextDocument};
use crate::error::{OfficeError, Result};
use crate::range::{find_overlaps, TextRange};
use crate::visual_order::visual_order;
use oocite_core::codec::BIBLIOGRAPHY_BOOKMARK;
use oocite_core::{CitationType, Database, Style};
use oocite_processor::{
    format_bibliography, produce_citation_markers, CitationGroupId, CitationGroups, CitationMarkers,
};
use tracing::info;

/// Whether a refresh rewrites the bibliography section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BibliographyUpdate {
    Always,
    /// Only when the document already has one.
    IfPresent,
    Never,
}

/// Fails with [`OfficeError::Overlap`] if citation marks or footnote anchors
/// coincide or overlap.
pub fn check_overlaps<D: TextDocument + ?Sized>(
    doc: &D,
    ranges: &[(CitationGroupId, TextRange)],
    preferences: &Preferences,
) -> Result<()> {
    let mut owners: Vec<(TextRange, String)> = ranges
        .iter()
        .map(|(id, range)| (*range, id.to_string()))
        .collect();
    for anchor in doc.footnote_anchors()? {
        owners.push((anchor, format!("footnote mark at {}", anchor.start)));
    }
    let found = find_overlaps(
        &owners,
        preferences.report_touching_ranges,
        preferences.overlap_report_limit,
    );
    if found.is_empty() {
        return Ok(());
    }
    Err(OfficeError::Overlap(
        found
            .into_iter()
            .map(|o| format!("{}: {} and {}", o.kind, o.first, o.second))
            .collect(),
    ))
}

/// Re-reads all citation groups and rewrites their markers, then the
/// bibliography as `update` asks. Returns the unresolved keys.
pub fn refresh<D: TextDocument + ?Sized>(
    doc: &mut D,
    databases: &[Database],
    style: &Style,
    preferences: &Preferences,
    update: BibliographyUpdate,
) -> Result<Vec<String>> {
    let mut groups = backend::load_groups(doc)?;
    let ranges = backend::group_ranges(doc, &groups)?;
    check_overlaps(doc, &ranges, preferences)?;

    let order = visual_order(doc, &ranges)?;
    groups.impose_global_order(&order)?;
    let produced = produce_citation_markers(&mut groups, databases, style);

    let rebuild_bibliography = match update {
        BibliographyUpdate::Always => true,
        BibliographyUpdate::IfPresent => bibliography::has_bibliography(doc)?,
        BibliographyUpdate::Never => false,
    };
    if rebuild_bibliography {
        bibliography::check_paragraph_styles(doc, style)?;
    }
    if style.format_citations() {
        if let Some((_, first)) = ranges.first() {
            check_character_style(doc, first, &style.citation_character_format())?;
        }
    }

    with_controller_lock(doc, |doc| {
        write_markers(doc, &groups, &produced, style)?;
        if rebuild_bibliography {
            let formatted = format_bibliography(&groups, &produced.bibliography, databases, style);
            bibliography::write_bibliography(doc, &formatted, preferences)?;
        }
        Ok(())
    })?;

    info!(
        groups = groups.len(),
        unresolved = produced.unresolved_keys.len(),
        bibliography = rebuild_bibliography,
        "refreshed citations"
    );
    Ok(produced.unresolved_keys)
}

fn write_markers<D: TextDocument + ?Sized>(
    doc: &mut D,
    groups: &CitationGroups,
    produced: &CitationMarkers,
    style: &Style,
) -> Result<()> {
    let has_bibliography = doc.bookmark_range(BIBLIOGRAPHY_BOOKMARK)?.is_some();
    for group in groups.iter() {
        let marker = produced.markers.get(&group.id).map_or("", String::as_str);
        write_marker(doc, &group.id, group.citation_type, marker, style)?;
        if has_bibliography && doc.bookmark_range(BIBLIOGRAPHY_BOOKMARK)?.is_none() {
            return Err(OfficeError::Inconsistent(format!(
                "writing citation {} removed the bibliography bookmark",
                group.id
            )));
        }
    }
    Ok(())
}

/// Replaces the content of one group's mark with `marker`.
pub fn write_marker<D: TextDocument + ?Sized>(
    doc: &mut D,
    id: &CitationGroupId,
    citation_type: CitationType,
    marker: &str,
    style: &Style,
) -> Result<()> {
    let cursor = backend::fill_cursor(doc, id)?;
    let written = write_markup(doc, &cursor, marker)?;
    if !written.is_empty() {
        if style.format_citations() {
            doc.set_character_style(&written, &style.citation_character_format())?;
        }
        if style.italic_et_al() {
            italicize_occurrences(doc, &written, &style.et_al_string())?;
        }
    }
    backend::clean_fill_cursor(doc, id, citation_type == CitationType::Invisible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::edit::create_anchor;
    use crate::document::MemoryDocument;

    #[test]
    fn test_overlapping_marks_are_reported() {
        let mut doc = MemoryDocument::from_text("t", "abcdefgh");
        doc.create_reference_mark("JR_cite_1_a", &TextRange::body(0, 4)).unwrap();
        doc.create_reference_mark("JR_cite_1_b", &TextRange::body(2, 6)).unwrap();
        let groups = backend::load_groups(&doc).unwrap();
        let ranges = backend::group_ranges(&doc, &groups).unwrap();
        let err = check_overlaps(&doc, &ranges, &Preferences::default()).unwrap_err();
        let OfficeError::Overlap(pairs) = err else {
            panic!("expected overlap");
        };
        assert_eq!(pairs, vec!["OVERLAP: JR_cite_1_a and JR_cite_1_b".to_string()]);
    }

    #[test]
    fn test_touching_marks_are_fine_by_default() {
        let mut doc = MemoryDocument::from_text("t", "abcd");
        create_anchor(&mut doc, "JR_cite_1_a", &TextRange::body(4, 4), false, false).unwrap();
        create_anchor(&mut doc, "JR_cite_1_b", &TextRange::body(6, 6), false, false).unwrap();
        let groups = backend::load_groups(&doc).unwrap();
        let ranges = backend::group_ranges(&doc, &groups).unwrap();
        assert!(check_overlaps(&doc, &ranges, &Preferences::default()).is_ok());

        let strict = Preferences {
            report_touching_ranges: true,
            ..Preferences::default()
        };
        assert!(check_overlaps(&doc, &ranges, &strict).is_err());
    }

    #[test]
    fn test_write_marker_with_et_al() {
        let mut doc = MemoryDocument::from_text("t", "x");
        let range = create_anchor(&mut doc, "JR_cite_1_a", &TextRange::body(1, 1), false, false).unwrap();
        let style = Style::parse("LAYOUT\ndefault=\\title\nCITATION\nItalicEtAl=true\n").unwrap();
        let id = CitationGroupId::new("JR_cite_1_a");
        write_marker(&mut doc, &id, CitationType::Parenthetical, "(Smith et al., 2000)", &style).unwrap();
        assert_eq!(backend::visible_text(&doc, &id).unwrap(), "(Smith et al., 2000)");
        let start = backend::mark_range(&doc, &id).unwrap().start;
        assert_eq!(range.start, start);
        // "et al." follows "(Smith ".
        assert_eq!(
            doc.format_at(crate::range::Flow::Body, start + 6),
            Some(oocite_core::CharFormat::default())
        );
        assert_eq!(
            doc.format_at(crate::range::Flow::Body, start + 7),
            Some(oocite_core::CharFormat::italic())
        );
    }
}
