/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! The bibliography section at the end of the document.
//!
//! The section is everything between the start of bookmark `JR_bib` and the
//! collapsed bookmark `JR_bib_end`. Its content is rewritten on every update.

use crate::config::Preferences;
use crate::document::edit::write_markup;
use crate::document::TextDocument;
use crate::error::{OfficeError, Result};
use crate::range::{Flow, TextRange};
use oocite_core::codec::{self, BIBLIOGRAPHY_BOOKMARK, BIBLIOGRAPHY_END_BOOKMARK};
use oocite_core::Style;
use oocite_processor::FormattedBibliography;
use tracing::debug;

/// Fails before any change if a paragraph style used by the bibliography is
/// missing from the document.
pub fn check_paragraph_styles<D: TextDocument + ?Sized>(doc: &D, style: &Style) -> Result<()> {
    for name in [
        style.reference_header_paragraph_format(),
        style.reference_paragraph_format(),
    ] {
        if !doc.has_paragraph_style(&name)? {
            return Err(OfficeError::UndefinedParagraphFormat(name));
        }
    }
    Ok(())
}

pub fn has_bibliography<D: TextDocument + ?Sized>(doc: &D) -> Result<bool> {
    Ok(doc.bookmark_range(BIBLIOGRAPHY_BOOKMARK)?.is_some())
}

/// The current section, created empty at the end of the body if missing.
fn section<D: TextDocument + ?Sized>(doc: &mut D) -> Result<TextRange> {
    if let Some(start) = doc.bookmark_range(BIBLIOGRAPHY_BOOKMARK)? {
        let end = doc
            .bookmark_range(BIBLIOGRAPHY_END_BOOKMARK)?
            .filter(|e| e.flow == Flow::Body && e.start >= start.start)
            .map_or(start.end, |e| e.start.max(start.end));
        return Ok(TextRange::body(start.start, end));
    }

    doc.remove_bookmark(BIBLIOGRAPHY_END_BOOKMARK)?;
    let mut len = doc.flow_length(Flow::Body)?;
    if len > 0 && doc.text(&TextRange::body(len - 1, len))? != "\n" {
        doc.replace(&TextRange::body(len, len), "\n")?;
        len += 1;
    }
    let at = TextRange::body(len, len);
    doc.create_bookmark(BIBLIOGRAPHY_BOOKMARK, &at)?;
    doc.create_bookmark(BIBLIOGRAPHY_END_BOOKMARK, &at)?;
    debug!(at = len, "created bibliography section");
    Ok(at)
}

/// Rewrites the bibliography section.
///
/// Unresolved entries, and with `always_add_cited_on_pages` all entries, are
/// followed by page reference fields pointing at each citing mark.
pub fn write_bibliography<D: TextDocument + ?Sized>(
    doc: &mut D,
    bibliography: &FormattedBibliography,
    preferences: &Preferences,
) -> Result<()> {
    let section = section(doc)?;
    for name in doc.reference_mark_names()? {
        if !codec::is_citation_mark_name(&name) {
            continue;
        }
        if let Some(mark) = doc.reference_mark_range(&name)? {
            if section.contains(&mark) && !(mark.is_empty() && mark.start == section.start) {
                return Err(OfficeError::Inconsistent(format!(
                    "citation mark {name} is inside the bibliography"
                )));
            }
        }
    }

    doc.replace(&section, "")?;
    let start = section.start;
    let title = write_markup(doc, &TextRange::body(start, start), &bibliography.title)?;
    doc.set_paragraph_style(&title, &bibliography.header_paragraph_format)?;
    let mut pos = title.end;

    for entry in &bibliography.entries {
        pos = doc.replace(&TextRange::body(pos, pos), "\n")?.end;
        let paragraph_start = pos;
        pos = write_markup(doc, &TextRange::body(pos, pos), &entry.markup)?.end;
        if !entry.is_resolved || preferences.always_add_cited_on_pages {
            pos = doc.replace(&TextRange::body(pos, pos), " (Cited on pages: ")?.end;
            for (i, group) in entry.cited_in.iter().enumerate() {
                if i > 0 {
                    pos = doc.replace(&TextRange::body(pos, pos), ", ")?.end;
                }
                pos = doc
                    .insert_page_reference(&TextRange::body(pos, pos), group.as_str())?
                    .end;
            }
            pos = doc.replace(&TextRange::body(pos, pos), ")")?.end;
        }
        doc.set_paragraph_style(
            &TextRange::body(paragraph_start, pos),
            &bibliography.paragraph_format,
        )?;
    }

    doc.remove_bookmark(BIBLIOGRAPHY_BOOKMARK)?;
    doc.remove_bookmark(BIBLIOGRAPHY_END_BOOKMARK)?;
    doc.create_bookmark(BIBLIOGRAPHY_BOOKMARK, &TextRange::body(start, pos))?;
    doc.create_bookmark(BIBLIOGRAPHY_END_BOOKMARK, &TextRange::body(pos, pos))?;
    debug!(entries = bibliography.entries.len(), "wrote bibliography");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use oocite_processor::{BibliographyEntry, CitationGroupId};

    fn formatted(entries: Vec<BibliographyEntry>) -> FormattedBibliography {
        FormattedBibliography {
            title: "References".to_string(),
            header_paragraph_format: "Heading 1".to_string(),
            paragraph_format: "Text body".to_string(),
            entries,
        }
    }

    fn entry(key: &str, markup: &str, resolved: bool, cited_in: &[&str]) -> BibliographyEntry {
        BibliographyEntry {
            key: key.to_string(),
            markup: markup.to_string(),
            is_resolved: resolved,
            cited_in: cited_in.iter().map(|id| CitationGroupId::new(*id)).collect(),
        }
    }

    fn section_text(doc: &MemoryDocument) -> String {
        let start = doc.bookmark_range(BIBLIOGRAPHY_BOOKMARK).unwrap().unwrap();
        let end = doc.bookmark_range(BIBLIOGRAPHY_END_BOOKMARK).unwrap().unwrap();
        doc.text(&TextRange::body(start.start, end.start)).unwrap()
    }

    #[test]
    fn test_created_at_end_and_rewritten_in_place() {
        let mut doc = MemoryDocument::from_text("t", "Body.");
        let bib = formatted(vec![entry("a", "[1] <i>Book</i>", true, &["JR_cite_1_a"])]);
        write_bibliography(&mut doc, &bib, &Preferences::default()).unwrap();
        assert_eq!(doc.body_text(), "Body.\nReferences\n[1] Book");
        assert_eq!(section_text(&doc), "References\n[1] Book");
        assert_eq!(doc.paragraph_style_at(Flow::Body, 6).as_deref(), Some("Heading 1"));
        assert_eq!(doc.paragraph_style_at(Flow::Body, 18).as_deref(), Some("Text body"));
        assert_eq!(doc.format_at(Flow::Body, 21), Some(oocite_core::CharFormat::italic()));

        doc.append_body("\nAfter.");
        let bib = formatted(vec![entry("b", "[1] Other", true, &[])]);
        write_bibliography(&mut doc, &bib, &Preferences::default()).unwrap();
        assert_eq!(doc.body_text(), "Body.\nReferences\n[1] Other\nAfter.");
    }

    #[test]
    fn test_cited_on_pages_for_unresolved() {
        let mut doc = MemoryDocument::from_text("t", "xx");
        doc.create_reference_mark("JR_cite_1_missing", &TextRange::body(0, 2)).unwrap();
        let bib = formatted(vec![entry(
            "missing",
            "Unresolved(missing)",
            false,
            &["JR_cite_1_missing"],
        )]);
        write_bibliography(&mut doc, &bib, &Preferences::default()).unwrap();
        assert_eq!(
            section_text(&doc),
            "References\nUnresolved(missing) (Cited on pages: 1)"
        );
        assert_eq!(doc.page_references().len(), 1);
    }

    #[test]
    fn test_refuses_citation_inside_section() {
        let mut doc = MemoryDocument::from_text("t", "Body.\nOld bibliography");
        doc.create_bookmark(BIBLIOGRAPHY_BOOKMARK, &TextRange::body(6, 21)).unwrap();
        doc.create_reference_mark("JR_cite_1_a", &TextRange::body(10, 12)).unwrap();
        let err = write_bibliography(&mut doc, &formatted(vec![]), &Preferences::default())
            .unwrap_err();
        assert!(matches!(err, OfficeError::Inconsistent(_)));
        assert_eq!(doc.body_text(), "Body.\nOld bibliography");
    }

    #[test]
    fn test_missing_paragraph_style() {
        let doc = MemoryDocument::from_text("t", "x");
        let style = Style::parse(
            "LAYOUT\ndefault=\\title\nPROPERTIES\nReferenceParagraphFormat=Bibliography 1\n",
        )
        .unwrap();
        let err = check_paragraph_styles(&doc, &style).unwrap_err();
        assert!(matches!(err, OfficeError::UndefinedParagraphFormat(name) if name == "Bibliography 1"));
    }
}
