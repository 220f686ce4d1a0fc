/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

#![allow(dead_code)]

use oocite_core::codec::{BIBLIOGRAPHY_BOOKMARK, BIBLIOGRAPHY_END_BOOKMARK};
use oocite_core::{Database, Entry, Style};
use oocite_office::{
    backend, CitationManager, Flow, MemoryDocument, Preferences, TextDocument, TextRange,
};
use oocite_processor::CitationGroupId;

// --- Styles ---

pub fn numeric_style() -> Style {
    Style::parse(
        "NAME\nNumeric test\n\n\
         PROPERTIES\nTitle=References\nIsSortByPosition=true\nIsNumberEntries=true\n\
         ReferenceParagraphFormat=Text body\nReferenceHeaderParagraphFormat=Heading 1\n\n\
         CITATION\nBracketBefore=[\nBracketAfter=]\nCitationSeparator=,\n\
         PageInfoSeparator=\"; \"\nMinimumGroupingCount=3\nGroupedNumbersSeparator=-\n\n\
         LAYOUT\ndefault=\\author: \\title.\n",
    )
    .expect("numeric test style parses")
}

pub fn author_year_style(year_separator: &str) -> Style {
    Style::parse(&format!(
        "NAME\nAuthor-year test\n\n\
         PROPERTIES\nTitle=References\nIsSortByPosition=false\nIsNumberEntries=false\n\n\
         CITATION\nYearSeparator=\"{year_separator}\"\nCitationSeparator=\"; \"\n\n\
         LAYOUT\ndefault=\\author (\\year\\uniq). \\title.\n"
    ))
    .expect("author-year test style parses")
}

/// A numeric style whose markers use a character style.
pub fn formatted_numeric_style(character_style: &str) -> Style {
    Style::parse(&format!(
        "PROPERTIES\nIsSortByPosition=true\nIsNumberEntries=true\n\n\
         CITATION\nBracketBefore=[\nBracketAfter=]\nFormatCitations=true\n\
         CitationCharacterFormat={character_style}\n\n\
         LAYOUT\ndefault=\\title\n"
    ))
    .expect("formatted test style parses")
}

// --- Bibliographic data ---

pub fn book(key: &str, author: &str, year: &str, title: &str) -> Entry {
    Entry::new(key, "book")
        .with_field("author", author)
        .with_field("year", year)
        .with_field("title", title)
}

pub fn database() -> Database {
    vec![
        book("a", "Alpha, Ann", "2000", "Apples"),
        book("b", "Beta, Bob", "2001", "Bananas"),
        book("c", "Gamma, Carl", "2002", "Cherries"),
        book("smith1", "Smith, John", "2000", "First Thoughts"),
        book("smith2", "Smith, John", "2000", "Second Thoughts"),
        book("k1", "Kay, Kim", "2010", "One"),
        book("k2", "Kay, Kim", "2011", "Two"),
        book("k3", "Kay, Kim", "2012", "Three"),
        Entry::new("proc", "proceedings")
            .with_field("editor", "Ed, Edna")
            .with_field("title", "Proceedings of Tests")
            .with_field("year", "1999"),
        Entry::new("inproc", "inproceedings")
            .with_field("author", "Doe, Jane")
            .with_field("title", "A Paper")
            .with_field("crossref", "proc"),
    ]
    .into_iter()
    .collect()
}

/// Entries for `keys`; keys missing from `db` get a bare entry.
pub fn entries(db: &Database, keys: &[&str]) -> Vec<Entry> {
    keys.iter()
        .map(|k| db.lookup_by_key(k).cloned().unwrap_or_else(|| Entry::new(k, "misc")))
        .collect()
}

// --- Document helpers ---

pub fn manager(doc: &MemoryDocument) -> CitationManager<MemoryDocument> {
    CitationManager::with_document(doc.clone(), Preferences::default())
}

/// Inserts a parenthetical citation at the view cursor without refreshing.
pub fn cite(
    manager: &mut CitationManager<MemoryDocument>,
    db: &Database,
    style: &Style,
    keys: &[&str],
) {
    manager
        .insert_citation(&entries(db, keys), &[db.clone()], style, true, true, None, false)
        .expect("citation inserted");
}

/// Visible text of every citation mark, body first, in textual order.
pub fn marker_texts(doc: &MemoryDocument) -> Vec<String> {
    marks_in_order(doc)
        .iter()
        .map(|(id, _)| backend::visible_text(doc, id).expect("mark text"))
        .collect()
}

/// Mark names of every citation group, body first, in textual order.
pub fn mark_names(doc: &MemoryDocument) -> Vec<String> {
    marks_in_order(doc)
        .into_iter()
        .map(|(id, _)| id.to_string())
        .collect()
}

/// Group ids with their ranges, body first, in textual order.
pub fn marks_in_order(doc: &MemoryDocument) -> Vec<(CitationGroupId, TextRange)> {
    let groups = backend::load_groups(doc).expect("groups load");
    let mut ranges = backend::group_ranges(doc, &groups).expect("mark ranges");
    ranges.sort_by_key(|(_, r)| (matches!(r.flow, Flow::Footnote(_)), r.start));
    ranges
}

/// Body text without the zero-width placeholders.
pub fn plain_body(doc: &MemoryDocument) -> String {
    doc.body_text().replace('\u{200b}', "")
}

/// Text between the bibliography bookmarks.
pub fn bibliography_text(doc: &MemoryDocument) -> Option<String> {
    let start = doc.bookmark_range(BIBLIOGRAPHY_BOOKMARK).ok()??;
    let end = doc.bookmark_range(BIBLIOGRAPHY_END_BOOKMARK).ok()??;
    doc.text(&TextRange::body(start.start, end.start)).ok()
}
