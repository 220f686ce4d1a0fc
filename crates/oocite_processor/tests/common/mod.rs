/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

#![allow(dead_code)]

use oocite_core::{CitationType, Database, Entry, Style};
use oocite_processor::{Citation, CitationGroup, CitationGroupId, CitationMarkers};

// --- Styles ---

pub fn numeric_style() -> Style {
    Style::parse(
        "NAME\nNumeric\n\nPROPERTIES\nIsNumberEntries=true\nIsSortByPosition=true\n\n\
         CITATION\nBracketBefore=[\nBracketAfter=]\nCitationSeparator=\"; \"\n\
         MinimumGroupingCount=3\nGroupedNumbersSeparator=-\n\n\
         LAYOUT\ndefault=\\author. \\title.\n",
    )
    .expect("numeric style parses")
}

pub fn author_year_style() -> Style {
    Style::parse("NAME\nAuthor-year\n\nLAYOUT\ndefault=\\author (\\year\\uniq). \\title.\n")
        .expect("author-year style parses")
}

// --- Data ---

pub fn book(key: &str, author: &str, year: &str, title: &str) -> Entry {
    Entry::new(key, "book")
        .with_field("author", author)
        .with_field("year", year)
        .with_field("title", title)
}

/// Eight books by different authors, keyed `a` to `h`.
pub fn letters_database() -> Database {
    ["a", "b", "c", "d", "e", "f", "g", "h"]
        .iter()
        .enumerate()
        .map(|(i, k)| book(k, &format!("Author{k}, A."), &format!("{}", 2000 + i), &format!("Title {k}")))
        .collect()
}

pub fn group(id: &str, keys: &[&str]) -> CitationGroup {
    CitationGroup::new(
        CitationGroupId::new(id),
        CitationType::Parenthetical,
        keys.iter().map(|k| Citation::new(*k)).collect(),
        None,
    )
}

pub fn marker<'a>(result: &'a CitationMarkers, id: &str) -> &'a str {
    &result.markers[&CitationGroupId::new(id)]
}
