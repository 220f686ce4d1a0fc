/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Style descriptors.
//!
//! A style file is plain text with the sections `NAME`, `LAYOUT`, `PROPERTIES`,
//! `CITATION` and `JOURNALS`:
//!
//! ```text
//! NAME
//! Author-year demo
//!
//! LAYOUT
//! article=\author (\year\uniq). \title. <i>\journal</i>.
//! default=\author (\year\uniq). \title.
//!
//! PROPERTIES
//! Title="References"
//! IsSortByPosition=false
//! IsNumberEntries=false
//!
//! CITATION
//! BracketBefore=(
//! BracketAfter=)
//! MaxAuthors=2
//! ```
//!
//! `PROPERTIES` configures the bibliography, `CITATION` the in-text markers.
//! Options missing from the file take the defaults below.

pub mod layout;
mod parser;

use crate::error::Result;
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub use layout::{Layout, LayoutContext, LayoutFormatter, LayoutNode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl PropertyValue {
    fn as_string(&self) -> String {
        match self {
            PropertyValue::Int(n) => n.to_string(),
            PropertyValue::Bool(b) => b.to_string(),
            PropertyValue::Str(s) => s.clone(),
        }
    }
}

// PROPERTIES
const TITLE: &str = "Title";
const SORT_ALGORITHM: &str = "SortAlgorithm";
const IS_SORT_BY_POSITION: &str = "IsSortByPosition";
const IS_NUMBER_ENTRIES: &str = "IsNumberEntries";
const REFERENCE_PARAGRAPH_FORMAT: &str = "ReferenceParagraphFormat";
const REFERENCE_HEADER_PARAGRAPH_FORMAT: &str = "ReferenceHeaderParagraphFormat";

// CITATION
const AUTHOR_FIELD: &str = "AuthorField";
const YEAR_FIELD: &str = "YearField";
const MAX_AUTHORS: &str = "MaxAuthors";
const MAX_AUTHORS_FIRST: &str = "MaxAuthorsFirst";
const AUTHOR_SEPARATOR: &str = "AuthorSeparator";
const AUTHOR_LAST_SEPARATOR: &str = "AuthorLastSeparator";
const AUTHOR_LAST_SEPARATOR_IN_TEXT: &str = "AuthorLastSeparatorInText";
const OXFORD_COMMA: &str = "OxfordComma";
const ET_AL_STRING: &str = "EtAlString";
const YEAR_SEPARATOR: &str = "YearSeparator";
const IN_TEXT_YEAR_SEPARATOR: &str = "InTextYearSeparator";
const BRACKET_BEFORE: &str = "BracketBefore";
const BRACKET_AFTER: &str = "BracketAfter";
const BRACKET_BEFORE_IN_LIST: &str = "BracketBeforeInList";
const BRACKET_AFTER_IN_LIST: &str = "BracketAfterInList";
const CITATION_SEPARATOR: &str = "CitationSeparator";
const PAGE_INFO_SEPARATOR: &str = "PageInfoSeparator";
const UNIQUEFIER_SEPARATOR: &str = "UniquefierSeparator";
const GROUPED_NUMBERS_SEPARATOR: &str = "GroupedNumbersSeparator";
const MINIMUM_GROUPING_COUNT: &str = "MinimumGroupingCount";
const FORMAT_CITATIONS: &str = "FormatCitations";
const CITATION_CHARACTER_FORMAT: &str = "CitationCharacterFormat";
const ITALIC_CITATIONS: &str = "ItalicCitations";
const BOLD_CITATIONS: &str = "BoldCitations";
const SUPERSCRIPT_CITATIONS: &str = "SuperscriptCitations";
const SUBSCRIPT_CITATIONS: &str = "SubscriptCitations";
const MULTI_CITE_CHRONOLOGICAL: &str = "MultiCiteChronological";
const CITATION_KEY_CITE_MARKERS: &str = "CitationKeyCiteMarkers";
const BIBTEX_KEY_CITATIONS: &str = "BibTeXKeyCitations";
const ITALIC_ET_AL: &str = "ItalicEtAl";
const CITATION_GROUP_MARKUP_BEFORE: &str = "CitationGroupMarkupBefore";
const CITATION_GROUP_MARKUP_AFTER: &str = "CitationGroupMarkupAfter";

/// A parsed style descriptor.
#[derive(Debug, Clone)]
pub struct Style {
    name: String,
    journals: BTreeSet<String>,
    layouts: IndexMap<String, Layout>,
    default_layout: Layout,
    properties: IndexMap<String, PropertyValue>,
    citation_properties: IndexMap<String, PropertyValue>,
}

impl Style {
    pub fn parse(src: &str) -> Result<Self> {
        parser::parse(src)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let src = fs::read_to_string(path)?;
        Self::parse(&src)
    }

    fn with_defaults() -> Self {
        use PropertyValue::{Bool, Int, Str};
        let s = |v: &str| Str(v.to_string());

        let properties = IndexMap::from([
            (TITLE.to_string(), s("Bibliography")),
            (SORT_ALGORITHM.to_string(), s("alphanumeric")),
            (IS_SORT_BY_POSITION.to_string(), Bool(false)),
            (IS_NUMBER_ENTRIES.to_string(), Bool(false)),
            (REFERENCE_PARAGRAPH_FORMAT.to_string(), s("Standard")),
            (REFERENCE_HEADER_PARAGRAPH_FORMAT.to_string(), s("Heading 1")),
        ]);
        let citation_properties = IndexMap::from([
            (AUTHOR_FIELD.to_string(), s("author/editor")),
            (YEAR_FIELD.to_string(), s("year")),
            (MAX_AUTHORS.to_string(), Int(3)),
            (MAX_AUTHORS_FIRST.to_string(), Int(-1)),
            (AUTHOR_SEPARATOR.to_string(), s(", ")),
            (AUTHOR_LAST_SEPARATOR.to_string(), s(" & ")),
            (OXFORD_COMMA.to_string(), s("")),
            (ET_AL_STRING.to_string(), s(" et al.")),
            (YEAR_SEPARATOR.to_string(), s(", ")),
            (IN_TEXT_YEAR_SEPARATOR.to_string(), s(" ")),
            (BRACKET_BEFORE.to_string(), s("(")),
            (BRACKET_AFTER.to_string(), s(")")),
            (CITATION_SEPARATOR.to_string(), s("; ")),
            (PAGE_INFO_SEPARATOR.to_string(), s("; ")),
            (UNIQUEFIER_SEPARATOR.to_string(), s(", ")),
            (GROUPED_NUMBERS_SEPARATOR.to_string(), s("-")),
            (MINIMUM_GROUPING_COUNT.to_string(), Int(3)),
            (FORMAT_CITATIONS.to_string(), Bool(false)),
            (CITATION_CHARACTER_FORMAT.to_string(), s("Standard")),
            (ITALIC_CITATIONS.to_string(), Bool(false)),
            (BOLD_CITATIONS.to_string(), Bool(false)),
            (SUPERSCRIPT_CITATIONS.to_string(), Bool(false)),
            (SUBSCRIPT_CITATIONS.to_string(), Bool(false)),
            (MULTI_CITE_CHRONOLOGICAL.to_string(), Bool(true)),
            (CITATION_KEY_CITE_MARKERS.to_string(), Bool(false)),
            (ITALIC_ET_AL.to_string(), Bool(false)),
            (CITATION_GROUP_MARKUP_BEFORE.to_string(), s("")),
            (CITATION_GROUP_MARKUP_AFTER.to_string(), s("")),
        ]);

        Self {
            name: String::new(),
            journals: BTreeSet::new(),
            layouts: IndexMap::new(),
            default_layout: Layout::default(),
            properties,
            citation_properties,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn journals(&self) -> &BTreeSet<String> {
        &self.journals
    }

    pub fn is_journal(&self, name: &str) -> bool {
        self.journals.contains(name)
    }

    /// Entry types with a layout of their own, besides `default`.
    pub fn layout_types(&self) -> impl Iterator<Item = &str> {
        self.layouts.keys().map(String::as_str)
    }

    pub fn layout_for(&self, entry_type: &str) -> &Layout {
        self.layouts
            .get(&entry_type.to_lowercase())
            .unwrap_or(&self.default_layout)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn citation_property(&self, name: &str) -> Option<&PropertyValue> {
        self.citation_properties.get(name)
    }

    fn prop_str(&self, name: &str) -> String {
        self.properties.get(name).map(PropertyValue::as_string).unwrap_or_default()
    }

    fn prop_bool(&self, name: &str) -> bool {
        matches!(self.properties.get(name), Some(PropertyValue::Bool(true)))
    }

    fn cit_str(&self, name: &str) -> String {
        self.citation_properties
            .get(name)
            .map(PropertyValue::as_string)
            .unwrap_or_default()
    }

    fn cit_opt_str(&self, name: &str) -> Option<String> {
        self.citation_properties.get(name).map(PropertyValue::as_string)
    }

    fn cit_int(&self, name: &str) -> i64 {
        match self.citation_properties.get(name) {
            Some(PropertyValue::Int(n)) => *n,
            _ => 0,
        }
    }

    fn cit_bool(&self, name: &str) -> bool {
        matches!(self.citation_properties.get(name), Some(PropertyValue::Bool(true)))
    }

    pub fn title(&self) -> String {
        self.prop_str(TITLE)
    }

    pub fn sort_algorithm(&self) -> String {
        self.prop_str(SORT_ALGORITHM)
    }

    pub fn is_sort_by_position(&self) -> bool {
        self.prop_bool(IS_SORT_BY_POSITION)
    }

    pub fn is_numeric(&self) -> bool {
        self.prop_bool(IS_NUMBER_ENTRIES)
    }

    pub fn reference_paragraph_format(&self) -> String {
        self.prop_str(REFERENCE_PARAGRAPH_FORMAT)
    }

    pub fn reference_header_paragraph_format(&self) -> String {
        self.prop_str(REFERENCE_HEADER_PARAGRAPH_FORMAT)
    }

    /// Fields tried in order for the author part of a marker.
    pub fn author_fields(&self) -> Vec<String> {
        split_fields(&self.cit_str(AUTHOR_FIELD))
    }

    pub fn year_fields(&self) -> Vec<String> {
        split_fields(&self.cit_str(YEAR_FIELD))
    }

    pub fn max_authors(&self) -> i64 {
        self.cit_int(MAX_AUTHORS)
    }

    /// Author cutoff for the first citation of a source; negative when unset.
    pub fn max_authors_first(&self) -> i64 {
        self.cit_int(MAX_AUTHORS_FIRST)
    }

    pub fn author_separator(&self) -> String {
        self.cit_str(AUTHOR_SEPARATOR)
    }

    pub fn author_last_separator(&self) -> String {
        self.cit_str(AUTHOR_LAST_SEPARATOR)
    }

    pub fn author_last_separator_in_text(&self) -> String {
        self.cit_opt_str(AUTHOR_LAST_SEPARATOR_IN_TEXT)
            .unwrap_or_else(|| self.author_last_separator())
    }

    pub fn oxford_comma(&self) -> String {
        self.cit_str(OXFORD_COMMA)
    }

    pub fn et_al_string(&self) -> String {
        self.cit_str(ET_AL_STRING)
    }

    pub fn year_separator(&self) -> String {
        self.cit_str(YEAR_SEPARATOR)
    }

    pub fn in_text_year_separator(&self) -> String {
        self.cit_str(IN_TEXT_YEAR_SEPARATOR)
    }

    pub fn bracket_before(&self) -> String {
        self.cit_str(BRACKET_BEFORE)
    }

    pub fn bracket_after(&self) -> String {
        self.cit_str(BRACKET_AFTER)
    }

    /// Brackets around numbers in the bibliography.
    ///
    /// The two in-list brackets form a pair: when only one is given, the other
    /// mirrors it, and otherwise falls back to the in-text bracket.
    pub fn bracket_before_in_list(&self) -> String {
        match (
            self.cit_opt_str(BRACKET_BEFORE_IN_LIST),
            self.cit_opt_str(BRACKET_AFTER_IN_LIST),
        ) {
            (Some(before), _) => before,
            (None, Some(after)) => mirror_bracket(&after).unwrap_or_else(|| self.bracket_before()),
            (None, None) => self.bracket_before(),
        }
    }

    pub fn bracket_after_in_list(&self) -> String {
        match (
            self.cit_opt_str(BRACKET_BEFORE_IN_LIST),
            self.cit_opt_str(BRACKET_AFTER_IN_LIST),
        ) {
            (_, Some(after)) => after,
            (Some(before), None) => mirror_bracket(&before).unwrap_or_else(|| self.bracket_after()),
            (None, None) => self.bracket_after(),
        }
    }

    pub fn citation_separator(&self) -> String {
        self.cit_str(CITATION_SEPARATOR)
    }

    pub fn page_info_separator(&self) -> String {
        self.cit_str(PAGE_INFO_SEPARATOR)
    }

    pub fn uniquefier_separator(&self) -> String {
        self.cit_str(UNIQUEFIER_SEPARATOR)
    }

    pub fn grouped_numbers_separator(&self) -> String {
        self.cit_str(GROUPED_NUMBERS_SEPARATOR)
    }

    pub fn minimum_grouping_count(&self) -> usize {
        usize::try_from(self.cit_int(MINIMUM_GROUPING_COUNT)).unwrap_or(0)
    }

    pub fn format_citations(&self) -> bool {
        self.cit_bool(FORMAT_CITATIONS)
    }

    pub fn citation_character_format(&self) -> String {
        self.cit_str(CITATION_CHARACTER_FORMAT)
    }

    /// Direct formatting requested for whole markers.
    pub fn citation_format(&self) -> crate::markup::CharFormat {
        crate::markup::CharFormat {
            italic: self.cit_bool(ITALIC_CITATIONS),
            bold: self.cit_bool(BOLD_CITATIONS),
            superscript: self.cit_bool(SUPERSCRIPT_CITATIONS),
            subscript: self.cit_bool(SUBSCRIPT_CITATIONS),
            ..Default::default()
        }
    }

    pub fn multi_cite_chronological(&self) -> bool {
        self.cit_bool(MULTI_CITE_CHRONOLOGICAL)
    }

    /// Markers show citation keys instead of author-year or numbers.
    pub fn citation_key_markers(&self) -> bool {
        self.cit_bool(CITATION_KEY_CITE_MARKERS) || self.cit_bool(BIBTEX_KEY_CITATIONS)
    }

    pub fn italic_et_al(&self) -> bool {
        self.cit_bool(ITALIC_ET_AL)
    }

    pub fn citation_group_markup_before(&self) -> String {
        self.cit_str(CITATION_GROUP_MARKUP_BEFORE)
    }

    pub fn citation_group_markup_after(&self) -> String {
        self.cit_str(CITATION_GROUP_MARKUP_AFTER)
    }
}

fn split_fields(value: &str) -> Vec<String> {
    value
        .split('/')
        .map(|f| f.trim().to_lowercase())
        .filter(|f| !f.is_empty())
        .collect()
}

fn mirror_bracket(bracket: &str) -> Option<String> {
    let mirrored: Option<String> = bracket
        .chars()
        .rev()
        .map(|c| match c {
            '(' => Some(')'),
            ')' => Some('('),
            '[' => Some(']'),
            ']' => Some('['),
            '{' => Some('}'),
            '}' => Some('{'),
            '<' => Some('>'),
            '>' => Some('<'),
            _ => None,
        })
        .collect();
    mirrored.filter(|m| !m.is_empty())
}
