/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Bibliographic entries as fielded records.

use crate::database::Database;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// A bibliographic entry: a citation key, an entry type, and its fields.
///
/// Field names are stored lowercase; lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "type", default = "default_entry_type")]
    pub entry_type: String,
    #[serde(default)]
    pub fields: IndexMap<String, String>,
}

fn default_entry_type() -> String {
    "misc".to_string()
}

impl Entry {
    pub fn new(key: &str, entry_type: &str) -> Self {
        Self {
            key: Some(key.to_string()),
            entry_type: entry_type.to_lowercase(),
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field setter, mostly for fixtures.
    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.set_field(name, value);
        self
    }

    pub fn set_field(&mut self, name: &str, value: &str) {
        self.fields.insert(name.to_lowercase(), value.to_string());
    }

    pub fn citation_key(&self) -> Option<&str> {
        self.key.as_deref().filter(|k| !k.is_empty())
    }

    /// Raw field value, no aliasing and no cross-reference lookup.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_lowercase())
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn crossref(&self) -> Option<&str> {
        self.field("crossref")
    }

    /// Field value following BibTeX/BibLaTeX aliases.
    pub fn field_with_aliases(&self, name: &str) -> Option<String> {
        let name = name.to_lowercase();
        if let Some(value) = self.field(&name) {
            return Some(value.to_string());
        }
        let alias = match name.as_str() {
            "journal" => "journaltitle",
            "journaltitle" => "journal",
            "address" => "location",
            "location" => "address",
            "school" => "institution",
            "institution" => "school",
            "date" => "year",
            "year" => return self.field("date").and_then(year_of_date),
            _ => return None,
        };
        self.field(alias).map(str::to_string)
    }

    /// Field value after aliases and, failing that, inheritance from the
    /// `crossref` parent found in `database`.
    pub fn resolved_field(&self, name: &str, database: &Database) -> Option<String> {
        if let Some(value) = self.field_with_aliases(name) {
            return Some(value);
        }
        let parent = database.lookup_by_key(self.crossref()?)?;
        if parent.citation_key() == self.citation_key() {
            return None;
        }
        match name.to_lowercase().as_str() {
            "booktitle" => parent
                .field_with_aliases("title")
                .or_else(|| parent.field_with_aliases("booktitle")),
            "title" | "crossref" | "key" => None,
            other => parent.field_with_aliases(other),
        }
    }

    /// BibTeX source for this entry.
    pub fn to_bibtex(&self) -> String {
        let mut out = String::new();
        let _ = write!(out, "@{}{{{}", self.entry_type, self.key.as_deref().unwrap_or(""));
        for (name, value) in &self.fields {
            let _ = write!(out, ",\n  {} = {{{}}}", name, value);
        }
        out.push_str("\n}\n");
        out
    }
}

fn year_of_date(date: &str) -> Option<String> {
    let year: String = date.trim().chars().take_while(char::is_ascii_digit).collect();
    (year.len() == 4).then_some(year)
}
