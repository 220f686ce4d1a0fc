/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Read-only bibliographic databases consumed by the citation processor.

use crate::entry::Entry;
use crate::error::{CoreError, Result};
use biblatex::{Bibliography, Chunk};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseMode {
    #[default]
    BibTex,
    BibLatex,
}

/// An ordered collection of entries addressed by citation key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Database {
    mode: DatabaseMode,
    entries: IndexMap<String, Entry>,
}

#[derive(Deserialize, Serialize)]
struct DatabaseFile {
    #[serde(default)]
    mode: DatabaseMode,
    #[serde(default)]
    entries: Vec<Entry>,
}

impl Database {
    pub fn new(mode: DatabaseMode) -> Self {
        Self {
            mode,
            entries: IndexMap::new(),
        }
    }

    pub fn mode(&self) -> DatabaseMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive lookup.
    pub fn lookup_by_key(&self, key: &str) -> Option<&Entry> {
        self.entries.get(&key.to_lowercase())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.lookup_by_key(key).is_some()
    }

    /// Adds or replaces an entry. Entries without a citation key are not stored.
    pub fn insert(&mut self, entry: Entry) -> Option<Entry> {
        let Some(key) = entry.citation_key().map(str::to_lowercase) else {
            tracing::warn!(entry_type = %entry.entry_type, "ignoring entry without citation key");
            return None;
        };
        self.entries.insert(key, entry)
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Parses BibTeX or BibLaTeX source.
    pub fn from_bibtex(src: &str) -> Result<Self> {
        let bibliography = Bibliography::parse(src).map_err(|e| CoreError::Parse {
            format: "BibTeX".to_string(),
            message: e.to_string(),
        })?;
        let mode = if src.contains("databaseType:biblatex") {
            DatabaseMode::BibLatex
        } else {
            DatabaseMode::BibTex
        };

        let mut database = Database::new(mode);
        for bib_entry in bibliography.iter() {
            let mut entry = Entry::new(&bib_entry.key, &bib_entry.entry_type.to_string());
            for (name, chunks) in &bib_entry.fields {
                let value: String = chunks
                    .iter()
                    .map(|c| match &c.v {
                        Chunk::Normal(s) | Chunk::Verbatim(s) => s.as_str(),
                        _ => "",
                    })
                    .collect();
                entry.set_field(name, value.trim());
            }
            database.insert(entry);
        }
        Ok(database)
    }

    /// Loads a database, choosing the parser by file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "bib" => Self::from_bibtex(&text),
            "json" => Ok(serde_json::from_str::<DatabaseFile>(&text)?.into()),
            "yaml" | "yml" => Ok(serde_yaml::from_str::<DatabaseFile>(&text)?.into()),
            _ => Err(CoreError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn to_bibtex(&self) -> String {
        let mut out = String::new();
        if self.mode == DatabaseMode::BibLatex {
            out.push_str("@Comment{jabref-meta: databaseType:biblatex;}\n\n");
        }
        for entry in self.entries.values() {
            out.push_str(&entry.to_bibtex());
            out.push('\n');
        }
        out
    }
}

impl From<DatabaseFile> for Database {
    fn from(file: DatabaseFile) -> Self {
        let mut database = Database::new(file.mode);
        for entry in file.entries {
            database.insert(entry);
        }
        database
    }
}

impl FromIterator<Entry> for Database {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        let mut database = Database::default();
        for entry in iter {
            database.insert(entry);
        }
        database
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        let db: Database = vec![Entry::new("Smith2000", "book")].into_iter().collect();
        assert!(db.lookup_by_key("smith2000").is_some());
        assert!(db.lookup_by_key("SMITH2000").is_some());
        assert!(db.lookup_by_key("jones").is_none());
    }

    #[test]
    fn test_entries_without_key_are_skipped() {
        let mut db = Database::default();
        db.insert(Entry::default());
        assert!(db.is_empty());
    }

    #[test]
    fn test_from_bibtex() {
        let src = r#"
@article{smith2000,
  author = {Smith, John},
  title = {A Study},
  year = {2000},
}
"#;
        let db = Database::from_bibtex(src).unwrap();
        assert_eq!(db.mode(), DatabaseMode::BibTex);
        let entry = db.lookup_by_key("smith2000").unwrap();
        assert_eq!(entry.entry_type, "article");
        assert_eq!(entry.field("year"), Some("2000"));
        assert_eq!(entry.field("author"), Some("Smith, John"));
    }

    #[test]
    fn test_biblatex_mode_detection() {
        let src = "@Comment{jabref-meta: databaseType:biblatex;}\n@book{k, title = {T}}\n";
        let db = Database::from_bibtex(src).unwrap();
        assert_eq!(db.mode(), DatabaseMode::BibLatex);
    }

    #[test]
    fn test_json_database_file() {
        let json = r#"{"mode": "biblatex", "entries": [{"key": "a", "type": "book", "fields": {"title": "T"}}]}"#;
        let db: Database = serde_json::from_str::<DatabaseFile>(json).unwrap().into();
        assert_eq!(db.mode(), DatabaseMode::BibLatex);
        assert_eq!(db.lookup_by_key("A").and_then(|e| e.field("title")), Some("T"));
    }
}
