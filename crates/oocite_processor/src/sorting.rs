/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Entry comparators for citations within a group and for the bibliography.

use crate::model::{Citation, CitedKey, Resolution};
use oocite_core::{latex, AuthorList, Database, Style};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySortOrder {
    AuthorYearTitle,
    YearAuthorTitle,
}

/// The strings entries are compared by.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SortKey {
    author: String,
    year: String,
    title: String,
}

impl SortKey {
    fn of(resolution: &Resolution, databases: &[Database]) -> Self {
        let field = |name: &str| resolution.field(name, databases).unwrap_or_default();
        let names = Some(field("author"))
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| field("editor"));
        let author = AuthorList::parse(&names)
            .iter()
            .map(|a| {
                let mut name = a.last_with_von();
                if let Some(first) = &a.first {
                    name.push(' ');
                    name.push_str(first);
                }
                name
            })
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            author: normalize(&author),
            year: normalize(&field("year")),
            title: normalize(&field("title")),
        }
    }
}

fn normalize(value: &str) -> String {
    latex::to_plain_text(value).to_lowercase()
}

impl EntrySortOrder {
    /// Order of citations inside one group.
    pub fn for_multi_cite(style: &Style) -> Self {
        if style.multi_cite_chronological() {
            EntrySortOrder::YearAuthorTitle
        } else {
            EntrySortOrder::AuthorYearTitle
        }
    }

    /// Order of a bibliography that is not sorted by position.
    pub fn for_bibliography(style: &Style) -> Self {
        match style.sort_algorithm().to_lowercase().as_str() {
            "chronological" | "year" => EntrySortOrder::YearAuthorTitle,
            _ => EntrySortOrder::AuthorYearTitle,
        }
    }

    /// Unresolved entries sort first; ties break on the citation key.
    pub fn compare(
        self,
        (a_key, a): (&str, &Resolution),
        (b_key, b): (&str, &Resolution),
        databases: &[Database],
    ) -> Ordering {
        let by_entry = match (a.is_resolved(), b.is_resolved()) {
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            (false, false) => Ordering::Equal,
            (true, true) => {
                let (ka, kb) = (SortKey::of(a, databases), SortKey::of(b, databases));
                match self {
                    EntrySortOrder::AuthorYearTitle => (&ka.author, &ka.year, &ka.title)
                        .cmp(&(&kb.author, &kb.year, &kb.title)),
                    EntrySortOrder::YearAuthorTitle => (&ka.year, &ka.author, &ka.title)
                        .cmp(&(&kb.year, &kb.author, &kb.title)),
                }
            }
        };
        by_entry.then_with(|| a_key.cmp(b_key))
    }

    pub fn compare_citations(self, a: &Citation, b: &Citation, databases: &[Database]) -> Ordering {
        self.compare((a.key.as_str(), &a.resolution), (b.key.as_str(), &b.resolution), databases)
    }

    pub fn compare_cited_keys(
        self,
        a: &CitedKey,
        b: &CitedKey,
        databases: &[Database],
    ) -> Ordering {
        self.compare(
            (a.key.as_str(), &a.resolution),
            (b.key.as_str(), &b.resolution),
            databases,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oocite_core::Entry;

    fn resolved(entry: Entry) -> Resolution {
        Resolution::Resolved { entry, database: 0 }
    }

    #[test]
    fn test_author_year_title() {
        let dbs = [Database::default()];
        let a = resolved(Entry::new("a", "book").with_field("author", "Zed, A.").with_field("year", "1990"));
        let b = resolved(Entry::new("b", "book").with_field("author", "Abel, B.").with_field("year", "2000"));
        assert_eq!(
            EntrySortOrder::AuthorYearTitle.compare(("a", &a), ("b", &b), &dbs),
            Ordering::Greater
        );
        assert_eq!(
            EntrySortOrder::YearAuthorTitle.compare(("a", &a), ("b", &b), &dbs),
            Ordering::Less
        );
    }

    #[test]
    fn test_editor_used_when_author_missing() {
        let dbs = [Database::default()];
        let a = resolved(Entry::new("a", "book").with_field("editor", "Abel, E."));
        let b = resolved(Entry::new("b", "book").with_field("author", "Baker, B."));
        assert_eq!(
            EntrySortOrder::AuthorYearTitle.compare(("a", &a), ("b", &b), &dbs),
            Ordering::Less
        );
    }

    #[test]
    fn test_unresolved_first_then_by_key() {
        let dbs = [Database::default()];
        let r = resolved(Entry::new("r", "book"));
        let u = Resolution::Unresolved;
        let order = EntrySortOrder::AuthorYearTitle;
        assert_eq!(order.compare(("zz", &u), ("r", &r), &dbs), Ordering::Less);
        assert_eq!(order.compare(("b", &u), ("a", &u), &dbs), Ordering::Greater);
    }

    #[test]
    fn test_braces_do_not_affect_order() {
        let dbs = [Database::default()];
        let a = resolved(Entry::new("a", "book").with_field("author", "{Abel}, A."));
        let b = resolved(Entry::new("b", "book").with_field("author", "Young, B."));
        assert_eq!(
            EntrySortOrder::AuthorYearTitle.compare(("a", &a), ("b", &b), &dbs),
            Ordering::Less
        );
    }
}
