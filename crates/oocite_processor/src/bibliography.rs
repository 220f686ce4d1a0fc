/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Bibliography entries rendered with the style's reference layouts.

use crate::markers::{self, NumericItem};
use crate::model::{CitationGroupId, CitationGroups, CitedKey, CitedKeys};
use oocite_core::{markup, Database, LayoutContext, Style};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibliographyEntry {
    pub key: String,
    /// Inline markup for the whole paragraph.
    pub markup: String,
    pub is_resolved: bool,
    /// Groups citing this key, in document order, without repeats.
    pub cited_in: Vec<CitationGroupId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedBibliography {
    pub title: String,
    pub header_paragraph_format: String,
    pub paragraph_format: String,
    pub entries: Vec<BibliographyEntry>,
}

pub fn format_bibliography(
    groups: &CitationGroups,
    bibliography: &CitedKeys,
    databases: &[Database],
    style: &Style,
) -> FormattedBibliography {
    let entries = bibliography
        .iter()
        .map(|cited| BibliographyEntry {
            key: cited.key.clone(),
            markup: entry_markup(cited, databases, style),
            is_resolved: cited.resolution.is_resolved(),
            cited_in: cited_in(groups, cited),
        })
        .collect();
    FormattedBibliography {
        title: markup::escape(&style.title()),
        header_paragraph_format: style.reference_header_paragraph_format(),
        paragraph_format: style.reference_paragraph_format(),
        entries,
    }
}

fn entry_markup(cited: &CitedKey, databases: &[Database], style: &Style) -> String {
    let Some((entry, database)) = cited.resolution.entry_and_database(databases) else {
        return markers::unresolved_marker(&cited.key);
    };
    let ctx = LayoutContext {
        entry,
        database,
        unique_letter: cited.unique_letter.as_deref(),
    };
    let body = style.layout_for(&entry.entry_type).render(&ctx);
    let label = if style.citation_key_markers() {
        Some(format!(
            "{}{}{}",
            markup::escape(&style.bracket_before_in_list()),
            markup::escape(&cited.key),
            markup::escape(&style.bracket_after_in_list())
        ))
    } else if style.is_numeric() {
        cited
            .number
            .map(|n| markers::numeric_marker(style, &[NumericItem::Number(n)], true))
    } else {
        None
    };
    match label {
        Some(label) => format!("{label} {body}"),
        None => body,
    }
}

fn cited_in(groups: &CitationGroups, cited: &CitedKey) -> Vec<CitationGroupId> {
    let mut ids: Vec<CitationGroupId> = Vec::new();
    for path in &cited.occurrences {
        if let Some(group) = groups.group_at(path.group) {
            if !ids.contains(&group.id) {
                ids.push(group.id.clone());
            }
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Citation, CitationGroup};
    use crate::process::produce_citation_markers;
    use oocite_core::{CitationType, Entry};

    fn group(id: &str, keys: &[&str]) -> CitationGroup {
        CitationGroup::new(
            CitationGroupId::new(id),
            CitationType::Parenthetical,
            keys.iter().map(|k| Citation::new(*k)).collect(),
            None,
        )
    }

    #[test]
    fn test_numeric_bibliography() {
        let style = Style::parse(
            "LAYOUT\ndefault=\\author: <i>\\title</i>.\nPROPERTIES\nTitle=Works\nIsNumberEntries=true\nIsSortByPosition=true\nCITATION\nBracketBefore=[\nBracketAfter=]\n",
        )
        .unwrap();
        let db: Database = vec![Entry::new("a", "book")
            .with_field("author", "Smith, J.")
            .with_field("title", "Things")]
        .into_iter()
        .collect();
        let dbs = [db];
        let mut groups = CitationGroups::new(vec![group("g1", &["missing", "a"]), group("g2", &["a"])]);
        let markers = produce_citation_markers(&mut groups, &dbs, &style);
        let bib = format_bibliography(&groups, &markers.bibliography, &dbs, &style);

        assert_eq!(bib.title, "Works");
        assert_eq!(bib.entries.len(), 2);
        assert_eq!(bib.entries[0].markup, "Unresolved(missing)");
        assert!(!bib.entries[0].is_resolved);
        assert_eq!(bib.entries[1].markup, "[1] Smith, J.: <i>Things</i>.");
        assert_eq!(
            bib.entries[1].cited_in,
            vec![CitationGroupId::new("g1"), CitationGroupId::new("g2")]
        );
    }

    #[test]
    fn test_author_year_bibliography_uses_letters() {
        let style = Style::parse("LAYOUT\ndefault=\\author (\\year\\uniq)\n").unwrap();
        let db: Database = vec![
            Entry::new("x", "book").with_field("author", "Olsen, O.").with_field("year", "2005").with_field("title", "B"),
            Entry::new("y", "book").with_field("author", "Olsen, O.").with_field("year", "2005").with_field("title", "A"),
        ]
        .into_iter()
        .collect();
        let dbs = [db];
        let mut groups = CitationGroups::new(vec![group("g1", &["x"]), group("g2", &["y"])]);
        let markers = produce_citation_markers(&mut groups, &dbs, &style);
        let bib = format_bibliography(&groups, &markers.bibliography, &dbs, &style);
        let lines: Vec<&str> = bib.entries.iter().map(|e| e.markup.as_str()).collect();
        // Sorted by author, year, title: "A" before "B".
        assert_eq!(lines, vec!["Olsen, O. (2005b)", "Olsen, O. (2005a)"]);
    }
}
