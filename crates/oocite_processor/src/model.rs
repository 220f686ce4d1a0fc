/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! In-memory model of the citations found in a document.
//!
//! Groups live in an arena keyed by [`CitationGroupId`]; everything that needs
//! to point at a citation uses a [`CitationPath`] (group slot plus citation
//! slot) instead of a reference.

use crate::error::{ProcessorError, Result};
use indexmap::IndexMap;
use oocite_core::{CitationType, Database, Entry};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

/// Identifies a citation group; the name of its reference mark.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CitationGroupId(String);

impl CitationGroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CitationGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of looking up a citation key in the databases.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Unresolved,
    /// `database` is the index of the database the entry came from.
    Resolved { entry: Entry, database: usize },
}

impl Resolution {
    /// Case-insensitive lookup; the first database that knows the key wins.
    pub fn lookup(key: &str, databases: &[Database]) -> Self {
        databases
            .iter()
            .enumerate()
            .find_map(|(i, db)| {
                db.lookup_by_key(key).map(|entry| Resolution::Resolved {
                    entry: entry.clone(),
                    database: i,
                })
            })
            .unwrap_or(Resolution::Unresolved)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }

    pub fn entry(&self) -> Option<&Entry> {
        match self {
            Resolution::Resolved { entry, .. } => Some(entry),
            Resolution::Unresolved => None,
        }
    }

    /// The entry together with the database used for cross-references.
    pub fn entry_and_database<'a>(
        &'a self,
        databases: &'a [Database],
    ) -> Option<(&'a Entry, &'a Database)> {
        match self {
            Resolution::Resolved { entry, database } => {
                databases.get(*database).map(|db| (entry, db))
            }
            Resolution::Unresolved => None,
        }
    }

    /// Field value with aliases and `crossref` inheritance applied.
    pub fn field(&self, name: &str, databases: &[Database]) -> Option<String> {
        match self {
            Resolution::Resolved { entry, database } => match databases.get(*database) {
                Some(db) => entry.resolved_field(name, db),
                None => entry.field_with_aliases(name),
            },
            Resolution::Unresolved => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Citation {
    pub key: String,
    pub resolution: Resolution,
    pub number: Option<usize>,
    pub unique_letter: Option<String>,
    pub is_first_appearance_of_source: bool,
}

impl Citation {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            resolution: Resolution::Unresolved,
            number: None,
            unique_letter: None,
            is_first_appearance_of_source: false,
        }
    }
}

/// Citations rendered together at one place in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct CitationGroup {
    pub id: CitationGroupId,
    pub citation_type: CitationType,
    /// Storage order: the order of keys in the mark name.
    pub citations: Vec<Citation>,
    page_info: Option<String>,
    local_order: Vec<usize>,
    index_in_global_order: Option<usize>,
}

impl CitationGroup {
    pub fn new(
        id: CitationGroupId,
        citation_type: CitationType,
        citations: Vec<Citation>,
        page_info: Option<String>,
    ) -> Self {
        let local_order = (0..citations.len()).collect();
        Self {
            id,
            citation_type,
            citations,
            page_info: normalize_page_info(page_info),
            local_order,
            index_in_global_order: None,
        }
    }

    pub fn page_info(&self) -> Option<&str> {
        self.page_info.as_deref()
    }

    pub fn set_page_info(&mut self, page_info: Option<String>) {
        self.page_info = normalize_page_info(page_info);
    }

    pub fn keys(&self) -> Vec<&str> {
        self.citations.iter().map(|c| c.key.as_str()).collect()
    }

    /// Permutation of storage indices giving presentation order.
    pub fn local_order(&self) -> &[usize] {
        &self.local_order
    }

    pub fn citations_in_local_order(&self) -> impl Iterator<Item = &Citation> {
        self.local_order.iter().map(|&i| &self.citations[i])
    }

    /// Stable sort of the presentation order.
    pub fn impose_local_order(
        &mut self,
        mut compare: impl FnMut(&Citation, &Citation) -> Ordering,
    ) {
        let citations = &self.citations;
        self.local_order
            .sort_by(|&a, &b| compare(&citations[a], &citations[b]));
    }

    pub fn index_in_global_order(&self) -> Option<usize> {
        self.index_in_global_order
    }
}

/// Empty or blank page info is no page info.
pub fn normalize_page_info(page_info: Option<String>) -> Option<String> {
    page_info
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
}

/// Position of one citation: group slot in storage order, citation slot in
/// the group's storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CitationPath {
    pub group: usize,
    pub citation: usize,
}

/// A key as cited anywhere in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct CitedKey {
    pub key: String,
    pub resolution: Resolution,
    /// In global order.
    pub occurrences: Vec<CitationPath>,
    pub number: Option<usize>,
    pub unique_letter: Option<String>,
    pub normalized_marker: Option<String>,
}

/// Cited keys in bibliography order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CitedKeys(IndexMap<String, CitedKey>);

impl CitedKeys {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&CitedKey> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CitedKey> {
        self.0.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CitedKey> {
        self.0.values_mut()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    pub fn sorted_by(mut self, mut compare: impl FnMut(&CitedKey, &CitedKey) -> Ordering) -> Self {
        self.0.sort_by(|_, a, _, b| compare(a, b));
        self
    }

    /// Numbers resolved keys 1, 2, ... in the current order.
    pub fn number_resolved(&mut self) {
        let mut next = 1;
        for cited in self.0.values_mut() {
            if cited.resolution.is_resolved() {
                cited.number = Some(next);
                next += 1;
            } else {
                cited.number = None;
            }
        }
    }
}

/// All citation groups of a document plus the derived orderings.
#[derive(Debug, Clone, Default)]
pub struct CitationGroups {
    groups: IndexMap<CitationGroupId, CitationGroup>,
    global_order: Option<Vec<usize>>,
    bibliography: Option<CitedKeys>,
}

impl CitationGroups {
    pub fn new(groups: Vec<CitationGroup>) -> Self {
        Self {
            groups: groups.into_iter().map(|g| (g.id.clone(), g)).collect(),
            global_order: None,
            bibliography: None,
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, id: &CitationGroupId) -> Option<&CitationGroup> {
        self.groups.get(id)
    }

    pub fn get_mut(&mut self, id: &CitationGroupId) -> Option<&mut CitationGroup> {
        self.groups.get_mut(id)
    }

    /// Groups in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &CitationGroup> {
        self.groups.values()
    }

    pub fn ids(&self) -> Vec<CitationGroupId> {
        self.groups.keys().cloned().collect()
    }

    pub fn citation(&self, path: CitationPath) -> Option<&Citation> {
        self.groups
            .get_index(path.group)
            .and_then(|(_, g)| g.citations.get(path.citation))
    }

    fn citation_mut(&mut self, path: CitationPath) -> Option<&mut Citation> {
        self.groups
            .get_index_mut(path.group)
            .and_then(|(_, g)| g.citations.get_mut(path.citation))
    }

    pub fn group_at(&self, slot: usize) -> Option<&CitationGroup> {
        self.groups.get_index(slot).map(|(_, g)| g)
    }

    pub fn resolve_against(&mut self, databases: &[Database]) {
        for group in self.groups.values_mut() {
            for citation in &mut group.citations {
                citation.resolution = Resolution::lookup(&citation.key, databases);
            }
        }
    }

    pub fn impose_local_order(
        &mut self,
        mut compare: impl FnMut(&Citation, &Citation) -> Ordering,
    ) {
        for group in self.groups.values_mut() {
            group.impose_local_order(&mut compare);
        }
    }

    /// Stores document order. `ordered` must list every group exactly once.
    pub fn impose_global_order(&mut self, ordered: &[CitationGroupId]) -> Result<()> {
        if ordered.len() != self.groups.len() {
            return Err(ProcessorError::GlobalOrderMismatch {
                given: ordered.len(),
                expected: self.groups.len(),
            });
        }
        let mut slots = Vec::with_capacity(ordered.len());
        for id in ordered {
            let slot = self
                .groups
                .get_index_of(id)
                .ok_or_else(|| ProcessorError::UnknownGroup(id.to_string()))?;
            slots.push(slot);
        }
        let unique: HashSet<usize> = slots.iter().copied().collect();
        if unique.len() != slots.len() {
            return Err(ProcessorError::GlobalOrderMismatch {
                given: unique.len(),
                expected: self.groups.len(),
            });
        }
        for (index, &slot) in slots.iter().enumerate() {
            if let Some((_, group)) = self.groups.get_index_mut(slot) {
                group.index_in_global_order = Some(index);
            }
        }
        self.global_order = Some(slots);
        Ok(())
    }

    /// Group slots in document order, or storage order before a global order
    /// has been imposed.
    fn slots_in_global_order(&self) -> Vec<usize> {
        self.global_order
            .clone()
            .unwrap_or_else(|| (0..self.groups.len()).collect())
    }

    pub fn in_global_order(&self) -> Vec<&CitationGroup> {
        self.slots_in_global_order()
            .into_iter()
            .filter_map(|slot| self.group_at(slot))
            .collect()
    }

    /// Every citation, groups in document order, citations in local order.
    pub fn paths_in_global_order(&self) -> Vec<CitationPath> {
        let mut paths = Vec::new();
        for slot in self.slots_in_global_order() {
            if let Some(group) = self.group_at(slot) {
                for &citation in group.local_order() {
                    paths.push(CitationPath {
                        group: slot,
                        citation,
                    });
                }
            }
        }
        paths
    }

    pub fn cited_keys_in_first_appearance_order(&self) -> CitedKeys {
        let mut cited: IndexMap<String, CitedKey> = IndexMap::new();
        for path in self.paths_in_global_order() {
            let Some(citation) = self.citation(path) else {
                continue;
            };
            cited
                .entry(citation.key.clone())
                .or_insert_with(|| CitedKey {
                    key: citation.key.clone(),
                    resolution: citation.resolution.clone(),
                    occurrences: Vec::new(),
                    number: None,
                    unique_letter: None,
                    normalized_marker: None,
                })
                .occurrences
                .push(path);
        }
        CitedKeys(cited)
    }

    pub fn cited_keys_sorted_by(
        &self,
        compare: impl FnMut(&CitedKey, &CitedKey) -> Ordering,
    ) -> CitedKeys {
        self.cited_keys_in_first_appearance_order().sorted_by(compare)
    }

    pub fn number_bibliography_in_order_of_appearance(&mut self) {
        let mut cited = self.cited_keys_in_first_appearance_order();
        cited.number_resolved();
        self.set_bibliography(cited);
        self.distribute_numbers();
    }

    pub fn number_bibliography_by_comparator(
        &mut self,
        compare: impl FnMut(&CitedKey, &CitedKey) -> Ordering,
    ) {
        let mut cited = self.cited_keys_sorted_by(compare);
        cited.number_resolved();
        self.set_bibliography(cited);
        self.distribute_numbers();
    }

    pub fn bibliography(&self) -> Option<&CitedKeys> {
        self.bibliography.as_ref()
    }

    pub fn set_bibliography(&mut self, cited: CitedKeys) {
        self.bibliography = Some(cited);
    }

    fn distribute_numbers(&mut self) {
        let assignments: Vec<(CitationPath, Option<usize>)> = self
            .bibliography
            .iter()
            .flat_map(|cited| cited.iter())
            .flat_map(|ck| ck.occurrences.iter().map(move |p| (*p, ck.number)))
            .collect();
        for (path, number) in assignments {
            if let Some(citation) = self.citation_mut(path) {
                citation.number = number;
            }
        }
    }

    /// Copies each cited key's disambiguation letter to all its citations.
    pub fn distribute_unique_letters(&mut self) {
        let assignments: Vec<(CitationPath, Option<String>)> = self
            .bibliography
            .iter()
            .flat_map(|cited| cited.iter())
            .flat_map(|ck| {
                ck.occurrences
                    .iter()
                    .map(move |p| (*p, ck.unique_letter.clone()))
            })
            .collect();
        for (path, letter) in assignments {
            if let Some(citation) = self.citation_mut(path) {
                citation.unique_letter = letter;
            }
        }
    }

    /// Flags the first citation of every key in document order.
    pub fn mark_first_appearances(&mut self) {
        let mut seen: HashSet<String> = HashSet::new();
        for path in self.paths_in_global_order() {
            if let Some(citation) = self.citation_mut(path) {
                citation.is_first_appearance_of_source = seen.insert(citation.key.clone());
            }
        }
    }

    /// Keys without a database entry, in first-appearance order.
    pub fn unresolved_keys(&self) -> Vec<String> {
        self.cited_keys_in_first_appearance_order()
            .iter()
            .filter(|ck| !ck.resolution.is_resolved())
            .map(|ck| ck.key.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: &str, keys: &[&str]) -> CitationGroup {
        CitationGroup::new(
            CitationGroupId::new(id),
            CitationType::Parenthetical,
            keys.iter().map(|k| Citation::new(*k)).collect(),
            None,
        )
    }

    fn ids(names: &[&str]) -> Vec<CitationGroupId> {
        names.iter().map(|n| CitationGroupId::new(*n)).collect()
    }

    #[test]
    fn test_resolution_is_case_insensitive_and_first_database_wins() {
        let first: Database = vec![Entry::new("Smith", "book").with_field("title", "One")]
            .into_iter()
            .collect();
        let second: Database = vec![
            Entry::new("smith", "book").with_field("title", "Two"),
            Entry::new("jones", "book"),
        ]
        .into_iter()
        .collect();
        let mut groups = CitationGroups::new(vec![group("g", &["SMITH", "jones", "nobody"])]);
        groups.resolve_against(&[first, second]);

        let g = groups.get(&CitationGroupId::new("g")).unwrap();
        assert!(matches!(g.citations[0].resolution, Resolution::Resolved { database: 0, .. }));
        assert!(matches!(g.citations[1].resolution, Resolution::Resolved { database: 1, .. }));
        assert_eq!(g.citations[2].resolution, Resolution::Unresolved);
        assert_eq!(groups.unresolved_keys(), vec!["nobody"]);
    }

    #[test]
    fn test_first_appearance_follows_global_order() {
        let mut groups = CitationGroups::new(vec![group("g1", &["b"]), group("g2", &["a", "b"])]);
        groups.impose_global_order(&ids(&["g2", "g1"])).unwrap();
        let cited = groups.cited_keys_in_first_appearance_order();
        assert_eq!(cited.keys(), vec!["a", "b"]);
        assert_eq!(cited.get("b").unwrap().occurrences.len(), 2);
        assert_eq!(
            groups.get(&CitationGroupId::new("g1")).unwrap().index_in_global_order(),
            Some(1)
        );
    }

    #[test]
    fn test_global_order_must_be_a_permutation() {
        let mut groups = CitationGroups::new(vec![group("g1", &["a"]), group("g2", &["b"])]);
        assert!(groups.impose_global_order(&ids(&["g1"])).is_err());
        assert!(groups.impose_global_order(&ids(&["g1", "g1"])).is_err());
        assert!(matches!(
            groups.impose_global_order(&ids(&["g1", "zz"])),
            Err(ProcessorError::UnknownGroup(_))
        ));
    }

    #[test]
    fn test_numbering_skips_unresolved_keys() {
        let db: Database = vec![Entry::new("a", "book"), Entry::new("c", "book")]
            .into_iter()
            .collect();
        let mut groups = CitationGroups::new(vec![group("g1", &["a", "missing"]), group("g2", &["c", "a"])]);
        groups.resolve_against(&[db]);
        groups.number_bibliography_in_order_of_appearance();

        let numbers = |id: &str| -> Vec<Option<usize>> {
            groups
                .get(&CitationGroupId::new(id))
                .unwrap()
                .citations
                .iter()
                .map(|c| c.number)
                .collect()
        };
        assert_eq!(numbers("g1"), vec![Some(1), None]);
        assert_eq!(numbers("g2"), vec![Some(2), Some(1)]);
    }

    #[test]
    fn test_local_order_is_a_stable_permutation() {
        let mut g = group("g", &["c", "a", "b", "a"]);
        g.impose_local_order(|x, y| x.key.cmp(&y.key));
        assert_eq!(g.local_order(), &[1, 3, 2, 0]);
        assert_eq!(g.keys(), vec!["c", "a", "b", "a"]);
    }

    #[test]
    fn test_first_appearance_flags() {
        let mut groups = CitationGroups::new(vec![group("g1", &["a"]), group("g2", &["a", "b"])]);
        groups.mark_first_appearances();
        let flags: Vec<bool> = groups
            .iter()
            .flat_map(|g| g.citations.iter().map(|c| c.is_first_appearance_of_source))
            .collect();
        assert_eq!(flags, vec![true, false, true]);
    }

    #[test]
    fn test_blank_page_info_is_dropped() {
        let g = CitationGroup::new(
            CitationGroupId::new("g"),
            CitationType::InText,
            vec![Citation::new("a")],
            Some("  ".to_string()),
        );
        assert_eq!(g.page_info(), None);
    }
}
