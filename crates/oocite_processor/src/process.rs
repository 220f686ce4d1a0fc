/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! From citation groups to marker text.

use crate::markers::{self, MarkerItem, NumericItem};
use crate::model::{CitationGroup, CitationGroupId, CitationGroups, CitedKeys};
use crate::sorting::EntrySortOrder;
use indexmap::IndexMap;
use oocite_core::{CitationType, Database, Style};
use std::collections::HashMap;

/// Everything a refresh writes back into the document.
#[derive(Debug, Clone, Default)]
pub struct CitationMarkers {
    /// Marker markup per group, in storage order.
    pub markers: IndexMap<CitationGroupId, String>,
    pub bibliography: CitedKeys,
    pub unresolved_keys: Vec<String>,
}

/// Resolves, orders, numbers or disambiguates, and renders every group.
///
/// The global order should already be imposed on `groups`; without one,
/// storage order stands in for document order.
pub fn produce_citation_markers(
    groups: &mut CitationGroups,
    databases: &[Database],
    style: &Style,
) -> CitationMarkers {
    groups.resolve_against(databases);

    let markers = if style.citation_key_markers() {
        citation_key_markers(groups, databases, style)
    } else if style.is_numeric() {
        numeric_markers(groups, databases, style)
    } else {
        author_year_markers(groups, databases, style)
    };

    let result = CitationMarkers {
        markers,
        bibliography: groups.bibliography().cloned().unwrap_or_default(),
        unresolved_keys: groups.unresolved_keys(),
    };
    tracing::debug!(
        groups = result.markers.len(),
        cited = result.bibliography.len(),
        unresolved = result.unresolved_keys.len(),
        "produced citation markers"
    );
    result
}

fn sort_bibliography(groups: &mut CitationGroups, databases: &[Database], style: &Style) {
    let order = EntrySortOrder::for_bibliography(style);
    let sorted = groups.cited_keys_sorted_by(|a, b| order.compare_cited_keys(a, b, databases));
    groups.set_bibliography(sorted);
}

fn impose_multi_cite_order(groups: &mut CitationGroups, databases: &[Database], style: &Style) {
    let order = EntrySortOrder::for_multi_cite(style);
    groups.impose_local_order(|a, b| order.compare_citations(a, b, databases));
}

fn render_groups(
    groups: &CitationGroups,
    style: &Style,
    mut render: impl FnMut(&CitationGroup) -> String,
) -> IndexMap<CitationGroupId, String> {
    groups
        .iter()
        .map(|group| {
            let marker = if group.citation_type == CitationType::Invisible {
                String::new()
            } else {
                markers::finish(style, &render(group), group.page_info())
            };
            (group.id.clone(), marker)
        })
        .collect()
}

fn citation_key_markers(
    groups: &mut CitationGroups,
    databases: &[Database],
    style: &Style,
) -> IndexMap<CitationGroupId, String> {
    impose_multi_cite_order(groups, databases, style);
    sort_bibliography(groups, databases, style);
    render_groups(groups, style, |group| {
        let keys: Vec<&str> = group.citations_in_local_order().map(|c| c.key.as_str()).collect();
        markers::citation_key_marker(style, &keys)
    })
}

fn numeric_markers(
    groups: &mut CitationGroups,
    databases: &[Database],
    style: &Style,
) -> IndexMap<CitationGroupId, String> {
    // Numeric groups keep the order their keys were cited in.
    if style.is_sort_by_position() {
        groups.number_bibliography_in_order_of_appearance();
    } else {
        let order = EntrySortOrder::for_bibliography(style);
        groups.number_bibliography_by_comparator(|a, b| order.compare_cited_keys(a, b, databases));
    }
    groups.mark_first_appearances();
    render_groups(groups, style, |group| {
        let items: Vec<NumericItem> = group
            .citations_in_local_order()
            .map(|c| match c.number {
                Some(n) => NumericItem::Number(n),
                None => NumericItem::Unresolved(c.key.clone()),
            })
            .collect();
        markers::numeric_marker(style, &items, false)
    })
}

fn author_year_markers(
    groups: &mut CitationGroups,
    databases: &[Database],
    style: &Style,
) -> IndexMap<CitationGroupId, String> {
    impose_multi_cite_order(groups, databases, style);

    let mut cited = groups.cited_keys_in_first_appearance_order();
    assign_unique_letters(&mut cited, databases, style);

    let order = EntrySortOrder::for_bibliography(style);
    groups.set_bibliography(cited.sorted_by(|a, b| order.compare_cited_keys(a, b, databases)));
    groups.distribute_unique_letters();
    groups.mark_first_appearances();

    render_groups(groups, style, |group| {
        let items: Vec<MarkerItem<'_>> = group
            .citations_in_local_order()
            .map(|c| MarkerItem {
                key: &c.key,
                resolution: &c.resolution,
                unique_letter: c.unique_letter.as_deref(),
                is_first_appearance: c.is_first_appearance_of_source,
            })
            .collect();
        markers::author_year_marker(style, databases, &items, group.citation_type.in_parenthesis())
    })
}

/// Keys whose normalized markers collide get letters in first-appearance
/// order; all other keys get none. `cited` must be in first-appearance order.
fn assign_unique_letters(cited: &mut CitedKeys, databases: &[Database], style: &Style) {
    let mut by_marker: HashMap<String, Vec<String>> = HashMap::new();
    for ck in cited.iter_mut() {
        ck.unique_letter = None;
        if !ck.resolution.is_resolved() {
            ck.normalized_marker = None;
            continue;
        }
        let normalized = markers::normalized_marker(style, databases, &ck.key, &ck.resolution);
        by_marker
            .entry(normalized.clone())
            .or_default()
            .push(ck.key.clone());
        ck.normalized_marker = Some(normalized);
    }

    let mut letters: HashMap<String, String> = HashMap::new();
    for keys in by_marker.values().filter(|keys| keys.len() > 1) {
        for (i, key) in keys.iter().enumerate() {
            letters.insert(key.clone(), markers::unique_letter(i));
        }
    }
    for ck in cited.iter_mut() {
        ck.unique_letter = letters.get(&ck.key).cloned();
    }
}
