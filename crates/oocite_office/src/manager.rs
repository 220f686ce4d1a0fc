/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! The operations offered to a user interface.
//!
//! Every operation that changes the document runs inside one undo context,
//! and inside a controller lock when it rewrites more than one mark. Host
//! objects are never kept between operations; marks are looked up by name
//! each time.

use crate::backend::{self, CitationEntry};
use crate::config::{ChangeTrackingPolicy, Preferences};
use crate::document::edit::check_character_style;
use crate::document::{
    require_view_cursor, with_controller_lock, with_undo_group, DocumentChooser,
    DocumentProvider, TextDocument,
};
use crate::error::{OfficeError, Result};
use crate::range::{same_flow, TextRange};
use crate::update::{self, check_overlaps, write_marker, BibliographyUpdate};
use crate::visual_order::visual_order;
use oocite_core::markup;
use oocite_core::{CitationType, Database, Entry, Style};
use oocite_processor::markers::{self, MarkerItem};
use oocite_processor::{CitationGroupId, Resolution};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

/// Leftovers found by [`CitationManager::health_report`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthReport {
    /// Custom properties holding page info for citations that no longer exist.
    pub orphaned_page_info: Vec<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.orphaned_page_info.is_empty()
    }
}

impl fmt::Display for HealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_healthy() {
            return writeln!(f, "No problems found.");
        }
        writeln!(
            f,
            "Found {} custom properties holding page info of deleted citations:",
            self.orphaned_page_info.len()
        )?;
        for name in &self.orphaned_page_info {
            writeln!(f, "  {name}")?;
        }
        writeln!(
            f,
            "In LibreOffice you may remove these in [File]/[Properties]/[Custom Properties]"
        )
    }
}

/// Keeps the citations of one document in step with the bibliography.
#[derive(Debug)]
pub struct CitationManager<D: TextDocument> {
    document: Option<D>,
    preferences: Preferences,
}

impl<D: TextDocument> CitationManager<D> {
    pub fn new(preferences: Preferences) -> Self {
        Self {
            document: None,
            preferences,
        }
    }

    pub fn with_document(document: D, preferences: Preferences) -> Self {
        Self {
            document: Some(document),
            preferences,
        }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn set_preferences(&mut self, preferences: Preferences) {
        self.preferences = preferences;
    }

    /// Connects to one of the provider's documents, asking `chooser` when
    /// there is more than one. Returns the title of the selected document.
    pub fn select_document<P>(
        &mut self,
        provider: &mut P,
        chooser: &impl DocumentChooser,
    ) -> Result<String>
    where
        P: DocumentProvider<Document = D>,
    {
        let mut documents = provider.documents()?;
        let index = match documents.len() {
            0 => return Err(OfficeError::NoDocument),
            1 => 0,
            _ => {
                let titles = documents
                    .iter()
                    .map(|d| d.title())
                    .collect::<Result<Vec<_>>>()?;
                chooser.choose(&titles).ok_or(OfficeError::NoDocument)?
            }
        };
        if index >= documents.len() {
            return Err(OfficeError::NoDocument);
        }
        let document = documents.swap_remove(index);
        let title = document.title()?;
        info!(%title, "selected document");
        self.document = Some(document);
        Ok(title)
    }

    pub fn is_connected(&self) -> bool {
        self.document.is_some()
    }

    pub fn current_title(&self) -> Option<String> {
        self.document.as_ref().and_then(|d| d.title().ok())
    }

    pub fn document(&self) -> Option<&D> {
        self.document.as_ref()
    }

    pub fn disconnect(&mut self) {
        self.document = None;
    }

    fn on_document<T>(
        &mut self,
        body: impl FnOnce(&mut D, &Preferences) -> Result<T>,
    ) -> Result<T> {
        let preferences = &self.preferences;
        let document = self.document.as_mut().ok_or(OfficeError::NoDocument)?;
        let result = body(document, preferences);
        if matches!(result, Err(OfficeError::ConnectionLost)) {
            warn!("lost connection to the document");
            self.document = None;
        }
        result
    }

    fn mutate<T>(
        &mut self,
        label: &str,
        body: impl FnOnce(&mut D, &Preferences) -> Result<T>,
    ) -> Result<T> {
        self.on_document(|doc, preferences| {
            check_change_tracking(doc, preferences)?;
            with_undo_group(doc, label, |doc| body(doc, preferences))
        })
    }

    /// Inserts a citation of `entries` at the view cursor.
    ///
    /// The new mark gets a preliminary marker; with `sync` all markers and
    /// the bibliography are refreshed afterwards and the unresolved keys are
    /// returned.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_citation(
        &mut self,
        entries: &[Entry],
        databases: &[Database],
        style: &Style,
        in_parenthesis: bool,
        with_text: bool,
        page_info: Option<&str>,
        sync: bool,
    ) -> Result<Vec<String>> {
        if entries.is_empty() {
            return Err(OfficeError::NoEntriesSelected);
        }
        let keys = entries
            .iter()
            .map(|e| {
                e.citation_key().map(str::to_string).ok_or_else(|| {
                    OfficeError::IllegalArgument("an entry to cite has no citation key".to_string())
                })
            })
            .collect::<Result<Vec<String>>>()?;
        let citation_type = CitationType::from_options(with_text, in_parenthesis);

        self.mutate("Insert citation", |doc, preferences| {
            let cursor = require_view_cursor(doc)?;
            let at = cursor.end_point();
            if style.format_citations() {
                check_character_style(doc, &at, &style.citation_character_format())?;
            }

            let (group, range) =
                backend::create_group(doc, &keys, page_info, citation_type, &at, true, false)?;
            let marker =
                preliminary_marker(style, databases, &keys, citation_type, group.page_info());
            write_marker(doc, &group.id, citation_type, &marker, style)?;

            let end = backend::mark_range(doc, &group.id)?.end;
            doc.set_view_cursor(&TextRange::collapsed(range.flow, end + 1))?;
            debug!(mark = %group.id, "inserted citation");

            if sync {
                update::refresh(doc, databases, style, preferences, BibliographyUpdate::Always)
            } else {
                Ok(Vec::new())
            }
        })
    }

    /// Rewrites every marker and the bibliography. Returns unresolved keys.
    pub fn refresh(&mut self, databases: &[Database], style: &Style) -> Result<Vec<String>> {
        self.mutate("Refresh citations and bibliography", |doc, preferences| {
            update::refresh(doc, databases, style, preferences, BibliographyUpdate::Always)
        })
    }

    /// Joins parenthetical citations separated only by spaces into one.
    pub fn merge(&mut self, databases: &[Database], style: &Style) -> Result<Vec<String>> {
        self.mutate("Merge citations", |doc, preferences| {
            let groups = backend::load_groups(doc)?;
            let ranges = backend::group_ranges(doc, &groups)?;
            check_overlaps(doc, &ranges, preferences)?;
            let order = visual_order(doc, &ranges)?;
            let range_of: HashMap<&CitationGroupId, TextRange> =
                ranges.iter().map(|(id, r)| (id, *r)).collect();

            let mut runs: Vec<Vec<CitationGroupId>> = Vec::new();
            let mut current: Vec<CitationGroupId> = Vec::new();
            let mut current_end: Option<TextRange> = None;
            for id in &order {
                let (Some(group), Some(range)) = (groups.get(id), range_of.get(id)) else {
                    continue;
                };
                let parenthetical = group.citation_type == CitationType::Parenthetical;
                let joins = match current_end {
                    Some(end) if parenthetical => only_spaces_between(doc, &end, range)?,
                    _ => false,
                };
                if !joins {
                    if current.len() > 1 {
                        runs.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    current_end = None;
                    if !parenthetical {
                        continue;
                    }
                }
                current.push(id.clone());
                current_end = Some(*range);
            }
            if current.len() > 1 {
                runs.push(current);
            }

            with_controller_lock(doc, |doc| {
                for run in &runs {
                    let mut keys: Vec<String> = Vec::new();
                    let mut page_infos: Vec<String> = Vec::new();
                    for id in run {
                        let Some(group) = groups.get(id) else {
                            continue;
                        };
                        keys.extend(group.keys().into_iter().map(str::to_string));
                        if let Some(page_info) = group.page_info() {
                            if !page_infos.iter().any(|p| p == page_info) {
                                page_infos.push(page_info.to_string());
                            }
                        }
                    }
                    let (Some(first), Some(last)) = (run.first(), run.last()) else {
                        continue;
                    };
                    let start = backend::mark_range(doc, first)?;
                    let end = backend::mark_range(doc, last)?;
                    let span = start.through(&end)?;
                    for id in run {
                        backend::remove_group(doc, id)?;
                    }
                    doc.replace(&span, "")?;
                    let page_info = (!page_infos.is_empty()).then(|| page_infos.join("; "));
                    let (merged, _) = backend::create_group(
                        doc,
                        &keys,
                        page_info.as_deref(),
                        CitationType::Parenthetical,
                        &span.start_point(),
                        false,
                        false,
                    )?;
                    debug!(mark = %merged.id, merged = run.len(), "merged citations");
                }
                Ok(())
            })?;

            update::refresh(doc, databases, style, preferences, BibliographyUpdate::IfPresent)
        })
    }

    /// Splits every group with several citations into one group per
    /// citation, separated by spaces. Page info goes to the last one.
    pub fn split(&mut self, databases: &[Database], style: &Style) -> Result<Vec<String>> {
        self.mutate("Separate citations", |doc, preferences| {
            let groups = backend::load_groups(doc)?;
            let ranges = backend::group_ranges(doc, &groups)?;
            check_overlaps(doc, &ranges, preferences)?;

            with_controller_lock(doc, |doc| {
                for group in groups.iter().filter(|g| g.citations.len() > 1) {
                    let range = backend::mark_range(doc, &group.id)?;
                    backend::remove_group(doc, &group.id)?;
                    doc.replace(&range, "")?;

                    let keys = group.keys();
                    let mut at = range.start_point();
                    for (i, key) in keys.iter().enumerate() {
                        let last = i + 1 == keys.len();
                        let page_info = if last { group.page_info() } else { None };
                        let (_, created) = backend::create_group(
                            doc,
                            &[key.to_string()],
                            page_info,
                            group.citation_type,
                            &at,
                            !last,
                            false,
                        )?;
                        let after = if last { created.end } else { created.end + 1 };
                        at = TextRange::collapsed(created.flow, after);
                    }
                    debug!(mark = %group.id, parts = keys.len(), "split citation");
                }
                Ok(())
            })?;

            update::refresh(doc, databases, style, preferences, BibliographyUpdate::IfPresent)
        })
    }

    /// Copies the cited entries, plus the entries they cross-reference, into
    /// a new database. Returns it with the keys that could not be resolved.
    pub fn export_cited(&mut self, databases: &[Database]) -> Result<(Database, Vec<String>)> {
        self.on_document(|doc, _| {
            let mut groups = backend::load_groups(doc)?;
            groups.resolve_against(databases);
            let mode = databases.first().map(Database::mode).unwrap_or_default();
            let mut exported = Database::new(mode);
            let mut unresolved = Vec::new();
            for cited in groups.cited_keys_in_first_appearance_order().iter() {
                let Some((entry, database)) = cited.resolution.entry_and_database(databases) else {
                    if !cited.resolution.is_resolved() {
                        unresolved.push(cited.key.clone());
                    }
                    continue;
                };
                if let Some(key) = entry.citation_key() {
                    if exported.contains_key(key) {
                        continue;
                    }
                }
                exported.insert(entry.clone());
                if let Some(parent) = entry.crossref().and_then(|k| database.lookup_by_key(k)) {
                    let already = parent.citation_key().is_some_and(|k| exported.contains_key(k));
                    if !already {
                        exported.insert(parent.clone());
                    }
                }
            }
            info!(
                entries = exported.len(),
                unresolved = unresolved.len(),
                "exported cited entries"
            );
            Ok((exported, unresolved))
        })
    }

    /// One entry per citation group, for editing page info.
    pub fn list_citations(&mut self) -> Result<Vec<CitationEntry>> {
        self.on_document(|doc, _| {
            let groups = backend::load_groups(doc)?;
            backend::citation_entries(doc, &groups)
        })
    }

    /// Stores edited page info. Markers change on the next refresh.
    pub fn apply_citation_edits(&mut self, entries: &[CitationEntry]) -> Result<()> {
        self.mutate("Edit page info", |doc, _| {
            backend::apply_citation_entries(doc, entries)
        })
    }

    pub fn health_report(&mut self) -> Result<HealthReport> {
        self.on_document(|doc, _| {
            Ok(HealthReport {
                orphaned_page_info: backend::orphaned_page_info_properties(doc)?,
            })
        })
    }
}

fn check_change_tracking<D: TextDocument + ?Sized>(
    doc: &D,
    preferences: &Preferences,
) -> Result<()> {
    let recording = doc.is_recording_changes()?;
    let redlines = doc.redline_count()?;
    if !recording && redlines == 0 {
        return Ok(());
    }
    match preferences.change_tracking {
        ChangeTrackingPolicy::Refuse => Err(OfficeError::ChangeTracking {
            recording,
            redlines,
        }),
        ChangeTrackingPolicy::Warn => {
            warn!(recording, redlines, "changing a document with change tracking active");
            Ok(())
        }
    }
}

/// True if the text between two marks is non-empty whitespace without a
/// paragraph break.
fn only_spaces_between<D: TextDocument + ?Sized>(
    doc: &D,
    left: &TextRange,
    right: &TextRange,
) -> Result<bool> {
    if !same_flow(left, right) {
        return Ok(false);
    }
    if left.end > right.start {
        warn!(left = %left, right = %right, "visual and textual order disagree; not merging");
        return Ok(false);
    }
    let gap = doc.text(&TextRange::new(left.flow, left.end, right.start))?;
    Ok(!gap.is_empty() && !gap.contains('\n') && gap.chars().all(char::is_whitespace))
}

/// The marker shown right after insertion, before a refresh numbers or
/// disambiguates it.
fn preliminary_marker(
    style: &Style,
    databases: &[Database],
    keys: &[String],
    citation_type: CitationType,
    page_info: Option<&str>,
) -> String {
    if citation_type == CitationType::Invisible {
        return String::new();
    }
    let marker = if style.citation_key_markers() {
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        markers::citation_key_marker(style, &keys)
    } else if style.is_numeric() {
        format!(
            "{}-{}",
            markup::escape(&style.bracket_before()),
            markup::escape(&style.bracket_after())
        )
    } else {
        let resolutions: Vec<Resolution> =
            keys.iter().map(|k| Resolution::lookup(k, databases)).collect();
        let items: Vec<MarkerItem<'_>> = keys
            .iter()
            .zip(&resolutions)
            .map(|(key, resolution)| MarkerItem {
                key: key.as_str(),
                resolution,
                unique_letter: None,
                is_first_appearance: false,
            })
            .collect();
        markers::author_year_marker(style, databases, &items, citation_type.in_parenthesis())
    };
    markers::finish(style, &marker, page_info)
}
