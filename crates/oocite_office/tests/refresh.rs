/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

mod common;
use common::*;

use oocite_core::codec::BIBLIOGRAPHY_BOOKMARK;
use oocite_office::{
    ChangeTrackingPolicy, CitationManager, Flow, MemoryDocument, OfficeError, Preferences,
    TextDocument, TextRange,
};

#[test]
fn test_numeric_markers_follow_first_appearance() {
    let db = database();
    let style = numeric_style();
    let doc = MemoryDocument::from_text("Paper", "X");
    let mut manager = manager(&doc);

    cite(&mut manager, &db, &style, &["a", "b"]);
    cite(&mut manager, &db, &style, &["a"]);
    cite(&mut manager, &db, &style, &["c", "b"]);
    let unresolved = manager.refresh(&[db.clone()], &style).unwrap();

    assert!(unresolved.is_empty());
    assert_eq!(marker_texts(&doc), vec!["[1,2]", "[1]", "[3,2]"]);
    assert_eq!(
        bibliography_text(&doc).unwrap(),
        "References\n[1] Alpha, Ann: Apples.\n[2] Beta, Bob: Bananas.\n[3] Gamma, Carl: Cherries."
    );
    assert!(plain_body(&doc).starts_with("X[1,2] [1] [3,2] \nReferences"));
}

#[test]
fn test_author_year_letters_disambiguate_same_marker() {
    let db = database();
    let style = author_year_style(", ");
    let doc = MemoryDocument::from_text("Paper", "Text ");
    let mut manager = manager(&doc);

    cite(&mut manager, &db, &style, &["smith1"]);
    cite(&mut manager, &db, &style, &["smith2"]);
    cite(&mut manager, &db, &style, &["smith1"]);
    manager.refresh(&[db.clone()], &style).unwrap();

    assert_eq!(
        marker_texts(&doc),
        vec!["(Smith, 2000a)", "(Smith, 2000b)", "(Smith, 2000a)"]
    );
}

#[test]
fn test_unresolved_key_is_reported_and_listed_with_pages() {
    let db = database();
    let style = numeric_style();
    let doc = MemoryDocument::from_text("Paper", "See ");
    let mut manager = manager(&doc);

    cite(&mut manager, &db, &style, &["missing"]);
    let unresolved = manager.refresh(&[db.clone()], &style).unwrap();

    assert_eq!(unresolved, vec!["missing"]);
    assert_eq!(marker_texts(&doc), vec!["[Unresolved(missing)]"]);
    assert_eq!(
        bibliography_text(&doc).unwrap(),
        "References\nUnresolved(missing) (Cited on pages: 1)"
    );
    let refs = doc.page_references();
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].1, mark_names(&doc)[0]);
}

#[test]
fn test_cited_on_pages_for_every_entry_when_preferred() {
    let db = database();
    let style = numeric_style();
    let doc = MemoryDocument::from_text("Paper", "See ");
    let preferences = Preferences {
        always_add_cited_on_pages: true,
        ..Preferences::default()
    };
    let mut manager = CitationManager::with_document(doc.clone(), preferences);

    cite(&mut manager, &db, &style, &["a"]);
    cite(&mut manager, &db, &style, &["a"]);
    manager.refresh(&[db.clone()], &style).unwrap();

    assert_eq!(
        bibliography_text(&doc).unwrap(),
        "References\n[1] Alpha, Ann: Apples. (Cited on pages: 1, 1)"
    );
}

#[test]
fn test_refresh_is_deterministic() {
    let db = database();
    let style = author_year_style(", ");
    let doc = MemoryDocument::from_text("Paper", "Start ");
    let mut manager = manager(&doc);
    cite(&mut manager, &db, &style, &["b", "a"]);
    cite(&mut manager, &db, &style, &["smith2"]);

    manager.refresh(&[db.clone()], &style).unwrap();
    let first_body = doc.body_text();
    let first_formats: Vec<_> = (0..first_body.chars().count())
        .map(|i| doc.format_at(Flow::Body, i))
        .collect();

    manager.refresh(&[db.clone()], &style).unwrap();
    let second_formats: Vec<_> = (0..first_body.chars().count())
        .map(|i| doc.format_at(Flow::Body, i))
        .collect();

    assert_eq!(doc.body_text(), first_body);
    assert_eq!(first_formats, second_formats);
    assert_eq!(marker_texts(&doc), vec!["(Alpha, 2000; Beta, 2001)", "(Smith, 2000)"]);
}

#[test]
fn test_sync_insert_matches_insert_then_refresh() {
    let db = database();
    let style = numeric_style();

    let synced = MemoryDocument::from_text("A", "Body\nEnd");
    synced.select(TextRange::body(4, 4));
    let mut m1 = manager(&synced);
    for keys in [&["c"][..], &["a", "c"][..]] {
        m1.insert_citation(&entries(&db, keys), &[db.clone()], &style, true, true, None, true)
            .unwrap();
    }

    let batched = MemoryDocument::from_text("B", "Body\nEnd");
    batched.select(TextRange::body(4, 4));
    let mut m2 = manager(&batched);
    cite(&mut m2, &db, &style, &["c"]);
    cite(&mut m2, &db, &style, &["a", "c"]);
    m2.refresh(&[db.clone()], &style).unwrap();

    assert_eq!(synced.body_text(), batched.body_text());
    assert!(plain_body(&synced).starts_with("Body[1] [2,1] \nEnd\nReferences"));
    assert_eq!(marker_texts(&synced), vec!["[1]", "[2,1]"]);
    assert_eq!(synced.undo_history(), vec!["Insert citation", "Insert citation"]);
}

#[test]
fn test_footnote_citations_are_numbered_in_reading_order() {
    let db = database();
    let style = numeric_style();
    let doc = MemoryDocument::from_text("Paper", "Intro. End.");
    let note = doc.add_footnote(6, "See ");
    let mut manager = manager(&doc);

    let body_len = doc.body_text().chars().count();
    doc.select(TextRange::body(body_len, body_len));
    cite(&mut manager, &db, &style, &["c"]);
    doc.select(TextRange::collapsed(Flow::Footnote(note), 4));
    cite(&mut manager, &db, &style, &["b"]);
    doc.select(TextRange::body(0, 0));
    cite(&mut manager, &db, &style, &["a"]);

    manager.refresh(&[db.clone()], &style).unwrap();

    let by_name: Vec<(String, String)> = mark_names(&doc)
        .into_iter()
        .zip(marker_texts(&doc))
        .collect();
    let marker_of = |key: &str| {
        by_name
            .iter()
            .find(|(name, _)| name.ends_with(&format!("_{key}")))
            .map(|(_, text)| text.clone())
            .unwrap()
    };
    assert_eq!(marker_of("a"), "[1]");
    assert_eq!(marker_of("b"), "[2]");
    assert_eq!(marker_of("c"), "[3]");
    assert!(doc.footnote_text(note).unwrap().contains("[2]"));
}

#[test]
fn test_overlapping_marks_abort_without_changes() {
    let db = database();
    let style = numeric_style();
    let mut doc = MemoryDocument::from_text("Paper", "abcdefgh");
    doc.create_reference_mark("JR_cite_1_a", &TextRange::body(0, 4)).unwrap();
    doc.create_reference_mark("JR_cite_1_b", &TextRange::body(2, 6)).unwrap();
    let mut manager = manager(&doc);

    let err = manager.refresh(&[db.clone()], &style).unwrap_err();

    match err {
        OfficeError::Overlap(pairs) => {
            assert_eq!(pairs.len(), 1);
            assert!(pairs[0].starts_with("OVERLAP"), "{pairs:?}");
        }
        other => panic!("expected an overlap, got {other:?}"),
    }
    assert_eq!(doc.body_text(), "abcdefgh");
    assert_eq!(doc.undo_depth(), 0);
}

#[test]
fn test_undefined_character_style_blocks_insert() {
    let db = database();
    let style = formatted_numeric_style("Citation");
    let doc = MemoryDocument::from_text("Paper", "Text ");
    let mut manager = manager(&doc);

    let err = manager
        .insert_citation(&entries(&db, &["a"]), &[db.clone()], &style, true, true, None, true)
        .unwrap_err();

    assert!(matches!(err, OfficeError::UndefinedCharacterFormat(ref s) if s == "Citation"));
    assert_eq!(doc.body_text(), "Text ");
    assert!(doc.reference_mark_names().unwrap().is_empty());
    assert_eq!(doc.undo_depth(), 0);
    assert_eq!(doc.lock_depth(), 0);

    doc.define_character_style("Citation");
    manager
        .insert_citation(&entries(&db, &["a"]), &[db.clone()], &style, true, true, None, true)
        .unwrap();
    let (_, range) = marks_in_order(&doc).remove(0);
    assert_eq!(
        doc.character_style_at(Flow::Body, range.start + 1).as_deref(),
        Some("Citation")
    );
}

#[test]
fn test_undefined_character_style_blocks_refresh() {
    let db = database();
    let doc = MemoryDocument::from_text("Paper", "Text ");
    let mut manager = manager(&doc);
    cite(&mut manager, &db, &numeric_style(), &["a"]);
    let before = doc.body_text();

    let err = manager
        .refresh(&[db.clone()], &formatted_numeric_style("Missing"))
        .unwrap_err();

    assert!(matches!(err, OfficeError::UndefinedCharacterFormat(_)));
    assert_eq!(doc.body_text(), before);
    assert_eq!(doc.lock_depth(), 0);
    assert_eq!(doc.undo_depth(), 0);
}

#[test]
fn test_undefined_paragraph_style_blocks_bibliography() {
    let db = database();
    let style = oocite_core::Style::parse(
        "PROPERTIES\nIsNumberEntries=true\nReferenceParagraphFormat=Fancy\n\nLAYOUT\ndefault=\\title\n",
    )
    .unwrap();
    let doc = MemoryDocument::from_text("Paper", "Text ");
    let mut manager = manager(&doc);
    cite(&mut manager, &db, &style, &["a"]);
    let before = doc.body_text();

    let err = manager.refresh(&[db.clone()], &style).unwrap_err();

    assert!(matches!(err, OfficeError::UndefinedParagraphFormat(ref s) if s == "Fancy"));
    assert_eq!(doc.body_text(), before);
    assert!(bibliography_text(&doc).is_none());
}

#[test]
fn test_change_tracking_refused_unless_warned() {
    let db = database();
    let style = numeric_style();
    let doc = MemoryDocument::from_text("Paper", "Text ");
    doc.set_recording_changes(true);
    let mut manager = manager(&doc);

    let err = manager
        .insert_citation(&entries(&db, &["a"]), &[db.clone()], &style, true, true, None, true)
        .unwrap_err();
    assert!(matches!(err, OfficeError::ChangeTracking { recording: true, .. }));
    assert_eq!(doc.body_text(), "Text ");

    manager.set_preferences(Preferences {
        change_tracking: ChangeTrackingPolicy::Warn,
        ..Preferences::default()
    });
    manager
        .insert_citation(&entries(&db, &["a"]), &[db.clone()], &style, true, true, None, true)
        .unwrap();
    assert_eq!(marker_texts(&doc), vec!["[1]"]);
}

#[test]
fn test_cursor_in_annotation_is_unavailable() {
    let db = database();
    let style = numeric_style();
    let doc = MemoryDocument::from_text("Paper", "Text ");
    doc.select_annotation();
    let mut manager = manager(&doc);

    let err = manager
        .insert_citation(&entries(&db, &["a"]), &[db.clone()], &style, true, true, None, false)
        .unwrap_err();

    assert!(matches!(err, OfficeError::CursorUnavailable(_)));
    assert_eq!(doc.body_text(), "Text ");
    assert_eq!(doc.undo_depth(), 0);
}

#[test]
fn test_refresh_without_citations_ignores_the_selection() {
    let db = database();
    let doc = MemoryDocument::from_text("Paper", "X");
    doc.select_annotation();
    let mut manager = manager(&doc);

    let unresolved = manager.refresh(&[db.clone()], &numeric_style()).unwrap();

    assert!(unresolved.is_empty());
    assert_eq!(bibliography_text(&doc).as_deref(), Some("References"));
    assert_eq!(doc.lock_depth(), 0);
    assert_eq!(doc.undo_depth(), 0);
}

#[test]
fn test_marker_overwriting_the_bibliography_bookmark_fails() {
    let db = database();
    let style = numeric_style();
    let mut doc = MemoryDocument::from_text("Paper", "Text ");
    let mut manager = manager(&doc);
    cite(&mut manager, &db, &style, &["a"]);
    let (_, range) = marks_in_order(&doc).remove(0);
    assert!(range.len() >= 3, "{range}");
    doc.create_bookmark(
        BIBLIOGRAPHY_BOOKMARK,
        &TextRange::body(range.start + 1, range.end - 1),
    )
    .unwrap();

    let err = manager.refresh(&[db.clone()], &style).unwrap_err();

    match err {
        OfficeError::Inconsistent(message) => {
            assert!(message.contains("bibliography bookmark"), "{message}");
        }
        other => panic!("expected an inconsistency, got {other:?}"),
    }
    assert_eq!(doc.lock_depth(), 0);
    assert_eq!(doc.undo_depth(), 0);
}

#[test]
fn test_operations_need_a_document() {
    let db = database();
    let mut manager: CitationManager<MemoryDocument> = CitationManager::new(Preferences::default());

    assert!(matches!(
        manager.refresh(&[db.clone()], &numeric_style()),
        Err(OfficeError::NoDocument)
    ));
    assert!(matches!(manager.list_citations(), Err(OfficeError::NoDocument)));
}

#[test]
fn test_lost_connection_drops_the_document() {
    let db = database();
    let doc = MemoryDocument::from_text("Paper", "Text ");
    let mut manager = manager(&doc);
    assert!(manager.is_connected());

    doc.disconnect();
    let err = manager.refresh(&[db.clone()], &numeric_style()).unwrap_err();

    assert!(matches!(err, OfficeError::ConnectionLost));
    assert!(!manager.is_connected());
    assert!(matches!(
        manager.refresh(&[db.clone()], &numeric_style()),
        Err(OfficeError::NoDocument)
    ));
}

#[test]
fn test_connection_lost_midway_clears_the_document() {
    let db = database();
    let style = numeric_style();
    let doc = MemoryDocument::from_text("Paper", "Text ");
    let mut manager = manager(&doc);
    cite(&mut manager, &db, &style, &["a"]);
    cite(&mut manager, &db, &style, &["b"]);

    doc.disconnect_after(10);
    let result = manager.refresh(&[db.clone()], &style);

    assert!(matches!(result, Err(OfficeError::ConnectionLost)));
    assert!(!manager.is_connected());
}

#[test]
fn test_bibliography_stays_between_bookmarks_when_text_follows() {
    let db = database();
    let style = numeric_style();
    let doc = MemoryDocument::from_text("Paper", "Text ");
    let mut manager = manager(&doc);
    cite(&mut manager, &db, &style, &["b"]);
    manager.refresh(&[db.clone()], &style).unwrap();

    doc.append_body("\nAppendix");
    doc.select(TextRange::body(0, 0));
    cite(&mut manager, &db, &style, &["a"]);
    manager.refresh(&[db.clone()], &style).unwrap();

    assert_eq!(
        bibliography_text(&doc).unwrap(),
        "References\n[1] Alpha, Ann: Apples.\n[2] Beta, Bob: Bananas."
    );
    assert!(doc.body_text().ends_with("\nAppendix"));
    assert_eq!(marker_texts(&doc), vec!["[1]", "[2]"]);
}
