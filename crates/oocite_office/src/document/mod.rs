/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! The capabilities the rest of the crate needs from a word processor.
//!
//! [`TextDocument`] is the only seam to a concrete office suite. Everything
//! above it addresses text by [`TextRange`] values and re-queries marks by
//! name, so no host object outlives a call.

pub mod edit;
pub mod memory;

use crate::error::{OfficeError, Result};
use crate::range::{Flow, FootnoteId, TextRange};
use oocite_core::CharFormat;

pub use memory::{MemoryDocument, MemoryOffice};

/// Position of a character on screen, in the host's view units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScreenPoint {
    pub x: i64,
    pub y: i64,
}

pub trait TextDocument {
    fn title(&self) -> Result<String>;

    fn flow_length(&self, flow: Flow) -> Result<usize>;

    fn text(&self, range: &TextRange) -> Result<String>;

    /// Replaces the text under `range` and returns the range of the new text.
    /// New characters take the attributes of the character on their left.
    fn replace(&mut self, range: &TextRange, text: &str) -> Result<TextRange>;

    /// Adds direct attributes on top of the existing ones.
    fn apply_format(&mut self, range: &TextRange, format: CharFormat) -> Result<()>;

    fn remove_direct_formatting(&mut self, range: &TextRange) -> Result<()>;

    /// Fails with [`OfficeError::UndefinedCharacterFormat`] for unknown styles.
    fn set_character_style(&mut self, range: &TextRange, style: &str) -> Result<()>;

    fn has_paragraph_style(&self, style: &str) -> Result<bool>;

    /// Applies a paragraph style to every paragraph touched by `range`.
    fn set_paragraph_style(&mut self, range: &TextRange, style: &str) -> Result<()>;

    /// Inserts a field showing the page number of the reference mark `mark`.
    fn insert_page_reference(&mut self, at: &TextRange, mark: &str) -> Result<TextRange>;

    fn reference_mark_names(&self) -> Result<Vec<String>>;
    fn reference_mark_range(&self, name: &str) -> Result<Option<TextRange>>;
    fn create_reference_mark(&mut self, name: &str, range: &TextRange) -> Result<()>;
    /// Removes the mark, leaving its text in place.
    fn remove_reference_mark(&mut self, name: &str) -> Result<()>;

    fn bookmark_range(&self, name: &str) -> Result<Option<TextRange>>;
    fn create_bookmark(&mut self, name: &str, range: &TextRange) -> Result<()>;
    fn remove_bookmark(&mut self, name: &str) -> Result<()>;

    fn custom_property_names(&self) -> Result<Vec<String>>;
    fn custom_property(&self, name: &str) -> Result<Option<String>>;
    fn set_custom_property(&mut self, name: &str, value: &str) -> Result<()>;
    fn remove_custom_property(&mut self, name: &str) -> Result<()>;

    /// The anchor character of a footnote in the body.
    fn footnote_anchor(&self, id: FootnoteId) -> Result<Option<TextRange>>;
    fn footnote_anchors(&self) -> Result<Vec<TextRange>>;

    /// The user's current selection, if it is inside ordinary text.
    fn view_cursor(&self) -> Result<Option<TextRange>>;
    fn set_view_cursor(&mut self, range: &TextRange) -> Result<()>;
    /// Tries to put the selection back into the text. Returns whether a view
    /// cursor is available afterwards.
    fn restore_selection(&mut self) -> Result<bool>;
    /// Moves the view cursor to `at` and reports where it is on screen.
    fn view_position(&mut self, at: &TextRange) -> Result<ScreenPoint>;

    fn enter_undo_context(&mut self, label: &str) -> Result<()>;
    fn leave_undo_context(&mut self) -> Result<()>;

    /// Suspends screen updates. Nested calls are counted.
    fn lock_controllers(&mut self) -> Result<()>;
    fn unlock_controllers(&mut self) -> Result<()>;
    fn has_controllers_locked(&self) -> Result<bool>;

    fn is_recording_changes(&self) -> Result<bool>;
    /// Number of tracked changes not yet accepted or rejected.
    fn redline_count(&self) -> Result<usize>;
}

/// Lists the documents open in an office suite.
pub trait DocumentProvider {
    type Document: TextDocument;

    fn documents(&mut self) -> Result<Vec<Self::Document>>;
}

/// Picks one of several open documents, by title. `None` means cancelled.
pub trait DocumentChooser {
    fn choose(&self, titles: &[String]) -> Option<usize>;
}

impl<F> DocumentChooser for F
where
    F: Fn(&[String]) -> Option<usize>,
{
    fn choose(&self, titles: &[String]) -> Option<usize> {
        self(titles)
    }
}

/// Runs `body` as one undoable action. The undo context is left on every
/// path; an error from `body` wins over an error from leaving.
pub fn with_undo_group<D, T>(
    doc: &mut D,
    label: &str,
    body: impl FnOnce(&mut D) -> Result<T>,
) -> Result<T>
where
    D: TextDocument + ?Sized,
{
    doc.enter_undo_context(label)?;
    let result = body(doc);
    let left = doc.leave_undo_context();
    let value = result?;
    left?;
    Ok(value)
}

/// Runs `body` with screen updates suspended, releasing the lock on every path.
pub fn with_controller_lock<D, T>(doc: &mut D, body: impl FnOnce(&mut D) -> Result<T>) -> Result<T>
where
    D: TextDocument + ?Sized,
{
    doc.lock_controllers()?;
    let result = body(doc);
    let unlocked = doc.unlock_controllers();
    let value = result?;
    unlocked?;
    Ok(value)
}

/// The view cursor, restoring the selection once if needed.
pub fn require_view_cursor<D: TextDocument + ?Sized>(doc: &mut D) -> Result<TextRange> {
    if let Some(cursor) = doc.view_cursor()? {
        return Ok(cursor);
    }
    if doc.restore_selection()? {
        if let Some(cursor) = doc.view_cursor()? {
            return Ok(cursor);
        }
    }
    Err(OfficeError::CursorUnavailable(
        "the selection is not in the document text".to_string(),
    ))
}
