/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! An in-memory word processor.
//!
//! `MemoryDocument` behaves like a Writer document as far as citation
//! handling can tell: reference marks grow when text is typed at their end
//! (unless the text contains a paragraph break), bookmarks never do and are
//! lost when all of their text is deleted, new text takes the attributes of
//! its left neighbour, and text is laid out on fixed width lines so that
//! screen positions and page numbers exist.
//!
//! Clones share the same document, so a test can keep a handle while a
//! [`CitationManager`](crate::CitationManager) owns another.

use super::{DocumentProvider, ScreenPoint, TextDocument};
use crate::error::{OfficeError, Result};
use crate::range::{Flow, FootnoteId, TextRange};
use indexmap::IndexMap;
use oocite_core::CharFormat;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

/// Character shown in the body where a footnote is anchored.
pub const FOOTNOTE_ANCHOR_CHAR: char = '*';

const CHAR_WIDTH: i64 = 10;
const LINE_HEIGHT: i64 = 20;

#[derive(Debug, Clone, Default, PartialEq)]
struct Cell {
    ch: char,
    format: CharFormat,
    character_style: Option<String>,
    paragraph_style: Option<String>,
    footnote: Option<FootnoteId>,
    page_reference: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Selection {
    Text(TextRange),
    /// In a comment or another place without a text view cursor.
    Annotation,
    Empty,
}

#[derive(Debug)]
struct State {
    title: String,
    connected: bool,
    calls_left: Option<usize>,
    body: Vec<Cell>,
    footnotes: IndexMap<FootnoteId, Vec<Cell>>,
    next_footnote: u32,
    marks: IndexMap<String, TextRange>,
    bookmarks: IndexMap<String, TextRange>,
    properties: IndexMap<String, String>,
    character_styles: BTreeSet<String>,
    paragraph_styles: BTreeSet<String>,
    selection: Selection,
    undo_stack: Vec<String>,
    undo_history: Vec<String>,
    lock_depth: usize,
    recording_changes: bool,
    redlines: usize,
    line_width: usize,
    lines_per_page: usize,
}

/// What a stored position belongs to; each reacts to typing differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Holder {
    Mark,
    Bookmark,
    Cursor,
}

fn shift_for_insert(
    r: TextRange,
    p: usize,
    n: usize,
    holder: Holder,
    has_break: bool,
) -> TextRange {
    let (mut start, mut end) = (r.start, r.end);
    let expand_at_end = holder == Holder::Mark && !has_break;
    if r.is_empty() {
        // A collapsed bookmark keeps its place in front of typed text.
        if start > p || (start == p && holder != Holder::Bookmark) {
            start += n;
            end += n;
        }
    } else if p <= start {
        start += n;
        end += n;
    } else if p < end || (p == end && expand_at_end) {
        end += n;
    }
    TextRange::new(r.flow, start, end)
}

fn shift_for_delete(r: TextRange, s: usize, e: usize) -> TextRange {
    let adjust = |p: usize| {
        if p <= s {
            p
        } else if p >= e {
            p - (e - s)
        } else {
            s
        }
    };
    TextRange::new(r.flow, adjust(r.start), adjust(r.end))
}

impl State {
    fn new(title: &str) -> Self {
        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            title: title.to_string(),
            connected: true,
            calls_left: None,
            body: Vec::new(),
            footnotes: IndexMap::new(),
            next_footnote: 1,
            marks: IndexMap::new(),
            bookmarks: IndexMap::new(),
            properties: IndexMap::new(),
            character_styles: names(&["Standard", "Default Style"]),
            paragraph_styles: names(&["Standard", "Default Paragraph Style", "Heading 1", "Text body"]),
            selection: Selection::Text(TextRange::body(0, 0)),
            undo_stack: Vec::new(),
            undo_history: Vec::new(),
            lock_depth: 0,
            recording_changes: false,
            redlines: 0,
            line_width: 60,
            lines_per_page: 40,
        }
    }

    fn check(&mut self) -> Result<()> {
        if !self.connected {
            return Err(OfficeError::ConnectionLost);
        }
        if let Some(left) = self.calls_left {
            if left == 0 {
                self.connected = false;
                return Err(OfficeError::ConnectionLost);
            }
            self.calls_left = Some(left - 1);
        }
        Ok(())
    }

    fn cells(&self, flow: Flow) -> Result<&Vec<Cell>> {
        match flow {
            Flow::Body => Ok(&self.body),
            Flow::Footnote(id) => self
                .footnotes
                .get(&id)
                .ok_or_else(|| OfficeError::IllegalArgument(format!("no footnote {}", id.0))),
        }
    }

    fn cells_mut(&mut self, flow: Flow) -> Result<&mut Vec<Cell>> {
        match flow {
            Flow::Body => Ok(&mut self.body),
            Flow::Footnote(id) => self
                .footnotes
                .get_mut(&id)
                .ok_or_else(|| OfficeError::IllegalArgument(format!("no footnote {}", id.0))),
        }
    }

    fn check_range(&self, range: &TextRange) -> Result<()> {
        let len = self.cells(range.flow)?.len();
        if range.end > len {
            return Err(OfficeError::IllegalArgument(format!(
                "range {range} is outside the text (length {len})"
            )));
        }
        Ok(())
    }

    fn cells_in(&mut self, range: &TextRange) -> Result<&mut [Cell]> {
        self.check_range(range)?;
        Ok(&mut self.cells_mut(range.flow)?[range.start..range.end])
    }

    fn adjust_positions(&mut self, flow: Flow, f: impl Fn(TextRange, Holder) -> TextRange) {
        for r in self.marks.values_mut() {
            if r.flow == flow {
                *r = f(*r, Holder::Mark);
            }
        }
        for r in self.bookmarks.values_mut() {
            if r.flow == flow {
                *r = f(*r, Holder::Bookmark);
            }
        }
        if let Selection::Text(r) = self.selection {
            if r.flow == flow {
                self.selection = Selection::Text(f(r, Holder::Cursor));
            }
        }
    }

    fn delete(&mut self, flow: Flow, s: usize, e: usize) -> Result<()> {
        if s == e {
            return Ok(());
        }
        self.cells_mut(flow)?.drain(s..e);
        // A bookmark whose text is deleted entirely goes with it.
        self.bookmarks
            .retain(|_, r| r.flow != flow || r.is_empty() || r.start < s || r.end > e);
        self.adjust_positions(flow, |r, _| shift_for_delete(r, s, e));
        Ok(())
    }

    fn insert(&mut self, flow: Flow, p: usize, text: &str) -> Result<TextRange> {
        let cells = self.cells_mut(flow)?;
        let template = match p.checked_sub(1).and_then(|i| cells.get(i)) {
            Some(left) => Cell {
                footnote: None,
                page_reference: None,
                ..left.clone()
            },
            None => Cell {
                paragraph_style: cells.get(p).and_then(|c| c.paragraph_style.clone()),
                ..Cell::default()
            },
        };
        let new_cells: Vec<Cell> = text
            .chars()
            .map(|ch| Cell {
                ch,
                ..template.clone()
            })
            .collect();
        let n = new_cells.len();
        cells.splice(p..p, new_cells);
        let has_break = text.contains('\n');
        self.adjust_positions(flow, |r, holder| shift_for_insert(r, p, n, holder, has_break));
        Ok(TextRange::new(flow, p, p + n))
    }

    /// Line and column of a body position.
    fn layout_position(&self, pos: usize) -> (usize, usize) {
        line_and_column(&self.body[..pos.min(self.body.len())], self.line_width)
    }

    fn page_of(&self, range: &TextRange) -> Option<usize> {
        let pos = match range.flow {
            Flow::Body => range.start,
            Flow::Footnote(id) => self.body.iter().position(|c| c.footnote == Some(id))?,
        };
        let (line, _) = self.layout_position(pos);
        Some(line / self.lines_per_page.max(1) + 1)
    }
}

fn line_and_column(cells: &[Cell], line_width: usize) -> (usize, usize) {
    let (mut line, mut col) = (0, 0);
    for cell in cells {
        if cell.ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
            if col == line_width.max(1) {
                line += 1;
                col = 0;
            }
        }
    }
    (line, col)
}

#[derive(Debug, Clone)]
pub struct MemoryDocument {
    state: Rc<RefCell<State>>,
}

impl MemoryDocument {
    pub fn new(title: &str) -> Self {
        Self {
            state: Rc::new(RefCell::new(State::new(title))),
        }
    }

    /// A document whose body holds `text`, with the cursor at its end.
    pub fn from_text(title: &str, text: &str) -> Self {
        let doc = Self::new(title);
        doc.append_body(text);
        doc
    }

    pub fn append_body(&self, text: &str) {
        let mut s = self.state.borrow_mut();
        let end = s.body.len();
        // Body always exists.
        let _ = s.insert(Flow::Body, end, text);
    }

    /// Anchors a new footnote at body position `at`.
    pub fn add_footnote(&self, at: usize, text: &str) -> FootnoteId {
        let mut s = self.state.borrow_mut();
        let id = FootnoteId(s.next_footnote);
        s.next_footnote += 1;
        let at = at.min(s.body.len());
        let _ = s.insert(Flow::Body, at, &FOOTNOTE_ANCHOR_CHAR.to_string());
        s.body[at] = Cell {
            ch: FOOTNOTE_ANCHOR_CHAR,
            footnote: Some(id),
            ..Cell::default()
        };
        let cells = text
            .chars()
            .map(|ch| Cell {
                ch,
                paragraph_style: Some("Standard".to_string()),
                ..Cell::default()
            })
            .collect();
        s.footnotes.insert(id, cells);
        id
    }

    pub fn body_text(&self) -> String {
        self.state.borrow().body.iter().map(|c| c.ch).collect()
    }

    pub fn footnote_text(&self, id: FootnoteId) -> Option<String> {
        self.state
            .borrow()
            .footnotes
            .get(&id)
            .map(|cells| cells.iter().map(|c| c.ch).collect())
    }

    pub fn select(&self, range: TextRange) {
        self.state.borrow_mut().selection = Selection::Text(range);
    }

    /// Puts the selection somewhere without a text cursor that cannot be
    /// restored, like a comment being edited.
    pub fn select_annotation(&self) {
        self.state.borrow_mut().selection = Selection::Annotation;
    }

    /// Drops the selection; restoring it puts the cursor at the body start.
    pub fn clear_selection(&self) {
        self.state.borrow_mut().selection = Selection::Empty;
    }

    pub fn disconnect(&self) {
        self.state.borrow_mut().connected = false;
    }

    /// Loses the connection after `calls` further document calls.
    pub fn disconnect_after(&self, calls: usize) {
        self.state.borrow_mut().calls_left = Some(calls);
    }

    pub fn set_recording_changes(&self, on: bool) {
        self.state.borrow_mut().recording_changes = on;
    }

    pub fn set_redline_count(&self, count: usize) {
        self.state.borrow_mut().redlines = count;
    }

    pub fn set_line_width(&self, chars: usize) {
        self.state.borrow_mut().line_width = chars;
    }

    pub fn set_lines_per_page(&self, lines: usize) {
        self.state.borrow_mut().lines_per_page = lines;
    }

    pub fn define_character_style(&self, name: &str) {
        self.state.borrow_mut().character_styles.insert(name.to_string());
    }

    pub fn define_paragraph_style(&self, name: &str) {
        self.state.borrow_mut().paragraph_styles.insert(name.to_string());
    }

    fn cell_at(&self, flow: Flow, pos: usize) -> Option<Cell> {
        let s = self.state.borrow();
        s.cells(flow).ok()?.get(pos).cloned()
    }

    pub fn format_at(&self, flow: Flow, pos: usize) -> Option<CharFormat> {
        self.cell_at(flow, pos).map(|c| c.format)
    }

    pub fn character_style_at(&self, flow: Flow, pos: usize) -> Option<String> {
        self.cell_at(flow, pos).and_then(|c| c.character_style)
    }

    pub fn paragraph_style_at(&self, flow: Flow, pos: usize) -> Option<String> {
        self.cell_at(flow, pos).and_then(|c| c.paragraph_style)
    }

    /// Page reference fields in the body: their range and target mark.
    pub fn page_references(&self) -> Vec<(TextRange, String)> {
        let s = self.state.borrow();
        let mut found: Vec<(TextRange, String)> = Vec::new();
        for (i, cell) in s.body.iter().enumerate() {
            let Some(mark) = &cell.page_reference else {
                continue;
            };
            match found.last_mut() {
                Some((range, last)) if last == mark && range.end == i => range.end = i + 1,
                _ => found.push((TextRange::body(i, i + 1), mark.clone())),
            }
        }
        found
    }

    /// Labels of completed top-level undo contexts, oldest first.
    pub fn undo_history(&self) -> Vec<String> {
        self.state.borrow().undo_history.clone()
    }

    pub fn undo_depth(&self) -> usize {
        self.state.borrow().undo_stack.len()
    }

    pub fn lock_depth(&self) -> usize {
        self.state.borrow().lock_depth
    }
}

impl TextDocument for MemoryDocument {
    fn title(&self) -> Result<String> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        Ok(s.title.clone())
    }

    fn flow_length(&self, flow: Flow) -> Result<usize> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        Ok(s.cells(flow)?.len())
    }

    fn text(&self, range: &TextRange) -> Result<String> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        Ok(s.cells_in(range)?.iter().map(|c| c.ch).collect())
    }

    fn replace(&mut self, range: &TextRange, text: &str) -> Result<TextRange> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        s.check_range(range)?;
        s.delete(range.flow, range.start, range.end)?;
        s.insert(range.flow, range.start, text)
    }

    fn apply_format(&mut self, range: &TextRange, format: CharFormat) -> Result<()> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        for cell in s.cells_in(range)? {
            cell.format = cell.format.union(format);
        }
        Ok(())
    }

    fn remove_direct_formatting(&mut self, range: &TextRange) -> Result<()> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        for cell in s.cells_in(range)? {
            cell.format = CharFormat::default();
        }
        Ok(())
    }

    fn set_character_style(&mut self, range: &TextRange, style: &str) -> Result<()> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        if !s.character_styles.contains(style) {
            return Err(OfficeError::UndefinedCharacterFormat(style.to_string()));
        }
        for cell in s.cells_in(range)? {
            cell.character_style = Some(style.to_string());
        }
        Ok(())
    }

    fn has_paragraph_style(&self, style: &str) -> Result<bool> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        Ok(s.paragraph_styles.contains(style))
    }

    fn set_paragraph_style(&mut self, range: &TextRange, style: &str) -> Result<()> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        if !s.paragraph_styles.contains(style) {
            return Err(OfficeError::UndefinedParagraphFormat(style.to_string()));
        }
        s.check_range(range)?;
        let cells = s.cells_mut(range.flow)?;
        let start = cells[..range.start]
            .iter()
            .rposition(|c| c.ch == '\n')
            .map_or(0, |i| i + 1);
        let end = cells[range.end..]
            .iter()
            .position(|c| c.ch == '\n')
            .map_or(cells.len(), |i| range.end + i);
        for cell in &mut cells[start..end] {
            cell.paragraph_style = Some(style.to_string());
        }
        Ok(())
    }

    fn insert_page_reference(&mut self, at: &TextRange, mark: &str) -> Result<TextRange> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        s.check_range(at)?;
        let page = s
            .marks
            .get(mark)
            .and_then(|r| s.page_of(r))
            .map_or_else(|| "?".to_string(), |p| p.to_string());
        s.delete(at.flow, at.start, at.end)?;
        let inserted = s.insert(at.flow, at.start, &page)?;
        for cell in s.cells_in(&inserted)? {
            cell.page_reference = Some(mark.to_string());
        }
        Ok(inserted)
    }

    fn reference_mark_names(&self) -> Result<Vec<String>> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        Ok(s.marks.keys().cloned().collect())
    }

    fn reference_mark_range(&self, name: &str) -> Result<Option<TextRange>> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        Ok(s.marks.get(name).copied())
    }

    fn create_reference_mark(&mut self, name: &str, range: &TextRange) -> Result<()> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        s.check_range(range)?;
        if s.marks.contains_key(name) {
            return Err(OfficeError::Creation(format!("reference mark {name} already exists")));
        }
        s.marks.insert(name.to_string(), *range);
        Ok(())
    }

    fn remove_reference_mark(&mut self, name: &str) -> Result<()> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        s.marks
            .shift_remove(name)
            .map(|_| ())
            .ok_or_else(|| OfficeError::WrappedTarget(format!("no reference mark named {name}")))
    }

    fn bookmark_range(&self, name: &str) -> Result<Option<TextRange>> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        Ok(s.bookmarks.get(name).copied())
    }

    fn create_bookmark(&mut self, name: &str, range: &TextRange) -> Result<()> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        s.check_range(range)?;
        if s.bookmarks.contains_key(name) {
            return Err(OfficeError::Creation(format!("bookmark {name} already exists")));
        }
        s.bookmarks.insert(name.to_string(), *range);
        Ok(())
    }

    fn remove_bookmark(&mut self, name: &str) -> Result<()> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        s.bookmarks.shift_remove(name);
        Ok(())
    }

    fn custom_property_names(&self) -> Result<Vec<String>> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        Ok(s.properties.keys().cloned().collect())
    }

    fn custom_property(&self, name: &str) -> Result<Option<String>> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        Ok(s.properties.get(name).cloned())
    }

    fn set_custom_property(&mut self, name: &str, value: &str) -> Result<()> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        s.properties.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove_custom_property(&mut self, name: &str) -> Result<()> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        s.properties.shift_remove(name);
        Ok(())
    }

    fn footnote_anchor(&self, id: FootnoteId) -> Result<Option<TextRange>> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        Ok(s
            .body
            .iter()
            .position(|c| c.footnote == Some(id))
            .map(|i| TextRange::body(i, i + 1)))
    }

    fn footnote_anchors(&self) -> Result<Vec<TextRange>> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        Ok(s.body
            .iter()
            .enumerate()
            .filter(|(_, c)| c.footnote.is_some())
            .map(|(i, _)| TextRange::body(i, i + 1))
            .collect())
    }

    fn view_cursor(&self) -> Result<Option<TextRange>> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        Ok(match s.selection {
            Selection::Text(r) => Some(r),
            _ => None,
        })
    }

    fn set_view_cursor(&mut self, range: &TextRange) -> Result<()> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        s.check_range(range)?;
        s.selection = Selection::Text(*range);
        Ok(())
    }

    fn restore_selection(&mut self) -> Result<bool> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        match s.selection {
            Selection::Text(_) => Ok(true),
            Selection::Empty => {
                s.selection = Selection::Text(TextRange::body(0, 0));
                Ok(true)
            }
            Selection::Annotation => Ok(false),
        }
    }

    fn view_position(&mut self, at: &TextRange) -> Result<ScreenPoint> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        s.check_range(at)?;
        s.selection = Selection::Text(at.start_point());
        let (line, col) = match at.flow {
            Flow::Body => s.layout_position(at.start),
            Flow::Footnote(_) => {
                // Footnotes sit below the body lines of their page.
                let page = s.page_of(at).unwrap_or(1);
                let cells = s.cells(at.flow)?;
                let (line, col) = line_and_column(&cells[..at.start], s.line_width);
                (page * s.lines_per_page + line, col)
            }
        };
        Ok(ScreenPoint {
            x: col as i64 * CHAR_WIDTH,
            y: line as i64 * LINE_HEIGHT,
        })
    }

    fn enter_undo_context(&mut self, label: &str) -> Result<()> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        s.undo_stack.push(label.to_string());
        Ok(())
    }

    fn leave_undo_context(&mut self) -> Result<()> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        if let Some(label) = s.undo_stack.pop() {
            if s.undo_stack.is_empty() {
                s.undo_history.push(label);
            }
        }
        Ok(())
    }

    fn lock_controllers(&mut self) -> Result<()> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        s.lock_depth += 1;
        Ok(())
    }

    fn unlock_controllers(&mut self) -> Result<()> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        s.lock_depth = s.lock_depth.saturating_sub(1);
        Ok(())
    }

    fn has_controllers_locked(&self) -> Result<bool> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        Ok(s.lock_depth > 0)
    }

    fn is_recording_changes(&self) -> Result<bool> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        Ok(s.recording_changes)
    }

    fn redline_count(&self) -> Result<usize> {
        let mut s = self.state.borrow_mut();
        s.check()?;
        Ok(s.redlines)
    }
}

/// A set of open in-memory documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryOffice {
    documents: Vec<MemoryDocument>,
}

impl MemoryOffice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, doc: MemoryDocument) {
        self.documents.push(doc);
    }
}

impl DocumentProvider for MemoryOffice {
    type Document = MemoryDocument;

    fn documents(&mut self) -> Result<Vec<MemoryDocument>> {
        Ok(self.documents.clone())
    }
}
