/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Editing patterns built from [`TextDocument`] primitives.
//!
//! Reference marks grow when text is typed at their end, so new text next to
//! an existing mark is inserted behind a pair of paragraph breaks that are
//! removed again afterwards.

use super::TextDocument;
use crate::error::{OfficeError, Result};
use crate::range::TextRange;
use oocite_core::{markup, CharFormat};

/// Placeholder at the start of a mark's content while it is being filled.
pub const LEFT_BRACKET: &str = "\u{200b}";
/// Placeholder at the end of a mark's content while it is being filled.
pub const RIGHT_BRACKET: &str = "\u{200b}";

/// Inserts `count` spaces at `at` without extending marks that end or start
/// there. Returns the range of the spaces.
pub fn insert_spaces_safely<D: TextDocument + ?Sized>(
    doc: &mut D,
    at: &TextRange,
    count: usize,
) -> Result<TextRange> {
    let flow = at.flow;
    let p = at.start;
    doc.replace(&at.start_point(), "\n\n")?;
    doc.replace(&TextRange::collapsed(flow, p + 1), &" ".repeat(count))?;
    doc.replace(&TextRange::new(flow, p + 1 + count, p + 2 + count), "")?;
    doc.replace(&TextRange::new(flow, p, p + 1), "")?;
    Ok(TextRange::new(flow, p, p + count))
}

/// Creates reference mark `name` at `at` over a bracketed placeholder.
///
/// The mark is created between two fresh spaces so that it cannot merge with
/// a neighbouring mark; the space before it is then removed, and the space
/// after it too unless `space_after` is set.
pub fn create_anchor<D: TextDocument + ?Sized>(
    doc: &mut D,
    name: &str,
    at: &TextRange,
    space_after: bool,
    without_brackets: bool,
) -> Result<TextRange> {
    let flow = at.flow;
    let p = at.start;
    insert_spaces_safely(doc, at, 2)?;
    let content = if without_brackets {
        String::new()
    } else {
        format!("{LEFT_BRACKET}{RIGHT_BRACKET}")
    };
    let inserted = doc.replace(&TextRange::collapsed(flow, p + 1), &content)?;
    doc.create_reference_mark(name, &inserted)?;
    doc.replace(&TextRange::new(flow, p, p + 1), "")?;
    if !space_after {
        let k = inserted.len();
        doc.replace(&TextRange::new(flow, p + k, p + k + 1), "")?;
    }
    doc.reference_mark_range(name)?
        .ok_or_else(|| OfficeError::Creation(format!("reference mark {name} was not created")))
}

/// Writes inline markup at `at` as formatted runs. Returns the written range.
pub fn write_markup<D: TextDocument + ?Sized>(
    doc: &mut D,
    at: &TextRange,
    markup_text: &str,
) -> Result<TextRange> {
    let runs = markup::parse(markup_text);
    let text: String = runs.iter().map(|r| r.text.as_str()).collect();
    let written = doc.replace(at, &text)?;
    if written.is_empty() {
        return Ok(written);
    }
    doc.remove_direct_formatting(&written)?;
    let mut pos = written.start;
    for run in &runs {
        let len = run.text.chars().count();
        if !run.format.is_plain() {
            doc.apply_format(&TextRange::new(written.flow, pos, pos + len), run.format)?;
        }
        pos += len;
    }
    Ok(written)
}

/// Italicizes every occurrence of `needle` inside `range`.
pub fn italicize_occurrences<D: TextDocument + ?Sized>(
    doc: &mut D,
    range: &TextRange,
    needle: &str,
) -> Result<()> {
    let needle = needle.trim();
    if needle.is_empty() {
        return Ok(());
    }
    let text = doc.text(range)?;
    let needle_len = needle.chars().count();
    for (byte_index, _) in text.match_indices(needle) {
        let offset = text[..byte_index].chars().count();
        let start = range.start + offset;
        doc.apply_format(
            &TextRange::new(range.flow, start, start + needle_len),
            CharFormat::italic(),
        )?;
    }
    Ok(())
}

/// Fails with [`OfficeError::UndefinedCharacterFormat`] when `style` does not
/// exist, leaving the text as it was.
pub fn check_character_style<D: TextDocument + ?Sized>(
    doc: &mut D,
    at: &TextRange,
    style: &str,
) -> Result<()> {
    let probe = doc.replace(&at.start_point(), "x")?;
    let styled = doc.set_character_style(&probe, style);
    doc.replace(&probe, "")?;
    styled
}
