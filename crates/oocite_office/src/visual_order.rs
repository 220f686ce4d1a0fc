/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Reading order of citation groups.
//!
//! Groups are ordered by where they appear on screen, top to bottom, then
//! left to right. A group inside a footnote is placed where the footnote is
//! anchored in the body. Two-column layouts are read row by row, which does
//! not match the textual order; this is accepted.

use crate::document::{require_view_cursor, TextDocument};
use crate::error::Result;
use crate::range::{footnote_mark_of, partition_by_flow, Flow, TextRange};
use oocite_processor::CitationGroupId;
use tracing::warn;

/// Orders groups for display. The user's view cursor is put back afterwards.
pub fn visual_order<D: TextDocument + ?Sized>(
    doc: &mut D,
    ranges: &[(CitationGroupId, TextRange)],
) -> Result<Vec<CitationGroupId>> {
    if ranges.is_empty() {
        return Ok(Vec::new());
    }
    let saved = require_view_cursor(doc)?;
    let ordered = order_by_position(doc, ranges);
    let restored = doc.set_view_cursor(&saved);
    let ordered = ordered?;
    restored?;
    Ok(ordered)
}

fn order_by_position<D: TextDocument + ?Sized>(
    doc: &mut D,
    ranges: &[(CitationGroupId, TextRange)],
) -> Result<Vec<CitationGroupId>> {
    let mut items = Vec::with_capacity(ranges.len());
    for (id, range) in ranges {
        let sort_range = match footnote_mark_of(doc, range)? {
            Some(mark) => mark,
            None => {
                if range.flow != Flow::Body {
                    warn!(mark = %id, "footnote without an anchor in the body");
                }
                *range
            }
        };
        items.push((sort_range, (id.clone(), *range)));
    }

    let mut partitions = partition_by_flow(items);
    // The body comes first; anything left in a footnote follows.
    partitions.sort_by(|a, _, b, _| (*a != Flow::Body).cmp(&(*b != Flow::Body)));

    let mut ordered = Vec::with_capacity(ranges.len());
    for (_, mut members) in partitions {
        members.sort_by_key(|(sort_range, (_, range))| {
            (sort_range.start, sort_range.end, range.start, range.end)
        });
        let mut keyed = Vec::with_capacity(members.len());
        for (index, (sort_range, (id, _))) in members.into_iter().enumerate() {
            let point = doc.view_position(&sort_range.start_point())?;
            keyed.push(((point.y, point.x, index), id));
        }
        keyed.sort_by_key(|(key, _)| *key);
        ordered.extend(keyed.into_iter().map(|(_, id)| id));
    }
    Ok(ordered)
}
