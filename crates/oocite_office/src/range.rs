/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Text ranges and their ordering.
//!
//! Positions are character offsets within one flow: the document body or the
//! text of a single footnote. Ranges in different flows are not comparable.

use crate::document::TextDocument;
use crate::error::{OfficeError, Result};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FootnoteId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    Body,
    Footnote(FootnoteId),
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flow::Body => write!(f, "body"),
            Flow::Footnote(FootnoteId(id)) => write!(f, "footnote {id}"),
        }
    }
}

/// A half-open character range `[start, end)` within one flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub flow: Flow,
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(flow: Flow, start: usize, end: usize) -> Self {
        Self {
            flow,
            start: start.min(end),
            end: start.max(end),
        }
    }

    pub fn collapsed(flow: Flow, at: usize) -> Self {
        Self::new(flow, at, at)
    }

    pub fn body(start: usize, end: usize) -> Self {
        Self::new(Flow::Body, start, end)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn start_point(&self) -> TextRange {
        Self::collapsed(self.flow, self.start)
    }

    pub fn end_point(&self) -> TextRange {
        Self::collapsed(self.flow, self.end)
    }

    /// The range from the start of `self` to the end of `other`.
    pub fn through(&self, other: &TextRange) -> Result<TextRange> {
        if !same_flow(self, other) {
            return Err(incomparable(self, other));
        }
        Ok(TextRange::new(self.flow, self.start, other.end))
    }

    pub fn contains(&self, other: &TextRange) -> bool {
        same_flow(self, other) && self.start <= other.start && other.end <= self.end
    }

    /// True when the ranges share at least one character, or when a collapsed
    /// range lies strictly inside the other.
    pub fn intersects(&self, other: &TextRange) -> bool {
        if !same_flow(self, other) {
            return false;
        }
        match (self.is_empty(), other.is_empty()) {
            (false, false) => self.start < other.end && other.start < self.end,
            (true, false) => other.start < self.start && self.start < other.end,
            (false, true) => self.start < other.start && other.start < self.end,
            (true, true) => false,
        }
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}..{}]", self.flow, self.start, self.end)
    }
}

pub fn same_flow(a: &TextRange, b: &TextRange) -> bool {
    a.flow == b.flow
}

fn incomparable(a: &TextRange, b: &TextRange) -> OfficeError {
    OfficeError::IllegalArgument(format!("ranges {a} and {b} are in different flows"))
}

pub fn compare_starts(a: &TextRange, b: &TextRange) -> Result<Ordering> {
    if !same_flow(a, b) {
        return Err(incomparable(a, b));
    }
    Ok(a.start.cmp(&b.start))
}

pub fn compare_ends(a: &TextRange, b: &TextRange) -> Result<Ordering> {
    if !same_flow(a, b) {
        return Err(incomparable(a, b));
    }
    Ok(a.end.cmp(&b.end))
}

pub fn compare_starts_then_ends(a: &TextRange, b: &TextRange) -> Result<Ordering> {
    Ok(compare_starts(a, b)?.then(compare_ends(a, b)?))
}

/// For a range inside a footnote, the range of the footnote's anchor in the
/// body. `None` for body ranges.
pub fn footnote_mark_of<D: TextDocument + ?Sized>(
    doc: &D,
    range: &TextRange,
) -> Result<Option<TextRange>> {
    match range.flow {
        Flow::Body => Ok(None),
        Flow::Footnote(id) => doc.footnote_anchor(id),
    }
}

/// Groups items by flow, keeping first-seen flow order.
pub fn partition_by_flow<T>(items: Vec<(TextRange, T)>) -> IndexMap<Flow, Vec<(TextRange, T)>> {
    let mut partitions: IndexMap<Flow, Vec<(TextRange, T)>> = IndexMap::new();
    for (range, item) in items {
        partitions.entry(range.flow).or_default().push((range, item));
    }
    partitions
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapKind {
    Equal,
    Overlap,
    Touch,
}

impl fmt::Display for OverlapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OverlapKind::Equal => "EQUAL",
            OverlapKind::Overlap => "OVERLAP",
            OverlapKind::Touch => "TOUCH",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeOverlap<T> {
    pub kind: OverlapKind,
    pub first: T,
    pub second: T,
}

/// Pairs of ranges that are equal, overlap, or (when asked) touch. At most
/// `limit` pairs are reported.
pub fn find_overlaps<T: Clone>(
    ranges: &[(TextRange, T)],
    report_touching: bool,
    limit: usize,
) -> Vec<RangeOverlap<T>> {
    let mut found = Vec::new();
    let partitions = partition_by_flow(ranges.iter().map(|(r, t)| (*r, t)).collect());
    for (_, mut items) in partitions {
        items.sort_by_key(|(r, _)| (r.start, r.end));
        let mut widest: Option<(TextRange, &T)> = None;
        for (range, item) in items {
            if let Some((prev, prev_item)) = widest {
                let kind = if prev.start == range.start && prev.end == range.end {
                    Some(OverlapKind::Equal)
                } else if range.start < prev.end {
                    Some(OverlapKind::Overlap)
                } else if range.start == prev.end && report_touching {
                    Some(OverlapKind::Touch)
                } else {
                    None
                };
                if let Some(kind) = kind {
                    if found.len() >= limit {
                        return found;
                    }
                    found.push(RangeOverlap {
                        kind,
                        first: prev_item.clone(),
                        second: item.clone(),
                    });
                }
            }
            if widest.map_or(true, |(w, _)| range.end >= w.end) {
                widest = Some((range, item));
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fnote(id: u32, start: usize, end: usize) -> TextRange {
        TextRange::new(Flow::Footnote(FootnoteId(id)), start, end)
    }

    #[test]
    fn test_comparisons_need_same_flow() {
        let a = TextRange::body(1, 4);
        let b = TextRange::body(1, 6);
        assert_eq!(compare_starts(&a, &b).unwrap(), Ordering::Equal);
        assert_eq!(compare_starts_then_ends(&a, &b).unwrap(), Ordering::Less);
        assert!(compare_ends(&a, &fnote(1, 0, 2)).is_err());
    }

    #[test]
    fn test_overlap_kinds() {
        let ranges = vec![
            (TextRange::body(0, 4), "a"),
            (TextRange::body(0, 4), "b"),
            (TextRange::body(3, 6), "c"),
            (TextRange::body(6, 8), "d"),
            (TextRange::body(10, 12), "e"),
        ];
        let found = find_overlaps(&ranges, false, 10);
        let kinds: Vec<(OverlapKind, &str, &str)> =
            found.iter().map(|o| (o.kind, o.first, o.second)).collect();
        assert_eq!(
            kinds,
            vec![(OverlapKind::Equal, "a", "b"), (OverlapKind::Overlap, "b", "c")]
        );

        let with_touch = find_overlaps(&ranges, true, 10);
        assert!(with_touch
            .iter()
            .any(|o| o.kind == OverlapKind::Touch && o.first == "c" && o.second == "d"));
    }

    #[test]
    fn test_nested_ranges_overlap() {
        let ranges = vec![
            (TextRange::body(0, 10), 1),
            (TextRange::body(2, 3), 2),
            (TextRange::body(5, 6), 3),
        ];
        let found = find_overlaps(&ranges, false, 10);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|o| o.first == 1));
    }

    #[test]
    fn test_flows_are_independent_and_limit_applies() {
        let ranges = vec![
            (TextRange::body(0, 4), 1),
            (fnote(1, 0, 4), 2),
            (TextRange::body(1, 2), 3),
            (TextRange::body(2, 3), 4),
        ];
        assert_eq!(find_overlaps(&ranges, false, 10).len(), 2);
        assert_eq!(find_overlaps(&ranges, false, 1).len(), 1);
    }

    #[test]
    fn test_intersects() {
        let a = TextRange::body(2, 5);
        assert!(a.intersects(&TextRange::body(4, 8)));
        assert!(!a.intersects(&TextRange::body(5, 8)));
        assert!(a.intersects(&TextRange::collapsed(Flow::Body, 3)));
        assert!(!a.intersects(&TextRange::collapsed(Flow::Body, 5)));
    }
}
