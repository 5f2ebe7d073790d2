// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Source location tracking.
//!
//! Every token and AST node carries a `Span`. A span records both the byte
//! range it covers and the human-facing line/column pair of its first and
//! last character, so reports never need to rescan the source.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A 1-based line and column pair. Columns count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineColumn {
    pub line: u32,
    pub column: u32,
}

impl LineColumn {
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Default for LineColumn {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// A span of source code.
///
/// `start..end` is the half-open byte range. `begin` is the position of the
/// first character and `last` the position of the last character, so
/// `end_column()` is inclusive: `$a;` at the start of a line spans columns
/// 1 to 3.
///
/// # Examples
///
/// ```
/// use strata_core::source_analysis::{LineColumn, Span};
///
/// let span = Span::new(0..3, LineColumn::new(1, 1), LineColumn::new(1, 3));
/// assert_eq!(span.len(), 3);
/// assert_eq!(span.end_column(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    start: u32,
    end: u32,
    begin: LineColumn,
    last: LineColumn,
}

impl Span {
    /// Creates a span from a byte range and the positions of its first and
    /// last characters.
    #[must_use]
    pub const fn new(range: Range<u32>, begin: LineColumn, last: LineColumn) -> Self {
        Self {
            start: range.start,
            end: range.end,
            begin,
            last,
        }
    }

    /// Creates an empty span at a position.
    #[must_use]
    pub const fn empty(offset: u32, at: LineColumn) -> Self {
        Self::new(offset..offset, at, at)
    }

    /// Returns the start byte offset.
    #[must_use]
    pub const fn start(self) -> u32 {
        self.start
    }

    /// Returns the end byte offset (exclusive).
    #[must_use]
    pub const fn end(self) -> u32 {
        self.end
    }

    #[must_use]
    pub const fn start_line(self) -> u32 {
        self.begin.line
    }

    #[must_use]
    pub const fn start_column(self) -> u32 {
        self.begin.column
    }

    #[must_use]
    pub const fn end_line(self) -> u32 {
        self.last.line
    }

    /// Column of the last character (inclusive).
    #[must_use]
    pub const fn end_column(self) -> u32 {
        self.last.column
    }

    /// Returns the length of the span in bytes.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Returns true if `other` is fully contained within `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Creates a span that covers both `self` and `other`.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        let (start, begin) = if other.start < self.start {
            (other.start, other.begin)
        } else {
            (self.start, self.begin)
        };
        let (end, last) = if other.end > self.end {
            (other.end, other.last)
        } else {
            (self.end, self.last)
        };
        Self {
            start,
            end,
            begin,
            last,
        }
    }

    /// Converts to a `Range<usize>` for indexing into source text.
    #[must_use]
    pub const fn as_range(self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.as_range()
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        (span.start as usize, span.len() as usize).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(range: Range<u32>, begin: (u32, u32), last: (u32, u32)) -> Span {
        Span::new(
            range,
            LineColumn::new(begin.0, begin.1),
            LineColumn::new(last.0, last.1),
        )
    }

    #[test]
    fn span_new_and_accessors() {
        let s = span(5..15, (2, 3), (2, 12));
        assert_eq!(s.start(), 5);
        assert_eq!(s.end(), 15);
        assert_eq!(s.len(), 10);
        assert_eq!(s.start_line(), 2);
        assert_eq!(s.start_column(), 3);
        assert_eq!(s.end_line(), 2);
        assert_eq!(s.end_column(), 12);
        assert!(!s.is_empty());
    }

    #[test]
    fn span_empty() {
        let s = Span::empty(7, LineColumn::new(1, 8));
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
        assert_eq!(s.start_column(), 8);
    }

    #[test]
    fn span_merge_takes_outer_positions() {
        let a = span(5..10, (1, 6), (1, 10));
        let b = span(15..20, (2, 1), (2, 5));
        let merged = b.merge(a);
        assert_eq!(merged.start(), 5);
        assert_eq!(merged.end(), 20);
        assert_eq!(merged.start_column(), 6);
        assert_eq!(merged.end_line(), 2);
        assert_eq!(merged.end_column(), 5);
    }

    #[test]
    fn span_contains_uses_offsets() {
        let outer = span(0..20, (1, 1), (1, 20));
        let inner = span(3..7, (1, 4), (1, 7));
        assert!(outer.contains(inner));
        assert!(!inner.contains(outer));
        assert!(outer.contains(outer));
    }

    #[test]
    fn span_to_miette() {
        let s = span(4..9, (1, 5), (1, 9));
        let source: miette::SourceSpan = s.into();
        assert_eq!(source.offset(), 4);
        assert_eq!(source.len(), 5);
    }
}
