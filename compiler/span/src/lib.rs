//! Data structures and procedures for handling source locations.
//!
//! Locations are line/column pairs, both 1-based. Columns are counted in UTF-16 code
//! units and the sequences `\r\n`, `\r` and `\n` each count as a single line break.

use std::{cmp::Ordering, fmt};

pub use source_map::{FileName, SourceFile, SourceFileIndex, SourceMap};
pub use spanning::{PossiblySpanning, Spanning};

pub mod source_map;

#[cfg(test)]
mod test;

/// A position in a source file.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub const START: Self = Self::new(1, 1);

    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// The location after the given character, assuming it is not a line break.
    #[must_use]
    pub fn advance(self, character: char) -> Self {
        #[allow(clippy::cast_possible_truncation)] // at most 2
        let width = character.len_utf16() as u32;
        Self::new(self.line, self.column + width)
    }

    #[must_use]
    pub const fn next_line(self) -> Self {
        Self::new(self.line + 1, 1)
    }

    /// Relate the location to the given span.
    ///
    /// If the location is to the left of the span, it is considered [less](Ordering::Less).
    /// If it is at or to the right of its end, it is considered [greater](Ordering::Greater).
    /// Otherwise it lies within the span and [equal](Ordering::Equal) is returned.
    pub fn relate(self, span: Span) -> Ordering {
        if self < span.start {
            Ordering::Less
        } else if span.end <= self {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A span of source code.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Span {
    /// The start of the span, inclusive.
    pub start: Location,
    /// The end of the span, exclusive.
    pub end: Location,
}

impl Span {
    #[cfg_attr(debug_assertions, track_caller)]
    pub fn new(start: Location, end: Location) -> Self {
        debug_assert!(start <= end, "span start ({start}) > span end ({end})");

        Self { start, end }
    }

    /// Create an empty span at the given location.
    pub fn empty(location: Location) -> Self {
        Self::new(location, location)
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Whether the location lies within the span, both ends included.
    pub fn contains(self, location: Location) -> bool {
        self.start <= location && location <= self.end
    }

    pub fn encloses(self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    #[must_use]
    pub fn start(self) -> Self {
        Self::empty(self.start)
    }

    #[must_use]
    pub fn end(self) -> Self {
        Self::empty(self.end)
    }

    pub fn set_end(&mut self, location: Location) {
        self.end = location;
    }

    #[must_use]
    pub fn merge(self, other: impl PossiblySpanning) -> Self {
        match other.possible_span() {
            Some(other) => Self::new(self.start.min(other.start), self.end.max(other.end)),
            None => self,
        }
    }

    /// Extend the span to the end of the given one and pass the latter through.
    pub fn merging<S: PossiblySpanning>(&mut self, other: S) -> S {
        if let Some(other) = other.possible_span() {
            if other.end > self.end {
                self.end = other.end;
            }
        }
        other
    }

    pub fn between(self, other: Span) -> Span {
        Self::new(self.end, other.start.max(self.end))
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}

impl Spanning for Span {
    fn span(&self) -> Self {
        *self
    }
}

/// Convenience function for constructing a span in test code.
pub fn span(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Span {
    Span::new(
        Location::new(start_line, start_column),
        Location::new(end_line, end_column),
    )
}

mod spanning {
    use super::Span;

    pub trait Spanning: PossiblySpanning {
        fn span(&self) -> Span;
    }

    impl<S: Spanning> Spanning for &S {
        fn span(&self) -> Span {
            (**self).span()
        }
    }

    impl<S: Spanning> Spanning for Box<S> {
        fn span(&self) -> Span {
            (**self).span()
        }
    }

    pub trait PossiblySpanning {
        fn possible_span(&self) -> Option<Span>;
    }

    impl<S: Spanning> PossiblySpanning for S {
        fn possible_span(&self) -> Option<Span> {
            Some(self.span())
        }
    }

    impl<S: Spanning> PossiblySpanning for Option<S> {
        fn possible_span(&self) -> Option<Span> {
            self.as_ref().map(Spanning::span)
        }
    }

    impl<S: Spanning> PossiblySpanning for Vec<S> {
        fn possible_span(&self) -> Option<Span> {
            let first = self.first()?.span();
            Some(first.merge(self.last()))
        }
    }

    impl<S: Spanning> PossiblySpanning for [S] {
        fn possible_span(&self) -> Option<Span> {
            let first = self.first()?.span();
            Some(first.merge(self.last()))
        }
    }
}

/// Something with a source location.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Spanned<Bare> {
    pub bare: Bare,
    pub span: Span,
}

impl<Bare> Spanned<Bare> {
    pub const fn new(span: Span, bare: Bare) -> Self {
        Self { bare, span }
    }

    pub fn map<U>(self, mapper: impl FnOnce(Bare) -> U) -> Spanned<U> {
        Spanned::new(self.span, mapper(self.bare))
    }

    pub fn as_ref(&self) -> Spanned<&Bare> {
        Spanned::new(self.span, &self.bare)
    }
}

impl<Bare: fmt::Debug> fmt::Debug for Spanned<Bare> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {:?}", self.span, self.bare)
    }
}

impl<Bare: fmt::Display> fmt::Display for Spanned<Bare> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.bare.fmt(f)
    }
}

impl<Bare> Spanning for Spanned<Bare> {
    fn span(&self) -> Span {
        self.span
    }
}
