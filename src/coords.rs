//! Coordinate structures used to reference specific locations within decoder input
#![allow(clippy::len_without_is_empty)]

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::ops::Sub;

/// A [Coords] represents a single location within the decoder input
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Coords {
    /// The absolute character position, starting at zero
    pub absolute: usize,
    /// The line position, starting at one
    pub line: usize,
    /// The column position, starting at one
    pub column: usize,
}

impl Coords {
    /// Move the coordinates past a single character. A newline bumps the line and resets the
    /// column
    pub fn advance(&mut self, c: char) {
        self.absolute += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

impl Display for Coords {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[line {}, column {}]", self.line, self.column)
    }
}

impl Default for Coords {
    /// The default set of coordinates are positioned at the start of the first line
    fn default() -> Self {
        Coords {
            absolute: 0,
            line: 1,
            column: 1,
        }
    }
}

impl Eq for Coords {}

impl PartialOrd<Self> for Coords {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coords {
    fn cmp(&self, other: &Self) -> Ordering {
        self.absolute.cmp(&other.absolute)
    }
}

impl Sub for Coords {
    type Output = usize;

    /// The number of characters between two sets of coordinates
    fn sub(self, rhs: Self) -> Self::Output {
        self.absolute.abs_diff(rhs.absolute)
    }
}

/// A [Span] represents a linear interval within the input. The start is inclusive and the end
/// exclusive
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Span {
    /// Start [Coords] for the span
    pub start: Coords,
    /// End [Coords] for the span
    pub end: Coords,
}

impl Span {
    /// Get the length of the span in characters
    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "start: {}, end: {}, length: {}",
            self.start,
            self.end,
            self.len()
        )
    }
}
