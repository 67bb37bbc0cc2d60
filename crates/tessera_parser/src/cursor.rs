//! Source cursor.
//!
//! Tracks offset, line and column over the remaining template source. The
//! parser only ever moves forward, except for the single rewind used to
//! re-scan a start tag's attributes after `v-pre`.

use memchr::{memchr_iter, memrchr};
use tessera_ast::{Position, SourceLocation};

/// Forward-only view over the template source
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    source: &'a str,
    offset: usize,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// The unconsumed part of the source.
    #[inline]
    pub fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.offset >= self.source.len()
    }

    #[inline]
    pub fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    /// Byte at `i` relative to the current offset.
    #[inline]
    pub fn peek(&self, i: usize) -> Option<u8> {
        self.source.as_bytes().get(self.offset + i).copied()
    }

    pub fn position(&self) -> Position {
        Position::new(self.offset as u32, self.line, self.column)
    }

    /// Move back to a position obtained from this cursor.
    pub fn reset(&mut self, pos: Position) {
        self.offset = pos.offset as usize;
        self.line = pos.line;
        self.column = pos.column;
    }

    /// Consume `n` bytes.
    pub fn advance_by(&mut self, n: usize) {
        let n = n.min(self.source.len() - self.offset);
        let pos = advance_position(self.position(), self.rest(), n);
        self.reset(pos);
    }

    /// Consume whitespace (`\t \r \n \f` and space).
    pub fn advance_spaces(&mut self) {
        let n = self
            .rest()
            .bytes()
            .take_while(|b| is_whitespace(*b))
            .count();
        if n > 0 {
            self.advance_by(n);
        }
    }

    /// Location spanning `start` to `end` (or the current position).
    pub fn selection(&self, start: Position, end: Option<Position>) -> SourceLocation {
        let end = end.unwrap_or_else(|| self.position());
        SourceLocation::new(
            start,
            end,
            &self.source[start.offset as usize..end.offset as usize],
        )
    }

    /// Source text between two offsets of the whole template.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.source[start..end]
    }
}

/// Position after consuming the first `n` bytes of `text` from `start`.
///
/// `n` is clamped to the text and moved back onto a char boundary.
pub fn advance_position(start: Position, text: &str, n: usize) -> Position {
    let mut n = n.min(text.len());
    while !text.is_char_boundary(n) {
        n -= 1;
    }
    let consumed = &text[..n];
    let bytes = consumed.as_bytes();
    let lines = memchr_iter(b'\n', bytes).count() as u32;
    let column = match memrchr(b'\n', bytes) {
        Some(last) => consumed[last..].chars().count() as u32,
        None => start.column + consumed.chars().count() as u32,
    };
    Position::new(start.offset + n as u32, start.line + lines, column)
}

#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_tracks_lines_and_columns() {
        let mut cursor = Cursor::new("ab\ncd\nef");
        cursor.advance_by(4);
        let pos = cursor.position();
        assert_eq!(pos.offset, 4);
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 2);
        assert_eq!(cursor.rest(), "d\nef");
    }

    #[test]
    fn test_advance_spaces_and_selection() {
        let mut cursor = Cursor::new("  \n foo");
        let start = cursor.position();
        cursor.advance_spaces();
        assert!(cursor.starts_with("foo"));
        let loc = cursor.selection(start, None);
        assert_eq!(loc.source, "  \n ");
        assert_eq!(loc.end.line, 2);
        assert_eq!(loc.end.column, 2);
    }

    #[test]
    fn test_reset() {
        let mut cursor = Cursor::new("<div v-pre>");
        cursor.advance_by(5);
        let saved = cursor.position();
        cursor.advance_by(5);
        cursor.reset(saved);
        assert_eq!(cursor.rest(), "v-pre>");
    }

    #[test]
    fn test_multibyte_columns() {
        let mut cursor = Cursor::new("日本x");
        cursor.advance_by("日本".len());
        assert_eq!(cursor.position().column, 3);
        assert_eq!(cursor.peek(0), Some(b'x'));
    }

    #[test]
    fn test_advance_position_inside_a_char() {
        let start = Position::new(0, 1, 1);
        let pos = advance_position(start, "aé", 2);
        assert_eq!(pos.offset, 1);
        assert_eq!(pos.column, 2);
        assert_eq!(advance_position(start, "ab", 10).offset, 2);
    }
}
