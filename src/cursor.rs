//! Immutable view over source text carrying position, line, and column.

use std::rc::Rc;

/// A position in source text. Cloning a cursor is cheap: the underlying text
/// is reference-counted and shared by every cursor derived from it.
///
/// Cursors are values: every advance operation returns a new `Cursor`
/// rather than mutating in place.
#[derive(Debug, Clone)]
pub struct Cursor {
    text: Rc<str>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Cursor {
    /// Creates a cursor at the start of `text`: position 0, line 1, column 0.
    pub fn new(text: impl Into<Rc<str>>) -> Self {
        Self {
            text: text.into(),
            pos: 0,
            line: 1,
            col: 0,
        }
    }

    /// Byte offset of this cursor within the original text.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// 1-based line number.
    pub fn line(&self) -> usize {
        self.line
    }

    /// 0-based column number.
    pub fn col(&self) -> usize {
        self.col
    }

    /// The remaining, unconsumed slice of source text.
    pub fn remaining(&self) -> &str {
        &self.text[self.pos..]
    }

    /// Whether no input remains.
    pub fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    /// Advances one character, returning a fresh cursor. A newline resets
    /// the column to 0 and increments the line; any other character just
    /// advances the column.
    pub fn advance_char(&self) -> Cursor {
        let mut chars = self.remaining().chars();
        let Some(ch) = chars.next() else {
            return self.clone();
        };
        let mut next = self.clone();
        next.pos += ch.len_utf8();
        if ch == '\n' {
            next.line += 1;
            next.col = 0;
        } else {
            next.col += 1;
        }
        next
    }

    /// Advances by `n` bytes of matched text, character by character, so
    /// line/column tracking stays correct across embedded newlines.
    pub fn advance_by(&self, matched: &str) -> Cursor {
        let mut cur = self.clone();
        for ch in matched.chars() {
            let mut next = cur.clone();
            next.pos += ch.len_utf8();
            if ch == '\n' {
                next.line += 1;
                next.col = 0;
            } else {
                next.col += 1;
            }
            cur = next;
        }
        cur
    }
}

impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos && self.line == other.line && self.col == other.col
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_origin() {
        let c = Cursor::new("hello");
        assert_eq!(c.pos(), 0);
        assert_eq!(c.line(), 1);
        assert_eq!(c.col(), 0);
        assert_eq!(c.remaining(), "hello");
    }

    #[test]
    fn advance_tracks_newlines() {
        let c = Cursor::new("ab\ncd");
        let c = c.advance_by("ab\nc");
        assert_eq!(c.pos(), 4);
        assert_eq!(c.line(), 2);
        assert_eq!(c.col(), 1);
        assert_eq!(c.remaining(), "d");
    }

    #[test]
    fn at_end_on_empty_remainder() {
        let c = Cursor::new("x").advance_char();
        assert!(c.at_end());
    }
}
