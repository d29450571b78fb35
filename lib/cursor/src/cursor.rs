use std::fmt::{self, Formatter};

use derive_more::Display;

/// 1-based source line.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Line(pub usize);

impl Default for Line {
    fn default() -> Self {
        Line(1)
    }
}

/// Walks over source text one `char` at a time, keeping track of the current line.
///
/// Offsets handed out by [`Cursor::offset`] are byte offsets into the source, so they can be
/// used to slice out lexemes with [`Cursor::slice_from`].
#[derive(Clone)]
pub struct Cursor<'a> {
    source: &'a str,
    offset: usize,
    line: Line,
}

impl<'a> fmt::Debug for Cursor<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // The whole source is usually too verbose, so only print it in alternate mode
        let alternate = f.alternate();
        let mut s = f.debug_struct("Cursor");
        s.field("line", &self.line).field("offset", &self.offset);
        if alternate {
            s.field("source", &self.source);
        }
        s.finish()
    }
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, offset: 0, line: Line::default() }
    }

    pub fn line(&self) -> Line {
        self.line
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_at_end(&self) -> bool {
        self.offset >= self.source.len()
    }

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn peek_next(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    /// Consumes the next char if it equals `expected`.
    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.next();
            true
        } else {
            false
        }
    }

    /// Consumes chars as long as `pred` holds. Returns the number of consumed chars.
    pub fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let mut count = 0;
        while self.peek().is_some_and(&pred) {
            self.next();
            count += 1;
        }
        count
    }

    /// Source text between `start` (a previous [`Cursor::offset`]) and the current position.
    pub fn slice_from(&self, start: usize) -> &'a str {
        &self.source[start..self.offset]
    }
}

impl<'a> From<&'a str> for Cursor<'a> {
    fn from(source: &'a str) -> Self {
        Self::new(source)
    }
}

impl<'a> Iterator for Cursor<'a> {
    type Item = char;

    fn next(&mut self) -> Option<Self::Item> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line.0 += 1;
        }
        Some(c)
    }
}
