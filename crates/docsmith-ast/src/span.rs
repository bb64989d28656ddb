//! Byte ranges into the source text

use serde::{Deserialize, Serialize};

/// Half-open byte range `start..end`. Offsets are relative to the text that
/// was tokenized, after any byte order mark was removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span, used to point between tokens
    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn shift(self, offset: usize) -> Self {
        Self::new(self.start + offset, self.end + offset)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_slices_source() {
        let source = "def f(): pass";
        assert_eq!(Span::new(4, 5).text(source), "f");
        assert_eq!(Span::new(4, 5).len(), 1);
        assert!(Span::empty(3).is_empty());
    }

    #[test]
    fn test_shift_keeps_width() {
        assert_eq!(Span::new(2, 6).shift(3), Span::new(5, 9));
    }
}
