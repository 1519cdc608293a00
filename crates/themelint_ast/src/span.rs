//! Byte-offset spans into source text.

use serde::{Deserialize, Serialize};

/// Half-open byte range `[start, end)` in a document.
///
/// Line/column conversion happens only when diagnostics are published.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `offset`.
    #[inline]
    pub const fn at(offset: u32) -> Self {
        Self::new(offset, offset)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if the span is well-formed and ends within `len` bytes.
    #[inline]
    pub const fn fits_within(&self, len: usize) -> bool {
        self.start <= self.end && (self.end as usize) <= len
    }

    /// The text under this span, or `None` if it is out of bounds or splits
    /// a character.
    pub fn slice<'s>(&self, source: &'s str) -> Option<&'s str> {
        source.get(self.start as usize..self.end as usize)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Span::new(0, 5), 5, true)]
    #[case(Span::new(5, 5), 5, true)]
    #[case(Span::new(0, 6), 5, false)]
    #[case(Span::new(4, 2), 5, false)]
    fn test_fits_within(#[case] span: Span, #[case] len: usize, #[case] expected: bool) {
        assert_eq!(span.fits_within(len), expected);
    }

    #[test]
    fn test_slice() {
        let source = "{{ x }}";
        assert_eq!(Span::new(3, 4).slice(source), Some("x"));
        assert_eq!(Span::new(3, 40).slice(source), None);
        assert_eq!(Span::at(7).slice(source), Some(""));
    }

    #[test]
    fn test_slice_inside_a_character() {
        assert_eq!(Span::new(0, 1).slice("é"), None);
    }

    #[test]
    fn test_order_is_by_start_then_end() {
        let mut spans = vec![Span::new(4, 6), Span::new(0, 9), Span::new(4, 5)];
        spans.sort();
        assert_eq!(spans, vec![Span::new(0, 9), Span::new(4, 5), Span::new(4, 6)]);
        assert!(Span::at(3).is_empty());
    }

    #[test]
    fn test_span_deserialization() {
        let span: Span = serde_json::from_str(r#"{"start": 5, "end": 15}"#).unwrap();
        assert_eq!(span, Span::new(5, 15));
    }
}
