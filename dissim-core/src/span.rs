//! Immutable views into shared assignment arenas.
//!
//! Recursive leader activations repeatedly split their client and channel
//! assignments. A [`Span`] keeps the backing sequence in one shared arena and
//! hands children index ranges into it, so splitting never copies elements.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Contiguous range of a shared, immutable sequence.
pub struct Span<T> {
    items: Arc<[T]>,
    range: Range<usize>,
}

impl<T> Span<T> {
    /// Creates span covering an entire sequence.
    pub fn new(items: impl Into<Arc<[T]>>) -> Self {
        let items = items.into();
        let range = 0..items.len();
        Self { items, range }
    }

    /// Creates empty span.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Returns elements covered by this span.
    pub fn as_slice(&self) -> &[T] {
        &self.items[self.range.clone()]
    }

    /// Returns number of elements in this span.
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Returns true if the span covers no elements.
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Returns a sub-span; `range` is relative to this span.
    ///
    /// # Panics
    ///
    /// Panics if `range` reaches past the end of this span.
    pub fn slice(&self, range: Range<usize>) -> Self {
        assert!(
            range.start <= range.end && range.end <= self.len(),
            "span slice out of bounds"
        );
        Self {
            items: Arc::clone(&self.items),
            range: self.range.start + range.start..self.range.start + range.end,
        }
    }

    /// Splits into `[0, mid)` and `[mid, len)`.
    ///
    /// # Panics
    ///
    /// Panics if `mid > len`.
    pub fn split_at(&self, mid: usize) -> (Self, Self) {
        (self.slice(0..mid), self.slice(mid..self.len()))
    }

    /// Returns span without its first element.
    pub fn tail(&self) -> Self {
        self.slice(self.len().min(1)..self.len())
    }

    /// Returns true if both spans view the same arena.
    pub fn shares_arena(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}

impl<T> Clone for Span<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            range: self.range.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Span<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T> From<Vec<T>> for Span<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn prop_split_at_partitions_span(len in 0usize..200, offset in 0usize..50, mid in 0usize..200) {
            let items: Vec<usize> = (0..len + offset).collect();
            let span = Span::new(items.clone()).slice(offset..len + offset);
            let mid = mid.min(len);

            let (head, rest) = span.split_at(mid);
            prop_assert_eq!(head.len() + rest.len(), span.len());
            let joined: Vec<usize> = head.as_slice().iter().chain(rest.as_slice()).copied().collect();
            prop_assert_eq!(joined.as_slice(), &items[offset..]);
        }
    }

    #[test]
    fn test_slices_share_arena() {
        let span = Span::new(vec![1, 2, 3, 4, 5]);
        let (head, rest) = span.split_at(2);

        assert_eq!(head.as_slice(), &[1, 2]);
        assert_eq!(rest.as_slice(), &[3, 4, 5]);
        assert!(head.shares_arena(&span));
        assert!(rest.shares_arena(&span));
    }

    #[test]
    fn test_nested_slice_is_relative() {
        let span = Span::new(vec![10, 11, 12, 13, 14, 15]);
        let inner = span.slice(2..6).slice(1..3);
        assert_eq!(inner.as_slice(), &[13, 14]);
    }

    #[test]
    fn test_tail_of_empty_span_is_empty() {
        let span: Span<u32> = Span::empty();
        assert!(span.tail().is_empty());

        let single = Span::new(vec![7]);
        assert_eq!(single.as_slice(), &[7]);
        assert!(single.tail().is_empty());
    }

    #[test]
    #[should_panic(expected = "span slice out of bounds")]
    fn test_slice_past_end_panics() {
        let span = Span::new(vec![1, 2]);
        let _ = span.slice(1..3);
    }
}
