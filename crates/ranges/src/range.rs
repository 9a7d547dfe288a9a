/// A forward range: a cursor over a sequence, consumed by advancing it.
///
/// Ranges are values. Copying one (where the range allows it) copies its
/// position, and the copy traverses independently of the original.
pub trait Range {
    /// Whether [`Range::try_size`] reports the remaining element count.
    const HAS_SIZE: bool = false;

    /// True once there is no front element left.
    fn is_empty(&self) -> bool;

    /// Step past the front element. The range must not be empty.
    fn advance(&mut self);

    /// Remaining element count, when known ahead of traversal.
    fn try_size(&self) -> Option<usize> {
        None
    }

    /// Remaining element count.
    ///
    /// # Panics
    /// Panics on ranges that do not know their size.
    fn size(&self) -> usize {
        match self.try_size() {
            Some(n) => n,
            None => panic!("size() called on a range of unknown length"),
        }
    }
}

/// A range whose front element can be read out.
///
/// `front` is not memoized: every call produces the front element again.
pub trait ReadRange: Range {
    type Item;

    fn front(&mut self) -> Self::Item;
}

/// A range whose front element is a slot that can be written in place.
pub trait WriteRange: Range {
    type Slot;

    fn front_mut(&mut self) -> &mut Self::Slot;
}

// Lending a range to an algorithm leaves the caller holding the remainder.
impl<R: Range> Range for &mut R {
    const HAS_SIZE: bool = R::HAS_SIZE;

    #[inline]
    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    #[inline]
    fn advance(&mut self) {
        (**self).advance()
    }

    #[inline]
    fn try_size(&self) -> Option<usize> {
        (**self).try_size()
    }
}

impl<R: ReadRange> ReadRange for &mut R {
    type Item = R::Item;

    #[inline]
    fn front(&mut self) -> R::Item {
        (**self).front()
    }
}

impl<R: WriteRange> WriteRange for &mut R {
    type Slot = R::Slot;

    #[inline]
    fn front_mut(&mut self) -> &mut R::Slot {
        (**self).front_mut()
    }
}

/// Adapts a [`ReadRange`] to [`Iterator`] so ranges work with `for` loops.
#[derive(Debug, Clone)]
pub struct RangeIter<R> {
    range: R,
}

impl<R> RangeIter<R> {
    pub fn into_inner(self) -> R {
        self.range
    }
}

/// Iterate a range with the standard iterator protocol.
pub fn iter<R: ReadRange>(range: R) -> RangeIter<R> {
    RangeIter { range }
}

impl<R: ReadRange> Iterator for RangeIter<R> {
    type Item = R::Item;

    fn next(&mut self) -> Option<R::Item> {
        if self.range.is_empty() {
            return None;
        }
        let item = self.range.front();
        self.range.advance();
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.range.try_size() {
            Some(n) => (n, Some(n)),
            None => (0, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{iota, range};

    #[test]
    fn borrowed_range_keeps_remainder() {
        let values = [1, 2, 3, 4];
        let mut r = range(&values);
        {
            let lent = &mut r;
            lent.advance();
            lent.advance();
        }
        assert_eq!(r.size(), 2);
        assert_eq!(*r.front(), 3);
    }

    #[test]
    fn iter_adapter_yields_in_order() {
        let values = [10, 20, 30];
        let collected: Vec<i32> = iter(range(&values)).copied().collect();
        assert_eq!(collected, vec![10, 20, 30]);
    }

    #[test]
    fn iter_adapter_size_hint() {
        let values = [1u8; 7];
        assert_eq!(iter(range(&values)).size_hint(), (7, Some(7)));
        assert_eq!(iter(iota(0u32)).size_hint(), (0, None));
    }

    #[test]
    #[should_panic(expected = "unknown length")]
    fn size_of_unsized_range_panics() {
        iota(0u64).size();
    }
}
