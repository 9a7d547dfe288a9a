use std::fmt;

use crate::range::{Range, ReadRange};

/// A range that maps each front element through a function on access.
///
/// The result is not cached; reading the front twice calls the function
/// twice. Size knowledge mirrors the underlying range.
#[derive(Clone, Copy)]
pub struct Transform<R, F> {
    range: R,
    f: F,
}

pub fn transform<R, F, U>(range: R, f: F) -> Transform<R, F>
where
    R: ReadRange,
    F: FnMut(R::Item) -> U,
{
    Transform { range, f }
}

impl<R, F> Transform<R, F> {
    pub fn into_inner(self) -> R {
        self.range
    }
}

impl<R: fmt::Debug, F> fmt::Debug for Transform<R, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

impl<R: Range, F> Range for Transform<R, F> {
    const HAS_SIZE: bool = R::HAS_SIZE;

    #[inline]
    fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    #[inline]
    fn advance(&mut self) {
        self.range.advance()
    }

    #[inline]
    fn try_size(&self) -> Option<usize> {
        self.range.try_size()
    }
}

impl<R, F, U> ReadRange for Transform<R, F>
where
    R: ReadRange,
    F: FnMut(R::Item) -> U,
{
    type Item = U;

    #[inline]
    fn front(&mut self) -> U {
        (self.f)(self.range.front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{iota, range};
    use std::cell::Cell;

    #[test]
    fn maps_each_element() {
        let values = [1, 2, 3];
        let mut r = transform(range(&values), |v: &i32| v * 10);
        let mut out = Vec::new();
        while !r.is_empty() {
            out.push(r.front());
            r.advance();
        }
        assert_eq!(out, vec![10, 20, 30]);
    }

    #[test]
    fn front_is_not_memoized() {
        let calls = Cell::new(0);
        let mut r = transform(iota(0u32), |n| {
            calls.set(calls.get() + 1);
            n * 2
        });
        assert_eq!(r.front(), 0);
        assert_eq!(r.front(), 0);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn size_mirrors_underlying() {
        let values = [0u8; 6];
        let sized = transform(range(&values), |v: &u8| *v);
        assert!(<Transform<crate::Contiguous<'_, u8>, fn(&u8) -> u8> as Range>::HAS_SIZE);
        assert_eq!(sized.size(), 6);

        let unsized_range = transform(iota(0i64), |n| n);
        assert_eq!(unsized_range.try_size(), None);
    }
}
