use crate::range::{Range, ReadRange};

/// A fixed-size tuple of ranges that can be driven in lockstep.
///
/// Implemented for tuples of two to six ranges. Each method folds one
/// operation over every member.
pub trait RangeTuple {
    /// True if any member knows its size.
    const ANY_SIZED: bool;

    fn any_empty(&self) -> bool;

    fn advance_all(&mut self);

    /// Minimum size over the members that know their size.
    fn min_size(&self) -> Option<usize>;
}

/// A [`RangeTuple`] whose members can all be read.
pub trait ReadRangeTuple: RangeTuple {
    type Items;

    fn fronts(&mut self) -> Self::Items;
}

#[inline]
fn fold_min(acc: Option<usize>, size: Option<usize>) -> Option<usize> {
    match (acc, size) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (None, b) => b,
        (a, None) => a,
    }
}

macro_rules! tuple_impls {
    ($($name:ident . $idx:tt),+) => {
        impl<$($name: Range),+> RangeTuple for ($($name,)+) {
            const ANY_SIZED: bool = false $(|| <$name as Range>::HAS_SIZE)+;

            #[inline]
            fn any_empty(&self) -> bool {
                false $(|| self.$idx.is_empty())+
            }

            #[inline]
            fn advance_all(&mut self) {
                $(self.$idx.advance();)+
            }

            #[inline]
            fn min_size(&self) -> Option<usize> {
                let min = None;
                $(let min = fold_min(min, self.$idx.try_size());)+
                min
            }
        }

        impl<$($name: ReadRange),+> ReadRangeTuple for ($($name,)+) {
            type Items = ($($name::Item,)+);

            #[inline]
            fn fronts(&mut self) -> Self::Items {
                ($(self.$idx.front(),)+)
            }
        }
    };
}

tuple_impls!(A.0, B.1);
tuple_impls!(A.0, B.1, C.2);
tuple_impls!(A.0, B.1, C.2, D.3);
tuple_impls!(A.0, B.1, C.2, D.3, E.4);
tuple_impls!(A.0, B.1, C.2, D.3, E.4, F.5);

/// Several ranges advanced in lockstep, yielding a tuple of their fronts.
///
/// Empty as soon as any member is empty. Sized if any member is sized; the
/// size is then the smallest of the known sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zip<T> {
    ranges: T,
}

impl<T> Zip<T> {
    pub fn new(ranges: T) -> Self {
        Self { ranges }
    }

    pub fn into_inner(self) -> T {
        self.ranges
    }
}

/// Zip a tuple of ranges. See also the [`zip!`](crate::zip!) macro.
pub fn zip<T: RangeTuple>(ranges: T) -> Zip<T> {
    Zip::new(ranges)
}

/// Zip two to six ranges: `zip!(a, b, c)`.
#[macro_export]
macro_rules! zip {
    ($($range:expr),+ $(,)?) => {
        $crate::Zip::new(($($range,)+))
    };
}

impl<T: RangeTuple> Range for Zip<T> {
    const HAS_SIZE: bool = T::ANY_SIZED;

    #[inline]
    fn is_empty(&self) -> bool {
        self.ranges.any_empty()
    }

    #[inline]
    fn advance(&mut self) {
        self.ranges.advance_all()
    }

    #[inline]
    fn try_size(&self) -> Option<usize> {
        self.ranges.min_size()
    }
}

impl<T: ReadRangeTuple> ReadRange for Zip<T> {
    type Item = T::Items;

    #[inline]
    fn front(&mut self) -> T::Items {
        self.ranges.fronts()
    }
}
