use crate::range::{Range, ReadRange};

/// An integer type a counting range can step through.
pub trait Counter: Copy {
    /// The next value. Stepping past the type's maximum is a precondition
    /// violation.
    fn successor(self) -> Self;
}

macro_rules! impl_counter {
    ($($t:ty),* $(,)?) => {
        $(
            impl Counter for $t {
                #[inline]
                fn successor(self) -> Self {
                    self + 1
                }
            }
        )*
    };
}

impl_counter!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

/// An unbounded ascending count. Never empty, size unknown.
///
/// The counter is owned by the range and only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Iota<T> {
    next: T,
}

/// Count upwards from `start`.
pub fn iota<T: Counter>(start: T) -> Iota<T> {
    Iota { next: start }
}

impl<T: Counter + Default> Default for Iota<T> {
    fn default() -> Self {
        iota(T::default())
    }
}

impl<T: Counter> Range for Iota<T> {
    #[inline]
    fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    fn advance(&mut self) {
        self.next = self.next.successor();
    }
}

impl<T: Counter> ReadRange for Iota<T> {
    type Item = T;

    #[inline]
    fn front(&mut self) -> T {
        self.next
    }
}
