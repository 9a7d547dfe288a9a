use std::fmt;
use std::ptr::{self, NonNull};

use mu_ranges::{Range, ReadRange};

use crate::Array;

/// An owning range over the elements of a consumed [`Array`].
///
/// `front` moves the current element out, so it may be called once per
/// position. Elements that are skipped with `advance` or never reached are
/// dropped, and the buffer is freed when the range goes away.
pub struct IntoRange<T> {
    data: NonNull<T>,
    next: usize,
    num: usize,
    max: usize,
    taken: bool,
}

unsafe impl<T: Send> Send for IntoRange<T> {}
unsafe impl<T: Sync> Sync for IntoRange<T> {}

impl<T> IntoRange<T> {
    /// # Safety
    /// `data` must be an `Array` buffer of `max` slots whose first `num` are
    /// live; the range takes ownership of both.
    pub(crate) unsafe fn from_raw_parts(data: NonNull<T>, num: usize, max: usize) -> Self {
        Self {
            data,
            next: 0,
            num,
            max,
            taken: false,
        }
    }

    /// Elements not yet moved out.
    pub fn as_slice(&self) -> &[T] {
        let start = self.next + usize::from(self.taken);
        unsafe {
            std::slice::from_raw_parts(self.data.as_ptr().add(start), self.num - start)
        }
    }
}

impl<T> Range for IntoRange<T> {
    const HAS_SIZE: bool = true;

    #[inline]
    fn is_empty(&self) -> bool {
        self.next == self.num
    }

    fn advance(&mut self) {
        assert!(!self.is_empty(), "advance() on an empty range");
        if !self.taken {
            unsafe { ptr::drop_in_place(self.data.as_ptr().add(self.next)) };
        }
        self.next += 1;
        self.taken = false;
    }

    #[inline]
    fn try_size(&self) -> Option<usize> {
        Some(self.num - self.next)
    }
}

impl<T> ReadRange for IntoRange<T> {
    type Item = T;

    fn front(&mut self) -> T {
        assert!(!self.is_empty(), "front() on an empty range");
        assert!(!self.taken, "front() already moved this element out");
        self.taken = true;
        unsafe { ptr::read(self.data.as_ptr().add(self.next)) }
    }
}

impl<T> Drop for IntoRange<T> {
    fn drop(&mut self) {
        let start = self.next + usize::from(self.taken);
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.data.as_ptr().add(start),
                self.num - start,
            ));
            Array::deallocate(self.data, self.max);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for IntoRange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoRange").field(&self.as_slice()).finish()
    }
}
