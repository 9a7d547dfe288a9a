use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};
use std::slice;

use crate::range::{Range, ReadRange, WriteRange};

/// A range over borrowed contiguous memory, yielding shared references.
///
/// Two contiguous ranges compare equal when they cover the same bounds.
pub struct Contiguous<'a, T> {
    /// Pointer to the front element.
    ptr: NonNull<T>,
    /// Elements remaining from `ptr`.
    len: usize,
    marker: PhantomData<&'a T>,
}

unsafe impl<T: Sync> Send for Contiguous<'_, T> {}
unsafe impl<T: Sync> Sync for Contiguous<'_, T> {}

/// View a slice (or array, `Vec`, `Array`) as a range.
pub fn range<T>(items: &[T]) -> Contiguous<'_, T> {
    Contiguous::new(items)
}

/// View a mutable slice as a range of writable slots.
pub fn range_mut<T>(items: &mut [T]) -> ContiguousMut<'_, T> {
    ContiguousMut::new(items)
}

impl<'a, T> Contiguous<'a, T> {
    pub fn new(items: &'a [T]) -> Self {
        Self {
            ptr: NonNull::from(items).cast(),
            len: items.len(),
            marker: PhantomData,
        }
    }

    /// Range over `count` elements starting at `ptr`.
    ///
    /// # Safety
    /// `ptr` must be non-null, aligned and valid for reads of `count`
    /// initialized elements for `'a`.
    pub unsafe fn from_raw_parts(ptr: *const T, count: usize) -> Self {
        Self::new(unsafe { slice::from_raw_parts(ptr, count) })
    }

    /// Range over the half-open interval `[start, end)`.
    ///
    /// # Safety
    /// Same as [`Contiguous::from_raw_parts`]; `end` must not precede
    /// `start` and both must point into the same allocation.
    pub unsafe fn from_bounds(start: *const T, end: *const T) -> Self {
        let count = if mem::size_of::<T>() == 0 {
            0
        } else {
            debug_assert!(end >= start, "range bounds are reversed");
            unsafe { end.offset_from(start) as usize }
        };
        unsafe { Self::from_raw_parts(start, count) }
    }

    /// The elements not yet traversed.
    pub fn as_slice(&self) -> &'a [T] {
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T> Clone for Contiguous<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Contiguous<'_, T> {}

impl<T> PartialEq for Contiguous<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr && self.len == other.len
    }
}

impl<T> Eq for Contiguous<'_, T> {}

impl<T> fmt::Debug for Contiguous<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contiguous")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

impl<'a, T> From<&'a [T]> for Contiguous<'a, T> {
    fn from(items: &'a [T]) -> Self {
        Self::new(items)
    }
}

impl<T> Range for Contiguous<'_, T> {
    const HAS_SIZE: bool = true;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn advance(&mut self) {
        assert!(self.len > 0, "advance() on an empty range");
        self.ptr = unsafe { self.ptr.add(1) };
        self.len -= 1;
    }

    #[inline]
    fn try_size(&self) -> Option<usize> {
        Some(self.len)
    }
}

impl<'a, T> ReadRange for Contiguous<'a, T> {
    type Item = &'a T;

    #[inline]
    fn front(&mut self) -> &'a T {
        assert!(self.len > 0, "front() on an empty range");
        unsafe { self.ptr.as_ref() }
    }
}

/// A range over borrowed contiguous memory whose front is a writable slot.
pub struct ContiguousMut<'a, T> {
    ptr: NonNull<T>,
    len: usize,
    marker: PhantomData<&'a mut T>,
}

unsafe impl<T: Send> Send for ContiguousMut<'_, T> {}
unsafe impl<T: Sync> Sync for ContiguousMut<'_, T> {}

impl<'a, T> ContiguousMut<'a, T> {
    pub fn new(items: &'a mut [T]) -> Self {
        Self {
            len: items.len(),
            ptr: NonNull::from(items).cast(),
            marker: PhantomData,
        }
    }

    /// # Safety
    /// `ptr` must be non-null, aligned and valid for reads and writes of
    /// `count` elements for `'a`, with no other access during `'a`.
    pub unsafe fn from_raw_parts(ptr: *mut T, count: usize) -> Self {
        Self::new(unsafe { slice::from_raw_parts_mut(ptr, count) })
    }

    /// The slots not yet traversed.
    pub fn into_slice(self) -> &'a mut [T] {
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T> PartialEq for ContiguousMut<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr && self.len == other.len
    }
}

impl<T> fmt::Debug for ContiguousMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContiguousMut")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

impl<T> Range for ContiguousMut<'_, T> {
    const HAS_SIZE: bool = true;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn advance(&mut self) {
        assert!(self.len > 0, "advance() on an empty range");
        self.ptr = unsafe { self.ptr.add(1) };
        self.len -= 1;
    }

    #[inline]
    fn try_size(&self) -> Option<usize> {
        Some(self.len)
    }
}

impl<T> WriteRange for ContiguousMut<'_, T> {
    type Slot = T;

    #[inline]
    fn front_mut(&mut self) -> &mut T {
        assert!(self.len > 0, "front_mut() on an empty range");
        unsafe { self.ptr.as_mut() }
    }
}

/// A range that moves elements out of memory it does not own.
///
/// Each `front` performs a bitwise read; afterwards the slot is logically
/// uninitialized. Used to relocate elements between buffers.
pub struct MoveOut<'a, T> {
    ptr: NonNull<T>,
    len: usize,
    marker: PhantomData<&'a mut T>,
}

impl<T> MoveOut<'_, T> {
    /// # Safety
    /// `ptr` must be valid for reads of `count` initialized elements. The
    /// caller gives up those elements: `front` must be called at most once
    /// per position, and elements that were read must not be dropped in
    /// place afterwards.
    pub unsafe fn from_raw_parts(ptr: *mut T, count: usize) -> Self {
        Self {
            ptr: unsafe { NonNull::new_unchecked(ptr) },
            len: count,
            marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for MoveOut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MoveOut")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

impl<T> Range for MoveOut<'_, T> {
    const HAS_SIZE: bool = true;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn advance(&mut self) {
        assert!(self.len > 0, "advance() on an empty range");
        self.ptr = unsafe { self.ptr.add(1) };
        self.len -= 1;
    }

    #[inline]
    fn try_size(&self) -> Option<usize> {
        Some(self.len)
    }
}

impl<T> ReadRange for MoveOut<'_, T> {
    type Item = T;

    #[inline]
    fn front(&mut self) -> T {
        assert!(self.len > 0, "front() on an empty range");
        unsafe { ptr::read(self.ptr.as_ptr()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_matches_source() {
        const SIZE: usize = 100;
        let items = [0i32; SIZE];

        let r = range(&items);
        assert!(<Contiguous<'_, i32> as Range>::HAS_SIZE);
        assert_eq!(r.size(), SIZE);

        let r = unsafe { Contiguous::from_raw_parts(items.as_ptr(), SIZE) };
        assert_eq!(r.size(), SIZE);

        let r = unsafe { Contiguous::from_bounds(items.as_ptr(), items.as_ptr().add(SIZE)) };
        assert_eq!(r.size(), SIZE);
    }

    #[test]
    fn n_advances_empty_the_range() {
        let items = [7u16; 13];
        let mut r = range(&items);
        for _ in 0..13 {
            assert!(!r.is_empty());
            r.advance();
        }
        assert!(r.is_empty());
        assert_eq!(r.size(), 0);
    }

    #[test]
    fn equality_is_by_bounds() {
        let items = [1, 2, 3];
        let a = range(&items);
        let mut b = range(&items);
        assert_eq!(a, b);
        b.advance();
        assert_ne!(a, b);
        assert_eq!(range(&items[1..]), b);
    }

    #[test]
    fn copies_traverse_independently() {
        let items = [1, 2, 3];
        let mut a = range(&items);
        let b = a;
        a.advance();
        assert_eq!(a.size(), 2);
        assert_eq!(b.size(), 3);
        assert_eq!(b.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn empty_slice_is_empty_range() {
        let items: [u64; 0] = [];
        assert!(range(&items).is_empty());
        let mut slots: [u64; 0] = [];
        assert!(range_mut(&mut slots).is_empty());
    }

    #[test]
    fn zero_sized_elements() {
        let items = [(), (), ()];
        let mut r = range(&items);
        assert_eq!(r.size(), 3);
        r.advance();
        assert_eq!(r.size(), 2);
    }

    #[test]
    fn mutable_slots_write_through() {
        let mut items = [1, 2, 3];
        let mut r = range_mut(&mut items);
        *r.front_mut() = 10;
        r.advance();
        *r.front_mut() += 5;
        assert_eq!(r.into_slice(), &mut [7, 3]);
        assert_eq!(items, [10, 7, 3]);
    }

    #[test]
    #[should_panic(expected = "front() on an empty range")]
    fn front_on_empty_panics() {
        let items: [u8; 0] = [];
        range(&items).front();
    }

    #[test]
    fn move_out_reads_each_element_once() {
        let mut items = std::mem::ManuallyDrop::new(vec![String::from("a"), String::from("b")]);
        let mut r = unsafe { MoveOut::from_raw_parts(items.as_mut_ptr(), items.len()) };
        let first = r.front();
        r.advance();
        let second = r.front();
        r.advance();
        assert!(r.is_empty());
        assert_eq!((first.as_str(), second.as_str()), ("a", "b"));
        unsafe {
            items.set_len(0);
            std::mem::ManuallyDrop::drop(&mut items);
        }
    }
}
