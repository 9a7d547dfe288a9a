use std::alloc::{self, Layout};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::mem::{self, MaybeUninit};
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use std::slice;

use mu_ranges::{
    Contiguous, ContiguousMut, MoveOut, Range, RangeIter, ReadRange, find, move_construct,
    transform,
};

use crate::into_range::IntoRange;

/// A growable, contiguous sequence that owns its elements.
///
/// `num` elements are live and `max` slots are allocated. Appending past
/// `max` reallocates to at least double the capacity and relocates the
/// live elements by move-construction.
///
/// Moving out with [`mem::take`] leaves the source empty with no buffer.
/// Indexing goes through the slice `Deref` and is bounds-checked.
pub struct Array<T> {
    data: NonNull<T>,
    num: usize,
    max: usize,
    marker: PhantomData<T>,
}

unsafe impl<T: Send> Send for Array<T> {}
unsafe impl<T: Sync> Sync for Array<T> {}

impl<T> Array<T> {
    /// An empty array with no buffer.
    pub const fn new() -> Self {
        Self {
            data: NonNull::dangling(),
            num: 0,
            max: 0,
            marker: PhantomData,
        }
    }

    /// An empty array with room for exactly `max` elements.
    pub fn with_capacity(max: usize) -> Self {
        let mut array = Self::new();
        array.reserve(max);
        array
    }

    /// An array of `num` uninitialized elements.
    ///
    /// # Safety
    /// Every slot in `[0, num)` must be written (see [`Array::as_uninit_slots`])
    /// before the array is read, cloned, or dropped, or `set_num` must shrink
    /// the count to the slots actually written.
    pub unsafe fn make_uninitialized(num: usize) -> Self {
        let mut array = Self::with_capacity(num);
        array.num = num;
        array
    }

    /// Build an array holding every element produced by `range`.
    pub fn from_range<R: ReadRange<Item = T>>(range: R) -> Self {
        let mut array = Self::new();
        array.append(range);
        array
    }

    /// Build an array from `items`, skipping any value already present.
    pub fn from_unique<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: PartialEq,
    {
        let items = items.into_iter();
        let mut array = Self::with_capacity(items.size_hint().0);
        array.add_many_unique(items);
        array
    }

    #[inline]
    pub fn num(&self) -> usize {
        self.num
    }

    #[inline]
    pub fn max(&self) -> usize {
        self.max
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num == 0
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_ptr()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.data.as_ptr(), self.num) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.data.as_ptr(), self.num) }
    }

    /// Append `item` and return its index.
    pub fn add(&mut self, item: T) -> usize {
        self.ensure_space(self.num + 1);
        unsafe { self.push_unchecked(item) }
    }

    /// Append the value produced by `make`, constructed after any growth.
    pub fn emplace<F: FnOnce() -> T>(&mut self, make: F) -> usize {
        self.ensure_space(self.num + 1);
        unsafe { self.push_unchecked(make()) }
    }

    /// Append `item` unless an equal element is already present.
    ///
    /// Returns whether the item was added.
    pub fn add_unique(&mut self, item: T) -> bool
    where
        T: PartialEq,
    {
        if self.contains(&item) {
            return false;
        }
        self.add(item);
        true
    }

    pub fn add_many_unique<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
        T: PartialEq,
    {
        for item in items {
            self.add_unique(item);
        }
    }

    /// Append every element produced by `range`.
    ///
    /// Storage is sized up front when the range knows its length, otherwise
    /// the array grows as elements arrive.
    pub fn append<R: ReadRange<Item = T>>(&mut self, mut range: R) {
        if let Some(n) = range.try_size() {
            self.ensure_space(self.num.saturating_add(n));
        }
        while !range.is_empty() {
            self.add(range.front());
            range.advance();
        }
    }

    /// Append clones of every element of `items`.
    pub fn append_slice(&mut self, items: &[T])
    where
        T: Clone,
    {
        self.append(transform(mu_ranges::range(items), T::clone));
    }

    /// Grow storage to exactly `max` slots if it is currently smaller.
    pub fn reserve(&mut self, max: usize) {
        if max > self.max {
            self.grow(max);
        }
    }

    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        !find(self.range(), |candidate| candidate == item).is_empty()
    }

    /// Read-only range over the live elements.
    pub fn range(&self) -> Contiguous<'_, T> {
        Contiguous::new(self.as_slice())
    }

    /// Writable range over the live elements.
    pub fn range_mut(&mut self) -> ContiguousMut<'_, T> {
        ContiguousMut::new(self.as_mut_slice())
    }

    /// Consume the array into a range that yields its elements by value.
    pub fn into_range(self) -> IntoRange<T> {
        let this = mem::ManuallyDrop::new(self);
        unsafe { IntoRange::from_raw_parts(this.data, this.num, this.max) }
    }

    /// Every allocated slot, `[0, max)`, viewed as raw storage.
    ///
    /// # Safety
    /// Slots in `[0, num)` are live. Overwriting one with `MaybeUninit::write`
    /// leaks the previous value; leaving one uninitialized while it is
    /// counted in `num` is undefined behavior on the next read or drop.
    pub unsafe fn as_uninit_slots(&mut self) -> &mut [MaybeUninit<T>] {
        unsafe { slice::from_raw_parts_mut(self.data.as_ptr().cast(), self.max) }
    }

    /// Slots past the live elements, `[num, max)`.
    pub fn spare_slots(&mut self) -> &mut [MaybeUninit<T>] {
        unsafe {
            slice::from_raw_parts_mut(
                self.data.as_ptr().add(self.num).cast(),
                self.max - self.num,
            )
        }
    }

    /// Set the live element count without touching storage.
    ///
    /// # Safety
    /// `num <= max`, and exactly the slots `[0, num)` must hold values the
    /// array may drop. Shrinking does not drop the elements cut off.
    pub unsafe fn set_num(&mut self, num: usize) {
        debug_assert!(num <= self.max, "set_num past capacity");
        self.num = num;
    }

    /// Write `item` into slot `num`. Capacity must already be there.
    unsafe fn push_unchecked(&mut self, item: T) -> usize {
        debug_assert!(self.num < self.max);
        let index = self.num;
        unsafe { ptr::write(self.data.as_ptr().add(index), item) };
        self.num += 1;
        index
    }

    fn ensure_space(&mut self, num: usize) {
        if num > self.max {
            self.grow(num.max(self.max.saturating_mul(2)));
        }
    }

    fn grow(&mut self, max: usize) {
        debug_assert!(max > self.max);
        tracing::trace!(
            element = std::any::type_name::<T>(),
            from = self.max,
            to = max,
            live = self.num,
            "array grow"
        );

        let data = Self::allocate(max);
        unsafe {
            let from = MoveOut::from_raw_parts(self.data.as_ptr(), self.num);
            let to = ContiguousMut::from_raw_parts(data.as_ptr().cast::<MaybeUninit<T>>(), self.num);
            move_construct(to, from);
            Self::deallocate(self.data, self.max);
        }
        self.data = data;
        self.max = max;
    }

    fn allocate(max: usize) -> NonNull<T> {
        if mem::size_of::<T>() == 0 || max == 0 {
            return NonNull::dangling();
        }
        let layout = array_layout::<T>(max);
        let raw = unsafe { alloc::alloc(layout) }.cast::<T>();
        match NonNull::new(raw) {
            Some(data) => data,
            None => alloc::handle_alloc_error(layout),
        }
    }

    /// # Safety
    /// `data` must have come from `allocate(max)` and hold no live elements.
    pub(crate) unsafe fn deallocate(data: NonNull<T>, max: usize) {
        if mem::size_of::<T>() == 0 || max == 0 {
            return;
        }
        unsafe { alloc::dealloc(data.as_ptr().cast(), array_layout::<T>(max)) };
    }
}

fn array_layout<T>(max: usize) -> Layout {
    match Layout::array::<T>(max) {
        Ok(layout) => layout,
        Err(_) => panic!("array capacity overflow: {max} elements"),
    }
}

impl<T> Drop for Array<T> {
    fn drop(&mut self) {
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.data.as_ptr(), self.num));
            Self::deallocate(self.data, self.max);
        }
    }
}

impl<T> Default for Array<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for Array<T> {
    /// The copy gets exactly `num` slots, whatever the source capacity.
    fn clone(&self) -> Self {
        let mut copy = Self::with_capacity(self.num);
        copy.append_slice(self);
        copy
    }
}

impl<T> Deref for Array<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for Array<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: fmt::Debug> fmt::Debug for Array<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for Array<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: PartialEq> PartialEq<[T]> for Array<T> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq, const N: usize> PartialEq<[T; N]> for Array<T> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.as_slice() == other
    }
}

impl<T: Eq> Eq for Array<T> {}

impl<T: Hash> Hash for Array<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state)
    }
}

impl<T, const N: usize> From<[T; N]> for Array<T> {
    fn from(items: [T; N]) -> Self {
        let mut array = Self::with_capacity(N);
        for item in items {
            unsafe { array.push_unchecked(item) };
        }
        array
    }
}

impl<T: Clone> From<&[T]> for Array<T> {
    fn from(items: &[T]) -> Self {
        let mut array = Self::with_capacity(items.len());
        array.append_slice(items);
        array
    }
}

impl<T> FromIterator<T> for Array<T> {
    fn from_iter<I: IntoIterator<Item = T>>(items: I) -> Self {
        let mut array = Self::new();
        array.extend(items);
        array
    }
}

impl<T> Extend<T> for Array<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        let items = items.into_iter();
        self.ensure_space(self.num.saturating_add(items.size_hint().0));
        for item in items {
            self.add(item);
        }
    }
}

impl<T> IntoIterator for Array<T> {
    type Item = T;
    type IntoIter = RangeIter<IntoRange<T>>;

    fn into_iter(self) -> Self::IntoIter {
        mu_ranges::iter(self.into_range())
    }
}

impl<'a, T> IntoIterator for &'a Array<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Array<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mu_ranges::{WriteRange, iota, map, zip};
    use std::cell::Cell;

    thread_local! {
        static CREATED: Cell<usize> = const { Cell::new(0) };
        static DROPPED: Cell<usize> = const { Cell::new(0) };
    }

    fn reset_counts() {
        CREATED.with(|c| c.set(0));
        DROPPED.with(|c| c.set(0));
    }

    fn created() -> usize {
        CREATED.with(Cell::get)
    }

    fn dropped() -> usize {
        DROPPED.with(Cell::get)
    }

    #[derive(Debug, PartialEq)]
    struct Tracked(u32);

    impl Tracked {
        fn new(value: u32) -> Self {
            CREATED.with(|c| c.set(c.get() + 1));
            Self(value)
        }
    }

    impl Clone for Tracked {
        fn clone(&self) -> Self {
            Self::new(self.0)
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            DROPPED.with(|c| c.set(c.get() + 1));
        }
    }

    #[test]
    fn new_array_has_no_storage() {
        let array: Array<u64> = Array::new();
        assert_eq!(array.num(), 0);
        assert_eq!(array.max(), 0);
        assert!(array.is_empty());
        assert!(array.range().is_empty());
    }

    #[test]
    fn add_keeps_insertion_order_and_returns_index() {
        let mut array = Array::new();
        for i in 0..100u32 {
            assert_eq!(array.add(i * 3), i as usize);
        }
        assert_eq!(array.num(), 100);
        for (i, value) in array.iter().enumerate() {
            assert_eq!(*value, i as u32 * 3);
        }
    }

    #[test]
    fn growth_at_least_doubles() {
        let mut array = Array::new();
        let mut max = array.max();
        let mut reallocations = 0;
        for i in 0..1000 {
            array.add(i);
            if array.max() != max {
                if max > 0 {
                    assert!(array.max() >= max * 2, "{} -> {}", max, array.max());
                }
                max = array.max();
                reallocations += 1;
            }
            assert!(array.num() <= array.max());
        }
        // Doubling from one slot reaches 1024 in eleven steps.
        assert_eq!(reallocations, 11);
    }

    #[test]
    fn reserve_grows_to_exact_size_and_never_shrinks() {
        let mut array: Array<u8> = Array::new();
        array.reserve(17);
        assert_eq!(array.max(), 17);
        array.reserve(3);
        assert_eq!(array.max(), 17);
        assert!(array.is_empty());
    }

    #[test]
    fn growth_relocates_without_extra_drops() {
        reset_counts();
        {
            let mut array = Array::new();
            for i in 0..33 {
                array.add(Tracked::new(i));
            }
            assert_eq!(created(), 33);
            assert_eq!(dropped(), 0);
            assert_eq!(array[32].0, 32);
        }
        assert_eq!(dropped(), 33);
    }

    #[test]
    fn add_unique_is_idempotent() {
        let mut array = Array::new();
        assert!(array.add_unique("VK_KHR_surface"));
        assert!(!array.add_unique("VK_KHR_surface"));
        assert!(array.add_unique("VK_KHR_swapchain"));
        assert_eq!(array, ["VK_KHR_surface", "VK_KHR_swapchain"]);
    }

    #[test]
    fn from_unique_collapses_matching_queue_families() {
        let graphics = 0u32;
        let present = 0u32;
        assert_eq!(Array::from_unique([graphics, present]).num(), 1);
        assert_eq!(Array::from_unique([0u32, 2, 0, 2, 1]), [0, 2, 1]);
    }

    #[test]
    fn emplace_constructs_in_place() {
        let mut array: Array<String> = Array::new();
        let index = array.emplace(|| "main".to_owned());
        assert_eq!(index, 0);
        assert_eq!(array[0], "main");
    }

    #[test]
    fn contains_finds_equal_elements() {
        let array = crate::array![1, 2, 3];
        assert!(array.contains(&2));
        assert!(!array.contains(&4));
        assert!(!Array::<i32>::new().contains(&0));
    }

    #[test]
    fn append_from_ranges_and_slices() {
        let first_four = transform(zip!(iota(0u32), mu_ranges::range(&[(); 4])), |(n, _)| n);
        let mut array: Array<u32> = Array::from_range(first_four);
        assert_eq!(array, [0, 1, 2, 3]);

        array.append_slice(&[10, 11]);
        assert_eq!(array, [0, 1, 2, 3, 10, 11]);

        let pairs = Array::from_range(zip!(iota(0usize), mu_ranges::range(&["a", "b"])));
        assert_eq!(pairs, [(0, &"a"), (1, &"b")]);
    }

    #[test]
    fn take_leaves_source_empty() {
        let mut source = crate::array![1u8, 2, 3];
        let dest = mem::take(&mut source);
        assert_eq!(dest, [1, 2, 3]);
        assert_eq!(source.num(), 0);
        assert_eq!(source.max(), 0);
    }

    #[test]
    fn move_assign_over_occupied_array_drops_old_elements_once() {
        reset_counts();
        let mut source: Array<Tracked> = (0..3).map(Tracked::new).collect();
        let mut dest: Array<Tracked> = (10..14).map(Tracked::new).collect();
        let source_data = source.as_ptr();
        assert_eq!(created(), 7);

        dest = mem::take(&mut source);
        assert_eq!(dropped(), 4);
        assert_eq!(dest.as_ptr(), source_data);
        let values: Vec<u32> = dest.iter().map(|t| t.0).collect();
        assert_eq!(values, [0, 1, 2]);
        assert_eq!(source.num(), 0);
        assert_eq!(source.max(), 0);

        drop(source);
        assert_eq!(dropped(), 4);
        drop(dest);
        assert_eq!(dropped(), 7);
        assert_eq!(created(), 7);
    }

    #[test]
    fn clone_is_independent_and_exactly_sized() {
        let mut original = Array::with_capacity(64);
        original.append_slice(&[1, 2, 3]);
        let mut copy = original.clone();
        assert_eq!(copy.max(), 3);
        copy[0] = 99;
        assert_eq!(original[0], 1);
        assert_eq!(copy, [99, 2, 3]);
    }

    #[test]
    fn clone_then_drop_balances() {
        reset_counts();
        {
            let original: Array<Tracked> = (0..5).map(Tracked::new).collect();
            let _copy = original.clone();
            assert_eq!(created(), 10);
        }
        assert_eq!(dropped(), 10);
    }

    #[test]
    fn uninitialized_fill_drops_exactly_num() {
        reset_counts();
        {
            let mut array = unsafe { Array::<Tracked>::make_uninitialized(4) };
            assert_eq!(array.num(), 4);
            for (i, slot) in unsafe { array.as_uninit_slots() }.iter_mut().enumerate() {
                slot.write(Tracked::new(i as u32));
            }
            assert_eq!(array[3].0, 3);
        }
        assert_eq!(dropped(), 4);
        assert_eq!(created(), 4);
    }

    #[test]
    fn set_num_truncates_a_partial_fill() {
        let mut array = unsafe { Array::<u32>::make_uninitialized(8) };
        let written = 5;
        for (i, slot) in unsafe { array.as_uninit_slots() }[..written].iter_mut().enumerate() {
            slot.write(i as u32);
        }
        unsafe { array.set_num(written) };
        assert_eq!(array, [0, 1, 2, 3, 4]);
        assert_eq!(array.max(), 8);
    }

    #[test]
    fn spare_slots_cover_unused_capacity() {
        let mut array: Array<u16> = Array::with_capacity(6);
        array.add(1);
        assert_eq!(array.spare_slots().len(), 5);
        array.spare_slots()[0].write(2);
        unsafe { array.set_num(2) };
        assert_eq!(array, [1, 2]);
    }

    #[test]
    fn range_mut_supports_in_place_algorithms() {
        let mut array = crate::array![1, 2, 3, 4];
        map(array.range_mut(), |v| v * 2);
        assert_eq!(array, [2, 4, 6, 8]);

        let mut writer = array.range_mut();
        *writer.front_mut() = 0;
        assert_eq!(array[0], 0);
    }

    #[test]
    fn zero_sized_elements_never_allocate() {
        let mut array = Array::new();
        for _ in 0..10 {
            array.add(());
        }
        assert_eq!(array.num(), 10);
        assert!(array.max() >= 10);
        assert_eq!(array.into_iter().count(), 10);
    }

    #[test]
    fn iterator_impls_round_out_the_api() {
        let mut array: Array<i32> = (1..=3).collect();
        array.extend([4, 5]);
        for value in &mut array {
            *value += 1;
        }
        let total: i32 = (&array).into_iter().sum();
        assert_eq!(total, 20);
        let owned: Vec<i32> = array.into_iter().collect();
        assert_eq!(owned, vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn debug_prints_as_list() {
        let array = crate::array!["a", "b"];
        assert_eq!(format!("{array:?}"), r#"["a", "b"]"#);
    }
}
