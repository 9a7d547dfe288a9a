//! Algorithms written purely against the range capabilities.

use std::mem::MaybeUninit;

use crate::range::{Range, ReadRange, WriteRange};

/// Move-assign source elements into destination slots, in lockstep, until
/// either range runs out.
///
/// Each destination slot must hold a live value; assignment drops it.
/// Returns the unwritten remainder of `dest` so writes can be chained. Pass
/// `&mut source` to keep the unread remainder of the source.
pub fn move_assign<D, S>(mut dest: D, mut source: S) -> D
where
    D: WriteRange,
    S: ReadRange<Item = D::Slot>,
{
    while !dest.is_empty() && !source.is_empty() {
        *dest.front_mut() = source.front();
        dest.advance();
        source.advance();
    }
    dest
}

/// Move-construct source elements into uninitialized destination slots.
///
/// Same traversal as [`move_assign`], but nothing in the destination is
/// dropped: the slots are assumed to be raw storage. Returns the unwritten
/// remainder of `dest`.
pub fn move_construct<D, S, T>(mut dest: D, mut source: S) -> D
where
    D: WriteRange<Slot = MaybeUninit<T>>,
    S: ReadRange<Item = T>,
{
    while !dest.is_empty() && !source.is_empty() {
        dest.front_mut().write(source.front());
        dest.advance();
        source.advance();
    }
    dest
}

/// Replace every element of `range` with `f(element)`, in place.
pub fn map<R, F>(mut range: R, mut f: F)
where
    R: WriteRange,
    F: FnMut(&R::Slot) -> R::Slot,
{
    while !range.is_empty() {
        let slot = range.front_mut();
        let next = f(slot);
        *slot = next;
        range.advance();
    }
}

/// Advance `range` to the first element matching `pred`.
///
/// The result is empty when nothing matches; test it with `is_empty`.
pub fn find<R, P>(mut range: R, mut pred: P) -> R
where
    R: ReadRange,
    P: FnMut(R::Item) -> bool,
{
    while !range.is_empty() {
        if pred(range.front()) {
            break;
        }
        range.advance();
    }
    range
}

/// Number of elements left in `range`, found by walking it.
///
/// Never returns for unbounded ranges.
pub fn count<R: Range>(mut range: R) -> usize {
    if let Some(n) = range.try_size() {
        return n;
    }
    let mut n = 0;
    while !range.is_empty() {
        range.advance();
        n += 1;
    }
    n
}
