//! Ranges: lazy forward sequences and the algorithms that consume them.
//!
//! A range is a cursor that is used up by advancing it. It answers three
//! questions: is it empty, what is at the front, and how do I step past the
//! front. Some ranges also know how many elements remain.
//!
//! Access to the front is split by capability:
//! - [`ReadRange`] hands out the front element by value (or by shared
//!   reference for ranges over borrowed memory).
//! - [`WriteRange`] hands out a mutable slot that algorithms assign or
//!   construct into.
//!
//! # Invariants
//! - Every factory is a thin view or generator; none of them allocate.
//! - Copying a range copies its position; copies traverse independently.
//! - Calling `front`, `front_mut` or `advance` on an empty range is a
//!   precondition violation and panics.
//! - A zip is empty as soon as any constituent is empty, and its size is the
//!   minimum over the constituents that know their size.

mod algorithms;
mod contiguous;
mod iota;
mod range;
mod transform;
mod zip;

pub use algorithms::{count, find, map, move_assign, move_construct};
pub use contiguous::{Contiguous, ContiguousMut, MoveOut, range, range_mut};
pub use iota::{Counter, Iota, iota};
pub use range::{Range, RangeIter, ReadRange, WriteRange, iter};
pub use transform::{Transform, transform};
pub use zip::{RangeTuple, ReadRangeTuple, Zip, zip};

pub fn crate_info() -> &'static str {
    "mu-ranges v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("ranges"));
    }

    #[test]
    fn factories_compose() {
        let names = ["instance", "device", "surface"];
        let lengths = transform(range(&names), |s: &&str| s.len());
        let mut r = crate::zip!(iota(0usize), lengths);

        assert!(r.try_size().is_some());
        assert_eq!(r.size(), 3);
        assert_eq!(r.front(), (0, 8));
        r.advance();
        assert_eq!(r.front(), (1, 6));
    }
}
