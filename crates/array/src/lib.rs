//! Array: a growable, contiguous, element-owning sequence.
//!
//! Storage is a single heap buffer managed by hand so that allocation is
//! separated from element construction. The default API keeps every slot
//! in `[0, num)` constructed; the raw-slot API (`make_uninitialized`,
//! `as_uninit_slots`, `set_num`) exists for filling storage from a native
//! call that writes raw memory.
//!
//! # Invariants
//! - `num <= max`; slots `[0, num)` are live, slots `[num, max)` are raw.
//! - Capacity never shrinks. Growth at least doubles, or jumps straight to
//!   the requested size when that is larger.
//! - Growth relocates elements by move-construction; old slots are never
//!   dropped individually, only the old buffer is freed.
//! - Allocation failure aborts through `handle_alloc_error`.

mod array;
mod into_range;
mod serde_impls;

pub use array::Array;
pub use into_range::IntoRange;

/// Build an [`Array`] from a list of values with exactly enough capacity.
#[macro_export]
macro_rules! array {
    () => {
        $crate::Array::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Array::from([$($value),+])
    };
}

pub fn crate_info() -> &'static str {
    "mu-array v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("array"));
    }

    #[test]
    fn array_macro_sizes_exactly() {
        let layers: Array<&str> = crate::array!["VK_LAYER_LUNARG_standard_validation"];
        assert_eq!(layers.num(), 1);
        assert_eq!(layers.max(), 1);

        let empty: Array<u32> = crate::array![];
        assert!(empty.is_empty());
        assert_eq!(empty.max(), 0);
    }
}
