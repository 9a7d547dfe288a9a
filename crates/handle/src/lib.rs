//! Handle: exclusive ownership of native resource handles.
//!
//! A native handle is a plain value (a pointer or an integer id) that names
//! a resource living elsewhere. [`OwnedHandle`] pairs such a value with a
//! [`Deleter`] and the context the deleter needs, and destroys the resource
//! exactly once. [`ChildHandle`] adds a parent handle to that context and
//! refuses creation while the parent is null.
//!
//! # Invariants
//! - A handle is owning iff it is armed and non-null. Only owning handles
//!   are ever passed to their deleter.
//! - Every owning handle is deleted exactly once: on drop, on `reset`, or
//!   when `replace` makes room for a new one. `release` hands the duty to
//!   the caller instead.
//! - Moving transfers ownership; handles are never cloned.

mod child;
mod error;
mod native;
mod owned;

pub use child::ChildHandle;
pub use error::HandleError;
pub use native::NativeHandle;
pub use owned::{Deleter, OwnedHandle};

pub fn crate_info() -> &'static str {
    "mu-handle v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("handle"));
    }
}
