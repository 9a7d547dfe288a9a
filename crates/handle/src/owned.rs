use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::Deref;

use crate::native::NativeHandle;

/// Destroys handles of type `H` given the fixed context `C`.
///
/// Implemented on zero-sized marker types; the context carries whatever the
/// native destroy call needs besides the handle itself.
pub trait Deleter<H, C> {
    fn delete(handle: H, context: &C);
}

/// Exclusive owner of a native handle.
///
/// The handle is deleted with `D::delete(handle, &context)` when the owner
/// is dropped, reset, or replaced, as long as it is armed and non-null.
pub struct OwnedHandle<H, D, C = ()>
where
    H: NativeHandle,
    D: Deleter<H, C>,
{
    handle: H,
    context: C,
    armed: bool,
    deleter: PhantomData<fn() -> D>,
}

impl<H, D, C> OwnedHandle<H, D, C>
where
    H: NativeHandle,
    D: Deleter<H, C>,
{
    /// A null handle with a default context.
    pub fn empty() -> Self
    where
        C: Default,
    {
        Self::with_context(C::default())
    }

    /// A null handle that will be deleted with `context` once filled.
    pub fn with_context(context: C) -> Self {
        Self {
            handle: H::null(),
            context,
            armed: false,
            deleter: PhantomData,
        }
    }

    /// Take ownership of `handle`. A null handle is not owned.
    pub fn new(handle: H, context: C) -> Self {
        Self {
            handle,
            context,
            armed: !handle.is_null(),
            deleter: PhantomData,
        }
    }

    /// Delete any owned handle and expose the storage for a creation call.
    ///
    /// The slot is armed: whatever non-null value gets written is owned.
    /// Writing nothing (or null) leaves the owner empty.
    pub fn replace(&mut self) -> &mut H {
        self.reset();
        self.armed = true;
        &mut self.handle
    }

    /// Fill the handle through `create`, which writes the slot and reports
    /// success.
    ///
    /// On error the slot is cleared without deleting, since a failed
    /// creation must not leave a resource behind.
    pub fn create_with<E, F>(&mut self, create: F) -> Result<(), E>
    where
        F: FnOnce(&mut H) -> Result<(), E>,
    {
        let slot = self.replace();
        match create(slot) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.handle = H::null();
                self.armed = false;
                Err(err)
            }
        }
    }

    /// Delete the handle now, if owned, and leave the owner empty.
    pub fn reset(&mut self) {
        if self.is_owning() {
            tracing::trace!(
                handle = ?self.handle,
                kind = type_name::<H>(),
                deleter = type_name::<D>(),
                "deleting handle"
            );
            D::delete(self.handle, &self.context);
        }
        self.handle = H::null();
        self.armed = false;
    }

    /// Give up ownership without deleting. The caller now owns the handle.
    #[must_use = "the released handle must be destroyed by the caller"]
    pub fn release(&mut self) -> H {
        self.armed = false;
        mem::replace(&mut self.handle, H::null())
    }

    /// Move ownership into a new owner sharing this context.
    ///
    /// `self` is left empty and its drop becomes a no-op.
    pub fn take(&mut self) -> Self
    where
        C: Clone,
    {
        let armed = self.armed;
        let handle = self.release();
        Self {
            handle,
            context: self.context.clone(),
            armed,
            deleter: PhantomData,
        }
    }

    #[inline]
    pub fn raw(&self) -> H {
        self.handle
    }

    #[inline]
    pub fn context(&self) -> &C {
        &self.context
    }

    #[inline]
    pub fn is_owning(&self) -> bool {
        self.armed && !self.handle.is_null()
    }
}

impl<H, D, C> Deref for OwnedHandle<H, D, C>
where
    H: NativeHandle,
    D: Deleter<H, C>,
{
    type Target = H;

    fn deref(&self) -> &H {
        &self.handle
    }
}

impl<H, D, C> Default for OwnedHandle<H, D, C>
where
    H: NativeHandle,
    D: Deleter<H, C>,
    C: Default,
{
    fn default() -> Self {
        Self::empty()
    }
}

impl<H, D, C> Drop for OwnedHandle<H, D, C>
where
    H: NativeHandle,
    D: Deleter<H, C>,
{
    fn drop(&mut self) {
        self.reset();
    }
}

impl<H, D, C> fmt::Debug for OwnedHandle<H, D, C>
where
    H: NativeHandle,
    D: Deleter<H, C>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedHandle")
            .field("handle", &self.handle)
            .field("owning", &self.is_owning())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;

    thread_local! {
        static DELETED: RefCell<Vec<(u64, &'static str)>> = const { RefCell::new(Vec::new()) };
    }

    pub(crate) fn deleted() -> Vec<(u64, &'static str)> {
        DELETED.with(|d| d.borrow().clone())
    }

    pub(crate) fn clear_deleted() {
        DELETED.with(|d| d.borrow_mut().clear());
    }

    pub(crate) fn record_delete(handle: u64, tag: &'static str) {
        DELETED.with(|d| d.borrow_mut().push((handle, tag)));
    }

    /// Records every delete with the context tag it was given.
    pub(crate) struct Recorder;

    impl Deleter<u64, &'static str> for Recorder {
        fn delete(handle: u64, context: &&'static str) {
            record_delete(handle, *context);
        }
    }

    impl Deleter<u64, ()> for Recorder {
        fn delete(handle: u64, _: &()) {
            record_delete(handle, "");
        }
    }

    type Owned = OwnedHandle<u64, Recorder, &'static str>;

    #[test]
    fn replace_then_drop_deletes_once_with_context() {
        clear_deleted();
        {
            let mut h = Owned::with_context("device");
            assert!(!h.is_owning());
            *h.replace() = 42;
            assert!(h.is_owning());
            assert_eq!(*h, 42);
        }
        assert_eq!(deleted(), vec![(42, "device")]);
    }

    #[test]
    fn empty_handle_never_deletes() {
        clear_deleted();
        drop(OwnedHandle::<u64, Recorder>::empty());
        drop(OwnedHandle::<u64, Recorder>::default());
        assert!(deleted().is_empty());
    }

    #[test]
    fn release_prevents_deletion() {
        clear_deleted();
        let raw = {
            let mut h = Owned::new(9, "instance");
            h.release()
        };
        assert_eq!(raw, 9);
        assert!(deleted().is_empty());
    }

    #[test]
    fn moved_handle_deletes_once() {
        clear_deleted();
        let h = Owned::new(5, "swapchain");
        let moved = h;
        drop(moved);
        assert_eq!(deleted(), vec![(5, "swapchain")]);
    }

    #[test]
    fn take_disarms_the_source() {
        clear_deleted();
        let mut source = Owned::new(11, "view");
        let dest = source.take();
        assert!(!source.is_owning());
        assert_eq!(source.raw(), 0);
        assert!(dest.is_owning());
        drop(source);
        assert!(deleted().is_empty());
        drop(dest);
        assert_eq!(deleted(), vec![(11, "view")]);
    }

    #[test]
    fn replace_deletes_the_previous_handle_first() {
        clear_deleted();
        let mut h = Owned::new(1, "pipeline");
        *h.replace() = 2;
        assert_eq!(deleted(), vec![(1, "pipeline")]);
        drop(h);
        assert_eq!(deleted(), vec![(1, "pipeline"), (2, "pipeline")]);
    }

    #[test]
    fn null_after_replace_is_not_owned() {
        clear_deleted();
        {
            let mut h = Owned::with_context("surface");
            let _slot = h.replace();
            assert!(!h.is_owning());
        }
        assert!(deleted().is_empty());
    }

    #[test]
    fn reset_twice_is_safe() {
        clear_deleted();
        let mut h = Owned::new(3, "layout");
        h.reset();
        h.reset();
        drop(h);
        assert_eq!(deleted(), vec![(3, "layout")]);
    }

    #[test]
    fn failed_creation_leaves_nothing_to_delete() {
        clear_deleted();
        let mut h = Owned::with_context("module");
        let result: Result<(), &str> = h.create_with(|slot| {
            *slot = 77;
            Err("out of memory")
        });
        assert_eq!(result, Err("out of memory"));
        assert!(!h.is_owning());
        assert_eq!(h.raw(), 0);
        drop(h);
        assert!(deleted().is_empty());
    }

    #[test]
    fn successful_creation_is_owned() {
        clear_deleted();
        let mut h = Owned::with_context("render pass");
        h.create_with(|slot| {
            *slot = 8;
            Ok::<(), ()>(())
        })
        .unwrap();
        assert!(h.is_owning());
        drop(h);
        assert_eq!(deleted(), vec![(8, "render pass")]);
    }

    #[test]
    fn debug_shows_handle_and_ownership() {
        let h = Owned::new(4, "x");
        let text = format!("{h:?}");
        assert!(text.contains("handle: 4"));
        assert!(text.contains("owning: true"));
    }
}
