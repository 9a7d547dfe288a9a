use std::any::type_name;
use std::fmt;
use std::ops::Deref;

use crate::error::HandleError;
use crate::native::NativeHandle;
use crate::owned::{Deleter, OwnedHandle};

/// An owned handle created from, and destroyed through, a parent handle.
///
/// The deleter receives `(parent, context)`. Creation is refused while the
/// parent is null, so a child can never outlive a parent it never had.
pub struct ChildHandle<H, D, P, C = ()>
where
    H: NativeHandle,
    P: NativeHandle,
    D: Deleter<H, (P, C)>,
{
    inner: OwnedHandle<H, D, (P, C)>,
}

impl<H, D, P, C> ChildHandle<H, D, P, C>
where
    H: NativeHandle,
    P: NativeHandle,
    D: Deleter<H, (P, C)>,
{
    /// An empty child of `parent`.
    pub fn new(parent: P, context: C) -> Self {
        Self {
            inner: OwnedHandle::with_context((parent, context)),
        }
    }

    /// Take ownership of an existing child of `parent`.
    pub fn from_raw(handle: H, parent: P, context: C) -> Self {
        Self {
            inner: OwnedHandle::new(handle, (parent, context)),
        }
    }

    /// Like [`OwnedHandle::replace`], but fails while the parent is null.
    pub fn try_replace(&mut self) -> Result<&mut H, HandleError> {
        self.check_parent()?;
        Ok(self.inner.replace())
    }

    /// Like [`ChildHandle::try_replace`].
    ///
    /// # Panics
    /// Panics if the parent is null.
    pub fn replace(&mut self) -> &mut H {
        match self.try_replace() {
            Ok(slot) => slot,
            Err(err) => panic!("{err}"),
        }
    }

    /// Like [`OwnedHandle::create_with`], but fails while the parent is null.
    pub fn try_create_with<E, F>(&mut self, create: F) -> Result<(), E>
    where
        F: FnOnce(&mut H) -> Result<(), E>,
        E: From<HandleError>,
    {
        self.check_parent()?;
        self.inner.create_with(create)
    }

    pub fn reset(&mut self) {
        self.inner.reset()
    }

    #[must_use = "the released handle must be destroyed by the caller"]
    pub fn release(&mut self) -> H {
        self.inner.release()
    }

    #[inline]
    pub fn raw(&self) -> H {
        self.inner.raw()
    }

    #[inline]
    pub fn parent(&self) -> P {
        self.inner.context().0
    }

    #[inline]
    pub fn context(&self) -> &C {
        &self.inner.context().1
    }

    #[inline]
    pub fn is_owning(&self) -> bool {
        self.inner.is_owning()
    }

    fn check_parent(&self) -> Result<(), HandleError> {
        if self.parent().is_null() {
            return Err(HandleError::MissingParent {
                handle: type_name::<H>(),
                parent: type_name::<P>(),
            });
        }
        Ok(())
    }
}

impl<H, D, P, C> Deref for ChildHandle<H, D, P, C>
where
    H: NativeHandle,
    P: NativeHandle,
    D: Deleter<H, (P, C)>,
{
    type Target = H;

    fn deref(&self) -> &H {
        &self.inner
    }
}

impl<H, D, P, C> fmt::Debug for ChildHandle<H, D, P, C>
where
    H: NativeHandle,
    P: NativeHandle,
    D: Deleter<H, (P, C)>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildHandle")
            .field("handle", &self.raw())
            .field("parent", &self.parent())
            .field("owning", &self.is_owning())
            .finish_non_exhaustive()
    }
}
