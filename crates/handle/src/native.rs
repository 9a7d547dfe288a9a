use std::fmt;

/// A plain value naming a native resource, with a null sentinel.
pub trait NativeHandle: Copy + Eq + fmt::Debug {
    fn null() -> Self;

    #[inline]
    fn is_null(self) -> bool {
        self == Self::null()
    }
}

impl<T> NativeHandle for *mut T {
    #[inline]
    fn null() -> Self {
        std::ptr::null_mut()
    }
}

impl<T> NativeHandle for *const T {
    #[inline]
    fn null() -> Self {
        std::ptr::null()
    }
}

macro_rules! impl_integer_handle {
    ($($t:ty),*) => {
        $(
            impl NativeHandle for $t {
                #[inline]
                fn null() -> Self {
                    0
                }
            }
        )*
    };
}

impl_integer_handle!(u16, u32, u64, usize);

/// Declare `#[repr(transparent)]` integer newtypes that are native handles.
///
/// The zero value is null.
///
/// ```
/// mu_handle::native_handle! {
///     /// A device-owned buffer.
///     pub struct Buffer(u64);
/// }
/// assert!(mu_handle::NativeHandle::is_null(Buffer::default()));
/// ```
#[macro_export]
macro_rules! native_handle {
    ($($(#[$meta:meta])* $vis:vis struct $name:ident($repr:ty);)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            #[repr(transparent)]
            $vis struct $name(pub $repr);

            impl $crate::NativeHandle for $name {
                #[inline]
                fn null() -> Self {
                    Self(0)
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::native_handle! {
        struct Fence(u64);
        struct Semaphore(u32);
    }

    #[test]
    fn zero_is_null() {
        assert!(0u64.is_null());
        assert!(!7u32.is_null());
        assert!(Fence::default().is_null());
        assert!(!Semaphore(3).is_null());
        assert_eq!(Fence::null(), Fence(0));
    }

    #[test]
    fn pointers_use_null_pointer() {
        let value = 5u8;
        let p: *const u8 = &value;
        assert!(!p.is_null());
        assert!(<*mut u8 as NativeHandle>::null().is_null());
    }
}
