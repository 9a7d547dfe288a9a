use std::any::type_name;
use std::mem::MaybeUninit;

use mu_array::Array;

use crate::backend::BackendError;

/// Run a two-call query: ask for the count, size an array, fill it.
///
/// If the second call writes fewer items than first reported, the array
/// holds only those. If either call fails, the error is returned and no
/// unwritten slot is ever exposed.
///
/// # Safety
/// When `query` is handed slots and returns `Ok(n)`, it must have
/// initialized the first `n` of them. Reporting more than it wrote exposes
/// uninitialized memory. Counts past the slot length are clamped.
/// Queries that forward to a [`Backend`](crate::Backend) two-call method
/// meet this through that trait's contract.
pub unsafe fn enumerate<T, F>(mut query: F) -> Result<Array<T>, BackendError>
where
    T: Copy,
    F: FnMut(Option<&mut [MaybeUninit<T>]>) -> Result<usize, BackendError>,
{
    let count = query(None)?;
    let mut items = unsafe { Array::<T>::make_uninitialized(count) };
    // Nothing is live while the query writes.
    unsafe { items.set_num(0) };

    let written = query(Some(items.spare_slots()))?.min(count);
    // SAFETY: the caller guarantees the first `written` slots were written.
    unsafe { items.set_num(written) };

    tracing::debug!(kind = type_name::<T>(), count, written, "enumerated");
    Ok(items)
}
