//! Typed views over value slots.

use crate::alloc::WORD;
use core::mem::{align_of, size_of};

/// Types that may be viewed in place inside a zero-initialised value slot.
///
/// # Safety
///
/// Implementors must be `Copy`, have no padding-dependent invariants, accept
/// every bit pattern (in particular all-zero), and be aligned to at most a
/// machine word.
pub unsafe trait Plain: Copy + 'static {}

macro_rules! plain {
    ($($t:ty),* $(,)?) => {$(
        unsafe impl Plain for $t {}
    )*};
}

plain!(u8, i8, u16, i16, u32, i32, u64, i64, usize, isize, f32, f64);

unsafe impl<T: Plain, const N: usize> Plain for [T; N] {}

#[inline]
fn check<T: Plain>(slot_len: usize) {
    assert!(
        size_of::<T>() <= slot_len,
        "value slot of {slot_len} bytes cannot hold a {}-byte value",
        size_of::<T>()
    );
    debug_assert!(align_of::<T>() <= WORD);
}

/// View a value slot as `&mut T`.
///
/// # Panics
///
/// Panics when `T` is wider than the slot.
pub(crate) fn view_mut<T: Plain>(slot: &mut [u8]) -> &mut T {
    check::<T>(slot.len());
    debug_assert_eq!(slot.as_ptr() as usize % align_of::<T>(), 0);
    // SAFETY: the slot is word aligned (every block is), large enough, and
    // `T: Plain` accepts any bit pattern.
    unsafe { &mut *slot.as_mut_ptr().cast::<T>() }
}

/// View a value slot as `&T`.
pub(crate) fn view<T: Plain>(slot: &[u8]) -> &T {
    check::<T>(slot.len());
    debug_assert_eq!(slot.as_ptr() as usize % align_of::<T>(), 0);
    // SAFETY: as in `view_mut`.
    unsafe { &*slot.as_ptr().cast::<T>() }
}
