//! Allocation capability consumed by `Dict`.
//!
//! The table obtains every byte block it owns (entry key/value blocks, the
//! scratch key buffer, text key duplicates, raw key snapshots) through a
//! `DictAlloc`. Allocation never fails from the caller's point of view:
//! exhaustion is fatal and goes through `handle_alloc_error`.

use crate::arena::Arena;
use core::ptr::NonNull;
use std::alloc::{self, Layout};

/// Machine word in bytes; key and value widths are rounded to it and every
/// block handed out is aligned to it.
pub const WORD: usize = core::mem::size_of::<usize>();

/// Round `size` up to a whole number of machine words.
#[inline]
pub const fn round_to_word(size: usize) -> usize {
    size.div_ceil(WORD) * WORD
}

/// Allocate-required, deallocate-optional allocator capability.
///
/// Implementations that cannot release individual blocks (bump arenas)
/// keep the default `reclaims() == false`; the table then skips every
/// per-block release call, including at teardown.
pub trait DictAlloc {
    /// Return a word-aligned block of at least `size` bytes.
    fn allocate(&self, size: usize) -> NonNull<u8>;

    /// Whether `deallocate` actually gives memory back.
    #[inline]
    fn reclaims(&self) -> bool {
        false
    }

    /// Release a block previously returned by `allocate`.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `self.allocate(size)` with the same
    /// `size`, and must not be used or released again afterwards.
    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        let _ = (ptr, size);
    }
}

impl<A: DictAlloc + ?Sized> DictAlloc for &A {
    #[inline]
    fn allocate(&self, size: usize) -> NonNull<u8> {
        (**self).allocate(size)
    }

    #[inline]
    fn reclaims(&self) -> bool {
        (**self).reclaims()
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        (**self).deallocate(ptr, size)
    }
}

/// The global allocator, with word alignment.
#[derive(Copy, Clone, Debug, Default)]
pub struct System;

impl System {
    fn layout(size: usize) -> Layout {
        // Zero-sized requests still get a real block so the pointer can be
        // released symmetrically.
        match Layout::from_size_align(size.max(1), WORD) {
            Ok(layout) => layout,
            Err(_) => panic!("allocation of {size} bytes exceeds the address space"),
        }
    }
}

impl DictAlloc for System {
    fn allocate(&self, size: usize) -> NonNull<u8> {
        let layout = Self::layout(size);
        // SAFETY: layout has non-zero size.
        let ptr = unsafe { alloc::alloc(layout) };
        match NonNull::new(ptr) {
            Some(p) => p,
            None => alloc::handle_alloc_error(layout),
        }
    }

    #[inline]
    fn reclaims(&self) -> bool {
        true
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        alloc::dealloc(ptr.as_ptr(), Self::layout(size));
    }
}

/// Arena blocks are only ever given back wholesale (`reset`/`release`).
impl DictAlloc for Arena {
    #[inline]
    fn allocate(&self, size: usize) -> NonNull<u8> {
        self.alloc(size)
    }
}
