//! Guard for the table's shared scratch key buffer.
//!
//! Every keyed operation encodes its candidate key into one buffer owned by
//! the table, and `contains_key` does so through `&self`. User hooks (copy,
//! hash, eq, destroy) run while the buffer is live, so a hook that calls back
//! into the same table would overwrite the key being probed, or release a text
//! duplicate the outer call is still reading. A second claim therefore panics
//! and names both operations, in every build profile.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-table claim tracker. Embed in the table and hold
/// `let _g = self.guard.claim("op");` for as long as the buffer is in use.
#[derive(Debug)]
pub(crate) struct ScratchGuard {
    holder: Cell<Option<&'static str>>,
    // Single-threaded: keep the owner !Send + !Sync.
    _nosend: PhantomData<*mut ()>,
}

impl ScratchGuard {
    pub(crate) const fn new() -> Self {
        Self {
            holder: Cell::new(None),
            _nosend: PhantomData,
        }
    }

    /// Claim the scratch buffer for `op`.
    ///
    /// # Panics
    ///
    /// Panics if another operation already holds it.
    #[inline]
    pub(crate) fn claim(&self, op: &'static str) -> ScratchClaim<'_> {
        if let Some(held) = self.holder.get() {
            panic!("scratch key buffer reentered: `{op}` called from a hook while `{held}` is running");
        }
        self.holder.set(Some(op));
        ScratchClaim { owner: self }
    }

    #[cfg(test)]
    pub(crate) fn is_claimed(&self) -> bool {
        self.holder.get().is_some()
    }
}

/// RAII claim returned by [`ScratchGuard::claim`].
pub(crate) struct ScratchClaim<'a> {
    owner: &'a ScratchGuard,
}

impl Drop for ScratchClaim<'_> {
    fn drop(&mut self) {
        debug_assert!(self.owner.holder.get().is_some());
        self.owner.holder.set(None);
    }
}
