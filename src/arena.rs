//! Region-based bump allocator.
//!
//! An [`Arena`] owns a chain of word-aligned regions. Allocation advances a
//! cursor inside the current region and opens a new region on overflow.
//! Individual blocks are never freed; memory is recycled wholesale with
//! [`Arena::reset`] / [`Arena::rewind`] or returned with [`Arena::release`].
//!
//! Allocation takes `&self` so that several tables can share one arena;
//! everything that invalidates outstanding blocks takes `&mut self`, which
//! the borrow checker refuses while any table still borrows the arena.

use crate::alloc::WORD;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::ptr::NonNull;
use std::alloc::{self, Layout};
use tracing::{debug, trace};

/// Arena sizing parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Capacity of a freshly opened region, in machine words.
    ///
    /// Requests larger than this get a region of exactly their own size.
    /// Default: 8192 words.
    pub region_words: usize,
}

impl ArenaConfig {
    /// Default region capacity in words.
    pub const DEFAULT_REGION_WORDS: usize = 8 * 1024;

    pub fn new(region_words: usize) -> Self {
        Self { region_words }
    }

    /// Default region capacity in bytes.
    pub fn region_bytes(&self) -> usize {
        self.region_words * WORD
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_REGION_WORDS)
    }
}

/// Counters describing how the arena has been growing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Regions opened since construction (including after `release`).
    pub regions_created: usize,
    /// Times an existing region was passed over because it could not fit a request.
    pub regions_skipped: usize,
    /// Requests larger than the default region capacity, whether or not they
    /// needed a new region.
    pub oversized_allocations: usize,
}

/// Snapshot of the allocation cursor, see [`Arena::checkpoint`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    epoch: u64,
    region: usize,
    count: usize,
}

struct Region {
    data: NonNull<usize>,
    capacity: usize,
    count: usize,
}

impl Region {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let layout = Self::layout(capacity);
        // SAFETY: capacity >= 1, so the layout is non-zero.
        let ptr = unsafe { alloc::alloc(layout) }.cast::<usize>();
        let data = match NonNull::new(ptr) {
            Some(p) => p,
            None => alloc::handle_alloc_error(layout),
        };
        Self {
            data,
            capacity,
            count: 0,
        }
    }

    fn layout(capacity: usize) -> Layout {
        match Layout::array::<usize>(capacity) {
            Ok(layout) => layout,
            Err(_) => panic!("arena region of {capacity} words exceeds the address space"),
        }
    }

    #[inline]
    fn fits(&self, words: usize) -> bool {
        self.capacity - self.count >= words
    }

    /// First byte past the used part of the region.
    #[inline]
    fn tail(&self) -> *mut u8 {
        // SAFETY: count <= capacity, so this is at most one past the end.
        unsafe { self.data.as_ptr().add(self.count).cast() }
    }

    #[inline]
    fn bump(&mut self, words: usize) -> NonNull<u8> {
        debug_assert!(self.fits(words));
        let p = self.tail();
        self.count += words;
        // SAFETY: derived from the non-null region base.
        unsafe { NonNull::new_unchecked(p) }
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        // SAFETY: allocated in `Region::new` with the same layout.
        unsafe { alloc::dealloc(self.data.as_ptr().cast(), Self::layout(self.capacity)) }
    }
}

#[inline]
fn words_for(size: usize) -> usize {
    size.div_ceil(WORD)
}

/// Chain of bump-allocated regions.
pub struct Arena {
    config: ArenaConfig,
    regions: RefCell<Vec<Region>>,
    /// Index of the region currently being filled.
    current: Cell<usize>,
    /// Bumped by every operation that invalidates checkpoints.
    epoch: Cell<u64>,
    stats: Cell<ArenaStats>,
}

impl Arena {
    /// Empty arena with default sizing; no region is opened until the first
    /// allocation.
    pub fn new() -> Self {
        Self::with_config(ArenaConfig::default())
    }

    pub fn with_config(config: ArenaConfig) -> Self {
        Self {
            config,
            regions: RefCell::new(Vec::new()),
            current: Cell::new(0),
            epoch: Cell::new(0),
            stats: Cell::new(ArenaStats::default()),
        }
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    fn open_region(&self, words: usize) -> Region {
        let mut stats = self.stats.get();
        stats.regions_created += 1;
        self.stats.set(stats);
        let capacity = self.config.region_words.max(words);
        trace!(capacity_words = capacity, "arena opening region");
        Region::new(capacity)
    }

    /// Bump-allocate `size` bytes, rounded up to whole words.
    ///
    /// The block stays valid until the arena is reset, rewound past it,
    /// released or dropped. Exhaustion of the system allocator aborts.
    pub fn alloc(&self, size: usize) -> NonNull<u8> {
        let words = words_for(size);
        if words > self.config.region_words {
            let mut stats = self.stats.get();
            stats.oversized_allocations += 1;
            self.stats.set(stats);
        }
        let mut regions = self.regions.borrow_mut();
        if regions.is_empty() {
            let first = self.open_region(words);
            regions.push(first);
            self.current.set(0);
        }

        // Regions past the cursor may still have room, e.g. after a reset.
        let mut cur = self.current.get();
        while !regions[cur].fits(words) && cur + 1 < regions.len() {
            cur += 1;
            let mut stats = self.stats.get();
            stats.regions_skipped += 1;
            self.stats.set(stats);
            trace!(region = cur, "arena skipped exhausted region");
        }

        if !regions[cur].fits(words) {
            let fresh = self.open_region(words);
            regions.push(fresh);
            cur = regions.len() - 1;
        }

        self.current.set(cur);
        regions[cur].bump(words)
    }

    /// Grow a block.
    ///
    /// Shrinking is a no-op. The most recent block of the current region is
    /// extended in place when the region has room; otherwise a fresh block is
    /// allocated and `old_size` bytes are copied, orphaning the old block.
    ///
    /// # Safety
    ///
    /// `old` must be a live block of this arena of at least `old_size` bytes.
    pub unsafe fn realloc(&self, old: NonNull<u8>, old_size: usize, new_size: usize) -> NonNull<u8> {
        if new_size <= old_size {
            return old;
        }

        {
            let mut regions = self.regions.borrow_mut();
            let cur = self.current.get();
            if let Some(region) = regions.get_mut(cur) {
                let old_words = words_for(old_size);
                let grow = words_for(new_size) - old_words;
                let old_end = old.as_ptr().wrapping_add(old_words * WORD);
                if old_end == region.tail() && region.fits(grow) {
                    region.count += grow;
                    return old;
                }
            }
        }

        let fresh = self.alloc(new_size);
        core::ptr::copy_nonoverlapping(old.as_ptr(), fresh.as_ptr(), old_size);
        fresh
    }

    /// Forget every allocation but keep the regions for reuse.
    pub fn reset(&mut self) {
        let regions = self.regions.get_mut();
        for region in regions.iter_mut() {
            region.count = 0;
        }
        self.current.set(0);
        self.epoch.set(self.epoch.get() + 1);
        debug!(regions = regions.len(), "arena reset");
    }

    /// Free every region. The arena can be used again afterwards.
    pub fn release(&mut self) {
        let regions = self.regions.get_mut();
        let freed = regions.len();
        regions.clear();
        self.current.set(0);
        self.epoch.set(self.epoch.get() + 1);
        debug!(regions = freed, "arena released");
    }

    /// Capture the allocation cursor so later allocations can be discarded
    /// with [`Arena::rewind`].
    pub fn checkpoint(&self) -> Checkpoint {
        let regions = self.regions.borrow();
        let region = self.current.get();
        Checkpoint {
            epoch: self.epoch.get(),
            region,
            count: regions.get(region).map_or(0, |r| r.count),
        }
    }

    /// Discard every allocation made after `cp` was taken.
    ///
    /// # Panics
    ///
    /// Panics if `cp` predates a `reset`, `release` or an earlier rewind.
    pub fn rewind(&mut self, cp: Checkpoint) {
        assert_eq!(
            cp.epoch,
            self.epoch.get(),
            "stale arena checkpoint: the arena was reset, released or rewound since"
        );
        let regions = self.regions.get_mut();
        if let Some(region) = regions.get_mut(cp.region) {
            region.count = cp.count;
        }
        for region in regions.iter_mut().skip(cp.region + 1) {
            region.count = 0;
        }
        self.current.set(cp.region);
        self.epoch.set(self.epoch.get() + 1);
    }

    pub fn stats(&self) -> ArenaStats {
        self.stats.get()
    }

    pub fn region_count(&self) -> usize {
        self.regions.borrow().len()
    }

    /// Bytes handed out since the last reset, across all regions.
    pub fn used_bytes(&self) -> usize {
        self.regions.borrow().iter().map(|r| r.count * WORD).sum()
    }

    /// Bytes reserved by all regions.
    pub fn capacity_bytes(&self) -> usize {
        self.regions.borrow().iter().map(|r| r.capacity * WORD).sum()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("regions", &self.region_count())
            .field("current", &self.current.get())
            .field("used_bytes", &self.used_bytes())
            .field("capacity_bytes", &self.capacity_bytes())
            .finish()
    }
}
