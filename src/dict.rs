//! Dict: chained hash table over type-erased key slots and value bytes.

use crate::alloc::{DictAlloc, System, WORD};
use crate::key::{release_text, DictKey, KeyAttr, KeyKind, ValueAttr};
use crate::reentrancy::ScratchGuard;
use crate::value::{self, Plain};
use core::fmt;
use core::borrow::Borrow;
use core::marker::PhantomData;
use core::mem;
use core::ops::{Deref, DerefMut};
use core::ptr::{self, NonNull};
use core::slice;
use slotmap::{DefaultKey, SlotMap};
use tracing::debug;

/// Chains a fresh table starts with.
pub const DEFAULT_BUCKETS: usize = 8;
/// Doublings applied when a chain outgrows the bucket count.
const GROW_STEPS: u32 = 2;

/// Stable reference to one entry. Resolves to `None` once the entry is
/// removed, even if its storage slot is reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    /// Decoded key of the entry.
    pub fn key<K, A>(&self, dict: &Dict<K, A>) -> Option<K::Owned>
    where
        K: ?Sized + DictKey,
        A: DictAlloc,
    {
        let node = dict.nodes.get(self.0)?;
        // SAFETY: live node, slot filled by this table's copy.
        Some(unsafe { K::decode(dict.key_of(node), dict.key_width) })
    }

    /// Raw key slot (`key_width` bytes, zero padded).
    pub fn key_slot<'a, K, A>(&self, dict: &'a Dict<K, A>) -> Option<&'a [u8]>
    where
        K: ?Sized + DictKey,
        A: DictAlloc,
    {
        dict.nodes.get(self.0).map(|n| dict.key_of(n))
    }

    pub fn value<'a, K, A>(&self, dict: &'a Dict<K, A>) -> Option<&'a [u8]>
    where
        K: ?Sized + DictKey,
        A: DictAlloc,
    {
        dict.nodes.get(self.0).map(|n| dict.value_of(n))
    }

    /// [`Handle::value`] viewed as a `T`.
    ///
    /// # Panics
    ///
    /// Panics when `T` is wider than the value slot.
    pub fn value_as<'a, T, K, A>(&self, dict: &'a Dict<K, A>) -> Option<&'a T>
    where
        T: Plain,
        K: ?Sized + DictKey,
        A: DictAlloc,
    {
        self.value(dict).map(value::view)
    }

    pub fn value_mut<'a, K, A>(&self, dict: &'a mut Dict<K, A>) -> Option<&'a mut [u8]>
    where
        K: ?Sized + DictKey,
        A: DictAlloc,
    {
        let node = dict.nodes.get(self.0)?;
        // SAFETY: exclusive access to the table; blocks never overlap.
        Some(unsafe { dict.value_of_mut(node) })
    }

    /// Address of the value bytes. Stays put across reshapes.
    pub fn value_ptr<K, A>(&self, dict: &Dict<K, A>) -> Option<NonNull<u8>>
    where
        K: ?Sized + DictKey,
        A: DictAlloc,
    {
        let node = dict.nodes.get(self.0)?;
        // SAFETY: offset stays inside the block.
        Some(unsafe { NonNull::new_unchecked(node.block.as_ptr().add(dict.key_stride)) })
    }
}

#[derive(Debug)]
struct Node {
    hash: u64,
    prev: Option<DefaultKey>,
    next: Option<DefaultKey>,
    /// `key_stride` key bytes followed by `val_width` value bytes.
    block: NonNull<u8>,
}

#[derive(Copy, Clone, Debug, Default)]
struct Chain {
    len: usize,
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
}

/// Chain array carved out of one block from the table allocator.
struct Buckets {
    ptr: NonNull<Chain>,
    len: usize,
}

impl Buckets {
    fn new_in<A: DictAlloc>(alloc: &A, len: usize) -> Self {
        debug_assert!(mem::align_of::<Chain>() <= WORD);
        let ptr = alloc.allocate(Self::block_size(len)).cast::<Chain>();
        for i in 0..len {
            // SAFETY: the block is word aligned and holds `len` chains.
            unsafe { ptr.as_ptr().add(i).write(Chain::default()) };
        }
        Self { ptr, len }
    }

    #[inline]
    fn block_size(len: usize) -> usize {
        mem::size_of::<Chain>() * len
    }

    /// # Safety
    ///
    /// `alloc` must be the allocator that produced the block, and the array
    /// must not be used afterwards.
    unsafe fn release_in<A: DictAlloc>(&self, alloc: &A) {
        if alloc.reclaims() {
            alloc.deallocate(self.ptr.cast(), Self::block_size(self.len));
        }
    }
}

impl Deref for Buckets {
    type Target = [Chain];

    fn deref(&self) -> &[Chain] {
        // SAFETY: every chain was initialised in `new_in`.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl DerefMut for Buckets {
    fn deref_mut(&mut self) -> &mut [Chain] {
        // SAFETY: as in `deref`; `&mut self` is exclusive.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

/// Hash table keyed by one [`KeyKind`], with fixed-width byte values.
///
/// Values are zero-initialised on insertion and never move: the address
/// returned by [`Dict::get`] stays valid until that entry is removed or the
/// table is dropped.
///
/// ```
/// use kind_dict::{Dict, KeyAttr, ValueAttr};
///
/// let mut d: Dict<i32> = Dict::new(KeyAttr::new(), ValueAttr::new(8));
/// for i in 0..30 {
///     *d.get_as::<f64>(&i) = i as f64;
/// }
/// assert_eq!(*d.get_as::<f64>(&17), 17.0);
/// assert_eq!(d.len(), 30);
/// ```
pub struct Dict<K: ?Sized + DictKey, A: DictAlloc = System> {
    key: KeyAttr<K>,
    val: ValueAttr,
    key_width: usize,
    key_stride: usize,
    val_width: usize,
    alloc: A,
    buckets: Buckets,
    nodes: SlotMap<DefaultKey, Node>,
    key_temp: NonNull<u8>,
    guard: ScratchGuard,
}

impl<K: ?Sized + DictKey> Dict<K> {
    /// Table backed by the global allocator.
    pub fn new(key: KeyAttr<K>, val: ValueAttr) -> Self {
        Self::with_alloc(key, val, System)
    }

    /// Default key hooks and `size`-byte values. Not usable for records,
    /// which need an explicit width.
    pub fn with_value_size(size: usize) -> Self {
        Self::new(KeyAttr::new(), ValueAttr::new(size))
    }
}

impl<K: ?Sized + DictKey, A: DictAlloc> Dict<K, A> {
    /// # Panics
    ///
    /// Panics when a record key has no (or a zero) width, or when a custom
    /// copy hook is given for text keys.
    pub fn with_alloc(key: KeyAttr<K>, val: ValueAttr, alloc: A) -> Self {
        let key_width = key.width();
        let key_stride = key.slot_width();
        assert!(
            !(K::KIND == KeyKind::Text && key.copy.is_some()),
            "text keys are always duplicated by the table; custom copy hooks are not supported"
        );
        let key_temp = alloc.allocate(key_stride);
        let buckets = Buckets::new_in(&alloc, DEFAULT_BUCKETS);
        Self {
            key,
            val_width: val.width(),
            val,
            key_width,
            key_stride,
            alloc,
            buckets,
            nodes: SlotMap::with_key(),
            key_temp,
            guard: ScratchGuard::new(),
        }
    }

    /// Value slot for `key`, inserting a zeroed one if absent.
    pub fn get(&mut self, key: &K) -> &mut [u8] {
        let h = self.entry(key);
        let node = &self.nodes[h.0];
        // SAFETY: exclusive access; `node` is live.
        unsafe { self.value_of_mut(node) }
    }

    /// [`Dict::get`] viewed as a `T`.
    ///
    /// # Panics
    ///
    /// Panics when `T` is wider than the value slot.
    pub fn get_as<T: Plain>(&mut self, key: &K) -> &mut T {
        value::view_mut(self.get(key))
    }

    /// Lookup-or-insert returning a handle to the entry.
    pub fn entry(&mut self, key: &K) -> Handle {
        let (hash, found) = {
            let _g = self.guard.claim("get");
            // SAFETY: the claim keeps the scratch buffer exclusive.
            let hash = unsafe { self.load_scratch(key) };
            let found = self.find_in_chain(hash, self.scratch_slot());
            if found.is_some() {
                self.release_scratch();
            }
            (hash, found)
        };
        if let Some(k) = found {
            return Handle(k);
        }

        let k = self.adopt_scratch(hash);
        let bucket = self.bucket_of(hash);
        if self.buckets[bucket].len > self.buckets.len() {
            self.reshape(self.buckets.len() << GROW_STEPS);
        }
        Handle(k)
    }

    /// Handle of `key` if present. Never inserts.
    pub fn find(&self, key: &K) -> Option<Handle> {
        self.lookup(key, "find").map(Handle)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.lookup(key, "contains_key").is_some()
    }

    /// Remove `key`, running its release hooks. Returns whether it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.lookup(key, "remove").and_then(|k| self.unlink(k)) {
            Some(node) => {
                self.release_node(node);
                true
            }
            None => false,
        }
    }

    /// Number of entries, summed over the chains.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|c| c.len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every key, decoded, in bucket-then-chain order.
    pub fn keys(&self) -> Vec<K::Owned> {
        self.iter()
            // SAFETY: slots come from this table.
            .map(|(_, slot, _)| unsafe { K::decode(slot, self.key_width) })
            .collect()
    }

    /// Raw key slots copied into one block from the table allocator, in the
    /// same order as [`Dict::keys`]. Text slots still point at the table's
    /// own duplicates. `None` for an empty table.
    pub fn raw_keys(&self) -> Option<RawKeys<'_, A>> {
        let count = self.len();
        if count == 0 {
            return None;
        }
        let size = count * self.key_stride;
        let ptr = self.alloc.allocate(size);
        for (i, (_, slot, _)) in self.iter().enumerate() {
            // SAFETY: `i < count`, block holds `count` slots.
            unsafe {
                ptr::copy_nonoverlapping(
                    slot.as_ptr(),
                    ptr.as_ptr().add(i * self.key_stride),
                    self.key_stride,
                )
            };
        }
        Some(RawKeys {
            ptr,
            count,
            stride: self.key_stride,
            alloc: &self.alloc,
        })
    }

    /// `(handle, key slot, value)` in bucket-then-chain order.
    pub fn iter(&self) -> Iter<'_, K, A> {
        Iter {
            dict: self,
            cursor: Cursor::new(self.nodes.len()),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, A> {
        IterMut {
            cursor: Cursor::new(self.nodes.len()),
            dict: self,
            _pd: PhantomData,
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn max_chain_len(&self) -> usize {
        self.buckets.iter().map(|c| c.len).max().unwrap_or(0)
    }

    /// Bytes per key slot (declared width rounded to a word).
    pub fn key_width(&self) -> usize {
        self.key_stride
    }

    /// Bytes per value slot.
    pub fn value_width(&self) -> usize {
        self.val_width
    }

    pub fn kind(&self) -> KeyKind {
        K::KIND
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    // ---- scratch key ----

    fn scratch_slot(&self) -> &[u8] {
        // SAFETY: `key_temp` holds `key_stride` bytes for the table's lifetime.
        unsafe { slice::from_raw_parts(self.key_temp.as_ptr(), self.key_stride) }
    }

    /// # Safety
    ///
    /// Caller holds the scratch claim and no other view of the buffer.
    #[allow(clippy::mut_from_ref)]
    unsafe fn scratch_mut(&self) -> &mut [u8] {
        slice::from_raw_parts_mut(self.key_temp.as_ptr(), self.key_stride)
    }

    /// Encode `key` into the scratch buffer and hash it.
    ///
    /// # Safety
    ///
    /// As for [`Dict::scratch_mut`].
    unsafe fn load_scratch(&self, key: &K) -> u64 {
        let slot = self.scratch_mut();
        slot.fill(0);
        self.copy_in(slot, key);
        self.hash_slot(slot)
    }

    fn release_scratch(&self) {
        // SAFETY: only reached while the caller holds the claim.
        unsafe { self.release_key(self.scratch_mut()) }
    }

    fn copy_in(&self, slot: &mut [u8], key: &K) {
        match self.key.copy {
            Some(copy) => copy(slot, key),
            None => key.with_bytes(|src| {
                if K::KIND == KeyKind::Record {
                    assert_eq!(
                        src.len(),
                        self.key_width,
                        "record key has the wrong length"
                    );
                }
                K::KIND.default_copy(src, slot, &self.alloc)
            }),
        }
    }

    /// Move the scratch key into a fresh entry and link it.
    fn adopt_scratch(&mut self, hash: u64) -> DefaultKey {
        let block = self.alloc.allocate(self.block_size());
        // SAFETY: block holds key_stride + val_width bytes; scratch holds key_stride.
        unsafe {
            ptr::copy_nonoverlapping(self.key_temp.as_ptr(), block.as_ptr(), self.key_stride);
            ptr::write_bytes(block.as_ptr().add(self.key_stride), 0, self.val_width);
        }
        let k = self.nodes.insert(Node {
            hash,
            prev: None,
            next: None,
            block,
        });
        self.link_tail(k);
        k
    }

    // ---- hooks ----

    pub(crate) fn hash_slot(&self, slot: &[u8]) -> u64 {
        match self.key.hash {
            Some(hash) => hash(slot),
            None => K::KIND.default_hash(slot, self.key_width),
        }
    }

    fn slots_eq(&self, a: &[u8], b: &[u8]) -> bool {
        match self.key.eq {
            Some(eq) => eq(a, b),
            None => K::KIND.default_eq(a, b, self.key_width),
        }
    }

    /// Key release: the custom destroy when paired with a custom copy,
    /// otherwise the implicit text duplicate release.
    fn release_key(&self, slot: &mut [u8]) {
        match (self.key.copy, self.key.destroy) {
            (Some(_), Some(destroy)) => destroy(slot),
            // SAFETY: text slots own a duplicate made by the default copy.
            (None, _) if K::KIND == KeyKind::Text => unsafe { release_text(slot, &self.alloc) },
            _ => {}
        }
    }

    fn release_node(&self, node: Node) {
        let size = self.block_size();
        // SAFETY: the node was unlinked; its block is ours to tear down.
        unsafe {
            let block = slice::from_raw_parts_mut(node.block.as_ptr(), size);
            let (key, val) = block.split_at_mut(self.key_stride);
            self.release_key(key);
            if let Some(destroy) = self.val.destroy {
                destroy(val);
            }
            if self.alloc.reclaims() {
                self.alloc.deallocate(node.block, size);
            }
        }
    }

    // ---- chains ----

    #[inline]
    fn block_size(&self) -> usize {
        self.key_stride + self.val_width
    }

    #[inline]
    fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    fn key_of(&self, node: &Node) -> &[u8] {
        // SAFETY: every block starts with `key_stride` key bytes.
        unsafe { slice::from_raw_parts(node.block.as_ptr(), self.key_stride) }
    }

    fn value_of(&self, node: &Node) -> &[u8] {
        // SAFETY: value bytes follow the key slot.
        unsafe { slice::from_raw_parts(node.block.as_ptr().add(self.key_stride), self.val_width) }
    }

    /// # Safety
    ///
    /// Caller must have exclusive access to the entry's value.
    #[allow(clippy::mut_from_ref)]
    unsafe fn value_of_mut(&self, node: &Node) -> &mut [u8] {
        slice::from_raw_parts_mut(node.block.as_ptr().add(self.key_stride), self.val_width)
    }

    fn find_in_chain(&self, hash: u64, probe: &[u8]) -> Option<DefaultKey> {
        let mut cur = self.buckets[self.bucket_of(hash)].head;
        while let Some(k) = cur {
            let node = &self.nodes[k];
            if node.hash == hash && self.slots_eq(self.key_of(node), probe) {
                return Some(k);
            }
            cur = node.next;
        }
        None
    }

    fn lookup(&self, key: &K, op: &'static str) -> Option<DefaultKey> {
        let _g = self.guard.claim(op);
        // SAFETY: claim held.
        let hash = unsafe { self.load_scratch(key) };
        let found = self.find_in_chain(hash, self.scratch_slot());
        self.release_scratch();
        found
    }

    fn link_tail(&mut self, k: DefaultKey) {
        let b = self.bucket_of(self.nodes[k].hash);
        let chain = &mut self.buckets[b];
        let prev = chain.tail;
        {
            let node = &mut self.nodes[k];
            node.prev = prev;
            node.next = None;
        }
        match prev {
            Some(p) => self.nodes[p].next = Some(k),
            None => chain.head = Some(k),
        }
        chain.tail = Some(k);
        chain.len += 1;
    }

    fn unlink(&mut self, k: DefaultKey) -> Option<Node> {
        let node = self.nodes.remove(k)?;
        let b = self.bucket_of(node.hash);
        match node.prev {
            Some(p) => self.nodes[p].next = node.next,
            None => self.buckets[b].head = node.next,
        }
        match node.next {
            Some(n) => self.nodes[n].prev = node.prev,
            None => self.buckets[b].tail = node.prev,
        }
        self.buckets[b].len -= 1;
        Some(node)
    }

    /// Relink every node into `new_count` chains by its stored hash.
    fn reshape(&mut self, new_count: usize) {
        let old_count = self.buckets.len();
        let mut order = Vec::with_capacity(self.nodes.len());
        for chain in self.buckets.iter() {
            let mut cur = chain.head;
            while let Some(k) = cur {
                order.push(k);
                cur = self.nodes[k].next;
            }
        }
        let old = mem::replace(&mut self.buckets, Buckets::new_in(&self.alloc, new_count));
        // SAFETY: the old array came from this allocator and is gone from the table.
        unsafe { old.release_in(&self.alloc) };
        for k in order {
            self.link_tail(k);
        }
        debug!(
            old_buckets = old_count,
            new_buckets = new_count,
            entries = self.nodes.len(),
            "dict reshaped"
        );
    }

    /// Fill a zeroed slot from a key slot read out of a snapshot. With a
    /// custom copy hook the key is decoded and copied through the hook, so
    /// the entry owns its key like any other and the paired destroy stays
    /// balanced.
    pub(crate) fn load_key(&self, slot: &mut [u8], raw: &[u8]) {
        match self.key.copy {
            Some(copy) => {
                // SAFETY: non-text slot bytes of this kind; text never has a custom copy.
                let owned = unsafe { K::decode(raw, self.key_width) };
                copy(slot, <K::Owned as Borrow<K>>::borrow(&owned));
            }
            None => slot.copy_from_slice(raw),
        }
    }

    /// Append a decoded entry. `write_key` fills the zeroed key slot.
    pub(crate) fn link_decoded(&mut self, write_key: impl FnOnce(&Self, &mut [u8]), value: &[u8]) {
        let size = self.block_size();
        let block = self.alloc.allocate(size);
        // SAFETY: fresh block of `size` bytes.
        let bytes = unsafe {
            ptr::write_bytes(block.as_ptr(), 0, size);
            slice::from_raw_parts_mut(block.as_ptr(), size)
        };
        let (slot, val) = bytes.split_at_mut(self.key_stride);
        write_key(&*self, slot);
        val[..value.len()].copy_from_slice(value);
        let hash = self.hash_slot(slot);
        let k = self.nodes.insert(Node {
            hash,
            prev: None,
            next: None,
            block,
        });
        self.link_tail(k);
    }

    /// One corrective reshape after bulk loading.
    pub(crate) fn settle_after_load(&mut self) {
        let buckets = self.buckets.len();
        let longest = self.max_chain_len();
        if longest > buckets {
            self.reshape(buckets * (longest / buckets + 1).next_power_of_two());
        }
    }
}

impl<K: ?Sized + DictKey, A: DictAlloc> Drop for Dict<K, A> {
    fn drop(&mut self) {
        let nodes = mem::take(&mut self.nodes);
        for (_, node) in nodes {
            self.release_node(node);
        }
        // SAFETY: allocated in `with_alloc` (or the last reshape) by `self.alloc`.
        unsafe { self.buckets.release_in(&self.alloc) };
        if self.alloc.reclaims() {
            // SAFETY: allocated in `with_alloc` with this size.
            unsafe { self.alloc.deallocate(self.key_temp, self.key_stride) };
        }
    }
}

impl<K: ?Sized + DictKey, A: DictAlloc> fmt::Debug for Dict<K, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dict")
            .field("kind", &K::KIND)
            .field("len", &self.len())
            .field("buckets", &self.buckets.len())
            .field("key_width", &self.key_stride)
            .field("value_width", &self.val_width)
            .finish()
    }
}

/// Bucket-then-chain walk shared by the iterators.
struct Cursor {
    bucket: usize,
    cur: Option<DefaultKey>,
    remaining: usize,
}

impl Cursor {
    fn new(remaining: usize) -> Self {
        Self {
            bucket: 0,
            cur: None,
            remaining,
        }
    }

    fn advance<'a>(
        &mut self,
        buckets: &[Chain],
        nodes: &'a SlotMap<DefaultKey, Node>,
    ) -> Option<(DefaultKey, &'a Node)> {
        loop {
            if let Some(k) = self.cur {
                let node = &nodes[k];
                self.cur = node.next;
                self.remaining -= 1;
                return Some((k, node));
            }
            let chain = buckets.get(self.bucket)?;
            self.cur = chain.head;
            self.bucket += 1;
        }
    }
}

/// Iterator over `(handle, key slot, value)`.
pub struct Iter<'a, K: ?Sized + DictKey, A: DictAlloc = System> {
    dict: &'a Dict<K, A>,
    cursor: Cursor,
}

impl<'a, K: ?Sized + DictKey, A: DictAlloc> Iterator for Iter<'a, K, A> {
    type Item = (Handle, &'a [u8], &'a [u8]);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let dict = self.dict;
        let (k, node) = self.cursor.advance(&dict.buckets, &dict.nodes)?;
        Some((Handle(k), dict.key_of(node), dict.value_of(node)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.cursor.remaining, Some(self.cursor.remaining))
    }
}

impl<K: ?Sized + DictKey, A: DictAlloc> ExactSizeIterator for Iter<'_, K, A> {}

/// Iterator over `(handle, key slot, mutable value)`.
pub struct IterMut<'a, K: ?Sized + DictKey, A: DictAlloc = System> {
    dict: &'a Dict<K, A>,
    cursor: Cursor,
    _pd: PhantomData<&'a mut [u8]>,
}

impl<'a, K: ?Sized + DictKey, A: DictAlloc> Iterator for IterMut<'a, K, A> {
    type Item = (Handle, &'a [u8], &'a mut [u8]);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let dict = self.dict;
        let (k, node) = self.cursor.advance(&dict.buckets, &dict.nodes)?;
        // SAFETY: built from `&mut Dict`; each node is yielded once and
        // blocks never overlap.
        let value = unsafe { dict.value_of_mut(node) };
        Some((Handle(k), dict.key_of(node), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.cursor.remaining, Some(self.cursor.remaining))
    }
}

impl<K: ?Sized + DictKey, A: DictAlloc> ExactSizeIterator for IterMut<'_, K, A> {}

/// Snapshot of raw key slots, released through the table allocator on drop.
pub struct RawKeys<'a, A: DictAlloc> {
    ptr: NonNull<u8>,
    count: usize,
    stride: usize,
    alloc: &'a A,
}

impl<A: DictAlloc> RawKeys<'_, A> {
    /// Number of keys.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Bytes per slot.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// All slots back to back.
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: `count * stride` bytes were allocated and filled.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.count * self.stride) }
    }

    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.iter().nth(index)
    }

    pub fn iter(&self) -> slice::ChunksExact<'_, u8> {
        self.as_bytes().chunks_exact(self.stride)
    }
}

impl<A: DictAlloc> Drop for RawKeys<'_, A> {
    fn drop(&mut self) {
        if self.alloc.reclaims() {
            // SAFETY: allocated in `Dict::raw_keys` with this size.
            unsafe { self.alloc.deallocate(self.ptr, self.count * self.stride) };
        }
    }
}

impl<A: DictAlloc> fmt::Debug for RawKeys<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawKeys")
            .field("len", &self.count)
            .field("stride", &self.stride)
            .finish()
    }
}
