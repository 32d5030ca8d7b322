//! Key kinds, their default hooks, and the key/value descriptors.
//!
//! A table stores every key in a fixed-width, word-padded *slot*. What the
//! slot holds depends on the [`KeyKind`]: the native-endian value for scalar
//! kinds, a pointer to an owned NUL-terminated duplicate for text, the raw
//! bytes for records. Each kind supplies a default copy, hash, equality and
//! release; [`KeyAttr`] lets callers override any of them independently.

use crate::alloc::{round_to_word, DictAlloc, WORD};
use core::borrow::Borrow;
use core::ffi::{c_char, CStr};
use core::fmt;
use core::ptr::{self, NonNull};

const HASH_BASE: u64 = 256;
const HASH_MOD: u64 = 1_000_000_007;

/// Closed set of key representations a table can be built over.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum KeyKind {
    /// Single byte character (`u8`).
    Char,
    /// Unicode scalar (`char`).
    WChar,
    I32,
    U32,
    F32,
    I64,
    U64,
    F64,
    /// Opaque address-sized handle (`*const ()`), never dereferenced.
    Ptr,
    /// Owned, NUL-terminated text (`str`).
    Text,
    /// Opaque fixed-width record (`[u8]`) whose width is given by the caller.
    Record,
}

impl KeyKind {
    /// Width of one key of this kind, or `None` for records.
    pub const fn natural_width(self) -> Option<usize> {
        match self {
            KeyKind::Char => Some(1),
            KeyKind::WChar | KeyKind::I32 | KeyKind::U32 | KeyKind::F32 => Some(4),
            KeyKind::I64 | KeyKind::U64 | KeyKind::F64 => Some(8),
            KeyKind::Ptr | KeyKind::Text => Some(WORD),
            KeyKind::Record => None,
        }
    }

    /// Default hash of a stored slot. `width` is the declared key width.
    ///
    /// Numeric kinds use the value itself (floats cast numerically, not by
    /// bit pattern); text and records use the polynomial byte hash.
    pub(crate) fn default_hash(self, slot: &[u8], width: usize) -> u64 {
        match self {
            KeyKind::Char => slot[0] as u64,
            KeyKind::WChar | KeyKind::U32 => u32::from_ne_bytes(word4(slot)) as u64,
            KeyKind::I32 => i32::from_ne_bytes(word4(slot)) as i64 as u64,
            KeyKind::F32 => f32::from_ne_bytes(word4(slot)) as u64,
            KeyKind::I64 => i64::from_ne_bytes(word8(slot)) as u64,
            KeyKind::U64 => u64::from_ne_bytes(word8(slot)),
            KeyKind::F64 => f64::from_ne_bytes(word8(slot)) as u64,
            KeyKind::Ptr => read_word(slot) as u64,
            // SAFETY: text slots always hold a live duplicate written by
            // `default_copy`; custom copies are rejected for text tables.
            KeyKind::Text => polynomial_hash(unsafe { text_bytes(slot) }),
            KeyKind::Record => polynomial_hash(&slot[..width]),
        }
    }

    /// Default equality of two stored slots.
    pub(crate) fn default_eq(self, a: &[u8], b: &[u8], width: usize) -> bool {
        match self {
            // SAFETY: see `default_hash`.
            KeyKind::Text => unsafe { text_bytes(a) == text_bytes(b) },
            _ => a[..width] == b[..width],
        }
    }

    /// Default deep copy of a caller key (`src`) into a zeroed slot.
    pub(crate) fn default_copy<A: DictAlloc + ?Sized>(self, src: &[u8], slot: &mut [u8], alloc: &A) {
        match self {
            KeyKind::Text => {
                assert!(
                    !src.contains(&0),
                    "text keys must not contain NUL bytes"
                );
                let buf = alloc.allocate(src.len() + 1);
                // SAFETY: `buf` holds len + 1 bytes; the slot is at least a word.
                unsafe {
                    ptr::copy_nonoverlapping(src.as_ptr(), buf.as_ptr(), src.len());
                    buf.as_ptr().add(src.len()).write(0);
                    ptr::write_unaligned(slot.as_mut_ptr().cast::<*mut u8>(), buf.as_ptr());
                }
            }
            _ => slot[..src.len()].copy_from_slice(src),
        }
    }
}

/// Order-dependent `code = code * 256 + byte (mod 1e9+7)`.
pub fn polynomial_hash(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |code, &b| (code * HASH_BASE + b as u64) % HASH_MOD)
}

#[inline]
fn word4(slot: &[u8]) -> [u8; 4] {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&slot[..4]);
    raw
}

#[inline]
fn word8(slot: &[u8]) -> [u8; 8] {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&slot[..8]);
    raw
}

#[inline]
fn read_word(slot: &[u8]) -> usize {
    let mut raw = [0u8; WORD];
    raw.copy_from_slice(&slot[..WORD]);
    usize::from_ne_bytes(raw)
}

/// Contents of the text duplicate a text slot points at, without the NUL.
///
/// # Safety
///
/// `slot` must have been filled by `KeyKind::Text.default_copy` and the
/// duplicate must not have been released.
pub(crate) unsafe fn text_bytes(slot: &[u8]) -> &[u8] {
    let p = ptr::read_unaligned(slot.as_ptr().cast::<*const c_char>());
    CStr::from_ptr(p).to_bytes()
}

/// Give a text slot's duplicate back to the allocator, when it reclaims.
///
/// # Safety
///
/// Same as [`text_bytes`]; the slot must not be used afterwards.
pub(crate) unsafe fn release_text<A: DictAlloc + ?Sized>(slot: &[u8], alloc: &A) {
    if !alloc.reclaims() {
        return;
    }
    let len = text_bytes(slot).len();
    let p = ptr::read_unaligned(slot.as_ptr().cast::<*mut u8>());
    alloc.deallocate(NonNull::new_unchecked(p), len + 1);
}

mod sealed {
    pub trait Sealed {}
}

/// Rust representation of a key kind.
///
/// Implemented for `u8`, `char`, `i32`, `u32`, `f32`, `i64`, `u64`, `f64`,
/// `*const ()`, `str` and `[u8]`; sealed because the set of kinds is closed.
pub trait DictKey: sealed::Sealed {
    const KIND: KeyKind;

    /// What `Dict::keys` hands back for this kind.
    type Owned: Borrow<Self>;

    /// Run `f` over the bytes the kind's default copy consumes: the
    /// native-endian value, the text contents, or the record itself.
    fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R;

    /// Rebuild an owned key from a stored slot.
    ///
    /// # Safety
    ///
    /// `slot` must come from a table of this kind; for text it must hold a
    /// live duplicate.
    #[doc(hidden)]
    unsafe fn decode(slot: &[u8], width: usize) -> Self::Owned;
}

macro_rules! scalar_key {
    ($($t:ty => $kind:ident),* $(,)?) => {$(
        impl sealed::Sealed for $t {}

        impl DictKey for $t {
            const KIND: KeyKind = KeyKind::$kind;
            type Owned = $t;

            #[inline]
            fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
                f(&self.to_ne_bytes())
            }

            #[inline]
            unsafe fn decode(slot: &[u8], _width: usize) -> $t {
                const N: usize = core::mem::size_of::<$t>();
                let mut raw = [0u8; N];
                raw.copy_from_slice(&slot[..N]);
                <$t>::from_ne_bytes(raw)
            }
        }
    )*};
}

scalar_key! {
    u8 => Char,
    i32 => I32,
    u32 => U32,
    f32 => F32,
    i64 => I64,
    u64 => U64,
    f64 => F64,
}

impl sealed::Sealed for char {}

impl DictKey for char {
    const KIND: KeyKind = KeyKind::WChar;
    type Owned = char;

    #[inline]
    fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&(*self as u32).to_ne_bytes())
    }

    unsafe fn decode(slot: &[u8], _width: usize) -> char {
        char::from_u32(u32::from_ne_bytes(word4(slot))).unwrap_or(char::REPLACEMENT_CHARACTER)
    }
}

impl sealed::Sealed for *const () {}

impl DictKey for *const () {
    const KIND: KeyKind = KeyKind::Ptr;
    type Owned = *const ();

    #[inline]
    fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&(*self as usize).to_ne_bytes())
    }

    unsafe fn decode(slot: &[u8], _width: usize) -> *const () {
        read_word(slot) as *const ()
    }
}

impl sealed::Sealed for str {}

impl DictKey for str {
    const KIND: KeyKind = KeyKind::Text;
    type Owned = String;

    #[inline]
    fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self.as_bytes())
    }

    unsafe fn decode(slot: &[u8], _width: usize) -> String {
        String::from_utf8_lossy(text_bytes(slot)).into_owned()
    }
}

impl sealed::Sealed for [u8] {}

impl DictKey for [u8] {
    const KIND: KeyKind = KeyKind::Record;
    type Owned = Vec<u8>;

    #[inline]
    fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self)
    }

    unsafe fn decode(slot: &[u8], width: usize) -> Vec<u8> {
        slot[..width].to_vec()
    }
}

/// Deep-copy a caller key into a zeroed slot.
pub type CopyFn<K> = fn(&mut [u8], &K);
/// Release whatever a slot owns (the slot memory itself belongs to the table).
pub type DestroyFn = fn(&mut [u8]);
/// Hash a stored slot.
pub type HashFn = fn(&[u8]) -> u64;
/// Compare two stored slots for equality.
pub type EqFn = fn(&[u8], &[u8]) -> bool;

/// Key descriptor: record width plus optional hook overrides.
///
/// ```
/// use kind_dict::{Dict, KeyAttr, ValueAttr};
///
/// // Case-insensitive 4-byte record keys.
/// fn fold(b: &[u8]) -> u64 {
///     b[..4].iter().fold(0, |h, c| h * 31 + c.to_ascii_lowercase() as u64)
/// }
/// fn same(a: &[u8], b: &[u8]) -> bool {
///     a[..4].eq_ignore_ascii_case(&b[..4])
/// }
/// let key = KeyAttr::record(4).with_hash(fold).with_eq(same);
/// let mut d: Dict<[u8]> = Dict::new(key, ValueAttr::new(8));
/// *d.get_as::<u64>(b"ABCD") = 1;
/// assert_eq!(*d.get_as::<u64>(b"abcd"), 1);
/// ```
pub struct KeyAttr<K: ?Sized> {
    pub(crate) record_width: Option<usize>,
    pub(crate) copy: Option<CopyFn<K>>,
    pub(crate) destroy: Option<DestroyFn>,
    pub(crate) hash: Option<HashFn>,
    pub(crate) eq: Option<EqFn>,
}

impl<K: ?Sized> KeyAttr<K> {
    /// Kind defaults, no overrides.
    pub const fn new() -> Self {
        Self {
            record_width: None,
            copy: None,
            destroy: None,
            hash: None,
            eq: None,
        }
    }

    /// Override the deep copy. Not supported for text keys.
    pub fn with_copy(mut self, copy: CopyFn<K>) -> Self {
        self.copy = Some(copy);
        self
    }

    /// Slot release hook; only consulted when a custom copy is also set.
    pub fn with_destroy(mut self, destroy: DestroyFn) -> Self {
        self.destroy = Some(destroy);
        self
    }

    pub fn with_hash(mut self, hash: HashFn) -> Self {
        self.hash = Some(hash);
        self
    }

    pub fn with_eq(mut self, eq: EqFn) -> Self {
        self.eq = Some(eq);
        self
    }
}

impl KeyAttr<[u8]> {
    /// Descriptor for opaque records of exactly `width` bytes.
    pub const fn record(width: usize) -> Self {
        let mut attr = Self::new();
        attr.record_width = Some(width);
        attr
    }
}

impl<K: ?Sized + DictKey> KeyAttr<K> {
    /// Declared width of one key.
    ///
    /// # Panics
    ///
    /// Panics for record keys without a non-zero width.
    pub fn width(&self) -> usize {
        match K::KIND.natural_width() {
            Some(w) => w,
            None => match self.record_width {
                Some(w) if w > 0 => w,
                _ => panic!("record keys need a non-zero width (use KeyAttr::record)"),
            },
        }
    }

    /// Width of a key slot: [`KeyAttr::width`] rounded up to a word.
    pub fn slot_width(&self) -> usize {
        round_to_word(self.width())
    }
}

impl<K: ?Sized> Default for KeyAttr<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ?Sized> Clone for KeyAttr<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: ?Sized> Copy for KeyAttr<K> {}

impl<K: ?Sized> fmt::Debug for KeyAttr<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyAttr")
            .field("record_width", &self.record_width)
            .field("copy", &self.copy.is_some())
            .field("destroy", &self.destroy.is_some())
            .field("hash", &self.hash.is_some())
            .field("eq", &self.eq.is_some())
            .finish()
    }
}

/// Value descriptor: byte width plus an optional release hook.
#[derive(Copy, Clone, Debug, Default)]
pub struct ValueAttr {
    pub(crate) size: usize,
    pub(crate) destroy: Option<DestroyFn>,
}

impl ValueAttr {
    pub const fn new(size: usize) -> Self {
        Self {
            size,
            destroy: None,
        }
    }

    /// Called on a value slot when its entry is removed or the table drops.
    pub fn with_destroy(mut self, destroy: DestroyFn) -> Self {
        self.destroy = Some(destroy);
        self
    }

    /// Stored width: the requested size rounded up to a word.
    pub fn width(&self) -> usize {
        round_to_word(self.size)
    }
}
