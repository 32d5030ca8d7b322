//! Binary snapshot of a table.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! [u32 key width][u32 value width][u32 count]
//! non-text keys: count x (key slot, value)
//! text keys:     count x (u32 byte length, value), then every key's bytes
//!                back to back, without terminators
//! ```
//!
//! Widths are the padded in-memory widths, so a snapshot only loads on a
//! platform with the same word size. The widths are the only integrity check.

use crate::alloc::{DictAlloc, System};
use crate::dict::Dict;
use crate::error::DecodeError;
use crate::key::{text_bytes, DictKey, KeyAttr, KeyKind, ValueAttr};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::warn;

const HEADER_LEN: usize = 12;
const TEXT_LEN_FIELD: usize = 4;

fn to_u32(n: usize, what: &str) -> u32 {
    match u32::try_from(n) {
        Ok(v) => v,
        Err(_) => panic!("{what} {n} does not fit the snapshot header"),
    }
}

/// Split `n` bytes off the front of `buf`.
fn take<'a>(buf: &mut &'a [u8], n: usize) -> Result<&'a [u8], DecodeError> {
    if buf.len() < n {
        return Err(DecodeError::Truncated {
            needed: n,
            available: buf.len(),
        });
    }
    let (head, rest) = buf.split_at(n);
    *buf = rest;
    Ok(head)
}

impl<K: ?Sized + DictKey, A: DictAlloc> Dict<K, A> {
    /// Encode every entry, in [`Dict::keys`] order.
    pub fn serialize(&self) -> Bytes {
        let count = self.len();
        let key_width = self.key_width();
        let val_width = self.value_width();
        let mut buf = BytesMut::with_capacity(HEADER_LEN + count * (key_width + val_width));
        buf.put_u32_le(to_u32(key_width, "key width"));
        buf.put_u32_le(to_u32(val_width, "value width"));
        buf.put_u32_le(to_u32(count, "entry count"));

        if K::KIND == KeyKind::Text {
            for (_, slot, value) in self.iter() {
                // SAFETY: text slots hold live duplicates.
                let text = unsafe { text_bytes(slot) };
                buf.put_u32_le(to_u32(text.len(), "text key length"));
                buf.put_slice(value);
            }
            for (_, slot, _) in self.iter() {
                // SAFETY: as above.
                buf.put_slice(unsafe { text_bytes(slot) });
            }
        } else {
            for (_, slot, value) in self.iter() {
                buf.put_slice(slot);
                buf.put_slice(value);
            }
        }
        buf.freeze()
    }

    /// Rebuild a table from [`Dict::serialize`] output, allocating through
    /// `alloc`. Keys are rehashed with `key`'s hooks, and a custom copy hook
    /// runs on every loaded key so the table owns what its destroy releases.
    pub fn deserialize_in(
        key: KeyAttr<K>,
        val: ValueAttr,
        data: &[u8],
        alloc: A,
    ) -> Result<Self, DecodeError> {
        let mut cur = data;
        let mut header = take(&mut cur, HEADER_LEN)?;
        let found_key = header.get_u32_le();
        let found_value = header.get_u32_le();
        let count = header.get_u32_le() as usize;

        let expected_key = key.slot_width();
        let expected_value = val.width();
        if found_key as usize != expected_key || found_value as usize != expected_value {
            warn!(
                expected_key,
                expected_value,
                found_key,
                found_value,
                "dict snapshot type conflict"
            );
            return Err(DecodeError::TypeConflict {
                expected_key,
                expected_value,
                found_key,
                found_value,
            });
        }

        let record = if K::KIND == KeyKind::Text {
            TEXT_LEN_FIELD + expected_value
        } else {
            expected_key + expected_value
        };
        let records_len = count
            .checked_mul(record)
            .ok_or(DecodeError::Truncated {
                needed: usize::MAX,
                available: cur.len(),
            })?;
        let records = take(&mut cur, records_len)?;

        let mut dict = Self::with_alloc(key, val, alloc);
        if K::KIND == KeyKind::Text {
            let mut texts = cur;
            for (index, mut rec) in records.chunks_exact(record).enumerate() {
                let len = rec.get_u32_le() as usize;
                let raw = take(&mut texts, len)?;
                let text = match core::str::from_utf8(raw) {
                    Ok(s) if !s.contains('\0') => s,
                    _ => return Err(DecodeError::InvalidText { index }),
                };
                dict.link_decoded(
                    |d, slot| KeyKind::Text.default_copy(text.as_bytes(), slot, d.allocator()),
                    rec,
                );
            }
        } else {
            for rec in records.chunks_exact(record) {
                let (raw_key, value) = rec.split_at(expected_key);
                dict.link_decoded(|d, slot| d.load_key(slot, raw_key), value);
            }
        }
        dict.settle_after_load();
        Ok(dict)
    }
}

impl<K: ?Sized + DictKey> Dict<K> {
    /// [`Dict::deserialize_in`] over the global allocator.
    pub fn deserialize(key: KeyAttr<K>, val: ValueAttr, data: &[u8]) -> Result<Self, DecodeError> {
        Self::deserialize_in(key, val, data, System)
    }
}
