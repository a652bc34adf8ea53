//! FNV-1a hashing of frame contents.
//!
//! Hashes are for fast equality checks between two runs of the same
//! topology. They are not cryptographically secure.

use depot_frame::{FrameLayout, FrameSnapshot, SnapshotList};

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

#[inline]
fn fnv1a_byte(hash: u64, byte: u8) -> u64 {
    (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
}

#[inline]
fn fnv1a_u32(mut hash: u64, v: u32) -> u64 {
    for &b in &v.to_le_bytes() {
        hash = fnv1a_byte(hash, b);
    }
    hash
}

#[inline]
fn fnv1a_u64(mut hash: u64, v: u64) -> u64 {
    for &b in &v.to_le_bytes() {
        hash = fnv1a_byte(hash, b);
    }
    hash
}

/// Hash a frame table laid out per `layout`.
///
/// Every `f32` is hashed by its bit pattern, so `-0.0` and `0.0` differ and
/// NaNs compare by payload. The node kind index is folded in at each block
/// boundary. Cells past the layout's total length are ignored; a short
/// `data` hashes as if truncated.
pub fn frame_hash(layout: &FrameLayout, data: &[f32]) -> u64 {
    let mut hash = FNV_OFFSET;
    let mut offset = 0usize;
    for (kind, def) in layout.defs() {
        hash = fnv1a_u32(hash, kind.0 as u32);
        let len = def.rows as usize * def.attributes.len();
        let end = (offset + len).min(data.len());
        if offset < end {
            for &v in &data[offset..end] {
                hash = fnv1a_u32(hash, v.to_bits());
            }
        }
        offset += len;
    }
    hash
}

/// Hash one stored snapshot.
pub fn snapshot_hash(snapshot: &FrameSnapshot) -> u64 {
    frame_hash(snapshot.layout(), snapshot.data())
}

/// Hash every stored snapshot together with its index, oldest first.
pub fn snapshot_list_hash(list: &SnapshotList) -> u64 {
    let mut hash = FNV_OFFSET;
    for index in list.indices() {
        hash = fnv1a_u64(hash, index);
        if let Some(snap) = list.get(index) {
            hash = fnv1a_u64(hash, snapshot_hash(snap));
        }
    }
    hash
}
