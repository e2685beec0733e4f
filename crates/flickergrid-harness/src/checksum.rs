#![forbid(unsafe_code)]

//! Frame checksums.

use flickergrid_core::{PixelSurface, RasterSurface};

const CHECKSUM_PREFIX: &str = "fnv1a64:";
const FNV64_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV64_PRIME: u64 = 0x100000001b3;

#[inline]
fn fnv1a64_extend(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV64_PRIME);
    }
    hash
}

/// Hash the backing-store size and every pixel.
///
/// Stable across platforms: pixels are hashed as big-endian `0xRRGGBBAA`.
pub fn frame_checksum(surface: &PixelSurface) -> String {
    let (w, h) = surface.backing_size();
    let mut hash = FNV64_OFFSET_BASIS;
    hash = fnv1a64_extend(hash, &w.to_le_bytes());
    hash = fnv1a64_extend(hash, &h.to_le_bytes());
    for px in surface.pixels() {
        hash = fnv1a64_extend(hash, &px.0.to_be_bytes());
    }
    format!("{CHECKSUM_PREFIX}{hash:016x}")
}
