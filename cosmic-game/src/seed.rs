//! Seed handling: the FNV-1a digest, the per-round generator built on it,
//! and fresh seed generation.
//!
//! The generator is intentionally non-cryptographic. A meet's picks must be
//! replayable from `(seed, round)` alone, so the value for a round is a pure
//! function of those two inputs and never of any hidden generator state.

use rand::RngCore;

use crate::constants::{FNV32_OFFSET_BASIS, FNV32_PRIME, RNG_NORMALIZER};

/// 32-bit FNV-1a over the UTF-16 code units of `text`.
#[must_use]
pub fn fnv1a32(text: &str) -> u32 {
    let mut hash = FNV32_OFFSET_BASIS;
    for unit in text.encode_utf16() {
        hash = (hash ^ u32::from(unit)).wrapping_mul(FNV32_PRIME);
    }
    hash
}

/// Deterministic draw in `[0, 1)` for `round` of the meet seeded with `seed`.
#[must_use]
pub fn rng(seed: &str, round: u32) -> f64 {
    let digest = fnv1a32(&format!("{seed}:{round}"));
    f64::from(digest) / RNG_NORMALIZER
}

/// Produce a fresh opaque seed from the current time and caller entropy.
///
/// The time component keeps seeds roughly ordered; the random suffix keeps
/// meets created within the same millisecond apart.
pub fn make_seed<R: RngCore + ?Sized>(now_ms: i64, entropy: &mut R) -> String {
    let mut seed = to_base36(now_ms.unsigned_abs());
    seed.push_str(&to_base36(entropy.next_u64()));
    seed
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::with_capacity(13);
    while value > 0 {
        buf.push(DIGITS[usize::try_from(value % 36).unwrap_or(0)]);
        value /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap_or_default()
}
