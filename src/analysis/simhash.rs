//! 64-bit simhash content fingerprinting
//!
//! Near-identical texts hash to near-identical values, so approximate
//! duplicate detection reduces to comparing bit distances instead of full
//! texts.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const BITS: u32 = 64;

/// Computes the 64-bit simhash fingerprint of a text
///
/// Each whitespace token votes on every bit position according to its own
/// hash; positions with a positive vote sum become 1-bits.
pub fn fingerprint(text: &str) -> u64 {
    let mut weights = [0i64; BITS as usize];

    for token in text.split_whitespace() {
        let hash = hash_token(token);
        for (bit, weight) in weights.iter_mut().enumerate() {
            if hash >> bit & 1 == 1 {
                *weight += 1;
            } else {
                *weight -= 1;
            }
        }
    }

    let mut result = 0u64;
    for (bit, weight) in weights.iter().enumerate() {
        if *weight > 0 {
            result |= 1 << bit;
        }
    }
    result
}

/// Similarity of two fingerprints in `[0, 1]`
///
/// Defined as the fraction of agreeing bits: identical fingerprints score
/// exactly 1.
pub fn similarity(a: u64, b: u64) -> f64 {
    1.0 - (a ^ b).count_ones() as f64 / BITS as f64
}

fn hash_token(token: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    hasher.finish()
}
