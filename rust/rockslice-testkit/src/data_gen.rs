//! Data generation utilities for testing.
//!
//! All generators are driven by a seeded `StdRng`, so a failing property test can be
//! replayed from its seed.

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Creates a deterministic random generator for the given seed.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Generates a random byte sequence with a length in `0..=max_len`.
pub fn random_bytes(rng: &mut impl Rng, max_len: usize) -> Vec<u8> {
    let len = rng.random_range(0..=max_len);
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes[..]);
    bytes
}

/// Generates `count` random byte sequences drawn from a small alphabet, so that
/// shared prefixes and duplicates (interesting cases for ordering) are frequent.
pub fn random_keys(seed: u64, count: usize, max_len: usize) -> Vec<Vec<u8>> {
    const ALPHABET: &[u8] = b"\x00\x01abz\xff";
    let mut rng = seeded_rng(seed);
    (0..count)
        .map(|_| {
            let len = rng.random_range(0..=max_len);
            (0..len)
                .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())])
                .collect()
        })
        .collect()
}

/// Generates a random string of `len` alphanumeric or multi-byte characters.
pub fn random_text(rng: &mut impl Rng, len: usize) -> String {
    const CHARS: &[char] = &['a', 'Z', '0', '_', 'é', 'ß', '中', '🦀'];
    (0..len)
        .map(|_| CHARS[rng.random_range(0..CHARS.len())])
        .collect()
}
