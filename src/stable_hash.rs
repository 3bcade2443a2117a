//! Per-trial RNG seeds.
//!
//! A trial's seed depends only on the run seed, the label of its (algorithm,
//! arm configuration) pair, and its iteration number. Thread scheduling plays
//! no part, so a rerun replays every trial exactly, and different pairs or
//! iterations draw from unrelated streams. Not cryptographic.

/// Hash `label` into a 64-bit value under `seed`.
///
/// The result is fixed across platforms and releases, which `std`'s
/// `DefaultHasher` does not promise. Published results depend on it.
#[must_use]
pub fn stable_hash64(seed: u64, label: &str) -> u64 {
    splitmix64(seed ^ fnv1a(label.as_bytes()))
}

/// Seed of iteration `iteration` of the pair labelled `label`.
#[must_use]
pub fn trial_seed(run_seed: u64, label: &str, iteration: u32) -> u64 {
    splitmix64(stable_hash64(run_seed, label) ^ u64::from(iteration).wrapping_mul(0x9E37_79B9))
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |h: u64, &b| {
        (h ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

/// SplitMix64 finalizer, for diffusion of the FNV output.
#[inline]
fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
