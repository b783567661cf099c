use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::constants::sampler::EPOCH_SEED_OFFSET;
use crate::types::EpochNumber;

pub fn stable_hash_with(f: impl FnOnce(&mut DefaultHasher)) -> u64 {
    let mut hasher = DefaultHasher::new();
    f(&mut hasher);
    hasher.finish()
}

/// Seed for one epoch, stable across processes for the same `(seed, epoch)`.
pub fn epoch_seed(seed: u64, epoch: EpochNumber) -> u64 {
    stable_hash_with(|hasher| {
        seed.hash(hasher);
        EPOCH_SEED_OFFSET.hash(hasher);
        epoch.hash(hasher);
    })
}
