/// Constants used by sampler construction and validation.
pub mod sampler {
    /// Smallest accepted number of labels per batch (P).
    pub const MIN_LABELS_PER_BATCH: usize = 2;
    /// Smallest accepted number of instances per label (K).
    pub const MIN_INSTANCES_PER_LABEL: usize = 2;
    /// Every label needs this many occurrences so a batch always holds a positive pair.
    pub const MIN_OCCURRENCES_PER_LABEL: usize = 2;
    /// Remainder of `n_labels % p` that triggers dropping one label per epoch.
    pub const DROP_ONE_REMAINDER: usize = 1;
    /// Offset mixed into epoch RNG seed derivation for deterministic variation.
    pub const EPOCH_SEED_OFFSET: u64 = 0xB4C3_5EED;
}

/// Defaults for `BalancedSamplerConfig`.
///
/// P=32 and K=4 follow the person re-identification setting from
/// "In Defense of the Triplet Loss for Person Re-Identification".
pub mod config {
    /// Default number of labels per batch.
    pub const DEFAULT_LABELS_PER_BATCH: usize = 32;
    /// Default number of instances per label.
    pub const DEFAULT_INSTANCES_PER_LABEL: usize = 4;
    /// Default RNG seed.
    pub const DEFAULT_SEED: u64 = 42;
}
