use rand::Rng;
use rand::seq::{SliceRandom, index};
use std::fmt::Debug;
use std::hash::Hash;
use std::iter::FusedIterator;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

use crate::config::BalancedSamplerConfig;
use crate::constants::sampler::{MIN_INSTANCES_PER_LABEL, MIN_LABELS_PER_BATCH};
use crate::errors::SamplerError;
use crate::label_index::LabelIndex;
use crate::rng::DeterministicRng;
use crate::shape::EpochShape;
use crate::types::{DatasetIndex, EpochNumber, IndexBatch};

/// Epoch-indexed sampling interface consumed by data loaders.
///
/// `epoch_iter(n)` is a pure function of the sampler and `n`, so a loader can
/// replay or resume any epoch.
pub trait EpochSampler: Send + Sync {
    /// Handle yielded per step (an index batch or a single dataset index).
    type Item: Send;

    /// Number of items yielded by one epoch.
    fn len(&self) -> usize;

    /// True when an epoch yields nothing.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterator over one epoch.
    fn epoch_iter(&self, epoch: EpochNumber) -> Box<dyn Iterator<Item = Self::Item> + Send + '_>;
}

/// Yields batches holding P distinct labels with K instances each.
///
/// Each epoch draws labels without replacement until the pool is exhausted,
/// so every label appears at most once per epoch and the last batch may hold
/// fewer (but at least two) labels. Corner cases:
/// - a label with fewer than K instances contributes all of them once, then
///   repeats randomly chosen ones until it reaches K;
/// - when `n_labels % p == 1` one label is left undrawn for the epoch.
///
/// This is the batch layout of "In Defense of the Triplet Loss for Person
/// Re-Identification" (P=32, K=4).
///
/// ```
/// use balanced_sampler::BalancedBatchSampler;
///
/// let sampler = BalancedBatchSampler::new(vec![0, 1, 2, 3, 0, 1, 2, 3], 2, 2).unwrap();
/// assert_eq!(sampler.batch_size(), 4);
/// assert_eq!(sampler.len(), 2);
/// for batch in sampler.iter() {
///     assert_eq!(batch.len(), 4);
/// }
/// ```
#[derive(Debug)]
pub struct BalancedBatchSampler<L> {
    index: LabelIndex<L>,
    shape: EpochShape,
    seed: u64,
    next_epoch: AtomicU64,
}

impl<L> BalancedBatchSampler<L>
where
    L: Eq + Hash + Debug,
{
    /// Build a sampler for `p` labels per batch and `k` instances per label,
    /// using the default seed.
    pub fn new<I>(labels: I, p: usize, k: usize) -> Result<Self, SamplerError>
    where
        I: IntoIterator<Item = L>,
    {
        Self::from_config(labels, &BalancedSamplerConfig::new(p, k))
    }

    /// Build a sampler from a configuration. `labels[i]` is the label of dataset item `i`.
    pub fn from_config<I>(labels: I, config: &BalancedSamplerConfig) -> Result<Self, SamplerError>
    where
        I: IntoIterator<Item = L>,
    {
        let index = LabelIndex::from_labels(labels)?;
        let n_labels = index.n_labels();
        let p = config.labels_per_batch;
        let k = config.instances_per_label;
        if p < MIN_LABELS_PER_BATCH || p > n_labels {
            return Err(SamplerError::InvalidLabelsPerBatch { p, n_labels });
        }
        if k < MIN_INSTANCES_PER_LABEL {
            return Err(SamplerError::InvalidInstancesPerLabel { k });
        }

        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let shape = EpochShape::new(n_labels, p, k);
        debug!(
            n_labels,
            dataset_len = index.dataset_len(),
            p,
            k,
            labels_per_epoch = shape.labels_per_epoch(),
            batches_in_epoch = shape.batches_in_epoch(),
            seed,
            "balanced batch sampler ready"
        );
        if shape.drops_label() {
            debug!(
                n_labels,
                p, "n_labels % p == 1; one label is left out of every epoch"
            );
        }
        let short = index.labels_below(k);
        if short > 0 {
            debug!(
                labels = short,
                k, "labels with fewer than k instances are sampled with repetition"
            );
        }

        Ok(Self {
            index,
            shape,
            seed,
            next_epoch: AtomicU64::new(0),
        })
    }
}

impl<L> BalancedBatchSampler<L> {
    /// Size a data loader should use for one yielded batch (P * K).
    pub fn batch_size(&self) -> usize {
        self.shape.batch_size()
    }

    /// Number of batches per epoch.
    pub fn batches_in_epoch(&self) -> usize {
        self.shape.batches_in_epoch()
    }

    /// Alias of [`Self::batches_in_epoch`].
    pub fn len(&self) -> usize {
        self.batches_in_epoch()
    }

    /// Always false: a valid sampler yields at least one batch.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Labels drawn per epoch (`n_labels`, or one fewer when a label is dropped).
    pub fn labels_per_epoch(&self) -> usize {
        self.shape.labels_per_epoch()
    }

    pub fn n_labels(&self) -> usize {
        self.shape.n_labels()
    }

    /// P.
    pub fn labels_per_batch(&self) -> usize {
        self.shape.labels_per_batch()
    }

    /// K.
    pub fn instances_per_label(&self) -> usize {
        self.shape.instances_per_label()
    }

    pub fn shape(&self) -> EpochShape {
        self.shape
    }

    /// Seed used to derive per-epoch randomness.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn label_index(&self) -> &LabelIndex<L> {
        &self.index
    }

    /// Epoch number the next [`Self::iter`] call will draw.
    pub fn current_epoch(&self) -> EpochNumber {
        self.next_epoch.load(Ordering::Relaxed)
    }

    /// Reposition the epoch counter, e.g. when resuming a run.
    pub fn set_epoch(&self, epoch: EpochNumber) {
        self.next_epoch.store(epoch, Ordering::Relaxed);
    }

    /// Draw the next epoch and advance the epoch counter.
    pub fn iter(&self) -> BalancedBatches<'_, L, DeterministicRng> {
        let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);
        self.epoch(epoch)
    }

    /// Draw a specific epoch. The same `(seed, epoch)` always yields the same batches.
    pub fn epoch(&self, epoch: EpochNumber) -> BalancedBatches<'_, L, DeterministicRng> {
        trace!(epoch, "starting balanced epoch");
        self.iter_with_rng(DeterministicRng::for_epoch(self.seed, epoch))
    }

    /// Draw an epoch from a caller-supplied random source.
    pub fn iter_with_rng<R: Rng>(&self, rng: R) -> BalancedBatches<'_, L, R> {
        BalancedBatches {
            index: &self.index,
            shape: self.shape,
            rng,
            pool: (0..self.shape.n_labels()).collect(),
            remaining: self.shape.batches_in_epoch(),
            drawn: 0,
        }
    }
}

impl<'a, L> IntoIterator for &'a BalancedBatchSampler<L> {
    type Item = IndexBatch;
    type IntoIter = BalancedBatches<'a, L, DeterministicRng>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<L> EpochSampler for BalancedBatchSampler<L>
where
    L: Send + Sync,
{
    type Item = IndexBatch;

    fn len(&self) -> usize {
        self.batches_in_epoch()
    }

    fn epoch_iter(
        &self,
        epoch: EpochNumber,
    ) -> Box<dyn Iterator<Item = IndexBatch> + Send + '_> {
        Box::new(self.epoch(epoch))
    }
}

/// One epoch of balanced batches.
///
/// Owns its pool of labels not yet drawn, so several epochs can be iterated
/// side by side over one sampler.
#[derive(Debug)]
pub struct BalancedBatches<'a, L, R> {
    index: &'a LabelIndex<L>,
    shape: EpochShape,
    rng: R,
    /// Label slots (first-appearance positions) not drawn yet this epoch.
    pool: Vec<usize>,
    remaining: usize,
    drawn: usize,
}

impl<L, R> BalancedBatches<'_, L, R> {
    /// Labels still in the pool.
    pub fn labels_remaining(&self) -> usize {
        self.pool.len()
    }
}

impl<L, R: Rng> Iterator for BalancedBatches<'_, L, R> {
    type Item = IndexBatch;

    fn next(&mut self) -> Option<IndexBatch> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let k = self.shape.instances_per_label();
        let take = self.shape.labels_per_batch().min(self.pool.len());
        let slots = draw_labels(&mut self.pool, take, &mut self.rng);
        let label_index = self.index;
        let mut batch = Vec::with_capacity(slots.len() * k);
        for slot in &slots {
            select_instances(label_index.indices_at(*slot), k, &mut self.rng, &mut batch);
        }

        self.drawn += 1;
        trace!(
            batch = self.drawn,
            labels = slots.len(),
            len = batch.len(),
            labels_remaining = self.pool.len(),
            "drew balanced batch"
        );
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<L, R: Rng> ExactSizeIterator for BalancedBatches<'_, L, R> {}

impl<L, R: Rng> FusedIterator for BalancedBatches<'_, L, R> {}

/// Remove `take` uniformly chosen slots from `pool`, returned in draw order.
fn draw_labels<R: Rng + ?Sized>(pool: &mut Vec<usize>, take: usize, rng: &mut R) -> Vec<usize> {
    let mut positions = index::sample(rng, pool.len(), take).into_vec();
    let slots = positions.iter().map(|&pos| pool[pos]).collect();
    // Highest position first so swap_remove never moves a still-pending position.
    positions.sort_unstable_by(|a, b| b.cmp(a));
    for pos in positions {
        pool.swap_remove(pos);
    }
    slots
}

/// Append exactly `k` indices of one label to `out` as a contiguous group.
///
/// With at least `k` indices the draw is without replacement. Otherwise every
/// index is taken once (shuffled) and the shortfall is drawn with replacement.
fn select_instances<R: Rng + ?Sized>(
    indices: &[DatasetIndex],
    k: usize,
    rng: &mut R,
    out: &mut IndexBatch,
) {
    if indices.len() >= k {
        out.extend(
            index::sample(rng, indices.len(), k)
                .iter()
                .map(|pos| indices[pos]),
        );
        return;
    }
    if indices.is_empty() {
        return;
    }
    let start = out.len();
    out.extend_from_slice(indices);
    out[start..].shuffle(rng);
    for _ in indices.len()..k {
        out.push(indices[rng.random_range(0..indices.len())]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::{HashMap, HashSet};

    fn label_counts(labels: &[u32], batch: &[usize]) -> HashMap<u32, usize> {
        let mut counts = HashMap::new();
        for &idx in batch {
            *counts.entry(labels[idx]).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn draw_labels_removes_exactly_the_drawn_slots() {
        let mut rng = StdRng::from_seed([1_u8; 32]);
        let mut pool: Vec<usize> = (0..10).collect();
        let slots = draw_labels(&mut pool, 4, &mut rng);
        assert_eq!(slots.len(), 4);
        assert_eq!(pool.len(), 6);
        let drawn: HashSet<usize> = slots.iter().copied().collect();
        assert_eq!(drawn.len(), 4);
        assert!(pool.iter().all(|slot| !drawn.contains(slot)));
        let mut all: Vec<usize> = pool.iter().chain(slots.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn draw_labels_can_empty_the_pool() {
        let mut rng = StdRng::from_seed([2_u8; 32]);
        let mut pool = vec![7, 8, 9];
        let mut slots = draw_labels(&mut pool, 3, &mut rng);
        slots.sort_unstable();
        assert_eq!(slots, vec![7, 8, 9]);
        assert!(pool.is_empty());
    }

    #[test]
    fn select_instances_without_replacement_when_enough() {
        let mut rng = StdRng::from_seed([3_u8; 32]);
        let indices = [10, 11, 12, 13, 14];
        let mut out = vec![99];
        select_instances(&indices, 3, &mut rng, &mut out);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], 99);
        let picked: HashSet<usize> = out[1..].iter().copied().collect();
        assert_eq!(picked.len(), 3);
        assert!(picked.iter().all(|idx| indices.contains(idx)));
    }

    #[test]
    fn select_instances_repeats_when_short() {
        let mut rng = StdRng::from_seed([4_u8; 32]);
        let indices = [3, 7];
        let mut out = Vec::new();
        select_instances(&indices, 3, &mut rng, &mut out);
        assert_eq!(out.len(), 3);
        assert!(out.contains(&3));
        assert!(out.contains(&7));
        let distinct: HashSet<usize> = out.iter().copied().collect();
        assert_eq!(distinct.len(), 2);
    }

    #[test]
    fn ideal_case_uses_every_label_once() {
        let labels = vec![0_u32, 1, 2, 3, 0, 1, 2, 3];
        let sampler = BalancedBatchSampler::new(labels.clone(), 2, 2).unwrap();
        assert_eq!(sampler.len(), 2);
        assert_eq!(sampler.batch_size(), 4);
        let batches: Vec<IndexBatch> = sampler.iter().collect();
        assert_eq!(batches.len(), 2);
        let mut seen = HashSet::new();
        for batch in &batches {
            assert_eq!(batch.len(), 4);
            let counts = label_counts(&labels, batch);
            assert_eq!(counts.len(), 2);
            assert!(counts.values().all(|count| *count == 2));
            seen.extend(counts.keys().copied());
        }
        assert_eq!(seen, HashSet::from([0, 1, 2, 3]));
    }

    #[test]
    fn remainder_one_drops_exactly_one_label() {
        let labels = vec![0_u32, 1, 2, 3, 0, 1, 2, 3];
        let sampler = BalancedBatchSampler::new(labels.clone(), 3, 2).unwrap();
        assert_eq!(sampler.labels_per_epoch(), 3);
        assert_eq!(sampler.len(), 1);
        for epoch in 0..10 {
            let batches: Vec<IndexBatch> = sampler.epoch(epoch).collect();
            assert_eq!(batches.len(), 1);
            let counts = label_counts(&labels, &batches[0]);
            assert_eq!(counts.len(), 3);
            assert!(counts.values().all(|count| *count == 2));
        }
    }

    #[test]
    fn short_label_gets_one_duplicate() {
        let labels = vec![0_u32, 1, 2, 3, 0, 1, 2, 3, 0, 1, 2];
        let sampler = BalancedBatchSampler::new(labels.clone(), 2, 3).unwrap();
        let mut checked = false;
        for batch in sampler.epoch(0) {
            let group: Vec<usize> = batch
                .iter()
                .copied()
                .filter(|idx| labels[*idx] == 3)
                .collect();
            if group.is_empty() {
                continue;
            }
            checked = true;
            assert_eq!(group.len(), 3);
            assert!(group.contains(&3));
            assert!(group.contains(&7));
            let distinct: HashSet<usize> = group.iter().copied().collect();
            assert_eq!(distinct.len(), 2);
        }
        assert!(checked, "label 3 must be drawn once per epoch");
    }

    #[test]
    fn construction_rejects_invalid_settings() {
        let labels = vec![0_u32, 1, 2, 3, 0, 1, 2, 3];
        assert!(matches!(
            BalancedBatchSampler::new(labels.clone(), 1, 2),
            Err(SamplerError::InvalidLabelsPerBatch { p: 1, n_labels: 4 })
        ));
        assert!(matches!(
            BalancedBatchSampler::new(labels.clone(), 5, 2),
            Err(SamplerError::InvalidLabelsPerBatch { p: 5, n_labels: 4 })
        ));
        assert!(matches!(
            BalancedBatchSampler::new(labels.clone(), 2, 1),
            Err(SamplerError::InvalidInstancesPerLabel { k: 1 })
        ));
        assert!(matches!(
            BalancedBatchSampler::new(vec![0_u32, 1, 2, 0, 1], 2, 2),
            Err(SamplerError::UnderrepresentedLabel { count: 1, .. })
        ));
        assert!(matches!(
            BalancedBatchSampler::new(Vec::<u32>::new(), 2, 2),
            Err(SamplerError::Configuration(_))
        ));
    }

    #[test]
    fn seeded_epochs_are_reproducible() {
        let labels: Vec<u32> = (0..40).map(|idx| idx % 10).collect();
        let config = BalancedSamplerConfig::new(3, 2).with_seed(7);
        let a = BalancedBatchSampler::from_config(labels.clone(), &config).unwrap();
        let b = BalancedBatchSampler::from_config(labels, &config).unwrap();
        let first: Vec<IndexBatch> = a.epoch(5).collect();
        let second: Vec<IndexBatch> = b.epoch(5).collect();
        assert_eq!(first, second);
        let other: Vec<IndexBatch> = a.epoch(6).collect();
        assert_ne!(first, other);
    }

    #[test]
    fn iter_advances_epoch_counter() {
        let labels: Vec<u32> = (0..40).map(|idx| idx % 10).collect();
        let sampler = BalancedBatchSampler::new(labels, 3, 2).unwrap();
        assert_eq!(sampler.current_epoch(), 0);
        let first: Vec<IndexBatch> = sampler.iter().collect();
        assert_eq!(sampler.current_epoch(), 1);
        let second: Vec<IndexBatch> = (&sampler).into_iter().collect();
        assert_eq!(sampler.current_epoch(), 2);
        assert_eq!(first, sampler.epoch(0).collect::<Vec<_>>());
        assert_eq!(second, sampler.epoch(1).collect::<Vec<_>>());

        sampler.set_epoch(0);
        assert_eq!(sampler.iter().collect::<Vec<_>>(), first);
    }

    #[test]
    fn iterator_reports_exact_size() {
        let labels: Vec<u32> = (0..24).map(|idx| idx % 8).collect();
        let sampler = BalancedBatchSampler::new(labels, 3, 2).unwrap();
        let mut batches = sampler.epoch(0);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches.labels_remaining(), 8);
        batches.next();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches.labels_remaining(), 5);
        batches.next();
        batches.next();
        assert_eq!(batches.len(), 0);
        assert_eq!(batches.labels_remaining(), 0);
        assert!(batches.next().is_none());
        assert!(batches.next().is_none());
    }

    #[test]
    fn injected_rng_drives_the_epoch() {
        let labels: Vec<u32> = (0..24).map(|idx| idx % 6).collect();
        let sampler = BalancedBatchSampler::new(labels, 2, 3).unwrap();
        let a: Vec<IndexBatch> = sampler.iter_with_rng(StdRng::seed_from_u64(5)).collect();
        let b: Vec<IndexBatch> = sampler.iter_with_rng(StdRng::seed_from_u64(5)).collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        assert!(a.iter().all(|batch| batch.len() == 6));
    }

    #[test]
    fn epoch_sampler_trait_matches_inherent_epoch() {
        let labels: Vec<u32> = (0..24).map(|idx| idx % 6).collect();
        let sampler = BalancedBatchSampler::new(labels, 4, 2).unwrap();
        let via_trait: Vec<IndexBatch> = EpochSampler::epoch_iter(&sampler, 3).collect();
        let direct: Vec<IndexBatch> = sampler.epoch(3).collect();
        assert_eq!(via_trait, direct);
        assert_eq!(EpochSampler::len(&sampler), 2);
        assert!(!EpochSampler::is_empty(&sampler));
    }

    #[test]
    fn unseeded_config_draws_a_seed() {
        let labels: Vec<u32> = (0..8).map(|idx| idx % 4).collect();
        let config = BalancedSamplerConfig {
            seed: None,
            ..BalancedSamplerConfig::new(2, 2)
        };
        let sampler = BalancedBatchSampler::from_config(labels, &config).unwrap();
        assert_eq!(sampler.len(), 2);
        assert_eq!(sampler.iter().count(), 2);
    }
}
