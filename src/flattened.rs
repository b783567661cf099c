use rand::Rng;
use std::fmt::Debug;
use std::hash::Hash;
use std::iter::FusedIterator;

use crate::config::BalancedSamplerConfig;
use crate::errors::SamplerError;
use crate::rng::DeterministicRng;
use crate::sampler::{BalancedBatchSampler, BalancedBatches, EpochSampler};
use crate::types::{DatasetIndex, EpochNumber};

/// Balanced sampler that yields one flat index sequence per epoch.
///
/// The sequence is the concatenation of the wrapped sampler's batches in draw
/// order, for loaders that group indices into batches themselves (using
/// [`Self::batch_size`]).
#[derive(Debug)]
pub struct FlattenedBalancedSampler<L> {
    inner: BalancedBatchSampler<L>,
}

impl<L> FlattenedBalancedSampler<L>
where
    L: Eq + Hash + Debug,
{
    /// Same contract as [`BalancedBatchSampler::new`].
    pub fn new<I>(labels: I, p: usize, k: usize) -> Result<Self, SamplerError>
    where
        I: IntoIterator<Item = L>,
    {
        BalancedBatchSampler::new(labels, p, k).map(Self::from_batch_sampler)
    }

    /// Same contract as [`BalancedBatchSampler::from_config`].
    pub fn from_config<I>(labels: I, config: &BalancedSamplerConfig) -> Result<Self, SamplerError>
    where
        I: IntoIterator<Item = L>,
    {
        BalancedBatchSampler::from_config(labels, config).map(Self::from_batch_sampler)
    }
}

impl<L> FlattenedBalancedSampler<L> {
    pub fn from_batch_sampler(inner: BalancedBatchSampler<L>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &BalancedBatchSampler<L> {
        &self.inner
    }

    pub fn into_inner(self) -> BalancedBatchSampler<L> {
        self.inner
    }

    /// Indices yielded per epoch: `labels_per_epoch * k`.
    pub fn len(&self) -> usize {
        self.inner.shape().flattened_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn batch_size(&self) -> usize {
        self.inner.batch_size()
    }

    /// Draw the next epoch and advance the shared epoch counter.
    pub fn iter(&self) -> FlatIndices<'_, L, DeterministicRng> {
        self.flatten(self.inner.iter())
    }

    /// Draw a specific epoch; equals the concatenated batches of `inner().epoch(epoch)`.
    pub fn epoch(&self, epoch: EpochNumber) -> FlatIndices<'_, L, DeterministicRng> {
        self.flatten(self.inner.epoch(epoch))
    }

    /// Draw an epoch from a caller-supplied random source.
    pub fn iter_with_rng<R: Rng>(&self, rng: R) -> FlatIndices<'_, L, R> {
        self.flatten(self.inner.iter_with_rng(rng))
    }

    fn flatten<'a, R>(&self, batches: BalancedBatches<'a, L, R>) -> FlatIndices<'a, L, R> {
        FlatIndices {
            batches,
            current: Vec::new().into_iter(),
            remaining: self.len(),
        }
    }
}

impl<'a, L> IntoIterator for &'a FlattenedBalancedSampler<L> {
    type Item = DatasetIndex;
    type IntoIter = FlatIndices<'a, L, DeterministicRng>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<L> EpochSampler for FlattenedBalancedSampler<L>
where
    L: Send + Sync,
{
    type Item = DatasetIndex;

    fn len(&self) -> usize {
        FlattenedBalancedSampler::len(self)
    }

    fn epoch_iter(
        &self,
        epoch: EpochNumber,
    ) -> Box<dyn Iterator<Item = DatasetIndex> + Send + '_> {
        Box::new(self.epoch(epoch))
    }
}

/// Flat view over one epoch of balanced batches.
#[derive(Debug)]
pub struct FlatIndices<'a, L, R> {
    batches: BalancedBatches<'a, L, R>,
    current: std::vec::IntoIter<DatasetIndex>,
    remaining: usize,
}

impl<L, R: Rng> Iterator for FlatIndices<'_, L, R> {
    type Item = DatasetIndex;

    fn next(&mut self) -> Option<DatasetIndex> {
        loop {
            if let Some(idx) = self.current.next() {
                self.remaining = self.remaining.saturating_sub(1);
                return Some(idx);
            }
            self.current = self.batches.next()?.into_iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<L, R: Rng> ExactSizeIterator for FlatIndices<'_, L, R> {}

impl<L, R: Rng> FusedIterator for FlatIndices<'_, L, R> {}
