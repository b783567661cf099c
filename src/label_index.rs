use indexmap::IndexMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::constants::sampler::MIN_OCCURRENCES_PER_LABEL;
use crate::errors::SamplerError;
use crate::types::DatasetIndex;

/// Label -> dataset indices bearing that label.
///
/// Labels keep first-appearance order and each index list is ascending, so
/// the structure (and any seeded epoch drawn from it) does not depend on
/// hasher state. Built once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct LabelIndex<L> {
    groups: IndexMap<L, Vec<DatasetIndex>>,
    dataset_len: usize,
}

impl<L> LabelIndex<L>
where
    L: Eq + Hash + Debug,
{
    /// Group dataset positions by label and enforce the two-instance minimum.
    pub fn from_labels<I>(labels: I) -> Result<Self, SamplerError>
    where
        I: IntoIterator<Item = L>,
    {
        let mut groups: IndexMap<L, Vec<DatasetIndex>> = IndexMap::new();
        let mut dataset_len = 0;
        for (idx, label) in labels.into_iter().enumerate() {
            groups.entry(label).or_default().push(idx);
            dataset_len = idx + 1;
        }
        if groups.is_empty() {
            return Err(SamplerError::Configuration(
                "labels must not be empty".to_string(),
            ));
        }
        if let Some((label, indices)) = groups
            .iter()
            .find(|(_, indices)| indices.len() < MIN_OCCURRENCES_PER_LABEL)
        {
            return Err(SamplerError::UnderrepresentedLabel {
                label: format!("{label:?}"),
                count: indices.len(),
            });
        }
        Ok(Self {
            groups,
            dataset_len,
        })
    }
}

impl<L> LabelIndex<L> {
    /// Number of distinct labels.
    pub fn n_labels(&self) -> usize {
        self.groups.len()
    }

    /// Number of dataset items the index was built from (N).
    pub fn dataset_len(&self) -> usize {
        self.dataset_len
    }

    /// Indices for the label stored at `slot` (first-appearance position).
    pub(crate) fn indices_at(&self, slot: usize) -> &[DatasetIndex] {
        self.groups
            .get_index(slot)
            .map(|(_, indices)| indices.as_slice())
            .unwrap_or(&[])
    }

    /// Iterate labels with their index lists in first-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&L, &[DatasetIndex])> {
        self.groups
            .iter()
            .map(|(label, indices)| (label, indices.as_slice()))
    }

    /// Iterate distinct labels in first-appearance order.
    pub fn labels(&self) -> impl Iterator<Item = &L> {
        self.groups.keys()
    }

    /// Smallest per-label instance count.
    pub fn min_count(&self) -> usize {
        self.groups.values().map(Vec::len).min().unwrap_or(0)
    }

    /// Number of labels holding fewer than `k` instances (sampled with repetition).
    pub fn labels_below(&self, k: usize) -> usize {
        self.groups.values().filter(|indices| indices.len() < k).count()
    }
}

impl<L> LabelIndex<L>
where
    L: Eq + Hash,
{
    /// Indices bearing `label`, if present.
    pub fn get(&self, label: &L) -> Option<&[DatasetIndex]> {
        self.groups.get(label).map(Vec::as_slice)
    }

    /// True when `label` occurs in the dataset.
    pub fn contains(&self, label: &L) -> bool {
        self.groups.contains_key(label)
    }
}
