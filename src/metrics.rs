use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::types::IndexBatch;

/// Composition of one sampled batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchComposition {
    /// Distinct labels in the batch.
    pub labels: usize,
    /// Number of indices in the batch.
    pub len: usize,
    /// Every label occupies a single contiguous run.
    pub contiguous: bool,
    /// Every label contributes exactly `k` indices.
    pub balanced: bool,
    /// Indices that occur more than once in the batch (repetition fill-ins).
    pub repeated: usize,
}

/// Aggregate view of one sampled epoch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpochSummary {
    pub batches: usize,
    pub total_indices: usize,
    pub labels_in_data: usize,
    pub labels_sampled: usize,
    pub dropped_labels: usize,
    pub repeated_indices: usize,
    pub per_batch: Vec<BatchComposition>,
}

impl EpochSummary {
    /// At most one label was left out of the epoch.
    pub fn coverage_ok(&self) -> bool {
        self.dropped_labels <= 1
    }

    /// Every batch holds contiguous groups of exactly `k` indices per label.
    pub fn all_balanced(&self) -> bool {
        self.per_batch
            .iter()
            .all(|batch| batch.contiguous && batch.balanced)
    }
}

/// Summarize an epoch of `batches` drawn over `labels` with `k` instances per label.
///
/// Indices outside `labels` are ignored.
pub fn summarize_epoch<L>(labels: &[L], batches: &[IndexBatch], k: usize) -> EpochSummary
where
    L: Eq + Hash,
{
    let labels_in_data = labels.iter().collect::<HashSet<_>>().len();
    let mut sampled: HashSet<&L> = HashSet::new();
    let mut per_batch = Vec::with_capacity(batches.len());

    for batch in batches {
        let batch_labels: Vec<&L> = batch.iter().filter_map(|idx| labels.get(*idx)).collect();

        let mut counts: HashMap<&L, usize> = HashMap::new();
        for label in &batch_labels {
            *counts.entry(*label).or_insert(0) += 1;
        }
        let runs = batch_labels
            .iter()
            .enumerate()
            .filter(|(pos, label)| *pos == 0 || batch_labels[pos - 1] != **label)
            .count();
        let distinct_indices = batch.iter().collect::<HashSet<_>>().len();

        per_batch.push(BatchComposition {
            labels: counts.len(),
            len: batch.len(),
            contiguous: runs == counts.len(),
            balanced: counts.values().all(|count| *count == k),
            repeated: batch.len() - distinct_indices,
        });
        sampled.extend(counts.into_keys());
    }

    let labels_sampled = sampled.len();
    EpochSummary {
        batches: batches.len(),
        total_indices: batches.iter().map(Vec::len).sum(),
        labels_in_data,
        labels_sampled,
        dropped_labels: labels_in_data.saturating_sub(labels_sampled),
        repeated_indices: per_batch.iter().map(|batch| batch.repeated).sum(),
        per_batch,
    }
}
