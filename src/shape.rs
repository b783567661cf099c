use crate::constants::sampler::DROP_ONE_REMAINDER;

/// Epoch geometry derived from the label count and the P x K settings.
///
/// Definitions:
/// - `labels_per_epoch`: `n_labels`, or `n_labels - 1` when `n_labels % p == 1`
///   (a trailing single-label batch would hold no negative pair, so that label is left out).
/// - `batches_in_epoch`: `ceil(labels_per_epoch / p)`.
/// - `batch_size`: `p * k`, the size of every batch but possibly the last.
/// - `flattened_len`: `labels_per_epoch * k`, indices yielded by one flattened epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochShape {
    n_labels: usize,
    labels_per_batch: usize,
    instances_per_label: usize,
    labels_per_epoch: usize,
}

impl EpochShape {
    /// Derive the shape. `labels_per_batch` must be non-zero; samplers validate it first.
    pub fn new(n_labels: usize, labels_per_batch: usize, instances_per_label: usize) -> Self {
        let labels_per_epoch = if n_labels % labels_per_batch == DROP_ONE_REMAINDER {
            n_labels - 1
        } else {
            n_labels
        };
        Self {
            n_labels,
            labels_per_batch,
            instances_per_label,
            labels_per_epoch,
        }
    }

    pub fn n_labels(&self) -> usize {
        self.n_labels
    }

    pub fn labels_per_batch(&self) -> usize {
        self.labels_per_batch
    }

    pub fn instances_per_label(&self) -> usize {
        self.instances_per_label
    }

    pub fn labels_per_epoch(&self) -> usize {
        self.labels_per_epoch
    }

    pub fn batches_in_epoch(&self) -> usize {
        self.labels_per_epoch.div_ceil(self.labels_per_batch)
    }

    pub fn batch_size(&self) -> usize {
        self.labels_per_batch * self.instances_per_label
    }

    pub fn flattened_len(&self) -> usize {
        self.labels_per_epoch * self.instances_per_label
    }

    /// True when one label is left undrawn every epoch.
    pub fn drops_label(&self) -> bool {
        self.labels_per_epoch < self.n_labels
    }

    /// Number of labels in the final batch of an epoch.
    pub fn last_batch_labels(&self) -> usize {
        match self.labels_per_epoch % self.labels_per_batch {
            0 => self.labels_per_batch.min(self.labels_per_epoch),
            rest => rest,
        }
    }
}
