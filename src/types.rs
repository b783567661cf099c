/// Position of an item in the wrapped dataset, in `0..N`.
/// Example: `17`
pub type DatasetIndex = usize;
/// One yielded batch: P contiguous groups of K dataset indices.
/// Example: `[4, 0, 9, 9, 1, 5]` for p=2, k=3
pub type IndexBatch = Vec<DatasetIndex>;
/// Epoch counter used to derive per-epoch randomness.
/// Example: `0` for the first epoch
pub type EpochNumber = u64;
/// Rendered label used in error messages and summaries.
/// Examples: `3`, `"person_0042"`
pub type LabelName = String;
