#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Sampling configuration types.
pub mod config;
/// Centralized constants used across samplers and configuration.
pub mod constants;
/// Reusable example runners shared by downstream crates.
pub mod example_apps;
/// Flattened (single index sequence) balanced sampler.
pub mod flattened;
mod hash;
/// Label -> dataset index grouping.
pub mod label_index;
/// Epoch composition metrics.
pub mod metrics;
/// Deterministic random source used for seeded epochs.
pub mod rng;
/// Balanced batch sampler and the epoch sampling trait.
pub mod sampler;
/// Epoch geometry helpers.
pub mod shape;
/// Shared type aliases.
pub mod types;

mod errors;

pub use config::BalancedSamplerConfig;
pub use errors::SamplerError;
pub use flattened::{FlatIndices, FlattenedBalancedSampler};
pub use label_index::LabelIndex;
pub use metrics::{BatchComposition, EpochSummary, summarize_epoch};
pub use rng::DeterministicRng;
pub use sampler::{BalancedBatchSampler, BalancedBatches, EpochSampler};
pub use shape::EpochShape;
pub use types::{DatasetIndex, EpochNumber, IndexBatch, LabelName};
