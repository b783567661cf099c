use serde::{Deserialize, Serialize};

use crate::constants::config::{
    DEFAULT_INSTANCES_PER_LABEL, DEFAULT_LABELS_PER_BATCH, DEFAULT_SEED,
};
use crate::errors::SamplerError;

/// Top-level balanced sampler configuration.
///
/// Validation against the label set happens when a sampler is built, since
/// `labels_per_batch` is bounded by the number of distinct labels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BalancedSamplerConfig {
    /// Number of distinct labels per batch (P). Must be > 1 and <= distinct labels.
    pub labels_per_batch: usize,
    /// Number of instances drawn per label in a batch (K). Must be > 1.
    pub instances_per_label: usize,
    /// RNG seed that controls deterministic epoch order.
    ///
    /// `None` draws a fresh seed from the thread RNG when the sampler is built.
    pub seed: Option<u64>,
}

impl BalancedSamplerConfig {
    /// Configuration for `p` labels and `k` instances with the default seed.
    pub fn new(labels_per_batch: usize, instances_per_label: usize) -> Self {
        Self {
            labels_per_batch,
            instances_per_label,
            ..Self::default()
        }
    }

    /// Override the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    ///
    /// ```
    /// use balanced_sampler::BalancedSamplerConfig;
    ///
    /// let config = BalancedSamplerConfig::from_json_str(
    ///     r#"{"labels_per_batch": 8, "instances_per_label": 4}"#,
    /// )
    /// .unwrap();
    /// assert_eq!(config.labels_per_batch, 8);
    /// ```
    pub fn from_json_str(raw: &str) -> Result<Self, SamplerError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Batch size a data loader should use with these settings (P * K).
    pub fn batch_size(&self) -> usize {
        self.labels_per_batch * self.instances_per_label
    }
}

impl Default for BalancedSamplerConfig {
    fn default() -> Self {
        Self {
            labels_per_batch: DEFAULT_LABELS_PER_BATCH,
            instances_per_label: DEFAULT_INSTANCES_PER_LABEL,
            seed: Some(DEFAULT_SEED),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_reid_setting() {
        let config = BalancedSamplerConfig::default();
        assert_eq!(config.labels_per_batch, 32);
        assert_eq!(config.instances_per_label, 4);
        assert_eq!(config.batch_size(), 128);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn json_missing_fields_use_defaults() {
        let config = BalancedSamplerConfig::from_json_str(r#"{"labels_per_batch": 3}"#).unwrap();
        assert_eq!(config.labels_per_batch, 3);
        assert_eq!(config.instances_per_label, 4);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn json_null_seed_means_unseeded() {
        let config = BalancedSamplerConfig::from_json_str(
            r#"{"labels_per_batch": 2, "instances_per_label": 2, "seed": null}"#,
        )
        .unwrap();
        assert_eq!(config.seed, None);
    }

    #[test]
    fn json_non_integer_is_configuration_error() {
        let err = BalancedSamplerConfig::from_json_str(r#"{"labels_per_batch": 2.5}"#)
            .unwrap_err();
        assert!(matches!(err, SamplerError::Configuration(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn json_unknown_field_is_rejected() {
        let err = BalancedSamplerConfig::from_json_str(r#"{"p": 2}"#).unwrap_err();
        assert!(matches!(err, SamplerError::Configuration(_)));
    }

    #[test]
    fn builder_overrides() {
        let config = BalancedSamplerConfig::new(4, 3).with_seed(9);
        assert_eq!(config.batch_size(), 12);
        assert_eq!(config.seed, Some(9));
    }
}
