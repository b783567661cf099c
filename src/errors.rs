use thiserror::Error;

/// Error type for sampler construction and configuration failures.
///
/// Every variant is raised while building a sampler; drawing an epoch never fails.
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("labels per batch must satisfy 1 < p <= {n_labels} (distinct labels), got p={p}")]
    InvalidLabelsPerBatch { p: usize, n_labels: usize },
    #[error("instances per label must satisfy k > 1, got k={k}")]
    InvalidInstancesPerLabel { k: usize },
    #[error("label {label} occurs {count} time(s); each label needs at least 2 instances")]
    UnderrepresentedLabel { label: String, count: usize },
}

impl SamplerError {
    /// True for invalid-argument failures. All current variants are.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::InvalidLabelsPerBatch { .. }
                | Self::InvalidInstancesPerLabel { .. }
                | Self::UnderrepresentedLabel { .. }
        )
    }
}

impl From<serde_json::Error> for SamplerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}
