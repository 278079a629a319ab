use thiserror::Error;

/// Errors reported by network construction, forward propagation and
/// training. All of them are input-validation failures raised before any
/// network state has been touched, so the caller can correct the call and
/// retry on the same instance.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum NetworkError {
    #[error("invalid topology: need at least two layers of non-zero width, got {layers} layer(s)")]
    InvalidTopology { layers: usize },

    #[error("input size mismatch: expected {expected} value(s), got {given}")]
    InputSizeMismatch { expected: usize, given: usize },

    #[error("target size mismatch: expected {expected} value(s), got {given}")]
    TargetSizeMismatch { expected: usize, given: usize },
}
