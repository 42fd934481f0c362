use thiserror::Error;

/// Invalid credit policy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    #[error("{name} must be a positive finite number, got {value}")]
    InvalidRate { name: &'static str, value: f64 },
}
