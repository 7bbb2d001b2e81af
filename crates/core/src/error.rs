/// Domain errors raised by the form's pure operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Guardian index {index} is out of range (list has {len})")]
    GuardianIndex { index: usize, len: usize },
}
