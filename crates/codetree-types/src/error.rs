use thiserror::Error;

/// Reasons a write batch is rejected before anything is persisted.
///
/// Every variant is recoverable by the caller correcting its input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("codes array is required")]
    EmptyBatch,

    #[error("{field} is required (entry {index})")]
    MissingField { index: usize, field: &'static str },

    #[error("Duplicate code in payload: {0}")]
    DuplicateCode(String),

    #[error("Parent code not found: {0}")]
    ParentNotFound(String),

    #[error("Code cannot be its own parent: {0}")]
    SelfParent(String),

    #[error("Code would become its own ancestor: {0}")]
    ParentCycle(String),

    #[error("Depth mismatch for {code}: expected {expected}, got {actual}")]
    DepthMismatch {
        code: String,
        expected: u32,
        actual: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_code() {
        assert_eq!(
            ValidationError::DuplicateCode("A".into()).to_string(),
            "Duplicate code in payload: A"
        );
        assert_eq!(
            ValidationError::ParentNotFound("NOPE".into()).to_string(),
            "Parent code not found: NOPE"
        );
        assert_eq!(
            ValidationError::MissingField { index: 2, field: "name" }.to_string(),
            "name is required (entry 2)"
        );
        assert_eq!(
            ValidationError::ParentCycle("R".into()).to_string(),
            "Code would become its own ancestor: R"
        );
    }
}
