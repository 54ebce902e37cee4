//! Error types for ledger validation

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Block has no identity hash (was it finalized?)")]
    MissingBlockHash,

    #[error("Block already retained: {0}")]
    DuplicateBlock(String),

    #[error("Unknown parent block: {0}")]
    UnknownParent(String),

    #[error("Fork too deep: parent height {parent_height} is more than {cut_off_age} blocks behind best height {best_height}")]
    ForkTooDeep {
        parent_height: u64,
        best_height: u64,
        cut_off_age: u64,
    },

    #[error("Invalid coinbase: {0}")]
    InvalidCoinbase(String),

    #[error("Transaction validation failed: {0}")]
    TransactionValidation(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fork_too_deep_message() {
        let err = LedgerError::ForkTooDeep {
            parent_height: 1,
            best_height: 12,
            cut_off_age: 10,
        };
        assert_eq!(
            err.to_string(),
            "Fork too deep: parent height 1 is more than 10 blocks behind best height 12"
        );
    }

    #[test]
    fn test_unknown_parent_message() {
        let err = LedgerError::UnknownParent("abcd".to_string());
        assert_eq!(err.to_string(), "Unknown parent block: abcd");
    }
}
