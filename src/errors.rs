use thiserror::Error;

/// Error type that captures ledger, matching, and storage failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
    #[error("Bill not found: {0}")]
    BillNotFound(String),
    #[error(
        "Amount mismatch: transaction differs from the bill by {difference:.2} \
         (tolerance {tolerance:.2})"
    )]
    AmountMismatch { difference: f64, tolerance: f64 },
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// True for the not-found family, which callers usually report as a lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LedgerError::TransactionNotFound(_) | LedgerError::BillNotFound(_)
        )
    }
}
