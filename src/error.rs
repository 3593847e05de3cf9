use thiserror::Error;

#[derive(Error, Debug)]
pub enum LockboxError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Funds are still locked until the unlock time")]
    StillLocked,

    #[error("No funds available to withdraw")]
    NothingToWithdraw,

    #[error("A transaction is already in flight")]
    SubmissionInFlight,

    #[error("Contract address is not configured")]
    MissingContractAddress,

    #[error("Submission rejected: {0}")]
    TxRejected(String),

    #[error("Transaction failed: {0}")]
    TxFailed(String),

    #[error("Confirmation timed out after {0}s")]
    ConfirmationTimeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Rpc(String),

    #[error("Rejected by signer: {0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
