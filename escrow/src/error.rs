use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EscrowError {
    #[error("escrow ledger unavailable: {0}")]
    Unavailable(String),

    #[error("escrow command rejected: {0}")]
    Rejected(String),
}
