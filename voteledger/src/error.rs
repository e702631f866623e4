use thiserror::Error;

/// Error types
#[derive(Debug, Error)]
pub enum Error {
    #[error("voteledger: election does not exist, is not live, or is outside its voting window")]
    ElectionNotActive,

    #[error("voteledger: a vote is already recorded for this voter in this election")]
    DoubleVoteAttempt,

    #[error("voteledger: candidate does not exist in this election")]
    CandidateNotFound,

    #[error("voteledger: candidate must be at least {0} years old")]
    CandidateUnderage(u8),

    #[error("voteledger: failed to decrypt sealed vote details")]
    DecryptionError,

    #[error("voteledger: malformed receipt - {0}")]
    MalformedReceipt(&'static str),

    #[error("voteledger: unknown receipt format: {0}")]
    UnknownReceiptFormat(String),

    #[error("voteledger: receipt not found in the ledger")]
    ReceiptNotFound,

    #[error("voteledger: ledger append failed: {0}")]
    LedgerAppendFailure(String),

    #[error("voteledger: receipt secret must be 32 bytes of hexadecimal")]
    InvalidSecret,

    #[error("voteledger: JSON error decoding receipt: {0}")]
    JSONDeserialization(#[from] serde_json::Error),

    #[error("voteledger: base64 error decoding receipt: {0}")]
    Base64Deserialization(#[from] base64::DecodeError),

    #[error("voteledger: QR code generation failed: {0}")]
    QrEncoding(#[from] qrcode::types::QrError),

    #[error("voteledger: QR image encoding failed: {0}")]
    QrImageEncoding(#[from] image::error::ImageError),
}
