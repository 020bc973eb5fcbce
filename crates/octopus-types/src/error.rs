use thiserror::Error;

#[derive(Error, Debug)]
pub enum OctopusError {
    #[error("invalid field element: {0}")]
    InvalidFieldElement(String),

    #[error("invalid length: {0}")]
    InvalidLength(String),

    #[error("merkle tree is full")]
    TreeFull,

    #[error("merkle proofs do not reconstruct a common root: {0}")]
    MerkleRootMismatch(String),

    #[error("computed root is not in the recent on-chain history; rescan required")]
    StaleProof,

    #[error("AEAD decryption failed")]
    AeadFailure,

    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u64, available: u64 },

    #[error("no note or pair of notes covers the requested amount")]
    NoCoveringPair,

    #[error("witness violates a conservation invariant: {0}")]
    BalanceViolation(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type OctopusResult<T> = Result<T, OctopusError>;
