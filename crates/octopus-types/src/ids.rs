//! Pool/event identifiers and scanner configuration shared across crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a shielded pool (one per token type, as deployed on-chain).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolId(pub [u8; 32]);

impl PoolId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoolId({})", self.to_hex())
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Selects which circuit a witness builder targets. Public-input layout and
/// on-chain call shape both depend on this tag; there is no dynamic dispatch
/// over circuit implementations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProofKind {
    Unshield,
    Transfer,
    Swap,
}

/// An opaque scan cursor, persisted per `(pool, master_public_key)`. Treated
/// as an ordering token by the core; its encoding is owned by the event
/// source (block height, page token, etc).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanCursor(pub String);

/// Scanner tuning parameters. Constructed programmatically by the embedding
/// application; there is no env/file parsing in this crate since no daemon
/// binary is in scope here.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Number of recent roots the client keeps when validating proof freshness.
    pub root_history_depth: usize,
    /// Maximum number of events fetched per rescan round-trip.
    pub rescan_batch_size: usize,
    /// Grace period, in seconds, before an optimistic-spent mark is reverted
    /// if contradicted by on-chain reconciliation.
    pub reconciliation_grace_secs: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            root_history_depth: crate::constants::ROOT_HISTORY_SIZE,
            rescan_batch_size: 256,
            reconciliation_grace_secs: 30,
        }
    }
}

/// Static configuration for a single pool (one token type).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolConfig {
    pub pool_id: PoolId,
    pub token_field: String,
}
