//! Persistence for scan state: cursors, the local commitment log, and the
//! owned-note table, keyed by `(pool_id, master_public_key)`. Mirrors
//! the atomic file-write and in-memory RwLock patterns used for wallet
//! metadata elsewhere in this ecosystem, adapted to scan state rather than
//! encrypted key material.

use chrono::{DateTime, Utc};
use octopus_crypto::field::{field_from_le_bytes, field_to_le_bytes};
use octopus_crypto::Field;
use octopus_types::{OctopusError, OctopusResult, PoolId, ScanCursor};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

/// An owned note in a form that survives serialization; `Field` values are
/// stored as their little-endian byte encoding.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistedOwnedNote {
    pub nsk: [u8; 32],
    pub token: [u8; 32],
    pub value: u64,
    pub random: [u8; 32],
    pub leaf_index: u64,
    pub spent: bool,
    pub optimistic_spent_at: Option<DateTime<Utc>>,
}

/// Everything the scanner needs to resume without a full rescan.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanState {
    pub shield_cursor: ScanCursor,
    pub transfer_cursor: ScanCursor,
    pub swap_cursor: ScanCursor,
    pub last_scan_at: DateTime<Utc>,
    /// Every commitment observed so far, in ledger order, so the local
    /// Merkle tree can be rebuilt via [`octopus_crypto::IncrementalMerkleTree::rebuild`].
    pub commitments: Vec<[u8; 32]>,
    pub owned_notes: Vec<PersistedOwnedNote>,
}

impl Default for ScanState {
    fn default() -> Self {
        Self {
            shield_cursor: ScanCursor::default(),
            transfer_cursor: ScanCursor::default(),
            swap_cursor: ScanCursor::default(),
            last_scan_at: DateTime::<Utc>::UNIX_EPOCH,
            commitments: Vec::new(),
            owned_notes: Vec::new(),
        }
    }
}

impl ScanState {
    pub fn commitments_as_fields(&self) -> OctopusResult<Vec<Field>> {
        self.commitments
            .iter()
            .map(|bytes| field_from_le_bytes(bytes))
            .collect()
    }
}

fn state_key(pool_id: &PoolId, master_public_key: Field) -> String {
    format!(
        "{}-{}",
        pool_id.to_hex(),
        hex::encode(field_to_le_bytes(&master_public_key))
    )
}

/// Storage backend for [`ScanState`]. Implementations must make `save`
/// durable before returning `Ok`; scanner progress is only as safe as this
/// call is atomic.
pub trait ScanStorage: Send + Sync {
    fn load(&self, pool_id: &PoolId, master_public_key: Field) -> OctopusResult<Option<ScanState>>;
    fn save(&self, pool_id: &PoolId, master_public_key: Field, state: &ScanState) -> OctopusResult<()>;
    fn delete(&self, pool_id: &PoolId, master_public_key: Field) -> OctopusResult<()>;
}

/// File-backed storage: one JSON file per `(pool, mpk)`, written via a
/// temp-file-then-rename so a crash mid-write never leaves a torn file.
pub struct FileScanStorage {
    base_dir: PathBuf,
}

impl FileScanStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> OctopusResult<Self> {
        let base_dir = base_dir.into();
        if !base_dir.exists() {
            std::fs::create_dir_all(&base_dir)
                .map_err(|e| OctopusError::Storage(format!("failed to create {base_dir:?}: {e}")))?;
        }
        Ok(Self { base_dir })
    }

    fn path_for(&self, pool_id: &PoolId, master_public_key: Field) -> PathBuf {
        self.base_dir
            .join(format!("{}.json", state_key(pool_id, master_public_key)))
    }
}

impl ScanStorage for FileScanStorage {
    fn load(&self, pool_id: &PoolId, master_public_key: Field) -> OctopusResult<Option<ScanState>> {
        let path = self.path_for(pool_id, master_public_key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| OctopusError::Storage(format!("failed to read {path:?}: {e}")))?;
        let state = serde_json::from_str(&contents)
            .map_err(|e| OctopusError::Serialization(format!("corrupt scan state {path:?}: {e}")))?;
        Ok(Some(state))
    }

    fn save(&self, pool_id: &PoolId, master_public_key: Field, state: &ScanState) -> OctopusResult<()> {
        let path = self.path_for(pool_id, master_public_key);
        let temp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| OctopusError::Serialization(e.to_string()))?;
        std::fs::write(&temp_path, &json)
            .map_err(|e| OctopusError::Storage(format!("failed to write {temp_path:?}: {e}")))?;
        std::fs::rename(&temp_path, &path)
            .map_err(|e| OctopusError::Storage(format!("failed to rename into {path:?}: {e}")))?;
        Ok(())
    }

    fn delete(&self, pool_id: &PoolId, master_public_key: Field) -> OctopusResult<()> {
        let path = self.path_for(pool_id, master_public_key);
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| OctopusError::Storage(format!("failed to remove {path:?}: {e}")))?;
        }
        Ok(())
    }
}

/// In-memory storage for tests and short-lived processes.
pub struct MemoryScanStorage {
    states: RwLock<HashMap<String, ScanState>>,
}

impl MemoryScanStorage {
    pub fn new() -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryScanStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanStorage for MemoryScanStorage {
    fn load(&self, pool_id: &PoolId, master_public_key: Field) -> OctopusResult<Option<ScanState>> {
        let states = self
            .states
            .read()
            .map_err(|_| OctopusError::Storage("scan state lock poisoned".into()))?;
        Ok(states.get(&state_key(pool_id, master_public_key)).cloned())
    }

    fn save(&self, pool_id: &PoolId, master_public_key: Field, state: &ScanState) -> OctopusResult<()> {
        let mut states = self
            .states
            .write()
            .map_err(|_| OctopusError::Storage("scan state lock poisoned".into()))?;
        states.insert(state_key(pool_id, master_public_key), state.clone());
        Ok(())
    }

    fn delete(&self, pool_id: &PoolId, master_public_key: Field) -> OctopusResult<()> {
        let mut states = self
            .states
            .write()
            .map_err(|_| OctopusError::Storage("scan state lock poisoned".into()))?;
        states.remove(&state_key(pool_id, master_public_key));
        Ok(())
    }
}
