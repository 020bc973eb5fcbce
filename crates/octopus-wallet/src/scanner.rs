//! Scanner: maintains a local mirror of a pool's Merkle tree and the set of
//! notes owned by a viewing keypair. Fetching events from the ledger
//! is delegated to an [`EventSource`]; everything here is synchronous and
//! pure aside from that one I/O boundary, so the async wrapper is a thin
//! `spawn_blocking`-style seam rather than an async state machine.

use crate::events::PoolEvent;
use crate::storage::{PersistedOwnedNote, ScanState};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use octopus_crypto::field::{field_from_le_bytes, field_to_le_bytes};
use octopus_crypto::{decrypt_note, compute_nullifier, Field, IncrementalMerkleTree, Keypair, MerklePath, Note};
use octopus_types::{OctopusResult, PoolId, ScanCursor, ScannerConfig};
use tracing::{debug, warn};

/// A note this wallet can spend: the note itself, where it lives in the
/// tree, its nullifier, and whether it has already been consumed.
#[derive(Clone, Debug)]
pub struct OwnedNote {
    pub note: Note,
    pub leaf_index: u64,
    pub nullifier: Field,
    pub spent: bool,
    /// Set when a spend built from this note was broadcast but not yet
    /// confirmed in an observed nullifier event; cleared on reconciliation.
    pub optimistic_spent_at: Option<DateTime<Utc>>,
}

impl OwnedNote {
    pub fn to_persisted(&self) -> PersistedOwnedNote {
        PersistedOwnedNote {
            nsk: field_to_le_bytes(&self.note.nsk),
            token: field_to_le_bytes(&self.note.token),
            value: self.note.value,
            random: field_to_le_bytes(&self.note.random),
            leaf_index: self.leaf_index,
            spent: self.spent,
            optimistic_spent_at: self.optimistic_spent_at,
        }
    }

    pub fn from_persisted(p: &PersistedOwnedNote, nullifying_key: Field) -> OctopusResult<Self> {
        let note = Note {
            nsk: field_from_le_bytes(&p.nsk)?,
            token: field_from_le_bytes(&p.token)?,
            value: p.value,
            random: field_from_le_bytes(&p.random)?,
        };
        Ok(Self {
            note,
            leaf_index: p.leaf_index,
            nullifier: compute_nullifier(nullifying_key, p.leaf_index),
            spent: p.spent,
            optimistic_spent_at: p.optimistic_spent_at,
        })
    }
}

/// Fetches a page of events after `cursor`. Implementations wrap an RPC
/// client; the scanner never constructs a `PoolEvent` itself.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_shield_events(
        &self,
        pool_id: &PoolId,
        cursor: &ScanCursor,
        batch_size: usize,
    ) -> anyhow::Result<(Vec<PoolEvent>, ScanCursor)>;

    async fn fetch_transfer_events(
        &self,
        pool_id: &PoolId,
        cursor: &ScanCursor,
        batch_size: usize,
    ) -> anyhow::Result<(Vec<PoolEvent>, ScanCursor)>;

    async fn fetch_swap_events(
        &self,
        pool_id: &PoolId,
        cursor: &ScanCursor,
        batch_size: usize,
    ) -> anyhow::Result<(Vec<PoolEvent>, ScanCursor)>;
}

/// The scanner's in-memory state for one `(pool, keypair)` pair: the local
/// tree mirror plus the owned-note table. Cheap to rebuild from a
/// [`ScanState`] via [`Scanner::from_state`].
pub struct Scanner {
    pool_id: PoolId,
    tree: IncrementalMerkleTree,
    owned: Vec<OwnedNote>,
    shield_cursor: ScanCursor,
    transfer_cursor: ScanCursor,
    swap_cursor: ScanCursor,
}

impl Scanner {
    pub fn new(pool_id: PoolId) -> Self {
        Self {
            pool_id,
            tree: IncrementalMerkleTree::new(),
            owned: Vec::new(),
            shield_cursor: ScanCursor::default(),
            transfer_cursor: ScanCursor::default(),
            swap_cursor: ScanCursor::default(),
        }
    }

    pub fn from_state(pool_id: PoolId, keypair: &Keypair, state: &ScanState) -> OctopusResult<Self> {
        let commitments = state.commitments_as_fields()?;
        let tree = IncrementalMerkleTree::rebuild(&commitments)?;
        let owned = state
            .owned_notes
            .iter()
            .map(|p| OwnedNote::from_persisted(p, keypair.nullifying_key))
            .collect::<OctopusResult<Vec<_>>>()?;
        Ok(Self {
            pool_id,
            tree,
            owned,
            shield_cursor: state.shield_cursor.clone(),
            transfer_cursor: state.transfer_cursor.clone(),
            swap_cursor: state.swap_cursor.clone(),
        })
    }

    pub fn to_state(&self, last_scan_at: DateTime<Utc>) -> ScanState {
        ScanState {
            shield_cursor: self.shield_cursor.clone(),
            transfer_cursor: self.transfer_cursor.clone(),
            swap_cursor: self.swap_cursor.clone(),
            last_scan_at,
            commitments: self.tree.leaves().iter().map(field_to_le_bytes).collect(),
            owned_notes: self.owned.iter().map(OwnedNote::to_persisted).collect(),
        }
    }

    pub fn tree(&self) -> &IncrementalMerkleTree {
        &self.tree
    }

    pub fn owned_notes(&self) -> &[OwnedNote] {
        &self.owned
    }

    pub fn unspent_notes(&self) -> impl Iterator<Item = &OwnedNote> {
        self.owned.iter().filter(|n| !n.spent)
    }

    /// Unspent notes not currently held by an in-flight spend. Selection
    /// draws from this set so two concurrent spend attempts can't both pick
    /// the same note.
    pub fn available_notes(&self) -> impl Iterator<Item = &OwnedNote> {
        self.owned
            .iter()
            .filter(|n| !n.spent && n.optimistic_spent_at.is_none())
    }

    /// Marks `nullifiers` as optimistically spent as of `now`, so they drop
    /// out of [`Self::available_notes`] until either a matching nullifier
    /// event confirms the spend or [`Self::reconcile`] reverts it.
    pub fn mark_optimistically_spent(&mut self, nullifiers: &[Field], now: DateTime<Utc>) {
        for note in self.owned.iter_mut() {
            if nullifiers.contains(&note.nullifier) {
                note.optimistic_spent_at = Some(now);
            }
        }
    }

    /// Reverts any optimistic-spent mark older than `grace` that was never
    /// confirmed by an observed nullifier event — the broadcast spend most
    /// likely failed or was dropped, so the note is spendable again.
    pub fn reconcile(&mut self, now: DateTime<Utc>, grace: Duration) {
        for note in self.owned.iter_mut() {
            if note.spent {
                note.optimistic_spent_at = None;
                continue;
            }
            if let Some(marked_at) = note.optimistic_spent_at {
                if now.signed_duration_since(marked_at) > grace {
                    note.optimistic_spent_at = None;
                }
            }
        }
    }

    pub fn path_for(&self, leaf_index: u64) -> OctopusResult<MerklePath> {
        self.tree.path_for(leaf_index)
    }

    /// Processes one batch of already-fetched events: inserts every
    /// commitment into the local tree in order, attempts decryption of each
    /// ciphertext against `keypair`, and marks any owned note whose
    /// nullifier appears in the batch as spent. A single undecryptable or
    /// malformed event is logged and skipped rather than aborting the scan.
    pub fn apply_events(&mut self, keypair: &Keypair, events: &[PoolEvent]) -> OctopusResult<usize> {
        let mut newly_owned = 0;
        let (viewing_secret, _) = keypair.viewing_keypair();

        for event in events {
            for nullifier in event.nullifiers() {
                if let Some(owned) = self.owned.iter_mut().find(|n| n.nullifier == *nullifier) {
                    owned.spent = true;
                    owned.optimistic_spent_at = None;
                }
            }

            for output in event.outputs() {
                let inserted_index = self.tree.insert(output.commitment)?;
                if inserted_index != output.leaf_index {
                    warn!(
                        expected = output.leaf_index,
                        actual = inserted_index,
                        "event leaf index does not match local tree position; ledger and mirror have diverged"
                    );
                }

                match decrypt_note(&output.encrypted_note, &viewing_secret, keypair.master_public_key) {
                    Ok(Some(note)) => {
                        let nullifier = compute_nullifier(keypair.nullifying_key, inserted_index);
                        self.owned.push(OwnedNote {
                            note,
                            leaf_index: inserted_index,
                            nullifier,
                            spent: false,
                            optimistic_spent_at: None,
                        });
                        newly_owned += 1;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        debug!(error = %e, "note ciphertext failed to decode; not ours or corrupt");
                    }
                }
            }
        }

        Ok(newly_owned)
    }

    pub fn pool_id(&self) -> &PoolId {
        &self.pool_id
    }

    pub fn set_cursors(&mut self, shield: ScanCursor, transfer: ScanCursor, swap: ScanCursor) {
        self.shield_cursor = shield;
        self.transfer_cursor = transfer;
        self.swap_cursor = swap;
    }

    pub fn cursors(&self) -> (&ScanCursor, &ScanCursor, &ScanCursor) {
        (&self.shield_cursor, &self.transfer_cursor, &self.swap_cursor)
    }
}

/// Runs one full scan round against `source`: fetches each event stream
/// after its stored cursor, applies the batch, and advances cursors. Stops
/// once a round returns fewer than `config.rescan_batch_size` events for
/// every stream (the live tip has been reached).
pub async fn scan_once(
    scanner: &mut Scanner,
    keypair: &Keypair,
    source: &dyn EventSource,
    config: &ScannerConfig,
) -> anyhow::Result<usize> {
    let mut total_new = 0;
    let (shield_cursor, transfer_cursor, swap_cursor) = {
        let (s, t, sw) = scanner.cursors();
        (s.clone(), t.clone(), sw.clone())
    };

    let (shield_events, next_shield) = source
        .fetch_shield_events(scanner.pool_id(), &shield_cursor, config.rescan_batch_size)
        .await?;
    let (transfer_events, next_transfer) = source
        .fetch_transfer_events(scanner.pool_id(), &transfer_cursor, config.rescan_batch_size)
        .await?;
    let (swap_events, next_swap) = source
        .fetch_swap_events(scanner.pool_id(), &swap_cursor, config.rescan_batch_size)
        .await?;

    let mut all_events = Vec::with_capacity(shield_events.len() + transfer_events.len() + swap_events.len());
    all_events.extend(shield_events);
    all_events.extend(transfer_events);
    all_events.extend(swap_events);
    all_events.sort_by_key(|e| (e.block_height(), e.transaction_index()));

    total_new += scanner.apply_events(keypair, &all_events)?;
    scanner.set_cursors(next_shield, next_transfer, next_swap);

    Ok(total_new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventOutput, ShieldEvent};
    use octopus_crypto::encrypt_note;

    fn shield_event(pool_id: PoolId, keypair: &Keypair, token: Field, value: u64, leaf_index: u64, height: u64) -> PoolEvent {
        let note = Note::new(keypair.master_public_key, token, value, None);
        let encrypted_note = encrypt_note(&note, &keypair.viewing_public_key());
        PoolEvent::Shield(ShieldEvent {
            pool_id,
            output: EventOutput {
                leaf_index,
                commitment: note.commitment(),
                encrypted_note,
            },
            block_height: height,
            transaction_index: 0,
        })
    }

    #[test]
    fn apply_events_discovers_owned_shield_output() {
        let keypair = Keypair::random();
        let pool_id = PoolId::from_bytes([1u8; 32]);
        let mut scanner = Scanner::new(pool_id);
        let token = Field::from(9u64);

        let event = shield_event(pool_id, &keypair, token, 500, 0, 1);
        let newly_owned = scanner.apply_events(&keypair, std::slice::from_ref(&event)).unwrap();

        assert_eq!(newly_owned, 1);
        assert_eq!(scanner.owned_notes().len(), 1);
        assert_eq!(scanner.unspent_notes().count(), 1);
        assert_eq!(scanner.tree().leaf_count(), 1);
    }

    #[test]
    fn apply_events_ignores_output_addressed_to_someone_else() {
        let owner = Keypair::random();
        let stranger = Keypair::random();
        let pool_id = PoolId::from_bytes([2u8; 32]);
        let mut scanner = Scanner::new(pool_id);

        let event = shield_event(pool_id, &owner, Field::from(1u64), 10, 0, 1);
        let newly_owned = scanner.apply_events(&stranger, std::slice::from_ref(&event)).unwrap();

        assert_eq!(newly_owned, 0);
        assert!(scanner.owned_notes().is_empty());
        // the commitment still lands in the tree; only ownership decryption failed
        assert_eq!(scanner.tree().leaf_count(), 1);
    }

    #[test]
    fn nullifier_event_marks_owned_note_spent() {
        let keypair = Keypair::random();
        let pool_id = PoolId::from_bytes([3u8; 32]);
        let mut scanner = Scanner::new(pool_id);
        let token = Field::from(4u64);

        let shield = shield_event(pool_id, &keypair, token, 50, 0, 1);
        scanner.apply_events(&keypair, std::slice::from_ref(&shield)).unwrap();
        let nullifier = scanner.owned_notes()[0].nullifier;

        let spend = PoolEvent::Transfer(crate::events::TransferEvent {
            pool_id,
            nullifiers: [nullifier, Field::from(0u64)],
            outputs: vec![],
            block_height: 2,
            transaction_index: 0,
        });
        scanner.apply_events(&keypair, std::slice::from_ref(&spend)).unwrap();

        assert!(scanner.owned_notes()[0].spent);
        assert_eq!(scanner.unspent_notes().count(), 0);
    }

    #[test]
    fn optimistic_spend_excludes_note_until_reconciled() {
        let keypair = Keypair::random();
        let pool_id = PoolId::from_bytes([4u8; 32]);
        let mut scanner = Scanner::new(pool_id);

        let shield = shield_event(pool_id, &keypair, Field::from(1u64), 20, 0, 1);
        scanner.apply_events(&keypair, std::slice::from_ref(&shield)).unwrap();
        let nullifier = scanner.owned_notes()[0].nullifier;

        let marked_at = Utc::now();
        scanner.mark_optimistically_spent(&[nullifier], marked_at);
        assert_eq!(scanner.available_notes().count(), 0);

        let grace = Duration::seconds(30);
        // still within the grace period
        scanner.reconcile(marked_at + Duration::seconds(5), grace);
        assert_eq!(scanner.available_notes().count(), 0);

        // grace period elapsed without on-chain confirmation
        scanner.reconcile(marked_at + Duration::seconds(100), grace);
        assert_eq!(scanner.available_notes().count(), 1);
    }

    #[test]
    fn state_round_trips_through_from_state() {
        let keypair = Keypair::random();
        let pool_id = PoolId::from_bytes([5u8; 32]);
        let mut scanner = Scanner::new(pool_id);

        let shield = shield_event(pool_id, &keypair, Field::from(2u64), 30, 0, 1);
        scanner.apply_events(&keypair, std::slice::from_ref(&shield)).unwrap();
        scanner.set_cursors(ScanCursor::default(), ScanCursor::default(), ScanCursor::default());

        let state = scanner.to_state(Utc::now());
        let rebuilt = Scanner::from_state(pool_id, &keypair, &state).unwrap();

        assert_eq!(rebuilt.tree().root(), scanner.tree().root());
        assert_eq!(rebuilt.owned_notes().len(), scanner.owned_notes().len());
        assert_eq!(rebuilt.owned_notes()[0].note.value, 30);
    }

    struct MockSource {
        shield: Vec<PoolEvent>,
    }

    #[async_trait]
    impl EventSource for MockSource {
        async fn fetch_shield_events(
            &self,
            _pool_id: &PoolId,
            cursor: &ScanCursor,
            _batch_size: usize,
        ) -> anyhow::Result<(Vec<PoolEvent>, ScanCursor)> {
            if cursor.0.is_empty() {
                Ok((self.shield.clone(), ScanCursor("done".into())))
            } else {
                Ok((vec![], cursor.clone()))
            }
        }

        async fn fetch_transfer_events(
            &self,
            _pool_id: &PoolId,
            cursor: &ScanCursor,
            _batch_size: usize,
        ) -> anyhow::Result<(Vec<PoolEvent>, ScanCursor)> {
            Ok((vec![], cursor.clone()))
        }

        async fn fetch_swap_events(
            &self,
            _pool_id: &PoolId,
            cursor: &ScanCursor,
            _batch_size: usize,
        ) -> anyhow::Result<(Vec<PoolEvent>, ScanCursor)> {
            Ok((vec![], cursor.clone()))
        }
    }

    #[tokio::test]
    async fn scan_once_advances_cursor_and_applies_events() {
        let keypair = Keypair::random();
        let pool_id = PoolId::from_bytes([6u8; 32]);
        let mut scanner = Scanner::new(pool_id);
        let event = shield_event(pool_id, &keypair, Field::from(1u64), 40, 0, 1);
        let source = MockSource { shield: vec![event] };
        let config = ScannerConfig::default();

        let newly_owned = scan_once(&mut scanner, &keypair, &source, &config).await.unwrap();
        assert_eq!(newly_owned, 1);
        assert_eq!(scanner.cursors().0 .0, "done");

        // second round sees no new events since the mock cursor is exhausted
        let newly_owned = scan_once(&mut scanner, &keypair, &source, &config).await.unwrap();
        assert_eq!(newly_owned, 0);
    }
}
