//! Top-level wallet: ties the scanner, note selection, witness building, and
//! scan-state persistence together behind one pool-keyed owned-note table.
//! A single [`Wallet`] can track several pools (one per token) under
//! the same spending keypair; each pool's scanner and lock are independent
//! so a slow scan on one pool never blocks a spend on another.

use crate::events::PoolEvent;
use crate::scanner::{EventSource, OwnedNote, Scanner};
use crate::selection::{select_for_transfer, select_for_unshield};
use crate::storage::ScanStorage;
use chrono::{DateTime, Duration, Utc};
use octopus_crypto::witness::{
    build_swap_witness, build_transfer_witness, build_unshield_witness, SwapPublicInputs,
    SwapWitness, TransferPublicInputs, TransferWitness, UnshieldPublicInputs, UnshieldWitness,
    WitnessInput,
};
use octopus_crypto::{Field, Keypair};
use octopus_types::{OctopusError, OctopusResult, PoolId, ScannerConfig};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::info;

/// A single plan ready for proving: the private witness plus the exact
/// public-input order the verifier expects. The prover itself is an
/// external collaborator; this crate never invokes one.
pub struct UnshieldPlan {
    pub witness: UnshieldWitness,
    pub public_inputs: UnshieldPublicInputs,
}

pub struct TransferPlan {
    pub witness: TransferWitness,
    pub public_inputs: TransferPublicInputs,
}

pub struct SwapPlan {
    pub witness: SwapWitness,
    pub public_inputs: SwapPublicInputs,
}

/// Tracks one pool's scanner behind its own lock, so spend planning against
/// pool A never blocks a concurrent scan of pool B.
struct PoolState {
    scanner: Mutex<Scanner>,
}

/// A shielded wallet for one spending keypair, scanning and spending across
/// any number of pools.
pub struct Wallet<S: ScanStorage> {
    keypair: Keypair,
    storage: Arc<S>,
    pools: Mutex<HashMap<PoolId, Arc<PoolState>>>,
}

impl<S: ScanStorage> Wallet<S> {
    pub fn new(keypair: Keypair, storage: Arc<S>) -> Self {
        Self {
            keypair,
            storage,
            pools: Mutex::new(HashMap::new()),
        }
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    fn pool_state(&self, pool_id: PoolId) -> OctopusResult<Arc<PoolState>> {
        let mut pools = self
            .pools
            .lock()
            .map_err(|_| OctopusError::Storage("wallet pool table lock poisoned".into()))?;

        if let Some(state) = pools.get(&pool_id) {
            return Ok(state.clone());
        }

        let scanner = match self.storage.load(&pool_id, self.keypair.master_public_key)? {
            Some(saved) => Scanner::from_state(pool_id, &self.keypair, &saved)?,
            None => Scanner::new(pool_id),
        };
        let state = Arc::new(PoolState {
            scanner: Mutex::new(scanner),
        });
        pools.insert(pool_id, state.clone());
        Ok(state)
    }

    fn persist(&self, pool_id: PoolId, scanner: &Scanner, now: DateTime<Utc>) -> OctopusResult<()> {
        let state = scanner.to_state(now);
        self.storage.save(&pool_id, self.keypair.master_public_key, &state)
    }

    /// Runs one scan round against `source` for `pool_id` and persists the
    /// resulting cursors, tree, and owned-note table. Returns the number of
    /// newly-owned notes discovered.
    pub async fn scan(
        &self,
        pool_id: PoolId,
        source: &dyn EventSource,
        config: &ScannerConfig,
        now: DateTime<Utc>,
    ) -> anyhow::Result<usize> {
        let pool_state = self.pool_state(pool_id)?;
        let newly_owned = {
            let mut scanner = pool_state
                .scanner
                .lock()
                .map_err(|_| OctopusError::Storage("scanner lock poisoned".into()))?;
            let count = crate::scanner::scan_once(&mut scanner, &self.keypair, source, config).await?;
            scanner.reconcile(now, Duration::seconds(config.reconciliation_grace_secs as i64));
            self.persist(pool_id, &scanner, now)?;
            count
        };
        info!(pool = %pool_id, newly_owned, "scan round complete");
        Ok(newly_owned)
    }

    /// Applies an already-fetched batch of events without a network round
    /// trip — used by callers that receive events pushed from a
    /// subscription rather than polling.
    pub fn apply_events(&self, pool_id: PoolId, events: &[PoolEvent], now: DateTime<Utc>) -> OctopusResult<usize> {
        let pool_state = self.pool_state(pool_id)?;
        let mut scanner = pool_state
            .scanner
            .lock()
            .map_err(|_| OctopusError::Storage("scanner lock poisoned".into()))?;
        let count = scanner.apply_events(&self.keypair, events)?;
        scanner.reconcile(now, Duration::zero());
        self.persist(pool_id, &scanner, now)?;
        Ok(count)
    }

    pub fn balance(&self, pool_id: PoolId, token: Field) -> OctopusResult<u64> {
        let pool_state = self.pool_state(pool_id)?;
        let scanner = pool_state
            .scanner
            .lock()
            .map_err(|_| OctopusError::Storage("scanner lock poisoned".into()))?;
        Ok(scanner
            .unspent_notes()
            .filter(|n| n.note.token == token)
            .map(|n| n.note.value)
            .sum())
    }

    pub fn notes(&self, pool_id: PoolId) -> OctopusResult<Vec<OwnedNote>> {
        let pool_state = self.pool_state(pool_id)?;
        let scanner = pool_state
            .scanner
            .lock()
            .map_err(|_| OctopusError::Storage("scanner lock poisoned".into()))?;
        Ok(scanner.owned_notes().to_vec())
    }

    /// Plans an unshield spend: selects notes largest-first until their
    /// cumulative value covers `amount`, builds one sequential unshield
    /// witness per selected note (full value for all but the last, the
    /// remainder with change for the last), and marks every consumed note
    /// optimistically spent so a concurrent spend can't also select it.
    pub fn plan_unshield(
        &self,
        pool_id: PoolId,
        token: Field,
        amount: u64,
        now: DateTime<Utc>,
    ) -> OctopusResult<Vec<UnshieldPlan>> {
        let pool_state = self.pool_state(pool_id)?;
        let mut scanner = pool_state
            .scanner
            .lock()
            .map_err(|_| OctopusError::Storage("scanner lock poisoned".into()))?;

        let available: Vec<OwnedNote> = scanner.available_notes().cloned().collect();
        let chosen = select_for_unshield(&available, token, amount)?;

        let mut plans = Vec::with_capacity(chosen.len());
        let mut nullifiers = Vec::with_capacity(chosen.len());
        let mut remaining = amount;
        for note in &chosen {
            let path = scanner.path_for(note.leaf_index)?;
            let spend_amount = remaining.min(note.note.value);

            let (witness, public_inputs) =
                build_unshield_witness(&self.keypair, note.note, note.leaf_index, path, spend_amount)?;

            nullifiers.push(public_inputs.nullifier);
            plans.push(UnshieldPlan {
                witness,
                public_inputs,
            });
            remaining -= spend_amount;
        }

        scanner.mark_optimistically_spent(&nullifiers, now);
        self.persist(pool_id, &scanner, now)?;

        Ok(plans)
    }

    /// Plans a transfer spend to `recipient_master_public_key`.
    pub fn plan_transfer(
        &self,
        pool_id: PoolId,
        token: Field,
        amount: u64,
        recipient_master_public_key: Field,
        now: DateTime<Utc>,
    ) -> OctopusResult<TransferPlan> {
        let pool_state = self.pool_state(pool_id)?;
        let mut scanner = pool_state
            .scanner
            .lock()
            .map_err(|_| OctopusError::Storage("scanner lock poisoned".into()))?;

        let available: Vec<OwnedNote> = scanner.available_notes().cloned().collect();
        let chosen = select_for_transfer(&available, token, amount)?;
        let mut inputs = Vec::with_capacity(chosen.len());
        let mut nullifiers = Vec::with_capacity(chosen.len());
        for note in &chosen {
            let path = scanner.path_for(note.leaf_index)?;
            nullifiers.push(note.nullifier);
            inputs.push(WitnessInput {
                note: note.note,
                leaf_index: note.leaf_index,
                path,
            });
        }

        let (witness, public_inputs) =
            build_transfer_witness(&self.keypair, inputs, recipient_master_public_key, amount)?;

        scanner.mark_optimistically_spent(&nullifiers, now);
        self.persist(pool_id, &scanner, now)?;

        Ok(TransferPlan {
            witness,
            public_inputs,
        })
    }

    /// Plans a swap spend, selecting exactly two notes in `token_in`
    /// covering `amount_in`.
    #[allow(clippy::too_many_arguments)]
    pub fn plan_swap(
        &self,
        pool_id: PoolId,
        token_in: Field,
        token_out: Field,
        amount_in: u64,
        min_amount_out: u64,
        expected_output_amount: u64,
        dex_pool_id: Field,
        now: DateTime<Utc>,
    ) -> OctopusResult<SwapPlan> {
        let pool_state = self.pool_state(pool_id)?;
        let mut scanner = pool_state
            .scanner
            .lock()
            .map_err(|_| OctopusError::Storage("scanner lock poisoned".into()))?;

        let available: Vec<OwnedNote> = scanner.available_notes().cloned().collect();
        let chosen = select_for_transfer(&available, token_in, amount_in)?;
        let chosen = if chosen.len() == 2 {
            chosen
        } else {
            // Swaps always consume exactly two real inputs; pad with the
            // next-available note of the same token if selection found only one.
            let mut extended = chosen;
            if let Some(extra) = available
                .iter()
                .find(|n| n.note.token == token_in && n.leaf_index != extended[0].leaf_index)
            {
                extended.push(extra);
            } else {
                return Err(OctopusError::NoCoveringPair);
            }
            extended
        };

        let mut inputs = Vec::with_capacity(2);
        let mut nullifiers = Vec::with_capacity(2);
        for note in &chosen {
            let path = scanner.path_for(note.leaf_index)?;
            nullifiers.push(note.nullifier);
            inputs.push(WitnessInput {
                note: note.note,
                leaf_index: note.leaf_index,
                path,
            });
        }

        let (witness, public_inputs) = build_swap_witness(
            &self.keypair,
            inputs,
            token_in,
            token_out,
            amount_in,
            min_amount_out,
            expected_output_amount,
            dex_pool_id,
        )?;

        scanner.mark_optimistically_spent(&nullifiers, now);
        self.persist(pool_id, &scanner, now)?;

        Ok(SwapPlan {
            witness,
            public_inputs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventOutput, PoolEvent, ShieldEvent};
    use crate::storage::MemoryScanStorage;
    use octopus_crypto::{encrypt_note, Note};

    fn wallet() -> Wallet<MemoryScanStorage> {
        Wallet::new(Keypair::random(), Arc::new(MemoryScanStorage::new()))
    }

    fn shield_event(keypair: &Keypair, pool_id: PoolId, token: Field, value: u64, leaf_index: u64) -> PoolEvent {
        let note = Note::new(keypair.master_public_key, token, value, None);
        let encrypted_note = encrypt_note(&note, &keypair.viewing_public_key());
        PoolEvent::Shield(ShieldEvent {
            pool_id,
            output: EventOutput {
                leaf_index,
                commitment: note.commitment(),
                encrypted_note,
            },
            block_height: leaf_index + 1,
            transaction_index: 0,
        })
    }

    #[test]
    fn balance_is_zero_for_unknown_pool() {
        let w = wallet();
        let pool = PoolId::from_bytes([1u8; 32]);
        assert_eq!(w.balance(pool, Field::from(1u64)).unwrap(), 0);
    }

    #[test]
    fn plan_unshield_fails_with_no_notes() {
        let w = wallet();
        let pool = PoolId::from_bytes([1u8; 32]);
        let result = w.plan_unshield(pool, Field::from(1u64), 10, Utc::now());
        assert!(result.is_err());
    }

    #[test]
    fn plan_unshield_spans_sequential_proofs_for_target_above_any_single_note() {
        let w = wallet();
        let pool = PoolId::from_bytes([2u8; 32]);
        let token = Field::from(7u64);

        let events = vec![
            shield_event(w.keypair(), pool, token, 30, 0),
            shield_event(w.keypair(), pool, token, 40, 1),
            shield_event(w.keypair(), pool, token, 50, 2),
        ];
        w.apply_events(pool, &events, Utc::now()).unwrap();

        let plans = w.plan_unshield(pool, token, 80, Utc::now()).unwrap();

        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].witness.input_note.value, 50);
        assert_eq!(plans[0].public_inputs.unshield_amount, Field::from(50u64));
        assert_eq!(plans[0].public_inputs.change_commitment, Field::from(0u64));

        assert_eq!(plans[1].witness.input_note.value, 40);
        assert_eq!(plans[1].public_inputs.unshield_amount, Field::from(30u64));
        assert_eq!(plans[1].witness.change_note.value, 10);
    }
}
