//! On-chain event shapes consumed by the scanner. These are read-only
//! observations; the wallet never constructs them, only an `EventSource`
//! implementation backed by an RPC client does.

use octopus_crypto::Field;
use octopus_types::{PoolId, ENCRYPTED_NOTE_SIZE};

/// One output slot produced by a shield, transfer, or swap. Zero-valued
/// outputs are omitted by the ledger entirely, which is why transfer/swap
/// events carry a variable-length vector of these rather than a fixed pair.
#[derive(Clone, Debug)]
pub struct EventOutput {
    pub leaf_index: u64,
    pub commitment: Field,
    pub encrypted_note: [u8; ENCRYPTED_NOTE_SIZE],
}

#[derive(Clone, Debug)]
pub struct ShieldEvent {
    pub pool_id: PoolId,
    pub output: EventOutput,
    pub block_height: u64,
    pub transaction_index: u64,
}

#[derive(Clone, Debug)]
pub struct TransferEvent {
    pub pool_id: PoolId,
    pub nullifiers: [Field; 2],
    /// Zero, one, or two outputs, in on-chain emission order.
    pub outputs: Vec<EventOutput>,
    pub block_height: u64,
    pub transaction_index: u64,
}

#[derive(Clone, Debug)]
pub struct SwapEvent {
    pub pool_id: PoolId,
    pub nullifiers: [Field; 2],
    pub outputs: Vec<EventOutput>,
    pub block_height: u64,
    pub transaction_index: u64,
}

/// A single event from the pool's append-only event stream. Events are
/// ordered by `(block_height, transaction_index, intra_tx_output_index)`;
/// the scanner inserts their commitments into the local tree in that order.
#[derive(Clone, Debug)]
pub enum PoolEvent {
    Shield(ShieldEvent),
    Transfer(TransferEvent),
    Swap(SwapEvent),
}

impl PoolEvent {
    pub fn block_height(&self) -> u64 {
        match self {
            PoolEvent::Shield(e) => e.block_height,
            PoolEvent::Transfer(e) => e.block_height,
            PoolEvent::Swap(e) => e.block_height,
        }
    }

    pub fn transaction_index(&self) -> u64 {
        match self {
            PoolEvent::Shield(e) => e.transaction_index,
            PoolEvent::Transfer(e) => e.transaction_index,
            PoolEvent::Swap(e) => e.transaction_index,
        }
    }

    /// The outputs carried by this event, in intra-transaction order, paired
    /// with the nullifiers it consumes (empty for a shield).
    pub fn outputs(&self) -> &[EventOutput] {
        match self {
            PoolEvent::Shield(e) => std::slice::from_ref(&e.output),
            PoolEvent::Transfer(e) => &e.outputs,
            PoolEvent::Swap(e) => &e.outputs,
        }
    }

    pub fn nullifiers(&self) -> &[Field] {
        match self {
            PoolEvent::Shield(_) => &[],
            PoolEvent::Transfer(e) => &e.nullifiers,
            PoolEvent::Swap(e) => &e.nullifiers,
        }
    }
}
