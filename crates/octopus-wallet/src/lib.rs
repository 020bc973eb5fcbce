#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

//! Scanner, owned-note ledger, spend planning, and on-chain call-payload
//! assembly for a shielded-token wallet. Builds on `octopus-crypto`'s pure
//! cryptographic primitives; everything with I/O, persistence, or async
//! lives here instead.

pub mod assembler;
pub mod events;
pub mod scanner;
pub mod selection;
pub mod storage;
pub mod wallet;

pub use assembler::{
    build_shield_call, build_swap_call, build_transfer_call, build_unshield_call, ShieldCall,
    SwapCall, TransferCall, UnshieldCall,
};
pub use events::{EventOutput, PoolEvent, ShieldEvent, SwapEvent, TransferEvent};
pub use scanner::{scan_once, EventSource, OwnedNote, Scanner};
pub use selection::{select_for_transfer, select_for_unshield};
pub use storage::{FileScanStorage, MemoryScanStorage, PersistedOwnedNote, ScanStorage, ScanState};
pub use wallet::{SwapPlan, TransferPlan, UnshieldPlan, Wallet};
