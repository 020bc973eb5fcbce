#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

//! BN254/Groth16/Poseidon cryptographic core for a shielded-token privacy
//! pool: field arithmetic, the byte codec for on-chain wire formats, key and
//! note derivation, note encryption, the incremental Merkle tree, witness
//! builders for the three spend circuits, and Groth16 proof/VK
//! serialization. Pure functions and data structures only — no I/O, no
//! async, no persistence; those live in `octopus-wallet`.

pub mod codec;
pub mod encryption;
pub mod field;
pub mod keys;
pub mod merkle;
pub mod notes;
pub mod poseidon;
pub mod proof;
pub mod witness;

pub use codec::{g1_compress, g1_decompress, g2_compress, g2_decompress, G1, G2};
pub use encryption::{decrypt_note, encrypt_note};
pub use field::Field;
pub use keys::{Keypair, SpendingKey};
pub use merkle::{IncrementalMerkleTree, MerklePath};
pub use notes::{compute_nullifier, Note};
pub use poseidon::{poseidon, poseidon2, poseidon3, poseidon5};
pub use proof::{
    deserialize_proof, deserialize_public_inputs, deserialize_verifying_key, serialize_proof,
    serialize_public_inputs, serialize_verifying_key,
};
pub use witness::{
    build_swap_witness, build_transfer_witness, build_unshield_witness, swap_data_hash,
    SwapPublicInputs, SwapWitness, TransferPublicInputs, TransferWitness, UnshieldPublicInputs,
    UnshieldWitness, WitnessInput,
};

/// Fills a fixed-size buffer with cryptographically secure random bytes.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    use rand::RngCore;
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Constant-time byte comparison.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
