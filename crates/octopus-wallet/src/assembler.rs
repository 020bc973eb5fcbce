//! Assembles the byte-exact on-chain call payloads for each operation
//! Pure functions: no signing, no network, no proving — the caller
//! supplies the already-generated proof bytes and encrypted notes, and gets
//! back the argument list a transaction-building layer posts on-chain.

use octopus_crypto::witness::{SwapPublicInputs, TransferPublicInputs, UnshieldPublicInputs};
use octopus_crypto::{serialize_proof, serialize_public_inputs};
use octopus_types::{OctopusResult, PoolId, ENCRYPTED_NOTE_SIZE, GROTH16_PROOF_SIZE};

/// `shield` call arguments: pool-ref, coin-ref, the new leaf's commitment,
/// and its encrypted note.
#[derive(Clone, Debug)]
pub struct ShieldCall {
    pub pool_id: PoolId,
    pub coin_ref: String,
    pub commitment_le: [u8; 32],
    pub encrypted_note: [u8; ENCRYPTED_NOTE_SIZE],
}

pub fn build_shield_call(
    pool_id: PoolId,
    coin_ref: String,
    commitment_le: [u8; 32],
    encrypted_note: [u8; ENCRYPTED_NOTE_SIZE],
) -> ShieldCall {
    ShieldCall {
        pool_id,
        coin_ref,
        commitment_le,
        encrypted_note,
    }
}

/// `unshield` call arguments. `encrypted_change_note` is `None` when the
/// spend was exact and the change commitment is zero.
#[derive(Clone, Debug)]
pub struct UnshieldCall {
    pub pool_id: PoolId,
    pub proof_bytes: [u8; GROTH16_PROOF_SIZE],
    pub public_inputs_bytes: Vec<u8>,
    pub recipient_address: String,
    pub encrypted_change_note: Option<[u8; ENCRYPTED_NOTE_SIZE]>,
}

pub fn build_unshield_call(
    pool_id: PoolId,
    proof: &ark_groth16::Proof<ark_bn254::Bn254>,
    public_inputs: &UnshieldPublicInputs,
    recipient_address: String,
    encrypted_change_note: Option<[u8; ENCRYPTED_NOTE_SIZE]>,
) -> OctopusResult<UnshieldCall> {
    let proof_bytes = serialize_proof(proof)?;
    let signals = [
        public_inputs.merkle_root,
        public_inputs.nullifier,
        public_inputs.unshield_amount,
        public_inputs.change_commitment,
    ];
    Ok(UnshieldCall {
        pool_id,
        proof_bytes,
        public_inputs_bytes: serialize_public_inputs(&signals),
        recipient_address,
        encrypted_change_note,
    })
}

/// `transfer` call arguments. Outputs are a fixed two-element vector; a
/// zero-valued slot still carries an encrypted dummy note so observers
/// cannot distinguish a one-output transfer from a two-output one.
#[derive(Clone, Debug)]
pub struct TransferCall {
    pub pool_id: PoolId,
    pub proof_bytes: [u8; GROTH16_PROOF_SIZE],
    pub public_inputs_bytes: Vec<u8>,
    pub encrypted_notes: [[u8; ENCRYPTED_NOTE_SIZE]; 2],
}

pub fn build_transfer_call(
    pool_id: PoolId,
    proof: &ark_groth16::Proof<ark_bn254::Bn254>,
    public_inputs: &TransferPublicInputs,
    encrypted_transfer_note: [u8; ENCRYPTED_NOTE_SIZE],
    encrypted_change_note: [u8; ENCRYPTED_NOTE_SIZE],
) -> OctopusResult<TransferCall> {
    let proof_bytes = serialize_proof(proof)?;
    let signals = [
        public_inputs.nullifier_1,
        public_inputs.nullifier_2,
        public_inputs.transfer_commitment,
        public_inputs.change_commitment,
        public_inputs.token,
        public_inputs.merkle_root,
    ];
    Ok(TransferCall {
        pool_id,
        proof_bytes,
        public_inputs_bytes: serialize_public_inputs(&signals),
        encrypted_notes: [encrypted_transfer_note, encrypted_change_note],
    })
}

/// `swap` call arguments.
#[derive(Clone, Debug)]
pub struct SwapCall {
    pub pool_in_ref: PoolId,
    pub pool_out_ref: PoolId,
    pub dex_pool_ref: String,
    pub proof_bytes: [u8; GROTH16_PROOF_SIZE],
    pub public_inputs_bytes: Vec<u8>,
    pub amount_in: u64,
    pub min_amount_out: u64,
    pub encrypted_output_note: [u8; ENCRYPTED_NOTE_SIZE],
    pub encrypted_change_note: [u8; ENCRYPTED_NOTE_SIZE],
}

#[allow(clippy::too_many_arguments)]
pub fn build_swap_call(
    pool_in_ref: PoolId,
    pool_out_ref: PoolId,
    dex_pool_ref: String,
    proof: &ark_groth16::Proof<ark_bn254::Bn254>,
    public_inputs: &SwapPublicInputs,
    amount_in: u64,
    min_amount_out: u64,
    encrypted_output_note: [u8; ENCRYPTED_NOTE_SIZE],
    encrypted_change_note: [u8; ENCRYPTED_NOTE_SIZE],
) -> OctopusResult<SwapCall> {
    let proof_bytes = serialize_proof(proof)?;
    let signals = [
        public_inputs.token_in,
        public_inputs.token_out,
        public_inputs.merkle_root,
        public_inputs.nullifier_1,
        public_inputs.nullifier_2,
        public_inputs.swap_data_hash,
        public_inputs.output_commitment,
        public_inputs.change_commitment,
    ];
    Ok(SwapCall {
        pool_in_ref,
        pool_out_ref,
        dex_pool_ref,
        proof_bytes,
        public_inputs_bytes: serialize_public_inputs(&signals),
        amount_in,
        min_amount_out,
        encrypted_output_note,
        encrypted_change_note,
    })
}
