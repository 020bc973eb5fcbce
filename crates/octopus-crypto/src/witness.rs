//! Witness builders for the three spend circuits. Each builder validates the
//! spend's invariants client-side before the expensive proving step and
//! produces public inputs in the exact order the on-chain verifier expects
//! the verifier expects; any reordering here invalidates every proof built from it.

use crate::field::Field;
use crate::keys::Keypair;
use crate::merkle::MerklePath;
use crate::notes::{compute_nullifier, Note};
use crate::poseidon::poseidon5;
use octopus_types::{OctopusError, OctopusResult};

/// Private witness data the prover consumes for an unshield spend.
#[derive(Clone, Debug)]
pub struct UnshieldWitness {
    pub input_note: Note,
    pub input_leaf_index: u64,
    pub input_path: MerklePath,
    pub unshield_amount: u64,
    pub change_note: Note,
}

/// Public signals in on-chain verifier order: `[merkle_root, nullifier,
/// unshield_amount, change_commitment]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnshieldPublicInputs {
    pub merkle_root: Field,
    pub nullifier: Field,
    pub unshield_amount: Field,
    pub change_commitment: Field,
}

/// Builds and validates an unshield witness. `unshield_amount` must be
/// strictly positive and no larger than the input note's value; any
/// remainder becomes a change note owned by the spender, or the zero
/// commitment if the spend is exact.
pub fn build_unshield_witness(
    keypair: &Keypair,
    input_note: Note,
    input_leaf_index: u64,
    input_path: MerklePath,
    unshield_amount: u64,
) -> OctopusResult<(UnshieldWitness, UnshieldPublicInputs)> {
    if !input_note.is_owned_by(keypair.master_public_key) {
        return Err(OctopusError::BalanceViolation(
            "input note is not owned by this keypair".into(),
        ));
    }
    if unshield_amount == 0 || unshield_amount > input_note.value {
        return Err(OctopusError::BalanceViolation(format!(
            "unshield_amount {unshield_amount} must be in (0, {}]",
            input_note.value
        )));
    }

    let merkle_root = input_path.compute_root(input_note.commitment());
    let nullifier = compute_nullifier(keypair.nullifying_key, input_leaf_index);
    let change_value = input_note.value - unshield_amount;

    let change_note = Note::new(keypair.master_public_key, input_note.token, change_value, None);
    let change_commitment = if change_value == 0 {
        Field::from(0u64)
    } else {
        change_note.commitment()
    };

    let public = UnshieldPublicInputs {
        merkle_root,
        nullifier,
        unshield_amount: Field::from(unshield_amount),
        change_commitment,
    };
    let witness = UnshieldWitness {
        input_note,
        input_leaf_index,
        input_path,
        unshield_amount,
        change_note,
    };
    Ok((witness, public))
}

/// One spendable input to a transfer/swap witness, or a dummy padding a
/// single-input spend. Dummy inputs carry an all-zero path and are exempt
/// from the Merkle-root equality check (the circuit bypasses it for any
/// input with `value == 0`).
#[derive(Clone, Debug)]
pub struct WitnessInput {
    pub note: Note,
    pub leaf_index: u64,
    pub path: MerklePath,
}

impl WitnessInput {
    pub fn dummy(keypair: &Keypair, token: Field, leaf_index: u64) -> Self {
        let note = Note::dummy(keypair.master_public_key, token);
        Self {
            note,
            leaf_index,
            path: MerklePath {
                leaf_index,
                siblings: [Field::from(0u64); octopus_types::MERKLE_TREE_DEPTH],
            },
        }
    }
}

/// Private witness data for a transfer spend (1-2 inputs, 2 outputs).
#[derive(Clone, Debug)]
pub struct TransferWitness {
    pub inputs: Vec<WitnessInput>,
    pub transfer_note: Note,
    pub change_note: Note,
}

/// Public signals in on-chain verifier order: `[nullifier_1, nullifier_2,
/// transfer_commitment, change_commitment, token, merkle_root]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferPublicInputs {
    pub nullifier_1: Field,
    pub nullifier_2: Field,
    pub transfer_commitment: Field,
    pub change_commitment: Field,
    pub token: Field,
    pub merkle_root: Field,
}

/// Builds and validates a transfer witness. `inputs` must have length 1 or
/// 2; a single real input is padded with a dummy at a distinct leaf index so
/// both nullifier slots are always populated. Every real input must carry
/// the same token and reconstruct the same Merkle root.
pub fn build_transfer_witness(
    sender: &Keypair,
    mut inputs: Vec<WitnessInput>,
    recipient_master_public_key: Field,
    transfer_value: u64,
) -> OctopusResult<(TransferWitness, TransferPublicInputs)> {
    if inputs.is_empty() || inputs.len() > 2 {
        return Err(OctopusError::BalanceViolation(
            "transfer requires one or two inputs".into(),
        ));
    }
    for input in &inputs {
        if !input.note.is_dummy() && !input.note.is_owned_by(sender.master_public_key) {
            return Err(OctopusError::BalanceViolation(
                "real input note is not owned by the sender".into(),
            ));
        }
    }
    let token = inputs
        .iter()
        .find(|i| !i.note.is_dummy())
        .map(|i| i.note.token)
        .ok_or_else(|| OctopusError::BalanceViolation("no non-dummy input".into()))?;
    if inputs.iter().any(|i| !i.note.is_dummy() && i.note.token != token) {
        return Err(OctopusError::BalanceViolation(
            "all inputs must share the same token".into(),
        ));
    }

    let real_root = {
        let mut roots = inputs
            .iter()
            .filter(|i| !i.note.is_dummy())
            .map(|i| i.path.compute_root(i.note.commitment()));
        let first = roots.next().expect("at least one real input");
        for other in roots {
            if other != first {
                return Err(OctopusError::MerkleRootMismatch(
                    "real inputs reconstruct different roots; rescan required".into(),
                ));
            }
        }
        first
    };

    if inputs.len() == 1 {
        let dummy_index = if inputs[0].leaf_index == 0 { 1 } else { 0 };
        inputs.push(WitnessInput::dummy(sender, token, dummy_index));
    }

    let total_input: u64 = inputs.iter().map(|i| i.note.value).sum();
    if transfer_value > total_input {
        return Err(OctopusError::BalanceViolation(format!(
            "transfer_value {transfer_value} exceeds total input value {total_input}"
        )));
    }
    let change_value = total_input - transfer_value;

    let transfer_note = Note::new(recipient_master_public_key, token, transfer_value, None);
    let change_note = Note::new(sender.master_public_key, token, change_value, None);

    let transfer_commitment = if transfer_value == 0 {
        Field::from(0u64)
    } else {
        transfer_note.commitment()
    };
    let change_commitment = if change_value == 0 {
        Field::from(0u64)
    } else {
        change_note.commitment()
    };

    let nullifier_1 = compute_nullifier(sender.nullifying_key, inputs[0].leaf_index);
    let nullifier_2 = compute_nullifier(sender.nullifying_key, inputs[1].leaf_index);

    let public = TransferPublicInputs {
        nullifier_1,
        nullifier_2,
        transfer_commitment,
        change_commitment,
        token,
        merkle_root: real_root,
    };
    let witness = TransferWitness {
        inputs,
        transfer_note,
        change_note,
    };
    Ok((witness, public))
}

/// Private witness data for a swap spend (2 inputs in `token_in`, 2 outputs:
/// `token_out` and change in `token_in`).
#[derive(Clone, Debug)]
pub struct SwapWitness {
    pub inputs: Vec<WitnessInput>,
    pub output_note: Note,
    pub change_note: Note,
    pub swap_data_hash: Field,
}

/// Public signals in on-chain verifier order: `[token_in, token_out,
/// merkle_root, nullifier_1, nullifier_2, swap_data_hash, output_commitment,
/// change_commitment]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapPublicInputs {
    pub token_in: Field,
    pub token_out: Field,
    pub merkle_root: Field,
    pub nullifier_1: Field,
    pub nullifier_2: Field,
    pub swap_data_hash: Field,
    pub output_commitment: Field,
    pub change_commitment: Field,
}

/// Binds the off-chain-executed DEX call to the proof: the circuit enforces
/// only this intent, not the DEX's realized output (that is checked
/// on-chain against `min_amount_out` by the ledger itself).
pub fn swap_data_hash(
    token_in: Field,
    token_out: Field,
    amount_in: u64,
    min_amount_out: u64,
    dex_pool_id: Field,
) -> Field {
    poseidon5(
        token_in,
        token_out,
        Field::from(amount_in),
        Field::from(min_amount_out),
        dex_pool_id,
    )
}

/// Builds and validates a swap witness. Requires exactly two inputs in
/// `token_in`, covering at least `amount_in`; `expected_output_amount` is
/// the client's off-chain DEX quote and becomes the output note's value.
#[allow(clippy::too_many_arguments)]
pub fn build_swap_witness(
    owner: &Keypair,
    inputs: Vec<WitnessInput>,
    token_in: Field,
    token_out: Field,
    amount_in: u64,
    min_amount_out: u64,
    expected_output_amount: u64,
    dex_pool_id: Field,
) -> OctopusResult<(SwapWitness, SwapPublicInputs)> {
    if inputs.len() != 2 {
        return Err(OctopusError::BalanceViolation(
            "swap requires exactly two inputs".into(),
        ));
    }
    for input in &inputs {
        if !input.note.is_owned_by(owner.master_public_key) {
            return Err(OctopusError::BalanceViolation(
                "input note is not owned by this keypair".into(),
            ));
        }
        if input.note.token != token_in {
            return Err(OctopusError::BalanceViolation(
                "swap inputs must carry token_in".into(),
            ));
        }
    }

    let root_0 = inputs[0].path.compute_root(inputs[0].note.commitment());
    let root_1 = inputs[1].path.compute_root(inputs[1].note.commitment());
    if root_0 != root_1 {
        return Err(OctopusError::MerkleRootMismatch(
            "swap inputs reconstruct different roots; rescan required".into(),
        ));
    }

    let total_input: u64 = inputs.iter().map(|i| i.note.value).sum();
    if total_input < amount_in {
        return Err(OctopusError::BalanceViolation(format!(
            "inputs sum to {total_input}, below amount_in {amount_in}"
        )));
    }
    let change_value = total_input - amount_in;

    let output_note = Note::new(owner.master_public_key, token_out, expected_output_amount, None);
    let change_note = Note::new(owner.master_public_key, token_in, change_value, None);

    let output_commitment = if expected_output_amount == 0 {
        Field::from(0u64)
    } else {
        output_note.commitment()
    };
    let change_commitment = if change_value == 0 {
        Field::from(0u64)
    } else {
        change_note.commitment()
    };

    let nullifier_1 = compute_nullifier(owner.nullifying_key, inputs[0].leaf_index);
    let nullifier_2 = compute_nullifier(owner.nullifying_key, inputs[1].leaf_index);
    let hash = swap_data_hash(token_in, token_out, amount_in, min_amount_out, dex_pool_id);

    let public = SwapPublicInputs {
        token_in,
        token_out,
        merkle_root: root_0,
        nullifier_1,
        nullifier_2,
        swap_data_hash: hash,
        output_commitment,
        change_commitment,
    };
    let witness = SwapWitness {
        inputs,
        output_note,
        change_note,
        swap_data_hash: hash,
    };
    Ok((witness, public))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::IncrementalMerkleTree;

    fn keypair(seed: u64) -> Keypair {
        Keypair::from_spending_key(&crate::keys::SpendingKey::from_field(Field::from(seed)))
    }

    #[test]
    fn unshield_exact_amount_has_zero_change_commitment() {
        let owner = keypair(1);
        let token = Field::from(5u64);
        let note = Note::new(owner.master_public_key, token, 100, None);

        let mut tree = IncrementalMerkleTree::new();
        let idx = tree.insert(note.commitment()).unwrap();
        let path = tree.path_for(idx).unwrap();

        let (_, public) = build_unshield_witness(&owner, note, idx, path, 100).unwrap();
        assert_eq!(public.change_commitment, Field::from(0u64));
        assert_eq!(public.unshield_amount, Field::from(100u64));
    }

    #[test]
    fn unshield_partial_amount_has_nonzero_change() {
        let owner = keypair(2);
        let token = Field::from(5u64);
        let note = Note::new(owner.master_public_key, token, 100, None);
        let mut tree = IncrementalMerkleTree::new();
        let idx = tree.insert(note.commitment()).unwrap();
        let path = tree.path_for(idx).unwrap();

        let (witness, public) = build_unshield_witness(&owner, note, idx, path, 40).unwrap();
        assert_eq!(witness.change_note.value, 60);
        assert_ne!(public.change_commitment, Field::from(0u64));
    }

    #[test]
    fn unshield_rejects_amount_exceeding_note_value() {
        let owner = keypair(3);
        let token = Field::from(5u64);
        let note = Note::new(owner.master_public_key, token, 100, None);
        let mut tree = IncrementalMerkleTree::new();
        let idx = tree.insert(note.commitment()).unwrap();
        let path = tree.path_for(idx).unwrap();

        let result = build_unshield_witness(&owner, note, idx, path, 101);
        assert!(result.is_err());
    }

    #[test]
    fn single_input_transfer_pads_a_dummy() {
        let sender = keypair(4);
        let recipient_mpk = Field::from(999u64);
        let token = Field::from(5u64);
        let note = Note::new(sender.master_public_key, token, 100, None);

        let mut tree = IncrementalMerkleTree::new();
        let idx = tree.insert(note.commitment()).unwrap();
        let path = tree.path_for(idx).unwrap();

        let input = WitnessInput {
            note,
            leaf_index: idx,
            path,
        };
        let (witness, public) =
            build_transfer_witness(&sender, vec![input], recipient_mpk, 60).unwrap();

        assert_eq!(witness.inputs.len(), 2);
        assert!(witness.inputs[1].note.is_dummy());
        assert_ne!(witness.inputs[0].leaf_index, witness.inputs[1].leaf_index);
        assert_eq!(witness.change_note.value, 40);
        assert_ne!(public.nullifier_1, public.nullifier_2);
    }

    #[test]
    fn exact_transfer_has_zero_change_commitment() {
        let sender = keypair(5);
        let recipient_mpk = Field::from(1000u64);
        let token = Field::from(5u64);
        let note = Note::new(sender.master_public_key, token, 100, None);
        let mut tree = IncrementalMerkleTree::new();
        let idx = tree.insert(note.commitment()).unwrap();
        let path = tree.path_for(idx).unwrap();

        let input = WitnessInput {
            note,
            leaf_index: idx,
            path,
        };
        let (_, public) = build_transfer_witness(&sender, vec![input], recipient_mpk, 100).unwrap();
        assert_eq!(public.change_commitment, Field::from(0u64));
    }

    #[test]
    fn transfer_rejects_mismatched_roots() {
        let sender = keypair(6);
        let token = Field::from(5u64);
        let note1 = Note::new(sender.master_public_key, token, 50, None);
        let note2 = Note::new(sender.master_public_key, token, 50, None);

        let mut tree1 = IncrementalMerkleTree::new();
        let idx1 = tree1.insert(note1.commitment()).unwrap();
        let path1 = tree1.path_for(idx1).unwrap();

        let mut tree2 = IncrementalMerkleTree::new();
        tree2.insert(Field::from(0xDEADu64)).unwrap();
        let idx2 = tree2.insert(note2.commitment()).unwrap();
        let path2 = tree2.path_for(idx2).unwrap();

        let inputs = vec![
            WitnessInput {
                note: note1,
                leaf_index: idx1,
                path: path1,
            },
            WitnessInput {
                note: note2,
                leaf_index: idx2,
                path: path2,
            },
        ];
        let result = build_transfer_witness(&sender, inputs, Field::from(1u64), 60);
        assert!(result.is_err());
    }

    #[test]
    fn swap_conserves_value() {
        let owner = keypair(7);
        let token_in = Field::from(1u64);
        let token_out = Field::from(2u64);
        let note1 = Note::new(owner.master_public_key, token_in, 60, None);
        let note2 = Note::new(owner.master_public_key, token_in, 60, None);

        let mut tree = IncrementalMerkleTree::new();
        let idx1 = tree.insert(note1.commitment()).unwrap();
        let idx2 = tree.insert(note2.commitment()).unwrap();
        let path1 = tree.path_for(idx1).unwrap();
        let path2 = tree.path_for(idx2).unwrap();

        let inputs = vec![
            WitnessInput {
                note: note1,
                leaf_index: idx1,
                path: path1,
            },
            WitnessInput {
                note: note2,
                leaf_index: idx2,
                path: path2,
            },
        ];

        let (witness, public) = build_swap_witness(
            &owner,
            inputs,
            token_in,
            token_out,
            100,
            95,
            98,
            Field::from(42u64),
        )
        .unwrap();

        assert_eq!(witness.change_note.value, 20);
        assert_eq!(witness.output_note.value, 98);
        assert_eq!(public.token_in, token_in);
        assert_eq!(public.token_out, token_out);
    }
}
