//! Note construction, commitments, and nullifiers.

use crate::field::{field_from_u64, random_field, Field};
use crate::poseidon::{poseidon2, poseidon3};

/// A single shielded UTXO. `commitment` is always the Poseidon hash of the
/// other four fields and is never stored independently of them; a note with
/// `value == 0` is a dummy that exists only inside a witness and has no
/// on-chain presence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Note {
    pub nsk: Field,
    pub token: Field,
    pub value: u64,
    pub random: Field,
}

impl Note {
    /// Constructs a note owned by `master_public_key`, generating `random`
    /// if not provided.
    pub fn new(master_public_key: Field, token: Field, value: u64, random: Option<Field>) -> Self {
        let random = random.unwrap_or_else(random_field);
        let nsk = poseidon2(master_public_key, random);
        Self {
            nsk,
            token,
            value,
            random,
        }
    }

    /// A zero-value placeholder used to pad single-input witnesses. Its NSK
    /// still satisfies `nsk = Poseidon(mpk, random)` so it can sit at any
    /// leaf index without producing a nullifier collision with a real note,
    /// provided that index differs from the real input's.
    pub fn dummy(master_public_key: Field, token: Field) -> Self {
        Self::new(master_public_key, token, 0, None)
    }

    pub fn is_dummy(&self) -> bool {
        self.value == 0
    }

    /// `commitment = Poseidon(nsk, token, value)`.
    pub fn commitment(&self) -> Field {
        poseidon3(self.nsk, self.token, field_from_u64(self.value))
    }

    /// Recomputes the note's `nsk` from a candidate owner and checks it
    /// matches; this is the ownership test run during note decryption.
    pub fn is_owned_by(&self, master_public_key: Field) -> bool {
        poseidon2(master_public_key, self.random) == self.nsk
    }
}

/// `nullifier = Poseidon(nullifying_key, leaf_index)`. Deterministic given
/// the owning keypair and the leaf position; two distinct notes placed at
/// the same index intentionally produce the same nullifier (used to pick a
/// dummy input's index in single-input transfers).
pub fn compute_nullifier(nullifying_key: Field, leaf_index: u64) -> Field {
    poseidon2(nullifying_key, field_from_u64(leaf_index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commitment_is_pure_function_of_fields() {
        let mpk = Field::from(7u64);
        let token = Field::from(9u64);
        let random = Field::from(11u64);
        let n1 = Note::new(mpk, token, 100, Some(random));
        let n2 = Note::new(mpk, token, 100, Some(random));
        assert_eq!(n1.commitment(), n2.commitment());
    }

    #[test]
    fn ownership_check_round_trips() {
        let mpk = Field::from(7u64);
        let token = Field::from(9u64);
        let note = Note::new(mpk, token, 42, None);
        assert!(note.is_owned_by(mpk));
        assert!(!note.is_owned_by(Field::from(8u64)));
    }

    #[test]
    fn dummy_notes_have_zero_value() {
        let mpk = Field::from(7u64);
        let token = Field::from(9u64);
        let dummy = Note::dummy(mpk, token);
        assert!(dummy.is_dummy());
        assert!(dummy.is_owned_by(mpk));
    }

    #[test]
    fn nullifier_is_deterministic_and_index_sensitive() {
        let nk = Field::from(3u64);
        assert_eq!(compute_nullifier(nk, 5), compute_nullifier(nk, 5));
        assert_ne!(compute_nullifier(nk, 5), compute_nullifier(nk, 6));
    }

    #[test]
    fn same_index_collides_across_distinct_notes() {
        let nk = Field::from(3u64);
        // Two distinct notes at the same leaf index yield the same
        // nullifier, since it depends only on (nullifying_key, index).
        assert_eq!(compute_nullifier(nk, 0), compute_nullifier(nk, 0));
    }
}
