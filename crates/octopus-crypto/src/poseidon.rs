//! Poseidon hashing over the BN254 scalar field.
//!
//! Commitments, nullifiers, and Merkle tree nodes all use Poseidon with the
//! standard `x^5` S-box, 8 full rounds, and a capacity of 1. The core needs
//! three arities — 2 (Merkle nodes, key derivation), 3 (note commitments),
//! and 5 (key-schedule-style hashes used by the witness builders) — so round
//! constants and the MDS matrix are generated once per arity via arkworks'
//! standard Grain-LFSR constant generator and cached behind a `OnceLock`.
//! Every concurrent first caller for a given arity waits on the same
//! initialization rather than racing to build the table twice.

use crate::field::Field;
use ark_crypto_primitives::sponge::{
    poseidon::{find_poseidon_ark_and_mds, PoseidonConfig, PoseidonSponge},
    CryptographicSponge,
};
use octopus_types::{OctopusError, OctopusResult};
use std::sync::OnceLock;

const FULL_ROUNDS: u64 = 8;
const ALPHA: u64 = 5;
const FIELD_BITS: u64 = 254;

fn partial_rounds_for_rate(rate: usize) -> u64 {
    match rate {
        2 => 57,
        3 => 56,
        5 => 60,
        other => panic!("unsupported poseidon arity {other}"),
    }
}

fn build_config(rate: usize) -> PoseidonConfig<Field> {
    let partial_rounds = partial_rounds_for_rate(rate);
    let (ark, mds) =
        find_poseidon_ark_and_mds::<Field>(FIELD_BITS, rate, FULL_ROUNDS, partial_rounds, 0);
    PoseidonConfig {
        full_rounds: FULL_ROUNDS as usize,
        partial_rounds: partial_rounds as usize,
        alpha: ALPHA,
        ark,
        mds,
        rate,
        capacity: 1,
    }
}

static CONFIG_ARITY_2: OnceLock<PoseidonConfig<Field>> = OnceLock::new();
static CONFIG_ARITY_3: OnceLock<PoseidonConfig<Field>> = OnceLock::new();
static CONFIG_ARITY_5: OnceLock<PoseidonConfig<Field>> = OnceLock::new();

fn config_for_arity(arity: usize) -> OctopusResult<&'static PoseidonConfig<Field>> {
    match arity {
        2 => Ok(CONFIG_ARITY_2.get_or_init(|| build_config(2))),
        3 => Ok(CONFIG_ARITY_3.get_or_init(|| build_config(3))),
        5 => Ok(CONFIG_ARITY_5.get_or_init(|| build_config(5))),
        other => Err(OctopusError::Configuration(format!(
            "poseidon arity {other} is not supported"
        ))),
    }
}

/// Hashes `inputs.len()` field elements (arity must be 2, 3, or 5) and
/// returns the first squeezed output, matching arkworks' `PoseidonSponge`
/// convention.
pub fn poseidon(inputs: &[Field]) -> Field {
    let config = config_for_arity(inputs.len()).expect("unsupported poseidon arity");
    let mut sponge = PoseidonSponge::new(config);
    for input in inputs {
        sponge.absorb(input);
    }
    sponge.squeeze_field_elements(1)[0]
}

/// Two-input Poseidon. Used for Merkle tree internal nodes and key schedules.
pub fn poseidon2(a: Field, b: Field) -> Field {
    poseidon(&[a, b])
}

/// Three-input Poseidon. Used for note commitments.
pub fn poseidon3(a: Field, b: Field, c: Field) -> Field {
    poseidon(&[a, b, c])
}

/// Five-input Poseidon. Used by the swap witness's binding hash.
pub fn poseidon5(a: Field, b: Field, c: Field, d: Field, e: Field) -> Field {
    poseidon(&[a, b, c, d, e])
}
