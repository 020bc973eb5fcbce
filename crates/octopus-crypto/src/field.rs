//! BN254 scalar field element conversions.
//!
//! A "field element" throughout this crate is a non-negative integer reduced
//! modulo the BN254 scalar field order `r`. We use `ark_bn254::Fr` as the
//! in-memory representation and expose the two wire orderings the protocol
//! actually uses: little-endian (on-chain commitments/roots) and big-endian
//! (Groth16 verifier public inputs).

use ark_ff::{BigInteger, PrimeField};
use octopus_types::{OctopusError, OctopusResult};

/// A BN254 scalar field element.
pub type Field = ark_bn254::Fr;

/// Decodes a 32-byte little-endian buffer into a field element, reducing
/// modulo `r` if the buffer encodes a value `>= r`.
pub fn field_from_le_bytes(bytes: &[u8]) -> OctopusResult<Field> {
    if bytes.len() != 32 {
        return Err(OctopusError::InvalidLength(format!(
            "expected 32 bytes for a field element, got {}",
            bytes.len()
        )));
    }
    Ok(Field::from_le_bytes_mod_order(bytes))
}

/// Decodes a 32-byte big-endian buffer into a field element.
pub fn field_from_be_bytes(bytes: &[u8]) -> OctopusResult<Field> {
    if bytes.len() != 32 {
        return Err(OctopusError::InvalidLength(format!(
            "expected 32 bytes for a field element, got {}",
            bytes.len()
        )));
    }
    let mut le = bytes.to_vec();
    le.reverse();
    Ok(Field::from_le_bytes_mod_order(&le))
}

/// Encodes a field element as 32 little-endian bytes.
pub fn field_to_le_bytes(f: &Field) -> [u8; 32] {
    let mut out = [0u8; 32];
    let bytes = f.into_bigint().to_bytes_le();
    out[..bytes.len()].copy_from_slice(&bytes);
    out
}

/// Encodes a field element as 32 big-endian bytes.
pub fn field_to_be_bytes(f: &Field) -> [u8; 32] {
    let mut le = field_to_le_bytes(f);
    le.reverse();
    le
}

/// Returns a uniformly random field element, via rejection-free reduction of
/// 32 cryptographically random bytes modulo `r`.
pub fn random_field() -> Field {
    let bytes = crate::random_bytes::<32>();
    Field::from_le_bytes_mod_order(&bytes)
}

/// Encodes an unsigned 64-bit value as a field element, e.g. a leaf index.
pub fn field_from_u64(v: u64) -> Field {
    Field::from(v)
}
