//! Serializes Groth16 proofs and verifying keys to the fixed on-chain byte
//! layout, using the Arkworks-compatible compressed point encodings
//! from [`crate::codec`]. The prover itself is treated as an opaque external
//! collaborator: this module only converts its output to and from bytes.

use crate::codec::{
    field_to_be32, g1_compress, g1_decompress, g2_compress, g2_decompress, G1, G2,
};
use crate::field::{field_from_be_bytes, Field};
use ark_bn254::Bn254;
use ark_groth16::{Proof, VerifyingKey};
use octopus_types::{
    OctopusError, OctopusResult, G1_COMPRESSED_SIZE, G2_COMPRESSED_SIZE, GROTH16_PROOF_SIZE,
};

/// Serializes a Groth16 proof as `pi_a (32) || pi_b (64) || pi_c (32)`.
pub fn serialize_proof(proof: &Proof<Bn254>) -> OctopusResult<[u8; GROTH16_PROOF_SIZE]> {
    let a = g1_compress(&proof.a)?;
    let b = g2_compress(&proof.b)?;
    let c = g1_compress(&proof.c)?;

    let mut out = [0u8; GROTH16_PROOF_SIZE];
    out[0..G1_COMPRESSED_SIZE].copy_from_slice(&a);
    out[G1_COMPRESSED_SIZE..G1_COMPRESSED_SIZE + G2_COMPRESSED_SIZE].copy_from_slice(&b);
    out[G1_COMPRESSED_SIZE + G2_COMPRESSED_SIZE..].copy_from_slice(&c);
    Ok(out)
}

/// Inverse of [`serialize_proof`].
pub fn deserialize_proof(bytes: &[u8]) -> OctopusResult<Proof<Bn254>> {
    if bytes.len() != GROTH16_PROOF_SIZE {
        return Err(OctopusError::InvalidLength(format!(
            "expected a {GROTH16_PROOF_SIZE}-byte proof, got {}",
            bytes.len()
        )));
    }
    let mut a_bytes = [0u8; 32];
    let mut b_bytes = [0u8; 64];
    let mut c_bytes = [0u8; 32];
    a_bytes.copy_from_slice(&bytes[0..32]);
    b_bytes.copy_from_slice(&bytes[32..96]);
    c_bytes.copy_from_slice(&bytes[96..128]);

    Ok(Proof {
        a: g1_decompress(&a_bytes)?,
        b: g2_decompress(&b_bytes)?,
        c: g1_decompress(&c_bytes)?,
    })
}

/// Serializes public signals as big-endian 32-byte words, in the exact order
/// the caller supplies — the order a witness builder's `*PublicInputs`
/// struct defines for its circuit.
pub fn serialize_public_inputs(signals: &[Field]) -> Vec<u8> {
    let mut out = Vec::with_capacity(signals.len() * 32);
    for signal in signals {
        out.extend_from_slice(&field_to_be32(signal));
    }
    out
}

/// Inverse of [`serialize_public_inputs`].
pub fn deserialize_public_inputs(bytes: &[u8]) -> OctopusResult<Vec<Field>> {
    if bytes.len() % 32 != 0 {
        return Err(OctopusError::InvalidLength(format!(
            "public input bytes must be a multiple of 32, got {}",
            bytes.len()
        )));
    }
    bytes.chunks(32).map(field_from_be_bytes).collect()
}

/// Serializes a verifying key for one-time on-chain deployment:
/// `alpha_G1 (32) || beta_G2 (64) || gamma_G2 (64) || delta_G2 (64) ||
/// ic_len_u64_LE (8) || IC_G1 * ic_len (32 each)`.
pub fn serialize_verifying_key(vk: &VerifyingKey<Bn254>) -> OctopusResult<Vec<u8>> {
    let mut out = Vec::with_capacity(32 + 64 * 3 + 8 + vk.gamma_abc_g1.len() * 32);
    out.extend_from_slice(&g1_compress(&vk.alpha_g1)?);
    out.extend_from_slice(&g2_compress(&vk.beta_g2)?);
    out.extend_from_slice(&g2_compress(&vk.gamma_g2)?);
    out.extend_from_slice(&g2_compress(&vk.delta_g2)?);
    out.extend_from_slice(&(vk.gamma_abc_g1.len() as u64).to_le_bytes());
    for point in &vk.gamma_abc_g1 {
        out.extend_from_slice(&g1_compress(point)?);
    }
    Ok(out)
}

/// Inverse of [`serialize_verifying_key`].
pub fn deserialize_verifying_key(bytes: &[u8]) -> OctopusResult<VerifyingKey<Bn254>> {
    const HEADER: usize = 32 + 64 + 64 + 64;
    if bytes.len() < HEADER + 8 {
        return Err(OctopusError::InvalidLength(
            "verifying key buffer is shorter than its fixed header".into(),
        ));
    }
    let read_g1 = |b: &[u8]| -> OctopusResult<G1> {
        let mut arr = [0u8; 32];
        arr.copy_from_slice(b);
        g1_decompress(&arr)
    };
    let read_g2 = |b: &[u8]| -> OctopusResult<G2> {
        let mut arr = [0u8; 64];
        arr.copy_from_slice(b);
        g2_decompress(&arr)
    };

    let alpha_g1 = read_g1(&bytes[0..32])?;
    let beta_g2 = read_g2(&bytes[32..96])?;
    let gamma_g2 = read_g2(&bytes[96..160])?;
    let delta_g2 = read_g2(&bytes[160..224])?;

    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&bytes[224..232]);
    let ic_len = u64::from_le_bytes(len_bytes) as usize;

    let expected_len = 232 + ic_len * 32;
    if bytes.len() != expected_len {
        return Err(OctopusError::InvalidLength(format!(
            "expected {expected_len} bytes for {ic_len} IC points, got {}",
            bytes.len()
        )));
    }

    let mut gamma_abc_g1 = Vec::with_capacity(ic_len);
    for i in 0..ic_len {
        let start = 232 + i * 32;
        gamma_abc_g1.push(read_g1(&bytes[start..start + 32])?);
    }

    Ok(VerifyingKey {
        alpha_g1,
        beta_g2,
        gamma_g2,
        delta_g2,
        gamma_abc_g1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::UniformRand;

    fn random_proof() -> Proof<Bn254> {
        let mut rng = ark_std::test_rng();
        Proof {
            a: G1::rand(&mut rng),
            b: G2::rand(&mut rng),
            c: G1::rand(&mut rng),
        }
    }

    #[test]
    fn proof_round_trips() {
        let proof = random_proof();
        let bytes = serialize_proof(&proof).unwrap();
        assert_eq!(bytes.len(), GROTH16_PROOF_SIZE);
        let restored = deserialize_proof(&bytes).unwrap();
        assert_eq!(proof.a, restored.a);
        assert_eq!(proof.b, restored.b);
        assert_eq!(proof.c, restored.c);
    }

    #[test]
    fn public_inputs_round_trip() {
        let signals = vec![Field::from(1u64), Field::from(2u64), Field::from(3u64)];
        let bytes = serialize_public_inputs(&signals);
        assert_eq!(bytes.len(), 96);
        let restored = deserialize_public_inputs(&bytes).unwrap();
        assert_eq!(signals, restored);
    }

    #[test]
    fn verifying_key_round_trips() {
        let mut rng = ark_std::test_rng();
        let vk = VerifyingKey::<Bn254> {
            alpha_g1: G1::rand(&mut rng),
            beta_g2: G2::rand(&mut rng),
            gamma_g2: G2::rand(&mut rng),
            delta_g2: G2::rand(&mut rng),
            gamma_abc_g1: vec![G1::rand(&mut rng), G1::rand(&mut rng), G1::rand(&mut rng)],
        };
        let bytes = serialize_verifying_key(&vk).unwrap();
        let restored = deserialize_verifying_key(&bytes).unwrap();
        assert_eq!(vk.alpha_g1, restored.alpha_g1);
        assert_eq!(vk.beta_g2, restored.beta_g2);
        assert_eq!(vk.gamma_g2, restored.gamma_g2);
        assert_eq!(vk.delta_g2, restored.delta_g2);
        assert_eq!(vk.gamma_abc_g1, restored.gamma_abc_g1);
    }

    #[test]
    fn rejects_malformed_length() {
        assert!(deserialize_proof(&[0u8; 10]).is_err());
        assert!(deserialize_public_inputs(&[0u8; 10]).is_err());
    }
}
