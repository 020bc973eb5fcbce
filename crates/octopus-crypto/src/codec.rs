//! Byte encodings for the three wire boundaries this protocol crosses:
//! little-endian 32-byte words (on-chain commitments/roots/proof points),
//! big-endian 32-byte words (Groth16 verifier public inputs), and hex
//! (human-visible keys). Mixing little- and big-endian at a single boundary
//! makes proofs unverifiable on-chain, so every function here is explicit
//! about which it produces or expects.

use crate::field::{field_from_be_bytes, field_from_le_bytes, field_to_be_bytes, field_to_le_bytes, Field};
use ark_bn254::{g1::Config as G1Config, g2::Config as G2Config, Fq, Fq2};
use ark_ec::short_weierstrass::{Affine, SWCurveConfig};
use ark_ec::AffineRepr;
use ark_ff::{BigInteger, Field as ArkField, PrimeField, Zero};
use octopus_types::{OctopusError, OctopusResult};

/// BN254 G1 affine point.
pub type G1 = Affine<G1Config>;
/// BN254 G2 affine point.
pub type G2 = Affine<G2Config>;

/// Decodes a fixed-size little-endian field element.
pub fn le32_to_field(bytes: &[u8]) -> OctopusResult<Field> {
    field_from_le_bytes(bytes)
}

/// Encodes a field element as little-endian bytes (on-chain commitments/roots).
pub fn field_to_le32(f: &Field) -> [u8; 32] {
    field_to_le_bytes(f)
}

/// Decodes a fixed-size big-endian field element (Groth16 public input slot).
pub fn be32_to_field(bytes: &[u8]) -> OctopusResult<Field> {
    field_from_be_bytes(bytes)
}

/// Encodes a field element as big-endian bytes (Groth16 public input slot).
pub fn field_to_be32(f: &Field) -> [u8; 32] {
    field_to_be_bytes(f)
}

/// Encodes bytes as lowercase hex for human-visible keys.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decodes a hex string into exactly `N` bytes.
pub fn from_hex<const N: usize>(s: &str) -> OctopusResult<[u8; N]> {
    let decoded = hex::decode(s).map_err(|e| OctopusError::InvalidLength(e.to_string()))?;
    if decoded.len() != N {
        return Err(OctopusError::InvalidLength(format!(
            "expected {N} bytes, got {}",
            decoded.len()
        )));
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&decoded);
    Ok(out)
}

fn fq_to_le32(f: &Fq) -> [u8; 32] {
    let mut out = [0u8; 32];
    let bytes = f.into_bigint().to_bytes_le();
    out[..bytes.len()].copy_from_slice(&bytes);
    out
}

fn fq_from_le32(bytes: &[u8; 32]) -> Fq {
    Fq::from_le_bytes_mod_order(bytes)
}

/// Half of the BN254 base-field modulus minus one, used for the compressed
/// point sign convention: `y` is "large" when `y > (p-1)/2`.
fn fq_is_large(y: &Fq) -> bool {
    let neg_y = -*y;
    y.into_bigint() > neg_y.into_bigint()
}

/// Compresses a G1 point into the protocol's 32-byte wire format: little-
/// endian `x`, with the top bit of the last byte set when `y` is the larger
/// of the two square roots.
pub fn g1_compress(point: &G1) -> OctopusResult<[u8; 32]> {
    if point.is_zero() {
        return Err(OctopusError::InvalidFieldElement(
            "cannot compress the point at infinity".into(),
        ));
    }
    let mut out = fq_to_le32(&point.x);
    if fq_is_large(&point.y) {
        out[31] |= 0x80;
    }
    Ok(out)
}

/// Decompresses a 32-byte G1 point, reconstructing `y` from the curve
/// equation `y^2 = x^3 + b` and selecting the root indicated by the sign bit.
pub fn g1_decompress(bytes: &[u8; 32]) -> OctopusResult<G1> {
    let mut x_bytes = *bytes;
    let sign = (x_bytes[31] & 0x80) != 0;
    x_bytes[31] &= 0x7F;
    let x = fq_from_le32(&x_bytes);

    let y2 = x * x * x + G1Config::COEFF_A * x + G1Config::COEFF_B;
    let y = y2
        .sqrt()
        .ok_or_else(|| OctopusError::InvalidFieldElement("x is not on the BN254 G1 curve".into()))?;
    let y_is_large = fq_is_large(&y);
    let y = if y_is_large == sign { y } else { -y };
    Ok(G1::new(x, y))
}

fn fq2_to_le64(f: &Fq2) -> [u8; 64] {
    let mut out = [0u8; 64];
    out[..32].copy_from_slice(&fq_to_le32(&f.c0));
    out[32..].copy_from_slice(&fq_to_le32(&f.c1));
    out
}

fn fq2_from_le64(bytes: &[u8; 64]) -> Fq2 {
    let mut c0 = [0u8; 32];
    let mut c1 = [0u8; 32];
    c0.copy_from_slice(&bytes[..32]);
    c1.copy_from_slice(&bytes[32..]);
    Fq2::new(fq_from_le32(&c0), fq_from_le32(&c1))
}

/// Lexicographic comparison of `(c1, c0)` pairs, used for the G2 sign bit.
fn fq2_pair_larger(a: &Fq2, b: &Fq2) -> bool {
    (a.c1.into_bigint(), a.c0.into_bigint()) > (b.c1.into_bigint(), b.c0.into_bigint())
}

/// Compresses a G2 point into the protocol's 64-byte wire format: little-
/// endian `x.c0 || x.c1`, with the top bit of the last byte set when `y` is
/// lexicographically larger than `-y` (comparing `(c1, c0)` pairs).
pub fn g2_compress(point: &G2) -> OctopusResult<[u8; 64]> {
    if point.is_zero() {
        return Err(OctopusError::InvalidFieldElement(
            "cannot compress the point at infinity".into(),
        ));
    }
    let mut out = fq2_to_le64(&point.x);
    let neg_y = -point.y;
    if fq2_pair_larger(&point.y, &neg_y) {
        out[63] |= 0x80;
    }
    Ok(out)
}

/// Decompresses a 64-byte G2 point.
pub fn g2_decompress(bytes: &[u8; 64]) -> OctopusResult<G2> {
    let mut x_bytes = *bytes;
    let sign = (x_bytes[63] & 0x80) != 0;
    x_bytes[63] &= 0x7F;
    let x = fq2_from_le64(&x_bytes);

    let y2 = x * x * x + G2Config::COEFF_A * x + G2Config::COEFF_B;
    let y = y2
        .sqrt()
        .ok_or_else(|| OctopusError::InvalidFieldElement("x is not on the BN254 G2 curve".into()))?;
    let neg_y = -y;
    let y_is_large = fq2_pair_larger(&y, &neg_y);
    let y = if y_is_large == sign { y } else { -y };
    Ok(G2::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_std::UniformRand;

    #[test]
    fn g1_round_trip() {
        let mut rng = ark_std::test_rng();
        for _ in 0..20 {
            let point = G1::rand(&mut rng);
            let compressed = g1_compress(&point).unwrap();
            let decompressed = g1_decompress(&compressed).unwrap();
            assert_eq!(point, decompressed);
        }
    }

    #[test]
    fn g2_round_trip() {
        let mut rng = ark_std::test_rng();
        for _ in 0..20 {
            let point = G2::rand(&mut rng);
            let compressed = g2_compress(&point).unwrap();
            let decompressed = g2_decompress(&compressed).unwrap();
            assert_eq!(point, decompressed);
        }
    }

    #[test]
    fn le_be_differ_for_nonzero() {
        let f = Field::from(0x0102_0304u64);
        let le = field_to_le32(&f);
        let be = field_to_be32(&f);
        assert_ne!(le, be);
        assert_eq!(le32_to_field(&le).unwrap(), f);
        assert_eq!(be32_to_field(&be).unwrap(), f);
    }

    #[test]
    fn hex_round_trip() {
        let bytes = [0xAB; 32];
        let encoded = to_hex(&bytes);
        let decoded: [u8; 32] = from_hex(&encoded).unwrap();
        assert_eq!(bytes, decoded);
    }
}
