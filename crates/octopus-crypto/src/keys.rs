//! Key derivation. A spending key is the only secret a user must back up;
//! every other secret — the nullifying key, the master public key, and the
//! X25519 viewing keypair — is a deterministic function of it.

use crate::field::{field_to_be_bytes, random_field, Field};
use crate::poseidon::poseidon2;
use sha2::{Digest, Sha256};
use x25519_dalek::{PublicKey as XPublicKey, StaticSecret as XPrivateKey};
use zeroize::Zeroize;

/// Standard Curve25519 scalar clamp, applied so the derived X25519 private
/// key is a valid Curve25519 scalar regardless of its entropy source.
fn clamp_scalar(mut bytes: [u8; 32]) -> [u8; 32] {
    bytes[0] &= 0xF8;
    bytes[31] &= 0x7F;
    bytes[31] |= 0x40;
    bytes
}

/// A keypair's spending key. Zeroized on drop; never serialized verbatim
/// except through explicit hex export for backup.
#[derive(Clone)]
pub struct SpendingKey(Field);

impl SpendingKey {
    pub fn from_field(f: Field) -> Self {
        Self(f)
    }

    pub fn random() -> Self {
        Self(random_field())
    }

    pub fn as_field(&self) -> Field {
        self.0
    }
}

impl Drop for SpendingKey {
    fn drop(&mut self) {
        self.0 = Field::from(0u64);
    }
}

impl std::fmt::Debug for SpendingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SpendingKey([REDACTED])")
    }
}

/// The full shielded keypair: a spending key and everything derived from it.
#[derive(Clone, Debug)]
pub struct Keypair {
    pub spending_key: Field,
    pub nullifying_key: Field,
    pub master_public_key: Field,
}

impl Keypair {
    /// Derives the full keypair from a spending key.
    ///
    /// `nullifying_key = Poseidon(spending_key, 1)`
    /// `master_public_key = Poseidon(spending_key, nullifying_key)`
    pub fn from_spending_key(spending_key: &SpendingKey) -> Self {
        let sk = spending_key.as_field();
        let nullifying_key = poseidon2(sk, Field::from(1u64));
        let master_public_key = poseidon2(sk, nullifying_key);
        Self {
            spending_key: sk,
            nullifying_key,
            master_public_key,
        }
    }

    pub fn random() -> Self {
        Self::from_spending_key(&SpendingKey::random())
    }

    /// Derives the deterministic X25519 viewing keypair from the spending
    /// key: `clamp(SHA-256(BE32(spending_key)))`. A pure function of the
    /// spending key; there is no path that derives a viewing key from the
    /// master public key alone.
    pub fn viewing_keypair(&self) -> (XPrivateKey, XPublicKey) {
        let mut hasher = Sha256::new();
        hasher.update(field_to_be_bytes(&self.spending_key));
        let digest: [u8; 32] = hasher.finalize().into();
        let mut clamped = clamp_scalar(digest);
        let secret = XPrivateKey::from(clamped);
        clamped.zeroize();
        let public = XPublicKey::from(&secret);
        (secret, public)
    }

    pub fn viewing_public_key(&self) -> XPublicKey {
        self.viewing_keypair().1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let sk = SpendingKey::from_field(Field::from(0x1u64));
        let kp1 = Keypair::from_spending_key(&sk);
        let kp2 = Keypair::from_spending_key(&SpendingKey::from_field(Field::from(0x1u64)));
        assert_eq!(kp1.nullifying_key, kp2.nullifying_key);
        assert_eq!(kp1.master_public_key, kp2.master_public_key);
    }

    #[test]
    fn viewing_keypair_is_pure_function_of_spending_key() {
        let kp = Keypair::from_spending_key(&SpendingKey::from_field(Field::from(0x2u64)));
        let (_, pub1) = kp.viewing_keypair();
        let (_, pub2) = kp.viewing_keypair();
        assert_eq!(pub1.as_bytes(), pub2.as_bytes());
    }

    #[test]
    fn different_spending_keys_diverge() {
        let kp1 = Keypair::from_spending_key(&SpendingKey::from_field(Field::from(1u64)));
        let kp2 = Keypair::from_spending_key(&SpendingKey::from_field(Field::from(2u64)));
        assert_ne!(kp1.master_public_key, kp2.master_public_key);
        assert_ne!(kp1.viewing_public_key().as_bytes(), kp2.viewing_public_key().as_bytes());
    }
}
