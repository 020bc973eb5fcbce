//! Note encryption: X25519 ECDH + HKDF-SHA256 + ChaCha20-Poly1305, with a
//! fixed 188-byte ciphertext layout so a scanner can recognize candidate
//! note ciphertexts on sight without a length prefix:
//!
//! ```text
//! ephemeral_pk [32] || nonce [12] || ciphertext+tag [128 + 16]
//! ```
//!
//! Plaintext is `BE32(nsk) || BE32(token) || BE32(value) || BE32(random)`.

use crate::field::{field_from_be_bytes, field_to_be_bytes, Field};
use crate::notes::Note;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use hkdf::Hkdf;
use octopus_types::{
    OctopusError, OctopusResult, AEAD_NONCE_SIZE, AEAD_TAG_SIZE, ENCRYPTED_NOTE_SIZE,
    EPHEMERAL_PUBLIC_KEY_SIZE, NOTE_ENCRYPTION_HKDF_INFO, NOTE_PLAINTEXT_SIZE,
};
use sha2::Sha256;
use x25519_dalek::{PublicKey as XPublicKey, StaticSecret as XPrivateKey};

fn derive_aead_key(shared_secret: &x25519_dalek::SharedSecret) -> [u8; 32] {
    let hk = Hkdf::<Sha256>::new(None, shared_secret.as_bytes());
    let mut key = [0u8; 32];
    hk.expand(NOTE_ENCRYPTION_HKDF_INFO, &mut key)
        .expect("32 bytes is a valid HKDF-SHA256 output length");
    key
}

fn note_to_plaintext(note: &Note) -> [u8; NOTE_PLAINTEXT_SIZE] {
    let mut out = [0u8; NOTE_PLAINTEXT_SIZE];
    out[0..32].copy_from_slice(&field_to_be_bytes(&note.nsk));
    out[32..64].copy_from_slice(&field_to_be_bytes(&note.token));
    out[64..96].copy_from_slice(&field_to_be_bytes(&Field::from(note.value)));
    out[96..128].copy_from_slice(&field_to_be_bytes(&note.random));
    out
}

fn plaintext_to_note(bytes: &[u8]) -> OctopusResult<Note> {
    if bytes.len() != NOTE_PLAINTEXT_SIZE {
        return Err(OctopusError::InvalidLength(format!(
            "expected {NOTE_PLAINTEXT_SIZE}-byte note plaintext, got {}",
            bytes.len()
        )));
    }
    let nsk = field_from_be_bytes(&bytes[0..32])?;
    let token = field_from_be_bytes(&bytes[32..64])?;
    let value_field = field_from_be_bytes(&bytes[64..96])?;
    let random = field_from_be_bytes(&bytes[96..128])?;

    let value = value_to_u64(value_field)?;
    Ok(Note {
        nsk,
        token,
        value,
        random,
    })
}

fn value_to_u64(value: Field) -> OctopusResult<u64> {
    use ark_ff::{BigInteger, PrimeField};
    let bigint = value.into_bigint();
    let limbs = bigint.as_ref();
    if limbs[1..].iter().any(|&limb| limb != 0) {
        return Err(OctopusError::InvalidFieldElement(
            "note value exceeds u64 range".into(),
        ));
    }
    Ok(limbs[0])
}

/// Encrypts `note` for `recipient_viewing_pub`. Generates a fresh ephemeral
/// X25519 keypair per call; the ephemeral public key travels with the
/// ciphertext so the recipient can redo the ECDH without prior contact.
pub fn encrypt_note(note: &Note, recipient_viewing_pub: &XPublicKey) -> [u8; ENCRYPTED_NOTE_SIZE] {
    let ephemeral_secret = XPrivateKey::random_from_rng(rand::thread_rng());
    let ephemeral_public = XPublicKey::from(&ephemeral_secret);
    let shared = ephemeral_secret.diffie_hellman(recipient_viewing_pub);
    let key = derive_aead_key(&shared);

    let nonce_bytes = crate::random_bytes::<AEAD_NONCE_SIZE>();
    let cipher = ChaCha20Poly1305::new_from_slice(&key).expect("32-byte key");
    let plaintext = note_to_plaintext(note);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_ref())
        .expect("ChaCha20-Poly1305 encryption of a fixed-size buffer cannot fail");

    let mut out = [0u8; ENCRYPTED_NOTE_SIZE];
    out[0..EPHEMERAL_PUBLIC_KEY_SIZE].copy_from_slice(ephemeral_public.as_bytes());
    out[EPHEMERAL_PUBLIC_KEY_SIZE..EPHEMERAL_PUBLIC_KEY_SIZE + AEAD_NONCE_SIZE]
        .copy_from_slice(&nonce_bytes);
    out[EPHEMERAL_PUBLIC_KEY_SIZE + AEAD_NONCE_SIZE..].copy_from_slice(&ciphertext);
    out
}

/// Attempts to decrypt and claim ownership of an encrypted note with
/// `viewing_private_key`/`master_public_key`. Returns `Ok(None)` — not an
/// error — when the ciphertext is not addressed to this recipient (AEAD
/// failure) or decrypts but fails the ownership check (wrong key reused
/// against a note encrypted for someone else). Any other malformed input is
/// a genuine error.
pub fn decrypt_note(
    ciphertext: &[u8],
    viewing_private_key: &XPrivateKey,
    master_public_key: Field,
) -> OctopusResult<Option<Note>> {
    if ciphertext.len() != ENCRYPTED_NOTE_SIZE {
        return Err(OctopusError::InvalidLength(format!(
            "expected a {ENCRYPTED_NOTE_SIZE}-byte encrypted note, got {}",
            ciphertext.len()
        )));
    }

    let mut ephemeral_pk_bytes = [0u8; EPHEMERAL_PUBLIC_KEY_SIZE];
    ephemeral_pk_bytes.copy_from_slice(&ciphertext[0..EPHEMERAL_PUBLIC_KEY_SIZE]);
    let ephemeral_pk = XPublicKey::from(ephemeral_pk_bytes);

    let nonce = &ciphertext
        [EPHEMERAL_PUBLIC_KEY_SIZE..EPHEMERAL_PUBLIC_KEY_SIZE + AEAD_NONCE_SIZE];
    let encrypted_payload = &ciphertext[EPHEMERAL_PUBLIC_KEY_SIZE + AEAD_NONCE_SIZE..];
    debug_assert_eq!(encrypted_payload.len(), NOTE_PLAINTEXT_SIZE + AEAD_TAG_SIZE);

    let shared = viewing_private_key.diffie_hellman(&ephemeral_pk);
    let key = derive_aead_key(&shared);
    let cipher = ChaCha20Poly1305::new_from_slice(&key).expect("32-byte key");

    let plaintext = match cipher.decrypt(Nonce::from_slice(nonce), encrypted_payload) {
        Ok(p) => p,
        Err(_) => return Ok(None),
    };

    let note = match plaintext_to_note(&plaintext) {
        Ok(n) => n,
        Err(_) => return Ok(None),
    };

    if !note.is_owned_by(master_public_key) {
        return Ok(None);
    }

    Ok(Some(note))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Keypair;

    #[test]
    fn round_trip_decrypts_to_the_same_note() {
        let keypair = Keypair::random();
        let (viewing_priv, viewing_pub) = keypair.viewing_keypair();
        let note = Note::new(keypair.master_public_key, Field::from(77u64), 1_000, None);

        let ciphertext = encrypt_note(&note, &viewing_pub);
        let decrypted = decrypt_note(&ciphertext, &viewing_priv, keypair.master_public_key)
            .unwrap()
            .expect("note should decrypt for its own recipient");

        assert_eq!(decrypted.nsk, note.nsk);
        assert_eq!(decrypted.token, note.token);
        assert_eq!(decrypted.value, note.value);
        assert_eq!(decrypted.random, note.random);
    }

    #[test]
    fn wrong_recipient_is_not_my_note() {
        let sender_keypair = Keypair::random();
        let wrong_keypair = Keypair::random();
        let (_, recipient_pub) = sender_keypair.viewing_keypair();
        let note = Note::new(sender_keypair.master_public_key, Field::from(1u64), 5, None);

        let ciphertext = encrypt_note(&note, &recipient_pub);
        let (wrong_priv, _) = wrong_keypair.viewing_keypair();
        let result = decrypt_note(&ciphertext, &wrong_priv, wrong_keypair.master_public_key).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn tampered_ciphertext_is_not_my_note() {
        let keypair = Keypair::random();
        let (viewing_priv, viewing_pub) = keypair.viewing_keypair();
        let note = Note::new(keypair.master_public_key, Field::from(3u64), 9, None);

        let mut ciphertext = encrypt_note(&note, &viewing_pub);
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0xFF;

        let result = decrypt_note(&ciphertext, &viewing_priv, keypair.master_public_key).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn rejects_wrong_length() {
        let keypair = Keypair::random();
        let (viewing_priv, _) = keypair.viewing_keypair();
        let result = decrypt_note(&[0u8; 10], &viewing_priv, keypair.master_public_key);
        assert!(result.is_err());
    }
}
