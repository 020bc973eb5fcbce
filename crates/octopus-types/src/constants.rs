//! Wire-layout sizes fixed by the protocol. Changing any of these breaks
//! compatibility with deployed circuits and the on-chain verifier.

/// BN254 scalar field elements, and most hashes/commitments, are 32 bytes
/// on the wire (either little-endian or big-endian depending on boundary).
pub const FIELD_ELEMENT_SIZE: usize = 32;

/// Depth of the incremental Merkle tree. Capacity is `2^MERKLE_TREE_DEPTH`.
pub const MERKLE_TREE_DEPTH: usize = 16;

/// Leaf capacity of the incremental Merkle tree.
pub const MERKLE_TREE_CAPACITY: u64 = 1 << MERKLE_TREE_DEPTH as u64;

/// Number of recent roots retained for proof-staleness checking.
pub const ROOT_HISTORY_SIZE: usize = 100;

/// Compressed Arkworks-style G1 point: 32-byte x plus a sign bit in the MSB.
pub const G1_COMPRESSED_SIZE: usize = 32;

/// Compressed Arkworks-style G2 point: two 32-byte base-field limbs plus a
/// sign bit in the MSB of the second limb.
pub const G2_COMPRESSED_SIZE: usize = 64;

/// `pi_a (32) || pi_b (64) || pi_c (32)`.
pub const GROTH16_PROOF_SIZE: usize = G1_COMPRESSED_SIZE + G2_COMPRESSED_SIZE + G1_COMPRESSED_SIZE;

/// Plaintext note layout: `nsk || token || value || random`, each 32 bytes.
pub const NOTE_PLAINTEXT_SIZE: usize = 4 * FIELD_ELEMENT_SIZE;

/// ChaCha20-Poly1305 nonce size.
pub const AEAD_NONCE_SIZE: usize = 12;

/// ChaCha20-Poly1305 authentication tag size.
pub const AEAD_TAG_SIZE: usize = 16;

/// X25519 ephemeral public key size.
pub const EPHEMERAL_PUBLIC_KEY_SIZE: usize = 32;

/// `ephemeral_pk (32) || nonce (12) || ciphertext+tag (128+16)`.
pub const ENCRYPTED_NOTE_SIZE: usize =
    EPHEMERAL_PUBLIC_KEY_SIZE + AEAD_NONCE_SIZE + NOTE_PLAINTEXT_SIZE + AEAD_TAG_SIZE;

/// HKDF info string binding derived keys to this protocol and version.
pub const NOTE_ENCRYPTION_HKDF_INFO: &[u8] = b"octopus-note-encryption-v1";
