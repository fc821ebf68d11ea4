//! BLAKE3 helpers for document keys and lexical feature hashing.

use blake3::Hasher;

/// Computes a 64-bit hash of the input data using BLAKE3, truncated from 256 bits.
///
/// Used for in-memory memo keys and feature hashing, never for integrity checks.
/// With 64 bits the collision probability stays negligible at the corpus sizes this
/// crate targets (tens to low thousands of documents, a few million distinct terms).
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

/// Key for a document snapshot: identity plus modification time.
///
/// A separator byte keeps `("ab", 1)` and `("a", b1...)` style inputs apart.
#[inline]
pub fn document_key(id: &str, modified_nanos: i64) -> u64 {
    let mut hasher = Hasher::new();
    hasher.update(id.as_bytes());
    hasher.update(b"|");
    hasher.update(&modified_nanos.to_le_bytes());

    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

/// Maps a term to one of `buckets` feature-hash buckets.
///
/// `buckets` must be non-zero.
#[inline]
pub fn feature_bucket(term: &str, buckets: u32) -> u32 {
    debug_assert!(buckets > 0);
    (hash_to_u64(term.as_bytes()) % u64::from(buckets)) as u32
}
