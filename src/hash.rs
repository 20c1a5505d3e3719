//! Digest primitive and the 32 byte digest value stored in tree nodes

use crate::error::Error;
use sha2::digest::{consts::U32, Digest};
use std::{fmt, ops::Deref};

pub use blake2::Blake2s256;
pub use sha2::Sha256;
pub use sha3::Sha3_256;

/// Length in bytes of every digest produced by a [`DigestProvider`]
pub const DIGEST_LEN: usize = 32;

/// Hash function used to build and verify a tree.
///
/// Any RustCrypto hasher with a 32 byte output implements this, so a tree
/// can be built over SHA-256, SHA3-256 or BLAKE2s-256 by picking the type
/// parameter.
pub trait DigestProvider {
    /// Hash an arbitrary byte buffer
    fn hash(data: &[u8]) -> MerkleHash;

    /// Hash the concatenation of `left` and `right`, in that order. No
    /// separator or domain tag is mixed in.
    fn hash_pair(left: &[u8], right: &[u8]) -> MerkleHash;
}

impl<D> DigestProvider for D
where
    D: Digest<OutputSize = U32>,
{
    fn hash(data: &[u8]) -> MerkleHash {
        let mut result = [0u8; DIGEST_LEN];
        result.copy_from_slice(D::digest(data).as_slice());
        MerkleHash(result)
    }

    fn hash_pair(left: &[u8], right: &[u8]) -> MerkleHash {
        let mut hasher = D::new();
        let mut result = [0u8; DIGEST_LEN];

        hasher.update(left);
        hasher.update(right);
        result.copy_from_slice(hasher.finalize().as_slice());
        MerkleHash(result)
    }
}

/// Container for Merkle Hashes. Ordering is lexicographic over the bytes.
#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MerkleHash(pub [u8; DIGEST_LEN]);

impl MerkleHash {
    /// Copy a digest out of a slice that must be exactly [`DIGEST_LEN`] bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != DIGEST_LEN {
            return Err(Error::InvalidDigestLength(DIGEST_LEN, bytes.len()));
        }
        let mut result = [0u8; DIGEST_LEN];
        result.copy_from_slice(bytes);
        Ok(Self(result))
    }

    /// Parse a hex encoded digest, with or without a `0x` prefix
    pub fn from_hex(hex_str: &str) -> Result<Self, Error> {
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(hex_str).map_err(|e| Error::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Lowercase hex encoding without prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }
}

impl From<[u8; DIGEST_LEN]> for MerkleHash {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl Deref for MerkleHash {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for MerkleHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq<[u8; DIGEST_LEN]> for MerkleHash {
    fn eq(&self, other: &[u8; DIGEST_LEN]) -> bool {
        &self.0 == other
    }
}

impl fmt::Display for MerkleHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for MerkleHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MerkleHash({})", self.to_hex())
    }
}
