//! Content addressed binary Merkle tree with inclusion proofs

mod error;
mod hash;
mod tree;

pub use crate::{
    error::Error,
    hash::{Blake2s256, DigestProvider, MerkleHash, Sha256, Sha3_256, DIGEST_LEN},
    tree::{proof, verify, Leaves, MerkleProof, MerkleTree, Node},
};
