//! Merkle Tree Errors

use displaydoc::Display;

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Error {
    /// Digest must be {0} bytes long, got {1}
    InvalidDigestLength(usize, usize),
    /// Invalid hex digest: {0}
    InvalidHex(String),
}

impl std::error::Error for Error {}
