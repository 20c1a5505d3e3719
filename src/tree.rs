//! Merkle Tree, Node and Merkle Proof types.

use crate::hash::{DigestProvider, MerkleHash, Sha256};
use std::{fmt, marker::PhantomData};
use tracing::{debug, trace};

/// A vertex of the tree. Leaves keep the original item, internal nodes own
/// exactly two children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf {
        digest: MerkleHash,
        data: Vec<u8>,
    },
    Internal {
        digest: MerkleHash,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    /// Create a leaf whose digest is the hash of `data`
    pub fn leaf<HF: DigestProvider>(data: Vec<u8>) -> Self {
        Node::Leaf {
            digest: HF::hash(&data),
            data,
        }
    }

    /// Create a parent from two children, hashing left then right
    pub fn internal<HF: DigestProvider>(left: Node, right: Node) -> Self {
        Node::Internal {
            digest: HF::hash_pair(left.digest(), right.digest()),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn digest(&self) -> &MerkleHash {
        match self {
            Node::Leaf { digest, .. } | Node::Internal { digest, .. } => digest,
        }
    }

    /// Original item bytes, only present on leaves
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            Node::Leaf { data, .. } => Some(data.as_slice()),
            Node::Internal { .. } => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    pub fn children(&self) -> Option<(&Node, &Node)> {
        match self {
            Node::Leaf { .. } => None,
            Node::Internal { left, right, .. } => Some((&**left, &**right)),
        }
    }

    /// Left-first depth first search for a leaf with digest `target`. On the
    /// way back up, every level pushes the sibling of the subtree that held
    /// the match, so `path` ends up ordered leaf to root.
    fn search(&self, target: &MerkleHash, path: &mut Vec<MerkleHash>) -> bool {
        match self {
            Node::Leaf { digest, .. } => digest == target,
            Node::Internal { left, right, .. } => {
                if left.search(target, path) {
                    path.push(*right.digest());
                    true
                } else if right.search(target, path) {
                    path.push(*left.digest());
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// Merkle Proof for an individual leaf: sibling digests ordered from the
/// leaf up to the root
pub struct MerkleProof<HF: DigestProvider = Sha256> {
    _hasher: PhantomData<HF>,
    /// Path through the tree to the root node
    pub(crate) path: Vec<MerkleHash>,
}

impl<HF: DigestProvider> MerkleProof<HF> {
    /// Wrap an externally supplied list of sibling digests
    pub fn new(path: Vec<MerkleHash>) -> Self {
        Self {
            _hasher: PhantomData,
            path,
        }
    }

    pub fn path(&self) -> &[MerkleHash] {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn into_inner(self) -> Vec<MerkleHash> {
        self.path
    }

    /// Compute the implied Merkle Root Hash for `data` from the path.
    ///
    /// At each step the running digest and the sibling are ordered by byte
    /// value, smaller first, before hashing. Sibling position in the tree is
    /// not recorded in the proof and is not consulted.
    pub fn compute_implied_root(&self, data: &[u8]) -> MerkleHash {
        let mut last_hash = HF::hash(data);
        for sibling in &self.path {
            last_hash = if last_hash <= *sibling {
                HF::hash_pair(&last_hash, sibling)
            } else {
                HF::hash_pair(sibling, &last_hash)
            };
        }
        last_hash
    }

    /// Check that `data` and this path lead to `root`
    pub fn verify(&self, data: &[u8], root: &MerkleHash) -> bool {
        let implied = self.compute_implied_root(data);
        if implied != *root {
            debug!(%implied, expected = %root, steps = self.path.len(), "merkle proof mismatch");
            return false;
        }
        true
    }
}

impl<HF: DigestProvider> Clone for MerkleProof<HF> {
    fn clone(&self) -> Self {
        Self::new(self.path.clone())
    }
}

impl<HF: DigestProvider> PartialEq for MerkleProof<HF> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl<HF: DigestProvider> Eq for MerkleProof<HF> {}

impl<HF: DigestProvider> From<Vec<MerkleHash>> for MerkleProof<HF> {
    fn from(path: Vec<MerkleHash>) -> Self {
        Self::new(path)
    }
}

impl<HF: DigestProvider> fmt::Debug for MerkleProof<HF> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerkleProof")
            .field("path", &self.path)
            .finish()
    }
}

/// Merkle Tree data structure, built once and immutable afterwards
pub struct MerkleTree<HF: DigestProvider = Sha256> {
    _hasher: PhantomData<HF>,
    pub(crate) root: Option<Node>,
    num_leaves: usize,
    height: usize,
}

impl<HF: DigestProvider> MerkleTree<HF> {
    /// Build a tree over `items`, keeping their order.
    ///
    /// Levels are folded pairwise left to right. An odd level pairs its last
    /// node with a copy of itself. A single item becomes the root leaf and
    /// no items give a tree without a root.
    pub fn build<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Vec<u8>>,
    {
        let mut level: Vec<Node> = items
            .into_iter()
            .map(|item| Node::leaf::<HF>(item.into()))
            .collect();
        let num_leaves = level.len();
        let mut height = 0usize;

        while level.len() > 1 {
            if level.len() & 1 == 1 {
                if let Some(last) = level.last().cloned() {
                    level.push(last);
                }
            }
            let mut next_level = Vec::with_capacity(level.len() / 2);
            let mut nodes = level.into_iter();
            while let (Some(left), Some(right)) = (nodes.next(), nodes.next()) {
                next_level.push(Node::internal::<HF>(left, right));
            }
            height += 1;
            trace!(height, width = next_level.len(), "folded merkle level");
            level = next_level;
        }

        let root = level.pop();
        debug!(
            num_leaves,
            height,
            root = %root.as_ref().map(|node| node.digest().to_hex()).unwrap_or_default(),
            "built merkle tree"
        );
        Self {
            _hasher: PhantomData,
            root,
            num_leaves,
            height,
        }
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    /// Get the merkle root of the tree, absent for an empty tree
    pub fn root_digest(&self) -> Option<MerkleHash> {
        self.root.as_ref().map(|node| *node.digest())
    }

    /// Lowercase hex of the root digest, or an empty string for an empty tree
    pub fn root_digest_hex(&self) -> String {
        self.root_digest()
            .map(|digest| digest.to_hex())
            .unwrap_or_default()
    }

    /// Number of items the tree was built from. Padding copies are not counted.
    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    /// Number of fold steps between the leaves and the root
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Original items in input order
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves {
            stack: self.root.iter().collect(),
            remaining: self.num_leaves,
        }
    }

    pub fn contains(&self, data: &[u8]) -> bool {
        self.proof_for(data).is_some()
    }

    /// Build an inclusion proof for `data`, or `None` if no leaf holds it.
    /// With duplicate items the leftmost matching leaf is used.
    pub fn proof_for(&self, data: &[u8]) -> Option<MerkleProof<HF>> {
        let root = self.root.as_ref()?;
        let target = HF::hash(data);
        let mut path = Vec::with_capacity(self.height);
        if root.search(&target, &mut path) {
            trace!(%target, steps = path.len(), "found merkle leaf");
            Some(MerkleProof::new(path))
        } else {
            trace!(%target, "merkle leaf not found");
            None
        }
    }
}

impl<HF: DigestProvider> Clone for MerkleTree<HF> {
    fn clone(&self) -> Self {
        Self {
            _hasher: PhantomData,
            root: self.root.clone(),
            num_leaves: self.num_leaves,
            height: self.height,
        }
    }
}

impl<HF: DigestProvider> fmt::Debug for MerkleTree<HF> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerkleTree")
            .field("root", &self.root_digest())
            .field("num_leaves", &self.num_leaves)
            .field("height", &self.height)
            .finish()
    }
}

/// In-order iterator over the items of a [`MerkleTree`]
#[derive(Debug)]
pub struct Leaves<'a> {
    stack: Vec<&'a Node>,
    remaining: usize,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        // Padding copies only ever sit to the right of every original item,
        // so stopping after `remaining` leaves skips them.
        if self.remaining == 0 {
            return None;
        }
        while let Some(node) = self.stack.pop() {
            match node {
                Node::Leaf { data, .. } => {
                    self.remaining -= 1;
                    return Some(data.as_slice());
                }
                Node::Internal { left, right, .. } => {
                    self.stack.push(&**right);
                    self.stack.push(&**left);
                }
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

/// Calculate a Merkle Proof for `data` from a tree
pub fn proof<HF: DigestProvider>(tree: &MerkleTree<HF>, data: &[u8]) -> Option<MerkleProof<HF>> {
    tree.proof_for(data)
}

/// Check `data` against a claimed root using a proof. Never fails, a bad or
/// foreign proof just yields `false`.
pub fn verify<HF: DigestProvider>(data: &[u8], proof: &MerkleProof<HF>, root: &MerkleHash) -> bool {
    proof.verify(data, root)
}
