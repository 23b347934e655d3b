//! The Merkle tree of secrets.
//!
//! An order split into N parts commits to N+1 secrets with a single root.
//! Leaf `i` is `keccak256(i as u64 LE ‖ keccak256(secret_i))`; internal nodes
//! hash the sorted pair `keccak256(min(a,b) ‖ max(a,b))`. Both conventions
//! are fixed by the cross-chain wire format — the EVM-side contracts walk
//! proofs with the same rules, and any deviation breaks proof compatibility
//! silently.

use crate::keccak::keccak256;
use crosslock_core::types::{Hashlock, SecretIndex};

/// Hash of leaf `index` committing to `secret_hash` (= keccak256 of the
/// secret itself).
pub fn leaf_hash(index: SecretIndex, secret_hash: &[u8; 32]) -> [u8; 32] {
    let mut buf = [0u8; 40];
    buf[..8].copy_from_slice(&index.to_le_bytes());
    buf[8..].copy_from_slice(secret_hash);
    keccak256(&buf)
}

/// Sorted-pair internal node hash.
pub fn node_hash(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(lo);
    buf[32..].copy_from_slice(hi);
    keccak256(&buf)
}

/// Walk `proof` upward from `leaf`. Accepts iff the iterated hash equals the
/// committed root. Sibling order per level is irrelevant under the
/// sorted-pair scheme, so the proof is just the sibling list.
pub fn verify_proof(leaf: [u8; 32], proof: &[[u8; 32]], root: &Hashlock) -> bool {
    let mut acc = leaf;
    for sibling in proof {
        acc = node_hash(&acc, sibling);
    }
    &acc == root.as_bytes()
}

// ── SecretTree ───────────────────────────────────────────────────────────────

/// Builder over a full set of secret hashes. The engine only ever verifies
/// proofs; this builder exists for clients and tests that need to produce
/// roots and proofs with the exact wire encoding.
pub struct SecretTree {
    /// layers[0] = leaves, last layer = [root]. A node without a sibling is
    /// promoted unchanged to the next layer.
    layers: Vec<Vec<[u8; 32]>>,
}

impl SecretTree {
    /// Build from `keccak256(secret_i)` values, in leaf order (index 0..=N).
    pub fn from_secret_hashes(secret_hashes: &[[u8; 32]]) -> Self {
        let leaves: Vec<[u8; 32]> = secret_hashes
            .iter()
            .enumerate()
            .map(|(i, h)| leaf_hash(i as SecretIndex, h))
            .collect();

        let mut layers = vec![leaves];
        while layers.last().map(|l| l.len()).unwrap_or(0) > 1 {
            let prev = layers.last().expect("non-empty layer stack");
            let mut next = Vec::with_capacity(prev.len().div_ceil(2));
            for pair in prev.chunks(2) {
                match pair {
                    [a, b] => next.push(node_hash(a, b)),
                    [lone] => next.push(*lone),
                    _ => unreachable!("chunks(2) yields 1 or 2 elements"),
                }
            }
            layers.push(next);
        }
        Self { layers }
    }

    /// Build directly from the secrets themselves.
    pub fn from_secrets<S: AsRef<[u8]>>(secrets: &[S]) -> Self {
        let hashes: Vec<[u8; 32]> = secrets.iter().map(|s| keccak256(s.as_ref())).collect();
        Self::from_secret_hashes(&hashes)
    }

    pub fn root(&self) -> Hashlock {
        let top = self
            .layers
            .last()
            .and_then(|l| l.first())
            .copied()
            .unwrap_or([0u8; 32]);
        Hashlock::from_bytes(top)
    }

    /// Sibling path for leaf `index`, bottom-up.
    pub fn proof(&self, index: SecretIndex) -> Vec<[u8; 32]> {
        let mut proof = Vec::new();
        let mut pos = index as usize;
        for layer in &self.layers[..self.layers.len().saturating_sub(1)] {
            let sibling = pos ^ 1;
            if sibling < layer.len() {
                proof.push(layer[sibling]);
            }
            pos /= 2;
        }
        proof
    }

    pub fn leaf_count(&self) -> usize {
        self.layers.first().map(|l| l.len()).unwrap_or(0)
    }
}
