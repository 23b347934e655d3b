pub mod ids;
pub mod keccak;
pub mod merkle;

pub use ids::{blake3_hash, object_id_from_tx, tx_id_from_body};
pub use keccak::{hashlock_of, keccak256, verify_secret};
pub use merkle::{leaf_hash, node_hash, verify_proof, SecretTree};
