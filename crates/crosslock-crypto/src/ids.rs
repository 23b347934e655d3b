use crosslock_core::types::{ObjectId, TxId};

/// Compute BLAKE3 hash of arbitrary bytes → 32-byte array.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Derive a TxId from the canonical transaction body bytes using BLAKE3.
pub fn tx_id_from_body(body_bytes: &[u8]) -> TxId {
    TxId::from_bytes(blake3_hash(body_bytes))
}

/// The id of the object a transaction publishes. One transaction publishes at
/// most one object, so the TxId itself is the seed.
pub fn object_id_from_tx(tx_id: &TxId) -> ObjectId {
    ObjectId(tx_id.clone())
}
