use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::KVError;

/// KVStore is the durable key-value interface the client keeps its session in.
///
/// Every write is committed before the call returns. The batch variants
/// commit all entries in a single transaction: either every key is written
/// (or removed) or none is.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Set a key-value pair, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), KVError>;

    /// Set several key-value pairs atomically.
    fn batch_set(&self, entries: &[(&str, &[u8])]) -> Result<(), KVError>;

    /// Delete several keys atomically.
    fn batch_delete(&self, keys: &[&str]) -> Result<(), KVError>;

    /// Scan all keys matching a prefix. Returns sorted (key, value) pairs.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;
}

/// Read a JSON-encoded value.
pub fn get_json<T: DeserializeOwned>(
    kv: &dyn KVStore,
    key: &str,
) -> Result<Option<T>, KVError> {
    match kv.get(key)? {
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| KVError::Serialization(format!("{}: {}", key, e))),
        None => Ok(None),
    }
}

/// Write a value as JSON.
pub fn set_json<T: Serialize>(kv: &dyn KVStore, key: &str, value: &T) -> Result<(), KVError> {
    let bytes = encode_json(key, value)?;
    kv.set(key, &bytes)
}

/// The bytes [`set_json`] would store under `key`, for use in a batch.
pub fn encode_json<T: Serialize>(key: &str, value: &T) -> Result<Vec<u8>, KVError> {
    serde_json::to_vec(value).map_err(|e| KVError::Serialization(format!("{}: {}", key, e)))
}
