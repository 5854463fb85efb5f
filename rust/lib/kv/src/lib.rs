//! Durable key-value storage for client-side state.
//!
//! Keys are namespaced strings (`session:token`, `session:user`). Values are
//! raw bytes; [`get_json`] / [`set_json`] cover the serde case.

pub mod error;
pub mod memory;
pub mod redb;
pub mod traits;

pub use error::KVError;
pub use memory::MemoryStore;
pub use redb::RedbStore;
pub use traits::{encode_json, get_json, set_json, KVStore};
