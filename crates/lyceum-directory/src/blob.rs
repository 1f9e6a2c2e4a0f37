//! In-memory blob store for tests and local runs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use lyceum_core::error::{LyceumError, LyceumResult};
use lyceum_core::external::BlobStore;

/// Keeps blobs in a shared map. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs.lock().expect("blob store lock").contains_key(key)
    }
}

impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> LyceumResult<String> {
        self.blobs
            .lock()
            .expect("blob store lock")
            .insert(key.to_owned(), bytes);
        Ok(key.to_owned())
    }

    async fn get(&self, key: &str) -> LyceumResult<Vec<u8>> {
        self.blobs
            .lock()
            .expect("blob store lock")
            .get(key)
            .cloned()
            .ok_or_else(|| LyceumError::BlobMissing {
                key: key.to_owned(),
            })
    }

    async fn delete(&self, key: &str) -> LyceumResult<()> {
        self.blobs
            .lock()
            .expect("blob store lock")
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| LyceumError::BlobMissing {
                key: key.to_owned(),
            })
    }
}
