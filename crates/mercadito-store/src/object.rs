//! # Object Storage
//!
//! The blob-storage seam used for product images: upload a blob, get a
//! serving URL, delete a blob. The in-memory implementation backs tests;
//! production wires a real bucket behind the same trait.

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// Blob storage for product images.
pub trait ObjectStorage: Send + Sync {
    /// Stores a blob under a generated ref and returns the ref.
    fn upload(&self, path: &str, bytes: Vec<u8>) -> StoreResult<String>;

    /// Serving URL for a stored ref.
    fn url(&self, object_ref: &str) -> StoreResult<String>;

    /// Deletes a stored blob.
    fn delete(&self, object_ref: &str) -> StoreResult<()>;
}

/// In-memory object storage keyed by ref.
#[derive(Debug, Default)]
pub struct MemoryObjectStorage {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, object_ref: &str) -> bool {
        self.objects
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains_key(object_ref)
    }
}

impl ObjectStorage for MemoryObjectStorage {
    fn upload(&self, path: &str, bytes: Vec<u8>) -> StoreResult<String> {
        let object_ref = format!("{}/{}", path.trim_matches('/'), Uuid::new_v4());
        self.objects
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(object_ref.clone(), bytes);
        Ok(object_ref)
    }

    fn url(&self, object_ref: &str) -> StoreResult<String> {
        if !self.contains(object_ref) {
            return Err(StoreError::not_found("Object", object_ref));
        }
        Ok(format!("memory://{object_ref}"))
    }

    fn delete(&self, object_ref: &str) -> StoreResult<()> {
        self.objects
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(object_ref)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("Object", object_ref))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_url_delete() {
        let storage = MemoryObjectStorage::new();

        let object_ref = storage.upload("products", vec![1, 2, 3]).unwrap();
        assert!(object_ref.starts_with("products/"));
        assert!(storage.url(&object_ref).unwrap().starts_with("memory://"));

        storage.delete(&object_ref).unwrap();
        assert!(storage.url(&object_ref).is_err());
        assert!(storage.delete(&object_ref).is_err());
    }
}
