//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for tests and unsaved sessions.
#[derive(Default)]
pub struct MemoryStorage {
    projects: RwLock<HashMap<String, Value>>,
    /// When set, every save fails with this message.
    fail_saves: RwLock<Option<String>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent saves fail, simulating an unreachable backend.
    pub fn set_failing(&self, message: Option<&str>) {
        if let Ok(mut guard) = self.fail_saves.write() {
            *guard = message.map(str::to_string);
        }
    }

    fn lock_error(e: impl std::fmt::Display) -> StorageError {
        StorageError::Other(format!("Lock error: {}", e))
    }
}

impl Storage for MemoryStorage {
    fn save(&self, project_id: &str, value: &Value) -> BoxFuture<'_, StorageResult<()>> {
        let project_id = project_id.to_string();
        let value = value.clone();
        Box::pin(async move {
            let failure = self.fail_saves.read().map_err(Self::lock_error)?.clone();
            if let Some(message) = failure {
                return Err(StorageError::Io(message));
            }
            let mut projects = self.projects.write().map_err(Self::lock_error)?;
            projects.insert(project_id, value);
            Ok(())
        })
    }

    fn load(&self, project_id: &str) -> BoxFuture<'_, StorageResult<Value>> {
        let project_id = project_id.to_string();
        Box::pin(async move {
            let projects = self.projects.read().map_err(Self::lock_error)?;
            projects
                .get(&project_id)
                .cloned()
                .ok_or(StorageError::NotFound(project_id))
        })
    }

    fn delete(&self, project_id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let project_id = project_id.to_string();
        Box::pin(async move {
            let mut projects = self.projects.write().map_err(Self::lock_error)?;
            projects.remove(&project_id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let projects = self.projects.read().map_err(Self::lock_error)?;
            Ok(projects.keys().cloned().collect())
        })
    }

    fn exists(&self, project_id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let project_id = project_id.to_string();
        Box::pin(async move {
            let projects = self.projects.read().map_err(Self::lock_error)?;
            Ok(projects.contains_key(&project_id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::block_on;
    use serde_json::json;

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        let value = json!({ "version": 1, "objects": [] });

        block_on(storage.save("thumb", &value)).unwrap();
        let loaded = block_on(storage.load("thumb")).unwrap();
        assert_eq!(loaded, value);
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryStorage::new();
        let result = block_on(storage.load("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_exists_and_delete() {
        let storage = MemoryStorage::new();
        assert!(!block_on(storage.exists("thumb")).unwrap());
        block_on(storage.save("thumb", &json!({}))).unwrap();
        assert!(block_on(storage.exists("thumb")).unwrap());
        block_on(storage.delete("thumb")).unwrap();
        assert!(!block_on(storage.exists("thumb")).unwrap());
    }

    #[test]
    fn test_list() {
        let storage = MemoryStorage::new();
        block_on(storage.save("a", &json!({}))).unwrap();
        block_on(storage.save("b", &json!({}))).unwrap();

        let mut list = block_on(storage.list()).unwrap();
        list.sort();
        assert_eq!(list, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_failing_saves() {
        let storage = MemoryStorage::new();
        storage.set_failing(Some("offline"));
        assert!(matches!(
            block_on(storage.save("a", &json!({}))),
            Err(StorageError::Io(_))
        ));
        storage.set_failing(None);
        assert!(block_on(storage.save("a", &json!({}))).is_ok());
    }
}
