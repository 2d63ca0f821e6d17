use crate::index::product_prefix;
use crate::{CoreError, FolderIndexEntry};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Default)]
pub struct MemoryIndex {
    entries: RwLock<BTreeMap<String, PathBuf>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl crate::index::FolderIndex for MemoryIndex {
    async fn find(&self, product_id: &str) -> Result<Option<FolderIndexEntry>, CoreError> {
        let prefix = product_prefix(product_id);
        Ok(self
            .entries
            .read()
            .iter()
            .find(|(k, _)| k.to_uppercase().starts_with(&prefix))
            .map(|(k, v)| FolderIndexEntry::new(k.clone(), v.clone())))
    }

    async fn list(&self) -> Result<Vec<FolderIndexEntry>, CoreError> {
        Ok(self
            .entries
            .read()
            .iter()
            .map(|(k, v)| FolderIndexEntry::new(k.clone(), v.clone()))
            .collect())
    }

    async fn upsert(&self, folder: &str, path: &Path) -> Result<(), CoreError> {
        self.entries
            .write()
            .insert(folder.to_string(), path.to_path_buf());
        Ok(())
    }

    async fn delete(&self, folder: &str) -> Result<(), CoreError> {
        self.entries.write().remove(folder);
        Ok(())
    }

    async fn rename(&self, old_folder: &str, entry: &FolderIndexEntry) -> Result<(), CoreError> {
        let mut m = self.entries.write();
        m.remove(old_folder);
        m.insert(entry.folder.clone(), entry.path.clone());
        Ok(())
    }

    async fn replace_all(&self, entries: &[FolderIndexEntry]) -> Result<(), CoreError> {
        let fresh: BTreeMap<String, PathBuf> = entries
            .iter()
            .map(|e| (e.folder.clone(), e.path.clone()))
            .collect();
        *self.entries.write() = fresh;
        Ok(())
    }
}
