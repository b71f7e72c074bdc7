use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::filesystem::FileSystem;

/// Open filesystems keyed by `scheme://user@authority/bucket`.
///
/// One registry is created per process at startup and handed to every
/// provider chain. Entries do not keep their filesystem alive: a key whose
/// filesystem has been dropped behaves as if it were never registered.
#[derive(Debug, Default)]
pub struct FileSystemRegistry {
    entries: Mutex<HashMap<String, Weak<FileSystem>>>,
}

impl FileSystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The live filesystem registered under `key`
    pub fn get(&self, key: &str) -> Option<Arc<FileSystem>> {
        let mut entries = self.entries.lock();
        match entries.get(key).map(Weak::upgrade) {
            Some(Some(fs)) => Some(fs),
            Some(None) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Register `fs` under its key unless a live filesystem already holds
    /// that key; returns whichever filesystem is registered afterwards.
    pub fn register(&self, fs: Arc<FileSystem>) -> Arc<FileSystem> {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(fs.key()).and_then(Weak::upgrade) {
            tracing::debug!("filesystem {} already registered", fs.key());
            return existing;
        }
        entries.retain(|_, fs| fs.strong_count() > 0);
        entries.insert(fs.key().to_string(), Arc::downgrade(&fs));
        fs
    }

    /// Entries held, live or not
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys with a live filesystem
    pub fn keys(&self) -> Vec<String> {
        let mut entries = self.entries.lock();
        entries.retain(|_, fs| fs.strong_count() > 0);
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        keys
    }
}
