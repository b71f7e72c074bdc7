//! Username → filesystem cache shared by every session.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::filesystem::FileSystem;

/// Non-owning username → filesystem map.
///
/// A filesystem stays resolvable only while some session holds it. Once the
/// last session for a user drops its handle, `resolve` returns `None` and
/// the next session builds a fresh one. Dead entries are dropped when
/// looked up and swept whenever a new entry is stored, so the map never
/// holds more than the live filesystems plus the most recently dropped one.
#[derive(Debug, Default)]
pub struct UserFileSystemCache {
    entries: Mutex<HashMap<String, Weak<FileSystem>>>,
}

impl UserFileSystemCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, username: &str) -> Option<Arc<FileSystem>> {
        tracing::debug!("resolve({})", username);
        let mut entries = self.entries.lock();
        let fs = match entries.get(username).map(Weak::upgrade) {
            Some(Some(fs)) => Some(fs),
            Some(None) => {
                entries.remove(username);
                None
            }
            None => None,
        };
        tracing::trace!(" <= filesystem: {:?}", fs.as_ref().map(|fs| fs.key()));
        fs
    }

    pub fn put(&self, username: &str, fs: &Arc<FileSystem>) {
        tracing::trace!("put({}, {})", username, fs.key());
        let mut entries = self.entries.lock();
        entries.retain(|_, fs| fs.strong_count() > 0);
        entries.insert(username.to_string(), Arc::downgrade(fs));
    }

    /// Store `fs` for `username` unless a live filesystem is already cached,
    /// returning the cached one. Two sessions racing to build a filesystem
    /// for the same user both end up with the winner.
    pub fn put_if_absent(&self, username: &str, fs: Arc<FileSystem>) -> Arc<FileSystem> {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(username).and_then(Weak::upgrade) {
            return existing;
        }
        entries.retain(|_, fs| fs.strong_count() > 0);
        entries.insert(username.to_string(), Arc::downgrade(&fs));
        fs
    }

    /// Entries held, live or not
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries whose filesystem is gone
    pub fn purge(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, fs| fs.strong_count() > 0);
        before - entries.len()
    }
}
