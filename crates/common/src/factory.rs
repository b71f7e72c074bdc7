//! Per-session filesystem construction.

use std::sync::Arc;

use crate::cache::UserFileSystemCache;
use crate::client::StorageClient;
use crate::enhancer::FixedPrefixPathEnhancer;
use crate::error::Result;
use crate::filesystem::FileSystem;
use crate::mapping::{SessionBucket, SessionHome, SessionJail};
use crate::properties::Properties;
use crate::provider::build_chain;
use crate::registry::FileSystemRegistry;
use crate::session::Session;
use crate::uri::FileSystemUri;

/// Hands each session the filesystem of its user, building one through a
/// fresh provider chain when no live filesystem is cached.
pub struct FileSystemFactory {
    bucket: Arc<dyn SessionBucket>,
    home: Arc<dyn SessionHome>,
    jail: Arc<dyn SessionJail>,
    uri: FileSystemUri,
    client: Arc<dyn StorageClient>,
    registry: Arc<FileSystemRegistry>,
    cache: Arc<UserFileSystemCache>,
}

impl std::fmt::Debug for FileSystemFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSystemFactory")
            .field("uri", &self.uri)
            .finish_non_exhaustive()
    }
}

impl FileSystemFactory {
    pub fn new(
        bucket: Arc<dyn SessionBucket>,
        home: Arc<dyn SessionHome>,
        jail: Arc<dyn SessionJail>,
        client: Arc<dyn StorageClient>,
        registry: Arc<FileSystemRegistry>,
        cache: Arc<UserFileSystemCache>,
    ) -> Self {
        Self {
            bucket,
            home,
            jail,
            uri: client.uri().clone(),
            client,
            registry,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<UserFileSystemCache> {
        &self.cache
    }

    /// The filesystem for `session`'s user
    pub async fn create_file_system(&self, session: &Session) -> Result<Arc<FileSystem>> {
        tracing::trace!("create_file_system({})", session);
        let username = session.username();
        if let Some(fs) = self.cache.resolve(username) {
            return Ok(fs);
        }

        let bucket = self.bucket.bucket(session);
        let home_dir = self.home.home(session);
        let jail = self.jail.jail(session);
        let env = Properties::for_session(username, &bucket, &home_dir, &jail);
        let enhancer = Arc::new(FixedPrefixPathEnhancer::for_bucket(&bucket, &jail));
        let provider = build_chain(enhancer, self.client.clone(), self.registry.clone());
        let fs = provider.get_file_system(&self.uri, &env).await?;
        tracing::debug!("filesystem for {}: {}", username, fs.key());
        Ok(self.cache.put_if_absent(username, fs))
    }
}
