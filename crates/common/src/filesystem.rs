//! Storage-backed filesystem handles.

use std::fmt;
use std::sync::Arc;

use crate::attributes::{AttributeMap, AttributeValue};
use crate::channel::{FileChannel, OpenOptions, SeekableByteChannel};
use crate::client::StorageClient;
use crate::error::{FsError, Result};
use crate::path::StoragePath;
use crate::properties::{Properties, USERNAME};
use crate::provider::{AccessMode, FileSystemProvider};
use crate::uri::FileSystemUri;

/// A storage location a filesystem may use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStore {
    name: String,
}

impl FileStore {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for FileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// One live filesystem for a (endpoint, user, bucket) tuple.
///
/// Every operation is handed to the provider chain that built it, so the
/// chain's policies apply to all of its I/O.
#[derive(Debug)]
pub struct FileSystem {
    key: String,
    uri: FileSystemUri,
    properties: Properties,
    client: Arc<dyn StorageClient>,
    provider: Arc<dyn FileSystemProvider>,
    bucket: String,
}

impl FileSystem {
    /// A filesystem that only ever reports `bucket`
    pub fn for_bucket(
        key: String,
        uri: FileSystemUri,
        properties: Properties,
        client: Arc<dyn StorageClient>,
        provider: Arc<dyn FileSystemProvider>,
        bucket: &str,
    ) -> Self {
        tracing::trace!("for_bucket({}, {}, {})", key, uri, bucket);
        Self {
            key,
            uri,
            properties,
            client,
            provider,
            bucket: bucket.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn uri(&self) -> &FileSystemUri {
        &self.uri
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn provider(&self) -> &Arc<dyn FileSystemProvider> {
        &self.provider
    }

    pub fn path(&self, raw: &str) -> StoragePath {
        StoragePath::new(raw)
    }

    /// Storage locations visible through this filesystem.
    ///
    /// Reports the filesystem's own bucket when the account can see it
    /// (matched case-insensitively) and nothing otherwise; the account's
    /// other buckets are never revealed.
    pub async fn file_stores(&self) -> Result<Vec<FileStore>> {
        let bucket = &self.bucket;
        let buckets = self.client.list_buckets().await?;
        tracing::debug!("Checking for access permissions to {}", bucket);
        if buckets.iter().any(|name| name.eq_ignore_ascii_case(bucket)) {
            tracing::debug!("Granting access to {}", bucket);
            Ok(vec![FileStore {
                name: bucket.clone(),
            }])
        } else {
            tracing::debug!("Access not permitted to {}", bucket);
            Ok(Vec::new())
        }
    }

    fn session_id(&self) -> String {
        format!("[{}]", self.properties.get(USERNAME).unwrap_or_default())
    }

    pub async fn read_attributes(&self, path: &StoragePath) -> Result<AttributeMap> {
        self.provider.read_attributes(path).await
    }

    pub async fn set_attribute(
        &self,
        path: &StoragePath,
        name: &str,
        value: AttributeValue,
    ) -> Result<()> {
        self.provider.set_attribute(path, name, value).await
    }

    pub async fn read_dir(&self, dir: &StoragePath) -> Result<Vec<StoragePath>> {
        tracing::info!("ls {} {}", dir, self.session_id());
        self.provider.new_directory_stream(dir).await
    }

    pub async fn create_directory(&self, dir: &StoragePath) -> Result<()> {
        tracing::info!("mkdir {} {}", dir, self.session_id());
        self.provider.create_directory(dir).await
    }

    pub async fn delete(&self, path: &StoragePath) -> Result<()> {
        tracing::info!("rm {} {}", path, self.session_id());
        self.provider.delete(path).await
    }

    pub async fn delete_if_exists(&self, path: &StoragePath) -> Result<bool> {
        tracing::info!("rm (if exists) {} {}", path, self.session_id());
        self.provider.delete_if_exists(path).await
    }

    pub async fn copy(&self, source: &StoragePath, target: &StoragePath) -> Result<()> {
        tracing::info!("cp {} {} {}", source, target, self.session_id());
        self.provider.copy(source, target).await
    }

    pub async fn rename(&self, source: &StoragePath, target: &StoragePath) -> Result<()> {
        tracing::info!("mv {} {} {}", source, target, self.session_id());
        self.provider.move_path(source, target).await
    }

    pub async fn check_access(&self, path: &StoragePath, modes: &[AccessMode]) -> Result<()> {
        self.provider.check_access(path, modes).await
    }

    pub async fn exists(&self, path: &StoragePath) -> Result<bool> {
        match self.provider.check_access(path, &[]).await {
            Ok(()) => Ok(true),
            Err(FsError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn open(
        &self,
        path: &StoragePath,
        options: &OpenOptions,
    ) -> Result<Box<dyn SeekableByteChannel>> {
        tracing::info!("byte channel: {} {}", path, self.session_id());
        self.provider.new_byte_channel(path, options).await
    }

    pub async fn open_file(&self, path: &StoragePath, options: &OpenOptions) -> Result<FileChannel> {
        tracing::info!("channel: {} {}", path, self.session_id());
        self.provider.new_file_channel(path, options).await
    }

    pub async fn is_same_file(&self, first: &StoragePath, second: &StoragePath) -> Result<bool> {
        self.provider.is_same_file(first, second).await
    }

    pub async fn is_hidden(&self, path: &StoragePath) -> Result<bool> {
        self.provider.is_hidden(path).await
    }
}
