//! The provider chain.
//!
//! Every storage operation passes through an ordered list of providers.
//! Each layer enforces one policy and hands everything else to the next
//! layer via [`FileSystemProvider::delegate`]; the innermost layer talks
//! to the storage client. Outermost first:
//!
//!  - [`SingleBucketProvider`]: one bucket per filesystem; builds the
//!    filesystem bound back to the whole chain
//!  - [`PerUserProvider`]: one filesystem per user
//!  - [`JailedProvider`]: the jail property must be present
//!  - [`PathEnhancingProvider`]: bucket and jail prefix on every path
//!  - [`PosixPermissionsProvider`]: synthetic permissions on reads
//!  - [`ChannelSupportProvider`]: file channels over byte channels
//!  - [`ObjectStoreProvider`]: object storage

use std::sync::Arc;

use async_trait::async_trait;

use crate::attributes::{AttributeMap, AttributeValue};
use crate::channel::{FileChannel, OpenOptions, SeekableByteChannel};
use crate::client::StorageClient;
use crate::enhancer::PathEnhancer;
use crate::error::{FsError, Result};
use crate::filesystem::FileSystem;
use crate::path::StoragePath;
use crate::properties::Properties;
use crate::registry::FileSystemRegistry;
use crate::uri::FileSystemUri;

mod base;
mod channel;
mod enhancing;
mod jailed;
mod per_user;
mod permissions;
mod single_bucket;

pub use base::{ObjectStoreProvider, DIRECTORY_MARKER};
pub use channel::ChannelSupportProvider;
pub use enhancing::PathEnhancingProvider;
pub use jailed::JailedProvider;
pub use per_user::PerUserProvider;
pub use permissions::PosixPermissionsProvider;
pub use single_bucket::SingleBucketProvider;

/// Access checked by [`FileSystemProvider::check_access`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
    Execute,
}

/// One layer of the provider chain.
///
/// Every method forwards to [`delegate`](Self::delegate) unless a layer
/// overrides it. A layer without a delegate answers
/// [`FsError::Unsupported`] for anything it does not implement itself.
#[async_trait]
pub trait FileSystemProvider: Send + Sync + std::fmt::Debug {
    /// The next layer inward, if any
    fn delegate(&self) -> Option<&dyn FileSystemProvider>;

    /// The next layer, or `Unsupported(operation)` at the end of the chain
    fn next(&self, operation: &'static str) -> Result<&dyn FileSystemProvider> {
        self.delegate().ok_or(FsError::Unsupported(operation))
    }

    /// The key a filesystem for `uri` and `props` is registered under.
    ///
    /// Two filesystems with the same key are the same filesystem.
    fn file_system_key(&self, uri: &FileSystemUri, props: &Properties) -> Result<String> {
        self.next("file_system_key")?.file_system_key(uri, props)
    }

    /// Copy the properties each layer needs from `env` into `props`.
    ///
    /// Layers run their inner layer first, then check their own
    /// preconditions; a missing required property fails construction.
    fn overload_properties(&self, props: &mut Properties, env: &Properties) -> Result<()> {
        self.next("overload_properties")?
            .overload_properties(props, env)
    }

    /// The storage client for a filesystem built with `props`
    fn storage_client(&self, props: &Properties) -> Result<Arc<dyn StorageClient>> {
        self.next("storage_client")?.storage_client(props)
    }

    /// The live filesystem registered under `key`
    fn registered_file_system(&self, key: &str) -> Option<Arc<FileSystem>> {
        self.delegate()
            .and_then(|next| next.registered_file_system(key))
    }

    /// Register `fs`, returning the filesystem that ends up registered
    fn register_file_system(&self, fs: Arc<FileSystem>) -> Arc<FileSystem> {
        match self.delegate() {
            Some(next) => next.register_file_system(fs),
            None => fs,
        }
    }

    /// The filesystem for `uri` and the environment `env`, reusing a
    /// registered one when it is still live.
    ///
    /// # Args
    /// - `uri`: connection URI of the storage account
    /// - `env`: session properties (username, bucket, home, jail)
    async fn get_file_system(
        &self,
        uri: &FileSystemUri,
        env: &Properties,
    ) -> Result<Arc<FileSystem>> {
        self.next("get_file_system")?.get_file_system(uri, env).await
    }

    /// Build a new filesystem from already overloaded properties
    async fn new_file_system(
        &self,
        uri: &FileSystemUri,
        props: &Properties,
    ) -> Result<Arc<FileSystem>> {
        self.next("new_file_system")?.new_file_system(uri, props).await
    }

    async fn read_attributes(&self, path: &StoragePath) -> Result<AttributeMap> {
        self.next("read_attributes")?.read_attributes(path).await
    }

    async fn set_attribute(
        &self,
        path: &StoragePath,
        name: &str,
        value: AttributeValue,
    ) -> Result<()> {
        self.next("set_attribute")?
            .set_attribute(path, name, value)
            .await
    }

    /// Entries of `dir`, as full storage paths
    async fn new_directory_stream(&self, dir: &StoragePath) -> Result<Vec<StoragePath>> {
        self.next("new_directory_stream")?
            .new_directory_stream(dir)
            .await
    }

    async fn create_directory(&self, dir: &StoragePath) -> Result<()> {
        self.next("create_directory")?.create_directory(dir).await
    }

    async fn delete(&self, path: &StoragePath) -> Result<()> {
        self.next("delete")?.delete(path).await
    }

    async fn delete_if_exists(&self, path: &StoragePath) -> Result<bool> {
        self.next("delete_if_exists")?.delete_if_exists(path).await
    }

    async fn copy(&self, source: &StoragePath, target: &StoragePath) -> Result<()> {
        self.next("copy")?.copy(source, target).await
    }

    async fn move_path(&self, source: &StoragePath, target: &StoragePath) -> Result<()> {
        self.next("move")?.move_path(source, target).await
    }

    async fn check_access(&self, path: &StoragePath, modes: &[AccessMode]) -> Result<()> {
        self.next("check_access")?.check_access(path, modes).await
    }

    async fn new_byte_channel(
        &self,
        path: &StoragePath,
        options: &OpenOptions,
    ) -> Result<Box<dyn SeekableByteChannel>> {
        self.next("new_byte_channel")?
            .new_byte_channel(path, options)
            .await
    }

    async fn new_file_channel(
        &self,
        path: &StoragePath,
        options: &OpenOptions,
    ) -> Result<FileChannel> {
        self.next("new_file_channel")?
            .new_file_channel(path, options)
            .await
    }

    async fn is_same_file(&self, first: &StoragePath, second: &StoragePath) -> Result<bool> {
        self.next("is_same_file")?.is_same_file(first, second).await
    }

    async fn is_hidden(&self, path: &StoragePath) -> Result<bool> {
        self.next("is_hidden")?.is_hidden(path).await
    }
}

/// Assemble the full chain around `client`, outermost layer returned
pub fn build_chain(
    enhancer: Arc<dyn PathEnhancer>,
    client: Arc<dyn StorageClient>,
    registry: Arc<FileSystemRegistry>,
) -> Arc<dyn FileSystemProvider> {
    tracing::trace!("build_chain({:?})", enhancer);
    let provider: Arc<dyn FileSystemProvider> = ObjectStoreProvider::new(client, registry);
    let provider = Arc::new(ChannelSupportProvider::new(provider));
    let provider = Arc::new(PosixPermissionsProvider::new(provider));
    let provider = Arc::new(PathEnhancingProvider::new(provider, enhancer));
    let provider = Arc::new(JailedProvider::new(provider));
    let provider = Arc::new(PerUserProvider::new(provider));
    SingleBucketProvider::new(provider)
}
