use std::sync::Arc;

use async_trait::async_trait;

use super::{AccessMode, FileSystemProvider};
use crate::attributes::{AttributeMap, AttributeValue};
use crate::channel::{FileChannel, OpenOptions, SeekableByteChannel};
use crate::enhancer::PathEnhancer;
use crate::error::Result;
use crate::path::StoragePath;

/// Runs every path argument through a [`PathEnhancer`] before handing it on
#[derive(Debug)]
pub struct PathEnhancingProvider {
    delegate: Arc<dyn FileSystemProvider>,
    enhancer: Arc<dyn PathEnhancer>,
}

impl PathEnhancingProvider {
    pub fn new(delegate: Arc<dyn FileSystemProvider>, enhancer: Arc<dyn PathEnhancer>) -> Self {
        Self { delegate, enhancer }
    }

    fn add_bucket(&self, path: &StoragePath) -> StoragePath {
        let result = self.enhancer.apply(path);
        tracing::trace!("add_bucket({}) => {}", path, result);
        result
    }
}

#[async_trait]
impl FileSystemProvider for PathEnhancingProvider {
    fn delegate(&self) -> Option<&dyn FileSystemProvider> {
        Some(self.delegate.as_ref())
    }

    async fn read_attributes(&self, path: &StoragePath) -> Result<AttributeMap> {
        tracing::trace!("read_attributes({})", path);
        self.delegate.read_attributes(&self.add_bucket(path)).await
    }

    async fn set_attribute(
        &self,
        path: &StoragePath,
        name: &str,
        value: AttributeValue,
    ) -> Result<()> {
        tracing::trace!("set_attribute({}, {})", path, name);
        self.delegate
            .set_attribute(&self.add_bucket(path), name, value)
            .await
    }

    async fn new_directory_stream(&self, dir: &StoragePath) -> Result<Vec<StoragePath>> {
        tracing::trace!("new_directory_stream({})", dir);
        self.delegate.new_directory_stream(&self.add_bucket(dir)).await
    }

    async fn create_directory(&self, dir: &StoragePath) -> Result<()> {
        tracing::trace!("create_directory({})", dir);
        self.delegate.create_directory(&self.add_bucket(dir)).await
    }

    async fn delete(&self, path: &StoragePath) -> Result<()> {
        tracing::trace!("delete({})", path);
        self.delegate.delete(&self.add_bucket(path)).await
    }

    async fn delete_if_exists(&self, path: &StoragePath) -> Result<bool> {
        tracing::trace!("delete_if_exists({})", path);
        self.delegate.delete_if_exists(&self.add_bucket(path)).await
    }

    async fn copy(&self, source: &StoragePath, target: &StoragePath) -> Result<()> {
        tracing::trace!("copy({}, {})", source, target);
        self.delegate
            .copy(&self.add_bucket(source), &self.add_bucket(target))
            .await
    }

    async fn move_path(&self, source: &StoragePath, target: &StoragePath) -> Result<()> {
        tracing::trace!("move({}, {})", source, target);
        self.delegate
            .move_path(&self.add_bucket(source), &self.add_bucket(target))
            .await
    }

    async fn check_access(&self, path: &StoragePath, modes: &[AccessMode]) -> Result<()> {
        tracing::trace!("check_access({}, {:?})", path, modes);
        self.delegate.check_access(&self.add_bucket(path), modes).await
    }

    async fn new_byte_channel(
        &self,
        path: &StoragePath,
        options: &OpenOptions,
    ) -> Result<Box<dyn SeekableByteChannel>> {
        tracing::trace!("new_byte_channel({}, {:?})", path, options);
        self.delegate
            .new_byte_channel(&self.add_bucket(path), options)
            .await
    }

    async fn new_file_channel(
        &self,
        path: &StoragePath,
        options: &OpenOptions,
    ) -> Result<FileChannel> {
        tracing::trace!("new_file_channel({}, {:?})", path, options);
        self.delegate
            .new_file_channel(&self.add_bucket(path), options)
            .await
    }

    async fn is_same_file(&self, first: &StoragePath, second: &StoragePath) -> Result<bool> {
        tracing::trace!("is_same_file({}, {})", first, second);
        self.delegate
            .is_same_file(&self.add_bucket(first), &self.add_bucket(second))
            .await
    }

    async fn is_hidden(&self, path: &StoragePath) -> Result<bool> {
        tracing::trace!("is_hidden({})", path);
        self.delegate.is_hidden(&self.add_bucket(path)).await
    }
}
