use std::sync::{Arc, Weak};

use async_trait::async_trait;

use super::FileSystemProvider;
use crate::error::{FsError, Result};
use crate::filesystem::FileSystem;
use crate::properties::{Properties, BUCKET};
use crate::uri::FileSystemUri;

/// Outermost layer: restricts each filesystem to one bucket.
///
/// The filesystems it builds report only their own bucket as a file store,
/// and send all their I/O back through this layer so every policy in the
/// chain applies to it.
#[derive(Debug)]
pub struct SingleBucketProvider {
    delegate: Arc<dyn FileSystemProvider>,
    this: Weak<SingleBucketProvider>,
}

impl SingleBucketProvider {
    pub fn new(delegate: Arc<dyn FileSystemProvider>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            delegate,
            this: this.clone(),
        })
    }

    fn bucket_key(&self, uri: &FileSystemUri, props: &Properties) -> Result<String> {
        let bucket = props.require(BUCKET, || FsError::BucketUnavailable)?;
        self.file_system_key(&uri.with_path(bucket), props)
    }
}

#[async_trait]
impl FileSystemProvider for SingleBucketProvider {
    fn delegate(&self) -> Option<&dyn FileSystemProvider> {
        Some(self.delegate.as_ref())
    }

    fn overload_properties(&self, props: &mut Properties, env: &Properties) -> Result<()> {
        self.delegate.overload_properties(props, env)?;
        tracing::trace!("overload_properties({:?})", env);
        if !props.overload_with_env(env, BUCKET) {
            return Err(FsError::BucketUnavailable);
        }
        Ok(())
    }

    async fn get_file_system(
        &self,
        uri: &FileSystemUri,
        env: &Properties,
    ) -> Result<Arc<FileSystem>> {
        tracing::trace!("get_file_system({}, {:?})", uri, env);
        let mut props = Properties::new();
        self.overload_properties(&mut props, env)?;
        let key = self.bucket_key(uri, &props)?;
        if let Some(fs) = self.registered_file_system(&key) {
            tracing::debug!("reusing filesystem {}", key);
            return Ok(fs);
        }
        let fs = self.new_file_system(uri, &props).await?;
        Ok(self.register_file_system(fs))
    }

    async fn new_file_system(
        &self,
        uri: &FileSystemUri,
        props: &Properties,
    ) -> Result<Arc<FileSystem>> {
        tracing::trace!("new_file_system({}, {:?})", uri, props);
        let bucket = props.require(BUCKET, || FsError::BucketUnavailable)?;
        tracing::debug!("Creating filesystem mapping for bucket '{}' to {}", bucket, uri);
        let key = self.bucket_key(uri, props)?;
        let client = self.storage_client(props)?;
        let provider: Arc<dyn FileSystemProvider> = self
            .this
            .upgrade()
            .ok_or(FsError::Unsupported("new_file_system on a dropped provider"))?;
        let fs = FileSystem::for_bucket(key, uri.clone(), props.clone(), client, provider, bucket);
        tracing::trace!(" <= fileSystem: {}", fs.key());
        Ok(Arc::new(fs))
    }
}
