use std::sync::Arc;

use async_trait::async_trait;

use super::FileSystemProvider;
use crate::channel::{FileChannel, OpenOptions};
use crate::error::Result;
use crate::path::StoragePath;

/// Builds file channels from the byte channels of the next layer
#[derive(Debug)]
pub struct ChannelSupportProvider {
    delegate: Arc<dyn FileSystemProvider>,
}

impl ChannelSupportProvider {
    pub fn new(delegate: Arc<dyn FileSystemProvider>) -> Self {
        Self { delegate }
    }
}

#[async_trait]
impl FileSystemProvider for ChannelSupportProvider {
    fn delegate(&self) -> Option<&dyn FileSystemProvider> {
        Some(self.delegate.as_ref())
    }

    async fn new_file_channel(
        &self,
        path: &StoragePath,
        options: &OpenOptions,
    ) -> Result<FileChannel> {
        tracing::trace!("new_file_channel({}, {:?})", path, options);
        let channel = self.delegate.new_byte_channel(path, options).await?;
        Ok(FileChannel::new(channel))
    }
}
