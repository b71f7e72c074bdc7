use std::sync::Arc;

use async_trait::async_trait;

use super::FileSystemProvider;
use crate::attributes::{AttributeMap, AttributeValue, PosixPermissions, PERMISSIONS};
use crate::error::Result;
use crate::path::StoragePath;

/// Reports `rw-rw----` for every entry; object storage keeps no
/// permissions and clients expect some
#[derive(Debug)]
pub struct PosixPermissionsProvider {
    delegate: Arc<dyn FileSystemProvider>,
}

impl PosixPermissionsProvider {
    pub fn new(delegate: Arc<dyn FileSystemProvider>) -> Self {
        Self { delegate }
    }
}

#[async_trait]
impl FileSystemProvider for PosixPermissionsProvider {
    fn delegate(&self) -> Option<&dyn FileSystemProvider> {
        Some(self.delegate.as_ref())
    }

    async fn read_attributes(&self, path: &StoragePath) -> Result<AttributeMap> {
        tracing::trace!("read_attributes({})", path);
        let mut attributes = self.delegate.read_attributes(path).await?;
        attributes.insert(
            PERMISSIONS.to_string(),
            AttributeValue::Permissions(PosixPermissions::owner_group_read_write()),
        );
        Ok(attributes)
    }
}
