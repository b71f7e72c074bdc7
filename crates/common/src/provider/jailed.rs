use std::sync::Arc;

use async_trait::async_trait;

use super::FileSystemProvider;
use crate::error::{FsError, Result};
use crate::properties::{Properties, JAIL};

/// Requires the jail property and carries it into the filesystem
#[derive(Debug)]
pub struct JailedProvider {
    delegate: Arc<dyn FileSystemProvider>,
}

impl JailedProvider {
    pub fn new(delegate: Arc<dyn FileSystemProvider>) -> Self {
        Self { delegate }
    }
}

#[async_trait]
impl FileSystemProvider for JailedProvider {
    fn delegate(&self) -> Option<&dyn FileSystemProvider> {
        Some(self.delegate.as_ref())
    }

    fn overload_properties(&self, props: &mut Properties, env: &Properties) -> Result<()> {
        self.delegate.overload_properties(props, env)?;
        tracing::trace!("overload_properties({:?})", env);
        if !props.overload_with_env(env, JAIL) {
            return Err(FsError::JailUnavailable);
        }
        Ok(())
    }
}
