use std::sync::Arc;

use async_trait::async_trait;

use super::FileSystemProvider;
use crate::error::{FsError, Result};
use crate::properties::{Properties, USERNAME};
use crate::uri::FileSystemUri;

/// Keys filesystems by user, so every user gets a distinct filesystem even
/// against the same endpoint and bucket
#[derive(Debug)]
pub struct PerUserProvider {
    delegate: Arc<dyn FileSystemProvider>,
}

impl PerUserProvider {
    pub fn new(delegate: Arc<dyn FileSystemProvider>) -> Self {
        Self { delegate }
    }
}

#[async_trait]
impl FileSystemProvider for PerUserProvider {
    fn delegate(&self) -> Option<&dyn FileSystemProvider> {
        Some(self.delegate.as_ref())
    }

    fn overload_properties(&self, props: &mut Properties, env: &Properties) -> Result<()> {
        self.delegate.overload_properties(props, env)?;
        tracing::trace!("overload_properties({:?})", env);
        if !props.overload_with_env(env, USERNAME) {
            return Err(FsError::UsernameUnavailable);
        }
        Ok(())
    }

    fn file_system_key(&self, uri: &FileSystemUri, props: &Properties) -> Result<String> {
        tracing::trace!("file_system_key({}, {:?})", uri, props);
        let username = props.require(USERNAME, || FsError::UsernameUnavailable)?;
        let uri_for_user = uri.with_user(username);
        tracing::trace!(" <= {}", uri_for_user);
        self.delegate.file_system_key(&uri_for_user, props)
    }
}
