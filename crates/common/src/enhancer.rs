//! Guarantees a fixed prefix (bucket, and jail when set) on storage paths.

use crate::path::StoragePath;

/// Rewrites a storage path before it reaches the storage client
pub trait PathEnhancer: Send + Sync + std::fmt::Debug {
    fn apply(&self, path: &StoragePath) -> StoragePath;
}

/// Prepends a fixed prefix to any path that does not already start with it.
///
/// No separator is inserted between the prefix and the path; either the
/// prefix must end with one or the path must begin with one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedPrefixPathEnhancer {
    prefix: String,
}

impl FixedPrefixPathEnhancer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The enhancer for a session's filesystem: `/{bucket}/{jail}`
    pub fn for_bucket(bucket: &str, jail: &str) -> Self {
        Self::new(format!("/{}/{}", bucket, jail))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl PathEnhancer for FixedPrefixPathEnhancer {
    fn apply(&self, path: &StoragePath) -> StoragePath {
        tracing::trace!("FixedPrefixPathEnhancer('{}').apply('{}')", self.prefix, path);
        if path.starts_with(&self.prefix) {
            return path.clone();
        }
        StoragePath::new(&format!("{}{}", self.prefix, path))
    }
}
