//! Environment properties threaded through the provider chain when a
//! filesystem is constructed.

use std::collections::BTreeMap;

use crate::error::{FsError, Result};

/// Property holding the session's username
pub const USERNAME: &str = "s3sftp.username";
/// Property holding the bucket name
pub const BUCKET: &str = "s3sftp.bucket";
/// Property holding the user's home directory within the bucket
pub const HOMEDIR: &str = "s3sftp.homedir";
/// Property holding the key prefix the filesystem is jailed in
pub const JAIL: &str = "s3sftp.jail";

/// Storage client credential properties
pub const ACCESS_KEY: &str = "s3sftp.access_key";
pub const SECRET_KEY: &str = "s3sftp.secret_key";
pub const REGION: &str = "s3sftp.region";

/// Immutable-once-built key/value set used to construct a filesystem
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties(BTreeMap<String, String>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// The four session properties every filesystem is created with
    pub fn for_session(username: &str, bucket: &str, home_dir: &str, jail: &str) -> Self {
        Self::new()
            .with(USERNAME, username)
            .with(BUCKET, bucket)
            .with(HOMEDIR, home_dir)
            .with(JAIL, jail)
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The value for `key`, or `missing` when it is absent
    pub fn require(&self, key: &str, missing: fn() -> FsError) -> Result<&str> {
        self.get(key).ok_or_else(missing)
    }

    /// Copy `key` from `env` into these properties, reporting whether it
    /// was present
    pub fn overload_with_env(&mut self, env: &Properties, key: &str) -> bool {
        match env.get(key) {
            Some(value) => {
                self.insert(key, value);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overload_with_env() {
        let env = Properties::for_session("bob", "bucket", "bob", "");
        let mut props = Properties::new();
        assert!(props.overload_with_env(&env, BUCKET));
        assert!(!props.overload_with_env(&env, ACCESS_KEY));
        assert_eq!(props.get(BUCKET), Some("bucket"));
        assert!(!props.contains(USERNAME));
    }

    #[test]
    fn test_require() {
        let props = Properties::new().with(JAIL, "");
        assert_eq!(props.require(JAIL, || FsError::JailUnavailable).unwrap(), "");
        assert!(matches!(
            props.require(BUCKET, || FsError::BucketUnavailable),
            Err(FsError::BucketUnavailable)
        ));
    }
}
