//! The file-transfer subsystem for one session.
//!
//! A protocol implementation drives a [`JailedSubsystem`] per connection:
//! each client path goes through [`JailedSubsystem::resolve_file`] before
//! the operation reaches the session's filesystem.

use std::sync::Arc;

use crate::attributes::{AttributeMap, PERMISSIONS};
use crate::cache::UserFileSystemCache;
use crate::channel::{FileChannel, OpenOptions};
use crate::error::{FsError, Result};
use crate::filesystem::FileSystem;
use crate::mapping::{SessionBucket, SessionHome, SessionJail};
use crate::path::StoragePath;
use crate::resolver::PathMapping;
use crate::session::Session;

/// A client path resolved for a session, bound to the session's filesystem
#[derive(Debug, Clone)]
pub struct ResolvedPath {
    path: StoragePath,
    file_system: Arc<FileSystem>,
}

impl ResolvedPath {
    pub fn path(&self) -> &StoragePath {
        &self.path
    }

    pub fn file_system(&self) -> &Arc<FileSystem> {
        &self.file_system
    }

    pub async fn exists(&self) -> Result<bool> {
        self.file_system.exists(&self.path).await
    }
}

/// One listing entry
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub attributes: AttributeMap,
}

pub struct JailedSubsystem {
    session: Session,
    bucket: Arc<dyn SessionBucket>,
    home: Arc<dyn SessionHome>,
    jail: Arc<dyn SessionJail>,
    cache: Arc<UserFileSystemCache>,
    // keeps the user's cached filesystem alive for the session
    file_system: Option<Arc<FileSystem>>,
}

impl std::fmt::Debug for JailedSubsystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JailedSubsystem")
            .field("session", &self.session)
            .field("file_system", &self.file_system.as_ref().map(|fs| fs.key()))
            .finish_non_exhaustive()
    }
}

impl JailedSubsystem {
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Attach the filesystem the session works in
    pub fn set_file_system(&mut self, file_system: Arc<FileSystem>) {
        self.file_system = Some(file_system);
    }

    /// Bucket, home and jail for this session
    pub fn mapping(&self) -> PathMapping {
        PathMapping::new(
            self.bucket.bucket(&self.session),
            self.home.home(&self.session),
            self.jail.jail(&self.session),
        )
    }

    /// Resolve a client path within the session's home and jail
    pub fn resolve_file(&self, remote_path: &str) -> Result<ResolvedPath> {
        tracing::debug!("resolve_file({})", remote_path);
        let path = self.mapping().resolve(remote_path)?;
        let file_system = self.session_file_system()?;
        Ok(ResolvedPath { path, file_system })
    }

    /// Resolve a path an operation takes away from its place. Anything
    /// that resolves to the home directory itself is refused.
    fn resolve_removable(&self, remote_path: &str) -> Result<ResolvedPath> {
        let resolved = self.resolve_file(remote_path)?;
        if resolved.path == self.mapping().resolve(".")? {
            tracing::warn!(
                "refusing to remove home {} for '{}' (requested: {})",
                resolved.path,
                self.session.username(),
                remote_path
            );
            return Err(FsError::HomeDirectory(resolved.path.to_string()));
        }
        Ok(resolved)
    }

    fn session_file_system(&self) -> Result<Arc<FileSystem>> {
        let username = self.session.username();
        self.cache
            .resolve(username)
            .ok_or_else(|| FsError::FileSystemUnavailable(username.to_string()))
    }

    pub async fn stat(&self, remote_path: &str) -> Result<AttributeMap> {
        let resolved = self.resolve_file(remote_path)?;
        resolved.file_system.read_attributes(&resolved.path).await
    }

    /// Apply attributes to a file.
    ///
    /// Permissions are dropped first: object storage cannot hold them and
    /// clients routinely send them along with other attributes.
    pub async fn set_attributes(&self, remote_path: &str, mut attributes: AttributeMap) -> Result<()> {
        let resolved = self.resolve_file(remote_path)?;
        attributes.remove(PERMISSIONS);
        for (name, value) in attributes {
            resolved
                .file_system
                .set_attribute(&resolved.path, &name, value)
                .await?;
        }
        Ok(())
    }

    pub async fn list(&self, remote_path: &str) -> Result<Vec<DirEntry>> {
        let resolved = self.resolve_file(remote_path)?;
        let fs = &resolved.file_system;
        let mut entries = Vec::new();
        for child in fs.read_dir(&resolved.path).await? {
            let Some(name) = child.file_name() else {
                continue;
            };
            let attributes = fs.read_attributes(&child).await?;
            entries.push(DirEntry {
                name: name.to_string(),
                attributes,
            });
        }
        Ok(entries)
    }

    pub async fn make_directory(&self, remote_path: &str) -> Result<()> {
        let resolved = self.resolve_file(remote_path)?;
        resolved.file_system.create_directory(&resolved.path).await
    }

    pub async fn remove(&self, remote_path: &str) -> Result<()> {
        let resolved = self.resolve_removable(remote_path)?;
        resolved.file_system.delete(&resolved.path).await
    }

    pub async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let source = self.resolve_removable(from)?;
        let target = self.resolve_file(to)?;
        source.file_system.rename(&source.path, &target.path).await
    }

    pub async fn open(&self, remote_path: &str, options: &OpenOptions) -> Result<FileChannel> {
        let resolved = self.resolve_file(remote_path)?;
        resolved.file_system.open_file(&resolved.path, options).await
    }
}

/// Creates a [`JailedSubsystem`] per session
#[derive(Clone)]
pub struct SubsystemFactory {
    bucket: Arc<dyn SessionBucket>,
    home: Arc<dyn SessionHome>,
    jail: Arc<dyn SessionJail>,
    cache: Arc<UserFileSystemCache>,
}

impl std::fmt::Debug for SubsystemFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubsystemFactory").finish_non_exhaustive()
    }
}

impl SubsystemFactory {
    pub fn new(
        bucket: Arc<dyn SessionBucket>,
        home: Arc<dyn SessionHome>,
        jail: Arc<dyn SessionJail>,
        cache: Arc<UserFileSystemCache>,
    ) -> Self {
        Self {
            bucket,
            home,
            jail,
            cache,
        }
    }

    pub fn create(&self, session: Session) -> JailedSubsystem {
        JailedSubsystem {
            session,
            bucket: self.bucket.clone(),
            home: self.home.clone(),
            jail: self.jail.clone(),
            cache: self.cache.clone(),
            file_system: None,
        }
    }
}
