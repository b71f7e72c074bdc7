//! Mapping of client-supplied paths into a session's home, bucket and jail.
//!
//! Variables with a `key` suffix are relative to the bucket root; variables
//! with a `dir` suffix are absolute storage paths (`/bucket/...`).

use crate::error::{FsError, Result};
use crate::path::{StoragePath, SEPARATOR};

const DOT: &str = ".";

/// The bucket, home and jail a session's paths are resolved against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapping {
    pub bucket: String,
    pub home_key: String,
    pub jail_key: String,
}

impl PathMapping {
    pub fn new(
        bucket: impl Into<String>,
        home_key: impl Into<String>,
        jail_key: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            home_key: home_key.into(),
            jail_key: jail_key.into(),
        }
    }

    pub fn is_jailed(&self) -> bool {
        !self.jail_key.is_empty()
    }

    /// `/{bucket}/{home}`
    pub fn home_dir(&self) -> String {
        format!("/{}/{}", self.bucket, self.home_key)
    }

    /// `/{bucket}/{jail}` for a jailed session.
    ///
    /// Fails when the home directory lies outside the jail; no path may be
    /// resolved for such a session until the mapping is corrected.
    pub fn jail_dir(&self) -> Result<Option<String>> {
        if !self.is_jailed() {
            return Ok(None);
        }
        let jail_dir = format!("/{}/{}", self.bucket, self.jail_key);
        if !self.home_dir().starts_with(&jail_dir) {
            tracing::trace!("Session Home should be within the Session Jail");
            return Err(FsError::JailMapping {
                jail: self.jail_key.clone(),
                home: self.home_key.clone(),
            });
        }
        Ok(Some(jail_dir))
    }

    /// Resolve `remote_path` to the path the client sees.
    ///
    /// Unjailed sessions get the absolute `/{bucket}/{home}/...` path;
    /// jailed sessions get that path with `/{bucket}/{jail}` removed.
    /// The result is always inside the home directory: anything the client
    /// supplies above it is clamped back to it.
    pub fn resolve(&self, remote_path: &str) -> Result<StoragePath> {
        tracing::debug!("resolve({})", remote_path);
        let home_dir = self.home_dir();
        let jail_dir = self.jail_dir()?;
        let unjailed = self.unjailed_path(remote_path, &home_dir, jail_dir.as_deref());
        match jail_dir {
            None => {
                tracing::trace!(" <= resolved - unjailed: {}", unjailed);
                Ok(unjailed)
            }
            Some(jail_dir) => {
                // the unjailed path always begins with the home dir, which
                // begins with the jail dir
                let visible = unjailed
                    .as_str()
                    .strip_prefix(jail_dir.as_str())
                    .ok_or_else(|| FsError::JailMapping {
                        jail: self.jail_key.clone(),
                        home: self.home_key.clone(),
                    })?;
                // only the home itself keeps the `/{dir}/` form
                let jailed = if unjailed == StoragePath::new(&home_dir) && !visible.is_empty() {
                    StoragePath::new(visible)
                } else {
                    StoragePath::jailed(visible)
                };
                tracing::trace!(" <= resolved - jailed: {}", jailed);
                Ok(jailed)
            }
        }
    }

    fn unjailed_path(
        &self,
        remote_path: &str,
        home_dir: &str,
        jail_dir: Option<&str>,
    ) -> StoragePath {
        let user_path = user_path(remote_path, home_dir, jail_dir);
        let clean = strip_trailing_dot(&user_path);
        let path = StoragePath::new(clean);
        collapse_doubled_bucket(path, &self.bucket)
    }
}

fn user_path(remote_path: &str, home_dir: &str, jail_dir: Option<&str>) -> String {
    let mut user_path = if remote_path.starts_with(home_dir) {
        remote_path.to_string()
    } else {
        qualify(remote_path, home_dir, jail_dir)
    };
    if user_path.len() < home_dir.len() {
        user_path = home_dir.to_string();
    }
    let user_parts = split(&user_path);
    let home_len = split(home_dir).len();
    let remainder = user_parts.get(home_len..).unwrap_or_default();
    within_home(home_dir, remainder)
}

fn qualify(remote_path: &str, home_dir: &str, jail_dir: Option<&str>) -> String {
    if remote_path == DOT {
        return home_dir.to_string();
    }
    match jail_dir {
        None => format!("{}{}{}", home_dir, SEPARATOR, remote_path),
        // the remote path is expected to carry its own leading separator
        Some(jail_dir) => format!("{}{}", jail_dir, remote_path),
    }
}

fn within_home(home_dir: &str, remainder: &[&str]) -> String {
    if remainder.is_empty() {
        return home_dir.to_string();
    }
    format!("{}{}{}", home_dir, SEPARATOR, remainder.join(SEPARATOR))
}

/// Split on the separator, discarding trailing empty segments
fn split(path: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = path.split(SEPARATOR).collect();
    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    parts
}

fn strip_trailing_dot(path: &str) -> &str {
    match path.strip_suffix("/.") {
        Some(stripped) => {
            tracing::trace!(" - removing trailing character: {}", path);
            stripped
        }
        None => path,
    }
}

/// `/bucket/bucket/...` → `/bucket/...`
fn collapse_doubled_bucket(path: StoragePath, bucket: &str) -> StoragePath {
    let doubled = format!("/{}/{}", bucket, bucket);
    match path.as_str().strip_prefix(doubled.as_str()) {
        Some(rest) if rest.is_empty() || rest.starts_with(SEPARATOR) => {
            StoragePath::new(&format!("/{}{}", bucket, rest))
        }
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> PathMapping {
        PathMapping::new("bucket", "", "")
    }

    fn home() -> PathMapping {
        PathMapping::new("bucket", "bob", "")
    }

    fn jailed() -> PathMapping {
        PathMapping::new("bucket", "users/bob", "users")
    }

    fn resolve(mapping: &PathMapping, remote: &str) -> String {
        mapping.resolve(remote).unwrap().to_string()
    }

    #[test]
    fn test_root_home() {
        let mapping = root();
        assert_eq!(resolve(&mapping, "."), "/bucket/");
        assert_eq!(resolve(&mapping, "/subdir"), "/bucket/subdir");
        assert_eq!(resolve(&mapping, "/file.txt"), "/bucket/file.txt");
        assert_eq!(resolve(&mapping, "/bucket/file.txt"), "/bucket/file.txt");
        assert_eq!(resolve(&mapping, "dir/."), "/bucket/dir");
        assert_eq!(resolve(&mapping, "dir/subdir/.."), "/bucket/dir/subdir/..");
    }

    #[test]
    fn test_root_home_doubled_bucket() {
        let mapping = root();
        assert_eq!(resolve(&mapping, "/bucket"), "/bucket/");
        assert_eq!(resolve(&mapping, "bucket/x"), "/bucket/x");
        // only a whole doubled segment is collapsed
        assert_eq!(resolve(&mapping, "bucketlist"), "/bucket/bucketlist");
    }

    #[test]
    fn test_user_home() {
        let mapping = home();
        assert_eq!(resolve(&mapping, ""), "/bucket/bob");
        assert_eq!(resolve(&mapping, "file.txt"), "/bucket/bob/file.txt");
        assert_eq!(resolve(&mapping, "."), "/bucket/bob");
        assert_eq!(resolve(&mapping, "/subdir"), "/bucket/bob/subdir");
        assert_eq!(resolve(&mapping, "/file.txt"), "/bucket/bob/file.txt");
        assert_eq!(resolve(&mapping, "/bucket/bob/file.txt"), "/bucket/bob/file.txt");
        assert_eq!(resolve(&mapping, "dir/."), "/bucket/bob/dir");
        assert_eq!(resolve(&mapping, "dir/subdir/.."), "/bucket/bob/dir/subdir/..");
    }

    #[test]
    fn test_user_home_cannot_be_escaped() {
        let mapping = home();
        assert_eq!(resolve(&mapping, "/"), "/bucket/bob");
        // a sibling home that shares a textual prefix is re-rooted
        assert_eq!(resolve(&mapping, "/bucket/bobby/x"), "/bucket/bob/x");
        // `..` stays a literal segment beneath the home
        assert_eq!(resolve(&mapping, "../alice"), "/bucket/bob/../alice");
    }

    #[test]
    fn test_jailed() {
        let mapping = jailed();
        assert_eq!(resolve(&mapping, "."), "/bob/");
        assert_eq!(resolve(&mapping, "/bob"), "/bob/");
        assert_eq!(resolve(&mapping, "/bob/file.txt"), "/bob/file.txt");
        assert_eq!(resolve(&mapping, "/bucket/users/bob/file.txt"), "/bob/file.txt");
        assert_eq!(resolve(&mapping, "/bob/dir/."), "/bob/dir");
        assert_eq!(resolve(&mapping, "/bob/dir/subdir/.."), "/bob/dir/subdir/..");
    }

    #[test]
    fn test_jailed_cannot_exit_jail() {
        let mapping = jailed();
        assert_eq!(resolve(&mapping, "/"), "/bob/");
        assert_eq!(resolve(&mapping, "/alice/file.txt"), "/bob/file.txt");
        assert_eq!(resolve(&mapping, "x"), "/bob/");
    }

    #[test]
    fn test_jailed_files_under_jail_root() {
        let mapping = PathMapping::new("bucket", "users", "users");
        assert_eq!(resolve(&mapping, "."), "/");
        assert_eq!(resolve(&mapping, "/file.txt"), "/file.txt");
        assert_eq!(resolve(&mapping, "/docs/file.txt"), "/docs/file.txt");

        let mapping = jailed();
        assert_eq!(resolve(&mapping, "/bob/file.txt"), "/bob/file.txt");
        assert_eq!(resolve(&mapping, "/bob/docs/"), "/bob/docs");
    }

    #[test]
    fn test_home_outside_jail() {
        let mapping = PathMapping::new("bucket", "jail", "jail2");
        let err = mapping.resolve(".").unwrap_err();
        assert!(matches!(err, FsError::JailMapping { .. }));
        let message = err.to_string();
        assert!(message.contains("jail2"));
        assert!(message.contains("jail"));

        let mapping = PathMapping::new("bucket", "home", "jail");
        for remote in [".", "/", "/home/file", "/bucket/jail/file"] {
            let err = mapping.resolve(remote).unwrap_err();
            assert_eq!(
                err.to_string(),
                "User directory is outside jailed path: jail: home"
            );
        }
    }

    #[test]
    fn test_resolving_a_resolved_path_is_stable() {
        for mapping in [root(), home()] {
            for remote in [".", "/a", "dir/file.txt", "/bucket/bob/x"] {
                let once = resolve(&mapping, remote);
                assert_eq!(resolve(&mapping, &once), once);
            }
        }
    }
}
