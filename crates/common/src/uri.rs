//! Connection URIs identifying a storage endpoint, and the filesystem keys
//! derived from them.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::{FsError, Result};

/// `scheme://[user@]authority[/path]`
///
/// The user and path parts are filled in by the provider chain when it
/// derives a filesystem key; the endpoint itself only carries scheme and
/// authority.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileSystemUri {
    scheme: String,
    user: Option<String>,
    authority: String,
    path: String,
}

impl FileSystemUri {
    pub fn new(scheme: impl Into<String>, authority: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            user: None,
            authority: authority.into(),
            path: String::new(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|e| FsError::InvalidUri(format!("{}: {}", raw, e)))?;
        let authority = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };
        let user = Some(url.username())
            .filter(|u| !u.is_empty())
            .map(str::to_string);
        let path = match url.path() {
            "/" => String::new(),
            path => path.to_string(),
        };
        Ok(Self {
            scheme: url.scheme().to_string(),
            user,
            authority,
            path,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn with_user(&self, user: &str) -> Self {
        Self {
            user: Some(user.to_string()),
            ..self.clone()
        }
    }

    /// Replace the path; a leading separator is added when missing
    pub fn with_path(&self, path: &str) -> Self {
        let path = if path.is_empty() || path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        Self {
            path,
            ..self.clone()
        }
    }
}

impl fmt::Display for FileSystemUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.scheme)?;
        if let Some(user) = &self.user {
            write!(f, "{}@", user)?;
        }
        write!(f, "{}{}", self.authority, self.path)
    }
}

impl FromStr for FileSystemUri {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let uri = FileSystemUri::parse("s3://localhost:9000").unwrap();
        assert_eq!(uri.scheme(), "s3");
        assert_eq!(uri.authority(), "localhost:9000");
        assert_eq!(uri.user(), None);
        assert_eq!(uri.path(), "");
        assert_eq!(uri.to_string(), "s3://localhost:9000");
    }

    #[test]
    fn test_key_parts() {
        let uri = FileSystemUri::new("s3", "s3.amazonaws.com")
            .with_path("bucket")
            .with_user("bob");
        assert_eq!(uri.to_string(), "s3://bob@s3.amazonaws.com/bucket");
        assert_eq!(FileSystemUri::parse(&uri.to_string()).unwrap(), uri);
    }

    #[test]
    fn test_invalid() {
        assert!(matches!(
            FileSystemUri::parse("not a uri"),
            Err(FsError::InvalidUri(_))
        ));
    }
}
