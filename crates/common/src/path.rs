//! Storage paths of the form `/bucket/key/...`.

use std::fmt;

use object_store::path::Path as ObjectPath;

pub const SEPARATOR: &str = "/";

/// A path in the storage namespace.
///
/// The first segment of an absolute path names the bucket and the rest is
/// the object key. Construction normalises the text: runs of separators
/// collapse to one and a trailing separator is dropped, except on a path
/// that names only a bucket, which always renders as `/bucket/`.
///
/// `.` and `..` segments are kept verbatim; the object store treats them as
/// literal key segments, never as navigation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoragePath(String);

impl StoragePath {
    pub fn new(raw: &str) -> Self {
        let absolute = raw.starts_with(SEPARATOR);
        let segments: Vec<&str> = raw.split(SEPARATOR).filter(|s| !s.is_empty()).collect();
        let joined = segments.join(SEPARATOR);
        let normalised = match (absolute, segments.len()) {
            (true, 0) => SEPARATOR.to_string(),
            (true, 1) => format!("/{}/", joined),
            (true, _) => format!("/{}", joined),
            (false, _) => joined,
        };
        Self(normalised)
    }

    /// A client-visible path inside a jail.
    ///
    /// The first segment names a directory beneath the jail, not a bucket,
    /// so no trailing separator is kept.
    pub fn jailed(raw: &str) -> Self {
        let segments: Vec<&str> = raw.split(SEPARATOR).filter(|s| !s.is_empty()).collect();
        Self(format!("/{}", segments.join(SEPARATOR)))
    }

    /// The storage root `/`
    pub fn root() -> Self {
        Self(SEPARATOR.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_absolute(&self) -> bool {
        self.0.starts_with(SEPARATOR)
    }

    /// Textual prefix test, matching how prefixes are configured
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }

    /// Non-empty segments of the path
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR).filter(|s| !s.is_empty())
    }

    /// The bucket named by an absolute path
    pub fn bucket(&self) -> Option<&str> {
        if !self.is_absolute() {
            return None;
        }
        self.segments().next()
    }

    /// The object key beneath the bucket, empty for the bucket root
    pub fn key(&self) -> String {
        let skip = usize::from(self.is_absolute());
        self.segments().skip(skip).collect::<Vec<_>>().join(SEPARATOR)
    }

    /// The key as an object store location
    pub fn object_path(&self) -> ObjectPath {
        ObjectPath::from(self.key())
    }

    /// True when the path names a bucket (or the storage root) rather than
    /// an object within it
    pub fn is_bucket_root(&self) -> bool {
        self.key().is_empty()
    }

    /// The last segment, if any
    pub fn file_name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// Append a child segment
    pub fn join(&self, child: &str) -> Self {
        Self::new(&format!("{}{}{}", self.0, SEPARATOR, child))
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StoragePath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl AsRef<str> for StoragePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
