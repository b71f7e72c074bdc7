//! Error types for jailed filesystem access.

/// Errors raised while resolving paths, building per-user filesystems,
/// or performing storage operations through the provider chain.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// The `bucket` environment property was missing at filesystem construction
    #[error("Bucket not available")]
    BucketUnavailable,

    /// The `username` environment property was missing at filesystem construction
    #[error("Username not available")]
    UsernameUnavailable,

    /// The `jail` environment property was missing at filesystem construction
    #[error("Jail not available")]
    JailUnavailable,

    /// The session's home directory is not inside its jail
    #[error("User directory is outside jailed path: {jail}: {home}")]
    JailMapping { jail: String, home: String },

    /// No live filesystem could be found for the session's user
    #[error("Error finding filesystem. (user: {0})")]
    FileSystemUnavailable(String),

    /// The operation is not supported by object storage
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Malformed storage endpoint
    #[error("invalid storage uri: {0}")]
    InvalidUri(String),

    /// Invalid configuration of the storage client
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No object or directory at the path
    #[error("no such file: {0}")]
    NotFound(String),

    /// An object already exists where a new one was requested
    #[error("file already exists: {0}")]
    AlreadyExists(String),

    /// A directory still holds entries
    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(String),

    /// A rename whose target is its own source or lies beneath it
    #[error("cannot move {from} to {to}")]
    InvalidMove { from: String, to: String },

    /// The session's home directory cannot be removed or renamed
    #[error("cannot modify home directory: {0}")]
    HomeDirectory(String),

    /// The channel was not opened for the requested access
    #[error("channel not open for {0}")]
    AccessDenied(&'static str),

    /// Operation on a channel that was already closed
    #[error("channel closed")]
    ChannelClosed,

    /// Object storage error
    #[error("object storage error: {0}")]
    ObjectStore(#[from] object_store::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FsError {
    /// True for failures caused by configuration rather than by storage
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FsError::BucketUnavailable
                | FsError::UsernameUnavailable
                | FsError::JailUnavailable
                | FsError::JailMapping { .. }
                | FsError::InvalidUri(_)
                | FsError::InvalidConfig(_)
        )
    }
}

/// Result type alias for filesystem operations.
pub type Result<T> = std::result::Result<T, FsError>;
