/**
 * Filesystem attribute maps and the synthetic
 *  POSIX permissions reported for objects.
 */
pub mod attributes;
/**
 * Username -> filesystem cache. Entries never keep
 *  a filesystem alive on their own.
 */
pub mod cache;
/**
 * Byte and file channels over single objects,
 *  staged through a local temporary file.
 */
pub mod channel;
/**
 * Object storage client: S3/MinIO, local
 *  filesystem or memory, one store per bucket.
 */
pub mod client;
pub mod enhancer;
pub mod error;
/**
 * Builds the per-user filesystem for a session
 *  through a fresh provider chain.
 */
pub mod factory;
pub mod filesystem;
/**
 * Session -> bucket / home / jail mappings.
 */
pub mod mapping;
pub mod path;
pub mod properties;
/**
 * The provider chain. Each layer enforces one
 *  isolation or compatibility policy and forwards
 *  everything else to the next.
 */
pub mod provider;
pub mod registry;
/**
 * Jailing path resolution: client path -> storage
 *  path within the session's home and jail.
 */
pub mod resolver;
pub mod session;
/**
 * Per-connection subsystem the protocol layer
 *  drives; resolves every client path first.
 */
pub mod subsystem;
pub mod uri;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::attributes::{AttributeMap, AttributeValue, PosixPermissions};
    pub use crate::cache::UserFileSystemCache;
    pub use crate::channel::{FileChannel, OpenOptions, SeekableByteChannel};
    pub use crate::client::{ObjectStoreClient, StorageClient, StorageConfig};
    pub use crate::enhancer::{FixedPrefixPathEnhancer, PathEnhancer};
    pub use crate::error::{FsError, Result};
    pub use crate::factory::FileSystemFactory;
    pub use crate::filesystem::{FileStore, FileSystem};
    pub use crate::mapping::{SessionBucket, SessionHome, SessionJail, Template};
    pub use crate::path::StoragePath;
    pub use crate::properties::Properties;
    pub use crate::provider::{build_chain, FileSystemProvider};
    pub use crate::registry::FileSystemRegistry;
    pub use crate::resolver::PathMapping;
    pub use crate::session::Session;
    pub use crate::subsystem::{JailedSubsystem, ResolvedPath, SubsystemFactory};
    pub use crate::uri::FileSystemUri;
    pub use crate::version::build_info;
}
