// Authentication
pub mod auth;

// Configuration and host key
pub mod config;
pub mod host_key;

// Server lifecycle
pub mod process;
pub mod server;

// Re-exports for consumers (protocol implementations, etc.)
pub use auth::{
    AuthenticationProvider, DefaultHomeDirExistsChecker, HomeDirExistsChecker,
    PasswordAuthenticator, SimpleAuthenticator,
};
pub use config::{ConfigError, ServerConfig};
pub use host_key::{HostKey, HostKeyError};
pub use process::run;
pub use server::{S3SftpServer, ServerError, SftpServices};
