pub mod auth;
pub mod check;
pub mod ls;
pub mod resolve;
pub mod serve;
pub mod stat;
pub mod version;

pub use auth::Auth;
pub use check::Check;
pub use ls::Ls;
pub use resolve::Resolve;
pub use serve::Serve;
pub use stat::Stat;
pub use version::Version;

use common::prelude::FsError;
use s3sftp_server::{ConfigError, ServerError};

/// Failure of an operation run against a user's view of the bucket
#[derive(Debug, thiserror::Error)]
pub enum SessionOpError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("{0}")]
    Fs(#[from] FsError),
}
