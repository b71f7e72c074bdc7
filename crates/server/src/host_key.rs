//! Host key loading.
//!
//! Protocol implementations load host keys from files, so inline key
//! material is staged in a private temporary file that lives as long as
//! the [`HostKey`].

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::config::{ConfigError, HostKeySource, ServerConfig};

const PEM_BEGIN: &str = "-----BEGIN ";

#[derive(Debug, thiserror::Error)]
pub enum HostKeyError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not read host key {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not stage host key: {0}")]
    Stage(#[source] std::io::Error),

    #[error("host key {0} is not a PEM encoded private key")]
    InvalidKey(PathBuf),
}

/// A loaded private host key
pub struct HostKey {
    algorithm: String,
    path: PathBuf,
    material: String,
    // removed on drop
    _staged: Option<NamedTempFile>,
}

impl fmt::Debug for HostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostKey")
            .field("algorithm", &self.algorithm)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl HostKey {
    /// Load the host key the configuration names
    pub fn from_config(config: &ServerConfig) -> Result<Self, HostKeyError> {
        let algorithm = &config.host_key_algorithm;
        match config.host_key_source()? {
            HostKeySource::File(path) => Self::from_file(algorithm, path),
            HostKeySource::Inline(material) => Self::from_material(algorithm, material),
        }
    }

    pub fn from_file(algorithm: &str, path: &Path) -> Result<Self, HostKeyError> {
        let material = std::fs::read_to_string(path).map_err(|source| HostKeyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if !material.trim_start().starts_with(PEM_BEGIN) {
            return Err(HostKeyError::InvalidKey(path.to_path_buf()));
        }
        tracing::debug!("loaded {} host key from {}", algorithm, path.display());
        Ok(Self {
            algorithm: algorithm.to_string(),
            path: path.to_path_buf(),
            material,
            _staged: None,
        })
    }

    pub fn from_material(algorithm: &str, material: &str) -> Result<Self, HostKeyError> {
        let mut staged = tempfile::Builder::new()
            .prefix("sftp-private-host")
            .suffix(".key")
            .tempfile()
            .map_err(HostKeyError::Stage)?;
        tracing::info!("Writing private host key: {}", staged.path().display());
        staged
            .write_all(material.as_bytes())
            .and_then(|_| staged.flush())
            .map_err(HostKeyError::Stage)?;
        let key = Self::from_file(algorithm, staged.path())?;
        Ok(Self {
            _staged: Some(staged),
            ..key
        })
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// File holding the key
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn material(&self) -> &str {
        &self.material
    }
}
