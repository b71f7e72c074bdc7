//! Object storage client: one `ObjectStore` per bucket over a configured
//! backend (S3/MinIO, local filesystem, or memory).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::ObjectStore;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{FsError, Result};
use crate::properties::{self, Properties};
use crate::uri::FileSystemUri;

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_S3_HOST: &str = "s3.amazonaws.com";

/// Configuration for the object storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageConfig {
    /// In-memory storage (for testing). Only the declared buckets are
    /// visible to the service account.
    Memory {
        #[serde(default)]
        buckets: Vec<String>,
    },

    /// Local filesystem storage; each bucket is a subdirectory of `path`
    Local {
        /// Path to the storage directory
        path: PathBuf,
    },

    /// S3-compatible storage (AWS S3, MinIO, etc.)
    S3 {
        /// S3 endpoint URL (e.g., "http://localhost:9000" for MinIO)
        endpoint: Option<String>,
        /// Access key ID
        access_key: String,
        /// Secret access key
        secret_key: String,
        /// Optional region (defaults to "us-east-1")
        region: Option<String>,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Memory {
            buckets: Vec::new(),
        }
    }
}

impl StorageConfig {
    /// The connection URI filesystem keys are derived from
    pub fn uri(&self) -> Result<FileSystemUri> {
        match self {
            StorageConfig::Memory { .. } => Ok(FileSystemUri::new("memory", "local")),
            StorageConfig::Local { path } => {
                Ok(FileSystemUri::new("file", "").with_path(&path.to_string_lossy()))
            }
            StorageConfig::S3 { endpoint, .. } => {
                let authority = match endpoint {
                    Some(endpoint) => FileSystemUri::parse(endpoint)?.authority().to_string(),
                    None => DEFAULT_S3_HOST.to_string(),
                };
                Ok(FileSystemUri::new("s3", authority))
            }
        }
    }

    /// Apply credential properties, if any, over an S3 configuration
    fn with_properties(&self, props: &Properties) -> Option<StorageConfig> {
        let StorageConfig::S3 {
            endpoint,
            access_key,
            secret_key,
            region,
        } = self
        else {
            return None;
        };
        let access = props.get(properties::ACCESS_KEY);
        let secret = props.get(properties::SECRET_KEY);
        let reg = props.get(properties::REGION);
        if access.is_none() && secret.is_none() && reg.is_none() {
            return None;
        }
        Some(StorageConfig::S3 {
            endpoint: endpoint.clone(),
            access_key: access.unwrap_or(access_key).to_string(),
            secret_key: secret.unwrap_or(secret_key).to_string(),
            region: reg.map(str::to_string).or_else(|| region.clone()),
        })
    }
}

/// Access to the buckets of one storage account
#[async_trait]
pub trait StorageClient: Send + Sync + std::fmt::Debug {
    /// The connection URI of the account
    fn uri(&self) -> &FileSystemUri;

    /// Store for the objects of `bucket`
    async fn store(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>>;

    /// Buckets the account can see
    async fn list_buckets(&self) -> Result<Vec<String>>;

    /// A client using the credentials in `props`, when they differ from
    /// this client's own
    fn with_properties(&self, _props: &Properties) -> Result<Option<Arc<dyn StorageClient>>> {
        Ok(None)
    }
}

/// [`StorageClient`] backed by `object_store`
#[derive(Debug)]
pub struct ObjectStoreClient {
    config: StorageConfig,
    uri: FileSystemUri,
    stores: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl ObjectStoreClient {
    pub fn new(config: StorageConfig) -> Result<Self> {
        let uri = config.uri()?;
        Ok(Self {
            config,
            uri,
            stores: Mutex::new(HashMap::new()),
        })
    }

    /// In-memory client exposing the given buckets
    pub fn memory<I, S>(buckets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let config = StorageConfig::Memory {
            buckets: buckets.into_iter().map(Into::into).collect(),
        };
        Self {
            uri: FileSystemUri::new("memory", "local"),
            config,
            stores: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    async fn open(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        let store: Arc<dyn ObjectStore> = match &self.config {
            StorageConfig::Memory { .. } => Arc::new(InMemory::new()),

            StorageConfig::Local { path } => {
                let root = path.join(bucket);
                // Ensure directory exists
                tokio::fs::create_dir_all(&root).await?;
                Arc::new(
                    LocalFileSystem::new_with_prefix(&root)
                        .map_err(|e| FsError::InvalidConfig(e.to_string()))?,
                )
            }

            StorageConfig::S3 {
                endpoint,
                access_key,
                secret_key,
                region,
            } => {
                let mut builder = AmazonS3Builder::new()
                    .with_access_key_id(access_key)
                    .with_secret_access_key(secret_key)
                    .with_bucket_name(bucket)
                    .with_region(region.as_deref().unwrap_or(DEFAULT_REGION));
                if let Some(endpoint) = endpoint {
                    builder = builder
                        .with_endpoint(endpoint)
                        .with_allow_http(endpoint.starts_with("http://"));
                }
                Arc::new(
                    builder
                        .build()
                        .map_err(|e| FsError::InvalidConfig(e.to_string()))?,
                )
            }
        };
        Ok(store)
    }
}

#[async_trait]
impl StorageClient for ObjectStoreClient {
    fn uri(&self) -> &FileSystemUri {
        &self.uri
    }

    async fn store(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        if let Some(store) = self.stores.lock().get(bucket) {
            return Ok(store.clone());
        }
        let opened = self.open(bucket).await?;
        // another caller may have opened the same bucket meanwhile
        let store = self
            .stores
            .lock()
            .entry(bucket.to_string())
            .or_insert(opened)
            .clone();
        Ok(store)
    }

    async fn list_buckets(&self) -> Result<Vec<String>> {
        match &self.config {
            StorageConfig::Memory { buckets } => Ok(buckets.clone()),

            StorageConfig::Local { path } => {
                let mut buckets = Vec::new();
                let mut entries = match tokio::fs::read_dir(path).await {
                    Ok(entries) => entries,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(buckets),
                    Err(e) => return Err(e.into()),
                };
                while let Some(entry) = entries.next_entry().await? {
                    if entry.file_type().await?.is_dir() {
                        buckets.push(entry.file_name().to_string_lossy().into_owned());
                    }
                }
                buckets.sort();
                Ok(buckets)
            }

            // object_store has no account-level listing; report the buckets
            // opened so far that answer a listing request
            StorageConfig::S3 { .. } => {
                let opened: Vec<(String, Arc<dyn ObjectStore>)> = self
                    .stores
                    .lock()
                    .iter()
                    .map(|(name, store)| (name.clone(), store.clone()))
                    .collect();
                let mut buckets = Vec::new();
                for (name, store) in opened {
                    let mut stream = store.list(None);
                    match stream.try_next().await {
                        Ok(_) => buckets.push(name),
                        Err(e) => tracing::debug!("bucket {} not visible: {}", name, e),
                    }
                }
                buckets.sort();
                Ok(buckets)
            }
        }
    }

    fn with_properties(&self, props: &Properties) -> Result<Option<Arc<dyn StorageClient>>> {
        match self.config.with_properties(props) {
            Some(config) if config != self.config => {
                Ok(Some(Arc::new(ObjectStoreClient::new(config)?)))
            }
            _ => Ok(None),
        }
    }
}
