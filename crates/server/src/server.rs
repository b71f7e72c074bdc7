use std::net::SocketAddr;
use std::sync::Arc;

use common::mapping::fixed_bucket;
use common::prelude::{
    FileSystemFactory, FileSystemRegistry, FsError, JailedSubsystem, ObjectStoreClient, Session,
    SessionBucket, SubsystemFactory, UserFileSystemCache,
};

use crate::auth::{AuthenticationProvider, DefaultHomeDirExistsChecker, SimpleAuthenticator};
use crate::config::{ConfigError, ServerConfig};
use crate::host_key::{HostKey, HostKeyError};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Could not start server: {0}")]
    Start(String),

    #[error("Could not stop server: {0}")]
    Stop(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not load host key: {0}")]
    HostKey(#[from] HostKeyError),

    #[error("Could not open storage: {0}")]
    Storage(#[from] FsError),
}

/// Everything a protocol implementation needs to serve sessions
#[derive(Debug)]
pub struct SftpServices {
    pub listen_addr: SocketAddr,
    pub host_key: HostKey,
    pub subsystems: SubsystemFactory,
    pub file_systems: Arc<FileSystemFactory>,
    pub authentication: AuthenticationProvider,
    pub cache: Arc<UserFileSystemCache>,
    pub registry: Arc<FileSystemRegistry>,
}

impl SftpServices {
    /// The subsystem for an authenticated session, with the user's
    /// filesystem attached
    pub async fn open_session(
        &self,
        username: &str,
        client_address: Option<SocketAddr>,
    ) -> Result<JailedSubsystem, FsError> {
        let session = Session::new(username, client_address);
        let file_system = self.file_systems.create_file_system(&session).await?;
        let mut subsystem = self.subsystems.create(session);
        subsystem.set_file_system(file_system);
        Ok(subsystem)
    }
}

/// The server: validates its configuration and wires the filesystem
/// services together on start, releases them on stop.
#[derive(Debug)]
pub struct S3SftpServer {
    config: ServerConfig,
    services: Option<SftpServices>,
}

impl S3SftpServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            services: None,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Services of the running server
    pub fn services(&self) -> Option<&SftpServices> {
        self.services.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.services.is_some()
    }

    pub fn start(&mut self) -> Result<&SftpServices, ServerError> {
        if self.services.is_some() {
            return Err(ServerError::Start("server already running".to_string()));
        }
        self.config.validate()?;
        let host_key = HostKey::from_config(&self.config)?;

        let client = Arc::new(ObjectStoreClient::new(self.config.storage.clone())?);
        let registry = Arc::new(FileSystemRegistry::new());
        let cache = Arc::new(UserFileSystemCache::new());

        let bucket: Arc<dyn SessionBucket> = fixed_bucket(self.config.bucket.clone());
        let home = Arc::new(self.config.home.clone());
        let jail = Arc::new(self.config.jail.clone());
        let subsystems =
            SubsystemFactory::new(bucket.clone(), home.clone(), jail.clone(), cache.clone());
        let file_systems = Arc::new(FileSystemFactory::new(
            bucket,
            home,
            jail,
            client,
            registry.clone(),
            cache.clone(),
        ));

        let passwords = Arc::new(SimpleAuthenticator::from(&self.config.users));
        let home_dirs = Arc::new(DefaultHomeDirExistsChecker::new(
            subsystems.clone(),
            file_systems.clone(),
        ));
        let authentication = AuthenticationProvider::new(passwords, home_dirs);

        let listen_addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let services = SftpServices {
            listen_addr,
            host_key,
            subsystems,
            file_systems,
            authentication,
            cache,
            registry,
        };
        tracing::info!(
            "S3 SFTP Server started on port {} (bucket: {})",
            self.config.port,
            self.config.bucket
        );
        Ok(&*self.services.insert(services))
    }

    pub fn stop(&mut self) -> Result<(), ServerError> {
        tracing::info!("Stopping S3 SFTP Server");
        let services = self
            .services
            .take()
            .ok_or_else(|| ServerError::Stop("server not running".to_string()))?;
        let open = services.registry.keys().len();
        drop(services);
        tracing::info!("S3 SFTP Server stopped ({} filesystems open at shutdown)", open);
        Ok(())
    }
}
