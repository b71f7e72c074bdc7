//! Shared test utilities for provider chain and subsystem integration tests
#![allow(dead_code)]

use std::sync::Arc;

use ::common::cache::UserFileSystemCache;
use ::common::channel::{OpenOptions, SeekableByteChannel};
use ::common::client::{ObjectStoreClient, StorageClient};
use ::common::enhancer::FixedPrefixPathEnhancer;
use ::common::factory::FileSystemFactory;
use ::common::filesystem::FileSystem;
use ::common::mapping::{fixed_bucket, SessionHome, SessionJail, Template};
use ::common::path::StoragePath;
use ::common::properties::Properties;
use ::common::provider::{build_chain, FileSystemProvider};
use ::common::registry::FileSystemRegistry;
use ::common::session::Session;
use ::common::subsystem::SubsystemFactory;

pub const BUCKET: &str = "bucket";

/// Everything a test needs to build filesystems against one in-memory
/// storage account that can see `bucket`
pub struct TestEnv {
    pub client: Arc<ObjectStoreClient>,
    pub registry: Arc<FileSystemRegistry>,
    pub cache: Arc<UserFileSystemCache>,
}

pub fn setup_test_env() -> TestEnv {
    setup_test_env_with_buckets(&[BUCKET])
}

pub fn setup_test_env_with_buckets(buckets: &[&str]) -> TestEnv {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    TestEnv {
        client: Arc::new(ObjectStoreClient::memory(buckets.iter().copied())),
        registry: Arc::new(FileSystemRegistry::new()),
        cache: Arc::new(UserFileSystemCache::new()),
    }
}

impl TestEnv {
    /// A full provider chain with the session enhancer for `jail`
    pub fn chain(&self, jail: &str) -> Arc<dyn FileSystemProvider> {
        build_chain(
            Arc::new(FixedPrefixPathEnhancer::for_bucket(BUCKET, jail)),
            self.client.clone(),
            self.registry.clone(),
        )
    }

    pub async fn file_system(&self, username: &str, home: &str, jail: &str) -> Arc<FileSystem> {
        let env = Properties::for_session(username, BUCKET, home, jail);
        self.chain(jail)
            .get_file_system(self.client.uri(), &env)
            .await
            .unwrap()
    }

    pub fn file_system_factory(&self, home: &str, jail: &str) -> FileSystemFactory {
        let home: Arc<dyn SessionHome> = Arc::new(Template::new(home));
        let jail: Arc<dyn SessionJail> = Arc::new(Template::new(jail));
        FileSystemFactory::new(
            fixed_bucket(BUCKET),
            home,
            jail,
            self.client.clone(),
            self.registry.clone(),
            self.cache.clone(),
        )
    }

    pub fn subsystem_factory(&self, home: &str, jail: &str) -> SubsystemFactory {
        SubsystemFactory::new(
            fixed_bucket(BUCKET),
            Arc::new(Template::new(home)),
            Arc::new(Template::new(jail)),
            self.cache.clone(),
        )
    }
}

pub fn session(username: &str) -> Session {
    Session::new(username, Some("127.0.0.1:50022".parse().unwrap()))
}

/// Write `data` to `path` through the filesystem
pub async fn write_file(fs: &FileSystem, path: &str, data: &[u8]) {
    let mut channel = fs
        .open(&StoragePath::new(path), &OpenOptions::write_replace())
        .await
        .unwrap();
    channel.write(data).await.unwrap();
    channel.close().await.unwrap();
}

/// Read the whole of `path` through the filesystem
pub async fn read_file(fs: &FileSystem, path: &str) -> Vec<u8> {
    let mut channel = fs
        .open(&StoragePath::new(path), &OpenOptions::read_only())
        .await
        .unwrap();
    let mut contents = Vec::new();
    let mut buf = [0u8; 64];
    loop {
        let read = channel.read(&mut buf).await.unwrap();
        if read == 0 {
            break;
        }
        contents.extend_from_slice(&buf[..read]);
    }
    channel.close().await.unwrap();
    contents
}
