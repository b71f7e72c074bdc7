use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore};

use super::{AccessMode, FileSystemProvider};
use crate::attributes::{self, AttributeMap, AttributeValue};
use crate::channel::{ObjectByteChannel, OpenOptions, SeekableByteChannel};
use crate::client::StorageClient;
use crate::error::{FsError, Result};
use crate::filesystem::FileSystem;
use crate::path::StoragePath;
use crate::properties::{self, Properties};
use crate::registry::FileSystemRegistry;
use crate::uri::FileSystemUri;

/// Zero-length object marking an otherwise empty directory; never listed
pub const DIRECTORY_MARKER: &str = ".keep";

const CREDENTIALS: [&str; 3] = [
    properties::ACCESS_KEY,
    properties::SECRET_KEY,
    properties::REGION,
];

/// What a path names in the bucket
#[derive(Debug)]
enum Entry {
    Object(ObjectMeta),
    Directory,
}

/// Innermost layer: performs every operation against object storage.
///
/// Directories are key prefixes. A directory exists when any object lives
/// beneath it; `create_directory` writes a [`DIRECTORY_MARKER`] so empty
/// directories survive. The root of a bucket always exists.
#[derive(Debug)]
pub struct ObjectStoreProvider {
    client: Arc<dyn StorageClient>,
    registry: Arc<FileSystemRegistry>,
}

impl ObjectStoreProvider {
    pub fn new(client: Arc<dyn StorageClient>, registry: Arc<FileSystemRegistry>) -> Arc<Self> {
        Arc::new(Self { client, registry })
    }

    async fn locate(&self, path: &StoragePath) -> Result<(Arc<dyn ObjectStore>, ObjectPath)> {
        let bucket = path
            .bucket()
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;
        let store = self.client.store(bucket).await?;
        Ok((store, path.object_path()))
    }

    async fn entry(&self, store: &Arc<dyn ObjectStore>, location: &ObjectPath) -> Result<Option<Entry>> {
        if location.as_ref().is_empty() {
            return Ok(Some(Entry::Directory));
        }
        match store.head(location).await {
            Ok(meta) => return Ok(Some(Entry::Object(meta))),
            Err(object_store::Error::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }
        let mut children = store.list(Some(location));
        match children.try_next().await? {
            Some(_) => Ok(Some(Entry::Directory)),
            None => Ok(None),
        }
    }

    async fn require_entry(&self, path: &StoragePath) -> Result<(Arc<dyn ObjectStore>, ObjectPath, Entry)> {
        let (store, location) = self.locate(path).await?;
        match self.entry(&store, &location).await? {
            Some(entry) => Ok((store, location, entry)),
            None => Err(FsError::NotFound(path.to_string())),
        }
    }

    /// Every object at or below `location`
    async fn objects_under(
        &self,
        store: &Arc<dyn ObjectStore>,
        location: &ObjectPath,
    ) -> Result<Vec<ObjectMeta>> {
        let prefix = Some(location).filter(|l| !l.as_ref().is_empty());
        let objects: Vec<ObjectMeta> = store.list(prefix).try_collect().await?;
        Ok(objects)
    }

    async fn copy_object(
        &self,
        from: (&Arc<dyn ObjectStore>, &ObjectPath),
        to: (&Arc<dyn ObjectStore>, &ObjectPath),
        same_bucket: bool,
    ) -> Result<()> {
        if same_bucket {
            from.0.copy(from.1, to.1).await?;
        } else {
            let bytes = from.0.get(from.1).await?.bytes().await?;
            to.0.put(to.1, bytes.into()).await?;
        }
        Ok(())
    }
}

fn file_attributes(meta: &ObjectMeta) -> AttributeMap {
    let mut map = AttributeMap::new();
    map.insert(attributes::SIZE.into(), AttributeValue::Size(meta.size as u64));
    map.insert(
        attributes::LAST_MODIFIED_TIME.into(),
        AttributeValue::Time(meta.last_modified),
    );
    map.insert(attributes::IS_DIRECTORY.into(), AttributeValue::Bool(false));
    map.insert(attributes::IS_REGULAR_FILE.into(), AttributeValue::Bool(true));
    if let Some(e_tag) = &meta.e_tag {
        map.insert(attributes::E_TAG.into(), AttributeValue::Text(e_tag.clone()));
    }
    map
}

fn directory_attributes() -> AttributeMap {
    let mut map = AttributeMap::new();
    map.insert(attributes::SIZE.into(), AttributeValue::Size(0));
    map.insert(
        attributes::LAST_MODIFIED_TIME.into(),
        AttributeValue::Time(DateTime::<Utc>::UNIX_EPOCH),
    );
    map.insert(attributes::IS_DIRECTORY.into(), AttributeValue::Bool(true));
    map.insert(attributes::IS_REGULAR_FILE.into(), AttributeValue::Bool(false));
    map
}

fn marker(location: &ObjectPath) -> ObjectPath {
    location.child(DIRECTORY_MARKER)
}

fn rebase(location: &ObjectPath, from: &ObjectPath, to: &ObjectPath) -> ObjectPath {
    match location.prefix_match(from) {
        Some(rest) => rest.fold(to.clone(), |path, part| path.child(part)),
        None => to.clone(),
    }
}

#[async_trait]
impl FileSystemProvider for ObjectStoreProvider {
    fn delegate(&self) -> Option<&dyn FileSystemProvider> {
        None
    }

    fn file_system_key(&self, uri: &FileSystemUri, _props: &Properties) -> Result<String> {
        Ok(uri.to_string())
    }

    fn overload_properties(&self, props: &mut Properties, env: &Properties) -> Result<()> {
        tracing::trace!("overload_properties({:?})", env);
        for key in CREDENTIALS {
            props.overload_with_env(env, key);
        }
        Ok(())
    }

    fn storage_client(&self, props: &Properties) -> Result<Arc<dyn StorageClient>> {
        Ok(self
            .client
            .with_properties(props)?
            .unwrap_or_else(|| self.client.clone()))
    }

    fn registered_file_system(&self, key: &str) -> Option<Arc<FileSystem>> {
        self.registry.get(key)
    }

    fn register_file_system(&self, fs: Arc<FileSystem>) -> Arc<FileSystem> {
        self.registry.register(fs)
    }

    async fn read_attributes(&self, path: &StoragePath) -> Result<AttributeMap> {
        let (_, _, entry) = self.require_entry(path).await?;
        Ok(match entry {
            Entry::Object(meta) => file_attributes(&meta),
            Entry::Directory => directory_attributes(),
        })
    }

    async fn set_attribute(
        &self,
        path: &StoragePath,
        name: &str,
        _value: AttributeValue,
    ) -> Result<()> {
        tracing::debug!("set_attribute({}, {}) not supported", path, name);
        Err(FsError::Unsupported("set_attribute"))
    }

    async fn new_directory_stream(&self, dir: &StoragePath) -> Result<Vec<StoragePath>> {
        let (store, location) = self.locate(dir).await?;
        let prefix = Some(&location).filter(|l| !l.as_ref().is_empty());
        let listing = store.list_with_delimiter(prefix).await?;
        let mut entries: Vec<StoragePath> = listing
            .common_prefixes
            .iter()
            .filter_map(|p| p.filename())
            .chain(
                listing
                    .objects
                    .iter()
                    .filter(|meta| meta.location != location)
                    .filter_map(|meta| meta.location.filename())
                    .filter(|name| *name != DIRECTORY_MARKER),
            )
            .map(|name| dir.join(name))
            .collect();
        if entries.is_empty()
            && listing.objects.is_empty()
            && !dir.is_bucket_root()
        {
            return match self.entry(&store, &location).await? {
                Some(Entry::Object(_)) => Err(FsError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("not a directory: {}", dir),
                ))),
                _ => Err(FsError::NotFound(dir.to_string())),
            };
        }
        entries.sort();
        Ok(entries)
    }

    async fn create_directory(&self, dir: &StoragePath) -> Result<()> {
        let (store, location) = self.locate(dir).await?;
        if self.entry(&store, &location).await?.is_some() {
            return Err(FsError::AlreadyExists(dir.to_string()));
        }
        store.put(&marker(&location), bytes::Bytes::new().into()).await?;
        Ok(())
    }

    async fn delete(&self, path: &StoragePath) -> Result<()> {
        if path.is_bucket_root() {
            return Err(FsError::Unsupported("delete bucket"));
        }
        let (store, location, entry) = self.require_entry(path).await?;
        match entry {
            Entry::Object(meta) => store.delete(&meta.location).await?,
            Entry::Directory => {
                let marker = marker(&location);
                let objects = self.objects_under(&store, &location).await?;
                if objects.iter().any(|meta| meta.location != marker) {
                    return Err(FsError::DirectoryNotEmpty(path.to_string()));
                }
                store.delete(&marker).await?;
            }
        }
        Ok(())
    }

    async fn delete_if_exists(&self, path: &StoragePath) -> Result<bool> {
        match self.delete(path).await {
            Ok(()) => Ok(true),
            Err(FsError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn copy(&self, source: &StoragePath, target: &StoragePath) -> Result<()> {
        let (from_store, from, entry) = self.require_entry(source).await?;
        match entry {
            Entry::Object(_) => {
                let (to_store, to) = self.locate(target).await?;
                let same_bucket = source.bucket() == target.bucket();
                self.copy_object((&from_store, &from), (&to_store, &to), same_bucket)
                    .await
            }
            Entry::Directory => self.create_directory(target).await,
        }
    }

    async fn move_path(&self, source: &StoragePath, target: &StoragePath) -> Result<()> {
        if source.is_bucket_root() {
            return Err(FsError::Unsupported("move bucket"));
        }
        let (from_store, from, entry) = self.require_entry(source).await?;
        let (to_store, to) = self.locate(target).await?;
        let same_bucket = source.bucket() == target.bucket();
        if same_bucket && from == to {
            tracing::debug!("move_path({}) onto itself", source);
            return Ok(());
        }
        if same_bucket && matches!(entry, Entry::Directory) && to.prefix_match(&from).is_some() {
            return Err(FsError::InvalidMove {
                from: source.to_string(),
                to: target.to_string(),
            });
        }
        let objects = match entry {
            Entry::Object(meta) => vec![meta],
            Entry::Directory => self.objects_under(&from_store, &from).await?,
        };
        for meta in objects {
            let destination = rebase(&meta.location, &from, &to);
            if same_bucket {
                from_store.rename(&meta.location, &destination).await?;
            } else {
                self.copy_object(
                    (&from_store, &meta.location),
                    (&to_store, &destination),
                    false,
                )
                .await?;
                from_store.delete(&meta.location).await?;
            }
        }
        Ok(())
    }

    async fn check_access(&self, path: &StoragePath, modes: &[AccessMode]) -> Result<()> {
        let (_, _, entry) = self.require_entry(path).await?;
        if matches!(entry, Entry::Object(_)) && modes.contains(&AccessMode::Execute) {
            return Err(FsError::AccessDenied("execute"));
        }
        Ok(())
    }

    async fn new_byte_channel(
        &self,
        path: &StoragePath,
        options: &OpenOptions,
    ) -> Result<Box<dyn SeekableByteChannel>> {
        if path.is_bucket_root() {
            return Err(FsError::NotFound(path.to_string()));
        }
        let (store, location) = self.locate(path).await?;
        let channel = ObjectByteChannel::open(store, location, *options).await?;
        Ok(Box::new(channel))
    }

    async fn is_same_file(&self, first: &StoragePath, second: &StoragePath) -> Result<bool> {
        Ok(first == second)
    }

    async fn is_hidden(&self, path: &StoragePath) -> Result<bool> {
        Ok(path.file_name().is_some_and(|name| name.starts_with('.')))
    }
}
