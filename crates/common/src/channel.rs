//! Byte and file channels over single objects.
//!
//! Object storage only reads and writes whole objects. A channel stages the
//! object in a local temporary file so clients can seek, read, write and
//! truncate it; the object is uploaded again when a written channel is
//! closed.

use std::io::SeekFrom;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::error::{FsError, Result};

/// How a channel is opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenOptions {
    pub read: bool,
    pub write: bool,
    pub append: bool,
    pub create: bool,
    pub create_new: bool,
    pub truncate_existing: bool,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_only() -> Self {
        Self::new().read(true)
    }

    /// Write, creating the object or replacing its contents
    pub fn write_replace() -> Self {
        Self::new().write(true).create(true).truncate_existing(true)
    }

    pub fn read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }

    pub fn write(mut self, write: bool) -> Self {
        self.write = write;
        self
    }

    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    pub fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    pub fn create_new(mut self, create_new: bool) -> Self {
        self.create_new = create_new;
        self
    }

    pub fn truncate_existing(mut self, truncate: bool) -> Self {
        self.truncate_existing = truncate;
        self
    }

    pub fn is_writable(&self) -> bool {
        self.write || self.append
    }

    /// Neither read nor write requested means read
    pub fn is_readable(&self) -> bool {
        self.read || !self.is_writable()
    }
}

/// A seekable channel over one object's bytes
#[async_trait]
pub trait SeekableByteChannel: Send + std::fmt::Debug {
    /// Read into `buf` from the current position, returning the number of
    /// bytes read; zero at end of data.
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write `buf` at the current position (or at the end in append mode)
    async fn write(&mut self, buf: &[u8]) -> Result<usize>;

    fn position(&self) -> Result<u64>;

    fn set_position(&mut self, position: u64) -> Result<()>;

    fn size(&self) -> Result<u64>;

    /// Drop bytes beyond `size`
    async fn truncate(&mut self, size: u64) -> Result<()>;

    fn is_open(&self) -> bool;

    /// Close the channel, uploading the object if it was written
    async fn close(&mut self) -> Result<()>;
}

/// Channel over an object, staged in a temporary file
#[derive(Debug)]
pub struct ObjectByteChannel {
    store: Arc<dyn ObjectStore>,
    location: ObjectPath,
    file: tokio::fs::File,
    position: u64,
    size: u64,
    options: OpenOptions,
    dirty: bool,
    open: bool,
}

impl ObjectByteChannel {
    /// Open a channel over `location`.
    ///
    /// Existing contents are downloaded unless the object is being
    /// truncated; a missing object is only acceptable with `create` or
    /// `create_new`.
    pub async fn open(
        store: Arc<dyn ObjectStore>,
        location: ObjectPath,
        options: OpenOptions,
    ) -> Result<Self> {
        tracing::trace!("open({}, {:?})", location, options);
        let existing = match store.get(&location).await {
            Ok(result) => Some(result.bytes().await?),
            Err(object_store::Error::NotFound { .. }) => None,
            Err(e) => return Err(e.into()),
        };
        match (&existing, options.create_new, options.create) {
            (Some(_), true, _) => return Err(FsError::AlreadyExists(location.to_string())),
            (None, false, false) => return Err(FsError::NotFound(location.to_string())),
            _ => {}
        }

        let mut file = tokio::fs::File::from_std(tempfile::tempfile()?);
        let truncate = options.truncate_existing && options.is_writable();
        let mut size = 0;
        if let Some(bytes) = existing.as_ref().filter(|_| !truncate) {
            file.write_all(bytes).await?;
            file.flush().await?;
            size = bytes.len() as u64;
        }
        let dirty = options.is_writable() && (existing.is_none() || truncate);
        Ok(Self {
            store,
            location,
            file,
            position: 0,
            size,
            options,
            dirty,
            open: true,
        })
    }

    pub fn location(&self) -> &ObjectPath {
        &self.location
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(FsError::ChannelClosed)
        }
    }
}

#[async_trait]
impl SeekableByteChannel for ObjectByteChannel {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.ensure_open()?;
        if !self.options.is_readable() {
            return Err(FsError::AccessDenied("reading"));
        }
        if self.position >= self.size || buf.is_empty() {
            return Ok(0);
        }
        self.file.seek(SeekFrom::Start(self.position)).await?;
        let limit = usize::try_from(self.size - self.position).unwrap_or(usize::MAX);
        let len = buf.len().min(limit);
        let read = self.file.read(&mut buf[..len]).await?;
        self.position += read as u64;
        Ok(read)
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.ensure_open()?;
        if !self.options.is_writable() {
            return Err(FsError::AccessDenied("writing"));
        }
        if self.options.append {
            self.position = self.size;
        }
        self.file.seek(SeekFrom::Start(self.position)).await?;
        self.file.write_all(buf).await?;
        self.position += buf.len() as u64;
        self.size = self.size.max(self.position);
        self.dirty = true;
        Ok(buf.len())
    }

    fn position(&self) -> Result<u64> {
        self.ensure_open()?;
        Ok(self.position)
    }

    fn set_position(&mut self, position: u64) -> Result<()> {
        self.ensure_open()?;
        self.position = position;
        Ok(())
    }

    fn size(&self) -> Result<u64> {
        self.ensure_open()?;
        Ok(self.size)
    }

    async fn truncate(&mut self, size: u64) -> Result<()> {
        self.ensure_open()?;
        if !self.options.is_writable() {
            return Err(FsError::AccessDenied("writing"));
        }
        if size < self.size {
            self.file.set_len(size).await?;
            self.size = size;
            self.dirty = true;
        }
        self.position = self.position.min(size);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    async fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        if self.dirty {
            // stays open and dirty until the upload succeeds
            tracing::debug!("uploading {} ({} bytes)", self.location, self.size);
            self.file.flush().await?;
            self.file.seek(SeekFrom::Start(0)).await?;
            let mut contents = Vec::with_capacity(usize::try_from(self.size).unwrap_or_default());
            self.file.read_to_end(&mut contents).await?;
            self.store
                .put(&self.location, Bytes::from(contents).into())
                .await?;
            self.dirty = false;
        }
        self.open = false;
        Ok(())
    }
}

/// Random-access file semantics over a [`SeekableByteChannel`].
///
/// Sequential reads and writes, seeking, and truncation go to the wrapped
/// channel. Positional I/O, mapping, locking and syncing are not available
/// on object storage and fail with [`FsError::Unsupported`].
#[derive(Debug)]
pub struct FileChannel {
    inner: Box<dyn SeekableByteChannel>,
}

impl FileChannel {
    pub fn new(inner: Box<dyn SeekableByteChannel>) -> Self {
        tracing::trace!("new({:?})", inner);
        Self { inner }
    }

    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.inner.read(buf).await
    }

    /// Fill each buffer in turn, returning the total bytes read
    pub async fn read_vectored(&mut self, bufs: &mut [&mut [u8]]) -> Result<usize> {
        let mut total = 0;
        for buf in bufs.iter_mut() {
            total += self.inner.read(buf).await?;
        }
        Ok(total)
    }

    pub async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.inner.write(buf).await
    }

    /// Write each buffer in turn, returning the total bytes written
    pub async fn write_vectored(&mut self, bufs: &[&[u8]]) -> Result<usize> {
        let mut total = 0;
        for buf in bufs {
            total += self.inner.write(buf).await?;
        }
        Ok(total)
    }

    pub fn position(&self) -> Result<u64> {
        self.inner.position()
    }

    pub fn set_position(&mut self, position: u64) -> Result<&mut Self> {
        self.inner.set_position(position)?;
        Ok(self)
    }

    pub fn size(&self) -> Result<u64> {
        self.inner.size()
    }

    pub async fn truncate(&mut self, size: u64) -> Result<&mut Self> {
        self.inner.truncate(size).await?;
        Ok(self)
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    pub async fn close(&mut self) -> Result<()> {
        self.inner.close().await
    }

    pub fn read_at(&mut self, _buf: &mut [u8], position: u64) -> Result<usize> {
        tracing::error!("read_at({})", position);
        Err(FsError::Unsupported("positional read"))
    }

    pub fn write_at(&mut self, _buf: &[u8], position: u64) -> Result<usize> {
        tracing::error!("write_at({})", position);
        Err(FsError::Unsupported("positional write"))
    }

    pub fn force(&mut self, metadata: bool) -> Result<()> {
        tracing::error!("force({})", metadata);
        Err(FsError::Unsupported("force"))
    }

    pub fn transfer_to(&mut self, position: u64, count: u64) -> Result<u64> {
        tracing::error!("transfer_to({}, {})", position, count);
        Err(FsError::Unsupported("transfer_to"))
    }

    pub fn transfer_from(&mut self, position: u64, count: u64) -> Result<u64> {
        tracing::error!("transfer_from({}, {})", position, count);
        Err(FsError::Unsupported("transfer_from"))
    }

    pub fn map(&mut self, position: u64, size: u64) -> Result<()> {
        tracing::error!("map({}, {})", position, size);
        Err(FsError::Unsupported("map"))
    }

    pub fn lock(&mut self, position: u64, size: u64, shared: bool) -> Result<()> {
        tracing::error!("lock({}, {}, {})", position, size, shared);
        Err(FsError::Unsupported("lock"))
    }

    pub fn try_lock(&mut self, position: u64, size: u64, shared: bool) -> Result<()> {
        tracing::error!("try_lock({}, {}, {})", position, size, shared);
        Err(FsError::Unsupported("try_lock"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    fn store() -> Arc<dyn ObjectStore> {
        Arc::new(InMemory::new())
    }

    async fn contents(store: &Arc<dyn ObjectStore>, key: &str) -> Bytes {
        store
            .get(&ObjectPath::from(key))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let store = store();
        let location = ObjectPath::from("dir/file.txt");
        let mut channel = ObjectByteChannel::open(
            store.clone(),
            location.clone(),
            OpenOptions::write_replace(),
        )
        .await
        .unwrap();
        assert_eq!(channel.write(b"hello world").await.unwrap(), 11);
        channel.close().await.unwrap();
        assert_eq!(contents(&store, "dir/file.txt").await, Bytes::from("hello world"));

        let mut channel = ObjectByteChannel::open(store, location, OpenOptions::read_only())
            .await
            .unwrap();
        assert_eq!(channel.size().unwrap(), 11);
        channel.set_position(6).unwrap();
        let mut buf = [0u8; 16];
        let read = channel.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..read], b"world");
        assert_eq!(channel.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_object() {
        let err = ObjectByteChannel::open(store(), ObjectPath::from("x"), OpenOptions::read_only())
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_new_existing_object() {
        let store = store();
        store
            .put(&ObjectPath::from("x"), Bytes::from("x").into())
            .await
            .unwrap();
        let options = OpenOptions::new().write(true).create_new(true);
        let err = ObjectByteChannel::open(store, ObjectPath::from("x"), options)
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_append_and_truncate() {
        let store = store();
        store
            .put(&ObjectPath::from("log"), Bytes::from("one,").into())
            .await
            .unwrap();
        let options = OpenOptions::new().append(true);
        let mut channel = ObjectByteChannel::open(store.clone(), ObjectPath::from("log"), options)
            .await
            .unwrap();
        channel.write(b"two,three").await.unwrap();
        channel.truncate(7).await.unwrap();
        assert_eq!(channel.position().unwrap(), 7);
        channel.close().await.unwrap();
        assert_eq!(contents(&store, "log").await, Bytes::from("one,two"));
    }

    #[tokio::test]
    async fn test_read_only_channel_rejects_writes() {
        let store = store();
        store
            .put(&ObjectPath::from("x"), Bytes::from("x").into())
            .await
            .unwrap();
        let mut channel = ObjectByteChannel::open(store, ObjectPath::from("x"), OpenOptions::new())
            .await
            .unwrap();
        assert!(matches!(
            channel.write(b"y").await,
            Err(FsError::AccessDenied(_))
        ));
        channel.close().await.unwrap();
        assert!(matches!(channel.size(), Err(FsError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_failed_upload_can_be_retried() {
        let root = tempfile::tempdir().unwrap();
        let store: Arc<dyn ObjectStore> = Arc::new(
            object_store::local::LocalFileSystem::new_with_prefix(root.path()).unwrap(),
        );
        let mut channel = ObjectByteChannel::open(
            store.clone(),
            ObjectPath::from("dir/file.txt"),
            OpenOptions::write_replace(),
        )
        .await
        .unwrap();
        channel.write(b"kept").await.unwrap();

        // a plain file where the parent directory should go
        let blocker = root.path().join("dir");
        std::fs::write(&blocker, b"").unwrap();
        assert!(channel.close().await.is_err());
        assert!(channel.is_open());

        std::fs::remove_file(&blocker).unwrap();
        channel.close().await.unwrap();
        assert!(!channel.is_open());
        assert_eq!(contents(&store, "dir/file.txt").await, Bytes::from("kept"));
    }

    #[tokio::test]
    async fn test_file_channel_unsupported_operations() {
        let channel = ObjectByteChannel::open(
            store(),
            ObjectPath::from("x"),
            OpenOptions::write_replace(),
        )
        .await
        .unwrap();
        let mut channel = FileChannel::new(Box::new(channel));
        let mut buf = [0u8; 4];
        assert!(matches!(channel.read_at(&mut buf, 0), Err(FsError::Unsupported(_))));
        assert!(matches!(channel.write_at(b"x", 0), Err(FsError::Unsupported(_))));
        assert!(matches!(channel.force(true), Err(FsError::Unsupported(_))));
        assert!(matches!(channel.map(0, 1), Err(FsError::Unsupported(_))));
        assert!(matches!(channel.lock(0, 1, false), Err(FsError::Unsupported(_))));
        assert!(matches!(channel.try_lock(0, 1, true), Err(FsError::Unsupported(_))));
        assert!(matches!(channel.transfer_to(0, 1), Err(FsError::Unsupported(_))));
        assert!(matches!(channel.transfer_from(0, 1), Err(FsError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_file_channel_vectored() {
        let store = store();
        let channel = ObjectByteChannel::open(
            store.clone(),
            ObjectPath::from("v"),
            OpenOptions::write_replace().read(true),
        )
        .await
        .unwrap();
        let mut channel = FileChannel::new(Box::new(channel));
        let written = channel
            .write_vectored(&[&b"ab"[..], &b"cd"[..], &b"e"[..]])
            .await
            .unwrap();
        assert_eq!(written, 5);
        channel.set_position(0).unwrap();
        let mut first = [0u8; 2];
        let mut second = [0u8; 3];
        let read = channel
            .read_vectored(&mut [&mut first[..], &mut second[..]])
            .await
            .unwrap();
        assert_eq!(read, 5);
        assert_eq!(&first, b"ab");
        assert_eq!(&second, b"cde");
        channel.close().await.unwrap();
        assert_eq!(contents(&store, "v").await, Bytes::from("abcde"));
    }
}
