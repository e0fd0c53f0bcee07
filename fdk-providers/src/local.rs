//! Local filesystem driver

use async_trait::async_trait;
use bytes::Bytes;
use fdk_core::{
    ByteStream, Driver, DriverConfig, DriverPath, DriverRegistry, FdkError, FdkResult, File,
};
use futures::TryStreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

/// Local filesystem driver rooted at a host directory
#[derive(Debug, Clone)]
pub struct LocalDriver {
    root: PathBuf,
}

impl LocalDriver {
    pub const NAME: &'static str = "local";

    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Builder registered under [`LocalDriver::NAME`]; requires `rootDir`.
    pub fn build(config: &DriverConfig) -> FdkResult<Box<dyn Driver>> {
        let root = config.require(Self::NAME, "rootDir")?;
        Ok(Box::new(Self::new(root)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn to_real_path(&self, path: &DriverPath) -> PathBuf {
        let mut real = self.root.clone();
        for seg in path.segments() {
            real.push(seg);
        }
        real
    }

    /// Resolve `path` and stat it, following symlinks.
    async fn stat(&self, path: &str) -> FdkResult<(DriverPath, PathBuf, std::fs::Metadata)> {
        let vpath = DriverPath::new(path);
        let real = self.to_real_path(&vpath);
        let meta = fs::metadata(&real)
            .await
            .map_err(|e| FdkError::from_io(e, path))?;
        Ok((vpath, real, meta))
    }

    /// Fails with `err` when `path` resolves to an existing directory.
    async fn refuse_directory(&self, real: &Path, err: FdkError) -> FdkResult<()> {
        match fs::metadata(real).await {
            Ok(meta) if meta.is_dir() => Err(err),
            _ => Ok(()),
        }
    }
}

/// Register the local driver.
pub fn register(registry: &DriverRegistry) {
    registry.register(LocalDriver::NAME, LocalDriver::build);
}

#[async_trait]
impl Driver for LocalDriver {
    async fn exists(&self, path: &str) -> bool {
        let real = self.to_real_path(&DriverPath::new(path));
        matches!(fs::try_exists(&real).await, Ok(true))
    }

    async fn read(&self, path: &str) -> FdkResult<ByteStream> {
        tracing::debug!(driver = Self::NAME, path, "read");
        let (_, real, meta) = self.stat(path).await?;
        if meta.is_dir() {
            return Err(FdkError::NotAFile(path.to_string()));
        }

        let file = fs::File::open(&real)
            .await
            .map_err(|e| FdkError::from_io(e, path))?;
        Ok(Box::pin(ReaderStream::new(file).map_err(FdkError::Io)))
    }

    async fn list(&self, path: &str) -> FdkResult<Vec<File>> {
        tracing::debug!(driver = Self::NAME, path, "list");
        let (vpath, real, meta) = self.stat(path).await?;
        if !meta.is_dir() {
            return Err(FdkError::NotADirectory(path.to_string()));
        }

        let mut files = Vec::new();
        let mut read_dir = fs::read_dir(&real).await?;

        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                tracing::warn!(
                    driver = Self::NAME,
                    path,
                    name = ?entry.file_name(),
                    "skipping entry with a non-UTF-8 name"
                );
                continue;
            };
            let child = vpath.join(name);
            // Follow symlinks; a dangling link is listed as a file.
            let is_dir = match fs::metadata(entry.path()).await {
                Ok(meta) => meta.is_dir(),
                Err(_) => entry.file_type().await?.is_dir(),
            };
            files.push(File {
                path: child.to_relative_string(),
                is_dir,
            });
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    async fn write(&self, path: &str, data: Bytes) -> FdkResult<()> {
        tracing::debug!(driver = Self::NAME, path, len = data.len(), "write");
        let real = self.to_real_path(&DriverPath::new(path));

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&real)
            .await
            .map_err(|e| FdkError::from_io(e, path))?;
        file.write_all(&data).await?;
        file.flush().await?;
        Ok(())
    }

    async fn update(&self, path: &str, data: Bytes) -> FdkResult<()> {
        tracing::debug!(driver = Self::NAME, path, len = data.len(), "update");
        let real = self.to_real_path(&DriverPath::new(path));
        self.refuse_directory(&real, FdkError::NotAFile(path.to_string()))
            .await?;
        fs::write(&real, &data)
            .await
            .map_err(|e| FdkError::from_io(e, path))
    }

    async fn create_dir(&self, path: &str) -> FdkResult<()> {
        tracing::debug!(driver = Self::NAME, path, "create_dir");
        let real = self.to_real_path(&DriverPath::new(path));
        fs::create_dir(&real)
            .await
            .map_err(|e| FdkError::from_io(e, path))
    }

    async fn delete_dir(&self, path: &str) -> FdkResult<()> {
        tracing::debug!(driver = Self::NAME, path, "delete_dir");
        let (vpath, real, meta) = self.stat(path).await?;
        if !meta.is_dir() {
            return Err(FdkError::NotADirectory(path.to_string()));
        }
        if vpath.is_root() {
            return Err(FdkError::Unsupported("deleting the driver root".into()));
        }

        fs::remove_dir_all(&real)
            .await
            .map_err(|e| FdkError::from_io(e, path))
    }

    async fn delete(&self, path: &str) -> FdkResult<()> {
        tracing::debug!(driver = Self::NAME, path, "delete");
        // A symlink is removed itself, never its target.
        let real = self.to_real_path(&DriverPath::new(path));
        let meta = fs::symlink_metadata(&real)
            .await
            .map_err(|e| FdkError::from_io(e, path))?;
        if meta.is_dir() {
            return Err(FdkError::NotAFile(path.to_string()));
        }

        fs::remove_file(&real)
            .await
            .map_err(|e| FdkError::from_io(e, path))
    }

    async fn rename(&self, path: &str, new_path: &str) -> FdkResult<()> {
        tracing::debug!(driver = Self::NAME, path, new_path, "rename");
        let (_, src_real, _) = self.stat(path).await?;
        let dst_real = self.to_real_path(&DriverPath::new(new_path));

        fs::rename(&src_real, &dst_real)
            .await
            .map_err(|e| FdkError::from_io(e, new_path))
    }

    async fn copy(&self, path: &str, new_path: &str) -> FdkResult<()> {
        tracing::debug!(driver = Self::NAME, path, new_path, "copy");
        let (_, src_real, meta) = self.stat(path).await?;
        if meta.is_dir() {
            return Err(FdkError::NotAFile(path.to_string()));
        }
        let dst_real = self.to_real_path(&DriverPath::new(new_path));
        self.refuse_directory(&dst_real, FdkError::AlreadyExists(new_path.to_string()))
            .await?;

        fs::copy(&src_real, &dst_real)
            .await
            .map_err(|e| FdkError::from_io(e, new_path))?;
        Ok(())
    }
}
