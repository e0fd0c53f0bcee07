//! In-memory driver
//!
//! Keeps the whole tree in process memory. Useful for tests and demos; all
//! data is lost on drop.

use async_trait::async_trait;
use bytes::Bytes;
use fdk_core::{
    once_stream, ByteStream, Driver, DriverConfig, DriverPath, DriverRegistry, FdkError,
    FdkResult, File,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
enum Node {
    File(Bytes),
    Directory,
}

/// In-memory driver
#[derive(Debug)]
pub struct MemoryDriver {
    tree: RwLock<BTreeMap<DriverPath, Node>>,
}

impl MemoryDriver {
    pub const NAME: &'static str = "memory";

    pub fn new() -> Self {
        let mut tree = BTreeMap::new();
        tree.insert(DriverPath::root(), Node::Directory);
        Self {
            tree: RwLock::new(tree),
        }
    }

    /// Builder registered under [`MemoryDriver::NAME`]; takes no keys.
    pub fn build(_config: &DriverConfig) -> FdkResult<Box<dyn Driver>> {
        Ok(Box::new(Self::new()))
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Register the memory driver.
pub fn register(registry: &DriverRegistry) {
    registry.register(MemoryDriver::NAME, MemoryDriver::build);
}

/// Check that the parent of `path` is an existing directory.
fn check_parent(tree: &BTreeMap<DriverPath, Node>, path: &DriverPath, raw: &str) -> FdkResult<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    match tree.get(&parent) {
        Some(Node::Directory) => Ok(()),
        Some(Node::File(_)) => Err(FdkError::NotADirectory(parent.to_path_string())),
        None => Err(FdkError::NotFound(format!("parent of {raw}"))),
    }
}

/// Re-anchor `path` from under `from` to under `to`.
fn rebase(path: &DriverPath, from: &DriverPath, to: &DriverPath) -> DriverPath {
    path.segments()[from.segments().len()..]
        .iter()
        .fold(to.clone(), |acc, seg| acc.join(seg))
}

#[async_trait]
impl Driver for MemoryDriver {
    async fn exists(&self, path: &str) -> bool {
        self.tree.read().contains_key(&DriverPath::new(path))
    }

    async fn read(&self, path: &str) -> FdkResult<ByteStream> {
        tracing::debug!(driver = Self::NAME, path, "read");
        match self.tree.read().get(&DriverPath::new(path)) {
            Some(Node::File(data)) => Ok(once_stream(data.clone())),
            Some(Node::Directory) => Err(FdkError::NotAFile(path.to_string())),
            None => Err(FdkError::NotFound(path.to_string())),
        }
    }

    async fn list(&self, path: &str) -> FdkResult<Vec<File>> {
        tracing::debug!(driver = Self::NAME, path, "list");
        let dir = DriverPath::new(path);
        let tree = self.tree.read();
        match tree.get(&dir) {
            Some(Node::Directory) => {}
            Some(Node::File(_)) => return Err(FdkError::NotADirectory(path.to_string())),
            None => return Err(FdkError::NotFound(path.to_string())),
        }

        let depth = dir.segments().len() + 1;
        let files = tree
            .range(dir.clone()..)
            .skip(1)
            .take_while(|(key, _)| key.starts_with(&dir))
            .filter(|(key, _)| key.segments().len() == depth)
            .map(|(key, node)| File {
                path: key.to_relative_string(),
                is_dir: matches!(node, Node::Directory),
            })
            .collect();
        Ok(files)
    }

    async fn write(&self, path: &str, data: Bytes) -> FdkResult<()> {
        tracing::debug!(driver = Self::NAME, path, len = data.len(), "write");
        let key = DriverPath::new(path);
        let mut tree = self.tree.write();
        if tree.contains_key(&key) {
            return Err(FdkError::AlreadyExists(path.to_string()));
        }
        check_parent(&tree, &key, path)?;
        tree.insert(key, Node::File(data));
        Ok(())
    }

    async fn update(&self, path: &str, data: Bytes) -> FdkResult<()> {
        tracing::debug!(driver = Self::NAME, path, len = data.len(), "update");
        let key = DriverPath::new(path);
        let mut tree = self.tree.write();
        if let Some(Node::Directory) = tree.get(&key) {
            return Err(FdkError::NotAFile(path.to_string()));
        }
        check_parent(&tree, &key, path)?;
        tree.insert(key, Node::File(data));
        Ok(())
    }

    async fn create_dir(&self, path: &str) -> FdkResult<()> {
        tracing::debug!(driver = Self::NAME, path, "create_dir");
        let key = DriverPath::new(path);
        let mut tree = self.tree.write();
        if tree.contains_key(&key) {
            return Err(FdkError::AlreadyExists(path.to_string()));
        }
        check_parent(&tree, &key, path)?;
        tree.insert(key, Node::Directory);
        Ok(())
    }

    async fn delete_dir(&self, path: &str) -> FdkResult<()> {
        tracing::debug!(driver = Self::NAME, path, "delete_dir");
        let dir = DriverPath::new(path);
        let mut tree = self.tree.write();
        match tree.get(&dir) {
            Some(Node::Directory) if dir.is_root() => {
                Err(FdkError::Unsupported("deleting the driver root".into()))
            }
            Some(Node::Directory) => {
                tree.retain(|key, _| !key.starts_with(&dir));
                Ok(())
            }
            Some(Node::File(_)) => Err(FdkError::NotADirectory(path.to_string())),
            None => Err(FdkError::NotFound(path.to_string())),
        }
    }

    async fn delete(&self, path: &str) -> FdkResult<()> {
        tracing::debug!(driver = Self::NAME, path, "delete");
        let key = DriverPath::new(path);
        let mut tree = self.tree.write();
        match tree.get(&key) {
            Some(Node::File(_)) => {
                tree.remove(&key);
                Ok(())
            }
            Some(Node::Directory) => Err(FdkError::NotAFile(path.to_string())),
            None => Err(FdkError::NotFound(path.to_string())),
        }
    }

    async fn rename(&self, path: &str, new_path: &str) -> FdkResult<()> {
        tracing::debug!(driver = Self::NAME, path, new_path, "rename");
        let from = DriverPath::new(path);
        let to = DriverPath::new(new_path);
        let mut tree = self.tree.write();

        let source_is_dir = match tree.get(&from) {
            Some(node) => matches!(node, Node::Directory),
            None => return Err(FdkError::NotFound(path.to_string())),
        };
        if from == to {
            return Ok(());
        }
        if from.is_root() || to.starts_with(&from) {
            return Err(FdkError::Unsupported(format!(
                "cannot move {path} inside itself"
            )));
        }
        if matches!(tree.get(&to), Some(Node::Directory)) || (source_is_dir && tree.contains_key(&to)) {
            return Err(FdkError::AlreadyExists(new_path.to_string()));
        }
        check_parent(&tree, &to, new_path)?;

        let moved: Vec<DriverPath> = tree
            .range(from.clone()..)
            .take_while(|(key, _)| key.starts_with(&from))
            .map(|(key, _)| key.clone())
            .collect();
        for key in moved {
            if let Some(node) = tree.remove(&key) {
                tree.insert(rebase(&key, &from, &to), node);
            }
        }
        Ok(())
    }

    async fn copy(&self, path: &str, new_path: &str) -> FdkResult<()> {
        tracing::debug!(driver = Self::NAME, path, new_path, "copy");
        let from = DriverPath::new(path);
        let to = DriverPath::new(new_path);
        let mut tree = self.tree.write();

        let data = match tree.get(&from) {
            Some(Node::File(data)) => data.clone(),
            Some(Node::Directory) => return Err(FdkError::NotAFile(path.to_string())),
            None => return Err(FdkError::NotFound(path.to_string())),
        };
        if matches!(tree.get(&to), Some(Node::Directory)) {
            return Err(FdkError::AlreadyExists(new_path.to_string()));
        }
        check_parent(&tree, &to, new_path)?;
        tree.insert(to, Node::File(data));
        Ok(())
    }
}
