//! Driver trait

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use std::pin::Pin;

use crate::{error::FdkResult, file::File};

/// Byte stream type
///
/// Dropping the stream releases whatever handle the driver holds open.
pub type ByteStream = Pin<Box<dyn Stream<Item = FdkResult<Bytes>> + Send>>;

/// The operations every storage backend must implement.
///
/// Paths are interpreted inside the driver's own namespace. A backend that
/// cannot perform an operation still implements it and fails with
/// [`FdkError::Unsupported`](crate::FdkError::Unsupported).
#[async_trait]
pub trait Driver: Send + Sync {
    /// Reports whether `path` exists.
    ///
    /// Never fails: a missing entry and an unreachable backend both report
    /// `false`. Use [`Driver::read`] and inspect the error to tell them apart.
    async fn exists(&self, path: &str) -> bool;

    async fn read(&self, path: &str) -> FdkResult<ByteStream>;

    async fn list(&self, path: &str) -> FdkResult<Vec<File>>;

    /// Creates `path`; fails with `AlreadyExists` rather than overwrite.
    async fn write(&self, path: &str, data: Bytes) -> FdkResult<()>;

    /// Creates or overwrites `path`.
    async fn update(&self, path: &str, data: Bytes) -> FdkResult<()>;

    async fn create_dir(&self, path: &str) -> FdkResult<()>;

    async fn delete_dir(&self, path: &str) -> FdkResult<()>;

    async fn delete(&self, path: &str) -> FdkResult<()>;

    async fn rename(&self, path: &str, new_path: &str) -> FdkResult<()>;

    async fn copy(&self, path: &str, new_path: &str) -> FdkResult<()>;
}

/// Drain a [`ByteStream`] into a single buffer.
pub async fn collect_bytes(mut stream: ByteStream) -> FdkResult<Bytes> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf.freeze())
}

/// A stream yielding `data` as a single chunk.
pub fn once_stream(data: Bytes) -> ByteStream {
    Box::pin(futures::stream::once(async move { Ok(data) }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FdkError;

    #[tokio::test]
    async fn test_collect_bytes_joins_chunks() {
        let stream: ByteStream = Box::pin(futures::stream::iter(vec![
            Ok(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"world")),
        ]));
        assert_eq!(collect_bytes(stream).await.unwrap(), Bytes::from_static(b"hello world"));
    }

    #[tokio::test]
    async fn test_collect_bytes_propagates_error() {
        let stream: ByteStream = Box::pin(futures::stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(FdkError::Network("reset".into())),
        ]));
        assert!(matches!(collect_bytes(stream).await, Err(FdkError::Network(_))));
    }

    #[tokio::test]
    async fn test_once_stream() {
        let data = Bytes::from_static(b"payload");
        assert_eq!(collect_bytes(once_stream(data.clone())).await.unwrap(), data);
    }
}
