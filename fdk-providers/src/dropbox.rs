//! Dropbox driver
//!
//! Talks to the Dropbox API v2 with a pre-issued access token.

use async_trait::async_trait;
use bytes::Bytes;
use fdk_core::{
    ByteStream, Driver, DriverConfig, DriverPath, DriverRegistry, FdkError, FdkResult, File,
};
use futures::TryStreamExt;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

const DROPBOX_API_URL: &str = "https://api.dropboxapi.com/2";
const DROPBOX_CONTENT_URL: &str = "https://content.dropboxapi.com/2";

/// Dropbox driver configuration
#[derive(Debug, Clone)]
pub struct DropboxConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token: String,
    pub api_url: String,
    pub content_url: String,
}

impl DropboxConfig {
    /// Read the driver keys, failing on the first one that is missing.
    pub fn from_driver_config(config: &DriverConfig) -> FdkResult<Self> {
        let name = DropboxDriver::NAME;
        Ok(Self {
            client_id: config.require(name, "client_id")?.to_string(),
            client_secret: config.require(name, "client_secret")?.to_string(),
            token: config.require(name, "token")?.to_string(),
            api_url: config
                .get("api_url")
                .unwrap_or(DROPBOX_API_URL)
                .trim_end_matches('/')
                .to_string(),
            content_url: config
                .get("content_url")
                .unwrap_or(DROPBOX_CONTENT_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

/// Dropbox driver
pub struct DropboxDriver {
    config: DropboxConfig,
    http: Client,
}

impl DropboxDriver {
    pub const NAME: &'static str = "dropbox";

    pub fn new(config: DropboxConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    /// Builder registered under [`DropboxDriver::NAME`]; requires
    /// `client_id`, `client_secret` and `token`.
    pub fn build(config: &DriverConfig) -> FdkResult<Box<dyn Driver>> {
        Ok(Box::new(Self::new(DropboxConfig::from_driver_config(config)?)))
    }

    /// Make authenticated RPC request
    async fn api_request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        path: &str,
        body: impl Serialize,
    ) -> FdkResult<T> {
        let url = format!("{}/{}", self.config.api_url, endpoint);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| FdkError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &error_text, path));
        }

        response
            .json()
            .await
            .map_err(|e| FdkError::Serialization(e.to_string()))
    }

    async fn metadata(&self, path: &str) -> FdkResult<DropboxMetadata> {
        #[derive(Serialize)]
        struct GetMetadataArg {
            path: String,
        }

        self.api_request(
            "files/get_metadata",
            path,
            GetMetadataArg {
                path: to_dropbox_path(&DriverPath::new(path)),
            },
        )
        .await
    }

    async fn upload(&self, path: &str, data: Bytes, overwrite: bool) -> FdkResult<()> {
        #[derive(Serialize)]
        struct UploadArg {
            path: String,
            mode: &'static str,
            autorename: bool,
            mute: bool,
        }

        let arg = header_safe_json(&UploadArg {
            path: to_dropbox_path(&DriverPath::new(path)),
            mode: if overwrite { "overwrite" } else { "add" },
            autorename: false,
            mute: false,
        })?;

        let response = self
            .http
            .post(format!("{}/files/upload", self.config.content_url))
            .bearer_auth(&self.config.token)
            .header("Dropbox-API-Arg", arg)
            .header("Content-Type", "application/octet-stream")
            .body(data)
            .send()
            .await
            .map_err(|e| FdkError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &error_text, path));
        }
        Ok(())
    }

    async fn remove(&self, path: &str) -> FdkResult<()> {
        #[derive(Serialize)]
        struct DeleteArg {
            path: String,
        }

        let _: serde_json::Value = self
            .api_request(
                "files/delete_v2",
                path,
                DeleteArg {
                    path: to_dropbox_path(&DriverPath::new(path)),
                },
            )
            .await?;
        Ok(())
    }
}

/// Dropbox addresses the root as `""` and everything else as `/a/b`.
fn to_dropbox_path(path: &DriverPath) -> String {
    if path.is_root() {
        String::new()
    } else {
        path.to_path_string()
    }
}

/// Serialize `value` for the `Dropbox-API-Arg` header, escaping non-ASCII
/// characters as the API requires.
fn header_safe_json(value: &impl Serialize) -> FdkResult<String> {
    let json = serde_json::to_string(value).map_err(|e| FdkError::Serialization(e.to_string()))?;
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    Ok(out)
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error_summary: String,
}

/// Map a failed Dropbox response onto the driver error taxonomy.
fn classify_error(status: StatusCode, body: &str, path: &str) -> FdkError {
    let summary = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error_summary)
        .unwrap_or_default();

    match status {
        StatusCode::UNAUTHORIZED => FdkError::AuthFailed(body.to_string()),
        StatusCode::CONFLICT if summary.contains("not_found") => {
            FdkError::NotFound(path.to_string())
        }
        StatusCode::CONFLICT if summary.contains("conflict") => {
            FdkError::AlreadyExists(path.to_string())
        }
        StatusCode::CONFLICT if summary.contains("not_folder") => {
            FdkError::NotADirectory(path.to_string())
        }
        StatusCode::CONFLICT if summary.contains("not_file") => {
            FdkError::NotAFile(path.to_string())
        }
        _ => FdkError::ProviderApi {
            provider: DropboxDriver::NAME.into(),
            message: format!("{}: {}", status, body),
        },
    }
}

/// Dropbox file metadata response
#[derive(Debug, Deserialize)]
struct DropboxMetadata {
    #[serde(rename = ".tag")]
    tag: String,
    name: String,
    path_display: Option<String>,
}

impl DropboxMetadata {
    fn is_dir(&self) -> bool {
        self.tag == "folder"
    }

    fn to_file(&self) -> File {
        let path = self.path_display.as_deref().unwrap_or(&self.name);
        File {
            path: DriverPath::new(path).to_relative_string(),
            is_dir: self.is_dir(),
        }
    }
}

/// List folder response
#[derive(Debug, Deserialize)]
struct ListFolderResponse {
    entries: Vec<DropboxMetadata>,
    cursor: String,
    has_more: bool,
}

/// Register the Dropbox driver.
pub fn register(registry: &DriverRegistry) {
    registry.register(DropboxDriver::NAME, DropboxDriver::build);
}

#[async_trait]
impl Driver for DropboxDriver {
    async fn exists(&self, path: &str) -> bool {
        if DriverPath::new(path).is_root() {
            // get_metadata rejects the root; check it with a one-entry listing.
            #[derive(Serialize)]
            struct ListFolderArg {
                path: String,
                limit: u32,
            }
            return self
                .api_request::<ListFolderResponse>(
                    "files/list_folder",
                    path,
                    ListFolderArg {
                        path: String::new(),
                        limit: 1,
                    },
                )
                .await
                .is_ok();
        }
        self.metadata(path).await.is_ok()
    }

    async fn read(&self, path: &str) -> FdkResult<ByteStream> {
        tracing::debug!(driver = Self::NAME, path, "read");

        #[derive(Serialize)]
        struct DownloadArg {
            path: String,
        }

        let arg = header_safe_json(&DownloadArg {
            path: to_dropbox_path(&DriverPath::new(path)),
        })?;

        let response = self
            .http
            .post(format!("{}/files/download", self.config.content_url))
            .bearer_auth(&self.config.token)
            .header("Dropbox-API-Arg", arg)
            .send()
            .await
            .map_err(|e| FdkError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &error_text, path));
        }

        Ok(Box::pin(
            response
                .bytes_stream()
                .map_err(|e| FdkError::Network(e.to_string())),
        ))
    }

    async fn list(&self, path: &str) -> FdkResult<Vec<File>> {
        tracing::debug!(driver = Self::NAME, path, "list");

        #[derive(Serialize)]
        struct ListFolderArg {
            path: String,
            recursive: bool,
            include_deleted: bool,
            limit: u32,
        }

        let result: ListFolderResponse = self
            .api_request(
                "files/list_folder",
                path,
                ListFolderArg {
                    path: to_dropbox_path(&DriverPath::new(path)),
                    recursive: false,
                    include_deleted: false,
                    limit: 2000,
                },
            )
            .await?;

        let mut files: Vec<File> = result.entries.iter().map(DropboxMetadata::to_file).collect();

        let mut cursor = result.cursor;
        let mut has_more = result.has_more;

        while has_more {
            #[derive(Serialize)]
            struct ListFolderContinueArg {
                cursor: String,
            }

            let page: ListFolderResponse = self
                .api_request(
                    "files/list_folder/continue",
                    path,
                    ListFolderContinueArg { cursor },
                )
                .await?;

            files.extend(page.entries.iter().map(DropboxMetadata::to_file));
            cursor = page.cursor;
            has_more = page.has_more;
        }

        Ok(files)
    }

    async fn write(&self, path: &str, data: Bytes) -> FdkResult<()> {
        tracing::debug!(driver = Self::NAME, path, len = data.len(), "write");
        self.upload(path, data, false).await
    }

    async fn update(&self, path: &str, data: Bytes) -> FdkResult<()> {
        tracing::debug!(driver = Self::NAME, path, len = data.len(), "update");
        self.upload(path, data, true).await
    }

    async fn create_dir(&self, path: &str) -> FdkResult<()> {
        tracing::debug!(driver = Self::NAME, path, "create_dir");

        #[derive(Serialize)]
        struct CreateFolderArg {
            path: String,
            autorename: bool,
        }

        let _: serde_json::Value = self
            .api_request(
                "files/create_folder_v2",
                path,
                CreateFolderArg {
                    path: to_dropbox_path(&DriverPath::new(path)),
                    autorename: false,
                },
            )
            .await?;
        Ok(())
    }

    async fn delete_dir(&self, path: &str) -> FdkResult<()> {
        tracing::debug!(driver = Self::NAME, path, "delete_dir");
        if DriverPath::new(path).is_root() {
            return Err(FdkError::Unsupported("deleting the driver root".into()));
        }
        if !self.metadata(path).await?.is_dir() {
            return Err(FdkError::NotADirectory(path.to_string()));
        }
        self.remove(path).await
    }

    async fn delete(&self, path: &str) -> FdkResult<()> {
        tracing::debug!(driver = Self::NAME, path, "delete");
        if DriverPath::new(path).is_root() || self.metadata(path).await?.is_dir() {
            return Err(FdkError::NotAFile(path.to_string()));
        }
        self.remove(path).await
    }

    async fn rename(&self, path: &str, new_path: &str) -> FdkResult<()> {
        tracing::debug!(driver = Self::NAME, path, new_path, "rename");
        self.relocate("files/move_v2", path, new_path).await
    }

    async fn copy(&self, path: &str, new_path: &str) -> FdkResult<()> {
        tracing::debug!(driver = Self::NAME, path, new_path, "copy");
        self.relocate("files/copy_v2", path, new_path).await
    }
}

impl DropboxDriver {
    async fn relocate(&self, endpoint: &str, path: &str, new_path: &str) -> FdkResult<()> {
        #[derive(Serialize)]
        struct RelocationArg {
            from_path: String,
            to_path: String,
            autorename: bool,
        }

        let _: serde_json::Value = self
            .api_request(
                endpoint,
                path,
                RelocationArg {
                    from_path: to_dropbox_path(&DriverPath::new(path)),
                    to_path: to_dropbox_path(&DriverPath::new(new_path)),
                    autorename: false,
                },
            )
            .await
            .map_err(|e| match e {
                // `to/conflict` names the destination, not the source.
                FdkError::AlreadyExists(_) => FdkError::AlreadyExists(new_path.to_string()),
                other => other,
            })?;
        Ok(())
    }
}
