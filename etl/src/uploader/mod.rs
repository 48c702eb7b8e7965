//! SharePoint upload of the Excel output.
//!
//! Files below [`SIMPLE_UPLOAD_LIMIT`] go up in one SharePoint REST request.
//! Larger files go through a Microsoft Graph upload session, one
//! [`CHUNK_SIZE`] byte range per PUT, in order. There is no retry and no
//! resume: the first non-2xx answer aborts the upload.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use satiap_etl::uploader::SharePointClient;
//!
//! let client = SharePointClient::new(&settings.sharepoint)?;
//! let receipt = client.upload_file(Path::new("data/output/output.xlsx"), true).await?;
//! client.verify_upload(&receipt.file_name).await;
//! ```

use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE};
use reqwest::{Response, Url};
use serde_json::{json, Value as JsonValue};
use std::path::{Path, PathBuf};

use crate::config::SharePointSettings;
use crate::error::{UploadError, UploadResult};
use crate::logs::{log_info, log_info_indent, log_success, log_warning_indent};

/// Files strictly smaller than this use a single request.
pub const SIMPLE_UPLOAD_LIMIT: u64 = 4 * 1024 * 1024;

/// Size of each upload-session chunk.
pub const CHUNK_SIZE: u64 = 5 * 1024 * 1024;

const MIB: f64 = 1024.0 * 1024.0;

/// An inclusive byte range of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes; never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value for a file of `total` bytes.
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total)
    }
}

/// How a file is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStrategy {
    Simple,
    Chunked { ranges: Vec<ByteRange> },
}

/// Pick the strategy for a file of `size` bytes.
pub fn choose_strategy(size: u64) -> UploadStrategy {
    choose_strategy_with(size, SIMPLE_UPLOAD_LIMIT, CHUNK_SIZE)
}

fn choose_strategy_with(size: u64, simple_limit: u64, chunk_size: u64) -> UploadStrategy {
    if size < simple_limit {
        UploadStrategy::Simple
    } else {
        UploadStrategy::Chunked {
            ranges: chunk_ranges(size, chunk_size),
        }
    }
}

/// Split `size` bytes into `ceil(size / chunk_size)` consecutive ranges.
pub fn chunk_ranges(size: u64, chunk_size: u64) -> Vec<ByteRange> {
    if chunk_size == 0 {
        return Vec::new();
    }
    (0..size)
        .step_by(chunk_size as usize)
        .map(|start| ByteRange {
            start,
            end: (start + chunk_size).min(size) - 1,
        })
        .collect()
}

/// What a successful upload returned
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub file_name: String,
    pub size_bytes: u64,
    /// Number of requests that carried file content
    pub requests: usize,
    /// Where the file should now be visible
    pub location: String,
    /// Body of the last response
    pub response: JsonValue,
}

/// SharePoint / Graph client
#[derive(Clone)]
pub struct SharePointClient {
    http: reqwest::Client,
    token: String,
    site_url: String,
    site_name: String,
    library: String,
    graph_base: String,
    simple_limit: u64,
    chunk_size: u64,
}

impl SharePointClient {
    /// Build a client. Fails without a usable access token.
    pub fn new(settings: &SharePointSettings) -> UploadResult<Self> {
        let token = settings.token().ok_or(UploadError::MissingCredential)?;
        Ok(Self {
            http: reqwest::Client::new(),
            token: token.to_string(),
            site_url: settings.site_url.trim_end_matches('/').to_string(),
            site_name: settings.site_name.clone(),
            library: settings.library.trim_matches('/').to_string(),
            graph_base: settings.graph_base.trim_end_matches('/').to_string(),
            simple_limit: SIMPLE_UPLOAD_LIMIT,
            chunk_size: CHUNK_SIZE,
        })
    }

    /// Override the strategy threshold and chunk size
    pub fn with_limits(mut self, simple_limit: u64, chunk_size: u64) -> Self {
        self.simple_limit = simple_limit;
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Upload the file at `path` to the document library.
    pub async fn upload_file(&self, path: &Path, overwrite: bool) -> UploadResult<UploadReceipt> {
        log_info("☁️  Uploading to SharePoint...");

        if !path.exists() {
            return Err(UploadError::FileNotFound(path.to_path_buf()));
        }
        let file_name = file_name(path)?;
        let content = tokio::fs::read(path).await?;
        let size = content.len() as u64;

        log_info_indent(format!("File: {}", file_name), 1);
        log_info_indent(format!("Size: {:.2} MB", size as f64 / MIB), 1);

        let (response, requests) = match choose_strategy_with(size, self.simple_limit, self.chunk_size) {
            UploadStrategy::Simple => {
                log_info_indent("Using simple upload (file < 4MB)...", 1);
                (self.simple_upload(&file_name, content, overwrite).await?, 1)
            }
            UploadStrategy::Chunked { ranges } => {
                log_info_indent("Using chunked upload (file >= 4MB)...", 1);
                let count = ranges.len();
                (self.chunked_upload(&file_name, &content, &ranges, overwrite).await?, count)
            }
        };

        let location = format!("{}/{}/{}", self.site_url, self.library, file_name);
        log_success("File successfully uploaded to SharePoint!");
        log_info_indent(format!("Location: {}", location), 1);

        Ok(UploadReceipt {
            file_name,
            size_bytes: size,
            requests,
            location,
            response,
        })
    }

    async fn simple_upload(&self, file_name: &str, content: Vec<u8>, overwrite: bool) -> UploadResult<JsonValue> {
        let url = format!(
            "{}/_api/web/GetFolderByServerRelativeUrl('/sites/{}/{}')/Files/Add(url='{}', overwrite={})",
            self.site_url, self.site_name, self.library, file_name, overwrite
        );
        log_info_indent(format!("Uploading to: {}", url), 1);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json;odata=verbose")
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(content)
            .send()
            .await?;
        read_json(ensure_success(response).await?).await
    }

    async fn chunked_upload(
        &self,
        file_name: &str,
        content: &[u8],
        ranges: &[ByteRange],
        overwrite: bool,
    ) -> UploadResult<JsonValue> {
        let site_id = self.site_id().await?;
        let session_url = format!(
            "{}/sites/{}/drive/root:/{}/{}:/createUploadSession",
            self.graph_base, site_id, self.library, file_name
        );
        let behavior = if overwrite { "replace" } else { "fail" };

        log_info_indent("Creating upload session...", 1);
        let response = self
            .http
            .post(&session_url)
            .bearer_auth(&self.token)
            .json(&json!({ "item": { "@microsoft.graph.conflictBehavior": behavior } }))
            .send()
            .await?;
        let session = read_json(ensure_success(response).await?).await?;
        let upload_url = session
            .get("uploadUrl")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| UploadError::InvalidResponse("upload session has no uploadUrl".to_string()))?
            .to_string();

        let total = content.len() as u64;
        log_info_indent(format!("Uploading {} chunks...", ranges.len()), 1);

        let mut last = JsonValue::Null;
        for (i, range) in ranges.iter().enumerate() {
            let chunk = &content[range.start as usize..=range.end as usize];
            let response = self
                .http
                .put(&upload_url)
                .header(CONTENT_LENGTH, range.len())
                .header(CONTENT_RANGE, range.content_range(total))
                .body(chunk.to_vec())
                .send()
                .await?;
            last = read_json(ensure_success(response).await?).await?;
            log_info_indent(format!("Chunk {}/{} uploaded", i + 1, ranges.len()), 2);
        }

        Ok(last)
    }

    /// Resolve the Graph id of the configured site.
    pub async fn site_id(&self) -> UploadResult<String> {
        let response = self
            .http
            .get(self.site_lookup_url()?)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let site = read_json(ensure_success(response).await?).await?;
        site.get("id")
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .ok_or_else(|| UploadError::InvalidResponse("site has no id".to_string()))
    }

    /// `{graph}/sites/{host}:{path}` for the configured site URL.
    fn site_lookup_url(&self) -> UploadResult<String> {
        let url = Url::parse(&self.site_url).map_err(|e| UploadError::InvalidSiteUrl(format!("{}: {}", self.site_url, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| UploadError::InvalidSiteUrl(self.site_url.clone()))?;
        let path = url.path().trim_end_matches('/');
        Ok(if path.is_empty() {
            format!("{}/sites/{}", self.graph_base, host)
        } else {
            format!("{}/sites/{}:{}", self.graph_base, host, path)
        })
    }

    /// Check that `file_name` is present in the library. Never fails: any
    /// problem is logged and reported as `false`.
    pub async fn verify_upload(&self, file_name: &str) -> bool {
        log_info("🔎 Verifying SharePoint upload...");
        match self.fetch_item(file_name).await {
            Ok(Some(item)) => {
                log_success("File found on SharePoint!");
                let name = item.get("name").and_then(JsonValue::as_str).unwrap_or(file_name);
                let size = item.get("size").and_then(JsonValue::as_f64).unwrap_or(0.0);
                let modified = item
                    .get("lastModifiedDateTime")
                    .and_then(JsonValue::as_str)
                    .unwrap_or("unknown");
                log_info_indent(format!("- Name: {}", name), 2);
                log_info_indent(format!("- Size: {:.2} MB", size / MIB), 2);
                log_info_indent(format!("- Modified: {}", modified), 2);
                true
            }
            Ok(None) => {
                log_warning_indent("File not found on SharePoint", 1);
                false
            }
            Err(e) => {
                log_warning_indent(format!("Verification failed: {}", e), 1);
                false
            }
        }
    }

    async fn fetch_item(&self, file_name: &str) -> UploadResult<Option<JsonValue>> {
        let site_id = self.site_id().await?;
        let url = format!(
            "{}/sites/{}/drive/root:/{}/{}",
            self.graph_base, site_id, self.library, file_name
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        if response.status() != reqwest::StatusCode::OK {
            return Ok(None);
        }
        read_json(response).await.map(Some)
    }
}

fn file_name(path: &Path) -> UploadResult<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| UploadError::FileNotFound(PathBuf::from(path)))
}

/// Turn a non-2xx response into [`UploadError::Http`].
async fn ensure_success(response: Response) -> UploadResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(UploadError::Http {
        status: status.as_u16(),
        body,
    })
}

/// Body as JSON; an empty body reads as `null`.
async fn read_json(response: Response) -> UploadResult<JsonValue> {
    let body = response.text().await?;
    if body.trim().is_empty() {
        return Ok(JsonValue::Null);
    }
    serde_json::from_str(&body).map_err(|e| UploadError::InvalidResponse(e.to_string()))
}
