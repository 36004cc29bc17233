//! HTTP transport: the single point of egress to the backend.
//!
//! [`ApiClient`] wraps a `reqwest::Client` and resolves every path against
//! the API base URL held in the [`SettingsStore`]. The base URL is read at
//! call time, so `settings set-api-url` takes effect on the next request
//! without rebuilding the client.
//!
//! # Timeouts
//!
//! Each call picks a [`Deadline`]:
//!
//! | Deadline | Config key | Used by |
//! |----------|-----------|---------|
//! | [`Deadline::Request`] | `timeouts.request_secs` | listing, search, info, acknowledgements |
//! | [`Deadline::LongRunning`] | `timeouts.long_running_secs` | scrape, process, push, answer |
//! | [`Deadline::Analysis`] | `timeouts.analysis_secs` | prescription OCR |
//!
//! There are no automatic retries. A timeout surfaces as
//! [`ApiError::Timeout`] so the caller can offer a resume flow instead of a
//! blind retry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use fehres_core::{SettingsStore, ValidationError};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{Config, TimeoutConfig};
use crate::error::{ApiError, ApiResult};

/// Bytes handed to the request body per progress event.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Which configured timeout applies to a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    Request,
    LongRunning,
    Analysis,
}

/// Upload progress, reported as body bytes are handed to the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub sent: u64,
    pub total: u64,
}

impl UploadProgress {
    /// Whole percentage, rounded to nearest.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.sent * 100 + self.total / 2) / self.total).min(100) as u8
    }
}

/// Callback receiving [`UploadProgress`] events.
pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// A file to send as a multipart field.
#[derive(Debug, Clone)]
pub struct UploadSource {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadSource {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a file from disk, naming the part after the file.
    pub async fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self { file_name, bytes })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn mime_type(&self) -> &'static str {
        let ext = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "webp" => "image/webp",
            "gif" => "image/gif",
            "pdf" => "application/pdf",
            "txt" => "text/plain",
            "md" => "text/markdown",
            "html" | "htm" => "text/html",
            _ => "application/octet-stream",
        }
    }
}

/// Transport client shared by all domain API modules.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    store: Arc<SettingsStore>,
    origin: Url,
    api_url_override: Option<String>,
    timeouts: TimeoutConfig,
}

impl ApiClient {
    pub fn new(config: &Config, store: Arc<SettingsStore>) -> ApiResult<Self> {
        let origin = Url::parse(&config.client.origin).map_err(|_| {
            ValidationError::InvalidUrl {
                input: config.client.origin.clone(),
            }
        })?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("fehres/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network {
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            store,
            origin,
            api_url_override: None,
            timeouts: config.timeouts.clone(),
        })
    }

    /// Use `url` instead of the persisted API URL for this client only.
    /// Nothing is written to the store.
    pub fn with_api_url_override(mut self, url: Option<String>) -> Self {
        self.api_url_override = url.filter(|u| !u.trim().is_empty());
        self
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    /// The base URL in effect right now.
    pub fn base_url(&self) -> String {
        match &self.api_url_override {
            Some(url) => url.trim().to_string(),
            None => self.store.api_url(),
        }
    }

    /// Resolve a backend path against the current base URL.
    ///
    /// A relative base (the default `/api/v1`) is resolved against the
    /// configured origin.
    pub fn endpoint(&self, path: &str) -> ApiResult<Url> {
        let base = self.base_url();
        let joined = format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let parsed = if base.starts_with('/') {
            self.origin.join(&joined)
        } else {
            Url::parse(&joined)
        };
        parsed.map_err(|_| ApiError::from(ValidationError::InvalidUrl { input: base }))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let url = self.endpoint(path)?;
        let request = self.http.get(url).query(query);
        self.send(Method::GET, path, request, Deadline::Request).await
    }

    pub async fn post<B, T>(&self, path: &str, body: Option<&B>, deadline: Deadline) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let mut request = self.http.post(url);
        request = match body {
            Some(body) => request.json(body),
            None => request.header(reqwest::header::CONTENT_TYPE, "application/json"),
        };
        self.send(Method::POST, path, request, deadline).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.endpoint(path)?;
        let request = self.http.delete(url);
        self.send(Method::DELETE, path, request, Deadline::Request)
            .await
    }

    /// Send `file` as the multipart field `field`, reporting progress as
    /// the body is streamed.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        field: &str,
        file: UploadSource,
        on_progress: Option<ProgressCallback>,
        deadline: Deadline,
    ) -> ApiResult<T> {
        let url = self.endpoint(path)?;
        let total = file.size();
        let mime = file.mime_type();
        let file_name = file.file_name.clone();

        let chunks: Vec<Vec<u8>> = file
            .bytes
            .chunks(UPLOAD_CHUNK_SIZE)
            .map(<[u8]>::to_vec)
            .collect();
        let mut sent = 0u64;
        let stream = futures_util::stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            if let Some(callback) = &on_progress {
                callback(UploadProgress { sent, total });
            }
            Ok::<Vec<u8>, std::io::Error>(chunk)
        }));

        let part = Part::stream_with_length(reqwest::Body::wrap_stream(stream), total)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| ApiError::Network {
                message: e.to_string(),
            })?;
        let form = Form::new().part(field.to_string(), part);
        let request = self.http.post(url).multipart(form);
        self.send(Method::POST, path, request, deadline).await
    }

    fn timeout_for(&self, deadline: Deadline) -> Duration {
        match deadline {
            Deadline::Request => self.timeouts.request(),
            Deadline::LongRunning => self.timeouts.long_running(),
            Deadline::Analysis => self.timeouts.analysis(),
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
        deadline: Deadline,
    ) -> ApiResult<T> {
        let timeout = self.timeout_for(deadline);
        let secs = timeout.as_secs();
        let started = Instant::now();

        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, secs))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::from_reqwest(e, secs))?;

        tracing::debug!(
            %method,
            path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "backend call"
        );

        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with(api_url: &str) -> ApiClient {
        let store = Arc::new(SettingsStore::in_memory());
        store.set_api_url(api_url).unwrap();
        ApiClient::new(&Config::minimal(), store).unwrap()
    }

    #[test]
    fn relative_base_resolves_against_origin() {
        let client = client_with("/api/v1");
        assert_eq!(
            client.endpoint("/data/libraries").unwrap().as_str(),
            "http://127.0.0.1:8000/api/v1/data/libraries"
        );
    }

    #[test]
    fn absolute_base_is_used_as_is() {
        let client = client_with("https://rag.example.com/api/v1/");
        assert_eq!(
            client.endpoint("nlp/index/search").unwrap().as_str(),
            "https://rag.example.com/api/v1/nlp/index/search"
        );
    }

    #[test]
    fn settings_change_applies_to_next_call() {
        let client = client_with("http://one:1/api/v1");
        assert!(client.endpoint("/health").unwrap().as_str().starts_with("http://one:1/"));
        client.store().set_api_url("http://two:2/api/v1").unwrap();
        assert!(client.endpoint("/health").unwrap().as_str().starts_with("http://two:2/"));
    }

    #[test]
    fn override_does_not_touch_store() {
        let client =
            client_with("http://stored/api/v1").with_api_url_override(Some("http://env/api".into()));
        assert_eq!(client.base_url(), "http://env/api");
        assert_eq!(client.store().api_url(), "http://stored/api/v1");
    }

    #[test]
    fn progress_percent_rounds() {
        assert_eq!(UploadProgress { sent: 0, total: 200 }.percent(), 0);
        assert_eq!(UploadProgress { sent: 1, total: 3 }.percent(), 33);
        assert_eq!(UploadProgress { sent: 2, total: 3 }.percent(), 67);
        assert_eq!(UploadProgress { sent: 5, total: 5 }.percent(), 100);
        assert_eq!(UploadProgress { sent: 0, total: 0 }.percent(), 100);
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(UploadSource::new("rx.JPG", vec![]).mime_type(), "image/jpeg");
        assert_eq!(UploadSource::new("notes.md", vec![]).mime_type(), "text/markdown");
        assert_eq!(
            UploadSource::new("blob", vec![]).mime_type(),
            "application/octet-stream"
        );
    }
}
