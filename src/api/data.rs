//! Library listing, file upload/processing, documentation scraping and
//! project data management.

use fehres_core::Library;
use serde::{Deserialize, Serialize};

use super::{flag, require_absolute_url, Acknowledgement};
use crate::client::{ApiClient, Deadline, ProgressCallback, UploadSource};
use crate::error::ApiResult;

// ============ Requests / responses ============

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessRequest {
    pub reset_before_processing: bool,
    /// Process only this uploaded file instead of every project file.
    pub file_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProcessOutcome {
    pub inserted_chunk_count: i64,
    pub processed_file_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    /// Must parse as an absolute URL.
    pub base_url: String,
    pub reset_before_scraping: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeStatus {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScrapeOutcome {
    pub status: ScrapeStatus,
    pub inserted_chunk_count: i64,
    pub processed_page_count: i64,
    pub total_pages_scraped: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheOutcome {
    pub inserted_chunk_count: i64,
    pub processed_page_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub file_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetDeletion {
    pub asset_id: Option<i64>,
    pub deleted_count: i64,
}

// ============ Wire shapes ============

#[derive(Deserialize)]
struct LibrariesWire {
    #[serde(default)]
    libraries: Vec<Library>,
}

#[derive(Serialize)]
struct ProcessWire<'a> {
    #[serde(rename = "Do_reset")]
    do_reset: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct ProcessResponseWire {
    #[serde(rename = "Inserted_chunks", default)]
    inserted_chunks: i64,
    #[serde(default)]
    processed_files: i64,
}

#[derive(Serialize)]
struct ScrapeWire<'a> {
    base_url: &'a str,
    #[serde(rename = "Do_reset")]
    do_reset: u8,
}

#[derive(Serialize)]
struct CacheWire<'a> {
    base_url: &'a str,
}

#[derive(Deserialize)]
struct ScrapeResponseWire {
    #[serde(default, alias = "Signal")]
    signal: Option<String>,
    #[serde(rename = "Inserted_chunks", default)]
    inserted_chunks: i64,
    #[serde(default)]
    processed_pages: i64,
    #[serde(default)]
    total_pages_scraped: i64,
}

#[derive(Deserialize)]
struct UploadResponseWire {
    file_id: serde_json::Value,
}

#[derive(Deserialize)]
struct DeleteResponseWire {
    #[serde(default)]
    asset_id: Option<i64>,
    #[serde(default)]
    deleted_count: Option<i64>,
}

/// Signal the backend uses when a scrape stopped on a cancel request.
const CANCELLED_SIGNAL: &str = "cancelled";

// ============ Operations ============

/// `GET /data/libraries`: libraries in backend order.
pub async fn list_libraries(client: &ApiClient) -> ApiResult<Vec<Library>> {
    let wire: LibrariesWire = client.get("/data/libraries", &[]).await?;
    Ok(wire.libraries)
}

/// `POST /data/upload`: send one file as multipart field `file`.
pub async fn upload_file(
    client: &ApiClient,
    file: UploadSource,
    on_progress: Option<ProgressCallback>,
) -> ApiResult<UploadReceipt> {
    let wire: UploadResponseWire = client
        .post_multipart("/data/upload", "file", file, on_progress, Deadline::LongRunning)
        .await?;
    // The backend has returned the id both as a string and as a number.
    let file_id = match wire.file_id {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    };
    Ok(UploadReceipt { file_id })
}

/// `POST /data/process`: chunk previously uploaded files.
pub async fn process_files(client: &ApiClient, request: &ProcessRequest) -> ApiResult<ProcessOutcome> {
    let body = ProcessWire {
        do_reset: flag(request.reset_before_processing),
        file_id: request.file_id.as_deref(),
    };
    let wire: ProcessResponseWire = client
        .post("/data/process", Some(&body), Deadline::LongRunning)
        .await?;
    Ok(ProcessOutcome {
        inserted_chunk_count: wire.inserted_chunks,
        processed_file_count: wire.processed_files,
    })
}

/// `POST /data/scrape`: crawl a documentation site and chunk it.
///
/// Long-running; [`cancel_scrape`] may be issued concurrently. If this
/// call times out on the client, [`resume_from_cache`] with the same URL
/// recovers the backend's finished work.
pub async fn scrape_docs(client: &ApiClient, request: &ScrapeRequest) -> ApiResult<ScrapeOutcome> {
    let base_url = require_absolute_url(&request.base_url)?;
    let body = ScrapeWire {
        base_url: &base_url,
        do_reset: flag(request.reset_before_scraping),
    };
    let wire: ScrapeResponseWire = client
        .post("/data/scrape", Some(&body), Deadline::LongRunning)
        .await?;
    let status = if wire.signal.as_deref() == Some(CANCELLED_SIGNAL) {
        ScrapeStatus::Cancelled
    } else {
        ScrapeStatus::Completed
    };
    Ok(ScrapeOutcome {
        status,
        inserted_chunk_count: wire.inserted_chunks,
        processed_page_count: wire.processed_pages,
        total_pages_scraped: wire.total_pages_scraped,
    })
}

/// `POST /data/scrape/cancel`: best effort; a no-op if nothing is running.
pub async fn cancel_scrape(client: &ApiClient) -> ApiResult<Acknowledgement> {
    client
        .post::<(), _>("/data/scrape/cancel", None, Deadline::Request)
        .await
}

/// `POST /data/scrape/cache/process`: chunk the cached result of a
/// finished scrape without refetching.
pub async fn resume_from_cache(client: &ApiClient, base_url: &str) -> ApiResult<CacheOutcome> {
    let base_url = require_absolute_url(base_url)?;
    let wire: ScrapeResponseWire = client
        .post(
            "/data/scrape/cache/process",
            Some(&CacheWire {
                base_url: &base_url,
            }),
            Deadline::LongRunning,
        )
        .await?;
    Ok(CacheOutcome {
        inserted_chunk_count: wire.inserted_chunks,
        processed_page_count: wire.processed_pages,
    })
}

/// `POST /data/reset`: destructive: clears chunks and index for the
/// active project.
pub async fn reset_project(client: &ApiClient) -> ApiResult<Acknowledgement> {
    client
        .post::<(), _>("/data/reset", None, Deadline::LongRunning)
        .await
}

/// `DELETE /data/asset/{file_id}`: remove one uploaded asset with its
/// chunks and vectors.
pub async fn delete_asset(client: &ApiClient, file_id: &str) -> ApiResult<AssetDeletion> {
    let wire: DeleteResponseWire = client
        .delete(&format!("/data/asset/{}", file_id.trim()))
        .await?;
    Ok(AssetDeletion {
        asset_id: wire.asset_id,
        deleted_count: wire.deleted_count.unwrap_or(1),
    })
}

/// `DELETE /data/assets`: remove every uploaded asset of the project.
pub async fn delete_all_assets(client: &ApiClient) -> ApiResult<AssetDeletion> {
    let wire: DeleteResponseWire = client.delete("/data/assets").await?;
    Ok(AssetDeletion {
        asset_id: None,
        deleted_count: wire.deleted_count.unwrap_or(0),
    })
}
