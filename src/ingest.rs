//! File upload, processing and project data management.
//!
//! `fehres upload` tracks every selected file as an [`UploadedFile`] moving
//! through `pending → uploading → uploaded | error`. The `uploading`
//! transition is driven by the first transport progress event. One failed
//! file does not stop the others.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{bail, Result};
use fehres_core::upload::UploadTracker;
use fehres_core::UploadedFile;

use crate::api::data::{self, ProcessOutcome, ProcessRequest};
use crate::app::App;
use crate::client::{ApiClient, ProgressCallback, UploadProgress, UploadSource};
use crate::progress::{
    callback_for, format_bytes, ProgressMode, UploadProgressEvent, UploadProgressReporter,
};

/// Result of one upload batch.
#[derive(Debug, Clone)]
pub struct UploadBatch {
    /// Every selected file in selection order, each in a terminal state.
    pub files: Vec<UploadedFile>,
    /// Backend file ids of the successful uploads, in the same order.
    pub file_ids: Vec<String>,
    /// Files that ended in `error`.
    pub failed: usize,
}

/// Upload `paths` one after another.
pub async fn upload_files(
    client: &ApiClient,
    paths: &[PathBuf],
    reporter: Arc<dyn UploadProgressReporter>,
) -> UploadBatch {
    let tracker = Arc::new(Mutex::new(UploadTracker::new()));
    let mut file_ids = Vec::new();

    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let source = match UploadSource::from_path(path).await {
            Ok(source) => source,
            Err(e) => {
                let id = lock(&tracker).add(name.clone(), 0);
                fail(&tracker, &id, &name, &format!("cannot read file: {}", e), &reporter);
                continue;
            }
        };
        let id = lock(&tracker).add(name.clone(), source.size());

        let on_progress = tracking_callback(tracker.clone(), id.clone(), callback_for(reporter.clone(), &name));

        match data::upload_file(client, source, Some(on_progress)).await {
            Ok(receipt) => {
                if let Err(e) = lock(&tracker).mark_uploaded(&id) {
                    tracing::warn!(error = %e, file = %name, "upload state out of sync");
                }
                reporter.report(UploadProgressEvent::Uploaded {
                    file: name,
                    file_id: receipt.file_id.clone(),
                });
                file_ids.push(receipt.file_id);
            }
            Err(e) => fail(&tracker, &id, &name, &e.user_message(), &reporter),
        }
    }

    let tracker = lock(&tracker);
    let (_, failed) = tracker.summary();
    UploadBatch {
        files: tracker.files().to_vec(),
        file_ids,
        failed,
    }
}

fn tracking_callback(
    tracker: Arc<Mutex<UploadTracker>>,
    id: String,
    forward: ProgressCallback,
) -> ProgressCallback {
    Arc::new(move |progress: UploadProgress| {
        if let Err(e) = lock(&tracker).on_progress(&id) {
            tracing::debug!(error = %e, "ignoring progress for finished upload");
        }
        forward(progress);
    })
}

fn fail(
    tracker: &Mutex<UploadTracker>,
    id: &str,
    name: &str,
    message: &str,
    reporter: &Arc<dyn UploadProgressReporter>,
) {
    if let Err(e) = lock(tracker).mark_failed(id, message) {
        tracing::warn!(error = %e, file = %name, "upload state out of sync");
    }
    reporter.report(UploadProgressEvent::Failed {
        file: name.to_string(),
        error: message.to_string(),
    });
}

fn lock(tracker: &Mutex<UploadTracker>) -> std::sync::MutexGuard<'_, UploadTracker> {
    tracker.lock().unwrap_or_else(PoisonError::into_inner)
}

pub async fn run_upload(
    app: &App,
    paths: &[PathBuf],
    process: bool,
    reset: bool,
    progress: Option<ProgressMode>,
) -> Result<()> {
    if paths.is_empty() {
        bail!("no files given");
    }
    let reporter = progress.unwrap_or_else(ProgressMode::default_for_tty).reporter();
    let batch = upload_files(&app.client, paths, reporter).await;

    println!("{:<10} {:>10}  FILE", "STATUS", "SIZE");
    for file in &batch.files {
        println!(
            "{:<10} {:>10}  {}{}",
            file.status.as_str(),
            format_bytes(file.size),
            file.name,
            file.error
                .as_deref()
                .map(|e| format!("  ({})", e))
                .unwrap_or_default()
        );
    }

    let failed = batch.failed;
    if process && !batch.file_ids.is_empty() {
        let outcome = data::process_files(
            &app.client,
            &ProcessRequest {
                reset_before_processing: reset,
                file_id: None,
            },
        )
        .await?;
        print_process(&outcome);
    }

    if failed > 0 {
        bail!("{} of {} uploads failed", failed, batch.files.len());
    }
    Ok(())
}

pub async fn run_process(app: &App, reset: bool, file_id: Option<String>) -> Result<()> {
    let outcome = data::process_files(
        &app.client,
        &ProcessRequest {
            reset_before_processing: reset,
            file_id,
        },
    )
    .await?;
    print_process(&outcome);
    Ok(())
}

fn print_process(outcome: &ProcessOutcome) {
    println!(
        "Processed {} file(s), inserted {} chunk(s).",
        outcome.processed_file_count, outcome.inserted_chunk_count
    );
}

pub async fn run_reset(app: &App, yes: bool) -> Result<()> {
    if !yes {
        bail!("this deletes every chunk and index entry of the project; pass --yes to confirm");
    }
    let ack = data::reset_project(&app.client).await?;
    println!(
        "Project data reset{}.",
        ack.signal.map(|s| format!(" ({})", s)).unwrap_or_default()
    );
    Ok(())
}

pub async fn run_delete_asset(app: &App, id: Option<&str>, all: bool) -> Result<()> {
    match (id, all) {
        (Some(id), false) => {
            data::delete_asset(&app.client, id).await?;
            println!("Deleted asset {}.", id);
        }
        (None, true) => {
            let deleted = data::delete_all_assets(&app.client).await?;
            println!("Deleted {} asset(s).", deleted.deleted_count);
        }
        _ => bail!("pass either an asset id or --all"),
    }
    Ok(())
}
