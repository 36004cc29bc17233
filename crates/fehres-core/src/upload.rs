//! Client-side tracking of files selected for upload.
//!
//! Each file is an [`UploadedFile`] driven forward by progress events:
//! created `pending`, moved to `uploading` on the first progress event,
//! and finished at `uploaded` or `error`. Terminal states never change.

use crate::error::ValidationError;
use crate::models::{UploadStatus, UploadedFile};

/// The ordered list of files a single upload page is tracking.
#[derive(Debug, Default)]
pub struct UploadTracker {
    files: Vec<UploadedFile>,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly selected file. Returns its tracking id.
    pub fn add(&mut self, name: impl Into<String>, size: u64) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.files.push(UploadedFile {
            id: id.clone(),
            name: name.into(),
            size,
            status: UploadStatus::Pending,
            error: None,
        });
        id
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn get(&self, id: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.id == id)
    }

    /// Record a progress event. The first one moves the file to `uploading`;
    /// later ones are no-ops. Progress on a finished upload is rejected.
    pub fn on_progress(&mut self, id: &str) -> Result<(), ValidationError> {
        let file = self.file_mut(id)?;
        if file.status != UploadStatus::Uploading {
            transition(file, UploadStatus::Uploading)?;
        }
        Ok(())
    }

    pub fn mark_uploaded(&mut self, id: &str) -> Result<(), ValidationError> {
        let file = self.file_mut(id)?;
        if file.status == UploadStatus::Pending {
            transition(file, UploadStatus::Uploading)?;
        }
        transition(file, UploadStatus::Uploaded)
    }

    pub fn mark_failed(
        &mut self,
        id: &str,
        message: impl Into<String>,
    ) -> Result<(), ValidationError> {
        let file = self.file_mut(id)?;
        transition(file, UploadStatus::Error)?;
        file.error = Some(message.into());
        Ok(())
    }

    /// Number of files in each terminal state: `(uploaded, failed)`.
    pub fn summary(&self) -> (usize, usize) {
        let uploaded = self
            .files
            .iter()
            .filter(|f| f.status == UploadStatus::Uploaded)
            .count();
        let failed = self
            .files
            .iter()
            .filter(|f| f.status == UploadStatus::Error)
            .count();
        (uploaded, failed)
    }

    fn file_mut(&mut self, id: &str) -> Result<&mut UploadedFile, ValidationError> {
        self.files
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| ValidationError::UnknownUpload { id: id.to_string() })
    }
}

fn transition(file: &mut UploadedFile, next: UploadStatus) -> Result<(), ValidationError> {
    if !file.status.can_transition_to(next) {
        return Err(ValidationError::InvalidUploadTransition {
            id: file.id.clone(),
            from: file.status.as_str(),
            to: next.as_str(),
        });
    }
    file.status = next;
    Ok(())
}
