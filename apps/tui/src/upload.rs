//! Upload queue for survey files.
//!
//! Files are checked locally against the same rules the backend applies, then
//! uploaded one at a time. Each file tracks its own status through a small
//! state machine so a failure never affects the rest of the queue.

use std::convert::TryFrom;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::domain::Dataset;

pub const MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Pending,
    Uploading,
    Uploaded(Dataset),
    Failed(String),
    Rejected(String),
}

impl UploadStatus {
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Uploaded(_) | Self::Failed(_) | Self::Rejected(_))
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Uploading => write!(f, "Uploading"),
            Self::Uploaded(dataset) => write!(f, "Uploaded ({} rows)", dataset.row_count),
            Self::Failed(msg) => write!(f, "Failed: {msg}"),
            Self::Rejected(reason) => write!(f, "Rejected: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    Start,
    Finished(Dataset),
    Error(String),
}

impl fmt::Display for UploadEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::Finished(dataset) => write!(f, "Finished({})", dataset.uid),
            Self::Error(msg) => write!(f, "Error({msg})"),
        }
    }
}

#[derive(Debug, Error)]
#[error("Invalid upload transition from {from} with event {event}")]
pub struct UploadTransitionError {
    pub from: UploadStatus,
    pub event: UploadEvent,
}

struct NextStatus(UploadStatus);

impl TryFrom<(&UploadStatus, &UploadEvent)> for NextStatus {
    type Error = UploadTransitionError;

    fn try_from(value: (&UploadStatus, &UploadEvent)) -> Result<Self, Self::Error> {
        let (current, event) = value;

        match (current, event) {
            (UploadStatus::Pending, UploadEvent::Start) => Ok(Self(UploadStatus::Uploading)),
            (UploadStatus::Uploading, UploadEvent::Finished(dataset)) => {
                Ok(Self(UploadStatus::Uploaded(dataset.clone())))
            }
            (UploadStatus::Uploading, UploadEvent::Error(msg)) => {
                Ok(Self(UploadStatus::Failed(msg.clone())))
            }
            _ => Err(UploadTransitionError {
                from: current.clone(),
                event: event.clone(),
            }),
        }
    }
}

/// Checks extension and size. Returns the reason a file is refused.
pub fn validate_file(path: &Path, size: u64) -> Result<(), String> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err("Only CSV and Excel files (.csv, .xlsx, .xls) are allowed".to_string());
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(format!(
            "File too large ({:.1} MB, limit 20 MB)",
            size as f64 / (1024.0 * 1024.0)
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadItem {
    pub path: PathBuf,
    pub size: u64,
    pub status: UploadStatus,
}

impl UploadItem {
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("unknown")
    }

    fn process(&mut self, event: &UploadEvent) -> Result<(), UploadTransitionError> {
        let next = NextStatus::try_from((&self.status, event))?;
        self.status = next.0;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadQueue {
    items: Vec<UploadItem>,
}

impl UploadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a file. Files failing validation are kept, marked rejected.
    pub fn add(&mut self, path: impl Into<PathBuf>) -> &UploadItem {
        let path = path.into();
        let (size, status) = match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {
                let size = meta.len();
                match validate_file(&path, size) {
                    Ok(()) => (size, UploadStatus::Pending),
                    Err(reason) => (size, UploadStatus::Rejected(reason)),
                }
            }
            Ok(_) => (0, UploadStatus::Rejected("Not a file".to_string())),
            Err(e) => (0, UploadStatus::Rejected(format!("Cannot read file: {e}"))),
        };

        if let UploadStatus::Rejected(reason) = &status {
            warn!("rejected {}: {reason}", path.display());
        }
        let index = self.items.len();
        self.items.push(UploadItem { path, size, status });
        &self.items[index]
    }

    pub fn items(&self) -> &[UploadItem] {
        &self.items
    }

    /// Takes over the status of a copy of one of our items, matched by path.
    pub fn sync_item(&mut self, item: UploadItem) -> bool {
        match self.items.iter_mut().find(|queued| queued.path == item.path) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops finished entries, keeping anything still pending.
    pub fn clear_finished(&mut self) {
        self.items.retain(|item| !item.status.is_finished());
    }

    /// (finished, total)
    pub fn progress(&self) -> (usize, usize) {
        let finished = self
            .items
            .iter()
            .filter(|item| item.status.is_finished())
            .count();
        (finished, self.items.len())
    }

    pub fn has_pending(&self) -> bool {
        self.items
            .iter()
            .any(|item| item.status == UploadStatus::Pending)
    }

    pub fn uploaded(&self) -> impl Iterator<Item = &Dataset> {
        self.items.iter().filter_map(|item| match &item.status {
            UploadStatus::Uploaded(dataset) => Some(dataset),
            _ => None,
        })
    }

    /// Uploads every pending file in order, calling `report` after each
    /// status change.
    pub async fn run(
        &mut self,
        client: &ApiClient,
        mut report: impl FnMut(&UploadItem, (usize, usize)),
    ) -> Result<(), UploadTransitionError> {
        for index in 0..self.items.len() {
            if self.items[index].status != UploadStatus::Pending {
                continue;
            }

            self.items[index].process(&UploadEvent::Start)?;
            report(&self.items[index], self.progress());

            let event = match client.upload_dataset(&self.items[index].path).await {
                Ok(outcome) if outcome.success => {
                    info!(
                        "uploaded {} as {} ({} rows)",
                        self.items[index].file_name(),
                        outcome.dataset.uid,
                        outcome.dataset.row_count
                    );
                    UploadEvent::Finished(outcome.dataset)
                }
                Ok(outcome) => {
                    let message = if outcome.message.is_empty() {
                        "Upload failed".to_string()
                    } else {
                        outcome.message
                    };
                    UploadEvent::Error(message)
                }
                Err(e) => {
                    warn!("upload of {} failed: {e}", self.items[index].file_name());
                    UploadEvent::Error(e.user_message("Upload failed"))
                }
            };

            self.items[index].process(&event)?;
            report(&self.items[index], self.progress());
        }
        Ok(())
    }
}
