//! Helpers shared by the `touchline` binary: file loading, progress logging
//! and the JSON batch report.

use anyhow::Context;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use touchline_core::{
    BatchError, CompressionProgress, CompressionStage, MediaKind, ProcessedAttachment, RawFile,
};
use touchline_processing::{FileRejection, UploadObserver};

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "touchline=info,touchline_cli=info,touchline_processing=info",
                )
            }),
        )
        .init();
}

/// Content type from the file extension, the way a browser file picker reports it.
pub fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

pub async fn read_file(path: &Path) -> anyhow::Result<RawFile> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} has no usable file name", path.display()))?;

    Ok(RawFile::new(name, guess_content_type(path), data))
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectionReport {
    pub file_name: String,
    pub error_code: &'static str,
    pub message: String,
}

impl From<&FileRejection> for RejectionReport {
    fn from(rejection: &FileRejection) -> Self {
        Self {
            file_name: rejection.file_name.clone(),
            error_code: rejection.error_code(),
            message: rejection.user_message(),
        }
    }
}

/// Logs pipeline events and keeps the rejections for the final report
#[derive(Default)]
pub struct LoggingObserver {
    rejections: Mutex<Vec<RejectionReport>>,
}

impl LoggingObserver {
    pub fn rejections(&self) -> Vec<RejectionReport> {
        self.rejections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl UploadObserver for LoggingObserver {
    fn on_rejected(&self, rejection: &FileRejection) {
        tracing::warn!(
            file_name = %rejection.file_name,
            error_code = rejection.error_code(),
            "{}",
            rejection.user_message()
        );
        self.rejections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RejectionReport::from(rejection));
    }

    fn on_batch_rejected(&self, error: &BatchError) {
        tracing::error!(error = %error, "Batch rejected");
    }

    fn on_progress(&self, file_name: &str, progress: CompressionProgress) {
        // Compressing reports every percent; only log the milestones
        if progress.stage == CompressionStage::Compressing && progress.progress % 25 != 0 {
            return;
        }
        tracing::info!(
            file_name = %file_name,
            stage = %progress.stage,
            progress = progress.progress,
            "Compressing video"
        );
    }

    fn on_file_done(&self, attachment: &ProcessedAttachment) {
        tracing::info!(
            file_name = %attachment.original_name,
            kind = %attachment.kind,
            original_size = attachment.original_size,
            final_size = attachment.final_size(),
            savings_percent = attachment.compression_savings_percent(),
            "File ready"
        );
    }
}

#[derive(Debug, Serialize)]
pub struct AttachmentReport {
    pub id: String,
    pub original_name: String,
    pub kind: MediaKind,
    pub content_type: String,
    pub original_size: usize,
    pub final_size: usize,
    pub savings_percent: i64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_seconds: Option<f64>,
    pub thumbnails: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub written: Vec<PathBuf>,
}

impl From<&ProcessedAttachment> for AttachmentReport {
    fn from(attachment: &ProcessedAttachment) -> Self {
        Self {
            id: attachment.id.to_string(),
            original_name: attachment.original_name.clone(),
            kind: attachment.kind,
            content_type: attachment.file().content_type.clone(),
            original_size: attachment.original_size,
            final_size: attachment.final_size(),
            savings_percent: attachment.compression_savings_percent(),
            width: attachment.width,
            height: attachment.height,
            duration_seconds: attachment.duration_seconds,
            thumbnails: attachment.thumbnails().len(),
            written: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub attachments: Vec<AttachmentReport>,
    pub rejected: Vec<RejectionReport>,
}

/// Write the final payload and every thumbnail of `attachment` into `out_dir`.
///
/// Files are prefixed with `index` so same-named inputs do not collide.
pub async fn write_attachment(
    attachment: &ProcessedAttachment,
    index: usize,
    out_dir: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let file = attachment.file();
    let mut written = Vec::with_capacity(1 + attachment.thumbnails().len());

    let payload_path = out_dir.join(format!("{:02}-{}", index, file.name));
    tokio::fs::write(&payload_path, &file.data)
        .await
        .with_context(|| format!("Failed to write {}", payload_path.display()))?;
    written.push(payload_path);

    let stem = Path::new(&file.name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("attachment");
    for (i, thumbnail) in attachment.thumbnails().iter().enumerate() {
        let path = out_dir.join(format!("{:02}-{}-thumb{}.jpg", index, stem, i + 1));
        tokio::fs::write(&path, &thumbnail.data)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }

    Ok(written)
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize report")?;
    println!("{}", out);
    Ok(())
}
