use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::file::{MediaKind, RawFile};

/// A still frame taken from a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thumbnail {
    pub content_type: String,
    pub timestamp_seconds: f64,
    #[serde(skip)]
    pub data: Bytes,
}

impl Thumbnail {
    pub fn jpeg(data: impl Into<Bytes>, timestamp_seconds: f64) -> Self {
        Self {
            content_type: "image/jpeg".to_string(),
            timestamp_seconds,
            data: data.into(),
        }
    }
}

/// A processed file ready to be attached to an outgoing message.
///
/// Holds exactly one live payload: replacing it drops the superseded bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedAttachment {
    pub id: Uuid,
    pub kind: MediaKind,
    /// Name and type of the file the caller supplied
    pub original_name: String,
    pub original_content_type: String,
    pub original_size: usize,
    file: RawFile,
    thumbnails: Vec<Thumbnail>,
    selected_thumbnail: Option<usize>,
    compressed: bool,
    pub duration_seconds: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ProcessedAttachment {
    pub fn new(id: Uuid, original: RawFile) -> Self {
        Self {
            id,
            kind: original.kind(),
            original_name: original.name.clone(),
            original_content_type: original.content_type.clone(),
            original_size: original.size(),
            file: original,
            thumbnails: Vec::new(),
            selected_thumbnail: None,
            compressed: false,
            duration_seconds: None,
            width: None,
            height: None,
        }
    }

    /// The live payload
    pub fn file(&self) -> &RawFile {
        &self.file
    }

    pub fn into_file(self) -> RawFile {
        self.file
    }

    pub fn final_size(&self) -> usize {
        self.file.size()
    }

    /// Swap in a new payload, dropping the previous one.
    pub fn replace_payload(&mut self, file: RawFile) {
        self.file = file;
        self.compressed = true;
    }

    /// Percentage saved relative to the original. Negative when the output grew.
    pub fn compression_savings_percent(&self) -> i64 {
        if self.original_size == 0 {
            return 0;
        }
        let saved = self.original_size as f64 - self.final_size() as f64;
        (saved / self.original_size as f64 * 100.0).round() as i64
    }

    pub fn thumbnails(&self) -> &[Thumbnail] {
        &self.thumbnails
    }

    /// Attach frames that arrived after the record was built. An explicit
    /// selection made earlier survives if it still points at a frame.
    pub fn attach_thumbnails(&mut self, thumbnails: Vec<Thumbnail>) {
        self.thumbnails = thumbnails;
        if let Some(index) = self.selected_thumbnail {
            if index >= self.thumbnails.len() {
                self.selected_thumbnail = None;
            }
        }
    }

    /// Pick the frame shown as the preview. The last call wins.
    pub fn select_thumbnail(&mut self, index: usize) -> bool {
        if index < self.thumbnails.len() {
            self.selected_thumbnail = Some(index);
            true
        } else {
            false
        }
    }

    /// Selected frame, or the first extracted one.
    pub fn thumbnail(&self) -> Option<&Thumbnail> {
        match self.selected_thumbnail {
            Some(index) => self.thumbnails.get(index),
            None => self.thumbnails.first(),
        }
    }

    /// Whether the live payload came out of a compressor
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }
}
