use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Closed set of media categories the pipeline routes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Document,
}

impl MediaKind {
    /// Classify a declared MIME type. Parameters (`; codecs=...`) are ignored.
    pub fn from_content_type(content_type: &str) -> Self {
        let essence = mime_essence(content_type);
        if essence.starts_with("image/") {
            MediaKind::Image
        } else if essence.starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Document
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Document => "document",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercased MIME type without parameters.
pub fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

/// An immutable binary payload with a name and declared MIME type.
///
/// Cloning is cheap: the payload is reference counted, so handing the same file
/// to several pipeline stages never copies the bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFile {
    pub name: String,
    pub content_type: String,
    #[serde(skip)]
    pub data: Bytes,
}

impl RawFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Payload size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn kind(&self) -> MediaKind {
        MediaKind::from_content_type(&self.content_type)
    }

    /// Lowercased filename extension, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }

    /// Same name and type, different bytes.
    pub fn with_data(&self, data: impl Into<Bytes>) -> Self {
        Self {
            name: self.name.clone(),
            content_type: self.content_type.clone(),
            data: data.into(),
        }
    }

    /// Re-typed payload; the extension of `name` is swapped for `extension`.
    pub fn reencoded(&self, content_type: &str, extension: &str, data: impl Into<Bytes>) -> Self {
        let stem = Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name);
        Self {
            name: format!("{}.{}", stem, extension),
            content_type: content_type.to_string(),
            data: data.into(),
        }
    }
}
