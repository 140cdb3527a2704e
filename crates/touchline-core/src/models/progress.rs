use serde::{Deserialize, Serialize};

/// Transcode stages, in the only order they are ever reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionStage {
    Analyzing,
    Compressing,
    Finalizing,
    Complete,
}

impl std::fmt::Display for CompressionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CompressionStage::Analyzing => "analyzing",
            CompressionStage::Compressing => "compressing",
            CompressionStage::Finalizing => "finalizing",
            CompressionStage::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// Position of one in-flight video within its pipeline. `progress` is scoped to `stage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionProgress {
    pub stage: CompressionStage,
    pub progress: u8,
}

impl CompressionProgress {
    pub fn new(stage: CompressionStage, progress: u8) -> Self {
        Self {
            stage,
            progress: progress.min(100),
        }
    }
}
