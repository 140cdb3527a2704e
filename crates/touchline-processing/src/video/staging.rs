use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use touchline_core::RawFile;

/// A payload written to a private temporary directory so external tools can
/// read it by path. Dropping the value removes the directory and everything the
/// tools wrote next to the source.
#[derive(Debug)]
pub struct StagedFile {
    dir: TempDir,
    path: PathBuf,
}

impl StagedFile {
    pub async fn write(file: &RawFile) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("touchline-")
            .tempdir()
            .context("Failed to create staging directory")?;

        let extension = file
            .extension()
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| "bin".to_string());
        let path = dir.path().join(format!("source.{}", extension));

        tokio::fs::write(&path, &file.data)
            .await
            .with_context(|| format!("Failed to stage {}", file.name))?;

        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path for an additional file inside the staging directory
    pub fn sibling(&self, file_name: &str) -> PathBuf {
        self.dir.path().join(file_name)
    }
}
