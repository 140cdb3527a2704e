//! Touchline CLI: runs selected files through the attachment pipeline.
//!
//! Tool locations and pipeline settings come from the environment (or `.env`):
//! FFMPEG_PATH, FFPROBE_PATH, COMPRESS_IMAGES, MAX_FILES, ...

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use touchline_cli::{
    init_tracing, print_json, read_file, write_attachment, AttachmentReport, BatchReport,
    LoggingObserver,
};
use touchline_core::Config;
use touchline_processing::{detect_capabilities, select_codec, FfmpegToolkit, UploadQueueOrchestrator};

#[derive(Parser)]
#[command(name = "touchline", about = "Prepare media attachments for a message")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate, compress and thumbnail a batch of files
    Process {
        /// Files to attach, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Attachments already on the draft message
        #[arg(long, default_value = "0")]
        existing: usize,
        /// Directory receiving processed payloads and thumbnails
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        no_compress_images: bool,
        #[arg(long)]
        no_compress_videos: bool,
        #[arg(long)]
        no_thumbnails: bool,
    },
    /// Report what the local ffmpeg installation can do
    Capabilities,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = Config::from_env().context("Invalid configuration")?;
    let toolkit = FfmpegToolkit::from_config(&config)?;
    let capabilities = detect_capabilities(toolkit.ffmpeg_path(), toolkit.ffprobe_path()).await;

    match cli.command {
        Commands::Process {
            files,
            existing,
            out,
            no_compress_images,
            no_compress_videos,
            no_thumbnails,
        } => {
            let settings = &mut config.settings;
            settings.compress_images &= !no_compress_images;
            settings.compress_videos &= !no_compress_videos;
            settings.generate_thumbnails &= !no_thumbnails;

            let mut raw_files = Vec::with_capacity(files.len());
            for path in &files {
                raw_files.push(read_file(path).await?);
            }

            let observer = Arc::new(LoggingObserver::default());
            let orchestrator =
                UploadQueueOrchestrator::new(Arc::new(toolkit), capabilities, config.settings)
                    .with_observer(observer.clone())
                    .with_upload_tick(Duration::from_millis(config.upload_tick_ms));

            let attachments = orchestrator.process(raw_files, existing).await?;
            orchestrator.shutdown();

            let mut reports = Vec::with_capacity(attachments.len());
            for (index, attachment) in attachments.iter().enumerate() {
                let mut report = AttachmentReport::from(attachment);
                if let Some(dir) = &out {
                    report.written = write_attachment(attachment, index + 1, dir).await?;
                }
                reports.push(report);
            }

            print_json(&BatchReport {
                attachments: reports,
                rejected: observer.rejections(),
            })?;
        }
        Commands::Capabilities => {
            let codec = select_codec(&capabilities);
            print_json(&serde_json::json!({
                "ffmpeg_path": toolkit.ffmpeg_path(),
                "ffprobe_path": toolkit.ffprobe_path(),
                "video_compression": capabilities.supports_video_compression(),
                "selected_codec": codec.map(|c| c.content_type()),
                "capabilities": capabilities,
            }))?;
        }
    }

    Ok(())
}
