//! ffmpeg / ffprobe subprocess implementation of [`MediaToolkit`]

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::task::JoinHandle;
use touchline_core::Config;

use crate::metadata::VideoMetadata;
use crate::video::toolkit::{EncodeJob, EncodeTick, MediaToolkit, ProgressParser, TickStream};

/// Validate that a path doesn't contain shell metacharacters or dangerous sequences
fn validate_path(path: &str) -> Result<()> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(anyhow!("Path contains dangerous characters: {}", path));
    }

    if path.contains("..") {
        return Err(anyhow!("Path contains directory traversal: {}", path));
    }

    Ok(())
}

/// Validate and canonicalize an input path
fn validate_input(path: &Path) -> Result<PathBuf> {
    validate_path(&path.to_string_lossy())?;
    path.canonicalize()
        .map_err(|e| anyhow!("Failed to canonicalize path: {}", e))
}

fn validate_binary(name: &str, path: &str) -> Result<()> {
    validate_path(path).with_context(|| format!("Invalid {}: contains dangerous characters", name))?;

    if path.is_empty()
        || !path.chars().all(|c| {
            c.is_alphanumeric() || c == '/' || c == '-' || c == '_' || c == '.' || c == '\\'
        })
    {
        return Err(anyhow!("Invalid {}: contains unsafe characters", name));
    }

    Ok(())
}

/// Last few lines of encoder diagnostics, for error messages
fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(5);
    lines[start..].join("\n")
}

fn parse_frame_rate(rate: &str) -> Option<f32> {
    let (num, den) = rate.split_once('/')?;
    let num: f32 = num.parse().ok()?;
    let den: f32 = den.parse().ok()?;
    if den != 0.0 {
        Some(num / den)
    } else {
        None
    }
}

/// Parse `ffprobe -print_format json -show_format -show_streams` output
pub(crate) fn parse_probe_output(stdout: &[u8]) -> Result<VideoMetadata> {
    let probe_data: serde_json::Value =
        serde_json::from_slice(stdout).context("Failed to parse ffprobe output")?;

    let stream = probe_data["streams"]
        .get(0)
        .ok_or_else(|| anyhow!("No video stream found"))?;

    let format = &probe_data["format"];

    let parse_duration = |value: &serde_json::Value| {
        value.as_str().and_then(|d| d.parse::<f64>().ok())
    };

    // Recorder output often has no container duration; fall back to the stream
    let duration_seconds = parse_duration(&format["duration"])
        .or_else(|| parse_duration(&stream["duration"]))
        .ok_or_else(|| anyhow!("Could not parse duration"))?;

    let width = stream["width"]
        .as_u64()
        .ok_or_else(|| anyhow!("Could not parse width"))? as u32;

    let height = stream["height"]
        .as_u64()
        .ok_or_else(|| anyhow!("Could not parse height"))? as u32;

    let codec = stream["codec_name"]
        .as_str()
        .unwrap_or("unknown")
        .to_string();

    let bitrate = format["bit_rate"]
        .as_str()
        .and_then(|b| b.parse::<u64>().ok());

    let frame_rate = stream["r_frame_rate"].as_str().and_then(parse_frame_rate);

    Ok(VideoMetadata {
        width,
        height,
        duration_seconds,
        codec,
        bitrate,
        frame_rate,
    })
}

/// Command line for one encode, progress reported on stdout
pub(crate) fn encode_args(job: &EncodeJob) -> Vec<String> {
    let mut args: Vec<String> = [
        "-hide_banner",
        "-nostdin",
        "-y",
        "-loglevel",
        "error",
        "-i",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push(job.input.to_string_lossy().to_string());

    args.extend([
        "-map".to_string(),
        "0:v:0".to_string(),
        "-map".to_string(),
        "0:a:0?".to_string(),
        "-vf".to_string(),
        format!("scale={}:{}", job.width, job.height),
        "-r".to_string(),
        job.frame_rate.to_string(),
        "-c:v".to_string(),
        job.profile.video_encoder.to_string(),
        "-b:v".to_string(),
        job.video_bitrate.to_string(),
        "-c:a".to_string(),
        job.profile.audio_encoder.to_string(),
        "-b:a".to_string(),
        job.audio_bitrate.to_string(),
    ]);
    args.extend(job.profile.extra_args.iter().map(|s| s.to_string()));
    args.extend([
        "-f".to_string(),
        job.profile.container.to_string(),
        "-progress".to_string(),
        "pipe:1".to_string(),
        "-stats_period".to_string(),
        "1".to_string(),
        "-nostats".to_string(),
        job.output.to_string_lossy().to_string(),
    ]);

    args
}

/// A running encode: progress lines on stdout, diagnostics drained in the background
struct EncodeProcess {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    parser: ProgressParser,
    stderr: JoinHandle<String>,
}

impl EncodeProcess {
    async fn finish(mut self) -> Result<()> {
        let status = self
            .child
            .wait()
            .await
            .context("Failed to wait for ffmpeg")?;
        let stderr = self.stderr.await.unwrap_or_default();

        if !status.success() {
            return Err(anyhow!("ffmpeg exited with {}: {}", status, stderr_tail(&stderr)));
        }
        Ok(())
    }
}

async fn drain(mut stderr: ChildStderr) -> String {
    let mut buf = Vec::new();
    if let Err(e) = stderr.read_to_end(&mut buf).await {
        tracing::debug!(error = %e, "Failed to read ffmpeg stderr");
    }
    String::from_utf8_lossy(&buf).into_owned()
}

async fn next_tick(
    state: Option<EncodeProcess>,
) -> Option<(Result<EncodeTick>, Option<EncodeProcess>)> {
    let mut process = state?;
    loop {
        match process.lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(tick) = process.parser.push(&line) {
                    return Some((Ok(tick), Some(process)));
                }
            }
            Ok(None) => {
                return match process.finish().await {
                    Ok(()) => None,
                    Err(e) => Some((Err(e), None)),
                };
            }
            Err(e) => {
                return Some((
                    Err(anyhow::Error::new(e).context("Failed to read ffmpeg progress")),
                    None,
                ));
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct FfmpegToolkit {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl FfmpegToolkit {
    pub fn new(ffmpeg_path: impl Into<String>, ffprobe_path: impl Into<String>) -> Result<Self> {
        let ffmpeg_path = ffmpeg_path.into();
        let ffprobe_path = ffprobe_path.into();
        validate_binary("ffmpeg_path", &ffmpeg_path)?;
        validate_binary("ffprobe_path", &ffprobe_path)?;

        Ok(Self {
            ffmpeg_path,
            ffprobe_path,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.ffmpeg_path.clone(), config.ffprobe_path.clone())
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.ffmpeg_path
    }

    pub fn ffprobe_path(&self) -> &str {
        &self.ffprobe_path
    }
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn probe(&self, path: &Path) -> Result<VideoMetadata> {
        let start = std::time::Instant::now();
        let validated_path = validate_input(path).context("Invalid video path")?;

        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(&validated_path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .context("Failed to execute ffprobe")?;

        if !output.status.success() {
            return Err(anyhow!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ));
        }

        let metadata = parse_probe_output(&output.stdout)?;

        tracing::debug!(
            duration_ms = start.elapsed().as_millis(),
            video_duration = metadata.duration_seconds,
            width = metadata.width,
            height = metadata.height,
            codec = %metadata.codec,
            "Video probe completed"
        );

        Ok(metadata)
    }

    #[tracing::instrument(skip(self, job), fields(
        process.executable.name = "ffmpeg",
        ffmpeg.operation = "encode",
        encoder = job.profile.video_encoder
    ))]
    async fn encode(&self, job: EncodeJob) -> Result<TickStream> {
        validate_input(&job.input).context("Invalid video path")?;
        validate_path(&job.output.to_string_lossy()).context("Invalid output path")?;

        let args = encode_args(&job);
        tracing::debug!(args = ?args, "Starting ffmpeg encode");

        let mut child = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .context("Failed to spawn ffmpeg")?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("ffmpeg stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("ffmpeg stderr was not captured"))?;

        let process = EncodeProcess {
            child,
            lines: BufReader::new(stdout).lines(),
            parser: ProgressParser::new(),
            stderr: tokio::spawn(drain(stderr)),
        };

        Ok(futures::stream::unfold(Some(process), next_tick).boxed())
    }

    async fn grab_frame(&self, path: &Path, timestamp_seconds: f64) -> Result<Bytes> {
        let validated_path = validate_input(path).context("Invalid video path")?;
        let timestamp = format!("{:.3}", timestamp_seconds.max(0.0));

        let output = Command::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-nostdin", "-loglevel", "error", "-ss", &timestamp, "-i"])
            .arg(&validated_path)
            .args([
                "-frames:v",
                "1",
                "-f",
                "image2pipe",
                "-c:v",
                "mjpeg",
                "-q:v",
                "3",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .context("Failed to execute ffmpeg")?;

        if !output.status.success() {
            return Err(anyhow!(
                "FFmpeg failed: {}",
                stderr_tail(&String::from_utf8_lossy(&output.stderr))
            ));
        }
        if output.stdout.is_empty() {
            return Err(anyhow!("No frame decoded at {}s", timestamp));
        }

        Ok(Bytes::from(output.stdout))
    }
}
