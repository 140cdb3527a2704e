//! One-shot detection of what the installed ffmpeg build can do

use std::collections::BTreeSet;
use std::process::Stdio;
use tokio::process::Command;
use touchline_core::PlatformCapabilities;

/// Encoder names from `ffmpeg -encoders` output.
///
/// The listing starts after a ` ------` separator; each row is a flag column
/// followed by the encoder name.
pub fn parse_encoder_list(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("------"))
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let flags = parts.next()?;
            let name = parts.next()?;
            (flags.len() == 6).then(|| name.to_string())
        })
        .collect()
}

async fn run(binary: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(binary)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            tracing::debug!(binary, status = %output.status, "Capability probe failed");
            None
        }
        Err(e) => {
            tracing::debug!(binary, error = %e, "Capability probe could not start");
            None
        }
    }
}

/// Run `ffprobe -version` and `ffmpeg -hide_banner -encoders` once and derive
/// the platform capabilities. Missing binaries yield capabilities with nothing
/// enabled.
pub async fn detect_capabilities(ffmpeg_path: &str, ffprobe_path: &str) -> PlatformCapabilities {
    let can_probe = run(ffprobe_path, &["-version"]).await.is_some();
    let encoders = run(ffmpeg_path, &["-hide_banner", "-encoders"])
        .await
        .map(|out| parse_encoder_list(&out))
        .unwrap_or_default();

    let capabilities = capabilities_from(can_probe, encoders);
    tracing::info!(
        can_probe = capabilities.can_probe,
        can_record = capabilities.can_record,
        can_capture_frames = capabilities.can_capture_frames,
        encoders = capabilities.encoders.len(),
        "Detected platform capabilities"
    );
    capabilities
}

fn capabilities_from(can_probe: bool, encoders: BTreeSet<String>) -> PlatformCapabilities {
    let can_capture_frames = encoders.contains("mjpeg");
    let can_record = crate::video::codec::CODEC_PREFERENCE
        .iter()
        .any(|profile| encoders.contains(profile.video_encoder));

    PlatformCapabilities {
        can_probe,
        can_record,
        can_capture_frames,
        encoders,
    }
}
