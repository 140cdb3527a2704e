use serde::Serialize;
use touchline_core::{mime_essence, PlatformCapabilities};

/// An output container plus the encoders that fill it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CodecProfile {
    /// Full MIME type including codecs, e.g. `video/webm;codecs=vp9,opus`
    pub mime_type: &'static str,
    /// ffmpeg muxer name
    pub container: &'static str,
    pub extension: &'static str,
    pub video_encoder: &'static str,
    pub audio_encoder: &'static str,
    #[serde(skip)]
    pub extra_args: &'static [&'static str],
}

impl CodecProfile {
    /// MIME type without the codecs parameter
    pub fn content_type(&self) -> String {
        mime_essence(self.mime_type)
    }

    pub fn is_supported_by(&self, capabilities: &PlatformCapabilities) -> bool {
        capabilities.has_encoder(self.video_encoder) && capabilities.has_encoder(self.audio_encoder)
    }
}

const VPX_REALTIME: &[&str] = &["-deadline", "realtime", "-cpu-used", "8"];

/// Output profiles in descending order of preference
pub const CODEC_PREFERENCE: [CodecProfile; 4] = [
    CodecProfile {
        mime_type: "video/webm;codecs=vp9,opus",
        container: "webm",
        extension: "webm",
        video_encoder: "libvpx-vp9",
        audio_encoder: "libopus",
        extra_args: &["-deadline", "realtime", "-cpu-used", "8", "-row-mt", "1"],
    },
    CodecProfile {
        mime_type: "video/webm;codecs=vp8,opus",
        container: "webm",
        extension: "webm",
        video_encoder: "libvpx",
        audio_encoder: "libopus",
        extra_args: VPX_REALTIME,
    },
    CodecProfile {
        mime_type: "video/webm;codecs=vp8,vorbis",
        container: "webm",
        extension: "webm",
        video_encoder: "libvpx",
        audio_encoder: "libvorbis",
        extra_args: VPX_REALTIME,
    },
    CodecProfile {
        mime_type: "video/mp4;codecs=avc1,mp4a",
        container: "mp4",
        extension: "mp4",
        video_encoder: "libx264",
        audio_encoder: "aac",
        extra_args: &[
            "-preset",
            "veryfast",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ],
    },
];

/// First profile in [`CODEC_PREFERENCE`] the platform can encode
pub fn select_codec(capabilities: &PlatformCapabilities) -> Option<CodecProfile> {
    CODEC_PREFERENCE
        .iter()
        .find(|profile| profile.is_supported_by(capabilities))
        .copied()
}
