//! Explicit media duration discovery.
//!
//! Scene timing comes from the narration file's length and motion clips are reconciled
//! against their native length, so every duration the compositor needs is fetched through
//! [`MediaProbe`]. Tests and dry runs inject [`FixedProbe`] instead of touching real media.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::assets::media::{AudioPcm, decode_audio_f32_stereo};
use crate::foundation::error::{ReelError, ReelResult};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
/// What a probe learned about one media file.
pub struct MediaInfo {
    /// Container duration in seconds.
    pub duration_secs: f64,
    /// Video width, when a video stream exists.
    pub width: Option<u32>,
    /// Video height, when a video stream exists.
    pub height: Option<u32>,
    pub has_video: bool,
    pub has_audio: bool,
}

impl MediaInfo {
    /// Audio-only media of the given length.
    pub fn audio(duration_secs: f64) -> Self {
        Self {
            duration_secs,
            width: None,
            height: None,
            has_video: false,
            has_audio: true,
        }
    }

    /// Silent video of the given length and size.
    pub fn video(duration_secs: f64, width: u32, height: u32) -> Self {
        Self {
            duration_secs,
            width: Some(width),
            height: Some(height),
            has_video: true,
            has_audio: false,
        }
    }
}

/// Discovers media durations and stream layout, and loads narration for a probed file.
pub trait MediaProbe: Send + Sync {
    fn probe(&self, path: &Path) -> ReelResult<MediaInfo>;

    /// Stereo PCM of the narration at `path`, resampled to `sample_rate`.
    fn narration_pcm(&self, path: &Path, sample_rate: u32) -> ReelResult<AudioPcm> {
        decode_audio_f32_stereo(path, sample_rate)
    }
}

#[derive(Clone, Copy, Debug, Default)]
/// Probe backed by the system `ffprobe` binary.
pub struct FfprobeProbe;

impl MediaProbe for FfprobeProbe {
    fn probe(&self, path: &Path) -> ReelResult<MediaInfo> {
        #[derive(serde::Deserialize)]
        struct ProbeStream {
            codec_type: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
            duration: Option<String>,
        }
        #[derive(serde::Deserialize)]
        struct ProbeFormat {
            duration: Option<String>,
        }
        #[derive(serde::Deserialize)]
        struct ProbeOut {
            #[serde(default)]
            streams: Vec<ProbeStream>,
            format: Option<ProbeFormat>,
        }

        if !path.exists() {
            return Err(ReelError::missing(path));
        }

        let out = std::process::Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path)
            .output()
            .map_err(|e| ReelError::unreadable(path, format!("failed to run ffprobe: {e}")))?;
        if !out.status.success() {
            return Err(ReelError::unreadable(
                path,
                format!(
                    "ffprobe failed: {}",
                    String::from_utf8_lossy(&out.stderr).trim()
                ),
            ));
        }

        let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
            .map_err(|e| ReelError::unreadable(path, format!("ffprobe json parse failed: {e}")))?;

        let video = parsed
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"));
        let has_audio = parsed
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some("audio"));

        // Prefer the container duration; some muxers only report it per stream.
        let duration_secs = parsed
            .format
            .as_ref()
            .and_then(|f| f.duration.as_deref())
            .and_then(parse_secs)
            .or_else(|| {
                parsed
                    .streams
                    .iter()
                    .filter_map(|s| s.duration.as_deref().and_then(parse_secs))
                    .reduce(f64::max)
            })
            .ok_or_else(|| ReelError::unreadable(path, "media has no readable duration"))?;

        Ok(MediaInfo {
            duration_secs,
            width: video.and_then(|v| v.width),
            height: video.and_then(|v| v.height),
            has_video: video.is_some(),
            has_audio,
        })
    }
}

fn parse_secs(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|d| d.is_finite() && *d >= 0.0)
}

#[derive(Clone, Debug, Default)]
/// Probe answering from a fixed table; unknown paths are reported missing.
pub struct FixedProbe {
    entries: HashMap<PathBuf, MediaInfo>,
}

impl FixedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `info` for `path`.
    pub fn with(mut self, path: impl Into<PathBuf>, info: MediaInfo) -> Self {
        self.entries.insert(path.into(), info);
        self
    }

    /// Register an audio file of `secs` seconds.
    pub fn with_audio(self, path: impl Into<PathBuf>, secs: f64) -> Self {
        self.with(path, MediaInfo::audio(secs))
    }
}

impl MediaProbe for FixedProbe {
    fn probe(&self, path: &Path) -> ReelResult<MediaInfo> {
        self.entries
            .get(path)
            .copied()
            .ok_or_else(|| ReelError::missing(path))
    }

    /// Silence of the registered length.
    fn narration_pcm(&self, path: &Path, sample_rate: u32) -> ReelResult<AudioPcm> {
        let info = self.probe(path)?;
        let frames = (info.duration_secs * f64::from(sample_rate)).round().max(0.0) as usize;
        Ok(AudioPcm {
            sample_rate,
            channels: 2,
            interleaved_f32: vec![0.0; frames * 2],
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/probe.rs"]
mod tests;
