use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};

/// Sample rate of every PCM buffer the engine produces.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

#[derive(Clone, Debug, Default)]
/// Decoded audio as interleaved `f32` PCM.
pub struct AudioPcm {
    pub sample_rate: u32,
    pub channels: u16,
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> u64 {
        if self.channels == 0 {
            return 0;
        }
        (self.interleaved_f32.len() / usize::from(self.channels)) as u64
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}

/// Decode any audio-bearing file to stereo `f32` PCM at `sample_rate`.
///
/// Files without an audio stream decode to empty PCM rather than failing.
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> ReelResult<AudioPcm> {
    if !path.exists() {
        return Err(ReelError::missing(path));
    }
    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| ReelError::unreadable(path, format!("failed to run ffmpeg: {e}")))?;

    if !out.status.success() {
        let msg = String::from_utf8_lossy(&out.stderr);
        if msg.contains("matches no streams")
            || msg.contains("Output file #0 does not contain any stream")
            || msg.contains("does not contain any stream")
        {
            return Ok(AudioPcm {
                sample_rate,
                channels: 2,
                interleaved_f32: Vec::new(),
            });
        }
        return Err(ReelError::unreadable(
            path,
            format!("ffmpeg audio decode failed: {}", msg.trim()),
        ));
    }

    if !out.stdout.len().is_multiple_of(4) {
        return Err(ReelError::unreadable(
            path,
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    let interleaved_f32 = out
        .stdout
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    Ok(AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32,
    })
}

/// Incremental RGBA frame reader over an `ffmpeg` decode of a motion clip.
///
/// Frames come out already resampled to the timeline frame rate and cover-scaled then
/// centre-cropped to the canvas, so each one is exactly `canvas.byte_len()` bytes. The decoder
/// child is killed when the stream is dropped, which is how truncation stops reading early.
pub struct VideoFrameStream {
    path: PathBuf,
    child: Child,
    stdout: BufReader<ChildStdout>,
    frame_len: usize,
    frames_read: u64,
    finished: bool,
}

impl VideoFrameStream {
    /// Start decoding `path`. `max_frames` caps how many frames ffmpeg produces at all.
    pub fn open(
        path: &Path,
        canvas: Canvas,
        fps: Fps,
        max_frames: Option<u64>,
    ) -> ReelResult<Self> {
        if !path.exists() {
            return Err(ReelError::missing(path));
        }
        let frame_len = canvas.byte_len();
        if frame_len == 0 {
            return Err(ReelError::validation("canvas must be non-empty"));
        }

        let filter = format!(
            "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},fps={num}/{den}",
            w = canvas.width,
            h = canvas.height,
            num = fps.num,
            den = fps.den,
        );
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-v", "error", "-nostdin", "-i"])
            .arg(path)
            .args(["-an", "-vf", &filter]);
        if let Some(n) = max_frames {
            cmd.args(["-frames:v", &n.to_string()]);
        }
        cmd.args(["-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        let mut child = cmd
            .spawn()
            .map_err(|e| ReelError::unreadable(path, format!("failed to spawn ffmpeg: {e}")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::unreadable(path, "ffmpeg stdout not available"))?;

        Ok(Self {
            path: path.to_path_buf(),
            child,
            stdout: BufReader::new(stdout),
            frame_len,
            frames_read: 0,
            finished: false,
        })
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Next frame as RGBA8, or `None` once the clip is exhausted.
    ///
    /// Decoded video is opaque, so the bytes are already premultiplied.
    pub fn next_frame(&mut self) -> ReelResult<Option<Vec<u8>>> {
        if self.finished {
            return Ok(None);
        }
        let mut buf = vec![0u8; self.frame_len];
        match self.stdout.read_exact(&mut buf) {
            Ok(()) => {
                self.frames_read += 1;
                Ok(Some(buf))
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                self.finished = true;
                Ok(None)
            }
            Err(e) => {
                self.finished = true;
                Err(ReelError::unreadable(
                    &self.path,
                    format!("read decoded frame: {e}"),
                ))
            }
        }
    }
}

impl Drop for VideoFrameStream {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
