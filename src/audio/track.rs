use std::path::Path;

use anyhow::Context as _;

use crate::assets::media::{AudioPcm, MIX_SAMPLE_RATE};
use crate::foundation::core::{Fps, FrameRange};
use crate::foundation::error::{ReelError, ReelResult};

/// Timeline sample at which frame `frame_delta` starts, rounded to nearest.
pub fn frame_to_sample(frame_delta: u64, fps: Fps, sample_rate: u32) -> u64 {
    let num = u128::from(frame_delta) * u128::from(sample_rate) * u128::from(fps.den);
    let den = u128::from(fps.num);
    ((num + (den / 2)) / den) as u64
}

#[derive(Clone, Debug)]
/// The final narration track: each rendered scene's audio laid end to end.
///
/// Every scene occupies exactly the samples covered by its frame span, so audio and video
/// never drift apart however many scenes are stitched.
pub struct NarrationTrack {
    sample_rate: u32,
    channels: u16,
    interleaved: Vec<f32>,
}

impl Default for NarrationTrack {
    fn default() -> Self {
        Self::new(MIX_SAMPLE_RATE)
    }
}

impl NarrationTrack {
    /// Empty stereo track.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 2,
            interleaved: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Length in sample frames.
    pub fn total_samples(&self) -> u64 {
        (self.interleaved.len() / usize::from(self.channels)) as u64
    }

    pub fn interleaved(&self) -> &[f32] {
        &self.interleaved
    }

    pub fn is_silent(&self) -> bool {
        self.interleaved.iter().all(|s| *s == 0.0)
    }

    /// Place `pcm` over the samples of `span`: anything before it is silence, a short clip is
    /// padded with silence and a long one is cut at the span end.
    pub fn place(&mut self, pcm: &AudioPcm, span: FrameRange, fps: Fps) -> ReelResult<()> {
        if pcm.sample_rate != self.sample_rate || pcm.channels != self.channels {
            return Err(ReelError::validation(format!(
                "narration pcm is {} Hz x{}, track is {} Hz x{}",
                pcm.sample_rate, pcm.channels, self.sample_rate, self.channels
            )));
        }
        let ch = usize::from(self.channels);
        let start = frame_to_sample(span.start.0, fps, self.sample_rate) as usize * ch;
        let end = frame_to_sample(span.end.0, fps, self.sample_rate) as usize * ch;
        if self.interleaved.len() > start {
            return Err(ReelError::validation(
                "narration spans must be placed in timeline order",
            ));
        }

        self.interleaved.resize(start, 0.0);
        let take = pcm.interleaved_f32.len().min(end - start);
        self.interleaved.extend_from_slice(&pcm.interleaved_f32[..take]);
        self.interleaved.resize(end, 0.0);
        Ok(())
    }

    /// Pad with silence up to the end of `frames` timeline frames.
    pub fn pad_to_frames(&mut self, frames: u64, fps: Fps) {
        let end =
            frame_to_sample(frames, fps, self.sample_rate) as usize * usize::from(self.channels);
        if self.interleaved.len() < end {
            self.interleaved.resize(end, 0.0);
        }
    }

    /// Write raw little-endian `f32` samples, the format the encoder reads.
    pub fn write_f32le(&self, out_path: &Path) -> ReelResult<()> {
        write_f32le_file(&self.interleaved, out_path)
    }
}

/// Write interleaved samples as raw `f32le`.
pub fn write_f32le_file(samples_interleaved: &[f32], out_path: &Path) -> ReelResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create audio directory '{}'", parent.display()))?;
    }
    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes)
        .with_context(|| format!("write narration track '{}'", out_path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/audio/track.rs"]
mod tests;
