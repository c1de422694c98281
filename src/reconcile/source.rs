use std::path::Path;

use crate::assets::decode::PreparedImage;
use crate::assets::media::VideoFrameStream;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::ReelResult;
use crate::reconcile::plan::ClipFrames;

/// Sequential source of decoded RGBA8 frames.
pub trait FrameReader {
    /// Next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> ReelResult<Option<Vec<u8>>>;
}

impl FrameReader for VideoFrameStream {
    fn next_frame(&mut self) -> ReelResult<Option<Vec<u8>>> {
        VideoFrameStream::next_frame(self)
    }
}

/// Produces exactly one image per timeline frame of a segment, following its [`ClipFrames`].
///
/// The first `play_frames` frames come from the reader; after that (or as soon as the reader
/// runs dry) the last decoded frame repeats. The reader is dropped the moment it is no longer
/// needed. If it never yields a frame, the segment's still image is used throughout.
pub struct ClipSource {
    fallback: PreparedImage,
    reader: Option<Box<dyn FrameReader>>,
    frame_w: u32,
    frame_h: u32,
    last: Option<PreparedImage>,
    play_frames: u64,
    emitted: u64,
    decoded: u64,
}

impl ClipSource {
    /// Still image for every frame.
    pub fn still(image: PreparedImage) -> Self {
        Self {
            frame_w: image.width,
            frame_h: image.height,
            fallback: image,
            reader: None,
            last: None,
            play_frames: 0,
            emitted: 0,
            decoded: 0,
        }
    }

    /// Frames of `frame_w` x `frame_h` from `reader`, with `fallback` covering a dead reader.
    pub fn from_reader(
        reader: Box<dyn FrameReader>,
        frame_w: u32,
        frame_h: u32,
        frames: ClipFrames,
        fallback: PreparedImage,
    ) -> Self {
        Self {
            fallback,
            reader: (frames.play_frames > 0).then_some(reader),
            frame_w,
            frame_h,
            last: None,
            play_frames: frames.play_frames,
            emitted: 0,
            decoded: 0,
        }
    }

    /// Open a motion clip decoded at the canvas size; an unopenable clip becomes the still.
    pub fn open_motion(
        clip: &Path,
        canvas: Canvas,
        fps: Fps,
        frames: ClipFrames,
        fallback: PreparedImage,
    ) -> Self {
        if frames.play_frames == 0 {
            return Self::still(fallback);
        }
        match VideoFrameStream::open(clip, canvas, fps, Some(frames.play_frames)) {
            Ok(stream) => Self::from_reader(
                Box::new(stream),
                canvas.width,
                canvas.height,
                frames,
                fallback,
            ),
            Err(e) => {
                tracing::warn!(clip = %clip.display(), error = %e, "motion clip unusable, using still image");
                Self::still(fallback)
            }
        }
    }

    /// Frames taken from the clip so far.
    pub fn decoded_frames(&self) -> u64 {
        self.decoded
    }

    /// Image for the next timeline frame. Never fails: decode problems degrade to holding.
    pub fn next_image(&mut self) -> PreparedImage {
        if self.emitted < self.play_frames {
            self.pull();
        }
        self.emitted += 1;
        if self.emitted >= self.play_frames {
            self.reader = None;
        }
        self.last.clone().unwrap_or_else(|| self.fallback.clone())
    }

    fn pull(&mut self) {
        let Some(reader) = self.reader.as_mut() else {
            return;
        };
        let outcome = reader.next_frame().and_then(|f| {
            f.map(|bytes| PreparedImage::from_premul(self.frame_w, self.frame_h, bytes))
                .transpose()
        });
        match outcome {
            Ok(Some(img)) => {
                self.decoded += 1;
                self.last = Some(img);
            }
            Ok(None) => {
                self.reader = None;
                if self.last.is_none() {
                    tracing::warn!("motion clip produced no frames, using still image");
                } else {
                    tracing::debug!(
                        decoded = self.decoded,
                        planned = self.play_frames,
                        "motion clip ended early, holding last frame"
                    );
                }
            }
            Err(e) => {
                self.reader = None;
                tracing::warn!(error = %e, "motion clip decode failed, holding");
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/reconcile/source.rs"]
mod tests;
