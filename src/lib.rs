//! storyreel turns narrated scenes into one timed MP4.
//!
//! Each scene brings a narration track, a list of text segments with a still image (and
//! optionally a short motion clip), a camera effect name and a transition name. The engine:
//!
//! - splits every scene's narration across its segments in proportion to their text
//! - stretches or trims each visual to its share ([`ClipPlan`])
//! - animates it with a parametric camera move ([`MotionEffect`])
//! - draws a title card and optional subtitles fitted to the frame
//! - stitches the scenes in number order and streams the frames into a [`FrameSink`]
//!
//! Scenes whose assets are missing are skipped and reported in [`RenderResult::skipped`].
//! Rasterization runs on the CPU; probing, decoding and MP4 encoding use the system
//! `ffmpeg`/`ffprobe` binaries.
#![forbid(unsafe_code)]

mod assets;
mod audio;
mod compose;
mod config;
mod effects;
mod encode;
mod foundation;
mod reconcile;
mod render;
mod scene;
mod text;
mod timing;

pub use crate::foundation::core::{
    Affine, Canvas, Fps, FrameIndex, FrameRange, Point, Rect, Vec2,
};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::config::{AspectRatio, QualityPreset, RenderConfig};
pub use crate::scene::model::{AssetKind, AssetRef, Scene, Storyboard, VisualSegment};

pub use crate::timing::allocator::allocate_durations;
pub use crate::timing::frames::{frame_spans, span_index};

pub use crate::effects::motion::{MotionCurve, MotionEffect, MotionTransform};
pub use crate::effects::transitions::{Transition, dip_opacity};

pub use crate::assets::decode::{PreparedImage, decode_image, load_image};
pub use crate::assets::media::{
    AudioPcm, MIX_SAMPLE_RATE, VideoFrameStream, decode_audio_f32_stereo,
};
pub use crate::assets::probe::{FfprobeProbe, FixedProbe, MediaInfo, MediaProbe};
pub use crate::assets::provider::{MotionClipProvider, NoMotionProvider, SiblingClipProvider};

pub use crate::reconcile::plan::{ClipFrames, ClipPlan, EXACT_TOLERANCE_SECS, reconcile};
pub use crate::reconcile::source::{ClipSource, FrameReader};

pub use crate::text::layout::{
    FittedText, FontMeasure, TextBounds, TextMeasure, fit_text, floor_size, wrap_words,
};
pub use crate::text::overlay::{
    Placement, TextOverlay, TextStyle, subtitle_overlay, title_opacity, title_overlay,
};

pub use crate::audio::track::{NarrationTrack, frame_to_sample};

pub use crate::render::painter::{FrameLayers, FramePainter, FrameRGBA};

pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path, is_ffprobe_on_path};
pub use crate::encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};

pub use crate::compose::scene::{
    ComposedScene, ComposedSegment, PreparedScene, PreparedSegment, SceneCompositor,
    SceneOutcome, SkipReason, SkippedScene,
};
pub use crate::compose::stitch::{
    RenderResult, ScenePlan, SegmentPlan, TimelinePlan, plan_storyboard, render_frame_at,
    render_storyboard, render_to_mp4,
};
