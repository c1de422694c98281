//! Per-scene composition.
//!
//! A scene is handled in two steps. [`SceneCompositor::prepare`] does all the I/O (narration
//! probe and decode, still images, motion clip discovery) and is safe to run for several scenes
//! in parallel. [`SceneCompositor::compose`] is pure timing: it splits the narration across
//! segments, reconciles each visual to its share, and binds the motion curve and subtitle.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::assets::decode::{PreparedImage, load_image};
use crate::assets::media::{AudioPcm, MIX_SAMPLE_RATE};
use crate::assets::probe::MediaProbe;
use crate::assets::provider::MotionClipProvider;
use crate::config::RenderConfig;
use crate::effects::motion::{MotionCurve, MotionEffect};
use crate::effects::transitions::Transition;
use crate::foundation::core::{Canvas, Fps, FrameRange};
use crate::foundation::error::{ReelError, ReelResult};
use crate::reconcile::plan::{ClipFrames, ClipPlan, reconcile};
use crate::reconcile::source::ClipSource;
use crate::scene::model::{AssetKind, AssetRef, Scene, VisualSegment};
use crate::text::layout::FontMeasure;
use crate::text::overlay::{TextOverlay, subtitle_overlay};
use crate::timing::allocator::allocate_durations;
use crate::timing::frames::frame_spans;

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
/// Why a scene was left out of the render.
pub enum SkipReason {
    /// An image or narration file does not exist.
    MissingAsset { path: PathBuf },
    /// A file exists but could not be decoded.
    UnreadableAsset { path: PathBuf, reason: String },
    /// The narration has no length.
    ZeroDuration { path: PathBuf },
}

impl SkipReason {
    fn from_error(err: ReelError, context: &Path) -> Self {
        match err {
            ReelError::MissingAsset { path } => Self::MissingAsset { path },
            ReelError::UnreadableAsset { path, reason } => Self::UnreadableAsset { path, reason },
            other => Self::UnreadableAsset {
                path: context.to_path_buf(),
                reason: other.to_string(),
            },
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAsset { path } => write!(f, "missing asset '{}'", path.display()),
            Self::UnreadableAsset { path, reason } => {
                write!(f, "unreadable asset '{}': {reason}", path.display())
            }
            Self::ZeroDuration { path } => {
                write!(f, "narration '{}' has zero duration", path.display())
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// A scene that did not make it into the output, and why.
pub struct SkippedScene {
    pub number: u32,
    pub reason: SkipReason,
}

#[derive(Clone, Debug)]
/// One segment's loaded inputs.
pub struct PreparedSegment {
    pub text: String,
    pub still: PreparedImage,
    pub asset: AssetRef,
}

#[derive(Clone, Debug)]
/// A scene whose assets all opened.
pub struct PreparedScene {
    pub number: u32,
    /// Narration length as probed.
    pub duration_secs: f64,
    pub narration: AudioPcm,
    pub segments: Vec<PreparedSegment>,
    pub effect: MotionEffect,
    pub transition: Transition,
}

#[derive(Clone, Debug)]
/// A segment bound to its slice of the scene timeline.
pub struct ComposedSegment {
    pub text: String,
    /// Allocated share of the narration.
    pub duration_secs: f64,
    /// Frames within the scene (scene-local indices).
    pub frames: FrameRange,
    pub plan: ClipPlan,
    pub clip_frames: ClipFrames,
    pub asset: AssetRef,
    pub still: PreparedImage,
    pub curve: MotionCurve,
    pub subtitle: Option<TextOverlay>,
}

impl ComposedSegment {
    /// Frame source for this segment; motion clips start decoding here.
    pub fn open_source(&self, canvas: Canvas, fps: Fps) -> ClipSource {
        match (self.asset.kind, self.plan.is_motion()) {
            (AssetKind::Motion, true) => ClipSource::open_motion(
                &self.asset.path,
                canvas,
                fps,
                self.clip_frames,
                self.still.clone(),
            ),
            _ => ClipSource::still(self.still.clone()),
        }
    }
}

#[derive(Clone, Debug)]
/// A scene ready to emit frames.
pub struct ComposedScene {
    pub number: u32,
    /// Narration length as probed.
    pub duration_secs: f64,
    /// Length on the timeline, in frames.
    pub total_frames: u64,
    pub effect: MotionEffect,
    /// How this scene joins the next one.
    pub transition: Transition,
    pub segments: Vec<ComposedSegment>,
    pub narration: AudioPcm,
}

#[derive(Clone, Debug)]
/// Result of composing one scene.
pub enum SceneOutcome {
    Rendered(ComposedScene),
    Skipped(SkipReason),
}

/// Builds [`ComposedScene`]s from storyboard scenes under one render configuration.
pub struct SceneCompositor<'a> {
    cfg: &'a RenderConfig,
    canvas: Canvas,
    fps: Fps,
    probe: &'a dyn MediaProbe,
    provider: &'a dyn MotionClipProvider,
}

impl<'a> SceneCompositor<'a> {
    pub fn new(
        cfg: &'a RenderConfig,
        probe: &'a dyn MediaProbe,
        provider: &'a dyn MotionClipProvider,
    ) -> ReelResult<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            canvas: cfg.canvas(),
            fps: cfg.frame_rate()?,
            probe,
            provider,
        })
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Prepare and compose in one go. A narration too short to cover a single frame skips
    /// the scene.
    pub fn compose_scene(&self, scene: &Scene, font: Option<&mut FontMeasure>) -> SceneOutcome {
        match self.prepare(scene) {
            Ok(prepared) => {
                let composed = self.compose(prepared, font);
                if composed.total_frames == 0 {
                    SceneOutcome::Skipped(SkipReason::ZeroDuration {
                        path: scene.audio.clone(),
                    })
                } else {
                    SceneOutcome::Rendered(composed)
                }
            }
            Err(reason) => SceneOutcome::Skipped(reason),
        }
    }

    /// Open every asset the scene needs. Any missing or unreadable image or narration skips
    /// the whole scene; motion clip problems only demote a segment to its still image.
    #[tracing::instrument(skip(self, scene), fields(number = scene.number))]
    pub fn prepare(&self, scene: &Scene) -> Result<PreparedScene, SkipReason> {
        let audio = &scene.audio;
        let info = self
            .probe
            .probe(audio)
            .map_err(|e| SkipReason::from_error(e, audio))?;
        if !info.has_audio {
            return Err(SkipReason::UnreadableAsset {
                path: audio.clone(),
                reason: "no audio stream".to_string(),
            });
        }
        if !info.duration_secs.is_finite() || info.duration_secs <= 0.0 {
            return Err(SkipReason::ZeroDuration {
                path: audio.clone(),
            });
        }
        let narration = self
            .probe
            .narration_pcm(audio, MIX_SAMPLE_RATE)
            .map_err(|e| SkipReason::from_error(e, audio))?;

        let segments = scene
            .segments
            .iter()
            .map(|seg| {
                let still = load_image(&seg.image)
                    .and_then(|img| check_paintable(img, &seg.image))
                    .map_err(|e| SkipReason::from_error(e, &seg.image))?;
                Ok(PreparedSegment {
                    text: seg.text.clone(),
                    still,
                    asset: self.resolve_visual(seg),
                })
            })
            .collect::<Result<Vec<_>, SkipReason>>()?;

        tracing::debug!(
            duration_secs = info.duration_secs,
            segments = segments.len(),
            "scene assets prepared"
        );
        Ok(PreparedScene {
            number: scene.number,
            duration_secs: info.duration_secs,
            narration,
            segments,
            effect: MotionEffect::from_name(&scene.effect),
            transition: Transition::from_name(&scene.transition),
        })
    }

    /// Pick the visual for a segment: its clip, else a provider clip, else the still.
    fn resolve_visual(&self, seg: &VisualSegment) -> AssetRef {
        let clip = match (&seg.clip, seg.motion_prompt.as_deref()) {
            (Some(clip), _) => Some(clip.clone()),
            (None, Some(prompt)) if !prompt.trim().is_empty() => {
                match self.provider.generate(&seg.image, prompt) {
                    Ok(path) => Some(path),
                    Err(e) => {
                        tracing::warn!(image = %seg.image.display(), error = %e, "motion clip provider failed, using still image");
                        None
                    }
                }
            }
            _ => None,
        };
        let Some(clip) = clip else {
            return AssetRef::still(&seg.image);
        };
        match self.probe.probe(&clip) {
            Ok(info) if info.has_video && info.duration_secs > 0.0 => {
                AssetRef::motion(clip, info.duration_secs)
            }
            Ok(_) => {
                tracing::warn!(clip = %clip.display(), "motion clip has no video, using still image");
                AssetRef::still(&seg.image)
            }
            Err(e) => {
                tracing::warn!(clip = %clip.display(), error = %e, "motion clip unusable, using still image");
                AssetRef::still(&seg.image)
            }
        }
    }

    /// Split the narration across segments and bind each one's timing, motion and subtitle.
    #[tracing::instrument(skip_all, fields(number = prepared.number))]
    pub fn compose(
        &self,
        prepared: PreparedScene,
        mut font: Option<&mut FontMeasure>,
    ) -> ComposedScene {
        let texts: Vec<&str> = prepared.segments.iter().map(|s| s.text.as_str()).collect();
        let durations = allocate_durations(prepared.duration_secs, &texts);
        let spans = frame_spans(0.0, &durations, self.fps);
        let total_frames = spans.last().map(|r| r.end.0).unwrap_or(0);

        let segments = prepared
            .segments
            .into_iter()
            .zip(durations)
            .zip(spans)
            .map(|((seg, duration_secs), frames)| {
                let plan = reconcile(seg.asset.kind, duration_secs, seg.asset.native_duration);
                let clip_frames = plan.frames(self.fps, frames.len_frames());
                let curve = prepared.effect.curve(
                    self.canvas.width,
                    self.canvas.height,
                    duration_secs,
                );
                let subtitle = match font.as_deref_mut() {
                    Some(f) if self.cfg.subtitles => {
                        subtitle_overlay(&seg.text, f, self.cfg).unwrap_or_else(|e| {
                            tracing::warn!(error = %e, "subtitle rendering failed");
                            None
                        })
                    }
                    _ => None,
                };
                tracing::debug!(
                    duration_secs,
                    start = frames.start.0,
                    end = frames.end.0,
                    plan = ?plan,
                    "segment composed"
                );
                ComposedSegment {
                    text: seg.text,
                    duration_secs,
                    frames,
                    plan,
                    clip_frames,
                    asset: seg.asset,
                    still: seg.still,
                    curve,
                    subtitle,
                }
            })
            .collect();

        ComposedScene {
            number: prepared.number,
            duration_secs: prepared.duration_secs,
            total_frames,
            effect: prepared.effect,
            transition: prepared.transition,
            segments,
            narration: prepared.narration,
        }
    }
}

fn check_paintable(img: PreparedImage, path: &Path) -> ReelResult<PreparedImage> {
    let max = u32::from(u16::MAX);
    if img.width > max || img.height > max {
        return Err(ReelError::unreadable(
            path,
            format!("{}x{} exceeds 65535 pixels", img.width, img.height),
        ));
    }
    Ok(img)
}

#[cfg(test)]
#[path = "../../tests/unit/compose/scene.rs"]
mod tests;
