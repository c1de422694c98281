//! Timeline stitching: scenes in play order, one narration track, one frame stream.

use std::path::PathBuf;

use rayon::prelude::*;

use crate::assets::decode::PreparedImage;
use crate::assets::probe::MediaProbe;
use crate::assets::provider::MotionClipProvider;
use crate::audio::track::NarrationTrack;
use crate::compose::scene::{
    ComposedScene, ComposedSegment, PreparedScene, SceneCompositor, SkipReason, SkippedScene,
};
use crate::config::RenderConfig;
use crate::effects::motion::MotionEffect;
use crate::effects::transitions::{Transition, dip_opacity};
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRange};
use crate::foundation::error::{ReelError, ReelResult};
use crate::reconcile::plan::{ClipFrames, ClipPlan};
use crate::render::painter::{FrameLayers, FramePainter, FrameRGBA};
use crate::scene::model::{AssetRef, Storyboard};
use crate::text::layout::FontMeasure;
use crate::text::overlay::{TextOverlay, title_opacity, title_overlay};

/// Summary of a finished render.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RenderResult {
    /// Where the video was written.
    pub path: PathBuf,
    /// Sum of the rendered scenes' narration lengths.
    pub duration_secs: f64,
    pub total_frames: u64,
    pub scenes_rendered: usize,
    pub skipped: Vec<SkippedScene>,
}

/// Computed timeline, without pixels.
#[derive(Clone, Debug, serde::Serialize)]
pub struct TimelinePlan {
    pub output: PathBuf,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    pub duration_secs: f64,
    pub total_frames: u64,
    pub scenes: Vec<ScenePlan>,
    pub skipped: Vec<SkippedScene>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct ScenePlan {
    pub number: u32,
    pub start_frame: u64,
    pub end_frame: u64,
    pub duration_secs: f64,
    pub effect: MotionEffect,
    pub transition: Transition,
    pub segments: Vec<SegmentPlan>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct SegmentPlan {
    pub text: String,
    /// Global frame indices.
    pub start_frame: u64,
    pub end_frame: u64,
    pub duration_secs: f64,
    pub asset: AssetRef,
    pub plan: ClipPlan,
    pub clip_frames: ClipFrames,
}

struct PlacedScene {
    start: u64,
    scene: ComposedScene,
}

impl PlacedScene {
    fn span(&self) -> FrameRange {
        FrameRange {
            start: FrameIndex(self.start),
            end: FrameIndex(self.start + self.scene.total_frames),
        }
    }
}

struct Timeline {
    canvas: Canvas,
    fps: Fps,
    scenes: Vec<PlacedScene>,
    skipped: Vec<SkippedScene>,
    total_frames: u64,
    title: Option<TextOverlay>,
}

impl Timeline {
    fn duration_secs(&self) -> f64 {
        self.scenes.iter().map(|p| p.scene.duration_secs).sum()
    }

    fn narration_track(&self) -> ReelResult<NarrationTrack> {
        let mut track = NarrationTrack::default();
        for placed in &self.scenes {
            track.place(&placed.scene.narration, placed.span(), self.fps)?;
        }
        track.pad_to_frames(self.total_frames, self.fps);
        Ok(track)
    }

    /// Transitions on both edges of scene `i`. The first scene has no incoming dip and the
    /// last no outgoing one.
    fn edges(&self, i: usize) -> (Transition, Transition) {
        let incoming = match i.checked_sub(1) {
            Some(prev) => self.scenes[prev].scene.transition,
            None => Transition::Cut,
        };
        let outgoing = if i + 1 < self.scenes.len() {
            self.scenes[i].scene.transition
        } else {
            Transition::Cut
        };
        (incoming, outgoing)
    }

    fn paint_frame(
        &self,
        cfg: &RenderConfig,
        painter: &mut FramePainter,
        scene_idx: usize,
        seg: &ComposedSegment,
        local: u64,
        image: &PreparedImage,
    ) -> ReelResult<FrameRGBA> {
        let placed = &self.scenes[scene_idx];
        let (incoming, outgoing) = self.edges(scene_idx);
        let seg_t = self.fps.frames_to_secs(local - seg.frames.start.0);
        let affine = seg
            .curve
            .affine_at(seg_t, self.canvas, image.width, image.height);
        let dip = dip_opacity(
            self.fps.frames_to_secs(local),
            self.fps.frames_to_secs(placed.scene.total_frames),
            incoming,
            outgoing,
            cfg.transition_secs,
        );

        let mut overlays = Vec::with_capacity(2);
        if let Some(title) = &self.title {
            let global_t = self.fps.frames_to_secs(placed.start + local);
            let opacity = title_opacity(global_t, cfg.title_secs, cfg.title_fade_secs);
            if opacity > 0.0 {
                overlays.push((title, opacity));
            }
        }
        if let Some(sub) = &seg.subtitle {
            overlays.push((sub, 1.0));
        }

        painter.paint(&FrameLayers {
            visual: Some((image, affine)),
            dip,
            overlays,
        })
    }

    fn emit(&self, cfg: &RenderConfig, sink: &mut dyn FrameSink) -> ReelResult<()> {
        let mut painter = FramePainter::new(self.canvas, cfg.background_rgba8)?;
        for (i, placed) in self.scenes.iter().enumerate() {
            tracing::info!(
                scene = placed.scene.number,
                start = placed.start,
                frames = placed.scene.total_frames,
                "rendering scene"
            );
            for seg in &placed.scene.segments {
                let mut source = seg.open_source(self.canvas, self.fps);
                for local in seg.frames.start.0..seg.frames.end.0 {
                    let image = source.next_image();
                    let frame = self.paint_frame(cfg, &mut painter, i, seg, local, &image)?;
                    sink.push_frame(FrameIndex(placed.start + local), &frame)?;
                }
            }
        }
        Ok(())
    }

    fn plan(&self, output: PathBuf) -> TimelinePlan {
        let scenes = self
            .scenes
            .iter()
            .map(|placed| ScenePlan {
                number: placed.scene.number,
                start_frame: placed.start,
                end_frame: placed.start + placed.scene.total_frames,
                duration_secs: placed.scene.duration_secs,
                effect: placed.scene.effect,
                transition: placed.scene.transition,
                segments: placed
                    .scene
                    .segments
                    .iter()
                    .map(|seg| SegmentPlan {
                        text: seg.text.clone(),
                        start_frame: placed.start + seg.frames.start.0,
                        end_frame: placed.start + seg.frames.end.0,
                        duration_secs: seg.duration_secs,
                        asset: seg.asset.clone(),
                        plan: seg.plan,
                        clip_frames: seg.clip_frames,
                    })
                    .collect(),
            })
            .collect();
        TimelinePlan {
            output,
            fps: self.fps.num,
            width: self.canvas.width,
            height: self.canvas.height,
            duration_secs: self.duration_secs(),
            total_frames: self.total_frames,
            scenes,
            skipped: self.skipped.clone(),
        }
    }
}

/// Prepare every scene on the worker pool, then compose them in play order.
fn compose_timeline(
    board: &Storyboard,
    cfg: &RenderConfig,
    probe: &dyn MediaProbe,
    provider: &dyn MotionClipProvider,
    with_text: bool,
) -> ReelResult<Timeline> {
    board.validate()?;
    let compositor = SceneCompositor::new(cfg, probe, provider)?;
    let ordered = board.ordered_scenes();

    let pool = build_thread_pool(cfg.concurrency)?;
    let prepared: Vec<Result<PreparedScene, SkipReason>> = pool.install(|| {
        ordered
            .par_iter()
            .map(|scene| compositor.prepare(scene))
            .collect()
    });

    let wants_font = with_text && (cfg.subtitles || !board.title.trim().is_empty());
    let mut font = if wants_font {
        FontMeasure::discover(cfg.font_path.as_deref())
    } else {
        None
    };

    let mut scenes = Vec::with_capacity(prepared.len());
    let mut skipped = Vec::new();
    let mut cursor = 0u64;
    for (scene, outcome) in ordered.iter().zip(prepared) {
        let outcome = outcome.map(|p| compositor.compose(p, font.as_mut())).and_then(|c| {
            if c.total_frames == 0 {
                Err(SkipReason::ZeroDuration {
                    path: scene.audio.clone(),
                })
            } else {
                Ok(c)
            }
        });
        match outcome {
            Ok(composed) => {
                let start = cursor;
                cursor += composed.total_frames;
                scenes.push(PlacedScene {
                    start,
                    scene: composed,
                });
            }
            Err(reason) => {
                tracing::warn!(scene = scene.number, %reason, "skipping scene");
                skipped.push(SkippedScene {
                    number: scene.number,
                    reason,
                });
            }
        }
    }

    if scenes.is_empty() {
        return Err(ReelError::NoRenderableScenes {
            skipped: skipped.len(),
        });
    }

    let title = match font.as_mut() {
        Some(f) if with_text && cfg.title_secs > 0.0 && !board.title.trim().is_empty() => {
            title_overlay(&board.title, f, cfg).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "title card rendering failed");
                None
            })
        }
        _ => None,
    };

    Ok(Timeline {
        canvas: compositor.canvas(),
        fps: compositor.fps(),
        scenes,
        skipped,
        total_frames: cursor,
        title,
    })
}

/// Render `board` into `sink`: every surviving scene in play order, with the concatenated
/// narration track handed to the sink as raw PCM.
///
/// Scenes whose assets are missing or unreadable are skipped and listed in the result. If
/// nothing survives, [`ReelError::NoRenderableScenes`] is returned and the sink is never
/// started. A failure after `begin` aborts the sink.
#[tracing::instrument(skip_all, fields(scenes = board.scenes.len()))]
pub fn render_storyboard(
    board: &Storyboard,
    cfg: &RenderConfig,
    probe: &dyn MediaProbe,
    provider: &dyn MotionClipProvider,
    sink: &mut dyn FrameSink,
) -> ReelResult<RenderResult> {
    let timeline = compose_timeline(board, cfg, probe, provider, true)?;
    let track = timeline.narration_track()?;

    let mut audio_tmp = TempFileGuard(None);
    let audio = if track.total_samples() == 0 {
        None
    } else {
        let path = std::env::temp_dir().join(format!(
            "storyreel_narration_{}_{}.f32le",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0)
        ));
        track.write_f32le(&path)?;
        audio_tmp.0 = Some(path.clone());
        Some(AudioInputConfig {
            path,
            sample_rate: track.sample_rate(),
            channels: track.channels(),
        })
    };

    let sink_cfg = SinkConfig {
        width: timeline.canvas.width,
        height: timeline.canvas.height,
        fps: timeline.fps,
        audio,
    };
    if let Err(e) = sink.begin(sink_cfg) {
        sink.abort();
        return Err(e);
    }
    if let Err(e) = timeline.emit(cfg, sink) {
        sink.abort();
        return Err(e);
    }
    sink.end()?;
    drop(audio_tmp);

    let result = RenderResult {
        path: board.output_path(),
        duration_secs: timeline.duration_secs(),
        total_frames: timeline.total_frames,
        scenes_rendered: timeline.scenes.len(),
        skipped: timeline.skipped,
    };
    tracing::info!(
        path = %result.path.display(),
        duration_secs = result.duration_secs,
        frames = result.total_frames,
        skipped = result.skipped.len(),
        "render finished"
    );
    Ok(result)
}

/// Render `board` to `output_dir/output_name` with the system `ffmpeg`.
///
/// The file appears only once encoding succeeds; a failed render leaves nothing behind.
pub fn render_to_mp4(
    board: &Storyboard,
    cfg: &RenderConfig,
    probe: &dyn MediaProbe,
    provider: &dyn MotionClipProvider,
) -> ReelResult<RenderResult> {
    if !is_ffmpeg_on_path() {
        return Err(ReelError::encode(
            "ffmpeg is required for MP4 rendering, but was not found on PATH",
        ));
    }
    let mut sink = FfmpegSink::new(FfmpegSinkOpts {
        out_path: board.output_path(),
        overwrite: cfg.overwrite,
        bg_rgba: cfg.background_rgba8,
        quality: cfg.quality,
    });
    render_storyboard(board, cfg, probe, provider, &mut sink)
}

/// Compute the timeline without decoding clips or encoding anything.
#[tracing::instrument(skip_all, fields(scenes = board.scenes.len()))]
pub fn plan_storyboard(
    board: &Storyboard,
    cfg: &RenderConfig,
    probe: &dyn MediaProbe,
    provider: &dyn MotionClipProvider,
) -> ReelResult<TimelinePlan> {
    let timeline = compose_timeline(board, cfg, probe, provider, false)?;
    Ok(timeline.plan(board.output_path()))
}

/// Render the single frame shown at `at_secs` on the timeline. Times past the end clamp to
/// the last frame.
pub fn render_frame_at(
    board: &Storyboard,
    cfg: &RenderConfig,
    probe: &dyn MediaProbe,
    provider: &dyn MotionClipProvider,
    at_secs: f64,
) -> ReelResult<FrameRGBA> {
    if !at_secs.is_finite() || at_secs < 0.0 {
        return Err(ReelError::validation("frame time must be finite and >= 0"));
    }
    let timeline = compose_timeline(board, cfg, probe, provider, true)?;
    if timeline.total_frames == 0 {
        return Err(ReelError::validation("timeline has no frames"));
    }
    let global = timeline
        .fps
        .secs_to_frames_floor(at_secs)
        .min(timeline.total_frames - 1);

    let (scene_idx, placed) = timeline
        .scenes
        .iter()
        .enumerate()
        .find(|(_, p)| p.span().contains(FrameIndex(global)))
        .ok_or_else(|| ReelError::validation("frame outside every scene"))?;
    let local = global - placed.start;
    let seg = placed
        .scene
        .segments
        .iter()
        .find(|s| s.frames.contains(FrameIndex(local)))
        .ok_or_else(|| ReelError::validation("frame outside every segment"))?;

    let mut source = seg.open_source(timeline.canvas, timeline.fps);
    let mut image = source.next_image();
    for _ in seg.frames.start.0..local {
        image = source.next_image();
    }
    let mut painter = FramePainter::new(timeline.canvas, cfg.background_rgba8)?;
    timeline.paint_frame(cfg, &mut painter, scene_idx, seg, local, &image)
}

fn build_thread_pool(threads: Option<usize>) -> ReelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ReelError::validation("concurrency must be >= 1 when set"));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ReelError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/stitch.rs"]
mod tests;
