use std::io::Cursor;

use super::*;
use crate::assets::probe::{FixedProbe, MediaInfo};
use crate::assets::provider::NoMotionProvider;

struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    fn new(tag: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("storyreel_compose_{tag}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        Self { dir }
    }

    fn png(&self, name: &str) -> PathBuf {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        let path = self.dir.join(name);
        std::fs::write(&path, buf).unwrap();
        path
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

struct FixedProvider(PathBuf);

impl MotionClipProvider for FixedProvider {
    fn generate(&self, _image: &Path, _prompt: &str) -> ReelResult<PathBuf> {
        Ok(self.0.clone())
    }
}

fn cfg() -> RenderConfig {
    RenderConfig {
        resolution: Some(Canvas {
            width: 64,
            height: 36,
        }),
        ..RenderConfig::default()
    }
}

fn scene(number: u32, audio: PathBuf, segments: Vec<VisualSegment>) -> Scene {
    Scene {
        number,
        segments,
        audio,
        effect: "static".to_string(),
        transition: "cut".to_string(),
    }
}

fn rendered(outcome: SceneOutcome) -> ComposedScene {
    match outcome {
        SceneOutcome::Rendered(s) => s,
        SceneOutcome::Skipped(r) => panic!("unexpected skip: {r}"),
    }
}

fn skipped(outcome: SceneOutcome) -> SkipReason {
    match outcome {
        SceneOutcome::Skipped(r) => r,
        SceneOutcome::Rendered(s) => panic!("scene {} unexpectedly rendered", s.number),
    }
}

#[test]
fn segments_split_by_text_length_and_fill_the_scene() {
    let ws = Workspace::new("split");
    let audio = ws.path("a.wav");
    let probe = FixedProbe::new().with_audio(&audio, 15.0);
    let c = cfg();
    let comp = SceneCompositor::new(&c, &probe, &NoMotionProvider).unwrap();

    let s = scene(
        1,
        audio,
        vec![
            VisualSegment::still("hello", ws.png("1.png")),
            VisualSegment::still("x".repeat(25), ws.png("2.png")),
        ],
    );
    let out = rendered(comp.compose_scene(&s, None));
    assert_eq!(out.total_frames, 450);
    assert!((out.segments[0].duration_secs - 2.5).abs() < 1e-9);
    assert!((out.segments[1].duration_secs - 12.5).abs() < 1e-9);
    assert_eq!(out.segments[0].frames.len_frames(), 75);
    assert_eq!(out.segments[1].frames.start.0, 75);
    assert_eq!(out.segments[1].frames.end.0, 450);
    assert_eq!(out.narration.frames(), 15 * 48_000);
    assert!(out.segments.iter().all(|s| s.subtitle.is_none()));
    assert!(matches!(out.segments[0].plan, ClipPlan::Still { .. }));
}

#[test]
fn missing_image_skips_the_scene() {
    let ws = Workspace::new("missing_image");
    let audio = ws.path("a.wav");
    let probe = FixedProbe::new().with_audio(&audio, 2.0);
    let c = cfg();
    let comp = SceneCompositor::new(&c, &probe, &NoMotionProvider).unwrap();

    let gone = ws.path("gone.png");
    let s = scene(2, audio, vec![VisualSegment::still("t", &gone)]);
    assert_eq!(
        skipped(comp.compose_scene(&s, None)),
        SkipReason::MissingAsset { path: gone }
    );
}

#[test]
fn missing_or_silent_narration_skips_the_scene() {
    let ws = Workspace::new("audio");
    let img = ws.png("1.png");
    let zero = ws.path("zero.wav");
    let video_only = ws.path("video_only.mp4");
    let probe = FixedProbe::new()
        .with_audio(&zero, 0.0)
        .with(&video_only, MediaInfo::video(3.0, 64, 36));
    let c = cfg();
    let comp = SceneCompositor::new(&c, &probe, &NoMotionProvider).unwrap();

    let r = skipped(comp.compose_scene(
        &scene(1, ws.path("nope.wav"), vec![VisualSegment::still("t", &img)]),
        None,
    ));
    assert!(matches!(r, SkipReason::MissingAsset { .. }));

    let r = skipped(comp.compose_scene(&scene(1, zero, vec![VisualSegment::still("t", &img)]), None));
    assert!(matches!(r, SkipReason::ZeroDuration { .. }));

    let r = skipped(comp.compose_scene(
        &scene(1, video_only, vec![VisualSegment::still("t", &img)]),
        None,
    ));
    assert!(matches!(r, SkipReason::UnreadableAsset { .. }));
}

#[test]
fn garbage_image_is_unreadable() {
    let ws = Workspace::new("garbage");
    let audio = ws.path("a.wav");
    let bad = ws.path("bad.png");
    std::fs::write(&bad, b"not an image").unwrap();
    let probe = FixedProbe::new().with_audio(&audio, 1.0);
    let c = cfg();
    let comp = SceneCompositor::new(&c, &probe, &NoMotionProvider).unwrap();
    let r = skipped(comp.compose_scene(&scene(1, audio, vec![VisualSegment::still("t", &bad)]), None));
    assert!(matches!(r, SkipReason::UnreadableAsset { path, .. } if path == bad));
}

#[test]
fn short_motion_clip_is_freeze_extended() {
    let ws = Workspace::new("motion");
    let audio = ws.path("a.wav");
    let clip = ws.path("clip.mp4");
    let probe = FixedProbe::new()
        .with_audio(&audio, 5.0)
        .with(&clip, MediaInfo::video(3.0, 64, 36));
    let c = cfg();
    let comp = SceneCompositor::new(&c, &probe, &NoMotionProvider).unwrap();

    let s = scene(1, audio, vec![VisualSegment::motion("t", ws.png("1.png"), &clip)]);
    let out = rendered(comp.compose_scene(&s, None));
    let seg = &out.segments[0];
    assert_eq!(seg.asset.kind, AssetKind::Motion);
    assert_eq!(
        seg.plan,
        ClipPlan::FreezeExtend {
            play_secs: 3.0,
            hold_secs: 2.0
        }
    );
    assert_eq!(seg.clip_frames.play_frames, 90);
    assert_eq!(seg.clip_frames.hold_frames, 60);
}

#[test]
fn usable_clip_still_needs_its_still_image() {
    let ws = Workspace::new("nostill");
    let audio = ws.path("a.wav");
    let clip = ws.path("clip.mp4");
    let probe = FixedProbe::new()
        .with_audio(&audio, 5.0)
        .with(&clip, MediaInfo::video(5.0, 64, 36));
    let c = cfg();
    let comp = SceneCompositor::new(&c, &probe, &NoMotionProvider).unwrap();

    let still = ws.path("gone.png");
    let s = scene(1, audio, vec![VisualSegment::motion("t", &still, &clip)]);
    assert_eq!(
        skipped(comp.compose_scene(&s, None)),
        SkipReason::MissingAsset { path: still }
    );
}

#[test]
fn narration_under_one_frame_is_skipped() {
    let ws = Workspace::new("blip");
    let audio = ws.path("a.wav");
    let probe = FixedProbe::new().with_audio(&audio, 0.01);
    let c = cfg();
    let comp = SceneCompositor::new(&c, &probe, &NoMotionProvider).unwrap();

    let s = scene(1, audio.clone(), vec![VisualSegment::still("t", ws.png("1.png"))]);
    assert_eq!(
        skipped(comp.compose_scene(&s, None)),
        SkipReason::ZeroDuration { path: audio }
    );
}

#[test]
fn unprobeable_clip_and_failed_provider_fall_back_to_still() {
    let ws = Workspace::new("fallback");
    let audio = ws.path("a.wav");
    let probe = FixedProbe::new().with_audio(&audio, 2.0);
    let c = cfg();
    let comp = SceneCompositor::new(&c, &probe, &NoMotionProvider).unwrap();

    let mut prompted = VisualSegment::still("a", ws.png("1.png"));
    prompted.motion_prompt = Some("slow push in".to_string());
    let broken = VisualSegment::motion("b", ws.png("2.png"), ws.path("broken.mp4"));
    let out = rendered(comp.compose_scene(&scene(1, audio, vec![prompted, broken]), None));
    assert!(out.segments.iter().all(|s| s.asset.kind == AssetKind::Still));
    assert!(out.segments.iter().all(|s| !s.plan.is_motion()));
}

#[test]
fn provider_clip_is_used_for_prompted_segments() {
    let ws = Workspace::new("provider");
    let audio = ws.path("a.wav");
    let generated = ws.path("generated.mp4");
    let probe = FixedProbe::new()
        .with_audio(&audio, 2.0)
        .with(&generated, MediaInfo::video(6.0, 64, 36));
    let provider = FixedProvider(generated.clone());
    let c = cfg();
    let comp = SceneCompositor::new(&c, &probe, &provider).unwrap();

    let mut seg = VisualSegment::still("a", ws.png("1.png"));
    seg.motion_prompt = Some("pan".to_string());
    let out = rendered(comp.compose_scene(&scene(1, audio, vec![seg]), None));
    assert_eq!(out.segments[0].asset.path, generated);
    assert_eq!(out.segments[0].plan, ClipPlan::Truncate { play_secs: 2.0 });
}

#[test]
fn effect_and_transition_names_degrade() {
    let ws = Workspace::new("names");
    let audio = ws.path("a.wav");
    let probe = FixedProbe::new().with_audio(&audio, 1.0);
    let c = cfg();
    let comp = SceneCompositor::new(&c, &probe, &NoMotionProvider).unwrap();

    let mut s = scene(1, audio, vec![VisualSegment::still("t", ws.png("1.png"))]);
    s.effect = "warp_speed".to_string();
    s.transition = "Crossfade".to_string();
    let out = rendered(comp.compose_scene(&s, None));
    assert_eq!(out.effect, MotionEffect::Static);
    assert_eq!(out.transition, Transition::FadeBlack);
    assert_eq!(out.segments[0].curve.effect(), MotionEffect::Static);
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let probe = FixedProbe::new();
    let c = RenderConfig {
        fps: 0,
        ..RenderConfig::default()
    };
    assert!(SceneCompositor::new(&c, &probe, &NoMotionProvider).is_err());
}
