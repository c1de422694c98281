use super::*;

fn board_json() -> &'static str {
    r#"
{
  "title": "Demo",
  "output_dir": "out",
  "scenes": [
    {
      "number": 2,
      "audio": "audio/s2.wav",
      "effect": "pan_right",
      "segments": [{ "text": "b", "image": "img/s2.png", "clip": "clips/s2.mp4" }]
    },
    {
      "number": 1,
      "audio": "/abs/s1.wav",
      "segments": [{ "text": "a", "image": "img/s1.png" }]
    }
  ]
}
"#
}

#[test]
fn json_defaults_and_ordering() {
    let board: Storyboard = serde_json::from_str(board_json()).unwrap();
    board.validate().unwrap();
    assert_eq!(board.output_name, "video.mp4");
    let ordered = board.ordered_scenes();
    assert_eq!(ordered[0].number, 1);
    assert_eq!(ordered[0].effect, "static");
    assert_eq!(ordered[0].transition, "cut");
    assert_eq!(ordered[1].effect, "pan_right");
}

#[test]
fn relative_paths_rebase_and_absolute_stay() {
    let mut board: Storyboard = serde_json::from_str(board_json()).unwrap();
    board.resolve_relative_to(Path::new("/work"));
    assert_eq!(board.output_path(), PathBuf::from("/work/out/video.mp4"));
    assert_eq!(board.scenes[0].audio, PathBuf::from("/work/audio/s2.wav"));
    assert_eq!(
        board.scenes[0].segments[0].clip,
        Some(PathBuf::from("/work/clips/s2.mp4"))
    );
    assert_eq!(board.scenes[1].audio, PathBuf::from("/abs/s1.wav"));
}

#[test]
fn duplicate_numbers_and_empty_scenes_are_rejected() {
    let mut board: Storyboard = serde_json::from_str(board_json()).unwrap();
    board.scenes[1].number = 2;
    assert!(board.validate().is_err());

    let mut board: Storyboard = serde_json::from_str(board_json()).unwrap();
    board.scenes[0].segments.clear();
    assert!(board.validate().is_err());
}

#[test]
fn segment_constructors() {
    let s = VisualSegment::motion("hi", "a.png", "a.mp4");
    assert_eq!(s.clip.as_deref(), Some(Path::new("a.mp4")));
    assert!(s.motion_prompt.is_none());
    let r = AssetRef::motion("a.mp4", 4.0);
    assert_eq!(r.kind, AssetKind::Motion);
    assert_eq!(r.native_duration, Some(4.0));
    assert_eq!(AssetRef::still("a.png").native_duration, None);
}
