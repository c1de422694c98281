use super::*;

#[test]
fn defaults_are_valid_landscape_1080p() {
    let cfg = RenderConfig::default();
    cfg.validate().unwrap();
    assert_eq!(
        cfg.canvas(),
        Canvas {
            width: 1920,
            height: 1080
        }
    );
    assert_eq!(cfg.frame_rate().unwrap().as_f64(), 30.0);
}

#[test]
fn json_fills_missing_fields_with_defaults() {
    let cfg = RenderConfig::from_json_str(
        r#"{ "fps": 24, "aspect": "9:16", "quality": "high", "subtitles": true }"#,
    )
    .unwrap();
    assert_eq!(cfg.fps, 24);
    assert_eq!(cfg.aspect, AspectRatio::Portrait);
    assert_eq!(cfg.canvas().height, 1920);
    assert_eq!(cfg.quality.crf(), 18);
    assert!(cfg.subtitles);
    assert_eq!(cfg.title_secs, 3.0);
}

#[test]
fn unknown_fields_are_rejected() {
    assert!(RenderConfig::from_json_str(r#"{ "frame_rate": 24 }"#).is_err());
}

#[test]
fn resolution_override_wins_and_must_be_even() {
    let mut cfg = RenderConfig {
        resolution: Some(Canvas {
            width: 640,
            height: 360,
        }),
        ..RenderConfig::default()
    };
    assert_eq!(cfg.canvas().width, 640);
    cfg.validate().unwrap();

    cfg.resolution = Some(Canvas {
        width: 641,
        height: 360,
    });
    assert!(cfg.validate().is_err());
}

#[test]
fn validation_catches_bad_values() {
    let bad = [
        RenderConfig {
            fps: 0,
            ..RenderConfig::default()
        },
        RenderConfig {
            title_fade_secs: 2.0,
            ..RenderConfig::default()
        },
        RenderConfig {
            transition_secs: -1.0,
            ..RenderConfig::default()
        },
        RenderConfig {
            concurrency: Some(0),
            ..RenderConfig::default()
        },
        RenderConfig {
            subtitle_font_px: 0.0,
            ..RenderConfig::default()
        },
    ];
    for cfg in bad {
        assert!(cfg.validate().is_err(), "{cfg:?}");
    }
}

#[test]
fn presets_parse_from_cli_strings() {
    assert_eq!("Square".parse::<AspectRatio>().unwrap(), AspectRatio::Square);
    assert_eq!("draft".parse::<QualityPreset>().unwrap(), QualityPreset::Draft);
    assert_eq!("Low".parse::<QualityPreset>().unwrap(), QualityPreset::Draft);
    assert_eq!(" medium ".parse::<QualityPreset>().unwrap(), QualityPreset::Standard);
    assert!("cinema".parse::<QualityPreset>().is_err());
    assert!("cinema".parse::<AspectRatio>().is_err());
    assert_eq!(QualityPreset::Draft.x264_preset(), "ultrafast");
}
