use super::*;
use crate::encode::ffmpeg::is_ffmpeg_on_path;

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("storyreel_media_{tag}_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn lavfi(args: &[&str], out: &Path) -> bool {
    Command::new("ffmpeg")
        .args(["-y", "-v", "error"])
        .args(args)
        .arg(out)
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[test]
fn audio_pcm_reports_frames_and_duration() {
    let pcm = AudioPcm {
        sample_rate: 4,
        channels: 2,
        interleaved_f32: vec![0.0; 16],
    };
    assert_eq!(pcm.frames(), 8);
    assert!((pcm.duration_secs() - 2.0).abs() < 1e-12);
    assert_eq!(AudioPcm::default().duration_secs(), 0.0);
}

#[test]
fn missing_inputs_are_missing_assets() {
    let p = Path::new("/definitely/not/here/clip.mp4");
    assert!(matches!(
        decode_audio_f32_stereo(p, MIX_SAMPLE_RATE),
        Err(ReelError::MissingAsset { .. })
    ));
    let canvas = Canvas {
        width: 16,
        height: 16,
    };
    let fps = Fps::new(30, 1).unwrap();
    assert!(matches!(
        VideoFrameStream::open(p, canvas, fps, None),
        Err(ReelError::MissingAsset { .. })
    ));
}

#[test]
fn decode_sine_to_stereo_pcm() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let dir = scratch_dir("sine");
    let wav = dir.join("tone.wav");
    assert!(lavfi(
        &["-f", "lavfi", "-i", "sine=frequency=440:duration=1"],
        &wav
    ));
    let pcm = decode_audio_f32_stereo(&wav, MIX_SAMPLE_RATE).unwrap();
    assert_eq!(pcm.channels, 2);
    assert!((pcm.duration_secs() - 1.0).abs() < 0.05);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn stream_yields_canvas_sized_frames_and_honours_cap() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let dir = scratch_dir("stream");
    let clip = dir.join("clip.mp4");
    assert!(lavfi(
        &[
            "-f",
            "lavfi",
            "-i",
            "testsrc=size=64x48:rate=10:duration=1",
            "-pix_fmt",
            "yuv420p",
        ],
        &clip
    ));
    let canvas = Canvas {
        width: 32,
        height: 32,
    };
    let fps = Fps::new(10, 1).unwrap();

    let mut s = VideoFrameStream::open(&clip, canvas, fps, Some(4)).unwrap();
    let mut n = 0;
    while let Some(frame) = s.next_frame().unwrap() {
        assert_eq!(frame.len(), canvas.byte_len());
        n += 1;
    }
    assert_eq!(n, 4);
    assert_eq!(s.frames_read(), 4);
    assert!(s.next_frame().unwrap().is_none());
    drop(s);
    let _ = std::fs::remove_dir_all(&dir);
}
