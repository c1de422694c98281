use crate::foundation::core::{FrameIndex, FrameRange, Fps};

/// Convert consecutive durations into contiguous frame ranges starting at `start_secs`.
///
/// Boundaries are rounded from the cumulative time rather than per-duration, so a long
/// timeline never drifts and the last range ends at `round((start + sum) * fps)`.
pub fn frame_spans(start_secs: f64, durations: &[f64], fps: Fps) -> Vec<FrameRange> {
    let mut out = Vec::with_capacity(durations.len());
    let mut t = start_secs.max(0.0);
    let mut start = fps.secs_to_frames_round(t);
    for d in durations {
        t += d.max(0.0);
        let end = fps.secs_to_frames_round(t).max(start);
        out.push(FrameRange {
            start: FrameIndex(start),
            end: FrameIndex(end),
        });
        start = end;
    }
    out
}

/// Index of the range containing `f`, assuming `spans` are sorted and contiguous.
pub fn span_index(spans: &[FrameRange], f: FrameIndex) -> Option<usize> {
    let idx = spans.partition_point(|r| r.end.0 <= f.0);
    spans.get(idx).filter(|r| r.contains(f)).map(|_| idx)
}

#[cfg(test)]
#[path = "../../tests/unit/timing/frames.rs"]
mod tests;
