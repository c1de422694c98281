//! Duration reconciliation between a visual asset and its allotted time.
//!
//! Generated clips rarely match the narration exactly. Short clips play out and then hold their
//! last frame; long clips are cut from the start. Nothing is looped or speed-ramped.

use crate::foundation::core::Fps;
use crate::scene::model::AssetKind;

/// Native and target durations closer than this are treated as equal.
pub const EXACT_TOLERANCE_SECS: f64 = 1e-3;

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
/// How a visual asset fills its target duration.
pub enum ClipPlan {
    /// Still image shown for `hold_secs`.
    Still { hold_secs: f64 },
    /// Clip already matches its target.
    Exact { play_secs: f64 },
    /// Clip plays to its end, then the last frame holds for `hold_secs`.
    FreezeExtend { play_secs: f64, hold_secs: f64 },
    /// Clip is cut after `play_secs`.
    Truncate { play_secs: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
/// A [`ClipPlan`] quantised to whole timeline frames.
pub struct ClipFrames {
    /// Frames read from the clip.
    pub play_frames: u64,
    /// Frames repeating the last decoded frame (or the still image).
    pub hold_frames: u64,
}

impl ClipFrames {
    pub fn total(self) -> u64 {
        self.play_frames + self.hold_frames
    }
}

/// Decide how an asset of `kind` fills `target_secs`.
///
/// `native_secs` is the clip's own length; a motion asset without one cannot be timed and is
/// treated as a still.
pub fn reconcile(kind: AssetKind, target_secs: f64, native_secs: Option<f64>) -> ClipPlan {
    let target = if target_secs.is_finite() {
        target_secs.max(0.0)
    } else {
        0.0
    };
    let native = match (kind, native_secs) {
        (AssetKind::Motion, Some(n)) if n.is_finite() && n > 0.0 => n,
        _ => return ClipPlan::Still { hold_secs: target },
    };

    if (native - target).abs() <= EXACT_TOLERANCE_SECS {
        ClipPlan::Exact { play_secs: target }
    } else if native < target {
        ClipPlan::FreezeExtend {
            play_secs: native,
            hold_secs: target - native,
        }
    } else {
        ClipPlan::Truncate { play_secs: target }
    }
}

impl ClipPlan {
    /// Realised duration; always the reconciled target.
    pub fn duration_secs(self) -> f64 {
        match self {
            Self::Still { hold_secs } => hold_secs,
            Self::Exact { play_secs } | Self::Truncate { play_secs } => play_secs,
            Self::FreezeExtend {
                play_secs,
                hold_secs,
            } => play_secs + hold_secs,
        }
    }

    pub fn is_motion(self) -> bool {
        !matches!(self, Self::Still { .. })
    }

    /// Split a segment of `span_frames` timeline frames into played and held frames.
    pub fn frames(self, fps: Fps, span_frames: u64) -> ClipFrames {
        let play_frames = match self {
            Self::Still { .. } => 0,
            Self::Exact { .. } | Self::Truncate { .. } => span_frames,
            Self::FreezeExtend { play_secs, .. } => {
                fps.secs_to_frames_round(play_secs).min(span_frames)
            }
        };
        ClipFrames {
            play_frames,
            hold_frames: span_frames - play_frames,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/reconcile/plan.rs"]
mod tests;
