//! Named camera-motion effects as closed-form transforms of time.
//!
//! Every effect is evaluable at an arbitrary `t` without carried state, so segments can be
//! prepared independently and frames can be produced in any order.

use rand::Rng as _;

use crate::foundation::core::{Affine, Canvas, Vec2};
use crate::foundation::math::{clamp01, lerp};

/// Ken Burns end scale (start scale is 1.0).
pub const KEN_BURNS_SCALE: f64 = 1.2;
/// Dolly zoom end scale; a steeper ramp than Ken Burns.
pub const DOLLY_SCALE: f64 = 1.5;
/// Pan/tilt travel at full duration, in pixels.
pub const PAN_BUDGET_PX: f64 = 100.0;
/// Crane scale at the zoomed-in end.
pub const CRANE_SCALE: f64 = 1.15;
/// Crane vertical travel at full duration, in pixels.
pub const CRANE_RISE_PX: f64 = 60.0;
/// Orbit rotation at full duration (5 degrees).
pub const ORBIT_SWEEP_RAD: f64 = 5.0 * std::f64::consts::PI / 180.0;
/// Shake offsets are drawn from `[-SHAKE_AMPLITUDE_PX, SHAKE_AMPLITUDE_PX]` on each axis.
pub const SHAKE_AMPLITUDE_PX: f64 = 12.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Closed set of supported motion effects.
pub enum MotionEffect {
    /// Identity; also the landing spot for unknown names.
    Static,
    /// Scale 1.0 → 1.2.
    KenBurnsZoomIn,
    /// Scale 1.2 → 1.0.
    KenBurnsZoomOut,
    /// Horizontal offset 0 → -100 px.
    PanLeft,
    /// Horizontal offset 0 → +100 px.
    PanRight,
    /// Vertical offset 0 → -100 px.
    TiltUp,
    /// Vertical offset 0 → +100 px.
    TiltDown,
    /// Per-sample random offset within ±12 px.
    Shake,
    /// Scale 1.0 → 1.5.
    DollyZoom,
    /// Scale 1.0 → 1.15 while rising 60 px.
    CraneUp,
    /// Scale 1.15 → 1.0 while sinking 60 px.
    CraneDown,
    /// Rotation 0 → 5 degrees.
    Orbit,
}

impl MotionEffect {
    /// Every effect, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Static,
        Self::KenBurnsZoomIn,
        Self::KenBurnsZoomOut,
        Self::PanLeft,
        Self::PanRight,
        Self::TiltUp,
        Self::TiltDown,
        Self::Shake,
        Self::DollyZoom,
        Self::CraneUp,
        Self::CraneDown,
        Self::Orbit,
    ];

    /// Canonical snake_case name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::KenBurnsZoomIn => "ken_burns_zoom_in",
            Self::KenBurnsZoomOut => "ken_burns_zoom_out",
            Self::PanLeft => "pan_left",
            Self::PanRight => "pan_right",
            Self::TiltUp => "tilt_up",
            Self::TiltDown => "tilt_down",
            Self::Shake => "shake",
            Self::DollyZoom => "dolly_zoom",
            Self::CraneUp => "crane_up",
            Self::CraneDown => "crane_down",
            Self::Orbit => "orbit",
        }
    }

    /// Strict lookup; `None` for names outside the closed set.
    pub fn parse(name: &str) -> Option<Self> {
        let key = name.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "static" | "none" => Some(Self::Static),
            "ken_burns_zoom_in" => Some(Self::KenBurnsZoomIn),
            "ken_burns_zoom_out" => Some(Self::KenBurnsZoomOut),
            "pan_left" => Some(Self::PanLeft),
            "pan_right" => Some(Self::PanRight),
            "tilt_up" => Some(Self::TiltUp),
            "tilt_down" => Some(Self::TiltDown),
            "shake" => Some(Self::Shake),
            "dolly_zoom" => Some(Self::DollyZoom),
            "crane_up" => Some(Self::CraneUp),
            "crane_down" => Some(Self::CraneDown),
            "orbit" => Some(Self::Orbit),
            _ => None,
        }
    }

    /// Lenient lookup used by the compositor: unknown names render as [`MotionEffect::Static`].
    pub fn from_name(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            tracing::warn!(effect = name, "unknown motion effect, rendering as static");
            Self::Static
        })
    }

    /// Bind the effect to a frame size and duration.
    pub fn curve(self, width: u32, height: u32, duration_secs: f64) -> MotionCurve {
        MotionCurve {
            effect: self,
            width: f64::from(width.max(1)),
            height: f64::from(height.max(1)),
            duration_secs: if duration_secs.is_finite() {
                duration_secs.max(0.0)
            } else {
                0.0
            },
        }
    }

    fn max_offset_px(self) -> Vec2 {
        match self {
            Self::PanLeft | Self::PanRight => Vec2::new(PAN_BUDGET_PX, 0.0),
            Self::TiltUp | Self::TiltDown => Vec2::new(0.0, PAN_BUDGET_PX),
            Self::CraneUp | Self::CraneDown => Vec2::new(0.0, CRANE_RISE_PX),
            Self::Shake => Vec2::new(SHAKE_AMPLITUDE_PX, SHAKE_AMPLITUDE_PX),
            _ => Vec2::ZERO,
        }
    }

    fn max_rotation_rad(self) -> f64 {
        match self {
            Self::Orbit => ORBIT_SWEEP_RAD,
            _ => 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
/// Frame geometry at one instant, relative to the frame centre.
pub struct MotionTransform {
    /// Uniform scale (1.0 = fitted size).
    pub scale: f64,
    /// Horizontal displacement in pixels; positive moves content right.
    pub offset_x: f64,
    /// Vertical displacement in pixels; positive moves content down.
    pub offset_y: f64,
    /// Clockwise rotation in radians.
    pub rotation: f64,
}

impl MotionTransform {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
        rotation: 0.0,
    };
}

impl MotionTransform {
    /// Cover-fit `content_w` x `content_h` onto `canvas`, grow by `overscan`, then apply this
    /// transform about the canvas centre.
    pub fn to_affine(
        self,
        canvas: Canvas,
        content_w: u32,
        content_h: u32,
        overscan: f64,
    ) -> Affine {
        let cw = f64::from(content_w.max(1));
        let ch = f64::from(content_h.max(1));
        let cover = (f64::from(canvas.width) / cw).max(f64::from(canvas.height) / ch);
        let c = canvas.center();
        Affine::translate(Vec2::new(c.x + self.offset_x, c.y + self.offset_y))
            * Affine::rotate(self.rotation)
            * Affine::scale(self.scale * cover * overscan)
            * Affine::translate(Vec2::new(-cw / 2.0, -ch / 2.0))
    }
}

impl Default for MotionTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// An effect bound to a frame size and duration; evaluate with [`MotionCurve::at`].
pub struct MotionCurve {
    effect: MotionEffect,
    width: f64,
    height: f64,
    duration_secs: f64,
}

impl MotionCurve {
    pub fn effect(&self) -> MotionEffect {
        self.effect
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Normalised position in `[0, 1]`; a zero-length curve stays at its start.
    pub fn progress(&self, t: f64) -> f64 {
        if self.duration_secs <= 0.0 {
            return 0.0;
        }
        clamp01(t / self.duration_secs)
    }

    /// Geometry at `t` seconds into the curve.
    pub fn at(&self, t: f64) -> MotionTransform {
        let p = self.progress(t);
        let id = MotionTransform::IDENTITY;
        match self.effect {
            MotionEffect::Static => id,
            MotionEffect::KenBurnsZoomIn => MotionTransform {
                scale: lerp(1.0, KEN_BURNS_SCALE, p),
                ..id
            },
            MotionEffect::KenBurnsZoomOut => MotionTransform {
                scale: lerp(KEN_BURNS_SCALE, 1.0, p),
                ..id
            },
            MotionEffect::PanLeft => MotionTransform {
                offset_x: -PAN_BUDGET_PX * p,
                ..id
            },
            MotionEffect::PanRight => MotionTransform {
                offset_x: PAN_BUDGET_PX * p,
                ..id
            },
            MotionEffect::TiltUp => MotionTransform {
                offset_y: -PAN_BUDGET_PX * p,
                ..id
            },
            MotionEffect::TiltDown => MotionTransform {
                offset_y: PAN_BUDGET_PX * p,
                ..id
            },
            MotionEffect::Shake => {
                let mut rng = rand::thread_rng();
                MotionTransform {
                    offset_x: rng.gen_range(-SHAKE_AMPLITUDE_PX..=SHAKE_AMPLITUDE_PX),
                    offset_y: rng.gen_range(-SHAKE_AMPLITUDE_PX..=SHAKE_AMPLITUDE_PX),
                    ..id
                }
            }
            MotionEffect::DollyZoom => MotionTransform {
                scale: lerp(1.0, DOLLY_SCALE, p),
                ..id
            },
            MotionEffect::CraneUp => MotionTransform {
                scale: lerp(1.0, CRANE_SCALE, p),
                offset_y: -CRANE_RISE_PX * p,
                ..id
            },
            MotionEffect::CraneDown => MotionTransform {
                scale: lerp(CRANE_SCALE, 1.0, p),
                offset_y: CRANE_RISE_PX * p,
                ..id
            },
            MotionEffect::Orbit => MotionTransform {
                rotation: ORBIT_SWEEP_RAD * p,
                ..id
            },
        }
    }

    /// Extra scale applied on top of cover-fit so the effect's largest excursion never
    /// uncovers the frame edge.
    pub fn overscan(&self) -> f64 {
        let off = self.effect.max_offset_px();
        let sx = 1.0 + 2.0 * off.x / self.width;
        let sy = 1.0 + 2.0 * off.y / self.height;
        let rot = self.effect.max_rotation_rad();
        let aspect = (self.width / self.height).max(self.height / self.width);
        let sr = rot.cos() + rot.sin() * aspect;
        sx.max(sy) * sr.max(1.0)
    }

    /// Affine mapping content pixels (`content_w` x `content_h`, origin top-left) onto `canvas`
    /// at time `t`: cover-fit plus overscan, then the effect's scale/rotation about the canvas
    /// centre, then its offset.
    pub fn affine_at(&self, t: f64, canvas: Canvas, content_w: u32, content_h: u32) -> Affine {
        self.at(t).to_affine(canvas, content_w, content_h, self.overscan())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/motion.rs"]
mod tests;
