use crate::foundation::math::clamp01;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
/// How a scene hands over to the next one.
pub enum Transition {
    /// Hard cut.
    Cut,
    /// Dip through black, centred on the boundary.
    FadeBlack,
}

impl Transition {
    /// Strict lookup; `None` for unknown names.
    pub fn parse(name: &str) -> Option<Self> {
        let key = name.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "" | "cut" | "none" | "hard_cut" => Some(Self::Cut),
            "fade" | "fade_black" | "fade_to_black" | "dip_to_black" | "crossfade"
            | "dissolve" => Some(Self::FadeBlack),
            _ => None,
        }
    }

    /// Lenient lookup: unknown names fall back to a cut.
    pub fn from_name(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            tracing::warn!(transition = name, "unknown transition, using cut");
            Self::Cut
        })
    }
}

/// Black-overlay opacity for a frame at `local_secs` into a scene lasting `scene_secs`.
///
/// `incoming` is the transition joining the previous scene to this one, `outgoing` the one
/// joining this scene to the next. Each side spends half of `transition_secs` inside this
/// scene, capped at half the scene so the two sides never overlap.
pub fn dip_opacity(
    local_secs: f64,
    scene_secs: f64,
    incoming: Transition,
    outgoing: Transition,
    transition_secs: f64,
) -> f32 {
    if scene_secs <= 0.0 || transition_secs <= 0.0 {
        return 0.0;
    }
    let half = (transition_secs / 2.0).min(scene_secs / 2.0);
    if half <= 0.0 {
        return 0.0;
    }
    let mut dark = 0.0f64;
    if incoming == Transition::FadeBlack && local_secs < half {
        dark = dark.max(1.0 - clamp01(local_secs / half));
    }
    let remaining = scene_secs - local_secs;
    if outgoing == Transition::FadeBlack && remaining <= half {
        dark = dark.max(1.0 - clamp01(remaining / half));
    }
    dark as f32
}

#[cfg(test)]
#[path = "../../tests/unit/effects/transitions.rs"]
mod tests;
