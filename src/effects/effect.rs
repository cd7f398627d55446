use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{StillmotionError, StillmotionResult};

/// Closed set of motion effects applied to the still image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Effect {
    /// Scale grows from 1.0 to 1.5.
    ZoomIn,
    /// Scale shrinks from 1.5 to 1.0.
    ZoomOut,
    /// Fixed 1.2 zoom, drifting left by 20% of the canvas width.
    PanLeft,
    /// Fixed 1.2 zoom, drifting right by 20% of the canvas width.
    PanRight,
    /// Fixed 1.2 zoom, drifting up by 20% of the canvas height.
    PanUp,
    /// Fixed 1.2 zoom, drifting down by 20% of the canvas height.
    PanDown,
    /// One full turn about the canvas center.
    Rotate,
    /// Opacity ramps up then back down, never below 0.1.
    Fade,
}

impl Effect {
    /// Every effect, in menu order.
    pub const ALL: [Effect; 8] = [
        Effect::ZoomIn,
        Effect::ZoomOut,
        Effect::PanLeft,
        Effect::PanRight,
        Effect::PanUp,
        Effect::PanDown,
        Effect::Rotate,
        Effect::Fade,
    ];

    /// Stable kebab-case name (`"zoom-in"`, `"pan-left"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Self::ZoomIn => "zoom-in",
            Self::ZoomOut => "zoom-out",
            Self::PanLeft => "pan-left",
            Self::PanRight => "pan-right",
            Self::PanUp => "pan-up",
            Self::PanDown => "pan-down",
            Self::Rotate => "rotate",
            Self::Fade => "fade",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Effect {
    type Err = StillmotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_effect(s)
    }
}

/// Parse an exact kebab-case effect name, the same names serde accepts. Anything else is an
/// [`StillmotionError::InvalidConfig`].
pub fn parse_effect(name: &str) -> StillmotionResult<Effect> {
    Effect::ALL
        .into_iter()
        .find(|e| e.name() == name)
        .ok_or_else(|| {
            let known: Vec<&str> = Effect::ALL.iter().map(|e| e.name()).collect();
            StillmotionError::invalid_config(format!(
                "unknown effect '{name}' (expected one of: {})",
                known.join(", ")
            ))
        })
}

#[cfg(test)]
#[path = "../../tests/unit/effects/effect.rs"]
mod tests;
