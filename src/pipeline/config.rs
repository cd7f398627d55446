use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::effects::effect::Effect;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{StillmotionError, StillmotionResult};

/// Output frame rate of every product render.
pub const FRAME_RATE: u32 = 30;
/// Output width of every product render.
pub const OUTPUT_WIDTH: u32 = 1280;
/// Output height of every product render.
pub const OUTPUT_HEIGHT: u32 = 720;
/// Shortest accepted duration in seconds.
pub const MIN_DURATION_SECS: u32 = 1;
/// Longest accepted duration in seconds.
pub const MAX_DURATION_SECS: u32 = 10;

/// User-selected render request.
///
/// JSON form: `{"duration_secs": 3, "effect": "zoom-in"}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    /// Video length in whole seconds, `1..=10`.
    pub duration_secs: u32,
    /// Motion effect.
    pub effect: Effect,
}

impl RenderConfig {
    /// Build and validate a config.
    pub fn new(duration_secs: u32, effect: Effect) -> StillmotionResult<Self> {
        let cfg = Self {
            duration_secs,
            effect,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a config from JSON text and validate it.
    pub fn from_json(s: &str) -> StillmotionResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| StillmotionError::invalid_config(format!("parse render config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a config from a JSON file on disk and validate it.
    pub fn from_path(path: impl AsRef<Path>) -> StillmotionResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            StillmotionError::invalid_config(format!(
                "open render config JSON '{}': {e}",
                path.display()
            ))
        })?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            StillmotionError::invalid_config(format!(
                "parse render config JSON '{}': {e}",
                path.display()
            ))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the duration range.
    pub fn validate(&self) -> StillmotionResult<()> {
        if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&self.duration_secs) {
            return Err(StillmotionError::invalid_config(format!(
                "duration_secs must be within {MIN_DURATION_SECS}..={MAX_DURATION_SECS}, got {}",
                self.duration_secs
            )));
        }
        Ok(())
    }
}

/// Frame rate and canvas of one render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OutputSpec {
    /// Output frame rate.
    pub fps: Fps,
    /// Output canvas.
    pub canvas: Canvas,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            fps: Fps::whole(FRAME_RATE),
            canvas: Canvas {
                width: OUTPUT_WIDTH,
                height: OUTPUT_HEIGHT,
            },
        }
    }
}

impl OutputSpec {
    /// Check that frame rate and canvas can be rendered and encoded.
    pub fn validate(&self) -> StillmotionResult<()> {
        Fps::new(self.fps.num, self.fps.den)?;
        self.canvas.validate()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/config.rs"]
mod tests;
