use crate::foundation::error::{StillmotionError, StillmotionResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Absolute 0-based frame index within one render.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Half-open frame range `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRange {
    /// Inclusive range start.
    pub start: FrameIndex,
    /// Exclusive range end.
    pub end: FrameIndex, // exclusive
}

impl FrameRange {
    /// Create a validated range with `start <= end`.
    pub fn new(start: FrameIndex, end: FrameIndex) -> StillmotionResult<Self> {
        if start.0 > end.0 {
            return Err(StillmotionError::invalid_config(
                "FrameRange start must be <= end",
            ));
        }
        Ok(Self { start, end })
    }

    /// Number of frames contained in the range.
    pub fn len_frames(self) -> u64 {
        self.end.0.saturating_sub(self.start.0)
    }

    /// Return `true` when the range has no frames.
    pub fn is_empty(self) -> bool {
        self.start.0 == self.end.0
    }

    /// Return `true` when `f` is inside `[start, end)`.
    pub fn contains(self, f: FrameIndex) -> bool {
        self.start.0 <= f.0 && f.0 < self.end.0
    }

    /// Split the range into consecutive sub-ranges of at most `chunk` frames.
    pub fn chunks(self, chunk: u64) -> impl Iterator<Item = FrameRange> {
        let chunk = chunk.max(1);
        let end = self.end.0;
        (self.start.0..end).step_by(chunk as usize).map(move |s| FrameRange {
            start: FrameIndex(s),
            end: FrameIndex((s + chunk).min(end)),
        })
    }
}

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32, // must be > 0
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> StillmotionResult<Self> {
        if den == 0 {
            return Err(StillmotionError::invalid_config("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(StillmotionError::invalid_config("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Integer frame rate (`num/den` with `den == 1`).
    pub const fn whole(num: u32) -> Self {
        Self { num, den: 1 }
    }

    /// Number of frames covering `secs` whole seconds.
    ///
    /// Fails unless the product is an exact frame count.
    pub fn frames_for_secs(self, secs: u32) -> StillmotionResult<u64> {
        if self.den == 0 {
            return Err(StillmotionError::invalid_config("Fps den must be > 0"));
        }
        let scaled = u64::from(secs) * u64::from(self.num);
        if !scaled.is_multiple_of(u64::from(self.den)) {
            return Err(StillmotionError::invalid_config(format!(
                "{secs}s at {}/{} fps is not a whole number of frames",
                self.num, self.den
            )));
        }
        Ok(scaled / u64::from(self.den))
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Canvas center in pixel coordinates.
    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    /// Byte length of one tightly packed RGBA8 frame.
    pub fn rgba8_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }

    /// Validate the canvas for rasterization and yuv420p encoding.
    pub fn validate(self) -> StillmotionResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(StillmotionError::invalid_config(
                "canvas width/height must be non-zero",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(StillmotionError::invalid_config(
                "canvas width/height must be even (required for yuv420p output)",
            ));
        }
        if self.width > u32::from(u16::MAX) || self.height > u32::from(u16::MAX) {
            return Err(StillmotionError::invalid_config(
                "canvas width/height must fit in u16",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
