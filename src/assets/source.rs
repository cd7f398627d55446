use std::sync::Arc;

use crate::foundation::error::{StillmotionError, StillmotionResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// A decoded still image, stored as premultiplied RGBA8.
///
/// Pixel data lives behind an `Arc`, so clones are cheap and parallel render workers can share one
/// image read-only.
#[derive(Clone, Debug)]
pub struct SourceImage {
    width: u32,
    height: u32,
    rgba8_premul: Arc<Vec<u8>>,
}

impl SourceImage {
    /// Build from straight-alpha RGBA8 bytes (row-major, tightly packed).
    pub fn from_rgba8(width: u32, height: u32, mut rgba8: Vec<u8>) -> StillmotionResult<Self> {
        check_dims(width, height, rgba8.len())?;
        premultiply_rgba8_in_place(&mut rgba8);
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8),
        })
    }

    /// A uniformly colored image (straight-alpha `rgba`).
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> StillmotionResult<Self> {
        let px = (width as usize).saturating_mul(height as usize);
        Self::from_rgba8(width, height, rgba.repeat(px))
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied RGBA8 bytes.
    pub fn rgba8_premul(&self) -> &[u8] {
        &self.rgba8_premul
    }

    /// Re-check the invariants the renderer relies on.
    pub fn validate(&self) -> StillmotionResult<()> {
        check_dims(self.width, self.height, self.rgba8_premul.len())
    }
}

fn check_dims(width: u32, height: u32, len: usize) -> StillmotionResult<()> {
    if width == 0 || height == 0 {
        return Err(StillmotionError::image_decode(format!(
            "source image has zero area ({width}x{height})"
        )));
    }
    // vello_cpu pixmaps are addressed with u16 dimensions.
    if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
        return Err(StillmotionError::image_decode(format!(
            "source image {width}x{height} exceeds the {}px limit",
            u16::MAX
        )));
    }
    let expected = (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(4);
    if len != expected {
        return Err(StillmotionError::image_decode(format!(
            "source image byte length {len} does not match {width}x{height} rgba8"
        )));
    }
    Ok(())
}
