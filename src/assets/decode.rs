use std::path::Path;

use anyhow::Context;

use crate::assets::source::SourceImage;
use crate::foundation::error::{StillmotionError, StillmotionResult};

impl SourceImage {
    /// Decode encoded image bytes (PNG, JPEG, ...) into a [`SourceImage`].
    pub fn decode(bytes: &[u8]) -> StillmotionResult<Self> {
        decode_image(bytes)
    }

    /// Read and decode an image file.
    pub fn open(path: impl AsRef<Path>) -> StillmotionResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("read image '{}'", path.display()))
            .map_err(|e| StillmotionError::image_decode(format!("{e:#}")))?;
        decode_image(&bytes)
    }
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> StillmotionResult<SourceImage> {
    let dyn_img = image::load_from_memory(bytes)
        .context("decode image from memory")
        .map_err(|e| StillmotionError::image_decode(format!("{e:#}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    SourceImage::from_rgba8(width, height, rgba.into_raw())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
