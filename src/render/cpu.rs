use std::sync::Arc;

use crate::assets::source::SourceImage;
use crate::effects::effect::Effect;
use crate::effects::placement::{Placement, compute_placement};
use crate::foundation::core::{Affine, Canvas};
use crate::foundation::error::{StillmotionError, StillmotionResult};
use crate::render::backend::FrameRGBA;

const BACKGROUND_RGBA: [u8; 4] = [0, 0, 0, 255];

/// Rasterizes frames of one source image onto a fixed-size canvas.
///
/// A renderer owns its `vello_cpu` context and target pixmap and reuses them across frames. It is
/// meant to be owned by a single render (or a single worker thread); nothing inside is shared.
pub struct FrameRenderer {
    canvas: Canvas,
    image_w: u32,
    image_h: u32,
    paint: vello_cpu::Image,

    ctx: Option<vello_cpu::RenderContext>,
    target: Option<vello_cpu::Pixmap>,
}

impl FrameRenderer {
    /// Prepare a renderer for `image` on `canvas`.
    pub fn new(image: &SourceImage, canvas: Canvas) -> StillmotionResult<Self> {
        image.validate()?;
        canvas.validate()?;
        let pixmap = pixmap_from_premul_bytes(image.rgba8_premul(), image.width(), image.height())?;
        Ok(Self {
            canvas,
            image_w: image.width(),
            image_h: image.height(),
            paint: vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
            ctx: None,
            target: None,
        })
    }

    /// Compute the placement for `effect` at `progress` and render it.
    pub fn render_effect(&mut self, effect: Effect, progress: f64) -> StillmotionResult<FrameRGBA> {
        let placement = compute_placement(effect, progress, self.canvas, self.image_w, self.image_h);
        self.render_frame(&placement)
    }

    /// Render one frame: opaque black background, then the image under `placement`.
    pub fn render_frame(&mut self, placement: &Placement) -> StillmotionResult<FrameRGBA> {
        let (w, h) = canvas_u16(self.canvas)?;
        let mut target = match self.target.take() {
            Some(pm) if pm.width() == w && pm.height() == h => pm,
            _ => vello_cpu::Pixmap::new(w, h),
        };
        clear_pixmap(&mut target, BACKGROUND_RGBA);

        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            _ => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();

        ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            BACKGROUND_RGBA[0],
            BACKGROUND_RGBA[1],
            BACKGROUND_RGBA[2],
            BACKGROUND_RGBA[3],
        ));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, f64::from(w), f64::from(h)));

        let opacity = placement.opacity.clamp(0.0, 1.0) as f32;
        ctx.set_transform(affine_to_cpu(
            placement.image_transform(self.image_w, self.image_h),
        ));
        ctx.set_paint(self.paint.clone());
        if opacity < 1.0 {
            ctx.push_opacity_layer(opacity);
        }
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.image_w),
            f64::from(self.image_h),
        ));
        if opacity < 1.0 {
            ctx.pop_layer();
        }

        ctx.flush();
        ctx.render_to_pixmap(&mut target);

        let data = target.data_as_u8_slice().to_vec();
        self.ctx = Some(ctx);
        self.target = Some(target);

        if data.len() != self.canvas.rgba8_len() {
            return Err(StillmotionError::render(format!(
                "rendered {} bytes, expected {} for {}x{}",
                data.len(),
                self.canvas.rgba8_len(),
                self.canvas.width,
                self.canvas.height
            )));
        }
        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data,
        })
    }
}

/// One-shot render of `image` under `placement` with a fresh renderer.
pub fn render_frame(
    image: &SourceImage,
    placement: &Placement,
    canvas: Canvas,
) -> StillmotionResult<FrameRGBA> {
    FrameRenderer::new(image, canvas)?.render_frame(placement)
}

fn canvas_u16(canvas: Canvas) -> StillmotionResult<(u16, u16)> {
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| StillmotionError::render("canvas width exceeds u16"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| StillmotionError::render("canvas height exceeds u16"))?;
    Ok((w, h))
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    for px in pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> StillmotionResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| StillmotionError::image_decode("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| StillmotionError::image_decode("image height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(StillmotionError::image_decode("image byte len mismatch"));
    }
    // Pixmap stores PremulRgba8; our bytes are already premultiplied.
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
