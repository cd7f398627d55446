use std::f64::consts::TAU;

use crate::effects::effect::Effect;
use crate::foundation::core::{Affine, Canvas, Point, Rect, Vec2};

const ZOOM_DELTA: f64 = 0.5;
const PAN_ZOOM: f64 = 1.2;
const PAN_FRACTION: f64 = 0.2;
const FADE_FLOOR: f64 = 0.1;

/// How the source image is drawn onto one frame.
///
/// `rect` is the effect-independent aspect-fit rectangle; the effect layers a zoom/rotation about
/// `center` and a screen-space `offset` on top of it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Aspect-fit destination rectangle in canvas pixels.
    pub rect: Rect,
    /// Pivot for scale and rotation (the canvas center).
    pub center: Point,
    /// Uniform scale about `center`.
    pub scale: f64,
    /// Rotation about `center`, radians.
    pub rotation: f64,
    /// Translation applied in canvas space after scale/rotation.
    pub offset: Vec2,
    /// Opacity multiplier in `[0, 1]`.
    pub opacity: f64,
}

impl Placement {
    /// The plain aspect-fit placement: no zoom, rotation or pan, fully opaque.
    pub fn identity(canvas: Canvas, image_w: u32, image_h: u32) -> Self {
        Self {
            rect: aspect_fit_rect(canvas, image_w, image_h),
            center: canvas.center(),
            scale: 1.0,
            rotation: 0.0,
            offset: Vec2::ZERO,
            opacity: 1.0,
        }
    }

    /// Canvas-space transform: `T(offset) * T(c) * R * S * T(-c)`.
    pub fn canvas_transform(&self) -> Affine {
        let c = self.center.to_vec2();
        Affine::translate(self.offset)
            * Affine::translate(c)
            * Affine::rotate(self.rotation)
            * Affine::scale(self.scale)
            * Affine::translate(-c)
    }

    /// Map image pixel coordinates (`0..image_w`, `0..image_h`) to canvas pixels.
    pub fn image_transform(&self, image_w: u32, image_h: u32) -> Affine {
        let sx = self.rect.width() / f64::from(image_w.max(1));
        let sy = self.rect.height() / f64::from(image_h.max(1));
        self.canvas_transform()
            * Affine::translate(self.rect.origin().to_vec2())
            * Affine::scale_non_uniform(sx, sy)
    }
}

/// Largest centered rectangle with the image's aspect ratio that fits inside `canvas`.
pub fn aspect_fit_rect(canvas: Canvas, image_w: u32, image_h: u32) -> Rect {
    let cw = f64::from(canvas.width);
    let ch = f64::from(canvas.height);
    let img_aspect = f64::from(image_w) / f64::from(image_h.max(1));
    let canvas_aspect = cw / ch;

    let (draw_w, draw_h) = if img_aspect > canvas_aspect {
        (cw, cw / img_aspect)
    } else {
        (ch * img_aspect, ch)
    };
    let x = (cw - draw_w) / 2.0;
    let y = (ch - draw_h) / 2.0;
    Rect::new(x, y, x + draw_w, y + draw_h)
}

/// Compute the placement of the source image for `effect` at `progress`.
///
/// `progress` is clamped to `[0, 1]`.
pub fn compute_placement(
    effect: Effect,
    progress: f64,
    canvas: Canvas,
    image_w: u32,
    image_h: u32,
) -> Placement {
    let p = progress.clamp(0.0, 1.0);
    let cw = f64::from(canvas.width);
    let ch = f64::from(canvas.height);
    let base = Placement::identity(canvas, image_w, image_h);

    match effect {
        Effect::ZoomIn => Placement {
            scale: 1.0 + ZOOM_DELTA * p,
            ..base
        },
        Effect::ZoomOut => Placement {
            scale: 1.0 + ZOOM_DELTA - ZOOM_DELTA * p,
            ..base
        },
        Effect::PanLeft => Placement {
            scale: PAN_ZOOM,
            offset: Vec2::new(-PAN_FRACTION * p * cw, 0.0),
            ..base
        },
        Effect::PanRight => Placement {
            scale: PAN_ZOOM,
            offset: Vec2::new(PAN_FRACTION * p * cw, 0.0),
            ..base
        },
        Effect::PanUp => Placement {
            scale: PAN_ZOOM,
            offset: Vec2::new(0.0, -PAN_FRACTION * p * ch),
            ..base
        },
        Effect::PanDown => Placement {
            scale: PAN_ZOOM,
            offset: Vec2::new(0.0, PAN_FRACTION * p * ch),
            ..base
        },
        Effect::Rotate => Placement {
            rotation: TAU * p,
            ..base
        },
        Effect::Fade => Placement {
            opacity: fade_opacity(p),
            ..base
        },
    }
}

/// Triangle ramp `0 -> 1 -> 0` over `[0, 1]`, floored at 0.1.
pub fn fade_opacity(progress: f64) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    let ramp = if p < 0.5 { 2.0 * p } else { 2.0 * (1.0 - p) };
    ramp.max(FADE_FLOOR)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/placement.rs"]
mod tests;
