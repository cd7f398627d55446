use super::*;

const SMALL: Canvas = Canvas {
    width: 64,
    height: 36,
};

fn red_3x3() -> SourceImage {
    SourceImage::solid(3, 3, [255, 0, 0, 255]).unwrap()
}

#[test]
fn frame_has_canvas_size_and_is_opaque() {
    let mut r = FrameRenderer::new(&red_3x3(), SMALL).unwrap();
    let f = r.render_effect(Effect::ZoomIn, 0.0).unwrap();
    assert_eq!(f.width, 64);
    assert_eq!(f.height, 36);
    assert_eq!(f.data.len(), SMALL.rgba8_len());
    assert!(f.data.chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn square_image_is_centered_with_black_pillarbox() {
    let mut r = FrameRenderer::new(&red_3x3(), SMALL).unwrap();
    let f = r.render_effect(Effect::ZoomIn, 0.0).unwrap();

    assert_eq!(f.pixel(32, 18), Some([255, 0, 0, 255]));
    assert_eq!(f.pixel(0, 0), Some([0, 0, 0, 255]));
    assert_eq!(f.pixel(63, 35), Some([0, 0, 0, 255]));
    assert_eq!(f.pixel(5, 18), Some([0, 0, 0, 255]));
    assert_eq!(f.pixel(58, 18), Some([0, 0, 0, 255]));
}

#[test]
fn zoom_in_grows_the_image_over_the_pillarbox() {
    let mut r = FrameRenderer::new(&red_3x3(), SMALL).unwrap();
    let start = r.render_effect(Effect::ZoomIn, 0.0).unwrap();
    let end = r.render_effect(Effect::ZoomIn, 0.9).unwrap();

    // Image spans x in [14, 50) at scale 1 and about [5.9, 58.1) at scale 1.45.
    assert_eq!(start.pixel(10, 18), Some([0, 0, 0, 255]));
    assert_eq!(end.pixel(10, 18), Some([255, 0, 0, 255]));
}

#[test]
fn fade_starts_dim() {
    let mut r = FrameRenderer::new(&red_3x3(), SMALL).unwrap();
    let dim = r.render_effect(Effect::Fade, 0.0).unwrap();
    let full = r.render_effect(Effect::Fade, 0.5).unwrap();

    let [red, g, b, a] = dim.pixel(32, 18).unwrap();
    assert!((20..=32).contains(&red), "red={red}");
    assert_eq!((g, b, a), (0, 0, 255));
    assert_eq!(full.pixel(32, 18), Some([255, 0, 0, 255]));
}

#[test]
fn pan_right_moves_content_right() {
    let mut r = FrameRenderer::new(&red_3x3(), SMALL).unwrap();
    let f = r.render_effect(Effect::PanRight, 0.9).unwrap();

    // Scale 1.2 about center gives [10.4, 53.6); the pan adds 0.18 * 64 = 11.52.
    assert_eq!(f.pixel(12, 18), Some([0, 0, 0, 255]));
    assert_eq!(f.pixel(60, 18), Some([255, 0, 0, 255]));
}

#[test]
fn reused_renderer_matches_fresh_renderer() {
    let image = red_3x3();
    let mut reused = FrameRenderer::new(&image, SMALL).unwrap();
    let _ = reused.render_effect(Effect::Rotate, 0.3).unwrap();
    let a = reused.render_effect(Effect::PanUp, 0.4).unwrap();

    let placement = compute_placement(Effect::PanUp, 0.4, SMALL, 3, 3);
    let b = render_frame(&image, &placement, SMALL).unwrap();
    assert_eq!(a, b);
}

#[test]
fn identity_placement_matches_zoom_in_at_start() {
    let image = red_3x3();
    let mut r = FrameRenderer::new(&image, SMALL).unwrap();
    let a = r.render_frame(&Placement::identity(SMALL, 3, 3)).unwrap();
    let b = r.render_effect(Effect::ZoomIn, 0.0).unwrap();
    assert_eq!(a, b);
}

#[test]
fn invalid_canvas_is_rejected() {
    let err = FrameRenderer::new(
        &red_3x3(),
        Canvas {
            width: 0,
            height: 36,
        },
    )
    .err()
    .unwrap();
    assert!(matches!(err, StillmotionError::InvalidConfig(_)));
}
