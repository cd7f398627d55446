use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::effects::effect::Effect;
use crate::encode::sink::InMemorySink;
use crate::foundation::core::{Canvas, Fps};
use crate::pipeline::cancel::CancelToken;
use crate::render::sequencer::RenderProgress;

fn small_opts() -> GenerateOpts {
    GenerateOpts {
        output: OutputSpec {
            fps: Fps::whole(30),
            canvas: Canvas {
                width: 32,
                height: 18,
            },
        },
        render: RenderOpts::default(),
    }
}

fn red_3x3() -> SourceImage {
    SourceImage::solid(3, 3, [255, 0, 0, 255]).unwrap()
}

/// Sink that fails on a chosen push and counts lifecycle calls.
#[derive(Default)]
struct FailingSink {
    fail_at: Option<u64>,
    fail_finalize: bool,
    begun: usize,
    pushed: usize,
    finalized: usize,
    aborted: usize,
}

impl FrameSink for FailingSink {
    fn begin(&mut self, _cfg: SinkConfig) -> StillmotionResult<()> {
        self.begun += 1;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, _frame: &FrameRGBA) -> StillmotionResult<()> {
        if self.fail_at == Some(idx.0) {
            return Err(anyhow::anyhow!("pipe closed").into());
        }
        self.pushed += 1;
        Ok(())
    }

    fn finalize(&mut self) -> StillmotionResult<EncodedVideo> {
        self.finalized += 1;
        if self.fail_finalize {
            return Err(anyhow::anyhow!("trailer write failed").into());
        }
        Ok(EncodedVideo {
            bytes: vec![1, 2, 3],
            media_type: crate::encode::sink::WEBM_MEDIA_TYPE,
        })
    }

    fn abort(&mut self) {
        self.aborted += 1;
    }
}

#[test]
fn one_second_zoom_in_yields_thirty_ordered_frames() {
    let cfg = RenderConfig::new(1, Effect::ZoomIn).unwrap();
    let mut sink = InMemorySink::new();
    let out = generate_video_with_sink(&red_3x3(), &cfg, &small_opts(), &mut sink).unwrap();

    assert_eq!(out.stats.frames_total, 30);
    assert_eq!(out.stats.frames_rendered, 30);
    let idx: Vec<u64> = sink.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, (0..30).collect::<Vec<_>>());
    assert_eq!(out.video.len(), 30 * 32 * 18 * 4);
    assert_eq!(
        sink.config(),
        Some(SinkConfig {
            width: 32,
            height: 18,
            fps: Fps::whole(30),
        })
    );
}

#[test]
fn push_failure_is_encoding_and_aborts_sink() {
    let cfg = RenderConfig::new(1, Effect::Fade).unwrap();
    let mut sink = FailingSink {
        fail_at: Some(4),
        ..FailingSink::default()
    };
    let err = generate_video_with_sink(&red_3x3(), &cfg, &small_opts(), &mut sink).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Encoding);
    assert_eq!(sink.pushed, 4);
    assert_eq!(sink.aborted, 1);
    assert_eq!(sink.finalized, 0);
}

#[test]
fn finalize_failure_is_encoding_and_aborts_sink() {
    let cfg = RenderConfig::new(1, Effect::Rotate).unwrap();
    let mut sink = FailingSink {
        fail_finalize: true,
        ..FailingSink::default()
    };
    let err = generate_video_with_sink(&red_3x3(), &cfg, &small_opts(), &mut sink).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Encoding);
    assert_eq!(sink.pushed, 30);
    assert_eq!(sink.aborted, 1);
}

#[test]
fn zero_duration_never_opens_the_sink() {
    let cfg = RenderConfig {
        duration_secs: 0,
        effect: Effect::ZoomIn,
    };
    let mut sink = FailingSink::default();
    let err = generate_video_with_sink(&red_3x3(), &cfg, &small_opts(), &mut sink).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    assert_eq!(sink.begun, 0);
    assert_eq!(sink.pushed, 0);
}

#[test]
fn zero_area_image_fails_before_any_frame() {
    let err = SourceImage::from_rgba8(0, 3, Vec::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ImageDecode);

    let err = SourceImage::solid(4, 0, [255, 255, 255, 255]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ImageDecode);
}

#[test]
fn cancellation_aborts_without_finalize() {
    let cancel = CancelToken::new();
    let trip = cancel.clone();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut opts = small_opts();
    opts.render.cancel = Some(cancel);
    opts.render.on_progress = Some(Arc::new(move |p: RenderProgress| {
        counter.fetch_add(1, Ordering::Relaxed);
        if p.frames_done == 10 {
            trip.cancel();
        }
    }));

    let cfg = RenderConfig::new(2, Effect::PanUp).unwrap();
    let mut sink = FailingSink::default();
    let err = generate_video_with_sink(&red_3x3(), &cfg, &opts, &mut sink).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(sink.pushed, 10);
    assert_eq!(sink.aborted, 1);
    assert_eq!(sink.finalized, 0);
    assert_eq!(calls.load(Ordering::Relaxed), 10);
}

#[test]
fn identical_requests_render_identical_frames() {
    let cfg = RenderConfig::new(1, Effect::Rotate).unwrap();
    let image = red_3x3();

    let mut a = InMemorySink::new();
    let mut b = InMemorySink::new();
    let va = generate_video_with_sink(&image, &cfg, &small_opts(), &mut a).unwrap();
    let vb = generate_video_with_sink(&image, &cfg, &small_opts(), &mut b).unwrap();
    assert_eq!(va, vb);
    assert_eq!(a.frames(), b.frames());
}

#[test]
fn preview_frame_matches_streamed_frame() {
    let cfg = RenderConfig::new(1, Effect::PanLeft).unwrap();
    let image = red_3x3();
    let opts = small_opts();

    let mut sink = InMemorySink::new();
    generate_video_with_sink(&image, &cfg, &opts, &mut sink).unwrap();
    let preview = render_preview_frame(&image, &cfg, &opts.output, FrameIndex(17)).unwrap();
    assert_eq!(sink.frames()[17].1, preview);

    let err = render_preview_frame(&image, &cfg, &opts.output, FrameIndex(30)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
}
