use crate::assets::source::SourceImage;
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::{EncodedVideo, FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ErrorKind, StillmotionError, StillmotionResult};
use crate::pipeline::config::{OutputSpec, RenderConfig};
use crate::render::backend::FrameRGBA;
use crate::render::cpu::FrameRenderer;
use crate::render::sequencer::{RenderOpts, RenderStats, Sequencer};

/// Options for [`generate_video_with_sink`].
#[derive(Clone, Debug, Default)]
pub struct GenerateOpts {
    /// Frame rate and canvas. Defaults to 30 fps at 1280x720.
    pub output: OutputSpec,
    /// Threading, cancellation and progress controls.
    pub render: RenderOpts,
}

/// A finished video with the counters of the render that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedVideo {
    /// Encoded stream.
    pub video: EncodedVideo,
    /// Render counters.
    pub stats: RenderStats,
}

/// Render `image` under `config` and encode it as VP9/WebM via the system `ffmpeg`.
///
/// Either the whole video is returned or an error is; partial streams are never exposed.
pub fn generate_video(
    image: &SourceImage,
    config: &RenderConfig,
) -> StillmotionResult<EncodedVideo> {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::default());
    generate_video_with_sink(image, config, &GenerateOpts::default(), &mut sink).map(|g| g.video)
}

/// Render `image` under `config` and stream every frame, in order, into `sink`.
///
/// The request is validated before the sink is opened. Once the sink is open, any failure aborts
/// it and `finalize` is never reached. Every error leaving this function carries a concrete kind.
#[tracing::instrument(
    skip(image, opts, sink),
    fields(
        image_w = image.width(),
        image_h = image.height(),
        parallel = opts.render.parallel
    )
)]
pub fn generate_video_with_sink(
    image: &SourceImage,
    config: &RenderConfig,
    opts: &GenerateOpts,
    sink: &mut dyn FrameSink,
) -> StillmotionResult<GeneratedVideo> {
    config.validate()?;
    opts.output.validate()?;
    image
        .validate()
        .map_err(|e| e.classify(ErrorKind::ImageDecode))?;

    let seq = Sequencer::new(config.duration_secs, opts.output.fps, opts.output.canvas)?;

    sink.begin(SinkConfig {
        width: seq.canvas().width,
        height: seq.canvas().height,
        fps: seq.fps(),
    })
    .map_err(|e| e.classify(ErrorKind::EncoderInit))?;

    let run = seq.run(image, config.effect, &opts.render, &mut |idx, frame| {
        sink.push_frame(idx, frame)
            .map_err(|e| e.classify(ErrorKind::Encoding))
    });
    let stats = match run {
        Ok(stats) => stats,
        Err(e) => {
            let e = e.classify(ErrorKind::Render);
            if matches!(e, StillmotionError::Cancelled) {
                tracing::warn!("render cancelled; aborting sink");
            } else {
                tracing::warn!(error = %e, "render failed; aborting sink");
            }
            sink.abort();
            return Err(e);
        }
    };

    if stats.frames_rendered != seq.total_frames() {
        sink.abort();
        return Err(StillmotionError::render(format!(
            "rendered {} of {} frames",
            stats.frames_rendered,
            seq.total_frames()
        )));
    }

    let video = match sink.finalize() {
        Ok(video) => video,
        Err(e) => {
            let e = e.classify(ErrorKind::Encoding);
            tracing::warn!(error = %e, "finalize failed; aborting sink");
            sink.abort();
            return Err(e);
        }
    };

    tracing::debug!(
        frames = stats.frames_rendered,
        bytes = video.len(),
        media_type = video.media_type,
        "video generated"
    );
    Ok(GeneratedVideo { video, stats })
}

/// Render the single frame `idx` of the video `config` describes, without encoding.
pub fn render_preview_frame(
    image: &SourceImage,
    config: &RenderConfig,
    output: &OutputSpec,
    idx: FrameIndex,
) -> StillmotionResult<FrameRGBA> {
    config.validate()?;
    output.validate()?;
    let seq = Sequencer::new(config.duration_secs, output.fps, output.canvas)?;
    if !seq.range().contains(idx) {
        return Err(StillmotionError::invalid_config(format!(
            "frame {} is outside 0..{}",
            idx.0,
            seq.total_frames()
        )));
    }
    let mut renderer = FrameRenderer::new(image, output.canvas)?;
    renderer
        .render_effect(config.effect, seq.progress_at(idx))
        .map_err(|e| e.classify(ErrorKind::Render))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/controller.rs"]
mod tests;
