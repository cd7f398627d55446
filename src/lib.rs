//! stillmotion turns one still image into a short video.
//!
//! A render applies a single parametric motion effect (zoom, pan, rotate or fade) across a fixed
//! number of frames, rasterizes every frame on the CPU and streams the frames, in order, into an
//! encoder sink. The default sink pipes raw frames through the system `ffmpeg` and returns a
//! VP9/WebM byte stream.
//!
//! - Decode a [`SourceImage`]
//! - Describe the request with a [`RenderConfig`]
//! - Call [`generate_video`], or [`generate_video_with_sink`] for a custom [`FrameSink`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;

pub(crate) mod effects;
/// Encoder sinks.
pub mod encode;
/// Render orchestration, configuration and cancellation.
pub mod pipeline;
/// Frame rendering and sequencing.
pub mod render;

pub use crate::foundation::core::{Affine, Canvas, Fps, FrameIndex, FrameRange, Point, Rect, Vec2};
pub use crate::foundation::error::{
    ErrorKind, StillmotionError, StillmotionResult, USER_FAILURE_MESSAGE,
};

pub use crate::assets::decode::decode_image;
pub use crate::assets::source::SourceImage;
pub use crate::effects::effect::{Effect, parse_effect};
pub use crate::effects::placement::{Placement, aspect_fit_rect, compute_placement, fade_opacity};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::sink::{EncodedVideo, FrameSink, InMemorySink, SinkConfig};
pub use crate::pipeline::cancel::CancelToken;
pub use crate::pipeline::config::{
    FRAME_RATE, MAX_DURATION_SECS, MIN_DURATION_SECS, OUTPUT_HEIGHT, OUTPUT_WIDTH, OutputSpec,
    RenderConfig,
};
pub use crate::pipeline::controller::{
    GenerateOpts, GeneratedVideo, generate_video, generate_video_with_sink, render_preview_frame,
};
pub use crate::render::backend::FrameRGBA;
pub use crate::render::cpu::{FrameRenderer, render_frame};
pub use crate::render::sequencer::{ProgressFn, RenderOpts, RenderProgress, RenderStats, Sequencer};
