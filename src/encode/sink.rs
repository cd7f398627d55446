use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{StillmotionError, StillmotionResult};
use crate::render::backend::FrameRGBA;

/// Media type of WebM output.
pub const WEBM_MEDIA_TYPE: &str = "video/webm";
/// Media type of concatenated raw RGBA8 frames.
pub const RAW_RGBA_MEDIA_TYPE: &str = "video/x-raw";

/// Configuration provided to a [`FrameSink`] when it is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
}

/// An encoded video: bytes plus the media type they are declared as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedVideo {
    /// Container bytes.
    pub bytes: Vec<u8>,
    /// Declared media type, e.g. `video/webm`.
    pub media_type: &'static str,
}

impl EncodedVideo {
    /// Conventional file extension for the media type.
    pub fn extension(&self) -> &'static str {
        match self.media_type {
            WEBM_MEDIA_TYPE => "webm",
            _ => "rgba",
        }
    }

    /// Byte length of the stream.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// `true` when the stream holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Sink contract for consuming rendered frames.
///
/// Lifecycle: `begin` once, `push_frame` for every frame in strictly increasing `FrameIndex`
/// order, then either `finalize` (flush and close) or `abort` (discard everything).
pub trait FrameSink: Send {
    /// Open the sink for a stream of `cfg.width x cfg.height` frames.
    fn begin(&mut self, cfg: SinkConfig) -> StillmotionResult<()>;
    /// Push one frame in strictly increasing order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> StillmotionResult<()>;
    /// Flush buffered encoder state and return the finished stream.
    fn finalize(&mut self) -> StillmotionResult<EncodedVideo>;
    /// Drop all buffered state without producing output. Idempotent.
    fn abort(&mut self);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Phase {
    #[default]
    Idle,
    Open,
    Finalized,
}

/// Lifecycle bookkeeping shared by the built-in sinks.
#[derive(Debug, Default)]
pub(crate) struct SinkState {
    phase: Phase,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
    frames_pushed: u64,
}

impl SinkState {
    pub(crate) fn open(&mut self, cfg: SinkConfig) -> StillmotionResult<()> {
        if self.phase == Phase::Open {
            return Err(StillmotionError::encoder_init("sink is already open"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(StillmotionError::invalid_config(
                "sink width/height must be non-zero",
            ));
        }
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(StillmotionError::invalid_config("fps must be non-zero"));
        }
        *self = Self {
            phase: Phase::Open,
            cfg: Some(cfg),
            last_idx: None,
            frames_pushed: 0,
        };
        Ok(())
    }

    /// Check that `frame` may be pushed now and record it.
    pub(crate) fn accept(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> StillmotionResult<()> {
        let cfg = match self.phase {
            Phase::Open => self
                .cfg
                .ok_or_else(|| StillmotionError::encoding("sink config missing"))?,
            Phase::Idle => return Err(StillmotionError::encoding("sink not started")),
            Phase::Finalized => {
                return Err(StillmotionError::encoding("sink is already finalized"));
            }
        };
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(StillmotionError::encoding(format!(
                "sink received out-of-order frame index {} after {}",
                idx.0, last.0
            )));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(StillmotionError::encoding(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        let expected = (cfg.width as usize) * (cfg.height as usize) * 4;
        if frame.data.len() != expected {
            return Err(StillmotionError::encoding(
                "frame.data size mismatch with width*height*4",
            ));
        }
        self.last_idx = Some(idx);
        self.frames_pushed += 1;
        Ok(())
    }

    pub(crate) fn finish(&mut self) -> StillmotionResult<SinkConfig> {
        match self.phase {
            Phase::Open => {}
            Phase::Idle => return Err(StillmotionError::encoding("sink not started")),
            Phase::Finalized => {
                return Err(StillmotionError::encoding("sink is already finalized"));
            }
        }
        self.phase = Phase::Finalized;
        self.cfg
            .ok_or_else(|| StillmotionError::encoding("sink config missing"))
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn is_open(&self) -> bool {
        self.phase == Phase::Open
    }

    pub(crate) fn frames_pushed(&self) -> u64 {
        self.frames_pushed
    }
}

/// In-memory sink for tests and debugging.
///
/// `finalize` returns the frames concatenated as raw RGBA8 ([`RAW_RGBA_MEDIA_TYPE`]).
#[derive(Debug, Default)]
pub struct InMemorySink {
    state: SinkState,
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> StillmotionResult<()> {
        self.state.open(cfg)?;
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> StillmotionResult<()> {
        self.state.accept(idx, frame)?;
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn finalize(&mut self) -> StillmotionResult<EncodedVideo> {
        self.state.finish()?;
        let bytes = self
            .frames
            .iter()
            .flat_map(|(_, f)| f.data.iter().copied())
            .collect();
        Ok(EncodedVideo {
            bytes,
            media_type: RAW_RGBA_MEDIA_TYPE,
        })
    }

    fn abort(&mut self) {
        self.state.reset();
        self.frames.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
