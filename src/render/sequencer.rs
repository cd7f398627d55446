use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;

use crate::assets::source::SourceImage;
use crate::effects::effect::Effect;
use crate::effects::placement::{Placement, compute_placement};
use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRange};
use crate::foundation::error::{StillmotionError, StillmotionResult};
use crate::pipeline::cancel::CancelToken;
use crate::render::backend::FrameRGBA;
use crate::render::cpu::FrameRenderer;

const MAX_REORDER_BUFFER_BYTES: u64 = 128 * 1024 * 1024;

/// Frame-level progress reported while a render runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderProgress {
    /// Frames delivered so far.
    pub frames_done: u64,
    /// Frames in the whole render.
    pub frames_total: u64,
}

/// Callback invoked after every delivered frame.
pub type ProgressFn = Arc<dyn Fn(RenderProgress) + Send + Sync>;

/// Threading, cancellation and reporting controls for [`Sequencer::run`].
#[derive(Clone)]
pub struct RenderOpts {
    /// Render frames of a chunk concurrently (rayon) before delivering them in order.
    pub parallel: bool,
    /// Chunk size in frames for parallel scheduling.
    pub chunk_size: usize,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
    /// Yield the calling thread after each delivered frame, in both modes.
    pub cooperative_yield: bool,
    /// Checked between frames; when set the run stops with [`StillmotionError::Cancelled`].
    pub cancel: Option<CancelToken>,
    /// Progress observer.
    pub on_progress: Option<ProgressFn>,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 32,
            threads: None,
            cooperative_yield: false,
            cancel: None,
            on_progress: None,
        }
    }
}

impl fmt::Debug for RenderOpts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOpts")
            .field("parallel", &self.parallel)
            .field("chunk_size", &self.chunk_size)
            .field("threads", &self.threads)
            .field("cooperative_yield", &self.cooperative_yield)
            .field("cancel", &self.cancel)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// Aggregated rendering counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Total frames in the render.
    pub frames_total: u64,
    /// Frames rendered and delivered.
    pub frames_rendered: u64,
}

/// Maps a render duration onto an ordered run of frame indices and progress values.
///
/// `total_frames = duration_secs * fps` is fixed at construction. Progress for frame `i` is
/// `i / total_frames`, so the last frame sits just short of 1.0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sequencer {
    fps: Fps,
    canvas: Canvas,
    total_frames: u64,
}

impl Sequencer {
    /// Build a sequencer; fails when the duration yields no frames.
    pub fn new(duration_secs: u32, fps: Fps, canvas: Canvas) -> StillmotionResult<Self> {
        let fps = Fps::new(fps.num, fps.den)?;
        let total_frames = fps.frames_for_secs(duration_secs)?;
        if total_frames < 1 {
            return Err(StillmotionError::invalid_config(format!(
                "render must contain at least one frame (duration {duration_secs}s)"
            )));
        }
        Ok(Self {
            fps,
            canvas,
            total_frames,
        })
    }

    /// Frames per second.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Number of frames this render emits.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// `[0, total_frames)`.
    pub fn range(&self) -> FrameRange {
        FrameRange {
            start: FrameIndex(0),
            end: FrameIndex(self.total_frames),
        }
    }

    /// Normalized progress of `idx`: `idx / total_frames`.
    pub fn progress_at(&self, idx: FrameIndex) -> f64 {
        idx.0 as f64 / self.total_frames as f64
    }

    /// Frame indices with their progress, in increasing order.
    pub fn frames(&self) -> impl Iterator<Item = (FrameIndex, f64)> + '_ {
        (0..self.total_frames).map(|f| {
            let idx = FrameIndex(f);
            (idx, self.progress_at(idx))
        })
    }

    /// Placement of `image` for `effect` at frame `idx`.
    pub fn placement_at(&self, effect: Effect, idx: FrameIndex, image: &SourceImage) -> Placement {
        compute_placement(
            effect,
            self.progress_at(idx),
            self.canvas,
            image.width(),
            image.height(),
        )
    }

    /// Render every frame and return them in order.
    pub fn render_all(
        &self,
        image: &SourceImage,
        effect: Effect,
        opts: &RenderOpts,
    ) -> StillmotionResult<Vec<FrameRGBA>> {
        let mut out = Vec::with_capacity(self.total_frames.min(4096) as usize);
        self.run(image, effect, opts, &mut |_, frame| {
            out.push(frame.clone());
            Ok(())
        })?;
        Ok(out)
    }

    /// Render every frame and hand each one to `deliver` in strictly increasing index order.
    ///
    /// In parallel mode, frames of a chunk are rasterized concurrently and re-sequenced before
    /// delivery; `deliver` always runs on the calling thread. The first error stops the run and no
    /// frame past the failure point is delivered.
    pub fn run(
        &self,
        image: &SourceImage,
        effect: Effect,
        opts: &RenderOpts,
        deliver: &mut dyn FnMut(FrameIndex, &FrameRGBA) -> StillmotionResult<()>,
    ) -> StillmotionResult<RenderStats> {
        let mut stats = RenderStats {
            frames_total: self.total_frames,
            frames_rendered: 0,
        };
        let mut renderer = FrameRenderer::new(image, self.canvas)?;

        if !opts.parallel {
            for (idx, progress) in self.frames() {
                check_cancel(opts)?;
                let frame = renderer.render_effect(effect, progress)?;
                deliver(idx, &frame)?;
                stats.frames_rendered += 1;
                report(opts, &stats);
                if opts.cooperative_yield {
                    std::thread::yield_now();
                }
            }
            return Ok(stats);
        }
        drop(renderer);

        let pool = build_thread_pool(opts.threads)?;
        let bytes_per_frame = (self.canvas.rgba8_len() as u64).max(1);
        let max_chunk_by_mem = (MAX_REORDER_BUFFER_BYTES / bytes_per_frame).max(1);
        let chunk_size = normalized_chunk_size(opts.chunk_size).min(max_chunk_by_mem);

        for chunk in self.range().chunks(chunk_size) {
            check_cancel(opts)?;
            tracing::debug!(start = chunk.start.0, end = chunk.end.0, "rendering chunk");
            let frames = self.render_chunk_parallel(image, effect, chunk, &pool);
            for (f, frame) in (chunk.start.0..chunk.end.0).zip(frames) {
                check_cancel(opts)?;
                deliver(FrameIndex(f), &frame?)?;
                stats.frames_rendered += 1;
                report(opts, &stats);
                if opts.cooperative_yield {
                    std::thread::yield_now();
                }
            }
        }
        Ok(stats)
    }

    fn render_chunk_parallel(
        &self,
        image: &SourceImage,
        effect: Effect,
        chunk: FrameRange,
        pool: &rayon::ThreadPool,
    ) -> Vec<StillmotionResult<FrameRGBA>> {
        let indices: Vec<u64> = (chunk.start.0..chunk.end.0).collect();
        let canvas = self.canvas;
        pool.install(|| {
            indices
                .par_iter()
                .map_init(
                    || FrameRenderer::new(image, canvas),
                    |worker, &f| -> StillmotionResult<FrameRGBA> {
                        let worker = worker
                            .as_mut()
                            .map_err(|e| StillmotionError::render(e.to_string()))?;
                        worker.render_effect(effect, self.progress_at(FrameIndex(f)))
                    },
                )
                .collect::<Vec<_>>()
        })
    }
}

fn check_cancel(opts: &RenderOpts) -> StillmotionResult<()> {
    if opts.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
        return Err(StillmotionError::Cancelled);
    }
    Ok(())
}

fn report(opts: &RenderOpts, stats: &RenderStats) {
    if let Some(cb) = opts.on_progress.as_ref() {
        cb(RenderProgress {
            frames_done: stats.frames_rendered,
            frames_total: stats.frames_total,
        });
    }
}

fn build_thread_pool(threads: Option<usize>) -> StillmotionResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(StillmotionError::invalid_config(
            "render 'threads' must be >= 1 when set",
        ));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| StillmotionError::render(format!("failed to build rayon thread pool: {e}")))
}

fn normalized_chunk_size(chunk_size: usize) -> u64 {
    if chunk_size == 0 {
        1
    } else {
        chunk_size as u64
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/sequencer.rs"]
mod tests;
