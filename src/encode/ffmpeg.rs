use std::io::{Read, Write as _};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::encode::sink::{EncodedVideo, FrameSink, SinkConfig, SinkState, WEBM_MEDIA_TYPE};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{StillmotionError, StillmotionResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::backend::FrameRGBA;

/// Environment variable overriding the `ffmpeg` binary used by [`FfmpegSinkOpts::default`].
pub const FFMPEG_ENV: &str = "STILLMOTION_FFMPEG";

const VP9_ENCODER: &str = "libvpx-vp9";

/// Options for [`FfmpegSink`] WebM output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// `ffmpeg` executable to spawn.
    pub ffmpeg: PathBuf,
    /// VP9 constant-quality level (0 best .. 63 worst).
    pub crf: u8,
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl Default for FfmpegSinkOpts {
    fn default() -> Self {
        Self {
            ffmpeg: std::env::var_os(FFMPEG_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("ffmpeg")),
            crf: 32,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

type Drain = JoinHandle<std::io::Result<Vec<u8>>>;

/// Sink that spawns `ffmpeg`, streams raw frames to its stdin and collects a VP9/WebM stream
/// from its stdout.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    state: SinkState,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout_drain: Option<Drain>,
    stderr_drain: Option<Drain>,

    scratch: Vec<u8>,
}

impl FfmpegSink {
    /// Create a new sink; nothing is spawned until `begin`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            state: SinkState::default(),
            child: None,
            stdin: None,
            stdout_drain: None,
            stderr_drain: None,
            scratch: Vec::new(),
        }
    }

    fn command(&self, cfg: &SinkConfig) -> Command {
        let mut cmd = Command::new(&self.opts.ffmpeg);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Input: raw RGBA8, already flattened to opaque in push_frame.
        cmd.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0"]);

        // Output: VP9 + yuv420p in WebM, written to stdout.
        cmd.args([
            "-an",
            "-c:v",
            VP9_ENCODER,
            "-pix_fmt",
            "yuv420p",
            "-b:v",
            "0",
            "-crf",
            &self.opts.crf.to_string(),
            "-deadline",
            "good",
            "-cpu-used",
            "4",
            "-row-mt",
            "1",
            "-f",
            "webm",
            "pipe:1",
        ]);
        cmd
    }

    fn take_stderr(&mut self) -> String {
        let bytes = self
            .stderr_drain
            .take()
            .and_then(|h| h.join().ok())
            .and_then(|r| r.ok())
            .unwrap_or_default();
        String::from_utf8_lossy(&bytes).trim().to_string()
    }

    fn kill_child(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(h) = self.stdout_drain.take() {
            let _ = h.join();
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> StillmotionResult<()> {
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(StillmotionError::invalid_config(
                "ffmpeg sink width/height must be even (required for yuv420p output)",
            ));
        }
        if self.child.is_some() {
            return Err(StillmotionError::encoder_init("ffmpeg sink is already open"));
        }
        self.state.open(cfg)?;

        if !ffmpeg_has_encoder(&self.opts.ffmpeg, VP9_ENCODER) {
            self.state.reset();
            return Err(StillmotionError::encoder_init(format!(
                "'{}' is not runnable or lacks the {VP9_ENCODER} encoder",
                self.opts.ffmpeg.display()
            )));
        }

        let mut child = self.command(&cfg).spawn().map_err(|e| {
            self.state.reset();
            StillmotionError::encoder_init(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (Some(stdin), Some(mut stdout), Some(mut stderr)) = (stdin, stdout, stderr) else {
            let _ = child.kill();
            let _ = child.wait();
            self.state.reset();
            return Err(StillmotionError::encoder_init(
                "failed to open ffmpeg stdio pipes (unexpected)",
            ));
        };

        self.stdout_drain = Some(std::thread::spawn(move || {
            let mut out = Vec::new();
            stdout.read_to_end(&mut out)?;
            Ok(out)
        }));
        self.stderr_drain = Some(std::thread::spawn(move || {
            let mut err = Vec::new();
            stderr.read_to_end(&mut err)?;
            Ok(err)
        }));

        tracing::debug!(
            width = cfg.width,
            height = cfg.height,
            fps_num = cfg.fps.num,
            fps_den = cfg.fps.den,
            "ffmpeg webm sink opened"
        );
        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> StillmotionResult<()> {
        self.state.accept(idx, frame)?;

        flatten_premul_over_bg_to_opaque_rgba8(&mut self.scratch, &frame.data, self.opts.bg_rgba)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(StillmotionError::encoding("ffmpeg sink is not accepting frames"));
        };
        if let Err(e) = stdin.write_all(&self.scratch) {
            self.kill_child();
            let stderr = self.take_stderr();
            self.state.reset();
            return Err(StillmotionError::encoding(format!(
                "failed to write frame {} to ffmpeg stdin: {e}: {stderr}",
                idx.0
            )));
        }
        Ok(())
    }

    fn finalize(&mut self) -> StillmotionResult<EncodedVideo> {
        self.state.finish()?;
        drop(self.stdin.take());

        let mut child = self
            .child
            .take()
            .ok_or_else(|| StillmotionError::encoding("ffmpeg sink not started"))?;
        let status = child.wait().map_err(|e| {
            StillmotionError::encoding(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        let bytes = match self.stdout_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| StillmotionError::encoding("ffmpeg stdout drain thread panicked"))?
                .map_err(|e| StillmotionError::encoding(format!("ffmpeg stdout read failed: {e}")))?,
            None => Vec::new(),
        };
        let stderr = self.take_stderr();

        if !status.success() {
            return Err(StillmotionError::encoding(format!(
                "ffmpeg exited with status {status}: {stderr}"
            )));
        }

        tracing::debug!(
            frames = self.state.frames_pushed(),
            bytes = bytes.len(),
            "ffmpeg webm sink finalized"
        );
        Ok(EncodedVideo {
            bytes,
            media_type: WEBM_MEDIA_TYPE,
        })
    }

    fn abort(&mut self) {
        if self.child.is_some() || self.state.is_open() {
            tracing::warn!(
                frames = self.state.frames_pushed(),
                "aborting ffmpeg sink; partial output discarded"
            );
        }
        self.kill_child();
        let _ = self.take_stderr();
        self.state.reset();
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.abort();
        }
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` sets the input framerate (rational `num/den`).
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> StillmotionResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(StillmotionError::encoding(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = bg_rgba[0] as u16;
    let bg_g = bg_rgba[1] as u16;
    let bg_b = bg_rgba[2] as u16;

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = s[3] as u16;
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        let r = s[0] as u16 + mul_div255_u16(bg_r, inv);
        let g = s[1] as u16 + mul_div255_u16(bg_g, inv);
        let b = s[2] as u16 + mul_div255_u16(bg_b, inv);

        d[0] = r.min(255) as u8;
        d[1] = g.min(255) as u8;
        d[2] = b.min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH` (or [`FFMPEG_ENV`]).
pub fn is_ffmpeg_on_path() -> bool {
    let bin = FfmpegSinkOpts::default().ffmpeg;
    Command::new(bin)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn ffmpeg_has_encoder(bin: &std::path::Path, encoder: &str) -> bool {
    Command::new(bin)
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map(|out| {
            out.status.success()
                && String::from_utf8_lossy(&out.stdout)
                    .split_whitespace()
                    .any(|w| w == encoder)
        })
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
