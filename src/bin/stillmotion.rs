use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use stillmotion::{
    Effect, FfmpegSink, FfmpegSinkOpts, FrameIndex, GenerateOpts, OutputSpec, RenderConfig,
    RenderOpts, SourceImage, StillmotionError, StillmotionResult,
};

#[derive(Parser, Debug)]
#[command(name = "stillmotion", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a WebM video (requires `ffmpeg` with libvpx-vp9 on PATH).
    Render(RenderArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
}

#[derive(Args, Debug)]
struct RequestArgs {
    /// Input image (PNG, JPEG, ...).
    #[arg(long)]
    image: PathBuf,

    /// Motion effect: zoom-in, zoom-out, pan-left, pan-right, pan-up, pan-down, rotate, fade.
    #[arg(long, value_parser = stillmotion::parse_effect)]
    effect: Option<Effect>,

    /// Duration in whole seconds (1..=10).
    #[arg(long)]
    duration: Option<u32>,

    /// Render config JSON; `--effect` / `--duration` override its fields.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    request: RequestArgs,

    /// Output WebM path.
    #[arg(long)]
    out: PathBuf,

    /// Enable frame-level parallelism.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Render chunk size (parallel mode only).
    #[arg(long, default_value_t = 32)]
    chunk_size: usize,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    request: RequestArgs,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let res = match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
    };
    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "stillmotion failed");
            eprintln!("{} ({:?})", e.user_message(), e.kind());
            ExitCode::FAILURE
        }
    }
}

fn resolve_config(req: &RequestArgs) -> StillmotionResult<RenderConfig> {
    let base = req.config.as_ref().map(RenderConfig::from_path).transpose()?;
    let effect = req
        .effect
        .or(base.map(|c| c.effect))
        .ok_or_else(|| StillmotionError::invalid_config("missing --effect (or --config)"))?;
    let duration = req
        .duration
        .or(base.map(|c| c.duration_secs))
        .ok_or_else(|| StillmotionError::invalid_config("missing --duration (or --config)"))?;
    RenderConfig::new(duration, effect)
}

fn cmd_render(args: RenderArgs) -> StillmotionResult<()> {
    let config = resolve_config(&args.request)?;
    let image = SourceImage::open(&args.request.image)?;

    let opts = GenerateOpts {
        output: OutputSpec::default(),
        render: RenderOpts {
            parallel: args.parallel,
            chunk_size: args.chunk_size,
            threads: args.threads,
            ..RenderOpts::default()
        },
    };
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::default());
    let generated = stillmotion::generate_video_with_sink(&image, &config, &opts, &mut sink)?;

    ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, &generated.video.bytes)
        .with_context(|| format!("write video '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({} frames, {} bytes)",
        args.out.display(),
        generated.stats.frames_rendered,
        generated.video.len()
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> StillmotionResult<()> {
    let config = resolve_config(&args.request)?;
    let image = SourceImage::open(&args.request.image)?;

    let frame = stillmotion::render_preview_frame(
        &image,
        &config,
        &OutputSpec::default(),
        FrameIndex(args.frame),
    )?;

    ensure_parent_dir(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}
