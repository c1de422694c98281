use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use storyreel::{
    AspectRatio, FfprobeProbe, MotionClipProvider, NoMotionProvider, QualityPreset,
    RenderConfig, SiblingClipProvider, Storyboard,
};

#[derive(Parser, Debug)]
#[command(name = "storyreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a storyboard to MP4 (requires `ffmpeg` and `ffprobe` on PATH).
    Render(RenderArgs),
    /// Print the computed timeline as JSON without encoding.
    Plan(InputArgs),
    /// Render the frame shown at one point in time as a PNG.
    Frame(FrameArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Storyboard JSON.
    #[arg(long)]
    storyboard: PathBuf,

    /// Render configuration JSON; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// For segments with a motion prompt, use a pre-generated `<image stem>.mp4` next to the image.
    #[arg(long)]
    sibling_clips: bool,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Override the storyboard's output directory.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    #[arg(long)]
    fps: Option<u32>,

    /// landscape (16:9), portrait (9:16) or square (1:1).
    #[arg(long)]
    aspect: Option<AspectRatio>,

    /// draft, standard or high (`low` and `medium` are accepted aliases).
    #[arg(long)]
    quality: Option<QualityPreset>,

    /// Burn segment text in as subtitles.
    #[arg(long)]
    subtitles: bool,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Timeline position in seconds.
    #[arg(long)]
    at: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Plan(args) => cmd_plan(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn load_inputs(args: &InputArgs) -> anyhow::Result<(Storyboard, RenderConfig)> {
    let board = Storyboard::from_path(&args.storyboard)
        .with_context(|| format!("load storyboard '{}'", args.storyboard.display()))?;
    let cfg = match &args.config {
        Some(path) => RenderConfig::from_path(path)
            .with_context(|| format!("load render config '{}'", path.display()))?,
        None => RenderConfig::default(),
    };
    Ok((board, cfg))
}

fn provider(args: &InputArgs) -> Box<dyn MotionClipProvider> {
    if args.sibling_clips {
        Box::new(SiblingClipProvider::default())
    } else {
        Box::new(NoMotionProvider)
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let (mut board, mut cfg) = load_inputs(&args.input)?;
    if let Some(dir) = args.out_dir {
        board.output_dir = dir;
    }
    if let Some(fps) = args.fps {
        cfg.fps = fps;
    }
    if let Some(aspect) = args.aspect {
        cfg.aspect = aspect;
        cfg.resolution = None;
    }
    if let Some(q) = args.quality {
        cfg.quality = q;
    }
    if args.subtitles {
        cfg.subtitles = true;
    }
    cfg.validate()?;

    let provider = provider(&args.input);
    let result = storyreel::render_to_mp4(&board, &cfg, &FfprobeProbe, provider.as_ref())?;
    for s in &result.skipped {
        eprintln!("skipped scene {}: {}", s.number, s.reason);
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("serialize render result")?
    );
    Ok(())
}

fn cmd_plan(args: InputArgs) -> anyhow::Result<()> {
    let (board, cfg) = load_inputs(&args)?;
    let provider = provider(&args);
    let plan = storyreel::plan_storyboard(&board, &cfg, &FfprobeProbe, provider.as_ref())?;
    println!(
        "{}",
        serde_json::to_string_pretty(&plan).context("serialize timeline plan")?
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (board, cfg) = load_inputs(&args.input)?;
    let provider = provider(&args.input);
    let mut frame =
        storyreel::render_frame_at(&board, &cfg, &FfprobeProbe, provider.as_ref(), args.at)?;
    if frame.premultiplied {
        unpremultiply_in_place(&mut frame.data);
    }

    ensure_parent(&args.out)?;
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

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn unpremultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}
