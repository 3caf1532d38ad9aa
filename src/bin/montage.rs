use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "montage", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export a manifest to a movie file (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render one instant of the layered composition as a PNG.
    Frame(FrameArgs),
    /// Print what `ffprobe` reports about a video clip, as JSON.
    Probe(ProbeArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input manifest JSON.
    #[arg(long)]
    manifest: PathBuf,

    /// Output movie path; an existing file is replaced.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, value_enum, default_value_t = StrategyChoice::Raster)]
    strategy: StrategyChoice,

    /// Overrides the manifest seed for pan/zoom selection.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input manifest JSON.
    #[arg(long)]
    manifest: PathBuf,

    /// Timeline instant, in seconds.
    #[arg(long)]
    at: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    video: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyChoice {
    Raster,
    Layered,
}

impl From<StrategyChoice> for montage::ExportStrategy {
    fn from(c: StrategyChoice) -> Self {
        match c {
            StrategyChoice::Raster => Self::Raster,
            StrategyChoice::Layered => Self::Layered,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Probe(args) => cmd_probe(args),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut manifest = montage::Manifest::load(&args.manifest)?;
    if let Some(seed) = args.seed {
        manifest.seed = seed;
    }
    manifest.config.validate()?;

    let request = manifest.into_request(&args.out);
    let last_tenth = Arc::new(std::sync::atomic::AtomicU64::new(0));
    let out = montage::ExportJob::new(request)
        .strategy(args.strategy.into())
        .on_progress(move |p| {
            let tenth = (p * 10.0).floor() as u64;
            if last_tenth.fetch_max(tenth, std::sync::atomic::Ordering::Relaxed) < tenth {
                eprintln!("{:>3.0}%", p * 100.0);
            }
        })
        .run()
        .with_context(|| format!("export to '{}'", args.out.display()))?;

    if !out.skipped.is_empty() {
        eprintln!("skipped {} item(s):", out.skipped.len());
        for s in &out.skipped {
            eprintln!("  #{} {:?}", s.index, s.reason);
        }
    }
    eprintln!(
        "wrote {} ({} frames, {}{})",
        out.path.display(),
        out.frames,
        out.duration,
        if out.audio_included { ", with audio" } else { "" }
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let manifest = montage::Manifest::load(&args.manifest)?;
    manifest.config.validate()?;
    let at = montage::MediaTime::from_secs_f64(args.at)?;

    let items = manifest.to_items();
    let timeline = montage::TimelineBuilder::new(&manifest.config)
        .with_optional_filler(manifest.filler_clip())
        .with_seed(manifest.seed)
        .build(&items);
    anyhow::ensure!(!timeline.is_empty(), "manifest has no placeable media items");

    let graph = montage::LayerSynthesizer::build(&timeline, &manifest.config)?;
    let img = montage::render_still_frame(Arc::new(graph), at)?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    img.save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let track = montage::probe_video(&args.video)?;
    let json = serde_json::json!({
        "path": args.video,
        "width": track.natural_size.width,
        "height": track.natural_size.height,
        "orientation": track.orientation(),
        "duration": track.duration,
        "fps": track.fps.map(|f| format!("{}/{}", f.num, f.den)),
        "has_audio": track.has_audio,
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
