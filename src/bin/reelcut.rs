use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reelcut", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print source metadata as JSON (requires `ffprobe` on PATH).
    Probe(ProbeArgs),
    /// Render one composed frame as a PNG.
    Frame(FrameArgs),
    /// Export a trimmed range as MP4 or GIF (requires `ffmpeg` on PATH).
    Export(ExportArgs),
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    /// Input video.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input video.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Timestamp in seconds.
    #[arg(long, default_value_t = 0.0)]
    at: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    output: OutputArgs,

    #[command(flatten)]
    scene: SceneArgs,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input video.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path. The extension is not inspected; `--format` decides the container.
    #[arg(long)]
    out: PathBuf,

    /// Export config JSON. Flags given on the command line override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Trim start in seconds.
    #[arg(long)]
    start: Option<f64>,

    /// Trim end in seconds. Defaults to the config's end, or the source duration.
    #[arg(long)]
    end: Option<f64>,

    /// Do not loop the GIF.
    #[arg(long, default_value_t = false)]
    no_loop: bool,

    /// Overwrite output if it already exists (`--overwrite false` refuses).
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    overwrite: bool,

    /// Seek timeout in seconds.
    #[arg(long, default_value_t = 10.0)]
    seek_timeout: f64,

    #[command(flatten)]
    output: OutputArgs,

    #[command(flatten)]
    scene: SceneArgs,
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Output format.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// MP4 quality tier.
    #[arg(long, value_enum)]
    quality: Option<QualityArg>,

    /// GIF size preset.
    #[arg(long, value_enum)]
    size: Option<SizeArg>,

    /// GIF frame rate: 10, 15, 20, 25 or 30.
    #[arg(long)]
    fps: Option<u32>,
}

#[derive(clap::Args, Debug)]
struct SceneArgs {
    /// Rounded video corners as a fraction of the shorter drawn side.
    #[arg(long)]
    corner_radius: Option<f64>,

    /// Inset around the video as a fraction of the shorter output side.
    #[arg(long, default_value_t = 0.0)]
    padding: f64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Mp4,
    Gif,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum QualityArg {
    Medium,
    Good,
    Source,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SizeArg {
    Small,
    Medium,
    Large,
    Original,
}

impl From<QualityArg> for reelcut::Mp4Quality {
    fn from(q: QualityArg) -> Self {
        match q {
            QualityArg::Medium => Self::Medium,
            QualityArg::Good => Self::Good,
            QualityArg::Source => Self::Source,
        }
    }
}

impl From<SizeArg> for reelcut::GifSizePreset {
    fn from(s: SizeArg) -> Self {
        match s {
            SizeArg::Small => Self::Small,
            SizeArg::Medium => Self::Medium,
            SizeArg::Large => Self::Large,
            SizeArg::Original => Self::Original,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    rt.block_on(async move {
        match cli.cmd {
            Command::Probe(args) => cmd_probe(args).await,
            Command::Frame(args) => cmd_frame(args).await,
            Command::Export(args) => cmd_export(args).await,
        }
    })
}

async fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let media = reelcut::probe_media(&args.in_path).await?;
    println!("{}", serde_json::to_string_pretty(&media)?);
    Ok(())
}

async fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut source =
        reelcut::FfmpegVideoSource::open(&args.in_path, reelcut::FfmpegSourceOpts::default())
            .await?;
    let media = reelcut::VideoSource::media(&source);
    let config = apply_output_args(
        reelcut::ExportConfig::gif(
            reelcut::TrimRange::full(media.duration_secs)?,
            reelcut::GifOptions::default(),
        ),
        &args.output,
    )?;
    let dims = config.output_dimensions(&media)?;

    let composition = scene_from_args(&args.scene);
    composition.validate()?;
    let mut renderer = reelcut::FrameRenderer::new(
        &mut source,
        reelcut::CpuCompositor::new(composition),
        dims,
        std::time::Duration::from_secs(10),
    );
    let rendered = renderer.render_at(args.at).await;
    reelcut::VideoSource::release(&mut source).await;
    let frame = rendered?;

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

    eprintln!("wrote {} ({})", args.out.display(), dims);
    Ok(())
}

async fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    if !args.overwrite && args.out.exists() {
        anyhow::bail!("output file '{}' already exists", args.out.display());
    }
    let seek_timeout = std::time::Duration::try_from_secs_f64(args.seek_timeout.max(0.1))
        .with_context(|| format!("invalid --seek-timeout {}", args.seek_timeout))?;

    let mut source =
        reelcut::FfmpegVideoSource::open(&args.in_path, reelcut::FfmpegSourceOpts::default())
            .await?;
    let media = reelcut::VideoSource::media(&source);

    let base = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read config '{}'", path.display()))?;
            reelcut::ExportConfig::from_json(&text)?
        }
        None => reelcut::ExportConfig::mp4(
            reelcut::TrimRange::full(media.duration_secs)?,
            reelcut::Mp4Quality::default(),
        ),
    };
    let mut config = apply_output_args(base, &args.output)?;
    if args.start.is_some() || args.end.is_some() {
        let start = args.start.unwrap_or(config.trim.start_secs);
        let end = args.end.unwrap_or(config.trim.end_secs);
        config.trim = reelcut::TrimRange::new(start, end)?;
    }
    if args.no_loop
        && let reelcut::OutputOptions::Gif(o) = &mut config.output
    {
        o.loop_playback = false;
    }

    let composition = scene_from_args(&args.scene);
    let session = reelcut::ExportSession::new(reelcut::ExportSessionOpts {
        seek_timeout,
        composition,
        ..Default::default()
    });

    let cancel = session.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling export");
            cancel.cancel();
        }
    });

    tracing::info!(
        input = %args.in_path.display(),
        dims = %config.output_dimensions(&media)?,
        format = config.format().label(),
        "starting export"
    );
    let mut last_pct = 0u32;
    let artifact = session
        .start_export(&config, &mut source, |p| {
            let pct = (p * 100.0).floor() as u32;
            if pct >= last_pct + 10 || pct == 100 {
                last_pct = pct;
                tracing::info!(progress = pct, "export progress");
            }
        })
        .await
        .map_err(|e| {
            anyhow::anyhow!(e.to_string()).context(e.user_message())
        })?;

    ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, &artifact.data)
        .with_context(|| format!("write output '{}'", args.out.display()))?;
    eprintln!(
        "wrote {} ({}, {} bytes)",
        args.out.display(),
        artifact.mime_type(),
        artifact.len()
    );
    Ok(())
}

fn apply_output_args(
    mut config: reelcut::ExportConfig,
    args: &OutputArgs,
) -> anyhow::Result<reelcut::ExportConfig> {
    match args.format {
        Some(FormatArg::Gif) if !matches!(config.output, reelcut::OutputOptions::Gif(_)) => {
            config.output = reelcut::OutputOptions::Gif(reelcut::GifOptions::default());
        }
        Some(FormatArg::Mp4) if !matches!(config.output, reelcut::OutputOptions::Mp4(_)) => {
            config.output = reelcut::OutputOptions::Mp4(reelcut::Mp4Options::default());
        }
        _ => {}
    }

    match &mut config.output {
        reelcut::OutputOptions::Mp4(o) => {
            if let Some(q) = args.quality {
                o.quality = q.into();
            }
            if args.size.is_some() || args.fps.is_some() {
                anyhow::bail!("--size and --fps only apply to GIF exports");
            }
        }
        reelcut::OutputOptions::Gif(o) => {
            if let Some(s) = args.size {
                o.size_preset = s.into();
            }
            if let Some(fps) = args.fps {
                o.frame_rate = reelcut::GifFrameRate::try_from(fps).map_err(anyhow::Error::msg)?;
            }
            if args.quality.is_some() {
                anyhow::bail!("--quality only applies to MP4 exports");
            }
        }
    }
    Ok(config)
}

fn scene_from_args(args: &SceneArgs) -> reelcut::Composition {
    reelcut::Composition {
        padding_fraction: args.padding,
        mask: args
            .corner_radius
            .map(|radius_fraction| reelcut::VideoMask::RoundedRect { radius_fraction }),
        ..Default::default()
    }
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
