use std::{
    fs::{self, File},
    io::BufReader,
    path::PathBuf,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use jitterline::{
    DetectionMode, FrameSequence, GifSink, Pipeline, Rgb8, Settings, SynthOpts, export,
};

#[derive(Parser, Debug)]
#[command(name = "jitterline", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the jittered frame loop into a looping animated GIF.
    Gif(GifArgs),
    /// Dump the synthesized frames as numbered PNGs.
    Frames(FramesArgs),
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// Input image (PNG, JPEG, ...).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Settings JSON; explicit flags override its fields.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Detection threshold (0..=500).
    #[arg(long)]
    threshold: Option<u16>,

    /// Maximum displacement in output pixels (0..=10).
    #[arg(long)]
    jitter: Option<f32>,

    /// Milliseconds per displayed frame (also the GIF frame delay).
    #[arg(long)]
    speed: Option<u32>,

    /// Frames per loop (2..=8).
    #[arg(long)]
    frames: Option<u32>,

    /// Line color as #RRGGBB.
    #[arg(long)]
    line_color: Option<Rgb8>,

    /// Background color as #RRGGBB.
    #[arg(long)]
    bg_color: Option<Rgb8>,

    /// Output scale factor (> 0).
    #[arg(long)]
    scale: Option<f32>,

    /// Keep the source pixel's color for line pixels.
    #[arg(long)]
    original_colors: bool,

    /// Line detection mode.
    #[arg(long, value_enum)]
    mode: Option<ModeChoice>,

    /// Base RNG seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,

    /// Synthesize frames in parallel.
    #[arg(long)]
    parallel: bool,
}

#[derive(Parser, Debug)]
struct GifArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Output GIF path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct FramesArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Output directory for frame_NNN.png files.
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeChoice {
    Brightness,
    Edge,
}

impl From<ModeChoice> for DetectionMode {
    fn from(choice: ModeChoice) -> Self {
        match choice {
            ModeChoice::Brightness => Self::Brightness,
            ModeChoice::Edge => Self::Edge,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Gif(args) => cmd_gif(args),
        Command::Frames(args) => cmd_frames(args),
    }
}

fn load_settings(common: &CommonArgs) -> anyhow::Result<Settings> {
    let mut settings = match &common.settings {
        Some(path) => {
            let f = File::open(path)
                .with_context(|| format!("open settings '{}'", path.display()))?;
            serde_json::from_reader(BufReader::new(f)).with_context(|| "parse settings JSON")?
        }
        None => Settings::default(),
    };

    if let Some(v) = common.threshold {
        settings.threshold = v;
    }
    if let Some(v) = common.jitter {
        settings.jitter_amount = v;
    }
    if let Some(v) = common.speed {
        settings.jitter_speed_ms = v;
    }
    if let Some(v) = common.frames {
        settings.frame_count = v;
    }
    if let Some(v) = common.line_color {
        settings.line_color = v;
    }
    if let Some(v) = common.bg_color {
        settings.bg_color = v;
    }
    if let Some(v) = common.scale {
        settings.scale = v;
    }
    if common.original_colors {
        settings.use_original_colors = true;
    }
    if let Some(m) = common.mode {
        settings.detection_mode = m.into();
    }

    settings.validate()?;
    Ok(settings)
}

fn generate(common: &CommonArgs, settings: &Settings) -> anyhow::Result<FrameSequence> {
    let bytes = fs::read(&common.in_path)
        .with_context(|| format!("read input '{}'", common.in_path.display()))?;
    let source_id = common.in_path.display().to_string();

    let opts = SynthOpts {
        seed: common.seed,
        parallel: common.parallel,
        frame_count: None,
    };

    let mut pipeline = Pipeline::new();
    let sequence = pipeline
        .regenerate(&source_id, &bytes, settings, &opts)?
        .clone();
    Ok(sequence)
}

fn cmd_gif(args: GifArgs) -> anyhow::Result<()> {
    let settings = load_settings(&args.common)?;
    let sequence = generate(&args.common, &settings)?;

    let mut sink = GifSink::new();
    let Some(artifact) = export(&sequence, &settings, &mut sink)? else {
        anyhow::bail!("no frames were generated");
    };

    if let Some(parent) = args.out.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    fs::write(&args.out, &artifact.bytes)
        .with_context(|| format!("write gif '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_frames(args: FramesArgs) -> anyhow::Result<()> {
    let settings = load_settings(&args.common)?;
    let sequence = generate(&args.common, &settings)?;

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    for (i, frame) in sequence.frames().iter().enumerate() {
        let path = args.out_dir.join(format!("frame_{i:03}.png"));
        image::save_buffer_with_format(
            &path,
            &frame.data,
            frame.width,
            frame.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
    }

    eprintln!("wrote {} frames to {}", sequence.len(), args.out_dir.display());
    Ok(())
}
