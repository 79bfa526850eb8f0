//! BrickScan: recognise LEGO parts from rendered images.
//!
//! The pipeline runs as four independent stages, each reading the previous
//! stage's output from disk:
//!
//! - `brickscan convert` - LDraw `.dat` parts to STL meshes through LDView
//! - `brickscan render` - one image per orientation for each whitelisted mesh
//! - `brickscan split` - copy class folders into `train/` and `val/` at 80/20
//! - `brickscan train` - fit the part classifier, print its accuracy and
//!   classify one image with it
//!
//! `brickscan predict <IMAGE>` classifies a single image with a saved model.
//!
//! Paths default to the names below a project root and can be set in
//! `brickscan.toml`; command-line flags win over the file.

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use ml_training::{EvaluationSplit, TrainingProfile};
use render_scene::{AngleTable, CameraFraming, OutputLayout};
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

/// LEGO part recognition pipeline
#[derive(Parser)]
#[command(name = "brickscan")]
#[command(about = "Convert, render, split, train and predict LEGO part images", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file (default: ./brickscan.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Project root the default paths are relative to
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert LDraw parts to STL meshes with LDView
    Convert(ConvertArgs),

    /// Render every whitelisted mesh from a fixed set of angles
    Render(RenderArgs),

    /// Split class folders into train and val sets
    Split(SplitArgs),

    /// Train the part classifier and report its accuracy
    Train(TrainArgs),

    /// Classify one image with a saved classifier
    Predict(PredictArgs),
}

#[derive(Args)]
struct ConvertArgs {
    /// LDraw library root to walk
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory receiving the STL files
    #[arg(long)]
    output: Option<PathBuf>,

    /// Directory whose .dat files are converted (repeatable; default: the
    /// library's parts and UnOfficial/parts)
    #[arg(long = "allow", value_name = "DIR")]
    allowed_dirs: Vec<PathBuf>,

    /// LDView executable
    #[arg(long)]
    ldview: Option<PathBuf>,
}

#[derive(Args)]
struct RenderArgs {
    /// Directory of STL meshes
    #[arg(long)]
    meshes: Option<PathBuf>,

    /// Root of the rendered images
    #[arg(long)]
    output: Option<PathBuf>,

    /// Comma-separated part name list
    #[arg(long, conflicts_with = "all")]
    whitelist: Option<PathBuf>,

    /// Render every mesh, ignoring the whitelist
    #[arg(long)]
    all: bool,

    /// Orientation table
    #[arg(long, value_enum)]
    angles: Option<AnglesArg>,

    /// Output file layout
    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,

    /// Camera distance policy
    #[arg(long, value_enum)]
    framing: Option<FramingArg>,

    /// Image width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    height: Option<u32>,
}

#[derive(Args)]
struct SplitArgs {
    /// Directory of class folders
    #[arg(long)]
    source: Option<PathBuf>,

    /// Directory receiving train/ and val/
    #[arg(long)]
    dest: Option<PathBuf>,

    /// Fraction of each class copied to train/
    #[arg(long)]
    ratio: Option<f64>,

    /// Seed for a reproducible split
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct TrainArgs {
    /// Preset epochs and evaluation split
    #[arg(long, value_enum)]
    profile: Option<ProfileArg>,

    /// Directory holding train/ and val/
    #[arg(long)]
    data: Option<PathBuf>,

    /// Number of epochs
    #[arg(long)]
    epochs: Option<usize>,

    /// Images per batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Split scored after training
    #[arg(long, value_enum)]
    evaluate: Option<SplitArg>,

    /// Square input edge in pixels
    #[arg(long)]
    input_size: Option<u32>,

    /// MobileNetV2 width multiplier
    #[arg(long)]
    width_multiplier: Option<f32>,

    /// Adam learning rate
    #[arg(long)]
    learning_rate: Option<f32>,

    /// Seed for shuffling and augmentation
    #[arg(long)]
    seed: Option<u64>,

    /// Pretrained extractor weights: a torchvision mobilenet_v2 state dict
    /// (.pth/.pt) or a Burn record (.bin/.json)
    #[arg(long)]
    backbone_weights: Option<PathBuf>,

    /// Save the trained classifier here (.bin or .json)
    #[arg(long)]
    checkpoint: Option<PathBuf>,

    /// Classify this image with the freshly trained model (default: the
    /// [predict] image, when it exists)
    #[arg(long, value_name = "IMAGE")]
    predict: Option<PathBuf>,
}

#[derive(Args)]
struct PredictArgs {
    /// Image to classify
    image: Option<PathBuf>,

    /// Saved classifier (default: the train checkpoint)
    #[arg(long)]
    checkpoint: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum AnglesArg {
    Tilted,
    Survey,
}

impl From<AnglesArg> for AngleTable {
    fn from(arg: AnglesArg) -> Self {
        match arg {
            AnglesArg::Tilted => Self::Tilted,
            AnglesArg::Survey => Self::Survey,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    PerClass,
    Flat,
}

impl From<LayoutArg> for OutputLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::PerClass => Self::PerClass,
            LayoutArg::Flat => Self::Flat,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FramingArg {
    Fixed,
    MaxExtent,
    Diagonal,
}

impl From<FramingArg> for CameraFraming {
    fn from(arg: FramingArg) -> Self {
        match arg {
            FramingArg::Fixed => Self::Fixed,
            FramingArg::MaxExtent => Self::MaxExtent,
            FramingArg::Diagonal => Self::Diagonal,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileArg {
    Scanner,
    Renders,
}

impl From<ProfileArg> for TrainingProfile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Scanner => Self::Scanner,
            ProfileArg::Renders => Self::Renders,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SplitArg {
    Train,
    Val,
}

impl From<SplitArg> for EvaluationSplit {
    fn from(arg: SplitArg) -> Self {
        match arg {
            SplitArg::Train => Self::Train,
            SplitArg::Val => Self::Val,
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(root) = cli.root {
        settings.root = root;
    }
    let settings = settings.rooted();

    match cli.command {
        Commands::Convert(args) => commands::convert(&settings, args),
        Commands::Render(args) => commands::render(&settings, args),
        Commands::Split(args) => commands::split(&settings, args),
        Commands::Train(args) => commands::train(&settings, args),
        Commands::Predict(args) => commands::predict(&settings, args),
    }
}
