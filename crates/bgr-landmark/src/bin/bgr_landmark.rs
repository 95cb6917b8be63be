//! bgr-landmark CLI: detect color-coded landmarks and build calibration records.

use std::path::{Path, PathBuf};

use bgr_landmark::detect::{
    bgr_from_rgb, preprocess_gray, DetectionReport, GrayChannel, PreprocessParams,
};
use bgr_landmark::{CalibrationRecord, GridLayout, LandmarkDetector, LandmarkParams};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "bgr-landmark")]
#[command(about = "Detect and decode color-coded 2x2 landmarks in images")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect landmarks in one image and write a JSON report.
    Detect(DetectArgs),

    /// Detect the 12-code grid in a set of images and write a calibration record.
    Calibrate(CalibrateArgs),
}

#[derive(Debug, Clone, Args)]
struct PipelineArgs {
    /// Detector parameters (JSON). Missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Histogram-equalize the gray frame.
    #[arg(long)]
    equalize: bool,

    /// Gaussian pre-blur kernel size (odd, 0 disables).
    #[arg(long, default_value_t = 0)]
    blur: usize,

    /// Signal used for the gray frame.
    #[arg(long, value_enum, default_value_t = ChannelArg::Luma)]
    channel: ChannelArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ChannelArg {
    Luma,
    Blue,
    Green,
    Red,
}

impl ChannelArg {
    fn to_core(self) -> GrayChannel {
        match self {
            Self::Luma => GrayChannel::Luma,
            Self::Blue => GrayChannel::Blue,
            Self::Green => GrayChannel::Green,
            Self::Red => GrayChannel::Red,
        }
    }
}

#[derive(Debug, Clone, Args)]
struct DetectArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Path to write the report; printed to stdout when omitted.
    #[arg(long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Debug, Clone, Args)]
struct CalibrateArgs {
    /// Input images, one frame each.
    #[arg(long, num_args = 1.., required = true)]
    images: Vec<PathBuf>,

    /// Grid cell spacing in board units.
    #[arg(long, default_value_t = 1.0)]
    spacing: f32,

    /// Path to write the calibration record (JSON).
    #[arg(long)]
    output: PathBuf,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

struct Pipeline {
    detector: LandmarkDetector,
    pre: PreprocessParams,
}

impl PipelineArgs {
    fn build(&self) -> CliResult<Pipeline> {
        let params = match &self.config {
            Some(path) => LandmarkParams::load_json(path).map_err(|e| -> CliError {
                format!("failed to load config {}: {e}", path.display()).into()
            })?,
            None => LandmarkParams::default(),
        };
        Ok(Pipeline {
            detector: LandmarkDetector::new(params),
            pre: PreprocessParams {
                equalize: self.equalize,
                blur_kernel: self.blur,
                channel: self.channel.to_core(),
            },
        })
    }
}

impl Pipeline {
    fn run(&self, path: &Path) -> CliResult<DetectionReport> {
        let img = image::open(path).map_err(|e| -> CliError {
            format!("failed to open image {}: {e}", path.display()).into()
        })?;
        let bgr = bgr_from_rgb(&img.to_rgb8());
        let gray = preprocess_gray(&bgr.view(), &self.pre);
        let det = self.detector.detect(&bgr.view(), &gray.view());
        info!(
            "{}: {}x{}, {} landmarks",
            path.display(),
            bgr.width,
            bgr.height,
            det.len()
        );
        Ok(DetectionReport::new(
            path.display().to_string(),
            bgr.width,
            bgr.height,
            det,
        ))
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Detect(args) => run_detect(&args),
        Commands::Calibrate(args) => run_calibrate(&args),
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(verbose: u8) {
    use bgr_landmark::core::{init_with_level, level_from_verbosity};
    let _ = init_with_level(level_from_verbosity(verbose));
}

#[cfg(feature = "tracing")]
fn init_logging(verbose: u8) {
    use bgr_landmark::core::{init_tracing, level_from_verbosity};
    let _ = tracing_log::LogTracer::init();
    init_tracing(false, level_from_verbosity(verbose));
}

fn run_detect(args: &DetectArgs) -> CliResult<()> {
    let pipeline = args.pipeline.build()?;
    let report = pipeline.run(&args.image)?;
    let json = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, &json)?;
            info!("report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_calibrate(args: &CalibrateArgs) -> CliResult<()> {
    let pipeline = args.pipeline.build()?;
    let mut record: Option<CalibrationRecord> = None;

    for path in &args.images {
        let report = pipeline.run(path)?;
        let size = [report.width as u32, report.height as u32];
        let rec = record
            .get_or_insert_with(|| CalibrationRecord::new(GridLayout::default(), args.spacing, size));
        if rec.image_size != size {
            warn!(
                "{}: size {}x{} differs from {}x{}, skipped",
                report.image, size[0], size[1], rec.image_size[0], rec.image_size[1]
            );
            continue;
        }
        if let Err(v) = rec.try_add_frame(report.image.clone(), &report.landmarks) {
            warn!("{}: {v}", report.image);
        }
    }

    let record = record.ok_or("no images given")?;
    println!(
        "accepted {}/{} frames",
        record.frame_count(),
        args.images.len()
    );
    record.write_json(&args.output)?;
    info!("calibration record written to {}", args.output.display());
    Ok(())
}
