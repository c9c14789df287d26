//! aruco-nav CLI: marker generation, multi-marker scanning and steering guidance.

use aruco_nav::markers::{builtins, ArucoDetector, DetectorError, DetectorParams};
use aruco_nav::{
    generate_marker, Display, DictionarySource, FrameSource, FrameSourceError, GenerateError,
    GenerateRequest, HeadlessDisplay, ImageSequenceSource, ScanMode, ScanSession, SessionConfig,
    SessionError, DEFAULT_DEAD_ZONE,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

#[cfg(feature = "opencv")]
mod camera;

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Detector(#[from] DetectorError),
    #[error(transparent)]
    Source(#[from] FrameSourceError),
    #[error(transparent)]
    Display(#[from] aruco_nav::DisplayError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[cfg_attr(not(feature = "opencv"), allow(dead_code))]
    #[error("{0}")]
    Usage(String),
}

type CliResult<T> = Result<T, CliError>;

/// Wider than any capture frame; larger values only mean "always centered".
const MAX_DEAD_ZONE: i64 = 100_000;

#[derive(Parser)]
#[command(name = "aruco-nav")]
#[command(about = "Generate ArUco markers, scan frames for them and derive steering hints")]
#[command(version)]
struct Cli {
    /// Log verbosity on stderr.
    #[arg(long, value_enum, global = true, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Emit logs as JSON through `tracing` (RUST_LOG filters).
    #[cfg(feature = "tracing")]
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a printable marker image as aruco_marker_id_<id>.png.
    Generate(GenerateArgs),

    /// List every marker found in each frame.
    Scan(ScanArgs),

    /// Print left / right / centered instructions from the first marker.
    Guide(GuideArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Args)]
struct DictionaryArgs {
    /// Built-in dictionary name.
    #[arg(long, default_value = builtins::DEFAULT_DICTIONARY, conflicts_with = "dictionary_file")]
    dictionary: String,

    /// Dictionary JSON file (`name`, `marker_size`, `max_correction_bits`, `codes`).
    #[arg(long)]
    dictionary_file: Option<PathBuf>,
}

impl DictionaryArgs {
    fn source(&self) -> DictionarySource {
        match &self.dictionary_file {
            Some(path) => DictionarySource::File(path.clone()),
            None => DictionarySource::Builtin(self.dictionary.clone()),
        }
    }
}

#[derive(Debug, Clone, Args)]
struct GenerateArgs {
    /// Marker id within the dictionary.
    #[arg(long, default_value_t = 42)]
    id: u32,

    /// Side length of the output image in pixels.
    #[arg(long, default_value_t = 500)]
    size: usize,

    /// Black border width in cells.
    #[arg(long, default_value_t = 1)]
    border_bits: usize,

    #[command(flatten)]
    dictionary: DictionaryArgs,

    /// Directory for the PNG.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Show the marker in a window until a key is pressed.
    #[arg(long)]
    show: bool,
}

#[derive(Debug, Clone, Args)]
struct ScanArgs {
    /// Image files, or a single directory of images, used as frames.
    #[arg(long, num_args = 1.., conflicts_with = "camera")]
    frames: Vec<PathBuf>,

    /// Capture device index (needs the `opencv` feature).
    #[arg(long)]
    camera: Option<i32>,

    #[command(flatten)]
    dictionary: DictionaryArgs,

    /// Key that stops the loop. Defaults to `q` for scan and `a` for guide.
    #[arg(long)]
    quit_key: Option<char>,

    /// Detector parameters as JSON; missing fields keep their defaults.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Write annotated frames into this directory.
    #[arg(long)]
    save_annotated: Option<PathBuf>,

    /// Print one JSON object per frame instead of text.
    #[arg(long)]
    json: bool,

    /// Never open a window, even when built with `opencv`.
    #[arg(long)]
    no_window: bool,
}

#[derive(Debug, Clone, Args)]
struct GuideArgs {
    #[command(flatten)]
    scan: ScanArgs,

    /// Half-width in pixels of the centered band.
    #[arg(long, default_value_t = DEFAULT_DEAD_ZONE, value_parser = clap::value_parser!(u32).range(0..=MAX_DEAD_ZONE))]
    dead_zone: u32,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = match cli.command {
        Commands::Generate(args) => run_generate(&args),
        Commands::Scan(args) => run_scan(&args, ScanMode::Markers, DEFAULT_DEAD_ZONE),
        Commands::Guide(args) => run_scan(&args.scan, ScanMode::Guidance, args.dead_zone),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    #[cfg(feature = "tracing")]
    {
        if cli.log_json || std::env::var_os("RUST_LOG").is_some() {
            aruco_nav_core::init_tracing(cli.log_json);
            return;
        }
    }
    // A second logger cannot be installed; the first one keeps working.
    let _ = aruco_nav_core::init_with_level(cli.log_level.to_filter());
}

// ── generate ──────────────────────────────────────────────────────────

fn run_generate(args: &GenerateArgs) -> CliResult<()> {
    let req = GenerateRequest {
        dictionary: args.dictionary.source(),
        id: args.id,
        side_px: args.size,
        border_bits: args.border_bits,
        out_dir: args.out_dir.clone(),
    };

    let marker = generate_marker(&req)?;
    println!("Success! Generated ArUco marker with ID {}.", marker.id);
    println!("Image saved as: '{}'", marker.path.display());

    if args.show {
        show_marker(&marker)?;
    }
    Ok(())
}

#[cfg(feature = "opencv")]
fn show_marker(marker: &aruco_nav::GeneratedMarker) -> CliResult<()> {
    let gray = image::GrayImage::from_raw(
        marker.image.width as u32,
        marker.image.height as u32,
        marker.image.data.clone(),
    )
    .ok_or_else(|| CliError::Usage("marker image has inconsistent size".to_string()))?;
    let rgb = image::DynamicImage::ImageLuma8(gray).to_rgb8();

    let mut window = camera::HighGuiDisplay::new();
    window.show_until_key("Generated ArUco marker", &rgb)?;
    window.close()?;
    Ok(())
}

#[cfg(not(feature = "opencv"))]
fn show_marker(_marker: &aruco_nav::GeneratedMarker) -> CliResult<()> {
    log::warn!("built without the `opencv` feature; --show ignored");
    Ok(())
}

// ── scan / guide ──────────────────────────────────────────────────────

fn run_scan(args: &ScanArgs, mode: ScanMode, dead_zone: u32) -> CliResult<()> {
    let params = match &args.params {
        Some(path) => DetectorParams::from_json_file(path)?,
        None => DetectorParams::default(),
    };
    let dictionary = args.dictionary.source().load()?;
    log::debug!("scanning with dictionary {}", dictionary.name);
    let detector = ArucoDetector::new(dictionary, params)?;

    let mut config = SessionConfig::new(mode);
    if let Some(key) = args.quit_key {
        config.quit_key = key;
    }
    config.dead_zone = dead_zone;
    config.json_lines = args.json;

    let source = open_source(args)?;
    let display = open_display(args)?;

    let stdout = std::io::stdout();
    let summary = ScanSession::new(source, display, stdout.lock(), detector, config).run()?;
    log::info!(
        "{} frames, {} with markers, stopped by {:?}",
        summary.frames,
        summary.frames_with_markers,
        summary.stop_reason
    );
    Ok(())
}

fn open_source(args: &ScanArgs) -> CliResult<Box<dyn FrameSource>> {
    if !args.frames.is_empty() {
        return Ok(Box::new(ImageSequenceSource::open(&args.frames)?));
    }
    open_camera(args.camera.unwrap_or(0))
}

#[cfg(feature = "opencv")]
fn open_camera(index: i32) -> CliResult<Box<dyn FrameSource>> {
    Ok(Box::new(camera::CameraSource::open(index)?))
}

#[cfg(not(feature = "opencv"))]
fn open_camera(index: i32) -> CliResult<Box<dyn FrameSource>> {
    Err(FrameSourceError::Unavailable(format!(
        "camera {index} requested but this build has no `opencv` feature; use --frames"
    ))
    .into())
}

fn open_display(args: &ScanArgs) -> CliResult<Box<dyn Display>> {
    if !args.no_window {
        if let Some(window) = open_window(args) {
            return Ok(window);
        }
    }
    let headless = match &args.save_annotated {
        Some(dir) => HeadlessDisplay::saving_to(dir)?,
        None => HeadlessDisplay::new(),
    };
    Ok(Box::new(headless))
}

#[cfg(feature = "opencv")]
fn open_window(args: &ScanArgs) -> Option<Box<dyn Display>> {
    if args.save_annotated.is_some() {
        log::warn!("--save-annotated is ignored while a window is open; add --no-window");
    }
    Some(Box::new(camera::HighGuiDisplay::new()))
}

#[cfg(not(feature = "opencv"))]
fn open_window(_args: &ScanArgs) -> Option<Box<dyn Display>> {
    None
}
