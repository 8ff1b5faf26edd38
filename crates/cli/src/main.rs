use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use buswatch_core::announce::domain::announcement_policy::AnnouncementPolicy;
use buswatch_core::announce::domain::speech_synthesizer::{NullSynthesizer, SpeechSynthesizer};
use buswatch_core::announce::infrastructure::espeak_synthesizer::{
    EspeakSynthesizer, DEFAULT_VOICE,
};
use buswatch_core::capture::domain::frame_source::FrameSource;
use buswatch_core::capture::infrastructure::image_dir_source::ImageDirSource;
use buswatch_core::capture::infrastructure::video_file_source::VideoFileSource;
use buswatch_core::detection::domain::bus_detector::BusDetector;
use buswatch_core::detection::infrastructure::model_resolver;
use buswatch_core::detection::infrastructure::onnx_bus_detector::{
    OnnxBusDetector, DEFAULT_CONFIDENCE,
};
use buswatch_core::pipeline::infrastructure::threaded_pipeline_executor::ThreadedPipelineExecutor;
use buswatch_core::pipeline::pipeline_logger::{PipelineLogger, StdoutPipelineLogger};
use buswatch_core::pipeline::watch_use_case::WatchUseCase;
use buswatch_core::present::infrastructure::terminal_sink::TerminalSink;
use buswatch_core::shared::constants::{LABELS_NAME, MODEL_NAME};

/// Bus detection with spoken announcements, from a video file or an
/// image directory.
#[derive(Parser)]
#[command(name = "buswatch")]
struct Cli {
    /// Input video file or image directory.
    input: PathBuf,

    /// Model artifact: a path, or a name resolved via cache/bundled dir.
    #[arg(long, default_value = MODEL_NAME)]
    model: String,

    /// Labels file: a path, or a name resolved like the model.
    #[arg(long, default_value = LABELS_NAME)]
    labels: String,

    /// URL to download the model from when it isn't cached or bundled.
    #[arg(long)]
    model_url: Option<String>,

    /// URL to download the labels from when they aren't cached or bundled.
    #[arg(long)]
    labels_url: Option<String>,

    /// Directory holding bundled artifacts.
    #[arg(long, default_value = "models")]
    bundled_dir: PathBuf,

    /// Detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f32,

    /// Pace frames to the source fps, emulating a live camera.
    #[arg(long)]
    realtime: bool,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Disable spoken announcements.
    #[arg(long)]
    quiet: bool,

    /// espeak-ng voice for announcements.
    #[arg(long, default_value = DEFAULT_VOICE)]
    voice: String,

    /// Orientation correction for image directories (clockwise degrees:
    /// 0, 90, 180, 270). Video rotation is read from the container.
    #[arg(long, default_value = "0")]
    rotation: u32,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let detector = build_detector(&cli)?;
    let source = open_source(&cli);

    let mut synthesizer = build_synthesizer(&cli);
    let mut sink = TerminalSink::new();
    let mut logger = StdoutPipelineLogger::default();

    let mut session = WatchUseCase::new(
        source,
        detector,
        AnnouncementPolicy::new(),
        Box::new(ThreadedPipelineExecutor::new()),
        cli.realtime,
        cli.max_frames,
        None,
    );

    let result = session.execute(&mut sink, synthesizer.as_mut(), &mut logger);
    logger.summary();
    result
}

fn build_detector(cli: &Cli) -> Result<Box<dyn BusDetector>, Box<dyn std::error::Error>> {
    let model_path = resolve_artifact(&cli.model, cli.model_url.as_deref(), &cli.bundled_dir)?;
    let labels_path = resolve_artifact(&cli.labels, cli.labels_url.as_deref(), &cli.bundled_dir)?;

    log::info!("Model: {}", model_path.display());
    Ok(Box::new(OnnxBusDetector::new(
        &model_path,
        &labels_path,
        cli.confidence,
    )))
}

/// An existing path is used as-is; otherwise the name goes through the
/// cache → bundled → download resolution chain.
fn resolve_artifact(
    name_or_path: &str,
    url: Option<&str>,
    bundled_dir: &Path,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let direct = Path::new(name_or_path);
    if direct.exists() {
        return Ok(direct.to_path_buf());
    }

    let resolved = model_resolver::resolve(
        name_or_path,
        url,
        Some(bundled_dir),
        Some(Box::new(download_progress)),
    )?;
    eprintln!();
    Ok(resolved)
}

fn open_source(cli: &Cli) -> Box<dyn FrameSource> {
    if cli.input.is_dir() {
        Box::new(ImageDirSource::with_rotation(&cli.input, cli.rotation))
    } else {
        Box::new(VideoFileSource::new(&cli.input))
    }
}

/// Falls back to silence when the speech engine is unavailable: the
/// display keeps working, the failure is reported once.
fn build_synthesizer(cli: &Cli) -> Box<dyn SpeechSynthesizer> {
    if cli.quiet {
        return Box::new(NullSynthesizer::new());
    }
    match EspeakSynthesizer::new(&cli.voice) {
        Ok(synth) => Box::new(synth),
        Err(e) => {
            log::warn!("announcements disabled: {e}");
            Box::new(NullSynthesizer::new())
        }
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input not found: {}", cli.input.display()).into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if !matches!(cli.rotation, 0 | 90 | 180 | 270) {
        return Err(format!(
            "Rotation must be 0, 90, 180 or 270, got {}",
            cli.rotation
        )
        .into());
    }
    if cli.max_frames == Some(0) {
        return Err("Max frames must be at least 1".into());
    }
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading detection artifact... {pct}%");
    } else {
        eprint!("\rDownloading detection artifact... {downloaded} bytes");
    }
}
