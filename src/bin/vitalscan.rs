//! Vitalscan CLI - Command-line interface for the scan evaluation engine
//!
//! Commands:
//! - evaluate: Evaluate a measurement JSON document into a display report
//! - validate: Check a measurement for plausibility
//! - simulate: Run a synthetic scan end to end, printing capture progress
//! - submit: Run a scan against the remote analysis API
//! - schema: Print the measurement schema

use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use vitalscan::capture::{CapturePhase, CaptureTimeline};
use vitalscan::config::{EngineConfig, LatencyWindow};
use vitalscan::pipeline::{assess, parse_measurement, ScanProcessor};
use vitalscan::report::ReportEncoder;
use vitalscan::source::{RemoteAnalysisSource, SyntheticSource};
use vitalscan::types::{CaptureDescriptor, ScanMode};
use vitalscan::validator::Validator;
use vitalscan::{ScanError, PRODUCER_NAME, VITALSCAN_VERSION};

/// Vitalscan - Evaluate camera-based heart rate and face wellness scans
#[derive(Parser)]
#[command(name = "vitalscan")]
#[command(version = VITALSCAN_VERSION)]
#[command(about = "Evaluate wellness scan results", long_about = None)]
struct Cli {
    /// Engine configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print JSON output (default when stdout is a terminal)
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a measurement into a display report
    Evaluate {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Scan mode the sample was captured in
        #[arg(short, long, value_enum)]
        mode: ModeArg,
    },

    /// Validate a measurement (exits non-zero when invalid)
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        #[arg(short, long, value_enum)]
        mode: ModeArg,

        /// Output validation result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a synthetic scan end to end
    Simulate {
        #[arg(short, long, value_enum)]
        mode: ModeArg,

        /// Seed for reproducible samples
        #[arg(long)]
        seed: Option<u64>,

        /// Recording length in seconds (defaults to the mode's duration)
        #[arg(long)]
        duration: Option<f64>,

        /// Wait in real time between capture steps and during analysis
        #[arg(long)]
        realtime: bool,

        /// Cancel the scan after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Submit a scan to the remote analysis API
    Submit {
        #[arg(short, long, value_enum)]
        mode: ModeArg,

        /// Video reference sent to the API
        #[arg(long)]
        video_uri: Option<String>,

        /// Recording length in seconds (defaults to the mode's duration)
        #[arg(long)]
        duration: Option<f64>,

        /// Override the configured API base URL
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Print the measurement schema
    Schema {
        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Finger over the camera and flash
    Ppg,
    /// Face in front of the camera
    Face,
}

impl From<ModeArg> for ScanMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Ppg => ScanMode::Ppg,
            ModeArg::Face => ScanMode::Face,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` directives when present and parseable, otherwise warnings only
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

async fn run(cli: Cli) -> Result<(), VitalscanCliError> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let pretty = cli.pretty || atty::is(atty::Stream::Stdout);

    match cli.command {
        Commands::Evaluate { input, mode } => cmd_evaluate(&input, mode.into(), &config, pretty),

        Commands::Validate { input, mode, json } => cmd_validate(&input, mode.into(), json),

        Commands::Simulate {
            mode,
            seed,
            duration,
            realtime,
            timeout,
        } => {
            let descriptor = descriptor(mode.into(), duration, None);
            cmd_simulate(descriptor, seed, realtime, timeout, &config, pretty).await
        }

        Commands::Submit {
            mode,
            video_uri,
            duration,
            base_url,
        } => {
            let descriptor = descriptor(mode.into(), duration, video_uri);
            cmd_submit(descriptor, base_url, &config, pretty).await
        }

        Commands::Schema { json_schema } => cmd_schema(json_schema),
    }
}

fn descriptor(mode: ScanMode, duration: Option<f64>, video_uri: Option<String>) -> CaptureDescriptor {
    let mut descriptor = CaptureDescriptor::new(mode);
    if let Some(seconds) = duration {
        descriptor = descriptor.with_duration(seconds);
    }
    if let Some(uri) = video_uri {
        descriptor = descriptor.with_video_uri(uri);
    }
    descriptor
}

fn read_input(input: &Path) -> Result<String, VitalscanCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), VitalscanCliError> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{output}");
    Ok(())
}

fn cmd_evaluate(
    input: &Path,
    mode: ScanMode,
    config: &EngineConfig,
    pretty: bool,
) -> Result<(), VitalscanCliError> {
    let input_data = read_input(input)?;
    let (sample, message) = parse_measurement(&input_data)?;

    let mut evaluation = assess(&sample, mode);
    evaluation.status_message = message;

    let report = ReportEncoder::with_palette(config.palette.clone())
        .with_display_offset(config.display.offset()?)
        .encode(&evaluation);
    print_json(&report, pretty)
}

fn cmd_validate(input: &Path, mode: ScanMode, json: bool) -> Result<(), VitalscanCliError> {
    let input_data = read_input(input)?;
    let (sample, _) = parse_measurement(&input_data)?;
    let validation = Validator::validate(&sample, mode);

    if json {
        println!("{}", serde_json::to_string_pretty(&validation)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Mode:  {}", mode);
        println!("Valid: {}", validation.is_valid);

        if !validation.errors.is_empty() {
            println!("\nErrors:");
            for err in &validation.errors {
                println!("  - {}", err);
            }
        }
    }

    if validation.is_valid {
        Ok(())
    } else {
        Err(VitalscanCliError::ValidationFailed(validation.errors.len()))
    }
}

async fn cmd_simulate(
    descriptor: CaptureDescriptor,
    seed: Option<u64>,
    realtime: bool,
    timeout: Option<u64>,
    config: &EngineConfig,
    pretty: bool,
) -> Result<(), VitalscanCliError> {
    descriptor.validate()?;

    let mut synthetic = config.synthetic.clone();
    if seed.is_some() {
        synthetic.seed = seed;
    }
    if !realtime {
        synthetic.ppg_latency = LatencyWindow::instant();
        synthetic.face_latency = LatencyWindow::instant();
    }

    let cancel = cancel_after(timeout);

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    run_capture(&descriptor, &mut rng, realtime, &cancel).await?;

    let processor = ScanProcessor::with_palette(SyntheticSource::new(synthetic), config.palette.clone())
        .with_display_offset(config.display.offset()?);
    let report = processor.scan(&descriptor, &cancel).await?;
    print_json(&report, pretty)
}

async fn cmd_submit(
    descriptor: CaptureDescriptor,
    base_url: Option<String>,
    config: &EngineConfig,
    pretty: bool,
) -> Result<(), VitalscanCliError> {
    let mut remote = config.remote.clone();
    if let Some(url) = base_url {
        remote.base_url = url;
    }

    let source = RemoteAnalysisSource::new(&remote)?;
    eprintln!("Submitting {} scan to {}", descriptor.mode, source.endpoint(descriptor.mode));

    let processor = ScanProcessor::with_palette(source, config.palette.clone())
        .with_display_offset(config.display.offset()?);
    let report = processor.scan(&descriptor, &CancellationToken::new()).await?;
    print_json(&report, pretty)
}

/// Token that fires after `timeout` seconds, if given
fn cancel_after(timeout: Option<u64>) -> CancellationToken {
    let cancel = CancellationToken::new();
    if let Some(seconds) = timeout {
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(seconds)).await;
            token.cancel();
        });
    }
    cancel
}

/// Step the capture timeline to completion, printing each phase to stderr
async fn run_capture(
    descriptor: &CaptureDescriptor,
    rng: &mut StdRng,
    realtime: bool,
    cancel: &CancellationToken,
) -> Result<(), VitalscanCliError> {
    let mut timeline = CaptureTimeline::new(descriptor);
    let mut phase = timeline.start();

    while !timeline.is_complete() {
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled.into());
        }

        let pause = match phase {
            CapturePhase::Idle | CapturePhase::Complete => Duration::ZERO,
            CapturePhase::Countdown { remaining } => {
                eprintln!("Starting in {remaining}...");
                Duration::from_secs(1)
            }
            CapturePhase::Recording { elapsed, total } => {
                eprintln!("Recording {elapsed}/{total}s");
                Duration::from_secs(1)
            }
            CapturePhase::Processing { percent } => {
                eprintln!("Processing {percent:.0}%");
                Duration::from_millis(300)
            }
        };

        if realtime {
            tokio::time::sleep(pause).await;
        }

        phase = match phase {
            CapturePhase::Processing { .. } => timeline.advance_processing_with(rng),
            _ => timeline.tick(),
        };
    }

    eprintln!("Processing complete");
    Ok(())
}

fn cmd_schema(json_schema: bool) -> Result<(), VitalscanCliError> {
    if json_schema {
        println!("{}", measurement_json_schema());
    } else {
        println!("Measurement Schema ({} {})", PRODUCER_NAME, VITALSCAN_VERSION);
        println!();
        println!("A measurement is a JSON object; every metric is optional.");
        println!("An analysis envelope {{\"success\", \"data\", \"message\"}} is also accepted.");
        println!();
        println!("Finger scans (ppg):");
        println!("  - bpm (beats/min), hrv (ms), quality (0-1)");
        println!("  - signal_strength (0-1), processing_time (ms)");
        println!();
        println!("Face scans (face):");
        println!("  - stress_score (0-1), fatigue_score (0-1), face_wellness (0-100)");
        println!("  - respiratory_rate, face_detection_confidence, lighting_quality");
        println!("  - skin_tone_analysis {{detected, consistency}}");
        println!();
        println!("Common: timestamp (RFC 3339), confidence (high | medium | low)");
    }
    Ok(())
}

fn measurement_json_schema() -> String {
    let number = || serde_json::json!({ "type": "number" });
    let fraction = || serde_json::json!({ "type": "number", "minimum": 0, "maximum": 1 });

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "vitalscan.measurement",
        "description": "Raw physiological sample produced by a scan",
        "type": "object",
        "properties": {
            "bpm": number(),
            "hrv": { "type": "number", "minimum": 0 },
            "quality": fraction(),
            "stress_score": fraction(),
            "fatigue_score": fraction(),
            "face_wellness": { "type": "number", "minimum": 0, "maximum": 100 },
            "respiratory_rate": number(),
            "face_detection_confidence": fraction(),
            "lighting_quality": fraction(),
            "signal_strength": fraction(),
            "skin_tone_analysis": {
                "type": "object",
                "properties": {
                    "detected": { "type": "boolean" },
                    "consistency": { "type": "string" }
                }
            },
            "processing_time": { "type": "integer", "minimum": 0 },
            "timestamp": { "type": "string", "format": "date-time" },
            "confidence": {
                "type": "string",
                "enum": ["high", "medium", "low"]
            }
        }
    })
    .to_string()
}

// Error handling

#[derive(Debug)]
enum VitalscanCliError {
    Io(io::Error),
    Scan(ScanError),
    Json(serde_json::Error),
    ValidationFailed(usize),
}

impl From<io::Error> for VitalscanCliError {
    fn from(e: io::Error) -> Self {
        VitalscanCliError::Io(e)
    }
}

impl From<ScanError> for VitalscanCliError {
    fn from(e: ScanError) -> Self {
        VitalscanCliError::Scan(e)
    }
}

impl From<serde_json::Error> for VitalscanCliError {
    fn from(e: serde_json::Error) -> Self {
        VitalscanCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(code: &str, message: String, hint: &str) -> Self {
        Self {
            code: code.to_string(),
            message,
            hint: Some(hint.to_string()),
        }
    }
}

impl From<VitalscanCliError> for CliError {
    fn from(e: VitalscanCliError) -> Self {
        match e {
            VitalscanCliError::Io(e) => {
                CliError::new("IO_ERROR", e.to_string(), "Check file paths and permissions")
            }
            VitalscanCliError::Json(e) => CliError::new("JSON_ERROR", e.to_string(), "Check JSON syntax"),
            VitalscanCliError::ValidationFailed(count) => CliError::new(
                "VALIDATION_FAILED",
                format!("{} validation checks failed", count),
                "Retake the scan in better conditions",
            ),
            VitalscanCliError::Scan(e) => {
                let message = e.to_string();
                match e {
                    ScanError::JsonError(_) => CliError::new(
                        "PARSE_ERROR",
                        message,
                        "Run 'vitalscan schema' for the measurement shape",
                    ),
                    ScanError::InvalidDescriptor(_) | ScanError::UnsupportedMode(_) => {
                        CliError::new("INVALID_ARGUMENT", message, "Check --mode and --duration")
                    }
                    ScanError::Transport(_) | ScanError::Api { .. } => CliError::new(
                        "REMOTE_ERROR",
                        message,
                        "Check that the analysis API is reachable, then retry the scan",
                    ),
                    ScanError::AnalysisRejected(_) => {
                        CliError::new("ANALYSIS_REJECTED", message, "Retry the scan")
                    }
                    ScanError::Cancelled => CliError::new(
                        "CANCELLED",
                        message,
                        "Increase --timeout or omit it",
                    ),
                    ScanError::Config(_) => {
                        CliError::new("CONFIG_ERROR", message, "Check the --config file")
                    }
                    ScanError::EncodingError(_) => {
                        CliError::new("ENCODING_ERROR", message, "Report this as a bug")
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_log_filter_honors_global_level() {
        assert_eq!(log_filter(Some("debug")).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(log_filter(Some("trace")).max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn test_log_filter_defaults_to_warn() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(log_filter(Some("vitalscan=loud")).max_level_hint(), Some(LevelFilter::WARN));
    }
}
