//! Basket CLI - Command-line interface for Gesture Basket
//!
//! Commands:
//! - replay: Run recorded landmark frames through the pipeline (batch mode)
//! - run: Process frames and control commands from stdin (streaming mode)
//! - catalog: Print the product catalog
//! - doctor: Diagnose configuration and model files

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gesture_basket::detector::parse_ndjson;
use gesture_basket::{
    CentroidClassifier, CommandSpeech, FramePipeline, GestureError, Interpretation, LogSpeech,
    PipelineConfig, RecordedFrame, RecordedLandmarks, SessionSnapshot, SpeechDispatcher,
    BASKET_VERSION, PRODUCER_NAME,
};

type Pipeline = FramePipeline<RecordedLandmarks, CentroidClassifier>;

/// Basket - Debounced hand-gesture symbols for a shopping basket
#[derive(Parser)]
#[command(name = "basket")]
#[command(version = BASKET_VERSION)]
#[command(about = "Turn hand-gesture landmark streams into basket and text commits", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run recorded landmark frames through the pipeline (batch mode)
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Classifier model (nearest-centroid JSON)
        #[arg(short, long)]
        model: PathBuf,

        /// Pipeline configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Clock step for frames without a timestamp
        #[arg(long, default_value = "33")]
        frame_interval_ms: i64,

        /// Speech backend
        #[arg(long, default_value = "log")]
        speech: SpeechBackend,

        /// Synthesizer program for the command backend
        #[arg(long, default_value = "espeak")]
        speech_program: String,
    },

    /// Process frames and control commands from stdin (streaming mode)
    Run {
        /// Classifier model (nearest-centroid JSON)
        #[arg(short, long)]
        model: PathBuf,

        /// Pipeline configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Speech backend
        #[arg(long, default_value = "log")]
        speech: SpeechBackend,

        /// Synthesizer program for the command backend
        #[arg(long, default_value = "espeak")]
        speech_program: String,

        /// Flush output after each record (`--flush false` to buffer)
        #[arg(long, action = ArgAction::Set, default_value_t = true)]
        flush: bool,
    },

    /// Print the product catalog
    Catalog {
        /// Pipeline configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and model files
    Doctor {
        /// Pipeline configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Classifier model to check
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one event per line)
    Ndjson,
    /// JSON object with events and final session
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SpeechBackend {
    /// Log spoken text only
    Log,
    /// Run an external synthesizer program
    Command,
}

/// Control commands accepted by `run`
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ControlCommand {
    Pause,
    Reset,
    ClearBasket,
    Speak,
    Snapshot,
    Basket,
    Pending,
}

/// One line of `run` input: a control command or a frame record
#[derive(Debug)]
enum InputLine {
    Command(ControlCommand),
    Frame(RecordedFrame),
}

impl InputLine {
    /// Any object with a `command` key is a command, even a misspelled one
    fn parse(line: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(line)?;
        match value.get("command") {
            Some(command) => Ok(InputLine::Command(ControlCommand::deserialize(command)?)),
            None => Ok(InputLine::Frame(serde_json::from_value(value)?)),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), BasketCliError> {
    match cli.command {
        Commands::Replay {
            input,
            output,
            model,
            config,
            output_format,
            frame_interval_ms,
            speech,
            speech_program,
        } => {
            let speech = build_speech(speech, speech_program);
            cmd_replay(
                &input,
                &output,
                &model,
                config.as_deref(),
                output_format,
                frame_interval_ms,
                speech,
            )
        }

        Commands::Run {
            model,
            config,
            speech,
            speech_program,
            flush,
        } => {
            let speech = build_speech(speech, speech_program);
            cmd_run(&model, config.as_deref(), speech, flush)
        }

        Commands::Catalog { config, json } => cmd_catalog(config.as_deref(), json),

        Commands::Doctor {
            config,
            model,
            json,
        } => cmd_doctor(config.as_deref(), model.as_deref(), json),
    }
}

fn cmd_replay(
    input: &Path,
    output: &Path,
    model: &Path,
    config: Option<&Path>,
    output_format: OutputFormat,
    frame_interval_ms: i64,
    speech: SpeechDispatcher,
) -> Result<(), BasketCliError> {
    // Read input
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let frames = parse_ndjson(&input_data)?;
    if frames.is_empty() {
        return Err(BasketCliError::NoFrames);
    }

    let config = load_config(config)?;
    let classifier = load_model(model, &config)?;

    let step = Duration::milliseconds(frame_interval_ms);
    let started_at = frames
        .first()
        .and_then(|f| f.timestamp)
        .unwrap_or_else(Utc::now);

    let pipeline = Pipeline::new(&config, RecordedLandmarks, classifier, speech, started_at)?;

    let events = replay_frames(&pipeline, frames, started_at, step);

    info!(commits = events.len(), "replay finished");

    let report = ReplayReport {
        events,
        session: pipeline.session().snapshot(),
    };

    let output_data = format_output(&report, &output_format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

/// Feed frames through the pipeline; frames without a timestamp advance the
/// clock by `step`
fn replay_frames(
    pipeline: &Pipeline,
    frames: Vec<RecordedFrame>,
    started_at: DateTime<Utc>,
    step: Duration,
) -> Vec<CommitEvent> {
    let mut events: Vec<CommitEvent> = Vec::new();
    let mut clock = started_at;

    for (index, frame) in frames.into_iter().enumerate() {
        clock = frame.timestamp.unwrap_or(if index == 0 { clock } else { clock + step });

        let outcome = pipeline.process_frame_at(frame, clock);
        if let Some(interpretation) = outcome.interpretation {
            events.push(CommitEvent {
                frame_index: index,
                timestamp: clock,
                symbol: outcome.symbol,
                interpretation,
            });
        }
    }

    events
}

fn cmd_run(
    model: &Path,
    config: Option<&Path>,
    speech: SpeechDispatcher,
    flush: bool,
) -> Result<(), BasketCliError> {
    let config = load_config(config)?;
    let classifier = load_model(model, &config)?;
    let pipeline = Pipeline::new(&config, RecordedLandmarks, classifier, speech, Utc::now())?;
    let session = pipeline.session();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut frame_index: usize = 0;

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let input = match InputLine::parse(trimmed) {
            Ok(input) => input,
            Err(e) => {
                warn!(error = %e, "skipping unreadable line");
                continue;
            }
        };

        let response = match input {
            InputLine::Command(command) => match command {
                ControlCommand::Pause => {
                    Some(serde_json::json!({ "paused": session.toggle_pause() }))
                }
                ControlCommand::Reset => {
                    session.reset();
                    Some(serde_json::json!({ "reset": true }))
                }
                ControlCommand::ClearBasket => {
                    session.clear_basket();
                    Some(serde_json::json!({ "basket": [] }))
                }
                ControlCommand::Speak => {
                    let request_id = session.speak_sentence();
                    Some(serde_json::json!({ "speech_request": request_id }))
                }
                ControlCommand::Snapshot => Some(serde_json::to_value(session.snapshot())?),
                ControlCommand::Basket => {
                    Some(serde_json::json!({ "basket": session.get_basket() }))
                }
                ControlCommand::Pending => {
                    Some(serde_json::json!({ "pending_product": session.get_pending_product() }))
                }
            },
            InputLine::Frame(frame) => {
                if let Err(e) = frame.validate() {
                    warn!(error = %e, "skipping invalid frame");
                    continue;
                }

                let now = frame.timestamp.unwrap_or_else(Utc::now);
                let index = frame_index;
                frame_index += 1;

                let outcome = pipeline.process_frame_at(frame, now);
                match outcome.interpretation {
                    Some(interpretation) => Some(serde_json::to_value(CommitEvent {
                        frame_index: index,
                        timestamp: now,
                        symbol: outcome.symbol,
                        interpretation,
                    })?),
                    None => None,
                }
            }
        };

        if let Some(response) = response {
            writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
            if flush {
                stdout.flush()?;
            }
        }
    }

    stdout.flush()?;
    Ok(())
}

fn cmd_catalog(config: Option<&Path>, json: bool) -> Result<(), BasketCliError> {
    let config = load_config(config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config.catalog)?);
    } else {
        println!("Product Catalog");
        println!("===============");
        for product in config.catalog.products() {
            println!("  {:<10} {:>6.2}  {}", product.name, product.price, product.image);
        }
        println!();
        println!("Gesture labels:");
        for (index, label) in config.labels.iter().enumerate() {
            println!("  {:>2}: {:?}", index, label);
        }
    }

    Ok(())
}

fn cmd_doctor(config: Option<&Path>, model: Option<&Path>, json: bool) -> Result<(), BasketCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Gesture Basket version {}", BASKET_VERSION),
    });

    // Check configuration
    let loaded = match config {
        Some(path) => match PipelineConfig::from_file(path) {
            Ok(config) => {
                checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "Config valid (window {}, threshold {}, cooldown {}ms)",
                        config.window_capacity, config.commit_threshold, config.cooldown_ms
                    ),
                });
                config
            }
            Err(e) => {
                checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Invalid config: {}", e),
                });
                PipelineConfig::default()
            }
        },
        None => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: "Using built-in defaults".to_string(),
            });
            PipelineConfig::default()
        }
    };

    // Check model against the configuration
    if let Some(model_path) = model {
        match CentroidClassifier::from_file(model_path) {
            Ok(classifier) => checks.push(model_check(&classifier, &loaded)),
            Err(e) => checks.push(DoctorCheck {
                name: "model".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot load model: {}", e),
            }),
        }
    } else {
        checks.push(DoctorCheck {
            name: "model".to_string(),
            status: CheckStatus::Warning,
            message: "No model given; replay and run require --model".to_string(),
        });
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: BASKET_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Basket Doctor Report");
        println!("====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(BasketCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn model_check(classifier: &CentroidClassifier, config: &PipelineConfig) -> DoctorCheck {
    let length = classifier.feature_length().unwrap_or(0);

    if length != config.feature_length {
        DoctorCheck {
            name: "model".to_string(),
            status: CheckStatus::Error,
            message: format!(
                "Model expects {} features, config produces {}",
                length, config.feature_length
            ),
        }
    } else if classifier.class_count() > config.labels.len() {
        DoctorCheck {
            name: "model".to_string(),
            status: CheckStatus::Warning,
            message: format!(
                "Model has {} classes but only {} labels; extra classes will be dropped",
                classifier.class_count(),
                config.labels.len()
            ),
        }
    } else {
        DoctorCheck {
            name: "model".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "Model valid ({} classes, {} features)",
                classifier.class_count(),
                length
            ),
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig, BasketCliError> {
    match path {
        Some(path) => Ok(PipelineConfig::from_file(path)?),
        None => Ok(PipelineConfig::default()),
    }
}

fn load_model(path: &Path, config: &PipelineConfig) -> Result<CentroidClassifier, BasketCliError> {
    let classifier = CentroidClassifier::from_file(path)?;
    let length = classifier.feature_length().unwrap_or(0);
    if length != config.feature_length {
        return Err(BasketCliError::ModelMismatch {
            model: length,
            config: config.feature_length,
        });
    }
    Ok(classifier)
}

fn build_speech(backend: SpeechBackend, program: String) -> SpeechDispatcher {
    match backend {
        SpeechBackend::Log => SpeechDispatcher::new(LogSpeech),
        SpeechBackend::Command => SpeechDispatcher::new(CommandSpeech::new(program, Vec::new())),
    }
}

fn format_output(report: &ReplayReport, format: &OutputFormat) -> Result<String, BasketCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for event in &report.events {
                lines.push(serde_json::to_string(event)?);
            }
            lines.push(serde_json::to_string(&serde_json::json!({ "session": report.session }))?);
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(report)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(report)?),
    }
}

// Output types

#[derive(Serialize)]
struct CommitEvent {
    frame_index: usize,
    timestamp: DateTime<Utc>,
    symbol: String,
    #[serde(flatten)]
    interpretation: Interpretation,
}

#[derive(Serialize)]
struct ReplayReport {
    events: Vec<CommitEvent>,
    session: SessionSnapshot,
}

// Error types

#[derive(Debug)]
enum BasketCliError {
    Io(io::Error),
    Pipeline(GestureError),
    Json(serde_json::Error),
    NoFrames,
    ModelMismatch { model: usize, config: usize },
    DoctorFailed,
}

impl From<io::Error> for BasketCliError {
    fn from(e: io::Error) -> Self {
        BasketCliError::Io(e)
    }
}

impl From<GestureError> for BasketCliError {
    fn from(e: GestureError) -> Self {
        BasketCliError::Pipeline(e)
    }
}

impl From<serde_json::Error> for BasketCliError {
    fn from(e: serde_json::Error) -> Self {
        BasketCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<BasketCliError> for CliError {
    fn from(e: BasketCliError) -> Self {
        match e {
            BasketCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            BasketCliError::Pipeline(GestureError::Config(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Run 'basket doctor --config <file>' for details".to_string()),
            },
            BasketCliError::Pipeline(e) => CliError {
                code: "PIPELINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure frames are NDJSON with optional timestamp and landmarks".to_string()),
            },
            BasketCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            BasketCliError::NoFrames => CliError {
                code: "NO_FRAMES".to_string(),
                message: "No frames found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            BasketCliError::ModelMismatch { model, config } => CliError {
                code: "MODEL_MISMATCH".to_string(),
                message: format!("Model expects {} features, config produces {}", model, config),
                hint: Some("Set feature_length in the config to match the model".to_string()),
            },
            BasketCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
