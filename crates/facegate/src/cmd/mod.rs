use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use facegate_decision::{DetectionModel, Tolerance};
use facegate_session::StopSignal;
use facegate_transport::TransportKind;

use crate::exit::{CliError, CliResult, INTERNAL};
use crate::output::OutputFormat;

pub mod camera;
pub mod encode;
pub mod gate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the decision node: accept one camera and answer its frames.
    Gate(GateArgs),
    /// Run the camera node: stream images and unlock on grants.
    Camera(CameraArgs),
    /// Compute face embeddings from images into a known-faces file.
    Encode(EncodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Gate(args) => gate::run(args, format),
        Command::Camera(args) => camera::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct GateArgs {
    /// Bind address.
    #[arg(default_value = "localhost", env = "FACEGATE_HOST")]
    pub host: String,
    /// Bind port; 0 picks a free one.
    #[arg(short = 'P', long, default_value_t = 0, env = "FACEGATE_PORT")]
    pub port: u16,
    /// Transport protocol.
    #[arg(short = 'p', long = "proto", default_value = "tcp", env = "FACEGATE_PROTO")]
    pub proto: TransportKind,
    /// Largest embedding distance counted as a match.
    #[arg(long, default_value = "0.6", env = "FACEGATE_TOLERANCE")]
    pub tolerance: Tolerance,
    /// Face localization model passed to the detector.
    #[arg(long, default_value = "hog", env = "FACEGATE_MODEL")]
    pub model: DetectionModel,
    /// Known faces that may enter.
    #[arg(long, value_name = "FILE", default_value = "memory/allow.json", env = "FACEGATE_ALLOW")]
    pub allow: PathBuf,
    /// Known faces that may not enter.
    #[arg(long, value_name = "FILE", default_value = "memory/deny.json", env = "FACEGATE_DENY")]
    pub deny: PathBuf,
    /// Detection helper program.
    #[arg(long, value_name = "CMD", env = "FACEGATE_DETECTOR")]
    pub detector: String,
    /// Extra argument for the detection helper (repeatable).
    #[arg(long = "detector-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub detector_args: Vec<String>,
    /// How ambiguous frames are resolved.
    #[arg(long, value_enum, default_value_t = FallbackKind::Prompt, env = "FACEGATE_FALLBACK")]
    pub fallback: FallbackKind,
    /// Where the prompt fallback writes annotated previews.
    #[arg(long, value_name = "DIR", default_value = "previews", env = "FACEGATE_PREVIEW_DIR")]
    pub preview_dir: PathBuf,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FallbackKind {
    /// Ask on the terminal.
    Prompt,
    /// Deny without asking.
    Deny,
}

#[derive(Args, Debug)]
pub struct CameraArgs {
    /// Decision node address.
    #[arg(default_value = "localhost", env = "FACEGATE_HOST")]
    pub host: String,
    /// Decision node port.
    #[arg(short = 'P', long, env = "FACEGATE_PORT")]
    pub port: u16,
    /// Transport protocol.
    #[arg(short = 'p', long = "proto", default_value = "tcp", env = "FACEGATE_PROTO")]
    pub proto: TransportKind,
    /// Seconds between sending a frame and reading its answer.
    #[arg(short = 'd', long, default_value = "3", value_parser = parse_seconds, env = "FACEGATE_DELAY")]
    pub delay: Duration,
    /// Seconds the door stays unlocked.
    #[arg(long, default_value = "3", value_parser = parse_seconds, env = "FACEGATE_DWELL")]
    pub dwell: Duration,
    /// Loop over the images until interrupted.
    #[arg(long)]
    pub repeat: bool,
    /// Command that unlocks the door (whitespace separated).
    #[arg(long, value_name = "CMD", requires = "lock_cmd", env = "FACEGATE_UNLOCK_CMD")]
    pub unlock_cmd: Option<String>,
    /// Command that locks the door (whitespace separated).
    #[arg(long, value_name = "CMD", requires = "unlock_cmd", env = "FACEGATE_LOCK_CMD")]
    pub lock_cmd: Option<String>,
    /// Images to stream, in order.
    #[arg(required = true, value_name = "IMAGES")]
    pub images: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// File to write the embeddings to.
    #[arg(short = 'e', long, value_name = "FILE", default_value = "memory/faces.json")]
    pub encodings: PathBuf,
    /// Face localization model passed to the detector.
    #[arg(short = 'f', long = "face-detection-model", default_value = "hog")]
    pub model: DetectionModel,
    /// Detection helper program.
    #[arg(long, value_name = "CMD", env = "FACEGATE_DETECTOR")]
    pub detector: String,
    /// Extra argument for the detection helper (repeatable).
    #[arg(long = "detector-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub detector_args: Vec<String>,
    /// Images to encode.
    #[arg(value_name = "IMAGES")]
    pub images: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn parse_seconds(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|e| format!("invalid seconds '{raw}': {e}"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid seconds '{raw}': {e}"))
}

/// Install a Ctrl-C handler that sets the returned signal.
pub(crate) fn install_stop_handler() -> CliResult<StopSignal> {
    let stop = StopSignal::new();
    let handle = stop.clone();
    ctrlc::set_handler(move || {
        eprintln!("Stopping...");
        handle.stop();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))?;
    Ok(stop)
}
