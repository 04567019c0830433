//! av-remix command line
//!
//! Runs one job: combines `--video` and `--audio` through ffmpeg, shows
//! status and elapsed time while it runs, and writes the result to
//! `--output`.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use av_remix::config::OUTPUT_NAME;
use av_remix::config_file::{generate_default_config, ConfigFile};
use av_remix::presenter;
use av_remix::{
    FfmpegEngine, InputError, JobStatus, MediaEngine, MediaInput, MediaKind, Orchestrator,
    RemixConfig, RemixError,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "av-remix";

/// Config file picked up from the current directory when `--config` is absent
const DEFAULT_CONFIG_FILE: &str = "av-remix.toml";

/// Exit status for a failed job
const EXIT_FAILED: u8 = 1;

/// Exit status for bad arguments or configuration
const EXIT_USAGE: u8 = 2;

#[derive(Parser, Debug, Clone)]
#[command(name = "av-remix")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Video file
    #[arg(long, value_name = "PATH", required_unless_present = "generate_config")]
    video: Option<PathBuf>,

    /// Audio file
    #[arg(long, value_name = "PATH", required_unless_present = "generate_config")]
    audio: Option<PathBuf>,

    /// Replace the video's soundtrack instead of mixing both
    #[arg(long)]
    replace_audio: bool,

    /// Where to write the combined file
    #[arg(short, long, value_name = "PATH", default_value = OUTPUT_NAME)]
    output: PathBuf,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// ffmpeg executable, overrides the configuration file
    #[arg(long, value_name = "PATH")]
    ffmpeg: Option<String>,

    /// Print the final job state as JSON
    #[arg(long)]
    json: bool,

    /// Write a default configuration file and exit
    #[arg(long, value_name = "PATH")]
    generate_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(path) = &args.generate_config {
        return match generate_default_config(path)
            .map_err(|e| RemixError::Config(format!("{}: {}", path.display(), e)))
        {
            Ok(()) => {
                println!("Wrote default configuration to {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::from(EXIT_USAGE)
            }
        };
    }

    let (mut config, load_warning) = load_config(args.config.as_deref());
    if let Some(ffmpeg) = &args.ffmpeg {
        config.engine.ffmpeg_path = ffmpeg.clone();
    }
    if args.replace_audio {
        config.job.replace_audio = true;
    }

    init_logging(&config.log_level, config.json_logs());
    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    if let Some(warning) = load_warning {
        tracing::warn!("{}", warning);
    }
    tracing::debug!("Configuration loaded: {:?}", config);

    let engine = FfmpegEngine::new(config.engine.clone());
    let mut orch = Orchestrator::new(engine, &config.job);
    if let Err(e) = select_inputs(&mut orch, &args) {
        tracing::error!("{}", e);
        eprintln!("{}", e);
        return ExitCode::from(EXIT_USAGE);
    }

    let presenter = presenter::spawn(orch.subscribe(), orch.subscribe_elapsed());
    let status = orch.run().await;
    if let Err(e) = presenter.await {
        tracing::warn!("Presenter task ended abnormally: {}", e);
    }

    if let Err(e) = report(&orch, &args).await {
        tracing::error!("{}", e);
        return ExitCode::from(EXIT_FAILED);
    }

    ExitCode::from(exit_status(status))
}

fn exit_status(status: JobStatus) -> u8 {
    match status {
        JobStatus::Succeeded => 0,
        _ => EXIT_FAILED,
    }
}

/// Save the output of a successful job and print the final state
async fn report<E: MediaEngine>(orch: &Orchestrator<E>, args: &Args) -> av_remix::Result<()> {
    if let Some(artifact) = orch.output() {
        if artifact.is_empty() {
            tracing::warn!("Engine produced an empty {}", artifact.media_type());
        }
        artifact.save(&args.output).await?;
        tracing::info!(
            "Wrote {} bytes of {} to {}",
            artifact.len(),
            artifact.media_type(),
            args.output.display()
        );
    }

    let snapshot = orch.snapshot();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else if snapshot.status == JobStatus::Succeeded {
        println!("Output: {}", args.output.display());
    }
    Ok(())
}

/// Load configuration: the given file, else `av-remix.toml` when present,
/// else defaults. A file that fails to load yields defaults plus a warning
/// to log once logging is up.
fn load_config(path: Option<&Path>) -> (RemixConfig, Option<String>) {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => PathBuf::from(DEFAULT_CONFIG_FILE),
        None => return (RemixConfig::new(), None),
    };

    match ConfigFile::from_file(&path) {
        Ok(cf) => (cf.into_remix_config(), None),
        Err(e) => (
            RemixConfig::new(),
            Some(format!(
                "Failed to load config file {}: {}. Using defaults.",
                path.display(),
                e
            )),
        ),
    }
}

fn select_inputs<E: MediaEngine>(
    orch: &mut Orchestrator<E>,
    args: &Args,
) -> Result<(), RemixError> {
    let video = args
        .video
        .as_ref()
        .ok_or(InputError::Missing(MediaKind::Video))?;
    let audio = args
        .audio
        .as_ref()
        .ok_or(InputError::Missing(MediaKind::Audio))?;

    orch.select_video(MediaInput::from_path(video, MediaKind::Video)?)?;
    orch.select_audio(MediaInput::from_path(audio, MediaKind::Audio)?)?;
    Ok(())
}

/// Initialize logging with tracing. Everything goes to stderr; stdout is
/// reserved for the presenter.
fn init_logging(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("av_remix={}", level).into());

    let (pretty, structured) = if json {
        (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            ),
        )
    } else {
        (
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
            None,
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(structured)
        .init();
}
