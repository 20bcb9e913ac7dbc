use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use serde::Serialize;
use stereo_mode_core::{
    convert_action_command_to_action, normalize_stereo_mode, EnglishLabels, GuiMessage,
    InMemorySettings, Localizer, NowPlaying, PlaybackSnapshot, SimulatedDisplay, StereoConfig,
    StereoError, StereoMode, StereoscopicsManager,
};
use tracing_subscriber::EnvFilter;

fn main() -> stereo_mode_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize { raw } => {
            println!("{}", normalize_stereo_mode(&raw));
            Ok(())
        }
        Commands::Detect { needle, config } => run_detect(&needle, config.as_ref()),
        Commands::Modes { json } => run_modes(json),
        Commands::Run {
            config,
            tag,
            file,
            supported,
            json,
            steps,
        } => run_script(
            config.as_ref(),
            NowPlaying {
                stereo_tag: tag,
                file_name: file,
            },
            supported,
            json,
            &steps,
        ),
    }
}

fn load_config(path: Option<&PathBuf>) -> stereo_mode_core::Result<StereoConfig> {
    match path {
        Some(path) => StereoConfig::load(path),
        None => Ok(StereoConfig::default()),
    }
}

fn run_detect(needle: &str, config: Option<&PathBuf>) -> stereo_mode_core::Result<()> {
    let detector = load_config(config)?.detector()?;
    let token = detector.detect_token(needle);
    tracing::debug!(needle, token = %token, "detected stereo marker");
    println!("{token}");
    Ok(())
}

#[derive(Debug, Serialize)]
struct ModeRow {
    ordinal: i32,
    token: &'static str,
    label: String,
}

fn run_modes(json: bool) -> stereo_mode_core::Result<()> {
    let rows: Vec<ModeRow> = StereoMode::ALL
        .into_iter()
        .map(|mode| ModeRow {
            ordinal: mode.ordinal(),
            token: mode.token(),
            label: EnglishLabels.label(mode),
        })
        .collect();

    if json {
        let out = serde_json::to_string_pretty(&rows)
            .map_err(|err| StereoError::msg(err.to_string()))?;
        println!("{out}");
    } else {
        for row in rows {
            println!("{:>3}  {:<24} {}", row.ordinal, row.token, row.label);
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct StepReport<'a> {
    step: &'a str,
    handled: bool,
    mode: StereoMode,
    user_mode: StereoMode,
}

fn run_script(
    config: Option<&PathBuf>,
    item: NowPlaying,
    supported: Vec<StereoMode>,
    json: bool,
    steps: &[String],
) -> stereo_mode_core::Result<()> {
    let config = load_config(config)?;
    let settings = Arc::new(InMemorySettings::new(config.playback.clone()));
    let display = Arc::new(if supported.is_empty() {
        SimulatedDisplay::full()
    } else {
        SimulatedDisplay::new(supported)
    });
    let playback = Arc::new(PlaybackSnapshot::new());
    let manager = Arc::new(
        StereoscopicsManager::new(settings, display, playback.clone())
            .with_detector(config.detector()?),
    );
    manager.subscribe();
    manager.initialize();
    tracing::info!(mode = %manager.get_stereo_mode(), "console ready");

    for step in steps {
        let handled = match step.split_once(':') {
            Some((command, parameter)) => {
                let action = convert_action_command_to_action(command, parameter);
                if !action.is_valid() {
                    tracing::warn!(command, parameter, "unrecognised stereo command");
                }
                manager.on_action(&action)
            }
            None => match step.as_str() {
                "play" => {
                    playback.start(item.clone());
                    manager.on_message(&GuiMessage::PlaybackStarted)
                }
                "stop" => {
                    playback.stop();
                    manager.on_message(&GuiMessage::PlaybackStopped)
                }
                other => return Err(StereoError::msg(format!("unknown step `{other}`"))),
            },
        };

        let report = StepReport {
            step,
            handled,
            mode: manager.get_stereo_mode(),
            user_mode: manager.state().user_mode,
        };
        if json {
            let line = serde_json::to_string(&report)
                .map_err(|err| StereoError::msg(err.to_string()))?;
            println!("{line}");
        } else {
            println!(
                "{:<32} handled={:<5} mode={} user={}",
                report.step, report.handled, report.mode, report.user_mode
            );
        }
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Stereoscopic 3D mode console", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the canonical token for any spelling of a stereo mode.
    Normalize {
        raw: String,
    },
    /// Look for a stereo marker in a file name.
    Detect {
        needle: String,
        /// TOML configuration with extra markers.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List every stereo mode.
    Modes {
        #[arg(long)]
        json: bool,
    },
    /// Drive a coordinator through a sequence of steps.
    ///
    /// A step is either `play`, `stop` or `command:parameter`, for example
    /// `setstereomode:toggle`.
    Run {
        /// TOML configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Stereo tag reported by the simulated stream.
        #[arg(long)]
        tag: Option<String>,
        /// File name of the simulated item.
        #[arg(long)]
        file: Option<String>,
        /// Modes the simulated display supports. Defaults to all of them.
        #[arg(long, value_delimiter = ',')]
        supported: Vec<StereoMode>,
        /// Print one JSON object per step.
        #[arg(long)]
        json: bool,
        steps: Vec<String>,
    },
}
