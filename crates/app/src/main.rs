use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use fractal_beat_core::{AppConfig, FractalBeatError, Palette, Session, ShapeType};
use tracing_subscriber::EnvFilter;

/// Slowest simulated frame rate. At 10 fps the per-frame delta equals the
/// session's delta cap, so anything slower would quietly shorten the run.
const MIN_FPS: u32 = 10;

fn main() -> fractal_beat_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_session(&args),
        Commands::Palettes => list_palettes(),
    }
}

fn run_session(args: &RunArgs) -> fractal_beat_core::Result<()> {
    if !args.seconds.is_finite() {
        return Err(FractalBeatError::msg("--seconds must be a finite number"));
    }

    let config = resolve_config(args)?;

    let mut session = match args.seed {
        Some(seed) => Session::with_seed(&config, seed),
        None => Session::new(&config),
    };

    tracing::info!(
        bpm = session.bpm(),
        clock = session.clock_mode(),
        shape = %session.shape(),
        palette = %session.palette().name,
        "starting session"
    );

    session.start();

    let fps = effective_fps(args.fps);
    let frame_dt = 1.0 / fps as f32;
    let frames = (args.seconds.max(0.0) * fps as f32).round() as u64;

    let mut beats = 0u64;
    for _ in 0..frames {
        let update = session.advance(frame_dt);

        if let Some(beat) = update.beat {
            if beat.is_new_beat {
                beats += 1;
                tracing::info!(
                    beat = beat.beat_index,
                    active = session.active_count(),
                    "beat"
                );
            }
        }
        if let Some(click) = update.click {
            tracing::debug!(accent = click.accent, freq = click.frequency_hz, "click");
        }
    }

    session.stop();
    tracing::info!(beats, frames, "session finished");
    Ok(())
}

/// Floors the frame rate so every delta fits under the session's cap and
/// the simulated span matches the requested one.
fn effective_fps(requested: u32) -> u32 {
    if requested < MIN_FPS {
        tracing::warn!(requested, used = MIN_FPS, "fps raised to keep frame deltas unclamped");
        MIN_FPS
    } else {
        requested
    }
}

/// Loads the optional settings file, then lets the command line flags win.
fn resolve_config(args: &RunArgs) -> fractal_beat_core::Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    if let Some(bpm) = args.bpm {
        if !bpm.is_finite() {
            return Err(FractalBeatError::msg("--bpm must be a finite number"));
        }
        config.tempo.bpm = bpm;
    }
    if args.clock {
        config.tempo.clock_mode = true;
    }
    if let Some(shape) = args.shape.as_deref() {
        config.visual.shape = ShapeType::from_str(shape)?;
    }
    if args.metronome {
        config.visual.metronome = true;
    }
    if let Some(name) = &args.palette {
        if Palette::named(name).is_none() {
            return Err(FractalBeatError::msg(format!(
                "unknown palette `{name}`; run `palettes` to list the available ones"
            )));
        }
        config.palette = name.clone();
    }

    Ok(config)
}

fn list_palettes() -> fractal_beat_core::Result<()> {
    for palette in Palette::builtin() {
        let colors = palette
            .colors()
            .iter()
            .map(|color| color.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        println!("{:<10} accent {}  {colors}", palette.name, palette.accent);
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Beat-synchronised tunnel visualiser", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Drive a headless session and log the beats it produces.
    Run(RunArgs),
    /// List the built-in colour palettes.
    Palettes,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Optional JSON settings file applied before the flag overrides.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Tempo in beats per minute.
    #[arg(long)]
    bpm: Option<f32>,
    /// Tunnel shape: triangle, square or hexagon.
    #[arg(long)]
    shape: Option<String>,
    /// Built-in palette name.
    #[arg(long)]
    palette: Option<String>,
    /// Pin the beat interval to one second regardless of tempo.
    #[arg(long)]
    clock: bool,
    /// Emit metronome click events on every beat.
    #[arg(long)]
    metronome: bool,
    /// How long to run, in seconds.
    #[arg(long, default_value_t = 8.0)]
    seconds: f32,
    /// Simulated frames per second.
    #[arg(long, default_value_t = 60)]
    fps: u32,
    /// Seed for reproducible spawn jitter.
    #[arg(long)]
    seed: Option<u64>,
}
