use std::{
    io::{self, BufRead},
    path::PathBuf,
    sync::mpsc::{self, Receiver, RecvTimeoutError},
    thread,
};

use clap::{Args, Parser, Subcommand};
use sortsound_core::{
    AlgorithmId, AppConfig, AudioSink, CancelToken, Dataset, InputCommand, NullAudio, Phase,
    PlaybackClock, PlaybackController, TextRenderer, ToneMapper, TracingAudio,
};
use tracing_subscriber::EnvFilter;

fn main() -> sortsound_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_interactive(args),
        Commands::Count {
            algorithm,
            bars,
            seed,
        } => run_count(&algorithm, bars, seed),
        Commands::Config => {
            println!("{}", AppConfig::default().to_json()?);
            Ok(())
        }
    }
}

fn run_interactive(args: RunArgs) -> sortsound_core::Result<()> {
    let config = args.resolve_config()?;
    tracing::info!(
        algorithm = %config.playback.algorithm,
        bars = config.dataset.bar_count,
        speed = config.playback.speed_level,
        "starting interactive run"
    );

    let render =
        TextRenderer::new(io::stdout(), args.width, config.dataset.height).in_place(true);
    let audio: Box<dyn AudioSink> = if config.audio.enabled {
        Box::new(TracingAudio::new(ToneMapper::from_config(
            &config.audio,
            config.dataset.height,
        )))
    } else {
        Box::new(NullAudio)
    };

    let mut controller = PlaybackController::new(&config, render, audio);
    let pause_poll = config.playback.pause_poll();
    let clock = PlaybackClock::start();
    let commands = spawn_input_reader();
    let mut input_open = true;

    controller.start();
    loop {
        controller.poll(clock.elapsed())?;

        let settled = controller.next_deadline().is_none();
        if settled && controller.phase() == Phase::Completed && args.exit_when_done {
            break;
        }
        if settled && !input_open {
            break;
        }

        let wait = controller
            .next_deadline()
            .map_or(pause_poll, |due| clock.until(due).min(pause_poll));
        if !input_open {
            thread::sleep(wait);
            continue;
        }
        match commands.recv_timeout(wait) {
            Ok(command) => {
                tracing::debug!(?command, "input");
                if !command.apply(&mut controller) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                tracing::debug!("input closed");
                input_open = false;
            }
        }
    }

    tracing::info!(phase = %controller.phase(), "exiting");
    Ok(())
}

fn run_count(algorithm: &str, bars: usize, seed: Option<u64>) -> sortsound_core::Result<()> {
    let algorithm: AlgorithmId = algorithm.parse()?;
    let bars = sortsound_core::config::clamp_bar_count(bars);
    let height = sortsound_core::dataset::DEFAULT_HEIGHT;
    let mut dataset = match seed {
        Some(seed) => Dataset::with_seed(height, seed),
        None => Dataset::new(height),
    };
    dataset.randomize(bars);

    let mut steps = algorithm.steps(dataset.len(), CancelToken::new());
    let counts = steps.drain(&mut dataset)?;
    let report = serde_json::json!({
        "algorithm": algorithm,
        "bars": bars,
        "compares": counts.compares,
        "swaps": counts.swaps,
        "sorted": dataset.is_sorted(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Parses stdin lines on a helper thread. Only the main thread touches the
/// controller.
fn spawn_input_reader() -> Receiver<InputCommand> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match line.parse::<InputCommand>() {
                Ok(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                Err(err) => tracing::warn!(%err, "ignoring input"),
            }
        }
    });
    rx
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Watch and hear sorting algorithms at work", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Animate a sort in the terminal, controlled by commands on stdin
    /// (start, pause, reset, speed N, algo NAME, bars N, quit; an empty line
    /// toggles pause).
    Run(RunArgs),
    /// Sort once without delays and report how many steps it took.
    Count {
        #[arg(short, long, default_value = "bubble")]
        algorithm: String,
        #[arg(short, long, default_value_t = 100)]
        bars: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the default configuration as JSON.
    Config,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// JSON configuration file; flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long)]
    algorithm: Option<String>,
    #[arg(short, long)]
    bars: Option<usize>,
    /// Speed level from 1 (slowest) to 100 (fastest).
    #[arg(short, long)]
    speed: Option<u32>,
    #[arg(long)]
    seed: Option<u64>,
    /// Terminal columns available for bars.
    #[arg(short, long, default_value_t = 80)]
    width: usize,
    #[arg(long)]
    no_audio: bool,
    /// Quit once the sort and its sorted playback have finished.
    #[arg(long)]
    exit_when_done: bool,
}

impl RunArgs {
    fn resolve_config(&self) -> sortsound_core::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };
        if let Some(name) = &self.algorithm {
            config.playback.algorithm = name.parse()?;
        }
        if let Some(bars) = self.bars {
            config.dataset.bar_count = bars;
        }
        if let Some(speed) = self.speed {
            config.playback.speed_level = speed;
        }
        if self.seed.is_some() {
            config.dataset.seed = self.seed;
        }
        if self.no_audio {
            config.audio.enabled = false;
        }
        Ok(config.normalized())
    }
}
