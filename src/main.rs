//! EEG Cursor Agent CLI
//!
//! Turns EEG band power into cursor commands.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use eeg_cursor_agent::{
    acquisition::{
        parse_recording, write_recording, AcquisitionFeed, ReplayFeed, SyntheticConfig,
        SyntheticFeed, Tone,
    },
    actuation::{ActuationSink, LogSink, VirtualCursor},
    band_table,
    config::Config,
    core::{Band, BandPowers},
    pipeline::{
        analyze_recording, analyze_recording_with, AnalysisReport, Pipeline, PipelineView,
    },
    VERSION,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eeg-cursor")]
#[command(version = VERSION)]
#[command(about = "Real-time EEG band power to cursor commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live pipeline
    Run(RunArgs),

    /// Replay a recording offline and print every analysis cycle
    Analyze {
        /// Recording in JSON Lines format (one array of channel values per line)
        recording: PathBuf,

        /// Print the session report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a synthetic recording
    Record {
        /// Output file
        #[arg(long, short)]
        output: PathBuf,

        /// Length of the recording in seconds
        #[arg(long, default_value = "10")]
        seconds: u64,

        /// Number of channels
        #[arg(long, default_value = "1")]
        channels: usize,

        /// Tone to include, as <hz>:<amplitude> (repeatable)
        #[arg(long)]
        tone: Vec<Tone>,
    },

    /// Show band boundaries and trigger rules
    Bands,

    /// Show configuration
    Config {
        /// Overwrite the config file with defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Sample source
    #[arg(long, value_enum, default_value = "synthetic")]
    feed: FeedKind,

    /// Recording to replay (with --feed replay)
    #[arg(long)]
    recording: Option<PathBuf>,

    /// Synthetic tone as <hz>:<amplitude> (repeatable)
    #[arg(long)]
    tone: Vec<Tone>,

    /// Where commands go
    #[arg(long, value_enum, default_value = "cursor")]
    sink: SinkKind,

    /// Stop after this many seconds
    #[arg(long)]
    duration: Option<u64>,

    /// Analysis cycles a rule stays silent after firing
    #[arg(long)]
    cooldown: Option<u32>,

    /// Power a band must drop below its threshold before re-firing
    #[arg(long)]
    hysteresis: Option<f64>,

    /// Don't write the session report
    #[arg(long)]
    no_export: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FeedKind {
    Synthetic,
    Replay,
}

#[derive(Clone, Copy, ValueEnum)]
enum SinkKind {
    Cursor,
    Log,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::Analyze { recording, json } => cmd_analyze(&recording, json),
        Commands::Record {
            output,
            seconds,
            channels,
            tone,
        } => cmd_record(&output, seconds, channels, tone),
        Commands::Bands => {
            cmd_bands();
            Ok(())
        }
        Commands::Config { reset } => cmd_config(reset),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    println!("EEG Cursor Agent v{VERSION}");
    println!();

    let mut config = Config::load().unwrap_or_default();
    if let Some(cycles) = args.cooldown {
        config.retrigger.cooldown_cycles = cycles;
    }
    if args.hysteresis.is_some() {
        config.retrigger.hysteresis = args.hysteresis;
    }
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let feed: Box<dyn AcquisitionFeed> = match args.feed {
        FeedKind::Synthetic => {
            let tones = if args.tone.is_empty() {
                vec![Tone::new(20.0, 200.0)]
            } else {
                args.tone.clone()
            };
            let synthetic = tones.iter().fold(
                SyntheticConfig::new(
                    config.sampling_rate_hz,
                    config.channel_count,
                    config.ingest_interval,
                ),
                |synthetic, tone| synthetic.with_tone(*tone),
            );
            println!("Feed: synthetic");
            for tone in &tones {
                println!("  Tone: {} Hz, amplitude {}", tone.frequency_hz, tone.amplitude);
            }
            Box::new(SyntheticFeed::new(synthetic)?)
        }
        FeedKind::Replay => {
            let Some(path) = args.recording.as_deref() else {
                bail!("--feed replay requires --recording <path>");
            };
            let chunk = (config.sampling_rate_hz * config.ingest_interval.as_secs_f64())
                .round()
                .max(1.0) as usize;
            let replay = ReplayFeed::from_path(path, config.sampling_rate_hz, chunk)
                .with_context(|| format!("loading recording {}", path.display()))?;
            config.channel_count = replay.channel_count();
            println!("Feed: replay of {} ({} samples)", path.display(), replay.len());
            Box::new(replay)
        }
    };

    let cursor = Arc::new(VirtualCursor::new((0, 0), config.cursor_step_px));
    let sink: Arc<dyn ActuationSink> = match args.sink {
        SinkKind::Cursor => cursor.clone(),
        SinkKind::Log => Arc::new(LogSink),
    };

    println!("  Sampling rate: {} Hz", config.sampling_rate_hz);
    println!("  Analysis window: {} samples", config.min_window);
    println!("  Smoothing alpha: {}", config.smoothing_alpha);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let pipeline = Pipeline::new(&config)?;
    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone())?;

    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    let (report, stats) = runtime.block_on(async {
        let handle = pipeline.spawn(feed, sink);
        let stats = handle.stats().clone();
        let mut view = handle.view();
        let deadline = args
            .duration
            .map(|secs| tokio::time::Instant::now() + Duration::from_secs(secs));

        while running.load(Ordering::SeqCst) {
            if deadline.is_some_and(|d| tokio::time::Instant::now() >= d) {
                break;
            }
            tokio::select! {
                report = view.next_report() => match report {
                    Some(report) => print_cycle(&report, &view, &config),
                    None => break,
                },
                _ = tokio::time::sleep(Duration::from_millis(100)) => {}
            }
        }

        println!();
        println!("Stopping pipeline...");
        (handle.shutdown().await, stats)
    });

    if matches!(args.sink, SinkKind::Cursor) {
        if let Some((x, y)) = cursor.position() {
            println!("Final cursor position: ({x}, {y})");
        }
    }

    if !args.no_export && report.cycles > 0 {
        match report.export(&config.export_path) {
            Ok(path) => println!(
                "Exported summary of {} analysis cycles to {:?}",
                report.cycles, path
            ),
            Err(e) => eprintln!("Error writing session report: {e}"),
        }
    }

    println!();
    println!("{}", stats.summary());
    Ok(())
}

fn cmd_analyze(recording: &Path, json: bool) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(recording)
        .with_context(|| format!("reading {}", recording.display()))?;
    let rows = parse_recording(&content)?;

    let mut config = Config::load().unwrap_or_default();
    if let Some(width) = rows.first().map(Vec::len) {
        config.channel_count = width;
    }

    if json {
        let report = analyze_recording(&rows, &config)?;
        println!("{}", report.to_json()?);
        return Ok(());
    }

    println!(
        "Analyzing {} samples on {} channel(s)",
        rows.len(),
        config.channel_count
    );
    println!();
    let report = analyze_recording_with(&rows, &config, |cycle| {
        let commands: Vec<String> = cycle.events.iter().map(|e| e.command.to_string()).collect();
        println!(
            "cycle {:>3}  dominant {:<5}  {}  {}",
            cycle.cycle,
            cycle.smoothed.dominant(),
            format_powers(&cycle.smoothed),
            commands.join(" ")
        );
    })?;

    println!();
    println!("Band      mean         std          max          triggers");
    for summary in &report.bands {
        println!(
            "{:<8} {:>12.1} {:>12.1} {:>12.1} {:>9}",
            summary.band, summary.mean, summary.std_dev, summary.max, summary.triggers
        );
    }
    Ok(())
}

fn cmd_record(
    output: &Path,
    seconds: u64,
    channels: usize,
    tones: Vec<Tone>,
) -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_default();
    let synthetic = tones.iter().fold(
        SyntheticConfig::new(config.sampling_rate_hz, channels, config.ingest_interval),
        |synthetic, tone| synthetic.with_tone(*tone),
    );
    let feed = SyntheticFeed::new(synthetic)?;

    let total = (config.sampling_rate_hz * seconds as f64).round() as u64;
    let rows: Vec<Vec<f64>> = (0..total)
        .map(|i| (0..channels).map(|c| feed.sample_at(c, i)).collect())
        .collect();

    write_recording(output, &rows)
        .with_context(|| format!("writing {}", output.display()))?;
    println!("Wrote {} samples x {} channel(s) to {:?}", rows.len(), channels, output);
    Ok(())
}

fn cmd_bands() {
    let config = Config::load().unwrap_or_default();

    println!("{}", band_table());
    println!("Trigger rules:");
    for rule in &config.rules {
        println!("  {} > {} -> {}", rule.band, rule.threshold, rule.command);
    }
    println!();
    println!(
        "Re-trigger: cooldown {} cycle(s), hysteresis {}",
        config.retrigger.cooldown_cycles,
        config
            .retrigger
            .hysteresis
            .map(|h| h.to_string())
            .unwrap_or_else(|| "off".to_string())
    );
}

fn cmd_config(reset: bool) -> anyhow::Result<()> {
    let config = if reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults.");
        println!();
        config
    } else {
        Config::load().unwrap_or_default()
    };

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Print one analysis cycle as a bar chart.
fn print_cycle(report: &AnalysisReport, view: &PipelineView, config: &Config) {
    const WIDTH: f64 = 40.0;

    let scale = config
        .rules
        .iter()
        .map(|r| r.threshold)
        .chain(report.smoothed.iter().map(|(_, p)| p))
        .fold(1.0_f64, f64::max);

    println!(
        "[{}] cycle {}  ({} samples)",
        report.timestamp.with_timezone(&chrono::Local).format("%H:%M:%S"),
        report.cycle,
        report.window_len
    );
    for (band, power) in report.smoothed.iter() {
        let bar = "#".repeat(((power / scale) * WIDTH).round() as usize);
        let marker = if report.events.iter().any(|e| e.band == band) {
            " <"
        } else {
            ""
        };
        println!("  {:<6} {:<40} {:>10.1}{}", band, bar, power, marker);
    }
    println!("  {}", view.panel().render());
    for event in &report.events {
        println!(
            "  -> {} ({} {:.1} > {})",
            event.command, event.band, event.power, event.threshold
        );
    }
}

fn format_powers(powers: &BandPowers) -> String {
    Band::ALL
        .into_iter()
        .map(|band| format!("{}={:.0}", &band.name()[..1], powers.get(band)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("setting Ctrl+C handler")
}
