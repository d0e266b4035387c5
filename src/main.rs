//! Smartbed CLI
//!
//! Replays recorded sensor captures through the sleep monitor and runs the
//! standalone analytics.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use smartbed_core::{
    analytics::{sleep_onset, sleep_quality, sleep_transitions, wake_periods, StageDistribution},
    config::Config,
    core::ThermalBaseline,
    sensor::{SampleBuilder, SampleRecord},
    SleepMonitor, SleepReport, SleepStage, VERSION,
};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "smartbed")]
#[command(version = VERSION)]
#[command(about = "Bed presence detection and sleep analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded capture (JSON Lines) through the monitor
    Replay {
        /// Capture file, one sample record per line
        input: PathBuf,

        /// Configuration file (defaults to the user config)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write every sleep report to this file as JSON
        #[arg(long)]
        report_out: Option<PathBuf>,

        /// Print every tick, not just transitions and epochs
        #[arg(long, short)]
        verbose: bool,
    },

    /// Compute a thermal baseline from vacant-bed temperature readings
    Calibrate {
        /// Bed temperatures (°C)
        #[arg(required = true, allow_negative_numbers = true)]
        readings: Vec<f64>,

        /// Configuration file (defaults to the user config)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Analyze a recorded stage series (JSON array of codes or names)
    Analyze {
        input: PathBuf,

        /// Configuration file (defaults to the user config)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show and validate the effective configuration
    Config {
        /// Configuration file (defaults to the user config)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

fn init_logging() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "smartbed_core=info".parse() {
        filter = filter.add_directive(directive);
    }

    fmt().with_env_filter(filter).with_target(false).init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            input,
            config,
            report_out,
            verbose,
        } => cmd_replay(&input, config.as_deref(), report_out.as_deref(), verbose),
        Commands::Calibrate { readings, config } => cmd_calibrate(&readings, config.as_deref()),
        Commands::Analyze { input, config } => cmd_analyze(&input, config.as_deref()),
        Commands::Config { path } => cmd_config(path.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Config::load().context("failed to load user config"),
    }
}

fn cmd_replay(
    input: &Path,
    config_path: Option<&Path>,
    report_out: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let mut builder = SampleBuilder::new(config.activity.clone());
    let mut monitor = SleepMonitor::new(config)?;

    let file = std::fs::File::open(input)
        .with_context(|| format!("failed to open {}", input.display()))?;

    println!("Smartbed v{VERSION}");
    println!("Replaying {}", input.display());
    println!();

    let mut reports: Vec<SleepReport> = Vec::new();
    let mut last_timestamp = None;

    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", index + 1))?;
        if line.trim().is_empty() {
            continue;
        }

        let record: SampleRecord = serde_json::from_str(&line)
            .with_context(|| format!("invalid sample record on line {}", index + 1))?;
        let sample = builder.build(&record);
        last_timestamp = Some(sample.timestamp);

        let outcome = monitor.tick(&sample);
        let presence = &outcome.presence;

        if verbose || presence.changed_this_tick {
            println!(
                "[{}] {:<8} confidence {:>5.1} ({} indicators){}",
                sample.timestamp.format("%H:%M:%S"),
                if presence.occupied { "OCCUPIED" } else { "VACANT" },
                presence.confidence,
                presence.indicators.active_count(),
                if presence.changed_this_tick { " <- changed" } else { "" }
            );
        }

        if let Some(stage) = outcome.stage {
            println!(
                "[{}]   epoch {:>3}: {stage}",
                sample.timestamp.format("%H:%M:%S"),
                monitor.stage_series().len()
            );
        }

        if let Some(report) = outcome.report {
            println!();
            println!("{}", report.summary());
            println!();
            reports.push(report);
        }
    }

    // Capture ended mid-episode: report what we have.
    if let Some(now) = last_timestamp {
        if let Some(report) = monitor.analyze(now) {
            println!();
            println!("Episode still open at end of capture:");
            println!("{}", report.summary());
            reports.push(report);
        }
    }

    match monitor.physiology() {
        Ok(physiology) => println!(
            "\nHeart rate {:.1} BPM, RMSSD {:.1} ms, SDNN {:.1} ms, stress {:.0}/100",
            physiology.heart_rate, physiology.hrv.rmssd, physiology.hrv.sdnn, physiology.stress
        ),
        Err(e) => println!("\nPhysiology unavailable: {e}"),
    }

    println!();
    println!("{}", monitor.stats().summary());

    if let Some(path) = report_out {
        let json = serde_json::to_string_pretty(&reports)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write reports to {}", path.display()))?;
        println!();
        println!("Wrote {} report(s) to {}", reports.len(), path.display());
    }

    Ok(())
}

fn cmd_calibrate(readings: &[f64], config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let mut baseline = ThermalBaseline::new(
        config.presence.baseline_alpha,
        config.presence.min_calibration_readings,
    );

    let value = baseline
        .calibrate(readings)
        .context("calibration rejected")?;
    let used = readings.iter().filter(|r| r.is_finite()).count();
    println!("Thermal baseline: {value:.2} °C ({used} readings)");
    Ok(())
}

/// Stage series accept numeric codes or stage names.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum StageEntry {
    Code(u8),
    Name(String),
}

fn parse_stages(content: &str) -> Result<Vec<SleepStage>> {
    let entries: Vec<StageEntry> =
        serde_json::from_str(content).context("expected a JSON array of stages")?;

    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| match entry {
            StageEntry::Code(code) => match SleepStage::from_code(code) {
                Some(stage) => Ok(stage),
                None => bail!("entry {i}: unknown stage code {code}"),
            },
            StageEntry::Name(name) => name
                .parse::<SleepStage>()
                .map_err(|e| anyhow::anyhow!("entry {i}: {e}")),
        })
        .collect()
}

fn cmd_analyze(input: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let analysis = &config.analysis;

    let content = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let stages = parse_stages(&content)?;

    let distribution = StageDistribution::from_series(&stages);
    println!("Epochs: {}", stages.len());
    for stage in SleepStage::ALL {
        println!(
            "  {:<6} {:>5.1}% ({:.0} min)",
            stage.to_string(),
            distribution.share(stage) * 100.0,
            distribution.minutes(stage)
        );
    }

    match sleep_quality(&stages, None, None) {
        Ok(score) => println!("Quality: {score:.1}/100"),
        Err(e) => println!("Quality: {e}"),
    }

    match sleep_transitions(&stages) {
        Some(t) => println!(
            "Transitions: {} ({:.1} per hour)",
            t.count, t.fragmentation_index
        ),
        None => println!("Transitions: need at least two epochs"),
    }

    match sleep_onset(&stages, analysis.onset_window, analysis.onset_fraction) {
        Some(index) => println!("Sleep onset: epoch {index}"),
        None => println!("Sleep onset: not reached"),
    }

    let periods = wake_periods(&stages, analysis.min_wake_duration);
    println!("Wake periods: {}", periods.len());
    for period in &periods {
        println!(
            "  from epoch {} for {} epochs",
            period.start, period.duration
        );
    }

    Ok(())
}

fn cmd_config(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;

    println!("Configuration");
    println!("=============");
    println!();
    match path {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: {}", Config::config_path().display()),
    }
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    println!();
    println!("Configuration is valid.");
    Ok(())
}
