use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vitals_core::*;

#[derive(Parser)]
#[command(name = "vitals")]
#[command(about = "Vital-sign simulator and short-horizon forecaster", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Seed the random generators for a reproducible run
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Load configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Advance a subject's vitals and show history plus forecast (default)
    Update {
        /// Subject identifier (defaults to the configured default subject)
        #[arg(long)]
        subject: Option<String>,

        /// Number of ticks to simulate before reporting
        #[arg(long, default_value_t = 1)]
        ticks: usize,

        /// Print the payload as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify measurements and update the default subject
    Evaluate {
        /// Height in centimetres
        #[arg(long)]
        height: f64,

        /// Weight in kilograms
        #[arg(long)]
        weight: f64,

        /// Systolic blood pressure
        #[arg(long)]
        bp: f64,

        /// Oxygen saturation (%)
        #[arg(long)]
        oxygen: f64,

        /// Pulse (beats per minute)
        #[arg(long)]
        pulse: f64,

        /// Extra ticks to simulate before the evaluation
        #[arg(long, default_value_t = 0)]
        ticks: usize,

        /// Print the payload as JSON
        #[arg(long)]
        json: bool,
    },

    /// Forecast an arbitrary series
    Forecast {
        /// Comma-separated history, oldest first
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        values: Vec<f64>,

        /// Clamp to this channel's range (bp, oxygen, pulse)
        #[arg(long)]
        channel: Option<String>,

        /// Number of steps to forecast (defaults to the configured horizon)
        #[arg(long)]
        horizon: Option<usize>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    vitals_core::logging::init();

    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if cli.seed.is_some() {
        config.simulation.seed = cli.seed;
    }

    match cli.command {
        Some(Commands::Update {
            subject,
            ticks,
            json,
        }) => cmd_update(&config, subject, ticks, json),
        Some(Commands::Evaluate {
            height,
            weight,
            bp,
            oxygen,
            pulse,
            ticks,
            json,
        }) => {
            let measurements = Measurements {
                height_cm: height,
                weight_kg: weight,
                bp,
                oxygen,
                pulse,
            };
            cmd_evaluate(&config, &measurements, ticks, json)
        }
        Some(Commands::Forecast {
            values,
            channel,
            horizon,
            json,
        }) => cmd_forecast(&config, &values, channel, horizon, json),
        None => {
            // Default to "update" command
            cmd_update(&config, None, 1, false)
        }
    }
}

fn cmd_update(config: &Config, subject: Option<String>, ticks: usize, json: bool) -> Result<()> {
    if ticks == 0 {
        return Err(Error::InvalidInput("--ticks must be at least 1".into()));
    }

    let mut monitor = VitalsMonitor::new(config)?;
    let subject = subject.unwrap_or_else(|| monitor.default_subject().to_string());

    for _ in 1..ticks {
        monitor.advance(&subject);
    }
    let snapshot = monitor.update(Some(&subject))?;
    tracing::debug!("Simulated {} ticks for {}", ticks, subject);

    if json {
        let payload = serde_json::json!({ "vital_predictions": snapshot });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        display_snapshot(&subject, &snapshot);
    }
    Ok(())
}

fn cmd_evaluate(
    config: &Config,
    measurements: &Measurements,
    ticks: usize,
    json: bool,
) -> Result<()> {
    let mut monitor = VitalsMonitor::new(config)?;
    let subject = monitor.default_subject().to_string();
    for _ in 0..ticks {
        monitor.advance(&subject);
    }

    let evaluation = monitor.evaluate(measurements)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else {
        println!("\n╭─────────────────────────────────────────╮");
        println!("│  HEALTH RISK: {}", evaluation.health_risk);
        println!("╰─────────────────────────────────────────╯");
        println!(
            "  BMI: {:.1} ({:?})",
            evaluation.bmi, evaluation.bmi_category
        );
        display_snapshot(&subject, &evaluation.vital_predictions);
    }
    Ok(())
}

fn cmd_forecast(
    config: &Config,
    values: &[f64],
    channel: Option<String>,
    horizon: Option<usize>,
    json: bool,
) -> Result<()> {
    let channel = channel.as_deref().map(str::parse::<Channel>).transpose()?;
    let horizon = horizon.unwrap_or(config.forecast.horizon);

    let mut forecaster = Forecaster::for_simulation(config.forecast.clone(), config.simulation.seed);
    let result = forecaster.forecast_detailed(values, horizon, channel)?;

    if json {
        let payload = serde_json::json!({
            "historical": values,
            "forecast": result.values,
            "model": result.model,
            "volatility": result.volatility,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("Model: {} (volatility {:.3})", result.model, result.volatility);
        for (i, v) in result.values.iter().enumerate() {
            println!("  t+{:<3} {:>8.2}", i + 1, v);
        }
    }
    Ok(())
}

fn display_snapshot(subject: &str, snapshot: &Snapshot) {
    println!("\nSubject: {}", subject);
    for channel in Channel::ALL {
        let series = snapshot.channel(channel);
        println!();
        println!("  {} [{}]", channel, series.model);
        if let (Some(value), Some(time)) = (series.historical.last(), series.timestamps.last()) {
            println!("  → Latest: {:.1} at {}", value, time);
        }
        println!("  → History ({} points): {}", series.historical.len(), format_values(&series.historical));
        println!("  → Forecast: {}", format_values(&series.forecast));
    }
    println!();
}

fn format_values(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{:.1}", v))
        .collect::<Vec<_>>()
        .join(", ")
}
