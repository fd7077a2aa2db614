//! Train the occupancy classifier and compute an optimal heating plan.
//!
//! Usage: cargo run --bin plan -- --data dataset.csv --epochs 500

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rust_nn_heating::{
    data::{self, Dataset, FeatureScaler, SlotReading, NUM_FEATURES},
    nn::{Network, NetworkConfig},
    planner::{self, PlannerConfig, Slot},
    utility::{expected_utility, OccupancyState},
};

#[derive(Parser)]
#[command(name = "plan")]
#[command(version = "0.1.0")]
#[command(about = "Occupancy-aware heating planner", long_about = None)]
struct Cli {
    /// Training dataset CSV (headerless: 7 feature columns + state label)
    #[arg(short, long, default_value = "dataset.csv")]
    data: String,

    /// Current slot readings CSV (7 feature columns); a built-in sample
    /// snapshot is used when omitted
    #[arg(short, long)]
    slots: Option<String>,

    /// Number of training epochs
    #[arg(short, long, default_value_t = 500)]
    epochs: usize,

    /// Hidden layer width
    #[arg(long, default_value_t = 16)]
    hidden: usize,

    /// Learning rate
    #[arg(long, default_value_t = 0.01)]
    learning_rate: f64,

    /// L2 weight decay coefficient
    #[arg(long, default_value_t = 0.001)]
    l2: f64,

    /// Seed for weight initialization
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Maximum total energy cost
    #[arg(long, default_value_t = 1.2)]
    budget: f64,

    /// Maximum total risk
    #[arg(long, default_value_t = 0.1)]
    max_risk: f64,

    /// Emit the report as JSON instead of text
    #[arg(long)]
    json: bool,
}

/// Per-slot inference results feeding the report.
#[derive(Serialize)]
struct SlotAnalysis {
    slot: usize,
    reading: SlotReading,
    p_away: f64,
    p_home: f64,
    p_sleep: f64,
    expected_utility: f64,
}

#[derive(Serialize)]
struct PlanReport {
    slots: Vec<SlotAnalysis>,
    power: Vec<f64>,
    objective: f64,
}

/// Snapshot of four apartments at 19:00 on a cold evening, used when no
/// readings file is given.
fn sample_slots() -> Vec<SlotReading> {
    vec![
        SlotReading {
            hour: 19.0,
            outdoor_temp: 6.0,
            lights: 0.8,
            motion: 0.3,
            power_draw: 3.0,
            energy_price: 0.50,
            indoor_temp: 16.0,
        },
        SlotReading {
            hour: 19.0,
            outdoor_temp: 6.0,
            lights: 0.7,
            motion: 0.5,
            power_draw: 3.0,
            energy_price: 0.47,
            indoor_temp: 17.0,
        },
        SlotReading {
            hour: 19.0,
            outdoor_temp: 5.0,
            lights: 0.0,
            motion: 0.0,
            power_draw: 0.5,
            energy_price: 0.42,
            indoor_temp: 16.0,
        },
        SlotReading {
            hour: 19.0,
            outdoor_temp: 5.0,
            lights: 0.5,
            motion: 0.6,
            power_draw: 5.5,
            energy_price: 0.45,
            indoor_temp: 18.0,
        },
    ]
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Training
    let dataset = Dataset::load_csv(&cli.data)
        .with_context(|| format!("loading training dataset from {}", cli.data))?;
    info!(records = dataset.len(), "loaded training dataset");

    let scaler = FeatureScaler::default();
    let (features, targets) = dataset.to_matrices(&scaler);

    let config = NetworkConfig::new(
        NUM_FEATURES,
        cli.hidden,
        OccupancyState::COUNT,
        cli.learning_rate,
        cli.l2,
    );
    let mut network = Network::seeded(config, cli.seed)?;
    info!(
        inputs = config.num_inputs,
        hidden = config.num_hidden,
        outputs = config.num_outputs,
        parameters = network.num_parameters(),
        "created network"
    );

    let losses = network.fit(&features, &targets, cli.epochs)?;
    if let (Some(first), Some(last)) = (losses.first(), losses.last()) {
        info!(
            epochs = cli.epochs,
            initial_loss = *first,
            final_loss = *last,
            "training complete"
        );
    }

    // Inference and expected utility per slot
    let readings = match &cli.slots {
        Some(path) => data::load_readings_csv(path)
            .with_context(|| format!("loading slot readings from {}", path))?,
        None => sample_slots(),
    };

    let mut analyses = Vec::with_capacity(readings.len());
    let mut slots = Vec::with_capacity(readings.len());

    for (i, reading) in readings.iter().enumerate() {
        let input = scaler.scale(reading);
        let probs = network.forward(input.view())?;
        let eu = expected_utility(probs.view(), reading.indoor_temp, reading.outdoor_temp);

        slots.push(Slot::from_distribution(
            probs.view(),
            reading.energy_price,
            eu,
        ));
        analyses.push(SlotAnalysis {
            slot: i + 1,
            reading: *reading,
            p_away: probs[OccupancyState::Away.index()],
            p_home: probs[OccupancyState::Home.index()],
            p_sleep: probs[OccupancyState::Sleep.index()],
            expected_utility: eu,
        });
    }

    // Optimal allocation
    let plan = planner::plan(&slots, &PlannerConfig::new(cli.budget, cli.max_risk))?;

    let report = PlanReport {
        slots: analyses,
        power: plan.power,
        objective: plan.objective,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &PlanReport) {
    println!("═══════════════════════════════════════════════════════════════");
    println!("                    Occupancy Analysis");
    println!("═══════════════════════════════════════════════════════════════");
    println!();

    for analysis in &report.slots {
        let r = &analysis.reading;
        println!(
            "Apartment {}: {:>2.0}:00  outdoor {:>4.1}°  indoor {:>4.1}°  lights {:.1}  motion {:.1}",
            analysis.slot, r.hour, r.outdoor_temp, r.indoor_temp, r.lights, r.motion
        );
        println!(
            "  P(Away) {:.2} | P(Home) {:.2} | P(Sleep) {:.2} | expected utility {:.3}",
            analysis.p_away, analysis.p_home, analysis.p_sleep, analysis.expected_utility
        );
        println!();
    }

    println!("═══════════════════════════════════════════════════════════════");
    println!("                  Optimal Heating Plan");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    for (analysis, power) in report.slots.iter().zip(report.power.iter()) {
        println!("Apartment {} -> power {:.1}%", analysis.slot, power * 100.0);
    }
    println!();
    println!("Objective value: {:.3}", report.objective);
}
