//! MCS Simulation Engine CLI
//!
//! Command-line interface for running crowd-sensing simulations and
//! managing saved runs.
//!
//! ```bash
//! # One day, 100 cyclists, 40 tasks, reproducible
//! mcs-sim run --users 100 --locomotion bike --tasks 40 --seed 7
//!
//! # Parameters from a JSON file, results saved under ./runs
//! mcs-sim run --params scenario.json --store ./runs
//!
//! mcs-sim list --store ./runs
//! mcs-sim show 20261018-093012 --store ./runs
//! mcs-sim delete 20261018-093012 --store ./runs
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcs_simulation_engine::{
    LocomotionType, PlatformType, RunId, RunStore, SimulationParameters, SimulationResult,
    SimulationSession, config::load_parameters,
};

#[derive(Parser)]
#[command(name = "mcs-sim")]
#[command(about = "Simulate crowd-sensing task candidates over synthetic mobility", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate movements and tasks, then count candidates per task
    Run(RunArgs),

    /// List saved runs
    List {
        /// Directory holding saved runs
        #[arg(long, default_value = "./runs")]
        store: PathBuf,
    },

    /// Print the per-task candidate counts of a saved run
    Show {
        run_id: String,

        #[arg(long, default_value = "./runs")]
        store: PathBuf,
    },

    /// Delete a saved run
    Delete {
        run_id: String,

        #[arg(long, default_value = "./runs")]
        store: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// JSON parameter file; flags below override its values
    #[arg(long)]
    params: Option<PathBuf>,

    /// Simulated days
    #[arg(long)]
    days: Option<u32>,

    /// Number of synthetic users
    #[arg(short, long)]
    users: Option<u32>,

    /// Locomotion type (walk, bike, drive)
    #[arg(short, long)]
    locomotion: Option<String>,

    /// Number of tasks
    #[arg(short, long)]
    tasks: Option<u32>,

    /// Execution range in meters
    #[arg(long)]
    range: Option<f64>,

    /// Task duration in minutes
    #[arg(long)]
    task_duration: Option<u32>,

    /// Timeslot duration in minutes
    #[arg(long)]
    timeslot: Option<u32>,

    /// Platform type (MCS, FOG-MCS, MEC-MCS)
    #[arg(long)]
    platform: Option<String>,

    /// Random seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Save the run under this directory
    #[arg(long)]
    store: Option<PathBuf>,

    /// Output JSON file path (optional)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl RunArgs {
    fn parameters(&self) -> anyhow::Result<SimulationParameters> {
        let mut params = match &self.params {
            Some(path) => load_parameters(path)
                .with_context(|| format!("failed to load parameters from {}", path.display()))?,
            None => SimulationParameters::default(),
        };

        if let Some(days) = self.days {
            params.days = days;
        }
        if let Some(users) = self.users {
            params.number_of_users = users;
        }
        if let Some(name) = &self.locomotion {
            let locomotion = LocomotionType::parse_lenient(name);
            if !locomotion.as_str().eq_ignore_ascii_case(name.trim()) {
                warn!("Unknown locomotion type '{}', using {}", name, locomotion);
            }
            params.locomotion_type = locomotion;
        }
        if let Some(tasks) = self.tasks {
            params.number_of_tasks = tasks;
        }
        if let Some(range) = self.range {
            params.execution_range = range;
        }
        if let Some(minutes) = self.task_duration {
            params.task_duration = minutes;
        }
        if let Some(minutes) = self.timeslot {
            params.timeslot_duration = minutes;
        }
        if let Some(name) = &self.platform {
            params.platform_type = name.parse::<PlatformType>()?;
        }

        params.validate()?;
        Ok(params)
    }
}

/// JSON summary written by `run --output`
#[derive(Serialize)]
struct RunSummary<'a> {
    run_id: Option<&'a str>,
    parameters: &'a SimulationParameters,
    movement_events: usize,
    results: &'a [SimulationResult],
    tasks_with_candidates: usize,
    mean_candidates: f64,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mcs_simulation_engine=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::List { store } => {
            let runs = RunStore::new(store).list_runs()?;
            if runs.is_empty() {
                println!("No saved runs");
            }
            for id in runs {
                println!("{}", id);
            }
            Ok(())
        }
        Commands::Show { run_id, store } => {
            let saved = RunStore::new(store).load_run(&RunId::new(run_id))?;
            if let Some(params) = &saved.parameters {
                print_parameters(params);
            }
            println!(
                "Run {}: {} movement events, {} tasks\n",
                saved.id,
                saved.movements.len(),
                saved.tasks.len()
            );
            print_results(&saved.results);
            Ok(())
        }
        Commands::Delete { run_id, store } => {
            let id = RunId::new(run_id);
            RunStore::new(store).delete_run(&id)?;
            println!("Deleted run {}", id);
            Ok(())
        }
    }
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    let params = args.parameters()?;

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║  MCS Simulation Engine                                   ║");
    println!("╚══════════════════════════════════════════════════════════╝\n");
    print_parameters(&params);

    let mut builder = SimulationSession::builder().parameters(params);
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    if let Some(dir) = &args.store {
        builder = builder.store(RunStore::new(dir));
    }
    let mut session = builder.build()?;

    session.run().context("simulation failed")?;

    println!(
        "Generated {} movement events and {} tasks\n",
        session.movements().len(),
        session.tasks().len()
    );
    print_results(session.results());

    if let Some(id) = session.run_id() {
        println!("\nSaved as run {}", id);
    }

    if let Some(output_path) = args.output {
        let results = session.results();
        let summary = RunSummary {
            run_id: session.run_id().map(RunId::as_str),
            parameters: session.parameters(),
            movement_events: session.movements().len(),
            results,
            tasks_with_candidates: results.iter().filter(|r| r.candidates > 0).count(),
            mean_candidates: mean_candidates(results),
        };
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(&output_path, json)
            .with_context(|| format!("failed to write {}", output_path.display()))?;
        info!("Summary written to {}", output_path.display());
    }

    println!("\n✅ Simulation complete!\n");
    Ok(())
}

fn print_parameters(params: &SimulationParameters) {
    println!("Configuration:");
    println!("  Days: {}", params.days);
    println!("  Users: {} ({})", params.number_of_users, params.locomotion_type);
    println!("  Tasks: {}", params.number_of_tasks);
    println!("  Execution range: {} m", params.execution_range);
    println!("  Task duration: {} min", params.task_duration);
    println!("  Timeslot duration: {} min", params.timeslot_duration);
    println!("  Platform: {}\n", params.platform_type);
}

fn print_results(results: &[SimulationResult]) {
    println!("{:<10} {:>12}", "Task", "Candidates");
    println!("{}", "-".repeat(23));
    for result in results {
        println!("{:<10} {:>12}", result.task_id, result.candidates);
    }
    println!("{}", "-".repeat(23));
    println!("{:<10} {:>12.2}", "Mean", mean_candidates(results));
}

fn mean_candidates(results: &[SimulationResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(|r| r.candidates as f64).sum::<f64>() / results.len() as f64
}
