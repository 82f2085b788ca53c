use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use traffic_preempt::simulation::{LogSink, SimConfig, SimWorld};

#[derive(Parser)]
#[command(name = "traffic_preempt")]
#[command(about = "Emergency-vehicle signal preemption simulation")]
struct Cli {
    /// JSON config file; omitted values keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of simulation ticks to run
    #[arg(long, default_value = "1200")]
    ticks: u32,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "0.05")]
    delta: f32,

    /// Seed for reproducible vehicle placement
    #[arg(long)]
    seed: Option<u64>,

    /// Override the number of ordinary vehicles
    #[arg(long)]
    vehicles: Option<usize>,

    /// Override the number of junctions
    #[arg(long)]
    junctions: Option<usize>,

    /// Skip the terminal map
    #[arg(long)]
    no_map: bool,

    /// Milliseconds to pause after each simulated second
    #[arg(long, default_value = "0")]
    pace_ms: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,traffic_preempt=info"),
    )
    .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if let Some(vehicles) = cli.vehicles {
        config.vehicles.count = vehicles;
    }
    if let Some(junctions) = cli.junctions {
        config.layout.junction_count = junctions;
    }

    let world = match cli.seed {
        Some(seed) => SimWorld::new_with_seed(config, seed),
        None => SimWorld::new(config),
    }
    .context("Failed to build simulation world")?;

    run_headless(world, &cli);
    Ok(())
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(mut world: SimWorld, cli: &Cli) {
    let ticks = cli.ticks;
    let delta = cli.delta;
    println!("Running preemption simulation in headless mode...");
    println!("Ticks: {}, Delta: {}s", ticks, delta);

    // Calculate how many ticks equal 1 second of simulation time
    let ticks_per_second = ((1.0 / delta).ceil() as u32).max(1);
    println!();

    let mut sink = LogSink;
    world.announce(&mut sink);

    println!("Initial state:");
    world.print_summary();
    if !cli.no_map {
        world.draw_map();
    }
    println!();

    let mut tick = 0;
    while tick < ticks {
        let ticks_to_run = ticks_per_second.min(ticks - tick);

        for _ in 0..ticks_to_run {
            tick += 1;
            world.tick(delta, &mut sink);
        }

        println!("--- After tick {} ({:.1}s simulated time) ---", tick, world.time);
        world.print_summary();
        if !cli.no_map {
            world.draw_map();
        }
        println!();

        if tick < ticks && cli.pace_ms > 0 {
            std::thread::sleep(std::time::Duration::from_millis(cli.pace_ms));
        }
    }

    let stats = &world.stats;
    info!("=== SIMULATION COMPLETE ===");
    info!("Simulated time: {:.2}s", world.time);
    info!("Ticks: {}", stats.ticks);
    info!("Dispatches: {}", stats.dispatches);
    info!("Preemptions: {}", stats.preemptions);
    info!("Releases: {}", stats.releases);
    info!("Forced releases: {}", stats.forced_releases);
    info!("Sensor pulses: {}", stats.sensor_pulses);
    info!("Evasions: {}", stats.evasions);
    info!("Creeps: {}", stats.creeps);
    info!("Signal stops: {}", stats.signal_stops);
}
