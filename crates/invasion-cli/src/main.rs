//! Command-line front end for the alien invasion simulation.
//!
//! Reads a world map, unleashes the requested number of aliens and prints
//! whatever is left of the world to stdout once the invasion settles.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use invasion_core::SimulationConfig;
use invasion_world::{Simulation, World};

/// Simulate an alien invasion over a city map.
#[derive(Debug, Parser)]
#[command(name = "invasion", version, about)]
struct Args {
    /// Number of aliens to unleash on the world.
    #[arg(long, default_value_t = 2)]
    aliens: usize,

    /// Path to the map file, one city declaration per line.
    #[arg(long = "world-map")]
    world_map: PathBuf,

    /// Seed for the invasion's random choices. Picked at random when
    /// omitted.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging();

    let seed = args.seed.unwrap_or_else(rand::random);
    let world = build_world(&args.world_map)
        .with_context(|| format!("failed to load world map {}", args.world_map.display()))?;
    info!(
        cities = world.len(),
        aliens = args.aliens,
        seed,
        "unleashing the invasion"
    );

    let config = SimulationConfig {
        aliens: args.aliens,
        seed,
        ..Default::default()
    };
    let mut simulation = Simulation::new(world, config);
    let report = simulation
        .run()
        .context("the invasion could not run to completion")?;

    info!(
        turns = report.turns,
        cities_destroyed = report.cities_destroyed,
        cities_remaining = report.cities_remaining,
        aliens_trapped = report.aliens_trapped,
        "invasion is over"
    );

    info!("the current state of the world is:");
    println!("{}", simulation.world().render_map());
    Ok(())
}

/// Logs go to stderr so the surviving map on stdout stays machine-readable.
fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Builds a world from a map file. Blank lines are skipped; anything else
/// must be a valid city declaration.
fn build_world(path: &Path) -> anyhow::Result<World> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let world = World::new();
    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        world
            .establish_city(line)
            .with_context(|| format!("failed to establish city from {line:?}"))?;
    }
    Ok(world)
}
